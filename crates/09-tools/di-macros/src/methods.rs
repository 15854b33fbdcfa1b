//! 可注入成员函数属性宏实现

use crate::injectable::{FieldSource, FIELD_ATTRIBUTES};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{spanned::Spanned, Attribute, Error, FnArg, ImplItem, ItemImpl, Result};

fn is_injection_attribute(attr: &Attribute) -> bool {
    attr.path().is_ident("injectable")
        || FIELD_ATTRIBUTES.iter().any(|name| attr.path().is_ident(name))
}

/// 实现 #[injectable_methods] 属性宏
///
/// 标记了 `#[injectable]` 的方法按参数类型和参数注解登记为可注入成员函数，
/// 注解在输出前被移除
pub fn injectable_methods_impl(mut input: ItemImpl) -> Result<TokenStream> {
    if !input.generics.params.is_empty() {
        return Err(Error::new(
            input.generics.span(),
            "injectable_methods 不支持泛型 impl",
        ));
    }

    let owner = input.self_ty.clone();
    let mut registrations = Vec::new();

    for item in input.items.iter_mut() {
        let ImplItem::Fn(method) = item else {
            continue;
        };

        let marked = method.attrs.len();
        method.attrs.retain(|attr| !attr.path().is_ident("injectable"));
        if method.attrs.len() == marked {
            continue;
        }

        let member = method.sig.ident.to_string();
        let mut parameter_calls = Vec::new();
        for arg in method.sig.inputs.iter_mut() {
            let FnArg::Typed(arg) = arg else {
                continue;
            };
            let source = FieldSource::from_attributes(&arg.attrs, arg.span())?;
            arg.attrs.retain(|attr| !is_injection_attribute(attr));

            match source.expand(&arg.ty, parameter_calls.len())? {
                (Some(call), _) => parameter_calls.push(call),
                (None, _) => {
                    return Err(Error::new(
                        arg.span(),
                        "方法参数不支持 #[injectable(default)]",
                    ))
                }
            }
        }

        registrations.push(quote! {
            ::di_abstractions::register_function(
                ::di_abstractions::FunctionRegistration::of::<#owner>(#member)
                    #(#parameter_calls)*
            );
        });
    }

    if registrations.is_empty() {
        return Err(Error::new(
            input.self_ty.span(),
            "impl 块中没有标记 #[injectable] 的方法",
        ));
    }

    Ok(quote! {
        #input

        const _: () = {
            #[::ctor::ctor]
            fn __register_injectable_methods() {
                #[allow(unused_imports)]
                use ::di_abstractions::ParameterBuilder as _;

                #(#registrations)*
            }
        };
    })
}
