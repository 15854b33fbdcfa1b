//! 可注入类型派生宏实现

use crate::utils::{
    arc_inner_type, extract_generic_type, has_attribute, is_type_named, registration_fn_ident,
};
use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{
    spanned::Spanned, Attribute, Data, DeriveInput, Error, Field, Fields, LitStr, Meta, Result,
    Type,
};

pub(crate) const FIELD_ATTRIBUTES: [&str; 4] = ["value", "inject", "lazy", "provide"];

/// 类型级参数
#[derive(Debug, Default, PartialEq)]
pub struct InjectableArgs {
    /// 作用域名称，`None` 表示不缓存
    pub scope: Option<String>,
}

impl InjectableArgs {
    /// 从 `#[injectable(...)]` 属性中解析
    pub fn from_attributes(attrs: &[Attribute]) -> Result<Self> {
        let mut args = Self::default();

        for attr in attrs.iter().filter(|attr| attr.path().is_ident("injectable")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("scope") {
                    let lit: LitStr = meta.value()?.parse()?;
                    args.scope = Some(lit.value());
                } else if meta.path.is_ident("root") {
                    args.scope = Some("root".to_string());
                } else if meta.path.is_ident("module") {
                    args.scope = Some("module".to_string());
                } else if meta.path.is_ident("request") {
                    args.scope = Some("request".to_string());
                } else if meta.path.is_ident("transient") {
                    args.scope = None;
                } else {
                    return Err(meta.error("未知的 injectable 参数"));
                }
                Ok(())
            })?;
        }

        Ok(args)
    }
}

/// 字段或方法参数的注入方式
#[derive(Debug, PartialEq)]
pub(crate) enum FieldSource {
    /// 按 Arc<T> 中的类型解析
    Type,
    /// 按键查找字面值
    Value(String),
    /// 通过引用键注入
    InjectKey(String),
    /// 通过类型注入
    InjectType,
    /// 延迟解析
    Lazy,
    /// 调用指定键的提供者
    Provide(String),
    /// 不参与注入
    Default,
}

impl FieldSource {
    fn from_field(field: &Field) -> Result<Self> {
        Self::from_attributes(&field.attrs, field.span())
    }

    /// 从字段或参数上的注解解析
    pub(crate) fn from_attributes(attrs: &[Attribute], span: Span) -> Result<Self> {
        let annotated: Vec<&Attribute> = attrs
            .iter()
            .filter(|attr| FIELD_ATTRIBUTES.iter().any(|name| attr.path().is_ident(name)))
            .collect();

        if has_attribute(attrs, "injectable") {
            if !annotated.is_empty() {
                return Err(Error::new(span, "字段只能使用一种注入注解"));
            }
            return Self::from_injectable_attribute(attrs, span);
        }

        let attr = match annotated.as_slice() {
            [] => return Ok(Self::Type),
            [attr] => *attr,
            _ => return Err(Error::new(span, "字段只能使用一种注入注解")),
        };

        let path = attr.path();
        if path.is_ident("lazy") {
            attr.meta.require_path_only()?;
            Ok(Self::Lazy)
        } else if path.is_ident("inject") {
            match &attr.meta {
                Meta::Path(_) => Ok(Self::InjectType),
                _ => Ok(Self::InjectKey(attr.parse_args::<LitStr>()?.value())),
            }
        } else if path.is_ident("value") {
            Ok(Self::Value(attr.parse_args::<LitStr>()?.value()))
        } else {
            Ok(Self::Provide(attr.parse_args::<LitStr>()?.value()))
        }
    }

    fn from_injectable_attribute(attrs: &[Attribute], span: Span) -> Result<Self> {
        let mut source = None;
        for attr in attrs.iter().filter(|attr| attr.path().is_ident("injectable")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("default") {
                    source = Some(Self::Default);
                    Ok(())
                } else {
                    Err(meta.error("字段上只支持 #[injectable(default)]"))
                }
            })?;
        }
        source.ok_or_else(|| Error::new(span, "字段上只支持 #[injectable(default)]"))
    }

    /// 生成参数声明和字段初始化表达式；不参与注入的字段没有参数声明
    pub(crate) fn expand(&self, ty: &Type, index: usize) -> Result<(Option<TokenStream>, TokenStream)> {
        let arc_inner = arc_inner_type(ty);
        let shared_or_cloned = |inner: Option<&Type>| match inner {
            Some(inner) => quote! { args.get::<#inner>(#index)? },
            None => quote! { args.value::<#ty>(#index)? },
        };

        let expanded = match self {
            Self::Default => (None, quote! { ::core::default::Default::default() }),
            Self::Type => {
                let inner = require_arc(ty, arc_inner)?;
                (
                    Some(quote! { .parameter::<#inner>() }),
                    quote! { args.get::<#inner>(#index)? },
                )
            }
            Self::Value(key) => {
                let declared = arc_inner.unwrap_or(ty);
                (
                    Some(quote! { .value_parameter::<#declared>(#key) }),
                    shared_or_cloned(arc_inner),
                )
            }
            Self::InjectKey(key) => {
                let inner = require_arc(ty, arc_inner)?;
                (
                    Some(quote! { .inject_parameter::<#inner>(#key) }),
                    quote! { args.get::<#inner>(#index)? },
                )
            }
            Self::InjectType => {
                let inner = require_arc(ty, arc_inner)?;
                (
                    Some(quote! { .inject_type_parameter::<#inner>() }),
                    quote! { args.get::<#inner>(#index)? },
                )
            }
            Self::Lazy => {
                let inner = is_type_named(ty, "Lazy")
                    .then(|| extract_generic_type(ty))
                    .flatten()
                    .ok_or_else(|| Error::new(ty.span(), "#[lazy] 字段必须是 Lazy<T>"))?;
                (
                    Some(quote! { .lazy_parameter::<#inner>() }),
                    quote! { <#ty>::from_arguments(&args, #index)? },
                )
            }
            Self::Provide(key) => {
                let declared = arc_inner.unwrap_or(ty);
                (
                    Some(quote! { .provide_parameter::<#declared>(#key, ::std::vec::Vec::new()) }),
                    shared_or_cloned(arc_inner),
                )
            }
        };

        Ok(expanded)
    }
}

fn require_arc<'a>(ty: &'a Type, inner: Option<&'a Type>) -> Result<&'a Type> {
    inner.ok_or_else(|| {
        Error::new(
            ty.span(),
            "字段必须是 Arc<T>，或使用 #[value]/#[inject]/#[lazy]/#[provide]/#[injectable(default)] 注解",
        )
    })
}

/// 实现 #[derive(Injectable)] 宏
pub fn derive_injectable_impl(input: DeriveInput) -> Result<TokenStream> {
    let struct_name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(Error::new(
            input.generics.span(),
            "Injectable 不支持泛型类型",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        _ => {
            return Err(Error::new(
                input.span(),
                "Injectable 只能用于结构体",
            ))
        }
    };

    let args = InjectableArgs::from_attributes(&input.attrs)?;
    let scope_call = args.scope.as_ref().map(|scope| quote! { .scope(#scope) });

    let mut parameter_calls = Vec::new();
    let mut initializers = Vec::new();
    for field in fields.iter() {
        let source = FieldSource::from_field(field)?;
        let (parameter, init) = source.expand(&field.ty, parameter_calls.len())?;
        parameter_calls.extend(parameter);
        initializers.push(match &field.ident {
            Some(ident) => quote! { #ident: #init },
            None => init,
        });
    }

    let construction = match fields {
        Fields::Named(_) => quote! { Self { #(#initializers),* } },
        Fields::Unnamed(_) => quote! { Self ( #(#initializers),* ) },
        Fields::Unit => quote! { Self },
    };

    let register_fn = registration_fn_ident(struct_name);

    Ok(quote! {
        impl ::di_abstractions::Injectable for #struct_name {
            fn registration() -> ::di_abstractions::TypeRegistration {
                #[allow(unused_imports)]
                use ::di_abstractions::ParameterBuilder as _;

                ::di_abstractions::TypeRegistration::of::<Self>()
                    #scope_call
                    #(#parameter_calls)*
                    .construct(|args: ::di_abstractions::Arguments| {
                        let _ = &args;
                        ::core::result::Result::Ok(#construction)
                    })
            }
        }

        // 使用 ctor 在程序启动时自动注册，放在匿名常量中避免函数重名
        const _: () = {
            #[::ctor::ctor]
            fn #register_fn() {
                ::di_abstractions::register::<#struct_name>();
            }
        };
    })
}
