//! # DI Macros
//!
//! 这个 crate 提供了把类型登记到注册元数据表的过程宏。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use di_macros::Injectable;
//! use di_impl::Lazy;
//! use std::sync::Arc;
//!
//! #[derive(Injectable)]
//! #[injectable(scope = "request")]
//! pub struct OrderService {
//!     repository: Arc<OrderRepository>,
//!     #[value("tenant")]
//!     tenant: String,
//!     #[inject("payment")]
//!     payment: Arc<PaymentGateway>,
//!     #[lazy]
//!     audit: Lazy<AuditLog>,
//! }
//! ```
//!
//! 成员函数通过 `#[injectable_methods]` 登记，也可以直接使用
//! `di_abstractions::FunctionRegistration::of::<Owner>("member")` 构建器：
//!
//! ```rust,ignore
//! use di_macros::injectable_methods;
//!
//! #[injectable_methods]
//! impl OrderController {
//!     #[injectable]
//!     pub fn place(&self, service: Arc<OrderService>, #[value("tenant")] tenant: String) {}
//! }
//! ```
//!
//! 使用方需要依赖 `di-abstractions` 和 `ctor`。

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput, ItemImpl};

mod injectable;
mod methods;
mod utils;

/// 可注入类型派生宏
///
/// 实现 `di_abstractions::Injectable`，并在程序启动时自动注册。
///
/// # 类型属性
///
/// - `#[injectable(scope = "name")]` - 作用域名称
/// - `#[injectable(root)]` / `module` / `request` - 常用作用域的简写
/// - `#[injectable(transient)]` - 不缓存（默认）
///
/// # 字段属性
///
/// - 无注解的 `Arc<T>` 字段按类型 `T` 解析
/// - `#[value("key")]` - 按键查找字面值，非 `Arc` 字段会被克隆
/// - `#[inject("key")]` - 通过引用键间接注入；`#[inject]` 按字段类型注入
/// - `#[lazy]` - `Lazy<T>` 字段，首次访问时才解析
/// - `#[provide("key")]` - 调用指定键的提供者
/// - `#[injectable(default)]` - 不参与注入，使用 `Default::default()`
#[proc_macro_derive(Injectable, attributes(injectable, value, inject, lazy, provide))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    injectable::derive_injectable_impl(input)
        .unwrap_or_else(|error| error.to_compile_error())
        .into()
}

/// 可注入成员函数属性宏
///
/// 用在 `impl` 块上；块内标记了 `#[injectable]` 的方法在程序启动时登记为可注入
/// 成员函数，参数按声明顺序成为注入参数。参数注解与字段注解相同：
/// `#[value("key")]`、`#[inject("key")]` / `#[inject]`、`#[lazy]`、`#[provide("key")]`，
/// 无注解的 `Arc<T>` 参数按类型 `T` 解析。`self` 接收者不参与注入。
#[proc_macro_attribute]
pub fn injectable_methods(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemImpl);
    methods::injectable_methods_impl(input)
        .unwrap_or_else(|error| error.to_compile_error())
        .into()
}
