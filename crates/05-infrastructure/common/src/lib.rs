//! # Infrastructure Common
//!
//! 依赖注入基础设施的公共类型。
//!
//! ## 核心内容
//!
//! - [`DependencyError`] - 解析错误分类
//! - [`TypeInfo`] - 类型描述
//! - [`Symbol`] / [`Key`] - 不透明标识与查找键
//! - [`ROOT_SCOPE`] / [`MODULE_SCOPE`] / [`REQUEST_SCOPE`] - 约定的作用域名称

pub mod errors;
pub mod lifecycle;
pub mod metadata;

pub use errors::*;
pub use lifecycle::*;
pub use metadata::*;
