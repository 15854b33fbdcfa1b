//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义注册元数据表和依赖解析的核心接口。
//!
//! ## 核心接口
//!
//! - [`TypeRegistration`] / [`FunctionRegistration`] - 注册信息与构建器
//! - [`ParameterBuilder`] - 参数声明与覆盖
//! - [`ProviderDescriptor`] - 提供者调用描述
//! - [`Arguments`] - 已解析的位置参数
//! - [`ComponentResolver`] - 依赖解析器接口

pub mod arguments;
pub mod provider;
pub mod registry;
pub mod resolver;

pub use arguments::*;
pub use provider::*;
pub use registry::*;
pub use resolver::*;
