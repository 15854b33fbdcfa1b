//! # 依赖注入具体实现
//!
//! 提供分层作用域容器、注入器和延迟解析器。
//!
//! ## 核心类型
//!
//! - [`Container`] - 作用域容器，保存字面值、提供者、实例缓存和引用映射
//! - [`Injector`] - 沿父链查找并按作用域缓存实例的解析引擎
//! - [`LazyResolver`] / [`Lazy`] - 首次访问时才解析的依赖
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use di_impl::{ContainerSeed, Injector};
//!
//! let root = Injector::new(ContainerSeed::new().value("x", 100_i32));
//! let request = root.extend_with("request", ContainerSeed::new());
//! let service = request.resolve::<MyService>()?;
//! ```

pub mod container;
pub mod injector;
pub mod lazy;
pub mod providers;

pub use container::{Container, ContainerSeed};
pub use injector::Injector;
pub use lazy::{Lazy, LazyResolver};
pub use providers::{default_providers, provider_fn, Provider};
