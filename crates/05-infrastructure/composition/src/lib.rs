//! # 基础设施组合层
//!
//! 负责在启动时组装根注入器：初始化日志、加载配置并写入根容器，
//! 以及创建模块和请求作用域。
//!
//! ## 主要功能
//!
//! - **注入器构建器**: 使用构建者模式组装根容器种子
//! - **配置绑定**: TOML / JSON / 环境变量叠加后按路径绑定为字面值
//! - **作用域**: `module` 与 `request` 作用域的创建
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use infrastructure_composition::{request_scope, InjectorBuilder, LoggingConfig};
//! use di_impl::ContainerSeed;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let root = InjectorBuilder::new()
//!         .add_config_toml("config/app.toml")?
//!         .add_config_env_vars("APP")
//!         .bind_value::<String>("app.name", "app.name")
//!         .with_logging(LoggingConfig::development())
//!         .build()?;
//!
//!     let request = request_scope(&root, ContainerSeed::new().value("request.id", 1_u64));
//!     let name = request.value::<String>("app.name")?;
//!     println!("应用名称: {}", name);
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod scopes;

// 重新导出主要类型
pub use builder::{InjectorBuilder, LoggingConfig, CONFIGURATION_KEY};
pub use scopes::{module_scope, request_scope, with_request_scope};

// 重新导出错误类型
pub use infrastructure_common::InfrastructureError;
