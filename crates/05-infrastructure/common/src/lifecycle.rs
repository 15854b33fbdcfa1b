//! 作用域名称约定
//!
//! 容器名称任意，以下三个名称是约定俗成的作用域层级

/// 根作用域，进程启动时创建一次
pub const ROOT_SCOPE: &str = "root";

/// 模块作用域，每个逻辑模块一个
pub const MODULE_SCOPE: &str = "module";

/// 请求作用域，每个工作单元一个，工作单元结束即丢弃
pub const REQUEST_SCOPE: &str = "request";
