//! 错误类型定义

use thiserror::Error;

/// 链式查找的映射类别
///
/// 用于在 [`DependencyError::UnresolvedKey`] 中标明是哪一类查找失败
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKind {
    /// 字面值
    Value,
    /// 提供者函数
    Provider,
    /// 已缓存实例
    Instance,
    /// 间接引用
    Reference,
    /// 作用域名称
    Scope,
}

impl LookupKind {
    /// 类别名称
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::Provider => "provider",
            Self::Instance => "instance",
            Self::Reference => "reference",
            Self::Scope => "scope",
        }
    }
}

impl std::fmt::Display for LookupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 依赖注入错误类型
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("类型不可注入: {type_name}")]
    NotResolvable { type_name: String },

    #[error("成员函数不可注入: {owner}::{member}")]
    FunctionNotResolvable { owner: String, member: String },

    #[error("no {kind} found for key {key}")]
    UnresolvedKey { kind: LookupKind, key: String },

    #[error("注入目标无效: {target}")]
    InvalidTarget { target: String },

    #[error("类型不匹配: 期望 {expected}, 位置 {context}")]
    TypeMismatch { expected: String, context: String },

    #[error("缺少参数: 索引 {index}, 参数个数 {len}")]
    MissingArgument { index: usize, len: usize },

    #[error("循环依赖检测到: {dependency_chain}")]
    CircularDependency { dependency_chain: String },

    #[error("组件创建失败: {type_name}, 原因: {message}")]
    ConstructionFailed { type_name: String, message: String },
}

impl DependencyError {
    /// 创建链式查找失败错误
    pub fn unresolved(kind: LookupKind, key: impl std::fmt::Display) -> Self {
        Self::UnresolvedKey {
            kind,
            key: key.to_string(),
        }
    }

    /// 创建不可注入错误
    pub fn not_resolvable(type_name: impl Into<String>) -> Self {
        Self::NotResolvable {
            type_name: type_name.into(),
        }
    }

    /// 创建无效注入目标错误
    pub fn invalid_target(target: impl Into<String>) -> Self {
        Self::InvalidTarget {
            target: target.into(),
        }
    }

    /// 创建组件构造失败错误
    pub fn construction_failed(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConstructionFailed {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// 是否为链式查找失败
    pub fn is_unresolved_key(&self) -> bool {
        matches!(self, Self::UnresolvedKey { .. })
    }

    /// 是否为未注册（不可注入）错误
    pub fn is_not_resolvable(&self) -> bool {
        matches!(
            self,
            Self::NotResolvable { .. } | Self::FunctionNotResolvable { .. }
        )
    }

    /// 链式查找失败时返回失败的类别
    pub fn lookup_kind(&self) -> Option<LookupKind> {
        match self {
            Self::UnresolvedKey { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置加载失败: {source}")]
    LoadError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("配置键不存在: {key}")]
    KeyNotFound { key: String },

    #[error("配置类型转换失败: {key}, 原因: {message}")]
    TypeConversionError { key: String, message: String },
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("依赖注入错误: {source}")]
    DependencyError {
        #[from]
        source: DependencyError,
    },

    #[error("基础设施启动失败: {message}")]
    BootstrapFailed { message: String },
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type DependencyResult<T> = Result<T, DependencyError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;
