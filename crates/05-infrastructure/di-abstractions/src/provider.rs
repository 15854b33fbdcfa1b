//! 提供者描述符
//!
//! 参数覆盖点以 `{ key, args }` 的形式记录，解析时按 `key` 沿容器链查找提供者函数

use infrastructure_common::{AnyArc, Key, Symbol, TypeInfo};
use once_cell::sync::Lazy;
use std::any::Any;
use std::sync::Arc;

/// 内置提供者：字面值查找
pub static PROVIDER_VALUE: Lazy<Symbol> = Lazy::new(|| Symbol::new("provider:value"));

/// 内置提供者：延迟解析器创建
pub static PROVIDER_LAZY: Lazy<Symbol> = Lazy::new(|| Symbol::new("provider:lazy"));

/// 内置提供者：间接引用解析
pub static PROVIDER_INJECT: Lazy<Symbol> = Lazy::new(|| Symbol::new("provider:inject"));

/// 提供者调用描述
///
/// `args` 会按位置展开传给提供者函数
#[derive(Clone)]
pub struct ProviderDescriptor {
    /// 提供者键
    pub key: Key,
    /// 调用参数
    pub args: Vec<AnyArc>,
}

impl ProviderDescriptor {
    /// 使用任意提供者
    pub fn provide(key: impl Into<Key>, args: Vec<AnyArc>) -> Self {
        Self {
            key: key.into(),
            args,
        }
    }

    /// 按键查找字面值
    pub fn value(key: impl Into<Key>) -> Self {
        Self::provide(*PROVIDER_VALUE, vec![Arc::new(key.into()) as AnyArc])
    }

    /// 为目标类型创建延迟解析器
    pub fn lazy(target: TypeInfo) -> Self {
        Self::provide(*PROVIDER_LAZY, vec![Arc::new(target) as AnyArc])
    }

    /// 通过已注册的引用键注入
    pub fn inject(key: impl Into<Key>) -> Self {
        Self::provide(*PROVIDER_INJECT, vec![Arc::new(key.into()) as AnyArc])
    }

    /// 直接按类型注入
    pub fn inject_type(target: TypeInfo) -> Self {
        Self::provide(*PROVIDER_INJECT, vec![Arc::new(target) as AnyArc])
    }

    /// 追加一个调用参数
    pub fn with_arg<T: Any + Send + Sync>(mut self, arg: T) -> Self {
        self.args.push(Arc::new(arg));
        self
    }

    /// 是否使用内置提供者
    pub fn is_builtin(&self) -> bool {
        match &self.key {
            Key::Symbol(symbol) => {
                *symbol == *PROVIDER_VALUE
                    || *symbol == *PROVIDER_LAZY
                    || *symbol == *PROVIDER_INJECT
            }
            Key::Name(_) => false,
        }
    }
}

impl std::fmt::Debug for ProviderDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderDescriptor")
            .field("key", &self.key)
            .field("args", &self.args.len())
            .finish()
    }
}
