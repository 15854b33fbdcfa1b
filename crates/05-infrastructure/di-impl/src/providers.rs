//! 内置提供者
//!
//! 每个新建容器都会预先装入这三个提供者，种子数据中的同名键会覆盖它们

use crate::injector::Injector;
use crate::lazy::LazyResolver;
use di_abstractions::{PROVIDER_INJECT, PROVIDER_LAZY, PROVIDER_VALUE};
use infrastructure_common::{AnyArc, DependencyError, DependencyResult, Key, TypeInfo};
use std::any::Any;
use std::sync::Arc;

/// 提供者函数类型
///
/// 以当前注入器和展开后的描述符参数调用
pub type Provider = Arc<dyn Fn(&Injector, &[AnyArc]) -> DependencyResult<AnyArc> + Send + Sync>;

/// 将闭包包装为提供者
pub fn provider_fn<F>(provider: F) -> Provider
where
    F: Fn(&Injector, &[AnyArc]) -> DependencyResult<AnyArc> + Send + Sync + 'static,
{
    Arc::new(provider)
}

/// 内置提供者列表
pub fn default_providers() -> Vec<(Key, Provider)> {
    vec![
        (Key::Symbol(*PROVIDER_VALUE), provider_fn(value_provider)),
        (Key::Symbol(*PROVIDER_LAZY), provider_fn(lazy_provider)),
        (Key::Symbol(*PROVIDER_INJECT), provider_fn(inject_provider)),
    ]
}

fn first_argument<'a>(args: &'a [AnyArc], provider: &str) -> DependencyResult<&'a (dyn Any + Send + Sync)> {
    args.first()
        .map(|arg| &**arg)
        .ok_or_else(|| DependencyError::invalid_target(format!("{} 缺少目标参数", provider)))
}

fn argument_as<'a, T: Any>(args: &'a [AnyArc], provider: &str) -> DependencyResult<&'a T> {
    first_argument(args, provider)?
        .downcast_ref::<T>()
        .ok_or_else(|| DependencyError::TypeMismatch {
            expected: std::any::type_name::<T>().to_string(),
            context: format!("{} 的目标参数", provider),
        })
}

/// `(injector, key) -> injector.find_value(key)`
fn value_provider(injector: &Injector, args: &[AnyArc]) -> DependencyResult<AnyArc> {
    let key = argument_as::<Key>(args, "provider:value")?;
    injector.find_value(key)
}

/// `(injector, target) -> LazyResolver`，不会立即解析
fn lazy_provider(injector: &Injector, args: &[AnyArc]) -> DependencyResult<AnyArc> {
    let target = argument_as::<TypeInfo>(args, "provider:lazy")?;
    Ok(Arc::new(LazyResolver::new(injector, *target)))
}

/// 目标为引用键时先查找引用类型；目标为类型描述时直接解析
fn inject_provider(injector: &Injector, args: &[AnyArc]) -> DependencyResult<AnyArc> {
    let target = first_argument(args, "provider:inject")?;
    if let Some(key) = target.downcast_ref::<Key>() {
        let reference = injector.find_reference(key)?;
        return injector.resolve_type(&reference);
    }
    if let Some(type_info) = target.downcast_ref::<TypeInfo>() {
        return injector.resolve_type(type_info);
    }
    Err(DependencyError::invalid_target(
        "目标既不是引用键也不是类型描述",
    ))
}
