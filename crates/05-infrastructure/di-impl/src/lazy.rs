//! 延迟解析
//!
//! [`LazyResolver`] 记住创建它的注入器和目标类型，首次访问时才解析，
//! 之后一直返回同一个结果。

use crate::injector::Injector;
use di_abstractions::{downcast, Arguments};
use infrastructure_common::{AnyArc, DependencyError, DependencyResult, TypeInfo};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::trace;

/// 延迟解析器
///
/// 首次解析成功前持有创建它的注入器，之后释放，
/// 持有者被缓存在同一作用域时不会形成引用环
pub struct LazyResolver {
    injector: Mutex<Option<Injector>>,
    target: TypeInfo,
    resolved: OnceCell<AnyArc>,
}

impl LazyResolver {
    /// 在注入器所在的作用域上创建延迟解析器
    pub fn new(injector: &Injector, target: TypeInfo) -> Self {
        Self {
            injector: Mutex::new(Some(injector.clone())),
            target,
            resolved: OnceCell::new(),
        }
    }

    /// 目标类型
    pub fn target(&self) -> &TypeInfo {
        &self.target
    }

    /// 是否已经解析过
    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }

    /// 是否仍持有注入器
    pub fn holds_injector(&self) -> bool {
        self.injector.lock().is_some()
    }

    /// 获取类型擦除的结果，失败不会被记住
    pub fn get_any(&self) -> DependencyResult<AnyArc> {
        let value = self
            .resolved
            .get_or_try_init(|| {
                // 注入器只在结果写入后释放
                let injector = self.injector.lock().clone().ok_or_else(|| {
                    DependencyError::construction_failed(self.target.name, "延迟解析器已释放注入器")
                })?;
                trace!("延迟解析: {}", self.target);
                injector.resolve_type(&self.target)
            })?
            .clone();
        self.injector.lock().take();
        Ok(value)
    }

    /// 获取结果
    pub fn get<T: Any + Send + Sync>(&self) -> DependencyResult<Arc<T>> {
        downcast(self.get_any()?, || format!("延迟解析 {}", self.target))
    }
}

impl std::fmt::Debug for LazyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyResolver")
            .field("target", &self.target)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// 带类型的延迟依赖
///
/// 用作构造函数参数，例如 `Lazy<Repository>`
pub struct Lazy<T> {
    resolver: Arc<LazyResolver>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> Lazy<T> {
    pub fn new(resolver: Arc<LazyResolver>) -> Self {
        Self {
            resolver,
            _marker: PhantomData,
        }
    }

    /// 从已解析的参数中取出延迟依赖
    pub fn from_arguments(args: &Arguments, index: usize) -> DependencyResult<Self> {
        let resolver = args.get::<LazyResolver>(index)?;
        if resolver.target().id != TypeInfo::of::<T>().id {
            return Err(DependencyError::TypeMismatch {
                expected: std::any::type_name::<T>().to_string(),
                context: format!("延迟参数 {} 的目标 {}", index, resolver.target()),
            });
        }
        Ok(Self::new(resolver))
    }

    /// 解析依赖，首次调用后结果被缓存
    pub fn get(&self) -> DependencyResult<Arc<T>> {
        self.resolver.get::<T>()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolver.is_resolved()
    }

    pub fn resolver(&self) -> &Arc<LazyResolver> {
        &self.resolver
    }
}

impl<T> Clone for Lazy<T> {
    fn clone(&self) -> Self {
        Self {
            resolver: self.resolver.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for Lazy<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Lazy").field(&self.resolver).finish()
    }
}
