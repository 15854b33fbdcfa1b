//! 组件解析器抽象接口
//!
//! 提供按类型解析组件和解析成员函数参数的能力

use crate::arguments::{downcast, Arguments};
use crate::registry;
use infrastructure_common::{AnyArc, DependencyError, DependencyResult, TypeInfo};
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::sync::Arc;

/// 组件解析器 trait
pub trait ComponentResolver: Send + Sync {
    /// 解析指定类型的组件（类型擦除）
    fn resolve_type(&self, type_info: &TypeInfo) -> DependencyResult<AnyArc>;

    /// 解析可注入成员函数的参数
    fn resolve_function_arguments_by_id(
        &self,
        owner: &TypeInfo,
        member: &str,
    ) -> DependencyResult<Arguments>;

    /// 检查类型是否可注入
    fn can_resolve_type(&self, type_id: TypeId) -> bool {
        registry::is_resolvable_type(type_id)
    }

    /// 解析指定类型的组件
    fn resolve<T: Any + Send + Sync>(&self) -> DependencyResult<Arc<T>>
    where
        Self: Sized,
    {
        let type_info = TypeInfo::of::<T>();
        let instance = self.resolve_type(&type_info)?;
        downcast(instance, || type_info.name.to_string())
    }

    /// 检查是否可以解析指定类型
    fn can_resolve<T: ?Sized + 'static>(&self) -> bool
    where
        Self: Sized,
    {
        self.can_resolve_type(TypeId::of::<T>())
    }
}

thread_local! {
    /// 当前线程的解析链，用于检测循环依赖
    static RESOLUTION_CHAIN: RefCell<Vec<TypeInfo>> = const { RefCell::new(Vec::new()) };
}

/// 解析链守卫
///
/// 构造期间持有，释放时从当前线程的解析链中移除类型
#[derive(Debug)]
pub struct ResolutionGuard {
    type_info: TypeInfo,
}

impl ResolutionGuard {
    /// 将类型加入解析链，已在链中时返回循环依赖错误
    pub fn enter(type_info: TypeInfo) -> DependencyResult<Self> {
        RESOLUTION_CHAIN.with(|chain| {
            let mut chain = chain.borrow_mut();
            if chain.contains(&type_info) {
                let dependency_chain = chain
                    .iter()
                    .chain(std::iter::once(&type_info))
                    .map(|info| info.short_name())
                    .collect::<Vec<_>>()
                    .join(" -> ");
                return Err(DependencyError::CircularDependency { dependency_chain });
            }
            chain.push(type_info);
            Ok(Self { type_info })
        })
    }

    /// 当前解析深度
    pub fn depth() -> usize {
        RESOLUTION_CHAIN.with(|chain| chain.borrow().len())
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLUTION_CHAIN.with(|chain| {
            let mut chain = chain.borrow_mut();
            if let Some(position) = chain.iter().rposition(|info| *info == self.type_info) {
                chain.remove(position);
            }
        });
    }
}
