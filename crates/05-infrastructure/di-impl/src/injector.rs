//! 注入器
//!
//! 注入器绑定到一个容器，沿父链查找字面值、提供者、实例和引用，
//! 并按注册信息构造可注入类型。单例实例缓存在名称与类型作用域相同的
//! 最近祖先容器中；找不到该作用域时每次都重新构造。

use crate::container::{Container, ContainerSeed};
use di_abstractions::{
    downcast, function_registration, register_type, type_registration, Arguments,
    ComponentResolver, ParameterList, ProviderDescriptor, ResolutionGuard, TypeRegistration,
};
use infrastructure_common::{
    AnyArc, DependencyError, DependencyResult, Key, LookupKind, ReferenceToken, TypeInfo,
    ROOT_SCOPE,
};
use once_cell::sync::Lazy;
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::providers::Provider;

/// 注入器自身的引用令牌
///
/// 每个注入器都在自己的容器中以该令牌登记自身，解析 `Injector` 类型时得到最近的注入器
static INJECTOR_REFERENCE: Lazy<ReferenceToken> = Lazy::new(|| {
    register_type(TypeRegistration::of::<Injector>().construct(|_| {
        Err(DependencyError::construction_failed(
            std::any::type_name::<Injector>(),
            "注入器只能通过作用域获取",
        ))
    }))
});

/// 依赖注入器
#[derive(Clone)]
pub struct Injector {
    container: Arc<Container>,
}

impl Injector {
    /// 创建根注入器
    pub fn new(seed: ContainerSeed) -> Self {
        Self::of(Arc::new(Container::new(ROOT_SCOPE, seed)))
    }

    /// 创建空的根注入器
    pub fn root() -> Self {
        Self::new(ContainerSeed::new())
    }

    /// 绑定到已有容器，并在其中登记自身
    pub fn of(container: Arc<Container>) -> Self {
        container.insert_scope_entry(Key::Symbol(*INJECTOR_REFERENCE), Arc::downgrade(&container));
        Self::wrap(container)
    }

    /// 包装容器但不登记
    pub(crate) fn wrap(container: Arc<Container>) -> Self {
        Self { container }
    }

    /// 创建子作用域
    pub fn extend_with(&self, name: impl Into<String>, seed: ContainerSeed) -> Self {
        let name = name.into();
        debug!("创建子作用域: {} (父作用域: {})", name, self.container.name());
        Self::of(Arc::new(Container::with_parent(
            name,
            seed,
            Some(self.container.clone()),
        )))
    }

    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    /// 作用域名称
    pub fn name(&self) -> &str {
        self.container.name()
    }

    /// 是否绑定到同一个容器
    pub fn same_scope(&self, other: &Injector) -> bool {
        Arc::ptr_eq(&self.container, &other.container)
    }

    /// 从当前容器到根容器的链
    pub fn parents(&self) -> impl Iterator<Item = &Container> + '_ {
        std::iter::successors(Some(&*self.container), |container| {
            container.parent().map(|parent| &**parent)
        })
    }

    fn lookup<T>(&self, find: impl Fn(&Container) -> Option<T>) -> Option<T> {
        self.parents().find_map(find)
    }

    pub fn has_value(&self, key: &Key) -> bool {
        self.parents().any(|container| container.has_value(key))
    }

    /// 沿父链查找字面值
    pub fn find_value(&self, key: &Key) -> DependencyResult<AnyArc> {
        self.lookup(|container| container.value(key))
            .ok_or_else(|| DependencyError::unresolved(LookupKind::Value, key))
    }

    /// 查找字面值并还原类型
    pub fn value<V: Any + Send + Sync>(&self, key: impl Into<Key>) -> DependencyResult<Arc<V>> {
        let key = key.into();
        downcast(self.find_value(&key)?, || format!("字面值 {}", key))
    }

    pub fn has_provider(&self, key: &Key) -> bool {
        self.parents().any(|container| container.has_provider(key))
    }

    /// 沿父链查找提供者
    pub fn find_provider(&self, key: &Key) -> DependencyResult<Provider> {
        self.lookup(|container| container.provider(key))
            .ok_or_else(|| DependencyError::unresolved(LookupKind::Provider, key))
    }

    pub fn has_instance(&self, key: &Key) -> bool {
        self.parents().any(|container| container.instance(key).is_some())
    }

    /// 沿父链查找缓存实例
    pub fn find_instance(&self, key: &Key) -> DependencyResult<AnyArc> {
        self.lookup(|container| container.instance(key))
            .ok_or_else(|| DependencyError::unresolved(LookupKind::Instance, key))
    }

    pub fn has_reference(&self, key: &Key) -> bool {
        self.parents().any(|container| container.has_reference(key))
    }

    /// 沿父链查找引用映射
    pub fn find_reference(&self, key: &Key) -> DependencyResult<TypeInfo> {
        self.lookup(|container| container.reference(key))
            .ok_or_else(|| DependencyError::unresolved(LookupKind::Reference, key))
    }

    pub fn has_scope(&self, name: &str) -> bool {
        self.parents().any(|container| container.name() == name)
    }

    /// 查找名称匹配的最近容器
    pub fn find_scope(&self, name: &str) -> DependencyResult<&Container> {
        self.parents()
            .find(|container| container.name() == name)
            .ok_or_else(|| DependencyError::unresolved(LookupKind::Scope, name))
    }

    /// 解析可注入类型
    pub fn resolve<T: Any + Send + Sync>(&self) -> DependencyResult<Arc<T>> {
        let type_info = TypeInfo::of::<T>();
        downcast(self.resolve_type(&type_info)?, || type_info.name.to_string())
    }

    /// 按类型描述解析
    pub fn resolve_type(&self, type_info: &TypeInfo) -> DependencyResult<AnyArc> {
        let registration = type_registration(type_info.id)
            .ok_or_else(|| DependencyError::not_resolvable(type_info.name))?;
        let key = registration.instance_key();

        if let Some(instance) = self.lookup(|container| container.instance(&key)) {
            trace!("命中实例缓存: {}", type_info);
            return Ok(instance);
        }

        let _guard = ResolutionGuard::enter(*type_info)?;

        let scope = registration
            .scope_name()
            .and_then(|name| self.parents().find(|container| container.name() == name));

        match scope {
            Some(scope) => {
                let lock = scope.construction_lock(registration.reference);
                let _construction = lock.lock();
                // 等待期间其他线程可能已完成构造
                if let Some(instance) = self.lookup(|container| container.instance(&key)) {
                    return Ok(instance);
                }
                let instance = self.construct(&registration)?;
                scope.insert_instance(key, instance.clone());
                debug!("缓存实例: {} (作用域: {})", type_info, scope.name());
                Ok(instance)
            }
            None => {
                trace!(
                    "未找到作用域 {:?}, 不缓存: {}",
                    registration.scope_name(),
                    type_info
                );
                self.construct(&registration)
            }
        }
    }

    fn construct(&self, registration: &TypeRegistration) -> DependencyResult<AnyArc> {
        let args = self.resolve_parameters(&registration.parameters)?;
        trace!("构造实例: {}", registration.type_info);
        (registration.constructor)(args)
    }

    /// 解析可注入成员函数的参数
    pub fn resolve_function_arguments<O: ?Sized + 'static>(
        &self,
        member: &str,
    ) -> DependencyResult<Arguments> {
        self.resolve_function_arguments_by_id(&TypeInfo::of::<O>(), member)
    }

    /// 按所属类型描述解析成员函数参数
    pub fn resolve_function_arguments_by_id(
        &self,
        owner: &TypeInfo,
        member: &str,
    ) -> DependencyResult<Arguments> {
        let registration = function_registration(owner.id, member).ok_or_else(|| {
            DependencyError::FunctionNotResolvable {
                owner: owner.name.to_string(),
                member: member.to_string(),
            }
        })?;
        self.resolve_parameters(&registration.parameters)
    }

    /// 调用描述符指定的提供者
    pub fn resolve_provider(&self, descriptor: &ProviderDescriptor) -> DependencyResult<AnyArc> {
        let provider = self.find_provider(&descriptor.key)?;
        provider(self, &descriptor.args)
    }

    fn resolve_parameters(&self, parameters: &ParameterList) -> DependencyResult<Arguments> {
        parameters
            .types
            .iter()
            .enumerate()
            .map(|(index, declared)| match parameters.override_at(index) {
                Some(descriptor) => self.resolve_provider(descriptor),
                None => self.resolve_type(declared),
            })
            .collect::<DependencyResult<Vec<_>>>()
            .map(Arguments::new)
    }
}

impl ComponentResolver for Injector {
    fn resolve_type(&self, type_info: &TypeInfo) -> DependencyResult<AnyArc> {
        Injector::resolve_type(self, type_info)
    }

    fn resolve_function_arguments_by_id(
        &self,
        owner: &TypeInfo,
        member: &str,
    ) -> DependencyResult<Arguments> {
        Injector::resolve_function_arguments_by_id(self, owner, member)
    }
}

impl std::fmt::Debug for Injector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Injector")
            .field("scope", &self.container.name())
            .field("container", &self.container.id())
            .finish()
    }
}
