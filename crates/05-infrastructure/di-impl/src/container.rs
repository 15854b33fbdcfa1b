//! 作用域容器
//!
//! 容器只负责存储：字面值、提供者、实例缓存和引用映射四张表，
//! 以及指向父容器的链接。查找沿父链进行由注入器负责。

use crate::injector::Injector;
use crate::providers::{default_providers, provider_fn, Provider};
use dashmap::DashMap;
use infrastructure_common::{AnyArc, DependencyResult, Key, ReferenceToken, TypeInfo};
use parking_lot::ReentrantMutex;
use std::any::Any;
use std::sync::{Arc, Weak};
use tracing::trace;
use uuid::Uuid;

/// 实例缓存条目
///
/// 注入器在自身容器中登记的条目是弱引用，避免容器与自身形成引用环
#[derive(Clone)]
pub(crate) enum Instance {
    Shared(AnyArc),
    Scope(Weak<Container>),
}

impl Instance {
    fn get(&self) -> Option<AnyArc> {
        match self {
            Self::Shared(instance) => Some(instance.clone()),
            Self::Scope(container) => container
                .upgrade()
                .map(|container| Arc::new(Injector::wrap(container)) as AnyArc),
        }
    }
}

/// 容器种子数据
///
/// 创建容器时一次性写入，同名键覆盖内置提供者
#[derive(Clone, Default)]
pub struct ContainerSeed {
    values: Vec<(Key, AnyArc)>,
    providers: Vec<(Key, Provider)>,
    instances: Vec<(Key, AnyArc)>,
    references: Vec<(Key, TypeInfo)>,
}

impl ContainerSeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加字面值
    pub fn value<V: Any + Send + Sync>(self, key: impl Into<Key>, value: V) -> Self {
        self.shared_value(key, Arc::new(value))
    }

    /// 添加已包装的字面值
    pub fn shared_value(mut self, key: impl Into<Key>, value: AnyArc) -> Self {
        self.values.push((key.into(), value));
        self
    }

    /// 添加提供者
    pub fn provider(mut self, key: impl Into<Key>, provider: Provider) -> Self {
        self.providers.push((key.into(), provider));
        self
    }

    /// 以闭包添加提供者
    pub fn provider_fn<F>(self, key: impl Into<Key>, provider: F) -> Self
    where
        F: Fn(&Injector, &[AnyArc]) -> DependencyResult<AnyArc> + Send + Sync + 'static,
    {
        self.provider(key, provider_fn(provider))
    }

    /// 预置实例
    pub fn instance<T: Any + Send + Sync>(self, key: impl Into<Key>, instance: Arc<T>) -> Self {
        self.shared_instance(key, instance)
    }

    /// 预置类型擦除的实例
    pub fn shared_instance(mut self, key: impl Into<Key>, instance: AnyArc) -> Self {
        self.instances.push((key.into(), instance));
        self
    }

    /// 将引用键映射到类型
    pub fn reference<T: ?Sized + 'static>(self, key: impl Into<Key>) -> Self {
        self.reference_type(key, TypeInfo::of::<T>())
    }

    /// 将引用键映射到类型描述
    pub fn reference_type(mut self, key: impl Into<Key>, target: TypeInfo) -> Self {
        self.references.push((key.into(), target));
        self
    }

    /// 合并另一份种子，后者的同名键生效
    pub fn merge(mut self, other: ContainerSeed) -> Self {
        self.values.extend(other.values);
        self.providers.extend(other.providers);
        self.instances.extend(other.instances);
        self.references.extend(other.references);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
            && self.providers.is_empty()
            && self.instances.is_empty()
            && self.references.is_empty()
    }
}

impl std::fmt::Debug for ContainerSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerSeed")
            .field("values", &self.values.iter().map(|(key, _)| key).collect::<Vec<_>>())
            .field("providers", &self.providers.iter().map(|(key, _)| key).collect::<Vec<_>>())
            .field("instances", &self.instances.iter().map(|(key, _)| key).collect::<Vec<_>>())
            .field("references", &self.references)
            .finish()
    }
}

/// 作用域容器
pub struct Container {
    id: Uuid,
    name: String,
    parent: Option<Arc<Container>>,
    values: DashMap<Key, AnyArc>,
    providers: DashMap<Key, Provider>,
    instances: DashMap<Key, Instance>,
    references: DashMap<Key, TypeInfo>,
    construction_locks: DashMap<ReferenceToken, Arc<ReentrantMutex<()>>>,
}

impl Container {
    /// 创建没有父容器的容器
    pub fn new(name: impl Into<String>, seed: ContainerSeed) -> Self {
        Self::with_parent(name, seed, None)
    }

    /// 创建容器，内置提供者先于种子写入
    pub fn with_parent(
        name: impl Into<String>,
        seed: ContainerSeed,
        parent: Option<Arc<Container>>,
    ) -> Self {
        let mut container = Self {
            id: Uuid::new_v4(),
            name: name.into(),
            parent,
            values: DashMap::new(),
            providers: default_providers().into_iter().collect(),
            instances: DashMap::new(),
            references: DashMap::new(),
            construction_locks: DashMap::new(),
        };

        let ContainerSeed {
            values,
            providers,
            instances,
            references,
        } = seed;
        container.values.extend(values);
        container.providers.extend(providers);
        container
            .instances
            .extend(instances.into_iter().map(|(key, instance)| (key, Instance::Shared(instance))));
        container.references.extend(references);

        trace!("创建容器: {} ({})", container.name, container.id);
        container
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 作用域名称
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<Container>> {
        self.parent.as_ref()
    }

    pub fn has_value(&self, key: &Key) -> bool {
        self.values.contains_key(key)
    }

    pub fn value(&self, key: &Key) -> Option<AnyArc> {
        self.values.get(key).map(|entry| entry.value().clone())
    }

    pub fn has_provider(&self, key: &Key) -> bool {
        self.providers.contains_key(key)
    }

    pub fn provider(&self, key: &Key) -> Option<Provider> {
        self.providers.get(key).map(|entry| entry.value().clone())
    }

    pub fn has_instance(&self, key: &Key) -> bool {
        self.instances.contains_key(key)
    }

    /// 获取缓存实例，已释放的注入器条目视为不存在
    pub fn instance(&self, key: &Key) -> Option<AnyArc> {
        self.instances.get(key).and_then(|entry| entry.value().get())
    }

    pub fn has_reference(&self, key: &Key) -> bool {
        self.references.contains_key(key)
    }

    pub fn reference(&self, key: &Key) -> Option<TypeInfo> {
        self.references.get(key).map(|entry| *entry.value())
    }

    /// 写入实例缓存
    pub fn insert_instance(&self, key: Key, instance: AnyArc) {
        self.instances.insert(key, Instance::Shared(instance));
    }

    /// 登记注入器自身
    pub(crate) fn insert_scope_entry(&self, key: Key, container: Weak<Container>) {
        self.instances.insert(key, Instance::Scope(container));
    }

    /// 获取指定引用令牌的构造锁
    pub(crate) fn construction_lock(&self, reference: ReferenceToken) -> Arc<ReentrantMutex<()>> {
        self.construction_locks
            .entry(reference)
            .or_insert_with(|| Arc::new(ReentrantMutex::new(())))
            .value()
            .clone()
    }

    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn reference_count(&self) -> usize {
        self.references.len()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|parent| parent.name.as_str()))
            .field("values", &self.values.len())
            .field("providers", &self.providers.len())
            .field("instances", &self.instances.len())
            .field("references", &self.references.len())
            .finish()
    }
}
