//! 注册元数据表
//!
//! 进程级的表，记录哪些类型和成员函数可注入、类型的作用域名称、参数的声明类型
//! 以及按位置的参数覆盖。表在启动阶段写入，之后只读。

use crate::arguments::Arguments;
use crate::provider::ProviderDescriptor;
use infrastructure_common::{AnyArc, DependencyResult, Key, ReferenceToken, Symbol, TypeInfo};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, warn};

/// 构造函数类型
pub type ConstructorFn = Arc<dyn Fn(Arguments) -> DependencyResult<AnyArc> + Send + Sync>;

/// 参数声明
///
/// 声明类型按顺序排列；覆盖点是稀疏的，按位置索引
#[derive(Debug, Clone, Default)]
pub struct ParameterList {
    /// 参数声明类型
    pub types: Vec<TypeInfo>,
    /// 参数覆盖
    pub overrides: BTreeMap<usize, ProviderDescriptor>,
}

impl ParameterList {
    /// 追加按类型解析的参数
    pub fn push(&mut self, declared: TypeInfo) {
        self.types.push(declared);
    }

    /// 追加带覆盖的参数
    pub fn push_with_override(&mut self, declared: TypeInfo, descriptor: ProviderDescriptor) {
        let index = self.types.len();
        self.types.push(declared);
        self.set_override(index, descriptor);
    }

    /// 设置指定位置的覆盖，同一位置后写入者生效
    pub fn set_override(&mut self, index: usize, descriptor: ProviderDescriptor) {
        if let Some(previous) = self.overrides.insert(index, descriptor) {
            warn!("参数 {} 的覆盖被替换, 原提供者: {}", index, previous.key);
        }
    }

    /// 获取指定位置的覆盖
    pub fn override_at(&self, index: usize) -> Option<&ProviderDescriptor> {
        self.overrides.get(&index)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// 参数声明构建 trait
///
/// 类型注册与成员函数注册共享同一套参数声明方法
pub trait ParameterBuilder: Sized {
    /// 获取参数声明
    fn parameters_mut(&mut self) -> &mut ParameterList;

    /// 按声明类型解析的参数
    fn parameter<D: ?Sized + 'static>(mut self) -> Self {
        self.parameters_mut().push(TypeInfo::of::<D>());
        self
    }

    /// 按键查找字面值的参数
    fn value_parameter<V: Any + Send + Sync>(mut self, key: impl Into<Key>) -> Self {
        self.parameters_mut()
            .push_with_override(TypeInfo::of::<V>(), ProviderDescriptor::value(key));
        self
    }

    /// 延迟解析的参数
    fn lazy_parameter<D: ?Sized + 'static>(mut self) -> Self {
        let target = TypeInfo::of::<D>();
        self.parameters_mut()
            .push_with_override(target, ProviderDescriptor::lazy(target));
        self
    }

    /// 通过引用键注入的参数
    fn inject_parameter<D: ?Sized + 'static>(mut self, key: impl Into<Key>) -> Self {
        self.parameters_mut()
            .push_with_override(TypeInfo::of::<D>(), ProviderDescriptor::inject(key));
        self
    }

    /// 通过类型注入的参数
    fn inject_type_parameter<D: ?Sized + 'static>(mut self) -> Self {
        let target = TypeInfo::of::<D>();
        self.parameters_mut()
            .push_with_override(target, ProviderDescriptor::inject_type(target));
        self
    }

    /// 使用任意提供者的参数
    fn provide_parameter<V: ?Sized + 'static>(
        mut self,
        key: impl Into<Key>,
        args: Vec<AnyArc>,
    ) -> Self {
        self.parameters_mut().push_with_override(
            TypeInfo::of::<V>(),
            ProviderDescriptor::provide(key, args),
        );
        self
    }

    /// 为已有位置设置覆盖
    fn override_parameter(mut self, index: usize, descriptor: ProviderDescriptor) -> Self {
        self.parameters_mut().set_override(index, descriptor);
        self
    }
}

/// 类型注册信息
#[derive(Clone)]
pub struct TypeRegistration {
    /// 类型信息
    pub type_info: TypeInfo,
    /// 引用令牌，作为实例缓存键
    pub reference: ReferenceToken,
    /// 作用域名称，`None` 表示从不缓存
    pub scope: Option<Cow<'static, str>>,
    /// 构造函数参数
    pub parameters: ParameterList,
    /// 构造函数
    pub constructor: ConstructorFn,
}

impl TypeRegistration {
    /// 开始描述一个可注入类型
    pub fn of<T: Any + Send + Sync>() -> TypeRegistrationBuilder<T> {
        TypeRegistrationBuilder {
            scope: None,
            parameters: ParameterList::default(),
            _marker: PhantomData,
        }
    }

    /// 实例缓存键
    pub fn instance_key(&self) -> Key {
        Key::Symbol(self.reference)
    }

    /// 作用域名称
    pub fn scope_name(&self) -> Option<&str> {
        self.scope.as_deref()
    }
}

impl std::fmt::Debug for TypeRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistration")
            .field("type_info", &self.type_info)
            .field("reference", &self.reference)
            .field("scope", &self.scope)
            .field("parameters", &self.parameters)
            .field("constructor", &"<function>")
            .finish()
    }
}

/// 类型注册构建器
pub struct TypeRegistrationBuilder<T> {
    scope: Option<Cow<'static, str>>,
    parameters: ParameterList,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> TypeRegistrationBuilder<T> {
    /// 设置作用域名称
    pub fn scope(mut self, scope: impl Into<Cow<'static, str>>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// 设置构造函数并完成注册描述
    pub fn construct<F>(self, constructor: F) -> TypeRegistration
    where
        F: Fn(Arguments) -> DependencyResult<T> + Send + Sync + 'static,
    {
        TypeRegistration {
            type_info: TypeInfo::of::<T>(),
            reference: Symbol::new("injection:class:reference"),
            scope: self.scope,
            parameters: self.parameters,
            constructor: Arc::new(move |args| constructor(args).map(|value| Arc::new(value) as AnyArc)),
        }
    }
}

impl<T> ParameterBuilder for TypeRegistrationBuilder<T> {
    fn parameters_mut(&mut self) -> &mut ParameterList {
        &mut self.parameters
    }
}

/// 成员函数注册信息
#[derive(Debug, Clone)]
pub struct FunctionRegistration {
    /// 所属类型
    pub owner: TypeInfo,
    /// 成员名称
    pub member: Cow<'static, str>,
    /// 成员引用令牌
    pub reference: ReferenceToken,
    /// 函数参数
    pub parameters: ParameterList,
}

impl FunctionRegistration {
    /// 描述所属类型上的可注入成员函数
    pub fn of<O: ?Sized + 'static>(member: impl Into<Cow<'static, str>>) -> Self {
        Self {
            owner: TypeInfo::of::<O>(),
            member: member.into(),
            reference: Symbol::new("injection:function:reference"),
            parameters: ParameterList::default(),
        }
    }
}

impl ParameterBuilder for FunctionRegistration {
    fn parameters_mut(&mut self) -> &mut ParameterList {
        &mut self.parameters
    }
}

/// 可注入类型 trait
///
/// 通常由 `#[derive(Injectable)]` 实现
pub trait Injectable: Any + Send + Sync {
    /// 描述类型的注册信息
    fn registration() -> TypeRegistration;
}

type FunctionKey = (TypeId, Cow<'static, str>);

#[derive(Default)]
struct RegistrationTable {
    types: HashMap<TypeId, Arc<TypeRegistration>>,
    functions: HashMap<FunctionKey, Arc<FunctionRegistration>>,
}

/// 全局注册表
static REGISTRATION_TABLE: Lazy<RwLock<RegistrationTable>> =
    Lazy::new(|| RwLock::new(RegistrationTable::default()));

/// 将类型标记为可注入
///
/// 重复注册时保留首次生成的引用令牌，其余信息以最后一次为准
pub fn register_type(mut registration: TypeRegistration) -> ReferenceToken {
    let mut table = REGISTRATION_TABLE.write();
    let type_id = registration.type_info.id;
    if let Some(existing) = table.types.get(&type_id) {
        warn!("类型重复注册: {}", registration.type_info);
        registration.reference = existing.reference;
    } else {
        debug!(
            "注册可注入类型: {} (作用域: {:?})",
            registration.type_info, registration.scope
        );
    }
    let reference = registration.reference;
    table.types.insert(type_id, Arc::new(registration));
    reference
}

/// 注册实现了 [`Injectable`] 的类型
pub fn register<T: Injectable>() -> ReferenceToken {
    register_type(T::registration())
}

/// 将成员函数标记为可注入
pub fn register_function(mut registration: FunctionRegistration) -> ReferenceToken {
    let mut table = REGISTRATION_TABLE.write();
    let key = (registration.owner.id, registration.member.clone());
    if let Some(existing) = table.functions.get(&key) {
        warn!(
            "成员函数重复注册: {}::{}",
            registration.owner, registration.member
        );
        registration.reference = existing.reference;
    } else {
        debug!(
            "注册可注入成员函数: {}::{}",
            registration.owner, registration.member
        );
    }
    let reference = registration.reference;
    table.functions.insert(key, Arc::new(registration));
    reference
}

/// 获取类型注册信息
pub fn type_registration(type_id: TypeId) -> Option<Arc<TypeRegistration>> {
    REGISTRATION_TABLE.read().types.get(&type_id).cloned()
}

/// 获取成员函数注册信息
pub fn function_registration(owner: TypeId, member: &str) -> Option<Arc<FunctionRegistration>> {
    let key: FunctionKey = (owner, Cow::Owned(member.to_string()));
    REGISTRATION_TABLE.read().functions.get(&key).cloned()
}

/// 类型是否可注入
pub fn is_resolvable<T: ?Sized + 'static>() -> bool {
    is_resolvable_type(TypeId::of::<T>())
}

/// 类型是否可注入（使用 TypeId）
pub fn is_resolvable_type(type_id: TypeId) -> bool {
    REGISTRATION_TABLE.read().types.contains_key(&type_id)
}

/// 成员函数是否可注入
pub fn is_resolvable_function(owner: TypeId, member: &str) -> bool {
    function_registration(owner, member).is_some()
}

/// 获取类型的引用令牌
pub fn reference_of(type_id: TypeId) -> Option<ReferenceToken> {
    type_registration(type_id).map(|registration| registration.reference)
}

/// 获取类型的作用域名称
pub fn scope_of(type_id: TypeId) -> Option<String> {
    type_registration(type_id)
        .and_then(|registration| registration.scope.as_ref().map(|scope| scope.to_string()))
}

/// 获取所有已注册类型
pub fn registered_types() -> Vec<TypeInfo> {
    REGISTRATION_TABLE
        .read()
        .types
        .values()
        .map(|registration| registration.type_info)
        .collect()
}
