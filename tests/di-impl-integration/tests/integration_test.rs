//! 依赖注入实现的集成测试

use di_abstractions::{
    reference_of, register_function, register_type, FunctionRegistration, ParameterBuilder,
    ProviderDescriptor, TypeRegistration, PROVIDER_VALUE,
};
use di_impl::{ContainerSeed, Injector, Lazy};
use infrastructure_common::{
    AnyArc, DependencyError, Key, LookupKind, TypeInfo, MODULE_SCOPE, REQUEST_SCOPE, ROOT_SCOPE,
};
use std::any::TypeId;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 持有字面值的组件
#[derive(Debug)]
struct Configured {
    x: i32,
}

/// 根作用域单例
#[derive(Debug)]
struct RootSingleton;

/// 请求作用域组件，带可变状态
#[derive(Debug, Default)]
struct RequestState {
    hits: Mutex<Vec<String>>,
}

/// 通过引用键注入
#[derive(Debug)]
struct NeedsService {
    service: Arc<RootSingleton>,
}

fn register_fixtures() {
    register_type(
        TypeRegistration::of::<Configured>()
            .value_parameter::<i32>("x")
            .construct(|args| Ok(Configured { x: args.value(0)? })),
    );
    register_type(
        TypeRegistration::of::<RootSingleton>()
            .scope(ROOT_SCOPE)
            .construct(|_| Ok(RootSingleton)),
    );
    register_type(
        TypeRegistration::of::<RequestState>()
            .scope(REQUEST_SCOPE)
            .construct(|_| Ok(RequestState::default())),
    );
    register_type(
        TypeRegistration::of::<NeedsService>()
            .inject_parameter::<RootSingleton>("svc")
            .construct(|args| {
                Ok(NeedsService {
                    service: args.get(0)?,
                })
            }),
    );
}

#[test]
fn test_has_and_find_follow_chain() {
    let root = Injector::new(
        ContainerSeed::new()
            .value("x", 1_i32)
            .reference::<RootSingleton>("svc"),
    );
    let child = root.extend_with("child", ContainerSeed::new().value("x", 2_i32));

    assert!(child.has_value(&Key::from("x")));
    assert!(child.has_reference(&Key::from("svc")));
    assert!(child.has_scope(ROOT_SCOPE));
    assert!(child.has_scope("child"));
    assert!(!root.has_scope("child"));

    assert_eq!(*child.value::<i32>("x").unwrap(), 2);
    assert_eq!(*root.value::<i32>("x").unwrap(), 1);

    // 从父容器新建的注入器看不到子容器
    let parent_only = Injector::of(root.container().clone());
    assert_eq!(*parent_only.value::<i32>("x").unwrap(), 1);
}

#[test]
fn test_provider_lookup_prefers_nearest_container() {
    let clock = ProviderDescriptor::provide("clock", Vec::new());
    let root = Injector::new(
        ContainerSeed::new()
            .value("x", 1_i32)
            .provider_fn("clock", |_, _| Ok(Arc::new(1_u64) as AnyArc)),
    );
    let child = root.extend_with(
        "child",
        ContainerSeed::new()
            .provider_fn("clock", |_, _| Ok(Arc::new(2_u64) as AnyArc))
            .provider_fn(Key::Symbol(*PROVIDER_VALUE), |_, _| Ok(Arc::new(7_i32) as AnyArc)),
    );

    let from_child = child.resolve_provider(&clock).unwrap();
    let from_root = root.resolve_provider(&clock).unwrap();
    assert_eq!(*from_child.downcast::<u64>().unwrap(), 2);
    assert_eq!(*from_root.downcast::<u64>().unwrap(), 1);

    // 子容器替换了内置字面值提供者，父容器保留原来的
    let value = ProviderDescriptor::value("x");
    let from_child = child.resolve_provider(&value).unwrap();
    let from_root = root.resolve_provider(&value).unwrap();
    assert_eq!(*from_child.downcast::<i32>().unwrap(), 7);
    assert_eq!(*from_root.downcast::<i32>().unwrap(), 1);

    register_fixtures();
    assert_eq!(child.resolve::<Configured>().unwrap().x, 7);
    assert_eq!(root.resolve::<Configured>().unwrap().x, 1);
}

#[test]
fn test_instance_lookup_prefers_nearest_container() {
    register_fixtures();
    let root = Injector::root();
    let cached = root.resolve::<RootSingleton>().unwrap();
    let key = Key::Symbol(reference_of(TypeId::of::<RootSingleton>()).unwrap());

    let seeded = Arc::new(RootSingleton);
    let child = root.extend_with("child", ContainerSeed::new().instance(key.clone(), seeded.clone()));

    let from_child = child.find_instance(&key).unwrap();
    let from_root = root.find_instance(&key).unwrap();
    assert!(Arc::ptr_eq(&from_child.downcast::<RootSingleton>().unwrap(), &seeded));
    assert!(Arc::ptr_eq(&from_root.downcast::<RootSingleton>().unwrap(), &cached));
    assert!(Arc::ptr_eq(&child.resolve::<RootSingleton>().unwrap(), &seeded));
}

#[test]
fn test_reference_lookup_prefers_nearest_container() {
    let root = Injector::new(ContainerSeed::new().reference::<RootSingleton>("svc"));
    let child = root.extend_with("child", ContainerSeed::new().reference::<Configured>("svc"));
    let svc = Key::from("svc");

    assert_eq!(child.find_reference(&svc).unwrap(), TypeInfo::of::<Configured>());
    assert_eq!(root.find_reference(&svc).unwrap(), TypeInfo::of::<RootSingleton>());
}

#[test]
fn test_missing_keys() {
    let injector = Injector::root().extend_with("child", ContainerSeed::new());
    let unknown = Key::from("unknown");

    assert!(!injector.has_value(&unknown));
    assert!(!injector.has_provider(&unknown));
    assert!(!injector.has_instance(&unknown));
    assert!(!injector.has_reference(&unknown));
    assert!(!injector.has_scope("unknown"));

    let kinds = [
        injector.find_value(&unknown).unwrap_err(),
        injector.find_provider(&unknown).err().unwrap(),
        injector.find_instance(&unknown).unwrap_err(),
        injector.find_reference(&unknown).unwrap_err(),
        injector.find_scope("unknown").unwrap_err(),
    ]
    .iter()
    .map(|error| error.lookup_kind())
    .collect::<Vec<_>>();

    assert_eq!(
        kinds,
        vec![
            Some(LookupKind::Value),
            Some(LookupKind::Provider),
            Some(LookupKind::Instance),
            Some(LookupKind::Reference),
            Some(LookupKind::Scope),
        ]
    );
}

#[test]
fn test_value_parameter_from_extended_scope() {
    register_fixtures();
    let root = Injector::new(ContainerSeed::new().value("x", 100_i32));
    let ext = root.extend_with("ext", ContainerSeed::new());

    let configured = ext.resolve::<Configured>().unwrap();
    assert_eq!(configured.x, 100);
}

#[test]
fn test_root_singleton_shared_by_children() {
    register_fixtures();
    let root = Injector::root();
    let first = root.extend_with("first", ContainerSeed::new());
    let second = root.extend_with("second", ContainerSeed::new());

    let a = first.resolve::<RootSingleton>().unwrap();
    let b = second.resolve::<RootSingleton>().unwrap();
    let c = root.resolve::<RootSingleton>().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&a, &c));
}

#[test]
fn test_request_scope_without_request_container_is_transient() {
    register_fixtures();
    let module = Injector::root().extend_with(MODULE_SCOPE, ContainerSeed::new());

    let first = module.resolve::<RequestState>().unwrap();
    let second = module.resolve::<RequestState>().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));

    first.hits.lock().unwrap().push("first".to_string());
    assert!(second.hits.lock().unwrap().is_empty());
}

#[test]
fn test_request_scope_caches_per_request() {
    register_fixtures();
    let module = Injector::root().extend_with(MODULE_SCOPE, ContainerSeed::new());
    let request = module.extend_with(REQUEST_SCOPE, ContainerSeed::new());
    let nested = request.extend_with("handler", ContainerSeed::new());

    let a = request.resolve::<RequestState>().unwrap();
    let b = nested.resolve::<RequestState>().unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    let other = module.extend_with(REQUEST_SCOPE, ContainerSeed::new());
    let c = other.resolve::<RequestState>().unwrap();
    assert!(!Arc::ptr_eq(&a, &c));
}

#[test]
fn test_inject_by_missing_reference_fails() {
    register_fixtures();
    let injector = Injector::root();

    let error = injector.resolve::<NeedsService>().unwrap_err();
    assert!(error.is_unresolved_key());
    assert_eq!(error.lookup_kind(), Some(LookupKind::Reference));
    assert_eq!(error.to_string(), "no reference found for key svc");
}

#[test]
fn test_inject_by_reference_in_child_scope() {
    register_fixtures();
    let root = Injector::root();
    let child = root.extend_with("child", ContainerSeed::new().reference::<RootSingleton>("svc"));

    let needs = child.resolve::<NeedsService>().unwrap();
    let singleton = root.resolve::<RootSingleton>().unwrap();
    assert!(Arc::ptr_eq(&needs.service, &singleton));
}

#[test]
fn test_not_resolvable_type() {
    #[derive(Debug)]
    struct Unregistered;

    let error = Injector::root().resolve::<Unregistered>().unwrap_err();
    assert!(error.is_not_resolvable());
}

/// 可注入成员函数的所属类型
struct Controller;

#[test]
fn test_resolve_function_arguments() {
    register_fixtures();
    register_function(
        FunctionRegistration::of::<Controller>("handle")
            .parameter::<RootSingleton>()
            .value_parameter::<String>("query"),
    );

    let root = Injector::root();
    let request = root.extend_with(
        REQUEST_SCOPE,
        ContainerSeed::new().value("query", "select".to_string()),
    );

    let args = request.resolve_function_arguments::<Controller>("handle").unwrap();
    assert_eq!(args.len(), 2);
    assert!(Arc::ptr_eq(
        &args.get::<RootSingleton>(0).unwrap(),
        &root.resolve::<RootSingleton>().unwrap()
    ));
    assert_eq!(args.value::<String>(1).unwrap(), "select");

    let error = request
        .resolve_function_arguments::<Controller>("missing")
        .unwrap_err();
    assert!(matches!(error, DependencyError::FunctionNotResolvable { .. }));
}

#[test]
fn test_function_not_resolvable_even_without_parameters() {
    struct Empty;

    let error = Injector::root()
        .resolve_function_arguments::<Empty>("run")
        .unwrap_err();
    assert!(matches!(error, DependencyError::FunctionNotResolvable { .. }));
}

/// 构造一次失败的组件
#[derive(Debug)]
struct Flaky;

static FLAKY_FAILED: AtomicBool = AtomicBool::new(false);

#[test]
fn test_failed_construction_is_not_cached() {
    register_type(TypeRegistration::of::<Flaky>().scope(ROOT_SCOPE).construct(|_| {
        if FLAKY_FAILED.swap(true, Ordering::SeqCst) {
            Ok(Flaky)
        } else {
            Err(DependencyError::construction_failed("Flaky", "first attempt"))
        }
    }));

    let root = Injector::root();
    assert!(matches!(
        root.resolve::<Flaky>().unwrap_err(),
        DependencyError::ConstructionFailed { .. }
    ));
    let first = root.resolve::<Flaky>().unwrap();
    let second = root.resolve::<Flaky>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

/// 构造较慢的根作用域单例
struct Expensive;

static EXPENSIVE_CONSTRUCTIONS: AtomicUsize = AtomicUsize::new(0);

#[test]
fn test_concurrent_first_resolution_constructs_once() {
    register_type(TypeRegistration::of::<Expensive>().scope(ROOT_SCOPE).construct(|_| {
        EXPENSIVE_CONSTRUCTIONS.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(20));
        Ok(Expensive)
    }));

    let root = Injector::root();
    let instances: Vec<Arc<Expensive>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|index| {
                let request = root.extend_with(format!("request-{index}"), ContainerSeed::new());
                scope.spawn(move || request.resolve::<Expensive>().unwrap())
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    assert_eq!(EXPENSIVE_CONSTRUCTIONS.load(Ordering::SeqCst), 1);
    assert!(instances.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
}

/// 互相依赖的组件
#[derive(Debug)]
struct CycleA;
#[derive(Debug)]
struct CycleB;

#[test]
fn test_cycle_is_reported() {
    register_type(
        TypeRegistration::of::<CycleA>()
            .parameter::<CycleB>()
            .construct(|_| Ok(CycleA)),
    );
    register_type(
        TypeRegistration::of::<CycleB>()
            .parameter::<CycleA>()
            .construct(|_| Ok(CycleB)),
    );

    match Injector::root().resolve::<CycleA>().unwrap_err() {
        DependencyError::CircularDependency { dependency_chain } => {
            assert_eq!(dependency_chain, "CycleA -> CycleB -> CycleA");
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// 通过延迟依赖打破循环
struct Parent {
    child: Lazy<Child>,
}

struct Child {
    parent: Arc<Parent>,
}

static CHILD_CONSTRUCTIONS: AtomicUsize = AtomicUsize::new(0);

#[test]
fn test_lazy_breaks_cycle_and_resolves_once() {
    register_type(
        TypeRegistration::of::<Parent>()
            .scope(ROOT_SCOPE)
            .lazy_parameter::<Child>()
            .construct(|args| {
                Ok(Parent {
                    child: Lazy::from_arguments(&args, 0)?,
                })
            }),
    );
    register_type(
        TypeRegistration::of::<Child>()
            .scope(ROOT_SCOPE)
            .parameter::<Parent>()
            .construct(|args| {
                CHILD_CONSTRUCTIONS.fetch_add(1, Ordering::SeqCst);
                Ok(Child {
                    parent: args.get(0)?,
                })
            }),
    );

    let root = Injector::root();
    let parent = root.resolve::<Parent>().unwrap();
    assert!(!parent.child.is_resolved());
    assert_eq!(CHILD_CONSTRUCTIONS.load(Ordering::SeqCst), 0);

    let child = parent.child.get().unwrap();
    for _ in 0..3 {
        assert!(Arc::ptr_eq(&parent.child.get().unwrap(), &child));
    }
    assert!(Arc::ptr_eq(&child.parent, &parent));
    assert_eq!(CHILD_CONSTRUCTIONS.load(Ordering::SeqCst), 1);
}

/// 根作用域单例持有延迟依赖
struct Reporter {
    audit: Lazy<AuditSink>,
}

struct AuditSink;

#[test]
fn test_lazy_in_root_singleton_outlives_request() {
    register_type(
        TypeRegistration::of::<AuditSink>()
            .scope(ROOT_SCOPE)
            .construct(|_| Ok(AuditSink)),
    );
    register_type(
        TypeRegistration::of::<Reporter>()
            .scope(ROOT_SCOPE)
            .lazy_parameter::<AuditSink>()
            .construct(|args| {
                Ok(Reporter {
                    audit: Lazy::from_arguments(&args, 0)?,
                })
            }),
    );

    let root = Injector::root();
    let request_container = {
        let request = root.extend_with(REQUEST_SCOPE, ContainerSeed::new());
        let reporter = request.resolve::<Reporter>().unwrap();
        assert!(!reporter.audit.is_resolved());
        Arc::downgrade(request.container())
    };

    let reporter = root.resolve::<Reporter>().unwrap();
    let audit = reporter.audit.get().unwrap();
    assert!(Arc::ptr_eq(&audit, &root.resolve::<AuditSink>().unwrap()));

    // 首次解析后释放请求容器
    assert!(request_container.upgrade().is_none());
    assert!(Arc::ptr_eq(&reporter.audit.get().unwrap(), &audit));
}

#[test]
fn test_resolve_injector_from_scope() {
    let root = Injector::root();
    let request = root.extend_with(REQUEST_SCOPE, ContainerSeed::new());

    let resolved = request.resolve::<Injector>().unwrap();
    assert!(resolved.same_scope(&request));
    assert_eq!(resolved.name(), REQUEST_SCOPE);
}
