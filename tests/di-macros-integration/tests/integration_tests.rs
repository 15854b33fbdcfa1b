//! 可注入类型宏集成测试

use di_abstractions::{
    function_registration, is_resolvable, is_resolvable_function, scope_of, type_registration,
    Injectable,
};
use di_impl::{ContainerSeed, Injector, Lazy};
use di_macros::{injectable_methods, Injectable};
use infrastructure_common::{AnyArc, Key, LookupKind, REQUEST_SCOPE};
use std::any::TypeId;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

static AUDIT_CONSTRUCTIONS: AtomicUsize = AtomicUsize::new(0);

/// 根作用域仓储
#[derive(Debug, Injectable)]
#[injectable(root)]
pub struct OrderRepository;

/// 按引用键注入的网关
#[derive(Debug, Injectable)]
#[injectable(module)]
pub struct PaymentGateway;

/// 延迟构造的审计日志
#[derive(Debug)]
pub struct AuditLog;

impl Injectable for AuditLog {
    fn registration() -> di_abstractions::TypeRegistration {
        di_abstractions::TypeRegistration::of::<Self>()
            .scope("root")
            .construct(|_| {
                AUDIT_CONSTRUCTIONS.fetch_add(1, Ordering::SeqCst);
                Ok(AuditLog)
            })
    }
}

#[ctor::ctor]
fn register_audit_log() {
    di_abstractions::register::<AuditLog>();
}

/// 使用全部字段注解的服务
#[derive(Debug, Injectable)]
#[injectable(scope = "request")]
pub struct OrderService {
    repository: Arc<OrderRepository>,
    #[value("tenant")]
    tenant: String,
    #[value("limits")]
    limits: Arc<Vec<u32>>,
    #[inject("payment")]
    payment: Arc<PaymentGateway>,
    #[inject]
    direct: Arc<OrderRepository>,
    #[lazy]
    audit: Lazy<AuditLog>,
    #[provide("clock")]
    now: u64,
    #[injectable(default)]
    handled: AtomicUsize,
}

/// 不缓存的服务
#[derive(Debug, Injectable)]
pub struct TransientService;

/// 蛇形命名相同的两个类型
#[derive(Debug, Injectable)]
#[injectable(root)]
pub struct HTTPClient;

#[derive(Debug, Injectable)]
#[injectable(root)]
pub struct HttpClient;

/// 成员函数可注入的控制器
pub struct OrderController;

#[injectable_methods]
impl OrderController {
    #[injectable]
    pub fn place(
        &self,
        repository: Arc<OrderRepository>,
        #[value("tenant")] tenant: String,
        #[lazy] audit: Lazy<AuditLog>,
    ) -> String {
        let _ = (repository, audit);
        tenant
    }

    pub fn helper(&self) {}
}

fn request_scope(root: &Injector) -> Injector {
    let module = root.extend_with(
        "module",
        ContainerSeed::new().reference::<PaymentGateway>("payment"),
    );
    module.extend_with(
        REQUEST_SCOPE,
        ContainerSeed::new()
            .value("tenant", "acme".to_string())
            .value("limits", vec![1_u32, 2, 3])
            .provider_fn("clock", |_, _| Ok(Arc::new(1_700_000_000_u64) as AnyArc)),
    )
}

#[test]
fn test_derive_registers_types() {
    assert!(is_resolvable::<OrderRepository>());
    assert!(is_resolvable::<OrderService>());
    assert_eq!(scope_of(TypeId::of::<OrderRepository>()).as_deref(), Some("root"));
    assert_eq!(scope_of(TypeId::of::<OrderService>()).as_deref(), Some("request"));
    assert_eq!(scope_of(TypeId::of::<TransientService>()), None);

    let registration = type_registration(TypeId::of::<OrderService>()).unwrap();
    assert_eq!(registration.parameters.len(), 7);
    assert!(registration.parameters.override_at(0).is_none());
    assert!(registration.parameters.override_at(1).is_some());
}

#[test]
fn test_resolve_annotated_service() {
    let root = Injector::root();
    let request = request_scope(&root);

    let service = request.resolve::<OrderService>().unwrap();
    assert_eq!(service.tenant, "acme");
    assert_eq!(*service.limits, vec![1, 2, 3]);
    assert_eq!(service.now, 1_700_000_000);
    assert_eq!(service.handled.load(Ordering::SeqCst), 0);
    assert!(Arc::ptr_eq(&service.repository, &service.direct));
    assert!(Arc::ptr_eq(
        &service.payment,
        &request.resolve::<PaymentGateway>().unwrap()
    ));

    let again = request.resolve::<OrderService>().unwrap();
    assert!(Arc::ptr_eq(&service, &again));
}

#[test]
fn test_lazy_field_constructs_on_first_access() {
    let root = Injector::root();
    let request = request_scope(&root);
    let service = request.resolve::<OrderService>().unwrap();

    assert!(!service.audit.is_resolved());
    let before = AUDIT_CONSTRUCTIONS.load(Ordering::SeqCst);
    let first = service.audit.get().unwrap();
    let second = service.audit.get().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(AUDIT_CONSTRUCTIONS.load(Ordering::SeqCst), before + 1);
}

#[test]
fn test_missing_value_fails_resolution() {
    let root = Injector::root();
    let module = root.extend_with("module", ContainerSeed::new());

    let error = module.resolve::<OrderService>().unwrap_err();
    assert!(error.is_unresolved_key());
    assert_eq!(error.lookup_kind(), Some(LookupKind::Value));
    assert!(!module.has_value(&Key::from("tenant")));
}

#[test]
fn test_transient_service() {
    let root = Injector::root();
    let first = root.resolve::<TransientService>().unwrap();
    let second = root.resolve::<TransientService>().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn test_types_with_same_snake_case_name() {
    let root = Injector::root();
    assert!(is_resolvable::<HTTPClient>());
    assert!(is_resolvable::<HttpClient>());
    assert!(root.resolve::<HTTPClient>().is_ok());
    assert!(root.resolve::<HttpClient>().is_ok());
}

#[test]
fn test_injectable_methods_register_members() {
    let owner = TypeId::of::<OrderController>();
    assert!(is_resolvable_function(owner, "place"));
    assert!(!is_resolvable_function(owner, "helper"));
    assert_eq!(function_registration(owner, "place").unwrap().parameters.len(), 3);

    let root = Injector::root();
    let request = request_scope(&root);
    let args = request
        .resolve_function_arguments::<OrderController>("place")
        .unwrap();
    assert_eq!(args.len(), 3);

    let repository = args.get::<OrderRepository>(0).unwrap();
    assert!(Arc::ptr_eq(&repository, &root.resolve::<OrderRepository>().unwrap()));
    let tenant = args.value::<String>(1).unwrap();
    let audit = Lazy::<AuditLog>::from_arguments(&args, 2).unwrap();
    assert_eq!(OrderController.place(repository, tenant, audit), "acme");
}
