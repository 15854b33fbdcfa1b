//! 常用作用域
//!
//! 根作用域在启动时创建一次，模块作用域按模块创建，请求作用域按工作单元创建并在
//! 工作单元结束时释放。

use di_impl::{ContainerSeed, Injector};
use infrastructure_common::{MODULE_SCOPE, REQUEST_SCOPE};
use tracing::debug_span;

/// 创建模块作用域
pub fn module_scope(parent: &Injector, seed: ContainerSeed) -> Injector {
    parent.extend_with(MODULE_SCOPE, seed)
}

/// 创建请求作用域
pub fn request_scope(parent: &Injector, seed: ContainerSeed) -> Injector {
    parent.extend_with(REQUEST_SCOPE, seed)
}

/// 在新的请求作用域中执行工作单元
///
/// 作用域只在 `work` 执行期间存活，除非 `work` 把注入器带出
pub fn with_request_scope<R>(
    parent: &Injector,
    seed: ContainerSeed,
    work: impl FnOnce(&Injector) -> R,
) -> R {
    let scope = request_scope(parent, seed);
    let span = debug_span!("request", container = %scope.container().id());
    let _entered = span.enter();
    work(&scope)
}
