//! 示例应用
//!
//! 演示根、模块与请求三层作用域：配置在根作用域加载，目录服务按模块缓存，
//! 处理器按请求构造，审计日志延迟到处理请求时才解析。

use anyhow::Context;
use clap::Parser;
use di_impl::{ContainerSeed, Injector, Lazy};
use di_macros::Injectable;
use infrastructure_composition::{
    module_scope, with_request_scope, InjectorBuilder, LoggingConfig,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "分层作用域注入示例")]
struct Args {
    /// 配置文件路径
    #[arg(short, long, default_value = "config/app.toml")]
    config: PathBuf,

    /// 模拟的请求数量
    #[arg(short, long, default_value_t = 4)]
    requests: u64,

    /// 模块数量
    #[arg(short, long, default_value_t = 2)]
    modules: usize,

    /// 使用 JSON 日志格式
    #[arg(long)]
    json_logs: bool,
}

/// 根作用域计数器
#[derive(Debug, Injectable)]
#[injectable(root)]
struct RequestCounter {
    #[injectable(default)]
    handled: AtomicU64,
}

/// 模块作用域目录服务
#[derive(Debug, Injectable)]
#[injectable(module)]
struct Catalog {
    counter: Arc<RequestCounter>,
    #[value("app.greeting")]
    greeting: String,
}

/// 延迟解析的审计日志
#[derive(Debug, Injectable)]
#[injectable(root)]
struct AuditTrail;

impl AuditTrail {
    fn record(&self, request_id: u64) {
        info!(request_id, "审计记录");
    }
}

/// 请求作用域处理器
#[derive(Debug, Injectable)]
#[injectable(request)]
struct RequestHandler {
    catalog: Arc<Catalog>,
    #[value("request.id")]
    request_id: u64,
    #[lazy]
    audit: Lazy<AuditTrail>,
}

impl RequestHandler {
    fn handle(&self) -> anyhow::Result<String> {
        let total = self.catalog.counter.handled.fetch_add(1, Ordering::SeqCst) + 1;
        self.audit.get()?.record(self.request_id);
        Ok(format!(
            "{} #{} (已处理 {})",
            self.catalog.greeting, self.request_id, total
        ))
    }
}

fn build_root(args: &Args) -> anyhow::Result<Injector> {
    let logging = if args.json_logs {
        LoggingConfig::production()
    } else {
        LoggingConfig::development()
    };

    let mut builder = InjectorBuilder::new()
        .with_logging(logging)
        .value("app.greeting", "你好".to_string());

    let config_found = args.config.exists();
    if config_found {
        builder = builder
            .add_config_toml(&args.config)
            .with_context(|| format!("加载配置文件失败: {}", args.config.display()))?
            .add_config_env_vars("APP")
            .bind_value::<String>("app.greeting", "app.greeting");
    }

    let root = builder.build()?;
    if !config_found {
        warn!(path = %args.config.display(), "配置文件不存在，使用默认问候语");
    }
    Ok(root)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let root = build_root(&args)?;
    info!(modules = args.modules, requests = args.requests, "启动示例应用");

    let modules: Vec<Injector> = (0..args.modules.max(1))
        .map(|_| module_scope(&root, ContainerSeed::new()))
        .collect();

    let replies = std::thread::scope(|s| {
        let workers: Vec<_> = (0..args.requests)
            .map(|request_id| {
                let module = &modules[request_id as usize % modules.len()];
                s.spawn(move || {
                    with_request_scope(
                        module,
                        ContainerSeed::new().value("request.id", request_id),
                        |scope| -> anyhow::Result<String> {
                            scope.resolve::<RequestHandler>()?.handle()
                        },
                    )
                })
            })
            .collect();

        workers
            .into_iter()
            .map(|worker| {
                worker
                    .join()
                    .map_err(|_| anyhow::anyhow!("请求线程异常退出"))?
            })
            .collect::<anyhow::Result<Vec<_>>>()
    })?;

    for reply in &replies {
        println!("{reply}");
    }

    let counter = root.resolve::<RequestCounter>()?;
    info!(
        handled = counter.handled.load(Ordering::SeqCst),
        "全部请求处理完成"
    );
    Ok(())
}
