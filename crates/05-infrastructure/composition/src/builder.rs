//! 注入器构建器

use di_impl::{provider_fn, ContainerSeed, Injector};
use infrastructure_common::{
    AnyArc, ConfigError, DependencyResult, InfrastructureError, InfrastructureResult, Key,
};
use serde::de::DeserializeOwned;
use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 合并后的配置在根容器中的键
pub const CONFIGURATION_KEY: &str = "configuration";

/// 配置源
#[derive(Debug, Clone)]
enum ConfigSource {
    Toml(PathBuf),
    Json(PathBuf),
    Environment(String),
}

type BindFn = Box<dyn Fn(&config::Config, &str) -> Result<AnyArc, config::ConfigError> + Send + Sync>;

/// 配置节到根容器字面值的绑定
struct ValueBinding {
    key: Key,
    path: String,
    type_name: &'static str,
    bind: BindFn,
}

/// 注入器构建器
///
/// 使用建造者模式组装根容器的种子数据，配置源按添加顺序叠加，后添加的覆盖先添加的
pub struct InjectorBuilder {
    /// 配置源列表
    config_sources: Vec<ConfigSource>,
    /// 配置绑定
    bindings: Vec<ValueBinding>,
    /// 根容器种子
    seed: ContainerSeed,
    /// 是否启用日志初始化
    logging_enabled: bool,
    /// 日志配置
    logging_config: LoggingConfig,
}

impl InjectorBuilder {
    /// 创建新的注入器构建器
    pub fn new() -> Self {
        Self {
            config_sources: Vec::new(),
            bindings: Vec::new(),
            seed: ContainerSeed::new(),
            logging_enabled: false, // 默认不启用日志初始化
            logging_config: LoggingConfig::default(),
        }
    }

    fn existing_file(path: &Path) -> InfrastructureResult<PathBuf> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            }
            .into());
        }
        Ok(path.to_path_buf())
    }

    /// 添加 TOML 配置文件
    pub fn add_config_toml<P: AsRef<Path>>(mut self, path: P) -> InfrastructureResult<Self> {
        let path = Self::existing_file(path.as_ref())?;
        info!("添加 TOML 配置文件: {}", path.display());
        self.config_sources.push(ConfigSource::Toml(path));
        Ok(self)
    }

    /// 添加 JSON 配置文件
    pub fn add_config_json<P: AsRef<Path>>(mut self, path: P) -> InfrastructureResult<Self> {
        let path = Self::existing_file(path.as_ref())?;
        info!("添加 JSON 配置文件: {}", path.display());
        self.config_sources.push(ConfigSource::Json(path));
        Ok(self)
    }

    /// 添加环境变量配置源
    ///
    /// `PREFIX_A__B` 对应配置路径 `a.b`
    pub fn add_config_env_vars<S: Into<String>>(mut self, prefix: S) -> Self {
        let prefix = prefix.into();
        info!("添加环境变量配置源，前缀: {}", prefix);
        self.config_sources.push(ConfigSource::Environment(prefix));
        self
    }

    /// 将配置节反序列化后作为根容器字面值
    pub fn bind_value<T>(mut self, key: impl Into<Key>, path: impl Into<String>) -> Self
    where
        T: DeserializeOwned + Any + Send + Sync,
    {
        let key = key.into();
        let path = path.into();
        debug!("绑定配置: {} -> {}", path, key);
        self.bindings.push(ValueBinding {
            key,
            path,
            type_name: std::any::type_name::<T>(),
            bind: Box::new(|settings, path| {
                settings
                    .get::<T>(path)
                    .map(|value| Arc::new(value) as AnyArc)
            }),
        });
        self
    }

    /// 添加根容器字面值
    pub fn value<V: Any + Send + Sync>(mut self, key: impl Into<Key>, value: V) -> Self {
        self.seed = self.seed.value(key, value);
        self
    }

    /// 添加根容器提供者
    pub fn provider<F>(mut self, key: impl Into<Key>, provider: F) -> Self
    where
        F: Fn(&Injector, &[AnyArc]) -> DependencyResult<AnyArc> + Send + Sync + 'static,
    {
        self.seed = self.seed.provider(key, provider_fn(provider));
        self
    }

    /// 预置根容器实例
    pub fn instance<T: Any + Send + Sync>(mut self, key: impl Into<Key>, instance: Arc<T>) -> Self {
        self.seed = self.seed.instance(key, instance);
        self
    }

    /// 添加根容器引用映射
    pub fn reference<T: ?Sized + 'static>(mut self, key: impl Into<Key>) -> Self {
        self.seed = self.seed.reference::<T>(key);
        self
    }

    /// 配置日志
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging_config = config;
        self.logging_enabled = true; // 启用日志初始化
        self
    }

    /// 构建根注入器
    pub fn build(self) -> InfrastructureResult<Injector> {
        // 只有在明确配置了日志时才初始化日志
        if self.logging_enabled {
            self.initialize_logging();
        }

        info!("开始构建注入器");

        let mut seed = self.seed;
        if !self.config_sources.is_empty() || !self.bindings.is_empty() {
            let settings = Self::load_configuration(&self.config_sources)?;

            for binding in &self.bindings {
                let value = (binding.bind)(&settings, &binding.path)
                    .map_err(|e| Self::binding_error(binding, e))?;
                debug!("配置绑定成功: {} ({})", binding.path, binding.type_name);
                seed = seed.shared_value(binding.key.clone(), value);
            }

            seed = seed.value(CONFIGURATION_KEY, settings);
        }

        let injector = Injector::new(seed);
        info!("注入器构建完成: {}", injector.container().id());
        Ok(injector)
    }

    fn load_configuration(sources: &[ConfigSource]) -> InfrastructureResult<config::Config> {
        let builder = sources
            .iter()
            .fold(config::Config::builder(), |builder, source| match source {
                ConfigSource::Toml(path) => builder.add_source(
                    config::File::from(path.as_path()).format(config::FileFormat::Toml),
                ),
                ConfigSource::Json(path) => builder.add_source(
                    config::File::from(path.as_path()).format(config::FileFormat::Json),
                ),
                ConfigSource::Environment(prefix) => builder.add_source(
                    config::Environment::with_prefix(prefix)
                        .prefix_separator("_")
                        .separator("__"),
                ),
            });

        let settings = builder.build().map_err(|e| ConfigError::LoadError {
            source: Box::new(e),
        })?;
        debug!("配置加载完成, 配置源数量: {}", sources.len());
        Ok(settings)
    }

    fn binding_error(binding: &ValueBinding, error: config::ConfigError) -> InfrastructureError {
        match error {
            config::ConfigError::NotFound(_) => ConfigError::KeyNotFound {
                key: binding.path.clone(),
            },
            other => ConfigError::TypeConversionError {
                key: binding.path.clone(),
                message: other.to_string(),
            },
        }
        .into()
    }

    /// 初始化日志系统
    fn initialize_logging(&self) {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(self.logging_config.level)
            .with_target(self.logging_config.show_target)
            .with_thread_ids(self.logging_config.show_thread_ids)
            .with_file(self.logging_config.show_file)
            .with_line_number(self.logging_config.show_line_number);

        let result = if self.logging_config.json_format {
            subscriber.json().try_init()
        } else {
            subscriber.try_init()
        };

        // 全局订阅者只能设置一次，重复初始化时沿用已有的
        match result {
            Ok(()) => info!("日志系统初始化完成"),
            Err(e) => warn!("日志系统已初始化, 跳过: {}", e),
        }
    }
}

impl Default for InjectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: tracing::Level,
    /// 是否显示目标
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
    /// 是否显示文件名
    pub show_file: bool,
    /// 是否显示行号
    pub show_line_number: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// 创建开发环境日志配置
    pub fn development() -> Self {
        Self {
            level: tracing::Level::DEBUG,
            show_target: true,
            show_thread_ids: true,
            show_file: true,
            show_line_number: true,
            json_format: false,
        }
    }

    /// 创建生产环境日志配置
    pub fn production() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: true,
        }
    }
}
