//! 位置参数列表

use infrastructure_common::{AnyArc, DependencyError, DependencyResult};
use std::any::Any;
use std::sync::Arc;

/// 将类型擦除的值还原为具体类型
pub fn downcast<T: Any + Send + Sync>(
    value: AnyArc,
    context: impl FnOnce() -> String,
) -> DependencyResult<Arc<T>> {
    value
        .downcast::<T>()
        .map_err(|_| DependencyError::TypeMismatch {
            expected: std::any::type_name::<T>().to_string(),
            context: context(),
        })
}

/// 已解析的位置参数
///
/// 构造函数和可注入成员函数按声明顺序接收
#[derive(Clone, Default)]
pub struct Arguments {
    values: Vec<AnyArc>,
}

impl Arguments {
    /// 创建参数列表
    pub fn new(values: Vec<AnyArc>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 取出类型擦除的参数
    pub fn any(&self, index: usize) -> DependencyResult<AnyArc> {
        self.values
            .get(index)
            .cloned()
            .ok_or(DependencyError::MissingArgument {
                index,
                len: self.values.len(),
            })
    }

    /// 取出共享参数
    pub fn get<T: Any + Send + Sync>(&self, index: usize) -> DependencyResult<Arc<T>> {
        downcast(self.any(index)?, || format!("参数 {}", index))
    }

    /// 取出参数的副本
    pub fn value<T: Any + Send + Sync + Clone>(&self, index: usize) -> DependencyResult<T> {
        self.get::<T>(index).map(|value| (*value).clone())
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnyArc> {
        self.values.iter()
    }

    pub fn into_inner(self) -> Vec<AnyArc> {
        self.values
    }
}

impl FromIterator<AnyArc> for Arguments {
    fn from_iter<I: IntoIterator<Item = AnyArc>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl std::fmt::Debug for Arguments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arguments")
            .field("len", &self.values.len())
            .finish()
    }
}
