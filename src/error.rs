//! 统一错误处理模块
//!
//! 定义应用级错误类型。单个模块的生成失败不会走到这里，
//! 只有配置错误和输出根目录等文件系统错误才会中止整个运行。

use std::path::PathBuf;
use thiserror::Error;

use crate::llm::LlmError;
use crate::services::doc_generator::ScanError;

/// 应用错误枚举
#[derive(Error, Debug)]
pub enum AppError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(String),

    /// LLM 后端初始化错误
    #[error("LLM 错误: {0}")]
    Llm(#[from] LlmError),

    /// 扫描错误
    #[error("扫描错误: {0}")]
    Scan(#[from] ScanError),

    /// 文件系统错误
    #[error("IO错误 ({0}): {1}")]
    Io(PathBuf, #[source] std::io::Error),

    /// 序列化错误
    #[error("序列化失败: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// 便捷类型别名
pub type AppResult<T> = Result<T, AppError>;
