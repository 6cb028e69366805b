//! LLM 类型定义

use serde::{Deserialize, Serialize};

/// 聊天消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// 角色：system, user
    pub role: String,
    /// 消息内容
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// 流式响应块
#[derive(Debug, Clone, Default)]
pub struct ChatChunk {
    /// 文本内容
    pub content: Option<String>,
    /// 完成原因
    pub finish_reason: Option<String>,
}

/// 生成选项
///
/// 文档生成要求确定性采样：温度为 0 且关闭随机采样。
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    /// 最大生成 token 数
    pub max_tokens: u32,
    /// 温度参数
    pub temperature: f64,
    /// 是否启用随机采样
    pub do_sample: bool,
}

/// 默认最大生成 token 数
pub const DEFAULT_MAX_NEW_TOKENS: u32 = 999;

impl Default for GenerationOptions {
    fn default() -> Self {
        Self::deterministic(DEFAULT_MAX_NEW_TOKENS)
    }
}

impl GenerationOptions {
    /// 创建确定性采样选项
    pub fn deterministic(max_tokens: u32) -> Self {
        Self {
            max_tokens,
            temperature: 0.0,
            do_sample: false,
        }
    }
}

/// 流式收集结果
#[derive(Debug, Clone, Default)]
pub struct StreamCollectResult {
    /// 完整响应内容
    pub content: String,
    /// 完成原因
    pub finish_reason: Option<String>,
    /// chunk 数量
    pub chunk_count: usize,
}

/// LLM 错误类型
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// HTTP 请求错误
    #[error("HTTP 请求失败: {0}")]
    HttpError(#[from] reqwest::Error),

    /// API 返回错误
    #[error("API 错误 ({status}): {message}")]
    ApiError { status: u16, message: String },

    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 流解析错误
    #[error("流解析错误: {0}")]
    StreamError(String),
}
