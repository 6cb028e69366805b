//! 运行上下文
//!
//! 启动时构建一次，随后以引用传入流水线。生成后端只加载一次并在所有单元间复用。

use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config::{resolve_model, AppConfig, ModelSelection};
use crate::error::AppResult;
use crate::llm::{GenerationClient, GenerationOptions, LlmClient};
use crate::services::doc_generator::types::ScanConfig;

/// API 密钥环境变量
pub const API_KEY_ENV: &str = "MODOC_API_KEY";

/// 运行上下文
pub struct AppContext {
    /// 生成后端
    pub client: Arc<dyn GenerationClient>,
    /// 解析后的模型选择
    pub model: ModelSelection,
    /// 生成选项
    pub options: GenerationOptions,
    /// 文档目标语言
    pub language: String,
    /// 项目上下文
    pub context: Option<String>,
    /// 扫描配置
    pub scan: ScanConfig,
    /// 输出根目录
    pub output_root: PathBuf,
    /// 每个单元的最大尝试次数
    pub max_attempts: usize,
}

impl AppContext {
    /// 使用给定后端创建上下文
    pub fn new(
        config: &AppConfig,
        model: ModelSelection,
        client: Arc<dyn GenerationClient>,
        output_root: PathBuf,
    ) -> Self {
        Self {
            client,
            model,
            options: GenerationOptions::deterministic(config.model.max_new_tokens),
            language: config.language.clone(),
            context: config.context().map(str::to_string),
            scan: config.scan.clone(),
            output_root,
            max_attempts: crate::services::doc_generator::DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// 根据配置解析模型并构建 LLM 客户端
    pub fn from_config(config: &AppConfig, output_root: PathBuf) -> AppResult<Self> {
        let model = resolve_model(&config.model)?;
        let api_key = config
            .model
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok());

        info!(
            "Loading model: mode={:?}, model={}, dtype={}, endpoint={}, remote_allowed={}",
            model.mode,
            model.model_id,
            model.dtype.as_deref().unwrap_or("-"),
            model.base_url,
            model.allow_remote
        );

        let client = LlmClient::new(api_key, model.base_url.clone(), model.model_id.clone())?;
        Ok(Self::new(config, model, Arc::new(client), output_root))
    }
}
