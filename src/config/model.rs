//! 生成后端选择
//!
//! 本地模式直接使用配置的模型路径；远程模式通过固定别名表解析模型标识和量化提示。

use super::app_config::{ModelConfig, ModelMode};
use crate::error::{AppError, AppResult};
use crate::llm::is_loopback_endpoint;

/// 远程模式未识别别名时使用的默认别名
pub const DEFAULT_REMOTE_ALIAS: &str = "qwen2.5-coder-3b";

/// 本地推理服务默认地址
pub const DEFAULT_LOCAL_BASE_URL: &str = "http://127.0.0.1:8080";

/// 远程推理服务默认地址
pub const DEFAULT_REMOTE_BASE_URL: &str = "https://router.huggingface.co/v1";

/// 远程模型别名表：别名 → (模型标识, 量化提示)
const REMOTE_MODELS: &[(&str, &str, &str)] = &[
    ("qwen2.5-coder-3b", "onnx-community/Qwen2.5-Coder-3B-Instruct", "q4"),
    ("deepseek-coder-1.3b", "onnx-community/DeepSeek-Coder-1.3B-Instruct", "q4"),
];

/// 解析后的模型选择
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub mode: ModelMode,
    /// 发送给推理服务的模型标识
    pub model_id: String,
    /// 量化提示（仅远程模式）
    pub dtype: Option<String>,
    /// 是否允许访问远程模型
    pub allow_remote: bool,
    pub base_url: String,
}

fn lookup_alias(alias: &str) -> (&'static str, &'static str) {
    REMOTE_MODELS
        .iter()
        .find(|(name, _, _)| *name == alias)
        .or_else(|| REMOTE_MODELS.iter().find(|(name, _, _)| *name == DEFAULT_REMOTE_ALIAS))
        .map(|(_, id, dtype)| (*id, *dtype))
        .unwrap_or(("onnx-community/Qwen2.5-Coder-3B-Instruct", "q4"))
}

/// 根据配置解析模型选择
pub fn resolve_model(config: &ModelConfig) -> AppResult<ModelSelection> {
    match config.mode {
        ModelMode::Local => {
            let base_url = config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_LOCAL_BASE_URL.to_string());

            if !is_loopback_endpoint(&base_url) {
                return Err(AppError::Config(format!(
                    "本地模式禁止远程模型，推理服务必须位于本机: {}",
                    base_url
                )));
            }

            Ok(ModelSelection {
                mode: ModelMode::Local,
                model_id: config.path.clone(),
                dtype: None,
                allow_remote: false,
                base_url,
            })
        }
        ModelMode::Remote => {
            let (model_id, dtype) = lookup_alias(config.path.trim());
            Ok(ModelSelection {
                mode: ModelMode::Remote,
                model_id: model_id.to_string(),
                dtype: Some(dtype.to_string()),
                allow_remote: true,
                base_url: config
                    .base_url
                    .clone()
                    .unwrap_or_else(|| DEFAULT_REMOTE_BASE_URL.to_string()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model_config(mode: ModelMode, path: &str, base_url: Option<&str>) -> ModelConfig {
        ModelConfig {
            mode,
            path: path.to_string(),
            base_url: base_url.map(str::to_string),
            api_key: None,
            max_new_tokens: 999,
        }
    }

    #[test]
    fn test_remote_alias() {
        let selection =
            resolve_model(&model_config(ModelMode::Remote, "deepseek-coder-1.3b", None)).unwrap();
        assert_eq!(selection.model_id, "onnx-community/DeepSeek-Coder-1.3B-Instruct");
        assert_eq!(selection.dtype.as_deref(), Some("q4"));
        assert!(selection.allow_remote);
        assert_eq!(selection.base_url, DEFAULT_REMOTE_BASE_URL);
    }

    #[test]
    fn test_unknown_alias_falls_back() {
        let selection =
            resolve_model(&model_config(ModelMode::Remote, "llama-70b", None)).unwrap();
        assert_eq!(selection.model_id, "onnx-community/Qwen2.5-Coder-3B-Instruct");
    }

    #[test]
    fn test_local_mode() {
        let selection =
            resolve_model(&model_config(ModelMode::Local, "/models/qwen", None)).unwrap();
        assert_eq!(selection.model_id, "/models/qwen");
        assert!(!selection.allow_remote);
        assert!(selection.dtype.is_none());
        assert_eq!(selection.base_url, DEFAULT_LOCAL_BASE_URL);
    }

    #[test]
    fn test_local_mode_rejects_remote_endpoint() {
        let result = resolve_model(&model_config(
            ModelMode::Local,
            "/models/qwen",
            Some("https://router.huggingface.co/v1"),
        ));
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
