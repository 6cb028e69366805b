//! 生成客户端

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::Client;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, info};

use super::openai::stream_openai;
use super::types::{ChatChunk, ChatMessage, GenerationOptions, LlmError, StreamCollectResult};

/// 文本生成后端边界
///
/// 给定一段对话返回生成文本。调用方不能假设返回内容符合任何格式约定。
/// 后端持有独占资源，调用方必须逐个发起请求。
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> Result<String, LlmError>;
}

/// OpenAI 兼容协议的 LLM 客户端
pub struct LlmClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl LlmClient {
    /// 创建新的 LLM 客户端
    pub fn new(
        api_key: Option<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, LlmError> {
        let model = model.into();
        if model.trim().is_empty() {
            return Err(LlmError::ConfigError("Model identifier is required".to_string()));
        }

        // 本地模型推理可能很慢，总超时放宽
        let client = Client::builder()
            .timeout(Duration::from_secs(600))
            .connect_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(1)
            .build()
            .map_err(LlmError::HttpError)?;

        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.is_empty()),
            base_url: base_url.into(),
            model,
        })
    }

    /// 流式聊天
    pub fn stream_chat(
        &self,
        messages: Vec<ChatMessage>,
        options: &GenerationOptions,
    ) -> Pin<Box<dyn Stream<Item = Result<ChatChunk, LlmError>> + Send>> {
        debug!("LLM request: model={}, base_url={}", self.model, self.base_url);
        stream_openai(
            &self.client,
            self.api_key.as_deref(),
            &self.base_url,
            messages,
            &self.model,
            options,
        )
    }

    /// 流式请求并收集完整响应
    pub async fn stream_and_collect(
        &self,
        messages: Vec<ChatMessage>,
        options: &GenerationOptions,
    ) -> Result<StreamCollectResult, LlmError> {
        let mut stream = self.stream_chat(messages, options);
        let mut result = StreamCollectResult::default();

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result?;
            result.chunk_count += 1;

            if let Some(content) = chunk.content {
                result.content.push_str(&content);
            }

            if chunk.finish_reason.is_some() {
                result.finish_reason = chunk.finish_reason;
            }
        }

        Ok(result)
    }
}

#[async_trait]
impl GenerationClient for LlmClient {
    async fn generate(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> Result<String, LlmError> {
        let result = self.stream_and_collect(messages.to_vec(), options).await?;

        if result.chunk_count == 0 {
            return Err(LlmError::StreamError("empty response stream".to_string()));
        }

        info!(
            "Generation finished: {} chunks, {} chars, finish_reason={:?}",
            result.chunk_count,
            result.content.chars().count(),
            result.finish_reason
        );
        Ok(result.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_model() {
        assert!(matches!(
            LlmClient::new(None, "http://127.0.0.1:8080", "  "),
            Err(LlmError::ConfigError(_))
        ));
    }

    #[test]
    fn test_empty_api_key_is_dropped() {
        let client = LlmClient::new(Some(String::new()), "http://127.0.0.1:8080", "qwen").unwrap();
        assert!(client.api_key.is_none());
        assert_eq!(client.model, "qwen");
    }
}
