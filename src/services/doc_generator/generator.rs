//! 文档生成器
//!
//! 调用生成后端并解析结构化响应，解析失败时以相同对话重试，次数有上限。

use tracing::{debug, warn};

use super::parser::{parse_structured_doc, ParseError};
use super::types::StructuredDoc;
use crate::llm::{ChatMessage, GenerationClient, GenerationOptions, LlmError};

/// 默认最大尝试次数（包含首次）
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

/// 单次尝试失败原因
#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    #[error("生成调用失败: {0}")]
    Generation(#[from] LlmError),

    #[error("响应解析失败: {0}")]
    Parse(#[from] ParseError),
}

/// 生成器错误类型
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("{attempts} 次尝试后仍未得到有效响应: {last}")]
    Exhausted { attempts: usize, last: AttemptError },
}

/// 生成并解析结构化文档
///
/// 每次重试都发送完全相同的对话，最多调用后端 `max_attempts` 次。
pub async fn resolve(
    client: &dyn GenerationClient,
    messages: &[ChatMessage],
    options: &GenerationOptions,
    max_attempts: usize,
) -> Result<StructuredDoc, GeneratorError> {
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        let result = match client.generate(messages, options).await {
            Ok(text) => parse_structured_doc(&text).map_err(AttemptError::from),
            Err(e) => Err(AttemptError::from(e)),
        };

        match result {
            Ok(doc) => {
                debug!("Structured response parsed on attempt {}", attempt);
                return Ok(doc);
            }
            Err(e) if attempt >= max_attempts => {
                return Err(GeneratorError::Exhausted {
                    attempts: attempt,
                    last: e,
                });
            }
            Err(e) => {
                warn!("Attempt {}/{} failed: {}", attempt, max_attempts, e);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::llm::{ChatMessage, GenerationClient, GenerationOptions, LlmError};

    /// 按脚本返回响应的后端桩
    ///
    /// 队列耗尽后重复返回 `fallback`。
    pub struct ScriptedClient {
        replies: Mutex<VecDeque<Result<String, String>>>,
        fallback: String,
        pub calls: AtomicUsize,
        pub conversations: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedClient {
        pub fn new(replies: Vec<Result<String, String>>, fallback: impl Into<String>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                fallback: fallback.into(),
                calls: AtomicUsize::new(0),
                conversations: Mutex::new(Vec::new()),
            }
        }

        pub fn always(reply: impl Into<String>) -> Self {
            Self::new(Vec::new(), reply)
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GenerationClient for ScriptedClient {
        async fn generate(
            &self,
            messages: &[ChatMessage],
            _options: &GenerationOptions,
        ) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.conversations.lock().unwrap().push(messages.to_vec());
            match self.replies.lock().unwrap().pop_front() {
                Some(Ok(text)) => Ok(text),
                Some(Err(message)) => Err(LlmError::StreamError(message)),
                None => Ok(self.fallback.clone()),
            }
        }
    }

    /// 构造一个合规的响应
    pub fn conforming_reply(module: &str) -> String {
        format!(
            "<JSON>\n{{\"language\": \"en-US\", \"module\": \"{}\", \"role\": \"Role of {}\", \
             \"description\": \"Describes {}\", \"interactions\": [\
             {{\"name\": \"init\", \"type\": \"function\", \"description\": \"Boots it\"}}]}}\n</JSON>",
            module, module, module
        )
    }
}
