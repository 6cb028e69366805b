//! OpenAI 兼容 Chat Completions API 流式实现
//!
//! 本地推理服务（llama.cpp、vLLM、TGI）和托管路由都暴露同一协议。

use async_stream::try_stream;
use futures::Stream;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tracing::{debug, error};

use super::format::build_openai_endpoint;
use super::types::{ChatChunk, ChatMessage, GenerationOptions, LlmError};

/// OpenAI 请求载荷
#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    temperature: f64,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
}

/// OpenAI SSE 响应块
#[derive(Deserialize, Debug)]
struct OpenAiStreamChunk {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize, Debug)]
struct OpenAiChoice {
    delta: OpenAiDelta,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct OpenAiDelta {
    content: Option<String>,
}

/// 流式调用 OpenAI 兼容 API
pub fn stream_openai(
    client: &Client,
    api_key: Option<&str>,
    base_url: &str,
    messages: Vec<ChatMessage>,
    model: &str,
    options: &GenerationOptions,
) -> Pin<Box<dyn Stream<Item = Result<ChatChunk, LlmError>> + Send>> {
    let endpoint = build_openai_endpoint(base_url);
    let api_key = api_key.map(str::to_string);
    let model = model.to_string();
    let options = options.clone();
    let client = client.clone();

    Box::pin(try_stream! {
        // 关闭随机采样时不发送 top_p，温度固定为 0
        let payload = OpenAiRequest {
            model: &model,
            messages: &messages,
            stream: true,
            temperature: if options.do_sample { options.temperature } else { 0.0 },
            max_tokens: options.max_tokens,
            top_p: None,
        };

        let mut request = client
            .post(&endpoint)
            .header("Content-Type", "application/json");

        if let Some(key) = &api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        debug!("OpenAI-compatible request: endpoint={}, model={}", endpoint, model);

        let response = request
            .json(&payload)
            .send()
            .await?;

        // 检查状态码
        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let error_text = response.text().await.unwrap_or_default();
            let preview: String = error_text.chars().take(500).collect();
            error!("Generation API error: status={}, body={}", status_code, preview);
            Err(LlmError::ApiError {
                status: status_code,
                message: error_text,
            })?;
            unreachable!();
        }

        // 处理 SSE 流
        let mut buffer = String::new();
        let mut stream = response.bytes_stream();

        use futures::StreamExt;
        while let Some(chunk_result) = stream.next().await {
            let bytes = chunk_result?;
            buffer.push_str(&String::from_utf8_lossy(&bytes));

            // 按行处理
            while let Some(newline_pos) = buffer.find('\n') {
                let line = buffer[..newline_pos].trim().to_string();
                buffer = buffer[newline_pos + 1..].to_string();

                if line.is_empty() {
                    continue;
                }

                if let Some(data) = line.strip_prefix("data:") {
                    let data = data.trim_start();
                    if data == "[DONE]" {
                        return;
                    }

                    match serde_json::from_str::<OpenAiStreamChunk>(data) {
                        Ok(chunk) => {
                            if let Some(choice) = chunk.choices.first() {
                                yield ChatChunk {
                                    content: choice.delta.content.clone(),
                                    finish_reason: choice.finish_reason.clone(),
                                };
                            }
                        }
                        Err(e) => {
                            // 继续处理，不中断流
                            debug!("Failed to parse stream chunk: {}, data: {}", e, data);
                        }
                    }
                }
            }
        }
    })
}
