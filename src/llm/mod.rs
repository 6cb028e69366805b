//! LLM 模块
//!
//! 提供生成后端边界（`GenerationClient`）和 OpenAI 兼容协议的客户端实现。

mod client;
mod format;
mod openai;
mod types;

pub use client::{GenerationClient, LlmClient};
pub use format::is_loopback_endpoint;
pub use types::*;
