//! LLM Prompt 模板
//!
//! 构建模块分析对话：系统消息固定输出约定，用户消息嵌入 JSON 模板、
//! 项目上下文和成员文件内容。相同输入必须产生逐字节相同的对话。

use super::types::LoadedFile;
use crate::llm::ChatMessage;

/// JSON 起始标记
pub const JSON_START: &str = "<JSON>";
/// JSON 结束标记
pub const JSON_END: &str = "</JSON>";

/// 文件之间的分隔行
pub const FILE_SEPARATOR: &str = "\n\n---\n\n";

/// 系统 Prompt
pub const SYSTEM_PROMPT: &str = r#"You are a source code analyser.
You output ONLY valid JSON.
If a piece of information does not exist, return an empty list.
Never use free text.
You MUST END your answer with </JSON>.
If you run out of tokens, do NOT start a new key.
ALL textual values must be written in the language {language}.

THERE IS ALWAYS CODE TO ANALYSE.
YOU MUST ONLY WRITE BETWEEN <JSON> AND </JSON>.
ANY TEXT OUTSIDE WILL BE IGNORED."#;

/// 模块分析 Prompt
pub const MODULE_ANALYSIS_PROMPT: &str = r#"<JSON>
{
    "language": "{language}",
    "module": "{module}",
    "role": "...",
    "description": "...",
    "interactions": [
        {
            "name": "...",
            "type": "...",
            "description": "..."
        }
    ]
}
</JSON>
{context}
SOURCE TO ANALYSE (DO NOT REPRODUCE IT):
{sources}"#;

/// 转义为 JSON 字符串内容（不含外层引号）
fn json_escape(value: &str) -> String {
    let quoted = serde_json::Value::String(value.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}

/// 拼接成员文件内容
pub fn format_sources(files: &[LoadedFile]) -> String {
    files
        .iter()
        .map(|f| format!("FILE: {}\n{}", f.path, f.content))
        .collect::<Vec<_>>()
        .join(FILE_SEPARATOR)
}

/// 格式化系统 Prompt
pub fn format_system_prompt(language: &str) -> String {
    SYSTEM_PROMPT.replace("{language}", language)
}

/// 格式化模块分析 Prompt
pub fn format_module_prompt(
    module: &str,
    files: &[LoadedFile],
    language: &str,
    context: Option<&str>,
) -> String {
    let context = match context {
        Some(c) if !c.trim().is_empty() => format!("\nPROJECT CONTEXT: {}\n", c.trim()),
        _ => String::new(),
    };

    fill_template(
        MODULE_ANALYSIS_PROMPT,
        &[
            ("{language}", json_escape(language).as_str()),
            ("{module}", json_escape(module).as_str()),
            ("{context}", context.as_str()),
            ("{sources}", format_sources(files).as_str()),
        ],
    )
}

/// 单次扫描替换占位符
///
/// 已替换进去的文本不会被再次展开。
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find('{') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match values.iter().find(|(key, _)| rest.starts_with(key)) {
            Some((key, value)) => {
                out.push_str(value);
                rest = &rest[key.len()..];
            }
            None => {
                out.push('{');
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// 构建单元对话
///
/// 每个单元构建全新的对话，不携带任何历史消息。
pub fn build_conversation(
    module: &str,
    files: &[LoadedFile],
    language: &str,
    context: Option<&str>,
) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(format_system_prompt(language)),
        ChatMessage::user(format_module_prompt(module, files, language, context)),
    ]
}
