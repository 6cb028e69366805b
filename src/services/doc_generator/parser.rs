//! 响应解析器
//!
//! 从生成文本中提取 `<JSON>` 与 `</JSON>` 之间的内容，规范化路径分隔符后反序列化。
//! 所有失败都以 `ParseError` 返回，由调用方决定是否重试。

use once_cell::sync::Lazy;
use regex::Regex;

use super::prompts::{JSON_END, JSON_START};
use super::types::StructuredDoc;

/// 非贪婪匹配第一个标记区间
static JSON_BLOCK: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(
        r"(?s){}(.*?){}",
        regex::escape(JSON_START),
        regex::escape(JSON_END)
    );
    Regex::new(&pattern).expect("valid JSON block regex")
});

/// 解析错误
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("响应中未找到 <JSON>...</JSON> 区块")]
    MissingMarkers,

    #[error("JSON 区块为空")]
    EmptyBlock,

    #[error("JSON 反序列化失败: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// 解析生成文本为结构化文档
pub fn parse_structured_doc(response: &str) -> Result<StructuredDoc, ParseError> {
    let block = extract_json_block(response).ok_or(ParseError::MissingMarkers)?;
    let json = strip_code_fence(block);
    if json.is_empty() {
        return Err(ParseError::EmptyBlock);
    }

    let normalized = normalize_path_separators(json);
    Ok(serde_json::from_str::<StructuredDoc>(&normalized)?)
}

/// 提取标记之间的内容
pub fn extract_json_block(response: &str) -> Option<&str> {
    JSON_BLOCK
        .captures(response)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

/// 去除可能包裹 JSON 的 Markdown 代码块
fn strip_code_fence(block: &str) -> &str {
    let Some(rest) = block.strip_prefix("```") else {
        return block;
    };
    // 跳过语言标识行
    let rest = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };
    rest.trim_end().trim_end_matches("```").trim()
}

/// 规范化路径分隔符
///
/// `\\` 与不构成合法 JSON 转义的 `\` 都替换为 `/`。`\"`、`\/`、`\n`、`\uXXXX` 保持不变。
/// `\b`、`\f` 总是视为路径分隔符；`\t`、`\r` 后接字母或数字时（如 `src\tests`）同样视为分隔符。
pub fn normalize_path_separators(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut chars = json.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        match chars.peek().copied() {
            Some('\\') => {
                chars.next();
                out.push('/');
            }
            Some('"' | '/' | 'n') => {
                out.push('\\');
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            Some('t' | 'r') if !followed_by_alphanumeric(&chars) => {
                out.push('\\');
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            Some('u') if is_unicode_escape(&chars) => out.push('\\'),
            _ => out.push('/'),
        }
    }

    out
}

/// 判断转义字母之后是否紧跟字母或数字
fn followed_by_alphanumeric(chars: &std::iter::Peekable<std::str::Chars<'_>>) -> bool {
    let mut ahead = chars.clone();
    ahead.next();
    ahead.next().is_some_and(|c| c.is_alphanumeric())
}

/// 判断 `u` 之后是否紧跟四个十六进制数字
fn is_unicode_escape(chars: &std::iter::Peekable<std::str::Chars<'_>>) -> bool {
    let mut ahead = chars.clone();
    ahead.next();
    (0..4).all(|_| ahead.next().is_some_and(|c| c.is_ascii_hexdigit()))
}
