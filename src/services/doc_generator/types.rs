//! 文档生成器类型定义
//!
//! 定义源文件、文档单元、结构化文档等核心类型

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// 源文件
///
/// 内容按需读取，使用前截断到最大字符数。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// 完整路径
    pub path: PathBuf,
    /// 文件大小（字节）
    pub size: Option<u64>,
}

impl SourceFile {
    pub fn new(path: PathBuf, size: Option<u64>) -> Self {
        Self { path, size }
    }

    /// 文件名
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// 显示用路径（统一使用 `/`）
    pub fn display_path(&self) -> String {
        self.path.to_string_lossy().replace('\\', "/")
    }

    /// 读取内容并截断到 `max_chars` 个字符
    ///
    /// 读取失败时返回空内容，不会中断单元处理。
    pub async fn read_truncated(&self, max_chars: usize) -> String {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => truncate_chars(&String::from_utf8_lossy(&bytes), max_chars),
            Err(e) => {
                warn!("Failed to read {}: {}", self.path.display(), e);
                String::new()
            }
        }
    }
}

/// 按字符数截断
pub fn truncate_chars(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((idx, _)) => content[..idx].to_string(),
        None => content.to_string(),
    }
}

/// 已读取的成员文件（提示词输入）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFile {
    pub path: String,
    pub content: String,
}

/// 文档单元：同一名称键下的一组源文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocUnit {
    /// 单元名称（文件名或相对目录路径，根目录为 `/`）
    pub name: String,
    /// 成员文件，按扫描顺序
    pub files: Vec<SourceFile>,
}

impl DocUnit {
    /// 单元文档的相对目录（根单元为空）
    pub fn relative_dir(&self) -> &str {
        self.name.trim_matches('/')
    }

    /// 成员文件总字节数（未知大小按 0 计）
    pub fn total_size(&self) -> u64 {
        self.files.iter().filter_map(|f| f.size).sum()
    }

    /// 读取全部成员文件
    pub async fn load_files(&self, max_chars: usize) -> Vec<LoadedFile> {
        let mut loaded = Vec::with_capacity(self.files.len());
        for file in &self.files {
            loaded.push(LoadedFile {
                path: file.display_path(),
                content: file.read_truncated(max_chars).await,
            });
        }
        loaded
    }
}

/// 交互/规则条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}

/// 模型返回的结构化文档
///
/// 所有字段必填；缺失字段视为反序列化失败。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredDoc {
    pub language: String,
    pub module: String,
    pub role: String,
    pub description: String,
    pub interactions: Vec<Interaction>,
}

/// 扫描配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// 不进入的目录名
    #[serde(default = "default_excluded_dirs")]
    pub excluded_dirs: Vec<String>,

    /// 支持的文件扩展名（不含点）
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// 单个文件的最大字符数
    #[serde(default = "default_max_file_chars")]
    pub max_file_chars: usize,
}

fn default_excluded_dirs() -> Vec<String> {
    ["node_modules", ".git", "dist", "build", ".next", "out"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_extensions() -> Vec<String> {
    ["html", "js", "css", "yml", "cs"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_max_file_chars() -> usize {
    9999
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            excluded_dirs: default_excluded_dirs(),
            extensions: default_extensions(),
            max_file_chars: default_max_file_chars(),
        }
    }
}

impl ScanConfig {
    /// 扩展名是否在允许列表中
    pub fn is_supported_file(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| {
                let ext = ext.to_string_lossy();
                self.extensions
                    .iter()
                    .any(|allowed| allowed.trim_start_matches('.') == ext)
            })
            .unwrap_or(false)
    }

    /// 目录名是否被排除
    pub fn is_excluded_dir(&self, name: &str) -> bool {
        self.excluded_dirs.iter().any(|d| d == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn test_is_supported_file() {
        let config = ScanConfig::default();
        assert!(config.is_supported_file(Path::new("index.html")));
        assert!(config.is_supported_file(Path::new("app.js")));
        assert!(config.is_supported_file(Path::new("Program.cs")));
        assert!(!config.is_supported_file(Path::new("README.md")));
        assert!(!config.is_supported_file(Path::new("config.yaml")));
        assert!(!config.is_supported_file(Path::new("Makefile")));
    }

    #[test]
    fn test_structured_doc_requires_all_keys() {
        let missing = r#"{"language":"en-US","module":"m","role":"r","description":"d"}"#;
        assert!(serde_json::from_str::<StructuredDoc>(missing).is_err());

        let ok = r#"{"language":"en-US","module":"m","role":"r","description":"d",
            "interactions":[{"name":"n","type":"function","description":"x"}]}"#;
        let doc: StructuredDoc = serde_json::from_str(ok).unwrap();
        assert_eq!(doc.interactions[0].kind, "function");
    }

    #[test]
    fn test_relative_dir() {
        let root = DocUnit { name: "/".to_string(), files: vec![] };
        assert_eq!(root.relative_dir(), "");
        let nested = DocUnit { name: "src/utils".to_string(), files: vec![] };
        assert_eq!(nested.relative_dir(), "src/utils");
    }

    #[tokio::test]
    async fn test_read_truncated_missing_file() {
        let file = SourceFile::new(PathBuf::from("/definitely/not/here.js"), None);
        assert_eq!(file.read_truncated(10).await, "");
    }
}
