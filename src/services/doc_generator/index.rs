//! 文档索引
//!
//! 运行期间按处理顺序累积每个项目的页面条目，结束时一次性写出供静态前端读取的 `index.js`。

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::path::Path;

/// 索引文件名
pub const INDEX_FILE_NAME: &str = "index.js";

/// 前端读取的全局变量名
pub const INDEX_GLOBAL: &str = "window.DOC_INDEX";

/// 索引条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    pub title: String,
    pub path: String,
    pub content: String,
}

/// 项目索引：项目键 → 有序条目列表，项目保持配置顺序
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectIndex {
    projects: Vec<(String, Vec<IndexEntry>)>,
}

impl ProjectIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// 确保项目存在（没有成功单元的项目也会出现在索引中）
    pub fn ensure_project(&mut self, key: &str) {
        if !self.projects.iter().any(|(k, _)| k == key) {
            self.projects.push((key.to_string(), Vec::new()));
        }
    }

    /// 追加条目
    pub fn push(&mut self, key: &str, entry: IndexEntry) {
        self.ensure_project(key);
        if let Some((_, entries)) = self.projects.iter_mut().find(|(k, _)| k == key) {
            entries.push(entry);
        }
    }

    /// 条目总数
    pub fn total_entries(&self) -> usize {
        self.projects.iter().map(|(_, e)| e.len()).sum()
    }

    /// 序列化为前端脚本：`window.DOC_INDEX = {...};`
    pub fn to_script(&self) -> Result<String, serde_json::Error> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        let json = String::from_utf8_lossy(&buf);
        Ok(format!("{} = {};", INDEX_GLOBAL, json))
    }

    /// 写出索引文件
    pub async fn write_to(&self, output_root: &Path) -> Result<std::path::PathBuf, IndexError> {
        let path = output_root.join(INDEX_FILE_NAME);
        let script = self.to_script()?;
        tokio::fs::write(&path, script)
            .await
            .map_err(|e| IndexError::IoError(path.clone(), e))?;
        Ok(path)
    }
}

impl Serialize for ProjectIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.projects.len()))?;
        for (key, entries) in &self.projects {
            map.serialize_entry(key, entries)?;
        }
        map.end()
    }
}

/// 索引错误类型
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("序列化索引失败: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO错误 ({0}): {1}")]
    IoError(std::path::PathBuf, #[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(title: &str) -> IndexEntry {
        IndexEntry {
            title: title.to_string(),
            path: format!("docs/web/{}/README.md", title),
            content: format!("## {}", title),
        }
    }

    #[test]
    fn test_project_order_and_entry_order() {
        let mut index = ProjectIndex::new();
        index.push("zeta", entry("b"));
        index.ensure_project("alpha");
        index.push("zeta", entry("a"));

        let value = serde_json::to_value(&index).unwrap();
        assert_eq!(value["zeta"][0]["title"], "b");
        assert_eq!(value["zeta"][1]["title"], "a");
        assert_eq!(value["alpha"].as_array().unwrap().len(), 0);
        assert_eq!(index.total_entries(), 2);

        let script = index.to_script().unwrap();
        assert!(script.starts_with("window.DOC_INDEX = {\n    \"zeta\": ["));
        assert!(script.ends_with("};"));
        assert!(script.find("\"zeta\"").unwrap() < script.find("\"alpha\"").unwrap());
    }

    #[tokio::test]
    async fn test_write_to() {
        let dir = TempDir::new().unwrap();
        let mut index = ProjectIndex::new();
        index.push("web", entry("styles"));

        let path = index.write_to(dir.path()).await.unwrap();
        assert_eq!(path, dir.path().join("index.js"));

        let script = std::fs::read_to_string(&path).unwrap();
        let json = script
            .strip_prefix("window.DOC_INDEX = ")
            .and_then(|s| s.strip_suffix(';'))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(json).unwrap();
        assert_eq!(value["web"][0]["title"], "styles");
        assert_eq!(value["web"][0]["content"], "## styles");
    }
}
