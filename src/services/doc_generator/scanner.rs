//! 目录扫描器
//!
//! 深度优先遍历项目目录，按扩展名白名单、目录排除集合和项目级文件排除列表过滤。

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::types::{ScanConfig, SourceFile};

/// 目录扫描器
pub struct DirectoryScanner {
    config: ScanConfig,
    /// 原始排除文件名（精确匹配）
    excluded_names: Vec<String>,
    /// 编译后的文件排除模式（glob patterns，按文件名匹配）
    excluded_patterns: Vec<glob::Pattern>,
}

impl DirectoryScanner {
    /// 创建新的目录扫描器
    pub fn new(config: ScanConfig, excluded: &[String]) -> Self {
        let excluded_patterns = excluded
            .iter()
            .filter_map(|p| match glob::Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    warn!("Invalid exclusion pattern '{}': {}", p, e);
                    None
                }
            })
            .collect();

        Self {
            config,
            excluded_names: excluded.to_vec(),
            excluded_patterns,
        }
    }

    /// 扫描目录，返回文件列表
    ///
    /// 同一目录内按名称排序，保证结果可复现。不跟随符号链接，
    /// 因此同一物理目录不会被遍历两次。
    pub fn scan(&self, root_path: &Path) -> Result<Vec<SourceFile>, ScanError> {
        if !root_path.exists() {
            return Err(ScanError::PathNotFound(root_path.to_path_buf()));
        }

        if !root_path.is_dir() {
            return Err(ScanError::NotADirectory(root_path.to_path_buf()));
        }

        info!("Starting directory scan: {}", root_path.display());

        let walker = WalkDir::new(root_path)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !self
                        .config
                        .is_excluded_dir(&entry.file_name().to_string_lossy())
            });

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root_path.to_path_buf());
                ScanError::Walk(path, e)
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if self.is_excluded_file(&name) {
                debug!("Ignoring excluded file: {}", entry.path().display());
                continue;
            }

            if !self.config.is_supported_file(entry.path()) {
                continue;
            }

            let size = entry.metadata().ok().map(|m| m.len());
            files.push(SourceFile::new(entry.into_path(), size));
        }

        info!("Scan completed: {} files", files.len());
        Ok(files)
    }

    /// 检查文件名是否被项目排除
    ///
    /// 先按原始名称精确比较，再按 glob 模式匹配。
    fn is_excluded_file(&self, name: &str) -> bool {
        self.excluded_names.iter().any(|n| n == name)
            || self.excluded_patterns.iter().any(|p| p.matches(name))
    }
}

/// 扫描错误类型
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("路径不存在: {0}")]
    PathNotFound(PathBuf),

    #[error("路径不是目录: {0}")]
    NotADirectory(PathBuf),

    #[error("遍历错误 ({0}): {1}")]
    Walk(PathBuf, #[source] walkdir::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn touch(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = File::create(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    fn create_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        touch(&root.join("index.html"), "<html></html>");
        touch(&root.join("README.md"), "# readme");
        touch(&root.join("styles/main.css"), "body {}");
        touch(&root.join("scripts/app.js"), "console.log(1)");
        touch(&root.join("scripts/vendor.min.js"), "/* vendor */");
        touch(&root.join("scripts/lib/deep/util.js"), "export {}");
        touch(&root.join("ci/pipeline.yml"), "stages: []");

        // 应该被忽略的目录，任意深度
        touch(&root.join("node_modules/pkg/index.js"), "module.exports = {}");
        touch(&root.join(".git/hooks/pre-commit.js"), "");
        touch(&root.join("scripts/dist/bundle.js"), "");
        touch(&root.join("api/bin/build/out.cs"), "");

        dir
    }

    fn relative_set(root: &Path, files: &[SourceFile]) -> BTreeSet<String> {
        files
            .iter()
            .map(|f| {
                f.path
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn test_scan_directory() {
        let test_dir = create_test_dir();
        let scanner = DirectoryScanner::new(ScanConfig::default(), &[]);

        let files = scanner.scan(test_dir.path()).unwrap();
        let expected: BTreeSet<String> = [
            "index.html",
            "styles/main.css",
            "scripts/app.js",
            "scripts/vendor.min.js",
            "scripts/lib/deep/util.js",
            "ci/pipeline.yml",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        assert_eq!(relative_set(test_dir.path(), &files), expected);
        assert_eq!(files.len(), expected.len());
    }

    #[test]
    fn test_scan_excluded_names() {
        let test_dir = create_test_dir();
        let excluded = vec!["vendor.min.js".to_string(), "*.yml".to_string()];
        let scanner = DirectoryScanner::new(ScanConfig::default(), &excluded);

        let files = relative_set(test_dir.path(), &scanner.scan(test_dir.path()).unwrap());
        assert!(!files.contains("scripts/vendor.min.js"));
        assert!(!files.contains("ci/pipeline.yml"));
        assert!(files.contains("scripts/app.js"));
    }

    #[test]
    fn test_scan_is_deterministic() {
        let test_dir = create_test_dir();
        let scanner = DirectoryScanner::new(ScanConfig::default(), &[]);

        let first = scanner.scan(test_dir.path()).unwrap();
        let second = scanner.scan(test_dir.path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_root_named_like_excluded_dir_is_scanned() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("build");
        touch(&root.join("site.css"), "a {}");

        let scanner = DirectoryScanner::new(ScanConfig::default(), &[]);
        assert_eq!(scanner.scan(&root).unwrap().len(), 1);
    }

    #[test]
    fn test_scan_missing_root() {
        let scanner = DirectoryScanner::new(ScanConfig::default(), &[]);
        assert!(matches!(
            scanner.scan(Path::new("/no/such/project")),
            Err(ScanError::PathNotFound(_))
        ));
    }

    #[test]
    fn test_invalid_pattern_is_ignored() {
        let scanner = DirectoryScanner::new(ScanConfig::default(), &["[".to_string()]);
        assert!(scanner.excluded_patterns.is_empty());
        assert!(scanner.is_excluded_file("["));
    }

    #[test]
    fn test_scan_excluded_literal_names() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(&root.join("app[1].js"), "");
        touch(&root.join("app1.js"), "");
        touch(&root.join("[.js"), "");
        touch(&root.join("keep.js"), "");

        let excluded = vec!["app[1].js".to_string(), "[.js".to_string()];
        let scanner = DirectoryScanner::new(ScanConfig::default(), &excluded);

        let files = relative_set(root, &scanner.scan(root).unwrap());
        assert!(!files.contains("app[1].js"));
        assert!(!files.contains("[.js"));
        // `app[1].js` 作为模式也匹配 `app1.js`
        assert!(!files.contains("app1.js"));
        assert!(files.contains("keep.js"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directories_are_not_followed() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("project");
        touch(&root.join("lib/util.js"), "export {}");
        // 指向自身祖先的循环链接，以及指向兄弟目录的链接
        std::os::unix::fs::symlink(&root, root.join("lib/loop")).unwrap();
        std::os::unix::fs::symlink(root.join("lib"), root.join("lib-alias")).unwrap();

        let scanner = DirectoryScanner::new(ScanConfig::default(), &[]);
        let files = scanner.scan(&root).unwrap();

        assert_eq!(relative_set(&root, &files), BTreeSet::from(["lib/util.js".to_string()]));
    }
}
