//! 流水线调度器
//!
//! 按配置顺序处理项目：扫描 → 分组 → 逐个单元（构建对话 → 生成 → 解析 → 渲染 → 写入）→ 索引。
//! 单元严格串行处理，生成后端一次只接收一个请求。

use chrono::Local;
use std::path::{Component, Path, PathBuf};
use std::time::Instant;
use tokio::fs;
use tracing::{debug, error, info};

use super::generator::resolve;
use super::grouping::group_files;
use super::index::{IndexEntry, IndexError, ProjectIndex};
use super::prompts::build_conversation;
use super::renderer::render_markdown;
use super::scanner::DirectoryScanner;
use super::types::DocUnit;
use crate::config::ProjectConfig;
use crate::error::{AppError, AppResult};
use crate::state::AppContext;

/// 单元页面文件名
pub const PAGE_FILE_NAME: &str = "README.md";

/// 运行统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// 处理的项目数
    pub projects: usize,
    /// 单元总数
    pub total_units: usize,
    /// 成功写出的页面数
    pub written_units: usize,
    /// 放弃的单元数
    pub failed_units: usize,
    /// 索引文件路径
    pub index_path: PathBuf,
    /// 耗时（毫秒）
    pub elapsed_ms: u64,
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// 文档生成流水线
pub struct DocPipeline<'a> {
    ctx: &'a AppContext,
}

impl<'a> DocPipeline<'a> {
    pub fn new(ctx: &'a AppContext) -> Self {
        Self { ctx }
    }

    /// 运行完整流水线
    pub async fn run(&self, projects: &[ProjectConfig]) -> AppResult<RunSummary> {
        let started = Instant::now();
        info!(
            "Generating documentation with model {} (language {})",
            self.ctx.model.model_id, self.ctx.language
        );
        self.reset_output_root().await?;

        let mut index = ProjectIndex::new();
        let mut summary = RunSummary::default();

        for project in projects {
            self.process_project(project, &mut index, &mut summary).await?;
            summary.projects += 1;
        }

        summary.index_path = index.write_to(&self.ctx.output_root).await.map_err(|e| match e {
            IndexError::Serialize(e) => AppError::Serialize(e),
            IndexError::IoError(path, e) => AppError::Io(path, e),
        })?;
        summary.elapsed_ms = started.elapsed().as_millis() as u64;

        info!(
            "Documentation generated: {} projects, {}/{} modules written ({} indexed), {} failed, index at {} ({} ms)",
            summary.projects,
            summary.written_units,
            summary.total_units,
            index.total_entries(),
            summary.failed_units,
            summary.index_path.display(),
            summary.elapsed_ms
        );
        Ok(summary)
    }

    /// 清空并重建输出根目录
    async fn reset_output_root(&self) -> AppResult<()> {
        let root = &self.ctx.output_root;
        let resolved = fs::canonicalize(root).await.ok();
        let cwd = std::env::current_dir().ok();
        if is_protected_output_root(root, resolved.as_deref(), cwd.as_deref()) {
            return Err(AppError::Config(format!(
                "拒绝清空输出目录: {}",
                root.display()
            )));
        }

        if fs::try_exists(root).await.map_err(|e| AppError::Io(root.clone(), e))? {
            fs::remove_dir_all(root)
                .await
                .map_err(|e| AppError::Io(root.clone(), e))?;
        }
        fs::create_dir_all(root)
            .await
            .map_err(|e| AppError::Io(root.clone(), e))?;
        Ok(())
    }

    /// 处理单个项目
    async fn process_project(
        &self,
        project: &ProjectConfig,
        index: &mut ProjectIndex,
        summary: &mut RunSummary,
    ) -> AppResult<()> {
        info!("Scanning project {}...", project.name);
        let scanner = DirectoryScanner::new(self.ctx.scan.clone(), &project.excluded);
        let files = scanner.scan(&project.path)?;
        info!("{} files detected", files.len());

        let key = project.key();
        index.ensure_project(&key);

        let units = group_files(project.strategy, &project.path, files);
        info!("Generating documentation for {} modules...", units.len());

        for unit in &units {
            summary.total_units += 1;
            info!("[{}] Analysing module: {}", timestamp(), unit.name);

            match self.process_unit(&key, unit).await? {
                Some(entry) => {
                    index.push(&key, entry);
                    summary.written_units += 1;
                }
                None => summary.failed_units += 1,
            }
        }

        Ok(())
    }

    /// 处理单个单元
    ///
    /// 生成失败时返回 `None`，不写页面也不产生索引条目；只有写文件失败才返回错误。
    async fn process_unit(&self, key: &str, unit: &DocUnit) -> AppResult<Option<IndexEntry>> {
        debug!(
            "Module {}: {} files, {} bytes",
            unit.name,
            unit.files.len(),
            unit.total_size()
        );
        let loaded = unit.load_files(self.ctx.scan.max_file_chars).await;
        let messages = build_conversation(
            &unit.name,
            &loaded,
            &self.ctx.language,
            self.ctx.context.as_deref(),
        );

        let doc = match resolve(
            self.ctx.client.as_ref(),
            &messages,
            &self.ctx.options,
            self.ctx.max_attempts,
        )
        .await
        {
            Ok(doc) => doc,
            Err(e) => {
                error!("[{}] Generation failed for module {}: {}", timestamp(), unit.name, e);
                return Ok(None);
            }
        };

        let page = render_markdown(&doc, &self.ctx.language);
        let page_path = self.page_path(key, unit);
        save_document(&page_path, &page).await?;

        Ok(Some(IndexEntry {
            title: unit.name.clone(),
            path: page_path.to_string_lossy().replace('\\', "/"),
            content: page,
        }))
    }

    /// 单元页面路径：`<output>/<project_key>/<unit>/README.md`
    pub fn page_path(&self, key: &str, unit: &DocUnit) -> PathBuf {
        let project_dir = self.ctx.output_root.join(key);
        let relative = unit.relative_dir();
        if relative.is_empty() {
            project_dir.join(PAGE_FILE_NAME)
        } else {
            project_dir.join(relative).join(PAGE_FILE_NAME)
        }
    }
}

/// 输出根目录是否禁止清空
///
/// 空路径、文件系统根、只由 `.`/`..` 组成的路径，以及当前工作目录或其祖先目录。
fn is_protected_output_root(root: &Path, resolved: Option<&Path>, cwd: Option<&Path>) -> bool {
    if root.as_os_str().is_empty() || root.parent().is_none() {
        return true;
    }
    if root
        .components()
        .all(|c| matches!(c, Component::CurDir | Component::ParentDir))
    {
        return true;
    }
    match (resolved, cwd) {
        (Some(resolved), Some(cwd)) => resolved.parent().is_none() || cwd.starts_with(resolved),
        _ => false,
    }
}

/// 保存文档到文件
async fn save_document(path: &Path, content: &str) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| AppError::Io(parent.to_path_buf(), e))?;
    }

    fs::write(path, content)
        .await
        .map_err(|e| AppError::Io(path.to_path_buf(), e))
}
