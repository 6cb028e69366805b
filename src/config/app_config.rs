//! 运行配置
//!
//! 从 JSON 文件加载一次，随后作为只读数据传入 `AppContext`，不使用全局单例。

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::llm::DEFAULT_MAX_NEW_TOKENS;
use crate::services::doc_generator::types::ScanConfig;

/// 默认目标语言
pub const DEFAULT_LANGUAGE: &str = "fr-FR";

/// 模型运行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelMode {
    /// 本地模型，禁止远程获取
    Local,
    /// 远程模型，通过别名表解析
    Remote,
}

/// 模型配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub mode: ModelMode,

    /// 本地模式下为模型路径，远程模式下为模型别名
    pub path: String,

    /// 推理服务地址（OpenAI 兼容）
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: u32,
}

fn default_max_new_tokens() -> u32 {
    DEFAULT_MAX_NEW_TOKENS
}

/// 分组策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingStrategy {
    /// 每个文件一个单元
    File,
    /// 每个目录一个单元
    #[default]
    Directory,
}

/// 项目配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    pub path: PathBuf,

    /// 排除的文件名（glob 模式，按文件名匹配）
    #[serde(default)]
    pub excluded: Vec<String>,

    #[serde(default)]
    pub strategy: GroupingStrategy,
}

impl ProjectConfig {
    /// 项目键：小写，空白替换为下划线
    pub fn key(&self) -> String {
        project_key(&self.name)
    }
}

/// 计算项目键
pub fn project_key(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub model: ModelConfig,

    /// 文档目标语言
    #[serde(default = "default_language")]
    pub language: String,

    /// 项目上下文（可选，附加到每个提示词）
    #[serde(default)]
    pub context: Option<String>,

    pub projects: Vec<ProjectConfig>,

    #[serde(default)]
    pub scan: ScanConfig,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

impl AppConfig {
    /// 从文件加载配置
    pub fn load(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| AppError::Io(path.to_path_buf(), e))?;
        Self::from_json(&content)
    }

    /// 从 JSON 字符串解析配置
    pub fn from_json(content: &str) -> AppResult<Self> {
        let config: AppConfig = serde_json::from_str(content)
            .map_err(|e| AppError::Config(format!("解析配置失败: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// 校验配置
    pub fn validate(&self) -> AppResult<()> {
        if self.projects.is_empty() {
            return Err(AppError::Config("至少需要配置一个项目".to_string()));
        }
        if let Some(project) = self.projects.iter().find(|p| p.key().is_empty()) {
            return Err(AppError::Config(format!(
                "项目名称不能为空: {}",
                project.path.display()
            )));
        }
        if self.model.path.trim().is_empty() {
            return Err(AppError::Config("model.path 不能为空".to_string()));
        }
        if self.model.max_new_tokens == 0 {
            return Err(AppError::Config("model.max_new_tokens 必须大于 0".to_string()));
        }
        Ok(())
    }

    /// 非空的项目上下文
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }
}
