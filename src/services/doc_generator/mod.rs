//! 文档生成器模块
//!
//! 基于 LLM 的模块文档自动生成
//!
//! # 功能
//!
//! - 扫描项目目录，按扩展名和排除规则过滤文件
//! - 按文件或按目录把文件划分为文档单元
//! - 为每个单元构建确定性的对话，要求模型只输出 `<JSON>` 标记包裹的结构化结果
//! - 解析失败时以相同对话重试，超过上限则放弃该单元
//! - 渲染本地化 Markdown 页面并汇总为前端索引
//!
//! # 使用示例
//!
//! ```ignore
//! let config = AppConfig::load(Path::new("config.json"))?;
//! let ctx = AppContext::from_config(&config, PathBuf::from("./docs"))?;
//! let summary = DocPipeline::new(&ctx).run(&config.projects).await?;
//! println!("{} modules written", summary.written_units);
//! ```

mod generator;
mod grouping;
mod index;
mod parser;
mod processor;
pub mod prompts;
mod renderer;
mod scanner;
pub mod types;

pub use generator::DEFAULT_MAX_ATTEMPTS;
pub use processor::{DocPipeline, RunSummary};
pub use scanner::ScanError;
