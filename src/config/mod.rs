//! 配置模块

mod app_config;
mod model;

pub use app_config::{AppConfig, GroupingStrategy, ModelMode, ProjectConfig};
pub use model::{resolve_model, ModelSelection};
