//! 文档单元分组
//!
//! 把扫描结果划分为文档单元：每个文件一个单元，或每个目录一个单元。
//! 单元按首次出现的顺序排列，成员保持扫描顺序。

use std::collections::HashMap;
use std::path::Path;

use super::types::{DocUnit, SourceFile};
use crate::config::GroupingStrategy;

/// 根目录单元名称
pub const ROOT_UNIT: &str = "/";

/// 按策略分组
pub fn group_files(strategy: GroupingStrategy, project_root: &Path, files: Vec<SourceFile>) -> Vec<DocUnit> {
    match strategy {
        GroupingStrategy::File => group_by_file(files),
        GroupingStrategy::Directory => group_by_directory(project_root, files),
    }
}

/// 每个文件一个单元，单元名为文件名
///
/// 已知限制：不同目录下的同名文件共用同一个键，后出现的文件覆盖前者，
/// 单元位置保持首次出现的位置。
pub fn group_by_file(files: Vec<SourceFile>) -> Vec<DocUnit> {
    let mut units: Vec<DocUnit> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for file in files {
        let name = file.name();
        match positions.get(&name) {
            Some(&idx) => units[idx].files = vec![file],
            None => {
                positions.insert(name.clone(), units.len());
                units.push(DocUnit {
                    name,
                    files: vec![file],
                });
            }
        }
    }

    units
}

/// 每个目录一个单元，单元名为相对项目根目录的路径
pub fn group_by_directory(project_root: &Path, files: Vec<SourceFile>) -> Vec<DocUnit> {
    let mut units: Vec<DocUnit> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for file in files {
        let name = directory_unit_name(project_root, &file.path);
        match positions.get(&name) {
            Some(&idx) => units[idx].files.push(file),
            None => {
                positions.insert(name.clone(), units.len());
                units.push(DocUnit {
                    name,
                    files: vec![file],
                });
            }
        }
    }

    units
}

/// 计算文件所在目录的单元名称
fn directory_unit_name(project_root: &Path, file: &Path) -> String {
    let parent = file.parent().unwrap_or(project_root);
    let relative = parent
        .strip_prefix(project_root)
        .unwrap_or(parent)
        .to_string_lossy()
        .replace('\\', "/");
    let relative = relative.trim_matches('/');

    if relative.is_empty() {
        ROOT_UNIT.to_string()
    } else {
        relative.to_string()
    }
}
