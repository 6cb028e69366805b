//! Markdown 渲染
//!
//! 把结构化文档渲染为本地化的 Markdown 页面。渲染是纯函数，对任何结构化文档都不会失败。

use super::types::StructuredDoc;

/// 默认语言区域
pub const DEFAULT_LOCALE: &str = "fr-FR";

/// 表格列标题
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLabels {
    pub name: &'static str,
    pub kind: &'static str,
    pub description: &'static str,
}

/// 单个语言区域的翻译
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Translation {
    pub component: &'static str,
    pub role: &'static str,
    pub description: &'static str,
    pub interactions: &'static str,
    pub table: TableLabels,
}

/// 翻译表
pub const TRANSLATIONS: &[(&str, Translation)] = &[
    (
        "fr-FR",
        Translation {
            component: "Composant",
            role: "Rôle",
            description: "Description",
            interactions: "Interactions et règles",
            table: TableLabels {
                name: "Nom",
                kind: "Type",
                description: "Description",
            },
        },
    ),
    (
        "en-US",
        Translation {
            component: "Component",
            role: "Role",
            description: "Description",
            interactions: "Interactions and rules",
            table: TableLabels {
                name: "Name",
                kind: "Type",
                description: "Description",
            },
        },
    ),
    (
        "es-ES",
        Translation {
            component: "Componente",
            role: "Rol",
            description: "Descripción",
            interactions: "Interacciones y reglas",
            table: TableLabels {
                name: "Nombre",
                kind: "Tipo",
                description: "Descripción",
            },
        },
    ),
    (
        "de-DE",
        Translation {
            component: "Komponente",
            role: "Rolle",
            description: "Beschreibung",
            interactions: "Interaktionen und Regeln",
            table: TableLabels {
                name: "Name",
                kind: "Typ",
                description: "Beschreibung",
            },
        },
    ),
];

/// 查找翻译，未知区域回退到默认区域
pub fn translation_for(locale: &str) -> &'static Translation {
    TRANSLATIONS
        .iter()
        .find(|(tag, _)| *tag == locale)
        .or_else(|| TRANSLATIONS.iter().find(|(tag, _)| *tag == DEFAULT_LOCALE))
        .map(|(_, t)| t)
        .unwrap_or(&TRANSLATIONS[0].1)
}

/// 转义表格单元格
fn table_cell(value: &str) -> String {
    value
        .replace('|', "\\|")
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .trim()
        .to_string()
}

/// 渲染 Markdown 页面
pub fn render_markdown(doc: &StructuredDoc, locale: &str) -> String {
    let t = translation_for(locale);

    let rows = doc
        .interactions
        .iter()
        .map(|i| {
            format!(
                "| {} | {} | {} |",
                table_cell(&i.name),
                table_cell(&i.kind),
                table_cell(&i.description)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"## {component} {module}

### {role}

{role_text}

### {description}

{description_text}

### {interactions}

| {col_name} | {col_type} | {col_description} |
| --- | ---- | ----------- |
{rows}"#,
        component = t.component,
        module = doc.module,
        role = t.role,
        role_text = doc.role,
        description = t.description,
        description_text = doc.description,
        interactions = t.interactions,
        col_name = t.table.name,
        col_type = t.table.kind,
        col_description = t.table.description,
        rows = rows,
    )
}
