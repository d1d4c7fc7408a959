//! 输出格式化模块
//!
//! 把比较结果渲染为纯文本、Markdown、HTML 或 JSON 报告

use crate::aggregate::{ChangeAggregator, ChangeSummary};
use crate::codec::JsonSnapshotCodec;
use crate::diff::{AttributeChange, Change, ChangeKind, ComparisonResult, MemberDiff, TypeDiff};
use crate::error::{Result, SurfaceDiffError};
use serde::{Deserialize, Serialize};

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    PlainText,
    Markdown,
    Html,
    Json,
}

/// 输出格式化器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatterConfig {
    /// 输出格式
    pub output_format: OutputFormat,
    /// 是否显示统计信息
    pub show_statistics: bool,
    /// 是否同时列出没有变更的类型和成员
    pub show_unchanged: bool,
    /// 是否启用颜色输出（仅对纯文本输出有效）
    pub enable_colors: bool,
    /// 自定义CSS样式（仅对HTML输出有效）
    pub custom_css: Option<String>,
    /// 缩进大小
    pub indent_size: usize,
}

/// 颜色主题
#[derive(Debug, Clone)]
pub struct ColorTheme {
    /// 新增条目颜色
    pub added: String,
    /// 删除条目颜色
    pub removed: String,
    /// 修改条目颜色
    pub modified: String,
    /// 标题颜色
    pub heading: String,
    /// 属性明细颜色
    pub detail: String,
}

/// 报告渲染器
pub struct ReportRenderer {
    config: FormatterConfig,
    theme: ColorTheme,
}

/// 格式化结果
#[derive(Debug, Clone)]
pub struct FormattedOutput {
    /// 格式化后的内容
    pub content: String,
    /// 输出格式
    pub format: OutputFormat,
    /// 元数据
    pub metadata: OutputMetadata,
}

/// 输出元数据
#[derive(Debug, Clone)]
pub struct OutputMetadata {
    /// 总行数
    pub total_lines: usize,
    /// 渲染的比较结果数量
    pub reports_count: usize,
    /// 有变更的类型数
    pub changed_types: usize,
    /// 是否存在任何变更
    pub has_changes: bool,
    /// 生成时间戳
    pub generated_at: String,
    /// 内容大小（字节）
    pub content_size: usize,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::PlainText,
            show_statistics: true,
            show_unchanged: false,
            enable_colors: true,
            custom_css: None,
            indent_size: 4,
        }
    }
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self {
            added: "\x1b[32m".to_string(),    // 绿色
            removed: "\x1b[31m".to_string(),  // 红色
            modified: "\x1b[33m".to_string(), // 黄色
            heading: "\x1b[1m".to_string(),   // 粗体
            detail: "\x1b[90m".to_string(),   // 灰色
        }
    }
}

const RESET: &str = "\x1b[0m";

impl ReportRenderer {
    /// 创建新的报告渲染器
    pub fn new(config: FormatterConfig) -> Self {
        Self {
            config,
            theme: ColorTheme::default(),
        }
    }

    /// 使用默认配置创建渲染器
    pub fn with_default_config() -> Self {
        Self::new(FormatterConfig::default())
    }

    /// 设置颜色主题
    pub fn with_theme(mut self, theme: ColorTheme) -> Self {
        self.theme = theme;
        self
    }

    pub fn config(&self) -> &FormatterConfig {
        &self.config
    }

    /// 渲染单个比较结果
    pub fn render(&self, result: &ComparisonResult) -> Result<FormattedOutput> {
        self.render_many(std::slice::from_ref(result))
    }

    /// 把多个比较结果渲染为一份报告
    pub fn render_many(&self, results: &[ComparisonResult]) -> Result<FormattedOutput> {
        let content = match self.config.output_format {
            OutputFormat::PlainText => self.render_plain_text(results),
            OutputFormat::Markdown => self.render_markdown(results),
            OutputFormat::Html => self.render_html(results),
            OutputFormat::Json => self.render_json(results)?,
        };

        let metadata = self.generate_metadata(results, &content);

        Ok(FormattedOutput {
            content,
            format: self.config.output_format,
            metadata,
        })
    }

    /// 渲染为纯文本格式
    fn render_plain_text(&self, results: &[ComparisonResult]) -> String {
        let sections: Vec<String> = results
            .iter()
            .map(|result| self.render_plain_text_section(result))
            .collect();
        sections.join("\n")
    }

    fn render_plain_text_section(&self, result: &ComparisonResult) -> String {
        let mut output = String::new();

        output.push_str(&self.paint(
            &self.theme.heading,
            &format!(
                "API changes: {} {} -> {}",
                result.name, result.old_version, result.new_version
            ),
        ));
        output.push_str("\n\n");

        if self.config.show_statistics {
            output.push_str(&self.format_statistics(&ChangeAggregator::summarize(result)));
            output.push_str("\n\n");
        }

        if !ChangeAggregator::has_changes(result) && !self.config.show_unchanged {
            output.push_str("No public API changes.\n");
            return output;
        }

        let indent = " ".repeat(self.config.indent_size);
        for type_diff in self.visible_types(result) {
            let marker = change_marker(type_diff.changes.first());
            let line = format!(
                "{marker} {} {}",
                type_diff.kind, type_diff.qualified_name
            );
            output.push_str(&self.paint_for(type_diff.change_kind(), &line));
            output.push('\n');
            self.push_plain_details(&mut output, &type_diff.changes, &indent);

            for member in self.visible_members(type_diff) {
                let marker = change_marker(member.changes.first());
                let line = format!("{indent}{marker} {}", member.signature_key);
                output.push_str(&self.paint_for(member.change_kind(), &line));
                output.push('\n');
                self.push_plain_details(&mut output, &member.changes, &indent.repeat(2));
            }
        }

        output
    }

    fn push_plain_details(&self, output: &mut String, changes: &[Change], indent: &str) {
        for change in changes {
            for detail in change.details() {
                let line = format!(
                    "{indent}  {}: {} -> {}",
                    detail.attribute,
                    display_value(&detail.old_value),
                    display_value(&detail.new_value)
                );
                output.push_str(&self.paint(&self.theme.detail, &line));
                output.push('\n');
            }
        }
    }

    /// 渲染为Markdown格式
    fn render_markdown(&self, results: &[ComparisonResult]) -> String {
        let sections: Vec<String> = results
            .iter()
            .map(|result| self.render_markdown_section(result))
            .collect();
        sections.join("\n")
    }

    fn render_markdown_section(&self, result: &ComparisonResult) -> String {
        let mut output = String::new();

        output.push_str(&format!("# API Changes: {}\n\n", result.name));
        output.push_str(&format!(
            "{} → {}\n\n",
            code_span(&result.old_version),
            code_span(&result.new_version)
        ));

        if self.config.show_statistics {
            output.push_str("## Statistics\n\n");
            output.push_str(&self.format_statistics_markdown(&ChangeAggregator::summarize(result)));
            output.push_str("\n\n");
        }

        output.push_str("## Changes\n\n");
        if !ChangeAggregator::has_changes(result) && !self.config.show_unchanged {
            output.push_str("No public API changes.\n");
            return output;
        }

        for type_diff in self.visible_types(result) {
            output.push_str(&format!(
                "### {} ({}){}\n\n",
                code_span(&type_diff.qualified_name),
                type_diff.kind,
                change_suffix(type_diff.change_kind())
            ));

            for change in &type_diff.changes {
                for detail in change.details() {
                    output.push_str(&format!("- {}\n", markdown_detail(detail)));
                }
            }

            for member in self.visible_members(type_diff) {
                let label = match member.change_kind() {
                    Some(ChangeKind::Added) => "Added",
                    Some(ChangeKind::Removed) => "Removed",
                    Some(ChangeKind::Modified) => "Modified",
                    None => "Unchanged",
                };
                output.push_str(&format!("- {label} {}\n", code_span(&member.signature_key)));
                for change in &member.changes {
                    for detail in change.details() {
                        output.push_str(&format!("  - {}\n", markdown_detail(detail)));
                    }
                }
            }
            output.push('\n');
        }

        output
    }

    /// 渲染为HTML格式
    fn render_html(&self, results: &[ComparisonResult]) -> String {
        let mut output = String::new();

        // HTML文档头部
        output.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        output.push_str("    <meta charset=\"UTF-8\">\n");
        output.push_str(
            "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
        );
        output.push_str("    <title>API Surface Changes</title>\n");

        output.push_str("    <style>\n");
        output.push_str(DEFAULT_CSS);
        if let Some(custom_css) = &self.config.custom_css {
            output.push_str(custom_css);
        }
        output.push_str("    </style>\n");
        output.push_str("</head>\n<body>\n");

        for result in results {
            output.push_str(&self.render_html_section(result));
        }

        output.push_str("</body>\n</html>\n");
        output
    }

    fn render_html_section(&self, result: &ComparisonResult) -> String {
        let mut output = String::new();

        output.push_str("    <div class=\"container\">\n");
        output.push_str(&format!(
            "        <h1>{}</h1>\n        <p class=\"versions\"><code>{}</code> &rarr; <code>{}</code></p>\n",
            html_escape(&result.name),
            html_escape(&result.old_version),
            html_escape(&result.new_version)
        ));

        if self.config.show_statistics {
            output.push_str("        <div class=\"statistics\">\n");
            output.push_str("            <h2>Statistics</h2>\n");
            output.push_str(&self.format_statistics_html(&ChangeAggregator::summarize(result)));
            output.push_str("        </div>\n");
        }

        output.push_str("        <div class=\"changes\">\n");
        output.push_str("            <h2>Changes</h2>\n");

        if !ChangeAggregator::has_changes(result) && !self.config.show_unchanged {
            output.push_str("            <p>No public API changes.</p>\n");
        } else {
            for type_diff in self.visible_types(result) {
                output.push_str(&format!(
                    "            <h3 class=\"{}\"><code>{}</code> ({})</h3>\n",
                    css_class(type_diff.change_kind()),
                    html_escape(&type_diff.qualified_name),
                    type_diff.kind
                ));
                output.push_str("            <ul>\n");
                for change in &type_diff.changes {
                    for detail in change.details() {
                        output.push_str(&format!(
                            "                <li class=\"detail\">{}</li>\n",
                            html_detail(detail)
                        ));
                    }
                }
                for member in self.visible_members(type_diff) {
                    output.push_str(&self.format_member_html(member));
                }
                output.push_str("            </ul>\n");
            }
        }

        output.push_str("        </div>\n");
        output.push_str("    </div>\n");
        output
    }

    fn format_member_html(&self, member: &MemberDiff) -> String {
        let mut output = format!(
            "                <li class=\"{}\"><span class=\"change-prefix\">{}</span><code>{}</code>",
            css_class(member.change_kind()),
            change_marker(member.changes.first()),
            html_escape(&member.signature_key)
        );

        let details: Vec<&AttributeChange> = member
            .changes
            .iter()
            .flat_map(|change| change.details())
            .collect();
        if !details.is_empty() {
            output.push_str("\n                    <ul>\n");
            for detail in details {
                output.push_str(&format!(
                    "                        <li class=\"detail\">{}</li>\n",
                    html_detail(detail)
                ));
            }
            output.push_str("                    </ul>\n                ");
        }

        output.push_str("</li>\n");
        output
    }

    /// 渲染为JSON格式，多个结果输出为数组
    fn render_json(&self, results: &[ComparisonResult]) -> Result<String> {
        let codec = JsonSnapshotCodec::new();

        if let [single] = results {
            return codec.report_string(single);
        }

        let reports = results
            .iter()
            .map(|result| codec.report_string(result))
            .collect::<Result<Vec<_>>>()?;
        Ok(format!("[\n{}]\n", reports.join(",\n")))
    }

    fn visible_types<'a>(&self, result: &'a ComparisonResult) -> Vec<&'a TypeDiff> {
        let show_unchanged = self.config.show_unchanged;
        result
            .types
            .iter()
            .filter(|type_diff| show_unchanged || type_diff.has_changes())
            .collect()
    }

    /// 新增和删除的类型不逐个列出成员
    fn visible_members<'a>(&self, type_diff: &'a TypeDiff) -> Vec<&'a MemberDiff> {
        if matches!(
            type_diff.change_kind(),
            Some(ChangeKind::Added) | Some(ChangeKind::Removed)
        ) && !self.config.show_unchanged
        {
            return Vec::new();
        }

        let show_unchanged = self.config.show_unchanged;
        type_diff
            .members
            .iter()
            .filter(|member| show_unchanged || member.has_changes())
            .collect()
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.config.enable_colors {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn paint_for(&self, kind: Option<ChangeKind>, text: &str) -> String {
        match kind {
            Some(ChangeKind::Added) => self.paint(&self.theme.added, text),
            Some(ChangeKind::Removed) => self.paint(&self.theme.removed, text),
            Some(ChangeKind::Modified) => self.paint(&self.theme.modified, text),
            None => text.to_string(),
        }
    }

    /// 格式化统计信息
    fn format_statistics(&self, summary: &ChangeSummary) -> String {
        format!(
            "Statistics:\n  Types:   +{} -{} ~{}\n  Members: +{} -{} ~{}\n  Types with changes: {}",
            summary.types_added,
            summary.types_removed,
            summary.types_modified,
            summary.members_added,
            summary.members_removed,
            summary.members_modified,
            summary.types_with_changes
        )
    }

    /// 格式化统计信息（Markdown）
    fn format_statistics_markdown(&self, summary: &ChangeSummary) -> String {
        format!(
            "| Change | Types | Members |\n|--------|-------|---------|\n| Added | {} | {} |\n| Removed | {} | {} |\n| Modified | {} | {} |",
            summary.types_added,
            summary.members_added,
            summary.types_removed,
            summary.members_removed,
            summary.types_modified,
            summary.members_modified
        )
    }

    /// 格式化统计信息（HTML）
    fn format_statistics_html(&self, summary: &ChangeSummary) -> String {
        format!(
            "            <table class=\"stats-table\">\n\
             <tr><th>Change</th><th>Types</th><th>Members</th></tr>\n\
             <tr><td>Added</td><td>{}</td><td>{}</td></tr>\n\
             <tr><td>Removed</td><td>{}</td><td>{}</td></tr>\n\
             <tr><td>Modified</td><td>{}</td><td>{}</td></tr>\n\
             </table>\n",
            summary.types_added,
            summary.members_added,
            summary.types_removed,
            summary.members_removed,
            summary.types_modified,
            summary.members_modified
        )
    }

    /// 生成输出元数据
    fn generate_metadata(&self, results: &[ComparisonResult], content: &str) -> OutputMetadata {
        OutputMetadata {
            total_lines: content.lines().count(),
            reports_count: results.len(),
            changed_types: results
                .iter()
                .map(|result| result.changed_types().count())
                .sum(),
            has_changes: results.iter().any(ChangeAggregator::has_changes),
            generated_at: chrono::Utc::now().to_rfc3339(),
            content_size: content.len(),
        }
    }
}

impl FormattedOutput {
    /// 保存到文件
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<()> {
        std::fs::write(path, &self.content).map_err(SurfaceDiffError::IoError)?;
        Ok(())
    }

    /// 获取内容大小（字节）
    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// 检查是否为空
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

fn change_marker(change: Option<&Change>) -> char {
    change.map_or(' ', |change| change.kind().marker())
}

fn change_suffix(kind: Option<ChangeKind>) -> &'static str {
    match kind {
        Some(ChangeKind::Added) => ": added",
        Some(ChangeKind::Removed) => ": removed",
        Some(ChangeKind::Modified) => ": modified",
        None => "",
    }
}

fn css_class(kind: Option<ChangeKind>) -> &'static str {
    match kind {
        Some(ChangeKind::Added) => "added",
        Some(ChangeKind::Removed) => "removed",
        Some(ChangeKind::Modified) => "modified",
        None => "unchanged",
    }
}

fn display_value(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("(none)")
}

fn markdown_detail(detail: &AttributeChange) -> String {
    format!(
        "**{}**: {} → {}",
        detail.attribute,
        code_span(display_value(&detail.old_value)),
        code_span(display_value(&detail.new_value))
    )
}

/// Markdown 行内代码，内容含反引号时使用双反引号包裹
fn code_span(text: &str) -> String {
    if text.contains('`') {
        format!("`` {text} ``")
    } else {
        format!("`{text}`")
    }
}

fn html_detail(detail: &AttributeChange) -> String {
    format!(
        "<strong>{}</strong>: <code>{}</code> &rarr; <code>{}</code>",
        html_escape(&detail.attribute),
        html_escape(display_value(&detail.old_value)),
        html_escape(display_value(&detail.new_value))
    )
}

/// HTML转义函数
fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const DEFAULT_CSS: &str = r#"
        body {
            font-family: -apple-system, 'Segoe UI', Helvetica, Arial, sans-serif;
            line-height: 1.6;
            margin: 0;
            padding: 20px;
            background-color: #f8f9fa;
        }
        .container {
            max-width: 1200px;
            margin: 0 auto 20px auto;
            background-color: white;
            padding: 30px;
            border-radius: 8px;
            box-shadow: 0 2px 10px rgba(0,0,0,0.1);
        }
        h1, h2 {
            color: #333;
            border-bottom: 2px solid #e9ecef;
            padding-bottom: 10px;
        }
        .stats-table {
            border-collapse: collapse;
            width: 100%;
            margin: 10px 0;
        }
        .stats-table td, .stats-table th {
            border: 1px solid #dee2e6;
            padding: 8px 12px;
        }
        .added { color: #1e7e34; }
        .removed { color: #bd2130; text-decoration: line-through; }
        .modified { color: #b38600; }
        .unchanged { color: #6c757d; }
        .detail { color: #495057; }
        .change-prefix {
            display: inline-block;
            width: 1.5em;
            font-weight: bold;
        }
        ul {
            list-style-type: none;
            padding-left: 1em;
        }
        code {
            background-color: #f8f9fa;
            padding: 2px 4px;
            border-radius: 3px;
            font-family: 'Consolas', 'Monaco', 'Courier New', monospace;
        }
"#;
