//! 报告写入服务 - 业务能力层
//!
//! 只负责"把结果写成 Markdown 报告"能力，不关心流程

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::models::ResultHistory;

/// 报告写入服务
///
/// 报告结构：
/// 1. 带时间戳的标题
/// 2. 汇总表格（如果有）
/// 3. 每个批次的原始结果
pub struct ReportWriter {
    report_path: PathBuf,
}

impl ReportWriter {
    /// 使用指定文件路径创建
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            report_path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.report_path
    }

    /// 写入完整报告（覆盖已有文件）
    pub fn write(&self, consolidated: Option<&str>, history: &ResultHistory) -> Result<()> {
        debug!(
            "写入报告: {} (批次数: {})",
            self.report_path.display(),
            history.len()
        );

        if let Some(parent) = self.report_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("无法创建目录: {}", parent.display()))?;
            }
        }

        let report = render_report(consolidated, history, chrono::Local::now());
        fs::write(&self.report_path, report)
            .with_context(|| format!("无法写入报告: {}", self.report_path.display()))?;

        Ok(())
    }
}

/// 渲染报告文本
pub fn render_report(
    consolidated: Option<&str>,
    history: &ResultHistory,
    generated_at: chrono::DateTime<chrono::Local>,
) -> String {
    let mut out = format!(
        "# Ausschreibungsanalyse\n\nErstellt: {}\n\n",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    );

    if let Some(table) = consolidated {
        out.push_str("## Konsolidiertes Ergebnis\n\n");
        out.push_str(table.trim());
        out.push_str("\n\n");
    }

    for (i, result) in history.iter().enumerate() {
        out.push_str(&format!("## {}. {}\n\n", i + 1, result.batch_label));
        if !result.sources.is_empty() {
            out.push_str(&format!("Quellen: {}\n\n", result.sources.join(", ")));
        }
        out.push_str(result.text.trim());
        out.push_str("\n\n");
    }

    out
}
