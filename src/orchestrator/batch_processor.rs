//! 批量批次处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是批量模式的入口，负责清单的加载和逐个处理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：组装 HTTP 客户端、文件存储、生成服务和会话
//! 2. **批量加载**：扫描并加载所有批次清单（`Vec<BatchManifest>`）
//! 3. **顺序处理**：逐个分析，单个批次失败不影响后续批次
//! 4. **汇总与报告**：两个及以上结果时汇总，写入报告文件
//! 5. **全局统计**：输出成功 / 失败数量

use crate::config::Config;
use crate::models::BatchManifest;
use crate::orchestrator::session::{build_session, AnalysisSession};
use crate::services::ReportWriter;
use crate::utils::logging;
use anyhow::Result;
use tracing::{error, info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    session: AnalysisSession,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::log_startup("批量分析模式", &config.model_name);

        let session = build_session(&config)?;

        Ok(Self { config, session })
    }

    /// 使用已组装好的会话创建（测试时注入假服务）
    pub fn with_session(config: Config, session: AnalysisSession) -> Self {
        Self { config, session }
    }

    pub fn session(&self) -> &AnalysisSession {
        &self.session
    }

    /// 运行应用主逻辑
    pub async fn run(&mut self) -> Result<ProcessingStats> {
        // 加载所有批次清单
        let manifests = self.load_manifests().await?;

        if manifests.is_empty() {
            warn!("⚠️ 没有找到待处理的TOML文件，程序结束");
            return Ok(ProcessingStats::default());
        }

        logging::log_manifests_loaded(manifests.len(), &self.config.batch_folder);

        let mut stats = ProcessingStats {
            total: manifests.len(),
            ..Default::default()
        };

        for (idx, manifest) in manifests.iter().enumerate() {
            if self.process_manifest(manifest, idx + 1, stats.total).await {
                stats.success += 1;
            } else {
                stats.failed += 1;
            }
        }

        let report_path = self.write_report().await;

        logging::print_final_stats(stats.success, stats.failed, stats.total, report_path.as_deref());

        Ok(stats)
    }

    /// 加载清单
    async fn load_manifests(&self) -> Result<Vec<BatchManifest>> {
        info!("\n📁 正在扫描待处理的批次清单...");
        Ok(crate::models::load_all_manifests(&self.config.batch_folder).await?)
    }

    /// 处理单个清单，返回是否成功
    async fn process_manifest(
        &mut self,
        manifest: &BatchManifest,
        batch_num: usize,
        total: usize,
    ) -> bool {
        let label = manifest.label.as_deref().unwrap_or(crate::workflow::DEFAULT_BATCH_LABEL);
        logging::log_batch_start(batch_num, total, label, manifest.documents.len());

        // 读不到的文档已在加载时跳过，一个都没有时由会话返回 NoDocuments
        let documents = manifest.load_documents().await;

        let instruction = match manifest.load_instruction().await {
            Ok(instruction) => instruction,
            Err(e) => {
                error!("[批次 {}] ❌ 读取分析指令失败: {}", batch_num, e);
                logging::log_batch_complete(batch_num, false, 0);
                return false;
            }
        };

        match self
            .session
            .analyze(manifest.label.as_deref(), &documents, instruction.as_deref())
            .await
        {
            Ok(outcome) => {
                info!(
                    "[批次 {}] 结果预览: {}",
                    batch_num,
                    logging::truncate_text(&outcome.result.text, 80)
                );
                logging::log_batch_complete(batch_num, true, outcome.warnings.len());
                true
            }
            Err(e) => {
                error!("[批次 {}] ❌ 处理过程中发生错误: {}", batch_num, e);
                logging::log_batch_complete(batch_num, false, 0);
                false
            }
        }
    }

    /// 汇总并写入报告，返回报告路径（没有结果或写入失败时为 None）
    async fn write_report(&self) -> Option<String> {
        let history = self.session.history();
        if history.is_empty() {
            warn!("⚠️ 没有成功的批次，不生成报告");
            return None;
        }

        // 汇总失败时仍然写出各批次的原始结果
        let summary = match self.session.summary_for_report().await {
            Ok(summary) => summary,
            Err(e) => {
                error!("❌ {}", e);
                None
            }
        };

        let writer = ReportWriter::with_path(&self.config.report_file);
        match writer.write(summary.as_deref(), history) {
            Ok(()) => Some(writer.path().display().to_string()),
            Err(e) => {
                error!("❌ 报告写入失败: {:#}", e);
                None
            }
        }
    }
}

/// 处理统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingStats {
    pub success: usize,
    pub failed: usize,
    pub total: usize,
}
