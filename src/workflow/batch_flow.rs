//! 批次分析流程 - 流程层
//!
//! 核心职责：定义"一个批次"的完整处理流程，以及多个批次结果的汇总
//!
//! 流程顺序：
//! 1. 前置检查（文档非空、指令非空、可选的单文档限制）
//! 2. 逐个上传文档（单个失败只记录，不中断）
//! 3. 全部失败 → `NoFilesUploaded`，不调用生成服务
//! 4. 构建指令 → 调用生成服务
//! 5. 无论生成成功与否，删除本次上传的全部文件

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::AnalysisError;
use crate::models::{AnalysisResult, Document, RemoteFileHandle, ResultHistory};
use crate::services::{DocumentStore, ExtractionService};
use crate::workflow::batch_ctx::BatchCtx;
use crate::workflow::prompts::{PromptTemplates, NOTHING_TO_CONSOLIDATE};

/// 流程选项
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// 每个批次只允许一个文档
    pub single_document_batches: bool,
    pub prompts: PromptTemplates,
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            single_document_batches: config.single_document_batches,
            prompts: config.prompts.clone(),
        }
    }
}

/// 单个批次的处理结果
#[derive(Debug)]
pub struct BatchOutcome {
    pub result: AnalysisResult,
    /// 上传 / 删除失败的警告，不影响结果
    pub warnings: Vec<AnalysisError>,
}

/// 上传阶段的结果：成功的句柄 + 每个失败文档的错误
struct UploadReport {
    handles: Vec<RemoteFileHandle>,
    failures: Vec<AnalysisError>,
}

/// 批次分析流程
///
/// - 编排上传 → 生成 → 清理
/// - 不持有历史结果（由会话决定是否追加）
/// - 只依赖注入的协作方（DocumentStore / ExtractionService）
pub struct BatchPipeline {
    store: Arc<dyn DocumentStore>,
    extractor: Arc<dyn ExtractionService>,
    consolidator: Arc<dyn ExtractionService>,
    options: PipelineOptions,
}

impl BatchPipeline {
    /// 创建新的流程，汇总默认使用同一个生成服务
    pub fn new(
        store: Arc<dyn DocumentStore>,
        extractor: Arc<dyn ExtractionService>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            store,
            consolidator: extractor.clone(),
            extractor,
            options,
        }
    }

    /// 使用单独的服务做汇总
    pub fn with_consolidator(mut self, consolidator: Arc<dyn ExtractionService>) -> Self {
        self.consolidator = consolidator;
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// 分析一个批次
    ///
    /// 不会追加到历史记录，由调用方决定。
    pub async fn analyze_batch(
        &self,
        ctx: &BatchCtx,
        documents: &[Document],
        instruction: &str,
    ) -> Result<BatchOutcome, AnalysisError> {
        self.check_preconditions(documents, instruction)?;

        info!(
            "{} 📄 开始分析「{}」，共 {} 个文档",
            ctx,
            ctx.label,
            documents.len()
        );

        let uploads = self.upload_all(ctx, documents).await;

        if uploads.handles.is_empty() {
            error!("{} ❌ 没有任何文档上传成功，跳过分析", ctx);
            return Err(AnalysisError::NoFilesUploaded {
                failures: uploads.failures,
            });
        }

        let UploadReport { handles, failures } = uploads;
        let sources: Vec<String> = handles.iter().map(|h| h.display_name.clone()).collect();
        let prompt = self
            .options
            .prompts
            .build_extraction_prompt(&ctx.label, instruction, &sources);

        info!(
            "{} 🤖 正在使用 {} 分析 {} 个文档...",
            ctx,
            self.extractor.name(),
            handles.len()
        );

        let generated = self.extractor.generate(&prompt, &handles).await;

        // 无论生成结果如何，本次上传的文件都在这里释放
        let deletion_failures = self.release_all(ctx, handles).await;

        let mut warnings = failures;
        warnings.extend(deletion_failures);

        match generated {
            Ok(text) => {
                info!("{} ✓ 分析完成 ({} 字符)", ctx, text.chars().count());
                Ok(BatchOutcome {
                    result: AnalysisResult::new(&ctx.label, text, sources),
                    warnings,
                })
            }
            Err(cause) => {
                error!("{} ❌ 分析失败: {:#}", ctx, cause);
                Err(AnalysisError::GenerationFailed { cause })
            }
        }
    }

    /// 汇总历史结果
    ///
    /// 历史为空时直接返回固定提示，不调用生成服务；失败时不修改历史。
    pub async fn consolidate(&self, history: &ResultHistory) -> Result<String, AnalysisError> {
        if history.is_empty() {
            info!("历史结果为空，无需汇总");
            return Ok(NOTHING_TO_CONSOLIDATE.to_string());
        }

        info!(
            "🧩 正在使用 {} 汇总 {} 个批次的结果...",
            self.consolidator.name(),
            history.len()
        );

        let prompt = self.options.prompts.build_consolidation_prompt(history);

        match self.consolidator.generate(&prompt, &[]).await {
            Ok(text) => {
                info!("✓ 汇总完成");
                Ok(text)
            }
            Err(cause) => {
                error!("❌ 汇总失败: {:#}", cause);
                Err(AnalysisError::ConsolidationFailed { cause })
            }
        }
    }

    fn check_preconditions(
        &self,
        documents: &[Document],
        instruction: &str,
    ) -> Result<(), AnalysisError> {
        if documents.is_empty() {
            return Err(AnalysisError::NoDocuments);
        }
        if instruction.trim().is_empty() {
            return Err(AnalysisError::EmptyInstruction);
        }
        if self.options.single_document_batches && documents.len() > 1 {
            return Err(AnalysisError::TooManyDocuments {
                count: documents.len(),
            });
        }
        Ok(())
    }

    /// 按输入顺序逐个上传
    async fn upload_all(&self, ctx: &BatchCtx, documents: &[Document]) -> UploadReport {
        let mut report = UploadReport {
            handles: Vec::with_capacity(documents.len()),
            failures: Vec::new(),
        };

        for (i, document) in documents.iter().enumerate() {
            match self.store.upload(document).await {
                Ok(handle) => {
                    info!(
                        "{} ⬆️ 已上传 {}/{}: {}",
                        ctx,
                        i + 1,
                        documents.len(),
                        document.filename
                    );
                    report.handles.push(handle);
                }
                Err(cause) => {
                    warn!(
                        "{} ⚠️ 上传失败 {}/{}: {}: {:#}",
                        ctx,
                        i + 1,
                        documents.len(),
                        document.filename,
                        cause
                    );
                    report.failures.push(AnalysisError::UploadFailed {
                        filename: document.filename.clone(),
                        cause,
                    });
                }
            }
        }

        report
    }

    /// 删除本次创建的全部远程文件，返回删除失败的警告
    async fn release_all(
        &self,
        ctx: &BatchCtx,
        handles: Vec<RemoteFileHandle>,
    ) -> Vec<AnalysisError> {
        info!("{} 🗑️ 清理 {} 个远程文件...", ctx, handles.len());

        let mut failures = Vec::new();
        for handle in handles {
            if let Err(cause) = self.store.delete(&handle).await {
                warn!("{} ⚠️ 远程文件 {} 删除失败: {:#}", ctx, handle, cause);
                failures.push(AnalysisError::DeletionFailed { handle, cause });
            }
        }

        if failures.is_empty() {
            info!("{} ✓ 清理完成", ctx);
        }
        failures
    }
}
