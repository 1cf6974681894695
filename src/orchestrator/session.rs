//! 分析会话 - 编排层
//!
//! ## 职责
//!
//! 会话是 `ResultHistory` 的唯一持有者：
//!
//! 1. **批次分析**：补全默认名称 / 默认指令后委托 `BatchPipeline`
//! 2. **历史维护**：只有成功的分析才追加，失败不改动历史
//! 3. **结果汇总**：把当前历史交给流程层汇总
//! 4. **显式重置**：只有调用 `reset` 才清空历史

use crate::config::Config;
use crate::error::AnalysisError;
use crate::models::{Document, ResultHistory};
use crate::workflow::{BatchCtx, BatchOutcome, BatchPipeline};
use tracing::{info, warn};

/// 分析会话
pub struct AnalysisSession {
    pipeline: BatchPipeline,
    history: ResultHistory,
    /// 已发起的批次数（含失败的），用于日志编号
    batches_started: usize,
}

impl AnalysisSession {
    pub fn new(pipeline: BatchPipeline) -> Self {
        Self {
            pipeline,
            history: ResultHistory::new(),
            batches_started: 0,
        }
    }

    /// 分析一个批次，成功后追加到历史
    ///
    /// # 参数
    /// - `label`: 批次名称，None 或空白时使用默认名称
    /// - `documents`: 本批文档
    /// - `instruction`: 分析指令，None 时使用配置中的默认指令
    pub async fn analyze(
        &mut self,
        label: Option<&str>,
        documents: &[Document],
        instruction: Option<&str>,
    ) -> Result<BatchOutcome, AnalysisError> {
        self.batches_started += 1;
        let ctx = BatchCtx::new(label, self.batches_started);

        let instruction = match instruction {
            Some(text) => text.to_string(),
            None => self.pipeline.options().prompts.default_instruction.clone(),
        };

        let outcome = self
            .pipeline
            .analyze_batch(&ctx, documents, &instruction)
            .await?;

        for warning in &outcome.warnings {
            warn!("{} ⚠️ {}", ctx, warning);
        }

        self.history.append(outcome.result.clone());
        info!("{} 📚 已加入历史，当前共 {} 个结果", ctx, self.history.len());

        Ok(outcome)
    }

    /// 汇总当前历史中的全部结果
    pub async fn consolidate(&self) -> Result<String, AnalysisError> {
        self.pipeline.consolidate(&self.history).await
    }

    /// 清空历史
    pub fn reset(&mut self) {
        info!("🧹 清空历史结果 ({} 个)", self.history.len());
        self.history.reset();
    }

    pub fn history(&self) -> &ResultHistory {
        &self.history
    }

    /// 报告的汇总部分：两个及以上结果才需要调用汇总服务
    pub async fn summary_for_report(&self) -> Result<Option<String>, AnalysisError> {
        match self.history.len() {
            0 => Ok(None),
            1 => Ok(self.history.last().map(|r| r.text.clone())),
            _ => self.consolidate().await.map(Some),
        }
    }
}

/// 根据配置组装会话
pub fn build_session(config: &Config) -> anyhow::Result<AnalysisSession> {
    use crate::config::ConsolidationBackend;
    use crate::infrastructure::GeminiHttp;
    use crate::services::{ChatCompletionService, GeminiExtractionService, GeminiFileStore};
    use crate::workflow::PipelineOptions;
    use std::sync::Arc;

    let http = GeminiHttp::new(config)?;
    let store = Arc::new(GeminiFileStore::new(http.clone(), config));
    let extractor = Arc::new(GeminiExtractionService::new(http, config));

    let mut pipeline = BatchPipeline::new(store, extractor, PipelineOptions::from_config(config));

    if config.consolidation_backend == ConsolidationBackend::OpenAi {
        let chat = ChatCompletionService::new(config)?;
        info!("🧩 汇总使用 OpenAI 兼容后端: {}", config.llm_model_name);
        pipeline = pipeline.with_consolidator(Arc::new(chat));
    }

    Ok(AnalysisSession::new(pipeline))
}
