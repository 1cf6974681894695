pub mod batch_ctx;
pub mod batch_flow;
pub mod prompts;

pub use batch_ctx::BatchCtx;
pub use batch_flow::{BatchOutcome, BatchPipeline, PipelineOptions};
pub use prompts::{
    PromptTemplates, BATCH_DELIMITER, DEFAULT_BATCH_LABEL, NOTHING_TO_CONSOLIDATE,
};
