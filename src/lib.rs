//! # Tender Analyzer
//!
//! 一个用于批量分析招标文件（Ausschreibungen）的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有 HTTP 客户端，只暴露能力
//! - `GeminiHttp` - 统一的鉴权、超时和错误处理
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `DocumentStore` / `GeminiFileStore` - 上传 / 删除远程文件
//! - `ExtractionService` / `GeminiExtractionService` - 带文件的文本生成
//! - `ChatCompletionService` - 可选的 OpenAI 兼容汇总后端
//! - `ReportWriter` - 写 Markdown 报告
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个批次"的完整处理流程
//! - `BatchCtx` - 上下文封装（批次名称 + 序号）
//! - `BatchPipeline` - 流程编排（upload → generate → release）和结果汇总
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/session` - 持有结果历史
//! - `orchestrator/batch_processor` - 批量模式（批次清单 → 报告）
//! - `orchestrator/console` - 交互模式
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, ConsolidationBackend};
pub use error::{AnalysisError, AppError, AppResult};
pub use models::{AnalysisResult, Document, RemoteFileHandle, ResultHistory};
pub use orchestrator::{build_session, AnalysisSession, App, Console};
pub use services::{DocumentStore, ExtractionService};
pub use workflow::{BatchCtx, BatchOutcome, BatchPipeline, PipelineOptions};
