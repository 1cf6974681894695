//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责会话管理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `session` - 分析会话
//! - 唯一持有 `ResultHistory`
//! - 补全默认批次名称和默认指令
//! - 只在分析成功时追加结果
//!
//! ### `batch_processor` - 批量模式
//! - 扫描批次清单（Vec<BatchManifest>）
//! - 逐个分析，统计成功 / 失败
//! - 汇总并写出报告
//!
//! ### `console` - 交互模式
//! - 逐行解析命令，驱动同一个会话
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor / console
//!     ↓
//! session (持有 ResultHistory)
//!     ↓
//! workflow::BatchPipeline (处理单个批次 / 汇总)
//!     ↓
//! services (能力层：file store / extraction / report)
//!     ↓
//! infrastructure (基础设施：GeminiHttp)
//! ```

pub mod batch_processor;
pub mod console;
pub mod session;

// 重新导出主要类型
pub use batch_processor::{App, ProcessingStats};
pub use console::{parse_command, Command, Console};
pub use session::{build_session, AnalysisSession};
