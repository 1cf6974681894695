//! 批次处理上下文
//!
//! 封装"我正在处理第几个批次、叫什么名字"这一信息

use std::fmt::Display;

use crate::workflow::prompts::DEFAULT_BATCH_LABEL;

/// 批次处理上下文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchCtx {
    /// 批次名称（写入提示词和报告）
    pub label: String,

    /// 批次序号（仅用于日志显示，从1开始）
    pub batch_index: usize,
}

impl BatchCtx {
    /// 创建新的批次上下文，名称为空时使用默认名称
    pub fn new(label: Option<&str>, batch_index: usize) -> Self {
        let label = label
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_BATCH_LABEL)
            .to_string();

        Self { label, batch_index }
    }
}

impl Display for BatchCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[批次 {}]", self.batch_index)
    }
}
