//! 会话内的分析结果历史
//!
//! 只能追加，只有用户显式 reset 才会清空；进程退出后自然消失。

use crate::models::AnalysisResult;

/// 按插入顺序保存的批次结果，等待汇总
#[derive(Debug, Clone, Default)]
pub struct ResultHistory {
    entries: Vec<AnalysisResult>,
}

impl ResultHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加到末尾（不去重，不限长度）
    pub fn append(&mut self, result: AnalysisResult) {
        self.entries.push(result);
    }

    /// 清空全部结果
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&AnalysisResult> {
        self.entries.get(index)
    }

    pub fn last(&self) -> Option<&AnalysisResult> {
        self.entries.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AnalysisResult> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(label: &str, text: &str) -> AnalysisResult {
        AnalysisResult::new(label, text, vec![])
    }

    #[test]
    fn test_append_keeps_order_and_duplicates() {
        let mut history = ResultHistory::new();
        history.append(result("A", "| x | 1 |"));
        history.append(result("B", "| x | 2 |"));
        history.append(result("A", "| x | 1 |"));

        assert_eq!(history.len(), 3);
        let labels: Vec<&str> = history.iter().map(|r| r.batch_label.as_str()).collect();
        assert_eq!(labels, vec!["A", "B", "A"]);
        assert_eq!(history.last().map(|r| r.batch_label.as_str()), Some("A"));
    }

    #[test]
    fn test_reset_then_append() {
        let mut history = ResultHistory::new();
        history.append(result("A", "a"));
        history.append(result("B", "b"));

        history.reset();
        assert!(history.is_empty());

        history.append(result("C", "c"));
        assert_eq!(history.len(), 1);
        assert_eq!(history.get(0).map(|r| r.text.as_str()), Some("c"));
    }
}
