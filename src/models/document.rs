use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::mime::mime_for_filename;

/// 待分析的文档（原始字节 + 原始文件名）
///
/// 只在一次分析调用中存在，不做持久化。
#[derive(Clone, PartialEq, Eq)]
pub struct Document {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Document {
    /// 创建文档，MIME 类型由文件名推断
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        let mime_type = mime_for_filename(&filename).to_string();
        Self {
            filename,
            mime_type,
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// 不打印文档内容
impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("filename", &self.filename)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// 文件存储返回的远程文件句柄
///
/// 由创建它的那次分析调用独占，调用结束前必须删除且只删除一次。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFileHandle {
    /// 存储内部标识，例如 `files/abc123`
    pub name: String,
    /// 上传时的原始文件名
    pub display_name: String,
    /// 生成服务引用文件时使用的 URI
    pub uri: String,
    pub mime_type: String,
}

impl fmt::Display for RemoteFileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name, self.name)
    }
}

/// 单个批次的分析结果
///
/// `text` 通常是两列的 Markdown 表格（标准 → 提取值），但不做格式校验。
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub batch_label: String,
    pub text: String,
    /// 实际参与分析的文件名（上传成功的部分）
    pub sources: Vec<String>,
    pub produced_at: DateTime<Local>,
}

impl AnalysisResult {
    pub fn new(batch_label: impl Into<String>, text: impl Into<String>, sources: Vec<String>) -> Self {
        Self {
            batch_label: batch_label.into(),
            text: text.into(),
            sources,
            produced_at: Local::now(),
        }
    }
}
