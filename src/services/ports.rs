//! 外部协作方接口
//!
//! 流程层只依赖这两个 trait，具体实现（Gemini / OpenAI 兼容接口 / 测试替身）
//! 由调用方在构造 `BatchPipeline` 时注入。

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Document, RemoteFileHandle};

/// 远程文件存储
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 上传文档，返回远程句柄；文件名用于推断内容类型
    async fn upload(&self, document: &Document) -> Result<RemoteFileHandle>;

    /// 删除远程文件；重复删除返回普通错误，由调用方决定如何处理
    async fn delete(&self, handle: &RemoteFileHandle) -> Result<()>;
}

/// 基于文档的文本生成服务
///
/// 无状态；相同输入不保证相同输出，也不保证输出一定是两列表格。
#[async_trait]
pub trait ExtractionService: Send + Sync {
    /// 服务名称（用于日志）
    fn name(&self) -> &str;

    /// 发送指令和文件句柄，返回生成的文本
    async fn generate(&self, instruction: &str, files: &[RemoteFileHandle]) -> Result<String>;
}
