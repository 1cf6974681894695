//! 聊天补全服务 - 业务能力层
//!
//! 纯文本生成，用于结果汇总（不涉及文件）
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 兼容 OpenAI API 的服务（如 Azure、各类网关等）

use anyhow::{bail, Result};
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::RemoteFileHandle;
use crate::services::ports::ExtractionService;

const SYSTEM_MESSAGE: &str = "Du bist ein sorgfältiger Assistent für die Auswertung öffentlicher Ausschreibungen. Du führst Analyse-Tabellen zusammen, ohne Informationen zu erfinden oder stillschweigend zu verwerfen.";

/// OpenAI 兼容的聊天补全服务
///
/// 职责：
/// - 提供通用的文本 LLM 调用接口
/// - 不支持文件输入（传入文件句柄直接报错）
pub struct ChatCompletionService {
    client: Client<OpenAIConfig>,
    model_name: String,
    temperature: f32,
}

impl ChatCompletionService {
    /// 创建新的聊天服务
    ///
    /// 需要配置 `llm_api_key` 和 `llm_api_base_url`
    pub fn new(config: &Config) -> Result<Self> {
        let (api_key, api_base) = match (&config.llm_api_key, &config.llm_api_base_url) {
            (Some(key), Some(base)) => (key, base),
            _ => bail!("OpenAI 兼容后端需要 LLM_API_KEY 和 LLM_API_BASE_URL"),
        };

        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base);

        Ok(Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
            temperature: config.temperature,
        })
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（字符串）
    pub async fn send_to_llm(&self, user_message: &str, system_message: Option<&str>) -> Result<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(self.temperature)
            .build()?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            anyhow::anyhow!("LLM API 调用失败: {}", e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("LLM 返回内容为空"))?;

        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl ExtractionService for ChatCompletionService {
    fn name(&self) -> &str {
        &self.model_name
    }

    async fn generate(&self, instruction: &str, files: &[RemoteFileHandle]) -> Result<String> {
        if !files.is_empty() {
            bail!(
                "聊天补全后端不支持文件输入 (收到 {} 个文件)",
                files.len()
            );
        }
        self.send_to_llm(instruction, Some(SYSTEM_MESSAGE)).await
    }
}
