//! LLM 文档分析服务 - 业务能力层
//!
//! 只负责"带文件的文本生成"能力，不关心流程
//!
//! ## 技术栈
//! - 直接调用 Gemini REST 接口 `models/{model}:generateContent`
//! - 文件以 `fileData` 形式引用（需先通过 `GeminiFileStore` 上传）

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::infrastructure::GeminiHttp;
use crate::models::RemoteFileHandle;
use crate::services::ports::ExtractionService;

// ========== 请求结构 ==========

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    File {
        #[serde(rename = "fileData")]
        file_data: FileData<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileData<'a> {
    mime_type: &'a str,
    file_uri: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
}

// ========== 响应结构 ==========

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Gemini 文档分析服务
///
/// 职责：
/// - 把指令文本和已上传的文件一起发送给模型
/// - 提取模型返回的文本
/// - 不解析表格内容
/// - 不负责上传 / 删除文件
pub struct GeminiExtractionService {
    http: GeminiHttp,
    model_name: String,
    temperature: f32,
}

impl GeminiExtractionService {
    /// 创建新的分析服务
    pub fn new(http: GeminiHttp, config: &Config) -> Self {
        Self {
            http,
            model_name: config
                .model_name
                .trim_start_matches("models/")
                .to_string(),
            temperature: config.temperature,
        }
    }

    fn endpoint(&self) -> String {
        format!("v1beta/models/{}:generateContent", self.model_name)
    }
}

/// 构建请求：文本在前，文件按顺序在后
fn build_request<'a>(
    instruction: &'a str,
    files: &'a [RemoteFileHandle],
    temperature: f32,
) -> GenerateContentRequest<'a> {
    let mut parts = Vec::with_capacity(files.len() + 1);
    parts.push(Part::Text { text: instruction });
    for file in files {
        parts.push(Part::File {
            file_data: FileData {
                mime_type: &file.mime_type,
                file_uri: &file.uri,
            },
        });
    }

    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts,
        }],
        generation_config: GenerationConfig { temperature },
    }
}

/// 提取第一个候选的全部文本
fn extract_text(response: GenerateContentResponse) -> Result<String> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        bail!("请求被模型拦截: {}", reason);
    }

    let candidate = match response.candidates.into_iter().next() {
        Some(candidate) => candidate,
        None => bail!("LLM 返回结果为空"),
    };

    let text: String = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.text)
        .collect();

    let text = text.trim();
    if text.is_empty() {
        bail!(
            "LLM 返回内容为空 (finishReason: {})",
            candidate.finish_reason.as_deref().unwrap_or("未知")
        );
    }

    if let Some(reason) = candidate.finish_reason.as_deref() {
        if reason != "STOP" {
            warn!("LLM 输出可能不完整 (finishReason: {})", reason);
        }
    }

    Ok(text.to_string())
}

#[async_trait]
impl ExtractionService for GeminiExtractionService {
    fn name(&self) -> &str {
        &self.model_name
    }

    async fn generate(&self, instruction: &str, files: &[RemoteFileHandle]) -> Result<String> {
        debug!("调用 Gemini API，模型: {}", self.model_name);
        debug!("指令长度: {} 字符，附带 {} 个文件", instruction.len(), files.len());

        let request = build_request(instruction, files, self.temperature);
        let response: GenerateContentResponse =
            self.http.post_json(&self.endpoint(), &request).await?;

        debug!("Gemini API 调用成功");

        extract_text(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(name: &str, filename: &str, mime: &str) -> RemoteFileHandle {
        RemoteFileHandle {
            name: format!("files/{}", name),
            display_name: filename.to_string(),
            uri: format!("https://example.test/v1beta/files/{}", name),
            mime_type: mime.to_string(),
        }
    }

    #[test]
    fn test_request_shape() {
        let files = vec![
            handle("a", "spec.pdf", "application/pdf"),
            handle("b", "terms.docx", "application/msword"),
        ];
        let request = build_request("extract project scope", &files, 0.2);
        let json = serde_json::to_value(&request).unwrap();

        let parts = json["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0]["text"], "extract project scope");
        assert_eq!(parts[1]["fileData"]["mimeType"], "application/pdf");
        assert_eq!(
            parts[2]["fileData"]["fileUri"],
            "https://example.test/v1beta/files/b"
        );
        assert!(json["generationConfig"]["temperature"].is_number());
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{
                "candidates": [{
                    "content": {"role": "model", "parts": [
                        {"text": "| Kriterium | Ergebnis |\n"},
                        {"text": "| Technologie | Rust |\n"}
                    ]},
                    "finishReason": "STOP"
                }]
            }"#,
        )
        .unwrap();

        let text = extract_text(response).unwrap();
        assert_eq!(text, "| Kriterium | Ergebnis |\n| Technologie | Rust |");
    }

    #[test]
    fn test_extract_text_errors() {
        let blocked: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#).unwrap();
        assert!(extract_text(blocked).unwrap_err().to_string().contains("SAFETY"));

        assert!(extract_text(GenerateContentResponse::default()).is_err());

        let empty: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [{"text": "  "}]}, "finishReason": "MAX_TOKENS"}]}"#,
        )
        .unwrap();
        assert!(extract_text(empty).unwrap_err().to_string().contains("MAX_TOKENS"));
    }

    #[test]
    fn test_model_prefix_is_stripped() {
        let config = Config {
            gemini_api_key: "k".to_string(),
            model_name: "models/gemini-1.5-pro".to_string(),
            ..Config::default()
        };
        let http = GeminiHttp::new(&config).unwrap();
        let service = GeminiExtractionService::new(http, &config);
        assert_eq!(service.endpoint(), "v1beta/models/gemini-1.5-pro:generateContent");
    }
}
