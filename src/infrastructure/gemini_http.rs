//! Gemini HTTP 客户端 - 基础设施层
//!
//! 持有唯一的 HTTP 客户端和 API Key，只暴露"发请求"的能力

use anyhow::{bail, Context, Result};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::config::Config;

const API_KEY_HEADER: &str = "x-goog-api-key";
const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";

/// Gemini REST 客户端
///
/// 职责：
/// - 持有 reqwest::Client 和凭证
/// - 暴露 JSON 请求 / 删除 / 分段上传能力
/// - 不认识批次、文档、提示词
#[derive(Clone)]
pub struct GeminiHttp {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiHttp {
    /// 创建新的客户端
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("无法创建 HTTP 客户端")?;

        Ok(Self {
            client,
            api_key: config.gemini_api_key.clone(),
            base_url: config.gemini_api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// 拼接完整 URL，`path` 形如 `v1beta/files/abc`
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// POST JSON 并解析 JSON 响应
    pub async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url(path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .with_context(|| format!("请求失败: {}", path))?;

        read_json(path, response).await
    }

    /// GET 并解析 JSON 响应
    pub async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        let url = self.url(path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .with_context(|| format!("请求失败: {}", path))?;

        read_json(path, response).await
    }

    /// DELETE 资源
    pub async fn delete(&self, path: &str) -> Result<()> {
        let url = self.url(path);
        debug!("DELETE {}", url);

        let response = self
            .client
            .delete(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .with_context(|| format!("请求失败: {}", path))?;

        ensure_success(path, response).await?;
        Ok(())
    }

    /// 开始分段上传，返回后续上传字节用的 URL
    pub async fn start_resumable_upload(
        &self,
        path: &str,
        display_name: &str,
        mime_type: &str,
        content_length: usize,
    ) -> Result<String> {
        let url = self.url(path);
        debug!("开始上传 {} ({} 字节, {})", display_name, content_length, mime_type);

        let metadata = serde_json::json!({ "file": { "display_name": display_name } });

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", content_length.to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&metadata)
            .send()
            .await
            .with_context(|| format!("请求失败: {}", path))?;

        let response = ensure_success(path, response).await?;

        let upload_url = response
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .with_context(|| format!("响应中缺少 {} 头", UPLOAD_URL_HEADER))?;

        Ok(upload_url)
    }

    /// 上传全部字节并结束分段上传
    pub async fn finish_resumable_upload<R: DeserializeOwned>(
        &self,
        upload_url: &str,
        bytes: Vec<u8>,
    ) -> Result<R> {
        let content_length = bytes.len();

        let response = self
            .client
            .post(upload_url)
            .header("Content-Length", content_length.to_string())
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .await
            .context("上传文件内容失败")?;

        read_json("upload", response).await
    }
}

/// 非 2xx 时把状态码和响应体放进错误
async fn ensure_success(endpoint: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    bail!("Gemini API 错误 {} ({}): {}", status, endpoint, body.trim());
}

async fn read_json<R: DeserializeOwned>(endpoint: &str, response: Response) -> Result<R> {
    let response = ensure_success(endpoint, response).await?;
    response
        .json::<R>()
        .await
        .with_context(|| format!("无法解析响应 JSON ({})", endpoint))
}
