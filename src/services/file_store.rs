//! 文件存储服务 - 业务能力层
//!
//! 只负责"上传 / 删除远程文件"能力，不关心流程

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::infrastructure::GeminiHttp;
use crate::models::{Document, RemoteFileHandle};
use crate::services::ports::DocumentStore;

const UPLOAD_PATH: &str = "upload/v1beta/files";

/// 远程文件状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum FileState {
    StateUnspecified,
    Processing,
    Active,
    Failed,
}

#[derive(Debug, Deserialize)]
struct FileStatus {
    #[serde(default)]
    message: Option<String>,
}

/// Files API 返回的文件对象
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiFile {
    name: String,
    #[serde(default)]
    mime_type: Option<String>,
    uri: String,
    #[serde(default)]
    state: Option<FileState>,
    #[serde(default)]
    error: Option<FileStatus>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: GeminiFile,
}

impl GeminiFile {
    /// 文件是否可以被生成服务引用
    ///
    /// 处理中返回 `Ok(false)`，处理失败返回错误
    fn is_ready(&self) -> Result<bool> {
        match self.state {
            Some(FileState::Processing) => Ok(false),
            Some(FileState::Failed) => {
                let message = self
                    .error
                    .as_ref()
                    .and_then(|e| e.message.clone())
                    .unwrap_or_else(|| "未知原因".to_string());
                bail!("远程文件 {} 处理失败: {}", self.name, message)
            }
            Some(FileState::Active) | Some(FileState::StateUnspecified) | None => Ok(true),
        }
    }

    fn into_handle(self, document: &Document) -> RemoteFileHandle {
        RemoteFileHandle {
            name: self.name,
            display_name: document.filename.clone(),
            uri: self.uri,
            mime_type: self.mime_type.unwrap_or_else(|| document.mime_type.clone()),
        }
    }
}

/// Gemini Files API 存储
///
/// 职责：
/// - 分段上传文档字节
/// - 等待远程文件处理完成
/// - 删除远程文件
pub struct GeminiFileStore {
    http: GeminiHttp,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl GeminiFileStore {
    /// 创建新的文件存储服务
    pub fn new(http: GeminiHttp, config: &Config) -> Self {
        Self {
            http,
            poll_interval: Duration::from_millis(config.file_poll_interval_ms),
            max_poll_attempts: config.file_poll_max_attempts,
        }
    }

    /// 轮询直到文件可用
    async fn wait_until_ready(&self, mut file: GeminiFile) -> Result<GeminiFile> {
        let mut attempts = 0;
        while !file.is_ready()? {
            if attempts >= self.max_poll_attempts {
                bail!(
                    "远程文件 {} 在 {} 次轮询后仍在处理中",
                    file.name,
                    self.max_poll_attempts
                );
            }
            attempts += 1;
            debug!("远程文件 {} 处理中，第 {} 次轮询", file.name, attempts);
            tokio::time::sleep(self.poll_interval).await;
            file = self.http.get_json(&format!("v1beta/{}", file.name)).await?;
        }
        Ok(file)
    }
}

#[async_trait]
impl DocumentStore for GeminiFileStore {
    async fn upload(&self, document: &Document) -> Result<RemoteFileHandle> {
        if document.is_empty() {
            bail!("文件内容为空");
        }

        let upload_url = self
            .http
            .start_resumable_upload(
                UPLOAD_PATH,
                &document.filename,
                &document.mime_type,
                document.len(),
            )
            .await?;

        let uploaded: UploadResponse = self
            .http
            .finish_resumable_upload(&upload_url, document.bytes.clone())
            .await?;

        let name = uploaded.file.name.clone();
        match self.wait_until_ready(uploaded.file).await {
            Ok(file) => Ok(file.into_handle(document)),
            Err(e) => {
                // 文件已经创建，但句柄不会交给调用方，这里自己清理
                if let Err(delete_err) = self.http.delete(&format!("v1beta/{}", name)).await {
                    warn!("未就绪的远程文件 {} 删除失败: {}", name, delete_err);
                }
                Err(e)
            }
        }
    }

    async fn delete(&self, handle: &RemoteFileHandle) -> Result<()> {
        self.http.delete(&format!("v1beta/{}", handle.name)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    const PROCESSING_FILE: &str =
        r#"{"name": "files/x", "uri": "http://fake/v1beta/files/x", "state": "PROCESSING"}"#;

    /// 读取一个 HTTP 请求（含请求体），返回 (method, path)
    async fn read_request(socket: &mut TcpStream) -> Option<(String, String)> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        let header_end = loop {
            let n = socket.read(&mut chunk).await.ok()?;
            if n == 0 {
                return None;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let content_length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(key, _)| key.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);

        while buf.len() < header_end + content_length {
            let n = socket.read(&mut chunk).await.ok()?;
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        let mut parts = head.split_whitespace();
        Some((parts.next()?.to_string(), parts.next()?.to_string()))
    }

    /// 本地假 Files API：文件永远停在 PROCESSING，记录收到的每个请求
    async fn spawn_stuck_files_api() -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let upload_url = format!("{}/upload-session", base_url);
        let log = requests.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let log = log.clone();
                let upload_url = upload_url.clone();
                tokio::spawn(async move {
                    let Some((method, path)) = read_request(&mut socket).await else {
                        return;
                    };
                    log.lock().unwrap().push(format!("{} {}", method, path));

                    let (extra_header, body) = match (method.as_str(), path.as_str()) {
                        ("POST", "/upload/v1beta/files") => {
                            (format!("x-goog-upload-url: {}\r\n", upload_url), "{}".to_string())
                        }
                        ("POST", "/upload-session") => {
                            (String::new(), format!(r#"{{"file": {}}}"#, PROCESSING_FILE))
                        }
                        ("GET", _) => (String::new(), PROCESSING_FILE.to_string()),
                        _ => (String::new(), "{}".to_string()),
                    };

                    let response = format!(
                        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n{}\r\n{}",
                        body.len(),
                        extra_header,
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        (base_url, requests)
    }

    #[tokio::test]
    async fn test_file_stuck_in_processing_is_deleted_before_error() {
        let (base_url, requests) = spawn_stuck_files_api().await;
        let config = Config {
            gemini_api_key: "k".to_string(),
            gemini_api_base_url: base_url,
            file_poll_interval_ms: 1,
            file_poll_max_attempts: 2,
            ..Config::default()
        };
        let store = GeminiFileStore::new(GeminiHttp::new(&config).unwrap(), &config);

        let document = Document::new("spec.pdf", b"%PDF-1.4".to_vec());
        let err = store.upload(&document).await.unwrap_err();
        assert!(err.to_string().contains("2 次轮询"), "{}", err);

        let requests = requests.lock().unwrap().clone();
        let count = |wanted: &str| requests.iter().filter(|r| r.as_str() == wanted).count();
        assert_eq!(count("POST /upload/v1beta/files"), 1);
        assert_eq!(count("POST /upload-session"), 1);
        assert_eq!(count("GET /v1beta/files/x"), 2);
        assert_eq!(count("DELETE /v1beta/files/x"), 1);
    }

    #[test]
    fn test_parse_upload_response() {
        let json = r#"{
            "file": {
                "name": "files/abc-123",
                "displayName": "spec.pdf",
                "mimeType": "application/pdf",
                "sizeBytes": "2048",
                "uri": "https://generativelanguage.googleapis.com/v1beta/files/abc-123",
                "state": "ACTIVE"
            }
        }"#;

        let response: UploadResponse = serde_json::from_str(json).unwrap();
        assert!(response.file.is_ready().unwrap());

        let document = Document::new("spec.pdf", b"%PDF".to_vec());
        let handle = response.file.into_handle(&document);
        assert_eq!(handle.name, "files/abc-123");
        assert_eq!(handle.display_name, "spec.pdf");
        assert_eq!(handle.mime_type, "application/pdf");
    }

    #[test]
    fn test_processing_and_failed_states() {
        let processing: GeminiFile = serde_json::from_str(
            r#"{"name": "files/p", "uri": "u", "state": "PROCESSING"}"#,
        )
        .unwrap();
        assert!(!processing.is_ready().unwrap());

        let failed: GeminiFile = serde_json::from_str(
            r#"{"name": "files/f", "uri": "u", "state": "FAILED", "error": {"code": 3, "message": "unsupported"}}"#,
        )
        .unwrap();
        let err = failed.is_ready().unwrap_err();
        assert!(err.to_string().contains("unsupported"));
    }

    #[test]
    fn test_missing_state_counts_as_ready_and_mime_falls_back() {
        let file: GeminiFile =
            serde_json::from_str(r#"{"name": "files/x", "uri": "u"}"#).unwrap();
        assert!(file.is_ready().unwrap());

        let document = Document::new("terms.docx", b"PK".to_vec());
        let handle = file.into_handle(&document);
        assert_eq!(handle.mime_type, document.mime_type);
    }
}
