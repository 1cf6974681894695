use crate::error::{AppError, AppResult, FileError};
use crate::models::Document;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 一个批次的描述文件（TOML）
///
/// ```toml
/// label = "Ausschreibung Stadtwerke"
/// documents = ["unterlagen/leistungsbeschreibung.pdf", "unterlagen/vertrag.docx"]
/// instruction_file = "prompt.md"
/// ```
///
/// `documents` / `instruction_file` 的相对路径以清单文件所在目录为基准。
#[derive(Debug, Clone, Deserialize)]
pub struct BatchManifest {
    #[serde(default)]
    pub label: Option<String>,
    pub documents: Vec<String>,
    #[serde(default)]
    pub instruction: Option<String>,
    #[serde(default)]
    pub instruction_file: Option<String>,
    #[serde(skip)]
    pub file_path: Option<PathBuf>,
}

impl BatchManifest {
    /// 清单所在目录
    fn base_dir(&self) -> PathBuf {
        self.file_path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    /// 把清单中的路径解析为实际路径
    pub fn resolve(&self, relative: &str) -> PathBuf {
        let path = Path::new(relative);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir().join(path)
        }
    }

    /// 读取清单中列出的全部文档，读不到的文档跳过
    pub async fn load_documents(&self) -> Vec<Document> {
        let paths: Vec<PathBuf> = self.documents.iter().map(|r| self.resolve(r)).collect();
        read_documents(&paths).await
    }

    /// 读取分析指令：`instruction` 优先，其次 `instruction_file`，都没有则返回 None
    pub async fn load_instruction(&self) -> AppResult<Option<String>> {
        if let Some(text) = self.instruction.as_ref().filter(|t| !t.trim().is_empty()) {
            return Ok(Some(text.clone()));
        }

        match &self.instruction_file {
            Some(relative) => {
                let path = self.resolve(relative);
                let text = fs::read_to_string(&path)
                    .await
                    .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
                Ok(Some(text))
            }
            None => Ok(None),
        }
    }
}

/// 从磁盘读取单个文档
pub async fn read_document(path: &Path) -> AppResult<Document> {
    if !path.exists() {
        return Err(FileError::NotFound {
            path: path.display().to_string(),
        }
        .into());
    }

    let bytes = fs::read(path)
        .await
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;

    let filename = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    Ok(Document::new(filename, bytes))
}

/// 按顺序读取多个文档
///
/// 单个文件读取失败只记录警告，其余文档照常返回（与上传失败的处理方式一致）
pub async fn read_documents(paths: &[PathBuf]) -> Vec<Document> {
    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        match read_document(path).await {
            Ok(document) => documents.push(document),
            Err(e) => tracing::warn!("⚠️ 跳过无法读取的文档: {}", e),
        }
    }
    documents
}

/// 从 TOML 文件加载批次清单
pub async fn load_manifest(toml_file_path: &Path) -> AppResult<BatchManifest> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .map_err(|e| AppError::file_read_failed(toml_file_path.display().to_string(), e))?;

    let mut manifest: BatchManifest = toml::from_str(&content)
        .map_err(|e| AppError::toml_parse_failed(toml_file_path.display().to_string(), e))?;

    // 设置文件路径
    manifest.file_path = Some(toml_file_path.to_path_buf());

    Ok(manifest)
}

/// 从文件夹中加载所有批次清单（按文件名排序）
pub async fn load_all_manifests(folder_path: &str) -> AppResult<Vec<BatchManifest>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        return Err(FileError::DirectoryNotFound {
            path: folder_path.to_string(),
        }
        .into());
    }

    let mut toml_files = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .map_err(|e| AppError::file_read_failed(folder_path, e))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml_files.push(path);
        }
    }
    toml_files.sort();

    let mut manifests = Vec::new();
    for path in toml_files {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_manifest(&path).await {
            Ok(manifest) => {
                tracing::info!("成功加载清单，包含 {} 个文档", manifest.documents.len());
                manifests.push(manifest);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {}", path.display(), e);
            }
        }
    }

    Ok(manifests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as std_fs;

    #[tokio::test]
    async fn test_load_manifest_and_documents() {
        let dir = tempfile::tempdir().unwrap();
        std_fs::create_dir(dir.path().join("unterlagen")).unwrap();
        std_fs::write(dir.path().join("unterlagen/spec.pdf"), b"%PDF-1.4").unwrap();
        std_fs::write(dir.path().join("prompt.md"), "extract project scope").unwrap();
        std_fs::write(
            dir.path().join("a.toml"),
            r#"
label = "Los 1"
documents = ["unterlagen/spec.pdf"]
instruction_file = "prompt.md"
"#,
        )
        .unwrap();

        let manifest = load_manifest(&dir.path().join("a.toml")).await.unwrap();
        assert_eq!(manifest.label.as_deref(), Some("Los 1"));

        let docs = manifest.load_documents().await;
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].filename, "spec.pdf");
        assert_eq!(docs[0].mime_type, "application/pdf");
        assert_eq!(docs[0].bytes, b"%PDF-1.4");

        let instruction = manifest.load_instruction().await.unwrap();
        assert_eq!(instruction.as_deref(), Some("extract project scope"));
    }

    #[tokio::test]
    async fn test_inline_instruction_wins_over_file() {
        let manifest: BatchManifest = toml::from_str(
            r#"
documents = []
instruction = "inline"
instruction_file = "does-not-exist.md"
"#,
        )
        .unwrap();

        let instruction = manifest.load_instruction().await.unwrap();
        assert_eq!(instruction.as_deref(), Some("inline"));
    }

    #[tokio::test]
    async fn test_load_all_manifests_sorted_and_skips_broken() {
        let dir = tempfile::tempdir().unwrap();
        std_fs::write(dir.path().join("b.toml"), "documents = [\"x.pdf\"]").unwrap();
        std_fs::write(dir.path().join("a.toml"), "documents = [\"y.pdf\"]").unwrap();
        std_fs::write(dir.path().join("broken.toml"), "documents = ").unwrap();
        std_fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let manifests = load_all_manifests(dir.path().to_str().unwrap())
            .await
            .unwrap();

        let docs: Vec<&str> = manifests
            .iter()
            .map(|m| m.documents[0].as_str())
            .collect();
        assert_eq!(docs, vec!["y.pdf", "x.pdf"]);
    }

    #[tokio::test]
    async fn test_unreadable_document_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std_fs::write(dir.path().join("terms.docx"), b"PK").unwrap();
        std_fs::write(
            dir.path().join("los.toml"),
            "documents = [\"spec.pdf\", \"terms.docx\"]\n",
        )
        .unwrap();

        let manifest = load_manifest(&dir.path().join("los.toml")).await.unwrap();
        let docs = manifest.load_documents().await;

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].filename, "terms.docx");
    }

    #[tokio::test]
    async fn test_missing_folder_and_missing_document() {
        let result = load_all_manifests("/definitely/not/here").await;
        assert!(matches!(
            result,
            Err(AppError::File(FileError::DirectoryNotFound { .. }))
        ));

        let result = read_document(Path::new("/definitely/not/here.pdf")).await;
        assert!(matches!(
            result,
            Err(AppError::File(FileError::NotFound { .. }))
        ));
    }
}
