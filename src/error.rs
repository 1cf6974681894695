use std::fmt;

use crate::models::RemoteFileHandle;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 配置错误
    Config(ConfigError),
    /// 文件操作错误
    File(FileError),
    /// 批次分析错误
    Analysis(AnalysisError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(e) => write!(f, "配置错误: {}", e),
            AppError::File(e) => write!(f, "文件错误: {}", e),
            AppError::Analysis(e) => write!(f, "分析错误: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(e) => Some(e),
            AppError::File(e) => Some(e),
            AppError::Analysis(e) => Some(e),
        }
    }
}

/// 批次分析流程中的错误
///
/// 单个文档（上传）或单个句柄（删除）的失败只作为警告收集，
/// 生成 / 汇总调用本身的失败才作为整个操作的结果返回。
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// 批次中没有文档
    #[error("批次中没有任何文档")]
    NoDocuments,

    /// 分析指令为空
    #[error("分析指令不能为空")]
    EmptyInstruction,

    /// 启用单文档模式时传入了多个文档
    #[error("当前配置只允许每批 1 个文档，实际传入 {count} 个")]
    TooManyDocuments { count: usize },

    /// 单个文档上传失败（可恢复）
    #[error("文档 {filename} 上传失败: {cause:#}")]
    UploadFailed {
        filename: String,
        #[source]
        cause: anyhow::Error,
    },

    /// 所有文档都上传失败，不会调用生成服务
    #[error("没有任何文档上传成功 (尝试 {} 个)", .failures.len())]
    NoFilesUploaded { failures: Vec<AnalysisError> },

    /// 生成服务调用失败（上传的文件仍会被清理）
    #[error("文档分析失败: {cause:#}")]
    GenerationFailed {
        #[source]
        cause: anyhow::Error,
    },

    /// 远程文件删除失败（只记录警告）
    #[error("远程文件 {} ({}) 删除失败: {cause:#}", .handle.name, .handle.display_name)]
    DeletionFailed {
        handle: RemoteFileHandle,
        #[source]
        cause: anyhow::Error,
    },

    /// 汇总调用失败，历史结果保持不变
    #[error("结果汇总失败: {cause:#}")]
    ConsolidationFailed {
        #[source]
        cause: anyhow::Error,
    },
}

/// 文件操作错误
#[derive(Debug)]
pub enum FileError {
    /// 文件不存在
    NotFound {
        path: String,
    },
    /// 读取文件失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// TOML 解析失败
    TomlParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 目录不存在
    DirectoryNotFound {
        path: String,
    },
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileError::NotFound { path } => write!(f, "文件不存在: {}", path),
            FileError::ReadFailed { path, source } => {
                write!(f, "读取文件失败 ({}): {}", path, source)
            }
            FileError::TomlParseFailed { path, source } => {
                write!(f, "TOML解析失败 ({}): {}", path, source)
            }
            FileError::DirectoryNotFound { path } => write!(f, "目录不存在: {}", path),
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileError::ReadFailed { source, .. }
            | FileError::TomlParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 环境变量解析失败
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 环境变量不存在
    EnvVarNotFound {
        var_name: String,
    },
    /// 配置项取值不合法
    InvalidValue {
        key: String,
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EnvVarParseFailed {
                var_name,
                value,
                expected_type,
            } => {
                write!(
                    f,
                    "环境变量 {} 解析失败: 值 '{}' 无法转换为 {}",
                    var_name, value, expected_type
                )
            }
            ConfigError::EnvVarNotFound { var_name } => {
                write!(f, "环境变量 {} 不存在", var_name)
            }
            ConfigError::InvalidValue { key, reason } => {
                write!(f, "配置项 {} 不合法: {}", key, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ========== 从常见错误类型转换 ==========

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<FileError> for AppError {
    fn from(err: FileError) -> Self {
        AppError::File(err)
    }
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        AppError::Analysis(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建 TOML 解析错误（带路径）
    pub fn toml_parse_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::TomlParseFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_failure_names_the_file() {
        let upload = AnalysisError::UploadFailed {
            filename: "spec.pdf".to_string(),
            cause: anyhow::anyhow!("boom"),
        };
        let message = upload.to_string();
        assert!(message.contains("spec.pdf"));
        assert!(message.contains("boom"));
    }

    #[test]
    fn test_cause_is_preserved_in_message_and_source() {
        let err = AnalysisError::ConsolidationFailed {
            cause: anyhow::anyhow!("quota exceeded"),
        };
        assert!(err.to_string().contains("quota exceeded"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_no_files_uploaded_counts_attempts() {
        let err = AnalysisError::NoFilesUploaded {
            failures: vec![
                AnalysisError::UploadFailed {
                    filename: "a.pdf".to_string(),
                    cause: anyhow::anyhow!("x"),
                },
                AnalysisError::UploadFailed {
                    filename: "b.pdf".to_string(),
                    cause: anyhow::anyhow!("y"),
                },
            ],
        };
        assert!(err.to_string().contains('2'));
    }
}
