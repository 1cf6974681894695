use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{AppError, AppResult, ConfigError, FileError};
use crate::workflow::PromptTemplates;

/// 汇总使用的生成服务
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsolidationBackend {
    /// 与文档分析使用同一个 Gemini 服务
    Gemini,
    /// OpenAI 兼容的聊天接口（纯文本）
    OpenAi,
}

impl FromStr for ConsolidationBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(ConsolidationBackend::Gemini),
            "openai" => Ok(ConsolidationBackend::OpenAi),
            other => Err(format!("未知的汇总后端: {}", other)),
        }
    }
}

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- Gemini 配置 ---
    pub gemini_api_key: String,
    pub gemini_api_base_url: String,
    pub model_name: String,
    pub temperature: f32,
    /// 单次 HTTP 请求超时（秒）
    pub request_timeout_secs: u64,
    /// 等待远程文件处理完成的轮询间隔（毫秒）
    pub file_poll_interval_ms: u64,
    pub file_poll_max_attempts: u32,
    // --- 流程配置 ---
    /// 每个批次只允许一个文档
    pub single_document_batches: bool,
    /// 批次清单（TOML）存放目录
    pub batch_folder: String,
    /// 汇总报告输出文件
    pub report_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- 汇总后端 ---
    pub consolidation_backend: ConsolidationBackend,
    pub llm_api_key: Option<String>,
    pub llm_api_base_url: Option<String>,
    pub llm_model_name: String,
    pub prompts: PromptTemplates,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: String::new(),
            gemini_api_base_url: "https://generativelanguage.googleapis.com".to_string(),
            model_name: "gemini-1.5-pro".to_string(),
            temperature: 0.2,
            request_timeout_secs: 300,
            file_poll_interval_ms: 1000,
            file_poll_max_attempts: 30,
            single_document_batches: false,
            batch_folder: "batches".to_string(),
            report_file: "report.md".to_string(),
            verbose_logging: false,
            consolidation_backend: ConsolidationBackend::Gemini,
            llm_api_key: None,
            llm_api_base_url: None,
            llm_model_name: "gpt-4o".to_string(),
            prompts: PromptTemplates::default(),
        }
    }
}

/// TOML 配置文件，所有键都是可选的
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    gemini_api_key: Option<String>,
    gemini_api_base_url: Option<String>,
    model_name: Option<String>,
    temperature: Option<f32>,
    request_timeout_secs: Option<u64>,
    file_poll_interval_ms: Option<u64>,
    file_poll_max_attempts: Option<u32>,
    single_document_batches: Option<bool>,
    batch_folder: Option<String>,
    report_file: Option<String>,
    verbose_logging: Option<bool>,
    consolidation_backend: Option<ConsolidationBackend>,
    llm_api_key: Option<String>,
    llm_api_base_url: Option<String>,
    llm_model_name: Option<String>,
    prompts: Option<PromptTemplates>,
}

impl Config {
    /// 从环境变量加载（如果设置了 `TENDER_CONFIG`，先读取该 TOML 文件）
    pub fn from_env() -> AppResult<Self> {
        let path = std::env::var("TENDER_CONFIG").ok().map(PathBuf::from);
        Self::load(path.as_deref())
    }

    /// 默认值 → TOML 文件 → 环境变量，最后校验
    ///
    /// 缺少 API Key 属于启动错误，直接返回 `ConfigError::EnvVarNotFound`。
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let file = match path {
            Some(path) => read_config_file(path)?,
            None => ConfigFile::default(),
        };
        Self::resolve(file, |name| std::env::var(name).ok())
    }

    fn resolve(file: ConfigFile, env: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let default = Self::default();

        let mut config = Self {
            gemini_api_key: file.gemini_api_key.unwrap_or(default.gemini_api_key),
            gemini_api_base_url: file.gemini_api_base_url.unwrap_or(default.gemini_api_base_url),
            model_name: file.model_name.unwrap_or(default.model_name),
            temperature: file.temperature.unwrap_or(default.temperature),
            request_timeout_secs: file.request_timeout_secs.unwrap_or(default.request_timeout_secs),
            file_poll_interval_ms: file.file_poll_interval_ms.unwrap_or(default.file_poll_interval_ms),
            file_poll_max_attempts: file
                .file_poll_max_attempts
                .unwrap_or(default.file_poll_max_attempts),
            single_document_batches: file
                .single_document_batches
                .unwrap_or(default.single_document_batches),
            batch_folder: file.batch_folder.unwrap_or(default.batch_folder),
            report_file: file.report_file.unwrap_or(default.report_file),
            verbose_logging: file.verbose_logging.unwrap_or(default.verbose_logging),
            consolidation_backend: file
                .consolidation_backend
                .unwrap_or(default.consolidation_backend),
            llm_api_key: file.llm_api_key.or(default.llm_api_key),
            llm_api_base_url: file.llm_api_base_url.or(default.llm_api_base_url),
            llm_model_name: file.llm_model_name.unwrap_or(default.llm_model_name),
            prompts: file.prompts.unwrap_or(default.prompts),
        };

        // --- 环境变量覆盖 ---
        if let Some(v) = env("GEMINI_API_KEY") {
            config.gemini_api_key = v;
        }
        if let Some(v) = env("GEMINI_API_BASE_URL") {
            config.gemini_api_base_url = v;
        }
        if let Some(v) = env("GEMINI_MODEL_NAME") {
            config.model_name = v;
        }
        if let Some(v) = parse_env(&env, "LLM_TEMPERATURE", "f32")? {
            config.temperature = v;
        }
        if let Some(v) = parse_env(&env, "REQUEST_TIMEOUT_SECS", "u64")? {
            config.request_timeout_secs = v;
        }
        if let Some(v) = parse_env(&env, "FILE_POLL_INTERVAL_MS", "u64")? {
            config.file_poll_interval_ms = v;
        }
        if let Some(v) = parse_env(&env, "FILE_POLL_MAX_ATTEMPTS", "u32")? {
            config.file_poll_max_attempts = v;
        }
        if let Some(v) = parse_env(&env, "SINGLE_DOCUMENT_BATCHES", "bool")? {
            config.single_document_batches = v;
        }
        if let Some(v) = env("BATCH_FOLDER") {
            config.batch_folder = v;
        }
        if let Some(v) = env("REPORT_FILE") {
            config.report_file = v;
        }
        if let Some(v) = parse_env(&env, "VERBOSE_LOGGING", "bool")? {
            config.verbose_logging = v;
        }
        if let Some(v) = parse_env(&env, "CONSOLIDATION_BACKEND", "gemini|openai")? {
            config.consolidation_backend = v;
        }
        if let Some(v) = env("LLM_API_KEY") {
            config.llm_api_key = Some(v);
        }
        if let Some(v) = env("LLM_API_BASE_URL") {
            config.llm_api_base_url = Some(v);
        }
        if let Some(v) = env("LLM_MODEL_NAME") {
            config.llm_model_name = v;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.gemini_api_key.trim().is_empty() {
            return Err(ConfigError::EnvVarNotFound {
                var_name: "GEMINI_API_KEY".to_string(),
            });
        }

        if self.consolidation_backend == ConsolidationBackend::OpenAi {
            if self.llm_api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
                return Err(ConfigError::EnvVarNotFound {
                    var_name: "LLM_API_KEY".to_string(),
                });
            }
            if self.llm_api_base_url.is_none() {
                return Err(ConfigError::EnvVarNotFound {
                    var_name: "LLM_API_BASE_URL".to_string(),
                });
            }
        }

        if self.file_poll_max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "file_poll_max_attempts".to_string(),
                reason: "至少为 1".to_string(),
            });
        }

        Ok(())
    }
}

fn read_config_file(path: &Path) -> AppResult<ConfigFile> {
    if !path.exists() {
        return Err(FileError::NotFound {
            path: path.display().to_string(),
        }
        .into());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;

    toml::from_str(&content).map_err(|e| AppError::toml_parse_failed(path.display().to_string(), e))
}

fn parse_env<T: FromStr>(
    env: &impl Fn(&str) -> Option<String>,
    var_name: &str,
    expected_type: &str,
) -> Result<Option<T>, ConfigError> {
    match env(var_name) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
        None => Ok(None),
    }
}
