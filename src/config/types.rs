//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::collections::HashMap;

use crate::domain::{SegmentConfig, DEFAULT_MAX_BUFFER_CHARS, DEFAULT_MIN_BOUNDARY_INDEX};

/// 默认的系统提示词（口语化主播风格，禁止 markdown）
pub const DEFAULT_SYSTEM_PROMPT: &str = "你是真人主播，说话自然口语化，像朋友聊天。禁止用星号、markdown、序号。多用语气词呢、呀、啦。简短2-3句话。";

/// 未配置 api_key 时使用的默认值（本地 Ollama 不校验）
pub const DEFAULT_API_KEY: &str = "ollama";

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// LLM 配置
    #[serde(default)]
    pub llm: LlmConfig,

    /// 语音下游配置
    #[serde(default)]
    pub speech: SpeechConfig,

    /// 分割器配置
    #[serde(default)]
    pub segmenter: SegmenterConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8090
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// LLM 配置
///
/// `provider` 选择下方同级的某个提供方配置，例如：
///
/// ```toml
/// [llm]
/// provider = "ollama"
///
/// [llm.ollama]
/// base_url = "http://localhost:11434/v1"
/// model = "qwen2.5:7b"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// 当前使用的提供方
    #[serde(default = "default_provider")]
    pub provider: String,

    /// 系统提示词
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// 请求超时时间（秒），覆盖整个流式响应
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// 各提供方配置（键为提供方名称）
    #[serde(flatten)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "ollama".to_string()
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_llm_timeout() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        let mut providers = HashMap::new();
        providers.insert(default_provider(), ProviderConfig::default());
        Self {
            provider: default_provider(),
            system_prompt: default_system_prompt(),
            timeout_secs: default_llm_timeout(),
            providers,
        }
    }
}

impl LlmConfig {
    /// 当前提供方的配置
    pub fn active_provider(&self) -> Option<&ProviderConfig> {
        self.providers.get(&self.provider)
    }
}

/// 单个 LLM 提供方配置（OpenAI 兼容接口）
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// 接口基础 URL（不含 /chat/completions）
    pub base_url: String,

    /// 访问密钥，未配置时使用 [`DEFAULT_API_KEY`]
    #[serde(default)]
    pub api_key: Option<String>,

    /// 模型名称
    pub model: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
            api_key: None,
            model: "qwen2.5:7b".to_string(),
        }
    }
}

impl ProviderConfig {
    pub fn api_key_or_default(&self) -> &str {
        self.api_key.as_deref().unwrap_or(DEFAULT_API_KEY)
    }
}

/// 语音下游配置
#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    /// 语音服务基础 URL
    #[serde(default = "default_speech_url")]
    pub url: String,

    /// 提交文本的路径
    #[serde(default = "default_submit_path")]
    pub submit_path: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_speech_timeout")]
    pub timeout_secs: u64,
}

fn default_speech_url() -> String {
    "http://localhost:8010".to_string()
}

fn default_submit_path() -> String {
    "/api/speech/submit".to_string()
}

fn default_speech_timeout() -> u64 {
    30
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            url: default_speech_url(),
            submit_path: default_submit_path(),
            timeout_secs: default_speech_timeout(),
        }
    }
}

/// 分割器配置
#[derive(Debug, Clone, Deserialize)]
pub struct SegmenterConfig {
    /// 断句标点的最小字符位置
    #[serde(default = "default_min_boundary_index")]
    pub min_boundary_index: usize,

    /// 缓冲区最大字符数
    #[serde(default = "default_max_buffer_chars")]
    pub max_buffer_chars: usize,
}

fn default_min_boundary_index() -> usize {
    DEFAULT_MIN_BOUNDARY_INDEX
}

fn default_max_buffer_chars() -> usize {
    DEFAULT_MAX_BUFFER_CHARS
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            min_boundary_index: default_min_boundary_index(),
            max_buffer_chars: default_max_buffer_chars(),
        }
    }
}

impl From<&SegmenterConfig> for SegmentConfig {
    fn from(config: &SegmenterConfig) -> Self {
        Self {
            min_boundary_index: config.min_boundary_index,
            max_buffer_chars: config.max_buffer_chars,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
