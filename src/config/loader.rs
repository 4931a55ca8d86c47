//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml，支持 `${VAR}` 占位符）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File, FileFormat};
use std::path::Path;
use thiserror::Error;

use super::placeholder::resolve_placeholders;
use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config.toml", "config.local.toml"];

/// 环境变量前缀
const ENV_PREFIX: &str = "SPEAKSTREAM";

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `SPEAKSTREAM_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `SPEAKSTREAM_SERVER__PORT=8080`
/// - `SPEAKSTREAM_LLM__PROVIDER=openai`
/// - `SPEAKSTREAM_SPEECH__URL=http://tts-server:8010`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8090)?
        .set_default("llm.provider", "ollama")?
        .set_default("llm.timeout_secs", 120)?
        .set_default("llm.ollama.base_url", "http://localhost:11434/v1")?
        .set_default("llm.ollama.model", "qwen2.5:7b")?
        .set_default("speech.url", "http://localhost:8010")?
        .set_default("speech.submit_path", "/api/speech/submit")?
        .set_default("speech.timeout_secs", 30)?
        .set_default("segmenter.min_boundary_index", 5)?
        .set_default("segmenter.max_buffer_chars", 30)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件：先解析占位符，再交给 builder
    match config_path {
        Some(path) => {
            builder = builder.add_source(resolved_file_source(path)?);
        }
        None => {
            for name in CONFIG_FILE_NAMES {
                let path = Path::new(name);
                if path.exists() {
                    builder = builder.add_source(resolved_file_source(path)?);
                }
            }
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: SPEAKSTREAM_LLM__PROVIDER=openai
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 读取 TOML 配置文件并解析 `${VAR}` 占位符
fn resolved_file_source(path: &Path) -> Result<File<config::FileSourceString, FileFormat>, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::LoadError(format!("Cannot read {}: {}", path.display(), e))
    })?;

    let table: toml::Table = raw.parse().map_err(|e| {
        ConfigError::ParseError(format!("Invalid TOML in {}: {}", path.display(), e))
    })?;

    let resolved = resolve_placeholders(toml::Value::Table(table));
    let content = toml::to_string(&resolved)
        .map_err(|e| ConfigError::ParseError(format!("Failed to re-encode config: {}", e)))?;

    Ok(File::from_str(&content, FileFormat::Toml))
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    let provider = config.llm.active_provider().ok_or_else(|| {
        ConfigError::ValidationError(format!(
            "LLM provider '{}' is not configured",
            config.llm.provider
        ))
    })?;

    if provider.base_url.is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "LLM base_url for '{}' cannot be empty",
            config.llm.provider
        )));
    }

    if provider.model.is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "LLM model for '{}' cannot be empty",
            config.llm.provider
        )));
    }

    if config.speech.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "Speech URL cannot be empty".to_string(),
        ));
    }

    if config.segmenter.max_buffer_chars == 0 {
        return Err(ConfigError::ValidationError(
            "Segmenter max_buffer_chars cannot be 0".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("LLM Provider: {}", config.llm.provider);
    if let Some(provider) = config.llm.active_provider() {
        tracing::info!("LLM Base URL: {}", provider.base_url);
        tracing::info!("LLM Model: {}", provider.model);
        // 不打印密钥本身
        tracing::info!("LLM API Key Set: {}", provider.api_key.is_some());
    }
    tracing::info!("LLM Timeout: {}s", config.llm.timeout_secs);
    tracing::info!("Speech URL: {}{}", config.speech.url, config.speech.submit_path);
    tracing::info!(
        "Segmenter: min_boundary_index={}, max_buffer_chars={}",
        config.segmenter.min_boundary_index,
        config.segmenter.max_buffer_chars
    );
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_unknown_provider() {
        let mut config = AppConfig::default();
        config.llm.provider = "missing".to_string();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validation_error_for_empty_model() {
        let mut config = AppConfig::default();
        if let Some(provider) = config.llm.providers.get_mut("ollama") {
            provider.model = String::new();
        }
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_speech_url() {
        let mut config = AppConfig::default();
        config.speech.url = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_file_with_placeholders() {
        std::env::set_var("LOADER_TEST_LLM_KEY", "sk-from-env");
        let file = write_config(
            r#"
            [llm]
            provider = "openai"

            [llm.openai]
            base_url = "https://api.openai.com/v1"
            api_key = "${LOADER_TEST_LLM_KEY}"
            model = "gpt-4o-mini"

            [segmenter]
            max_buffer_chars = 40
            "#,
        );

        let config = load_config_from_path(Some(file.path())).unwrap();
        let provider = config.llm.active_provider().unwrap();
        assert_eq!(provider.api_key.as_deref(), Some("sk-from-env"));
        assert_eq!(provider.model, "gpt-4o-mini");
        assert_eq!(config.segmenter.max_buffer_chars, 40);
        assert_eq!(config.segmenter.min_boundary_index, 5);
    }

    #[test]
    fn test_unset_placeholder_resolves_to_empty() {
        let file = write_config(
            r#"
            [llm.ollama]
            base_url = "http://localhost:11434/v1"
            api_key = "${LOADER_TEST_UNSET_VAR}"
            model = "qwen2.5:7b"
            "#,
        );

        let config = load_config_from_path(Some(file.path())).unwrap();
        let provider = config.llm.active_provider().unwrap();
        assert_eq!(provider.api_key.as_deref(), Some(""));
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let result = load_config_from_path(Some(Path::new("/nonexistent/speakstream.toml")));
        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }
}
