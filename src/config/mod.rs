//! Configuration Module
//!
//! 提供应用配置管理功能，支持多层级配置来源：
//! - 环境变量（最高优先级）
//! - 配置文件（TOML 格式，支持 `${VAR}` 占位符）
//! - 默认值（最低优先级）

mod loader;
mod placeholder;
mod types;

pub use loader::{load_config, load_config_from_path, print_config, ConfigError};
pub use placeholder::{resolve_placeholders, resolve_placeholders_with};
pub use types::{
    AppConfig, LlmConfig, LogConfig, ProviderConfig, SegmenterConfig, ServerConfig, SpeechConfig,
    DEFAULT_API_KEY, DEFAULT_SYSTEM_PROMPT,
};
