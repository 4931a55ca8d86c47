//! SpeakStream - LLM 流式输出分段转语音
//!
//! - serve: 启动 HTTP 服务
//! - say: 单次回复，段落提交给语音服务或直接打印

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use speakstream::application::{
    CancelStreamCommand, CancelStreamHandler, LlmStreamPort, RespondCommand, RespondHandler,
    RespondSettings, SpeechSinkPort, StreamRegistryPort,
};
use speakstream::config::{load_config_from_path, print_config, AppConfig, LogConfig};
use speakstream::infrastructure::adapters::{
    spawn_health_check, ChannelSpeechSink, HttpSpeechSink, HttpSpeechSinkConfig,
    OpenAiChatClient, OpenAiChatClientConfig,
};
use speakstream::infrastructure::http::{AppState, HttpServer};
use speakstream::infrastructure::memory::InMemoryStreamRegistry;

/// SpeakStream CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// 配置文件路径（默认搜索 config.toml / config.local.toml）
    #[arg(short, long, global = true, env = "SPEAKSTREAM_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 启动 HTTP 服务
    Serve,

    /// 发送一条消息，回复分段后输出
    Say {
        /// 用户消息
        message: String,

        /// 段落打印到标准输出，不提交给语音服务
        #[arg(long)]
        print: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config_from_path(cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config.log);
    print_config(&config);

    let llm = build_llm(&config)?;

    match cli.command {
        Commands::Serve => serve(config, llm).await,
        Commands::Say { message, print } => say(config, llm, message, print).await,
    }
}

/// 初始化日志
fn init_tracing(log: &LogConfig) {
    let log_filter = format!(
        "{},speakstream={},tower_http=debug",
        log.level, log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn build_llm(config: &AppConfig) -> anyhow::Result<Arc<dyn LlmStreamPort>> {
    let client_config = OpenAiChatClientConfig::from_llm_config(&config.llm).ok_or_else(|| {
        anyhow::anyhow!("LLM provider '{}' is not configured", config.llm.provider)
    })?;
    Ok(Arc::new(OpenAiChatClient::new(client_config)?))
}

fn respond_settings(config: &AppConfig) -> RespondSettings {
    RespondSettings {
        system_prompt: config.llm.system_prompt.clone(),
        segment_config: (&config.segmenter).into(),
    }
}

async fn serve(config: AppConfig, llm: Arc<dyn LlmStreamPort>) -> anyhow::Result<()> {
    // 后台检查上游，不阻塞启动
    spawn_health_check(llm.clone());

    let speech_sink = Arc::new(HttpSpeechSink::new(HttpSpeechSinkConfig::from(
        &config.speech,
    ))?);
    let stream_registry = InMemoryStreamRegistry::new().arc();

    let state = AppState::new(
        llm,
        speech_sink,
        stream_registry,
        respond_settings(&config),
    );
    let server = HttpServer::new(config.server.clone(), state);

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

async fn say(
    config: AppConfig,
    llm: Arc<dyn LlmStreamPort>,
    message: String,
    print: bool,
) -> anyhow::Result<()> {
    let stream_registry: Arc<dyn StreamRegistryPort> = InMemoryStreamRegistry::new().arc();

    let mut printer = None;
    let speech_sink: Arc<dyn SpeechSinkPort> = if print {
        let (sink, mut rx) = ChannelSpeechSink::channel(64);
        printer = Some(tokio::spawn(async move {
            while let Some(segment) = rx.recv().await {
                println!("{}", segment);
            }
        }));
        Arc::new(sink)
    } else {
        Arc::new(HttpSpeechSink::new(HttpSpeechSinkConfig::from(
            &config.speech,
        ))?)
    };

    let handler = RespondHandler::new(
        llm,
        speech_sink,
        stream_registry.clone(),
        respond_settings(&config),
    );

    // Ctrl-C 取消当前流，已缓冲的内容照常输出
    let stream_id = uuid::Uuid::new_v4().to_string();
    let canceller = {
        let cancel = CancelStreamHandler::new(stream_registry);
        let stream_id = stream_id.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = cancel.handle(CancelStreamCommand { stream_id });
            }
        })
    };

    let result = handler
        .handle(RespondCommand {
            message,
            stream_id: Some(stream_id),
        })
        .await;
    canceller.abort();

    // 关闭队列，等待打印完成
    drop(handler);
    if let Some(printer) = printer {
        printer.await?;
    }

    let response = result?;
    tracing::info!(
        stream_id = %response.stream_id,
        segments = response.segment_count,
        total_ms = response.total_ms,
        cancelled = response.cancelled,
        "Done"
    );

    Ok(())
}
