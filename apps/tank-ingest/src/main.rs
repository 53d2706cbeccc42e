//! Dingtek DF555 传感器 TCP 接入服务。

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tank_config::AppConfig;
use tank_protocol::{IngestConfig, IngestionServer};
use tank_sink::HttpSink;
use tank_telemetry::{init_tracing, metrics};
use tracing::{info, warn};

/// Start TCP server to receive Dingtek DF555 sensor data
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// 监听端口，覆盖 TANK_TCP_PORT
    #[arg(short, long)]
    port: Option<u16>,

    /// 单连接读取截止时间（毫秒），覆盖 TANK_READ_TIMEOUT_MS
    #[arg(long)]
    read_timeout_ms: Option<u64>,

    /// JSON 格式的接入配置文件，替代 TANK_TCP_* 等监听相关变量
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    let args = Args::parse();
    // 从环境变量加载运行配置，命令行参数优先
    let config = AppConfig::from_env()?;
    let ingest = resolve_ingest_config(&args, &config)?;
    // 初始化结构化日志
    init_tracing();

    // 下游：应用地址 + 固定路径
    let sink = HttpSink::new(config.sink_url(), config.sink_timeout())?;
    info!(sink_url = %sink.url(), "forwarding decoded telemetry");

    let server = IngestionServer::new(ingest, Arc::new(sink));
    let listener = server.bind().await?;
    info!("waiting for Dingtek sensor connections");

    server
        .serve_with_shutdown(listener, shutdown_signal())
        .await?;

    let snapshot = metrics().snapshot();
    info!(?snapshot, "ingest stopped");
    Ok(())
}

fn resolve_ingest_config(
    args: &Args,
    config: &AppConfig,
) -> Result<IngestConfig, Box<dyn std::error::Error>> {
    let mut ingest = match &args.config {
        Some(path) => IngestConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => ingest_config(config),
    };
    if let Some(port) = args.port {
        ingest.listen_port = port;
    }
    if let Some(read_timeout_ms) = args.read_timeout_ms {
        ingest.read_timeout_ms = read_timeout_ms;
    }
    Ok(ingest)
}

fn ingest_config(config: &AppConfig) -> IngestConfig {
    IngestConfig {
        listen_host: config.tcp_host.clone(),
        listen_port: config.tcp_port,
        read_timeout_ms: config.read_timeout_ms,
        max_frame_bytes: config.max_frame_bytes,
        max_connections: config.max_connections,
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        // 无法监听信号时保持运行
        warn!(error = %err, "failed to install ctrl-c handler");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
