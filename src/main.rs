use anyhow::Result;
use clap::Parser;
use onnx_detect::{config::Config, web::serve};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "onnx-detect")]
#[command(about = "Object detection web service: upload images, get them back annotated")]
struct Args {
    /// Server bind address
    #[arg(long, default_value = "127.0.0.1:5000")]
    bind: String,

    /// Number of worker threads
    #[arg(long)]
    workers: Option<usize>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// ONNX detection model path
    #[arg(long, default_value = "last.onnx")]
    model: PathBuf,

    /// Class labels file, one name per line (defaults to COCO classes)
    #[arg(long)]
    labels: Option<PathBuf>,

    /// Directory for uploaded images
    #[arg(long, default_value = "uploads")]
    upload_dir: PathBuf,

    /// Directory for annotated images
    #[arg(long, default_value = "static/outputs")]
    output_dir: PathBuf,

    /// Minimum detection confidence
    #[arg(long, default_value_t = 0.25)]
    conf: f32,

    /// IoU threshold for non-maximum suppression
    #[arg(long, default_value_t = 0.7)]
    iou: f32,

    /// Enable development mode
    #[arg(long)]
    dev: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志系统
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_target(false)
        .init();

    tracing::info!("Starting ONNX detect service...");
    tracing::info!("Bind address: {}", args.bind);
    tracing::info!("Model: {}", args.model.display());

    // 创建配置
    let config = Config::new(
        args.bind,
        args.model,
        args.upload_dir,
        args.output_dir,
        args.workers,
        args.dev,
    )?
    .with_labels(args.labels)
    .with_thresholds(args.conf, args.iou)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers)
        .enable_all()
        .build()?;

    // 启动服务器
    runtime.block_on(serve(config))?;

    Ok(())
}
