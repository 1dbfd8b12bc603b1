//! Panbox 主入口

use clap::{Parser, Subcommand};
use tracing::{error, info};

use panbox::infra::logging::{self, LogLevel, LoggingConfig};
use panbox::service::{PanboxService, ServiceConfig};

// 命令行参数解析结构体
#[derive(Parser, Debug)]
#[command(name = "panbox")]
#[command(version = "0.1.0")]
#[command(about = "个人文件管理器后端服务", long_about = None)]
struct Args {
    /// 配置文件路径
    #[arg(short, long, default_value = "panbox.toml")]
    config: String,

    /// 是否启用 verbose 模式（显示 DEBUG 日志）
    #[arg(short, long)]
    verbose: bool,

    /// 监听端口（覆盖配置文件）
    #[arg(short, long)]
    port: Option<u16>,

    /// 子命令
    #[command(subcommand)]
    command: Option<Commands>,
}

// 子命令枚举
#[derive(Subcommand, Debug)]
enum Commands {
    /// 启动 Panbox 服务
    Start,
    /// 检查配置文件是否有效
    Check,
    /// 显示版本信息
    Version,
}

// 主函数
#[tokio::main]
async fn main() {
    // 加载 .env 文件
    dotenv::dotenv().ok();

    let args = Args::parse();

    // 初始化日志系统
    let level = if args.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    logging::init(&LoggingConfig {
        level,
        ..Default::default()
    });

    info!(version = "0.1.0", "Panbox 启动");

    // 根据子命令执行不同操作
    match args.command {
        Some(Commands::Start) | None => {
            run_service(&args.config, args.port, args.verbose).await;
        }
        Some(Commands::Check) => {
            check_config(&args.config).await;
        }
        Some(Commands::Version) => {
            println!("Panbox v0.1.0");
        }
    }
}

// 启动 Panbox 服务
async fn run_service(config_path: &str, port: Option<u16>, verbose: bool) {
    info!(path = config_path, "开始启动文件管理服务");

    let service_config = ServiceConfig {
        config_path: config_path.to_string(),
        verbose,
        port_override: port,
    };

    let mut service = PanboxService::new(service_config);

    if let Err(e) = service.initialize(config_path).await {
        error!(error = %e, "服务初始化失败");
        return;
    }

    if let Err(e) = service.start().await {
        error!(error = %e, "服务运行出错");
    }

    info!("服务退出");
}

// 检查配置文件是否有效
async fn check_config(config_path: &str) {
    println!("验证配置文件: {}", config_path);

    let loader = panbox::infra::config::ConfigLoader::new();

    match loader.load(config_path).await {
        Ok(config) => {
            println!("配置验证成功!");
            println!("- 监听端口: {}", config.server.port);
            println!("- 沙箱根目录: {}", config.sandbox.root_path.display());
        }
        Err(e) => {
            println!("配置验证失败: {}", e);
        }
    }
}
