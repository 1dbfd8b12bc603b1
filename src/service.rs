//! 服务模块
//!
//! 负责文件管理服务的完整生命周期管理。

use std::sync::Arc;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::infra::config::{Config, ConfigLoader};
use crate::recent::RecentTracker;
use crate::sandbox::FsService;
use crate::starred::StarredStore;
use crate::trash::TrashEngine;
use crate::web::{WebServer, WebState};

/// 服务状态
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceStatus {
    Initializing,
    Running,
    Stopping,
    Stopped,
    Error(String),
}

/// 服务配置
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub config_path: String,
    pub verbose: bool,
    /// 命令行指定的端口，覆盖配置文件
    pub port_override: Option<u16>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            config_path: "panbox.toml".to_string(),
            verbose: false,
            port_override: None,
        }
    }
}

/// Panbox 服务
#[derive(Clone)]
pub struct PanboxService {
    config: ServiceConfig,
    status: Arc<tokio::sync::RwLock<ServiceStatus>>,
    shutdown_tx: broadcast::Sender<()>,
    /// 加载的配置
    loaded_config: Arc<Option<Config>>,
}

impl PanboxService {
    pub fn new(config: ServiceConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            status: Arc::new(tokio::sync::RwLock::new(ServiceStatus::Initializing)),
            shutdown_tx,
            loaded_config: Arc::new(None),
        }
    }

    pub async fn initialize(&mut self, config_path: &str) -> Result<(), Box<dyn std::error::Error>> {
        info!(path = config_path, "初始化服务...");

        let config = self.load_config(config_path).await?;
        self.loaded_config = Arc::new(Some(config));

        info!("服务初始化完成");
        Ok(())
    }

    pub async fn start(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        info!("开始启动服务...");

        *self.status.write().await = ServiceStatus::Running;

        let config = self.loaded_config.as_ref().clone().unwrap_or_default();
        let port = self.config.port_override.unwrap_or(config.server.port);

        // 组装沙箱与回收站组件
        let state = match Self::build_state(&config).await {
            Ok(state) => state,
            Err(e) => {
                *self.status.write().await = ServiceStatus::Error(e.to_string());
                return Err(e);
            }
        };

        // 启动 Web 服务
        let server = WebServer::new(port, state);
        tokio::spawn(async move {
            if let Err(e) = server.start().await {
                error!(error = %e, "Web 服务启动失败");
            }
        });

        // 启动关闭信号监听
        let mut rx = self.shutdown_tx.subscribe();
        let shutdown_tx = self.shutdown_tx.clone();
        tokio::spawn(async move {
            let _ = signal::ctrl_c().await;
            warn!("收到 Ctrl+C 信号，准备关闭服务...");
            let _ = shutdown_tx.send(());
        });

        // 等待关闭信号
        let _ = rx.recv().await;

        *self.status.write().await = ServiceStatus::Stopped;
        info!("服务已停止");

        Ok(())
    }

    /// 组装 Web 层依赖的全部组件
    async fn build_state(config: &Config) -> Result<WebState, Box<dyn std::error::Error>> {
        let fs = Arc::new(FsService::new(config.sandbox.clone()).await?);
        let recent = Arc::new(RecentTracker::new());
        let trash = Arc::new(TrashEngine::new(fs.clone(), recent.clone()).await?);
        let starred = Arc::new(StarredStore::new(fs.clone()));

        info!(root = %fs.root().display(), "沙箱组件初始化完成");

        Ok(WebState {
            fs,
            trash,
            recent,
            starred,
        })
    }

    pub async fn stop(&mut self) {
        info!("正在停止服务...");

        *self.status.write().await = ServiceStatus::Stopping;

        let _ = self.shutdown_tx.send(());

        info!("停止信号已发送");
    }

    async fn load_config(&mut self, config_path: &str) -> Result<Config, Box<dyn std::error::Error>> {
        let loader = ConfigLoader::new();
        let config = loader
            .load(config_path)
            .await
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)?;

        info!("配置加载成功");
        Ok(config)
    }

    pub async fn status(&self) -> ServiceStatus {
        self.status.read().await.clone()
    }
}

impl Default for PanboxService {
    fn default() -> Self {
        Self::new(ServiceConfig::default())
    }
}
