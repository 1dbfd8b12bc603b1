//! 配置管理系统模块
//!
//! 本模块负责加载和管理系统配置。

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::{env, fs};

use crate::sandbox::SandboxConfig;

/// 主配置结构
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP 服务配置
    #[serde(default)]
    pub server: ServerConfig,
    /// 沙箱配置
    #[serde(default)]
    pub sandbox: SandboxConfig,
    /// 日志配置
    #[serde(default)]
    pub logging: LoggingSection,
}

/// HTTP 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: default_port() }
    }
}

/// 默认监听端口
fn default_port() -> u16 {
    5001
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingSection {
    /// 日志级别
    pub level: Option<String>,
    /// 日志文件路径
    pub file_path: Option<PathBuf>,
}

/// 配置加载器
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// 创建新的配置加载器
    pub fn new() -> Self {
        Self
    }

    /// 加载配置
    pub async fn load(&self, path: &str) -> Result<Config, super::error::Error> {
        tracing::info!(path = path, "加载配置文件");

        // 检查文件是否存在
        if !PathBuf::from(path).exists() {
            tracing::warn!(path = path, "配置文件不存在，使用默认配置");
            return Ok(Config::default());
        }

        // 读取文件内容
        let content = fs::read_to_string(path)
            .map_err(|e| super::error::Error::Config(format!("读取配置文件失败: {}", e)))?;

        // 解析 TOML
        let mut config: Config = toml::from_str(&content)
            .map_err(|e| super::error::Error::Config(format!("解析配置文件失败: {}", e)))?;

        // 环境变量替换
        self.substitute_env_vars(&mut config);

        tracing::info!("配置加载成功");
        Ok(config)
    }

    /// 替换环境变量
    ///
    /// 将 `${VAR_NAME}` 格式的字符串替换为对应的环境变量值
    fn substitute_env_vars(&self, config: &mut Config) {
        let root = config.sandbox.root_path.to_string_lossy().to_string();
        config.sandbox.root_path = PathBuf::from(self.replace_env_vars(&root));

        if let Some(file_path) = &config.logging.file_path {
            let raw = file_path.to_string_lossy().to_string();
            config.logging.file_path = Some(PathBuf::from(self.replace_env_vars(&raw)));
        }
    }

    /// 替换字符串中的环境变量
    fn replace_env_vars(&self, input: &str) -> String {
        let pattern = r"\$\{([^}]+)\}";

        let re = match regex::Regex::new(pattern) {
            Ok(re) => re,
            Err(_) => return input.to_string(),
        };
        let result = re.replace_all(input, |caps: &regex::Captures| {
            let var_name = &caps[1];
            env::var(var_name).unwrap_or_else(|_| caps[0].to_string())
        });

        result.to_string()
    }
}
