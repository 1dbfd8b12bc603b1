//! 基础设施模块
//!
//! 提供配置加载、错误类型与日志系统等横切能力。

pub mod config;
pub mod error;
pub mod logging;
