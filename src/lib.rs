//! Panbox 库入口
//!
//! 浏览器端个人文件管理器的后端：在单一沙箱根目录下提供
//! 浏览、分类、移动、上传、回收站等能力。
//!
//! # 使用示例
//! ```rust
//! use panbox::sandbox::SandboxConfig;
//! ```

/// 文件分类规则
pub mod category;
/// 基础设施（配置 / 错误 / 日志）
pub mod infra;
/// 最近访问追踪
pub mod recent;
pub mod service;
/// 收藏列表
pub mod starred;
pub mod web;

/// Sandbox 沙箱模块
///
/// 所有文件操作限制在沙箱根目录内，路径在进入文件系统前统一验证
pub mod sandbox;

/// 回收站模块
///
/// 软删除、还原与回收站清单，物理文件与元数据索引分离存储
pub mod trash;
