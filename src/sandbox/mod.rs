//! Sandbox 模块
//!
//! 提供安全的文件操作沙箱功能，所有操作被限制在单一根目录树内
//!
//! # 主要功能
//! - **路径隔离**：客户端只能访问沙箱根目录内的路径
//! - **安全验证**：词法归一化 + 前缀检查防止路径遍历
//! - **文件操作**：目录浏览、元数据、移动、重命名、创建、上传归档
//! - **分类统计**：按扩展名规则表统计目录构成
//!
//! # 目录结构
//! ```text
//! data/files/
//!   ├── Documents/        # 普通文件与目录
//!   ├── .trash/           # 回收站命名空间（含索引文件）
//!   ├── .uploads/         # 上传暂存目录
//!   └── .starred.json     # 收藏列表
//! ```
//!
//! # 配置项
//! ```toml
//! [sandbox]
//! root_path = "data/files"
//! trash_dir_name = ".trash"
//! ```

// 模块子模块
pub mod types;          // 类型定义
pub mod errors;         // 错误定义
pub mod path;           // 路径验证工具
pub mod service;        // 文件服务

// 重新导出主要类型
pub use types::{FileDescriptor, SandboxConfig};

pub use errors::{SandboxError, SandboxResult};

pub use path::PathValidator;

pub use service::{CategorizeSummary, CategoryStats, FsService, UploadOutcome};
