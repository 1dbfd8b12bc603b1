//! Sandbox 模块类型定义
//!
//! 提供沙箱相关的类型定义，包括配置和文件描述符
//!
//! # 使用示例
//! ```rust
//! use panbox::sandbox::SandboxConfig;
//!
//! let config = SandboxConfig::default();
//! println!("沙箱根目录: {:?}", config.root_path);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::category;

/// 沙箱配置
///
/// 配置文件管理器可操作的目录树范围及附属目录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// 沙箱根目录路径
    ///
    /// 所有文件操作只能发生在此目录树内，默认为 `data/files`
    #[serde(default = "default_root_path")]
    pub root_path: PathBuf,

    /// 回收站目录名
    ///
    /// 回收站嵌套在沙箱根目录内，默认为 `.trash`
    #[serde(default = "default_trash_dir_name")]
    pub trash_dir_name: String,

    /// 上传暂存目录名
    ///
    /// 上传的文件先落入暂存目录，再按分类归档
    #[serde(default = "default_uploads_dir_name")]
    pub uploads_dir_name: String,

    /// 收藏列表文件名
    ///
    /// 收藏路径持久化的 JSON 文件，位于沙箱根目录内
    #[serde(default = "default_starred_file_name")]
    pub starred_file_name: String,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            root_path: default_root_path(),
            trash_dir_name: default_trash_dir_name(),
            uploads_dir_name: default_uploads_dir_name(),
            starred_file_name: default_starred_file_name(),
        }
    }
}

/// 默认沙箱根目录
fn default_root_path() -> PathBuf {
    PathBuf::from("data/files")
}

/// 默认回收站目录名
fn default_trash_dir_name() -> String {
    ".trash".to_string()
}

/// 默认上传暂存目录名
fn default_uploads_dir_name() -> String {
    ".uploads".to_string()
}

/// 默认收藏列表文件名
fn default_starred_file_name() -> String {
    ".starred.json".to_string()
}

/// 文件描述符
///
/// 描述单个文件或目录的元数据，每次请求时从文件系统实时读取，
/// 不做任何缓存。字段名按前端约定使用 camelCase 序列化。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    /// 条目名称（basename）
    pub name: String,

    /// 沙箱内的绝对路径
    pub path: PathBuf,

    /// 文件大小（字节），目录为 0
    pub size: u64,

    /// 是否为目录
    pub is_directory: bool,

    /// 最后修改时间
    pub modified: DateTime<Utc>,

    /// 创建时间
    ///
    /// 平台不提供 birthtime 时回退为修改时间
    pub created: DateTime<Utc>,

    /// 小写扩展名（带点），无扩展名为空字符串
    pub extension: String,

    /// 按扩展名得到的分类
    pub category: String,

    /// 权限位（八进制字符串）
    pub mode: String,
}

impl FileDescriptor {
    /// 从文件元数据构建描述符
    ///
    /// # 参数说明
    /// * `path` - 沙箱内的绝对路径
    /// * `metadata` - 该路径的 `std::fs::Metadata`
    ///
    /// # 返回值
    /// 构建好的文件描述符
    pub fn from_metadata(path: PathBuf, metadata: &std::fs::Metadata) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let extension = extension_of(&name);
        let category = category::classify(&extension).to_string();

        let modified: DateTime<Utc> = metadata
            .modified()
            .map(DateTime::from)
            .unwrap_or_else(|_| Utc::now());
        // birthtime 在部分文件系统上不可用，回退为 mtime
        let created: DateTime<Utc> = metadata
            .created()
            .map(DateTime::from)
            .unwrap_or(modified);

        Self {
            name,
            path,
            size: if metadata.is_dir() { 0 } else { metadata.len() },
            is_directory: metadata.is_dir(),
            modified,
            created,
            extension,
            category,
            mode: format_mode(metadata),
        }
    }
}

/// 从文件名提取小写扩展名（带点）
///
/// # 返回值
/// 形如 `.png` 的小写扩展名，无扩展名返回空字符串
pub fn extension_of(name: &str) -> String {
    std::path::Path::new(name)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// 权限位格式化为八进制字符串
#[cfg(unix)]
fn format_mode(metadata: &std::fs::Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;
    format!("{:o}", metadata.permissions().mode() & 0o777)
}

/// 非 Unix 平台只区分可写与只读
#[cfg(not(unix))]
fn format_mode(metadata: &std::fs::Metadata) -> String {
    if metadata.permissions().readonly() {
        "444".to_string()
    } else {
        "666".to_string()
    }
}
