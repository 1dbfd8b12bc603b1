//! Sandbox 路径验证工具
//!
//! 提供路径验证功能，确保所有文件操作都在沙箱目录内
//!
//! # 安全特性
//! - 路径重定根：客户端传入的相对路径一律以沙箱根为基准解析
//! - 路径遍历防护：词法归一化 `.` 与 `..` 后做前缀检查
//! - 纯函数：验证过程不访问文件系统，也没有副作用
//!
//! # 已知限制
//! 前缀检查是纯字符串层面的约束，不防御沙箱内符号链接指向外部的情况。
//!
//! # 使用示例
//! ```rust
//! use std::path::PathBuf;
//! use panbox::sandbox::PathValidator;
//!
//! let validator = PathValidator::new(PathBuf::from("/data/files"));
//!
//! // 相对路径以沙箱根为基准
//! let result = validator.resolve("docs/note.txt");
//! assert!(result.is_ok());
//!
//! // 路径遍历攻击被拒绝
//! let result = validator.resolve("../../../etc/passwd");
//! assert!(result.is_err());
//! ```

use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

use crate::sandbox::errors::{SandboxError, SandboxResult};

/// 路径验证器
///
/// 用于验证客户端传入路径是否在沙箱目录内
///
/// # 字段说明
/// * `root` - 沙箱根目录（构造时已做词法归一化）
#[derive(Debug, Clone)]
pub struct PathValidator {
    /// 沙箱根目录
    root: PathBuf,
}

impl PathValidator {
    /// 创建路径验证器
    ///
    /// # 参数说明
    /// * `root` - 沙箱根目录，调用方应传入已规范化的绝对路径
    ///
    /// # 返回值
    /// 创建的验证器实例
    pub fn new(root: PathBuf) -> Self {
        Self {
            root: normalize_lexically(&root),
        }
    }

    /// 获取沙箱根目录
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 验证并解析客户端路径
    ///
    /// 这是所有客户端路径进入系统的唯一入口，执行以下步骤：
    /// 1. 路径非空检查
    /// 2. 相对路径以沙箱根为基准拼接
    /// 3. 词法归一化（消解 `.` 与 `..`）
    /// 4. 沙箱边界前缀检查
    ///
    /// # 参数说明
    /// * `candidate` - 客户端传入的路径（相对或绝对）
    ///
    /// # 返回值
    /// 验证成功返回沙箱内的规范化绝对路径，越界返回 `AccessDenied`
    pub fn resolve(&self, candidate: &str) -> SandboxResult<PathBuf> {
        // 1. 检查路径是否为空
        if candidate.trim().is_empty() {
            return Err(SandboxError::MissingPath { field: "path" });
        }

        let requested = Path::new(candidate);

        // 2. 相对路径以沙箱根为基准
        let joined = if requested.is_absolute() {
            requested.to_path_buf()
        } else {
            self.root.join(requested)
        };

        // 3. 词法归一化
        let normalized = normalize_lexically(&joined);

        // 4. 验证路径是否在沙箱内
        if !normalized.starts_with(&self.root) {
            warn!(
                requested = candidate,
                resolved = %normalized.display(),
                root = %self.root.display(),
                "路径越出沙箱范围"
            );
            return Err(SandboxError::AccessDenied { path: normalized });
        }

        debug!(
            requested = candidate,
            safe_path = %normalized.display(),
            "路径验证通过"
        );

        Ok(normalized)
    }

    /// 检查名称是否可以作为单级文件名
    ///
    /// 重命名的新名称不允许携带路径分隔符或 `..`，
    /// 否则会把单级重命名变成一次隐式移动
    ///
    /// # 返回值
    /// 名称合法返回 Ok，否则返回 `InvalidName`
    pub fn validate_name(&self, name: &str) -> SandboxResult<()> {
        if name.trim().is_empty() {
            return Err(SandboxError::MissingPath { field: "newName" });
        }
        if name.contains('/') || name.contains('\\') || name == "." || name.contains("..") {
            warn!(name = name, "重命名名称校验失败");
            return Err(SandboxError::InvalidName {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// 检查路径是否位于给定目录之下
    ///
    /// 用于判断一个已验证路径是否落在回收站等子命名空间内
    pub fn is_under(&self, path: &Path, dir: &Path) -> bool {
        normalize_lexically(path).starts_with(normalize_lexically(dir))
    }
}

/// 词法归一化路径
///
/// 逐个消费路径组件：`.` 丢弃，`..` 弹出上一级，其余保留。
/// 不访问文件系统，因此不会解析符号链接。
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
