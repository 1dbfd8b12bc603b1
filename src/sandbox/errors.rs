//! Sandbox 模块错误定义
//!
//! 定义沙箱文件操作相关的错误类型，使用 thiserror 进行错误定义
//!
//! # 使用示例
//! ```rust,ignore
//! use panbox::sandbox::SandboxError;
//!
//! match result {
//!     Ok(_) => println!("操作成功"),
//!     Err(SandboxError::AccessDenied { path }) => {
//!         println!("路径越出沙箱: {:?}", path);
//!     }
//!     Err(e) => println!("其他错误: {}", e),
//! }
//! ```

use thiserror::Error;

/// 沙箱错误类型
///
/// 包含沙箱文件操作过程中可能出现的所有错误类型
#[derive(Error, Debug)]
pub enum SandboxError {
    /// 缺少必填路径参数
    ///
    /// 请求未携带路径，或路径为空字符串时返回此错误
    #[error("缺少必填参数: {}", .field)]
    MissingPath {
        /// 缺少的字段名
        field: &'static str,
    },

    /// 名称校验失败
    ///
    /// 重命名等操作的新名称中包含路径分隔符或 `..` 时返回此错误
    #[error("非法名称: {}", .name)]
    InvalidName {
        /// 被拒绝的名称
        name: String,
    },

    /// 访问被拒绝
    ///
    /// 请求的路径解析后越出沙箱根目录时返回此错误
    #[error("访问被拒绝: {:?}", .path)]
    AccessDenied {
        /// 被拒绝的路径
        path: std::path::PathBuf,
    },

    /// 文件不存在
    ///
    /// 当请求的文件或目录不存在时返回此错误
    #[error("文件不存在: {:?}", .path)]
    NotFound {
        /// 请求的路径
        path: std::path::PathBuf,
    },

    /// 目标不是目录
    ///
    /// 对文件执行目录操作（如列出内容）时返回此错误
    #[error("不是目录: {:?}", .path)]
    NotADirectory {
        /// 请求的路径
        path: std::path::PathBuf,
    },

    /// 文件操作错误
    ///
    /// 底层文件系统操作失败
    #[error("文件操作错误: {:?}", .source)]
    IoError {
        /// 原始 IO 错误
        #[from]
        source: std::io::Error,
    },
}

impl SandboxError {
    /// 检查是否为安全相关错误
    ///
    /// 安全相关错误需要以 warn 级别记录日志
    ///
    /// # 返回值
    /// 如果是安全相关错误返回 true
    pub fn is_security_error(&self) -> bool {
        matches!(self, SandboxError::AccessDenied { .. })
    }
}

/// 沙箱操作结果类型
///
/// 统一所有沙箱操作的返回类型
pub type SandboxResult<T> = Result<T, SandboxError>;
