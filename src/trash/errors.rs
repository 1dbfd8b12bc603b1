//! 回收站模块错误定义
//!
//! 回收站操作横跨路径验证、物理移动与索引维护三个阶段，
//! 错误类型按阶段划分，供 Web 层映射为对应的状态码

use thiserror::Error;

use crate::sandbox::SandboxError;

/// 回收站错误类型
#[derive(Error, Debug)]
pub enum TrashError {
    /// 路径验证或底层文件服务错误
    #[error(transparent)]
    Sandbox(#[from] SandboxError),

    /// 还原目标不在回收站命名空间内
    ///
    /// 还原接口只接受回收站内的路径
    #[error("路径不在回收站内: {:?}", .path)]
    OutsideTrash {
        /// 被拒绝的路径
        path: std::path::PathBuf,
    },

    /// 回收站元数据缺失
    ///
    /// 物理条目存在但索引中没有对应记录（软删除写索引失败
    /// 产生的孤儿），无法还原
    #[error("回收站元数据缺失: {}", .slot)]
    MetadataMissing {
        /// 槽位 ID
        slot: String,
    },

    /// 目标不存在
    ///
    /// 重复清除同一路径等场景，幂等地返回此错误而非崩溃
    #[error("目标不存在: {:?}", .path)]
    NotFound {
        /// 请求的路径
        path: std::path::PathBuf,
    },

    /// 文件操作错误
    #[error("文件操作错误: {:?}", .source)]
    IoError {
        /// 原始 IO 错误
        #[from]
        source: std::io::Error,
    },
}

impl TrashError {
    /// 检查是否为安全相关错误
    pub fn is_security_error(&self) -> bool {
        match self {
            TrashError::Sandbox(e) => e.is_security_error(),
            TrashError::OutsideTrash { .. } => true,
            _ => false,
        }
    }
}

/// 回收站操作结果类型
pub type TrashResult<T> = Result<T, TrashError>;
