//! Sandbox 文件服务模块
//!
//! 提供沙箱内文件系统的核心服务：目录浏览、元数据读取、
//! 移动、重命名、目录创建、上传归档与分类统计。
//!
//! # 功能特性
//! - 所有客户端路径先经过 [`PathValidator`] 验证再落到文件系统
//! - 元数据每次实时读取，不做缓存
//! - 目录判定统一依赖 [`FileDescriptor::is_directory`]
//!
//! # 使用示例
//! ```rust,ignore
//! use panbox::sandbox::{FsService, SandboxConfig};
//!
//! let service = FsService::new(SandboxConfig::default()).await?;
//!
//! // 列出根目录
//! let (current, entries) = service.list_dir("").await?;
//!
//! // 读取元数据
//! let descriptor = service.describe("docs/note.txt").await?;
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use serde::Serialize;
use tracing::{debug, info};

use crate::category;
use crate::sandbox::errors::{SandboxError, SandboxResult};
use crate::sandbox::path::PathValidator;
use crate::sandbox::types::{extension_of, FileDescriptor, SandboxConfig};

/// 单个分类的统计信息
#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryStats {
    /// 文件数量
    pub count: u64,
    /// 合计大小（字节）
    pub size: u64,
    /// 文件名列表
    pub files: Vec<String>,
}

/// 目录分类统计结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorizeSummary {
    /// 分类名 → 统计
    pub categories: HashMap<String, CategoryStats>,
    /// 目录内条目总数（含目录）
    pub total_files: u64,
    /// 非目录条目合计大小
    pub total_size: u64,
}

/// 上传归档结果
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    /// 归档后文件的描述符
    pub file: FileDescriptor,
    /// 归档分类
    pub category: String,
    /// 归档目录名（分类首字母大写）
    pub folder: String,
}

/// 沙箱文件服务
///
/// 管理沙箱目录树上全部只读与变更操作的核心服务
///
/// # 字段说明
/// * `config` - 沙箱配置
/// * `validator` - 路径验证器
#[derive(Debug, Clone)]
pub struct FsService {
    /// 沙箱配置
    config: SandboxConfig,

    /// 路径验证器
    validator: PathValidator,
}

impl FsService {
    /// 创建沙箱文件服务
    ///
    /// 确保沙箱根目录存在，并以其规范化路径构建验证器
    ///
    /// # 参数说明
    /// * `config` - 沙箱配置
    ///
    /// # 返回值
    /// 创建的文件服务实例
    ///
    /// # 错误
    /// 如果创建沙箱根目录失败，返回错误
    pub async fn new(mut config: SandboxConfig) -> SandboxResult<Self> {
        tokio::fs::create_dir_all(&config.root_path).await?;

        // 根目录只在启动时规范化一次，后续请求全部走词法检查
        let canonical_root = tokio::fs::canonicalize(&config.root_path).await?;
        config.root_path = canonical_root.clone();

        info!(root = %canonical_root.display(), "沙箱文件服务初始化成功");

        Ok(Self {
            validator: PathValidator::new(canonical_root),
            config,
        })
    }

    /// 获取沙箱配置
    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// 获取路径验证器
    pub fn validator(&self) -> &PathValidator {
        &self.validator
    }

    /// 沙箱根目录
    pub fn root(&self) -> &Path {
        self.validator.root()
    }

    /// 回收站目录的绝对路径
    pub fn trash_dir(&self) -> PathBuf {
        self.validator.root().join(&self.config.trash_dir_name)
    }

    /// 上传暂存目录的绝对路径
    pub fn uploads_dir(&self) -> PathBuf {
        self.validator.root().join(&self.config.uploads_dir_name)
    }

    /// 收藏列表文件的绝对路径
    pub fn starred_file(&self) -> PathBuf {
        self.validator.root().join(&self.config.starred_file_name)
    }

    /// 探测路径元数据
    ///
    /// 目标不存在按 `None` 返回，这是移动等操作的预期分支而非错误
    pub async fn probe(&self, path: &Path) -> SandboxResult<Option<std::fs::Metadata>> {
        match tokio::fs::metadata(path).await {
            Ok(metadata) => Ok(Some(metadata)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SandboxError::IoError { source: e }),
        }
    }

    // ==================== 只读操作 API ====================

    /// 读取文件或目录的元数据
    ///
    /// # 参数说明
    /// * `candidate` - 客户端传入的路径
    ///
    /// # 返回值
    /// 实时读取的文件描述符
    ///
    /// # 错误
    /// 路径越界返回 `AccessDenied`，不存在返回 `NotFound`
    pub async fn describe(&self, candidate: &str) -> SandboxResult<FileDescriptor> {
        let safe_path = self.validator.resolve(candidate)?;
        self.describe_resolved(&safe_path).await
    }

    /// 读取已验证路径的元数据
    pub async fn describe_resolved(&self, path: &Path) -> SandboxResult<FileDescriptor> {
        let metadata = self.probe(path).await?.ok_or_else(|| SandboxError::NotFound {
            path: path.to_path_buf(),
        })?;
        Ok(FileDescriptor::from_metadata(path.to_path_buf(), &metadata))
    }

    /// 列出目录内容
    ///
    /// 隐藏条目（`.` 开头，包括回收站与上传暂存目录）不出现在
    /// 普通列表中；中途被删除、stat 失败的条目直接跳过。
    ///
    /// # 参数说明
    /// * `candidate` - 客户端传入的目录路径，空字符串表示沙箱根
    ///
    /// # 返回值
    /// （解析后的当前目录，按名称排序的描述符列表）
    pub async fn list_dir(
        &self,
        candidate: &str,
    ) -> SandboxResult<(PathBuf, Vec<FileDescriptor>)> {
        let safe_path = if candidate.trim().is_empty() {
            self.validator.root().to_path_buf()
        } else {
            self.validator.resolve(candidate)?
        };

        debug!(path = %safe_path.display(), "列出目录");

        let metadata = self.probe(&safe_path).await?.ok_or_else(|| {
            SandboxError::NotFound {
                path: safe_path.clone(),
            }
        })?;
        if !metadata.is_dir() {
            return Err(SandboxError::NotADirectory { path: safe_path });
        }

        let mut entries = Vec::new();
        let mut read_dir = tokio::fs::read_dir(&safe_path).await?;

        while let Some(entry) = read_dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }
            match entry.metadata().await {
                Ok(metadata) => {
                    entries.push(FileDescriptor::from_metadata(entry.path(), &metadata));
                }
                Err(_) => continue,
            }
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));

        Ok((safe_path, entries))
    }

    /// 统计目录下各分类的文件数量与大小
    ///
    /// 只统计当前层级的非目录条目，不递归
    pub async fn categorize(&self, candidate: &str) -> SandboxResult<CategorizeSummary> {
        let (_, entries) = self.list_dir(candidate).await?;

        let mut categories: HashMap<String, CategoryStats> = HashMap::new();
        let mut total_size = 0u64;
        let total_files = entries.len() as u64;

        for descriptor in entries {
            if descriptor.is_directory {
                continue;
            }
            let stats = categories.entry(descriptor.category.clone()).or_default();
            stats.count += 1;
            stats.size += descriptor.size;
            stats.files.push(descriptor.name);
            total_size += descriptor.size;
        }

        Ok(CategorizeSummary {
            categories,
            total_files,
            total_size,
        })
    }

    // ==================== 变更操作 API ====================

    /// 移动文件或目录
    ///
    /// 目标已存在且为目录时，移入该目录并保留原名；
    /// 目标不存在时视为移动并重命名。
    ///
    /// # 返回值
    /// 移动后的新路径
    pub async fn move_item(
        &self,
        source: &str,
        destination: &str,
    ) -> SandboxResult<PathBuf> {
        let safe_source = self.validator.resolve(source)?;
        let safe_dest = self.validator.resolve(destination)?;

        debug!(
            source = %safe_source.display(),
            dest = %safe_dest.display(),
            "移动请求"
        );

        if self.probe(&safe_source).await?.is_none() {
            return Err(SandboxError::NotFound { path: safe_source });
        }

        // 目标是已存在的目录时，移入该目录
        let final_dest = match self.probe(&safe_dest).await? {
            Some(metadata) if metadata.is_dir() => {
                let base_name = safe_source
                    .file_name()
                    .map(|n| n.to_os_string())
                    .ok_or_else(|| SandboxError::MissingPath { field: "sourcePath" })?;
                safe_dest.join(base_name)
            }
            _ => safe_dest,
        };

        tokio::fs::rename(&safe_source, &final_dest).await?;

        info!(
            source = %safe_source.display(),
            dest = %final_dest.display(),
            "移动成功"
        );

        Ok(final_dest)
    }

    /// 重命名文件或目录
    ///
    /// 新名称只允许单级文件名，不允许路径分隔符或 `..`；
    /// 目标名称已被占用时拒绝，避免静默覆盖。
    ///
    /// # 返回值
    /// 重命名后的新路径
    pub async fn rename_item(&self, candidate: &str, new_name: &str) -> SandboxResult<PathBuf> {
        let safe_path = self.validator.resolve(candidate)?;
        self.validator.validate_name(new_name)?;

        if self.probe(&safe_path).await?.is_none() {
            return Err(SandboxError::NotFound { path: safe_path });
        }

        let parent = safe_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.validator.root().to_path_buf());
        let target = parent.join(new_name);

        if self.probe(&target).await?.is_some() {
            return Err(SandboxError::IoError {
                source: std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    format!("目标名称已存在: {new_name}"),
                ),
            });
        }

        tokio::fs::rename(&safe_path, &target).await?;

        info!(
            path = %safe_path.display(),
            new_name = new_name,
            "重命名成功"
        );

        Ok(target)
    }

    /// 创建目录（递归）
    ///
    /// # 返回值
    /// 创建的目录路径
    pub async fn create_dir(&self, candidate: &str) -> SandboxResult<PathBuf> {
        let safe_path = self.validator.resolve(candidate)?;

        debug!(path = %safe_path.display(), "创建目录");

        tokio::fs::create_dir_all(&safe_path).await?;
        Ok(safe_path)
    }

    /// 接收上传内容并按分类归档
    ///
    /// 先写入上传暂存目录，再按扩展名分类移动到对应的
    /// 分类目录（分类名首字母大写）下。归档与原始上传同名，
    /// 目标已存在时覆盖。
    ///
    /// # 参数说明
    /// * `file_name` - 上传的原始文件名（单级名称）
    /// * `content` - 文件内容
    pub async fn place_upload(
        &self,
        file_name: &str,
        content: &[u8],
    ) -> SandboxResult<UploadOutcome> {
        self.validator.validate_name(file_name)?;

        let extension = extension_of(file_name);
        let category = category::classify(&extension).to_string();
        let folder = category::folder_name(&category);

        info!(file = file_name, category = %category, "接收上传");

        // 先落入暂存目录
        let uploads_dir = self.uploads_dir();
        tokio::fs::create_dir_all(&uploads_dir).await?;
        let staged = uploads_dir.join(file_name);
        tokio::fs::write(&staged, content).await?;

        // 归档到分类目录
        let category_dir = self.validator.root().join(&folder);
        tokio::fs::create_dir_all(&category_dir).await?;
        let final_path = category_dir.join(file_name);
        tokio::fs::rename(&staged, &final_path).await?;

        info!(path = %final_path.display(), "上传归档完成");

        let file = self.describe_resolved(&final_path).await?;
        Ok(UploadOutcome {
            file,
            category,
            folder,
        })
    }
}
