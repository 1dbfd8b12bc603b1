//! 收藏模块
//!
//! 维护一份持久化的收藏路径列表（仅成员关系，不存元数据）。
//! 列表落盘为沙箱根目录下的一个 JSON 文档；路径是否仍然有效
//! 在读取时检查，不做主动维护——文件被删除后收藏记录保留，
//! 列表接口返回时自动过滤。

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::sandbox::{FileDescriptor, FsService, SandboxResult};

/// 收藏存储
///
/// 独占持有自己的持久化文件，写入采用临时文件 + 原子 rename
#[derive(Debug)]
pub struct StarredStore {
    /// 沙箱文件服务
    fs: Arc<FsService>,

    /// 收藏列表文件路径
    file_path: PathBuf,

    /// 保护读改写周期的互斥锁
    lock: Mutex<()>,
}

impl StarredStore {
    /// 创建收藏存储
    pub fn new(fs: Arc<FsService>) -> Self {
        let file_path = fs.starred_file();
        Self {
            fs,
            file_path,
            lock: Mutex::new(()),
        }
    }

    /// 收藏一个路径（幂等）
    ///
    /// # 错误
    /// 路径越界返回 `AccessDenied`，目标不存在返回 `NotFound`
    pub async fn star(&self, candidate: &str) -> SandboxResult<()> {
        // 收藏前确认目标存在且在沙箱内
        let descriptor = self.fs.describe(candidate).await?;

        let _guard = self.lock.lock().await;
        let mut paths = self.load().await;
        let path_str = descriptor.path.display().to_string();
        if !paths.contains(&path_str) {
            paths.push(path_str);
            self.save(&paths).await?;
        }
        Ok(())
    }

    /// 取消收藏（幂等）
    pub async fn unstar(&self, candidate: &str) -> SandboxResult<()> {
        let safe_path = self.fs.validator().resolve(candidate)?;
        let path_str = safe_path.display().to_string();

        let _guard = self.lock.lock().await;
        let mut paths = self.load().await;
        let before = paths.len();
        paths.retain(|p| *p != path_str);
        if paths.len() != before {
            self.save(&paths).await?;
        }
        Ok(())
    }

    /// 列出仍然有效的收藏条目
    ///
    /// 逐个实时读取元数据，已不存在的路径被过滤但不从列表中清除
    pub async fn list_valid(&self) -> SandboxResult<Vec<FileDescriptor>> {
        let paths = {
            let _guard = self.lock.lock().await;
            self.load().await
        };

        let mut entries = Vec::new();
        for path in paths {
            match self.fs.describe(&path).await {
                Ok(descriptor) => entries.push(descriptor),
                Err(_) => {
                    debug!(path = %path, "收藏路径已失效，列表中跳过");
                }
            }
        }
        Ok(entries)
    }

    /// 从磁盘加载收藏列表（调用方必须已持有锁）
    async fn load(&self) -> Vec<String> {
        let content = match tokio::fs::read_to_string(&self.file_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(path = %self.file_path.display(), error = %e, "读取收藏列表失败");
                return Vec::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(paths) => paths,
            Err(e) => {
                warn!(
                    path = %self.file_path.display(),
                    error = %e,
                    "收藏列表内容损坏，按空列表处理"
                );
                Vec::new()
            }
        }
    }

    /// 全量重写收藏列表（调用方必须已持有锁）
    async fn save(&self, paths: &[String]) -> std::io::Result<()> {
        let content = serde_json::to_string_pretty(paths)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let tmp_path = self.file_path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, content).await?;
        tokio::fs::rename(&tmp_path, &self.file_path).await?;
        Ok(())
    }
}
