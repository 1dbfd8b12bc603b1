//! 回收站引擎
//!
//! 编排软删除、永久删除、还原与回收站列表四个操作。每个被管理
//! 的条目只有两种位置状态：活跃命名空间内（可正常浏览）或回收站
//! 命名空间内（索引中有来源记录）；永久删除后条目不可恢复。
//!
//! # 操作顺序约定
//! - 软删除：先快照元数据，再物理移动，最后写索引。移动失败时
//!   索引未被触碰，状态保持一致；移动成功但写索引失败会留下
//!   孤儿物理条目，由列表操作容忍并展示。
//! - 还原：先物理移动，成功后才删除索引记录，失败时记录保留，
//!   操作可重试。
//!
//! # 使用示例
//! ```rust,ignore
//! use panbox::trash::TrashEngine;
//!
//! let outcome = engine.delete("docs/old.txt", false).await?;
//! let restored = engine.restore(&outcome_path).await?;
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::recent::RecentTracker;
use crate::sandbox::FsService;
use crate::trash::errors::{TrashError, TrashResult};
use crate::trash::index::TrashIndexStore;
use crate::trash::types::{
    restored_name, slot_id, ItemType, TrashEntry, TrashListEntry, UNKNOWN_ORIGIN,
};
use crate::sandbox::FileDescriptor;

/// 删除操作结果
#[derive(Debug, Clone)]
pub struct DeleteOutcome {
    /// 被删除条目的类型
    pub item_type: ItemType,
    /// 是否为永久删除
    pub permanent: bool,
    /// 面向用户的结果描述
    pub message: String,
}

/// 还原操作结果
#[derive(Debug, Clone)]
pub struct RestoreOutcome {
    /// 还原后的路径
    pub new_path: PathBuf,
    /// 面向用户的结果描述
    pub message: String,
}

/// 回收站引擎
///
/// # 字段说明
/// * `fs` - 沙箱文件服务
/// * `index` - 回收站索引存储（引擎独占）
/// * `recent` - 最近访问追踪器，删除时收到通知
pub struct TrashEngine {
    /// 沙箱文件服务
    fs: Arc<FsService>,

    /// 回收站索引存储
    index: TrashIndexStore,

    /// 回收站目录
    trash_dir: PathBuf,

    /// 最近访问追踪器
    recent: Arc<RecentTracker>,
}

impl TrashEngine {
    /// 创建回收站引擎
    ///
    /// 确保回收站目录存在
    ///
    /// # 错误
    /// 创建回收站目录失败时返回错误
    pub async fn new(fs: Arc<FsService>, recent: Arc<RecentTracker>) -> TrashResult<Self> {
        let trash_dir = fs.trash_dir();
        tokio::fs::create_dir_all(&trash_dir).await?;

        info!(path = %trash_dir.display(), "回收站引擎初始化成功");

        Ok(Self {
            index: TrashIndexStore::new(&trash_dir),
            fs,
            trash_dir,
            recent,
        })
    }

    /// 回收站目录
    pub fn trash_dir(&self) -> &PathBuf {
        &self.trash_dir
    }

    /// 删除文件或目录
    ///
    /// 默认软删除（移入回收站并记录来源）；`permanent` 为 true
    /// 或目标本就位于回收站内时执行永久删除。
    ///
    /// # 参数说明
    /// * `candidate` - 客户端传入的路径
    /// * `permanent` - 是否跳过回收站直接删除
    ///
    /// # 错误
    /// 路径越界返回 `AccessDenied`，目标不存在返回 `NotFound`；
    /// 对同一路径重复永久删除会幂等地返回 `NotFound`
    pub async fn delete(&self, candidate: &str, permanent: bool) -> TrashResult<DeleteOutcome> {
        let safe_path = self.fs.validator().resolve(candidate)?;

        // 物理移动后原路径的元数据不再可得，先快照
        let descriptor = self.fs.describe_resolved(&safe_path).await?;
        let item_type = ItemType::from_is_directory(descriptor.is_directory);

        let in_trash = self.fs.validator().is_under(&safe_path, &self.trash_dir);

        if permanent || in_trash {
            self.purge(&safe_path, &descriptor, in_trash).await?;
            self.recent.evict(&safe_path).await;
            return Ok(DeleteOutcome {
                item_type,
                permanent: true,
                message: format!("已永久删除: {}", descriptor.name),
            });
        }

        // 软删除：快照 → 物理移动 → 写索引
        let now = Utc::now();
        let slot = slot_id(now, &descriptor.name);
        let trash_path = self.trash_dir.join(&slot);

        tokio::fs::create_dir_all(&self.trash_dir).await?;
        tokio::fs::rename(&safe_path, &trash_path).await?;

        let entry = TrashEntry {
            original_path: safe_path.clone(),
            original_name: descriptor.name.clone(),
            deleted_at: now,
            size: descriptor.size,
            item_type,
        };

        if let Err(e) = self.index.upsert(slot.clone(), entry).await {
            // 物理条目已在回收站中但没有索引记录，成为孤儿；
            // 列表操作会以 Unknown 来源展示它
            warn!(
                slot = %slot,
                error = %e,
                "索引写入失败，条目成为孤儿"
            );
            return Err(e.into());
        }

        self.recent.evict(&safe_path).await;

        info!(
            path = %safe_path.display(),
            slot = %slot,
            "已移入回收站"
        );

        Ok(DeleteOutcome {
            item_type,
            permanent: false,
            message: format!("已移入回收站: {}", descriptor.name),
        })
    }

    /// 物理清除条目并清理索引
    async fn purge(
        &self,
        safe_path: &std::path::Path,
        descriptor: &FileDescriptor,
        in_trash: bool,
    ) -> TrashResult<()> {
        if descriptor.is_directory {
            tokio::fs::remove_dir_all(safe_path).await?;
        } else {
            tokio::fs::remove_file(safe_path).await?;
        }

        // 回收站内的条目额外清理索引记录
        if in_trash {
            if let Some(slot) = safe_path.file_name().map(|n| n.to_string_lossy().to_string()) {
                self.index.remove(&slot).await?;
            }
        }

        info!(path = %safe_path.display(), "已永久删除");
        Ok(())
    }

    /// 从回收站还原条目
    ///
    /// 目标位置优先使用原路径；原父目录已不存在时回退到沙箱根。
    /// 目标位置被占用时在扩展名前追加 `-restored-{毫秒}`，绝不
    /// 覆盖无关数据。
    ///
    /// # 参数说明
    /// * `candidate` - 回收站内的条目路径
    ///
    /// # 错误
    /// 路径不在回收站内返回 `OutsideTrash`；物理条目缺失返回
    /// `NotFound`；索引记录缺失（孤儿）返回 `MetadataMissing`
    pub async fn restore(&self, candidate: &str) -> TrashResult<RestoreOutcome> {
        let safe_path = self.fs.validator().resolve(candidate)?;

        if !self.fs.validator().is_under(&safe_path, &self.trash_dir) {
            warn!(path = %safe_path.display(), "还原目标不在回收站内");
            return Err(TrashError::OutsideTrash { path: safe_path });
        }

        let slot = safe_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| TrashError::NotFound {
                path: safe_path.clone(),
            })?;

        if self.fs.probe(&safe_path).await?.is_none() {
            return Err(TrashError::NotFound { path: safe_path });
        }

        let entry = self
            .index
            .get(&slot)
            .await
            .ok_or_else(|| TrashError::MetadataMissing { slot: slot.clone() })?;

        // 原父目录还在则放回原位，否则回退到沙箱根
        let (target_dir, fallback) = match entry.original_path.parent() {
            Some(parent) if self.fs.probe(parent).await?.is_some() => {
                (parent.to_path_buf(), false)
            }
            _ => (self.fs.root().to_path_buf(), true),
        };

        let mut target = target_dir.join(&entry.original_name);

        // 目标被占用时改名，避免覆盖
        if self.fs.probe(&target).await?.is_some() {
            let renamed = restored_name(&entry.original_name, Utc::now());
            debug!(
                target = %target.display(),
                renamed = %renamed,
                "还原目标被占用，追加后缀"
            );
            target = target_dir.join(renamed);
        }

        // 先物理移动，成功后才清理索引，失败时保持可重试
        tokio::fs::rename(&safe_path, &target).await?;
        self.index.remove(&slot).await?;

        info!(
            slot = %slot,
            target = %target.display(),
            fallback = fallback,
            "还原完成"
        );

        Ok(RestoreOutcome {
            message: format!("已还原: {}", entry.original_name),
            new_path: target,
        })
    }

    /// 列出回收站内容
    ///
    /// 物理枚举回收站目录并与索引按槽位 ID 连接：
    /// - 索引文件与隐藏记账条目不出现在结果中
    /// - 没有索引记录的孤儿条目以 `Unknown` 来源展示，不被隐藏
    /// - 有索引记录但物理缺失的条目被静默丢弃
    /// - stat 失败（删除中途）的条目被丢弃
    pub async fn list(&self) -> TrashResult<Vec<TrashListEntry>> {
        let index = self.index.snapshot().await;

        let mut read_dir = match tokio::fs::read_dir(&self.trash_dir).await {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        while let Some(dir_entry) = read_dir.next_entry().await? {
            let slot = dir_entry.file_name().to_string_lossy().to_string();
            if slot.starts_with('.') {
                continue;
            }

            let metadata = match dir_entry.metadata().await {
                Ok(metadata) => metadata,
                Err(_) => continue,
            };

            let mut descriptor =
                FileDescriptor::from_metadata(dir_entry.path(), &metadata);

            let (original_path, deleted_at) = match index.get(&slot) {
                Some(record) => {
                    descriptor.name = record.original_name.clone();
                    (
                        record.original_path.display().to_string(),
                        Some(record.deleted_at),
                    )
                }
                None => (UNKNOWN_ORIGIN.to_string(), None),
            };

            entries.push(TrashListEntry {
                descriptor,
                original_path,
                deleted_at,
            });
        }

        // 槽位 ID 以删除时刻毫秒开头，倒序即新删除的在前
        entries.sort_by(|a, b| {
            let a_slot = a.descriptor.path.file_name().map(|n| n.to_os_string());
            let b_slot = b.descriptor.path.file_name().map(|n| n.to_os_string());
            b_slot.cmp(&a_slot)
        });

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::SandboxConfig;
    use crate::trash::index::INDEX_FILE_NAME;
    use tempfile::TempDir;

    async fn create_test_engine() -> (TrashEngine, Arc<FsService>, Arc<RecentTracker>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = SandboxConfig {
            root_path: temp_dir.path().to_path_buf(),
            ..Default::default()
        };
        let fs = Arc::new(FsService::new(config).await.unwrap());
        let recent = Arc::new(RecentTracker::new());
        let engine = TrashEngine::new(fs.clone(), recent.clone()).await.unwrap();
        (engine, fs, recent, temp_dir)
    }

    /// 回收站目录中除索引文件外的物理条目数
    async fn trash_item_count(engine: &TrashEngine) -> usize {
        let mut count = 0;
        let mut read_dir = tokio::fs::read_dir(engine.trash_dir()).await.unwrap();
        while let Some(entry) = read_dir.next_entry().await.unwrap() {
            if !entry.file_name().to_string_lossy().starts_with('.') {
                count += 1;
            }
        }
        count
    }

    #[tokio::test]
    async fn test_soft_delete_then_restore_round_trip() {
        let (engine, fs, _, _temp) = create_test_engine().await;
        let original = fs.root().join("notes.txt");
        tokio::fs::write(&original, b"0123456789").await.unwrap();

        // 软删除：原路径消失，回收站出现一个条目，索引有一条记录
        let outcome = engine.delete("notes.txt", false).await.unwrap();
        assert!(!outcome.permanent);
        assert_eq!(outcome.item_type, ItemType::File);
        assert!(!original.exists());
        assert_eq!(trash_item_count(&engine).await, 1);

        let listed = engine.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].descriptor.name, "notes.txt");
        assert_eq!(listed[0].original_path, original.display().to_string());

        // 还原：内容与大小一致，索引清空，回收站只剩索引文件
        let trash_path = listed[0].descriptor.path.clone();
        let restored = engine
            .restore(&trash_path.display().to_string())
            .await
            .unwrap();
        assert_eq!(restored.new_path, original);
        assert_eq!(tokio::fs::read(&original).await.unwrap(), b"0123456789");
        assert_eq!(trash_item_count(&engine).await, 0);
        assert!(engine.list().await.unwrap().is_empty());
        assert!(engine.trash_dir().join(INDEX_FILE_NAME).exists());
    }

    #[tokio::test]
    async fn test_soft_delete_directory() {
        let (engine, fs, _, _temp) = create_test_engine().await;
        tokio::fs::create_dir_all(fs.root().join("docs")).await.unwrap();
        tokio::fs::write(fs.root().join("docs/a.txt"), b"a").await.unwrap();

        let outcome = engine.delete("docs", false).await.unwrap();
        assert_eq!(outcome.item_type, ItemType::Folder);

        let listed = engine.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].descriptor.is_directory);
        // 目录大小快照为 0
        assert_eq!(listed[0].descriptor.size, 0);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let (engine, _, _, _temp) = create_test_engine().await;
        let result = engine.delete("ghost.txt", false).await;
        assert!(matches!(
            result,
            Err(TrashError::Sandbox(crate::sandbox::SandboxError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_delete_outside_sandbox_denied() {
        let (engine, _, _, _temp) = create_test_engine().await;
        let result = engine.delete("../../etc/passwd", false).await;
        assert!(result.as_ref().err().map(TrashError::is_security_error).unwrap_or(false));
    }

    #[tokio::test]
    async fn test_permanent_delete_is_idempotent_not_found() {
        let (engine, fs, _, _temp) = create_test_engine().await;
        tokio::fs::write(fs.root().join("a.txt"), b"a").await.unwrap();

        let outcome = engine.delete("a.txt", true).await.unwrap();
        assert!(outcome.permanent);
        assert_eq!(trash_item_count(&engine).await, 0);

        // 重复清除同一路径：NotFound 而非崩溃
        let result = engine.delete("a.txt", true).await;
        assert!(matches!(
            result,
            Err(TrashError::Sandbox(crate::sandbox::SandboxError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_delete_inside_trash_is_permanent() {
        let (engine, fs, _, _temp) = create_test_engine().await;
        tokio::fs::write(fs.root().join("a.txt"), b"a").await.unwrap();
        engine.delete("a.txt", false).await.unwrap();

        let listed = engine.list().await.unwrap();
        let trash_path = listed[0].descriptor.path.display().to_string();

        // 对回收站内的路径执行删除即永久清除，索引同步清理
        let outcome = engine.delete(&trash_path, false).await.unwrap();
        assert!(outcome.permanent);
        assert!(engine.list().await.unwrap().is_empty());
        assert_eq!(engine.index.snapshot().await.len(), 0);
    }

    #[tokio::test]
    async fn test_restore_collision_appends_suffix() {
        let (engine, fs, _, _temp) = create_test_engine().await;
        let original = fs.root().join("a.txt");
        tokio::fs::write(&original, b"trashed").await.unwrap();
        engine.delete("a.txt", false).await.unwrap();

        // 原位置被新的同名文件占用
        tokio::fs::write(&original, b"occupant").await.unwrap();

        let listed = engine.list().await.unwrap();
        let trash_path = listed[0].descriptor.path.display().to_string();
        let restored = engine.restore(&trash_path).await.unwrap();

        // 占用者未被触碰，还原件带 -restored- 后缀且保留扩展名
        assert_eq!(tokio::fs::read(&original).await.unwrap(), b"occupant");
        let restored_file = restored.new_path.file_name().unwrap().to_string_lossy().to_string();
        assert!(restored_file.starts_with("a-restored-"));
        assert!(restored_file.ends_with(".txt"));
        assert_eq!(tokio::fs::read(&restored.new_path).await.unwrap(), b"trashed");
    }

    #[tokio::test]
    async fn test_restore_falls_back_to_root_when_parent_missing() {
        let (engine, fs, _, _temp) = create_test_engine().await;
        tokio::fs::create_dir_all(fs.root().join("sub")).await.unwrap();
        tokio::fs::write(fs.root().join("sub/a.txt"), b"a").await.unwrap();

        engine.delete("sub/a.txt", false).await.unwrap();
        engine.delete("sub", true).await.unwrap();

        let listed = engine.list().await.unwrap();
        let trash_path = listed[0].descriptor.path.display().to_string();
        let restored = engine.restore(&trash_path).await.unwrap();

        // 原父目录已不存在，回退到沙箱根
        assert_eq!(restored.new_path, fs.root().join("a.txt"));
        assert!(restored.new_path.exists());
    }

    #[tokio::test]
    async fn test_restore_orphan_is_metadata_missing() {
        let (engine, _, _, _temp) = create_test_engine().await;
        let orphan = engine.trash_dir().join("1714000000000-ghost.txt");
        tokio::fs::write(&orphan, b"orphan").await.unwrap();

        let result = engine.restore(&orphan.display().to_string()).await;
        assert!(matches!(result, Err(TrashError::MetadataMissing { .. })));
    }

    #[tokio::test]
    async fn test_restore_outside_trash_rejected() {
        let (engine, fs, _, _temp) = create_test_engine().await;
        tokio::fs::write(fs.root().join("a.txt"), b"a").await.unwrap();

        let result = engine.restore("a.txt").await;
        assert!(matches!(result, Err(TrashError::OutsideTrash { .. })));
    }

    #[tokio::test]
    async fn test_list_tolerates_orphans_both_ways() {
        let (engine, fs, _, _temp) = create_test_engine().await;

        // 正常条目
        tokio::fs::write(fs.root().join("a.txt"), b"a").await.unwrap();
        engine.delete("a.txt", false).await.unwrap();

        // 孤儿物理条目：有文件无索引记录
        tokio::fs::write(engine.trash_dir().join("42-orphan.txt"), b"x")
            .await
            .unwrap();

        // 孤儿索引记录：有记录无文件
        let stale = TrashEntry {
            original_path: fs.root().join("stale.txt"),
            original_name: "stale.txt".to_string(),
            deleted_at: Utc::now(),
            size: 1,
            item_type: ItemType::File,
        };
        engine
            .index
            .upsert("7-stale.txt".to_string(), stale)
            .await
            .unwrap();

        let listed = engine.list().await.unwrap();
        assert_eq!(listed.len(), 2);

        let orphan = listed
            .iter()
            .find(|e| e.descriptor.name == "42-orphan.txt")
            .unwrap();
        assert_eq!(orphan.original_path, UNKNOWN_ORIGIN);
        assert!(orphan.deleted_at.is_none());

        // 孤儿索引记录被静默丢弃
        assert!(listed.iter().all(|e| e.descriptor.name != "stale.txt"));
    }

    #[tokio::test]
    async fn test_soft_delete_evicts_recent_entry() {
        let (engine, fs, recent, _temp) = create_test_engine().await;
        tokio::fs::write(fs.root().join("a.txt"), b"a").await.unwrap();

        let descriptor = fs.describe("a.txt").await.unwrap();
        recent.touch(descriptor).await;
        assert_eq!(recent.list().await.len(), 1);

        engine.delete("a.txt", false).await.unwrap();
        assert!(recent.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_soft_deletes_keep_all_entries() {
        let (engine, fs, _, _temp) = create_test_engine().await;
        for i in 0..6 {
            tokio::fs::write(fs.root().join(format!("f{i}.txt")), b"x")
                .await
                .unwrap();
        }

        let engine = Arc::new(engine);
        let mut handles = Vec::new();
        for i in 0..6 {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move {
                engine.delete(&format!("f{i}.txt"), false).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // 索引的读改写周期被串行化，并发删除不丢记录
        assert_eq!(engine.list().await.unwrap().len(), 6);
        assert_eq!(engine.index.snapshot().await.len(), 6);
    }
}
