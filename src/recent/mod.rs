//! 最近访问模块
//!
//! 维护一份进程内的最近访问文件列表：最多 20 条、最近访问在前、
//! 按路径去重（重复访问移到队首而非追加）。列表不落盘，重启即清空。

use std::path::Path;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::sandbox::FileDescriptor;

/// 最近访问列表的容量上限
pub const RECENT_CAPACITY: usize = 20;

/// 最近访问条目
///
/// 访问时刻的描述符快照加访问时间
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentEntry {
    /// 访问时刻的文件描述符快照
    #[serde(flatten)]
    pub descriptor: FileDescriptor,

    /// 访问时刻
    pub accessed_at: DateTime<Utc>,
}

/// 最近访问追踪器
///
/// 进程内全局唯一，由 Web 层在文件被访问时调用 `touch`，
/// 由回收站引擎在删除时调用 `evict`
#[derive(Debug, Default)]
pub struct RecentTracker {
    /// 最近访问条目，队首为最新
    entries: Mutex<Vec<RecentEntry>>,
}

impl RecentTracker {
    /// 创建追踪器
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次文件访问
    ///
    /// 同一路径的旧记录被移除后插入队首；超出容量时淘汰队尾
    pub async fn touch(&self, descriptor: FileDescriptor) {
        let mut entries = self.entries.lock().await;
        entries.retain(|entry| entry.descriptor.path != descriptor.path);
        entries.insert(
            0,
            RecentEntry {
                descriptor,
                accessed_at: Utc::now(),
            },
        );
        entries.truncate(RECENT_CAPACITY);
    }

    /// 移除指定路径的记录
    ///
    /// 文件被删除或移入回收站后调用，属于尽力而为的通知
    pub async fn evict(&self, path: &Path) {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|entry| entry.descriptor.path != path);
        if entries.len() != before {
            debug!(path = %path.display(), "最近访问记录已移除");
        }
    }

    /// 返回当前列表（最近访问在前）
    pub async fn list(&self) -> Vec<RecentEntry> {
        self.entries.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn descriptor(name: &str) -> FileDescriptor {
        FileDescriptor {
            name: name.to_string(),
            path: PathBuf::from("/data/files").join(name),
            size: 1,
            is_directory: false,
            modified: Utc::now(),
            created: Utc::now(),
            extension: ".txt".to_string(),
            category: "documents".to_string(),
            mode: "644".to_string(),
        }
    }

    #[tokio::test]
    async fn test_touch_orders_most_recent_first() {
        let tracker = RecentTracker::new();
        tracker.touch(descriptor("a.txt")).await;
        tracker.touch(descriptor("b.txt")).await;

        let list = tracker.list().await;
        assert_eq!(list[0].descriptor.name, "b.txt");
        assert_eq!(list[1].descriptor.name, "a.txt");
    }

    #[tokio::test]
    async fn test_touch_deduplicates_by_path() {
        let tracker = RecentTracker::new();
        tracker.touch(descriptor("a.txt")).await;
        tracker.touch(descriptor("b.txt")).await;
        tracker.touch(descriptor("a.txt")).await;

        let list = tracker.list().await;
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].descriptor.name, "a.txt");
    }

    #[tokio::test]
    async fn test_capacity_capped() {
        let tracker = RecentTracker::new();
        for i in 0..25 {
            tracker.touch(descriptor(&format!("f{i}.txt"))).await;
        }

        let list = tracker.list().await;
        assert_eq!(list.len(), RECENT_CAPACITY);
        assert_eq!(list[0].descriptor.name, "f24.txt");
    }

    #[tokio::test]
    async fn test_evict_removes_entry() {
        let tracker = RecentTracker::new();
        tracker.touch(descriptor("a.txt")).await;
        tracker.evict(&PathBuf::from("/data/files/a.txt")).await;
        assert!(tracker.list().await.is_empty());
    }
}
