//! 回收站索引存储
//!
//! 将「槽位 ID → 回收站条目」映射持久化为回收站目录内的单个
//! JSON 文档（pretty 格式）。
//!
//! # 设计要点
//! - **容错加载**：索引文件缺失按空索引处理（首次运行）；
//!   内容损坏时记录 warn 后按空索引处理，绝不 panic
//! - **原子写入**：先写临时文件再 rename，避免写一半崩溃
//!   留下损坏的索引
//! - **进程内串行**：load→修改→save 周期由一把 Mutex 保护，
//!   并发软删除不会互相丢失索引记录；跨进程竞争不在防护范围内

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::trash::types::TrashEntry;

/// 索引文件名（隐藏条目，列表时跳过）
pub const INDEX_FILE_NAME: &str = ".index.json";

/// 回收站索引存储
///
/// 回收站引擎独占持有，其他组件不读写索引文件
#[derive(Debug)]
pub struct TrashIndexStore {
    /// 索引文件路径
    index_path: PathBuf,

    /// 保护 load→修改→save 周期的互斥锁
    lock: Mutex<()>,
}

impl TrashIndexStore {
    /// 创建索引存储
    ///
    /// # 参数说明
    /// * `trash_dir` - 回收站目录
    pub fn new(trash_dir: &Path) -> Self {
        Self {
            index_path: trash_dir.join(INDEX_FILE_NAME),
            lock: Mutex::new(()),
        }
    }

    /// 索引文件路径
    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// 读取整个索引
    ///
    /// 文件缺失或损坏都返回空映射，不返回错误
    pub async fn snapshot(&self) -> HashMap<String, TrashEntry> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    /// 查询单个槽位
    pub async fn get(&self, slot: &str) -> Option<TrashEntry> {
        let _guard = self.lock.lock().await;
        self.load().await.remove(slot)
    }

    /// 写入或覆盖一个槽位
    ///
    /// 同一毫秒内删除同名条目会产生相同槽位 ID，后写覆盖先写
    pub async fn upsert(&self, slot: String, entry: TrashEntry) -> std::io::Result<()> {
        let _guard = self.lock.lock().await;
        let mut index = self.load().await;
        index.insert(slot, entry);
        self.save(&index).await
    }

    /// 删除一个槽位
    ///
    /// # 返回值
    /// 被删除的条目；槽位不存在返回 None 且不触发写入
    pub async fn remove(&self, slot: &str) -> std::io::Result<Option<TrashEntry>> {
        let _guard = self.lock.lock().await;
        let mut index = self.load().await;
        let removed = index.remove(slot);
        if removed.is_some() {
            self.save(&index).await?;
        }
        Ok(removed)
    }

    /// 从磁盘加载索引（调用方必须已持有锁）
    async fn load(&self) -> HashMap<String, TrashEntry> {
        let content = match tokio::fs::read_to_string(&self.index_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.index_path.display(), "索引文件不存在，视为空索引");
                return HashMap::new();
            }
            Err(e) => {
                warn!(
                    path = %self.index_path.display(),
                    error = %e,
                    "读取索引文件失败，按空索引处理"
                );
                return HashMap::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(index) => index,
            Err(e) => {
                warn!(
                    path = %self.index_path.display(),
                    error = %e,
                    "索引文件内容损坏，按空索引处理"
                );
                HashMap::new()
            }
        }
    }

    /// 全量重写索引（调用方必须已持有锁）
    ///
    /// 先写临时文件，再原子 rename 到目标路径
    async fn save(&self, index: &HashMap<String, TrashEntry>) -> std::io::Result<()> {
        let content = serde_json::to_string_pretty(index)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        let tmp_path = self.index_path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, content).await?;
        tokio::fs::rename(&tmp_path, &self.index_path).await?;

        debug!(
            path = %self.index_path.display(),
            entries = index.len(),
            "索引已写入"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trash::types::ItemType;
    use chrono::Utc;
    use tempfile::TempDir;

    fn entry(name: &str) -> TrashEntry {
        TrashEntry {
            original_path: PathBuf::from("/data/files").join(name),
            original_name: name.to_string(),
            deleted_at: Utc::now(),
            size: 1,
            item_type: ItemType::File,
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_index() {
        let temp = TempDir::new().unwrap();
        let store = TrashIndexStore::new(temp.path());
        assert!(store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_empty_index() {
        let temp = TempDir::new().unwrap();
        let store = TrashIndexStore::new(temp.path());
        tokio::fs::write(store.index_path(), b"{not json")
            .await
            .unwrap();
        assert!(store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_and_remove() {
        let temp = TempDir::new().unwrap();
        let store = TrashIndexStore::new(temp.path());

        store.upsert("1-a.txt".to_string(), entry("a.txt")).await.unwrap();
        store.upsert("2-b.txt".to_string(), entry("b.txt")).await.unwrap();

        let index = store.snapshot().await;
        assert_eq!(index.len(), 2);

        let removed = store.remove("1-a.txt").await.unwrap();
        assert_eq!(removed.unwrap().original_name, "a.txt");
        assert!(store.remove("1-a.txt").await.unwrap().is_none());
        assert_eq!(store.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn test_save_is_pretty_json() {
        let temp = TempDir::new().unwrap();
        let store = TrashIndexStore::new(temp.path());
        store.upsert("1-a.txt".to_string(), entry("a.txt")).await.unwrap();

        let content = tokio::fs::read_to_string(store.index_path()).await.unwrap();
        assert!(content.contains('\n'));
        assert!(content.contains("originalPath"));
    }

    #[tokio::test]
    async fn test_concurrent_upserts_both_land() {
        let temp = TempDir::new().unwrap();
        let store = std::sync::Arc::new(TrashIndexStore::new(temp.path()));

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let name = format!("f{i}.txt");
                store.upsert(format!("{i}-{name}"), entry(&name)).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // 互斥锁保证并发写不会互相覆盖
        assert_eq!(store.snapshot().await.len(), 8);
    }
}
