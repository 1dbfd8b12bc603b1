//! 回收站模块类型定义
//!
//! 提供回收站条目、列表条目与槽位 ID 相关的类型与工具函数

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::sandbox::FileDescriptor;

/// 条目类型
///
/// 区分文件与目录，序列化为 `file` / `folder`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    /// 普通文件
    File,
    /// 目录
    Folder,
}

impl ItemType {
    /// 从目录标志构建
    pub fn from_is_directory(is_directory: bool) -> Self {
        if is_directory {
            ItemType::Folder
        } else {
            ItemType::File
        }
    }

    /// 接口响应中使用的字符串表示
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::File => "file",
            ItemType::Folder => "folder",
        }
    }
}

/// 回收站条目（持久化于索引文件）
///
/// 记录一次软删除的来源信息，键为槽位 ID。
/// 删除时刻快照的元数据在物理移动后不再能从原路径取得，
/// 因此必须在移动前捕获。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrashEntry {
    /// 删除前的绝对路径
    pub original_path: PathBuf,

    /// 删除前的名称（basename）
    pub original_name: String,

    /// 软删除时刻
    pub deleted_at: DateTime<Utc>,

    /// 删除时刻的大小快照（字节），目录为 0
    pub size: u64,

    /// 条目类型快照
    #[serde(rename = "type")]
    pub item_type: ItemType,
}

/// 回收站列表条目（接口返回）
///
/// 文件描述符展开后附加来源信息；没有索引记录的孤儿条目
/// 以 `Unknown` 标注来源，仍然会被列出。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrashListEntry {
    /// 物理条目的实时元数据；有索引记录时 `name` 覆盖为原始名称
    #[serde(flatten)]
    pub descriptor: FileDescriptor,

    /// 删除前的绝对路径，未知时为 `Unknown`
    pub original_path: String,

    /// 软删除时刻，孤儿条目没有该信息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// 未知来源的占位值
pub const UNKNOWN_ORIGIN: &str = "Unknown";

/// 构建槽位 ID
///
/// 槽位 ID 同时是条目在回收站内的物理名称，形如
/// `{删除时刻毫秒}-{原始名称}`。同一毫秒内删除两个同名条目会
/// 发生碰撞，后写的索引记录覆盖先写的（与物理移动的覆盖行为一致）。
pub fn slot_id(deleted_at: DateTime<Utc>, base_name: &str) -> String {
    format!("{}-{}", deleted_at.timestamp_millis(), base_name)
}

/// 构建还原冲突时的改名
///
/// 在扩展名前追加 `-restored-{毫秒}`，保留扩展名
///
/// # 使用示例
/// `a.txt` → `a-restored-1714000000000.txt`
pub fn restored_name(original_name: &str, at: DateTime<Utc>) -> String {
    let millis = at.timestamp_millis();
    let path = Path::new(original_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| original_name.to_string());
    match path.extension() {
        Some(ext) => format!("{stem}-restored-{millis}.{}", ext.to_string_lossy()),
        None => format!("{stem}-restored-{millis}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_slot_id_format() {
        let at = Utc.timestamp_millis_opt(1714000000000).unwrap();
        assert_eq!(slot_id(at, "notes.txt"), "1714000000000-notes.txt");
    }

    #[test]
    fn test_restored_name_keeps_extension() {
        let at = Utc.timestamp_millis_opt(42).unwrap();
        assert_eq!(restored_name("a.txt", at), "a-restored-42.txt");
        assert_eq!(restored_name("archive.tar.gz", at), "archive.tar-restored-42.gz");
        assert_eq!(restored_name("Makefile", at), "Makefile-restored-42");
    }

    #[test]
    fn test_item_type_wire_format() {
        assert_eq!(serde_json::to_string(&ItemType::File).unwrap(), "\"file\"");
        assert_eq!(serde_json::to_string(&ItemType::Folder).unwrap(), "\"folder\"");
    }

    #[test]
    fn test_trash_entry_round_trip() {
        let entry = TrashEntry {
            original_path: PathBuf::from("/data/files/notes.txt"),
            original_name: "notes.txt".to_string(),
            deleted_at: Utc::now(),
            size: 10,
            item_type: ItemType::File,
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("originalPath").is_some());
        assert_eq!(json["type"], "file");

        let parsed: TrashEntry = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.original_name, "notes.txt");
    }
}
