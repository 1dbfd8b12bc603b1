//! 回收站模块
//!
//! 提供软删除能力：删除的条目先移入回收站命名空间并记录来源，
//! 可以还原到原位置；永久删除不可恢复。
//!
//! # 主要功能
//! - **软删除**：物理移动 + 来源索引，删除可逆
//! - **永久删除**：递归清除，索引同步清理
//! - **还原**：优先原路径，父目录缺失回退沙箱根，冲突追加后缀
//! - **容错列表**：物理条目与索引记录脱节时不崩溃、不隐藏
//!
//! # 磁盘布局
//! ```text
//! data/files/.trash/
//!   ├── .index.json                  # 槽位 ID → 来源记录
//!   ├── 1714000000000-notes.txt      # 被软删除的条目
//!   └── 1714000012345-photos         # 目录同样整体移入
//! ```

// 模块子模块
pub mod types;          // 类型定义
pub mod errors;         // 错误定义
pub mod index;          // 索引持久化
pub mod engine;         // 状态编排

// 重新导出主要类型
pub use types::{ItemType, TrashEntry, TrashListEntry, UNKNOWN_ORIGIN};

pub use errors::{TrashError, TrashResult};

pub use index::TrashIndexStore;

pub use engine::{DeleteOutcome, RestoreOutcome, TrashEngine};
