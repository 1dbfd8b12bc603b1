//! 文件分类模块
//!
//! 提供静态的「扩展名 → 分类」规则表，所有分类查询均基于此表。
//! 规则表是纯静态配置，不读取文件系统。
//!
//! # 使用示例
//! ```rust
//! use panbox::category::classify;
//!
//! assert_eq!(classify(".png"), "images");
//! assert_eq!(classify(".xyz"), "other");
//! ```

use std::collections::HashMap;

/// 未匹配任何规则时的默认分类
pub const CATEGORY_OTHER: &str = "other";

/// 分类规则表
///
/// 每一项为（分类名，扩展名列表），扩展名均为小写且带点。
pub const CATEGORY_RULES: &[(&str, &[&str])] = &[
    ("images", &[".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp", ".bmp"]),
    ("documents", &[".pdf", ".doc", ".docx", ".txt", ".md", ".rtf", ".odt"]),
    ("videos", &[".mp4", ".avi", ".mov", ".wmv", ".flv", ".mkv", ".webm"]),
    ("audio", &[".mp3", ".wav", ".ogg", ".m4a", ".flac", ".aac"]),
    ("code", &[".js", ".ts", ".jsx", ".tsx", ".py", ".java", ".cpp", ".c", ".go", ".rs"]),
    ("compressed", &[".zip", ".rar", ".7z", ".tar", ".gz"]),
    ("spreadsheets", &[".xlsx", ".xls", ".csv", ".ods"]),
];

/// 根据扩展名查找分类
///
/// # 参数说明
/// * `extension` - 带点的小写扩展名（如 `.png`），空字符串表示无扩展名
///
/// # 返回值
/// 匹配的分类名，未匹配返回 `other`
pub fn classify(extension: &str) -> &'static str {
    for (category, extensions) in CATEGORY_RULES {
        if extensions.contains(&extension) {
            return category;
        }
    }
    CATEGORY_OTHER
}

/// 以 JSON 友好的映射形式返回完整规则表
///
/// 用于 `GET /api/categories/rules` 接口
pub fn rules_map() -> HashMap<&'static str, Vec<&'static str>> {
    CATEGORY_RULES
        .iter()
        .map(|(category, extensions)| (*category, extensions.to_vec()))
        .collect()
}

/// 分类名首字母大写，作为自动归档的目录名
///
/// 上传文件会被移动到以分类命名的目录下（如 `images` → `Images`）
pub fn folder_name(category: &str) -> String {
    let mut chars = category.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
