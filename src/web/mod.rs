//! Web 接口模块
//!
//! 提供文件管理器的 HTTP API。路由、参数提取与响应序列化在此完成，
//! 业务语义全部委托给 sandbox / trash / recent / starred 模块。
//!
//! # 状态码约定
//! - 400：缺少必填参数或名称非法
//! - 403：路径越出沙箱 / 还原目标不在回收站内
//! - 404：目标路径或回收站元数据不存在
//! - 500：底层文件系统错误
//!
//! 所有失败响应的消息体统一为 `{ "error": message }`。

use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::category;
use crate::recent::RecentTracker;
use crate::sandbox::{FsService, SandboxError};
use crate::starred::StarredStore;
use crate::trash::{TrashEngine, TrashError};

// ==================== 类型定义 ====================

/// Web 服务器状态
#[derive(Clone)]
pub struct WebState {
    /// 沙箱文件服务
    pub fs: Arc<FsService>,
    /// 回收站引擎
    pub trash: Arc<TrashEngine>,
    /// 最近访问追踪器
    pub recent: Arc<RecentTracker>,
    /// 收藏存储
    pub starred: Arc<StarredStore>,
}

/// 带路径的查询参数
#[derive(Debug, Deserialize)]
pub struct PathQuery {
    pub path: Option<String>,
}

/// 移动请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub source_path: Option<String>,
    pub destination_path: Option<String>,
}

/// 重命名请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameRequest {
    pub file_path: Option<String>,
    pub new_name: Option<String>,
}

/// 创建目录请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderRequest {
    pub folder_path: Option<String>,
}

/// 删除请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    pub file_path: Option<String>,
    /// 为 true 时跳过回收站直接删除
    #[serde(default)]
    pub permanent: bool,
}

/// 还原请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreRequest {
    pub file_path: Option<String>,
}

/// 收藏请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StarRequest {
    pub file_path: Option<String>,
}

/// 统一的失败响应
type ApiError = (StatusCode, Json<JsonValue>);

/// 处理器结果类型
type ApiResult = Result<Json<JsonValue>, ApiError>;

// ==================== 错误映射 ====================

/// 缺少必填参数的 400 响应
fn missing_param(field: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": format!("缺少必填参数: {field}") })),
    )
}

/// 沙箱错误 → 状态码
fn sandbox_status(e: &SandboxError) -> StatusCode {
    match e {
        SandboxError::MissingPath { .. } | SandboxError::InvalidName { .. } => {
            StatusCode::BAD_REQUEST
        }
        SandboxError::NotADirectory { .. } => StatusCode::BAD_REQUEST,
        SandboxError::AccessDenied { .. } => StatusCode::FORBIDDEN,
        SandboxError::NotFound { .. } => StatusCode::NOT_FOUND,
        SandboxError::IoError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// 回收站错误 → 状态码
fn trash_status(e: &TrashError) -> StatusCode {
    match e {
        TrashError::Sandbox(inner) => sandbox_status(inner),
        TrashError::OutsideTrash { .. } => StatusCode::FORBIDDEN,
        TrashError::MetadataMissing { .. } | TrashError::NotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        TrashError::IoError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<SandboxError> for ApiErrorWrapper {
    fn from(e: SandboxError) -> Self {
        if e.is_security_error() {
            warn!(error = %e, "安全相关请求被拒绝");
        }
        ApiErrorWrapper((sandbox_status(&e), Json(json!({ "error": e.to_string() }))))
    }
}

impl From<TrashError> for ApiErrorWrapper {
    fn from(e: TrashError) -> Self {
        if e.is_security_error() {
            warn!(error = %e, "安全相关请求被拒绝");
        }
        ApiErrorWrapper((trash_status(&e), Json(json!({ "error": e.to_string() }))))
    }
}

/// 错误包装，便于在处理器里用 `?` 统一转换
struct ApiErrorWrapper(ApiError);

impl From<ApiErrorWrapper> for ApiError {
    fn from(w: ApiErrorWrapper) -> Self {
        w.0
    }
}

fn map_err<E>(e: E) -> ApiError
where
    E: Into<ApiErrorWrapper>,
{
    e.into().0
}

// ==================== 路由处理器 ====================

/// 列出目录内容
async fn api_list_files(
    State(state): State<WebState>,
    Query(query): Query<PathQuery>,
) -> ApiResult {
    let path = query.path.unwrap_or_default();
    let (current_path, files) = state.fs.list_dir(&path).await.map_err(map_err)?;

    Ok(Json(json!({
        "currentPath": current_path,
        "files": files,
        "total": files.len(),
    })))
}

/// 读取单个文件元数据，同时记入最近访问
async fn api_file_metadata(
    State(state): State<WebState>,
    Query(query): Query<PathQuery>,
) -> ApiResult {
    let path = query.path.ok_or_else(|| missing_param("path"))?;
    let descriptor = state.fs.describe(&path).await.map_err(map_err)?;

    // 目录浏览不算访问，文件才进入最近访问列表
    if !descriptor.is_directory {
        state.recent.touch(descriptor.clone()).await;
    }

    Ok(Json(json!(descriptor)))
}

/// 目录分类统计
async fn api_categorize(
    State(state): State<WebState>,
    Query(query): Query<PathQuery>,
) -> ApiResult {
    let path = query.path.unwrap_or_default();
    let summary = state.fs.categorize(&path).await.map_err(map_err)?;
    Ok(Json(json!(summary)))
}

/// 分类规则表
async fn api_category_rules() -> Json<JsonValue> {
    Json(json!(category::rules_map()))
}

/// 移动文件或目录
async fn api_move_file(
    State(state): State<WebState>,
    Json(req): Json<MoveRequest>,
) -> ApiResult {
    let source = req.source_path.ok_or_else(|| missing_param("sourcePath"))?;
    let destination = req
        .destination_path
        .ok_or_else(|| missing_param("destinationPath"))?;

    let new_path = state
        .fs
        .move_item(&source, &destination)
        .await
        .map_err(map_err)?;

    Ok(Json(json!({ "success": true, "newPath": new_path })))
}

/// 重命名文件或目录
async fn api_rename_file(
    State(state): State<WebState>,
    Json(req): Json<RenameRequest>,
) -> ApiResult {
    let file_path = req.file_path.ok_or_else(|| missing_param("filePath"))?;
    let new_name = req.new_name.ok_or_else(|| missing_param("newName"))?;

    let new_path = state
        .fs
        .rename_item(&file_path, &new_name)
        .await
        .map_err(map_err)?;

    Ok(Json(json!({ "success": true, "newPath": new_path })))
}

/// 创建目录
async fn api_create_folder(
    State(state): State<WebState>,
    Json(req): Json<FolderRequest>,
) -> ApiResult {
    let folder_path = req.folder_path.ok_or_else(|| missing_param("folderPath"))?;
    let path = state.fs.create_dir(&folder_path).await.map_err(map_err)?;
    Ok(Json(json!({ "success": true, "path": path })))
}

/// 上传文件并按分类归档
async fn api_upload_file(
    State(state): State<WebState>,
    mut multipart: Multipart,
) -> ApiResult {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": format!("上传内容解析失败: {e}") })),
        )
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = match field.file_name() {
            Some(name) => name.to_string(),
            None => return Err(missing_param("file")),
        };
        let content = field.bytes().await.map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("读取上传内容失败: {e}") })),
            )
        })?;

        let outcome = state
            .fs
            .place_upload(&file_name, &content)
            .await
            .map_err(map_err)?;

        return Ok(Json(json!({
            "success": true,
            "file": outcome.file,
            "category": outcome.category,
            "message": format!("文件已归档到 {} 目录", outcome.folder),
        })));
    }

    Err(missing_param("file"))
}

/// 删除（软删除或永久删除）
async fn api_delete_file(
    State(state): State<WebState>,
    Json(req): Json<DeleteRequest>,
) -> ApiResult {
    let file_path = req.file_path.ok_or_else(|| missing_param("filePath"))?;

    let outcome = state
        .trash
        .delete(&file_path, req.permanent)
        .await
        .map_err(map_err)?;

    Ok(Json(json!({
        "success": true,
        "message": outcome.message,
        "itemType": outcome.item_type.as_str(),
    })))
}

/// 从回收站还原
async fn api_restore_file(
    State(state): State<WebState>,
    Json(req): Json<RestoreRequest>,
) -> ApiResult {
    let file_path = req.file_path.ok_or_else(|| missing_param("filePath"))?;

    let outcome = state.trash.restore(&file_path).await.map_err(map_err)?;

    Ok(Json(json!({
        "success": true,
        "message": outcome.message,
        "newPath": outcome.new_path,
    })))
}

/// 列出回收站内容
async fn api_list_trash(State(state): State<WebState>) -> ApiResult {
    let files = state.trash.list().await.map_err(map_err)?;
    Ok(Json(json!({ "files": files, "total": files.len() })))
}

/// 最近访问列表
async fn api_recent_files(State(state): State<WebState>) -> Json<JsonValue> {
    let files = state.recent.list().await;
    Json(json!({ "files": files, "total": files.len() }))
}

/// 收藏
async fn api_star_file(
    State(state): State<WebState>,
    Json(req): Json<StarRequest>,
) -> ApiResult {
    let file_path = req.file_path.ok_or_else(|| missing_param("filePath"))?;
    state.starred.star(&file_path).await.map_err(map_err)?;
    Ok(Json(json!({ "success": true })))
}

/// 取消收藏
async fn api_unstar_file(
    State(state): State<WebState>,
    Json(req): Json<StarRequest>,
) -> ApiResult {
    let file_path = req.file_path.ok_or_else(|| missing_param("filePath"))?;
    state.starred.unstar(&file_path).await.map_err(map_err)?;
    Ok(Json(json!({ "success": true })))
}

/// 收藏列表（读取时过滤已失效路径）
async fn api_starred_files(State(state): State<WebState>) -> ApiResult {
    let files = state.starred.list_valid().await.map_err(map_err)?;
    Ok(Json(json!({ "files": files, "total": files.len() })))
}

/// 健康检查
async fn api_health() -> Json<JsonValue> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

// ==================== Web 服务器 ====================

/// Web 服务器
#[derive(Clone)]
pub struct WebServer {
    /// 服务器端口
    port: u16,
    /// 服务器状态
    state: WebState,
}

impl WebServer {
    /// 创建新的 Web 服务器
    pub fn new(port: u16, state: WebState) -> Self {
        Self { port, state }
    }

    /// 获取状态
    pub fn state(&self) -> &WebState {
        &self.state
    }

    /// 创建 Axum 路由
    pub fn create_router(&self) -> Router {
        Router::new()
            // API - 浏览与元数据
            .route("/api/files", get(api_list_files))
            .route("/api/files/metadata", get(api_file_metadata))
            .route("/api/files/categorize", get(api_categorize))
            .route("/api/categories/rules", get(api_category_rules))
            // API - 变更操作
            .route("/api/files/move", post(api_move_file))
            .route("/api/files/rename", post(api_rename_file))
            .route("/api/files/folder", post(api_create_folder))
            .route("/api/files/upload", post(api_upload_file))
            // API - 回收站
            .route("/api/files/delete", delete(api_delete_file))
            .route("/api/files/restore", post(api_restore_file))
            .route("/api/files/trash", get(api_list_trash))
            // API - 最近访问与收藏
            .route("/api/files/recent", get(api_recent_files))
            .route("/api/files/star", post(api_star_file).delete(api_unstar_file))
            .route("/api/files/starred", get(api_starred_files))
            // 健康检查
            .route("/api/health", get(api_health))
            .with_state(self.state.clone())
    }

    /// 启动服务器
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error>> {
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.port));
        info!(port = self.port, "启动文件管理接口");

        let router = self.create_router();

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).await.map_err(|e| {
            error!(error = %e, "HTTP 服务异常退出");
            Box::new(e) as Box<dyn std::error::Error>
        })
    }
}
