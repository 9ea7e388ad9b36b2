use axum::{
    Json,
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tracing::{debug, error};
use uuid::Uuid;

use super::jobs::spawn_download;
use super::page::render_index;
use super::server::AppState;
use crate::common::models::{DownloadRequest, MediaFormat};
use crate::parser::detector::validate_url;
use crate::ui::state::{RequestState, UiEvent};

#[derive(Debug, Deserialize)]
pub struct CreateDownload {
    #[serde(default)] // 缺省按空链接处理，返回 400
    pub url: String,
    #[serde(default)]
    pub format: MediaFormat,
    pub playlist: Option<bool>, // 不传则根据链接判断
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// GET / — 下载页面
pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_index(&state.ui))
}

/// GET /health
pub async fn health() -> &'static str {
    "ok"
}

/// POST /api/downloads — 校验后在后台开始下载
pub async fn create_download(
    State(state): State<AppState>,
    Json(body): Json<CreateDownload>,
) -> Response {
    if let Err(e) = validate_url(&body.url) {
        debug!("拒绝无效请求: {}", e);
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": e.user_message(), "kind": e.kind() })),
        )
            .into_response();
    }

    let request = match body.playlist {
        Some(is_playlist) => DownloadRequest::new(body.url, body.format, is_playlist),
        None => DownloadRequest::detect(body.url, body.format),
    };
    let (id, job) = state.jobs.insert(request);
    spawn_download(Arc::clone(&state.handler), job);

    (StatusCode::ACCEPTED, Json(json!({ "id": id }))).into_response()
}

/// GET /api/downloads/{id} — 状态与进度
pub async fn download_status(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.jobs.get(&id) {
        Some(job) => Json(job.lock().await.view()).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "任务不存在"),
    }
}

/// GET /api/downloads/{id}/file — 保存文件，播放列表返回 zip
pub async fn download_file(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    let Some(job) = state.jobs.get(&id) else {
        return error_response(StatusCode::NOT_FOUND, "任务不存在");
    };

    let mut guard = job.lock().await;
    let Some(result) = guard.result.clone() else {
        return error_response(StatusCode::CONFLICT, "下载尚未完成");
    };
    let Some(path) = result.deliverable() else {
        return error_response(StatusCode::CONFLICT, "没有可保存的文件");
    };

    let file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(e) => {
            error!("打开文件失败 {:?}: {}", path, e);
            return error_response(StatusCode::GONE, "文件已不存在");
        }
    };

    // 保存后回到 Idle，任务从表中移除，已打开的文件照常传输
    let saved = guard.state == RequestState::Completed && guard.apply(UiEvent::Save).is_ok();
    drop(guard);
    if saved {
        state.jobs.remove(&id);
        debug!("任务 {} 已保存并移除", id);
    }

    let file_name = result.deliverable_file_name();
    let body = Body::from_stream(ReaderStream::new(file));
    (
        [
            (header::CONTENT_TYPE, result.deliverable_mime().to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(&file_name)),
        ],
        body,
    )
        .into_response()
}

/// DELETE /api/downloads/{id} — 关闭结果或确认错误
pub async fn dismiss_download(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    let Some(job) = state.jobs.get(&id) else {
        return error_response(StatusCode::NOT_FOUND, "任务不存在");
    };

    {
        let mut guard = job.lock().await;
        match guard.state {
            // 不支持取消
            RequestState::Requested | RequestState::InProgress => {
                return error_response(StatusCode::CONFLICT, "下载进行中，无法关闭");
            }
            RequestState::Completed => {
                let _ = guard.apply(UiEvent::Dismiss);
            }
            RequestState::Failed => {
                let _ = guard.apply(UiEvent::Acknowledge);
            }
            RequestState::Idle => {}
        }
    }

    state.jobs.remove(&id);
    StatusCode::NO_CONTENT.into_response()
}

/// 非 ASCII 文件名走 RFC 5987 的 filename*
pub fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| if c.is_ascii_graphic() || c == ' ' { c } else { '_' })
        .map(|c| if matches!(c, '"' | '\\') { '_' } else { c })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(file_name)
    )
}
