use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::common::models::{DownloadRequest, DownloadResult, MediaFormat, ProgressUpdate};
use crate::downloader::DownloadHandler;
use crate::downloader::error::{DownloadError, ErrorKind};
use crate::downloader::progress::progress_channel;
use crate::ui::state::{InvalidTransition, RequestState, UiEvent};

#[derive(Debug, Clone, Serialize)]
pub struct JobError {
    pub kind: ErrorKind,
    pub message: String,
    pub details: Option<String>,
}

impl From<&DownloadError> for JobError {
    fn from(error: &DownloadError) -> Self {
        Self {
            kind: error.kind(),
            message: error.user_message(),
            details: error.details().map(str::to_string),
        }
    }
}

/// 网页端的一次下载
#[derive(Debug)]
pub struct Job {
    pub id: Uuid,
    pub request: DownloadRequest,
    pub state: RequestState,
    pub progress: Option<ProgressUpdate>,
    pub result: Option<DownloadResult>,
    pub error: Option<JobError>,
}

/// 返回给前端的任务快照
#[derive(Debug, Clone, Serialize)]
pub struct JobView {
    pub id: Uuid,
    pub state: RequestState,
    pub url: String,
    pub format: MediaFormat,
    pub is_playlist: bool,
    pub progress: Option<ProgressUpdate>,
    pub error: Option<JobError>,
    pub title: Option<String>,
    pub file_name: Option<String>,
    pub file_count: usize,
}

impl Job {
    pub fn apply(&mut self, event: UiEvent) -> Result<RequestState, InvalidTransition> {
        self.state = self.state.next(event)?;
        Ok(self.state)
    }

    /// 状态转换失败只记日志
    fn transition(&mut self, event: UiEvent) {
        if let Err(e) = self.apply(event) {
            warn!("任务 {}: {}", self.id, e);
        }
    }

    pub fn view(&self) -> JobView {
        JobView {
            id: self.id,
            state: self.state,
            url: self.request.url().to_string(),
            format: self.request.format(),
            is_playlist: self.request.is_playlist(),
            progress: self.progress,
            error: self.error.clone(),
            title: self.result.as_ref().map(|r| r.title.clone()),
            file_name: self.result.as_ref().map(DownloadResult::deliverable_file_name),
            file_count: self.result.as_ref().map_or(0, |r| r.file_paths.len()),
        }
    }
}

/// 内存中的任务表，不做持久化
#[derive(Clone, Default)]
pub struct JobTable {
    jobs: Arc<DashMap<Uuid, Arc<Mutex<Job>>>>, // job_id -> Job
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新建任务，状态为 Requested
    pub fn insert(&self, request: DownloadRequest) -> (Uuid, Arc<Mutex<Job>>) {
        let id = Uuid::new_v4();
        let job = Arc::new(Mutex::new(Job {
            id,
            request,
            state: RequestState::Idle.next(UiEvent::Submit).unwrap_or(RequestState::Requested),
            progress: None,
            result: None,
            error: None,
        }));
        self.jobs.insert(id, Arc::clone(&job));
        (id, job)
    }

    pub fn get(&self, id: &Uuid) -> Option<Arc<Mutex<Job>>> {
        self.jobs.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn remove(&self, id: &Uuid) -> Option<Arc<Mutex<Job>>> {
        self.jobs.remove(id).map(|(_, job)| job)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// 在后台执行下载，并把进度和结果写回任务
pub fn spawn_download(handler: Arc<DownloadHandler>, job: Arc<Mutex<Job>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let (id, request) = {
            let mut guard = job.lock().await;
            guard.transition(UiEvent::Start);
            (guard.id, guard.request.clone())
        };
        info!("任务 {} 开始: {}", id, request.url());

        let (tx, mut rx) = progress_channel();
        let pump_job = Arc::clone(&job);
        let pump = tokio::spawn(async move {
            while let Some(update) = rx.recv().await {
                pump_job.lock().await.progress = Some(update);
            }
        });

        let result = handler.download(&request, tx).await;
        // 发送端随下载结束一起释放，进度泵会自然退出
        let _ = pump.await;

        let mut guard = job.lock().await;
        match result {
            Ok(result) => {
                guard.result = Some(result);
                guard.transition(UiEvent::Succeed);
                info!("任务 {} 完成", id);
            }
            Err(e) => {
                guard.error = Some(JobError::from(&e));
                guard.transition(UiEvent::Fail);
                warn!("任务 {} 失败: {}", id, e);
            }
        }
    })
}
