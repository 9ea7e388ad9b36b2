use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use backend::{FetchJob, MediaBackend};
use error::DownloadError;
use progress::{ProgressSender, ProgressTracker};
use ytdlp::YtDlpBackend;

use crate::common::models::{DownloadRequest, DownloadResult};
use crate::config::AppConfig;
use crate::parser::detector::validate_url;
use crate::post_process::{self, archive};

pub mod backend;
pub mod error;
pub mod progress;
pub mod ytdlp;
pub mod ytdlp_errors;

/// 下载处理器：校验请求，交给后端下载，整理产出，播放列表再打包
#[derive(Clone)]
pub struct DownloadHandler {
    backend: Arc<dyn MediaBackend>,
    output_dir: PathBuf,
}

impl DownloadHandler {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_backend(
            config.output_dir.clone(),
            Arc::new(YtDlpBackend::from_config(config)),
        )
    }

    pub fn with_backend(output_dir: impl Into<PathBuf>, backend: Arc<dyn MediaBackend>) -> Self {
        Self {
            backend,
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub async fn download(
        &self,
        request: &DownloadRequest,
        progress: ProgressSender,
    ) -> Result<DownloadResult, DownloadError> {
        // 校验失败时不能有任何文件写入
        validate_url(request.url())?;

        let request_id = Uuid::new_v4().simple().to_string();
        let work_dir = std::path::absolute(self.output_dir.join(&request_id))?;
        tokio::fs::create_dir_all(&work_dir).await?;
        info!(
            "开始下载: {} [{}{}] -> {:?}",
            request.url(),
            request.format(),
            if request.is_playlist() { ", 播放列表" } else { "" },
            work_dir
        );

        let job = FetchJob {
            url: request.url().to_string(),
            format: request.format(),
            is_playlist: request.is_playlist(),
            work_dir: work_dir.clone(),
        };

        let mut tracker = ProgressTracker::new(progress);
        let result = self.run(&job, &mut tracker).await;
        match &result {
            Ok(_) => {
                tracker.finish();
            }
            Err(e) => {
                warn!("下载失败: {}", e);
                // 只会删除空目录
                let _ = tokio::fs::remove_dir(&work_dir).await;
            }
        }
        result
    }

    async fn run(
        &self,
        job: &FetchJob,
        tracker: &mut ProgressTracker,
    ) -> Result<DownloadResult, DownloadError> {
        let outcome = self.backend.fetch(job, tracker).await?;
        if outcome.skipped > 0 {
            warn!("⏭️ 已跳过 {} 个下载失败的条目", outcome.skipped);
        }

        let reported = if outcome.files.is_empty() {
            debug!("后端没有报告文件，扫描输出目录");
            post_process::scan_media_files(&job.work_dir).await?
        } else {
            outcome.files
        };
        let file_paths = post_process::collect_outputs(job.format, job.is_playlist, reported)?;

        let title = outcome
            .title
            .or_else(|| {
                file_paths
                    .first()
                    .and_then(|p| p.file_stem())
                    .map(|s| s.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "download".to_string());

        let archive_path = if job.is_playlist {
            let path = job
                .work_dir
                .join(format!("{}.zip", archive::sanitize_file_name(&title)));
            archive::bundle(&file_paths, &path).await?;
            Some(path)
        } else {
            None
        };

        info!("✅ 下载完成: {} ({} 个文件)", title, file_paths.len());
        Ok(DownloadResult {
            title,
            format: job.format,
            file_paths,
            archive_path,
        })
    }
}
