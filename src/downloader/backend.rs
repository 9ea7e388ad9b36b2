use async_trait::async_trait;
use std::path::PathBuf;

use super::error::DownloadError;
use super::progress::ProgressTracker;
use crate::common::models::MediaFormat;

/// 交给下载后端的一次抓取任务
#[derive(Debug, Clone)]
pub struct FetchJob {
    pub url: String,
    pub format: MediaFormat,
    pub is_playlist: bool,
    pub work_dir: PathBuf, // 本次请求专用的输出目录
}

#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub title: Option<String>, // 视频标题或播放列表标题
    pub files: Vec<PathBuf>,   // 后端报告的最终文件
    pub skipped: usize,        // 播放列表中失败被跳过的条目
}

/// 外部下载库的接缝，生产环境是 yt-dlp，测试里可以换成假实现
#[async_trait]
pub trait MediaBackend: Send + Sync {
    async fn fetch(
        &self,
        job: &FetchJob,
        progress: &mut ProgressTracker,
    ) -> Result<FetchOutcome, DownloadError>;
}
