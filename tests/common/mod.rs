#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use ytdl::downloader::backend::{FetchJob, FetchOutcome, MediaBackend};
use ytdl::downloader::error::DownloadError;
use ytdl::downloader::progress::{ProgressTracker, RawProgress};

/// 不联网的假后端：按脚本写出文件并报告进度
pub struct FakeBackend {
    pub title: String,
    pub items: Vec<String>,
    pub extension: Option<String>, // 覆盖输出扩展名，用来模拟格式错误
    pub failure: Option<String>,   // 模拟 yt-dlp 报错
    pub delay: Duration,
    pub calls: AtomicUsize,
}

impl FakeBackend {
    pub fn single(title: &str) -> Self {
        Self {
            title: title.to_string(),
            items: vec![title.to_string()],
            extension: None,
            failure: None,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn playlist(title: &str, items: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            items: items.iter().map(|s| s.to_string()).collect(),
            ..Self::single(title)
        }
    }

    pub fn with_extension(mut self, ext: &str) -> Self {
        self.extension = Some(ext.to_string());
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaBackend for FakeBackend {
    async fn fetch(
        &self,
        job: &FetchJob,
        progress: &mut ProgressTracker,
    ) -> Result<FetchOutcome, DownloadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if let Some(message) = &self.failure {
            return Err(ytdl::downloader::ytdlp_errors::to_download_error(message, Some(1)));
        }

        let ext = self
            .extension
            .clone()
            .unwrap_or_else(|| job.format.extension().to_string());
        let count = self.items.len() as u32;
        let mut files = Vec::new();

        for (i, item) in self.items.iter().enumerate() {
            let index = i as u32 + 1;
            let name = if job.is_playlist {
                format!("{:03} - {}.{}", index, item, ext)
            } else {
                format!("{}.{}", item, ext)
            };

            for (done, total) in [(0u64, 1000u64), (400, 1000), (100, 1000), (1000, 1000)] {
                let raw = RawProgress::new(done, total);
                progress.observe(if job.is_playlist { raw.with_item(index, count) } else { raw });
            }

            let path = job.work_dir.join(name);
            tokio::fs::write(&path, format!("media:{}", item)).await?;
            files.push(path);
        }

        Ok(FetchOutcome {
            title: Some(self.title.clone()),
            files,
            skipped: 0,
        })
    }
}
