use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::{OnceCell, mpsc};
use tracing::{debug, error, info, warn};

use super::backend::{FetchJob, FetchOutcome, MediaBackend};
use super::error::DownloadError;
use super::progress::{PROGRESS_PREFIX, ProgressTracker, RawProgress, parse_progress_line};
use super::ytdlp_errors;
use crate::common::models::MediaFormat;
use crate::config::{AppConfig, ToolConfig};

const FILE_PREFIX: &str = "ytdl-file:";
const TITLE_PREFIX: &str = "ytdl-title:";

/// yt-dlp 输出中我们关心的行
#[derive(Debug, Clone, PartialEq)]
pub enum ToolLine {
    Progress(RawProgress),
    File(PathBuf),
    Title(String),
    Other,
}

pub fn classify_line(line: &str) -> ToolLine {
    let trimmed = line.trim();
    if let Some(raw) = parse_progress_line(trimmed) {
        return ToolLine::Progress(raw);
    }
    if let Some(path) = trimmed.strip_prefix(FILE_PREFIX) {
        if !path.trim().is_empty() {
            return ToolLine::File(PathBuf::from(path.trim()));
        }
    }
    if let Some(title) = trimmed.strip_prefix(TITLE_PREFIX) {
        let title = title.trim();
        if !title.is_empty() && title != "NA" {
            return ToolLine::Title(title.to_string());
        }
    }
    ToolLine::Other
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

/// 通过子进程调用 yt-dlp
pub struct YtDlpBackend {
    ytdlp_path: PathBuf,
    ffmpeg_path: Option<PathBuf>,
    tool: ToolConfig,
    available: OnceCell<bool>,
}

impl YtDlpBackend {
    pub fn new(ytdlp_path: impl Into<PathBuf>, ffmpeg_path: Option<PathBuf>, tool: ToolConfig) -> Self {
        Self {
            ytdlp_path: ytdlp_path.into(),
            ffmpeg_path,
            tool,
            available: OnceCell::new(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.ytdlp_path.clone(),
            config.ffmpeg_path.clone(),
            config.tool.clone(),
        )
    }

    /// 组装 yt-dlp 命令行参数
    pub fn build_args(&self, job: &FetchJob) -> Vec<String> {
        let mut args: Vec<String> = Vec::new();

        match job.format {
            MediaFormat::Mp4 => args.extend([
                "-f".to_string(),
                "bv*[ext=mp4]+ba[ext=m4a]/b[ext=mp4]/bv*+ba/b".to_string(),
                "--merge-output-format".to_string(),
                "mp4".to_string(),
                "--remux-video".to_string(),
                "mp4".to_string(),
            ]),
            MediaFormat::Mp3 => args.extend([
                "-f".to_string(),
                "ba/b".to_string(),
                "-x".to_string(),
                "--audio-format".to_string(),
                "mp3".to_string(),
                "--audio-quality".to_string(),
                format!("{}K", self.tool.mp3_quality_kbps),
            ]),
        }

        let template = if job.is_playlist {
            args.extend([
                "--yes-playlist".to_string(),
                "--playlist-items".to_string(),
                format!("1-{}", self.tool.playlist_limit),
                "--ignore-errors".to_string(),
            ]);
            "%(playlist_index)03d - %(title)s.%(ext)s"
        } else {
            args.push("--no-playlist".to_string());
            "%(title)s.%(ext)s"
        };
        args.push("-o".to_string());
        args.push(job.work_dir.join(template).to_string_lossy().into_owned());

        if let Some(ffmpeg) = &self.ffmpeg_path {
            args.push("--ffmpeg-location".to_string());
            args.push(ffmpeg.to_string_lossy().into_owned());
        }

        args.extend([
            "--newline".to_string(),
            "--no-warnings".to_string(),
            "--no-overwrites".to_string(),
            "--socket-timeout".to_string(),
            self.tool.socket_timeout_secs.to_string(),
            "--retries".to_string(),
            self.tool.retries.to_string(),
            "--fragment-retries".to_string(),
            self.tool.retries.to_string(),
            // --print 会隐含 --quiet，需要显式打开进度
            "--progress".to_string(),
            "--progress-template".to_string(),
            format!(
                "download:{}%(progress.downloaded_bytes)s/%(progress.total_bytes)s/%(progress.total_bytes_estimate)s/%(info.playlist_index)s/%(info.n_entries)s",
                PROGRESS_PREFIX
            ),
            "--print".to_string(),
            format!("before_dl:{}%(playlist_title,title)s", TITLE_PREFIX),
            "--print".to_string(),
            format!("after_move:{}%(filepath)s", FILE_PREFIX),
            job.url.clone(),
        ]);
        args
    }

    /// 检查 yt-dlp 是否可用，结果只探测一次
    async fn ensure_available(&self) -> Result<(), DownloadError> {
        let available = *self
            .available
            .get_or_init(|| async {
                debug!("检查系统中是否安装了 yt-dlp: {:?}", self.ytdlp_path);
                Command::new(&self.ytdlp_path)
                    .arg("--version")
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .status()
                    .await
                    .map(|status| status.success())
                    .unwrap_or(false)
            })
            .await;

        if available {
            Ok(())
        } else {
            error!("❌ 未检测到 yt-dlp，请确保已安装或设置环境变量 YTDLP_PATH");
            Err(DownloadError::ToolNotFound(
                self.ytdlp_path.to_string_lossy().into_owned(),
            ))
        }
    }
}

fn forward_lines<R>(reader: R, stream: Stream, tx: mpsc::UnboundedSender<(Stream, String)>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send((stream, line)).is_err() {
                break;
            }
        }
    });
}

#[async_trait]
impl MediaBackend for YtDlpBackend {
    async fn fetch(
        &self,
        job: &FetchJob,
        progress: &mut ProgressTracker,
    ) -> Result<FetchOutcome, DownloadError> {
        self.ensure_available().await?;

        let args = self.build_args(job);
        debug!("yt-dlp 参数: {:?}", args);
        info!("调用 yt-dlp 下载: {} ({})", job.url, job.format);

        let mut child = Command::new(&self.ytdlp_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    DownloadError::ToolNotFound(self.ytdlp_path.to_string_lossy().into_owned())
                }
                _ => DownloadError::Io(e),
            })?;

        // 两个管道合并到同一个通道里按到达顺序处理
        let (tx, mut rx) = mpsc::unbounded_channel();
        if let Some(stdout) = child.stdout.take() {
            forward_lines(stdout, Stream::Stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            forward_lines(stderr, Stream::Stderr, tx.clone());
        }
        drop(tx);

        let mut outcome = FetchOutcome::default();
        let mut diagnostics: Vec<String> = Vec::new();
        while let Some((stream, line)) = rx.recv().await {
            match classify_line(&line) {
                ToolLine::Progress(raw) => {
                    progress.observe(raw);
                }
                ToolLine::File(path) => {
                    debug!("yt-dlp 输出文件: {:?}", path);
                    outcome.files.push(resolve_path(&job.work_dir, path));
                }
                ToolLine::Title(title) => {
                    outcome.title.get_or_insert(title);
                }
                ToolLine::Other if stream == Stream::Stderr => diagnostics.push(line),
                ToolLine::Other => debug!("yt-dlp: {}", line),
            }
        }

        let status = child.wait().await?;
        let stderr = diagnostics.join("\n");
        outcome.skipped = diagnostics
            .iter()
            .filter(|line| line.trim_start().starts_with("ERROR:"))
            .count();

        if !status.success() {
            // 播放列表开启了 --ignore-errors，只要有产出就算成功
            if job.is_playlist && !outcome.files.is_empty() {
                warn!(
                    "⏭️ 播放列表中有 {} 个条目下载失败，已跳过",
                    outcome.skipped.max(1)
                );
            } else {
                error!("❌ yt-dlp 执行失败，错误日志如下：\n{}", stderr);
                return Err(ytdlp_errors::to_download_error(&stderr, status.code()));
            }
        }

        Ok(outcome)
    }
}

fn resolve_path(work_dir: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        work_dir.join(path.file_name().map(PathBuf::from).unwrap_or(path))
    }
}
