//! 命令行交互：循环读取链接和格式，下载并显示进度

use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

use super::progress_bar::ConsoleProgress;
use super::state::{RequestMachine, UiEvent};
use crate::common::logger::PrettyLogger;
use crate::common::models::{DownloadRequest, DownloadResult, MediaFormat};
use crate::downloader::DownloadHandler;
use crate::downloader::error::DownloadError;
use crate::downloader::progress::progress_channel;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PromptSummary {
    pub completed: usize,
    pub failed: usize,
}

/// 空输入默认 MP4，`1`/`2` 对应菜单序号
pub fn parse_format_choice(input: &str) -> Option<MediaFormat> {
    match input.trim() {
        "" | "1" => Some(MediaFormat::Mp4),
        "2" => Some(MediaFormat::Mp3),
        other => other.parse().ok(),
    }
}

fn is_quit(input: &str) -> bool {
    matches!(input, "" | "q" | "quit" | "exit")
}

/// 执行单个请求并渲染进度条
pub async fn run_once(
    handler: &DownloadHandler,
    request: &DownloadRequest,
    show_progress: bool,
) -> Result<DownloadResult, DownloadError> {
    let (tx, rx) = progress_channel();
    let bar = ConsoleProgress::new(show_progress);
    let (result, received) = tokio::join!(handler.download(request, tx), bar.drain(rx));
    debug!("收到 {} 条进度更新", received);

    match &result {
        Ok(_) => bar.finish("下载完成"),
        Err(_) => bar.abandon(),
    }
    result
}

pub fn write_result<W: Write>(output: &mut W, result: &DownloadResult) -> std::io::Result<()> {
    writeln!(output, "{}", PrettyLogger::success(format!("下载完成: {}", result.title)))?;
    for path in &result.file_paths {
        writeln!(output, "{}", PrettyLogger::file_info("文件", path.to_string_lossy()))?;
    }
    if let Some(archive) = &result.archive_path {
        writeln!(output, "{}", PrettyLogger::file_info("压缩包", archive.to_string_lossy()))?;
    }
    Ok(())
}

pub fn write_error<W: Write>(output: &mut W, error: &DownloadError) -> std::io::Result<()> {
    writeln!(output, "{}", PrettyLogger::error(error.user_message()))?;
    if let Some(details) = error.details() {
        writeln!(output, "  {}", details)?;
    }
    Ok(())
}

/// 交互循环，空行或 q 退出
pub async fn run_prompt<R, W>(
    handler: &DownloadHandler,
    input: R,
    output: &mut W,
    show_progress: bool,
) -> std::io::Result<PromptSummary>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut machine = RequestMachine::new();
    let mut summary = PromptSummary::default();

    writeln!(output, "{}", PrettyLogger::title("YouTube 下载器"))?;
    writeln!(
        output,
        "{}",
        PrettyLogger::info(format!("文件将保存到 {:?}", handler.output_dir()))
    )?;

    loop {
        write!(output, "\n请输入 YouTube 链接（视频或播放列表，直接回车退出）: ")?;
        output.flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let url = line.trim();
        if is_quit(url) {
            break;
        }

        write!(output, "选择格式 [1] MP4 视频 / [2] MP3 音频（默认 1）: ")?;
        output.flush()?;
        let choice = lines.next_line().await?.unwrap_or_default();
        let Some(format) = parse_format_choice(&choice) else {
            writeln!(output, "{}", PrettyLogger::warning(format!("无效的格式: {}", choice.trim())))?;
            continue;
        };

        let request = DownloadRequest::detect(url, format);
        transition(&mut machine, UiEvent::Submit);
        if request.is_playlist() {
            writeln!(output, "{}", PrettyLogger::info("检测到播放列表，完成后会打包成 zip"))?;
        }
        transition(&mut machine, UiEvent::Start);

        match run_once(handler, &request, show_progress).await {
            Ok(result) => {
                transition(&mut machine, UiEvent::Succeed);
                write_result(output, &result)?;
                // 文件已经落盘，对命令行来说等同于保存
                transition(&mut machine, UiEvent::Save);
                summary.completed += 1;
            }
            Err(e) => {
                transition(&mut machine, UiEvent::Fail);
                write_error(output, &e)?;
                transition(&mut machine, UiEvent::Acknowledge);
                summary.failed += 1;
            }
        }
        writeln!(output, "{}", PrettyLogger::separator())?;
    }

    writeln!(output, "再见！")?;
    Ok(summary)
}

fn transition(machine: &mut RequestMachine, event: UiEvent) {
    if let Err(e) = machine.apply(event) {
        warn!("{}", e);
    }
}
