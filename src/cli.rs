use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::common::models::{DownloadRequest, MediaFormat};
use crate::config::AppConfig;

/// YouTube 视频/播放列表下载器
#[derive(Parser, Debug)]
#[command(name = "ytdl")]
#[command(version)]
#[command(about = "下载 YouTube 视频或播放列表，保存为 MP4 或 MP3", long_about = None)]
pub struct Cli {
    /// 文件保存目录
    #[arg(long, value_name = "DIR", global = true)]
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub output_dir: Option<PathBuf>,

    /// yt-dlp 可执行文件路径
    #[arg(long, value_name = "PATH", global = true)]
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub ytdlp: Option<PathBuf>,

    /// 输出调试日志
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 不带子命令时进入交互模式
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 下载单个链接后退出
    Get {
        /// 视频或播放列表链接
        #[arg(value_name = "URL")]
        #[arg(value_hint = clap::ValueHint::Url)]
        url: String,

        /// 输出格式: mp4 / mp3
        #[arg(short, long, default_value = "mp4")]
        format: MediaFormat,

        /// 强制按播放列表处理（默认根据链接判断）
        #[arg(long)]
        playlist: bool,
    },

    /// 启动网页界面（需要 http 特性）
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        bind: std::net::IpAddr,

        #[arg(long, default_value_t = 8501)]
        port: u16,
    },
}

impl Cli {
    /// 命令行参数覆盖环境变量中的配置
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(path) = &self.ytdlp {
            config.ytdlp_path = path.clone();
        }
    }
}

pub fn build_request(url: &str, format: MediaFormat, playlist: bool) -> DownloadRequest {
    if playlist {
        DownloadRequest::new(url, format, true)
    } else {
        DownloadRequest::detect(url, format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_prompt() {
        let cli = Cli::try_parse_from(["ytdl"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn get_parses_format_and_overrides() {
        let cli = Cli::try_parse_from([
            "ytdl",
            "get",
            "https://youtube.com/watch?v=abc123",
            "--format",
            "mp3",
            "--output-dir",
            "/tmp/media",
        ])
        .unwrap();

        match &cli.command {
            Some(Command::Get { url, format, playlist }) => {
                assert_eq!(url, "https://youtube.com/watch?v=abc123");
                assert_eq!(*format, MediaFormat::Mp3);
                assert!(!playlist);
            }
            other => panic!("unexpected: {:?}", other),
        }

        let mut config = AppConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/media"));
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(Cli::try_parse_from(["ytdl", "get", "https://x.y/z", "-f", "avi"]).is_err());
    }

    #[test]
    fn forced_playlist() {
        let request = build_request("https://youtube.com/watch?v=a", MediaFormat::Mp4, true);
        assert!(request.is_playlist());
        let request = build_request("https://youtube.com/watch?v=a", MediaFormat::Mp4, false);
        assert!(!request.is_playlist());
    }

    #[test]
    fn serve_defaults() {
        let cli = Cli::try_parse_from(["ytdl", "serve"]).unwrap();
        match cli.command {
            Some(Command::Serve { bind, port }) => {
                assert_eq!(bind.to_string(), "127.0.0.1");
                assert_eq!(port, 8501);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
