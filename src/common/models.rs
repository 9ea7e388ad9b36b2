use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::parser::detector::is_playlist_url;

// -----------------------------------------------------------------------------------------------

/// 输出格式，只支持两种
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaFormat {
    #[default]
    Mp4, // 视频
    Mp3, // 音频
}

// MP3 请求绝不能得到视频容器，MP4 请求绝不能得到纯音频容器
const VIDEO_CONTAINERS: &[&str] = &["mp4", "mkv", "webm", "mov", "avi", "flv"];
const AUDIO_CONTAINERS: &[&str] = &["mp3", "m4a", "opus", "ogg", "wav", "aac", "flac"];

impl MediaFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Mp3 => "mp3",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Mp4 => "video/mp4",
            Self::Mp3 => "audio/mpeg",
        }
    }

    /// 该格式绝不应该产出的扩展名
    pub fn is_forbidden_extension(&self, ext: &str) -> bool {
        let ext = ext.to_ascii_lowercase();
        match self {
            Self::Mp4 => AUDIO_CONTAINERS.contains(&ext.as_str()),
            Self::Mp3 => VIDEO_CONTAINERS.contains(&ext.as_str()),
        }
    }

    /// 文件扩展名是否与请求的格式一致
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(self.extension()))
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for MediaFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp4" | "video" => Ok(Self::Mp4),
            "mp3" | "audio" => Ok(Self::Mp3),
            other => Err(format!("不支持的格式: {} (可选 mp4 / mp3)", other)),
        }
    }
}

// -----------------------------------------------------------------------------------------------

/// 用户提交的下载请求，提交后不可变
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadRequest {
    url: String,
    format: MediaFormat,
    is_playlist: bool,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>, format: MediaFormat, is_playlist: bool) -> Self {
        Self {
            url: url.into().trim().to_string(),
            format,
            is_playlist,
        }
    }

    /// 根据链接本身判断是否为播放列表
    pub fn detect(url: impl Into<String>, format: MediaFormat) -> Self {
        let url = url.into();
        let is_playlist = is_playlist_url(&url);
        Self::new(url, format, is_playlist)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn format(&self) -> MediaFormat {
        self.format
    }

    pub fn is_playlist(&self) -> bool {
        self.is_playlist
    }
}

// -----------------------------------------------------------------------------------------------

/// 单次请求内的进度快照
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ProgressUpdate {
    pub percent_complete: f64, // 整个请求的进度 0-100
    pub bytes_downloaded: u64, // 当前条目已下载字节
    pub total_bytes: u64,      // 当前条目总字节
    pub item_index: Option<u32>,
    pub item_count: Option<u32>,
}

impl ProgressUpdate {
    /// 终端和日志里用的一行摘要
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{:.1}% · {} / {}",
            self.percent_complete,
            format_megabytes(self.bytes_downloaded),
            format_megabytes(self.total_bytes)
        );
        if let (Some(index), Some(count)) = (self.item_index, self.item_count) {
            line.push_str(&format!(" · 第 {}/{} 项", index, count));
        }
        line
    }
}

pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.1}MB", bytes as f64 / (1024.0 * 1024.0))
}

// -----------------------------------------------------------------------------------------------

/// 下载完成后的结果，`archive_path` 仅在播放列表请求时存在
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadResult {
    pub title: String,
    pub format: MediaFormat,
    pub file_paths: Vec<PathBuf>,
    pub archive_path: Option<PathBuf>,
}

impl DownloadResult {
    pub fn is_playlist(&self) -> bool {
        self.archive_path.is_some()
    }

    /// 交给用户保存的文件：播放列表给压缩包，否则给唯一的媒体文件
    pub fn deliverable(&self) -> Option<&Path> {
        match &self.archive_path {
            Some(archive) => Some(archive.as_path()),
            None => self.file_paths.first().map(PathBuf::as_path),
        }
    }

    pub fn deliverable_mime(&self) -> &'static str {
        if self.is_playlist() {
            "application/zip"
        } else {
            self.format.mime_type()
        }
    }

    pub fn deliverable_file_name(&self) -> String {
        self.deliverable()
            .and_then(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}.{}", self.title, self.format.extension()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parses_aliases_case_insensitively() {
        assert_eq!("MP4".parse::<MediaFormat>().unwrap(), MediaFormat::Mp4);
        assert_eq!(" audio ".parse::<MediaFormat>().unwrap(), MediaFormat::Mp3);
        assert!("avi".parse::<MediaFormat>().is_err());
    }

    #[test]
    fn forbidden_extensions_are_cross_container() {
        assert!(MediaFormat::Mp3.is_forbidden_extension("MP4"));
        assert!(MediaFormat::Mp3.is_forbidden_extension("webm"));
        assert!(!MediaFormat::Mp3.is_forbidden_extension("mp3"));
        assert!(MediaFormat::Mp4.is_forbidden_extension("m4a"));
        assert!(!MediaFormat::Mp4.is_forbidden_extension("mp4"));
    }

    #[test]
    fn detect_marks_list_urls_as_playlist() {
        let single = DownloadRequest::detect("https://youtube.com/watch?v=abc123", MediaFormat::Mp4);
        assert!(!single.is_playlist());

        let list = DownloadRequest::detect(
            " https://www.youtube.com/playlist?list=PL123 ",
            MediaFormat::Mp3,
        );
        assert!(list.is_playlist());
        assert_eq!(list.url(), "https://www.youtube.com/playlist?list=PL123");
    }

    #[test]
    fn deliverable_prefers_archive() {
        let single = DownloadResult {
            title: "clip".into(),
            format: MediaFormat::Mp4,
            file_paths: vec![PathBuf::from("/tmp/clip.mp4")],
            archive_path: None,
        };
        assert_eq!(single.deliverable(), Some(Path::new("/tmp/clip.mp4")));
        assert_eq!(single.deliverable_mime(), "video/mp4");
        assert_eq!(single.deliverable_file_name(), "clip.mp4");

        let playlist = DownloadResult {
            title: "mix".into(),
            format: MediaFormat::Mp3,
            file_paths: vec![PathBuf::from("/tmp/001 - a.mp3")],
            archive_path: Some(PathBuf::from("/tmp/mix.zip")),
        };
        assert_eq!(playlist.deliverable(), Some(Path::new("/tmp/mix.zip")));
        assert_eq!(playlist.deliverable_mime(), "application/zip");
    }

    #[test]
    fn summary_mentions_item_position() {
        let update = ProgressUpdate {
            percent_complete: 50.0,
            bytes_downloaded: 1024 * 1024,
            total_bytes: 2 * 1024 * 1024,
            item_index: Some(2),
            item_count: Some(3),
        };
        assert_eq!(update.summary(), "50.0% · 1.0MB / 2.0MB · 第 2/3 项");
    }
}
