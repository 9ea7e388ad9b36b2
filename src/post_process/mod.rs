pub mod archive;

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::common::models::MediaFormat;
use crate::downloader::error::DownloadError;

// 目录扫描时认作媒体文件的扩展名
const MEDIA_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "webm", "mov", "avi", "flv", "mp3", "m4a", "opus", "ogg", "wav", "aac", "flac",
];

/// 后端没有报告文件时，扫描工作目录找出媒体文件
pub async fn scan_media_files(work_dir: &Path) -> Result<Vec<PathBuf>, DownloadError> {
    let mut found = Vec::new();
    let mut entries = tokio::fs::read_dir(work_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let is_media = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| MEDIA_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
        if is_media {
            found.push(path);
        }
    }
    found.sort();
    debug!("扫描到 {} 个媒体文件: {:?}", found.len(), found);
    Ok(found)
}

/// 整理后端的产出：去重，检查容器格式，播放列表按文件名排序
pub fn collect_outputs(
    format: MediaFormat,
    is_playlist: bool,
    files: Vec<PathBuf>,
) -> Result<Vec<PathBuf>, DownloadError> {
    let mut outputs: Vec<PathBuf> = Vec::new();
    for path in files {
        if !path.is_file() || outputs.contains(&path) {
            continue;
        }
        if format.matches(&path) {
            outputs.push(path);
            continue;
        }

        // MP3 得到视频容器、MP4 得到纯音频容器都算失败，其他附带文件忽略
        let forbidden = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| format.is_forbidden_extension(ext));
        if forbidden {
            return Err(DownloadError::UnexpectedContainer(path));
        }
        debug!("忽略附带文件: {:?}", path);
    }

    if outputs.is_empty() {
        return Err(DownloadError::NoOutput);
    }

    if is_playlist {
        // 文件名带三位序号前缀，按文件名排序即为播放列表顺序
        outputs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    } else if outputs.len() > 1 {
        warn!("单个视频请求得到了 {} 个文件，只保留第一个", outputs.len());
        outputs.truncate(1);
    }
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"x").unwrap();
        path
    }

    #[tokio::test]
    async fn scan_skips_partials_and_archives() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.mp3");
        touch(dir.path(), "a.mp3");
        touch(dir.path(), "a.mp3.part");
        touch(dir.path(), "mix.zip");
        let found = scan_media_files(dir.path()).await.unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.mp3", "b.mp3"]);
    }

    #[test]
    fn playlist_outputs_sorted_by_index() {
        let dir = tempfile::tempdir().unwrap();
        let second = touch(dir.path(), "002 - b.mp3");
        let first = touch(dir.path(), "001 - a.mp3");
        let outputs =
            collect_outputs(MediaFormat::Mp3, true, vec![second.clone(), first.clone(), second.clone()])
                .unwrap();
        assert_eq!(outputs, vec![first, second]);
    }

    #[test]
    fn wrong_container_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let webm = touch(dir.path(), "clip.webm");
        let err = collect_outputs(MediaFormat::Mp3, false, vec![webm]).unwrap_err();
        assert!(matches!(err, DownloadError::UnexpectedContainer(_)));
    }

    #[test]
    fn missing_files_mean_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let err =
            collect_outputs(MediaFormat::Mp4, false, vec![dir.path().join("gone.mp4")]).unwrap_err();
        assert!(matches!(err, DownloadError::NoOutput));
    }

    #[test]
    fn side_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let thumb = touch(dir.path(), "clip.jpg");
        let clip = touch(dir.path(), "clip.mp4");
        let outputs = collect_outputs(MediaFormat::Mp4, false, vec![thumb, clip.clone()]).unwrap();
        assert_eq!(outputs, vec![clip]);
    }
}
