use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// 面向用户的两类错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,    // 链接为空或格式错误
    DownloadFailure, // 交给 yt-dlp 之后的任何失败
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("请输入 YouTube 链接")]
    EmptyUrl,
    #[error("无效的URL: {0}")]
    InvalidUrl(String),
    #[error("未找到 yt-dlp 可执行文件: {0}")]
    ToolNotFound(String),
    #[error("{message} ({details})")]
    ToolFailed { message: String, details: String },
    #[error("下载结束但没有生成任何文件")]
    NoOutput,
    #[error("输出文件格式与请求不符: {0:?}")]
    UnexpectedContainer(PathBuf),
    #[error("打包失败: {0}")]
    Archive(String),
    #[error("打包失败: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
}

impl DownloadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyUrl | Self::InvalidUrl(_) => ErrorKind::InvalidInput,
            _ => ErrorKind::DownloadFailure,
        }
    }

    /// 给用户看的提示，不带诊断细节
    pub fn user_message(&self) -> String {
        match self {
            Self::ToolFailed { message, .. } => message.clone(),
            Self::ToolNotFound(_) => {
                "未检测到 yt-dlp，请先安装 (https://github.com/yt-dlp/yt-dlp) 或设置 YTDLP_PATH"
                    .to_string()
            }
            other => other.to_string(),
        }
    }

    /// 原始诊断信息
    pub fn details(&self) -> Option<&str> {
        match self {
            Self::ToolFailed { details, .. } => Some(details),
            Self::ToolNotFound(path) => Some(path),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(DownloadError::EmptyUrl.kind(), ErrorKind::InvalidInput);
        assert_eq!(
            DownloadError::InvalidUrl("x".into()).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(DownloadError::NoOutput.kind(), ErrorKind::DownloadFailure);
        let io = DownloadError::from(std::io::Error::other("disk"));
        assert_eq!(io.kind(), ErrorKind::DownloadFailure);
    }

    #[test]
    fn tool_failure_keeps_raw_details() {
        let err = DownloadError::ToolFailed {
            message: "视频不可用".into(),
            details: "ERROR: [youtube] abc: Video unavailable".into(),
        };
        assert_eq!(err.user_message(), "视频不可用");
        assert_eq!(err.details(), Some("ERROR: [youtube] abc: Video unavailable"));
        assert!(err.to_string().contains("Video unavailable"));
    }
}
