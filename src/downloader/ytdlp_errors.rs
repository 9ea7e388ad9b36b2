//! yt-dlp 错误输出分类，把原始 stderr 转成用户能看懂的提示

use regex::Regex;
use std::sync::LazyLock;

use super::error::DownloadError;

// ERROR: [youtube] abc123: Video unavailable
static ERROR_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ERROR:\s*(?:\[[^\]]+\]\s*)?(?:[\w-]+:\s+)?(?P<msg>.+)$").expect("合法的正则")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCause {
    NoFormats,
    NotFound,
    AccessDenied,
    Network,
    Unreachable,
    Unavailable,
    AgeRestricted,
    UnsupportedUrl,
    Unknown,
}

// 按顺序匹配，先命中先返回
const PATTERNS: &[(&str, FailureCause)] = &[
    ("no video formats found", FailureCause::NoFormats),
    ("requested format is not available", FailureCause::NoFormats),
    ("http error 404", FailureCause::NotFound),
    ("http error 403", FailureCause::AccessDenied),
    ("incomplete data received", FailureCause::Network),
    ("timed out", FailureCause::Network),
    ("connection reset", FailureCause::Network),
    ("unable to download webpage", FailureCause::Unreachable),
    ("sign in to confirm your age", FailureCause::AgeRestricted),
    ("video unavailable", FailureCause::Unavailable),
    ("private video", FailureCause::Unavailable),
    ("has been removed", FailureCause::Unavailable),
    ("is not a valid url", FailureCause::UnsupportedUrl),
    ("unsupported url", FailureCause::UnsupportedUrl),
];

pub fn classify(stderr: &str) -> FailureCause {
    let lower = stderr.to_lowercase();
    PATTERNS
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, cause)| *cause)
        .unwrap_or(FailureCause::Unknown)
}

pub fn friendly_message(cause: FailureCause) -> &'static str {
    match cause {
        FailureCause::NoFormats => "找不到可用的视频格式，请检查链接是否正确",
        FailureCause::NotFound => "视频不存在，请检查链接是否正确",
        FailureCause::AccessDenied => "访问被拒绝，视频可能是私有的或有地区限制",
        FailureCause::Network => "网络问题导致下载失败，请稍后重试",
        FailureCause::Unreachable => "无法访问 YouTube，请检查网络连接",
        FailureCause::Unavailable => "视频不可用，可能已被删除或设为私有",
        FailureCause::AgeRestricted => "视频有年龄限制，无法下载",
        FailureCause::UnsupportedUrl => "不支持的链接",
        FailureCause::Unknown => "下载失败",
    }
}

/// 取最后一条 ERROR 行的正文，没有的话取最后一行非空输出
pub fn last_error_line(stderr: &str) -> Option<String> {
    let lines: Vec<&str> = stderr.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    lines
        .iter()
        .rev()
        .find_map(|line| ERROR_LINE.captures(line).map(|caps| caps["msg"].to_string()))
        .or_else(|| lines.last().map(|line| line.to_string()))
}

pub fn to_download_error(stderr: &str, exit_code: Option<i32>) -> DownloadError {
    let cause = classify(stderr);
    let details = last_error_line(stderr).unwrap_or_else(|| match exit_code {
        Some(code) => format!("yt-dlp 退出码 {}", code),
        None => "yt-dlp 被信号终止".to_string(),
    });
    let message = match cause {
        FailureCause::Unknown => format!("{}: {}", friendly_message(cause), details),
        known => friendly_message(known).to_string(),
    };
    DownloadError::ToolFailed { message, details }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_common_failures() {
        assert_eq!(
            classify("ERROR: [youtube] abc: Video unavailable"),
            FailureCause::Unavailable
        );
        assert_eq!(
            classify("ERROR: unable to download video data: HTTP Error 403: Forbidden"),
            FailureCause::AccessDenied
        );
        assert_eq!(
            classify("ERROR: [youtube] x: Sign in to confirm your age"),
            FailureCause::AgeRestricted
        );
        assert_eq!(
            classify("ERROR: [generic] 'foo' is not a valid URL"),
            FailureCause::UnsupportedUrl
        );
        assert_eq!(classify("something odd"), FailureCause::Unknown);
    }

    #[test]
    fn extracts_error_text() {
        let stderr = "WARNING: slow\nERROR: [youtube] abc123: Private video\n";
        assert_eq!(last_error_line(stderr).as_deref(), Some("Private video"));
        assert_eq!(last_error_line("just noise").as_deref(), Some("just noise"));
        assert_eq!(last_error_line(""), None);
    }

    #[test]
    fn unknown_failures_carry_raw_text() {
        match to_download_error("ERROR: boom", Some(1)) {
            DownloadError::ToolFailed { message, details } => {
                assert_eq!(details, "boom");
                assert_eq!(message, "下载失败: boom");
            }
            other => panic!("unexpected: {:?}", other),
        }
        match to_download_error("", Some(2)) {
            DownloadError::ToolFailed { details, .. } => assert_eq!(details, "yt-dlp 退出码 2"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
