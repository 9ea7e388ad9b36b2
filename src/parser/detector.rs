use url::Url;

use crate::downloader::error::DownloadError;

/// 校验用户输入的链接：必须是带主机名的 http/https 绝对地址
pub fn validate_url(input: &str) -> Result<Url, DownloadError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(DownloadError::EmptyUrl);
    }

    let url = Url::parse(input).map_err(|_| DownloadError::InvalidUrl(input.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(DownloadError::InvalidUrl(input.to_string()));
    }
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(DownloadError::InvalidUrl(input.to_string())),
    }
}

/// 判断链接是否指向播放列表（路径含 playlist，或带 list 参数）
pub fn is_playlist_url(input: &str) -> bool {
    let input = input.trim();
    match Url::parse(input) {
        Ok(url) => {
            url.path().contains("playlist") || url.query_pairs().any(|(key, _)| key == "list")
        }
        Err(_) => input.contains("playlist") || input.contains("&list="),
    }
}
