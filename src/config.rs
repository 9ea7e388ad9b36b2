use serde::Serialize;
use std::path::PathBuf;

/// 默认输出目录
pub const DEFAULT_OUTPUT_DIR: &str = "./downloads";

/// 应用配置，在启动时构建一次，显式传给下载器和界面层
#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    pub output_dir: PathBuf,           // 下载文件保存目录
    pub ytdlp_path: PathBuf,           // yt-dlp 可执行文件
    pub ffmpeg_path: Option<PathBuf>,  // 交给 yt-dlp 的 ffmpeg 位置
    pub tool: ToolConfig,
    pub ui: UiConfig,
}

/// 直接转交给 yt-dlp 的参数
#[derive(Debug, Clone, Serialize)]
pub struct ToolConfig {
    pub socket_timeout_secs: u32,
    pub retries: u32,
    pub playlist_limit: u32, // 播放列表最多下载的条目数
    pub mp3_quality_kbps: u32,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            socket_timeout_secs: 30,
            retries: 10,
            playlist_limit: 50,
            mp3_quality_kbps: 192,
        }
    }
}

/// 网页界面的主题与文案
#[derive(Debug, Clone, Serialize)]
pub struct UiConfig {
    pub title: String,
    pub description: String,
    pub accent_color: String,
    pub accent_hover_color: String,
    pub success_background: String,
    pub error_background: String,
    pub footer: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: "▶️ YouTube 下载器".to_string(),
            description: "粘贴视频或播放列表链接，选择视频 (MP4) 或音频 (MP3) 格式即可下载。"
                .to_string(),
            accent_color: "#FF0000".to_string(),
            accent_hover_color: "#CC0000".to_string(),
            success_background: "#043927".to_string(),
            error_background: "#3d0c11".to_string(),
            footer: "ytdl · 基于 yt-dlp".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            ytdlp_path: PathBuf::from("yt-dlp"),
            ffmpeg_path: None,
            tool: ToolConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl AppConfig {
    /// 从环境变量读取：YTDL_OUTPUT_DIR / YTDLP_PATH / FFMPEG_PATH
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(dir) = non_empty("YTDL_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Some(path) = non_empty("YTDLP_PATH") {
            config.ytdlp_path = PathBuf::from(path);
        }
        config.ffmpeg_path = non_empty("FFMPEG_PATH").map(PathBuf::from);
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let config = AppConfig::from_lookup(|_| None);
        assert_eq!(config.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(config.ytdlp_path, PathBuf::from("yt-dlp"));
        assert_eq!(config.ffmpeg_path, None);
        assert_eq!(config.tool.playlist_limit, 50);
        assert_eq!(config.tool.mp3_quality_kbps, 192);
    }

    #[test]
    fn env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("YTDL_OUTPUT_DIR", "/data/media"),
            ("YTDLP_PATH", "/opt/bin/yt-dlp"),
            ("FFMPEG_PATH", "  "),
        ]);
        let config = AppConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.output_dir, PathBuf::from("/data/media"));
        assert_eq!(config.ytdlp_path, PathBuf::from("/opt/bin/yt-dlp"));
        assert_eq!(config.ffmpeg_path, None);
    }
}
