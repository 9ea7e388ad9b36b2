use colored::*;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 日志，输出到 stderr，避免和交互提示混在一起
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ytdl={}", default_level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// 漂亮的终端输出工具，返回着色后的行，由调用方决定写到哪里
pub struct PrettyLogger;

impl PrettyLogger {
    pub fn success(message: impl AsRef<str>) -> String {
        format!("{} {}", "✓".green().bold(), message.as_ref())
    }

    pub fn info(message: impl AsRef<str>) -> String {
        format!("{} {}", "ℹ".blue().bold(), message.as_ref())
    }

    pub fn warning(message: impl AsRef<str>) -> String {
        format!("{} {}", "⚠".yellow().bold(), message.as_ref())
    }

    pub fn error(message: impl AsRef<str>) -> String {
        format!("{} {}", "✗".red().bold(), message.as_ref())
    }

    /// 显示文件信息
    pub fn file_info(label: impl AsRef<str>, path: impl AsRef<str>) -> String {
        format!("{} {}: {}", "📁".blue().bold(), label.as_ref().bold(), path.as_ref())
    }

    pub fn separator() -> String {
        format!("{}", "─".repeat(50).bright_black())
    }

    /// 居中标题
    pub fn title(text: impl AsRef<str>) -> String {
        let text = text.as_ref();
        let width = text.chars().count().min(48);
        let padding = (48 - width) / 2;
        format!(
            "{} {} {}",
            "─".repeat(padding).bright_black(),
            text.bold(),
            "─".repeat(48 - padding - width).bright_black()
        )
    }
}

/// 便捷宏用于漂亮的日志输出
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        println!("{}", $crate::common::logger::PrettyLogger::info(format!($($arg)*)))
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        eprintln!("{}", $crate::common::logger::PrettyLogger::error(format!($($arg)*)))
    };
}
