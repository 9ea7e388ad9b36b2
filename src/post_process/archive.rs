use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::downloader::error::DownloadError;

// 大于该值的条目需要 zip64
const ZIP64_THRESHOLD: u64 = u32::MAX as u64;

// 多数文件系统单个文件名上限 255 字节，给 ".zip" 留出余量
const MAX_NAME_BYTES: usize = 200;

/// 把播放列表的所有文件打包成一个 zip，条目按传入顺序平铺
pub async fn bundle(files: &[PathBuf], archive_path: &Path) -> Result<(), DownloadError> {
    let files = files.to_vec();
    let archive_path = archive_path.to_path_buf();

    // zip 写入是阻塞操作
    tokio::task::spawn_blocking(move || write_zip(&files, &archive_path))
        .await
        .map_err(|e| DownloadError::Archive(format!("异步任务失败: {}", e)))?
}

fn write_zip(files: &[PathBuf], archive_path: &Path) -> Result<(), DownloadError> {
    debug!("开始打包 {} 个文件 -> {:?}", files.len(), archive_path);
    let mut zip = ZipWriter::new(BufWriter::new(File::create(archive_path)?));

    for path in files {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| DownloadError::Archive(format!("无效的文件名: {:?}", path)))?;
        let size = std::fs::metadata(path)?.len();

        // 媒体文件本身已经压缩过，直接存储
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .large_file(size >= ZIP64_THRESHOLD);

        zip.start_file(name, options)?;
        let mut source = File::open(path)?;
        std::io::copy(&mut source, &mut zip)?;
    }

    zip.finish()?;
    info!("✅ 打包完成: {:?}", archive_path);
    Ok(())
}

/// 生成可以安全用作文件名的标题
pub fn sanitize_file_name(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = truncate_bytes(cleaned.trim(), MAX_NAME_BYTES);
    let cleaned = cleaned.trim().trim_matches('.').trim();
    if cleaned.is_empty() {
        "playlist".to_string()
    } else {
        cleaned.to_string()
    }
}

/// 按字节截断，不切断多字节字符
fn truncate_bytes(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
