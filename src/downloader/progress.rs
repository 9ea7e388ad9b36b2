use tokio::sync::mpsc;

use crate::common::models::ProgressUpdate;

/// yt-dlp `--progress-template` 输出行的前缀
pub const PROGRESS_PREFIX: &str = "ytdl-progress:";

pub type ProgressSender = mpsc::UnboundedSender<ProgressUpdate>;
pub type ProgressReceiver = mpsc::UnboundedReceiver<ProgressUpdate>;

pub fn progress_channel() -> (ProgressSender, ProgressReceiver) {
    mpsc::unbounded_channel()
}

/// 下载工具报告的一次原始进度
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawProgress {
    pub downloaded: u64,
    pub total: Option<u64>,
    pub item_index: Option<u32>,
    pub item_count: Option<u32>,
}

impl RawProgress {
    pub fn new(downloaded: u64, total: u64) -> Self {
        Self {
            downloaded,
            total: Some(total),
            item_index: None,
            item_count: None,
        }
    }

    pub fn with_item(mut self, index: u32, count: u32) -> Self {
        self.item_index = Some(index);
        self.item_count = Some(count);
        self
    }
}

fn parse_field(field: &str) -> Option<f64> {
    match field.trim() {
        "" | "NA" | "None" => None,
        value => value.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0),
    }
}

/// 解析 `ytdl-progress:<已下载>/<总大小>/<估计大小>/<序号>/<总数>`，未知字段为 `NA`
pub fn parse_progress_line(line: &str) -> Option<RawProgress> {
    let rest = line.trim().strip_prefix(PROGRESS_PREFIX)?;
    let fields: Vec<&str> = rest.split('/').collect();
    if fields.len() != 5 {
        return None;
    }

    let downloaded = parse_field(fields[0])? as u64;
    let total = parse_field(fields[1])
        .filter(|v| *v > 0.0)
        .or_else(|| parse_field(fields[2]).filter(|v| *v > 0.0))
        .map(|v| v as u64);

    Some(RawProgress {
        downloaded,
        total,
        item_index: fields[3].trim().parse().ok(),
        item_count: fields[4].trim().parse().ok(),
    })
}

/// 把原始进度换算成整个请求的百分比，保证同一请求内单调不减
pub struct ProgressTracker {
    sender: ProgressSender,
    last: ProgressUpdate,
}

impl ProgressTracker {
    pub fn new(sender: ProgressSender) -> Self {
        Self {
            sender,
            last: ProgressUpdate::default(),
        }
    }

    pub fn last(&self) -> &ProgressUpdate {
        &self.last
    }

    /// 总大小未知的样本直接丢弃
    pub fn observe(&mut self, raw: RawProgress) -> Option<ProgressUpdate> {
        let total = raw.total.filter(|t| *t > 0)?;
        let fraction = (raw.downloaded as f64 / total as f64).min(1.0);

        let percent = match (raw.item_index, raw.item_count) {
            (Some(index), Some(count)) if count > 0 && index > 0 => {
                let done = (index.min(count) - 1) as f64;
                (done + fraction) / count as f64 * 100.0
            }
            _ => fraction * 100.0,
        };

        let update = ProgressUpdate {
            percent_complete: percent.clamp(self.last.percent_complete, 100.0),
            bytes_downloaded: raw.downloaded.min(total),
            total_bytes: total,
            item_index: raw.item_index,
            item_count: raw.item_count,
        };
        self.emit(update);
        Some(update)
    }

    /// 请求成功结束时发出 100%
    pub fn finish(&mut self) -> ProgressUpdate {
        let update = ProgressUpdate {
            percent_complete: 100.0,
            bytes_downloaded: self.last.total_bytes.max(self.last.bytes_downloaded),
            ..self.last
        };
        self.emit(update);
        update
    }

    fn emit(&mut self, update: ProgressUpdate) {
        self.last = update;
        // 接收端已关闭不算错误
        let _ = self.sender.send(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_template_lines() {
        let raw = parse_progress_line("ytdl-progress:1048576/2097152/NA/NA/NA").unwrap();
        assert_eq!(raw, RawProgress::new(1048576, 2097152));

        let raw = parse_progress_line("  ytdl-progress:10/NA/40.5/2/3").unwrap();
        assert_eq!(raw.total, Some(40));
        assert_eq!(raw.item_index, Some(2));
        assert_eq!(raw.item_count, Some(3));
    }

    #[test]
    fn rejects_other_lines() {
        assert_eq!(parse_progress_line("[download] Destination: a.mp4"), None);
        assert_eq!(parse_progress_line("ytdl-progress:NA/100/NA/NA/NA"), None);
        assert_eq!(parse_progress_line("ytdl-progress:1/2/3"), None);
        assert_eq!(parse_progress_line(""), None);
    }

    #[test]
    fn unknown_total_is_dropped() {
        let (tx, mut rx) = progress_channel();
        let mut tracker = ProgressTracker::new(tx);
        let raw = parse_progress_line("ytdl-progress:10/NA/NA/NA/NA").unwrap();
        assert_eq!(tracker.observe(raw), None);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn playlist_progress_spans_items() {
        let (tx, _rx) = progress_channel();
        let mut tracker = ProgressTracker::new(tx);
        let first = tracker.observe(RawProgress::new(50, 100).with_item(1, 4)).unwrap();
        assert!((first.percent_complete - 12.5).abs() < 1e-9);
        let third = tracker.observe(RawProgress::new(100, 100).with_item(3, 4)).unwrap();
        assert!((third.percent_complete - 75.0).abs() < 1e-9);
    }

    #[test]
    fn never_goes_backwards() {
        let (tx, mut rx) = progress_channel();
        let mut tracker = ProgressTracker::new(tx);
        tracker.observe(RawProgress::new(80, 100));
        // 合并格式时音频流会从 0 重新开始
        tracker.observe(RawProgress::new(10, 100));
        tracker.observe(RawProgress::new(500, 100));
        tracker.finish();

        let mut seen = Vec::new();
        while let Ok(update) = rx.try_recv() {
            seen.push(update.percent_complete);
        }
        assert_eq!(seen, vec![80.0, 80.0, 100.0, 100.0]);
    }

    #[test]
    fn closed_receiver_is_fine() {
        let (tx, rx) = progress_channel();
        drop(rx);
        let mut tracker = ProgressTracker::new(tx);
        assert!(tracker.observe(RawProgress::new(1, 2)).is_some());
        assert_eq!(tracker.finish().percent_complete, 100.0);
    }
}
