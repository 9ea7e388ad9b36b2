use indicatif::{ProgressBar, ProgressStyle};

use crate::common::models::ProgressUpdate;
use crate::downloader::progress::ProgressReceiver;

/// 终端进度条，长度固定为 100，位置即整体百分比
pub struct ConsoleProgress {
    pb: ProgressBar,
}

impl ConsoleProgress {
    pub fn new(visible: bool) -> Self {
        let pb = if visible {
            ProgressBar::new(100)
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );
        pb.set_message("正在下载...");
        Self { pb }
    }

    pub fn update(&self, update: &ProgressUpdate) {
        self.pb.set_position(update.percent_complete.floor() as u64);
        self.pb.set_message(update.summary());
    }

    pub fn position(&self) -> u64 {
        self.pb.position()
    }

    pub fn finish(&self, message: impl Into<String>) {
        self.pb.finish_with_message(message.into());
    }

    pub fn abandon(&self) {
        self.pb.abandon();
    }

    /// 持续消费进度直到发送端关闭，返回收到的条数
    pub async fn drain(&self, mut rx: ProgressReceiver) -> usize {
        let mut received = 0;
        while let Some(update) = rx.recv().await {
            self.update(&update);
            received += 1;
        }
        received
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::progress::progress_channel;

    #[tokio::test]
    async fn drains_until_sender_closes() {
        let (tx, rx) = progress_channel();
        for percent in [10.0, 55.5, 100.0] {
            tx.send(ProgressUpdate {
                percent_complete: percent,
                ..Default::default()
            })
            .unwrap();
        }
        drop(tx);

        let bar = ConsoleProgress::new(false);
        assert_eq!(bar.drain(rx).await, 3);
        assert_eq!(bar.position(), 100);
    }
}
