//! Progress bars for long stages, and a log writer that keeps them pinned
//! below the log output.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, Write};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

static MULTI_PROGRESS: OnceLock<MultiProgress> = OnceLock::new();

fn multi_progress() -> &'static MultiProgress {
    MULTI_PROGRESS.get_or_init(|| {
        let mp = MultiProgress::new();
        mp.set_draw_target(ProgressDrawTarget::stderr_with_hz(10));
        mp
    })
}

pub fn add_progress_bar(len: u64) -> ProgressBar {
    multi_progress().add(ProgressBar::new(len))
}

/// Bar counting postings through a stage
pub fn posting_bar(len: usize, message: &str) -> ProgressBar {
    let pb = add_progress_bar(len as u64);
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}",
    )
    .map(|s| s.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb
}

/// `tracing` writer that prints through the progress bars
#[derive(Default, Clone)]
pub struct LogWriterFactory;

/// Buffers partial writes and emits whole lines above the bars
pub struct LogWriter {
    pending: String,
}

fn emit(line: &str) {
    let _ = multi_progress().println(line.trim_end_matches('\r'));
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.push_str(&String::from_utf8_lossy(buf));

        while let Some(idx) = self.pending.find('\n') {
            emit(&self.pending[..idx]);
            self.pending.drain(..=idx);
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.pending.is_empty() {
            emit(&self.pending);
            self.pending.clear();
        }
        Ok(())
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

impl<'a> MakeWriter<'a> for LogWriterFactory {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter {
            pending: String::new(),
        }
    }
}
