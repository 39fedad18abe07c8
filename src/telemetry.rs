//! Tracing setup. The terminal belongs to the UI, so formatted log lines are
//! forwarded over a channel into the diagnostics panel (and optionally a file).

use crate::config::LoggingConfig;
use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

#[derive(Clone)]
struct ChannelWriter {
    sender: Sender<String>,
    file: Option<Arc<Mutex<File>>>,
}

impl Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        // Panel first: a failing log file must not hide lines from it
        let text = String::from_utf8_lossy(buf);
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            let _ = self.sender.send(line.to_string());
        }
        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                file.write_all(buf)?;
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                file.flush()?;
            }
        }
        Ok(())
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured filter.
pub fn init(config: &LoggingConfig) -> Result<Receiver<String>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.filter)
            .with_context(|| format!("invalid log filter {:?}", config.filter))?,
    };

    let file = match &config.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            Some(Arc::new(Mutex::new(file)))
        }
        None => None,
    };

    let (sender, receiver) = mpsc::channel();
    let writer = ChannelWriter { sender, file };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .compact()
        .with_writer(move || writer.clone())
        .try_init()
        .map_err(|err| anyhow::anyhow!(err))?;

    Ok(receiver)
}

/// Most recent log lines for the diagnostics panel
pub struct LogBuffer {
    lines: VecDeque<String>,
    capacity: usize,
    receiver: Option<Receiver<String>>,
}

impl LogBuffer {
    pub fn new(capacity: usize, receiver: Option<Receiver<String>>) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            receiver,
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
    }

    /// Pull everything the subscriber has written since the last call
    pub fn drain(&mut self) {
        let Some(receiver) = self.receiver.take() else {
            return;
        };
        while let Ok(line) = receiver.try_recv() {
            self.push(line);
        }
        self.receiver = Some(receiver);
    }

    /// Last `n` lines, oldest first
    pub fn tail(&self, n: usize) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .skip(self.lines.len().saturating_sub(n))
            .map(String::as_str)
    }
}
