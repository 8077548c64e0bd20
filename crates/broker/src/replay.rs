//! Replay Source - play recorded payloads back through the ingestion queue
//!
//! One payload per line, blank lines skipped. Lines are delivered verbatim,
//! so a recording can mix JSON objects, single-quoted objects and bare
//! numbers just like live telemetry.

use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use contracts::BrokerMessage;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{BrokerError, Result};
use crate::forward::Forwarder;

/// Replay configuration
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Topic stamped on replayed messages
    pub topic: String,

    /// Delay between consecutive payloads
    pub interval: Duration,

    /// Start over after the last payload
    pub loop_playback: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            topic: "replay".to_string(),
            interval: Duration::from_millis(100),
            loop_playback: false,
        }
    }
}

/// Recorded payloads ready for playback
#[derive(Debug, Clone)]
pub struct ReplaySource {
    path: PathBuf,
    payloads: Vec<Bytes>,
    config: ReplayConfig,
}

impl ReplaySource {
    /// Load a recording
    pub fn load(path: &Path, config: ReplayConfig) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| BrokerError::Replay {
            path: path.display().to_string(),
            source,
        })?;

        let payloads: Vec<Bytes> = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| Bytes::copy_from_slice(line.as_bytes()))
            .collect();

        info!(
            path = %path.display(),
            payloads = payloads.len(),
            "replay recording loaded"
        );

        Ok(Self {
            path: path.to_path_buf(),
            payloads,
            config,
        })
    }

    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }

    /// Play on a background task, returning how many payloads were emitted
    pub fn spawn(self, forwarder: Forwarder, cancel: CancellationToken) -> JoinHandle<u64> {
        tokio::spawn(self.run(forwarder, cancel))
    }

    /// Play until the recording ends (or forever when looping) or cancelled
    ///
    /// Waits for queue room rather than dropping. The forwarder is dropped on
    /// return, which closes the queue.
    pub async fn run(self, forwarder: Forwarder, cancel: CancellationToken) -> u64 {
        let mut emitted = 0u64;
        if self.payloads.is_empty() {
            return emitted;
        }

        'playback: loop {
            for payload in &self.payloads {
                if emitted > 0 {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break 'playback,
                        _ = tokio::time::sleep(self.config.interval) => {}
                    }
                }

                let message = BrokerMessage::new(self.config.topic.clone(), payload.clone());
                let sent = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break 'playback,
                    sent = forwarder.send(message) => sent,
                };
                if !sent {
                    debug!("ingestion queue closed, replay stopped");
                    break 'playback;
                }
                emitted += 1;
            }

            if !self.config.loop_playback {
                break;
            }
            debug!(path = %self.path.display(), "replay looping");
        }

        info!(emitted, "replay finished");
        emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forward::ingest_channel;
    use contracts::DropPolicy;
    use std::io::Write;

    fn recording(lines: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(lines.as_bytes()).unwrap();
        file
    }

    fn fast(loop_playback: bool) -> ReplayConfig {
        ReplayConfig {
            topic: "sensors/distance".into(),
            interval: Duration::from_millis(1),
            loop_playback,
        }
    }

    #[test]
    fn blank_lines_are_skipped() {
        let file = recording("{\"distance\": 12}\n\n  \n17.5\n{'msg': 3}\n");
        let source = ReplaySource::load(file.path(), fast(false)).unwrap();
        assert_eq!(source.len(), 3);
    }

    #[tokio::test]
    async fn lines_keep_their_whitespace() {
        let file = recording("  {\"distance\": 12} \r\n\t4\n");
        let source = ReplaySource::load(file.path(), fast(false)).unwrap();
        let (forwarder, rx) = ingest_channel(4, DropPolicy::DropNewest);
        source.run(forwarder, CancellationToken::new()).await;

        assert_eq!(rx.recv().await.unwrap().payload, "  {\"distance\": 12} ");
        assert_eq!(rx.recv().await.unwrap().payload, "\t4");
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = ReplaySource::load(Path::new("/nonexistent/recording.txt"), fast(false))
            .unwrap_err();
        assert!(matches!(err, BrokerError::Replay { .. }));
    }

    #[tokio::test]
    async fn plays_once_then_closes_queue() {
        let file = recording("1\n2\n3\n");
        let source = ReplaySource::load(file.path(), fast(false)).unwrap();
        let (forwarder, rx) = ingest_channel(8, DropPolicy::DropNewest);

        let emitted = source.run(forwarder, CancellationToken::new()).await;
        assert_eq!(emitted, 3);

        let mut payloads = Vec::new();
        while let Ok(message) = rx.recv().await {
            assert_eq!(message.topic, "sensors/distance");
            payloads.push(message.payload);
        }
        assert_eq!(payloads, ["1", "2", "3"]);
    }

    #[tokio::test]
    async fn looping_runs_until_cancelled() {
        let file = recording("5\n");
        let source = ReplaySource::load(file.path(), fast(true)).unwrap();
        let (forwarder, rx) = ingest_channel(4, DropPolicy::DropNewest);
        let cancel = CancellationToken::new();

        let handle = source.spawn(forwarder, cancel.clone());
        for _ in 0..6 {
            assert_eq!(rx.recv().await.unwrap().payload, "5");
        }
        cancel.cancel();
        assert!(handle.await.unwrap() >= 6);
    }
}
