//! Capture sources
//!
//! A capture source yields the text lines consumed by the collector: piped
//! standard input, a replayed capture file, or a `tshark` process spawned
//! on a live interface.

use std::path::PathBuf;
use std::process::Stdio;

use serde::{Deserialize, Serialize};
use tokio::fs::File;
use tokio::io::{AsyncBufRead, BufReader};
use tokio::process::{Child, Command};

use super::parse::FIELDS;

/// Where capture lines come from
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "Mode", rename_all = "lowercase")]
pub enum CaptureSource {
    /// Lines piped to standard input (e.g. `tshark ... | rtp-stream-stats`)
    #[default]
    Stdin,
    /// Replay of a previously captured field dump
    File {
        #[serde(rename = "Path")]
        path: PathBuf,
    },
    /// Spawn `tshark` on a live interface
    Tshark {
        #[serde(rename = "Interface")]
        interface: String,
    },
}

/// An opened capture source
pub struct CaptureInput {
    reader: Box<dyn AsyncBufRead + Send + Unpin>,
    child: Option<Child>,
}

impl CaptureSource {
    /// Open the source
    pub async fn open(&self) -> std::io::Result<CaptureInput> {
        match self {
            CaptureSource::Stdin => Ok(CaptureInput {
                reader: Box::new(BufReader::new(tokio::io::stdin())),
                child: None,
            }),
            CaptureSource::File { path } => {
                let file = File::open(path).await?;
                tracing::info!(path = %path.display(), "Replaying capture file");
                Ok(CaptureInput {
                    reader: Box::new(BufReader::new(file)),
                    child: None,
                })
            }
            CaptureSource::Tshark { interface } => {
                let mut child = Command::new("tshark")
                    .args(tshark_args(interface))
                    .stdin(Stdio::null())
                    .stdout(Stdio::piped())
                    .kill_on_drop(true)
                    .spawn()?;

                let stdout = child.stdout.take().ok_or_else(|| {
                    std::io::Error::new(std::io::ErrorKind::BrokenPipe, "tshark stdout unavailable")
                })?;

                tracing::info!(interface = %interface, pid = ?child.id(), "Started tshark packet capture");
                Ok(CaptureInput {
                    reader: Box::new(BufReader::new(stdout)),
                    child: Some(child),
                })
            }
        }
    }
}

/// Arguments for a `tshark` capture producing the fields [`parse_line`](super::parse_line) expects
pub fn tshark_args(interface: &str) -> Vec<String> {
    let mut args = vec![
        "-i".to_string(),
        interface.to_string(),
        "-Y".to_string(),
        "rtp".to_string(),
        "-q".to_string(),
        "-T".to_string(),
        "fields".to_string(),
    ];
    for field in FIELDS {
        args.push("-e".to_string());
        args.push(field.to_string());
    }
    args.extend(["-E", "header=y", "-E", "separator=,"].map(String::from));
    args
}

impl CaptureInput {
    /// Wrap an arbitrary reader (used for tests and embedding)
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncBufRead + Send + Unpin + 'static,
    {
        Self {
            reader: Box::new(reader),
            child: None,
        }
    }

    /// The line reader
    pub fn reader(&mut self) -> &mut (dyn AsyncBufRead + Send + Unpin) {
        self.reader.as_mut()
    }

    /// Wait for a spawned capture process to exit
    pub async fn finish(self) -> std::io::Result<()> {
        // Drop the pipe first so the child is not blocked writing to it
        drop(self.reader);

        if let Some(mut child) = self.child {
            let status = child.wait().await?;
            tracing::info!(status = %status, "Capture process exited");
        }
        Ok(())
    }
}
