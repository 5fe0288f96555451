//! Text-mode stand-ins for the microphone and speaker

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tokio::sync::{Mutex, mpsc};

use super::{SynthesisPort, TranscriptionPort};
use crate::error::{SynthesisError, TranscriptionError};

/// Spoken after repeated blank lines
pub const TYPING_WARNING: &str = "I didn't get a question. Please type it and press Enter.";

/// Reads each utterance as a line from stdin
///
/// End of input is reported through the shutdown channel, so the loop stops
/// at the next turn boundary.
pub struct ConsoleTranscriber {
    lines: Mutex<Lines<BufReader<Stdin>>>,
    shutdown: mpsc::Sender<()>,
}

impl ConsoleTranscriber {
    /// Create a transcriber reading from stdin
    #[must_use]
    pub fn new(shutdown: mpsc::Sender<()>) -> Self {
        Self {
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
            shutdown,
        }
    }
}

#[async_trait]
impl TranscriptionPort for ConsoleTranscriber {
    type Sample = String;

    async fn capture(&self, _duration: Duration) -> Result<String, TranscriptionError> {
        let mut stdout = tokio::io::stdout();
        let _ = stdout.write_all(b"you> ").await;
        let _ = stdout.flush().await;

        match self.lines.lock().await.next_line().await {
            Ok(Some(line)) => Ok(line),
            Ok(None) => {
                let _ = self.shutdown.try_send(());
                Err(TranscriptionError::Capture("end of input".to_string()))
            }
            Err(e) => Err(TranscriptionError::Capture(e.to_string())),
        }
    }

    async fn transcribe(&self, sample: String) -> Result<String, TranscriptionError> {
        let text = sample.trim();
        if text.is_empty() {
            return Err(TranscriptionError::Empty);
        }
        Ok(text.to_string())
    }

    fn hearing_warning(&self) -> &str {
        TYPING_WARNING
    }
}

/// Prints answers to stdout
#[derive(Debug, Default)]
pub struct ConsoleSpeaker;

#[async_trait]
impl SynthesisPort for ConsoleSpeaker {
    async fn speak(&self, text: &str) -> Result<(), SynthesisError> {
        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(format!("assistant> {text}\n").as_bytes())
            .await
            .map_err(|e| SynthesisError(e.to_string()))?;
        stdout
            .flush()
            .await
            .map_err(|e| SynthesisError(e.to_string()))
    }
}
