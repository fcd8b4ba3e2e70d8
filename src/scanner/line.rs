use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use super::{Decoder, DecoderError, DecoderEvent};
use crate::config::CaptureConfig;

/// Decoder fed by already-decoded payloads, one per line. Handheld gate
/// scanners in keyboard mode deliver codes this way. Lines arriving while
/// capture is stopped stay buffered in the reader.
pub struct LineDecoder<R> {
    lines: Arc<Mutex<Lines<R>>>,
    reader_task: Option<JoinHandle<()>>,
}

impl LineDecoder<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R> LineDecoder<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    pub fn new(reader: R) -> Self {
        Self {
            lines: Arc::new(Mutex::new(reader.lines())),
            reader_task: None,
        }
    }
}

#[async_trait]
impl<R> Decoder for LineDecoder<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    async fn start(
        &mut self,
        config: &CaptureConfig,
        events: mpsc::Sender<DecoderEvent>,
    ) -> Result<(), DecoderError> {
        if self.reader_task.is_some() {
            return Ok(());
        }
        debug!(facing = ?config.facing_mode, fps = config.fps, "Line decoder listening");

        let lines = Arc::clone(&self.lines);
        self.reader_task = Some(tokio::spawn(async move {
            let mut lines = lines.lock().await;
            loop {
                let event = match lines.next_line().await {
                    Ok(Some(line)) => {
                        let text = line.trim();
                        if text.is_empty() {
                            trace!("Skipping empty line");
                            continue;
                        }
                        DecoderEvent::Decoded(text.to_string())
                    }
                    Ok(None) => DecoderEvent::Fault(DecoderError::Closed),
                    Err(e) => DecoderEvent::Fault(DecoderError::Unavailable(e.to_string())),
                };
                let last = matches!(event, DecoderEvent::Fault(_));
                if events.send(event).await.is_err() || last {
                    break;
                }
            }
        }));
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), DecoderError> {
        if let Some(task) = self.reader_task.take() {
            task.abort();
            // Wait for the reader to let go of the lines before a restart.
            let _ = task.await;
        }
        Ok(())
    }
}
