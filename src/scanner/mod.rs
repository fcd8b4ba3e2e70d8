//! QR scan validation loop.
//!
//! A [`Decoder`] captures frames and reports decoded text. The
//! [`ScannerSession`] owns the one decoder of a loop, [`machine::ScanMachine`]
//! decides every transition and [`driver::ScanLoop`] executes the effects it
//! asks for.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::CaptureConfig;

pub mod driver;
pub mod line;
pub mod machine;
pub mod verdict;

pub use driver::{ScanHandle, ScanLoop, ScanSettings};
pub use line::LineDecoder;
pub use machine::{Action, Effect, LoopState, ScanMachine};
pub use verdict::Verdict;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecoderError {
    #[error("Camera access denied")]
    PermissionDenied,

    #[error("No camera available")]
    NoDevice,

    #[error("Decoder unavailable: {0}")]
    Unavailable(String),

    #[error("Decoder input closed")]
    Closed,

    /// A single frame could not be decoded.
    #[error("Decode failed: {0}")]
    Frame(String),
}

impl DecoderError {
    /// Fatal errors end the scanning session until the operator restarts it.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DecoderError::Frame(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecoderEvent {
    Decoded(String),
    Fault(DecoderError),
}

/// Camera-backed QR decoding capability.
#[async_trait]
pub trait Decoder: Send {
    /// Begins continuous capture, reporting on `events` until stopped.
    async fn start(
        &mut self,
        config: &CaptureConfig,
        events: mpsc::Sender<DecoderEvent>,
    ) -> Result<(), DecoderError>;

    async fn stop(&mut self) -> Result<(), DecoderError>;
}

pub type DecoderFactory = Box<dyn Fn() -> Result<Box<dyn Decoder>, DecoderError> + Send>;

/// One decoded payload awaiting its validation round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanAttempt {
    pub text: String,
    pub captured_at: DateTime<Utc>,
}

impl ScanAttempt {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            captured_at: Utc::now(),
        }
    }
}

/// Exclusive handle on the loop's decoder. The decoder is created on the
/// first start and reused afterwards.
pub struct ScannerSession {
    factory: DecoderFactory,
    decoder: Option<Box<dyn Decoder>>,
    events: mpsc::Sender<DecoderEvent>,
    running: bool,
}

impl std::fmt::Debug for ScannerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScannerSession")
            .field("acquired", &self.decoder.is_some())
            .field("running", &self.running)
            .finish()
    }
}

impl ScannerSession {
    pub fn new(factory: DecoderFactory, events: mpsc::Sender<DecoderEvent>) -> Self {
        Self {
            factory,
            decoder: None,
            events,
            running: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_acquired(&self) -> bool {
        self.decoder.is_some()
    }

    /// Starts capture. A no-op while already running.
    pub async fn start(&mut self, config: &CaptureConfig) -> Result<(), DecoderError> {
        if self.running {
            debug!("Scanner already active, not starting again");
            return Ok(());
        }

        let mut decoder = match self.decoder.take() {
            Some(decoder) => decoder,
            None => {
                info!("Acquiring QR decoder");
                (self.factory)()?
            }
        };

        let result = decoder.start(config, self.events.clone()).await;
        self.decoder = Some(decoder);
        result?;

        self.running = true;
        debug!(fps = config.fps, box_size = config.box_size, "Scanner capture started");
        Ok(())
    }

    /// Stops capture. A no-op when not running. The session counts as
    /// stopped even if the decoder reports an error.
    pub async fn stop(&mut self) -> Result<(), DecoderError> {
        if !self.running {
            return Ok(());
        }
        self.running = false;

        match self.decoder.as_mut() {
            Some(decoder) => decoder.stop().await,
            None => Ok(()),
        }
    }

    /// Stops capture and drops the decoder.
    pub async fn release(&mut self) {
        if let Err(e) = self.stop().await {
            warn!("Error stopping the QR scanner on release: {}", e);
        }
        self.decoder = None;
    }
}
