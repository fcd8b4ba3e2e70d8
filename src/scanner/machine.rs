//! Scan validation state machine.
//!
//! `reduce` is the only place that moves the loop between states. It never
//! performs I/O; it returns [`Effect`]s for the driver to execute and gets
//! their results back as [`Action`]s.

use std::time::Duration;

use tracing::{debug, info, trace};

use super::{DecoderError, ScanAttempt, Verdict};
use crate::display::Status;
use crate::models::{EventId, ScanRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Scanning,
    Validating,
    CooldownWait,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// View entry, or the operator asking to scan again.
    Start,
    /// Explicit operator stop.
    Stop,
    CaptureFailed(DecoderError),
    Decoded(ScanAttempt),
    DecoderFault(DecoderError),
    Validated {
        attempt: ScanAttempt,
        verdict: Verdict,
    },
    ResumeDue {
        epoch: u64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    StartCapture,
    StopCapture,
    Render(Status),
    Validate(ScanRequest, ScanAttempt),
    /// Fire-and-forget; its result never reaches the machine.
    MarkScanned(ScanRequest),
    ScheduleResume {
        epoch: u64,
        after: Duration,
    },
    CancelResume,
}

#[derive(Debug)]
pub struct ScanMachine {
    event_id: EventId,
    cooldown: Duration,
    state: LoopState,
    /// Attempt whose round-trip has not come back yet. Survives a stop.
    in_flight: Option<ScanAttempt>,
    /// Bumped on every cooldown armed or cancelled; stale timers carry an
    /// old value.
    epoch: u64,
}

impl ScanMachine {
    pub fn new(event_id: EventId, cooldown: Duration) -> Self {
        Self {
            event_id,
            cooldown,
            state: LoopState::Idle,
            in_flight: None,
            epoch: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn reduce(&mut self, action: Action) -> Vec<Effect> {
        let before = self.state;
        let effects = match action {
            Action::Start => self.on_start(),
            Action::Stop => self.on_stop(),
            Action::CaptureFailed(e) => self.on_capture_failed(e),
            Action::Decoded(attempt) => self.on_decoded(attempt),
            Action::DecoderFault(e) => self.on_fault(e),
            Action::Validated { attempt, verdict } => self.on_validated(attempt, verdict),
            Action::ResumeDue { epoch } => self.on_resume_due(epoch),
        };
        if before != self.state {
            debug!(from = ?before, to = ?self.state, "Scan loop transition");
        }
        effects
    }

    fn on_start(&mut self) -> Vec<Effect> {
        match self.state {
            LoopState::Idle if self.in_flight.is_some() => {
                // Picks the pending round-trip back up; its verdict arms the cooldown.
                self.state = LoopState::Validating;
                vec![]
            }
            LoopState::Idle => {
                self.state = LoopState::Scanning;
                vec![Effect::StartCapture]
            }
            _ => vec![],
        }
    }

    fn on_stop(&mut self) -> Vec<Effect> {
        let mut effects = match self.state {
            LoopState::Idle => return vec![],
            LoopState::Scanning => vec![Effect::StopCapture],
            LoopState::Validating => vec![],
            LoopState::CooldownWait => {
                self.epoch += 1;
                vec![Effect::CancelResume]
            }
        };
        self.state = LoopState::Idle;
        effects.push(Effect::Render(Status::info("Scanner stopped.")));
        effects
    }

    fn on_capture_failed(&mut self, error: DecoderError) -> Vec<Effect> {
        if self.state == LoopState::Scanning {
            self.state = LoopState::Idle;
        }
        vec![Effect::Render(decoder_status(&error))]
    }

    fn on_decoded(&mut self, attempt: ScanAttempt) -> Vec<Effect> {
        if self.state != LoopState::Scanning || self.in_flight.is_some() {
            trace!(payload = %attempt.text, "Dropping decode outside of scanning");
            return vec![];
        }

        info!("QR scanned: {}", attempt.text);
        self.state = LoopState::Validating;
        self.in_flight = Some(attempt.clone());

        let request = ScanRequest {
            qr_content: attempt.text.clone(),
            event_id: self.event_id.clone(),
        };
        vec![
            Effect::StopCapture,
            Effect::Render(Status::info("Validating QR...")),
            Effect::Validate(request, attempt),
        ]
    }

    fn on_fault(&mut self, error: DecoderError) -> Vec<Effect> {
        if !error.is_fatal() {
            trace!("Decoder frame error: {}", error);
            return vec![];
        }
        if self.state != LoopState::Scanning {
            debug!("Ignoring decoder fault while not scanning: {}", error);
            return vec![];
        }
        self.state = LoopState::Idle;
        vec![Effect::StopCapture, Effect::Render(decoder_status(&error))]
    }

    fn on_validated(&mut self, attempt: ScanAttempt, verdict: Verdict) -> Vec<Effect> {
        if self.in_flight.as_ref() != Some(&attempt) {
            debug!(payload = %attempt.text, "Ignoring verdict for an unknown attempt");
            return vec![];
        }
        self.in_flight = None;

        let mut effects = vec![Effect::Render(verdict.status(&self.event_id))];
        if verdict.needs_mark_scanned() {
            effects.push(Effect::MarkScanned(ScanRequest {
                qr_content: attempt.text,
                event_id: self.event_id.clone(),
            }));
        }

        if self.state == LoopState::Validating {
            self.epoch += 1;
            self.state = LoopState::CooldownWait;
            effects.push(Effect::ScheduleResume {
                epoch: self.epoch,
                after: self.cooldown,
            });
        }
        effects
    }

    fn on_resume_due(&mut self, epoch: u64) -> Vec<Effect> {
        if self.state != LoopState::CooldownWait || epoch != self.epoch {
            debug!(epoch, current = self.epoch, "Ignoring stale resume");
            return vec![];
        }
        self.state = LoopState::Scanning;
        vec![Effect::StartCapture]
    }
}

fn decoder_status(error: &DecoderError) -> Status {
    let text = match error {
        DecoderError::PermissionDenied | DecoderError::NoDevice => {
            "Error: could not access the camera. Check permissions or whether a camera is available."
                .to_string()
        }
        DecoderError::Unavailable(_) => {
            format!("Error: the QR scanner could not be loaded. ({})", error)
        }
        other => format!("Error starting the QR scanner. (Detail: {})", other),
    };
    Status::error(text)
}
