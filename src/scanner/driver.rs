use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::machine::{Action, Effect, LoopState, ScanMachine};
use super::{DecoderError, DecoderEvent, DecoderFactory, ScanAttempt, ScannerSession, Verdict};
use crate::api::TicketApi;
use crate::config::{CaptureConfig, Config};
use crate::display::StatusSink;
use crate::models::EventId;
use crate::utils::error::AppError;

const CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub cooldown: Duration,
    pub capture: CaptureConfig,
}

impl From<&Config> for ScanSettings {
    fn from(config: &Config) -> Self {
        Self {
            cooldown: config.cooldown,
            capture: config.capture.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Start,
    Stop,
}

/// Operator controls for a running loop. Dropping every handle shuts the
/// loop down and releases the decoder.
#[derive(Debug, Clone)]
pub struct ScanHandle {
    commands: mpsc::Sender<Command>,
    halts: watch::Receiver<Option<DecoderError>>,
}

impl ScanHandle {
    pub async fn start(&self) -> Result<(), AppError> {
        self.send(Command::Start).await
    }

    pub async fn stop(&self) -> Result<(), AppError> {
        self.send(Command::Stop).await
    }

    /// Resolves once the decoder has failed fatally and the loop went idle.
    /// A later successful start clears the halt.
    pub async fn halted(&mut self) -> Result<DecoderError, AppError> {
        let halt = self
            .halts
            .wait_for(Option::is_some)
            .await
            .map_err(|_| AppError::LoopClosed)?;
        (*halt).clone().ok_or(AppError::LoopClosed)
    }

    async fn send(&self, command: Command) -> Result<(), AppError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| AppError::LoopClosed)
    }
}

/// Executes the effects of a [`ScanMachine`] on one task.
pub struct ScanLoop<A> {
    machine: ScanMachine,
    session: ScannerSession,
    api: Arc<A>,
    display: Arc<dyn StatusSink>,
    capture: CaptureConfig,
    commands: mpsc::Receiver<Command>,
    decoder_events: mpsc::Receiver<DecoderEvent>,
    feedback_tx: mpsc::Sender<Action>,
    feedback_rx: mpsc::Receiver<Action>,
    resume_timer: Option<JoinHandle<()>>,
    halts: watch::Sender<Option<DecoderError>>,
}

impl<A> ScanLoop<A>
where
    A: TicketApi + 'static,
{
    /// Spawns the loop idle. Call [`ScanHandle::start`] to begin scanning.
    pub fn spawn(
        event_id: EventId,
        api: Arc<A>,
        display: Arc<dyn StatusSink>,
        factory: DecoderFactory,
        settings: ScanSettings,
    ) -> (ScanHandle, JoinHandle<()>) {
        let (commands_tx, commands) = mpsc::channel(CHANNEL_CAPACITY);
        let (decoder_tx, decoder_events) = mpsc::channel(CHANNEL_CAPACITY);
        let (feedback_tx, feedback_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (halts, halts_rx) = watch::channel(None);

        let scan_loop = ScanLoop {
            machine: ScanMachine::new(event_id, settings.cooldown),
            session: ScannerSession::new(factory, decoder_tx),
            api,
            display,
            capture: settings.capture,
            commands,
            decoder_events,
            feedback_tx,
            feedback_rx,
            resume_timer: None,
            halts,
        };

        let task = tokio::spawn(scan_loop.run());
        (
            ScanHandle {
                commands: commands_tx,
                halts: halts_rx,
            },
            task,
        )
    }

    async fn run(mut self) {
        loop {
            let action = tokio::select! {
                biased;
                command = self.commands.recv() => match command {
                    Some(Command::Start) => Action::Start,
                    Some(Command::Stop) => Action::Stop,
                    None => break,
                },
                Some(action) = self.feedback_rx.recv() => action,
                Some(event) = self.decoder_events.recv() => match event {
                    DecoderEvent::Decoded(text) => Action::Decoded(ScanAttempt::new(text)),
                    DecoderEvent::Fault(e) => Action::DecoderFault(e),
                },
            };
            self.dispatch(action).await;
        }

        debug!("Scan loop shutting down");
        if let Some(timer) = self.resume_timer.take() {
            timer.abort();
        }
        self.session.release().await;
    }

    /// Feeds `action` and every action its effects produce synchronously
    /// through the machine.
    async fn dispatch(&mut self, action: Action) {
        let mut queue = VecDeque::from([action]);
        while let Some(action) = queue.pop_front() {
            let before = self.machine.state();
            let halt = match &action {
                Action::CaptureFailed(e) => Some(e.clone()),
                Action::DecoderFault(e) if e.is_fatal() => Some(e.clone()),
                _ => None,
            };
            for effect in self.machine.reduce(action) {
                if let Some(next) = self.execute(effect).await {
                    queue.push_back(next);
                }
            }
            self.publish_halt(before, halt);
        }
    }

    fn publish_halt(&self, before: LoopState, halt: Option<DecoderError>) {
        let after = self.machine.state();
        if halt.is_some() && before != LoopState::Idle && after == LoopState::Idle {
            self.halts.send_replace(halt);
        } else if before != LoopState::Scanning && after == LoopState::Scanning {
            self.halts.send_replace(None);
        }
    }

    async fn execute(&mut self, effect: Effect) -> Option<Action> {
        match effect {
            Effect::StartCapture => match self.session.start(&self.capture).await {
                Ok(()) => None,
                Err(e) => {
                    error!(error = ?e, "Error starting the QR scanner");
                    Some(Action::CaptureFailed(e))
                }
            },
            Effect::StopCapture => {
                if let Err(e) = self.session.stop().await {
                    error!("Error stopping the QR scanner: {}", e);
                }
                None
            }
            Effect::Render(status) => {
                self.display.show(&status);
                None
            }
            Effect::Validate(request, attempt) => {
                let api = Arc::clone(&self.api);
                let feedback = self.feedback_tx.clone();
                tokio::spawn(async move {
                    let result = api.validate_ticket(&request).await;
                    if let Err(e) = &result {
                        if !e.is_rejection() {
                            error!(error = ?e, "Error validating ticket");
                        }
                    }
                    let verdict = Verdict::classify(result);
                    debug!(verdict = verdict.name(), "Validation finished");
                    if feedback
                        .send(Action::Validated { attempt, verdict })
                        .await
                        .is_err()
                    {
                        debug!("Scan loop gone before verdict was delivered");
                    }
                });
                None
            }
            Effect::MarkScanned(request) => {
                let api = Arc::clone(&self.api);
                tokio::spawn(async move {
                    match api.mark_scanned(&request).await {
                        Ok(()) => debug!(payload = %request.qr_content, "Ticket marked as scanned"),
                        Err(e) => {
                            warn!(payload = %request.qr_content, error = %e, "Failed to mark ticket as scanned")
                        }
                    }
                });
                None
            }
            Effect::ScheduleResume { epoch, after } => {
                if let Some(previous) = self.resume_timer.take() {
                    previous.abort();
                }
                let feedback = self.feedback_tx.clone();
                self.resume_timer = Some(tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    let _ = feedback.send(Action::ResumeDue { epoch }).await;
                }));
                None
            }
            Effect::CancelResume => {
                if let Some(timer) = self.resume_timer.take() {
                    timer.abort();
                }
                None
            }
        }
    }
}
