//! Intake worker: the producer side of a scan session
//!
//! Owns the pipeline (and so the dedup gate) exclusively. Frames come in
//! from the decoder, accepted check-ins go out to the dispatcher through a
//! bounded channel with `try_send`, so a slow dispatcher never stalls frame
//! handling. The dispatcher talks back only through [`GateCommand`]s.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use shared::{component_debug, component_info, component_warn};
use shared::{CheckInEvent, ComponentId, DecodedFrame, GateCommand, ScanVerdict};

use crate::core::pipeline::IntakePipeline;
use crate::error::{ScannerError, ScannerResult};
use crate::types::RegistryPolicy;

/// Counters for one intake run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntakeStats {
    pub frames: u64,
    pub empty_frames: u64,
    pub forwarded: u64,
    pub suppressed: u64,
    /// Accepted but lost because the dispatcher queue was full
    pub dropped: u64,
    pub resets: u64,
}

pub struct IntakeWorker {
    pipeline: IntakePipeline,
    policy: RegistryPolicy,
    checkin_tx: mpsc::Sender<CheckInEvent>,
    stats: IntakeStats,
}

impl IntakeWorker {
    pub fn new(pipeline: IntakePipeline, policy: RegistryPolicy, checkin_tx: mpsc::Sender<CheckInEvent>) -> Self {
        Self {
            pipeline,
            policy,
            checkin_tx,
            stats: IntakeStats::default(),
        }
    }

    /// Handle one decoded frame without blocking
    ///
    /// Returns `None` for frames with an empty decode. A full dispatcher
    /// queue drops the check-in; the gate decision is not reverted.
    pub fn handle_frame(&mut self, frame: DecodedFrame) -> ScannerResult<Option<ScanVerdict>> {
        self.stats.frames += 1;

        if frame.payload.is_empty() {
            self.stats.empty_frames += 1;
            return Ok(None);
        }

        let outcome = self.pipeline.process(&frame.payload, frame.decoded_at);

        let Some(event) = outcome.event else {
            self.stats.suppressed += 1;
            component_debug!(
                ComponentId::Intake,
                verdict = outcome.verdict.label(),
                "Suppressed payload {:?}: {:?}",
                frame.payload,
                outcome.verdict
            );
            return Ok(Some(outcome.verdict));
        };

        let event_id = event.id;
        match self.checkin_tx.try_send(event) {
            Ok(()) => {
                self.stats.forwarded += 1;
                component_info!(ComponentId::Intake, event_id = %event_id, "📷 Scanned {:?}", frame.payload);
            }
            Err(TrySendError::Full(event)) => {
                self.stats.dropped += 1;
                component_warn!(
                    ComponentId::Intake,
                    event_id = %event_id,
                    "⚠️ Dispatcher queue full, dropping check-in for {}",
                    event.record.name
                );
            }
            Err(TrySendError::Closed(_)) => {
                return Err(ScannerError::channel_closed("check-in queue"));
            }
        }

        Ok(Some(outcome.verdict))
    }

    /// Apply a command from the dispatcher or the operator
    pub fn handle_command(&mut self, command: GateCommand) {
        match command {
            GateCommand::MarkRegistered(phone) => {
                if !self.policy.remembers_registrations() {
                    return;
                }
                if self.pipeline.gate_mut().mark_registered(phone.clone()) {
                    component_debug!(ComponentId::Intake, "Registered {}", phone);
                }
            }
            GateCommand::Reset => {
                self.pipeline.gate_mut().reset();
                self.stats.resets += 1;
                component_info!(ComponentId::Intake, "🔄 Scan history cleared");
            }
        }
    }

    /// Run until the frame source ends or shutdown is signalled
    ///
    /// Commands are drained before frames so a registration confirmed by
    /// the dispatcher applies to the next frame.
    pub async fn run(
        mut self,
        mut frames: mpsc::Receiver<DecodedFrame>,
        mut commands: mpsc::UnboundedReceiver<GateCommand>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) -> ScannerResult<IntakeStats> {
        component_info!(
            ComponentId::Intake,
            "🚀 Intake started (cooldown {:?}, {} registered)",
            self.pipeline.gate().cooldown(),
            self.pipeline.gate().registered_count()
        );

        loop {
            tokio::select! {
                biased;

                Some(_) = shutdown_rx.recv() => {
                    component_info!(ComponentId::Intake, "🛑 Intake stopping on shutdown signal");
                    break;
                }

                Some(command) = commands.recv() => {
                    self.handle_command(command);
                }

                frame = frames.recv() => {
                    match frame {
                        Some(frame) => {
                            self.handle_frame(frame)?;
                        }
                        None => {
                            component_info!(ComponentId::Intake, "Frame source ended");
                            break;
                        }
                    }
                }
            }
        }

        Ok(self.stats)
    }

    pub fn pipeline(&self) -> &IntakePipeline {
        &self.pipeline
    }

    pub fn get_stats(&self) -> &IntakeStats {
        &self.stats
    }
}
