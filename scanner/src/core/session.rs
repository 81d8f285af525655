//! Scan session wiring
//!
//! Builds the pipeline (seeding the registry when the policy asks for it)
//! and starts the intake worker and the dispatcher as two tokio tasks
//! connected by channels.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use shared::{component_info, component_warn};
use shared::{ComponentId, DecodedFrame, GateCommand, NormalizedPhone};

use crate::core::dispatcher::{DispatchStats, Dispatcher};
use crate::core::gate::DedupGate;
use crate::core::pipeline::IntakePipeline;
use crate::core::worker::{IntakeStats, IntakeWorker};
use crate::error::{ScannerError, ScannerResult};
use crate::traits::{AttendanceStore, Notifier, RegistrySource};
use crate::types::ScannerConfig;

/// Final counters from both sides of a session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub intake: IntakeStats,
    pub dispatch: DispatchStats,
}

/// Handle to a running session
pub struct SessionHandle {
    frame_tx: mpsc::Sender<DecodedFrame>,
    command_tx: mpsc::UnboundedSender<GateCommand>,
    shutdown_tx: mpsc::Sender<()>,
    intake: JoinHandle<ScannerResult<IntakeStats>>,
    dispatcher: JoinHandle<DispatchStats>,
}

impl SessionHandle {
    /// Sender for decoded frames; dropping every clone ends the session
    pub fn frames(&self) -> mpsc::Sender<DecodedFrame> {
        self.frame_tx.clone()
    }

    /// Operator action: forget every scan seen so far
    pub fn reset(&self) -> ScannerResult<()> {
        self.command_tx
            .send(GateCommand::Reset)
            .map_err(|_| ScannerError::channel_closed("gate commands"))
    }

    /// Stop intake now; the dispatcher finishes what is already queued
    pub async fn shutdown(self) -> ScannerResult<SessionSummary> {
        // intake may have stopped on its own already
        let _ = self.shutdown_tx.send(()).await;
        self.join().await
    }

    /// Wait for the frame source to end and both tasks to finish
    pub async fn join(self) -> ScannerResult<SessionSummary> {
        let SessionHandle { frame_tx, command_tx, shutdown_tx, intake, dispatcher } = self;
        drop(frame_tx);

        let intake = intake.await;
        drop(command_tx);
        drop(shutdown_tx);

        // the dispatcher drains even when intake failed
        let dispatch = dispatcher.await;

        // a dispatcher panic is what closes the check-in queue
        let dispatch = dispatch?;
        let error: ScannerError = match intake {
            Ok(Ok(intake)) => return Ok(SessionSummary { intake, dispatch }),
            Ok(Err(e)) => e,
            Err(e) => e.into(),
        };

        component_warn!(
            ComponentId::Host,
            "⚠️ Intake failed after {} check-ins ({} saved): {}",
            dispatch.dispatched,
            dispatch.stored,
            error
        );
        Err(error)
    }
}

/// Session factory holding the configuration and collaborators
pub struct ScanSession<S, N>
where
    S: AttendanceStore + 'static,
    N: Notifier + 'static,
{
    config: Arc<ScannerConfig>,
    store: Option<Arc<S>>,
    notifier: Option<Arc<N>>,
}

impl<S, N> ScanSession<S, N>
where
    S: AttendanceStore + 'static,
    N: Notifier + 'static,
{
    pub fn new(config: ScannerConfig, store: Option<Arc<S>>, notifier: Option<Arc<N>>) -> ScannerResult<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            store,
            notifier,
        })
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Build the pipeline, seeding the registry when the policy remembers
    /// registrations
    ///
    /// A registry that fails to load is logged and the session starts with
    /// an empty set.
    pub async fn build_pipeline<R>(&self, registry: Option<&R>) -> IntakePipeline
    where
        R: RegistrySource + ?Sized,
    {
        let mut gate = DedupGate::new(self.config.cooldown, self.config.phone_rule.clone());

        if let (Some(registry), true) = (registry, self.config.registry_policy.remembers_registrations()) {
            match registry.load_registered().await {
                Ok(cells) => {
                    let phones = normalize_registry(&self.config, &cells);
                    let added = gate.seed_registered(phones);
                    component_info!(ComponentId::Host, "📋 Loaded {} registered phones", added);
                }
                Err(e) => {
                    component_warn!(ComponentId::Host, "⚠️ Could not load registered phones: {}", e);
                }
            }
        }

        IntakePipeline::new(gate)
    }

    /// Spawn the intake worker and the dispatcher
    pub fn start(&self, pipeline: IntakePipeline) -> SessionHandle {
        let (frame_tx, frame_rx) = mpsc::channel(self.config.queue_capacity);
        let (checkin_tx, checkin_rx) = mpsc::channel(self.config.queue_capacity);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let worker = IntakeWorker::new(pipeline, self.config.registry_policy, checkin_tx);
        let intake = tokio::spawn(worker.run(frame_rx, command_rx, shutdown_rx));

        let dispatcher = Dispatcher::new(self.config.clone(), self.store.clone(), self.notifier.clone())
            .with_feedback(command_tx.clone());
        let dispatcher = tokio::spawn(dispatcher.run(checkin_rx));

        SessionHandle {
            frame_tx,
            command_tx,
            shutdown_tx,
            intake,
            dispatcher,
        }
    }
}

/// Normalize raw registry cells, dropping cells without digits
pub fn normalize_registry(config: &ScannerConfig, cells: &[String]) -> Vec<NormalizedPhone> {
    cells.iter().filter_map(|cell| config.phone_rule.normalize_text(cell)).collect()
}
