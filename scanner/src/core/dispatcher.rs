//! Dispatcher: the consumer side of a scan session
//!
//! Takes accepted check-ins off the queue and hands each one to the
//! attendance sheet and the notifier. Both are best effort and independent:
//! a failure is logged and reported, never retried, and never reverts the
//! gate decision that produced the check-in.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use shared::{component_debug, component_error, component_info, component_warn};
use shared::{AttendanceRow, CheckInEvent, ComponentId, DeliveryOutcome, DispatchReport, GateCommand};

use crate::error::{ScannerError, ScannerResult};
use crate::traits::{AttendanceStore, Notifier};
use crate::types::ScannerConfig;

/// Counters for one dispatcher run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub dispatched: u64,
    pub stored: u64,
    pub store_failures: u64,
    pub notified: u64,
    pub notify_failures: u64,
}

impl DispatchStats {
    fn record(&mut self, report: &DispatchReport) {
        self.dispatched += 1;
        match report.stored {
            DeliveryOutcome::Delivered => self.stored += 1,
            DeliveryOutcome::Failed { .. } => self.store_failures += 1,
            DeliveryOutcome::Skipped => {}
        }
        match report.notified {
            DeliveryOutcome::Delivered => self.notified += 1,
            DeliveryOutcome::Failed { .. } => self.notify_failures += 1,
            DeliveryOutcome::Skipped => {}
        }
    }
}

pub struct Dispatcher<S, N>
where
    S: AttendanceStore,
    N: Notifier,
{
    config: Arc<ScannerConfig>,

    // Collaborators, absent when not configured
    store: Option<Arc<S>>,
    notifier: Option<Arc<N>>,

    /// Back channel to the intake worker
    feedback_tx: Option<mpsc::UnboundedSender<GateCommand>>,

    stats: DispatchStats,
}

impl<S, N> Dispatcher<S, N>
where
    S: AttendanceStore,
    N: Notifier,
{
    pub fn new(config: Arc<ScannerConfig>, store: Option<Arc<S>>, notifier: Option<Arc<N>>) -> Self {
        Self {
            config,
            store,
            notifier,
            feedback_tx: None,
            stats: DispatchStats::default(),
        }
    }

    /// Report successful registrations back to the intake worker
    pub fn with_feedback(mut self, feedback_tx: mpsc::UnboundedSender<GateCommand>) -> Self {
        self.feedback_tx = Some(feedback_tx);
        self
    }

    /// Store and notify one check-in
    pub async fn dispatch(&mut self, event: CheckInEvent) -> DispatchReport {
        if let Ok(json) = event.to_json() {
            component_debug!(ComponentId::Dispatcher, event = %json, "Dispatching check-in");
        }

        let (stored, notified) = tokio::join!(self.store_event(&event), self.notify_event(&event));

        if stored.is_delivered() && event.record.has_phone() {
            self.confirm_registration(&event);
        }

        let report = DispatchReport {
            event_id: event.id,
            name: event.record.name.clone(),
            stored,
            notified,
        };
        self.stats.record(&report);
        report
    }

    async fn store_event(&self, event: &CheckInEvent) -> DeliveryOutcome {
        let Some(store) = &self.store else {
            return DeliveryOutcome::Skipped;
        };

        let row = AttendanceRow::from_event(event);
        match store.append_row(&row).await {
            Ok(()) => {
                component_info!(ComponentId::Dispatcher, event_id = %event.id, "✅ Saved: {}", row.name);
                DeliveryOutcome::Delivered
            }
            Err(e) => {
                component_error!(ComponentId::Dispatcher, event_id = %event.id, "❌ Sheet error: {}", e);
                DeliveryOutcome::Failed { reason: e.to_string() }
            }
        }
    }

    async fn notify_event(&self, event: &CheckInEvent) -> DeliveryOutcome {
        let Some(notifier) = &self.notifier else {
            return DeliveryOutcome::Skipped;
        };

        if !event.record.has_phone() {
            component_warn!(
                ComponentId::Dispatcher,
                event_id = %event.id,
                "⚠️ No phone in payload for {}, not sending welcome",
                event.record.name
            );
            return DeliveryOutcome::Skipped;
        }

        let body = self.config.welcome_message(&event.record.name);
        match notifier.send_message(&event.phone, &body).await {
            Ok(()) => {
                component_info!(ComponentId::Dispatcher, event_id = %event.id, "📨 Sent welcome to {}", event.phone);
                DeliveryOutcome::Delivered
            }
            Err(e) => {
                component_warn!(ComponentId::Dispatcher, event_id = %event.id, "⚠️ Notification error: {}", e);
                DeliveryOutcome::Failed { reason: e.to_string() }
            }
        }
    }

    fn confirm_registration(&self, event: &CheckInEvent) {
        if !self.config.registry_policy.remembers_registrations() {
            return;
        }
        if let Some(feedback_tx) = &self.feedback_tx {
            // intake may already be gone during shutdown
            let _ = feedback_tx.send(GateCommand::MarkRegistered(event.phone.clone()));
        }
    }

    /// Wait up to the poll timeout for one check-in
    ///
    /// `Ok(None)` means nothing arrived yet; a closed queue is an error.
    pub async fn poll_once(&mut self, checkin_rx: &mut mpsc::Receiver<CheckInEvent>) -> ScannerResult<Option<DispatchReport>> {
        let timeout: Duration = self.config.poll_timeout;
        match tokio::time::timeout(timeout, checkin_rx.recv()).await {
            Err(_) => Ok(None),
            Ok(None) => Err(ScannerError::channel_closed("check-in queue")),
            Ok(Some(event)) => Ok(Some(self.dispatch(event).await)),
        }
    }

    /// Poll until the intake side closes the queue, draining what is left
    pub async fn run(mut self, mut checkin_rx: mpsc::Receiver<CheckInEvent>) -> DispatchStats {
        component_info!(
            ComponentId::Dispatcher,
            "🚀 Dispatcher started (sheet: {}, notifier: {})",
            self.store.is_some(),
            self.notifier.is_some()
        );

        loop {
            match self.poll_once(&mut checkin_rx).await {
                Ok(_) => {}
                Err(ScannerError::ChannelClosed { .. }) => break,
                Err(e) => {
                    component_error!(ComponentId::Dispatcher, "❌ Dispatcher error: {}", e);
                    break;
                }
            }
        }

        component_info!(
            ComponentId::Dispatcher,
            "Dispatcher finished: {} check-ins, {} saved, {} sent",
            self.stats.dispatched,
            self.stats.stored,
            self.stats.notified
        );
        self.stats
    }

    pub fn get_stats(&self) -> &DispatchStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{MockAttendanceStore, MockNotifier};
    use chrono::{TimeZone, Utc};
    use shared::{AttendeeRecord, NormalizedPhone};

    fn event(name: &str, digits: &str) -> CheckInEvent {
        let record = AttendeeRecord { name: name.to_string(), phone: digits.to_string() };
        let phone = crate::core::phone::PhoneRule::default().normalize(digits);
        CheckInEvent::new(format!("{name} {digits}"), record, phone, Utc.timestamp_opt(1_700_000_000, 0).unwrap())
    }

    fn config() -> Arc<ScannerConfig> {
        Arc::new(ScannerConfig {
            poll_timeout: Duration::from_millis(20),
            ..ScannerConfig::default()
        })
    }

    #[tokio::test]
    async fn test_store_and_notify() {
        let mut store = MockAttendanceStore::new();
        store
            .expect_append_row()
            .withf(|row| row.name == "John Doe" && row.phone == "+9647701234567" && row.status.to_string() == "ARRIVED")
            .times(1)
            .returning(|_| Ok(()));

        let mut notifier = MockNotifier::new();
        notifier
            .expect_send_message()
            .withf(|to, body| to.as_str() == "+9647701234567" && body == "Welcome John Doe! You are checked in.")
            .times(1)
            .returning(|_, _| Ok(()));

        let (feedback_tx, mut feedback_rx) = mpsc::unbounded_channel();
        let mut dispatcher = Dispatcher::new(config(), Some(Arc::new(store)), Some(Arc::new(notifier))).with_feedback(feedback_tx);

        let report = dispatcher.dispatch(event("John Doe", "07701234567")).await;
        assert_eq!(report.stored, DeliveryOutcome::Delivered);
        assert_eq!(report.notified, DeliveryOutcome::Delivered);
        assert_eq!(
            feedback_rx.try_recv().unwrap(),
            GateCommand::MarkRegistered(NormalizedPhone::parse("+9647701234567").unwrap())
        );
    }

    #[tokio::test]
    async fn test_store_failure_does_not_block_notification() {
        let mut store = MockAttendanceStore::new();
        store
            .expect_append_row()
            .times(1)
            .returning(|_| Err(ScannerError::storage("quota exceeded")));

        let mut notifier = MockNotifier::new();
        notifier.expect_send_message().times(1).returning(|_, _| Ok(()));

        let (feedback_tx, mut feedback_rx) = mpsc::unbounded_channel();
        let mut dispatcher = Dispatcher::new(config(), Some(Arc::new(store)), Some(Arc::new(notifier))).with_feedback(feedback_tx);

        let report = dispatcher.dispatch(event("Jane", "07709999999")).await;
        assert!(matches!(report.stored, DeliveryOutcome::Failed { .. }));
        assert_eq!(report.notified, DeliveryOutcome::Delivered);
        // nothing persisted, nothing registered
        assert!(feedback_rx.try_recv().is_err());
        assert_eq!(dispatcher.get_stats().store_failures, 1);
    }

    #[tokio::test]
    async fn test_notify_failure_keeps_row() {
        let mut store = MockAttendanceStore::new();
        store.expect_append_row().times(1).returning(|_| Ok(()));

        let mut notifier = MockNotifier::new();
        notifier
            .expect_send_message()
            .times(1)
            .returning(|_, _| Err(ScannerError::notification("HTTP 400")));

        let mut dispatcher = Dispatcher::new(config(), Some(Arc::new(store)), Some(Arc::new(notifier)));

        let report = dispatcher.dispatch(event("Jane", "07709999999")).await;
        assert_eq!(report.stored, DeliveryOutcome::Delivered);
        assert!(matches!(report.notified, DeliveryOutcome::Failed { .. }));
        assert_eq!(dispatcher.get_stats().notify_failures, 1);
    }

    #[tokio::test]
    async fn test_missing_collaborators_are_skipped() {
        let mut dispatcher: Dispatcher<MockAttendanceStore, MockNotifier> = Dispatcher::new(config(), None, None);

        let report = dispatcher.dispatch(event("Jane", "07709999999")).await;
        assert_eq!(report.stored, DeliveryOutcome::Skipped);
        assert_eq!(report.notified, DeliveryOutcome::Skipped);
        assert_eq!(dispatcher.get_stats().dispatched, 1);
    }

    #[tokio::test]
    async fn test_no_phone_skips_notification_and_registration() {
        let mut store = MockAttendanceStore::new();
        store.expect_append_row().times(1).returning(|_| Ok(()));
        let mut notifier = MockNotifier::new();
        notifier.expect_send_message().never();

        let (feedback_tx, mut feedback_rx) = mpsc::unbounded_channel();
        let mut dispatcher = Dispatcher::new(config(), Some(Arc::new(store)), Some(Arc::new(notifier))).with_feedback(feedback_tx);

        let report = dispatcher.dispatch(event("Walk-in", "")).await;
        assert_eq!(report.stored, DeliveryOutcome::Delivered);
        assert_eq!(report.notified, DeliveryOutcome::Skipped);
        assert!(feedback_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_session_policy_sends_no_feedback() {
        let mut store = MockAttendanceStore::new();
        store.expect_append_row().returning(|_| Ok(()));

        let config = Arc::new(ScannerConfig {
            registry_policy: crate::types::RegistryPolicy::SessionCooldown,
            ..ScannerConfig::default()
        });
        let (feedback_tx, mut feedback_rx) = mpsc::unbounded_channel();
        let mut dispatcher: Dispatcher<MockAttendanceStore, MockNotifier> =
            Dispatcher::new(config, Some(Arc::new(store)), None).with_feedback(feedback_tx);

        dispatcher.dispatch(event("Jane", "07709999999")).await;
        assert!(feedback_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_poll_once_times_out_then_sees_close() {
        let mut dispatcher: Dispatcher<MockAttendanceStore, MockNotifier> = Dispatcher::new(config(), None, None);
        let (tx, mut rx) = mpsc::channel(4);

        assert!(dispatcher.poll_once(&mut rx).await.unwrap().is_none());

        tx.send(event("Jane", "07709999999")).await.unwrap();
        assert!(dispatcher.poll_once(&mut rx).await.unwrap().is_some());

        drop(tx);
        assert!(matches!(
            dispatcher.poll_once(&mut rx).await,
            Err(ScannerError::ChannelClosed { .. })
        ));
    }

    #[tokio::test]
    async fn test_run_drains_queue_in_order() {
        let mut store = MockAttendanceStore::new();
        let mut seq = mockall::Sequence::new();
        for name in ["First", "Second", "Third"] {
            store
                .expect_append_row()
                .withf(move |row| row.name == name)
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| Ok(()));
        }

        let dispatcher: Dispatcher<MockAttendanceStore, MockNotifier> = Dispatcher::new(config(), Some(Arc::new(store)), None);
        let (tx, rx) = mpsc::channel(8);
        tx.send(event("First", "1")).await.unwrap();
        tx.send(event("Second", "2")).await.unwrap();
        tx.send(event("Third", "3")).await.unwrap();
        drop(tx);

        let stats = dispatcher.run(rx).await;
        assert_eq!(stats.dispatched, 3);
        assert_eq!(stats.stored, 3);
    }
}
