use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{watch, Notify};
use tracing::{debug, info, warn};
use uuid::Uuid;

use aviso_core::config::{CLAMP_EPSILON_SECS, SEND_TIMEOUT_SECS};
use aviso_core::types::TemplateKind;
use aviso_notify::Notifier;

use crate::{
    error::{Result, SchedulerError},
    store::JobStore,
    types::{JobState, PendingSummary, ReminderJob, ReminderPayload, ScheduleOutcome},
};

struct Inner {
    /// The pending set. Holds only `Pending` jobs; a job leaves the map the
    /// moment it transitions to `Fired` or `Cancelled`, so whoever removes it
    /// under the lock owns the terminal transition.
    jobs: Mutex<HashMap<String, ReminderJob>>,
    /// Wakes the timing loop when a new job may move the earliest deadline.
    wake: Notify,
    notifier: Arc<dyn Notifier>,
    store: Option<JobStore>,
    /// How far forward a past-due `fire_at` is pushed.
    clamp_epsilon: Duration,
}

/// Handle to the reminder scheduler. Cheap to clone; all clones share the
/// same pending set and timing loop.
///
/// Construct one per composition root; there is deliberately no process-wide
/// instance, so tests can run several schedulers side by side.
#[derive(Clone)]
pub struct ReminderScheduler {
    inner: Arc<Inner>,
}

impl ReminderScheduler {
    /// `store` is the optional restart checkpoint; pass `None` for a purely
    /// in-memory scheduler.
    pub fn new(notifier: Arc<dyn Notifier>, store: Option<JobStore>) -> Self {
        Self::with_clamp_epsilon(notifier, store, Duration::seconds(CLAMP_EPSILON_SECS))
    }

    /// Like [`new`](Self::new) with an explicit clamp window. Tests use a
    /// sub-second epsilon so past-due jobs fire without a long wall-clock wait.
    pub fn with_clamp_epsilon(
        notifier: Arc<dyn Notifier>,
        store: Option<JobStore>,
        clamp_epsilon: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                jobs: Mutex::new(HashMap::new()),
                wake: Notify::new(),
                notifier,
                store,
                clamp_epsilon,
            }),
        }
    }

    /// Re-populate the pending set from the checkpoint store. Call once at
    /// startup, before or after spawning [`run`](Self::run). Returns the
    /// number of reloaded jobs.
    pub fn reload(&self) -> Result<usize> {
        let Some(store) = &self.inner.store else {
            return Ok(0);
        };
        let jobs = store.load_pending()?;
        let count = jobs.len();
        let now = Utc::now();
        let past_due = jobs.iter().filter(|j| j.fire_at <= now).count();

        {
            let mut pending = self.inner.jobs.lock().unwrap();
            for job in jobs {
                pending.insert(job.id.clone(), job);
            }
        }

        if past_due > 0 {
            // Never drop a reminder that came due while the process was down.
            warn!(
                count = past_due,
                "reloaded jobs already past due; firing them now"
            );
        }
        if count > 0 {
            info!(count, "reloaded pending reminders from checkpoint");
            self.inner.wake.notify_one();
        }
        Ok(count)
    }

    /// Insert a new pending job. Returns the assigned id and effective fire
    /// time without waiting for the job to fire.
    ///
    /// A `fire_at` in the past is not an error: it is clamped to
    /// now + [`CLAMP_EPSILON_SECS`] and flagged in the outcome.
    pub fn schedule(
        &self,
        fire_at: DateTime<Utc>,
        description: &str,
        payload: ReminderPayload,
    ) -> Result<ScheduleOutcome> {
        if payload.recipient.trim().is_empty() {
            return Err(SchedulerError::InvalidJob(
                "recipient must not be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let clamped = fire_at <= now;
        let effective = if clamped {
            now + self.inner.clamp_epsilon
        } else {
            fire_at
        };
        if clamped {
            warn!(
                requested = %fire_at,
                fire_at = %effective,
                "requested fire time already passed; clamped forward"
            );
        }

        let job = ReminderJob {
            id: Uuid::new_v4().to_string(),
            description: description.to_string(),
            fire_at: effective,
            payload,
            state: JobState::Pending,
            created_at: now,
        };
        let id = job.id.clone();

        if let Some(store) = &self.inner.store {
            store.insert(&job)?;
        }

        self.inner.jobs.lock().unwrap().insert(id.clone(), job);
        // Always poke the loop; it recomputes the earliest deadline on every
        // pass, so a spurious wake is harmless and a missed one is not possible.
        self.inner.wake.notify_one();

        info!(job_id = %id, fire_at = %effective, clamped, "reminder scheduled");
        Ok(ScheduleOutcome {
            id,
            fire_at: effective,
            clamped,
        })
    }

    /// Schedule the two independent per-party reminders for one session.
    ///
    /// The effective fire time is `session_start - lead_minutes`; both jobs
    /// share the session id as correlation id but fire, fail and cancel
    /// independently.
    pub fn schedule_session_reminder(
        &self,
        session_id: &str,
        session_start: DateTime<Utc>,
        recipients: &[(&str, &str)],
        lead_minutes: i64,
    ) -> Result<Vec<ScheduleOutcome>> {
        if session_id.trim().is_empty() {
            return Err(SchedulerError::InvalidJob(
                "session_id must not be empty".to_string(),
            ));
        }
        if lead_minutes < 0 {
            return Err(SchedulerError::InvalidJob(format!(
                "lead_minutes must be non-negative, got {lead_minutes}"
            )));
        }

        let fire_at = session_start - Duration::minutes(lead_minutes);
        let context: HashMap<String, String> = HashMap::from([
            ("session_id".to_string(), session_id.to_string()),
            (
                "date".to_string(),
                session_start.format("%Y-%m-%d").to_string(),
            ),
            ("time".to_string(), session_start.format("%H:%M").to_string()),
        ]);

        let mut outcomes = Vec::with_capacity(recipients.len());
        for (role, recipient) in recipients {
            let outcome = self.schedule(
                fire_at,
                &format!("Session {session_id} reminder ({role})"),
                ReminderPayload {
                    recipient: recipient.to_string(),
                    kind: TemplateKind::Reminder,
                    context: context.clone(),
                    correlation_id: session_id.to_string(),
                },
            )?;
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Cancel a pending job. Returns `true` only when this call performed the
    /// `Pending -> Cancelled` transition; unknown, fired and already-cancelled
    /// ids all return `false` with no side effect.
    pub fn cancel(&self, id: &str) -> bool {
        let removed = self.inner.jobs.lock().unwrap().remove(id);
        match removed {
            Some(_) => {
                if let Some(store) = &self.inner.store {
                    if let Err(e) = store.remove(id) {
                        warn!(job_id = %id, error = %e, "failed to clear cancelled job from checkpoint");
                    }
                }
                info!(job_id = %id, "reminder cancelled");
                true
            }
            None => {
                debug!(job_id = %id, "cancel: job unknown or already finished");
                false
            }
        }
    }

    /// Snapshot of the pending set, ascending by fire time (ties broken by
    /// id so the order is stable).
    pub fn list_pending(&self) -> Vec<PendingSummary> {
        let jobs = self.inner.jobs.lock().unwrap();
        let mut pending: Vec<PendingSummary> = jobs
            .values()
            .map(|j| PendingSummary {
                id: j.id.clone(),
                description: j.description.clone(),
                fire_at: j.fire_at,
            })
            .collect();
        pending.sort_by(|a, b| a.fire_at.cmp(&b.fire_at).then_with(|| a.id.cmp(&b.id)));
        pending
    }

    /// Timing loop. Sleeps until the earliest pending `fire_at` (or
    /// indefinitely when idle), wakes early when `schedule` inserts a job,
    /// and exits when `shutdown` broadcasts `true`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("reminder scheduler started");
        loop {
            match self.earliest_deadline() {
                None => {
                    tokio::select! {
                        _ = self.inner.wake.notified() => {}
                        res = shutdown.changed() => {
                            // A closed channel counts as shutdown.
                            if res.is_err() || *shutdown.borrow() {
                                break;
                            }
                        }
                    }
                }
                Some(deadline) => {
                    let wait = (deadline - Utc::now())
                        .to_std()
                        .unwrap_or(std::time::Duration::ZERO);
                    tokio::select! {
                        _ = tokio::time::sleep(wait) => {
                            self.fire_due();
                        }
                        // A newly scheduled job may have an earlier deadline;
                        // loop around and re-arm.
                        _ = self.inner.wake.notified() => {}
                        res = shutdown.changed() => {
                            if res.is_err() || *shutdown.borrow() {
                                break;
                            }
                        }
                    }
                }
            }
        }
        info!("reminder scheduler stopped");
    }

    fn earliest_deadline(&self) -> Option<DateTime<Utc>> {
        let jobs = self.inner.jobs.lock().unwrap();
        jobs.values().map(|j| j.fire_at).min()
    }

    /// Transition every due job to `Fired` and dispatch its delivery on its
    /// own task. All due jobs are drained in one pass; one bad or slow
    /// delivery never holds back the rest.
    fn fire_due(&self) {
        let now = Utc::now();
        let due: Vec<ReminderJob> = {
            let mut jobs = self.inner.jobs.lock().unwrap();
            let ids: Vec<String> = jobs
                .values()
                .filter(|j| j.fire_at <= now)
                .map(|j| j.id.clone())
                .collect();
            ids.iter().filter_map(|id| jobs.remove(id)).collect()
        };

        for mut job in due {
            job.state = JobState::Fired;
            if let Some(store) = &self.inner.store {
                if let Err(e) = store.remove(&job.id) {
                    warn!(job_id = %job.id, error = %e, "failed to clear fired job from checkpoint");
                }
            }
            info!(
                job_id = %job.id,
                recipient = %job.payload.recipient,
                correlation_id = %job.payload.correlation_id,
                "firing reminder"
            );
            let notifier = Arc::clone(&self.inner.notifier);
            tokio::spawn(deliver(notifier, job));
        }
    }
}

/// One delivery attempt, bounded by [`SEND_TIMEOUT_SECS`]. The job is already
/// `Fired`; whatever happens here is logged and the job is done (no retry).
async fn deliver(notifier: Arc<dyn Notifier>, job: ReminderJob) {
    let send = notifier.send(&job.payload.recipient, job.payload.kind, &job.payload.context);
    match tokio::time::timeout(std::time::Duration::from_secs(SEND_TIMEOUT_SECS), send).await {
        Ok(Ok(receipt)) => {
            info!(
                job_id = %job.id,
                transport = %receipt.transport,
                detail = %receipt.detail,
                simulated = receipt.simulated,
                "reminder delivered"
            );
        }
        Ok(Err(e)) => {
            warn!(
                job_id = %job.id,
                recipient = %job.payload.recipient,
                error = %e,
                "reminder delivery failed"
            );
        }
        Err(_) => {
            warn!(
                job_id = %job.id,
                recipient = %job.payload.recipient,
                timeout_secs = SEND_TIMEOUT_SECS,
                "reminder delivery timed out"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration as StdDuration;

    use async_trait::async_trait;
    use aviso_notify::{NotifyError, SendReceipt};

    use super::*;

    /// Records every invocation instead of sending anything.
    struct RecordingNotifier {
        sent: Mutex<Vec<(String, TemplateKind)>>,
    }

    impl RecordingNotifier {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
            })
        }

        fn recipients(&self) -> Vec<String> {
            self.sent.lock().unwrap().iter().map(|(r, _)| r.clone()).collect()
        }

        fn count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        fn name(&self) -> &str {
            "recording"
        }

        async fn send(
            &self,
            recipient: &str,
            kind: TemplateKind,
            _context: &HashMap<String, String>,
        ) -> std::result::Result<SendReceipt, NotifyError> {
            self.sent
                .lock()
                .unwrap()
                .push((recipient.to_string(), kind));
            Ok(SendReceipt {
                transport: "recording".to_string(),
                detail: "ok".to_string(),
                simulated: true,
            })
        }
    }

    fn payload(recipient: &str) -> ReminderPayload {
        ReminderPayload {
            recipient: recipient.to_string(),
            kind: TemplateKind::Reminder,
            context: HashMap::new(),
            correlation_id: "S1".to_string(),
        }
    }

    /// Spawn the timing loop; dropping or flipping the returned sender stops it.
    fn start(scheduler: &ReminderScheduler) -> watch::Sender<bool> {
        let (tx, rx) = watch::channel(false);
        tokio::spawn(scheduler.clone().run(rx));
        tx
    }

    fn in_millis(ms: i64) -> DateTime<Utc> {
        Utc::now() + Duration::milliseconds(ms)
    }

    #[tokio::test]
    async fn fires_job_after_due_time() {
        let notifier = RecordingNotifier::new();
        let scheduler = ReminderScheduler::new(notifier.clone(), None);
        let _shutdown = start(&scheduler);

        scheduler
            .schedule(in_millis(200), "test", payload("a@example.com"))
            .unwrap();

        tokio::time::sleep(StdDuration::from_millis(800)).await;
        assert_eq!(notifier.recipients(), vec!["a@example.com"]);
        assert!(scheduler.list_pending().is_empty());
    }

    #[tokio::test]
    async fn does_not_fire_before_due_time() {
        let notifier = RecordingNotifier::new();
        let scheduler = ReminderScheduler::new(notifier.clone(), None);
        let _shutdown = start(&scheduler);

        scheduler
            .schedule(in_millis(10_000), "test", payload("a@example.com"))
            .unwrap();

        tokio::time::sleep(StdDuration::from_millis(400)).await;
        assert_eq!(notifier.count(), 0);
        assert_eq!(scheduler.list_pending().len(), 1);
    }

    #[tokio::test]
    async fn drains_all_due_jobs_in_one_wake() {
        let notifier = RecordingNotifier::new();
        let scheduler = ReminderScheduler::new(notifier.clone(), None);
        let _shutdown = start(&scheduler);

        let at = in_millis(200);
        for addr in ["a@example.com", "b@example.com", "c@example.com"] {
            scheduler.schedule(at, "batch", payload(addr)).unwrap();
        }

        tokio::time::sleep(StdDuration::from_millis(800)).await;
        let mut recipients = notifier.recipients();
        recipients.sort();
        assert_eq!(
            recipients,
            vec!["a@example.com", "b@example.com", "c@example.com"]
        );
        assert!(scheduler.list_pending().is_empty());
    }

    #[tokio::test]
    async fn earlier_job_rearms_the_loop() {
        let notifier = RecordingNotifier::new();
        let scheduler = ReminderScheduler::new(notifier.clone(), None);
        let _shutdown = start(&scheduler);

        // Arm the loop far in the future, then slot in an earlier job.
        scheduler
            .schedule(in_millis(60_000), "late", payload("late@example.com"))
            .unwrap();
        tokio::time::sleep(StdDuration::from_millis(100)).await;
        scheduler
            .schedule(in_millis(200), "early", payload("early@example.com"))
            .unwrap();

        tokio::time::sleep(StdDuration::from_millis(800)).await;
        assert_eq!(notifier.recipients(), vec!["early@example.com"]);
        assert_eq!(scheduler.list_pending().len(), 1);
    }

    #[tokio::test]
    async fn past_due_fire_time_is_clamped_forward() {
        let notifier = RecordingNotifier::new();
        let scheduler = ReminderScheduler::new(notifier, None);

        let before = Utc::now();
        let outcome = scheduler
            .schedule(before - Duration::minutes(5), "late", payload("a@example.com"))
            .unwrap();

        assert!(outcome.clamped);
        assert!(outcome.fire_at > before);
        assert!(outcome.fire_at <= before + Duration::seconds(CLAMP_EPSILON_SECS + 2));
        assert_eq!(scheduler.list_pending().len(), 1);
    }

    #[tokio::test]
    async fn clamped_job_fires_within_bounded_window() {
        let notifier = RecordingNotifier::new();
        // 200ms epsilon stands in for the production window so the send is
        // observable without a multi-second wait.
        let scheduler = ReminderScheduler::with_clamp_epsilon(
            notifier.clone(),
            None,
            Duration::milliseconds(200),
        );
        let _shutdown = start(&scheduler);

        let outcome = scheduler
            .schedule(
                Utc::now() - Duration::minutes(5),
                "already due",
                payload("late@example.com"),
            )
            .unwrap();
        assert!(outcome.clamped);

        tokio::time::sleep(StdDuration::from_millis(800)).await;
        assert_eq!(notifier.recipients(), vec!["late@example.com"]);
        assert!(scheduler.list_pending().is_empty());
    }

    #[tokio::test]
    async fn clamped_session_reminder_fires_both_recipients() {
        let notifier = RecordingNotifier::new();
        let scheduler = ReminderScheduler::with_clamp_epsilon(
            notifier.clone(),
            None,
            Duration::milliseconds(200),
        );
        let _shutdown = start(&scheduler);

        // Session 10 minutes out with a 30-minute lead: the computed fire time
        // is in the past, so both per-party jobs clamp and fire right away.
        let outcomes = scheduler
            .schedule_session_reminder(
                "SES-42",
                Utc::now() + Duration::minutes(10),
                &[("developer", "dev@example.com"), ("client", "cli@example.com")],
                30,
            )
            .unwrap();
        assert!(outcomes.iter().all(|o| o.clamped));

        tokio::time::sleep(StdDuration::from_millis(800)).await;
        let mut recipients = notifier.recipients();
        recipients.sort();
        assert_eq!(recipients, vec!["cli@example.com", "dev@example.com"]);
        assert!(scheduler.list_pending().is_empty());
    }

    #[tokio::test]
    async fn cancel_before_fire_prevents_send() {
        let notifier = RecordingNotifier::new();
        let scheduler = ReminderScheduler::new(notifier.clone(), None);
        let _shutdown = start(&scheduler);

        let outcome = scheduler
            .schedule(in_millis(300), "test", payload("a@example.com"))
            .unwrap();

        assert!(scheduler.cancel(&outcome.id));
        // Terminal state: a second cancel is a no-op.
        assert!(!scheduler.cancel(&outcome.id));

        tokio::time::sleep(StdDuration::from_millis(800)).await;
        assert_eq!(notifier.count(), 0);
        assert!(scheduler.list_pending().is_empty());
    }

    #[tokio::test]
    async fn shutdown_signal_stops_the_loop() {
        let notifier = RecordingNotifier::new();
        let scheduler = ReminderScheduler::new(notifier.clone(), None);
        let shutdown = start(&scheduler);

        shutdown.send(true).unwrap();
        tokio::time::sleep(StdDuration::from_millis(100)).await;

        // The loop is gone; a job coming due afterwards stays pending.
        scheduler
            .schedule(in_millis(100), "orphan", payload("a@example.com"))
            .unwrap();
        tokio::time::sleep(StdDuration::from_millis(500)).await;
        assert_eq!(notifier.count(), 0);
        assert_eq!(scheduler.list_pending().len(), 1);
    }

    #[tokio::test]
    async fn cancel_unknown_id_returns_false() {
        let scheduler = ReminderScheduler::new(RecordingNotifier::new(), None);
        assert!(!scheduler.cancel("no-such-job"));
    }

    #[tokio::test]
    async fn list_pending_is_sorted_by_fire_time() {
        let scheduler = ReminderScheduler::new(RecordingNotifier::new(), None);

        let c = scheduler
            .schedule(in_millis(30_000), "c", payload("c@example.com"))
            .unwrap();
        let a = scheduler
            .schedule(in_millis(10_000), "a", payload("a@example.com"))
            .unwrap();
        let b = scheduler
            .schedule(in_millis(20_000), "b", payload("b@example.com"))
            .unwrap();

        let ids: Vec<String> = scheduler.list_pending().iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids, vec![a.id, b.id, c.id.clone()]);

        scheduler.cancel(&c.id);
        assert_eq!(scheduler.list_pending().len(), 2);
    }

    #[tokio::test]
    async fn ids_are_unique_under_rapid_scheduling() {
        let scheduler = ReminderScheduler::new(RecordingNotifier::new(), None);
        let mut ids = std::collections::HashSet::new();
        for _ in 0..100 {
            let outcome = scheduler
                .schedule(in_millis(60_000), "burst", payload("a@example.com"))
                .unwrap();
            assert!(ids.insert(outcome.id));
        }
    }

    #[tokio::test]
    async fn blank_recipient_is_rejected() {
        let scheduler = ReminderScheduler::new(RecordingNotifier::new(), None);
        let err = scheduler
            .schedule(in_millis(1000), "bad", payload("   "))
            .unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidJob(_)));
        assert!(scheduler.list_pending().is_empty());
    }

    #[tokio::test]
    async fn session_reminder_creates_one_job_per_recipient() {
        let notifier = RecordingNotifier::new();
        let scheduler = ReminderScheduler::new(notifier.clone(), None);

        // Session in 10 minutes, lead of 30: the computed fire time is in the
        // past, so both jobs clamp forward instead of being dropped.
        let outcomes = scheduler
            .schedule_session_reminder(
                "SES-42",
                Utc::now() + Duration::minutes(10),
                &[("developer", "dev@example.com"), ("client", "cli@example.com")],
                30,
            )
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.clamped));
        assert_ne!(outcomes[0].id, outcomes[1].id);

        let pending = scheduler.list_pending();
        assert_eq!(pending.len(), 2);
        assert!(pending.iter().any(|p| p.description.contains("developer")));
        assert!(pending.iter().any(|p| p.description.contains("client")));
    }

    #[tokio::test]
    async fn negative_lead_is_rejected() {
        let scheduler = ReminderScheduler::new(RecordingNotifier::new(), None);
        let err = scheduler
            .schedule_session_reminder(
                "SES-1",
                Utc::now() + Duration::hours(1),
                &[("developer", "dev@example.com")],
                -5,
            )
            .unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidJob(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancel_fire_race_settles_on_exactly_one_outcome() {
        let notifier = RecordingNotifier::new();
        let scheduler = ReminderScheduler::new(notifier.clone(), None);
        let _shutdown = start(&scheduler);

        let outcome = scheduler
            .schedule(in_millis(150), "race", payload("race@example.com"))
            .unwrap();

        // Hammer cancel until it wins or the job demonstrably fired.
        let mut cancelled = false;
        let deadline = std::time::Instant::now() + StdDuration::from_secs(3);
        while std::time::Instant::now() < deadline {
            if scheduler.cancel(&outcome.id) {
                cancelled = true;
                break;
            }
            if notifier.count() > 0 {
                break;
            }
            tokio::time::sleep(StdDuration::from_millis(1)).await;
        }

        // Let any in-flight delivery settle, then check the terminal state.
        tokio::time::sleep(StdDuration::from_millis(300)).await;
        let fired = notifier.count();
        if cancelled {
            assert_eq!(fired, 0, "job both cancelled and fired");
        } else {
            assert_eq!(fired, 1, "job neither cancelled nor fired exactly once");
        }
        assert!(scheduler.list_pending().is_empty());
    }
}
