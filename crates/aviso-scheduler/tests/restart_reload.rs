//! Restart durability: a scheduler built over the same checkpoint file picks
//! up the pending jobs a previous instance left behind.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rusqlite::Connection;
use tokio::sync::watch;

use aviso_core::types::TemplateKind;
use aviso_notify::{Notifier, NotifyError, SendReceipt};
use aviso_scheduler::{JobStore, ReminderPayload, ReminderScheduler};

struct RecordingNotifier {
    sent: Mutex<Vec<String>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(
        &self,
        recipient: &str,
        _kind: TemplateKind,
        _context: &HashMap<String, String>,
    ) -> Result<SendReceipt, NotifyError> {
        self.sent.lock().unwrap().push(recipient.to_string());
        Ok(SendReceipt {
            transport: "recording".to_string(),
            detail: "ok".to_string(),
            simulated: true,
        })
    }
}

fn recording() -> Arc<RecordingNotifier> {
    Arc::new(RecordingNotifier {
        sent: Mutex::new(Vec::new()),
    })
}

fn payload(recipient: &str) -> ReminderPayload {
    ReminderPayload {
        recipient: recipient.to_string(),
        kind: TemplateKind::Reminder,
        context: HashMap::new(),
        correlation_id: "SES-1".to_string(),
    }
}

fn temp_db_path(tag: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("aviso-{tag}-{}.db", uuid::Uuid::new_v4()))
}

#[tokio::test]
async fn pending_jobs_survive_a_restart() {
    let path = temp_db_path("reload");

    // First instance: schedule and shut down without firing.
    {
        let store = JobStore::new(Connection::open(&path).unwrap()).unwrap();
        let scheduler = ReminderScheduler::new(recording(), Some(store));
        scheduler
            .schedule(
                Utc::now() + Duration::minutes(30),
                "Session SES-1 reminder (developer)",
                payload("dev@example.com"),
            )
            .unwrap();
        assert_eq!(scheduler.list_pending().len(), 1);
    }

    // Second instance over the same file: reload re-populates the set.
    let store = JobStore::new(Connection::open(&path).unwrap()).unwrap();
    let scheduler = ReminderScheduler::new(recording(), Some(store));
    assert_eq!(scheduler.reload().unwrap(), 1);

    let pending = scheduler.list_pending();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].description, "Session SES-1 reminder (developer)");

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn past_due_job_fires_shortly_after_reload() {
    let path = temp_db_path("pastdue");

    {
        let store = JobStore::new(Connection::open(&path).unwrap()).unwrap();
        let scheduler = ReminderScheduler::new(recording(), Some(store));
        scheduler
            .schedule(
                Utc::now() + Duration::milliseconds(100),
                "about to be missed",
                payload("late@example.com"),
            )
            .unwrap();
        // Let the fire time pass while nothing is running.
        tokio::time::sleep(StdDuration::from_millis(300)).await;
    }

    let notifier = recording();
    let store = JobStore::new(Connection::open(&path).unwrap()).unwrap();
    let scheduler = ReminderScheduler::new(notifier.clone(), Some(store));
    assert_eq!(scheduler.reload().unwrap(), 1);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(scheduler.clone().run(shutdown_rx));

    tokio::time::sleep(StdDuration::from_millis(600)).await;
    assert_eq!(
        notifier.sent.lock().unwrap().as_slice(),
        ["late@example.com"]
    );
    assert!(scheduler.list_pending().is_empty());

    let _ = shutdown_tx.send(true);
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn fired_jobs_are_not_reloaded() {
    let path = temp_db_path("fired");

    {
        let notifier = recording();
        let store = JobStore::new(Connection::open(&path).unwrap()).unwrap();
        let scheduler = ReminderScheduler::new(notifier.clone(), Some(store));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(scheduler.clone().run(shutdown_rx));

        scheduler
            .schedule(
                Utc::now() + Duration::milliseconds(100),
                "fires now",
                payload("a@example.com"),
            )
            .unwrap();
        tokio::time::sleep(StdDuration::from_millis(600)).await;
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
        let _ = shutdown_tx.send(true);
    }

    let store = JobStore::new(Connection::open(&path).unwrap()).unwrap();
    let scheduler = ReminderScheduler::new(recording(), Some(store));
    assert_eq!(scheduler.reload().unwrap(), 0);

    let _ = std::fs::remove_file(&path);
}
