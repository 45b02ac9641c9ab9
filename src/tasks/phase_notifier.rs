//! Shows a notification whenever a timer phase completes

use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use crate::{
    error::NotifyError,
    notify::{Notification, Notifier, DEFAULT_VIBRATE},
    state::{Phase, PhaseCompletion},
};

/// Background task that forwards phase completions to the notifier
pub async fn phase_notifier_task(
    mut phase_rx: broadcast::Receiver<PhaseCompletion>,
    notifier: Arc<dyn Notifier>,
) {
    info!("Starting phase notifier task");

    loop {
        match phase_rx.recv().await {
            Ok(done) => notify_phase_completion(notifier.as_ref(), done).await,
            Err(RecvError::Lagged(skipped)) => {
                warn!("Phase notifier lagged, skipped {} events", skipped);
            }
            Err(RecvError::Closed) => {
                debug!("Phase channel closed, stopping notifier");
                break;
            }
        }
    }
}

pub fn phase_notification(done: PhaseCompletion) -> Notification {
    let mut notification = match done.finished {
        Phase::Break => Notification::new("Break time is over!", "Time to get back to work!"),
        Phase::Work => Notification::new("Work session completed!", "Time for a break!"),
    };
    notification.vibrate = DEFAULT_VIBRATE.to_vec();
    notification
}

/// Display failures never reach the timer; denied or unsupported is skipped
/// quietly.
pub async fn notify_phase_completion(notifier: &dyn Notifier, done: PhaseCompletion) {
    match notifier.show(phase_notification(done)).await {
        Ok(()) => {}
        Err(NotifyError::PermissionDenied | NotifyError::Unsupported) => {
            debug!("Notifications unavailable, skipping phase notification");
        }
        Err(e) => warn!("Failed to show phase notification: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{LogNotifier, NotificationPermission, RecordingNotifier};

    #[test]
    fn work_completion_suggests_a_break() {
        let notification = phase_notification(PhaseCompletion {
            finished: Phase::Work,
            next: Phase::Break,
            completed_sessions: 1,
        });
        assert_eq!(notification.title, "Work session completed!");
        assert_eq!(notification.body, "Time for a break!");
        assert_eq!(notification.vibrate, vec![200, 100, 200]);
    }

    #[tokio::test]
    async fn forwards_completions_until_channel_closes() {
        let (tx, rx) = broadcast::channel(8);
        let notifier = Arc::new(RecordingNotifier::new());
        let task = tokio::spawn(phase_notifier_task(rx, notifier.clone()));

        tx.send(PhaseCompletion {
            finished: Phase::Break,
            next: Phase::Work,
            completed_sessions: 2,
        })
        .unwrap();
        drop(tx);
        task.await.unwrap();

        let shown = notifier.shown();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].title, "Break time is over!");
    }

    #[tokio::test]
    async fn denied_permission_is_not_fatal() {
        let notifier = LogNotifier::new(NotificationPermission::Denied);
        notify_phase_completion(
            &notifier,
            PhaseCompletion {
                finished: Phase::Work,
                next: Phase::Break,
                completed_sessions: 1,
            },
        )
        .await;
    }
}
