//! Runs the tasks an update deferred.

use parking_lot::Mutex;

use super::{AdapterTask, DisplayAdapter};

/// Execute deferred adapter tasks in order.
///
/// The adapter lock is never held across an await. Failures are logged and
/// the remaining tasks still run; a bootstrap after a failed restore is a
/// no-op because the restore phase has gone back to idle.
pub async fn drive(adapter: &Mutex<DisplayAdapter>, tasks: Vec<AdapterTask>) {
    for task in tasks {
        match task {
            AdapterTask::Autosave => {
                let result = adapter.lock().autosave();
                if let Err(e) = result {
                    tracing::warn!(error = %e, "autosave failed");
                }
            }
            AdapterTask::Restore => {
                // Let the first render land before it is replaced.
                tokio::task::yield_now().await;
                let result = adapter.lock().perform_restore();
                if let Err(e) = result {
                    tracing::error!(error = %e, "restore failed");
                }
            }
            AdapterTask::Bootstrap { after } => {
                tokio::time::sleep(after).await;
                let result = adapter.lock().send_bootstrap_input();
                if let Err(e) = result {
                    tracing::error!(error = %e, "bootstrap input failed");
                }
            }
        }
    }
}
