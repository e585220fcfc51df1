//! Runtime plumbing for the binary: the single-threaded runtime, offloading
//! synchronous work, and Ctrl-C.

use crate::base::error::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tracing::error;

/// How long shutdown waits for offloaded work to finish and clean up.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

pub fn single_thread_runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

/// Run synchronous work (SQLite, keychain, log walks) on the blocking pool
/// so the runtime thread keeps polling the interrupt.
pub async fn run_blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => {
            error!(error = %e, "blocking task cancelled");
            Err(Error::Interrupted)
        }
    }
}

/// Resolves on the first Ctrl-C. If the handler cannot be installed it
/// never resolves.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// Drive `work` until it finishes or `interrupt` resolves.
///
/// `interrupt` is polled first, so a signal handler it installs is in
/// place before any of `work` runs.
pub async fn until_interrupted<W, I, T>(work: W, interrupt: I) -> Result<T>
where
    W: Future<Output = Result<T>>,
    I: Future<Output = ()>,
{
    tokio::pin!(interrupt);
    tokio::select! {
        biased;
        _ = &mut interrupt => Err(Error::Interrupted),
        result = work => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_run_blocking_returns_result() {
        assert_eq!(run_blocking(|| Ok(7)).await.unwrap(), 7);
        let err = run_blocking::<(), _>(|| Err(Error::InvalidInput("x".into())))
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn test_interrupt_wins_over_blocking_work() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();
        let work = run_blocking(move || {
            std::thread::sleep(Duration::from_millis(300));
            flag.store(true, Ordering::SeqCst);
            Ok("done")
        });
        let interrupt = tokio::time::sleep(Duration::from_millis(20));

        let err = until_interrupted(work, interrupt).await.unwrap_err();
        assert!(matches!(err, Error::Interrupted));
        assert_eq!(err.exit_code(), 130);
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_ready_interrupt_is_checked_first() {
        let polled = AtomicBool::new(false);
        let work = async {
            polled.store(true, Ordering::SeqCst);
            Ok(())
        };
        let err = until_interrupted(work, std::future::ready(()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Interrupted));
        assert!(!polled.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_work_result_passes_through() {
        let out = until_interrupted(async { Ok("out") }, std::future::pending())
            .await
            .unwrap();
        assert_eq!(out, "out");
    }
}
