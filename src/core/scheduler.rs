//! Timer tasks for the monitor engine.
//!
//! Every timed behavior in the engine -- the fallback poll, the path probe,
//! the settle-delay re-check, the enforcer tick -- is a background thread that
//! posts a message into the engine's channel when its period elapses. Tasks
//! never touch engine state directly, and each one is armed with an explicit
//! cancellation token so shutdown is provable rather than implicit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Granularity of cancellation checks while a task sleeps.
const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// Handle to a scheduled task. Dropping the token does not cancel the task;
/// cancellation is always an explicit call.
#[derive(Clone, Debug)]
pub struct TaskToken {
    cancelled: Arc<AtomicBool>,
}

impl TaskToken {
    fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Cancel the task. Takes effect before its next message is sent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Arm a task that sends `msg` into `tx` after `period`, once or repeatedly.
///
/// The task exits on cancellation or when the receiving end goes away,
/// whichever happens first.
pub fn spawn_task<M>(tx: Sender<M>, msg: M, period: Duration, repeating: bool) -> TaskToken
where
    M: Clone + Send + 'static,
{
    let token = TaskToken::new();
    let task_token = token.clone();

    thread::spawn(move || loop {
        let deadline = Instant::now() + period;
        while Instant::now() < deadline {
            if task_token.is_cancelled() {
                return;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            thread::sleep(remaining.min(SLEEP_SLICE));
        }
        if task_token.is_cancelled() || tx.send(msg.clone()).is_err() {
            return;
        }
        if !repeating {
            return;
        }
    });

    token
}
