//! Countdown timer for quizzes with a time limit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use learnpath_core::QuizDefinition;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::debug;

/// Remaining seconds at or below which the timer is in its warning state.
pub const WARNING_SECONDS: u32 = 60;

const TICK: Duration = Duration::from_secs(1);

/// `m:ss` form of a second count.
pub fn format_remaining(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// One-second countdown that fires a completion callback at zero.
///
/// The tick runs on a spawned tokio task; `start` must be called inside a
/// runtime. Once the callback has fired it cannot be taken back.
pub struct QuizTimer {
    duration: u32,
    remaining: watch::Receiver<u32>,
    sender: Option<watch::Sender<u32>>,
    paused: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl QuizTimer {
    /// A stopped timer of `seconds`.
    pub fn new(seconds: u32) -> Self {
        let (sender, remaining) = watch::channel(seconds);
        Self {
            duration: seconds,
            remaining,
            sender: Some(sender),
            paused: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }

    /// Timer for a quiz's `time_limit` in minutes, if it has one.
    pub fn for_quiz(quiz: &QuizDefinition) -> Option<Self> {
        quiz.time_limit
            .filter(|minutes| *minutes > 0)
            .map(|minutes| Self::new(minutes.saturating_mul(60)))
    }

    /// Start ticking. Has no effect on a timer that was already started.
    pub fn start<F>(&mut self, on_complete: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let Some(sender) = self.sender.take() else {
            return;
        };
        let paused = Arc::clone(&self.paused);
        debug!("Quiz timer started: {}", format_remaining(self.duration));

        self.task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + TICK, TICK);
            loop {
                ticker.tick().await;
                if paused.load(Ordering::SeqCst) {
                    continue;
                }

                let mut left = 0;
                sender.send_modify(|remaining| {
                    *remaining = remaining.saturating_sub(1);
                    left = *remaining;
                });
                if left == 0 {
                    debug!("Quiz timer expired");
                    on_complete();
                    return;
                }
            }
        }));
    }

    /// Freeze the countdown.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    /// Continue after `pause`.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    /// Whether the countdown is frozen.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Stop ticking for good without firing the callback.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Whether the countdown task is alive.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Seconds left.
    pub fn remaining(&self) -> u32 {
        *self.remaining.borrow()
    }

    /// Remaining time as `m:ss`.
    pub fn display(&self) -> String {
        format_remaining(self.remaining())
    }

    /// Time is running out.
    pub fn is_warning(&self) -> bool {
        self.remaining() <= WARNING_SECONDS
    }

    /// Follow the remaining seconds as they tick.
    pub fn subscribe(&self) -> watch::Receiver<u32> {
        self.remaining.clone()
    }
}

impl Drop for QuizTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
