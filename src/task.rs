//! Background tasks with progress and log events.
//!
//! Long-running jobs (importing a screen's annotations, fitting an HMM over
//! thousands of tracks) run on a dedicated thread. The caller keeps its own
//! loop responsive by draining [`TaskEvent`]s from a channel and can request
//! cancellation through a shared abort flag.
//!
//! ```text
//! ┌─────────────┐      TaskEvent channel      ┌─────────────────┐
//! │  Caller     │ ◀──Progress/Log/Finished──  │ Worker thread   │
//! │  (UI / CLI) │                             │ f(&TaskContext) │
//! │             │ ───────abort flag────────▶  │                 │
//! └─────────────┘       Arc<AtomicBool>       └─────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use cecog::task::{spawn, TaskEvent};
//!
//! let handle = spawn("count", |ctx| {
//!     for i in 0..10 {
//!         ctx.check_abort()?;
//!         ctx.progress(i + 1, 10, "counting");
//!     }
//!     Ok(10)
//! })?;
//!
//! for event in handle.events() {
//!     if let TaskEvent::Progress { done, total, .. } = event {
//!         assert!(done <= total);
//!     }
//! }
//! assert_eq!(handle.join()?, 10);
//! # Ok::<(), cecog::task::TaskError>(())
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use chrono::{DateTime, Utc};
use crossbeam_channel::{unbounded, Receiver, Sender};

/// Errors reported by a background task
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// The task observed the abort flag and stopped
    #[error("Task was aborted")]
    Aborted,

    /// The task body returned an error
    #[error("Task failed: {0}")]
    Failed(String),

    /// The worker thread panicked
    #[error("Task thread panicked")]
    Panicked,

    /// The worker thread could not be started
    #[error("Failed to spawn task thread: {0}")]
    Spawn(#[from] std::io::Error),
}

impl TaskError {
    /// Wrap any displayable error as [`TaskError::Failed`]
    pub fn failed(err: impl std::fmt::Display) -> Self {
        TaskError::Failed(err.to_string())
    }
}

/// Message sent from a running task to its owner
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    /// Work advanced
    Progress {
        /// Units completed
        done: usize,
        /// Units in total
        total: usize,
        /// Short description of the current step
        message: String,
    },
    /// Log record emitted by the worker
    Log {
        /// Severity
        level: log::Level,
        /// Log message
        message: String,
        /// When the record was produced
        timestamp: DateTime<Utc>,
    },
    /// Task completed successfully
    Finished,
    /// Task ended with an error (including abort)
    Failed(String),
}

/// Handle passed to the task body
#[derive(Debug, Clone)]
pub struct TaskContext {
    name: String,
    sender: Sender<TaskEvent>,
    abort: Arc<AtomicBool>,
}

impl TaskContext {
    /// Name the task was spawned with
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Report progress
    pub fn progress(&self, done: usize, total: usize, message: impl Into<String>) {
        self.send(TaskEvent::Progress {
            done,
            total,
            message: message.into(),
        });
    }

    /// Emit a log record to the owner
    pub fn log(&self, level: log::Level, message: impl Into<String>) {
        self.send(TaskEvent::Log {
            level,
            message: message.into(),
            timestamp: Utc::now(),
        });
    }

    /// Whether the owner requested cancellation
    pub fn is_aborted(&self) -> bool {
        self.abort.load(Ordering::SeqCst)
    }

    /// Return [`TaskError::Aborted`] if cancellation was requested
    pub fn check_abort(&self) -> Result<(), TaskError> {
        if self.is_aborted() {
            Err(TaskError::Aborted)
        } else {
            Ok(())
        }
    }

    fn send(&self, event: TaskEvent) {
        // The owner may have stopped listening; the task still runs to completion
        let _ = self.sender.send(event);
    }
}

/// Owner side of a spawned task
#[derive(Debug)]
pub struct TaskHandle<T> {
    events: Receiver<TaskEvent>,
    abort: Arc<AtomicBool>,
    handle: Option<JoinHandle<Result<T, TaskError>>>,
}

impl<T> TaskHandle<T> {
    /// Blocking iterator over events; ends when the task thread exits
    pub fn events(&self) -> crossbeam_channel::Iter<'_, TaskEvent> {
        self.events.iter()
    }

    /// Non-blocking: events available right now
    pub fn try_events(&self) -> crossbeam_channel::TryIter<'_, TaskEvent> {
        self.events.try_iter()
    }

    /// Request cancellation; the task stops at its next abort check
    pub fn abort(&self) {
        self.abort.store(true, Ordering::SeqCst);
    }

    /// Whether the worker thread has exited
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the task and return its result
    pub fn join(mut self) -> Result<T, TaskError> {
        let handle = self.handle.take().ok_or(TaskError::Panicked)?;
        match handle.join() {
            Ok(result) => result,
            Err(_panic) => Err(TaskError::Panicked),
        }
    }
}

impl<T> Drop for TaskHandle<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.abort.store(true, Ordering::SeqCst);
            log::warn!("Task handle dropped before join(); aborting task");
            let _ = handle.join();
        }
    }
}

/// Run `f` on a named background thread
pub fn spawn<T, F>(name: &str, f: F) -> Result<TaskHandle<T>, TaskError>
where
    T: Send + 'static,
    F: FnOnce(&TaskContext) -> Result<T, TaskError> + Send + 'static,
{
    let (sender, receiver) = unbounded();
    let abort = Arc::new(AtomicBool::new(false));
    let context = TaskContext {
        name: name.to_string(),
        sender,
        abort: Arc::clone(&abort),
    };

    let handle = thread::Builder::new()
        .name(format!("cecog-{}", name))
        .spawn(move || {
            // A panicking body still ends its event stream with Failed
            let result = panic::catch_unwind(AssertUnwindSafe(|| f(&context)))
                .unwrap_or(Err(TaskError::Panicked));
            match &result {
                Ok(_) => context.send(TaskEvent::Finished),
                Err(e) => context.send(TaskEvent::Failed(e.to_string())),
            }
            result
        })?;

    Ok(TaskHandle {
        events: receiver,
        abort,
        handle: Some(handle),
    })
}

/// Forward a worker log event to the `log` facade
///
/// Returns `true` if the event was a log record.
pub fn relay_log(task: &str, event: &TaskEvent) -> bool {
    match event {
        TaskEvent::Log { level, message, .. } => {
            log::log!(target: "cecog::task", *level, "[{}] {}", task, message);
            true
        }
        _ => false,
    }
}
