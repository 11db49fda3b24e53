//! Error types used by the tickvisor driver, pool and task handles.
//!
//! This module defines three error enums:
//!
//! - [`TaskError`] - usage errors raised by task lifecycle calls (the umbrella type).
//! - [`PoolError`] - violations of the reuse pool's bookkeeping.
//! - [`DriverError`] - failures of the host collaborator behind the [`Driver`](crate::Driver).
//!
//! All types provide helper methods (`as_label`, `as_message`) for logging.
//! Benign no-ops (stopping a finished task, pausing a task that was never
//! started) are **not** errors; they are reported through [`Control::Ignored`].

use thiserror::Error;

use crate::tasks::TaskId;

/// Outcome of a lifecycle call that cannot fail but may have nothing to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// The call changed the task's state.
    Applied,
    /// The call was a benign no-op (task not scheduled, or already in that state).
    Ignored,
}

impl Control {
    /// Returns `true` if the call changed the task's state.
    #[inline]
    pub fn is_applied(self) -> bool {
        matches!(self, Control::Applied)
    }
}

/// # Errors produced by the reuse pool.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// An instance already sitting in the idle set was released again.
    #[error("double release of pooled `{type_name}`")]
    DoubleRelease {
        /// Type of the pooled instance.
        type_name: &'static str,
    },
}

impl PoolError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            PoolError::DoubleRelease { .. } => "pool_double_release",
        }
    }
}

/// # Errors produced by the host collaborator.
///
/// The whole scheduler depends on the host, so these are fatal.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// The host could not be initialised (or its initialisation failed earlier).
    #[error("host unavailable: {reason}")]
    Unavailable {
        /// Why the host could not be brought up.
        reason: String,
    },

    /// The driver a handle was bound to has been dropped.
    #[error("driver dropped")]
    Dropped,
}

impl DriverError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use tickvisor::DriverError;
    ///
    /// let err = DriverError::Unavailable { reason: "no frame loop".into() };
    /// assert_eq!(err.as_label(), "driver_unavailable");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DriverError::Unavailable { .. } => "driver_unavailable",
            DriverError::Dropped => "driver_dropped",
        }
    }
}

/// # Errors produced by task lifecycle calls.
///
/// Programmer errors (double start, double release, use after release) and
/// host failures, surfaced at the call that caused them. An error on one task
/// never affects other tasks.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// `start` was called while the task's cycle is still registered with the host.
    #[error("task {task} is already running")]
    AlreadyRunning {
        /// Task that was started twice.
        task: TaskId,
    },

    /// `start` was called on a task whose cycle already finished.
    #[error("task {task} already finished; acquire a new task instead")]
    Finished {
        /// Task that was restarted.
        task: TaskId,
    },

    /// The handle was returned to the pool and must be re-acquired first.
    #[error("task handle used after release")]
    Released,

    /// The handle has no task attached (constructed by the pool, never acquired).
    #[error("task handle has no task attached")]
    Detached,

    /// The reuse pool rejected the call.
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// The host collaborator failed.
    #[error(transparent)]
    Driver(#[from] DriverError),
}

impl TaskError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use tickvisor::{PoolError, TaskError};
    ///
    /// let err = TaskError::from(PoolError::DoubleRelease { type_name: "TaskHandle" });
    /// assert_eq!(err.as_label(), "pool_double_release");
    /// assert_eq!(TaskError::Released.as_label(), "task_released");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::AlreadyRunning { .. } => "task_already_running",
            TaskError::Finished { .. } => "task_finished",
            TaskError::Released => "task_released",
            TaskError::Detached => "task_detached",
            TaskError::Pool(e) => e.as_label(),
            TaskError::Driver(e) => e.as_label(),
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::AlreadyRunning { task } => format!("already running: {task}"),
            TaskError::Finished { task } => format!("restart after finish: {task}"),
            TaskError::Released => "use after release".to_string(),
            TaskError::Detached => "no task attached".to_string(),
            TaskError::Pool(e) => format!("pool: {e}"),
            TaskError::Driver(e) => format!("driver: {e}"),
        }
    }

    /// Indicates whether the error comes from the host collaborator.
    ///
    /// Fatal errors mean no task can be scheduled through this driver.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TaskError::Driver(_))
    }
}
