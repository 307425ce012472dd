//! Error type returned by a [`crate::JobRunner`] execution, distinguishing
//! errors a worker should log-and-discard from those worth surfacing loudly.
//!
//! The coordinator itself never retries a task; the recoverable/unrecoverable
//! distinction only affects logging and the `error` column's message, never
//! whether the row is re-claimed.

use std::fmt;

#[derive(Debug)]
pub struct TaskError {
    inner: anyhow::Error,
    recoverable: bool,
}

impl TaskError {
    pub fn unrecoverable(err: impl Into<anyhow::Error>) -> Self {
        Self {
            inner: err.into(),
            recoverable: false,
        }
    }

    pub fn recoverable(err: impl Into<anyhow::Error>) -> Self {
        Self {
            inner: err.into(),
            recoverable: true,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.recoverable
    }

    pub fn inner(&self) -> &anyhow::Error {
        &self.inner
    }

    pub fn into_inner(self) -> anyhow::Error {
        self.inner
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl std::error::Error for TaskError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

impl From<anyhow::Error> for TaskError {
    fn from(err: anyhow::Error) -> Self {
        Self::recoverable(err)
    }
}

pub trait TaskResultExt<T> {
    fn unrecoverable(self) -> Result<T, TaskError>;
}

impl<T, E: Into<anyhow::Error>> TaskResultExt<T> for Result<T, E> {
    fn unrecoverable(self) -> Result<T, TaskError> {
        self.map_err(|e| TaskError::unrecoverable(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecoverable_error_reports_not_recoverable() {
        let err = TaskError::unrecoverable(anyhow::anyhow!("bad payload"));
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("bad payload"));
    }

    #[test]
    fn recoverable_error_reports_recoverable() {
        let err = TaskError::recoverable(anyhow::anyhow!("connection reset"));
        assert!(err.is_recoverable());
    }

    #[test]
    fn default_anyhow_conversion_is_recoverable() {
        let err: TaskError = anyhow::anyhow!("boom").into();
        assert!(err.is_recoverable());
    }

    #[test]
    fn result_ext_marks_unrecoverable() {
        let result: Result<(), anyhow::Error> = Err(anyhow::anyhow!("missing config"));
        let task_result = result.unrecoverable();
        assert!(!task_result.unwrap_err().is_recoverable());
    }
}
