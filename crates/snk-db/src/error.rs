//! Storage error boundary.
//!
//! Every backend maps its native failures into [`StoreErrorKind`]. Callers
//! (the reconciler, the daemon's status mapping) only ever match on the kind,
//! never on backend-specific error types.

use std::fmt;

/// Closed set of failure categories a storage backend may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreErrorKind {
    /// Uniqueness conflict on create (or rename onto an existing key).
    AlreadyExists,
    /// A referenced parent row is missing.
    ForeignKeyViolation,
    /// Update/delete addressed a key that is not present.
    NotFound,
    /// Backend unreachable, pool exhausted, connection dropped.
    Unavailable,
    /// Caller cancelled the operation.
    Cancelled,
    /// Caller's deadline passed before the operation finished.
    DeadlineExceeded,
    Other,
}

impl StoreErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreErrorKind::AlreadyExists => "ALREADY_EXISTS",
            StoreErrorKind::ForeignKeyViolation => "FOREIGN_KEY_VIOLATION",
            StoreErrorKind::NotFound => "NOT_FOUND",
            StoreErrorKind::Unavailable => "UNAVAILABLE",
            StoreErrorKind::Cancelled => "CANCELLED",
            StoreErrorKind::DeadlineExceeded => "DEADLINE_EXCEEDED",
            StoreErrorKind::Other => "INTERNAL",
        }
    }
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified storage failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct StoreError {
    kind: StoreErrorKind,
    message: String,
}

impl StoreError {
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::AlreadyExists, message)
    }

    pub fn foreign_key_violation(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::ForeignKeyViolation, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::NotFound, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Unavailable, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Cancelled, message)
    }

    pub fn deadline_exceeded(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::DeadlineExceeded, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Other, message)
    }

    pub fn kind(&self) -> StoreErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_already_exists(&self) -> bool {
        self.kind == StoreErrorKind::AlreadyExists
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        self.kind == StoreErrorKind::ForeignKeyViolation
    }

    /// Classify a sqlx error by Postgres SQLSTATE / driver variant.
    ///
    /// - 23505 unique_violation      -> AlreadyExists
    /// - 23503 foreign_key_violation -> ForeignKeyViolation
    /// - class 08 / 57P0x            -> Unavailable
    /// - 57014 query_canceled        -> Cancelled
    pub fn from_sqlx(err: sqlx::Error, op: &str) -> Self {
        let kind = match &err {
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some("23505") => StoreErrorKind::AlreadyExists,
                Some("23503") => StoreErrorKind::ForeignKeyViolation,
                Some("57014") => StoreErrorKind::Cancelled,
                Some(c) if c.starts_with("08") || c.starts_with("57P0") => {
                    StoreErrorKind::Unavailable
                }
                _ => StoreErrorKind::Other,
            },
            sqlx::Error::RowNotFound => StoreErrorKind::NotFound,
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => StoreErrorKind::Unavailable,
            _ => StoreErrorKind::Other,
        };
        Self::new(kind, format!("{op} failed: {err}"))
    }
}
