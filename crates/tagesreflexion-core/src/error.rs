//! Error types for `tagesreflexion-core`, and the fault taxonomy shared by
//! every layer.

use thiserror::Error;

use crate::entry::EntryField;

/// The class an error belongs to, independent of which layer raised it.
///
/// Callers decide how to react (resubmit, report, give up on the request)
/// from the fault alone; nothing is retried internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
  /// Caller-supplied data failed a required-field or non-empty check.
  Validation,
  /// The operation's state requirement is not met.
  Precondition,
  /// A referenced entity does not exist.
  NotFound,
  /// The underlying store is unavailable, corrupt, or lock-timed-out.
  Storage,
}

/// Implemented by every error type that can cross the engine boundary.
pub trait Classify {
  fn fault(&self) -> Fault;
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("required field {0} is empty")]
  EmptyField(EntryField),

  #[error("talk item text is empty")]
  EmptyTalkText,

  #[error("unknown role: {0:?}")]
  UnknownRole(String),

  #[error("invalid calendar date: {0:?}")]
  InvalidDate(String),
}

impl Classify for Error {
  fn fault(&self) -> Fault { Fault::Validation }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
