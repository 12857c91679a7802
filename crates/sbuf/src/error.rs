use thiserror::Error;

/// Returned by [`Sbuf::insert`](crate::Sbuf::insert) when the buffer has
/// already been closed. The record was not accepted and no state changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("sbuf is closed")]
pub struct Closed;

/// Returned by [`Sbuf::remove`](crate::Sbuf::remove) when the calling
/// consumer has drained every record it will ever receive: its cursor is
/// empty and the buffer is closed. This is the consumer loop's exit signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("sbuf is drained and closed")]
pub struct Terminated;
