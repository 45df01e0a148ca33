//! Shared error-code contract.
//!
//! Every domain error enum implements [`ErrorCode`] so the HTTP layer can
//! report a stable machine-readable code and a retry hint next to the
//! human-readable message.

pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}
