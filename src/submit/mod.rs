//! Submission of paired masks to the external processor
//!
//! This module contains:
//! - The single-submission-in-flight guard
//! - Multipart payload assembly (payload.rs)
//! - The HTTP client and response validation (client.rs)

pub mod client;
pub mod payload;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub use client::{ProcessedImage, Processor, submit};
pub use payload::{PairRequest, Payload, SubmissionRequest, assemble};

use crate::error::ValidationError;

/// Shared flag marking a submission as in flight
#[derive(Debug, Default)]
pub struct InFlight(Arc<AtomicBool>);

impl InFlight {
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Take the flag; fails while another guard is alive
    pub fn try_acquire(&self) -> Result<SubmissionGuard, ValidationError> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| SubmissionGuard(Arc::clone(&self.0)))
            .map_err(|_| ValidationError::SubmissionInFlight)
    }
}

/// Holds the in-flight flag; released on drop whatever the outcome
#[derive(Debug)]
pub struct SubmissionGuard(Arc<AtomicBool>);

impl Drop for SubmissionGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A validated request together with the guard that must outlive it
#[derive(Debug)]
pub struct PendingSubmission {
    pub request: SubmissionRequest,
    pub guard: SubmissionGuard,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_blocks_second_submission_until_dropped() {
        let flag = InFlight::default();
        let guard = flag.try_acquire().unwrap();
        assert!(flag.is_set());
        assert_eq!(
            flag.try_acquire().unwrap_err(),
            ValidationError::SubmissionInFlight
        );
        drop(guard);
        assert!(!flag.is_set());
        assert!(flag.try_acquire().is_ok());
    }
}
