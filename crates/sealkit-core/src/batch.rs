//! Aggregate result of a multi-file operation.
//!
//! Batch encryption/decryption isolates failures at file granularity: one
//! unreadable or corrupt file is recorded and the batch moves on. The caller
//! receives the full outcome as a value instead of reading it out of shared
//! process state.

use std::path::PathBuf;

use crate::error::SealError;

/// One file that could not be processed, and why.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: SealError,
}

/// Outcome of a batch operation over many files.
#[derive(Debug, Default)]
pub struct BatchResult {
    /// Number of files processed successfully.
    pub succeeded: usize,
    /// Per-file failures, in submission order.
    pub failures: Vec<FileFailure>,
}

impl BatchResult {
    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self, path: PathBuf, error: SealError) {
        self.failures.push(FileFailure { path, error });
    }

    /// True when every submitted file was processed.
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_batch_is_all_succeeded() {
        let result = BatchResult::default();
        assert!(result.all_succeeded());
        assert_eq!(result.succeeded, 0);
    }

    #[test]
    fn failures_are_kept_in_order() {
        let mut result = BatchResult::default();
        result.record_success();
        result.record_failure(
            PathBuf::from("/tmp/missing-a"),
            SealError::Validation("no such file".into()),
        );
        result.record_failure(PathBuf::from("/tmp/missing-b"), SealError::FileCrypto);

        assert_eq!(result.succeeded, 1);
        assert!(!result.all_succeeded());
        assert_eq!(result.failures[0].path, PathBuf::from("/tmp/missing-a"));
        assert_eq!(result.failures[1].path, PathBuf::from("/tmp/missing-b"));
    }
}
