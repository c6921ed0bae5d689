pub mod batch;
pub mod error;

pub use batch::{BatchResult, FileFailure};
pub use error::{SealError, SealResult};
