//! Utility functions

pub mod logger;

// Re-export common error types for handlers
pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
