//! Shared types for the Attar commerce platform
//!
//! This crate holds everything both the server and its consumers agree on:
//!
//! - **Error system** (`error`): unified error codes, [`AppError`] and the
//!   [`ApiResponse`] envelope returned by every API endpoint
//! - **Domain models** (`models`): products, carts, customizations, orders
//!   and their payment state
//! - **Utilities** (`util`): millisecond timestamps, snowflake-style IDs and
//!   payment reference codes

pub mod error;
pub mod models;
pub mod util;

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
