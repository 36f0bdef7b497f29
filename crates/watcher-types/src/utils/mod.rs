//! Utility functions for common formatting needs.

pub mod formatting;

pub use formatting::{format_token_amount, truncate_id, with_0x_prefix, without_0x_prefix};
