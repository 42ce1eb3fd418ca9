//! Utility functions for common operations.
//!
//! - Epoch-millisecond time arithmetic and calendar bucketing ([`time`])

pub mod time;
