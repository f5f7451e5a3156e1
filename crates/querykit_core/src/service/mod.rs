//! Entity-specific query facades.
//!
//! # Responsibility
//! - Give callers named include helpers on top of the generic builder.
//! - Keep callers decoupled from relation handles and schema details.

pub mod user_query;
