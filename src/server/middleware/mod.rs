//! Gateway admission middleware: the auth gate, the concurrency gate,
//! and the rate limiter (spec §4.6).

pub mod auth;
pub mod concurrency;
pub mod rate;
