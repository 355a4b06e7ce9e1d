//! HTTP client for the chunked-upload file service.
//!
//! Wraps the five service operations (initialize, upload-chunk, complete,
//! abort, status) in an async `reqwest` client with per-operation timeouts.

pub mod client;

pub use client::{Client, Error, Timeouts};
