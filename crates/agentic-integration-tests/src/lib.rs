#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]
//! Integration test crate for the agentic runtime.
//!
//! This crate exists solely for integration testing. It is `publish = false`
//! and has no library code — all tests live in `tests/`.
