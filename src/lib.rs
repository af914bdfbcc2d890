//! Local-first conversation storage for chat clients, with secure credential
//! profiles, in a strictly linted crate.

#![deny(unsafe_code)] // Unsafe code is forbidden
#![deny(missing_docs)] // Every public function, struct, enum or module must be documented
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(non_upper_case_globals)]
#![deny(nonstandard_style)]
#![forbid(unsafe_op_in_unsafe_fn)]
// Clippy for strict discipline
#![deny(clippy::all)]
#![deny(clippy::unwrap_used)] // unwrap() is forbidden
#![deny(clippy::expect_used)] // expect() is forbidden
#![deny(clippy::panic)] // panic!() is forbidden
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::print_stdout)] // println!() is forbidden in production paths
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

/// Identifier, record, error and configuration types.
pub mod core;
/// Conversation engine orchestrating the stores.
pub mod engine;
/// Grouped-listing queries over conversations.
pub mod query;
/// Keychain-backed secret storage and provider profiles.
pub mod secrets;
/// UI-facing session state with debounced search.
pub mod session;
/// `SQLite` stores for conversations and messages.
pub mod storage;
/// Tracing initialization helpers.
pub mod telemetry;
/// Conversation title generation heuristics.
pub mod titling;
