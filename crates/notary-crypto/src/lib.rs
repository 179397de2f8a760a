//! Cryptographic primitives for Notary.
//!
//! Provides the SHA-256 content hasher whose output is anchored on the
//! ledger, and the Keccak-256 helpers used to address registry contract
//! functions and events.
//!
//! All crypto operations wrap established libraries; no custom cryptography.

pub mod hasher;
pub mod keccak;

pub use hasher::{ContentHasher, HasherError};
pub use keccak::{event_topic, function_selector, keccak256};
