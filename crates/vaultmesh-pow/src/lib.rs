//! Proof-of-work admission gate.
//!
//! Issuance picks a random header and a target derived from a difficulty;
//! consumption re-derives the hash from the solver's header, checks it
//! against the target, and atomically binds the challenge to the channel it
//! is spent on so it can never be replayed for a different sender,
//! recipient, or sender key.

pub mod challenge;
pub mod config;
pub mod target;

pub use challenge::{PowController, SolvedChallenge};
pub use config::PowConfig;
