//! Core primitives.
//!
//! Reproducible randomness for drawing secrets.

pub mod rng;

pub use rng::SecretRng;
