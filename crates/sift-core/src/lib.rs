//! Core types and logic for the Sift identifier usage tracker.
//!
//! Sift ingests free-text chat messages, extracts phone numbers and
//! `@`-handles, and classifies each one as NEW or DUPLICATE against three
//! nested scopes: the sender's current day, the sender's current month, and
//! one process-wide lifetime history shared by every sender.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! persistence backend is abstracted behind [`store::StateStore`]; the
//! serving layer lives in `sift-api`.

pub mod config;
pub mod error;
pub mod extract;
pub mod history;
pub mod identifier;
pub mod normalize;
pub mod rollover;
pub mod scope;
pub mod sender;
pub mod store;
pub mod tracker;

pub use error::{Error, Result};
