//! # codematic-domain
//!
//! Pure domain model for the codematic rule engine.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Rules** (input pattern → root action)
//! - Define **Action nodes** (typed steps with `then` / `error` continuations)
//! - Define **Outcomes** reported by actions and the branch each one selects
//! - Define the **Variable store** and `%NAME%` placeholder substitution
//! - Define **Trigger registrations** (file change, schedule) and engine options
//! - Rule matching: first match wins
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod options;
pub mod rule;
pub mod value;
pub mod variables;
