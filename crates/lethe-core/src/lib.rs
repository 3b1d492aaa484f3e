//! Core types for the Lethe personal-data retention engine.
//!
//! A [`record::PersonalDataRecord`] carries a value together with the policy
//! that governs it: how long it may be kept and how it is disposed of once
//! that time has passed. The [`expiry::ExpiryEvaluator`] decides when a
//! record is due and applies the configured [`disposal`] strategy through the
//! [`dispatch`] table.
//!
//! This crate is pure and synchronous. Storage, encryption and scheduling
//! belong to the caller.

pub mod dispatch;
pub mod disposal;
pub mod error;
pub mod expiry;
pub mod record;
pub mod retention;

pub use error::{Error, Result};

#[cfg(test)]
mod tests;
