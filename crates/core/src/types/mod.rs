//! Core types for Perkstore.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod points;

pub use email::{Email, EmailError};
pub use id::*;
pub use points::Points;
