//! Common test utilities and helpers
//!
//! This module provides shared utilities for the integration tests:
//! - An in-memory application fixture
//! - Account and upload helpers that go through the HTTP surface
//! - Assertion helpers for the error body

#![allow(dead_code)]

pub mod assertions;
pub mod auth_helpers;
pub mod documents;

pub use assertions::*;
pub use auth_helpers::*;
pub use database::*;
pub use documents::*;
