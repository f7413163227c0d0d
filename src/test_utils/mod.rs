//! Test doubles shared by unit and integration tests.

pub mod fake_engine;

#[cfg(feature = "mocks")]
pub mod mocks;

pub use fake_engine::{ScriptedEngine, ScriptedResponse};

#[cfg(feature = "mocks")]
pub use mocks::MockEngine;
