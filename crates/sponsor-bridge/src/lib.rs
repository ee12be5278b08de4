//! Game engine capability backed by external engine processes
//!
//! This crate provides:
//! - Line protocol for engine requests and replies
//! - `ProcessEngine`, a `GameEngine` that spawns one engine process per environment
//! - `ProcessEnvironment`, an `Environment` speaking the line protocol over any stream

pub mod process;
pub mod protocol;

pub use process::{ProcessEngine, ProcessEngineConfig, ProcessEnvironment};
pub use protocol::{EngineReply, EngineRequest};
