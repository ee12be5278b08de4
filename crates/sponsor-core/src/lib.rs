//! # sponsor-core
//!
//! Core types and traits for the card-game sponsor protocol.
//!
//! This crate provides the foundational types used across the sponsor crates:
//! - Session protocol messages
//! - Opaque engine state and the codec that serializes it
//! - The game engine capability traits
//! - Error types

pub mod codec;
pub mod engine;
pub mod error;
pub mod message;
pub mod state;

pub use codec::encode;
pub use engine::{Environment, GameEngine, Transition};
pub use error::{Result, SponsorError};
pub use message::{
    ControlType, EndStatus, InboundMessage, InitStatus, OutboundMessage, StateUpdate,
};
pub use state::{ArrayData, NumericArray, StateValue};
