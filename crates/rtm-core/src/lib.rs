//! # rtm-core
//!
//! Foundation types for the RTM bridge.
//!
//! This crate provides the shared vocabulary the bridge crates depend on:
//!
//! - **Handles**: [`handle::Handle`] integer identity and [`handle::ObjectKind`]
//! - **Commands**: [`command::Command`] closed enum decoded once at the boundary
//! - **Envelopes**: [`envelope::Envelope`] outbound events and [`envelope::Reply`]
//! - **Wire names**: [`wire`] command and push-event name constants
//! - **Messages**: [`message::MessageBody`], [`message::ChannelMember`],
//!   [`message::UserAttribute`]
//! - **Errors**: [`errors::EngineError`], [`errors::CommandDecodeError`],
//!   reserved outcome codes
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by `rtm-engine` and `rtm-bridge`.

#![deny(unsafe_code)]

pub mod command;
pub mod envelope;
pub mod errors;
pub mod handle;
pub mod logging;
pub mod message;
pub mod wire;
