//! # rtm-bridge
//!
//! Boundary bridge between a host control surface and an asynchronous
//! real-time-messaging engine.
//!
//! The host issues stringly-typed commands with loosely-typed argument
//! bags; the engine answers through callbacks and pushes unsolicited
//! events. The bridge gives engine objects host-visible integer
//! identity and guarantees that every command resolves via exactly one
//! correctly-addressed outcome:
//!
//! - **[`registry::HandleRegistry`]**: kind-scoped handle allocation,
//!   resolution, reverse resolution, and release
//! - **[`dispatcher::RtmBridge`]**: decodes each command once, resolves
//!   its handles, and submits the engine operation
//! - **[`events::EventBridge`]**: turns completions and unsolicited
//!   notices into outbound envelopes, suppressing events whose
//!   addressee has been released
//! - **[`transport::HostTransport`]**: ordered delivery of envelopes to
//!   the host
//!
//! ## Data Flow
//!
//! host → transport → dispatcher → registry lookup → engine call with a
//! bridge-bound completion → (later) event bridge resolves the handle →
//! envelope → transport → host.

#![deny(unsafe_code)]

pub mod dispatcher;
pub mod events;
pub mod registry;
pub mod transport;

pub use dispatcher::RtmBridge;
pub use events::EventBridge;
pub use registry::HandleRegistry;
pub use transport::{ChannelTransport, HostTransport};
