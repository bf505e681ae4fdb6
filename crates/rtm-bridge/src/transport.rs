//! Outbound transport: ordered envelope delivery to the host.

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::warn;

use rtm_core::envelope::Envelope;

/// Delivers envelopes to the host in hand-over order on a single
/// logical stream.
///
/// Implementations must not block: the event bridge calls `deliver`
/// from completion tasks and must never stall an engine callback.
pub trait HostTransport: Send + Sync {
    /// Hand one envelope to the host.
    fn deliver(&self, envelope: Envelope);
}

/// In-process transport backed by an unbounded channel.
///
/// The receiving half is handed to whatever owns the host connection;
/// envelope order is the order `deliver` was called in.
pub struct ChannelTransport {
    tx: UnboundedSender<Envelope>,
}

impl ChannelTransport {
    /// Create a transport and the receiver the host side drains.
    pub fn new() -> (Arc<Self>, UnboundedReceiver<Envelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

impl HostTransport for ChannelTransport {
    fn deliver(&self, envelope: Envelope) {
        if let Err(err) = self.tx.send(envelope) {
            // Host side hung up; nothing left to address envelopes to.
            warn!(event = %err.0.event, "dropping envelope, host transport closed");
        }
    }
}
