// faultline-bus/src/bus.rs
// ============================================================================
// Module: Faultline Memory Bus
// Description: In-process pub/sub bus over per-channel broadcast queues.
// Purpose: Carry domain events from publishers to the realtime gateway.
// Dependencies: faultline-core, tokio
// ============================================================================

//! ## Overview
//! [`MemoryBus`] implements the core [`EventBus`] seam with one
//! `tokio::sync::broadcast` queue per channel, created eagerly at
//! construction so publish order per channel per producer is preserved and
//! subscribers can attach at any time. Publishing to a channel with no
//! subscribers succeeds and drops the message, matching pub/sub semantics.
//! The bus is constructed at startup and shared by reference; there is no
//! module-level instance.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use faultline_core::Channel;
use faultline_core::EventMessage;
use faultline_core::interfaces::BusError;
use faultline_core::interfaces::EventBus;
use tokio::sync::broadcast;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Per-channel queue capacity; slow subscribers lag rather than block
/// publishers.
const CHANNEL_CAPACITY: usize = 1_024;

// ============================================================================
// SECTION: Memory Bus
// ============================================================================

/// In-process event bus.
pub struct MemoryBus {
    /// Broadcast sender per channel.
    senders: BTreeMap<Channel, broadcast::Sender<EventMessage>>,
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBus {
    /// Builds a bus with every channel's queue created eagerly.
    #[must_use]
    pub fn new() -> Self {
        let mut senders = BTreeMap::new();
        for channel in Channel::ALL {
            let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
            senders.insert(channel, sender);
        }
        Self { senders }
    }

    /// Subscribes to a single channel.
    ///
    /// # Panics
    ///
    /// Never panics: every channel's sender is created in [`Self::new`].
    #[must_use]
    pub fn subscribe(&self, channel: Channel) -> broadcast::Receiver<EventMessage> {
        self.senders
            .get(&channel)
            .map_or_else(|| broadcast::channel(CHANNEL_CAPACITY).1, broadcast::Sender::subscribe)
    }

    /// Subscribes to every known channel, returning `(channel, receiver)`
    /// pairs for the gateway's fan-out task.
    #[must_use]
    pub fn subscribe_all(&self) -> Vec<(Channel, broadcast::Receiver<EventMessage>)> {
        Channel::ALL.into_iter().map(|channel| (channel, self.subscribe(channel))).collect()
    }
}

impl EventBus for MemoryBus {
    fn publish(&self, channel: Channel, message: &EventMessage) -> Result<(), BusError> {
        let Some(sender) = self.senders.get(&channel) else {
            return Err(BusError::Closed(channel.as_str().to_string()));
        };
        // A send error only means no live subscribers; pub/sub drops the
        // message in that case.
        let _ = sender.send(message.clone());
        Ok(())
    }
}
