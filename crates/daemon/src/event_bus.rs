// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event bus between the listener and the engine loop.
//!
//! Events are queued in arrival order and handled one at a time by the
//! engine loop. Closing the reader stops intake: later sends fail and the
//! listener reports the agent as shutting down.

use podcap_core::LifecycleEvent;
use thiserror::Error;
use tokio::sync::mpsc;

/// Queue depth before senders wait for the engine loop
pub const EVENT_QUEUE_CAPACITY: usize = 1024;

#[derive(Debug, Error)]
pub enum EventBusError {
    #[error("event intake is closed")]
    Closed,
}

/// Sending half, cloned into each connection task
#[derive(Clone)]
pub struct EventBus {
    tx: mpsc::Sender<LifecycleEvent>,
}

/// Receiving half, owned by the engine loop
pub struct EventReader {
    rx: mpsc::Receiver<LifecycleEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> (Self, EventReader) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, EventReader { rx })
    }

    /// Queue an event, waiting for room if the engine is behind.
    pub async fn send(&self, event: LifecycleEvent) -> Result<(), EventBusError> {
        self.tx.send(event).await.map_err(|_| EventBusError::Closed)
    }
}

impl EventReader {
    /// Next queued event; `None` once closed and drained.
    pub async fn recv(&mut self) -> Option<LifecycleEvent> {
        self.rx.recv().await
    }

    /// Stop accepting events. Returns how many queued events were dropped.
    pub fn close(&mut self) -> usize {
        self.rx.close();
        let mut dropped = 0;
        while self.rx.try_recv().is_ok() {
            dropped += 1;
        }
        dropped
    }
}

#[cfg(test)]
#[path = "event_bus_tests.rs"]
mod tests;
