//! Bounded FIFO hand-off between the hotkey listener and the queue worker

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tokio::sync::Notify;
use tracing::debug;

use crate::domain::hotkey::{HotkeyBinding, KeyCombination};

/// A recognized key combination
#[derive(Debug, Clone)]
pub struct HotkeyEvent {
    pub binding: HotkeyBinding,
    pub timestamp: Instant,
}

impl HotkeyEvent {
    pub fn new(binding: HotkeyBinding) -> Self {
        Self {
            binding,
            timestamp: Instant::now(),
        }
    }
}

/// What happened to a pushed event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Accepted,
    /// Same binding already pending or running; the new event was dropped
    Coalesced,
    /// Queue was full; the oldest pending event was dropped
    DroppedOldest,
    Closed,
}

#[derive(Debug, Default)]
struct QueueState {
    events: VecDeque<HotkeyEvent>,
    /// Combination of the event last popped, until the worker finishes it
    in_flight: Option<KeyCombination>,
    closed: bool,
}

/// Bounded, ordered channel.
///
/// `push` never blocks, so the listener thread is never held up by the
/// worker. When full, the newest event is accepted and the oldest dropped.
#[derive(Debug)]
pub struct EventQueue {
    state: Mutex<QueueState>,
    notify: Notify,
    capacity: usize,
}

impl EventQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            notify: Notify::new(),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, event: HotkeyEvent) -> PushOutcome {
        let outcome = {
            let mut state = self.lock();
            if state.closed {
                return PushOutcome::Closed;
            }
            let combination = &event.binding.combination;
            if state.in_flight.as_ref() == Some(combination) {
                debug!(hotkey = %combination, "coalesced press of the running hotkey");
                return PushOutcome::Coalesced;
            }
            if state
                .events
                .iter()
                .any(|pending| &pending.binding.combination == combination)
            {
                debug!(hotkey = %combination, "coalesced duplicate pending event");
                return PushOutcome::Coalesced;
            }

            let outcome = if state.events.len() >= self.capacity {
                state.events.pop_front();
                PushOutcome::DroppedOldest
            } else {
                PushOutcome::Accepted
            };
            state.events.push_back(event);
            outcome
        };

        self.notify.notify_one();
        outcome
    }

    /// Wait for the next event; None once the queue is closed.
    ///
    /// The popped binding counts as in flight until `finish` is called.
    pub async fn pop(&self) -> Option<HotkeyEvent> {
        loop {
            {
                let mut state = self.lock();
                if state.closed {
                    return None;
                }
                if let Some(event) = state.events.pop_front() {
                    state.in_flight = Some(event.binding.combination.clone());
                    return Some(event);
                }
            }
            self.notify.notified().await;
        }
    }

    /// Mark the popped event's job as terminal
    pub fn finish(&self) {
        self.lock().in_flight = None;
    }

    /// Stop accepting events and discard pending ones
    pub fn close(&self) {
        {
            let mut state = self.lock();
            state.closed = true;
            state.events.clear();
        }
        self.notify.notify_one();
    }

    pub fn len(&self) -> usize {
        self.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
