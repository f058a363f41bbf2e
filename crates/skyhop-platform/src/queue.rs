//! Input Event Queue
//!
//! Event producers (window callbacks, scripted drivers, other threads) only
//! push records. The frame driver drains the queue once per frame into the
//! [`InputState`] it owns, so every event is consumed exactly once and no
//! producer ever touches simulation state.

use crossbeam::channel::{self, Receiver, Sender};

use crate::input::{InputEvent, InputState};

/// Cloneable producer handle
#[derive(Debug, Clone)]
pub struct InputSender {
    sender: Sender<InputEvent>,
}

impl InputSender {
    /// Queue an event. Returns false once the queue has been dropped.
    pub fn send(&self, event: InputEvent) -> bool {
        self.sender.send(event).is_ok()
    }
}

/// Consumer side of the input queue
#[derive(Debug)]
pub struct InputQueue {
    sender: Sender<InputEvent>,
    receiver: Receiver<InputEvent>,
}

impl InputQueue {
    /// Create an empty unbounded queue
    pub fn new() -> Self {
        let (sender, receiver) = channel::unbounded();
        Self { sender, receiver }
    }

    /// Get a producer handle
    pub fn sender(&self) -> InputSender {
        InputSender {
            sender: self.sender.clone(),
        }
    }

    /// Queue an event from the owning thread
    pub fn push(&self, event: InputEvent) {
        // The queue holds its own receiver, so the channel cannot be disconnected here.
        let _ = self.sender.send(event);
    }

    /// Number of events waiting
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Check if no events are waiting
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Apply every waiting event to `state`, in arrival order
    pub fn drain_into(&self, state: &mut InputState) -> usize {
        let mut count = 0;
        for event in self.receiver.try_iter() {
            state.handle_event(&event);
            count += 1;
        }
        if count > 0 {
            log::trace!("Drained {} input events", count);
        }
        count
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}
