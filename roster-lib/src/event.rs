use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    ShowMessage(String),
    NavigationSuccess,
}

/// One-shot events with at-most-once delivery.
///
/// Only the most recently subscribed receiver gets events. Events emitted while no receiver is
/// alive are dropped, not buffered for a later subscriber.
#[derive(Debug, Default)]
pub struct EventChannel {
    observer: Mutex<Option<mpsc::UnboundedSender<UiEvent>>>,
}

impl EventChannel {
    pub fn new() -> EventChannel {
        EventChannel::default()
    }

    pub fn subscribe(&self) -> EventReceiver {
        let (sender, receiver) = mpsc::unbounded_channel();
        *self.observer.lock().unwrap_or_else(PoisonError::into_inner) = Some(sender);
        EventReceiver { receiver }
    }

    /// Returns whether an observer received the event.
    pub fn emit(&self, event: UiEvent) -> bool {
        let mut observer = self.observer.lock().unwrap_or_else(PoisonError::into_inner);
        let delivered = match observer.as_ref() {
            Some(sender) => sender.send(event).is_ok(),
            None => false,
        };
        if !delivered {
            debug!("No observer, dropping event");
            *observer = None;
        }
        delivered
    }
}

#[derive(Debug)]
pub struct EventReceiver {
    receiver: mpsc::UnboundedReceiver<UiEvent>,
}

impl EventReceiver {
    /// Waits for the next event. Returns `None` once this receiver has been replaced by a newer
    /// subscription and every event sent to it has been read.
    pub async fn recv(&mut self) -> Option<UiEvent> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<UiEvent> {
        self.receiver.try_recv().ok()
    }

    pub fn drain(&mut self) -> Vec<UiEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.try_recv() {
            events.push(event);
        }
        events
    }
}
