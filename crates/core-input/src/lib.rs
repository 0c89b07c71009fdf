//! Event sources turning keyboard input and Unix signals into control events.

mod async_service;
mod keys;
#[cfg(unix)]
mod signals;

pub use async_service::AsyncInputShutdown;
pub use keys::map_key;
#[cfg(unix)]
pub use signals::{ControlSignal, SignalEventSource};

use async_service::{ShutdownListener, spawn_key_stream_task};
use core_events::{AsyncEventSource, Event};
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;

/// Keyboard source backed by `crossterm::EventStream`. The terminal must be in
/// raw mode for single key presses to arrive unbuffered.
pub struct KeyEventSource {
    listener: ShutdownListener,
}

impl KeyEventSource {
    /// Returns the source together with a handle that stops it. The stream
    /// task otherwise only ends when the channel closes after a key press.
    pub fn new() -> (Self, AsyncInputShutdown) {
        let (shutdown, listener) = ShutdownListener::new_pair();
        (Self { listener }, shutdown)
    }
}

impl AsyncEventSource for KeyEventSource {
    fn name(&self) -> &'static str {
        "keys"
    }

    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
        spawn_key_stream_task(tx, self.listener)
    }
}
