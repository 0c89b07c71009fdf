use crate::keys::map_key;
use core_events::{Event, forward};
use crossterm::event::{Event as CEvent, EventStream};
use std::io;
use std::sync::Arc;
use tokio::sync::{Notify, mpsc::Sender};
use tokio::task;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

#[derive(Clone, Debug)]
pub struct AsyncInputShutdown {
    notify: Arc<Notify>,
}

impl AsyncInputShutdown {
    pub fn signal(&self) {
        self.notify.notify_one();
    }
}

#[derive(Clone, Debug)]
pub(crate) struct ShutdownListener {
    notify: Arc<Notify>,
}

impl ShutdownListener {
    pub(crate) fn new_pair() -> (AsyncInputShutdown, Self) {
        let notify = Arc::new(Notify::new());
        (
            AsyncInputShutdown {
                notify: notify.clone(),
            },
            ShutdownListener { notify },
        )
    }

    async fn wait(&self) {
        self.notify.notified().await;
    }
}

/// Spawn a Tokio task reading key presses from `EventStream`.
pub(crate) fn spawn_key_stream_task(
    sender: Sender<Event>,
    listener: ShutdownListener,
) -> task::JoinHandle<()> {
    task::spawn(async move {
        KeyStreamTask::new(sender, EventStream::new(), listener)
            .run()
            .await;
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ExitReason {
    ShutdownSignal,
    ChannelClosed,
    StreamEnded,
    StreamError,
}

impl ExitReason {
    fn as_str(&self) -> &'static str {
        match self {
            ExitReason::ShutdownSignal => "shutdown_signal",
            ExitReason::ChannelClosed => "channel_closed",
            ExitReason::StreamEnded => "stream_ended",
            ExitReason::StreamError => "stream_error",
        }
    }
}

pub(crate) struct KeyStreamTask<S>
where
    S: tokio_stream::Stream<Item = io::Result<CEvent>> + Send + Unpin + 'static,
{
    sender: Sender<Event>,
    stream: S,
    shutdown: ShutdownListener,
}

impl<S> KeyStreamTask<S>
where
    S: tokio_stream::Stream<Item = io::Result<CEvent>> + Send + Unpin + 'static,
{
    pub(crate) fn new(sender: Sender<Event>, stream: S, shutdown: ShutdownListener) -> Self {
        Self {
            sender,
            stream,
            shutdown,
        }
    }

    pub(crate) async fn run(mut self) {
        info!(target: "input.keys", "key_task_started");
        let reason = loop {
            let next = tokio::select! {
                biased;
                _ = self.shutdown.wait() => break ExitReason::ShutdownSignal,
                next = self.stream.next() => next,
            };

            match next {
                None => break ExitReason::StreamEnded,
                Some(Err(err)) => {
                    warn!(target: "input.keys", error_kind = ?err.kind(), "key_stream_error");
                    break ExitReason::StreamError;
                }
                Some(Ok(CEvent::Key(key))) => {
                    let Some(control) = map_key(&key) else {
                        continue;
                    };
                    debug!(target: "input.keys", event = %control, "control_key");
                    if !forward(&self.sender, Event::Control(control)).await {
                        break ExitReason::ChannelClosed;
                    }
                }
                Some(Ok(_)) => {}
            }
        };
        info!(target: "input.keys", reason = reason.as_str(), "key_task_stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_events::{ControlEvent, QuitSource};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use tokio::sync::mpsc;
    use tokio::time::{Duration, timeout};
    use tokio_stream::wrappers::UnboundedReceiverStream;

    fn key(c: char) -> CEvent {
        CEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    async fn run_scenario(events: Vec<CEvent>) -> Vec<Event> {
        let (tx, mut rx) = mpsc::channel(64);
        let stream = tokio_stream::iter(events.into_iter().map(Ok));
        let (_shutdown, listener) = ShutdownListener::new_pair();
        KeyStreamTask::new(tx, stream, listener).run().await;

        let mut outputs = Vec::new();
        while let Some(evt) = rx.recv().await {
            outputs.push(evt);
        }
        outputs
    }

    #[tokio::test]
    async fn forwards_bound_keys_in_order() {
        let outputs = run_scenario(vec![key('s'), key('x'), CEvent::Resize(80, 24), key('d'), key('q')]).await;
        assert_eq!(
            outputs,
            vec![
                Event::Control(ControlEvent::CycleStyle),
                Event::Control(ControlEvent::ToggleDiff),
                Event::Control(ControlEvent::Quit(QuitSource::Key)),
            ]
        );
    }

    #[tokio::test]
    async fn stream_error_ends_task() {
        let (tx, mut rx) = mpsc::channel(4);
        let stream = tokio_stream::iter(vec![
            Err(io::Error::other("tty gone")),
            Ok(key('s')),
        ]);
        let (_shutdown, listener) = ShutdownListener::new_pair();
        KeyStreamTask::new(tx, stream, listener).run().await;
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn channel_closed_stops_task() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let stream = tokio_stream::iter(vec![Ok(key('h')), Ok(key('h'))]);
        let (_shutdown, listener) = ShutdownListener::new_pair();
        timeout(Duration::from_millis(50), KeyStreamTask::new(tx, stream, listener).run())
            .await
            .expect("task should stop once the consumer is gone");
    }

    #[tokio::test]
    async fn shutdown_signal_exits_immediately() {
        let (tx, mut rx) = mpsc::channel(1);
        let (event_tx, event_rx) = mpsc::unbounded_channel::<io::Result<CEvent>>();
        let stream = UnboundedReceiverStream::new(event_rx);
        let (shutdown, listener) = ShutdownListener::new_pair();

        let task = tokio::spawn(async move {
            let _keep_alive = event_tx;
            KeyStreamTask::new(tx, stream, listener).run().await;
        });

        shutdown.signal();

        timeout(Duration::from_millis(50), task)
            .await
            .expect("shutdown should resolve promptly")
            .expect("task join failed");

        assert!(rx.recv().await.is_none());
    }
}
