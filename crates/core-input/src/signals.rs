//! Unix signal source.
//!
//! | signal  | control event    |
//! |---------|------------------|
//! | SIGQUIT | cycle style      |
//! | SIGUSR1 | toggle diff mode |
//! | SIGUSR2 | cycle heuristic  |
//! | SIGINT  | quit             |
//! | SIGTERM | quit             |
//! | SIGHUP  | quit             |
//! | SIGTSTP | quit             |
//!
//! Handlers are installed when the source is spawned, before its task runs,
//! so a signal delivered right after `spawn` is not lost.

use core_events::{AsyncEventSource, ControlEvent, Event, QuitSource, forward};
use signal_hook::consts::signal::SIGTSTP;
use tokio::signal::unix::{Signal, SignalKind, signal};
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    Quit,
    User1,
    User2,
    Interrupt,
    Terminate,
    Hangup,
    Stop,
}

impl ControlSignal {
    pub const ALL: [ControlSignal; 7] = [
        ControlSignal::Quit,
        ControlSignal::User1,
        ControlSignal::User2,
        ControlSignal::Interrupt,
        ControlSignal::Terminate,
        ControlSignal::Hangup,
        ControlSignal::Stop,
    ];

    pub fn kind(self) -> SignalKind {
        match self {
            ControlSignal::Quit => SignalKind::quit(),
            ControlSignal::User1 => SignalKind::user_defined1(),
            ControlSignal::User2 => SignalKind::user_defined2(),
            ControlSignal::Interrupt => SignalKind::interrupt(),
            ControlSignal::Terminate => SignalKind::terminate(),
            ControlSignal::Hangup => SignalKind::hangup(),
            ControlSignal::Stop => SignalKind::from_raw(SIGTSTP),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ControlSignal::Quit => "SIGQUIT",
            ControlSignal::User1 => "SIGUSR1",
            ControlSignal::User2 => "SIGUSR2",
            ControlSignal::Interrupt => "SIGINT",
            ControlSignal::Terminate => "SIGTERM",
            ControlSignal::Hangup => "SIGHUP",
            ControlSignal::Stop => "SIGTSTP",
        }
    }

    pub fn control_event(self) -> ControlEvent {
        match self {
            ControlSignal::Quit => ControlEvent::CycleStyle,
            ControlSignal::User1 => ControlEvent::ToggleDiff,
            ControlSignal::User2 => ControlEvent::CycleHeuristic,
            // Suspending would leave the terminal in raw mode, so SIGTSTP quits.
            ControlSignal::Interrupt
            | ControlSignal::Terminate
            | ControlSignal::Hangup
            | ControlSignal::Stop => ControlEvent::Quit(QuitSource::Signal),
        }
    }
}

#[derive(Debug, Default)]
pub struct SignalEventSource;

impl SignalEventSource {
    pub fn new() -> Self {
        Self
    }
}

impl AsyncEventSource for SignalEventSource {
    fn name(&self) -> &'static str {
        "signals"
    }

    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
        let mut installed: Vec<(ControlSignal, Signal)> = Vec::new();
        for sig in ControlSignal::ALL {
            match signal(sig.kind()) {
                Ok(stream) => installed.push((sig, stream)),
                Err(e) => warn!(target: "input.signal", signal = sig.name(), error = %e, "signal_install_failed"),
            }
        }
        info!(target: "input.signal", handlers = installed.len(), "signal_handlers_installed");

        tokio::spawn(async move {
            let Some(mut streams) = take_all(installed) else {
                return;
            };
            loop {
                let received = tokio::select! {
                    _ = streams.quit.recv() => ControlSignal::Quit,
                    _ = streams.user1.recv() => ControlSignal::User1,
                    _ = streams.user2.recv() => ControlSignal::User2,
                    _ = streams.interrupt.recv() => ControlSignal::Interrupt,
                    _ = streams.terminate.recv() => ControlSignal::Terminate,
                    _ = streams.hangup.recv() => ControlSignal::Hangup,
                    _ = streams.stop.recv() => ControlSignal::Stop,
                    _ = tx.closed() => break,
                };
                let event = received.control_event();
                debug!(target: "input.signal", signal = received.name(), event = %event, "signal_received");
                if !forward(&tx, Event::Control(event)).await {
                    break;
                }
            }
        })
    }
}

struct Streams {
    quit: Signal,
    user1: Signal,
    user2: Signal,
    interrupt: Signal,
    terminate: Signal,
    hangup: Signal,
    stop: Signal,
}

/// All handlers or nothing; a partial set is not worth running.
fn take_all(installed: Vec<(ControlSignal, Signal)>) -> Option<Streams> {
    let mut quit = None;
    let mut user1 = None;
    let mut user2 = None;
    let mut interrupt = None;
    let mut terminate = None;
    let mut hangup = None;
    let mut stop = None;
    for (sig, stream) in installed {
        match sig {
            ControlSignal::Quit => quit = Some(stream),
            ControlSignal::User1 => user1 = Some(stream),
            ControlSignal::User2 => user2 = Some(stream),
            ControlSignal::Interrupt => interrupt = Some(stream),
            ControlSignal::Terminate => terminate = Some(stream),
            ControlSignal::Hangup => hangup = Some(stream),
            ControlSignal::Stop => stop = Some(stream),
        }
    }
    Some(Streams {
        quit: quit?,
        user1: user1?,
        user2: user2?,
        interrupt: interrupt?,
        terminate: terminate?,
        hangup: hangup?,
        stop: stop?,
    })
}
