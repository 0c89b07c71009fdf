//! Control events, the shared control state they mutate, and the async event
//! source registry feeding the runtime loop.
//!
//! Producers (keyboard, Unix signals, round ticks) push `Event`s onto one
//! bounded mpsc channel. The runtime applies `ControlEvent`s to `ControlState`
//! as they arrive; the round pipeline reads `ControlState::snapshot` once at
//! round start, so every toggle becomes visible on the next round.

use core_render::DisplayPolicy;
use core_text::Heuristic;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;

// Bounded channel: sources await on a full queue instead of dropping events.
// Control traffic is tiny, the cap only guards against a stuck consumer.
pub const EVENT_CHANNEL_CAP: usize = 256;

pub static CHANNEL_SEND_FAILURES: AtomicU64 = AtomicU64::new(0);
pub static CONTROL_EVENTS_TOTAL: AtomicU64 = AtomicU64::new(0);
pub static TICKS_COALESCED: AtomicU64 = AtomicU64::new(0);

/// Top-level event enum consumed by the runtime loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Control(ControlEvent),
    /// Round boundary.
    Tick,
}

/// Where a quit request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitSource {
    Key,
    Signal,
}

impl QuitSource {
    pub fn as_str(self) -> &'static str {
        match self {
            QuitSource::Key => "key",
            QuitSource::Signal => "signal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    CycleStyle,
    ToggleDiff,
    CycleHeuristic,
    Quit(QuitSource),
}

impl fmt::Display for ControlEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlEvent::CycleStyle => f.write_str("cycle_style"),
            ControlEvent::ToggleDiff => f.write_str("toggle_diff"),
            ControlEvent::CycleHeuristic => f.write_str("cycle_heuristic"),
            ControlEvent::Quit(source) => write!(f, "quit_{}", source.as_str()),
        }
    }
}

/// Immutable per-round view of the control state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundSettings {
    pub heuristic: Heuristic,
    pub policy: DisplayPolicy,
    pub diff_mode: bool,
}

/// Process-wide toggles, each a single-word atomic.
///
/// The policy cell holds a raw cycle counter rather than a policy: which
/// policy it selects depends on diff mode (see `DisplayPolicy::select`).
#[derive(Debug)]
pub struct ControlState {
    heuristic: AtomicUsize,
    policy: AtomicUsize,
    diff_mode: AtomicBool,
}

impl Default for ControlState {
    fn default() -> Self {
        Self::new(Heuristic::default(), DisplayPolicy::default(), true)
    }
}

impl ControlState {
    pub fn new(heuristic: Heuristic, policy: DisplayPolicy, diff_mode: bool) -> Self {
        Self {
            heuristic: AtomicUsize::new(heuristic.index()),
            policy: AtomicUsize::new(policy.index()),
            diff_mode: AtomicBool::new(diff_mode),
        }
    }

    /// Apply one control event. Returns `false` for `Quit`, which leaves the
    /// state untouched and is handled by the runtime.
    pub fn apply(&self, event: ControlEvent) -> bool {
        CONTROL_EVENTS_TOTAL.fetch_add(1, Ordering::Relaxed);
        match event {
            ControlEvent::CycleStyle => {
                self.policy.fetch_add(1, Ordering::Relaxed);
            }
            ControlEvent::ToggleDiff => {
                self.diff_mode.fetch_xor(true, Ordering::Relaxed);
            }
            ControlEvent::CycleHeuristic => {
                let next = Heuristic::from_index(self.heuristic.load(Ordering::Relaxed)).cycle();
                self.heuristic.store(next.index(), Ordering::Relaxed);
            }
            ControlEvent::Quit(_) => return false,
        }
        true
    }

    pub fn snapshot(&self) -> RoundSettings {
        let diff_mode = self.diff_mode.load(Ordering::Relaxed);
        RoundSettings {
            heuristic: Heuristic::from_index(self.heuristic.load(Ordering::Relaxed)),
            policy: DisplayPolicy::select(self.policy.load(Ordering::Relaxed), diff_mode),
            diff_mode,
        }
    }
}

/// Trait implemented by any async event producer. Implementors usually hold
/// configuration and spawn one background task that pushes `Event`s into the
/// shared channel.
pub trait AsyncEventSource: Send + 'static {
    /// Stable identifier used in logs.
    fn name(&self) -> &'static str;
    /// Consume self and spawn the background task. Implementors stop when
    /// `tx.send(..).await` returns Err (channel closed) or on their own stop
    /// condition.
    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()>;
}

/// Send helper shared by sources: counts failures, returns `false` once the
/// consumer is gone.
pub async fn forward(tx: &Sender<Event>, event: Event) -> bool {
    if tx.send(event).await.is_err() {
        CHANNEL_SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
        return false;
    }
    true
}

#[derive(Default)]
pub struct EventSourceRegistry {
    sources: Vec<Box<dyn AsyncEventSource>>,
}

impl EventSourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<S: AsyncEventSource>(&mut self, src: S) {
        self.sources.push(Box::new(src));
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Spawn all registered sources, returning their JoinHandles. Each source
    /// receives its own clone of `tx`; during shutdown the caller drops its
    /// last `Sender` before awaiting the handles so sources observe the closed
    /// channel and exit.
    pub fn spawn_all(&mut self, tx: &Sender<Event>) -> Vec<JoinHandle<()>> {
        let mut out = Vec::with_capacity(self.sources.len());
        for src in self.sources.drain(..) {
            let name = src.name();
            tracing::info!(target: "runtime.events", source = name, "spawning event source");
            out.push(src.spawn(tx.clone()));
        }
        out
    }
}

/// At most one undelivered tick. The source arms the gate when it sends a
/// tick; the runtime releases it once the round for that tick has finished.
#[derive(Debug, Clone, Default)]
pub struct TickGate {
    pending: Arc<AtomicBool>,
}

impl TickGate {
    /// Claim the slot. `false` while an earlier tick is still outstanding.
    fn try_arm(&self) -> bool {
        !self.pending.swap(true, Ordering::AcqRel)
    }

    pub fn release(&self) {
        self.pending.store(false, Ordering::Release);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

/// Emits `Event::Tick` every interval. The first tick fires immediately so
/// the first round runs at startup. Ticks falling due while a round is still
/// pending are dropped, so the next round starts on the first tick after the
/// gate is released.
pub struct TickEventSource {
    interval: Duration,
    gate: TickGate,
}

impl TickEventSource {
    pub fn new(interval: Duration) -> (Self, TickGate) {
        let gate = TickGate::default();
        (
            Self {
                interval,
                gate: gate.clone(),
            },
            gate,
        )
    }
}

impl AsyncEventSource for TickEventSource {
    fn name(&self) -> &'static str {
        "tick"
    }

    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
        let TickEventSource { interval: dur, gate } = *self;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(dur);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.is_closed() {
                    break;
                }
                if !gate.try_arm() {
                    TICKS_COALESCED.fetch_add(1, Ordering::Relaxed);
                    tracing::trace!(target: "runtime.events", "tick_dropped_round_pending");
                    continue;
                }
                if !forward(&tx, Event::Tick).await {
                    break;
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_snapshot() {
        let s = ControlState::default().snapshot();
        assert_eq!(s.heuristic, Heuristic::Extended);
        assert_eq!(s.policy, DisplayPolicy::RawValue);
        assert!(s.diff_mode);
    }

    #[test]
    fn cycle_style_walks_all_policies_in_diff_mode() {
        let state = ControlState::new(Heuristic::Minimal, DisplayPolicy::Counter, true);
        let mut seen = Vec::new();
        for _ in 0..7 {
            seen.push(state.snapshot().policy);
            state.apply(ControlEvent::CycleStyle);
        }
        assert_eq!(&seen[..6], &DisplayPolicy::ALL);
        assert_eq!(seen[6], DisplayPolicy::Counter);
    }

    #[test]
    fn diff_off_limits_policies() {
        let state = ControlState::new(Heuristic::Minimal, DisplayPolicy::Rate, true);
        assert_eq!(state.snapshot().policy, DisplayPolicy::Rate);
        state.apply(ControlEvent::ToggleDiff);
        let s = state.snapshot();
        assert!(!s.diff_mode);
        assert!(DisplayPolicy::PLAIN.contains(&s.policy));
        state.apply(ControlEvent::ToggleDiff);
        assert_eq!(state.snapshot().policy, DisplayPolicy::Rate);
    }

    #[test]
    fn heuristic_cycles_and_wraps() {
        let state = ControlState::new(Heuristic::Aggressive, DisplayPolicy::RawValue, true);
        state.apply(ControlEvent::CycleHeuristic);
        assert_eq!(state.snapshot().heuristic, Heuristic::Minimal);
        state.apply(ControlEvent::CycleHeuristic);
        assert_eq!(state.snapshot().heuristic, Heuristic::Extended);
    }

    #[test]
    fn quit_leaves_state_untouched() {
        let state = ControlState::default();
        let before = state.snapshot();
        assert!(!state.apply(ControlEvent::Quit(QuitSource::Signal)));
        assert_eq!(state.snapshot(), before);
    }

    #[test]
    fn snapshot_is_stable_after_later_toggles() {
        let state = ControlState::default();
        let round = state.snapshot();
        state.apply(ControlEvent::ToggleDiff);
        state.apply(ControlEvent::CycleStyle);
        assert!(round.diff_mode);
        assert_eq!(round.policy, DisplayPolicy::RawValue);
        assert_ne!(state.snapshot(), round);
    }
}

#[cfg(test)]
mod tests_async_sources {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;
    use tokio::sync::mpsc;

    struct MockOnceSource;

    impl AsyncEventSource for MockOnceSource {
        fn name(&self) -> &'static str {
            "mock_once"
        }
        fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
            tokio::spawn(async move {
                let _ = tx.send(Event::Control(ControlEvent::ToggleDiff)).await;
            })
        }
    }

    #[tokio::test]
    async fn registry_spawns_and_emits() {
        let (tx, mut rx) = mpsc::channel::<Event>(8);
        let mut reg = EventSourceRegistry::new();
        reg.register(MockOnceSource);
        let (ticks, _gate) = TickEventSource::new(Duration::from_millis(10));
        reg.register(ticks);
        assert_eq!(reg.len(), 2);
        let handles = reg.spawn_all(&tx);
        assert!(reg.is_empty());

        let mut got_control = false;
        let mut got_tick = false;
        let start = std::time::Instant::now();
        while start.elapsed() < Duration::from_millis(200) && (!got_control || !got_tick) {
            if let Ok(Some(ev)) = tokio::time::timeout(Duration::from_millis(5), rx.recv()).await {
                match ev {
                    Event::Control(ControlEvent::ToggleDiff) => got_control = true,
                    Event::Tick => got_tick = true,
                    _ => {}
                }
            }
        }
        assert!(got_control, "expected mock source to produce a control event");
        assert!(got_tick, "expected tick source to emit tick events");

        drop(tx);
        drop(rx);
        for handle in handles {
            let _ = tokio::time::timeout(Duration::from_millis(50), handle).await;
        }
    }

    struct MockCloseSource {
        flag: Arc<AtomicBool>,
    }

    impl AsyncEventSource for MockCloseSource {
        fn name(&self) -> &'static str {
            "mock_close"
        }

        fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
            let flag = self.flag;
            tokio::spawn(async move {
                tx.closed().await;
                flag.store(true, Ordering::SeqCst);
            })
        }
    }

    #[tokio::test]
    async fn registry_sources_exit_on_channel_drop() {
        let (tx, rx) = mpsc::channel::<Event>(8);
        let mut reg = EventSourceRegistry::new();
        let flag = Arc::new(AtomicBool::new(false));
        reg.register(MockCloseSource { flag: flag.clone() });
        let handles = reg.spawn_all(&tx);

        drop(tx);
        drop(rx);

        for handle in handles {
            match tokio::time::timeout(Duration::from_millis(50), handle).await {
                Ok(join_res) => join_res.expect("source task should exit cleanly"),
                Err(_) => panic!("source task did not observe channel closure"),
            }
        }

        assert!(flag.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn tick_source_stops_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel::<Event>(1);
        let (ticks, _gate) = TickEventSource::new(Duration::from_millis(1));
        let handle = Box::new(ticks).spawn(tx);
        drop(rx);
        let res = tokio::time::timeout(Duration::from_millis(100), handle).await;
        assert!(res.is_ok(), "tick source should exit after channel closure");
    }

    #[tokio::test(start_paused = true)]
    async fn slow_round_does_not_queue_ticks() {
        let (tx, mut rx) = mpsc::channel::<Event>(EVENT_CHANNEL_CAP);
        let (ticks, gate) = TickEventSource::new(Duration::from_secs(1));
        let handle = Box::new(ticks).spawn(tx);

        assert_eq!(rx.recv().await, Some(Event::Tick));
        assert!(gate.is_pending());

        // Round runs for five and a half intervals without reading the channel.
        tokio::time::sleep(Duration::from_millis(5500)).await;
        let mut queued = 0;
        while rx.try_recv().is_ok() {
            queued += 1;
        }
        assert_eq!(queued, 0, "ticks piled up behind a busy round");

        gate.release();
        let started = tokio::time::Instant::now();
        let next = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("next tick after release");
        assert_eq!(next, Some(Event::Tick));
        assert!(started.elapsed() <= Duration::from_secs(1));
        assert!(rx.try_recv().is_err());

        drop(rx);
        let res = tokio::time::timeout(Duration::from_secs(3), handle).await;
        assert!(res.is_ok(), "tick source should exit after channel closure");
    }

    #[tokio::test(start_paused = true)]
    async fn released_gate_keeps_regular_cadence() {
        let (tx, mut rx) = mpsc::channel::<Event>(EVENT_CHANNEL_CAP);
        let (ticks, gate) = TickEventSource::new(Duration::from_secs(1));
        let handle = Box::new(ticks).spawn(tx);

        let start = tokio::time::Instant::now();
        for _ in 0..4 {
            assert_eq!(rx.recv().await, Some(Event::Tick));
            gate.release();
        }
        assert_eq!(start.elapsed(), Duration::from_secs(3));

        drop(rx);
        let _ = tokio::time::timeout(Duration::from_secs(3), handle).await;
    }
}
