//! Event loop: applies control events, runs a round on every tick, and shuts
//! the event sources down in order on exit.

use crate::round::RoundPipeline;
use anyhow::Result;
use core_events::{ControlEvent, ControlState, Event, QuitSource, TickGate};
use core_exec::spawn_round;
use core_render::status::{BannerContext, build_banner};
use core_render::writer::Writer;
use core_terminal::{CrosstermBackend, TerminalGuard};
use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    KeyQuit,
    SignalQuit,
    Deadline,
    ChannelClosed,
}

impl ShutdownReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShutdownReason::KeyQuit => "key_quit",
            ShutdownReason::SignalQuit => "signal_quit",
            ShutdownReason::Deadline => "deadline",
            ShutdownReason::ChannelClosed => "channel_closed",
        }
    }
}

impl From<QuitSource> for ShutdownReason {
    fn from(source: QuitSource) -> Self {
        match source {
            QuitSource::Key => ShutdownReason::KeyQuit,
            QuitSource::Signal => ShutdownReason::SignalQuit,
        }
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn log_shutdown_stage(reason: ShutdownReason, stage: &'static str) {
    info!(
        target: "runtime.shutdown",
        reason = reason.as_str(),
        stage = stage,
        "shutdown_stage"
    );
}

/// Static per-run options resolved at startup.
pub struct WatchOptions {
    pub commands: Vec<String>,
    pub interval: Duration,
    pub timeout: Duration,
    pub run_for: Option<Duration>,
    pub banner: bool,
    pub drop_zero: bool,
    pub color: bool,
}

pub struct WatchRuntime<'a> {
    options: WatchOptions,
    control: ControlState,
    pipeline: RoundPipeline<BufWriter<File>>,
    terminal: TerminalGuard<'a, CrosstermBackend>,
    rx: mpsc::Receiver<Event>,
    tx: Option<mpsc::Sender<Event>>,
    source_handles: Vec<tokio::task::JoinHandle<()>>,
    input_shutdown: Option<core_input::AsyncInputShutdown>,
    tick_gate: TickGate,
    last_round: Option<Instant>,
}

impl<'a> WatchRuntime<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        options: WatchOptions,
        control: ControlState,
        pipeline: RoundPipeline<BufWriter<File>>,
        terminal: TerminalGuard<'a, CrosstermBackend>,
        tx: mpsc::Sender<Event>,
        rx: mpsc::Receiver<Event>,
        source_handles: Vec<tokio::task::JoinHandle<()>>,
        input_shutdown: core_input::AsyncInputShutdown,
        tick_gate: TickGate,
    ) -> Self {
        Self {
            options,
            control,
            pipeline,
            terminal,
            rx,
            tx: Some(tx),
            source_handles,
            input_shutdown: Some(input_shutdown),
            tick_gate,
            last_round: None,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let loop_span = tracing::debug_span!(target: "runtime", "event_loop");
        let _enter_loop = loop_span.enter();

        let deadline = deadline_after(Instant::now(), self.options.run_for);
        let result = self.event_loop(deadline).await;
        let reason = match &result {
            Ok(reason) => *reason,
            Err(e) => {
                error!(target: "runtime", error = %e, "event_loop_failed");
                ShutdownReason::ChannelClosed
            }
        };

        self.rx.close();
        self.finalize_shutdown(reason).await;
        result.map(|_| ())
    }

    async fn event_loop(&mut self, deadline: Option<Instant>) -> Result<ShutdownReason> {
        loop {
            let event = tokio::select! {
                event = self.rx.recv() => event,
                _ = wait_until(deadline) => return Ok(ShutdownReason::Deadline),
            };
            match event {
                None => return Ok(ShutdownReason::ChannelClosed),
                Some(Event::Control(ControlEvent::Quit(source))) => return Ok(source.into()),
                Some(Event::Control(control)) => {
                    self.control.apply(control);
                    let now = self.control.snapshot();
                    debug!(
                        target: "runtime",
                        event = %control,
                        policy = now.policy.name(),
                        heuristic = now.heuristic.name(),
                        diff_mode = now.diff_mode,
                        "control_applied"
                    );
                }
                Some(Event::Tick) => {
                    let result = self.run_round().await;
                    self.tick_gate.release();
                    result?;
                }
            }
        }
    }

    async fn run_round(&mut self) -> Result<()> {
        let started = Instant::now();
        let interval = self
            .last_round
            .map(|prev| started - prev)
            .unwrap_or(self.options.interval);
        self.last_round = Some(started);
        let settings = self.control.snapshot();

        let mut outputs = Vec::with_capacity(self.options.commands.len());
        for handle in spawn_round(&self.options.commands, self.options.timeout) {
            let output = match handle.await {
                Ok(Ok(out)) => out,
                Ok(Err(e)) => {
                    warn!(target: "exec", error = %e, "command_failed");
                    e.to_string()
                }
                Err(join) => {
                    error!(target: "exec", ?join, "command_task_failed");
                    join.to_string()
                }
            };
            outputs.push(output);
        }

        let mut writer = Writer::new(self.options.color, self.terminal.rows());
        if self.options.banner {
            writer.text_line(build_banner(&BannerContext {
                interval: self.options.interval,
                policy: settings.policy,
                heuristic: settings.heuristic,
                diff_mode: settings.diff_mode,
                drop_zero: self.options.drop_zero,
                commands: &self.options.commands,
            }));
            writer.text_line("");
        }
        let stats = self.pipeline.run(&settings, interval, &outputs, &mut writer);
        writer.flush()?;

        let elapsed = started.elapsed();
        debug!(
            target: "runtime.round",
            round = stats.round,
            lines = stats.lines,
            track_errors = stats.track_errors,
            tracked = stats.tracked,
            rebaselines = stats.rebaselines,
            interval_us = interval.as_micros() as u64,
            elapsed_us = elapsed.as_micros() as u64,
            "round_complete"
        );
        Ok(())
    }

    async fn finalize_shutdown(&mut self, reason: ShutdownReason) {
        log_shutdown_stage(reason, "begin");

        if let Some(shutdown) = self.input_shutdown.take() {
            trace!(
                target: "runtime.shutdown",
                reason = reason.as_str(),
                "input_task_shutdown_signal"
            );
            shutdown.signal();
        }

        if let Some(tx) = self.tx.take() {
            trace!(
                target: "runtime.shutdown",
                reason = reason.as_str(),
                "dropping_runtime_sender"
            );
            drop(tx);
        }

        while let Some(handle) = self.source_handles.pop() {
            match tokio::time::timeout(Duration::from_millis(200), handle).await {
                Ok(Ok(_)) => trace!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    "event_source_task_stopped"
                ),
                Ok(Err(err)) if err.is_cancelled() => trace!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    "event_source_task_cancelled"
                ),
                Ok(Err(err)) => error!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    ?err,
                    "event_source_task_error"
                ),
                Err(_) => warn!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    "event_source_task_timeout"
                ),
            }
        }

        log_shutdown_stage(reason, "complete");
    }
}

/// `None` when no run time is set or `start + run_for` is past what
/// `Instant` can represent; either way the loop runs until quit.
fn deadline_after(start: Instant, run_for: Option<Duration>) -> Option<Instant> {
    start.checked_add(run_for?)
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
