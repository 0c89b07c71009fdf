//! dwatch entrypoint: periodically runs commands and highlights how the
//! numbers in their output change between rounds.
mod round;
mod runtime;

use anyhow::Result;
use clap::Parser;
use core_config::{ConfigFile, Settings, load_from};
use core_events::{ControlState, EVENT_CHANNEL_CAP, Event, EventSourceRegistry, TickEventSource};
use core_input::{KeyEventSource, SignalEventSource};
use core_render::trace::TraceWriter;
use core_terminal::{CrosstermBackend, TerminalBackend, TerminalGuard};
use round::RoundPipeline;
use runtime::{WatchOptions, WatchRuntime};
use std::path::{Path, PathBuf};
use std::sync::Once;
use tokio::sync::mpsc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

const LOG_FILE: &str = "dwatch.log";

/// CLI arguments. Flags override `dwatch.toml`.
#[derive(Parser, Debug, Default)]
#[command(
    name = "dwatch",
    version,
    about = "Run commands periodically and highlight how their numbers change"
)]
struct Args {
    /// Update interval in seconds (fractions allowed).
    #[arg(short, long)]
    interval: Option<f64>,
    /// Exit after the given number of seconds.
    #[arg(short, long)]
    seconds: Option<u64>,
    /// Suppress the banner.
    #[arg(short, long)]
    no_banner: bool,
    /// Treat every argument as a separate command.
    #[arg(short, long)]
    multiple_commands: bool,
    /// Display style: counter, value, value+delta, delta, rate, rate+bits.
    #[arg(long)]
    style: Option<String>,
    /// Separator heuristic: minimal, extended, aggressive.
    #[arg(long)]
    heuristic: Option<String>,
    /// Shape matching for deltas: strict (count and fingerprint) or count.
    #[arg(long)]
    shape: Option<String>,
    /// Start with diff mode off.
    #[arg(long)]
    no_diff: bool,
    /// Hide lines whose displayed numbers are all zero.
    #[arg(short = 'z', long)]
    drop_zero: bool,
    /// Disable colors.
    #[arg(long)]
    no_color: bool,
    /// Write one tab-separated record per round to this file, replacing any
    /// previous contents.
    #[arg(short, long)]
    data: Option<PathBuf>,
    /// Configuration file path (overrides discovery of `dwatch.toml`).
    #[arg(long = "config")]
    config: Option<PathBuf>,
    /// Command(s) to watch.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    commands: Vec<String>,
}

impl Args {
    fn apply_overrides(&self, file: &mut ConfigFile) {
        if let Some(secs) = self.interval {
            file.watch.interval_ms = (secs.max(0.0) * 1000.0).round() as u64;
        }
        if let Some(secs) = self.seconds {
            file.watch.seconds = secs;
        }
        if self.no_banner {
            file.watch.banner = false;
        }
        if self.multiple_commands {
            file.watch.multiple_commands = true;
        }
        if let Some(style) = &self.style {
            file.display.style = style.clone();
        }
        if let Some(heuristic) = &self.heuristic {
            file.tokenizer.heuristic = heuristic.clone();
        }
        if let Some(shape) = &self.shape {
            file.tokenizer.shape = shape.clone();
        }
        if self.no_diff {
            file.display.diff = false;
        }
        if self.drop_zero {
            file.display.drop_zero = true;
        }
        if self.no_color {
            file.display.color = false;
        }
    }
}

/// Without `multiple_commands` all arguments form one shell command.
fn assemble_commands(args: Vec<String>, multiple: bool) -> Vec<String> {
    if args.is_empty() || multiple {
        args
    } else {
        vec![args.join(" ")]
    }
}

struct AppStartup {
    backend: CrosstermBackend,
    log_guard: Option<WorkerGuard>,
}

struct RuntimeContext<'a> {
    settings: Settings,
    commands: Vec<String>,
    trace: Option<TraceWriter<std::io::BufWriter<std::fs::File>>>,
    terminal_guard: TerminalGuard<'a, CrosstermBackend>,
}

impl AppStartup {
    fn new() -> Self {
        Self {
            backend: CrosstermBackend::new(),
            log_guard: None,
        }
    }

    /// `Ok(None)` when there is nothing to watch.
    fn run<'a>(&'a mut self, args: Args) -> Result<Option<RuntimeContext<'a>>> {
        self.configure_logging()?;
        Self::install_panic_hook();
        info!(target: "runtime", "startup");

        let mut config = load_from(args.config.clone())?;
        args.apply_overrides(&mut config.file);
        let settings = config.resolve();
        let commands = assemble_commands(args.commands, settings.multiple_commands);
        if commands.is_empty() {
            info!(target: "runtime", "no_commands");
            return Ok(None);
        }

        let trace = match &args.data {
            Some(path) => Some(TraceWriter::create(path)?),
            None => None,
        };

        info!(
            target: "runtime.startup",
            commands = commands.len(),
            interval_ms = settings.interval.as_millis() as u64,
            timeout_ms = settings.timeout.as_millis() as u64,
            policy = settings.policy.name(),
            heuristic = settings.heuristic.name(),
            shape = settings.shape.name(),
            diff_mode = settings.diff_mode,
            trace = args.data.is_some(),
            config_loaded = config.raw.is_some(),
            "bootstrap_complete"
        );

        self.backend.set_title("dwatch")?;
        let terminal_guard = TerminalGuard::enter(&mut self.backend)?;

        Ok(Some(RuntimeContext {
            settings,
            commands,
            trace,
            terminal_guard,
        }))
    }

    fn configure_logging(&mut self) -> Result<()> {
        let log_dir = Path::new(".");
        let log_path = log_dir.join(LOG_FILE);
        if log_path.exists() {
            let _ = std::fs::remove_file(&log_path);
        }

        let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        if tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(nb_writer)
            .with_ansi(false)
            .try_init()
            .is_ok()
        {
            self.log_guard = Some(guard);
        }
        Ok(())
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut startup = AppStartup::new();
    let Some(context) = startup.run(args)? else {
        return Ok(());
    };
    let RuntimeContext {
        settings,
        commands,
        trace,
        terminal_guard,
    } = context;

    let control = ControlState::new(settings.heuristic, settings.policy, settings.diff_mode);
    let pipeline = RoundPipeline::new(settings.shape, settings.drop_zero, trace);

    let (tx, rx) = mpsc::channel::<Event>(EVENT_CHANNEL_CAP);
    let (keys, input_shutdown) = KeyEventSource::new();
    let mut registry = EventSourceRegistry::new();
    registry.register(keys);
    registry.register(SignalEventSource::new());
    let (ticks, tick_gate) = TickEventSource::new(settings.interval);
    registry.register(ticks);
    let source_handles = registry.spawn_all(&tx);

    let options = WatchOptions {
        commands,
        interval: settings.interval,
        timeout: settings.timeout,
        run_for: settings.run_for,
        banner: settings.banner,
        drop_zero: settings.drop_zero,
        color: settings.color,
    };
    let mut runtime = WatchRuntime::new(
        options,
        control,
        pipeline,
        terminal_guard,
        tx,
        rx,
        source_handles,
        input_shutdown,
        tick_gate,
    );
    runtime.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_render::DisplayPolicy;
    use std::time::Duration;

    #[test]
    fn single_command_joins_arguments() {
        let args = vec!["cat".to_string(), "/proc/net/dev".to_string()];
        assert_eq!(assemble_commands(args.clone(), false), vec!["cat /proc/net/dev"]);
        assert_eq!(assemble_commands(args.clone(), true), args);
        assert!(assemble_commands(Vec::new(), false).is_empty());
    }

    #[test]
    fn flags_override_file_values() {
        let args = Args::parse_from([
            "dwatch", "-i", "0.5", "-s", "10", "-n", "--style", "rate", "--no-diff", "-z",
            "--heuristic", "minimal", "uptime",
        ]);
        let mut file = ConfigFile::default();
        args.apply_overrides(&mut file);
        assert_eq!(file.watch.interval_ms, 500);
        assert_eq!(file.watch.seconds, 10);
        assert!(!file.watch.banner);
        assert_eq!(file.display.style, "rate");
        assert!(!file.display.diff);
        assert!(file.display.drop_zero);
        assert_eq!(args.commands, vec!["uptime"]);

        let settings = core_config::Config {
            raw: None,
            file,
        }
        .resolve();
        assert_eq!(settings.interval, Duration::from_millis(500));
        assert_eq!(settings.run_for, Some(Duration::from_secs(10)));
        assert_eq!(settings.policy, DisplayPolicy::Rate);
        assert_eq!(settings.heuristic, core_text::Heuristic::Minimal);
    }

    #[test]
    fn command_flags_are_not_parsed_as_options() {
        let args = Args::parse_from(["dwatch", "-n", "ls", "-l", "/tmp"]);
        assert!(args.no_banner);
        assert_eq!(assemble_commands(args.commands, false), vec!["ls -l /tmp"]);
    }

    #[test]
    fn absent_flags_keep_file_values() {
        let args = Args::parse_from(["dwatch", "-m", "a", "b"]);
        let mut file = ConfigFile::default();
        file.display.style = "counter".into();
        args.apply_overrides(&mut file);
        assert_eq!(file.display.style, "counter");
        assert!(file.display.diff);
        assert!(file.watch.multiple_commands);
    }
}
