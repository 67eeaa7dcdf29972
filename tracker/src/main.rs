//! handlazy-tracker - replay recorded hand frames through the tracking core
//!
//! Reads one frame record per line (see `HandFrame::from_sexp`), runs the
//! pipeline on a producer thread and prints control actions from one or
//! more consumer threads as s-expressions on stdout.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use handlazy_tracker::actions::{ActionController, ControlMode};
use handlazy_tracker::channel::{channel, Publisher, Subscriber};
use handlazy_tracker::gesture::{GestureConfig, HandFrame};
use handlazy_tracker::pipeline::{GestureState, TrackingPipeline};

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    Pointer,
    Media,
}

impl From<Mode> for ControlMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Pointer => ControlMode::Pointer,
            Mode::Media => ControlMode::Media,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "handlazy-tracker",
    version,
    about = "Replay hand-landmark frames through the gesture tracking core"
)]
struct Cli {
    /// Frame records, one per line (default: stdin)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Configuration plist, e.g. (:beta 0.01 :hold-threshold-ms 250)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Target width in pixels
    #[arg(long, default_value_t = 1080)]
    width: u32,

    /// Target height in pixels
    #[arg(long, default_value_t = 2400)]
    height: u32,

    /// How consumers interpret gestures
    #[arg(long, value_enum, default_value = "pointer")]
    mode: Mode,

    /// Number of consumer threads
    #[arg(long, default_value_t = 1)]
    consumers: usize,

    /// Sleep between frames to replay at capture pace
    #[arg(long)]
    frame_interval_ms: Option<u64>,

    /// Also print every gesture state a consumer receives
    #[arg(long)]
    echo_states: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries records only
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "handlazy_tracker=info".into()),
        )
        .init();

    info!("handlazy-tracker v{} starting", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            GestureConfig::from_sexp(&text)
                .with_context(|| format!("loading config {}", path.display()))?
        }
        None => GestureConfig::default(),
    };
    info!("config: {}", config.config_sexp());

    let pipeline = TrackingPipeline::new(config.clone(), cli.width, cli.height)?;
    let input: Box<dyn BufRead + Send> = match &cli.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let (publisher, first) = channel::<GestureState>();
    let mut subscribers: Vec<_> = (1..cli.consumers.max(1))
        .map(|_| first.resubscribe())
        .collect();
    subscribers.insert(0, first);

    let consumers: Vec<_> = subscribers
        .into_iter()
        .enumerate()
        .map(|(id, subscriber)| {
            let controller = ActionController::new(&config, cli.mode.into());
            let echo = cli.echo_states;
            thread::Builder::new()
                .name(format!("consumer-{id}"))
                .spawn(move || consume(id, subscriber, controller, echo))
        })
        .collect::<Result<_, _>>()?;

    let interval = cli.frame_interval_ms.map(Duration::from_millis);
    let producer = thread::Builder::new()
        .name("producer".into())
        .spawn(move || produce(input, pipeline, publisher, interval))?;

    let published = producer
        .join()
        .map_err(|_| anyhow::anyhow!("producer thread panicked"))??;
    for handle in consumers {
        handle
            .join()
            .map_err(|_| anyhow::anyhow!("consumer thread panicked"))?;
    }

    info!(published, "replay finished");
    Ok(())
}

/// Feed every frame line through the pipeline.  `(:reset)` starts a new
/// tracking session.  Returns the number of states published.
fn produce(
    input: Box<dyn BufRead + Send>,
    mut pipeline: TrackingPipeline,
    publisher: Publisher<GestureState>,
    interval: Option<Duration>,
) -> anyhow::Result<u64> {
    let mut published = 0;
    for (lineno, line) in input.lines().enumerate() {
        let line = line.context("reading frame input")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        if line == "(:reset)" {
            pipeline.reset();
            continue;
        }

        let frame = match HandFrame::from_sexp(line) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(line = lineno + 1, "skipping frame: {}", e);
                continue;
            }
        };
        publisher.publish(pipeline.process(&frame));
        published += 1;

        if let Some(interval) = interval {
            thread::sleep(interval);
        }
    }
    info!("{}", pipeline.status_sexp());
    // dropping the publisher closes the channel
    Ok(published)
}

fn consume(
    id: usize,
    subscriber: Subscriber<GestureState>,
    mut controller: ActionController,
    echo: bool,
) {
    let mut received = 0u64;
    for state in subscriber.iter() {
        received += 1;
        if echo {
            println!("{}", state.to_sexp());
        }
        for action in controller.handle(&state) {
            println!("{}", action.to_sexp());
        }
    }
    info!(
        consumer = id,
        received,
        coalesced = subscriber.coalesced(),
        "consumer finished"
    );
}
