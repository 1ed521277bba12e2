use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use hark::{
    Config, DirRegistry, EnergyEngine, EnergyEngineConfig, MockRecognizerFactory, RecordingSink,
    Session, SessionConfig, SessionDeps, WavSink, WavSource,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "hark", about = "Always-listening wake-word and voice-command pipeline")]
struct Args {
    /// Configuration file to load (extension optional)
    #[arg(long, default_value = "config/hark")]
    config: String,

    /// WAV file to run through the pipeline in place of a capture device
    #[arg(long)]
    input: Option<PathBuf>,

    /// Mirror captured audio into the recording directory
    #[arg(long)]
    record: bool,

    /// Print recognition events as JSON lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("hark v0.1.0");

    let Some(input) = args.input else {
        info!("No input given. Run with --input <file.wav> to feed the pipeline");
        info!(
            "Models are resolved from '{}' by name prefix (wn*/mn*)",
            cfg.models.dir
        );
        return Ok(());
    };

    let source = WavSource::open(&input)?.paced(true);
    let registry = Arc::new(DirRegistry::scan(&cfg.models.dir)?);
    let engine = Arc::new(EnergyEngine::new(EnergyEngineConfig::default()));

    let sink: Option<Box<dyn RecordingSink>> = if args.record {
        std::fs::create_dir_all(&cfg.audio.record_dir)?;
        let path = PathBuf::from(&cfg.audio.record_dir).join(format!(
            "capture-{}.wav",
            chrono::Utc::now().format("%Y%m%d-%H%M%S")
        ));
        Some(Box::new(WavSink::create(path, cfg.audio.sample_rate, 2)?))
    } else {
        None
    };

    let session_config = SessionConfig {
        language: cfg.session.language,
        recognizer_timeout: Duration::from_millis(cfg.session.recognizer_timeout_ms),
        device_read_timeout: Duration::from_millis(cfg.audio.read_timeout_ms),
        ..SessionConfig::default()
    };

    let session = Session::start(
        session_config,
        SessionDeps {
            source: Box::new(source),
            engine,
            registry,
            recognizers: Arc::new(MockRecognizerFactory),
            sink,
        },
        args.record,
    )
    .await?;

    info!("Listening for events (ctrl-c to stop)");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            event = session.get_result(Duration::from_millis(500)) => {
                if let Some(event) = event {
                    if args.json {
                        println!("{}", serde_json::to_string(&event)?);
                    } else {
                        info!("Event: {:?}", event);
                    }
                }
            }
        }
    }

    let stats = session.stats();
    session.stop().await?;
    info!(
        "Session summary: {:.1}s, {} chunks fed, {} events dropped",
        stats.duration_secs, stats.frames_fed, stats.events_dropped
    );

    Ok(())
}
