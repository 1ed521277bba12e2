use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::config::SessionConfig;
use super::detect::{run_detect_loop, DetectContext};
use super::signal::{Teardown, TriggerSlot};
use super::stats::{SessionCounters, SessionStats};
use crate::audio::feed::{run_feed_loop, FeedContext};
use crate::audio::{AudioSource, RecordingSink};
use crate::engine::DetectionEngine;
use crate::error::{Error, Result};
use crate::events::{RecognitionEvent, ResultChannel};
use crate::models::{Language, ModelRegistry, COMMAND_MODEL_PREFIX, WAKE_MODEL_PREFIX};
use crate::recognizer::{CommandRecognizer, RecognizerFactory};

/// Upper bound on waiting for the loops to acknowledge teardown. Effectively
/// unbounded under correct operation; hitting it means a loop is wedged.
const SHUTDOWN_WAIT: Duration = Duration::from_secs(30);

/// At most one live session, enforced at construction time.
static SESSION_LIVE: AtomicBool = AtomicBool::new(false);

/// RAII token for the singleton slot; released on drop.
struct SessionGuard;

impl SessionGuard {
    fn acquire() -> Result<Self> {
        if SESSION_LIVE
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            Ok(Self)
        } else {
            Err(Error::InvalidState("a session is already running"))
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        SESSION_LIVE.store(false, Ordering::SeqCst);
    }
}

/// Collaborators handed to the session at start.
pub struct SessionDeps {
    /// Capture device delivering 2-channel interleaved PCM
    pub source: Box<dyn AudioSource>,
    /// Wake-word/VAD engine, created and destroyed as a unit
    pub engine: Arc<dyn DetectionEngine>,
    /// Resolves wake and command model names by language
    pub registry: Arc<dyn ModelRegistry>,
    /// Creates command recognizers from a named model
    pub recognizers: Arc<dyn RecognizerFactory>,
    /// Optional mirror for raw capture audio (used when recording is enabled)
    pub sink: Option<Box<dyn RecordingSink>>,
}

/// A live capture-detect-dispatch session.
///
/// Owns the engine and recognizer handles, the result channel, the teardown
/// signal and the two loop tasks. Construction is all-or-nothing: if `start`
/// returns an error, nothing was left behind and `start` may be retried.
pub struct Session {
    config: SessionConfig,
    language: Language,
    engine: Arc<dyn DetectionEngine>,
    registry: Arc<dyn ModelRegistry>,
    recognizer: Arc<Mutex<Option<Box<dyn CommandRecognizer>>>>,
    channel: ResultChannel,
    teardown: Arc<Teardown>,
    trigger: Arc<TriggerSlot>,
    counters: Arc<SessionCounters>,
    started_at: DateTime<Utc>,
    feed_task: JoinHandle<()>,
    detect_task: JoinHandle<()>,
    _guard: SessionGuard,
}

impl Session {
    /// Start the pipeline: resolve and load the models for the configured
    /// language, then spawn the feed and detect loops.
    ///
    /// Fails with `InvalidState` if a session is already live. Any failure
    /// past that point unwinds everything allocated so far.
    pub async fn start(
        config: SessionConfig,
        deps: SessionDeps,
        record_enabled: bool,
    ) -> Result<Self> {
        let guard = SessionGuard::acquire()?;

        info!(
            "Starting session {} (language {:?}, record {})",
            config.session_id, config.language, record_enabled
        );

        let channel = ResultChannel::new();
        let teardown = Arc::new(Teardown::new());
        let trigger = Arc::new(TriggerSlot::new());
        let counters = Arc::new(SessionCounters::new());
        let language = config.language;

        let wake_model = resolve_model(&*deps.registry, WAKE_MODEL_PREFIX, language)?;
        deps.engine
            .set_wake_model(&wake_model)
            .await
            .map_err(Error::ResourceExhausted)?;
        info!("Loaded wake model: {}", wake_model);

        let command_model = resolve_model(&*deps.registry, COMMAND_MODEL_PREFIX, language)?;
        let recognizer = deps
            .recognizers
            .create(&command_model, config.recognizer_timeout)
            .map_err(Error::ResourceExhausted)?;
        info!("Loaded command model: {}", command_model);
        let recognizer = Arc::new(Mutex::new(Some(recognizer)));

        let sink = if record_enabled {
            if deps.sink.is_none() {
                warn!("Recording enabled but no sink provided");
            }
            deps.sink
        } else {
            None
        };

        let feed_task = tokio::spawn(run_feed_loop(FeedContext {
            source: deps.source,
            engine: Arc::clone(&deps.engine),
            sink,
            teardown: Arc::clone(&teardown),
            counters: Arc::clone(&counters),
            read_timeout: config.device_read_timeout,
        }));

        let detect_task = tokio::spawn(run_detect_loop(DetectContext {
            engine: Arc::clone(&deps.engine),
            recognizer: Arc::clone(&recognizer),
            events: channel.sender(),
            trigger: Arc::clone(&trigger),
            teardown: Arc::clone(&teardown),
        }));

        info!("Session {} started", config.session_id);

        Ok(Self {
            config,
            language,
            engine: deps.engine,
            registry: deps.registry,
            recognizer,
            channel,
            teardown,
            trigger,
            counters,
            started_at: Utc::now(),
            feed_task,
            detect_task,
            _guard: guard,
        })
    }

    /// Stop the pipeline: signal teardown, wait for both loops to publish
    /// their completion bits, join the tasks, then release resources.
    ///
    /// The release order matters: both loops keep touching the channel, the
    /// recognizer and the engine until their completion bits are set.
    pub async fn stop(self) -> Result<()> {
        let Session {
            config,
            recognizer,
            channel,
            teardown,
            engine,
            feed_task,
            detect_task,
            _guard,
            ..
        } = self;

        info!("Stopping session {}", config.session_id);
        teardown.request();

        let acknowledged = async {
            while !teardown.loops_finished() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        };
        if tokio::time::timeout(SHUTDOWN_WAIT, acknowledged).await.is_err() {
            // Last resort: a wedged loop must not keep the singleton slot
            // occupied forever.
            error!(
                "Pipeline loops did not acknowledge teardown within {:?}, aborting",
                SHUTDOWN_WAIT
            );
            feed_task.abort();
            detect_task.abort();
            return Err(Error::ShutdownTimeout);
        }

        if let Err(e) = feed_task.await {
            error!("Feed task failed: {}", e);
        }
        if let Err(e) = detect_task.await {
            error!("Detect task failed: {}", e);
        }

        drop(channel);
        recognizer.lock().await.take();
        drop(engine);
        drop(_guard);

        info!("Session {} stopped", config.session_id);
        Ok(())
    }

    /// Switch the recognition language on the live engine.
    ///
    /// No-op when unchanged. Otherwise the command-recognizer model data is
    /// destroyed and the wake model for the new language is loaded; the
    /// command path fails soft until the session is restarted.
    pub async fn set_language(&mut self, language: Language) -> Result<()> {
        if language == self.language {
            debug!("Language unchanged, nothing to do");
            return Ok(());
        }
        self.language = language;
        info!("Setting language to {:?}", language);

        if self.recognizer.lock().await.take().is_some() {
            warn!("Command recognizer unloaded; restart the session to reload it");
        }

        let wake_model = resolve_model(&*self.registry, WAKE_MODEL_PREFIX, language)?;
        self.engine
            .set_wake_model(&wake_model)
            .await
            .map_err(Error::ResourceExhausted)?;
        info!("Loaded wake model: {}", wake_model);
        Ok(())
    }

    /// Arm the one-shot manual trigger. At most one request can be pending;
    /// arming again before the detection loop consumes it is a no-op.
    pub fn trigger_once(&self) {
        if self.trigger.arm() {
            debug!("Manual trigger armed");
        } else {
            debug!("Manual trigger already pending");
        }
    }

    /// Receive the next recognition event, waiting at most `timeout`.
    pub async fn get_result(&self, timeout: Duration) -> Option<RecognitionEvent> {
        self.channel.receive(timeout).await
    }

    /// Snapshot of the session counters.
    pub fn stats(&self) -> SessionStats {
        let duration = Utc::now().signed_duration_since(self.started_at);
        SessionStats {
            session_id: self.config.session_id.clone(),
            started_at: self.started_at,
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
            language: self.language,
            frames_fed: self.counters.frames_fed.load(Ordering::Relaxed),
            events_dropped: self.channel.dropped(),
        }
    }
}

fn resolve_model(
    registry: &dyn ModelRegistry,
    prefix: &str,
    language: Language,
) -> Result<String> {
    registry
        .filter(prefix, language.qualifier())
        .ok_or_else(|| Error::ModelNotFound {
            prefix: prefix.to_string(),
            qualifier: language.qualifier().to_string(),
        })
}
