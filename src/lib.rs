pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod models;
pub mod recognizer;
pub mod session;

pub use audio::{AudioSource, RecordingSink, WavSink, WavSource};
pub use config::Config;
pub use engine::{
    DetectionEngine, EnergyEngine, EnergyEngineConfig, FetchResult, VadState, WakeState,
};
pub use error::{Error, Result};
pub use events::{EventSender, RecognitionEvent, ResultChannel, RESULT_QUEUE_DEPTH};
pub use models::{
    DirRegistry, Language, ModelRegistry, COMMAND_MODEL_PREFIX, WAKE_MODEL_PREFIX,
};
pub use recognizer::{
    CommandCandidate, CommandRecognizer, MockRecognizer, MockRecognizerFactory, RecognizerFactory,
    RecognizerState,
};
pub use session::{Session, SessionConfig, SessionDeps, SessionStats};
