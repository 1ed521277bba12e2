pub(crate) mod feed;
pub mod record;
pub mod source;

pub use record::{RecordingSink, WavSink};
pub use source::{AudioSource, WavSource};
