use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::{info, warn};

/// Sink for raw capture audio, fed one pre-remap frame at a time.
///
/// Saving is best effort: the feed loop logs failures and keeps capturing.
pub trait RecordingSink: Send {
    fn save(&mut self, samples: &[i16]) -> Result<()>;
}

/// Writes captured frames to a WAV file.
pub struct WavSink {
    writer: Option<hound::WavWriter<BufWriter<File>>>,
    path: PathBuf,
    samples_written: usize,
}

impl WavSink {
    pub fn create(path: PathBuf, sample_rate: u32, channels: u16) -> Result<Self> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let writer = hound::WavWriter::create(&path, spec)
            .with_context(|| format!("failed to create WAV file: {}", path.display()))?;

        info!("Recording to {}", path.display());

        Ok(Self {
            writer: Some(writer),
            path,
            samples_written: 0,
        })
    }

    /// Flush and close the file. Also happens on drop.
    pub fn finish(mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            writer.finalize().context("failed to finalize WAV file")?;
            info!(
                "Recording finished: {} ({} samples)",
                self.path.display(),
                self.samples_written
            );
        }
        Ok(())
    }
}

impl RecordingSink for WavSink {
    fn save(&mut self, samples: &[i16]) -> Result<()> {
        if let Some(writer) = &mut self.writer {
            for &sample in samples {
                writer
                    .write_sample(sample)
                    .context("failed to write sample to WAV")?;
            }
            self.samples_written += samples.len();
        }
        Ok(())
    }
}

impl Drop for WavSink {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            if let Err(e) = writer.finalize() {
                warn!("Failed to finalize WAV recording on drop: {}", e);
            }
        }
    }
}
