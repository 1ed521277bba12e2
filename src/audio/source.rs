use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use hound::WavReader;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::engine::CAPTURE_CHANNELS;

/// Blocking source of interleaved 16-bit PCM capture frames.
///
/// `read` fills `buf` with up to `buf.len()` samples in the device's
/// 2-channel interleave and returns the number of samples written, waiting at
/// most `timeout`. A short or zero-length read is not an error; the feed loop
/// retries.
#[async_trait]
pub trait AudioSource: Send {
    async fn read(&mut self, buf: &mut [i16], timeout: Duration) -> Result<usize>;
}

/// File-backed audio source for development and batch runs.
///
/// Reads the whole WAV up front and serves it chunk by chunk in the capture
/// interleave (mono files are duplicated onto both channels). With pacing
/// enabled, each read sleeps for the chunk's real-time duration to mimic a
/// capture device.
pub struct WavSource {
    samples: Vec<i16>,
    channels: u16,
    sample_rate: u32,
    pos: usize,
    paced: bool,
}

impl WavSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening audio source: {}", path.display());

        let reader = WavReader::open(path)
            .with_context(|| format!("failed to open WAV file: {}", path.display()))?;
        let spec = reader.spec();
        if spec.channels as usize > CAPTURE_CHANNELS {
            bail!(
                "expected mono or {}-channel capture audio, got {} channels",
                CAPTURE_CHANNELS,
                spec.channels
            );
        }
        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to read audio samples")?;

        let duration_seconds =
            samples.len() as f64 / (spec.sample_rate as f64 * spec.channels as f64);
        info!(
            "Audio source loaded: {:.1}s, {}Hz, {} channels, {} samples",
            duration_seconds,
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        Ok(Self {
            samples,
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            pos: 0,
            paced: false,
        })
    }

    /// Sleep for each chunk's real-time duration, emulating a live device.
    pub fn paced(mut self, paced: bool) -> Self {
        self.paced = paced;
        self
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

#[async_trait]
impl AudioSource for WavSource {
    async fn read(&mut self, buf: &mut [i16], _timeout: Duration) -> Result<usize> {
        let written = if self.channels as usize == CAPTURE_CHANNELS {
            let n = buf.len().min(self.samples.len() - self.pos);
            buf[..n].copy_from_slice(&self.samples[self.pos..self.pos + n]);
            self.pos += n;
            n
        } else {
            // Mono file: duplicate each sample onto both capture channels.
            let pairs = (buf.len() / CAPTURE_CHANNELS).min(self.samples.len() - self.pos);
            for i in 0..pairs {
                let s = self.samples[self.pos + i];
                buf[i * 2] = s;
                buf[i * 2 + 1] = s;
            }
            self.pos += pairs;
            pairs * CAPTURE_CHANNELS
        };

        if self.paced && written > 0 {
            let frames = written / CAPTURE_CHANNELS;
            let chunk_time = Duration::from_secs_f64(frames as f64 / self.sample_rate as f64);
            tokio::time::sleep(chunk_time).await;
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, channels: u16, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[tokio::test]
    async fn test_stereo_read_passthrough() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, 2, &[1, 2, 3, 4, 5, 6]);

        let mut src = WavSource::open(&path).unwrap();
        let mut buf = [0i16; 4];
        let n = src.read(&mut buf, Duration::from_millis(10)).await.unwrap();
        assert_eq!(n, 4);
        assert_eq!(buf, [1, 2, 3, 4]);

        let n = src.read(&mut buf, Duration::from_millis(10)).await.unwrap();
        assert_eq!(n, 2);
        assert_eq!(&buf[..2], &[5, 6]);

        // Exhausted source keeps returning zero-length reads.
        let n = src.read(&mut buf, Duration::from_millis(10)).await.unwrap();
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn test_mono_read_duplicates_channels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        write_wav(&path, 1, &[7, 8]);

        let mut src = WavSource::open(&path).unwrap();
        let mut buf = [0i16; 4];
        let n = src.read(&mut buf, Duration::from_millis(10)).await.unwrap();
        assert_eq!(n, 4);
        assert_eq!(buf, [7, 7, 8, 8]);
    }
}
