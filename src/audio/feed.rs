// Audio feed loop
//
// Real-time producer half of the pipeline: pulls fixed-size capture chunks
// from the audio source, mirrors them to the optional recording sink, widens
// the 2-channel capture interleave to the 3-channel layout the detection
// engine expects, and feeds the engine. Cancellation is cooperative, checked
// once per iteration before the blocking read.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::record::RecordingSink;
use super::source::AudioSource;
use crate::engine::{DetectionEngine, CAPTURE_CHANNELS, ENGINE_CHANNELS};
use crate::session::signal::Teardown;
use crate::session::stats::SessionCounters;

/// Delay before retrying after a failed or empty device read
const READ_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Chunks between RMS diagnostics
const RMS_LOG_INTERVAL: u64 = 30;

pub(crate) struct FeedContext {
    pub source: Box<dyn AudioSource>,
    pub engine: Arc<dyn DetectionEngine>,
    pub sink: Option<Box<dyn RecordingSink>>,
    pub teardown: Arc<Teardown>,
    pub counters: Arc<SessionCounters>,
    pub read_timeout: Duration,
}

/// Widen a 2-channel capture chunk to the engine's 3-channel interleave, in
/// place. Walks from the highest index down so source samples are never
/// overwritten before they are moved; channel 2 is the zeroed reference
/// channel.
pub(crate) fn widen_capture_frame(buf: &mut [i16], chunk: usize) {
    debug_assert!(buf.len() >= chunk * ENGINE_CHANNELS);
    for i in (0..chunk).rev() {
        buf[i * 3 + 2] = 0;
        buf[i * 3 + 1] = buf[i * 2 + 1];
        buf[i * 3] = buf[i * 2];
    }
}

/// RMS amplitude of channel 0 in a widened frame, for diagnostics
fn channel0_rms(buf: &[i16], chunk: usize) -> f32 {
    if chunk == 0 {
        return 0.0;
    }
    let energy: f64 = (0..chunk)
        .map(|i| {
            let s = buf[i * ENGINE_CHANNELS] as f64;
            s * s
        })
        .sum();
    (energy / chunk as f64).sqrt() as f32
}

pub(crate) async fn run_feed_loop(mut ctx: FeedContext) {
    info!("Audio feed loop started");

    let chunk = ctx.engine.feed_chunk_size();
    let wanted = chunk * CAPTURE_CHANNELS;
    // Scratch buffer owned by this task for its whole life; sized for the
    // widened layout so the remap can happen in place.
    let mut scratch = vec![0i16; chunk * ENGINE_CHANNELS];
    let mut chunks_fed: u64 = 0;

    loop {
        if ctx.teardown.is_requested() {
            break;
        }

        match ctx.source.read(&mut scratch[..wanted], ctx.read_timeout).await {
            Ok(0) => {
                tokio::time::sleep(READ_RETRY_DELAY).await;
                continue;
            }
            Ok(_) => {}
            Err(e) => {
                // Transient device-busy conditions are expected; retry.
                warn!("Audio read failed, retrying: {:#}", e);
                tokio::time::sleep(READ_RETRY_DELAY).await;
                continue;
            }
        }

        if let Some(sink) = ctx.sink.as_mut() {
            if let Err(e) = sink.save(&scratch[..wanted]) {
                debug!("Recording sink save failed: {:#}", e);
            }
        }

        widen_capture_frame(&mut scratch, chunk);
        ctx.engine.feed(&scratch).await;

        ctx.counters.frames_fed.fetch_add(1, Ordering::Relaxed);
        chunks_fed += 1;
        if chunks_fed % RMS_LOG_INTERVAL == 0 {
            debug!(
                "Audio in RMS: {:.1} (mic 0: {})",
                channel0_rms(&scratch, chunk),
                scratch[0]
            );
        }
    }

    ctx.teardown.mark_feed_finished();
    info!("Audio feed loop finished");
}
