use super::{BAR_CEIL, BAR_FLOOR};
use crate::error::PlayerError;
use anyhow::{Context, Result, anyhow};
use std::{fs::File, path::Path};
use symphonia::core::{
    audio::SampleBuffer, errors::Error as SymphoniaError, io::MediaSourceStream, probe::Hint,
};

/// Bucket width in frames when the container does not report a frame count.
const FALLBACK_BUCKET_FRAMES: u64 = 4096;

/// Produce exactly `bar_count` amplitude bars in `[0.1, 1.0]` for a file.
///
/// Decoding streams packet by packet, so memory stays bounded no matter how
/// long the file is, and the result is deterministic for identical input.
/// Unreadable or corrupt input yields an empty Vec; playback never depends
/// on analysis succeeding.
pub fn generate_waveform(path: &Path, bar_count: usize) -> Vec<f32> {
    match extract_peaks(path, bar_count) {
        Ok(bars) => bars,
        Err(e) => {
            let err = PlayerError::Analysis {
                path: path.display().to_string(),
                reason: e.to_string(),
            };
            log::warn!("{err}");
            Vec::new()
        }
    }
}

fn extract_peaks(path: &Path, bar_count: usize) -> Result<Vec<f32>> {
    if bar_count == 0 {
        return Ok(Vec::new());
    }

    let src = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &Default::default(),
        &Default::default(),
    )?;
    let mut format = probed.format;

    let track = format.default_track().context("no default track")?;
    let track_id = track.id;
    let n_frames = track.codec_params.n_frames;
    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &Default::default())?;

    // Peak over fixed-width buckets first, then pool down to the requested
    // width. With a known frame count the buckets already land on bar
    // boundaries; without one the pooling absorbs the unknown length.
    let bucket_frames = n_frames
        .map(|n| (n / bar_count as u64).max(1))
        .unwrap_or(FALLBACK_BUCKET_FRAMES);

    let mut buckets: Vec<f32> = Vec::with_capacity(bar_count);
    let mut peak = 0.0f32;
    let mut frames_in_bucket: u64 = 0;
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            // End of stream, or a chained stream boundary we stop at.
            Err(SymphoniaError::IoError(_)) => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // A damaged packet is recoverable; move on to the next.
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(e.into()),
        };

        let channels = decoded.spec().channels.count().max(1);
        let buf = sample_buf.get_or_insert_with(|| {
            SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec())
        });
        buf.copy_interleaved_ref(decoded);

        for frame in buf.samples().chunks(channels) {
            for &sample in frame {
                let amplitude = sample.abs();
                if amplitude > peak {
                    peak = amplitude;
                }
            }

            frames_in_bucket += 1;
            if frames_in_bucket >= bucket_frames {
                buckets.push(peak.clamp(BAR_FLOOR, BAR_CEIL));
                peak = 0.0;
                frames_in_bucket = 0;
            }
        }
    }

    if frames_in_bucket > 0 {
        buckets.push(peak.clamp(BAR_FLOOR, BAR_CEIL));
    }

    if buckets.is_empty() {
        return Err(anyhow!("no decodable audio"));
    }

    let mut bars = pool_to_bars(&buckets, bar_count);
    bars.resize(bar_count, BAR_FLOOR);

    Ok(bars)
}

/// Max-pool `buckets` down to at most `bar_count` values, every bucket
/// feeding exactly one bar.
fn pool_to_bars(buckets: &[f32], bar_count: usize) -> Vec<f32> {
    if buckets.len() <= bar_count {
        return buckets.to_vec();
    }

    (0..bar_count)
        .map(|i| {
            let start = i * buckets.len() / bar_count;
            let end = ((i + 1) * buckets.len() / bar_count).max(start + 1);
            buckets[start..end].iter().fold(BAR_FLOOR, |acc, &v| acc.max(v))
        })
        .collect()
}
