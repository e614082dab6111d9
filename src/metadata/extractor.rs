use crate::domain::{FileType, FormatInfo};
use anyhow::{Context, Result};
use std::{path::Path, time::Duration};
use symphonia::core::{
    io::MediaSourceStream,
    meta::{Limit, MetadataOptions, StandardTagKey, StandardVisualKey},
    probe::Hint,
};

const MAX_COVER_BYTES: usize = 12 * 1024 * 1024;

/// Everything the extractor could learn from one probe of the file.
/// Any field may be absent; partial results are normal.
#[derive(Debug, Default)]
pub struct TrackMeta {
    pub title: Option<String>,
    pub duration: Option<Duration>,
    pub format: FormatInfo,
    pub cover: Option<Vec<u8>>,
}

/// Probe a file once for tags, technical attributes, and embedded artwork.
pub fn extract_metadata<P: AsRef<Path>>(path_raw: P) -> Result<TrackMeta> {
    let path = path_raw.as_ref();

    let filetype = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(FileType::from)
        .unwrap_or_default();

    let file_len = std::fs::metadata(path)?.len();
    let src = std::fs::File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(ext);
    }

    let meta_opts = MetadataOptions {
        limit_visual_bytes: Limit::Maximum(MAX_COVER_BYTES),
        ..Default::default()
    };

    let mut probed =
        symphonia::default::get_probe().format(&hint, mss, &Default::default(), &meta_opts)?;

    let mut meta = TrackMeta::default();
    meta.format.filetype = filetype;

    let track = probed.format.default_track().context("no default track")?;
    let params = &track.codec_params;

    meta.format.codec = symphonia::default::get_codecs()
        .get_codec(params.codec)
        .map(|descriptor| descriptor.short_name.to_string())
        .unwrap_or_default();
    meta.format.sample_rate = params.sample_rate.unwrap_or_default();
    meta.format.channels = params
        .channels
        .map(|channels| channels.count() as u16)
        .unwrap_or_default();
    meta.format.bit_depth = params.bits_per_sample;

    if let (Some(n_frames), Some(sample_rate)) = (params.n_frames, params.sample_rate) {
        if sample_rate > 0 {
            let duration = Duration::from_secs_f64(n_frames as f64 / sample_rate as f64);
            meta.duration = Some(duration);

            let secs = duration.as_secs_f64();
            if secs > 0.0 {
                meta.format.bit_rate = Some((file_len as f64 * 8.0 / secs) as u32);
            }
        }
    }

    let tag_meta = match probed.metadata.get() {
        Some(m) => m,
        None => probed.format.metadata(),
    };

    if let Some(rev) = tag_meta.current() {
        for tag in rev.tags() {
            if tag.std_key == Some(StandardTagKey::TrackTitle) {
                meta.title = Some(tag.value.to_string());
            }
        }

        let visual = rev
            .visuals()
            .iter()
            .find(|v| v.usage == Some(StandardVisualKey::FrontCover))
            .or_else(|| rev.visuals().first());

        if let Some(visual) = visual {
            meta.cover = Some(visual.data.to_vec());
        }
    }

    Ok(meta)
}
