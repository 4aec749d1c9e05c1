//! Clip loading: decode, downmix, resample, and fit to a fixed length.

use std::io::Cursor;

use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

use crate::error::AudioError;
use crate::resample::resample;

/// Target shape of a normalized clip.
///
/// Every buffer returned by [`load_clip`] has exactly
/// `sample_rate * duration_secs` samples: shorter sources are
/// zero-padded at the end, longer sources are truncated at the end.
/// There is no centering and no left-padding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipSpec {
    /// Target sample rate in Hz (default: 22050).
    pub sample_rate: u32,
    /// Target clip duration in seconds (default: 2.0).
    pub duration_secs: f64,
}

impl Default for ClipSpec {
    fn default() -> Self {
        Self {
            sample_rate: 22050,
            duration_secs: 2.0,
        }
    }
}

impl ClipSpec {
    /// Number of samples in a normalized buffer.
    pub fn target_len(&self) -> usize {
        (self.sample_rate as f64 * self.duration_secs).round() as usize
    }
}

/// Decodes an audio byte stream (MP3/WAV) into a normalized mono buffer.
///
/// Returns [`AudioError::Decode`] when the stream cannot be parsed at
/// all; a stream that yields zero audio frames is treated the same way,
/// never as an empty buffer.
pub fn load_clip(bytes: &[u8], spec: &ClipSpec) -> Result<Vec<f32>, AudioError> {
    let (interleaved, src_rate, channels) = decode_bytes(bytes)?;
    let mut mono = downmix(&interleaved, channels);

    // Truncate in the source domain so long files do not pay for
    // resampling audio that is discarded anyway.
    let keep = (src_rate as f64 * spec.duration_secs).ceil() as usize;
    mono.truncate(keep);

    let resampled = if src_rate == spec.sample_rate {
        mono
    } else {
        debug!(src_rate, dst_rate = spec.sample_rate, "resampling clip");
        resample(mono, src_rate, spec.sample_rate)?
    };

    Ok(fit_length(resampled, spec.target_len()))
}

/// Right-pads with zeros or truncates at the end to exactly `target`
/// samples.
pub fn fit_length(mut samples: Vec<f32>, target: usize) -> Vec<f32> {
    samples.truncate(target);
    samples.resize(target, 0.0);
    samples
}

/// Decodes all frames of the first decodable track.
/// Returns interleaved f32 samples, source rate, and channel count.
fn decode_bytes(bytes: &[u8]) -> Result<(Vec<f32>, u32, usize), AudioError> {
    if bytes.is_empty() {
        return Err(AudioError::Decode("empty input".into()));
    }

    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());
    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::Decode(e.to_string()))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::Decode("no decodable audio track".into()))?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::Decode(e.to_string()))?;

    let mut interleaved = Vec::new();
    let mut sample_rate = 0u32;
    let mut channels = 0usize;
    let mut sample_buf = None;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            // End of stream surfaces as an UnexpectedEof I/O error.
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(AudioError::Decode(e.to_string())),
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate = spec.rate;
                channels = spec.channels.count();
                let buf = sample_buf.get_or_insert_with(|| {
                    symphonia::core::audio::SampleBuffer::<f32>::new(
                        decoded.capacity() as u64,
                        spec,
                    )
                });
                buf.copy_interleaved_ref(decoded);
                interleaved.extend_from_slice(buf.samples());
            }
            // A corrupt frame is skipped; the rest of the stream may
            // still decode.
            Err(SymphoniaError::DecodeError(e)) => {
                debug!("skipping undecodable frame: {e}");
            }
            Err(e) => return Err(AudioError::Decode(e.to_string())),
        }
    }

    if interleaved.is_empty() || sample_rate == 0 || channels == 0 {
        return Err(AudioError::Decode("stream contained no audio frames".into()));
    }
    Ok((interleaved, sample_rate, channels))
}

/// Averages interleaved channels into a mono signal.
fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}
