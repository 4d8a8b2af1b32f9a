//! 16-bit stereo PCM WAV encoding.
//!
//! Samples go through a [`hound::WavWriter`] with a fixed spec, which yields a
//! 44-byte RIFF header followed by interleaved little-endian samples.
//! Identical buffers always encode to identical bytes.

use std::io::{Cursor, Seek, Write};
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::error::{RedactError, RedactResult};
use crate::render::StereoBuffer;

pub const HEADER_LEN: usize = 44;
pub const CHANNELS: u16 = 2;
pub const BITS_PER_SAMPLE: u16 = 16;
pub const BLOCK_ALIGN: u16 = CHANNELS * BITS_PER_SAMPLE / 8;

/// Data chunk size for `frames`, or `EncodingOverflow` if the RIFF size
/// field cannot hold it.
pub fn data_len(frames: u64) -> RedactResult<u32> {
    frames
        .checked_mul(u64::from(BLOCK_ALIGN))
        .filter(|bytes| bytes + (HEADER_LEN as u64 - 8) <= u64::from(u32::MAX))
        .and_then(|bytes| u32::try_from(bytes).ok())
        .ok_or(RedactError::EncodingOverflow { frames })
}

/// Quantize one sample. Negative values scale by 32768 so that -1.0 reaches
/// `i16::MIN`.
pub fn quantize(sample: f32) -> i16 {
    let s = if sample.is_nan() { 0.0 } else { sample.clamp(-1.0, 1.0) };
    let scale = if s < 0.0 { 32768.0 } else { 32767.0 };
    (s * scale).round() as i16
}

fn spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: CHANNELS,
        sample_rate,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    }
}

/// Reject buffers whose sizes the RIFF header cannot represent.
fn check_size(buffer: &StereoBuffer) -> RedactResult<()> {
    let frames = buffer.frames() as u64;
    data_len(frames)?;
    buffer
        .sample_rate()
        .checked_mul(u32::from(BLOCK_ALIGN))
        .ok_or(RedactError::EncodingOverflow { frames })?;
    Ok(())
}

fn write_samples<W: Write + Seek>(
    mut writer: WavWriter<W>,
    buffer: &StereoBuffer,
) -> RedactResult<()> {
    for (l, r) in buffer.left().iter().zip(buffer.right()) {
        writer.write_sample(quantize(*l))?;
        writer.write_sample(quantize(*r))?;
    }
    writer.finalize()?;
    Ok(())
}

/// Encode a buffer to WAV bytes.
pub fn encode(buffer: &StereoBuffer) -> RedactResult<Vec<u8>> {
    check_size(buffer)?;

    let capacity = HEADER_LEN + buffer.frames() * usize::from(BLOCK_ALIGN);
    let mut cursor = Cursor::new(Vec::with_capacity(capacity));
    let writer = WavWriter::new(&mut cursor, spec(buffer.sample_rate()))?;
    write_samples(writer, buffer)?;
    Ok(cursor.into_inner())
}

/// Encode and write the whole file.
///
/// The bytes go to a sibling temp file that is renamed into place, so a
/// failed export never leaves a truncated file at `path`.
pub fn write_wav(path: impl AsRef<Path>, buffer: &StereoBuffer) -> RedactResult<()> {
    let path = path.as_ref();
    check_size(buffer)?;

    let tmp = path.with_extension("wav.partial");
    let result = WavWriter::create(&tmp, spec(buffer.sample_rate()))
        .map_err(RedactError::from)
        .and_then(|writer| write_samples(writer, buffer))
        .and_then(|()| std::fs::rename(&tmp, path).map_err(RedactError::from));
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}
