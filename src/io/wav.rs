//! PCM16 stereo WAV encoding.
//!
//! Layout (little endian): `RIFF` size `WAVE`, a 16-byte `fmt ` chunk
//! (format 1, channels, sample rate, byte rate, block align, 16 bits) and a
//! `data` chunk of interleaved left/right samples.

use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::{backend::offline::StereoBuffer, error::EncodeError};

pub const CHANNELS: u16 = 2;
pub const BITS_PER_SAMPLE: u16 = 16;

/// Convert a float sample to PCM16, clamping to [-1, 1] first.
#[inline]
pub fn to_pcm16(sample: f32) -> i16 {
    let s = if sample.is_nan() { 0.0 } else { sample.clamp(-1.0, 1.0) };
    if s < 0.0 {
        (s * 32_768.0) as i16
    } else {
        (s * 32_767.0) as i16
    }
}

pub fn encode_wav(buffer: &StereoBuffer, sample_rate: u32) -> Result<Vec<u8>, EncodeError> {
    let spec = WavSpec {
        channels: CHANNELS,
        sample_rate,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for (left, right) in buffer.interleaved() {
            writer.write_sample(to_pcm16(left))?;
            writer.write_sample(to_pcm16(right))?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u32_at(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    }

    fn u16_at(bytes: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([bytes[at], bytes[at + 1]])
    }

    #[test]
    fn pcm16_conversion_is_asymmetric_and_clamped() {
        assert_eq!(to_pcm16(1.0), 32_767);
        assert_eq!(to_pcm16(-1.0), -32_768);
        assert_eq!(to_pcm16(3.0), 32_767);
        assert_eq!(to_pcm16(-3.0), -32_768);
        assert_eq!(to_pcm16(0.0), 0);
        assert_eq!(to_pcm16(0.5), 16_383);
        assert_eq!(to_pcm16(f32::NAN), 0);
    }

    #[test]
    fn canonical_header() {
        let mut buffer = StereoBuffer::with_len(3);
        buffer.left = vec![0.5, -0.5, 1.0];
        buffer.right = vec![0.0, 0.25, -1.0];
        let bytes = encode_wav(&buffer, 44_100).unwrap();

        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(u32_at(&bytes, 4) as usize, bytes.len() - 8);
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(u32_at(&bytes, 16), 16);
        assert_eq!(u16_at(&bytes, 20), 1, "PCM");
        assert_eq!(u16_at(&bytes, 22), 2);
        assert_eq!(u32_at(&bytes, 24), 44_100);
        assert_eq!(u32_at(&bytes, 28), 44_100 * 4, "byte rate");
        assert_eq!(u16_at(&bytes, 32), 4, "block align");
        assert_eq!(u16_at(&bytes, 34), 16);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(u32_at(&bytes, 40), 12);
        assert_eq!(bytes.len(), 44 + 12);

        let first_left = i16::from_le_bytes([bytes[44], bytes[45]]);
        let last_right = i16::from_le_bytes([bytes[54], bytes[55]]);
        assert_eq!(first_left, 16_383);
        assert_eq!(last_right, -32_768);
    }
}
