//! PCM WAV encoding
//!
//! 16-bit linear PCM in a canonical 44-byte RIFF header, little-endian,
//! interleaved samples. Written by hand so the byte layout is fixed.

use std::io::Write;

use rh_core::{Sample, Signal};

use crate::error::{OfflineError, OfflineResult};

/// Size of the RIFF/WAVE header
pub const WAV_HEADER_LEN: usize = 44;

/// Largest data chunk the 32-bit RIFF size fields can describe
pub const MAX_DATA_LEN: usize = u32::MAX as usize - 36;

const BITS_PER_SAMPLE: u16 = 16;
const BYTES_PER_SAMPLE: usize = 2;
const FORMAT_PCM: u16 = 1;

/// 16-bit PCM WAV encoder
#[derive(Debug, Clone, Copy, Default)]
pub struct PcmEncoder;

impl PcmEncoder {
    /// Total encoded size in bytes
    pub fn encoded_len(signal: &Signal) -> usize {
        WAV_HEADER_LEN + Self::data_len(signal)
    }

    fn data_len(signal: &Signal) -> usize {
        signal.frame_count() * signal.channel_count() * BYTES_PER_SAMPLE
    }

    /// Data chunk size for `frames` x `channels`, or an error when it does not fit a WAV file
    pub fn checked_data_len(frames: usize, channels: usize) -> OfflineResult<usize> {
        frames
            .checked_mul(channels)
            .and_then(|n| n.checked_mul(BYTES_PER_SAMPLE))
            .filter(|&len| len <= MAX_DATA_LEN)
            .ok_or_else(|| {
                OfflineError::Encoding(format!(
                    "{} frames x {} channels exceeds the WAV size limit",
                    frames, channels
                ))
            })
    }

    /// Clamp to [-1, 1], scale by 32767 and truncate toward zero
    #[inline]
    pub fn quantize(sample: Sample) -> i16 {
        (sample.clamp(-1.0, 1.0) * i16::MAX as f64) as i16
    }

    /// Encode into a new buffer.
    ///
    /// Total for any signal. Past [`MAX_DATA_LEN`] the header size fields
    /// saturate and no longer describe the payload; [`Self::encode_to_writer`]
    /// and [`Self::encode_to_path`] refuse such signals instead.
    pub fn encode(signal: &Signal) -> Vec<u8> {
        let mut output = Vec::with_capacity(Self::encoded_len(signal));
        Self::write_header(&mut output, signal);

        let frames = signal.frame_count();
        for frame in 0..frames {
            for ch in signal.channels() {
                output.extend_from_slice(&Self::quantize(ch[frame]).to_le_bytes());
            }
        }

        output
    }

    /// Encode into `writer`; fails with `InvalidInput` past [`MAX_DATA_LEN`]
    pub fn encode_to_writer<W: Write>(signal: &Signal, mut writer: W) -> std::io::Result<()> {
        Self::checked_data_len(signal.frame_count(), signal.channel_count())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
        writer.write_all(&Self::encode(signal))?;
        writer.flush()
    }

    /// Encode to a file; checks the RIFF size fields fit in 32 bits first
    pub fn encode_to_path(signal: &Signal, path: impl AsRef<std::path::Path>) -> OfflineResult<()> {
        Self::checked_data_len(signal.frame_count(), signal.channel_count())?;

        let file = std::fs::File::create(path.as_ref())?;
        Self::encode_to_writer(signal, std::io::BufWriter::new(file))?;
        log::debug!(
            "wrote {} bytes to {}",
            Self::encoded_len(signal),
            path.as_ref().display()
        );
        Ok(())
    }

    fn write_header(output: &mut Vec<u8>, signal: &Signal) {
        let channels = signal.channel_count() as u16;
        let sample_rate = signal.sample_rate();
        let block_align = channels * BYTES_PER_SAMPLE as u16;
        let byte_rate = sample_rate.saturating_mul(block_align as u32);
        let data_len = Self::data_len(signal) as u32;

        // ═══════════════════════════════════════════════════════════════════
        // RIFF chunk
        // ═══════════════════════════════════════════════════════════════════
        output.extend_from_slice(b"RIFF");
        output.extend_from_slice(&data_len.saturating_add(36).to_le_bytes());
        output.extend_from_slice(b"WAVE");

        // ═══════════════════════════════════════════════════════════════════
        // fmt chunk
        // ═══════════════════════════════════════════════════════════════════
        output.extend_from_slice(b"fmt ");
        output.extend_from_slice(&16u32.to_le_bytes());
        output.extend_from_slice(&FORMAT_PCM.to_le_bytes());
        output.extend_from_slice(&channels.to_le_bytes());
        output.extend_from_slice(&sample_rate.to_le_bytes());
        output.extend_from_slice(&byte_rate.to_le_bytes());
        output.extend_from_slice(&block_align.to_le_bytes());
        output.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

        // ═══════════════════════════════════════════════════════════════════
        // data chunk
        // ═══════════════════════════════════════════════════════════════════
        output.extend_from_slice(b"data");
        output.extend_from_slice(&data_len.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantize_truncates_and_clamps() {
        assert_eq!(PcmEncoder::quantize(0.0), 0);
        assert_eq!(PcmEncoder::quantize(1.0), 32767);
        assert_eq!(PcmEncoder::quantize(-1.0), -32767);
        assert_eq!(PcmEncoder::quantize(2.5), 32767);
        assert_eq!(PcmEncoder::quantize(-7.0), -32767);
        // 0.5 * 32767 = 16383.5 -> 16383
        assert_eq!(PcmEncoder::quantize(0.5), 16383);
        assert_eq!(PcmEncoder::quantize(-0.5), -16383);
    }

    #[test]
    fn test_header_layout() {
        let signal = Signal::stereo(vec![0.0; 10], vec![0.0; 10], 48000).unwrap();
        let bytes = PcmEncoder::encode(&signal);

        assert_eq!(bytes.len(), 44 + 40);
        assert_eq!(bytes.len(), PcmEncoder::encoded_len(&signal));
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[4..8], &(36u32 + 40).to_le_bytes());
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(&bytes[16..20], &16u32.to_le_bytes());
        assert_eq!(&bytes[20..22], &1u16.to_le_bytes());
        assert_eq!(&bytes[22..24], &2u16.to_le_bytes());
        assert_eq!(&bytes[24..28], &48000u32.to_le_bytes());
        assert_eq!(&bytes[28..32], &(48000u32 * 4).to_le_bytes());
        assert_eq!(&bytes[32..34], &4u16.to_le_bytes());
        assert_eq!(&bytes[34..36], &16u16.to_le_bytes());
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(&bytes[40..44], &40u32.to_le_bytes());
    }

    #[test]
    fn test_samples_are_interleaved() {
        let signal = Signal::stereo(vec![1.0, 0.0], vec![-1.0, 0.5], 8000).unwrap();
        let bytes = PcmEncoder::encode(&signal);
        let samples: Vec<i16> = bytes[44..]
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(samples, vec![32767, -32767, 0, 16383]);
    }

    #[test]
    fn test_writer_matches_buffer() {
        let signal = Signal::mono(vec![0.25, -0.75, 0.1], 22050).unwrap();
        let mut out = Vec::new();
        PcmEncoder::encode_to_writer(&signal, &mut out).unwrap();
        assert_eq!(out, PcmEncoder::encode(&signal));
    }

    #[test]
    fn test_size_limit() {
        assert_eq!(PcmEncoder::checked_data_len(44100, 2).unwrap(), 176_400);
        assert_eq!(PcmEncoder::checked_data_len(0, 2).unwrap(), 0);

        // One frame past the limit, and an overflowing product
        let frames = MAX_DATA_LEN / 4 + 1;
        assert!(matches!(
            PcmEncoder::checked_data_len(frames, 2),
            Err(OfflineError::Encoding(_))
        ));
        assert!(PcmEncoder::checked_data_len(usize::MAX, 2).is_err());
    }

    #[test]
    fn test_empty_signal_is_header_only() {
        let signal = Signal::mono(vec![], 44100).unwrap();
        assert_eq!(PcmEncoder::encode(&signal).len(), WAV_HEADER_LEN);
    }
}
