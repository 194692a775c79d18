//! PCM to WAV wrapping for realtime audio capture.

use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};

use super::EncodingError;

/// Realtime capture format: PCM 16-bit signed little-endian, mono, 16 kHz.
pub const SAMPLE_RATE: u32 = 16_000;
pub const CHANNELS: u16 = 1;
pub const BITS_PER_SAMPLE: u16 = 16;

/// Wrap raw PCM16LE data in a WAV container.
///
/// A trailing half-sample (odd byte count) is dropped.
pub fn pcm16_to_wav(pcm: &[u8]) -> Result<Vec<u8>, EncodingError> {
    let spec = WavSpec {
        channels: CHANNELS,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)
            .map_err(|e| EncodingError::WavEncoding(e.to_string()))?;
        for sample in pcm.chunks_exact(2) {
            let value = i16::from_le_bytes([sample[0], sample[1]]);
            writer
                .write_sample(value)
                .map_err(|e| EncodingError::WavEncoding(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| EncodingError::WavEncoding(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_pcm_in_riff_container() {
        let pcm = vec![0u8, 0, 0x10, 0x20, 0xFF, 0x7F];
        let wav = pcm16_to_wav(&pcm).unwrap();

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        // data payload round-trips
        assert!(wav.len() > pcm.len());
        assert_eq!(&wav[wav.len() - pcm.len()..], pcm.as_slice());
    }

    #[test]
    fn empty_pcm_yields_header_only() {
        let wav = pcm16_to_wav(&[]).unwrap();
        assert_eq!(&wav[0..4], b"RIFF");
    }

    #[test]
    fn trailing_odd_byte_is_dropped() {
        let wav_even = pcm16_to_wav(&[1, 2, 3, 4]).unwrap();
        let wav_odd = pcm16_to_wav(&[1, 2, 3, 4, 5]).unwrap();
        assert_eq!(wav_even, wav_odd);
    }
}
