//! 16-bit PCM framing for realtime audio.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::{Result, StudioError};

pub const INPUT_SAMPLE_RATE: u32 = 16_000;

/// Clamps float samples to [-1, 1] and writes little-endian i16.
pub fn encode_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let clamped = if sample.is_nan() { 0.0 } else { sample.clamp(-1.0, 1.0) };
        let value = if clamped < 0.0 {
            (clamped * 32768.0) as i16
        } else {
            (clamped * 32767.0) as i16
        };
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

pub fn decode_pcm16(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|chunk| {
            let value = i16::from_le_bytes([chunk[0], chunk[1]]);
            if value < 0 {
                value as f32 / 32768.0
            } else {
                value as f32 / 32767.0
            }
        })
        .collect()
}

pub fn pcm16_base64(samples: &[f32]) -> String {
    STANDARD.encode(encode_pcm16(samples))
}

pub fn decode_pcm16_base64(data: &str) -> Result<Vec<f32>> {
    let bytes = STANDARD
        .decode(data)
        .map_err(|e| StudioError::SerializationError(format!("Invalid audio frame: {}", e)))?;
    Ok(decode_pcm16(&bytes))
}

pub fn pcm_mime_type(sample_rate: u32) -> String {
    format!("audio/pcm;rate={}", sample_rate)
}
