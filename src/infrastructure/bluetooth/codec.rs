//! Frame Codec
//!
//! Pure encoding and decoding of BLEIO wire frames. No I/O happens here.
//!
//! ```text
//! Command frame   : [count][pin, opcode, p1, p2] * count      (1 <= count <= 24)
//! Digital inputs  : [count][pin, state] * count
//! ADC values      : [count][pin, raw_lo, raw_hi] * count
//! Legacy response : [pin, state, ...]                         (no count prefix)
//! ```

use crate::domain::models::{AdcAttenuation, DigitalInput, GpioCommand};
use crate::error::{Error, Result};
use crate::infrastructure::bluetooth::protocol::{ADC_MAX_RAW, MAX_COMMANDS_PER_FRAME};
use thiserror::Error;

/// Shape errors in a response that was read successfully
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("received an empty response")]
    EmptyResponse,
    #[error("response length mismatch (expected {expected} bytes, got {actual})")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Encode a batch of commands into a single write frame.
///
/// Records keep the input order; the peripheral applies them in that order.
pub fn encode_commands(commands: &[GpioCommand]) -> Result<Vec<u8>> {
    if commands.is_empty() || commands.len() > MAX_COMMANDS_PER_FRAME {
        return Err(Error::InvalidBatchSize {
            count: commands.len(),
        });
    }

    let mut frame = Vec::with_capacity(1 + 4 * commands.len());
    frame.push(commands.len() as u8);
    for command in commands {
        frame.extend_from_slice(&command.to_bytes());
    }
    Ok(frame)
}

/// Validate a count-prefixed frame and return its records
fn split_records(bytes: &[u8], record_len: usize) -> std::result::Result<&[u8], DecodeError> {
    let count = *bytes.first().ok_or(DecodeError::EmptyResponse)? as usize;
    let expected = 1 + record_len * count;
    if bytes.len() != expected {
        return Err(DecodeError::LengthMismatch {
            expected,
            actual: bytes.len(),
        });
    }
    Ok(&bytes[1..])
}

/// Decode an "all inputs" response
pub fn decode_digital_reads(bytes: &[u8]) -> std::result::Result<Vec<DigitalInput>, DecodeError> {
    let records = split_records(bytes, 2)?;
    Ok(records
        .chunks_exact(2)
        .map(|r| DigitalInput {
            pin: r[0],
            state: r[1] != 0,
        })
        .collect())
}

/// Decode an ADC response into `(pin, raw)` pairs
pub fn decode_adc_reads(bytes: &[u8]) -> std::result::Result<Vec<(u8, u16)>, DecodeError> {
    let records = split_records(bytes, 3)?;
    Ok(records
        .chunks_exact(3)
        .map(|r| (r[0], u16::from_le_bytes([r[1], r[2]])))
        .collect())
}

/// Decode the legacy single-pin response.
///
/// Returns `None` until the peripheral has produced at least `[pin, state]`.
pub fn decode_single_pin(bytes: &[u8]) -> Option<DigitalInput> {
    match bytes {
        [pin, state, ..] => Some(DigitalInput {
            pin: *pin,
            state: *state != 0,
        }),
        _ => None,
    }
}

/// Full-scale voltage for a raw attenuation code. Unknown codes use 3.3 V.
pub fn full_scale_voltage(attenuation: u8) -> f64 {
    match attenuation {
        0 => 1.1,
        1 => 1.5,
        2 => 2.2,
        _ => 3.3,
    }
}

pub fn adc_to_voltage(raw: u16, attenuation: AdcAttenuation) -> f64 {
    raw as f64 / ADC_MAX_RAW * full_scale_voltage(attenuation as u8)
}
