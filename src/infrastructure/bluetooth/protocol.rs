//! BLEIO Protocol
//!
//! UUIDs, opcodes and pin tables for talking to the BLEIO GPIO firmware,
//! plus parsing helpers for the textual forms used in settings.

use crate::error::{Error, Result};
use uuid::Uuid;

/// BLEIO GPIO service UUID
pub const SERVICE_UUID: &str = "4fafc201-1fb5-459e-8fcc-c5c9c333914b";

/// Command write characteristic - receives count-prefixed command frames
pub const WRITE_CHAR_UUID: &str = "beb5483e-36e1-4688-b7f5-ea07361b26a8";

/// Digital read characteristic - returns the state of all input pins
pub const READ_CHAR_UUID: &str = "1c95d5e3-d8f7-413a-bf3d-7a2e5d7be87e";

/// ADC read characteristic (extended firmware only)
pub const ADC_CHAR_UUID: &str = "2d8a7b3c-4e9f-4a1b-8c5d-6e7f8a9b0c1d";

pub const SERVICE: Uuid = Uuid::from_u128(0x4fafc201_1fb5_459e_8fcc_c5c9c333914b);
pub const WRITE_CHAR: Uuid = Uuid::from_u128(0xbeb5483e_36e1_4688_b7f5_ea07361b26a8);
pub const READ_CHAR: Uuid = Uuid::from_u128(0x1c95d5e3_d8f7_413a_bf3d_7a2e5d7be87e);
pub const ADC_CHAR: Uuid = Uuid::from_u128(0x2d8a7b3c_4e9f_4a1b_8c5d_6e7f8a9b0c1d);

/// Maximum number of commands the firmware accepts in one frame
pub const MAX_COMMANDS_PER_FRAME: usize = 24;

/// ESP32 pins wired to ADC1
pub const ADC_PINS: [u8; 6] = [32, 33, 34, 35, 36, 39];

/// Full-scale raw value of the 12-bit ADC
pub const ADC_MAX_RAW: f64 = 4095.0;

/// Command opcodes understood by the firmware
pub mod opcode {
    pub const SET_OUTPUT: u8 = 0;
    pub const SET_INPUT_FLOATING: u8 = 1;
    pub const SET_INPUT_PULLUP: u8 = 2;
    pub const SET_INPUT_PULLDOWN: u8 = 3;
    pub const DIGITAL_LOW: u8 = 10;
    pub const DIGITAL_HIGH: u8 = 11;
    pub const BLINK_500MS: u8 = 12;
    pub const BLINK_250MS: u8 = 13;
    pub const SET_PWM: u8 = 20;
    pub const ENABLE_ADC: u8 = 30;
    pub const DISABLE_ADC: u8 = 31;

    // Extended firmware only. These codes and the two-record LED layouts are
    // assumed; correct them here if the firmware disagrees.
    pub const SET_DISCONNECT_BEHAVIOR: u8 = 40;
    pub const ENABLE_SERIAL_LED: u8 = 50;
    /// param1 = LED index, param2 = red
    pub const SERIAL_LED_COLOR: u8 = 51;
    /// param1 = green, param2 = blue; follows SERIAL_LED_COLOR in the same frame
    pub const SERIAL_LED_COLOR_GB: u8 = 52;
    /// param1 = LED index, param2 = pattern
    pub const SERIAL_LED_PATTERN: u8 = 53;
    /// Pattern parameters; follows SERIAL_LED_PATTERN in the same frame
    pub const SERIAL_LED_PATTERN_PARAMS: u8 = 54;
}

pub fn is_adc_pin(pin: u8) -> bool {
    ADC_PINS.contains(&pin)
}

/// Parse a UUID string from settings
pub fn parse_uuid(uuid_str: &str) -> Result<Uuid> {
    Uuid::parse_str(uuid_str.trim()).map_err(|_| Error::InvalidUuid {
        value: uuid_str.to_string(),
    })
}

/// Parse an "aa:bb:cc:dd:ee:ff" address into its six octets
pub fn parse_mac_address(text: &str) -> Result<[u8; 6]> {
    let parse_error = || Error::AddressParse {
        input: text.to_string(),
    };

    let segments: Vec<&str> = text.trim().split(':').collect();
    if segments.len() != 6 {
        return Err(parse_error());
    }

    let mut bytes = [0u8; 6];
    for (byte, segment) in bytes.iter_mut().zip(&segments) {
        if segment.is_empty() || segment.len() > 2 {
            return Err(parse_error());
        }
        *byte = u8::from_str_radix(segment, 16).map_err(|_| parse_error())?;
    }
    Ok(bytes)
}

/// Pack six octets into the 48-bit address, most significant first
pub fn address_from_bytes(bytes: [u8; 6]) -> u64 {
    bytes
        .iter()
        .enumerate()
        .fold(0u64, |addr, (i, &b)| addr | (b as u64) << (8 * (5 - i)))
}

pub fn format_mac_address(address: u64) -> String {
    (0..6)
        .map(|i| format!("{:02x}", (address >> (8 * (5 - i))) & 0xFF))
        .collect::<Vec<_>>()
        .join(":")
}
