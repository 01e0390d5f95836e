use serde::{Deserialize, Serialize};

/// One remote GPIO operation, encoded as a 4-byte record on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpioCommand {
    pub pin: u8,
    pub opcode: u8,
    pub param1: u8,
    pub param2: u8,
}

impl GpioCommand {
    pub const fn new(pin: u8, opcode: u8, param1: u8, param2: u8) -> Self {
        Self {
            pin,
            opcode,
            param1,
            param2,
        }
    }

    pub fn to_bytes(&self) -> [u8; 4] {
        [self.pin, self.opcode, self.param1, self.param2]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PinMode {
    Output = 0,
    InputFloating = 1,
    InputPullup = 2,
    InputPulldown = 3,
}

/// Input latching applied by the firmware when a pin is configured as input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum LatchMode {
    #[default]
    None = 0,
    Low = 1,
    High = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BlinkMode {
    Blink500ms = 12,
    Blink250ms = 13,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum PwmFrequency {
    #[default]
    Freq1kHz = 0,
    Freq5kHz = 1,
    Freq10kHz = 2,
    Freq25kHz = 3,
    /// Servo motors
    Freq50Hz = 4,
    Freq100Hz = 5,
    Freq500Hz = 6,
    /// Above the audible range
    Freq20kHz = 7,
}

/// ADC input attenuation. Higher attenuation widens the measurable range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum AdcAttenuation {
    /// 0 - 1.1 V
    Atten0dB = 0,
    /// 0 - 1.5 V
    Atten2_5dB = 1,
    /// 0 - 2.2 V
    Atten6dB = 2,
    /// 0 - 3.3 V
    #[default]
    Atten11dB = 3,
}

/// What the firmware does with a pin when the BLE link drops.
///
/// Discriminants are sent as param1 of `opcode::SET_DISCONNECT_BEHAVIOR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum DisconnectBehavior {
    #[default]
    Maintain = 0,
    SetLow = 1,
    SetHigh = 2,
}

/// Animation applied to a single LED of an addressable chain.
///
/// Discriminants are sent as param2 of `opcode::SERIAL_LED_PATTERN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum SerialLedPattern {
    #[default]
    On = 0,
    Blink250ms = 1,
    Blink500ms = 2,
    Rainbow = 3,
    Flicker = 4,
}

/// Lifecycle state of a device session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Ready,
    /// The transport reported the link dropped; handles are still held.
    Lost,
}

/// How digital inputs are read back from the peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadProtocol {
    /// Decide from the resolved characteristics at connect time.
    #[default]
    Auto,
    /// One read returns every input pin, count-prefixed.
    BatchReadAll,
    /// Older firmware: write a pin selector, then poll for `[pin, state]`.
    SinglePinPoll,
}

/// Features available on the connected peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub adc: bool,
    pub serial_led: bool,
    pub read_protocol: ReadProtocol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigitalInput {
    pub pin: u8,
    pub state: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdcReading {
    pub pin: u8,
    pub raw: u16,
    pub voltage: f64,
    pub attenuation: AdcAttenuation,
}
