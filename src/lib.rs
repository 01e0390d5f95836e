//! Client driver for the BLEIO ESP32 GPIO peripheral over BLE GATT.
//!
//! Connect with a [`ConnectionManager`], then drive pins through the
//! returned [`DeviceSession`].

pub mod domain;
pub mod error;
pub mod infrastructure;

pub use domain::models::{
    AdcAttenuation, AdcReading, BlinkMode, Capabilities, ConnectionStatus, DigitalInput,
    DisconnectBehavior, GpioCommand, LatchMode, PinMode, PwmFrequency, ReadProtocol,
    SerialLedPattern,
};
pub use error::{Error, Result};
pub use infrastructure::bluetooth::{
    ConnectionConfig, ConnectionManager, DeviceSelector, DeviceSession, GattFailure,
    GattTransport, LinkEvent,
};
#[cfg(windows)]
pub use infrastructure::bluetooth::WinRtTransport;
