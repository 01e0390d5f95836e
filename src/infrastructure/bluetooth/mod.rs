//! Bluetooth Module
//!
//! BLE GATT client for the BLEIO GPIO peripheral.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     DeviceSession                        │
//! │  (GPIO operations - public API for the application)      │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │
//!         ┌─────────────┼─────────────┐
//!         │             │             │
//!         ▼             ▼             ▼
//! ┌────────────┐  ┌──────────┐  ┌──────────┐
//! │ Connection │  │  Codec   │  │  Poller  │
//! │            │  │          │  │          │
//! │ - Discovery│  │ - Frames │  │ - Legacy │
//! │ - GATT     │  │ - Reads  │  │   reads  │
//! └─────┬──────┘  └──────────┘  └──────────┘
//!       │
//!       ▼
//! ┌────────────────┐
//! │ GattTransport  │  (WinRT on Windows, scripted mock in tests)
//! └────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`protocol`] - UUIDs, opcodes, pin tables and address parsing
//! - [`codec`] - Command frame encoding and read response decoding
//! - [`transport`] - BLE stack abstraction
//! - [`connection`] - Device discovery, GATT resolution and session lifecycle
//! - [`session`] - GPIO operations on a connected device
//! - [`poller`] - Single-pin reads for older firmware

pub mod codec;
pub mod connection;
pub mod poller;
pub mod protocol;
pub mod session;
pub mod transport;
#[cfg(windows)]
pub mod winrt;

#[cfg(test)]
pub(crate) mod mock;

pub use connection::{ConnectionConfig, ConnectionManager, DeviceSession};
pub use transport::{DeviceSelector, GattFailure, GattTransport, LinkEvent};
#[cfg(windows)]
pub use winrt::WinRtTransport;
