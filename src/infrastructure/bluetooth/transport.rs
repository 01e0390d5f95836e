//! GATT Transport
//!
//! The capability surface the client needs from a BLE stack. Handles are
//! associated types so each backend keeps its native objects; the session
//! owns them and hands them back through the `release_*` methods.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Non-success GATT communication status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GattFailure {
    #[error("unreachable")]
    Unreachable,
    #[error("protocol error")]
    ProtocolError,
    #[error("access denied")]
    AccessDenied,
    #[error("status {0}")]
    Other(i32),
}

/// How to find the peripheral
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSelector {
    Name(String),
    /// 48-bit Bluetooth address
    Address(u64),
}

impl std::fmt::Display for DeviceSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name(name) => write!(f, "{}", name),
            Self::Address(address) => write!(
                f,
                "{}",
                crate::infrastructure::bluetooth::protocol::format_mac_address(*address)
            ),
        }
    }
}

/// Link-level notification from the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    ConnectionStatusChanged { connected: bool },
}

pub type TransportResult<T> = std::result::Result<T, GattFailure>;

#[async_trait]
pub trait GattTransport: Send + Sync + 'static {
    type DeviceRef: Send + Sync;
    type Device: Send + Sync;
    type Service: Send + Sync;
    type Characteristic: Send + Sync;
    /// Token returned by [`GattTransport::subscribe_status`]
    type Subscription: Send + Sync;

    async fn scan(&self, selector: &DeviceSelector) -> TransportResult<Vec<Self::DeviceRef>>;

    async fn connect(&self, device: &Self::DeviceRef) -> TransportResult<Self::Device>;

    /// All primary services on the device
    async fn list_services(&self, device: &Self::Device) -> TransportResult<Vec<Self::Service>>;

    fn service_uuid(&self, service: &Self::Service) -> Uuid;

    async fn list_characteristics(
        &self,
        service: &Self::Service,
        uuid: Uuid,
    ) -> TransportResult<Vec<Self::Characteristic>>;

    /// Whether the characteristic accepts writes
    fn is_writable(&self, characteristic: &Self::Characteristic) -> bool;

    async fn write(&self, characteristic: &Self::Characteristic, data: &[u8])
        -> TransportResult<()>;

    /// Uncached read of the characteristic value
    async fn read(&self, characteristic: &Self::Characteristic) -> TransportResult<Vec<u8>>;

    /// Forward connection status changes of `device` into `events`
    fn subscribe_status(
        &self,
        device: &Self::Device,
        events: mpsc::UnboundedSender<LinkEvent>,
    ) -> TransportResult<Self::Subscription>;

    fn unsubscribe_status(&self, device: &Self::Device, subscription: Self::Subscription);

    fn release_characteristic(&self, characteristic: Self::Characteristic) {
        drop(characteristic);
    }

    fn release_service(&self, service: Self::Service) {
        drop(service);
    }

    fn release_device(&self, device: Self::Device) {
        drop(device);
    }
}
