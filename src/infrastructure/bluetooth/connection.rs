//! BLE Connection Module
//!
//! Device discovery, GATT service/characteristic resolution and the session
//! lifecycle. A [`DeviceSession`] owns every handle it resolved and releases
//! them in reverse order (characteristics, service, device).

use crate::domain::models::{AdcAttenuation, Capabilities, ConnectionStatus, ReadProtocol};
use crate::domain::settings::Settings;
use crate::error::{Error, Result};
use crate::infrastructure::bluetooth::poller::{PollConfig, SinglePinPoller};
use crate::infrastructure::bluetooth::protocol::{self, address_from_bytes, parse_mac_address};
use crate::infrastructure::bluetooth::transport::{DeviceSelector, GattTransport, LinkEvent};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Configuration for connection behavior
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Service UUID to look for
    pub service_uuid: Uuid,
    /// Command write characteristic UUID
    pub write_char_uuid: Uuid,
    /// Digital read characteristic UUID
    pub read_char_uuid: Uuid,
    /// Optional ADC read characteristic UUID
    pub adc_char_uuid: Uuid,
    pub read_protocol: ReadProtocol,
    pub poll: PollConfig,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            service_uuid: protocol::SERVICE,
            write_char_uuid: protocol::WRITE_CHAR,
            read_char_uuid: protocol::READ_CHAR,
            adc_char_uuid: protocol::ADC_CHAR,
            read_protocol: ReadProtocol::Auto,
            poll: PollConfig::default(),
        }
    }
}

impl ConnectionConfig {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            service_uuid: protocol::parse_uuid(&settings.ble_service_uuid)?,
            write_char_uuid: protocol::parse_uuid(&settings.ble_write_char_uuid)?,
            read_char_uuid: protocol::parse_uuid(&settings.ble_read_char_uuid)?,
            adc_char_uuid: protocol::parse_uuid(&settings.ble_adc_char_uuid)?,
            read_protocol: settings.read_protocol,
            poll: PollConfig {
                max_retries: settings.poll_max_retries,
                interval: Duration::from_millis(settings.poll_interval_ms),
            },
        })
    }
}

/// Handles and state guarded by the session mutex
pub(crate) struct Link<T: GattTransport> {
    pub(crate) status: ConnectionStatus,
    device: Option<T::Device>,
    service: Option<T::Service>,
    pub(crate) write_char: Option<T::Characteristic>,
    pub(crate) read_char: Option<T::Characteristic>,
    pub(crate) adc_char: Option<T::Characteristic>,
    subscription: Option<T::Subscription>,
    events: Option<mpsc::UnboundedReceiver<LinkEvent>>,
    /// Attenuation configured through `enable_adc`, per pin
    pub(crate) adc_attenuation: HashMap<u8, AdcAttenuation>,
}

impl<T: GattTransport> Link<T> {
    fn connecting() -> Self {
        Self {
            status: ConnectionStatus::Connecting,
            device: None,
            service: None,
            write_char: None,
            read_char: None,
            adc_char: None,
            subscription: None,
            events: None,
            adc_attenuation: HashMap::new(),
        }
    }

    /// Apply status changes reported by the transport since the last call
    fn apply_pending_events(&mut self) {
        let Some(events) = self.events.as_mut() else {
            return;
        };

        while let Ok(LinkEvent::ConnectionStatusChanged { connected }) = events.try_recv() {
            match (self.status, connected) {
                (ConnectionStatus::Ready, false) => {
                    warn!("Connection to device lost");
                    self.status = ConnectionStatus::Lost;
                }
                (ConnectionStatus::Lost, true) => {
                    info!("Device reconnected");
                    self.status = ConnectionStatus::Ready;
                }
                _ => {}
            }
        }
    }

    pub(crate) fn ensure_ready(&mut self) -> Result<()> {
        self.apply_pending_events();
        if self.status == ConnectionStatus::Ready {
            Ok(())
        } else {
            Err(Error::NotConnected)
        }
    }

    /// Release everything held, newest first. Safe to call repeatedly.
    fn release(&mut self, transport: &T) {
        let had_device = self.device.is_some();

        if let Some(subscription) = self.subscription.take() {
            if let Some(device) = self.device.as_ref() {
                transport.unsubscribe_status(device, subscription);
            }
        }
        self.events = None;

        for characteristic in [
            self.adc_char.take(),
            self.read_char.take(),
            self.write_char.take(),
        ]
        .into_iter()
        .flatten()
        {
            transport.release_characteristic(characteristic);
        }
        if let Some(service) = self.service.take() {
            transport.release_service(service);
        }
        if let Some(device) = self.device.take() {
            transport.release_device(device);
        }

        self.adc_attenuation.clear();
        self.status = ConnectionStatus::Disconnected;

        if had_device {
            info!("Released device resources");
        }
    }
}

/// One connected BLEIO peripheral
pub struct DeviceSession<T: GattTransport> {
    pub(crate) transport: Arc<T>,
    pub(crate) capabilities: Capabilities,
    pub(crate) poller: SinglePinPoller,
    pub(crate) link: Mutex<Link<T>>,
}

impl<T: GattTransport> DeviceSession<T> {
    /// Current status, including any transport notifications not yet applied
    pub async fn status(&self) -> ConnectionStatus {
        let mut link = self.link.lock().await;
        link.apply_pending_events();
        link.status
    }

    pub async fn is_ready(&self) -> bool {
        self.status().await == ConnectionStatus::Ready
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Unsubscribe from status changes and release all handles.
    ///
    /// Idempotent: later calls are no-ops.
    pub async fn disconnect(&self) {
        let mut link = self.link.lock().await;
        if link.status != ConnectionStatus::Disconnected {
            info!("Disconnecting from device");
        }
        link.release(&self.transport);
    }
}

impl<T: GattTransport> Drop for DeviceSession<T> {
    fn drop(&mut self) {
        self.link.get_mut().release(&self.transport);
    }
}

/// Discovers the peripheral and builds ready sessions
pub struct ConnectionManager<T: GattTransport> {
    transport: Arc<T>,
    config: ConnectionConfig,
}

impl<T: GattTransport> ConnectionManager<T> {
    pub fn new(transport: Arc<T>, config: ConnectionConfig) -> Self {
        Self { transport, config }
    }

    /// Connect to the first device advertising `name`
    pub async fn connect_by_name(&self, name: &str) -> Result<DeviceSession<T>> {
        self.connect(DeviceSelector::Name(name.to_string())).await
    }

    /// Connect by an "aa:bb:cc:dd:ee:ff" address
    pub async fn connect_by_address(&self, address: &str) -> Result<DeviceSession<T>> {
        let bytes = parse_mac_address(address)?;
        self.connect_by_address_bytes(bytes).await
    }

    pub async fn connect_by_address_bytes(&self, bytes: [u8; 6]) -> Result<DeviceSession<T>> {
        self.connect(DeviceSelector::Address(address_from_bytes(bytes)))
            .await
    }

    async fn connect(&self, selector: DeviceSelector) -> Result<DeviceSession<T>> {
        info!("Connecting to device {}", selector);

        let candidates = self.transport.scan(&selector).await?;
        let Some(candidate) = candidates.first() else {
            warn!("Device '{}' not found", selector);
            return Err(Error::DeviceNotFound {
                selector: selector.to_string(),
            });
        };

        let device = self.transport.connect(candidate).await?;
        info!("Device connected: {}", selector);

        let mut link = Link::connecting();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let outcome = match self.resolve(&device, &mut link).await {
            Ok(capabilities) => self
                .transport
                .subscribe_status(&device, events_tx)
                .map(|subscription| (capabilities, subscription))
                .map_err(Error::from),
            Err(e) => Err(e),
        };
        link.device = Some(device);

        let (capabilities, subscription) = match outcome {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!("Connection setup failed: {}", e);
                link.release(&self.transport);
                return Err(e);
            }
        };

        link.subscription = Some(subscription);
        link.events = Some(events_rx);
        link.status = ConnectionStatus::Ready;

        info!("GATT initialization complete ({:?})", capabilities);

        Ok(DeviceSession {
            transport: Arc::clone(&self.transport),
            capabilities,
            poller: SinglePinPoller::new(self.config.poll.clone()),
            link: Mutex::new(link),
        })
    }

    /// Resolve the service and characteristics into `link`
    async fn resolve(&self, device: &T::Device, link: &mut Link<T>) -> Result<Capabilities> {
        let services = self.transport.list_services(device).await?;
        info!("Found {} services", services.len());

        for service in services {
            let uuid = self.transport.service_uuid(&service);
            debug!("  - service {}", uuid);
            if uuid == self.config.service_uuid && link.service.is_none() {
                link.service = Some(service);
            } else {
                self.transport.release_service(service);
            }
        }

        let service = link.service.as_ref().ok_or(Error::ServiceNotFound {
            uuid: self.config.service_uuid,
        })?;
        info!("Found BLEIO service");

        let write_uuid = self.config.write_char_uuid;
        link.write_char = Some(
            self.find_characteristic(service, write_uuid)
                .await?
                .ok_or(Error::CharacteristicNotFound { uuid: write_uuid })?,
        );
        info!("Found write characteristic");

        let read_uuid = self.config.read_char_uuid;
        let read_char = self
            .find_characteristic(service, read_uuid)
            .await?
            .ok_or(Error::CharacteristicNotFound { uuid: read_uuid })?;
        let read_writable = self.transport.is_writable(&read_char);
        link.read_char = Some(read_char);
        info!("Found read characteristic");

        link.adc_char = match self
            .find_characteristic(service, self.config.adc_char_uuid)
            .await
        {
            Ok(found) => found,
            Err(e) => {
                warn!("ADC characteristic lookup failed: {}", e);
                None
            }
        };
        if link.adc_char.is_some() {
            info!("Found ADC characteristic");
        } else {
            info!("ADC characteristic not present; ADC and LED chain features disabled");
        }

        let extended = link.adc_char.is_some();
        let read_protocol = match self.config.read_protocol {
            ReadProtocol::Auto if !extended && read_writable => ReadProtocol::SinglePinPoll,
            ReadProtocol::Auto => ReadProtocol::BatchReadAll,
            explicit => explicit,
        };

        Ok(Capabilities {
            adc: extended,
            serial_led: extended,
            read_protocol,
        })
    }

    /// First characteristic with `uuid`; any duplicates are released
    async fn find_characteristic(
        &self,
        service: &T::Service,
        uuid: Uuid,
    ) -> Result<Option<T::Characteristic>> {
        let mut found = self
            .transport
            .list_characteristics(service, uuid)
            .await?
            .into_iter();
        let first = found.next();
        for extra in found {
            self.transport.release_characteristic(extra);
        }
        Ok(first)
    }
}
