//! WinRT GATT Transport
//!
//! [`GattTransport`] on top of the Windows.Devices.Bluetooth APIs. All GATT
//! requests bypass the system cache.

use crate::infrastructure::bluetooth::transport::{
    DeviceSelector, GattFailure, GattTransport, LinkEvent, TransportResult,
};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use windows::core::{GUID, HSTRING};
use windows::Devices::Bluetooth::GenericAttributeProfile::{
    GattCharacteristic, GattCharacteristicProperties, GattCommunicationStatus, GattDeviceService,
};
use windows::Devices::Bluetooth::{BluetoothCacheMode, BluetoothConnectionStatus, BluetoothLEDevice};
use windows::Devices::Enumeration::DeviceInformation;
use windows::Foundation::TypedEventHandler;
use windows::Storage::Streams::{DataReader, DataWriter, IBuffer};

impl From<windows::core::Error> for GattFailure {
    fn from(error: windows::core::Error) -> Self {
        GattFailure::Other(error.code().0)
    }
}

fn check_status(status: GattCommunicationStatus) -> TransportResult<()> {
    match status {
        GattCommunicationStatus::Success => Ok(()),
        GattCommunicationStatus::Unreachable => Err(GattFailure::Unreachable),
        GattCommunicationStatus::ProtocolError => Err(GattFailure::ProtocolError),
        GattCommunicationStatus::AccessDenied => Err(GattFailure::AccessDenied),
        other => Err(GattFailure::Other(other.0)),
    }
}

fn to_guid(uuid: Uuid) -> GUID {
    GUID::from_u128(uuid.as_u128())
}

fn buffer_to_vec(buffer: &IBuffer) -> windows::core::Result<Vec<u8>> {
    let reader = DataReader::FromBuffer(buffer)?;
    let length = reader.UnconsumedBufferLength()? as usize;
    let mut bytes = vec![0u8; length];
    reader.ReadBytes(&mut bytes)?;
    Ok(bytes)
}

/// WinRT hands back a null device for unknown or unreachable peripherals,
/// which surfaces as an error. Such devices count as not found.
fn opened(result: windows::core::Result<BluetoothLEDevice>) -> Option<BluetoothLEDevice> {
    match result {
        Ok(device) => Some(device),
        Err(e) => {
            debug!("Device could not be opened: {}", e);
            None
        }
    }
}

#[derive(Debug, Default)]
pub struct WinRtTransport;

impl WinRtTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl GattTransport for WinRtTransport {
    /// Scan results are devices that already opened
    type DeviceRef = BluetoothLEDevice;
    type Device = BluetoothLEDevice;
    type Service = GattDeviceService;
    type Characteristic = GattCharacteristic;
    type Subscription = i64;

    async fn scan(&self, selector: &DeviceSelector) -> TransportResult<Vec<BluetoothLEDevice>> {
        match selector {
            DeviceSelector::Name(name) => {
                let filter = BluetoothLEDevice::GetDeviceSelectorFromDeviceName(&HSTRING::from(
                    name.as_str(),
                ))?;
                let devices = DeviceInformation::FindAllAsyncAqsFilter(&filter)?.await?;
                let count = devices.Size()?;
                debug!("Enumeration returned {} device(s) named {}", count, name);

                let mut found = Vec::with_capacity(count as usize);
                for i in 0..count {
                    let id = devices.GetAt(i)?.Id()?;
                    if let Some(device) = opened(BluetoothLEDevice::FromIdAsync(&id)?.await) {
                        found.push(device);
                    }
                }
                Ok(found)
            }
            DeviceSelector::Address(address) => {
                let device = opened(BluetoothLEDevice::FromBluetoothAddressAsync(*address)?.await);
                Ok(device.into_iter().collect())
            }
        }
    }

    async fn connect(&self, device: &BluetoothLEDevice) -> TransportResult<BluetoothLEDevice> {
        info!("Opened device {:?}", device.Name()?);
        Ok(device.clone())
    }

    async fn list_services(
        &self,
        device: &BluetoothLEDevice,
    ) -> TransportResult<Vec<GattDeviceService>> {
        let result = device
            .GetGattServicesWithCacheModeAsync(BluetoothCacheMode::Uncached)?
            .await?;
        check_status(result.Status()?)?;

        let services = result.Services()?;
        let mut list = Vec::with_capacity(services.Size()? as usize);
        for i in 0..services.Size()? {
            list.push(services.GetAt(i)?);
        }
        Ok(list)
    }

    fn service_uuid(&self, service: &GattDeviceService) -> Uuid {
        service
            .Uuid()
            .map(|guid| Uuid::from_u128(guid.to_u128()))
            .unwrap_or_default()
    }

    async fn list_characteristics(
        &self,
        service: &GattDeviceService,
        uuid: Uuid,
    ) -> TransportResult<Vec<GattCharacteristic>> {
        let result = service
            .GetCharacteristicsForUuidWithCacheModeAsync(
                to_guid(uuid),
                BluetoothCacheMode::Uncached,
            )?
            .await?;
        check_status(result.Status()?)?;

        let characteristics = result.Characteristics()?;
        let mut list = Vec::with_capacity(characteristics.Size()? as usize);
        for i in 0..characteristics.Size()? {
            list.push(characteristics.GetAt(i)?);
        }
        Ok(list)
    }

    fn is_writable(&self, characteristic: &GattCharacteristic) -> bool {
        let writable = GattCharacteristicProperties::Write.0
            | GattCharacteristicProperties::WriteWithoutResponse.0;
        characteristic
            .CharacteristicProperties()
            .map(|props| props.0 & writable != 0)
            .unwrap_or(false)
    }

    async fn write(&self, characteristic: &GattCharacteristic, data: &[u8]) -> TransportResult<()> {
        let writer = DataWriter::new()?;
        writer.WriteBytes(data)?;
        let buffer = writer.DetachBuffer()?;

        let status = characteristic.WriteValueAsync(&buffer)?.await?;
        check_status(status)
    }

    async fn read(&self, characteristic: &GattCharacteristic) -> TransportResult<Vec<u8>> {
        let result = characteristic
            .ReadValueWithCacheModeAsync(BluetoothCacheMode::Uncached)?
            .await?;
        check_status(result.Status()?)?;
        Ok(buffer_to_vec(&result.Value()?)?)
    }

    fn subscribe_status(
        &self,
        device: &BluetoothLEDevice,
        events: mpsc::UnboundedSender<LinkEvent>,
    ) -> TransportResult<i64> {
        let handler =
            TypedEventHandler::new(move |dev: windows::core::Ref<BluetoothLEDevice>, _| {
                if let Some(dev) = dev.as_ref() {
                    if let Ok(status) = dev.ConnectionStatus() {
                        let connected = status == BluetoothConnectionStatus::Connected;
                        let _ = events.send(LinkEvent::ConnectionStatusChanged { connected });
                    }
                }
                Ok(())
            });
        Ok(device.ConnectionStatusChanged(&handler)?)
    }

    fn unsubscribe_status(&self, device: &BluetoothLEDevice, token: i64) {
        if let Err(e) = device.RemoveConnectionStatusChanged(token) {
            warn!("Failed to remove status handler: {}", e);
        }
    }

    fn release_service(&self, service: GattDeviceService) {
        let _ = service.Close();
    }

    fn release_device(&self, device: BluetoothLEDevice) {
        let _ = device.Close();
    }
}
