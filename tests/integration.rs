//! Integration tests for the public BLEIO client API.

use async_trait::async_trait;
use bleio_client::infrastructure::bluetooth::codec::{
    adc_to_voltage, decode_adc_reads, decode_digital_reads, encode_commands,
};
use bleio_client::infrastructure::bluetooth::protocol::{self, opcode};
use bleio_client::{
    AdcAttenuation, ConnectionConfig, ConnectionManager, ConnectionStatus, DeviceSelector,
    DigitalInput, Error, GattFailure, GattTransport, GpioCommand, LinkEvent, PinMode,
};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use uuid::Uuid;

#[test]
fn command_frame_layout() {
    let frame = encode_commands(&[
        GpioCommand::new(2, PinMode::Output as u8, 0, 0),
        GpioCommand::new(2, opcode::DIGITAL_HIGH, 0, 0),
    ])
    .unwrap();
    assert_eq!(frame, vec![2, 2, 0, 0, 0, 2, 11, 0, 0]);
}

#[test]
fn full_frame_accepted_oversized_rejected() {
    let commands = vec![GpioCommand::new(4, opcode::DIGITAL_LOW, 0, 0); 24];
    assert_eq!(encode_commands(&commands).unwrap().len(), 97);

    let commands = vec![GpioCommand::new(4, opcode::DIGITAL_LOW, 0, 0); 25];
    assert_eq!(
        encode_commands(&commands),
        Err(Error::InvalidBatchSize { count: 25 })
    );
}

#[test]
fn digital_response_decodes_in_order() {
    let inputs = decode_digital_reads(&[0x02, 0x05, 0x01, 0x22, 0x00]).unwrap();
    assert_eq!(
        inputs,
        vec![
            DigitalInput { pin: 5, state: true },
            DigitalInput { pin: 34, state: false },
        ]
    );
}

#[test]
fn adc_response_is_little_endian() {
    let values = decode_adc_reads(&[0x01, 34, 0xFF, 0x0F]).unwrap();
    assert_eq!(values, vec![(34, 4095)]);
    assert!((adc_to_voltage(4095, AdcAttenuation::Atten11dB) - 3.3).abs() < 1e-9);
}

/// Minimal transport written against the public trait only
struct LoopbackTransport {
    writes: Mutex<Vec<Vec<u8>>>,
}

struct Handle(Uuid);

#[async_trait]
impl GattTransport for LoopbackTransport {
    type DeviceRef = ();
    type Device = ();
    type Service = Handle;
    type Characteristic = Handle;
    type Subscription = ();

    async fn scan(&self, selector: &DeviceSelector) -> Result<Vec<()>, GattFailure> {
        Ok(match selector {
            DeviceSelector::Name(name) if name == "BLEIO" => vec![()],
            _ => Vec::new(),
        })
    }

    async fn connect(&self, _device: &()) -> Result<(), GattFailure> {
        Ok(())
    }

    async fn list_services(&self, _device: &()) -> Result<Vec<Handle>, GattFailure> {
        Ok(vec![Handle(protocol::SERVICE)])
    }

    fn service_uuid(&self, service: &Handle) -> Uuid {
        service.0
    }

    async fn list_characteristics(
        &self,
        _service: &Handle,
        uuid: Uuid,
    ) -> Result<Vec<Handle>, GattFailure> {
        // Base firmware: no ADC characteristic
        if uuid == protocol::ADC_CHAR {
            return Ok(Vec::new());
        }
        Ok(vec![Handle(uuid)])
    }

    fn is_writable(&self, characteristic: &Handle) -> bool {
        characteristic.0 == protocol::WRITE_CHAR
    }

    async fn write(&self, _characteristic: &Handle, data: &[u8]) -> Result<(), GattFailure> {
        self.writes.lock().unwrap().push(data.to_vec());
        Ok(())
    }

    async fn read(&self, _characteristic: &Handle) -> Result<Vec<u8>, GattFailure> {
        Ok(vec![0x01, 0x05, 0x01])
    }

    fn subscribe_status(
        &self,
        _device: &(),
        _events: mpsc::UnboundedSender<LinkEvent>,
    ) -> Result<(), GattFailure> {
        Ok(())
    }

    fn unsubscribe_status(&self, _device: &(), _subscription: ()) {}
}

#[tokio::test]
async fn session_over_custom_transport() {
    let transport = Arc::new(LoopbackTransport {
        writes: Mutex::new(Vec::new()),
    });
    let manager = ConnectionManager::new(Arc::clone(&transport), ConnectionConfig::default());

    assert!(matches!(
        manager.connect_by_name("ESP32").await,
        Err(Error::DeviceNotFound { .. })
    ));

    let session = manager.connect_by_name("BLEIO").await.unwrap();
    assert_eq!(session.status().await, ConnectionStatus::Ready);
    assert!(!session.capabilities().adc);

    session.digital_write(2, true).await.unwrap();
    assert_eq!(session.digital_read(5).await, Ok(Some(true)));
    assert_eq!(
        session.read_all_adc().await,
        Err(Error::FeatureUnavailable { feature: "ADC" })
    );
    assert_eq!(*transport.writes.lock().unwrap(), vec![vec![1, 2, 11, 0, 0]]);

    session.disconnect().await;
    assert_eq!(session.status().await, ConnectionStatus::Disconnected);
    assert_eq!(
        session.digital_write(2, false).await,
        Err(Error::NotConnected)
    );
}
