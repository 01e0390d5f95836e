//! Scripted in-memory transport for tests. Every call is recorded.

use crate::infrastructure::bluetooth::protocol;
use crate::infrastructure::bluetooth::transport::{
    DeviceSelector, GattFailure, GattTransport, LinkEvent, TransportResult,
};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

pub const MOCK_ADDRESS: u64 = 0xAABB_CCDD_EEFF;

const GENERIC_ACCESS: Uuid = Uuid::from_u128(0x00001800_0000_1000_8000_00805f9b34fb);
const BATTERY_SERVICE: Uuid = Uuid::from_u128(0x0000180f_0000_1000_8000_00805f9b34fb);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Scan(DeviceSelector),
    Connect(u64),
    ListServices,
    ListCharacteristics(Uuid),
    Write(Uuid, Vec<u8>),
    Read(Uuid),
    Subscribe,
    Unsubscribe,
    ReleaseCharacteristic(Uuid),
    ReleaseService(Uuid),
    ReleaseDevice,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCharacteristic {
    pub uuid: Uuid,
    pub writable: bool,
}

#[derive(Debug)]
pub struct MockDevice;

#[derive(Debug)]
pub struct MockService {
    pub uuid: Uuid,
}

#[derive(Default)]
struct MockState {
    devices: Vec<(String, u64)>,
    services: Vec<Uuid>,
    characteristics: Vec<MockCharacteristic>,
    reads: HashMap<Uuid, VecDeque<TransportResult<Vec<u8>>>>,
    write_results: VecDeque<TransportResult<()>>,
    subscribe_failure: Option<GattFailure>,
    status_sender: Option<mpsc::UnboundedSender<LinkEvent>>,
    calls: Vec<Call>,
}

pub struct MockTransport {
    state: Mutex<MockState>,
}

impl MockTransport {
    /// A BLEIO peripheral with the extended (ADC) firmware
    pub fn bleio() -> Self {
        let state = MockState {
            devices: vec![("BLEIO".to_string(), MOCK_ADDRESS)],
            services: vec![GENERIC_ACCESS, protocol::SERVICE, BATTERY_SERVICE],
            characteristics: vec![
                MockCharacteristic {
                    uuid: protocol::WRITE_CHAR,
                    writable: true,
                },
                MockCharacteristic {
                    uuid: protocol::READ_CHAR,
                    writable: false,
                },
                MockCharacteristic {
                    uuid: protocol::ADC_CHAR,
                    writable: false,
                },
            ],
            ..Default::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    fn with_state(self, f: impl FnOnce(&mut MockState)) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    pub fn without_service(self, uuid: Uuid) -> Self {
        self.with_state(|s| s.services.retain(|u| *u != uuid))
    }

    pub fn without_characteristic(self, uuid: Uuid) -> Self {
        self.with_state(|s| s.characteristics.retain(|c| c.uuid != uuid))
    }

    pub fn with_writable_read_characteristic(self) -> Self {
        self.with_state(|s| {
            for c in s.characteristics.iter_mut() {
                if c.uuid == protocol::READ_CHAR {
                    c.writable = true;
                }
            }
        })
    }

    pub fn with_subscribe_failure(self, failure: GattFailure) -> Self {
        self.with_state(|s| s.subscribe_failure = Some(failure))
    }

    /// Queue the result of the next read on `uuid`. Empty queues read `[]`.
    pub fn push_read(&self, uuid: Uuid, result: TransportResult<Vec<u8>>) {
        let mut state = self.state.lock().unwrap();
        state.reads.entry(uuid).or_default().push_back(result);
    }

    /// Queue the result of the next write. Empty queues succeed.
    pub fn push_write_result(&self, result: TransportResult<()>) {
        self.state.lock().unwrap().write_results.push_back(result);
    }

    /// Deliver a connection status change as the BLE stack would
    pub fn emit_status(&self, connected: bool) {
        let state = self.state.lock().unwrap();
        if let Some(sender) = state.status_sender.as_ref() {
            let _ = sender.send(LinkEvent::ConnectionStatusChanged { connected });
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Frames written to the command characteristic
    pub fn command_writes(&self) -> Vec<Vec<u8>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Write(uuid, data) if uuid == protocol::WRITE_CHAR => Some(data),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl GattTransport for MockTransport {
    type DeviceRef = u64;
    type Device = MockDevice;
    type Service = MockService;
    type Characteristic = MockCharacteristic;
    type Subscription = ();

    async fn scan(&self, selector: &DeviceSelector) -> TransportResult<Vec<u64>> {
        self.record(Call::Scan(selector.clone()));
        let state = self.state.lock().unwrap();
        Ok(state
            .devices
            .iter()
            .filter(|(name, address)| match selector {
                DeviceSelector::Name(wanted) => name == wanted,
                DeviceSelector::Address(wanted) => address == wanted,
            })
            .map(|(_, address)| *address)
            .collect())
    }

    async fn connect(&self, device: &u64) -> TransportResult<MockDevice> {
        self.record(Call::Connect(*device));
        Ok(MockDevice)
    }

    async fn list_services(&self, _device: &MockDevice) -> TransportResult<Vec<MockService>> {
        self.record(Call::ListServices);
        let state = self.state.lock().unwrap();
        Ok(state
            .services
            .iter()
            .map(|uuid| MockService { uuid: *uuid })
            .collect())
    }

    fn service_uuid(&self, service: &MockService) -> Uuid {
        service.uuid
    }

    async fn list_characteristics(
        &self,
        _service: &MockService,
        uuid: Uuid,
    ) -> TransportResult<Vec<MockCharacteristic>> {
        self.record(Call::ListCharacteristics(uuid));
        let state = self.state.lock().unwrap();
        Ok(state
            .characteristics
            .iter()
            .filter(|c| c.uuid == uuid)
            .cloned()
            .collect())
    }

    fn is_writable(&self, characteristic: &MockCharacteristic) -> bool {
        characteristic.writable
    }

    async fn write(&self, characteristic: &MockCharacteristic, data: &[u8]) -> TransportResult<()> {
        self.record(Call::Write(characteristic.uuid, data.to_vec()));
        let mut state = self.state.lock().unwrap();
        state.write_results.pop_front().unwrap_or(Ok(()))
    }

    async fn read(&self, characteristic: &MockCharacteristic) -> TransportResult<Vec<u8>> {
        self.record(Call::Read(characteristic.uuid));
        let mut state = self.state.lock().unwrap();
        state
            .reads
            .get_mut(&characteristic.uuid)
            .and_then(|queue| queue.pop_front())
            .unwrap_or(Ok(Vec::new()))
    }

    fn subscribe_status(
        &self,
        _device: &MockDevice,
        events: mpsc::UnboundedSender<LinkEvent>,
    ) -> TransportResult<()> {
        self.record(Call::Subscribe);
        let mut state = self.state.lock().unwrap();
        if let Some(failure) = state.subscribe_failure {
            return Err(failure);
        }
        state.status_sender = Some(events);
        Ok(())
    }

    fn unsubscribe_status(&self, _device: &MockDevice, _subscription: ()) {
        self.record(Call::Unsubscribe);
        self.state.lock().unwrap().status_sender = None;
    }

    fn release_characteristic(&self, characteristic: MockCharacteristic) {
        self.record(Call::ReleaseCharacteristic(characteristic.uuid));
    }

    fn release_service(&self, service: MockService) {
        self.record(Call::ReleaseService(service.uuid));
    }

    fn release_device(&self, _device: MockDevice) {
        self.record(Call::ReleaseDevice);
    }
}
