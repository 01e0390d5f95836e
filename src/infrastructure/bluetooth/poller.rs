//! Legacy single-pin reader
//!
//! Older firmware answers for one pin per request: the client writes `[pin]`
//! to the read characteristic, then polls it until `[pin, state]` shows up.

use crate::domain::models::DigitalInput;
use crate::error::{Error, Result};
use crate::infrastructure::bluetooth::codec::decode_single_pin;
use crate::infrastructure::bluetooth::transport::GattTransport;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Retry budget for the polling loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    pub max_retries: u32,
    /// Wait between reads
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_retries: 30,
            interval: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SinglePinPoller {
    config: PollConfig,
}

impl SinglePinPoller {
    pub fn new(config: PollConfig) -> Self {
        Self { config }
    }

    /// Request `pin` and poll until a complete response arrives.
    ///
    /// Only short responses are retried. A failed selector write or a failed
    /// read is returned immediately.
    pub async fn read_pin<T: GattTransport>(
        &self,
        transport: &T,
        characteristic: &T::Characteristic,
        pin: u8,
    ) -> Result<DigitalInput> {
        debug!("Writing pin selector {}", pin);
        if let Err(failure) = transport.write(characteristic, &[pin]).await {
            warn!("GPIO{} selector write failed: {}", pin, failure);
            return Err(Error::WriteFailed(failure));
        }

        for attempt in 0..self.config.max_retries {
            if attempt > 0 {
                tokio::time::sleep(self.config.interval).await;
            }

            let response = transport.read(characteristic).await?;
            if let Some(input) = decode_single_pin(&response) {
                if input.pin != pin {
                    debug!("Response names GPIO{} (requested GPIO{})", input.pin, pin);
                }
                info!(
                    "GPIO{}: {}",
                    pin,
                    if input.state { "HIGH" } else { "LOW" }
                );
                return Ok(input);
            }

            if !response.is_empty() {
                debug!(
                    "Attempt {}: incomplete response ({} bytes), retrying",
                    attempt + 1,
                    response.len()
                );
            }
        }

        warn!(
            "Timed out waiting for GPIO{} after {} attempts",
            pin, self.config.max_retries
        );
        Err(Error::ReadTimeout {
            attempts: self.config.max_retries,
        })
    }
}
