//! Command Session
//!
//! GPIO operations on a ready [`DeviceSession`]. Each call checks the link
//! status, validates its arguments, then issues exactly one transport write
//! or read while holding the session lock, so requests never overlap.

use crate::domain::models::{
    AdcAttenuation, AdcReading, BlinkMode, DigitalInput, DisconnectBehavior, GpioCommand,
    LatchMode, PinMode, PwmFrequency, ReadProtocol, SerialLedPattern,
};
use crate::error::{Error, Result};
use crate::infrastructure::bluetooth::codec::{
    adc_to_voltage, decode_adc_reads, decode_digital_reads, encode_commands,
};
use crate::infrastructure::bluetooth::connection::{DeviceSession, Link};
use crate::infrastructure::bluetooth::protocol::{is_adc_pin, opcode};
use crate::infrastructure::bluetooth::transport::GattTransport;
use tokio::sync::MutexGuard;
use tracing::{debug, info, warn};

impl<T: GattTransport> DeviceSession<T> {
    async fn ready_link(&self) -> Result<MutexGuard<'_, Link<T>>> {
        let mut link = self.link.lock().await;
        link.ensure_ready()?;
        Ok(link)
    }

    fn require(&self, available: bool, feature: &'static str) -> Result<()> {
        if available {
            Ok(())
        } else {
            Err(Error::FeatureUnavailable { feature })
        }
    }

    async fn write_commands(&self, link: &Link<T>, commands: &[GpioCommand]) -> Result<()> {
        let frame = encode_commands(commands)?;
        let characteristic = link.write_char.as_ref().ok_or(Error::NotConnected)?;

        if let Err(failure) = self.transport.write(characteristic, &frame).await {
            warn!("Command write failed: {}", failure);
            return Err(failure.into());
        }

        info!("Sent {} command(s)", commands.len());
        for cmd in commands {
            debug!(
                "    {}, {}, {}, {}",
                cmd.pin, cmd.opcode, cmd.param1, cmd.param2
            );
        }
        Ok(())
    }

    async fn read_value(&self, characteristic: &T::Characteristic) -> Result<Vec<u8>> {
        self.transport.read(characteristic).await.map_err(|failure| {
            warn!("Read failed: {}", failure);
            Error::from(failure)
        })
    }

    /// Send up to 24 commands in one frame
    pub async fn send_commands(&self, commands: &[GpioCommand]) -> Result<()> {
        let link = self.ready_link().await?;
        self.write_commands(&link, commands).await
    }

    pub async fn set_pin_mode(&self, pin: u8, mode: PinMode, latch: LatchMode) -> Result<()> {
        let link = self.ready_link().await?;
        self.write_commands(&link, &[GpioCommand::new(pin, mode as u8, latch as u8, 0)])
            .await
    }

    pub async fn digital_write(&self, pin: u8, value: bool) -> Result<()> {
        let link = self.ready_link().await?;
        let op = if value {
            opcode::DIGITAL_HIGH
        } else {
            opcode::DIGITAL_LOW
        };
        self.write_commands(&link, &[GpioCommand::new(pin, op, 0, 0)])
            .await
    }

    pub async fn start_blink(&self, pin: u8, mode: BlinkMode) -> Result<()> {
        let link = self.ready_link().await?;
        self.write_commands(&link, &[GpioCommand::new(pin, mode as u8, 0, 0)])
            .await
    }

    /// Drive `pin` with PWM. `duty_cycle` is 0.0 - 1.0.
    pub async fn set_pwm(&self, pin: u8, duty_cycle: f64, frequency: PwmFrequency) -> Result<()> {
        let link = self.ready_link().await?;
        if !(0.0..=1.0).contains(&duty_cycle) {
            return Err(Error::OutOfRange {
                name: "duty cycle",
                value: duty_cycle,
            });
        }

        let duty = (duty_cycle * 255.0).round() as u8;
        self.write_commands(
            &link,
            &[GpioCommand::new(pin, opcode::SET_PWM, duty, frequency as u8)],
        )
        .await
    }

    /// Configure `pin` as an ADC input. Only ADC1 pins are accepted.
    pub async fn enable_adc(&self, pin: u8, attenuation: AdcAttenuation) -> Result<()> {
        let mut link = self.ready_link().await?;
        if !is_adc_pin(pin) {
            return Err(Error::InvalidPin {
                pin,
                function: "ADC",
            });
        }

        self.write_commands(
            &link,
            &[GpioCommand::new(
                pin,
                opcode::ENABLE_ADC,
                attenuation as u8,
                0,
            )],
        )
        .await?;
        link.adc_attenuation.insert(pin, attenuation);
        Ok(())
    }

    pub async fn disable_adc(&self, pin: u8) -> Result<()> {
        let mut link = self.ready_link().await?;
        self.write_commands(&link, &[GpioCommand::new(pin, opcode::DISABLE_ADC, 0, 0)])
            .await?;
        link.adc_attenuation.remove(&pin);
        Ok(())
    }

    /// Read the state of every pin configured as input
    pub async fn read_all_inputs(&self) -> Result<Vec<DigitalInput>> {
        let link = self.ready_link().await?;
        if self.capabilities.read_protocol == ReadProtocol::SinglePinPoll {
            return Err(Error::FeatureUnavailable {
                feature: "batch input read",
            });
        }
        self.read_inputs(&link).await
    }

    async fn read_inputs(&self, link: &Link<T>) -> Result<Vec<DigitalInput>> {
        let characteristic = link.read_char.as_ref().ok_or(Error::NotConnected)?;
        let response = self.read_value(characteristic).await?;
        let inputs = decode_digital_reads(&response)?;

        for input in &inputs {
            debug!(
                "    GPIO{}: {}",
                input.pin,
                if input.state { "HIGH" } else { "LOW" }
            );
        }
        info!("Read {} input pin(s)", inputs.len());
        Ok(inputs)
    }

    /// Read one input pin.
    ///
    /// `Ok(None)` means the peripheral did not report the pin, i.e. it is not
    /// configured as an input.
    pub async fn digital_read(&self, pin: u8) -> Result<Option<bool>> {
        let link = self.ready_link().await?;
        match self.capabilities.read_protocol {
            ReadProtocol::SinglePinPoll => {
                let characteristic = link.read_char.as_ref().ok_or(Error::NotConnected)?;
                let input = self
                    .poller
                    .read_pin(self.transport.as_ref(), characteristic, pin)
                    .await?;
                Ok(Some(input.state))
            }
            ReadProtocol::BatchReadAll | ReadProtocol::Auto => {
                let inputs = self.read_inputs(&link).await?;
                let state = inputs.iter().find(|i| i.pin == pin).map(|i| i.state);
                if state.is_none() {
                    info!("GPIO{} is not configured as an input", pin);
                }
                Ok(state)
            }
        }
    }

    /// Read every ADC-enabled pin, converted with the attenuation each pin was enabled with
    pub async fn read_all_adc(&self) -> Result<Vec<AdcReading>> {
        let link = self.ready_link().await?;
        self.require(self.capabilities.adc, "ADC")?;
        let characteristic = link
            .adc_char
            .as_ref()
            .ok_or(Error::FeatureUnavailable { feature: "ADC" })?;

        let response = self.read_value(characteristic).await?;
        let readings: Vec<AdcReading> = decode_adc_reads(&response)?
            .into_iter()
            .map(|(pin, raw)| {
                let attenuation = link
                    .adc_attenuation
                    .get(&pin)
                    .copied()
                    .unwrap_or_default();
                AdcReading {
                    pin,
                    raw,
                    voltage: adc_to_voltage(raw, attenuation),
                    attenuation,
                }
            })
            .collect();

        for reading in &readings {
            debug!(
                "    GPIO{}: raw={}, {:.3} V",
                reading.pin, reading.raw, reading.voltage
            );
        }
        info!("Read {} ADC value(s)", readings.len());
        Ok(readings)
    }

    /// `Ok(None)` means the pin is not in ADC mode
    pub async fn read_adc(&self, pin: u8) -> Result<Option<AdcReading>> {
        let reading = self
            .read_all_adc()
            .await?
            .into_iter()
            .find(|r| r.pin == pin);
        if reading.is_none() {
            info!("GPIO{} is not configured for ADC", pin);
        }
        Ok(reading)
    }

    /// Choose what the firmware does with `pin` when the link drops
    pub async fn set_disconnect_behavior(
        &self,
        pin: u8,
        behavior: DisconnectBehavior,
    ) -> Result<()> {
        let link = self.ready_link().await?;
        self.write_commands(
            &link,
            &[GpioCommand::new(
                pin,
                opcode::SET_DISCONNECT_BEHAVIOR,
                behavior as u8,
                0,
            )],
        )
        .await
    }

    /// Drive an addressable LED chain of `count` LEDs from `pin`, all off
    pub async fn enable_serial_led(&self, pin: u8, count: u8, brightness: u8) -> Result<()> {
        let link = self.ready_link().await?;
        self.require(self.capabilities.serial_led, "serial LED")?;
        if count == 0 {
            return Err(Error::OutOfRange {
                name: "LED count",
                value: 0.0,
            });
        }
        self.write_commands(
            &link,
            &[GpioCommand::new(
                pin,
                opcode::ENABLE_SERIAL_LED,
                count,
                brightness,
            )],
        )
        .await
    }

    /// Set one LED of the chain. `led_index` starts at 1.
    pub async fn set_serial_led_color(
        &self,
        pin: u8,
        led_index: u8,
        red: u8,
        green: u8,
        blue: u8,
    ) -> Result<()> {
        let link = self.ready_link().await?;
        self.require(self.capabilities.serial_led, "serial LED")?;
        check_led_index(led_index)?;
        self.write_commands(
            &link,
            &[
                GpioCommand::new(pin, opcode::SERIAL_LED_COLOR, led_index, red),
                GpioCommand::new(pin, opcode::SERIAL_LED_COLOR_GB, green, blue),
            ],
        )
        .await
    }

    pub async fn set_serial_led_pattern(
        &self,
        pin: u8,
        led_index: u8,
        pattern: SerialLedPattern,
        param1: u8,
        param2: u8,
    ) -> Result<()> {
        let link = self.ready_link().await?;
        self.require(self.capabilities.serial_led, "serial LED")?;
        check_led_index(led_index)?;
        self.write_commands(
            &link,
            &[
                GpioCommand::new(pin, opcode::SERIAL_LED_PATTERN, led_index, pattern as u8),
                GpioCommand::new(pin, opcode::SERIAL_LED_PATTERN_PARAMS, param1, param2),
            ],
        )
        .await
    }
}

fn check_led_index(led_index: u8) -> Result<()> {
    if led_index == 0 {
        return Err(Error::OutOfRange {
            name: "LED index",
            value: 0.0,
        });
    }
    Ok(())
}
