use bleio_client::domain::settings::SettingsService;
use bleio_client::infrastructure::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings_service = SettingsService::new()?;

    let _logging_guard = logging::init_logger(&settings_service.get().log_settings)
        .map_err(|e| eprintln!("Failed to initialize logging: {}", e))
        .ok();

    tracing::info!("Starting BLEIO client");

    run(&settings_service).await
}

#[cfg(windows)]
async fn run(settings_service: &SettingsService) -> anyhow::Result<()> {
    use bleio_client::{
        BlinkMode, ConnectionConfig, ConnectionManager, LatchMode, PinMode, WinRtTransport,
    };
    use std::sync::Arc;
    use tracing::info;

    let settings = settings_service.get();
    let config = ConnectionConfig::from_settings(settings)?;
    let manager = ConnectionManager::new(Arc::new(WinRtTransport::new()), config);

    let session = match settings.device_address.as_deref() {
        Some(address) => manager.connect_by_address(address).await?,
        None => manager.connect_by_name(&settings.device_name).await?,
    };
    info!("Capabilities: {:?}", session.capabilities());

    session.start_blink(2, BlinkMode::Blink500ms).await?;
    session
        .set_pin_mode(34, PinMode::InputPullup, LatchMode::None)
        .await?;
    match session.digital_read(34).await? {
        Some(state) => info!("GPIO34 is {}", if state { "HIGH" } else { "LOW" }),
        None => info!("GPIO34 is not reported as an input"),
    }

    if session.capabilities().adc {
        for reading in session.read_all_adc().await? {
            info!("GPIO{}: {:.3} V", reading.pin, reading.voltage);
        }
    }

    tokio::time::sleep(std::time::Duration::from_secs(3)).await;
    session.digital_write(2, false).await?;
    session.disconnect().await;
    Ok(())
}

#[cfg(not(windows))]
async fn run(_settings_service: &SettingsService) -> anyhow::Result<()> {
    anyhow::bail!("No BLE transport is available on this platform")
}
