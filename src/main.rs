use anyhow::Context;
use golf_distance_bridge::domain::course::CourseModel;
use golf_distance_bridge::domain::models::{BridgeEvent, MessageSeverity};
use golf_distance_bridge::domain::settings::SettingsService;
use golf_distance_bridge::infrastructure::logging::init_logger;
use golf_distance_bridge::infrastructure::position::PositionFeed;
use golf_distance_bridge::infrastructure::reporter::{
    load_golf_info, DisabledReporter, HttpReporter, RemoteReporter,
};
use golf_distance_bridge::infrastructure::stores::{CourseStore, JsonEquipmentStore};
use golf_distance_bridge::infrastructure::wearable::line_sdk::LineSdk;
use golf_distance_bridge::infrastructure::wearable::session::ActionContext;
use golf_distance_bridge::infrastructure::wearable::DeviceBridge;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings_service = SettingsService::new()?;
    let _logging_guard = init_logger(&settings_service.get().log_settings)
        .context("Failed to initialize logging")?;
    if let Err(e) = settings_service.save() {
        warn!("Could not write settings file: {}", e);
    }
    let settings = settings_service.get().clone();

    info!("Starting Golf Distance Bridge");

    let course = match &settings.course_file {
        Some(path) => CourseModel::load(path)
            .with_context(|| format!("Failed to load course from {}", path.display()))?,
        None => CourseModel::built_in(),
    };
    info!(holes = course.hole_count(), "Course loaded");

    let reporter: Arc<dyn RemoteReporter> = if settings.reporter.enabled {
        let golf_info = load_golf_info(settings.golf_info_file.as_deref());
        Arc::new(HttpReporter::new(&settings.reporter, golf_info)?)
    } else {
        info!("Remote reporting disabled");
        Arc::new(DisabledReporter)
    };

    let positions = PositionFeed::new();
    let sdk = Arc::new(LineSdk::new(
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        positions.clone(),
    ));

    let context = ActionContext::new(
        positions,
        Arc::new(CourseStore::new(course)),
        Arc::new(JsonEquipmentStore::new(settings_service.club_distances_path())),
        reporter,
        sdk.clone(),
    );

    let (observer_tx, mut observer_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(event) = observer_rx.recv().await {
            match event {
                BridgeEvent::LogMessage(status) => match status.severity {
                    MessageSeverity::Error => error!("{}", status.message),
                    MessageSeverity::Warning => warn!("{}", status.message),
                    MessageSeverity::Info | MessageSeverity::Success => {
                        info!("{}", status.message)
                    }
                },
                BridgeEvent::DeviceStateChanged { device, state } => {
                    info!(device = %device, ?state, "Wearable state changed")
                }
            }
        }
    });

    let bridge = DeviceBridge::new(context).with_observer(observer_tx);
    let events = bridge.start(sdk.as_ref(), &settings.keychain_access_group)?;

    tokio::select! {
        _ = bridge.run(events) => info!("SDK host went away"),
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => info!("Interrupted, shutting down"),
            Err(e) => error!("Failed to listen for ctrl-c: {}", e),
        },
    }

    bridge.shutdown(sdk.as_ref());
    sdk.flushed().await;
    info!("Golf Distance Bridge stopped");
    Ok(())
}
