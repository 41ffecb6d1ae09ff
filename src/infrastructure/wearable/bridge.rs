//! Device Bridge
//!
//! Composition root for the wearable side. Turns SDK events into registry
//! and session operations in the right order and owns SDK startup and
//! shutdown. Holds no business logic of its own.
//!
//! Lifecycle events are applied one at a time even when the SDK delivers
//! them from several threads, so a forget and a connect never interleave.

use crate::domain::error::{ActionError, TransportError};
use crate::domain::models::{
    BridgeEvent, DeviceId, MessageSeverity, SdkEvent, SessionState, StatusMessage,
};
use crate::infrastructure::wearable::registry::DeviceRegistry;
use crate::infrastructure::wearable::sdk::WearableSdk;
use crate::infrastructure::wearable::session::{ActionContext, ActionSessionManager};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

pub struct DeviceBridge {
    registry: DeviceRegistry,
    sessions: ActionSessionManager,
    observer: Option<mpsc::UnboundedSender<BridgeEvent>>,
    lifecycle: Mutex<()>,
}

impl DeviceBridge {
    pub fn new(context: ActionContext) -> Self {
        Self {
            registry: DeviceRegistry::new(),
            sessions: ActionSessionManager::new(context),
            observer: None,
            lifecycle: Mutex::new(()),
        }
    }

    /// Forward status and device changes to a single UI-side consumer.
    pub fn with_observer(mut self, observer: mpsc::UnboundedSender<BridgeEvent>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn sessions(&self) -> &ActionSessionManager {
        &self.sessions
    }

    /// Register as the SDK's listener and start discovery. The returned
    /// receiver feeds [`DeviceBridge::run`].
    pub fn start(
        &self,
        sdk: &dyn WearableSdk,
        access_group: &str,
    ) -> Result<mpsc::UnboundedReceiver<SdkEvent>, TransportError> {
        sdk.set_access_group(access_group);
        let (tx, rx) = mpsc::unbounded_channel();
        sdk.start(tx)?;
        info!("Wearable bridge started, discovery running");
        self.send_log("Looking for wearables...", MessageSeverity::Info);
        Ok(rx)
    }

    /// Apply events in delivery order until the SDK side goes away.
    pub async fn run(&self, mut events: mpsc::UnboundedReceiver<SdkEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_event(event);
        }
        info!("SDK event stream ended");
    }

    pub fn shutdown(&self, sdk: &dyn WearableSdk) {
        let closed = {
            let _lifecycle = self.lifecycle.lock();
            self.sessions.close_all()
        };
        sdk.stop();
        info!(sessions_closed = closed, "Wearable bridge stopped");
    }

    pub fn handle_event(&self, event: SdkEvent) {
        match event {
            SdkEvent::DeviceDiscovered(device) => {
                let _lifecycle = self.lifecycle.lock();
                let id = device.id.clone();
                if self.registry.on_discovered(device) {
                    self.notify_state(&id);
                }
            }
            SdkEvent::DeviceForgotten(id) => {
                let _lifecycle = self.lifecycle.lock();
                // Session goes first so nobody sees a session without its device
                self.sessions.close(&id);
                if self.registry.on_forgotten(&id).is_some() {
                    self.notify_state(&id);
                }
            }
            SdkEvent::DeviceConnected(id) => {
                let _lifecycle = self.lifecycle.lock();
                if !self.registry.on_connected(&id) {
                    return;
                }
                if self.sessions.has_session(&id) {
                    debug!(device = %id, "Already connected with a live session");
                    return;
                }
                self.sessions.open(&id);
                self.notify_state(&id);
                self.send_log(&format!("Wearable {} connected", id), MessageSeverity::Success);
            }
            SdkEvent::DeviceDisconnected { device, cause } => {
                let _lifecycle = self.lifecycle.lock();
                self.sessions.close(&device);
                if self.registry.on_disconnected(&device, &cause) {
                    self.notify_state(&device);
                }
            }
            SdkEvent::ConnectFailed { device, cause } => {
                self.registry.on_connect_failed(&device, &cause);
                self.send_log(
                    &format!("Connection to {} failed: {}", device, cause),
                    MessageSeverity::Warning,
                );
            }
            SdkEvent::ManagerStateChanged(state) => {
                info!(state = %state, "Device manager state updated");
            }
            SdkEvent::ManagerError(message) => {
                error!("Device manager error: {}", message);
                self.send_log(&message, MessageSeverity::Error);
            }
            SdkEvent::RegistrationDeleteRequested => {
                info!("Device manager requested registration deletion");
            }
            SdkEvent::ActionReceived {
                device,
                session,
                request,
            } => {
                if let Err(e) = self.sessions.handle_incoming(&device, session, request) {
                    match e {
                        ActionError::MalformedPayload { .. } => warn!("Dropping action: {}", e),
                        _ => info!("Dropping action: {}", e),
                    }
                }
            }
            SdkEvent::SessionStateChanged {
                device,
                session,
                state,
                reason,
            } => {
                info!(device = %device, session = %session, ?state, reason = %reason, "Action session state changed");
                if state == SessionState::Terminated {
                    let _lifecycle = self.lifecycle.lock();
                    self.sessions.session_terminated(&device, session);
                }
            }
            SdkEvent::SessionError {
                device,
                session,
                message,
            } => {
                error!(device = %device, session = %session, "Action session error: {}", message);
            }
        }
    }

    fn notify_state(&self, device: &DeviceId) {
        let state = self.registry.state(device);
        debug!(device = %device, ?state, "Device state published");
        self.emit(BridgeEvent::DeviceStateChanged {
            device: device.clone(),
            state,
        });
    }

    fn send_log(&self, message: &str, severity: MessageSeverity) {
        self.emit(BridgeEvent::LogMessage(StatusMessage {
            message: message.to_string(),
            severity,
        }));
    }

    fn emit(&self, event: BridgeEvent) {
        if let Some(observer) = &self.observer {
            let _ = observer.send(event);
        }
    }
}
