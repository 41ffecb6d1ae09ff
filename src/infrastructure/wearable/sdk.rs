//! SDK Boundary
//!
//! The two seams between the bridge and a wearable SDK: lifecycle
//! (listener registration, discovery) and the outbound action transport.

use crate::domain::error::TransportError;
use crate::domain::models::{ActionResponse, DeviceId, SdkEvent, SessionId};
use tokio::sync::mpsc;

/// Outbound half of action sessions.
pub trait ActionTransport: Send + Sync {
    fn session_opened(&self, _device: &DeviceId, _session: SessionId) {}

    fn session_closed(&self, _device: &DeviceId, _session: SessionId) {}

    /// One attempt, no retry. Must not block.
    fn send_response(
        &self,
        device: &DeviceId,
        session: SessionId,
        response: &ActionResponse,
    ) -> Result<(), TransportError>;
}

pub trait WearableSdk: Send + Sync {
    fn set_access_group(&self, group: &str);

    /// Register `listener` for all SDK events and start discovery.
    fn start(&self, listener: mpsc::UnboundedSender<SdkEvent>) -> Result<(), TransportError>;

    fn stop(&self);
}
