use serde::{Deserialize, Serialize};
use std::fmt;

/// A position on the Earth's surface in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

/// Reference points measured on every green.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GreenPoint {
    #[serde(rename = "frontGreen")]
    Front,
    #[serde(rename = "centerGreen")]
    Center,
    #[serde(rename = "backGreen")]
    Back,
}

impl GreenPoint {
    /// Stable per-hole iteration order
    pub const ALL: [GreenPoint; 3] = [GreenPoint::Front, GreenPoint::Center, GreenPoint::Back];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Front => "frontGreen",
            Self::Center => "centerGreen",
            Self::Back => "backGreen",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LandmarkId {
    pub hole: u32,
    pub point: GreenPoint,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    pub id: LandmarkId,
    pub position: GeoPoint,
}

/// Vendor-assigned wearable identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    #[serde(default = "default_device_name")]
    pub name: String,
}

fn default_device_name() -> String {
    "Unknown".to_string()
}

impl Device {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: DeviceId::new(id),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    Discovered,
    Connected,
}

/// Identifies one action session; never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub request_id: String,
    pub action: String,
    /// Raw client payload, expected to hold a JSON object
    #[serde(default)]
    pub client_data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub request_id: String,
    pub payload: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Active,
    Interrupted,
    Terminated,
}

/// Everything the wearable SDK can tell the bridge, as typed messages.
#[derive(Debug, Clone, PartialEq)]
pub enum SdkEvent {
    // Discovery listener
    DeviceDiscovered(Device),
    DeviceForgotten(DeviceId),

    // Connection listener
    DeviceConnected(DeviceId),
    DeviceDisconnected { device: DeviceId, cause: String },
    ConnectFailed { device: DeviceId, cause: String },

    // Manager-level signals
    ManagerStateChanged(String),
    ManagerError(String),
    RegistrationDeleteRequested,

    // Per-session action delivery
    ActionReceived {
        device: DeviceId,
        session: SessionId,
        request: ActionRequest,
    },
    SessionStateChanged {
        device: DeviceId,
        session: SessionId,
        state: SessionState,
        reason: String,
    },
    SessionError {
        device: DeviceId,
        session: SessionId,
        message: String,
    },
}

/// Notifications for the single UI-facing observer.
#[derive(Debug, Clone)]
pub enum BridgeEvent {
    DeviceStateChanged {
        device: DeviceId,
        state: Option<DeviceState>,
    },
    LogMessage(StatusMessage),
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub message: String,
    pub severity: MessageSeverity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSeverity {
    Info,
    Success,
    Warning,
    Error,
}
