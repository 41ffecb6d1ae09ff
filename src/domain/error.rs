// Domain error types. Expected races (duplicate discovery, late responses)
// never surface through these; they are logged where they happen.

use crate::domain::models::{DeviceId, SessionId};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DistanceError {
    #[error("No position fix is available")]
    PositionUnavailable,

    #[error("Position is not a finite coordinate: ({latitude}, {longitude})")]
    InvalidPosition { latitude: f64, longitude: f64 },
}

#[derive(Debug, Error)]
pub enum CourseError {
    #[error("Course has no holes")]
    Empty,

    #[error("Hole {0} appears more than once")]
    DuplicateHole(u32),

    #[error("Hole {0} is not part of the course")]
    UnknownHole(u32),

    #[error("Hole {hole} has a non-finite coordinate")]
    InvalidCoordinate { hole: u32 },

    #[error("Failed to read course data: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode course data: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum EquipmentError {
    #[error("Failed to access club distances: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode club distances: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Malformed action payload for request {request_id}: {reason}")]
    MalformedPayload { request_id: String, reason: String },

    #[error("No session is open for device {0}")]
    NoSession(DeviceId),

    #[error("{session} is no longer the live session for device {device}")]
    StaleSession { device: DeviceId, session: SessionId },

    #[error("Session worker for device {0} has stopped")]
    WorkerGone(DeviceId),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Transport is closed")]
    Closed,

    #[error("Transport was already started")]
    AlreadyStarted,

    #[error("Failed to encode outbound message: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote store rejected report with status {0}")]
    Rejected(u16),
}
