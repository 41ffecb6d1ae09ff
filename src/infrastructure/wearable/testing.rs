//! Recording fakes shared by the wearable tests.

use crate::domain::course::CourseModel;
use crate::domain::distance::DistanceReport;
use crate::domain::equipment::EquipmentSet;
use crate::domain::error::{EquipmentError, TransportError};
use crate::domain::models::{ActionRequest, ActionResponse, DeviceId, SessionId};
use crate::infrastructure::position::PositionFeed;
use crate::infrastructure::reporter::RemoteReporter;
use crate::infrastructure::stores::{CourseStore, EquipmentStore};
use crate::infrastructure::wearable::sdk::ActionTransport;
use crate::infrastructure::wearable::session::{ActionContext, ActionSessionManager};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

pub type SentResponse = (DeviceId, SessionId, ActionResponse);

#[derive(Default)]
pub struct RecordingTransport {
    opened: Mutex<Vec<(DeviceId, SessionId)>>,
    closed: Mutex<Vec<(DeviceId, SessionId)>>,
    responses: Mutex<Vec<SentResponse>>,
}

impl RecordingTransport {
    pub fn opened(&self) -> Vec<(DeviceId, SessionId)> {
        self.opened.lock().clone()
    }

    pub fn closed(&self) -> Vec<(DeviceId, SessionId)> {
        self.closed.lock().clone()
    }

    pub fn responses(&self) -> Vec<SentResponse> {
        self.responses.lock().clone()
    }
}

impl ActionTransport for RecordingTransport {
    fn session_opened(&self, device: &DeviceId, session: SessionId) {
        self.opened.lock().push((device.clone(), session));
    }

    fn session_closed(&self, device: &DeviceId, session: SessionId) {
        self.closed.lock().push((device.clone(), session));
    }

    fn send_response(
        &self,
        device: &DeviceId,
        session: SessionId,
        response: &ActionResponse,
    ) -> Result<(), TransportError> {
        self.responses
            .lock()
            .push((device.clone(), session, response.clone()));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<DistanceReport>>,
}

impl RecordingReporter {
    pub fn reports(&self) -> Vec<DistanceReport> {
        self.reports.lock().clone()
    }
}

impl RemoteReporter for RecordingReporter {
    fn submit(&self, report: DistanceReport) {
        self.reports.lock().push(report);
    }
}

#[derive(Default)]
pub struct MemoryEquipmentStore {
    equipment: Mutex<EquipmentSet>,
}

impl EquipmentStore for MemoryEquipmentStore {
    fn load(&self) -> Result<EquipmentSet, EquipmentError> {
        Ok(self.equipment.lock().clone())
    }

    fn save(&self, equipment: &EquipmentSet) -> Result<(), EquipmentError> {
        *self.equipment.lock() = equipment.clone();
        Ok(())
    }
}

pub fn request(request_id: &str, client_data: &str) -> ActionRequest {
    ActionRequest {
        request_id: request_id.to_string(),
        action: "get_distances".to_string(),
        client_data: client_data.to_string(),
    }
}

pub struct Harness {
    pub position: PositionFeed,
    pub course: Arc<CourseStore>,
    pub equipment: Arc<MemoryEquipmentStore>,
    pub reporter: Arc<RecordingReporter>,
    pub transport: Arc<RecordingTransport>,
    pub sessions: Arc<ActionSessionManager>,
}

impl Harness {
    pub fn new() -> Self {
        let position = PositionFeed::new();
        let course = Arc::new(CourseStore::new(CourseModel::built_in()));
        let equipment = Arc::new(MemoryEquipmentStore::default());
        let reporter = Arc::new(RecordingReporter::default());
        let transport = Arc::new(RecordingTransport::default());
        let sessions = Arc::new(ActionSessionManager::new(ActionContext::new(
            position.clone(),
            course.clone(),
            equipment.clone(),
            reporter.clone(),
            transport.clone(),
        )));
        Self {
            position,
            course,
            equipment,
            reporter,
            transport,
            sessions,
        }
    }

    /// Fresh context over the same fakes, for building a bridge.
    pub fn context(&self) -> ActionContext {
        ActionContext::new(
            self.position.clone(),
            self.course.clone(),
            self.equipment.clone(),
            self.reporter.clone(),
            self.transport.clone(),
        )
    }

    /// Let session workers drain their queues.
    pub async fn settle(&self) {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    pub async fn wait_for_responses(&self, count: usize) {
        for _ in 0..200 {
            if self.transport.responses().len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}
