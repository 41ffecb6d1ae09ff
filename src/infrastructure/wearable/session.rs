//! Action Session Manager
//!
//! One session per connected device. Each session has its own worker task so
//! requests on a session are answered strictly in arrival order while
//! different devices proceed independently.
//!
//! Response delivery holds the session table's read lock, so a session is
//! either still live when its response goes out or already gone and the
//! response is dropped. A close can never interleave with a send.

use crate::domain::distance::DistanceEngine;
use crate::domain::equipment::EquipmentSet;
use crate::domain::error::ActionError;
use crate::domain::models::{ActionRequest, DeviceId, SessionId};
use crate::infrastructure::position::PositionFeed;
use crate::infrastructure::reporter::RemoteReporter;
use crate::infrastructure::stores::{CourseStore, EquipmentStore};
use crate::infrastructure::wearable::protocol;
use crate::infrastructure::wearable::sdk::ActionTransport;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Collaborators every request needs.
pub struct ActionContext {
    engine: DistanceEngine,
    position: PositionFeed,
    course: Arc<CourseStore>,
    equipment: Arc<dyn EquipmentStore>,
    reporter: Arc<dyn RemoteReporter>,
    transport: Arc<dyn ActionTransport>,
}

impl ActionContext {
    pub fn new(
        position: PositionFeed,
        course: Arc<CourseStore>,
        equipment: Arc<dyn EquipmentStore>,
        reporter: Arc<dyn RemoteReporter>,
        transport: Arc<dyn ActionTransport>,
    ) -> Self {
        Self {
            engine: DistanceEngine::new(),
            position,
            course,
            equipment,
            reporter,
            transport,
        }
    }

    /// Club distances live on disk; read them off the async workers.
    async fn load_equipment(&self) -> EquipmentSet {
        let store = self.equipment.clone();
        match tokio::task::spawn_blocking(move || store.load()).await {
            Ok(Ok(equipment)) => equipment,
            Ok(Err(e)) => {
                warn!("Using empty club list: {}", e);
                EquipmentSet::default()
            }
            Err(e) => {
                error!("Club distance load task failed: {}", e);
                EquipmentSet::default()
            }
        }
    }

    /// Compute and push a report from whatever data is current right now.
    /// Problems here are logged and never stop the response.
    fn report_distances(&self, equipment: &EquipmentSet) {
        let course = self.course.snapshot();

        match self.engine.compute(self.position.latest(), &course, equipment) {
            Ok(report) => {
                debug!(landmarks = report.distances().len(), "Distances computed");
                self.reporter.submit(report);
            }
            Err(e) => warn!("Skipping distance report: {}", e),
        }
    }
}

struct QueuedAction {
    request: ActionRequest,
    payload: Value,
}

struct ActionSession {
    id: SessionId,
    queue: mpsc::UnboundedSender<QueuedAction>,
}

type SessionTable = RwLock<HashMap<DeviceId, ActionSession>>;

pub struct ActionSessionManager {
    sessions: Arc<SessionTable>,
    context: Arc<ActionContext>,
    next_id: AtomicU64,
}

impl ActionSessionManager {
    pub fn new(context: ActionContext) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            context: Arc::new(context),
            next_id: AtomicU64::new(1),
        }
    }

    /// Open a session for `device`, or return the one already open.
    /// Must be called from within a tokio runtime.
    pub fn open(&self, device: &DeviceId) -> SessionId {
        let mut sessions = self.sessions.write();
        if let Some(existing) = sessions.get(device) {
            debug!(device = %device, session = %existing.id, "Session already open");
            return existing.id;
        }

        let id = SessionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (queue, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(
            device.clone(),
            id,
            rx,
            self.sessions.clone(),
            self.context.clone(),
        ));
        sessions.insert(device.clone(), ActionSession { id, queue });
        drop(sessions);

        info!(device = %device, session = %id, "Action session opened");
        self.context.transport.session_opened(device, id);
        id
    }

    /// Drop the session for `device`. Requests already queued on it are
    /// drained by its worker without being answered.
    pub fn close(&self, device: &DeviceId) -> Option<SessionId> {
        let removed = self.sessions.write().remove(device)?;
        info!(device = %device, session = %removed.id, "Action session closed");
        self.context.transport.session_closed(device, removed.id);
        Some(removed.id)
    }

    /// The SDK ended a session on its own. Only the live session counts;
    /// a termination for an older one is stale.
    pub fn session_terminated(&self, device: &DeviceId, session: SessionId) -> bool {
        if self.session_id(device) != Some(session) {
            debug!(device = %device, session = %session, "Termination for stale session ignored");
            return false;
        }
        self.close(device).is_some()
    }

    /// Parse and enqueue an inbound action. Only parsing happens on the
    /// caller's context; computing and answering happen on the session worker.
    pub fn handle_incoming(
        &self,
        device: &DeviceId,
        session: SessionId,
        request: ActionRequest,
    ) -> Result<(), ActionError> {
        info!(
            device = %device,
            session = %session,
            request_id = %request.request_id,
            action = %request.action,
            "Action received"
        );
        let payload = protocol::parse_payload(&request)?;

        let sessions = self.sessions.read();
        let live = sessions
            .get(device)
            .ok_or_else(|| ActionError::NoSession(device.clone()))?;
        if live.id != session {
            return Err(ActionError::StaleSession {
                device: device.clone(),
                session,
            });
        }
        live.queue
            .send(QueuedAction { request, payload })
            .map_err(|_| ActionError::WorkerGone(device.clone()))
    }

    pub fn session_id(&self, device: &DeviceId) -> Option<SessionId> {
        self.sessions.read().get(device).map(|s| s.id)
    }

    pub fn has_session(&self, device: &DeviceId) -> bool {
        self.sessions.read().contains_key(device)
    }

    pub fn devices(&self) -> Vec<DeviceId> {
        let mut ids: Vec<DeviceId> = self.sessions.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    pub fn close_all(&self) -> usize {
        let devices = self.devices();
        devices.iter().filter(|d| self.close(d).is_some()).count()
    }
}

async fn run_worker(
    device: DeviceId,
    session: SessionId,
    mut rx: mpsc::UnboundedReceiver<QueuedAction>,
    sessions: Arc<SessionTable>,
    context: Arc<ActionContext>,
) {
    debug!(device = %device, session = %session, "Session worker started");
    while let Some(action) = rx.recv().await {
        process(&device, session, action, &sessions, &context).await;
    }
    debug!(device = %device, session = %session, "Session worker finished");
}

async fn process(
    device: &DeviceId,
    session: SessionId,
    action: QueuedAction,
    sessions: &SessionTable,
    context: &ActionContext,
) {
    let request_id = action.request.request_id;
    debug!(
        request_id = %request_id,
        payload = %action.payload,
        "Processing action"
    );

    let equipment = context.load_equipment().await;
    context.report_distances(&equipment);

    let response = protocol::success_response(&request_id);
    let sessions = sessions.read();
    if sessions.get(device).map(|s| s.id) != Some(session) {
        info!(
            device = %device,
            session = %session,
            request_id = %request_id,
            "Session closed before response, dropping it"
        );
        return;
    }
    match context.transport.send_response(device, session, &response) {
        Ok(()) => debug!(request_id = %request_id, "Response sent"),
        Err(e) => error!(request_id = %request_id, "Failed to send response: {}", e),
    }
}
