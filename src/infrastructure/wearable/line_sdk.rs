//! Line-protocol SDK adapter
//!
//! Speaks newline-delimited JSON with an external wearable host process.
//! Every inbound line is one SDK callback (or a position fix); every
//! outbound line is a session notice or an action response.
//!
//! Inbound:  `{"event":"connected","id":"glasses-1"}`
//! Outbound: `{"event":"response","id":"glasses-1","session":3,"request_id":"r1","payload":"..."}`

use crate::domain::error::TransportError;
use crate::domain::models::{
    ActionRequest, ActionResponse, Device, DeviceId, GeoPoint, SdkEvent, SessionId, SessionState,
};
use crate::infrastructure::position::PositionFeed;
use crate::infrastructure::wearable::sdk::{ActionTransport, WearableSdk};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum InboundLine {
    Discovered {
        id: String,
        #[serde(default)]
        name: Option<String>,
    },
    Forgotten {
        id: String,
    },
    Connected {
        id: String,
    },
    Disconnected {
        id: String,
        #[serde(default)]
        cause: String,
    },
    ConnectFailed {
        id: String,
        #[serde(default)]
        cause: String,
    },
    ManagerState {
        state: String,
    },
    ManagerError {
        message: String,
    },
    DeleteRegistration,
    Action {
        id: String,
        session: SessionId,
        request_id: String,
        #[serde(default)]
        action: String,
        #[serde(default)]
        client_data: String,
    },
    SessionState {
        id: String,
        session: SessionId,
        state: SessionState,
        #[serde(default)]
        reason: String,
    },
    SessionError {
        id: String,
        session: SessionId,
        message: String,
    },
    Position {
        latitude: f64,
        longitude: f64,
    },
}

enum Routed {
    Event(SdkEvent),
    Position(GeoPoint),
}

impl InboundLine {
    fn route(self) -> Routed {
        let event = match self {
            InboundLine::Discovered { id, name } => SdkEvent::DeviceDiscovered(Device::new(
                id,
                name.unwrap_or_else(|| "Unknown".to_string()),
            )),
            InboundLine::Forgotten { id } => SdkEvent::DeviceForgotten(DeviceId::new(id)),
            InboundLine::Connected { id } => SdkEvent::DeviceConnected(DeviceId::new(id)),
            InboundLine::Disconnected { id, cause } => SdkEvent::DeviceDisconnected {
                device: DeviceId::new(id),
                cause,
            },
            InboundLine::ConnectFailed { id, cause } => SdkEvent::ConnectFailed {
                device: DeviceId::new(id),
                cause,
            },
            InboundLine::ManagerState { state } => SdkEvent::ManagerStateChanged(state),
            InboundLine::ManagerError { message } => SdkEvent::ManagerError(message),
            InboundLine::DeleteRegistration => SdkEvent::RegistrationDeleteRequested,
            InboundLine::Action {
                id,
                session,
                request_id,
                action,
                client_data,
            } => SdkEvent::ActionReceived {
                device: DeviceId::new(id),
                session,
                request: ActionRequest {
                    request_id,
                    action,
                    client_data,
                },
            },
            InboundLine::SessionState {
                id,
                session,
                state,
                reason,
            } => SdkEvent::SessionStateChanged {
                device: DeviceId::new(id),
                session,
                state,
                reason,
            },
            InboundLine::SessionError {
                id,
                session,
                message,
            } => SdkEvent::SessionError {
                device: DeviceId::new(id),
                session,
                message,
            },
            InboundLine::Position {
                latitude,
                longitude,
            } => return Routed::Position(GeoPoint::new(latitude, longitude)),
        };
        Routed::Event(event)
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum OutboundLine<'a> {
    SessionOpened {
        id: &'a DeviceId,
        session: SessionId,
    },
    SessionClosed {
        id: &'a DeviceId,
        session: SessionId,
    },
    Response {
        id: &'a DeviceId,
        session: SessionId,
        request_id: &'a str,
        payload: &'a str,
    },
}

struct Pending<R, W> {
    input: R,
    output: W,
    lines: mpsc::UnboundedReceiver<String>,
}

pub struct LineSdk<R, W> {
    pending: Mutex<Option<Pending<R, W>>>,
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
    positions: PositionFeed,
    access_group: Mutex<String>,
    reader: Mutex<Option<JoinHandle<()>>>,
    writer: Mutex<Option<JoinHandle<()>>>,
}

impl<R, W> LineSdk<R, W>
where
    R: AsyncBufRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    /// Nothing is read or written until [`WearableSdk::start`].
    pub fn new(input: R, output: W, positions: PositionFeed) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            pending: Mutex::new(Some(Pending {
                input,
                output,
                lines: rx,
            })),
            outbound: Mutex::new(Some(tx)),
            positions,
            access_group: Mutex::new(String::new()),
            reader: Mutex::new(None),
            writer: Mutex::new(None),
        }
    }

    pub fn access_group(&self) -> String {
        self.access_group.lock().clone()
    }

    /// Wait until every line queued before [`WearableSdk::stop`] is written.
    pub async fn flushed(&self) {
        let writer = self.writer.lock().take();
        if let Some(handle) = writer {
            if let Err(e) = handle.await {
                error!("SDK writer task failed: {}", e);
            }
        }
    }

    fn push(&self, line: &OutboundLine<'_>) -> Result<(), TransportError> {
        let json = serde_json::to_string(line)?;
        let outbound = self.outbound.lock();
        let tx = outbound.as_ref().ok_or(TransportError::Closed)?;
        tx.send(json).map_err(|_| TransportError::Closed)
    }
}

impl<R, W> ActionTransport for LineSdk<R, W>
where
    R: AsyncBufRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    fn session_opened(&self, device: &DeviceId, session: SessionId) {
        if let Err(e) = self.push(&OutboundLine::SessionOpened { id: device, session }) {
            debug!(device = %device, "Session open notice not sent: {}", e);
        }
    }

    fn session_closed(&self, device: &DeviceId, session: SessionId) {
        if let Err(e) = self.push(&OutboundLine::SessionClosed { id: device, session }) {
            debug!(device = %device, "Session close notice not sent: {}", e);
        }
    }

    fn send_response(
        &self,
        device: &DeviceId,
        session: SessionId,
        response: &ActionResponse,
    ) -> Result<(), TransportError> {
        self.push(&OutboundLine::Response {
            id: device,
            session,
            request_id: &response.request_id,
            payload: &response.payload,
        })
    }
}

impl<R, W> WearableSdk for LineSdk<R, W>
where
    R: AsyncBufRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    fn set_access_group(&self, group: &str) {
        info!(group, "Keychain access group set");
        *self.access_group.lock() = group.to_string();
    }

    fn start(&self, listener: mpsc::UnboundedSender<SdkEvent>) -> Result<(), TransportError> {
        let pending = self
            .pending
            .lock()
            .take()
            .ok_or(TransportError::AlreadyStarted)?;

        let positions = self.positions.clone();
        *self.reader.lock() = Some(tokio::spawn(read_lines(pending.input, listener, positions)));
        *self.writer.lock() = Some(tokio::spawn(write_lines(pending.output, pending.lines)));
        info!("Line SDK started");
        Ok(())
    }

    fn stop(&self) {
        if let Some(handle) = self.reader.lock().take() {
            handle.abort();
        }
        // Dropping the sender lets the writer drain and exit
        self.outbound.lock().take();
        info!("Line SDK stopped");
    }
}

async fn read_lines<R>(input: R, listener: mpsc::UnboundedSender<SdkEvent>, positions: PositionFeed)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<InboundLine>(line) {
                    Ok(inbound) => match inbound.route() {
                        Routed::Event(event) => {
                            if listener.send(event).is_err() {
                                debug!("SDK listener gone, stopping reader");
                                break;
                            }
                        }
                        Routed::Position(point) => positions.publish(point),
                    },
                    Err(e) => warn!("Ignoring unreadable SDK line: {}", e),
                }
            }
            Ok(None) => {
                info!("SDK input closed");
                break;
            }
            Err(e) => {
                error!("SDK read error: {}", e);
                break;
            }
        }
    }
}

async fn write_lines<W>(mut output: W, mut lines: mpsc::UnboundedReceiver<String>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(mut line) = lines.recv().await {
        line.push('\n');
        if let Err(e) = output.write_all(line.as_bytes()).await {
            error!("SDK write error: {}", e);
            break;
        }
        if let Err(e) = output.flush().await {
            error!("SDK flush error: {}", e);
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::course::CourseModel;
    use crate::infrastructure::stores::CourseStore;
    use crate::infrastructure::wearable::bridge::DeviceBridge;
    use crate::infrastructure::wearable::session::ActionContext;
    use crate::infrastructure::wearable::testing::{MemoryEquipmentStore, RecordingReporter};
    use serde_json::Value;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::{BufReader, DuplexStream, Lines, ReadHalf, WriteHalf};

    type TestSdk = LineSdk<BufReader<ReadHalf<DuplexStream>>, WriteHalf<DuplexStream>>;

    struct Peer {
        write: WriteHalf<DuplexStream>,
        read: Lines<BufReader<ReadHalf<DuplexStream>>>,
    }

    impl Peer {
        async fn send(&mut self, line: &str) {
            self.write.write_all(line.as_bytes()).await.unwrap();
            self.write.write_all(b"\n").await.unwrap();
        }

        async fn next(&mut self) -> Value {
            let line = tokio::time::timeout(Duration::from_secs(2), self.read.next_line())
                .await
                .unwrap()
                .unwrap()
                .unwrap();
            serde_json::from_str(&line).unwrap()
        }
    }

    fn connect(positions: PositionFeed) -> (TestSdk, Peer) {
        let (ours, theirs) = tokio::io::duplex(4096);
        let (our_read, our_write) = tokio::io::split(ours);
        let (their_read, their_write) = tokio::io::split(theirs);
        let sdk = LineSdk::new(BufReader::new(our_read), our_write, positions);
        let peer = Peer {
            write: their_write,
            read: BufReader::new(their_read).lines(),
        };
        (sdk, peer)
    }

    async fn next_event(rx: &mut mpsc::UnboundedReceiver<SdkEvent>) -> Option<SdkEvent> {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_inbound_lines_become_events() {
        let (sdk, mut peer) = connect(PositionFeed::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        sdk.start(tx).unwrap();

        peer.send(r#"{"event":"discovered","id":"g1","name":"Course Glasses"}"#).await;
        peer.send(r#"{"event":"connected","id":"g1"}"#).await;
        peer.send(
            r#"{"event":"action","id":"g1","session":4,"request_id":"r1","client_data":"{}"}"#,
        )
        .await;
        peer.send(r#"{"event":"session_state","id":"g1","session":4,"state":"terminated"}"#)
            .await;

        assert_eq!(
            next_event(&mut rx).await,
            Some(SdkEvent::DeviceDiscovered(Device::new("g1", "Course Glasses")))
        );
        assert_eq!(
            next_event(&mut rx).await,
            Some(SdkEvent::DeviceConnected(DeviceId::new("g1")))
        );
        match next_event(&mut rx).await {
            Some(SdkEvent::ActionReceived {
                device,
                session,
                request,
            }) => {
                assert_eq!(device, DeviceId::new("g1"));
                assert_eq!(session, SessionId(4));
                assert_eq!(request.request_id, "r1");
                assert_eq!(request.client_data, "{}");
            }
            other => panic!("unexpected event {:?}", other),
        }
        match next_event(&mut rx).await {
            Some(SdkEvent::SessionStateChanged { state, reason, .. }) => {
                assert_eq!(state, SessionState::Terminated);
                assert!(reason.is_empty());
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_position_lines_feed_positions_and_garbage_is_skipped() {
        let positions = PositionFeed::new();
        let (sdk, mut peer) = connect(positions.clone());
        let (tx, mut rx) = mpsc::unbounded_channel();
        sdk.start(tx).unwrap();

        peer.send("not json at all").await;
        peer.send(r#"{"event":"position","latitude":51.39,"longitude":-0.15}"#).await;
        peer.send(r#"{"event":"forgotten","id":"g1"}"#).await;

        assert_eq!(
            next_event(&mut rx).await,
            Some(SdkEvent::DeviceForgotten(DeviceId::new("g1")))
        );
        assert_eq!(positions.latest(), Some(GeoPoint::new(51.39, -0.15)));
    }

    #[tokio::test]
    async fn test_input_eof_ends_event_stream() {
        let (sdk, peer) = connect(PositionFeed::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        sdk.start(tx).unwrap();

        drop(peer);
        assert_eq!(next_event(&mut rx).await, None);
    }

    #[tokio::test]
    async fn test_response_is_written_as_line() {
        let (sdk, mut peer) = connect(PositionFeed::new());
        let (tx, _rx) = mpsc::unbounded_channel();
        sdk.start(tx).unwrap();

        let response = ActionResponse {
            request_id: "r9".to_string(),
            payload: r#"{"result_code":"success"}"#.to_string(),
        };
        sdk.send_response(&DeviceId::new("g1"), SessionId(2), &response)
            .unwrap();

        let line = peer.next().await;
        assert_eq!(line["event"], "response");
        assert_eq!(line["id"], "g1");
        assert_eq!(line["session"], 2);
        assert_eq!(line["request_id"], "r9");
        assert_eq!(line["payload"], r#"{"result_code":"success"}"#);
    }

    #[tokio::test]
    async fn test_start_twice_fails_and_stop_closes_transport() {
        let (sdk, _peer) = connect(PositionFeed::new());
        let (tx, _rx) = mpsc::unbounded_channel();
        sdk.start(tx.clone()).unwrap();
        assert!(matches!(sdk.start(tx), Err(TransportError::AlreadyStarted)));

        sdk.stop();
        sdk.flushed().await;
        let response = ActionResponse {
            request_id: "late".to_string(),
            payload: String::new(),
        };
        assert!(matches!(
            sdk.send_response(&DeviceId::new("g1"), SessionId(1), &response),
            Err(TransportError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_bridge_answers_over_the_line_protocol() {
        let positions = PositionFeed::new();
        let (sdk, mut peer) = connect(positions.clone());
        let sdk = Arc::new(sdk);

        let context = ActionContext::new(
            positions,
            Arc::new(CourseStore::new(CourseModel::built_in())),
            Arc::new(MemoryEquipmentStore::default()),
            Arc::new(RecordingReporter::default()),
            sdk.clone(),
        );
        let bridge = DeviceBridge::new(context);
        let events = bridge.start(sdk.as_ref(), "group.test").unwrap();
        assert_eq!(sdk.access_group(), "group.test");

        peer.send(r#"{"event":"position","latitude":51.3935,"longitude":-0.1530}"#).await;
        peer.send(r#"{"event":"discovered","id":"g1"}"#).await;
        peer.send(r#"{"event":"connected","id":"g1"}"#).await;

        let run = async {
            bridge.run(events).await;
        };
        let talk = async {
            let opened = peer.next().await;
            assert_eq!(opened["event"], "session_opened");
            let session = opened["session"].as_u64().unwrap();

            peer.send(&format!(
                r#"{{"event":"action","id":"g1","session":{},"request_id":"r1","client_data":"{{}}"}}"#,
                session
            ))
            .await;
            let response = peer.next().await;
            assert_eq!(response["event"], "response");
            assert_eq!(response["request_id"], "r1");

            // EOF ends the bridge loop
            drop(peer);
        };
        tokio::join!(run, talk);

        bridge.shutdown(sdk.as_ref());
        sdk.flushed().await;
        assert!(bridge.sessions().is_empty());
    }
}
