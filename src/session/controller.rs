use serde::Serialize;
use std::sync::{Arc, PoisonError};
use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::config::SessionConfig;
use super::identity::SessionIdentity;
use super::state::{CallState, ConnectionState};
use crate::devices::{CaptureDevices, LocalPublisher, PublisherStatus};
use crate::error::CallError;
use crate::events;
use crate::media::{MediaRoom, RoomConnector, RoomEvent, SinkElement, Stage};
use crate::token::TokenSource;

/// Point-in-time view of a call for rendering
#[derive(Debug, Clone, Serialize)]
pub struct CallSnapshot {
    pub state: CallState,
    pub devices: PublisherStatus,
    pub stage: Vec<SinkElement>,
}

/// Owns the single call session and its room event subscription
pub struct CallController {
    config: SessionConfig,
    tokens: Arc<dyn TokenSource>,
    connector: Arc<dyn RoomConnector>,
    devices: Arc<dyn CaptureDevices>,

    /// State slices rendered by the views
    state: Arc<RwLock<CallState>>,

    /// Sink elements for attached tracks
    stage: Arc<Mutex<Stage>>,

    /// Live session, if any
    active: Mutex<Option<ActiveSession>>,

    /// Token of the connect attempt in flight
    pending: std::sync::Mutex<Option<CancellationToken>>,

    /// Bumped on every state change
    changes: Arc<watch::Sender<u64>>,
}

impl CallController {
    pub fn new(
        config: SessionConfig,
        tokens: Arc<dyn TokenSource>,
        connector: Arc<dyn RoomConnector>,
        devices: Arc<dyn CaptureDevices>,
    ) -> Self {
        let (changes, _) = watch::channel(0);

        Self {
            config,
            tokens,
            connector,
            devices,
            state: Arc::new(RwLock::new(CallState::default())),
            stage: Arc::new(Mutex::new(Stage::new())),
            active: Mutex::new(None),
            pending: std::sync::Mutex::new(None),
            changes: Arc::new(changes),
        }
    }

    /// Start a call. No-op while connecting or connected.
    ///
    /// On failure the controller is back to disconnected with the error
    /// stored for the banner.
    pub async fn connect(&self) -> Result<(), CallError> {
        let cancel = {
            let mut state = self.state.write().await;
            if state.connection != ConnectionState::Disconnected {
                debug!("Connect ignored, session is {:?}", state.connection);
                return Ok(());
            }

            state.connection = ConnectionState::Connecting;
            state.error = None;
            state.identity = None;
            state.clear_conversation();

            let cancel = CancellationToken::new();
            *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = Some(cancel.clone());
            cancel
        };
        touch(&self.changes);

        // A session that ended from the remote side is still held
        let stale = self.active.lock().await.take();
        if let Some(stale) = stale {
            debug!("Releasing previous session");
            stale.shutdown().await;
        }
        self.stage.lock().await.clear();

        match self.establish(&cancel).await {
            Ok(session) => {
                let mut active = self.active.lock().await;
                self.clear_pending();
                if cancel.is_cancelled() {
                    drop(active);
                    info!("Connect cancelled while in flight, leaving room");
                    session.shutdown().await;
                    self.reset().await;
                    return Ok(());
                }

                let publisher = Arc::clone(&session.publisher);
                let changes = Arc::clone(&self.changes);
                tokio::spawn(async move {
                    match publisher.attach().await {
                        Ok(true) => touch(&changes),
                        Ok(false) => {}
                        Err(e) => warn!("Failed to enable audio: {:#}", e),
                    }
                });

                *active = Some(session);
                drop(active);

                {
                    let mut state = self.state.write().await;
                    if state.connection == ConnectionState::Connecting {
                        state.connection = ConnectionState::Connected;
                    }
                }
                touch(&self.changes);

                Ok(())
            }
            Err(CallError::Cancelled) => {
                self.clear_pending();
                info!("Connect cancelled");
                self.reset().await;
                Ok(())
            }
            Err(e) => {
                self.clear_pending();
                error!("Failed to connect: {}", e);
                {
                    let mut state = self.state.write().await;
                    state.connection = ConnectionState::Disconnected;
                    state.identity = None;
                    state.error = Some(e.to_string());
                }
                touch(&self.changes);
                Err(e)
            }
        }
    }

    async fn establish(&self, cancel: &CancellationToken) -> Result<ActiveSession, CallError> {
        let identity = SessionIdentity::generate();
        info!(
            "Connecting to voice agent (room={}, participant={})",
            identity.room_name, identity.participant_name
        );

        self.state.write().await.identity = Some(identity.clone());

        let credentials = self
            .tokens
            .fetch(&identity.room_name, &identity.participant_name)
            .await?;

        if cancel.is_cancelled() {
            return Err(CallError::Cancelled);
        }

        let (room, events) = self
            .connector
            .connect(&credentials.url, &credentials.token, &self.config.room)
            .await
            .map_err(|e| CallError::Transport(format!("{:#}", e)))?;

        if cancel.is_cancelled() {
            if let Err(e) = room.close().await {
                warn!("Failed to close room: {:#}", e);
            }
            return Err(CallError::Cancelled);
        }

        // Ends with the room; a local disconnect cancels it through the parent
        let session_cancel = cancel.child_token();

        let publisher = Arc::new(LocalPublisher::new(
            Arc::clone(&room),
            Arc::clone(&self.devices),
            Arc::clone(&self.stage),
            self.config.room.capture_resolution,
            session_cancel.child_token(),
        ));

        let context = EventContext {
            state: Arc::clone(&self.state),
            stage: Arc::clone(&self.stage),
            publisher: Arc::clone(&publisher),
            cancel: session_cancel.clone(),
            changes: Arc::clone(&self.changes),
        };
        let event_task = tokio::spawn(run_event_loop(events, context));

        info!("Joined room {}", identity.room_name);

        Ok(ActiveSession {
            room,
            publisher,
            cancel: session_cancel,
            event_task: Some(event_task),
            closed: false,
        })
    }

    /// End the call and clear transcripts, tool calls and summary
    ///
    /// Safe to call at any time; without a session it does nothing.
    pub async fn disconnect(&self) {
        let pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner).clone();
        if let Some(pending) = pending {
            pending.cancel();
        }

        let Some(session) = self.active.lock().await.take() else {
            debug!("Disconnect ignored, no active session");
            return;
        };

        info!("Disconnecting from room");
        session.shutdown().await;
        self.reset().await;
    }

    /// Orderly teardown before the controller goes away
    pub async fn shutdown(&self) {
        self.disconnect().await;
    }

    fn clear_pending(&self) {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner).take();
    }

    async fn reset(&self) {
        self.stage.lock().await.clear();
        {
            let mut state = self.state.write().await;
            state.connection = ConnectionState::Disconnected;
            state.identity = None;
            state.clear_conversation();
        }
        touch(&self.changes);
    }

    /// Flip microphone mute. Returns the resulting mute state.
    pub async fn toggle_mute(&self) -> bool {
        let muted = match self.publisher().await {
            Some(publisher) => publisher.toggle_mute().await,
            None => false,
        };
        touch(&self.changes);
        muted
    }

    /// Turn the camera on or off. Returns whether video is enabled afterwards.
    pub async fn toggle_video(&self) -> bool {
        let enabled = match self.publisher().await {
            Some(publisher) => publisher.toggle_video().await,
            None => false,
        };
        touch(&self.changes);
        enabled
    }

    pub async fn dismiss_error(&self) {
        self.state.write().await.error = None;
        touch(&self.changes);
    }

    pub async fn snapshot(&self) -> CallSnapshot {
        let state = self.state.read().await.clone();
        let devices = match self.publisher().await {
            Some(publisher) => publisher.status().await,
            None => PublisherStatus::default(),
        };
        let stage = self.stage.lock().await.elements().to_vec();

        CallSnapshot { state, devices, stage }
    }

    /// Receiver that changes whenever the call state does
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    async fn publisher(&self) -> Option<Arc<LocalPublisher>> {
        self.active
            .lock()
            .await
            .as_ref()
            .filter(|session| !session.cancel.is_cancelled())
            .map(|session| Arc::clone(&session.publisher))
    }
}

fn touch(changes: &watch::Sender<u64>) {
    changes.send_modify(|revision| *revision += 1);
}

/// Resources of one joined room
struct ActiveSession {
    room: Arc<dyn MediaRoom>,
    publisher: Arc<LocalPublisher>,
    cancel: CancellationToken,
    event_task: Option<JoinHandle<()>>,
    closed: bool,
}

impl ActiveSession {
    async fn shutdown(mut self) {
        self.cancel.cancel();
        self.publisher.detach().await;

        if let Err(e) = self.room.close().await {
            warn!("Failed to close room: {:#}", e);
        }

        if let Some(task) = self.event_task.take() {
            if let Err(e) = task.await {
                error!("Room event task panicked: {}", e);
            }
        }

        self.closed = true;
    }
}

impl Drop for ActiveSession {
    fn drop(&mut self) {
        if self.closed {
            return;
        }

        self.cancel.cancel();
        let released = self.publisher.release_now();

        if let Some(task) = self.event_task.take() {
            task.abort();
        }

        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            let room = Arc::clone(&self.room);
            runtime.spawn(async move {
                for sid in &released {
                    if let Err(e) = room.unpublish_track(sid).await {
                        warn!("Failed to unpublish {} during teardown: {:#}", sid, e);
                    }
                }
                if let Err(e) = room.close().await {
                    warn!("Failed to close room during teardown: {:#}", e);
                }
            });
        }
    }
}

struct EventContext {
    state: Arc<RwLock<CallState>>,
    stage: Arc<Mutex<Stage>>,
    publisher: Arc<LocalPublisher>,
    cancel: CancellationToken,
    changes: Arc<watch::Sender<u64>>,
}

async fn run_event_loop(mut events: mpsc::Receiver<RoomEvent>, ctx: EventContext) {
    debug!("Room event loop started");

    loop {
        let event = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => break,
            event = events.recv() => event,
        };

        let Some(event) = event else {
            warn!("Room event stream ended");
            ctx.remote_disconnect("event stream closed").await;
            break;
        };

        if !ctx.handle(event).await {
            break;
        }
    }

    debug!("Room event loop stopped");
}

impl EventContext {
    /// Apply one room event. Returns false once the session has ended.
    async fn handle(&self, event: RoomEvent) -> bool {
        match event {
            RoomEvent::Connected => {
                info!("Connected to room");
                let mut state = self.state.write().await;
                if self.cancel.is_cancelled() {
                    return false;
                }
                state.connection = ConnectionState::Connected;
            }
            RoomEvent::Disconnected { reason } => {
                info!("Disconnected from room: {}", reason);
                self.remote_disconnect(&reason).await;
                return false;
            }
            RoomEvent::TrackSubscribed { track, participant } => {
                info!("Track subscribed: {} from {}", track.kind, participant);
                let mut stage = self.stage.lock().await;
                if self.cancel.is_cancelled() {
                    return false;
                }
                stage.attach_remote(&participant, &track);
            }
            RoomEvent::TrackUnsubscribed { track, participant } => {
                info!("Track unsubscribed: {} from {}", track.kind, participant);
                let mut stage = self.stage.lock().await;
                if self.cancel.is_cancelled() {
                    return false;
                }
                let removed = stage.detach_track(&track.sid);
                debug!("Removed {} elements for {}", removed.len(), track.sid);
            }
            RoomEvent::DataReceived { payload, participant } => {
                debug!(
                    "Data received from {} ({} bytes)",
                    participant.as_deref().unwrap_or("server"),
                    payload.len()
                );
                let mut state = self.state.write().await;
                if self.cancel.is_cancelled() {
                    return false;
                }
                if !events::handle_payload(&payload, &mut state) {
                    return true;
                }
            }
        }

        touch(&self.changes);
        true
    }

    /// The room went away without a local disconnect
    ///
    /// Devices are released; transcripts, tool calls and summary stay
    /// readable until the next connect.
    async fn remote_disconnect(&self, reason: &str) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.cancel.cancel();

        self.publisher.detach().await;
        self.stage.lock().await.clear();

        self.state.write().await.connection = ConnectionState::Disconnected;
        touch(&self.changes);

        debug!("Session ended remotely ({})", reason);
    }
}
