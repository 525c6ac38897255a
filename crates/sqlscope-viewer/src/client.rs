//! The long-running viewer client: one session at a time, forever.
//!
//! [`ViewerClient::connect`] performs the first discovery pass inline so
//! a total failure ([`ViewerError::NoServerReachable`]) surfaces to the
//! caller, who owns the retry decision. Once a session is established,
//! a background runner task pumps protocol frames outward and request
//! frames inward; if the transport later drops, the runner re-runs
//! discovery with the same candidate strategy after a fixed backoff,
//! indefinitely, until the client is shut down.
//!
//! Every time the server confirms its identity, the bound port and the
//! active data source path are persisted as the seed for the next
//! discovery pass -- including discovery passes in future viewer
//! processes.

use std::path::{Path, PathBuf};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use sqlscope_types::{ClientMessage, ServerMessage};

use crate::discovery::{self, RECONNECT_BACKOFF};
use crate::error::ViewerError;
use crate::persist::{self, ViewerState};
use crate::session::{Session, SessionState};

/// Capacity of the outward event channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Capacity of the inward request channel.
const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// Connection settings for the viewer client.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// Host the server candidates live on.
    pub host: String,
    /// Candidate ports, probed in order after the persisted seed.
    pub candidate_ports: Vec<u16>,
    /// Where to persist viewer state; `None` uses the platform default
    /// (`<config_dir>/sqlscope/viewer.json`).
    pub state_path: Option<PathBuf>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            host: String::from("127.0.0.1"),
            // Mirror the server's default port search range.
            candidate_ports: (4000..4010).collect(),
            state_path: None,
        }
    }
}

/// Handle to a running viewer client.
///
/// Protocol events arrive through [`ViewerClient::next_event`]; requests
/// go out through [`ViewerClient::request`]. Dropping the handle (or
/// calling [`ViewerClient::shutdown`]) tears the runner down.
#[derive(Debug)]
pub struct ViewerClient {
    commands: mpsc::Sender<ClientMessage>,
    events: mpsc::Receiver<ServerMessage>,
    status: watch::Receiver<SessionState>,
    runner: JoinHandle<()>,
}

impl ViewerClient {
    /// Discover a live server, complete the handshake, and start the
    /// background session runner.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::NoServerReachable`] when every candidate
    /// is refused or times out, or a handshake/transport error from the
    /// first connection. No background retrying happens for this first
    /// attempt -- re-invoke to try again.
    pub async fn connect(config: ViewerConfig) -> Result<Self, ViewerError> {
        let state_path = config.state_path.clone().or_else(persist::default_state_path);
        let saved = state_path
            .as_deref()
            .and_then(persist::load)
            .and_then(|state| state.last_port);

        let (ws, probed_port) =
            discovery::connect(&config.host, &config.candidate_ports, saved).await?;
        info!(port = probed_port, "transport established");

        let mut session = Session::new(ws);
        session.complete_handshake().await?;
        persist_confirmed(state_path.as_deref(), &session);

        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (status_tx, status_rx) = watch::channel(SessionState::Ready);

        let runner = tokio::spawn(run_loop(
            config,
            state_path,
            session,
            commands_rx,
            events_tx,
            status_tx,
        ));

        Ok(Self {
            commands: commands_tx,
            events: events_rx,
            status: status_rx,
            runner,
        })
    }

    /// Receive the next protocol event, or `None` once the runner has
    /// stopped for good.
    pub async fn next_event(&mut self) -> Option<ServerMessage> {
        self.events.recv().await
    }

    /// Queue a request for the current (or next) `Ready` session.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::RunnerStopped`] if the runner is gone.
    pub async fn request(&self, request: ClientMessage) -> Result<(), ViewerError> {
        self.commands
            .send(request)
            .await
            .map_err(|_| ViewerError::RunnerStopped)
    }

    /// The session lifecycle state as last reported by the runner.
    pub fn status(&self) -> SessionState {
        *self.status.borrow()
    }

    /// Tear the client down. The runner stops immediately; no further
    /// reconnection attempts are made.
    pub fn shutdown(self) {
        self.runner.abort();
    }
}

/// Why the frame pump stopped.
#[derive(Debug, PartialEq, Eq)]
enum PumpEnd {
    /// The transport dropped; the runner should reconnect.
    TransportLost,
    /// The [`ViewerClient`] handle is gone; the runner should exit.
    ClientDropped,
}

/// Own the session lifecycle: pump the live session, then reconnect
/// after a fixed backoff for as long as the client handle exists.
async fn run_loop(
    config: ViewerConfig,
    state_path: Option<PathBuf>,
    initial: Session,
    mut commands: mpsc::Receiver<ClientMessage>,
    events: mpsc::Sender<ServerMessage>,
    status: watch::Sender<SessionState>,
) {
    let mut session = Some(initial);

    loop {
        let Some(mut live) = session.take() else {
            // Reconnection path: same candidate strategy, fixed backoff,
            // until the client handle is dropped.
            status.send_replace(SessionState::Disconnected);
            tokio::time::sleep(RECONNECT_BACKOFF).await;
            status.send_replace(SessionState::Connecting);

            let saved = state_path
                .as_deref()
                .and_then(persist::load)
                .and_then(|state| state.last_port);

            match discovery::connect(&config.host, &config.candidate_ports, saved).await {
                Ok((ws, _)) => {
                    status.send_replace(SessionState::Handshaking);
                    let mut fresh = Session::new(ws);
                    match fresh.complete_handshake().await {
                        Ok(()) => session = Some(fresh),
                        Err(e) => warn!(error = %e, "handshake failed, will retry"),
                    }
                }
                Err(e) => warn!(error = %e, "reconnect attempt failed, will retry"),
            }
            continue;
        };

        status.send_replace(SessionState::Ready);
        persist_confirmed(state_path.as_deref(), &live);

        if pump(&mut live, &mut commands, &events, state_path.as_deref()).await
            == PumpEnd::ClientDropped
        {
            return;
        }
        // Transport lost: loop around with no session to reconnect.
    }
}

/// Pump frames in both directions until the transport drops or the
/// client handle disappears.
async fn pump(
    session: &mut Session,
    commands: &mut mpsc::Receiver<ClientMessage>,
    events: &mpsc::Sender<ServerMessage>,
    state_path: Option<&Path>,
) -> PumpEnd {
    loop {
        tokio::select! {
            command = commands.recv() => {
                match command {
                    Some(request) => {
                        if let Err(e) = session.send(&request).await {
                            warn!(error = %e, "request send failed, transport lost");
                            return PumpEnd::TransportLost;
                        }
                    }
                    None => return PumpEnd::ClientDropped,
                }
            }
            frame = session.recv() => {
                match frame {
                    Ok(Some(message)) => {
                        // A switch announcement updates the persisted path.
                        if matches!(message, ServerMessage::DatabasePathChanged(_)) {
                            persist_confirmed(state_path, session);
                        }
                        if events.send(message).await.is_err() {
                            return PumpEnd::ClientDropped;
                        }
                    }
                    Ok(None) => {
                        info!("server closed the session");
                        return PumpEnd::TransportLost;
                    }
                    Err(e) => {
                        warn!(error = %e, "session transport lost");
                        return PumpEnd::TransportLost;
                    }
                }
            }
        }
    }
}

/// Persist the session's confirmed identity as the next discovery seed.
fn persist_confirmed(path: Option<&Path>, session: &Session) {
    let Some(path) = path else { return };
    let state = ViewerState::new(
        session.server_port(),
        session.database_path().map(ToOwned::to_owned),
    );
    if let Err(e) = persist::save(path, &state) {
        warn!(error = %e, "failed to persist viewer state");
    }
}
