//! The multiplayer session coordinator.
//!
//! Every inbound WebSocket frame ends up in [`Coordinator::handle_text`].
//! The coordinator parses it into a [`ClientMessage`], loads the target
//! session from the [`SessionRegistry`], and runs the whole
//! read-validate-mutate-emit sequence under that session's lock. Replies
//! to the sender go straight into its [`Connection`] outbox; broadcasts go
//! through the session's [`Topic`](crate::topic::Topic).
//!
//! | Action      | Reply to sender              | Broadcast                          |
//! |-------------|------------------------------|------------------------------------|
//! | `create`    | `gameCreated`                | --                                 |
//! | `join`      | `joined`                     | `playerListUpdated` (others)       |
//! | `start`     | `gameStarted`                | `gameStarted`                      |
//! | `guess`     | `newGuess`                   | `newGuess`, `roundComplete`, later `nextLocation` |
//! | `getScores` | `scores`                     | --                                 |
//! | `ping`      | `pong`                       | --                                 |
//!
//! Broadcasts reach the sender once: a subscribed sender gets the
//! broadcast copy, an unsubscribed one a direct copy. Failures become a
//! direct `error` event and leave every session untouched.

use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use rhenaguesser_pictures::{PictureError, PictureSource};
use rhenaguesser_types::{
    ClientMessage, ConnectionId, Coordinate, CreateRequest, GetScoresRequest, GuessRequest,
    JoinRequest, PictureId, Player, PlayerId, ScoreEntry, ServerEvent, SessionId, SessionStatus,
    SessionSummary, StartRequest,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use validator::Validate;

use crate::codes::{self, MAX_ID_ATTEMPTS};
use crate::config::GameConfig;
use crate::error::CoordinatorError;
use crate::geo::distance;
use crate::registry::{SessionEntry, SessionHandle, SessionRegistry};
use crate::scheduler::RoundScheduler;
use crate::session::{GuessOutcome, RevealEnd, Session};
use crate::topic::Outbox;

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

/// Server-side view of one WebSocket client.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    outbox: Outbox,
    sessions: Vec<SessionId>,
}

impl Connection {
    /// Open a connection and return the receiver its socket task drains.
    pub fn open() -> (Self, mpsc::UnboundedReceiver<ServerEvent>) {
        let (outbox, rx) = mpsc::unbounded_channel();
        let connection = Self {
            id: ConnectionId::new(),
            outbox,
            sessions: Vec::new(),
        };
        (connection, rx)
    }

    /// Connection identifier.
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Sessions this connection has subscribed to.
    pub fn sessions(&self) -> &[SessionId] {
        &self.sessions
    }

    /// Send an event to this connection only.
    pub fn send(&self, event: ServerEvent) {
        if self.outbox.send(event).is_err() {
            debug!(connection = %self.id, "outbox closed, event dropped");
        }
    }

    fn remember(&mut self, session: &SessionId) {
        if !self.sessions.contains(session) {
            self.sessions.push(session.clone());
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Turn a raw text frame into a validated [`ClientMessage`].
///
/// # Errors
///
/// [`CoordinatorError::UnknownAction`] for a missing or unknown `action`,
/// [`CoordinatorError::Validation`] for anything else that fails.
pub fn parse_message(text: &str) -> Result<ClientMessage, CoordinatorError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| CoordinatorError::Validation(e.to_string()))?;

    let known = value
        .get("action")
        .and_then(serde_json::Value::as_str)
        .is_some_and(ClientMessage::is_known_action);
    if !known {
        return Err(CoordinatorError::UnknownAction);
    }

    let message: ClientMessage =
        serde_json::from_value(value).map_err(|e| CoordinatorError::Validation(e.to_string()))?;
    message
        .validate()
        .map_err(|e| CoordinatorError::Validation(e.to_string()))?;
    Ok(message)
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Owns the registry, the round scheduler and the picture source.
///
/// Cheap to clone; all clones share the same sessions.
#[derive(Clone)]
pub struct Coordinator {
    registry: Arc<SessionRegistry>,
    scheduler: Arc<RoundScheduler>,
    pictures: Arc<PictureSource>,
    config: Arc<GameConfig>,
}

impl Coordinator {
    /// Create a coordinator with an empty registry.
    pub fn new(pictures: PictureSource, config: GameConfig) -> Self {
        Self {
            registry: Arc::new(SessionRegistry::new()),
            scheduler: Arc::new(RoundScheduler::new()),
            pictures: Arc::new(pictures),
            config: Arc::new(config),
        }
    }

    /// Handle one raw text frame from `connection`.
    pub async fn handle_text(&self, connection: &mut Connection, text: &str) {
        match parse_message(text) {
            Ok(message) => self.handle(connection, message).await,
            Err(e) => {
                debug!(connection = %connection.id, error = %e, "rejected inbound frame");
                connection.send(ServerEvent::error(e.client_message()));
            }
        }
    }

    /// Handle one parsed message from `connection`.
    pub async fn handle(&self, connection: &mut Connection, message: ClientMessage) {
        let action = message.action();
        let result = match message {
            ClientMessage::Create(request) => self.create(connection, request).await,
            ClientMessage::Join(request) => self.join(connection, request).await,
            ClientMessage::Start(request) => self.start(connection, request).await,
            ClientMessage::Guess(request) => self.guess(connection, request).await,
            ClientMessage::GetScores(request) => self.get_scores(connection, &request).await,
            ClientMessage::Ping => {
                connection.send(ServerEvent::Pong);
                Ok(())
            }
        };

        if let Err(e) = result {
            match &e {
                CoordinatorError::CreateFailed(_) | CoordinatorError::IdSpaceExhausted(_) => {
                    warn!(connection = %connection.id, action, error = %e, "request failed");
                }
                _ => debug!(connection = %connection.id, action, error = %e, "request refused"),
            }
            connection.send(ServerEvent::error(e.client_message()));
        }
    }

    /// Unsubscribe a closed connection from every session it was in.
    ///
    /// Players stay in their rosters; the remaining subscribers receive the
    /// roster again so they notice the departure.
    pub async fn disconnect(&self, connection: Connection) {
        for session_id in &connection.sessions {
            let Some(handle) = self.registry.get(session_id).await else {
                continue;
            };
            let mut entry = handle.lock().await;
            if entry.topic.unsubscribe(connection.id) {
                let players = entry.session.players().to_vec();
                entry.topic.publish(&ServerEvent::PlayerListUpdated { players });
            }
        }
        debug!(connection = %connection.id, sessions = connection.sessions.len(), "connection closed");
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    async fn create(
        &self,
        connection: &mut Connection,
        request: CreateRequest,
    ) -> Result<(), CoordinatorError> {
        // No lock is held while the picture source is queried.
        let pictures = self.pictures.fetch_pictures(self.config.rounds).await?;

        let creator = Player {
            id: codes::player_token(self.config.player_token_length, &mut rand::rng()),
            username: request.username.trim().to_owned(),
        };
        let code = codes::session_code(self.config.session_code_length, &mut rand::rng());
        let mut entry = SessionEntry::new(Session::new(code, creator.clone(), pictures)?);
        entry.topic.subscribe(connection.id, connection.outbox.clone());

        let handle = self.register(entry).await?;
        let entry = handle.lock().await;
        let game_id = entry.session.id().clone();
        connection.remember(&game_id);
        connection.send(ServerEvent::GameCreated {
            game_id: game_id.clone(),
            player_id: creator.id,
            players: entry.session.players().to_vec(),
        });

        info!(session = %game_id, creator = %creator.username, "game created");
        Ok(())
    }

    /// Insert `entry`, drawing new codes until one is free.
    async fn register(&self, mut entry: SessionEntry) -> Result<SessionHandle, CoordinatorError> {
        for _ in 0..MAX_ID_ATTEMPTS {
            match self.registry.insert_new(entry).await {
                Ok(handle) => return Ok(handle),
                Err(taken) => {
                    entry = taken;
                    let code = codes::session_code(self.config.session_code_length, &mut rand::rng());
                    debug!(taken = %entry.session.id(), retry = %code, "session code collision");
                    entry.session.reassign_id(code);
                }
            }
        }
        Err(CoordinatorError::IdSpaceExhausted(MAX_ID_ATTEMPTS))
    }

    async fn join(
        &self,
        connection: &mut Connection,
        request: JoinRequest,
    ) -> Result<(), CoordinatorError> {
        let game_id = request.game_id.normalized();
        let handle = self.session(&game_id).await?;
        let mut entry = handle.lock().await;

        let player = Player {
            id: self.fresh_player_id(&entry.session)?,
            username: request.username.trim().to_owned(),
        };
        entry.session.add_player(player.clone())?;
        entry.topic.subscribe(connection.id, connection.outbox.clone());
        connection.remember(&game_id);

        let players = entry.session.players().to_vec();
        connection.send(ServerEvent::Joined {
            game_id: game_id.clone(),
            player_id: player.id,
            players: players.clone(),
        });
        entry
            .topic
            .publish_except(connection.id, &ServerEvent::PlayerListUpdated { players });

        info!(session = %game_id, player = %player.username, "player joined");
        Ok(())
    }

    fn fresh_player_id(&self, session: &Session) -> Result<PlayerId, CoordinatorError> {
        let mut rng = rand::rng();
        (0..MAX_ID_ATTEMPTS)
            .map(|_| codes::player_token(self.config.player_token_length, &mut rng))
            .find(|id| !session.has_player(id))
            .ok_or(CoordinatorError::IdSpaceExhausted(MAX_ID_ATTEMPTS))
    }

    async fn start(
        &self,
        connection: &mut Connection,
        request: StartRequest,
    ) -> Result<(), CoordinatorError> {
        let game_id = request.game_id.normalized();
        let handle = self.session(&game_id).await?;
        let mut entry = handle.lock().await;

        let location_id = entry.session.start()?;
        broadcast_with_sender(&mut entry, connection, &ServerEvent::GameStarted { location_id });

        info!(session = %game_id, players = entry.session.players().len(), "game started");
        Ok(())
    }

    async fn guess(
        &self,
        connection: &mut Connection,
        request: GuessRequest,
    ) -> Result<(), CoordinatorError> {
        let game_id = request.game_id.normalized();
        let handle = self.session(&game_id).await?;
        let mut entry = handle.lock().await;

        let round = entry.session.current_round();
        let outcome = entry
            .session
            .submit_guess(&request.player_id, request.guess, request.round)?;

        match outcome {
            GuessOutcome::Duplicate => {
                debug!(session = %game_id, player = %request.player_id, round, "duplicate guess ignored");
            }
            GuessOutcome::Accepted { guess } => {
                let event = ServerEvent::NewGuess {
                    player_id: guess.player_id.clone(),
                    guess,
                };
                broadcast_with_sender(&mut entry, connection, &event);
            }
            GuessOutcome::RoundComplete {
                guess,
                guesses,
                real_position,
                next_round,
            } => {
                let event = ServerEvent::NewGuess {
                    player_id: guess.player_id.clone(),
                    guess,
                };
                broadcast_with_sender(&mut entry, connection, &event);
                broadcast_with_sender(
                    &mut entry,
                    connection,
                    &ServerEvent::RoundComplete {
                        guesses,
                        real_position,
                    },
                );
                info!(session = %game_id, round, ?next_round, "round complete");
                self.schedule_reveal_end(game_id, next_round).await;
            }
        }
        Ok(())
    }

    async fn get_scores(
        &self,
        connection: &Connection,
        request: &GetScoresRequest,
    ) -> Result<(), CoordinatorError> {
        let scores = self.scoreboard(&request.game_id).await?;
        connection.send(ServerEvent::Scores { scores });
        Ok(())
    }

    /// Publish the next location (or the end of the game) after the
    /// reveal delay.
    async fn schedule_reveal_end(&self, game_id: SessionId, next_round: Option<usize>) {
        let registry = Arc::clone(&self.registry);
        let id = game_id.clone();
        let task = async move {
            let Some(handle) = registry.get(&id).await else {
                debug!(session = %id, "session gone before reveal ended");
                return;
            };
            let mut entry = handle.lock().await;
            match entry.session.end_reveal(next_round) {
                RevealEnd::Next(location_id) => {
                    entry.topic.publish(&ServerEvent::NextLocation {
                        location_id: Some(location_id),
                    });
                }
                RevealEnd::Exhausted => {
                    entry
                        .topic
                        .publish(&ServerEvent::NextLocation { location_id: None });
                    info!(session = %id, "game finished");
                }
                RevealEnd::Stale => {
                    debug!(session = %id, ?next_round, "stale reveal timer ignored");
                }
            }
        };
        self.scheduler
            .schedule(game_id, self.config.reveal_delay(), task)
            .await;
    }

    async fn session(&self, id: &SessionId) -> Result<SessionHandle, CoordinatorError> {
        self.registry
            .get(id)
            .await
            .ok_or_else(|| CoordinatorError::SessionNotFound(id.clone()))
    }

    // -----------------------------------------------------------------------
    // Out-of-band queries
    // -----------------------------------------------------------------------

    /// Ranked scoreboard of a session.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::SessionNotFound`] for an unknown code.
    pub async fn scoreboard(&self, id: &SessionId) -> Result<Vec<ScoreEntry>, CoordinatorError> {
        let handle = self.session(&id.normalized()).await?;
        let entry = handle.lock().await;
        Ok(entry.session.scores())
    }

    /// Summaries of every live session, sorted by code.
    pub async fn sessions(&self) -> Vec<SessionSummary> {
        let mut summaries = Vec::new();
        for (_, handle) in self.registry.list_all().await {
            summaries.push(handle.lock().await.session.summary());
        }
        summaries
    }

    /// Number of live sessions.
    pub async fn session_count(&self) -> usize {
        self.registry.len().await
    }

    /// One random picture for a single-player round.
    ///
    /// # Errors
    ///
    /// Propagates the picture source failure.
    pub async fn random_location(&self) -> Result<PictureId, PictureError> {
        Ok(self.pictures.fetch_one().await?.id)
    }

    /// Score a single-player guess against the picture's true position.
    ///
    /// Returns the distance rounded to whole meters and the true position.
    ///
    /// # Errors
    ///
    /// Returns [`PictureError::NotFound`] for an unknown picture, or the
    /// upstream failure.
    pub async fn score_single_guess(
        &self,
        picture: &PictureId,
        guess: Coordinate,
    ) -> Result<(u64, Coordinate), PictureError> {
        let origin = self.pictures.locate(picture).await?;
        Ok((round_meters(distance(guess, origin)), origin))
    }

    // -----------------------------------------------------------------------
    // Housekeeping
    // -----------------------------------------------------------------------

    /// Remove sessions that finished more than `ttl` ago.
    ///
    /// A session whose closing `nextLocation` has not been published yet
    /// is kept until the next sweep. Returns the number of sessions
    /// removed.
    pub async fn reap_finished(&self, ttl: TimeDelta) -> usize {
        let now = Utc::now();
        let mut removed: usize = 0;
        for (id, handle) in self.registry.list_all().await {
            let expired = {
                let entry = handle.lock().await;
                entry.session.status() == SessionStatus::Finished
                    && entry
                        .session
                        .finished_at()
                        .is_some_and(|at| now.signed_duration_since(at) >= ttl)
            };
            if !expired {
                continue;
            }
            if self.scheduler.is_pending(&id).await {
                debug!(session = %id, "finished session still revealing, not reaped");
                continue;
            }
            if self.registry.remove(&id).await {
                self.scheduler.cancel(&id).await;
                removed = removed.saturating_add(1);
                debug!(session = %id, "finished session reaped");
            }
        }
        if removed > 0 {
            info!(removed, "reaped finished sessions");
        }
        removed
    }
}

/// Publish `event` to the session's subscribers and make sure the
/// sender receives exactly one copy.
fn broadcast_with_sender(entry: &mut SessionEntry, connection: &Connection, event: &ServerEvent) {
    entry.topic.publish(event);
    if !entry.topic.contains(connection.id) {
        connection.send(event.clone());
    }
}

/// Non-negative distance rounded to the nearest whole meter.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_meters(meters: f64) -> u64 {
    // Haversine output is bounded by half the circumference, well inside u64.
    meters.max(0.0).round() as u64
}
