//! The per-session state machine.
//!
//! A [`Session`] owns everything about one game: roster, pictures, the
//! round cursor and the guesses. It knows nothing about connections or
//! timers; the coordinator drives it and turns its return values into
//! events. All methods assume the caller holds the session's lock.
//!
//! ```text
//!            start                 last guess              reveal ends
//! Waiting ----------> Active/Guessing -------> Active/Revealing ------> Active/Guessing
//!                                        \                                (next round)
//!                                         \ last guess of last round
//!                                          `-> Finished/Revealing
//! ```

use chrono::{DateTime, Utc};
use rhenaguesser_types::{
    Coordinate, Guess, Picture, PictureId, Player, PlayerId, RoundPhase, ScoreEntry, SessionId,
    SessionStatus, SessionSummary,
};

use crate::error::SessionError;
use crate::scoring::scoreboard;

/// One multiplayer game.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    status: SessionStatus,
    phase: RoundPhase,
    players: Vec<Player>,
    pictures: Vec<Picture>,
    current_round: usize,
    guesses: Vec<Vec<Guess>>,
    finished_at: Option<DateTime<Utc>>,
}

/// What happened to a submitted guess.
#[derive(Debug, Clone, PartialEq)]
pub enum GuessOutcome {
    /// The player already answered this round; nothing changed.
    Duplicate,
    /// The guess was recorded and the round is still open.
    Accepted {
        /// The recorded guess.
        guess: Guess,
    },
    /// The guess was the last one missing; the round is now revealing.
    RoundComplete {
        /// The recorded guess.
        guess: Guess,
        /// Every guess of the completed round, in submission order.
        guesses: Vec<Guess>,
        /// Where the round's picture was taken.
        real_position: Coordinate,
        /// Round that opens when the reveal ends, `None` after the last one.
        next_round: Option<usize>,
    },
}

/// Result of ending a reveal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealEnd {
    /// The next round is open for guesses.
    Next(PictureId),
    /// All rounds have been played.
    Exhausted,
    /// The session moved on in the meantime; nothing to do.
    Stale,
}

impl Session {
    /// Create a waiting session with `creator` as its only player.
    ///
    /// One round is played per picture.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoPictures`] if `pictures` is empty.
    pub fn new(id: SessionId, creator: Player, pictures: Vec<Picture>) -> Result<Self, SessionError> {
        if pictures.is_empty() {
            return Err(SessionError::NoPictures);
        }
        let guesses = vec![Vec::new(); pictures.len()];
        Ok(Self {
            id,
            status: SessionStatus::Waiting,
            phase: RoundPhase::Guessing,
            players: vec![creator],
            pictures,
            current_round: 0,
            guesses,
            finished_at: None,
        })
    }

    /// Session code.
    pub const fn id(&self) -> &SessionId {
        &self.id
    }

    /// Replace the session code. Only meaningful before registration.
    pub(crate) fn reassign_id(&mut self, id: SessionId) {
        self.id = id;
    }

    /// Lifecycle status.
    pub const fn status(&self) -> SessionStatus {
        self.status
    }

    /// Sub-state of the current round.
    pub const fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Roster in join order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Whether `player_id` belongs to this session.
    pub fn has_player(&self, player_id: &PlayerId) -> bool {
        self.players.iter().any(|p| &p.id == player_id)
    }

    /// Zero-based index of the current round.
    pub const fn current_round(&self) -> usize {
        self.current_round
    }

    /// Total number of rounds.
    pub fn rounds(&self) -> usize {
        self.pictures.len()
    }

    /// Picture of round `round`.
    pub fn location(&self, round: usize) -> Option<&PictureId> {
        self.pictures.get(round).map(|p| &p.id)
    }

    /// Guesses recorded for round `round`.
    pub fn guesses(&self, round: usize) -> &[Guess] {
        self.guesses.get(round).map(Vec::as_slice).unwrap_or_default()
    }

    /// When the last round completed, if it has.
    pub const fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    fn require(&self, expected: SessionStatus) -> Result<(), SessionError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(SessionError::WrongStatus {
                expected,
                actual: self.status,
            })
        }
    }

    /// Append a player to the roster.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::WrongStatus`] once the session has started.
    pub fn add_player(&mut self, player: Player) -> Result<(), SessionError> {
        self.require(SessionStatus::Waiting)?;
        self.players.push(player);
        Ok(())
    }

    /// Open the first round and return its picture.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::WrongStatus`] unless the session is waiting.
    pub fn start(&mut self) -> Result<PictureId, SessionError> {
        self.require(SessionStatus::Waiting)?;
        let location = self
            .location(self.current_round)
            .cloned()
            .ok_or(SessionError::NoPictures)?;
        self.status = SessionStatus::Active;
        self.phase = RoundPhase::Guessing;
        Ok(location)
    }

    /// Record `player_id`'s guess for the open round.
    ///
    /// `round`, when given, must name the open round. A player's second
    /// guess for a round is reported as [`GuessOutcome::Duplicate`] and
    /// leaves the session unchanged. The guess that makes every player
    /// have answered completes the round: the phase switches to
    /// revealing and the cursor moves on, or the session finishes after
    /// the last round.
    ///
    /// # Errors
    ///
    /// [`SessionError::WrongStatus`] unless active,
    /// [`SessionError::RoundClosed`] while revealing,
    /// [`SessionError::RoundMismatch`] for a stale `round`,
    /// [`SessionError::UnknownPlayer`] for a player outside the roster.
    pub fn submit_guess(
        &mut self,
        player_id: &PlayerId,
        position: Coordinate,
        round: Option<usize>,
    ) -> Result<GuessOutcome, SessionError> {
        self.require(SessionStatus::Active)?;
        if self.phase == RoundPhase::Revealing {
            return Err(SessionError::RoundClosed);
        }
        let current = self.current_round;
        if let Some(requested) = round.filter(|r| *r != current) {
            return Err(SessionError::RoundMismatch { current, requested });
        }
        if !self.has_player(player_id) {
            return Err(SessionError::UnknownPlayer(player_id.clone()));
        }

        let player_count = self.players.len();
        let real_position = self
            .pictures
            .get(current)
            .map(|p| p.position)
            .ok_or(SessionError::NoPictures)?;
        let round_guesses = self
            .guesses
            .get_mut(current)
            .ok_or(SessionError::NoPictures)?;

        if round_guesses.iter().any(|g| &g.player_id == player_id) {
            return Ok(GuessOutcome::Duplicate);
        }

        let guess = Guess {
            player_id: player_id.clone(),
            position,
        };
        round_guesses.push(guess.clone());

        if round_guesses.len() < player_count {
            return Ok(GuessOutcome::Accepted { guess });
        }

        let guesses = round_guesses.clone();
        let next_round = self.complete_round();
        Ok(GuessOutcome::RoundComplete {
            guess,
            guesses,
            real_position,
            next_round,
        })
    }

    /// Close the open round and move the cursor, or finish the session.
    fn complete_round(&mut self) -> Option<usize> {
        self.phase = RoundPhase::Revealing;
        let next = self
            .current_round
            .checked_add(1)
            .filter(|next| *next < self.pictures.len());
        if let Some(next) = next {
            self.current_round = next;
        } else {
            self.status = SessionStatus::Finished;
            self.finished_at = Some(Utc::now());
        }
        next
    }

    /// End the reveal that preceded `next_round`.
    ///
    /// Reopens guessing when the session is still revealing right before
    /// `next_round`. With `next_round == None` reports the end of the game
    /// for a finished session. Anything else is stale.
    pub fn end_reveal(&mut self, next_round: Option<usize>) -> RevealEnd {
        match next_round {
            Some(round)
                if self.status == SessionStatus::Active
                    && self.phase == RoundPhase::Revealing
                    && self.current_round == round =>
            {
                self.phase = RoundPhase::Guessing;
                self.location(round)
                    .cloned()
                    .map_or(RevealEnd::Stale, RevealEnd::Next)
            }
            None if self.status == SessionStatus::Finished => RevealEnd::Exhausted,
            _ => RevealEnd::Stale,
        }
    }

    /// Ranked scoreboard over every round played so far.
    pub fn scores(&self) -> Vec<ScoreEntry> {
        let truths: Vec<Coordinate> = self.pictures.iter().map(|p| p.position).collect();
        scoreboard(&self.players, &self.guesses, &truths)
    }

    /// Listing projection.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            status: self.status,
            players: self.players.len(),
            current_round: self.current_round,
            rounds: self.rounds(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn player(id: &str) -> Player {
        Player {
            id: PlayerId::from(id),
            username: id.to_uppercase(),
        }
    }

    fn pictures(n: usize) -> Vec<Picture> {
        (0..n)
            .map(|i| Picture {
                id: PictureId::from(format!("pic-{i}")),
                position: Coordinate::new(48.0, 7.0),
            })
            .collect()
    }

    fn active_session(players: &[&str], rounds: usize) -> Session {
        let (creator, others) = players.split_first().unwrap();
        let mut session =
            Session::new(SessionId::from("TEST"), player(creator), pictures(rounds)).unwrap();
        for name in others {
            session.add_player(player(name)).unwrap();
        }
        session.start().unwrap();
        session
    }

    fn guess(session: &mut Session, id: &str) -> Result<GuessOutcome, SessionError> {
        session.submit_guess(&PlayerId::from(id), Coordinate::new(48.0, 7.0), None)
    }

    #[test]
    fn new_session_waits_with_creator() {
        let session = Session::new(SessionId::from("ABCD"), player("a"), pictures(5)).unwrap();
        assert_eq!(session.status(), SessionStatus::Waiting);
        assert_eq!(session.players().len(), 1);
        assert_eq!(session.rounds(), 5);
        assert_eq!(session.current_round(), 0);
    }

    #[test]
    fn session_without_pictures_is_refused() {
        let session = Session::new(SessionId::from("ABCD"), player("a"), Vec::new());
        assert!(matches!(session, Err(SessionError::NoPictures)));
    }

    #[test]
    fn join_after_start_is_refused_and_roster_unchanged() {
        let mut session = active_session(&["a"], 5);
        let result = session.add_player(player("b"));
        assert!(matches!(result, Err(SessionError::WrongStatus { .. })));
        assert_eq!(session.players().len(), 1);
    }

    #[test]
    fn start_is_one_shot() {
        let mut session = active_session(&["a"], 5);
        assert!(matches!(session.start(), Err(SessionError::WrongStatus { .. })));
    }

    #[test]
    fn round_completes_when_everyone_answered() {
        let mut session = active_session(&["a", "b"], 5);

        let first = guess(&mut session, "a");
        assert!(matches!(first, Ok(GuessOutcome::Accepted { .. })));
        assert_eq!(session.phase(), RoundPhase::Guessing);

        let Ok(GuessOutcome::RoundComplete {
            guesses, next_round, ..
        }) = guess(&mut session, "b")
        else {
            panic!("expected round completion");
        };
        assert_eq!(guesses.len(), 2);
        assert_eq!(next_round, Some(1));
        assert_eq!(session.current_round(), 1);
        assert_eq!(session.phase(), RoundPhase::Revealing);
    }

    #[test]
    fn duplicate_guess_is_ignored() {
        let mut session = active_session(&["a", "b"], 5);
        assert!(matches!(guess(&mut session, "a"), Ok(GuessOutcome::Accepted { .. })));
        assert!(matches!(guess(&mut session, "a"), Ok(GuessOutcome::Duplicate)));
        assert_eq!(session.guesses(0).len(), 1);
        assert_eq!(session.current_round(), 0);
    }

    #[test]
    fn guesses_during_reveal_are_refused() {
        let mut session = active_session(&["a"], 5);
        assert!(matches!(guess(&mut session, "a"), Ok(GuessOutcome::RoundComplete { .. })));
        assert!(matches!(guess(&mut session, "a"), Err(SessionError::RoundClosed)));
        assert!(session.guesses(1).is_empty());
    }

    #[test]
    fn stale_round_number_is_refused() {
        let mut session = active_session(&["a", "b"], 5);
        let result = session.submit_guess(&PlayerId::from("a"), Coordinate::new(0.0, 0.0), Some(3));
        assert_eq!(
            result,
            Err(SessionError::RoundMismatch {
                current: 0,
                requested: 3
            })
        );
        let ok = session.submit_guess(&PlayerId::from("a"), Coordinate::new(0.0, 0.0), Some(0));
        assert!(matches!(ok, Ok(GuessOutcome::Accepted { .. })));
    }

    #[test]
    fn unknown_player_is_refused() {
        let mut session = active_session(&["a"], 5);
        assert!(matches!(guess(&mut session, "mallory"), Err(SessionError::UnknownPlayer(_))));
    }

    #[test]
    fn guess_before_start_is_refused() {
        let mut session = Session::new(SessionId::from("ABCD"), player("a"), pictures(2)).unwrap();
        assert!(matches!(guess(&mut session, "a"), Err(SessionError::WrongStatus { .. })));
    }

    #[test]
    fn reveal_end_reopens_next_round() {
        let mut session = active_session(&["a"], 3);
        assert!(guess(&mut session, "a").is_ok());

        assert_eq!(session.end_reveal(Some(2)), RevealEnd::Stale);
        assert_eq!(session.end_reveal(Some(1)), RevealEnd::Next(PictureId::from("pic-1")));
        assert_eq!(session.phase(), RoundPhase::Guessing);
        // A second firing for the same round is stale.
        assert_eq!(session.end_reveal(Some(1)), RevealEnd::Stale);
    }

    #[test]
    fn last_round_finishes_without_moving_cursor() {
        let mut session = active_session(&["a"], 2);
        assert!(guess(&mut session, "a").is_ok());
        assert_eq!(session.end_reveal(Some(1)), RevealEnd::Next(PictureId::from("pic-1")));

        let last = guess(&mut session, "a");
        assert!(matches!(last, Ok(GuessOutcome::RoundComplete { next_round: None, .. })));
        assert_eq!(session.status(), SessionStatus::Finished);
        assert_eq!(session.current_round(), 1);
        assert!(session.finished_at().is_some());
        assert_eq!(session.end_reveal(None), RevealEnd::Exhausted);
        assert!(matches!(guess(&mut session, "a"), Err(SessionError::WrongStatus { .. })));
    }

    #[test]
    fn cursor_never_reaches_round_count() {
        let rounds = 4;
        let mut session = active_session(&["a", "b"], rounds);
        let mut last_seen = 0;
        for _ in 0..rounds {
            assert!(guess(&mut session, "a").is_ok());
            assert!(guess(&mut session, "b").is_ok());
            assert!(session.current_round() >= last_seen);
            assert!(session.current_round() < rounds);
            last_seen = session.current_round();
            let _ = session.end_reveal(Some(last_seen));
            for r in 0..rounds {
                assert!(session.guesses(r).len() <= session.players().len());
            }
        }
        assert_eq!(session.status(), SessionStatus::Finished);
    }

    #[test]
    fn summary_reflects_state() {
        let session = active_session(&["a", "b", "c"], 5);
        let summary = session.summary();
        assert_eq!(summary.players, 3);
        assert_eq!(summary.status, SessionStatus::Active);
        assert_eq!(summary.rounds, 5);
    }
}
