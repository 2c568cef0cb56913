//! Random session codes and player tokens.
//!
//! Session codes are short upper-case base-36 strings meant to be read out
//! loud and typed on a phone. Player tokens are longer and lower-case.
//! Neither is unique by construction; callers retry against the registry
//! or the session roster.

use rand::Rng;
use rand::seq::IndexedRandom;
use rhenaguesser_types::{PlayerId, SessionId};

const UPPER_BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER_BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Bounded retries when a generated id collides.
pub const MAX_ID_ATTEMPTS: usize = 64;

fn random_code(alphabet: &[u8], len: usize, rng: &mut impl Rng) -> String {
    (0..len)
        .filter_map(|_| alphabet.choose(rng).copied().map(char::from))
        .collect()
}

/// A fresh session code of `len` characters.
pub fn session_code(len: usize, rng: &mut impl Rng) -> SessionId {
    SessionId::from(random_code(UPPER_BASE36, len, rng))
}

/// A fresh player token of `len` characters.
pub fn player_token(len: usize, rng: &mut impl Rng) -> PlayerId {
    PlayerId::from(random_code(LOWER_BASE36, len, rng))
}
