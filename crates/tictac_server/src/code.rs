//! Short human-typeable session codes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::sync::Mutex;

/// Number of characters in a code.
pub const CODE_LENGTH: usize = 4;

const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// A session code such as `AB12`.
///
/// Always stored uppercase; parsing ignores case and surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, derive_more::Display)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Parses user input, returning `None` unless it is exactly
    /// [`CODE_LENGTH`] alphanumeric characters.
    pub fn parse(input: &str) -> Option<Self> {
        let code = input.trim().to_ascii_uppercase();
        let valid = code.len() == CODE_LENGTH && code.bytes().all(|b| ALPHABET.contains(&b));
        valid.then_some(Self(code))
    }

    /// Draws a random code.
    pub fn random(rng: &mut impl Rng) -> Self {
        let code = (0..CODE_LENGTH)
            .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
            .collect();
        Self(code)
    }

    /// The uppercase code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Supplies candidate codes to the registry.
///
/// Candidates need not be unique; the registry retries on collision.
pub trait CodeSource: Send + Sync {
    /// Returns the next candidate code.
    fn next_code(&self) -> RoomCode;
}

/// Uniformly random codes.
#[derive(Debug)]
pub struct RandomCodes {
    rng: Mutex<StdRng>,
}

impl RandomCodes {
    /// Seeds from the operating system.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Deterministic codes for tests and replays.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomCodes {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeSource for RandomCodes {
    fn next_code(&self) -> RoomCode {
        let mut rng = self.rng.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        RoomCode::random(&mut *rng)
    }
}
