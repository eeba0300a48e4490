//! Access-level ordinal table.
//!
//! Level names (`rattighetsniva.*`) are only ever compared through their
//! rank. The table is process-wide, immutable, and safe to read from any
//! task without locking.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Rank of any name missing from the table. Lower than every real rank.
pub const UNDEFINED_LEVEL: i64 = 0;

pub const LEVEL_READ: &str = "rattighetsniva.las";
pub const LEVEL_WRITE: &str = "rattighetsniva.skriv";
pub const LEVEL_LOCAL_ADMIN: &str = "rattighetsniva.lokal";
pub const LEVEL_ADMIN: &str = "rattighetsniva.admin";

static LEVELS: LazyLock<HashMap<&'static str, i64>> = LazyLock::new(|| {
    HashMap::from([
        (LEVEL_READ, 4),
        (LEVEL_WRITE, 5),
        (LEVEL_LOCAL_ADMIN, 6),
        (LEVEL_ADMIN, 7),
    ])
});

/// Translates a level name to its rank, [`UNDEFINED_LEVEL`] if unknown.
pub fn ordinal(name: &str) -> i64 {
    LEVELS.get(name).copied().unwrap_or(UNDEFINED_LEVEL)
}

pub fn is_defined(ordinal: i64) -> bool {
    ordinal > UNDEFINED_LEVEL
}

/// True iff `held` is at least as privileged as `required`.
#[inline]
pub fn level_satisfies(held: i64, required: i64) -> bool {
    held >= required
}
