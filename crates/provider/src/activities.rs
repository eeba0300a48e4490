//! Static registry of known system activity names.
//!
//! Lets reports show what an activity id protects without an extra
//! round-trip to `kataloginformation`.

use ladok_core::ActivityId;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Name reported for ids missing from the registry.
pub const UNDEFINED_ACTIVITY: &str = "undefined";

static KNOWN_ACTIVITIES: LazyLock<HashMap<ActivityId, &'static str>> =
    LazyLock::new(|| HashMap::from([(61001, "studentinformation.lasa")]));

/// Returns the system activity name for `id`, if known.
pub fn lookup(id: ActivityId) -> Option<&'static str> {
    KNOWN_ACTIVITIES.get(&id).copied()
}

/// Like [`lookup`], falling back to [`UNDEFINED_ACTIVITY`].
pub fn translate(id: ActivityId) -> &'static str {
    lookup(id).unwrap_or(UNDEFINED_ACTIVITY)
}
