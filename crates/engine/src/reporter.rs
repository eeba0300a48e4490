//! Permission report generator.
//!
//! Takes merged held grants and a requirement set and produces a
//! human-readable table with activity names and per-activity status.

use crate::permissions::HeldGrants;
use ladok_core::levels;
use ladok_core::{ActivityId, Permissions};
use ladok_provider::activities;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// How one activity fares against the requirement set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    Satisfied,
    Insufficient,
    Missing,
    /// Granted but not required.
    Unused,
}

impl fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            ActivityStatus::Satisfied => "OK",
            ActivityStatus::Insufficient => "LOW",
            ActivityStatus::Missing => "MISSING",
            ActivityStatus::Unused => "-",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityRow {
    pub activity_id: ActivityId,
    pub activity_name: &'static str,
    pub required_level: Option<String>,
    pub granted_rank: Option<i64>,
    pub status: ActivityStatus,
}

#[derive(Debug)]
pub struct PermissionReport {
    pub groups: usize,
    pub required: usize,
    pub rows: Vec<ActivityRow>,
    pub fetch_time: Duration,
}

impl PermissionReport {
    pub fn build(held: &HeldGrants, required: &Permissions, fetch_time: Duration) -> Self {
        let mut rows: Vec<ActivityRow> = required
            .iter()
            .map(|(&id, level)| {
                let granted = held.granted.get(&id).copied();
                let wanted = levels::ordinal(level);
                let status = match granted {
                    None => ActivityStatus::Missing,
                    Some(rank)
                        if levels::is_defined(wanted) && levels::level_satisfies(rank, wanted) =>
                    {
                        ActivityStatus::Satisfied
                    }
                    Some(_) => ActivityStatus::Insufficient,
                };
                ActivityRow {
                    activity_id: id,
                    activity_name: activities::translate(id),
                    required_level: Some(level.clone()),
                    granted_rank: granted,
                    status,
                }
            })
            .collect();

        rows.extend(
            held.granted
                .iter()
                .filter(|(id, _)| !required.contains_key(id))
                .map(|(&id, &rank)| ActivityRow {
                    activity_id: id,
                    activity_name: activities::translate(id),
                    required_level: None,
                    granted_rank: Some(rank),
                    status: ActivityStatus::Unused,
                }),
        );

        // Problems first, then by id.
        rows.sort_by_key(|r| {
            (
                r.status == ActivityStatus::Unused,
                r.status == ActivityStatus::Satisfied,
                r.activity_id,
            )
        });

        PermissionReport {
            groups: held.groups,
            required: required.len(),
            rows,
            fetch_time,
        }
    }

    pub fn missing(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| {
                matches!(
                    r.status,
                    ActivityStatus::Missing | ActivityStatus::Insufficient
                )
            })
            .count()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push('\n');
        out.push_str("╔══════════════════════════════════════════════════════════════╗\n");
        out.push_str("║                    LADOK PERMISSION REPORT                   ║\n");
        out.push_str("╠══════════════════════════════════════════════════════════════╣\n");
        out.push_str(&format!("║  Held groups:        {:>39} ║\n", self.groups));
        out.push_str(&format!("║  Required:           {:>39} ║\n", self.required));
        out.push_str(&format!("║  Missing:            {:>39} ║\n", self.missing()));
        out.push_str(&format!("║  Fetch time:         {:>39?} ║\n", self.fetch_time));
        out.push_str("╠══════════════════════════════════════════════════════════════╣\n");

        if self.rows.is_empty() {
            out.push_str("║  No activities granted or required.                          ║\n");
        } else {
            for row in &self.rows {
                let required = row.required_level.as_deref().unwrap_or("-");
                let granted = row
                    .granted_rank
                    .map_or_else(|| "-".to_string(), |r| r.to_string());
                out.push_str(&format!(
                    "║  [{:<7}] {:>6} {:<24} req {:<22} held {}\n",
                    row.status, row.activity_id, row.activity_name, required, granted
                ));
            }
        }

        out.push_str("╚══════════════════════════════════════════════════════════════╝\n");
        out
    }
}
