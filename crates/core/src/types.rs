//! Domain types for the Ladok client.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Feed
// ---------------------------------------------------------------------------

/// A decoded page of events. Immutable once built by the decoder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Feed {
    pub id: u64,
    /// Document order.
    pub events: Vec<UnifiedEvent>,
    /// Entries in the source document, recognized or not.
    pub entries: usize,
}

impl Feed {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Entries dropped because they carried no recognized event.
    pub fn skipped(&self) -> usize {
        self.entries.saturating_sub(self.events.len())
    }
}

/// Business event categories carried by the feed.
///
/// Declaration order is the decoder's dispatch priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    UserChanged,
    UserCreated,
    ExternalParty,
    ContactDetailsChanged,
    ModuleResultCertified,
    CourseResultCertified,
    LocalStudent,
}

impl EventKind {
    pub const ALL: [EventKind; 7] = [
        EventKind::UserChanged,
        EventKind::UserCreated,
        EventKind::ExternalParty,
        EventKind::ContactDetailsChanged,
        EventKind::ModuleResultCertified,
        EventKind::CourseResultCertified,
        EventKind::LocalStudent,
    ];

    /// Wire name of the event element.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::UserChanged => "AnvandareAndradEvent",
            EventKind::UserCreated => "AnvandareSkapadEvent",
            EventKind::ExternalParty => "ExternPartEvent",
            EventKind::ContactDetailsChanged => "KontaktuppgifterEvent",
            EventKind::ModuleResultCertified => "ResultatPaModulAttesteratEvent",
            EventKind::CourseResultCertified => "ResultatPaHelKursAttesteratEvent",
            EventKind::LocalStudent => "LokalStudentEvent",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Actor and institution behind an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventContext {
    pub actor_uid: String,
    pub actor_name: String,
    pub institution_id: String,
}

/// One normalized feed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnifiedEvent {
    /// Opaque `<entry><id>` of the source entry.
    pub entry_id: String,
    pub handelse_uid: String,
    pub context: EventContext,
    pub payload: EventPayload,
}

impl UnifiedEvent {
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    /// Student the event concerns, for kinds that carry one.
    pub fn student_uid(&self) -> Option<&str> {
        match &self.payload {
            EventPayload::ContactDetailsChanged(c) => Some(&c.student_uid),
            EventPayload::LocalStudent(s) => Some(&s.student_uid),
            EventPayload::ModuleResultCertified(r) | EventPayload::CourseResultCertified(r) => {
                Some(&r.student_uid)
            }
            EventPayload::UserChanged(_)
            | EventPayload::UserCreated(_)
            | EventPayload::ExternalParty(_) => None,
        }
    }
}

/// Kind-specific part of an event. Exactly one per entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event_type_name", content = "data")]
pub enum EventPayload {
    #[serde(rename = "AnvandareAndradEvent")]
    UserChanged(UserDetails),
    #[serde(rename = "AnvandareSkapadEvent")]
    UserCreated(UserDetails),
    #[serde(rename = "ExternPartEvent")]
    ExternalParty(ExternalParty),
    #[serde(rename = "KontaktuppgifterEvent")]
    ContactDetailsChanged(ContactDetails),
    #[serde(rename = "ResultatPaModulAttesteratEvent")]
    ModuleResultCertified(ResultDetails),
    #[serde(rename = "ResultatPaHelKursAttesteratEvent")]
    CourseResultCertified(ResultDetails),
    #[serde(rename = "LokalStudentEvent")]
    LocalStudent(LocalStudent),
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::UserChanged(_) => EventKind::UserChanged,
            EventPayload::UserCreated(_) => EventKind::UserCreated,
            EventPayload::ExternalParty(_) => EventKind::ExternalParty,
            EventPayload::ContactDetailsChanged(_) => EventKind::ContactDetailsChanged,
            EventPayload::ModuleResultCertified(_) => EventKind::ModuleResultCertified,
            EventPayload::CourseResultCertified(_) => EventKind::CourseResultCertified,
            EventPayload::LocalStudent(_) => EventKind::LocalStudent,
        }
    }
}

/// A system account (user created/changed).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserDetails {
    pub user_uid: String,
    pub username: String,
    pub given_name: String,
    pub surname: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactDetails {
    pub handelsetyp: String,
    pub student_uid: String,
    pub email: String,
    pub phone: String,
    /// Most students have one or two addresses on file.
    pub addresses: SmallVec<[PostalAddress; 2]>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PostalAddress {
    pub country: String,
    pub address_type: String,
    pub postal_code: String,
    pub city: String,
    pub street: String,
    pub care_of: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LocalStudent {
    pub handelsetyp: String,
    pub student_uid: String,
    pub external_student_uid: String,
    pub given_name: String,
    pub surname: String,
    pub birth_date: String,
    pub gender: String,
    pub personal_identity_number: String,
}

/// An external party (partner institution, agency) descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExternalParty {
    pub id: String,
    pub code: String,
    pub event_type: String,
    pub validity_period: String,
    pub country_id: String,
    pub party_type_id: String,
    pub names: Vec<LocalizedText>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LocalizedText {
    pub language: String,
    pub text: String,
}

/// A certified result, either on a module or on a whole course.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultDetails {
    pub student_uid: String,
    pub course_uid: String,
    pub course_instance_uid: String,
    pub course_occasion_uid: String,
    pub education_instance_uid: String,
    pub decision: DecisionRecord,
    pub result: ResultRecord,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecisionRecord {
    pub decision_uid: String,
    pub decided_on: String,
    pub decided_by: String,
    pub decided_by_uid: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultRecord {
    pub result_uid: String,
    pub grade_id: String,
    pub grading_scale_id: String,
    pub examination_date: String,
    pub valid_as_final_grade: String,
    pub scope_credits: String,
    pub achieved_credits: String,
}

// ---------------------------------------------------------------------------
// Permissions
// ---------------------------------------------------------------------------

/// Numeric identifier of a protected system activity.
pub type ActivityId = i64;

/// Identifier of a remote permission group (`behorighetsprofil`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub String);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Caller input: activity id -> required level name.
pub type Permissions = BTreeMap<ActivityId, String>;

/// One `(activity, level)` pair from a permission-group definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityGrant {
    #[serde(rename = "ID", alias = "Id")]
    pub activity_id: ActivityId,
    #[serde(rename = "Rattighetsniva")]
    pub level: String,
}

impl ActivityGrant {
    pub fn new(activity_id: ActivityId, level: impl Into<String>) -> Self {
        Self {
            activity_id,
            level: level.into(),
        }
    }
}

/// Both sides of one activity during reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GrantEntry {
    /// Highest level granted across all held groups.
    pub granted: Option<i64>,
    pub required: Option<i64>,
}

/// Intermediate reconciliation state, ordered by activity id.
pub type PermissionGrants = BTreeMap<ActivityId, GrantEntry>;

// ---------------------------------------------------------------------------
// Remote permission documents (kataloginformation)
// ---------------------------------------------------------------------------

/// Body of `anvandarbehorighet/egna`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HeldPermissionsDocument {
    #[serde(rename = "Anvandarbehorighet")]
    pub anvandarbehorighet: Vec<Anvandarbehorighet>,
}

impl HeldPermissionsDocument {
    /// Group identifiers in document order, duplicates removed.
    pub fn group_ids(&self) -> Vec<GroupId> {
        let mut ids: Vec<GroupId> = Vec::with_capacity(self.anvandarbehorighet.len());
        for held in &self.anvandarbehorighet {
            let uid = &held.behorighetsprofil_ref.uid;
            if uid.is_empty() || ids.iter().any(|g| &g.0 == uid) {
                continue;
            }
            ids.push(GroupId(uid.clone()));
        }
        ids
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Anvandarbehorighet {
    #[serde(rename = "Uid")]
    pub uid: String,
    #[serde(rename = "BehorighetsprofilRef")]
    pub behorighetsprofil_ref: ProfileRef,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProfileRef {
    #[serde(rename = "Uid")]
    pub uid: String,
}

/// Body of `behorighetsprofil/{uid}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PermissionProfileDocument {
    #[serde(rename = "Uid")]
    pub uid: String,
    #[serde(rename = "Systemaktiviteter")]
    pub systemaktiviteter: Vec<ActivityGrant>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kind_names_are_wire_names() {
        assert_eq!(EventKind::UserChanged.as_str(), "AnvandareAndradEvent");
        assert_eq!(
            EventKind::CourseResultCertified.to_string(),
            "ResultatPaHelKursAttesteratEvent"
        );
    }

    #[test]
    fn payload_serializes_with_wire_tag() {
        let payload = EventPayload::UserCreated(UserDetails {
            user_uid: "u-1".into(),
            ..Default::default()
        });
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["event_type_name"], "AnvandareSkapadEvent");
        assert_eq!(json["data"]["user_uid"], "u-1");
    }

    #[test]
    fn held_groups_skip_blank_and_duplicate_uids() {
        let body = r#"{
            "Anvandarbehorighet": [
                {"Uid": "a1", "BehorighetsprofilRef": {"Uid": "11111111-2222-0000-0000-000000000000"}},
                {"Uid": "a2", "BehorighetsprofilRef": {"Uid": "11111111-2222-0000-0000-000000000000"}},
                {"Uid": "a3", "BehorighetsprofilRef": {}},
                {"Uid": "a4", "BehorighetsprofilRef": {"Uid": "22222222-2222-0000-0000-000000000000"}}
            ]
        }"#;
        let doc: HeldPermissionsDocument = serde_json::from_str(body).unwrap();
        assert_eq!(
            doc.group_ids(),
            vec![
                GroupId::from("11111111-2222-0000-0000-000000000000"),
                GroupId::from("22222222-2222-0000-0000-000000000000"),
            ]
        );
    }

    #[test]
    fn profile_document_yields_activity_grants() {
        let body = r#"{
            "Uid": "11111111-2222-0000-0000-000000000000",
            "Systemaktiviteter": [
                {"ID": 61001, "Rattighetsniva": "rattighetsniva.las"},
                {"ID": 90019, "Rattighetsniva": "rattighetsniva.lokal"}
            ]
        }"#;
        let doc: PermissionProfileDocument = serde_json::from_str(body).unwrap();
        assert_eq!(
            doc.systemaktiviteter,
            vec![
                ActivityGrant::new(61001, "rattighetsniva.las"),
                ActivityGrant::new(90019, "rattighetsniva.lokal"),
            ]
        );
    }

    #[test]
    fn student_uid_only_for_student_kinds() {
        let event = UnifiedEvent {
            entry_id: "e".into(),
            handelse_uid: "h".into(),
            context: EventContext::default(),
            payload: EventPayload::UserChanged(UserDetails::default()),
        };
        assert!(event.student_uid().is_none());
    }
}
