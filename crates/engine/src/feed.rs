//! Event-feed normalization.
//!
//! Turns a raw [`FeedDocument`] into a [`Feed`] of [`UnifiedEvent`]s. Each
//! entry's content is probed for the known event elements in a fixed
//! priority order; the first populated one decides the kind. Entries with
//! no recognized element are dropped so the client keeps working when the
//! remote system starts publishing new kinds.

use ladok_core::atom::{
    EntryContent, FeedEntry, RawContactEvent, RawEventContext, RawExternalPartyEvent,
    RawLocalStudentEvent, RawResultEvent, RawUserEvent,
};
use ladok_core::error::{LadokError, LadokResult};
use ladok_core::types::{
    ContactDetails, DecisionRecord, ExternalParty, LocalStudent, LocalizedText, PostalAddress,
    ResultDetails, ResultRecord, UserDetails,
};
use ladok_core::{EventContext, EventPayload, Feed, FeedDocument, UnifiedEvent};
use ladok_provider::{FeedSelector, LadokProvider};

/// Fetches one feed page and decodes it.
pub async fn fetch_feed(provider: &dyn LadokProvider, selector: FeedSelector) -> LadokResult<Feed> {
    let doc = provider.fetch_feed(selector).await?;
    let feed = decode(&doc)?;
    tracing::info!(%selector, feed_id = feed.id, events = feed.len(), "fetched feed");
    Ok(feed)
}

/// Normalizes a whole document. Fails only on an unparsable feed id.
pub fn decode(doc: &FeedDocument) -> LadokResult<Feed> {
    let id = parse_feed_id(&doc.id)?;

    let mut events = Vec::with_capacity(doc.entries.len());
    let mut skipped = 0usize;

    for entry in &doc.entries {
        match decode_entry(entry) {
            Some(event) => events.push(event),
            None => {
                skipped += 1;
                tracing::debug!(entry_id = %entry.id, "skipping unrecognized feed entry");
            }
        }
    }

    tracing::debug!(feed_id = id, events = events.len(), skipped, "decoded feed");
    Ok(Feed {
        id,
        events,
        entries: doc.entries.len(),
    })
}

/// Normalizes one entry, `None` if its content matches no known kind.
pub fn decode_entry(entry: &FeedEntry) -> Option<UnifiedEvent> {
    SourceEvent::dispatch(&entry.content).map(|source| source.normalize(&entry.id))
}

/// Strips non-numeric decoration (`urn:id:4015`) and parses the rest.
pub fn parse_feed_id(raw: &str) -> LadokResult<u64> {
    raw.trim_matches(|c: char| !c.is_ascii_digit())
        .parse()
        .map_err(|_| LadokError::MalformedFeedIdentifier(raw.to_string()))
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// The one recognized payload of an entry, borrowed from the document.
#[derive(Debug, Clone, Copy)]
enum SourceEvent<'a> {
    UserChanged(&'a RawUserEvent),
    UserCreated(&'a RawUserEvent),
    ExternalParty(&'a RawExternalPartyEvent),
    ContactDetailsChanged(&'a RawContactEvent),
    ModuleResultCertified(&'a RawResultEvent),
    CourseResultCertified(&'a RawResultEvent),
    LocalStudent(&'a RawLocalStudentEvent),
}

impl<'a> SourceEvent<'a> {
    /// First populated element wins; later ones are ignored.
    fn dispatch(content: &'a EntryContent) -> Option<Self> {
        if let Some(e) = &content.anvandare_andrad {
            return Some(SourceEvent::UserChanged(e));
        }
        if let Some(e) = &content.anvandare_skapad {
            return Some(SourceEvent::UserCreated(e));
        }
        if let Some(e) = &content.extern_part {
            return Some(SourceEvent::ExternalParty(e));
        }
        if let Some(e) = &content.kontaktuppgifter {
            return Some(SourceEvent::ContactDetailsChanged(e));
        }
        if let Some(e) = &content.resultat_pa_modul {
            return Some(SourceEvent::ModuleResultCertified(e));
        }
        if let Some(e) = &content.resultat_pa_hel_kurs {
            return Some(SourceEvent::CourseResultCertified(e));
        }
        content
            .lokal_student
            .as_ref()
            .map(SourceEvent::LocalStudent)
    }

    fn normalize(self, entry_id: &str) -> UnifiedEvent {
        let (handelse_uid, context, payload) = match self {
            SourceEvent::UserChanged(e) => (
                &e.handelse_uid,
                &e.event_context,
                EventPayload::UserChanged(user_details(e)),
            ),
            SourceEvent::UserCreated(e) => (
                &e.handelse_uid,
                &e.event_context,
                EventPayload::UserCreated(user_details(e)),
            ),
            SourceEvent::ExternalParty(e) => (
                &e.handelse_uid,
                &e.event_context,
                EventPayload::ExternalParty(external_party(e)),
            ),
            SourceEvent::ContactDetailsChanged(e) => (
                &e.handelse_uid,
                &e.event_context,
                EventPayload::ContactDetailsChanged(contact_details(e)),
            ),
            SourceEvent::ModuleResultCertified(e) => (
                &e.handelse_uid,
                &e.event_context,
                EventPayload::ModuleResultCertified(result_details(e)),
            ),
            SourceEvent::CourseResultCertified(e) => (
                &e.handelse_uid,
                &e.event_context,
                EventPayload::CourseResultCertified(result_details(e)),
            ),
            SourceEvent::LocalStudent(e) => (
                &e.handelse_uid,
                &e.event_context,
                EventPayload::LocalStudent(local_student(e)),
            ),
        };

        UnifiedEvent {
            entry_id: entry_id.to_string(),
            handelse_uid: handelse_uid.clone(),
            context: event_context(context),
            payload,
        }
    }
}

// ---------------------------------------------------------------------------
// Per-kind copies. Structural only, no validation.
// ---------------------------------------------------------------------------

fn event_context(raw: &RawEventContext) -> EventContext {
    EventContext {
        actor_uid: raw.anvandare_uid.clone(),
        actor_name: raw.anvandarnamn.clone(),
        institution_id: raw.larosate_id.clone(),
    }
}

fn user_details(e: &RawUserEvent) -> UserDetails {
    UserDetails {
        user_uid: e.anvandare_uid.clone(),
        username: e.anvandarnamnet.clone(),
        given_name: e.fornamn.clone(),
        surname: e.efternamn.clone(),
        email: e.email.clone(),
    }
}

fn contact_details(e: &RawContactEvent) -> ContactDetails {
    ContactDetails {
        handelsetyp: e.handelsetyp.clone(),
        student_uid: e.student_uid.clone(),
        email: e.epostadress.clone(),
        phone: e.telefonnummer.clone(),
        addresses: e
            .postadresser
            .iter()
            .map(|a| PostalAddress {
                country: a.land.clone(),
                address_type: a.postadress_typ.clone(),
                postal_code: a.postnummer.clone(),
                city: a.postort.clone(),
                street: a.utdelningsadress.clone(),
                care_of: a.care_of.clone(),
            })
            .collect(),
    }
}

fn local_student(e: &RawLocalStudentEvent) -> LocalStudent {
    LocalStudent {
        handelsetyp: e.handelsetyp.clone(),
        student_uid: e.student_uid.clone(),
        external_student_uid: e.externt_student_uid.clone(),
        given_name: e.fornamn.clone(),
        surname: e.efternamn.clone(),
        birth_date: e.fodelsedata.clone(),
        gender: e.kon.clone(),
        personal_identity_number: e.personnummer.clone(),
    }
}

fn external_party(e: &RawExternalPartyEvent) -> ExternalParty {
    ExternalParty {
        id: e.id.clone(),
        code: e.kod.clone(),
        event_type: e.event_typ.clone(),
        validity_period: e.giltighetsperiod.clone(),
        country_id: e.land_id.clone(),
        party_type_id: e.typ_av_extern_part_id.clone(),
        names: e
            .benamningar
            .benamning
            .iter()
            .map(|b| LocalizedText {
                language: b.sprakkod.clone(),
                text: b.text.clone(),
            })
            .collect(),
    }
}

fn result_details(e: &RawResultEvent) -> ResultDetails {
    ResultDetails {
        student_uid: e.student_uid.clone(),
        course_uid: e.kurs_uid.clone(),
        course_instance_uid: e.kursinstans_uid.clone(),
        course_occasion_uid: e.kurstillfalle_uid.clone(),
        education_instance_uid: e.utbildningsinstans_uid.clone(),
        decision: DecisionRecord {
            decision_uid: e.beslut.beslut_uid.clone(),
            decided_on: e.beslut.beslutsdatum.clone(),
            decided_by: e.beslut.beslutsfattare.clone(),
            decided_by_uid: e.beslut.beslutsfattare_uid.clone(),
        },
        result: ResultRecord {
            result_uid: e.resultat.resultat_uid.clone(),
            grade_id: e.resultat.betygsgrad_id.clone(),
            grading_scale_id: e.resultat.betygsskala_id.clone(),
            examination_date: e.resultat.examinationsdatum.clone(),
            valid_as_final_grade: e.resultat.giltig_som_slutbetyg.clone(),
            scope_credits: e.resultat.omfattnings_poang.clone(),
            achieved_credits: e.resultat.prestations_poang.clone(),
        },
    }
}
