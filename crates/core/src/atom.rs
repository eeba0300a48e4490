//! Raw Atom feed document as delivered by the `uppfoljning` feed.
//!
//! Mirrors the wire layout closely so any serde backend (the provider uses
//! quick-xml) can populate it. Every entry's `content` carries at most one
//! populated event element, but nothing here enforces that; normalization
//! happens in the engine's decoder.

use serde::Deserialize;

/// Root `<feed>` element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeedDocument {
    /// Feed identifier, e.g. `urn:id:4015`.
    pub id: String,
    pub updated: String,
    #[serde(rename = "link")]
    pub links: Vec<FeedLink>,
    #[serde(rename = "entry")]
    pub entries: Vec<FeedEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeedLink {
    #[serde(rename = "@rel")]
    pub rel: String,
    #[serde(rename = "@href")]
    pub href: String,
}

/// One `<entry>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeedEntry {
    pub id: String,
    pub updated: String,
    pub category: EntryCategory,
    pub content: EntryContent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EntryCategory {
    #[serde(rename = "@term")]
    pub term: String,
    #[serde(rename = "@label")]
    pub label: String,
}

/// The `<content>` slot. One optional field per known event element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EntryContent {
    #[serde(rename = "@type")]
    pub content_type: String,
    #[serde(rename = "AnvandareAndradEvent")]
    pub anvandare_andrad: Option<RawUserEvent>,
    #[serde(rename = "AnvandareSkapadEvent")]
    pub anvandare_skapad: Option<RawUserEvent>,
    #[serde(rename = "KontaktuppgifterEvent")]
    pub kontaktuppgifter: Option<RawContactEvent>,
    #[serde(rename = "ExternPartEvent")]
    pub extern_part: Option<RawExternalPartyEvent>,
    #[serde(rename = "LokalStudentEvent")]
    pub lokal_student: Option<RawLocalStudentEvent>,
    #[serde(rename = "ResultatPaModulAttesteratEvent")]
    pub resultat_pa_modul: Option<RawResultEvent>,
    #[serde(rename = "ResultatPaHelKursAttesteratEvent")]
    pub resultat_pa_hel_kurs: Option<RawResultEvent>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawEventContext {
    #[serde(rename = "AnvandareUID")]
    pub anvandare_uid: String,
    #[serde(rename = "Anvandarnamn")]
    pub anvandarnamn: String,
    #[serde(rename = "LarosateID")]
    pub larosate_id: String,
}

// ---------------------------------------------------------------------------
// Event payloads
// ---------------------------------------------------------------------------

/// Shared by `AnvandareAndradEvent` and `AnvandareSkapadEvent`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawUserEvent {
    #[serde(rename = "HandelseUID")]
    pub handelse_uid: String,
    #[serde(rename = "EventContext")]
    pub event_context: RawEventContext,
    #[serde(rename = "AnvandareUID")]
    pub anvandare_uid: String,
    #[serde(rename = "Anvandarnamnet")]
    pub anvandarnamnet: String,
    #[serde(rename = "Efternamn")]
    pub efternamn: String,
    #[serde(rename = "Fornamn")]
    pub fornamn: String,
    #[serde(rename = "Email")]
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawContactEvent {
    #[serde(rename = "HandelseUID")]
    pub handelse_uid: String,
    #[serde(rename = "EventContext")]
    pub event_context: RawEventContext,
    #[serde(rename = "Handelsetyp")]
    pub handelsetyp: String,
    #[serde(rename = "Epostadress")]
    pub epostadress: String,
    #[serde(rename = "Postadresser")]
    pub postadresser: Vec<RawPostalAddress>,
    #[serde(rename = "StudentUID")]
    pub student_uid: String,
    #[serde(rename = "Telefonnummer")]
    pub telefonnummer: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawPostalAddress {
    #[serde(rename = "Land")]
    pub land: String,
    #[serde(rename = "PostadressTyp")]
    pub postadress_typ: String,
    #[serde(rename = "Postnummer")]
    pub postnummer: String,
    #[serde(rename = "Postort")]
    pub postort: String,
    #[serde(rename = "Utdelningsadress")]
    pub utdelningsadress: String,
    #[serde(rename = "CareOf")]
    pub care_of: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawLocalStudentEvent {
    #[serde(rename = "HandelseUID")]
    pub handelse_uid: String,
    #[serde(rename = "EventContext")]
    pub event_context: RawEventContext,
    #[serde(rename = "Handelsetyp")]
    pub handelsetyp: String,
    #[serde(rename = "Efternamn")]
    pub efternamn: String,
    #[serde(rename = "ExterntStudentUID")]
    pub externt_student_uid: String,
    #[serde(rename = "Fodelsedata")]
    pub fodelsedata: String,
    #[serde(rename = "Fornamn")]
    pub fornamn: String,
    #[serde(rename = "Kon")]
    pub kon: String,
    #[serde(rename = "Personnummer")]
    pub personnummer: String,
    #[serde(rename = "StudentUID")]
    pub student_uid: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawExternalPartyEvent {
    #[serde(rename = "HandelseUID")]
    pub handelse_uid: String,
    #[serde(rename = "EventContext")]
    pub event_context: RawEventContext,
    #[serde(rename = "Benamningar")]
    pub benamningar: RawBenamningar,
    #[serde(rename = "EventTyp")]
    pub event_typ: String,
    #[serde(rename = "Giltighetsperiod")]
    pub giltighetsperiod: String,
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Kod")]
    pub kod: String,
    #[serde(rename = "LandID")]
    pub land_id: String,
    #[serde(rename = "TypAvExternPartID")]
    pub typ_av_extern_part_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawBenamningar {
    #[serde(rename = "Benamning")]
    pub benamning: Vec<RawBenamning>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawBenamning {
    #[serde(rename = "Sprakkod")]
    pub sprakkod: String,
    #[serde(rename = "Text")]
    pub text: String,
}

/// Shared by `ResultatPaModulAttesteratEvent` and
/// `ResultatPaHelKursAttesteratEvent`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawResultEvent {
    #[serde(rename = "HandelseUID")]
    pub handelse_uid: String,
    #[serde(rename = "EventContext")]
    pub event_context: RawEventContext,
    #[serde(rename = "Beslut")]
    pub beslut: RawBeslut,
    #[serde(rename = "KursUID")]
    pub kurs_uid: String,
    #[serde(rename = "KursinstansUID")]
    pub kursinstans_uid: String,
    #[serde(rename = "KurstillfalleUID")]
    pub kurstillfalle_uid: String,
    #[serde(rename = "Resultat")]
    pub resultat: RawResultat,
    #[serde(rename = "StudentUID")]
    pub student_uid: String,
    #[serde(rename = "UtbildningsinstansUID")]
    pub utbildningsinstans_uid: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawBeslut {
    #[serde(rename = "BeslutUID")]
    pub beslut_uid: String,
    #[serde(rename = "Beslutsdatum")]
    pub beslutsdatum: String,
    #[serde(rename = "Beslutsfattare")]
    pub beslutsfattare: String,
    #[serde(rename = "BeslutsfattareUID")]
    pub beslutsfattare_uid: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawResultat {
    #[serde(rename = "BetygsgradID")]
    pub betygsgrad_id: String,
    #[serde(rename = "BetygsskalaID")]
    pub betygsskala_id: String,
    #[serde(rename = "Examinationsdatum")]
    pub examinationsdatum: String,
    #[serde(rename = "GiltigSomSlutbetyg")]
    pub giltig_som_slutbetyg: String,
    #[serde(rename = "OmfattningsPoang")]
    pub omfattnings_poang: String,
    #[serde(rename = "PrestationsPoang")]
    pub prestations_poang: String,
    #[serde(rename = "ResultatUID")]
    pub resultat_uid: String,
}
