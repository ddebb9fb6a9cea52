//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Translate core records into flat string DTOs and response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Failures carry a stable `error_code` (`ErrorKind` codes plus
//!   `invalid_config`) and a human-readable message.
//! - At most one core instance per process. It is opened on first use or by
//!   `core_open`, and released by `core_close`.
//! - A failed open is not cached; the next call retries.

use log::{info, warn};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use stressmind_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    CoreConfig, EmergencyContact, ErrorKind, MoodCategory, MoodEntry, MoodSummary, RepoError,
    ShareMethod, SharedContact, Timeframe, WellbeingService, CRISIS_RESOURCES, SUGGESTED_TAGS,
};
use uuid::Uuid;

const INVALID_CONFIG_CODE: &str = "invalid_config";

static CORE: Mutex<Option<Core>> = Mutex::new(None);

struct Core {
    data_dir: PathBuf,
    service: Arc<WellbeingService>,
}

#[derive(Debug)]
struct OpenFailure {
    code: &'static str,
    message: String,
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Opens the core at an explicit app data directory.
///
/// Call before any other data function to override the environment-derived
/// location. Returns empty string on success and an error message otherwise.
///
/// # FFI contract
/// - Idempotent for the same directory.
/// - While the core is open, a different directory is rejected; call
///   `core_close` first to switch.
#[flutter_rust_bridge::frb(sync)]
pub fn core_open(data_dir: String) -> String {
    let requested = PathBuf::from(data_dir.trim());
    if !requested.is_absolute() {
        return format!("data_dir must be an absolute path, got `{}`", data_dir.trim());
    }

    let mut slot = lock_core();
    if let Some(core) = slot.as_ref() {
        if core.data_dir == requested {
            return String::new();
        }
        return format!(
            "core already open at `{}`; refusing to switch to `{}`",
            core.data_dir.display(),
            requested.display()
        );
    }
    match open_core(Ok(CoreConfig::with_data_dir(requested))) {
        Ok(core) => {
            *slot = Some(core);
            String::new()
        }
        Err(failure) => failure.message,
    }
}

/// Releases the process-wide core. Returns whether one was open.
///
/// # FFI contract
/// - Safe to call when nothing is open.
/// - Calls already in flight keep their handle; storage is released once the
///   last of them returns.
#[flutter_rust_bridge::frb(sync)]
pub fn core_close() -> bool {
    let closed = lock_core().take().is_some();
    if closed {
        info!("event=ffi_core_close module=ffi status=ok");
    }
    closed
}

/// Mood journal entry projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodEntryItem {
    /// Stable entry ID in string form.
    pub id: String,
    /// RFC 3339 UTC timestamp.
    pub timestamp: String,
    pub timestamp_epoch_ms: i64,
    /// Mood key (`very_happy|happy|okay|sad|stressed|anxious|angry`).
    pub mood: String,
    pub mood_label: String,
    pub emoji: String,
    pub note: String,
    pub tags: Vec<String>,
}

/// Emergency contact projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactItem {
    pub id: String,
    pub name: String,
    pub relationship: String,
    pub phone_number: String,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedContactItem {
    pub name: String,
    pub relationship: String,
    /// Share method key (`sms|email|in_person`).
    pub share_method: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodCategoryItem {
    pub key: String,
    pub label: String,
    pub emoji: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrisisResourceItem {
    pub name: String,
    pub number: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodCountItem {
    pub mood: String,
    pub label: String,
    pub count: u32,
}

/// Generic action response envelope for mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Created or affected record ID, when there is one.
    pub id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
    /// Stable failure classification; `None` on success.
    pub error_code: Option<String>,
}

impl ActionResponse {
    fn success(message: impl Into<String>, id: Option<String>) -> Self {
        Self {
            ok: true,
            id,
            message: message.into(),
            error_code: None,
        }
    }

    fn failure(code: &str, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
            error_code: Some(code.to_string()),
        }
    }

    fn from_repo_error(op: &str, err: RepoError) -> Self {
        let code = err.kind().code();
        warn!("event=ffi_call module=ffi status=error op={op} error_code={code}");
        Self::failure(code, format!("{op} failed: {err}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodListResponse {
    pub ok: bool,
    /// Newest-first.
    pub items: Vec<MoodEntryItem>,
    pub message: String,
    pub error_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactListResponse {
    pub ok: bool,
    pub items: Vec<ContactItem>,
    pub message: String,
    pub error_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharingSettingsResponse {
    pub ok: bool,
    pub enabled: bool,
    /// RFC 3339 UTC timestamp of the last enable.
    pub enabled_at: Option<String>,
    pub shared_with: Vec<SharedContactItem>,
    pub message: String,
    pub error_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodSummaryResponse {
    pub ok: bool,
    pub date_range: String,
    pub total_entries: u32,
    pub breakdown: Vec<MoodCountItem>,
    pub top_tags: Vec<String>,
    pub average_mood: String,
    /// Trend key (`improving|declining|stable|insufficient_data`).
    pub trend: String,
    pub trend_label: String,
    /// Parent-facing text without notes.
    pub shareable_text: String,
    pub message: String,
    pub error_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmergencyCheckResponse {
    pub ok: bool,
    pub triggered: bool,
    pub reason: Option<String>,
    pub message: String,
    pub error_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResponse {
    pub ok: bool,
    pub text: String,
    pub message: String,
    pub error_code: Option<String>,
}

/// Lists mood entries newest-first.
///
/// # FFI contract
/// - Sync call, reads the in-memory snapshot.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn mood_list() -> MoodListResponse {
    match service() {
        Ok(service) => {
            let items = service
                .list_mood_entries()
                .iter()
                .map(to_mood_entry_item)
                .collect::<Vec<_>>();
            MoodListResponse {
                ok: true,
                message: format!("{} entr(y/ies).", items.len()),
                items,
                error_code: None,
            }
        }
        Err(failure) => MoodListResponse {
            ok: false,
            items: Vec::new(),
            message: failure.message,
            error_code: Some(failure.code.to_string()),
        },
    }
}

/// Logs a new mood entry stamped with the current time.
///
/// `mood` accepts a key (`very_happy`) or a label (`Very Happy`).
///
/// # FFI contract
/// - Sync call, encrypts and persists the whole journal.
/// - Never panics.
/// - Returns created entry ID on success.
#[flutter_rust_bridge::frb(sync)]
pub fn mood_add(mood: String, note: String, tags: Vec<String>) -> ActionResponse {
    let service = match service() {
        Ok(service) => service,
        Err(failure) => return ActionResponse::failure(failure.code, failure.message),
    };
    let mood = match mood.parse::<MoodCategory>() {
        Ok(mood) => mood,
        Err(err) => return ActionResponse::failure(ErrorKind::Validation.code(), err.to_string()),
    };

    match service.add_mood_entry(MoodEntry::new(mood, note, tags)) {
        Ok(id) => ActionResponse::success("Mood logged.", Some(id.to_string())),
        Err(err) => ActionResponse::from_repo_error("mood_add", err),
    }
}

/// Edits mood, note and tags of an existing entry; its timestamp is kept.
#[flutter_rust_bridge::frb(sync)]
pub fn mood_update(id: String, mood: String, note: String, tags: Vec<String>) -> ActionResponse {
    let service = match service() {
        Ok(service) => service,
        Err(failure) => return ActionResponse::failure(failure.code, failure.message),
    };
    let (id, mood) = match (parse_id(&id), mood.parse::<MoodCategory>()) {
        (Ok(id), Ok(mood)) => (id, mood),
        (Err(message), _) => return ActionResponse::failure(ErrorKind::Validation.code(), message),
        (_, Err(err)) => {
            return ActionResponse::failure(ErrorKind::Validation.code(), err.to_string())
        }
    };
    let edited = service.modify_mood_entry(id, |entry| {
        entry.mood = mood;
        entry.note = note;
        entry.tags = tags;
    });
    match edited {
        Ok(()) => ActionResponse::success("Mood updated.", Some(id.to_string())),
        Err(err) => ActionResponse::from_repo_error("mood_update", err),
    }
}

/// Deletes a mood entry. Deleting an unknown ID succeeds without change.
#[flutter_rust_bridge::frb(sync)]
pub fn mood_delete(id: String) -> ActionResponse {
    let service = match service() {
        Ok(service) => service,
        Err(failure) => return ActionResponse::failure(failure.code, failure.message),
    };
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(message) => return ActionResponse::failure(ErrorKind::Validation.code(), message),
    };
    match service.delete_mood_entry(id) {
        Ok(true) => ActionResponse::success("Mood deleted.", Some(id.to_string())),
        Ok(false) => ActionResponse::success("Nothing to delete.", Some(id.to_string())),
        Err(err) => ActionResponse::from_repo_error("mood_delete", err),
    }
}

/// Lists emergency contacts in insertion order.
#[flutter_rust_bridge::frb(sync)]
pub fn contact_list() -> ContactListResponse {
    match service() {
        Ok(service) => {
            let items = service
                .list_contacts()
                .into_iter()
                .map(to_contact_item)
                .collect::<Vec<_>>();
            ContactListResponse {
                ok: true,
                message: format!("{} contact(s).", items.len()),
                items,
                error_code: None,
            }
        }
        Err(failure) => ContactListResponse {
            ok: false,
            items: Vec::new(),
            message: failure.message,
            error_code: Some(failure.code.to_string()),
        },
    }
}

/// Adds an emergency contact. Name and phone number must be non-blank.
#[flutter_rust_bridge::frb(sync)]
pub fn contact_add(
    name: String,
    relationship: String,
    phone_number: String,
    note: Option<String>,
) -> ActionResponse {
    let service = match service() {
        Ok(service) => service,
        Err(failure) => return ActionResponse::failure(failure.code, failure.message),
    };
    let contact = EmergencyContact::new(name, relationship, phone_number, non_blank(note));
    match service.add_contact(contact) {
        Ok(id) => ActionResponse::success("Contact added.", Some(id.to_string())),
        Err(err) => ActionResponse::from_repo_error("contact_add", err),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn contact_update(
    id: String,
    name: String,
    relationship: String,
    phone_number: String,
    note: Option<String>,
) -> ActionResponse {
    let service = match service() {
        Ok(service) => service,
        Err(failure) => return ActionResponse::failure(failure.code, failure.message),
    };
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(message) => return ActionResponse::failure(ErrorKind::Validation.code(), message),
    };
    let mut contact = EmergencyContact::new(name, relationship, phone_number, non_blank(note));
    contact.id = id;
    match service.update_contact(contact) {
        Ok(()) => ActionResponse::success("Contact updated.", Some(id.to_string())),
        Err(err) => ActionResponse::from_repo_error("contact_update", err),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn contact_delete(id: String) -> ActionResponse {
    let service = match service() {
        Ok(service) => service,
        Err(failure) => return ActionResponse::failure(failure.code, failure.message),
    };
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(message) => return ActionResponse::failure(ErrorKind::Validation.code(), message),
    };
    match service.delete_contact(id) {
        Ok(true) => ActionResponse::success("Contact deleted.", Some(id.to_string())),
        Ok(false) => ActionResponse::success("Nothing to delete.", Some(id.to_string())),
        Err(err) => ActionResponse::from_repo_error("contact_delete", err),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn sharing_get() -> SharingSettingsResponse {
    match service() {
        Ok(service) => {
            let settings = service.get_sharing_settings();
            SharingSettingsResponse {
                ok: true,
                enabled: settings.enabled,
                enabled_at: settings.enabled_at.map(|at| at.to_rfc3339()),
                shared_with: settings
                    .shared_with
                    .into_iter()
                    .map(|contact| SharedContactItem {
                        name: contact.name,
                        relationship: contact.relationship,
                        share_method: contact.share_method.key().to_string(),
                    })
                    .collect(),
                message: String::new(),
                error_code: None,
            }
        }
        Err(failure) => SharingSettingsResponse {
            ok: false,
            enabled: false,
            enabled_at: None,
            shared_with: Vec::new(),
            message: failure.message,
            error_code: Some(failure.code.to_string()),
        },
    }
}

/// Enables parental sharing with exactly one contact.
///
/// `share_method` accepts `sms|email|in_person` or the display label.
#[flutter_rust_bridge::frb(sync)]
pub fn sharing_enable(name: String, relationship: String, share_method: String) -> ActionResponse {
    let service = match service() {
        Ok(service) => service,
        Err(failure) => return ActionResponse::failure(failure.code, failure.message),
    };
    let method = match share_method.parse::<ShareMethod>() {
        Ok(method) => method,
        Err(err) => return ActionResponse::failure(ErrorKind::Validation.code(), err.to_string()),
    };
    match service.enable_sharing(SharedContact::new(name, relationship, method)) {
        Ok(()) => ActionResponse::success("Sharing enabled.", None),
        Err(err) => ActionResponse::from_repo_error("sharing_enable", err),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn sharing_disable() -> ActionResponse {
    match service() {
        Ok(service) => match service.disable_sharing() {
            Ok(()) => ActionResponse::success("Sharing disabled.", None),
            Err(err) => ActionResponse::from_repo_error("sharing_disable", err),
        },
        Err(failure) => ActionResponse::failure(failure.code, failure.message),
    }
}

/// Summarizes moods over `days` (7, 14, 30 or 90; default 14).
#[flutter_rust_bridge::frb(sync)]
pub fn mood_summary(days: Option<u32>) -> MoodSummaryResponse {
    let timeframe = match days {
        None => Timeframe::default(),
        Some(days) => match Timeframe::from_days(i64::from(days)) {
            Some(timeframe) => timeframe,
            None => {
                return summary_failure(
                    ErrorKind::Validation.code(),
                    format!("unsupported timeframe: {days} days; expected 7|14|30|90"),
                )
            }
        },
    };

    match service() {
        Ok(service) => to_summary_response(service.summarize_mood(timeframe)),
        Err(failure) => summary_failure(failure.code, failure.message),
    }
}

/// Runs the parental check-in heuristic over the latest entries.
#[flutter_rust_bridge::frb(sync)]
pub fn emergency_check() -> EmergencyCheckResponse {
    match service() {
        Ok(service) => match service.check_emergency_trigger() {
            Some(alert) => EmergencyCheckResponse {
                ok: true,
                triggered: true,
                reason: Some(alert.reason.code().to_string()),
                message: alert.message,
                error_code: None,
            },
            None => EmergencyCheckResponse {
                ok: true,
                triggered: false,
                reason: None,
                message: String::new(),
                error_code: None,
            },
        },
        Err(failure) => EmergencyCheckResponse {
            ok: false,
            triggered: false,
            reason: None,
            message: failure.message,
            error_code: Some(failure.code.to_string()),
        },
    }
}

/// Returns the plain-text export of every stored record.
#[flutter_rust_bridge::frb(sync)]
pub fn data_export() -> ExportResponse {
    match service() {
        Ok(service) => ExportResponse {
            ok: true,
            text: service.export_all_data(),
            message: "Export ready.".to_string(),
            error_code: None,
        },
        Err(failure) => ExportResponse {
            ok: false,
            text: String::new(),
            message: failure.message,
            error_code: Some(failure.code.to_string()),
        },
    }
}

/// Deletes all mood entries and emergency contacts.
#[flutter_rust_bridge::frb(sync)]
pub fn data_delete_all() -> ActionResponse {
    match service() {
        Ok(service) => match service.delete_all_data() {
            Ok(()) => ActionResponse::success("All data deleted.", None),
            Err(err) => ActionResponse::from_repo_error("data_delete_all", err),
        },
        Err(failure) => ActionResponse::failure(failure.code, failure.message),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn mood_categories() -> Vec<MoodCategoryItem> {
    MoodCategory::ALL
        .into_iter()
        .map(|mood| MoodCategoryItem {
            key: mood.key().to_string(),
            label: mood.label().to_string(),
            emoji: mood.emoji().to_string(),
        })
        .collect()
}

#[flutter_rust_bridge::frb(sync)]
pub fn suggested_tags() -> Vec<String> {
    SUGGESTED_TAGS.iter().map(|tag| tag.to_string()).collect()
}

#[flutter_rust_bridge::frb(sync)]
pub fn crisis_resources() -> Vec<CrisisResourceItem> {
    CRISIS_RESOURCES
        .iter()
        .map(|resource| CrisisResourceItem {
            name: resource.name.to_string(),
            number: resource.number.to_string(),
            description: resource.description.to_string(),
        })
        .collect()
}

fn service() -> Result<Arc<WellbeingService>, OpenFailure> {
    let mut slot = lock_core();
    if let Some(core) = slot.as_ref() {
        return Ok(core.service.clone());
    }
    let core = open_core(CoreConfig::from_env())?;
    let service = core.service.clone();
    *slot = Some(core);
    Ok(service)
}

fn lock_core() -> MutexGuard<'static, Option<Core>> {
    CORE.lock().unwrap_or_else(PoisonError::into_inner)
}

fn open_core(config: Result<CoreConfig, stressmind_core::ConfigError>) -> Result<Core, OpenFailure> {
    let config = config.map_err(|err| OpenFailure {
        code: INVALID_CONFIG_CODE,
        message: format!("core config invalid: {err}"),
    })?;
    match WellbeingService::open(&config) {
        Ok(service) => Ok(Core {
            data_dir: config.data_dir,
            service: Arc::new(service),
        }),
        Err(err) => {
            let code = err.kind().code();
            warn!("event=ffi_core_open module=ffi status=error error_code={code}");
            Err(OpenFailure {
                code,
                message: format!("core open failed: {err}"),
            })
        }
    }
}

fn parse_id(raw: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw.trim()).map_err(|err| format!("invalid id `{}`: {err}", raw.trim()))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn to_mood_entry_item(entry: &MoodEntry) -> MoodEntryItem {
    MoodEntryItem {
        id: entry.id.to_string(),
        timestamp: entry.timestamp.to_rfc3339(),
        timestamp_epoch_ms: entry.timestamp.timestamp_millis(),
        mood: entry.mood.key().to_string(),
        mood_label: entry.mood.label().to_string(),
        emoji: entry.mood.emoji().to_string(),
        note: entry.note.clone(),
        tags: entry.tags.clone(),
    }
}

fn to_contact_item(contact: EmergencyContact) -> ContactItem {
    ContactItem {
        id: contact.id.to_string(),
        name: contact.name,
        relationship: contact.relationship,
        phone_number: contact.phone_number,
        note: contact.note,
    }
}

fn to_summary_response(summary: MoodSummary) -> MoodSummaryResponse {
    let shareable_text = summary.shareable_text();
    MoodSummaryResponse {
        ok: true,
        breakdown: summary
            .mood_breakdown
            .iter()
            .map(|(mood, count)| MoodCountItem {
                mood: mood.key().to_string(),
                label: mood.label().to_string(),
                count: u32::try_from(*count).unwrap_or(u32::MAX),
            })
            .collect(),
        total_entries: u32::try_from(summary.total_entries).unwrap_or(u32::MAX),
        trend: summary.trend.key().to_string(),
        trend_label: summary.trend.label().to_string(),
        date_range: summary.date_range,
        top_tags: summary.top_tags,
        average_mood: summary.average_mood,
        shareable_text,
        message: String::new(),
        error_code: None,
    }
}

fn summary_failure(code: &str, message: String) -> MoodSummaryResponse {
    MoodSummaryResponse {
        ok: false,
        date_range: String::new(),
        total_entries: 0,
        breakdown: Vec::new(),
        top_tags: Vec::new(),
        average_mood: String::new(),
        trend: String::new(),
        trend_label: String::new(),
        shareable_text: String::new(),
        message,
        error_code: Some(code.to_string()),
    }
}
