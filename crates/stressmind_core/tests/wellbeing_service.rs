use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;
use stressmind_core::{
    CoreConfig, EmergencyContact, ErrorKind, MemoryCredentialStore, MemorySlotStore,
    MoodCategory, MoodEntry, ShareMethod, SharedContact, SlotId, SlotStore, Timeframe,
    WellbeingService,
};

fn in_memory_service() -> (WellbeingService, Arc<MemorySlotStore>) {
    let slots = Arc::new(MemorySlotStore::new());
    let service =
        WellbeingService::with_backends(Arc::new(MemoryCredentialStore::new()), slots.clone())
            .unwrap();
    (service, slots)
}

#[test]
fn on_disk_service_reopens_with_same_records() {
    let dir = tempfile::tempdir().unwrap();
    let config = CoreConfig::with_data_dir(dir.path().join("profile"));

    let service = WellbeingService::open(&config).unwrap();
    let entry_id = service
        .add_mood_entry(MoodEntry::new(
            MoodCategory::Anxious,
            "presentation tomorrow",
            vec!["School".to_string()],
        ))
        .unwrap();
    service
        .add_contact(EmergencyContact::new("Mom", "Parent", "555-0100", None))
        .unwrap();
    drop(service);

    assert!(config.db_path().exists());
    assert!(config.credential_dir().is_dir());

    let reopened = WellbeingService::open(&config).unwrap();
    assert!(reopened.load_issues().is_empty());
    assert_eq!(reopened.list_mood_entries()[0].id, entry_id);
    assert_eq!(reopened.list_contacts()[0].name, "Mom");
}

#[test]
fn lost_key_makes_existing_slots_unreadable_but_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = CoreConfig::with_data_dir(dir.path());

    let service = WellbeingService::open(&config).unwrap();
    service
        .add_mood_entry(MoodEntry::new(MoodCategory::Happy, "", Vec::new()))
        .unwrap();
    drop(service);

    std::fs::remove_dir_all(config.credential_dir()).unwrap();

    let reopened = WellbeingService::open(&config).unwrap();
    assert!(reopened.list_mood_entries().is_empty());
    let issues = reopened.load_issues();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].slot, SlotId::MoodEntries);
    assert_eq!(issues[0].kind, ErrorKind::DecryptionFailed);
}

#[test]
fn export_lists_every_section() {
    let (service, _) = in_memory_service();
    let logged_at = Utc.with_ymd_and_hms(2026, 2, 3, 7, 15, 0).unwrap();
    service
        .add_mood_entry(MoodEntry::at(
            logged_at,
            MoodCategory::VeryHappy,
            "aced the quiz",
            vec!["School".to_string(), "Friends".to_string()],
        ))
        .unwrap();
    service
        .add_contact(EmergencyContact::new("Coach", "Mentor", "555-0111", None))
        .unwrap();
    service
        .enable_sharing(SharedContact::new("Dad", "Parent", ShareMethod::Sms))
        .unwrap();

    let generated_at = logged_at + Duration::days(1);
    let export = service.export_all_data_at(generated_at);

    assert!(export.starts_with("StressMind Data Export\nGenerated: 2026-02-04T07:15:00Z\n\n"));
    assert!(export.contains("=== Mood Entries ===\n2026-02-03T07:15:00Z: Very Happy - aced the quiz\n  Tags: School, Friends\n"));
    assert!(export.contains("=== Emergency Contacts ===\nCoach (Mentor): 555-0111\n"));
    assert!(export.contains("=== Parental Sharing ===\nEnabled: yes\n"));
    assert!(export.contains("Shared with: Dad (Parent) via Text Message\n"));
}

#[test]
fn delete_all_clears_journal_and_contacts_only() {
    let (service, slots) = in_memory_service();
    service
        .add_mood_entry(MoodEntry::new(MoodCategory::Sad, "", Vec::new()))
        .unwrap();
    service
        .add_contact(EmergencyContact::new("Aunt", "Family", "555-0177", None))
        .unwrap();
    service
        .enable_sharing(SharedContact::new("Mom", "Parent", ShareMethod::Email))
        .unwrap();

    service.delete_all_data().unwrap();

    assert!(service.list_mood_entries().is_empty());
    assert!(service.list_contacts().is_empty());
    assert_eq!(slots.read("moodEntries").unwrap(), None);
    assert_eq!(slots.read("emergencyContacts").unwrap(), None);
    assert!(service.get_sharing_settings().enabled);
    assert!(slots.read("parentalSharingSettings").unwrap().is_some());
}

#[test]
fn emergency_trigger_follows_sharing_switch() {
    let (service, _) = in_memory_service();
    let now = Utc.with_ymd_and_hms(2026, 6, 1, 22, 0, 0).unwrap();
    for (minutes_ago, mood) in [
        (1, MoodCategory::Happy),
        (2, MoodCategory::Angry),
        (3, MoodCategory::Sad),
        (4, MoodCategory::Stressed),
        (5, MoodCategory::Anxious),
    ]
    .into_iter()
    .rev()
    {
        service
            .add_mood_entry(MoodEntry::at(
                now - Duration::minutes(minutes_ago),
                mood,
                "",
                Vec::new(),
            ))
            .unwrap();
    }

    assert!(service.check_emergency_trigger_at(now).is_none());
    service
        .enable_sharing(SharedContact::new("Mom", "Parent", ShareMethod::InPerson))
        .unwrap();
    assert!(service.check_emergency_trigger_at(now).is_some());
    service.disable_sharing().unwrap();
    assert!(service.check_emergency_trigger_at(now).is_none());
}

#[test]
fn shareable_summary_never_contains_notes() {
    let (service, _) = in_memory_service();
    service
        .add_mood_entry(MoodEntry::new(
            MoodCategory::Stressed,
            "secret crush drama",
            vec!["Friends".to_string()],
        ))
        .unwrap();

    let text = service.shareable_summary(Timeframe::LastWeek);
    assert!(text.contains("Entries logged: 1"));
    assert!(text.contains("Common themes: Friends"));
    assert!(!text.contains("secret crush drama"));

    let summary = service.summarize_mood(Timeframe::default());
    assert_eq!(summary.date_range, "Last 14 days");
    assert_eq!(summary.average_mood, "Mostly Stressed");
}

#[test]
fn in_place_edits_validate_and_keep_the_record() {
    let (service, _) = in_memory_service();
    let entry_id = service
        .add_mood_entry(MoodEntry::new(MoodCategory::Stressed, "", Vec::new()))
        .unwrap();
    service
        .modify_mood_entry(entry_id, |entry| entry.note = "talked to coach".to_string())
        .unwrap();
    assert_eq!(service.list_mood_entries()[0].note, "talked to coach");

    let contact_id = service
        .add_contact(EmergencyContact::new("Uncle Ray", "Uncle", "555-0150", None))
        .unwrap();
    let err = service
        .modify_contact(contact_id, |contact| contact.name = "  ".to_string())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(service.list_contacts()[0].name, "Uncle Ray");
}
