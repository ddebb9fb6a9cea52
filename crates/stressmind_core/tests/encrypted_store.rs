use std::sync::Arc;
use stressmind_core::crypto::KEY_ACCOUNT;
use stressmind_core::{
    CredentialStore, EncryptedStore, ErrorKind, FileCredentialStore, KeyStore,
    MemoryCredentialStore, MemorySlotStore, PersistError, SlotId, SlotStore,
};

fn memory_store(slots: Arc<MemorySlotStore>) -> EncryptedStore {
    let keys = Arc::new(KeyStore::new(Arc::new(MemoryCredentialStore::new())));
    EncryptedStore::new(keys, slots)
}

#[test]
fn save_then_load_returns_equal_value() {
    let store = memory_store(Arc::new(MemorySlotStore::new()));
    let journal = vec!["rough test".to_string(), "good practice".to_string()];

    store.save(SlotId::MoodEntries, &journal).unwrap();
    let loaded: Option<Vec<String>> = store.load(SlotId::MoodEntries).unwrap();

    assert_eq!(loaded, Some(journal));
}

#[test]
fn empty_slot_loads_as_none() {
    let store = memory_store(Arc::new(MemorySlotStore::new()));
    let loaded: Option<Vec<String>> = store.load(SlotId::EmergencyContacts).unwrap();
    assert_eq!(loaded, None);
}

#[test]
fn flipping_any_blob_byte_is_detected() {
    let slots = Arc::new(MemorySlotStore::new());
    let store = memory_store(slots.clone());
    store
        .save(SlotId::MoodEntries, &vec!["private".to_string()])
        .unwrap();
    let original = slots.read("moodEntries").unwrap().unwrap();

    // Nonce, ciphertext and tag bytes alike.
    for index in 0..original.len() {
        let mut blob = original.clone();
        blob[index] ^= 0x01;
        slots.write("moodEntries", &blob).unwrap();

        let err = store.load::<Vec<String>>(SlotId::MoodEntries).unwrap_err();
        assert!(
            matches!(err, PersistError::DecryptionFailed { .. }),
            "byte {index} of {} went undetected: {err}",
            original.len()
        );
        assert_eq!(err.kind(), ErrorKind::DecryptionFailed);
    }

    slots.write("moodEntries", &original).unwrap();
    let restored: Option<Vec<String>> = store.load(SlotId::MoodEntries).unwrap();
    assert_eq!(restored, Some(vec!["private".to_string()]));
}

#[test]
fn blob_sealed_under_another_key_does_not_open() {
    let slots = Arc::new(MemorySlotStore::new());
    let writer = memory_store(slots.clone());
    writer.save(SlotId::MoodEntries, &vec![1u8, 2, 3]).unwrap();

    let reader = memory_store(slots);
    let err = reader.load::<Vec<u8>>(SlotId::MoodEntries).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DecryptionFailed);
}

#[test]
fn blob_moved_to_another_slot_does_not_open() {
    let slots = Arc::new(MemorySlotStore::new());
    let store = memory_store(slots.clone());
    store
        .save(SlotId::MoodEntries, &vec!["entry".to_string()])
        .unwrap();

    let blob = slots.read("moodEntries").unwrap().unwrap();
    slots.write("emergencyContacts", &blob).unwrap();

    let err = store
        .load::<Vec<String>>(SlotId::EmergencyContacts)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DecryptionFailed);
}

#[test]
fn payload_of_wrong_shape_is_decoding_failure() {
    let store = memory_store(Arc::new(MemorySlotStore::new()));
    store.save(SlotId::MoodEntries, &"not a list").unwrap();

    let err = store.load::<Vec<u32>>(SlotId::MoodEntries).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DecodingFailed);
}

#[test]
fn key_persists_across_file_credential_store_instances() {
    let dir = tempfile::tempdir().unwrap();
    let slots = Arc::new(MemorySlotStore::new());

    let first = EncryptedStore::new(
        Arc::new(KeyStore::new(Arc::new(FileCredentialStore::new(dir.path())))),
        slots.clone(),
    );
    first
        .save(SlotId::ParentalSharingSettings, &true)
        .unwrap();
    drop(first);

    let second = EncryptedStore::new(
        Arc::new(KeyStore::new(Arc::new(FileCredentialStore::new(dir.path())))),
        slots,
    );
    let loaded: Option<bool> = second.load(SlotId::ParentalSharingSettings).unwrap();
    assert_eq!(loaded, Some(true));
}

#[test]
fn malformed_stored_key_is_key_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let credentials = Arc::new(FileCredentialStore::new(dir.path()));
    credentials.save(KEY_ACCOUNT, &[7u8; 5]).unwrap();

    let store = EncryptedStore::new(
        Arc::new(KeyStore::new(credentials)),
        Arc::new(MemorySlotStore::new()),
    );
    let err = store.save(SlotId::MoodEntries, &0u8).unwrap_err();
    assert!(matches!(err, PersistError::KeyUnavailable(_)));
    assert!(err.kind().is_fatal());
}

#[test]
fn key_is_created_once_and_reloaded_by_a_new_key_store() {
    let credentials = Arc::new(MemoryCredentialStore::new());
    let keys = KeyStore::new(credentials.clone());
    let first = keys.get_or_create_key().unwrap().clone();
    let second = keys.get_or_create_key().unwrap().clone();
    assert_eq!(first, second);

    let reloaded = KeyStore::new(credentials);
    assert_eq!(reloaded.get_or_create_key().unwrap(), &first);
    assert_eq!(format!("{first:?}"), "SymmetricKey(<redacted>)");
}
