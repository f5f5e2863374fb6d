//! Credential persistence through the encrypted file store, including
//! process-restart behavior (a new store instance over the same file).

use chrono::{Duration, Utc};

use flowboard_storage::{
    CredentialStore, EncryptedFileStore, MasterKey, SaveOptions, SESSION_CREDENTIAL,
};

fn master_key() -> MasterKey {
    MasterKey::from_bytes([42u8; 32])
}

#[tokio::test]
async fn credential_survives_restart_under_same_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("secure.json");

    {
        let creds = CredentialStore::new(EncryptedFileStore::open(&path, master_key()));
        creds
            .save(
                SESSION_CREDENTIAL,
                "payload-1",
                SaveOptions {
                    expires_at: Some(Utc::now() + Duration::days(365)),
                    secure: true,
                },
            )
            .await
            .unwrap();
    }

    // "Restart": a fresh store over the same file and key.
    let creds = CredentialStore::new(EncryptedFileStore::open(&path, master_key()));
    assert!(creds.exists(SESSION_CREDENTIAL).await.unwrap());
    assert_eq!(
        creds.read(SESSION_CREDENTIAL).await.as_deref(),
        Some("payload-1")
    );

    creds.remove(SESSION_CREDENTIAL).await.unwrap();
    assert_eq!(creds.read(SESSION_CREDENTIAL).await, None);
}

#[tokio::test]
async fn expired_credential_is_gone_after_restart_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("secure.json");

    {
        let creds = CredentialStore::new(EncryptedFileStore::open(&path, master_key()));
        creds
            .save(
                SESSION_CREDENTIAL,
                "short-lived",
                SaveOptions {
                    expires_at: Some(Utc::now() - Duration::seconds(1)),
                    secure: true,
                },
            )
            .await
            .unwrap();
    }

    let creds = CredentialStore::new(EncryptedFileStore::open(&path, master_key()));
    // Lazy expiry: the probe still sees the record, the read reaps it.
    assert!(creds.exists(SESSION_CREDENTIAL).await.unwrap());
    assert_eq!(creds.read(SESSION_CREDENTIAL).await, None);
    assert!(!creds.exists(SESSION_CREDENTIAL).await.unwrap());
}

#[tokio::test]
async fn wrong_key_reads_as_absent_at_the_credential_layer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("secure.json");

    {
        let creds = CredentialStore::new(EncryptedFileStore::open(&path, master_key()));
        creds
            .save(
                SESSION_CREDENTIAL,
                "payload-1",
                SaveOptions {
                    expires_at: None,
                    secure: true,
                },
            )
            .await
            .unwrap();
    }

    // A different master key cannot unseal the record; the credential
    // layer degrades that to "absent" rather than an error.
    let creds = CredentialStore::new(EncryptedFileStore::open(
        &path,
        MasterKey::from_bytes([7u8; 32]),
    ));
    assert_eq!(creds.read(SESSION_CREDENTIAL).await, None);
}
