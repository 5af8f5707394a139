// ═══════════════════════════════════════════════════════════════════
// Storage Tests — key-value backends and the typed LocalCache
// ═══════════════════════════════════════════════════════════════════

use chrono::{TimeZone, Utc};
use std::sync::Arc;

use pocket_ledger_core::errors::CoreError;
use pocket_ledger_core::models::advertisement::Advertisement;
use pocket_ledger_core::models::transaction::{PaymentMethod, Transaction, TransactionType};
use pocket_ledger_core::models::user::{UserProfile, UserRole};
use pocket_ledger_core::storage::backend::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
use pocket_ledger_core::storage::cache::{
    legacy_tx_key, mirror_tx_key, LocalCache, ADS_KEY, SESSION_KEY, USERS_KEY,
};

fn user(email: &str, name: &str) -> UserProfile {
    UserProfile {
        email: email.into(),
        name: name.into(),
        mobile: String::new(),
        pass: "pw".into(),
        role: UserRole::User,
        username: String::new(),
        avatar: "👤".into(),
        bio: None,
    }
}

fn tx(id: &str, amount: f64) -> Transaction {
    Transaction {
        id: id.into(),
        user_id: "alice".into(),
        description: format!("entry {id}"),
        amount,
        kind: TransactionType::Expense,
        method: PaymentMethod::Cash,
        date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

// ═══════════════════════════════════════════════════════════════════
//  MemoryKeyValueStore
// ═══════════════════════════════════════════════════════════════════

mod memory_backend {
    use super::*;

    #[test]
    fn set_get_remove() {
        let store = MemoryKeyValueStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v".into()).unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn removing_absent_key_succeeds() {
        let store = MemoryKeyValueStore::new();
        assert!(store.remove("nothing").is_ok());
    }

    #[test]
    fn keys_are_sorted() {
        let store = MemoryKeyValueStore::new();
        store.set("b", "1".into()).unwrap();
        store.set("a", "2".into()).unwrap();
        assert_eq!(store.keys().unwrap(), vec!["a".to_string(), "b".to_string()]);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  FileKeyValueStore
// ═══════════════════════════════════════════════════════════════════

mod file_backend {
    use super::*;

    #[test]
    fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::open(dir.path().join("cache.json")).unwrap();
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn empty_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "  \n").unwrap();
        let store = FileKeyValueStore::open(&path).unwrap();
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        {
            let store = FileKeyValueStore::open(&path).unwrap();
            store.set(SESSION_KEY, "{\"a\":1}".into()).unwrap();
            store.set("other", "2".into()).unwrap();
            store.remove("other").unwrap();
        }
        let reopened = FileKeyValueStore::open(&path).unwrap();
        assert_eq!(reopened.get(SESSION_KEY).unwrap().as_deref(), Some("{\"a\":1}"));
        assert_eq!(reopened.get("other").unwrap(), None);
        assert_eq!(reopened.path(), path.as_path());
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("cache.json");
        let store = FileKeyValueStore::open(&path).unwrap();
        store.set("k", "v".into()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn malformed_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "[1, 2").unwrap();
        let result = FileKeyValueStore::open(&path);
        assert!(matches!(result, Err(CoreError::Deserialization(_))));
    }

    #[test]
    fn failed_write_leaves_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the parent directory should be
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let store = FileKeyValueStore::open(blocker.join("cache.json")).unwrap();

        assert!(store.set("k", "v".into()).is_err());
        assert_eq!(store.get("k").unwrap(), None);
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn failed_remove_keeps_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let store = FileKeyValueStore::open(&path).unwrap();
        store.set("k", "v".into()).unwrap();

        // Occupy the temp file slot with a directory so the rewrite fails
        std::fs::create_dir(path.with_extension("tmp")).unwrap();
        assert!(store.remove("k").is_err());
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let store = FileKeyValueStore::open(&path).unwrap();
        store.set("k", "v".into()).unwrap();
        assert!(!path.with_extension("tmp").exists());
    }
}

// ═══════════════════════════════════════════════════════════════════
//  LocalCache
// ═══════════════════════════════════════════════════════════════════

mod local_cache {
    use super::*;

    #[test]
    fn key_helpers() {
        assert_eq!(legacy_tx_key("alice"), "GLOBAL_TX_alice");
        assert_eq!(mirror_tx_key("alice"), "W_TX_alice");
        assert_eq!(USERS_KEY, "GLOBAL_WARRICK_USERS");
        assert_eq!(ADS_KEY, "GLOBAL_WARRICK_ADS");
        assert_eq!(SESSION_KEY, "W_SESSION");
    }

    #[test]
    fn read_absent_is_none() {
        let cache = LocalCache::in_memory();
        let value: Option<Vec<String>> = cache.read("missing").unwrap();
        assert!(value.is_none());
        assert!(!cache.contains("missing").unwrap());
    }

    #[test]
    fn read_malformed_is_error() {
        let cache = LocalCache::in_memory();
        cache.backend().set("k", "not json".into()).unwrap();
        let value: Result<Option<Vec<String>>, _> = cache.read("k");
        assert!(matches!(value, Err(CoreError::Deserialization(_))));
    }

    #[test]
    fn session_round_trip_and_clear() {
        let cache = LocalCache::in_memory();
        let alice = user("alice@example.com", "Alice");
        cache.save_session(&alice).unwrap();
        assert_eq!(cache.session().unwrap(), Some(alice));
        cache.clear_session().unwrap();
        assert_eq!(cache.session().unwrap(), None);
    }

    #[test]
    fn malformed_session_surfaces_as_error() {
        let cache = LocalCache::in_memory();
        cache.backend().set(SESSION_KEY, "{\"email\":".into()).unwrap();
        assert!(cache.session().is_err());
    }

    #[test]
    fn upsert_user_matches_on_email() {
        let cache = LocalCache::in_memory();
        cache.upsert_user(&user("a@example.com", "A")).unwrap();
        cache.upsert_user(&user("b@example.com", "B")).unwrap();
        cache.upsert_user(&user("a@example.com", "A2")).unwrap();

        let users = cache.users();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].name, "A2");

        cache.remove_user("a@example.com").unwrap();
        assert_eq!(cache.users().len(), 1);
    }

    #[test]
    fn unreadable_list_degrades_to_empty() {
        let cache = LocalCache::in_memory();
        cache.backend().set(USERS_KEY, "{broken".into()).unwrap();
        assert!(cache.users().is_empty());
        // The next write replaces the broken value
        cache.upsert_user(&user("a@example.com", "A")).unwrap();
        assert_eq!(cache.users().len(), 1);
    }

    #[test]
    fn mirror_is_per_user() {
        let cache = LocalCache::in_memory();
        cache.upsert_mirrored_transaction("alice", &tx("1", 5.0)).unwrap();
        cache.upsert_mirrored_transaction("bob", &tx("2", 7.0)).unwrap();
        assert_eq!(cache.mirrored_transactions("alice").len(), 1);
        assert_eq!(cache.mirrored_transactions("bob")[0].id, "2");
    }

    #[test]
    fn mirror_upsert_replaces_by_id() {
        let cache = LocalCache::in_memory();
        cache.upsert_mirrored_transaction("alice", &tx("1", 5.0)).unwrap();
        cache.upsert_mirrored_transaction("alice", &tx("1", 9.0)).unwrap();
        let mirrored = cache.mirrored_transactions("alice");
        assert_eq!(mirrored.len(), 1);
        assert_eq!(mirrored[0].amount, 9.0);

        cache.remove_mirrored_transaction("alice", "1").unwrap();
        assert!(cache.mirrored_transactions("alice").is_empty());
    }

    #[test]
    fn replace_mirror_overwrites() {
        let cache = LocalCache::in_memory();
        cache.upsert_mirrored_transaction("alice", &tx("old", 1.0)).unwrap();
        cache
            .replace_mirrored_transactions("alice", &[tx("a", 1.0), tx("b", 2.0)])
            .unwrap();
        let ids: Vec<String> = cache
            .mirrored_transactions("alice")
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn legacy_list_is_separate_from_mirror() {
        let cache = LocalCache::in_memory();
        cache.set_legacy_transactions("alice", &[tx("1", 1.0)]).unwrap();
        assert!(cache.mirrored_transactions("alice").is_empty());
        assert_eq!(cache.legacy_transactions("alice").unwrap().map(|l| l.len()), Some(1));
        cache.remove_legacy_transactions("alice").unwrap();
        assert_eq!(cache.legacy_transactions("alice").unwrap(), None);
    }

    #[test]
    fn ads_upsert_and_remove() {
        let cache = LocalCache::in_memory();
        let mut ad = Advertisement::new("Sale", "https://shop.example", "");
        cache.upsert_ad(&ad).unwrap();
        ad.active = false;
        cache.upsert_ad(&ad).unwrap();
        assert_eq!(cache.ads().len(), 1);
        assert!(!cache.ads()[0].active);
        cache.remove_ad(&ad.id).unwrap();
        assert!(cache.ads().is_empty());
    }

    #[test]
    fn clones_share_backend() {
        let cache = LocalCache::in_memory();
        let other = cache.clone();
        other.save_session(&user("a@example.com", "A")).unwrap();
        assert!(cache.contains(SESSION_KEY).unwrap());
    }

    #[test]
    fn file_backed_cache_persists_typed_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        {
            let cache = LocalCache::new(Arc::new(FileKeyValueStore::open(&path).unwrap()));
            cache.upsert_user(&user("a@example.com", "A")).unwrap();
        }
        let cache = LocalCache::new(Arc::new(FileKeyValueStore::open(&path).unwrap()));
        assert_eq!(cache.users()[0].email, "a@example.com");
    }
}
