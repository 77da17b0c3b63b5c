#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use broker_portal_server::auth::{Argon2Hasher, Clock, PasswordHasher};
use broker_portal_server::{AppState, MemoryStore, Role, Settings, User};
use chrono::{DateTime, Duration, Utc};

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(start) }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now = *now + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

pub struct Fixture {
    pub state: AppState,
    pub store: MemoryStore,
    pub clock: Arc<ManualClock>,
    pub admin: User,
    pub adviseur: User,
    pub client: User,
}

pub async fn fixture() -> Fixture {
    let store = MemoryStore::new();
    let hasher = Argon2Hasher::new();

    let admin = store
        .insert_user("admin@riskproactief.nl", &hasher.hash("admin123").unwrap(), "Admin", Role::admin())
        .await
        .unwrap();
    let adviseur = store
        .insert_user("adviseur@riskproactief.nl", &hasher.hash("advies123").unwrap(), "Anne Adviseur", Role::adviseur())
        .await
        .unwrap();
    let client = store
        .insert_user("demo@klant.nl", &hasher.hash("demo123").unwrap(), "Jan Demo", Role::client())
        .await
        .unwrap();

    let clock = Arc::new(ManualClock::new(Utc::now()));
    let config = Settings::new_for_test().expect("Failed to load test config");
    let state = AppState::with_store(&config, Arc::new(store.clone()), clock.clone())
        .expect("state over memory store");

    Fixture {
        state,
        store,
        clock,
        admin,
        adviseur,
        client,
    }
}
