//! Process-local memory store: profiles, preferences and tasks.
//!
//! Collections are append-only and insertion-ordered. Nothing is persisted.
//! Every operation takes the single store lock for its whole read-modify-write,
//! so task ids derived from the collection length cannot collide.

use std::sync::{Arc, Mutex, MutexGuard};

use recollect_core::records::{
    MemoryCounts, MemoryRecord, MemorySnapshot, Preference, Profile, SearchScope, Task,
    ToolArguments, timestamp_now,
};

/// Keys the store owns on each record; caller-supplied copies are dropped.
const PROFILE_RESERVED_KEYS: [&str; 1] = ["savedAt"];
const PREFERENCE_RESERVED_KEYS: [&str; 1] = ["savedAt"];
const TASK_RESERVED_KEYS: [&str; 2] = ["id", "createdAt"];

#[derive(Debug, Default)]
struct Collections {
    users: Vec<Profile>,
    preferences: Vec<Preference>,
    tasks: Vec<Task>,
}

/// Cheap to clone; clones share the same collections.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Collections> {
        // Append-only data stays consistent even if a writer panicked.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn save_profile(&self, mut fields: ToolArguments) -> Profile {
        for key in PROFILE_RESERVED_KEYS {
            fields.shift_remove(key);
        }
        let profile = Profile {
            fields,
            saved_at: timestamp_now(),
        };
        self.lock().users.push(profile.clone());
        profile
    }

    pub fn set_preference(&self, mut fields: ToolArguments) -> Preference {
        for key in PREFERENCE_RESERVED_KEYS {
            fields.shift_remove(key);
        }
        let preference = Preference {
            fields,
            saved_at: timestamp_now(),
        };
        self.lock().preferences.push(preference.clone());
        preference
    }

    pub fn create_task(&self, mut fields: ToolArguments) -> Task {
        for key in TASK_RESERVED_KEYS {
            fields.shift_remove(key);
        }
        let mut collections = self.lock();
        let task = Task {
            id: collections.tasks.len() as u64 + 1,
            fields,
            created_at: timestamp_now(),
        };
        collections.tasks.push(task.clone());
        task
    }

    /// Case-insensitive substring search over each record's JSON text.
    ///
    /// Results keep insertion order and are concatenated users, preferences,
    /// tasks. Field names are part of the text, so a query of `"title"` matches
    /// every task.
    pub fn search(&self, query: &str, scope: SearchScope) -> Vec<MemoryRecord> {
        let needle = query.to_lowercase();
        let collections = self.lock();
        let mut results = Vec::new();

        if scope.includes_users() {
            results.extend(
                collections
                    .users
                    .iter()
                    .filter(|r| matches_text(*r, &needle))
                    .cloned()
                    .map(MemoryRecord::Profile),
            );
        }
        if scope.includes_preferences() {
            results.extend(
                collections
                    .preferences
                    .iter()
                    .filter(|r| matches_text(*r, &needle))
                    .cloned()
                    .map(MemoryRecord::Preference),
            );
        }
        if scope.includes_tasks() {
            results.extend(
                collections
                    .tasks
                    .iter()
                    .filter(|r| matches_text(*r, &needle))
                    .cloned()
                    .map(MemoryRecord::Task),
            );
        }

        results
    }

    pub fn snapshot(&self) -> MemorySnapshot {
        let collections = self.lock();
        MemorySnapshot {
            users: collections.users.clone(),
            preferences: collections.preferences.clone(),
            tasks: collections.tasks.clone(),
        }
    }

    pub fn counts(&self) -> MemoryCounts {
        let collections = self.lock();
        MemoryCounts {
            users: collections.users.len(),
            preferences: collections.preferences.len(),
            tasks: collections.tasks.len(),
        }
    }
}

fn matches_text<T: serde::Serialize>(record: &T, needle: &str) -> bool {
    match serde_json::to_string(record) {
        Ok(text) => text.to_lowercase().contains(needle),
        Err(err) => {
            tracing::warn!(error = %err, "record could not be serialized for search");
            false
        }
    }
}
