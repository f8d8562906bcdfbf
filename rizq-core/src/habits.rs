//! Client-local habit selections and per-day completion sets.
//!
//! This state has no server authority: it is the user's own habit picks and
//! the offline record of which duas they ticked off today. Values are JSON
//! under a fixed `rizq:` key namespace, one file per key, mirroring the
//! key-prefix convention the cache layer uses for server-side data.

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, RizqError};
use crate::slot::TimeSlot;

const KEY_NAMESPACE: &str = "rizq";

/// A user-added recurring dua outside any journey.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomHabit {
    pub id: Uuid,
    pub dua_id: i64,
    pub time_slot: TimeSlot,
}

/// The user's active journeys and custom habits.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitSelection {
    pub active_journey_ids: BTreeSet<i64>,
    pub custom_habits: Vec<CustomHabit>,
}

/// File-backed key-value store for habit state.
#[derive(Clone, Debug)]
pub struct HabitStore {
    root: PathBuf,
}

impl HabitStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let root = dir.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn load_selection(&self) -> Result<HabitSelection> {
        Ok(self
            .read_key("selection")?
            .unwrap_or_default())
    }

    pub fn save_selection(&self, selection: &HabitSelection) -> Result<()> {
        self.write_key("selection", selection)
    }

    /// The set of dua ids completed on `date`. Missing day means empty set.
    pub fn completions_on(&self, date: NaiveDate) -> Result<BTreeSet<i64>> {
        Ok(self
            .read_key(&format!("completions:{date}"))?
            .unwrap_or_default())
    }

    /// Record `dua_id` as completed on `date`. Set semantics: returns `true`
    /// only when the id was newly added, and a repeat call changes nothing.
    pub fn mark_completed(&self, date: NaiveDate, dua_id: i64) -> Result<bool> {
        let mut completed = self.completions_on(date)?;
        let newly_added = completed.insert(dua_id);
        if newly_added {
            self.write_key(&format!("completions:{date}"), &completed)?;
        }
        Ok(newly_added)
    }

    pub fn clear_completions(&self, date: NaiveDate) -> Result<()> {
        let path = self.key_path(&format!("completions:{date}"));
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn key_path(&self, suffix: &str) -> PathBuf {
        // Keys carry the namespace prefix; `:` is not portable in file
        // names, so the on-disk form swaps it for `_`.
        let key = format!("{KEY_NAMESPACE}:{suffix}").replace(':', "_");
        self.root.join(format!("{key}.json"))
    }

    fn read_key<T>(&self, suffix: &str) -> Result<Option<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let path = self.key_path(suffix);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let parsed = serde_json::from_slice(&bytes).map_err(|e| {
            RizqError::validation(format!("corrupt habit store entry `{suffix}`: {e}"))
        })?;
        Ok(Some(parsed))
    }

    fn write_key<T>(&self, suffix: &str, value: &T) -> Result<()>
    where
        T: Serialize,
    {
        let payload = serde_json::to_vec(value).map_err(|e| {
            RizqError::validation(format!("failed to serialize habit store entry `{suffix}`: {e}"))
        })?;
        fs::write(self.key_path(suffix), payload)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use super::{CustomHabit, HabitSelection, HabitStore};
    use crate::slot::TimeSlot;

    fn temp_store() -> HabitStore {
        let dir = std::env::temp_dir().join(format!("rizq-habits-{}", Uuid::new_v4()));
        HabitStore::open(dir).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_store_yields_defaults() {
        let store = temp_store();
        assert_eq!(store.load_selection().unwrap(), HabitSelection::default());
        assert!(store.completions_on(date(2026, 8, 29)).unwrap().is_empty());
    }

    #[test]
    fn selection_round_trips() {
        let store = temp_store();
        let mut selection = HabitSelection::default();
        selection.active_journey_ids.insert(3);
        selection.active_journey_ids.insert(7);
        selection.custom_habits.push(CustomHabit {
            id: Uuid::new_v4(),
            dua_id: 42,
            time_slot: TimeSlot::Fajr,
        });

        store.save_selection(&selection).unwrap();
        assert_eq!(store.load_selection().unwrap(), selection);
    }

    #[test]
    fn marking_twice_does_not_duplicate() {
        let store = temp_store();
        let today = date(2026, 8, 29);

        assert!(store.mark_completed(today, 10).unwrap());
        assert!(!store.mark_completed(today, 10).unwrap());
        assert!(store.mark_completed(today, 11).unwrap());

        let completed = store.completions_on(today).unwrap();
        assert_eq!(completed.len(), 2);
        assert!(completed.contains(&10) && completed.contains(&11));
    }

    #[test]
    fn days_are_independent() {
        let store = temp_store();
        store.mark_completed(date(2026, 8, 28), 1).unwrap();
        store.mark_completed(date(2026, 8, 29), 2).unwrap();

        assert_eq!(store.completions_on(date(2026, 8, 28)).unwrap().len(), 1);
        assert_eq!(store.completions_on(date(2026, 8, 29)).unwrap().len(), 1);
    }

    #[test]
    fn clearing_a_day_is_idempotent() {
        let store = temp_store();
        let today = date(2026, 8, 29);
        store.mark_completed(today, 5).unwrap();

        store.clear_completions(today).unwrap();
        store.clear_completions(today).unwrap();
        assert!(store.completions_on(today).unwrap().is_empty());
    }
}
