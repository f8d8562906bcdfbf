use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::profile::Profile;

/// One user's completions for one calendar date. Created on the first
/// completion of the day, amended by set-union append afterward.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyActivity {
    pub user_id: Uuid,
    pub activity_date: NaiveDate,
    pub duas_completed: BTreeSet<i64>,
    pub xp_earned: i32,
}

/// Result of recording a completion: the day's activity plus the profile as
/// it stands after any XP/streak changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompletionOutcome {
    pub profile: Profile,
    pub activity: DailyActivity,
    /// False when the dua was already completed on this date; repeats award
    /// no XP and leave the streak alone.
    pub newly_completed: bool,
    pub xp_awarded: i32,
}
