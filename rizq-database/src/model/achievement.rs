use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::profile::Profile;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: i64,
    pub code: String,
    pub title: String,
    pub description: Option<String>,
    pub xp_reward: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAchievement {
    pub user_id: Uuid,
    pub achievement_id: i64,
    pub unlocked_at: DateTime<Utc>,
}

/// Result of an unlock attempt. Unlocks are idempotent on the
/// (user, achievement) key; only a fresh unlock touches the profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnlockOutcome {
    pub newly_unlocked: bool,
    pub profile: Option<Profile>,
}
