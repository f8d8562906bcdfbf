use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use rizq_core::{Result, RizqError};

use crate::{
    cache::{self, PROFILE_TTL},
    database::{Database, sqlx_err},
    model::profile::Profile,
};

#[derive(sqlx::FromRow)]
pub(crate) struct ProfileRow {
    user_id: Uuid,
    display_name: Option<String>,
    streak: i32,
    total_xp: i64,
    level: i64,
    last_active_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

const PROFILE_COLUMNS: &str =
    "user_id, display_name, streak, total_xp, level, last_active_date, created_at, updated_at";

/// Decode a row into the domain model, rejecting values that violate the
/// progression invariants instead of letting them flow into views.
pub(crate) fn to_profile(row: ProfileRow) -> Result<Profile> {
    if row.total_xp < 0 {
        return Err(RizqError::validation(format!(
            "profile {} has negative total_xp {}",
            row.user_id, row.total_xp
        )));
    }
    if row.streak < 0 {
        return Err(RizqError::validation(format!(
            "profile {} has negative streak {}",
            row.user_id, row.streak
        )));
    }
    if row.level < 1 {
        return Err(RizqError::validation(format!(
            "profile {} has level {} below 1",
            row.user_id, row.level
        )));
    }

    Ok(Profile {
        user_id: row.user_id,
        display_name: row.display_name,
        streak: row.streak,
        total_xp: row.total_xp,
        level: row.level,
        last_active_date: row.last_active_date,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// Fetch a profile by user id, through the cache.
pub async fn get_profile(db: &Database, user_id: Uuid) -> Result<Option<Profile>> {
    let key = cache::profile_key(db.cache(), user_id);

    db.cache()
        .get_or_load_json(&key, PROFILE_TTL, || async move {
            let row: Option<ProfileRow> = sqlx::query_as(&format!(
                "SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = $1::uuid"
            ))
            .bind(user_id)
            .fetch_optional(db.pool())
            .await
            .map_err(|e| sqlx_err(e, "profile"))?;

            row.map(to_profile).transpose()
        })
        .await
}

/// Create the profile on first sight of a user, or refresh the display name
/// without disturbing accumulated progress.
pub async fn ensure_profile(
    db: &Database,
    user_id: Uuid,
    display_name: Option<&str>,
) -> Result<Profile> {
    let row: ProfileRow = sqlx::query_as(&format!(
        "INSERT INTO profiles (user_id, display_name)
         VALUES ($1::uuid, $2)
         ON CONFLICT (user_id) DO UPDATE
         SET display_name = COALESCE(EXCLUDED.display_name, profiles.display_name),
             updated_at = NOW()
         RETURNING {PROFILE_COLUMNS}"
    ))
    .bind(user_id)
    .bind(display_name)
    .fetch_one(db.pool())
    .await
    .map_err(|e| sqlx_err(e, "profile"))?;

    let profile = to_profile(row)?;
    db.cache()
        .invalidate(&cache::profile_key(db.cache(), user_id))
        .await;

    Ok(profile)
}

pub async fn set_display_name(db: &Database, user_id: Uuid, name: &str) -> Result<Profile> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RizqError::validation("display name must not be empty"));
    }

    let row: Option<ProfileRow> = sqlx::query_as(&format!(
        "UPDATE profiles
         SET display_name = $2, updated_at = NOW()
         WHERE user_id = $1::uuid
         RETURNING {PROFILE_COLUMNS}"
    ))
    .bind(user_id)
    .bind(name)
    .fetch_optional(db.pool())
    .await
    .map_err(|e| sqlx_err(e, "profile"))?;

    let profile = to_profile(row.ok_or_else(|| RizqError::not_found("profile"))?)?;
    db.cache()
        .invalidate(&cache::profile_key(db.cache(), user_id))
        .await;

    Ok(profile)
}

/// Lock a profile row for the remainder of the transaction, creating it on
/// the fly for first-time users.
pub(crate) async fn lock_profile(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
) -> Result<Profile> {
    sqlx::query("INSERT INTO profiles (user_id) VALUES ($1::uuid) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(&mut **tx)
        .await
        .map_err(|e| sqlx_err(e, "profile"))?;

    let row: ProfileRow = sqlx::query_as(&format!(
        "SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = $1::uuid FOR UPDATE"
    ))
    .bind(user_id)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| sqlx_err(e, "profile"))?;

    to_profile(row)
}

/// Write back recomputed progression values for a locked profile row.
pub(crate) async fn update_progress(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    total_xp: i64,
    level: i64,
    streak: i32,
    last_active_date: Option<NaiveDate>,
) -> Result<Profile> {
    let row: ProfileRow = sqlx::query_as(&format!(
        "UPDATE profiles
         SET total_xp = $2, level = $3, streak = $4, last_active_date = $5::date,
             updated_at = NOW()
         WHERE user_id = $1::uuid
         RETURNING {PROFILE_COLUMNS}"
    ))
    .bind(user_id)
    .bind(total_xp)
    .bind(level)
    .bind(streak)
    .bind(last_active_date)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| sqlx_err(e, "profile"))?;

    to_profile(row)
}
