use std::collections::BTreeSet;

use chrono::NaiveDate;
use uuid::Uuid;

use rizq_core::{Result, RizqError, progression};

use crate::{
    cache::{ACTIVITY_TTL, activity_key, profile_key},
    database::{Database, sqlx_err},
    impls::profiles,
    model::activity::{CompletionOutcome, DailyActivity},
};

#[derive(sqlx::FromRow)]
struct ActivityRow {
    user_id: Uuid,
    activity_date: NaiveDate,
    duas_completed: Vec<i64>,
    xp_earned: i32,
}

fn to_activity(row: ActivityRow) -> Result<DailyActivity> {
    if row.xp_earned < 0 {
        return Err(RizqError::validation(format!(
            "activity for {} on {} has negative xp_earned {}",
            row.user_id, row.activity_date, row.xp_earned
        )));
    }

    Ok(DailyActivity {
        user_id: row.user_id,
        activity_date: row.activity_date,
        duas_completed: row.duas_completed.into_iter().collect(),
        xp_earned: row.xp_earned,
    })
}

/// Record a dua completion for `date` (usually today, possibly a backfill).
///
/// One transaction: the profile row is locked first, the day's activity row
/// is created or amended with append-if-absent set semantics, and only a new
/// completion awards the dua's XP and advances the streak. A backfill older
/// than the stored last-active day earns XP without touching the streak.
/// Repeats return the current state unchanged. Affected cache keys are
/// dropped after commit.
pub async fn record_completion(
    db: &Database,
    user_id: Uuid,
    dua_id: i64,
    date: NaiveDate,
) -> Result<CompletionOutcome> {
    let mut tx = db.pool().begin().await.map_err(|e| sqlx_err(e, "completion"))?;

    let xp_reward: Option<i32> = sqlx::query_scalar("SELECT xp_reward FROM duas WHERE id = $1")
        .bind(dua_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| sqlx_err(e, "dua"))?;
    let xp_reward = xp_reward.ok_or_else(|| RizqError::not_found("dua"))?;

    let profile = profiles::lock_profile(&mut tx, user_id).await?;

    let existing: Option<Vec<i64>> = sqlx::query_scalar(
        "SELECT duas_completed FROM daily_activity
         WHERE user_id = $1::uuid AND activity_date = $2::date
         FOR UPDATE",
    )
    .bind(user_id)
    .bind(date)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| sqlx_err(e, "daily activity"))?;

    let already_completed = existing
        .as_deref()
        .is_some_and(|completed| completed.contains(&dua_id));

    if already_completed {
        tx.rollback().await.map_err(|e| sqlx_err(e, "completion"))?;

        let activity = get_activity(db, user_id, date)
            .await?
            .ok_or_else(|| RizqError::not_found("daily activity"))?;

        return Ok(CompletionOutcome {
            profile,
            activity,
            newly_completed: false,
            xp_awarded: 0,
        });
    }

    let row: ActivityRow = sqlx::query_as(
        "INSERT INTO daily_activity (user_id, activity_date, duas_completed, xp_earned)
         VALUES ($1::uuid, $2::date, ARRAY[$3]::bigint[], $4)
         ON CONFLICT (user_id, activity_date) DO UPDATE
         SET duas_completed = array_append(daily_activity.duas_completed, $3),
             xp_earned = daily_activity.xp_earned + $4
         RETURNING user_id, activity_date, duas_completed, xp_earned",
    )
    .bind(user_id)
    .bind(date)
    .bind(dua_id)
    .bind(xp_reward)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| sqlx_err(e, "daily activity"))?;
    let activity = to_activity(row)?;

    let award = progression::award_xp(profile.total_xp, i64::from(xp_reward))?;
    let (streak, last_active) =
        progression::streak_update_for_completion(profile.last_active_date, profile.streak, date)?;
    let profile = profiles::update_progress(
        &mut tx,
        user_id,
        award.total_xp,
        award.level,
        streak,
        last_active,
    )
    .await?;

    tx.commit().await.map_err(|e| sqlx_err(e, "completion"))?;

    let cache = db.cache();
    cache.invalidate(&profile_key(cache, user_id)).await;
    cache.invalidate(&activity_key(cache, user_id, date)).await;

    Ok(CompletionOutcome {
        profile,
        activity,
        newly_completed: true,
        xp_awarded: xp_reward,
    })
}

/// The activity row for one user and date, through the cache.
pub async fn get_activity(
    db: &Database,
    user_id: Uuid,
    date: NaiveDate,
) -> Result<Option<DailyActivity>> {
    let key = activity_key(db.cache(), user_id, date);

    db.cache()
        .get_or_load_json(&key, ACTIVITY_TTL, || async move {
            let row: Option<ActivityRow> = sqlx::query_as(
                "SELECT user_id, activity_date, duas_completed, xp_earned
                 FROM daily_activity
                 WHERE user_id = $1::uuid AND activity_date = $2::date",
            )
            .bind(user_id)
            .bind(date)
            .fetch_optional(db.pool())
            .await
            .map_err(|e| sqlx_err(e, "daily activity"))?;

            row.map(to_activity).transpose()
        })
        .await
}

/// The user's most recent activity rows, newest first.
pub async fn recent_activity(
    db: &Database,
    user_id: Uuid,
    limit: u32,
) -> Result<Vec<DailyActivity>> {
    let limit = i64::from(limit.clamp(1, 90));

    let rows: Vec<ActivityRow> = sqlx::query_as(
        "SELECT user_id, activity_date, duas_completed, xp_earned
         FROM daily_activity
         WHERE user_id = $1::uuid
         ORDER BY activity_date DESC
         LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(db.pool())
    .await
    .map_err(|e| sqlx_err(e, "daily activity"))?;

    rows.into_iter().map(to_activity).collect()
}

/// Empty set when the user has no activity for `date`.
pub async fn completions_on(
    db: &Database,
    user_id: Uuid,
    date: NaiveDate,
) -> Result<BTreeSet<i64>> {
    Ok(get_activity(db, user_id, date)
        .await?
        .map(|activity| activity.duas_completed)
        .unwrap_or_default())
}
