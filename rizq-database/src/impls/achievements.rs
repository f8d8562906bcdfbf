use chrono::{DateTime, Utc};
use uuid::Uuid;

use rizq_core::{Result, RizqError, progression};

use crate::{
    cache,
    database::{Database, sqlx_err},
    impls::profiles,
    model::achievement::{Achievement, UnlockOutcome, UserAchievement},
};

#[derive(sqlx::FromRow)]
struct AchievementRow {
    id: i64,
    code: String,
    title: String,
    description: Option<String>,
    xp_reward: i32,
}

fn to_achievement(row: AchievementRow) -> Achievement {
    Achievement {
        id: row.id,
        code: row.code,
        title: row.title,
        description: row.description,
        xp_reward: row.xp_reward,
    }
}

pub async fn list_achievements(db: &Database) -> Result<Vec<Achievement>> {
    let rows: Vec<AchievementRow> = sqlx::query_as(
        "SELECT id, code, title, description, xp_reward FROM achievements ORDER BY id",
    )
    .fetch_all(db.pool())
    .await
    .map_err(|e| sqlx_err(e, "achievements"))?;

    Ok(rows.into_iter().map(to_achievement).collect())
}

pub async fn list_user_achievements(db: &Database, user_id: Uuid) -> Result<Vec<UserAchievement>> {
    let rows: Vec<(Uuid, i64, DateTime<Utc>)> = sqlx::query_as(
        "SELECT user_id, achievement_id, unlocked_at
         FROM user_achievements
         WHERE user_id = $1::uuid
         ORDER BY unlocked_at",
    )
    .bind(user_id)
    .fetch_all(db.pool())
    .await
    .map_err(|e| sqlx_err(e, "user achievements"))?;

    Ok(rows
        .into_iter()
        .map(|(user_id, achievement_id, unlocked_at)| UserAchievement {
            user_id,
            achievement_id,
            unlocked_at,
        })
        .collect())
}

/// Unlock an achievement for a user. Idempotent on the (user, achievement)
/// key: a repeat unlock changes nothing and awards nothing. A fresh unlock
/// credits the achievement's XP to the profile in the same transaction;
/// streak and last-active-date are completion-only and stay untouched.
pub async fn unlock_achievement(
    db: &Database,
    user_id: Uuid,
    achievement_id: i64,
) -> Result<UnlockOutcome> {
    let mut tx = db.pool().begin().await.map_err(|e| sqlx_err(e, "unlock"))?;

    let xp_reward: Option<i32> =
        sqlx::query_scalar("SELECT xp_reward FROM achievements WHERE id = $1")
            .bind(achievement_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| sqlx_err(e, "achievement"))?;
    let xp_reward = xp_reward.ok_or_else(|| RizqError::not_found("achievement"))?;

    let profile = profiles::lock_profile(&mut tx, user_id).await?;

    let inserted = sqlx::query(
        "INSERT INTO user_achievements (user_id, achievement_id)
         VALUES ($1::uuid, $2)
         ON CONFLICT (user_id, achievement_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(achievement_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| sqlx_err(e, "user achievement"))?;

    if inserted.rows_affected() == 0 {
        tx.rollback().await.map_err(|e| sqlx_err(e, "unlock"))?;
        return Ok(UnlockOutcome {
            newly_unlocked: false,
            profile: None,
        });
    }

    let award = progression::award_xp(profile.total_xp, i64::from(xp_reward))?;
    let profile = profiles::update_progress(
        &mut tx,
        user_id,
        award.total_xp,
        award.level,
        profile.streak,
        profile.last_active_date,
    )
    .await?;

    tx.commit().await.map_err(|e| sqlx_err(e, "unlock"))?;

    db.cache()
        .invalidate(&cache::profile_key(db.cache(), user_id))
        .await;

    Ok(UnlockOutcome {
        newly_unlocked: true,
        profile: Some(profile),
    })
}
