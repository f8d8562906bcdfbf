//! XP, level, and streak arithmetic.
//!
//! Levels follow a quadratic curve: `xp_for_level(n) = 50n² + 50n` is the
//! cumulative XP at which level `n` is complete and level `n + 1` begins.
//! Level 1 therefore spans `[0, 100)`, level 2 spans `[100, 300)`, and the
//! unique level for a total is `L` with
//! `xp_for_level(L - 1) <= total_xp < xp_for_level(L)`.
//!
//! Streaks are advanced at write time only: the completion that triggers the
//! write counts as an active day, so a gap resets the streak to 1, not 0.
//! Read-time display goes through [`streak_status`], which never mutates.

use chrono::NaiveDate;

use crate::error::{Result, RizqError};

/// Cumulative XP at which `level` is complete. Saturates at `i64::MAX` for
/// levels past the representable range instead of wrapping.
pub fn xp_for_level(level: i64) -> i64 {
    level
        .saturating_mul(level)
        .saturating_add(level)
        .saturating_mul(50)
}

/// The level a user holds at `total_xp`. Always at least 1.
pub fn level_for_xp(total_xp: i64) -> Result<i64> {
    if total_xp < 0 {
        return Err(RizqError::validation(format!(
            "total_xp must be non-negative, got {total_xp}"
        )));
    }

    // Invert 50n² + 50n <= xp for the largest completed level n, then seat
    // the user in the level above it. The float estimate is exact for any
    // realistic XP total; the fix-up loops cover rounding at the boundaries.
    let mut n = (((total_xp / 50) as f64).sqrt()) as i64;
    while xp_for_level(n + 1) <= total_xp && xp_for_level(n + 1) < i64::MAX {
        n += 1;
    }
    while n > 0 && xp_for_level(n) > total_xp {
        n -= 1;
    }

    Ok(n + 1)
}

/// Result of applying an XP award to a running total.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct XpAward {
    pub total_xp: i64,
    pub level: i64,
}

/// Add `amount` XP to `total_xp` and recompute the level.
pub fn award_xp(total_xp: i64, amount: i64) -> Result<XpAward> {
    if amount < 0 {
        return Err(RizqError::validation(format!(
            "xp award must be non-negative, got {amount}"
        )));
    }

    let new_total = total_xp
        .checked_add(amount)
        .ok_or_else(|| RizqError::validation("xp total overflow"))?;
    let level = level_for_xp(new_total)?;

    Ok(XpAward {
        total_xp: new_total,
        level,
    })
}

/// Position of a total within its level, for progress displays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct XpProgress {
    pub level: i64,
    /// XP earned past the current level's floor.
    pub into_level: i64,
    /// XP still needed to reach the next level.
    pub to_next_level: i64,
}

pub fn xp_progress(total_xp: i64) -> Result<XpProgress> {
    let level = level_for_xp(total_xp)?;
    let floor = xp_for_level(level - 1);
    let ceiling = xp_for_level(level);

    Ok(XpProgress {
        level,
        into_level: total_xp - floor,
        to_next_level: ceiling - total_xp,
    })
}

/// Streak value to store after a completion on `today`.
///
/// Same-day repeat completions leave the streak untouched, a completion the
/// day after the last active day extends it, and anything older starts a
/// fresh streak at 1.
pub fn streak_after_completion(
    last_active: Option<NaiveDate>,
    current_streak: i32,
    today: NaiveDate,
) -> Result<i32> {
    let Some(last) = last_active else {
        return Ok(1);
    };

    if last > today {
        return Err(RizqError::validation(format!(
            "last_active_date {last} is after today {today}"
        )));
    }

    match (today - last).num_days() {
        0 => Ok(current_streak.max(1)),
        1 => Ok(current_streak + 1),
        _ => Ok(1),
    }
}

/// Streak and last-active values to store after recording a completion on
/// `date`, which may be a backfill for an earlier day.
///
/// A backfill older than the stored last-active day earns its XP but cannot
/// rewind or extend the streak, so both values pass through unchanged. Any
/// other date goes through [`streak_after_completion`] and stamps `date` as
/// the new last-active day.
pub fn streak_update_for_completion(
    last_active: Option<NaiveDate>,
    current_streak: i32,
    date: NaiveDate,
) -> Result<(i32, Option<NaiveDate>)> {
    match last_active {
        Some(last) if last > date => Ok((current_streak, Some(last))),
        _ => {
            let streak = streak_after_completion(last_active, current_streak, date)?;
            Ok((streak, Some(date)))
        }
    }
}

/// Read-time streak display state. Never mutates the stored streak.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct StreakStatus {
    pub active: bool,
    pub days: i32,
}

/// A streak is alive if the user was active today or yesterday; a longer gap
/// shows as broken (zero days) until the next completion re-seeds it.
pub fn streak_status(
    last_active: Option<NaiveDate>,
    current_streak: i32,
    today: NaiveDate,
) -> StreakStatus {
    let alive = last_active
        .map(|last| {
            let delta = (today - last).num_days();
            (0..=1).contains(&delta)
        })
        .unwrap_or(false);

    StreakStatus {
        active: alive,
        days: if alive { current_streak } else { 0 },
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{
        award_xp, level_for_xp, streak_after_completion, streak_status,
        streak_update_for_completion, xp_for_level, xp_progress, StreakStatus,
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn level_curve_boundaries() {
        assert_eq!(xp_for_level(0), 0);
        assert_eq!(xp_for_level(1), 100);
        assert_eq!(xp_for_level(2), 300);
        assert_eq!(xp_for_level(3), 600);

        // Crossing a level's ceiling lands exactly in the next level.
        for n in 0..200 {
            assert_eq!(level_for_xp(xp_for_level(n)).unwrap(), n + 1);
            if n > 0 {
                assert_eq!(level_for_xp(xp_for_level(n) - 1).unwrap(), n);
            }
        }
    }

    #[test]
    fn level_sandwich_holds_for_all_totals() {
        for xp in (0..50_000).step_by(7) {
            let level = level_for_xp(xp).unwrap();
            assert!(level >= 1, "level floor violated at {xp}");
            assert!(xp_for_level(level - 1) <= xp, "floor violated at {xp}");
            assert!(xp < xp_for_level(level), "ceiling violated at {xp}");
        }
    }

    #[test]
    fn negative_xp_is_rejected() {
        assert!(level_for_xp(-1).is_err());
        assert!(award_xp(100, -10).is_err());
    }

    #[test]
    fn award_crossing_the_first_boundary() {
        // 95 XP sits in level 1; a 10 XP award crosses the 100 XP boundary.
        assert_eq!(level_for_xp(95).unwrap(), 1);
        let award = award_xp(95, 10).unwrap();
        assert_eq!(award.total_xp, 105);
        assert_eq!(award.level, 2);
    }

    #[test]
    fn progress_within_a_level() {
        let progress = xp_progress(150).unwrap();
        assert_eq!(progress.level, 2);
        assert_eq!(progress.into_level, 50);
        assert_eq!(progress.to_next_level, 150);
    }

    #[test]
    fn streak_extends_after_yesterday() {
        let streak =
            streak_after_completion(Some(date(2026, 8, 28)), 4, date(2026, 8, 29)).unwrap();
        assert_eq!(streak, 5);
    }

    #[test]
    fn streak_unchanged_on_same_day_repeat() {
        let streak =
            streak_after_completion(Some(date(2026, 8, 29)), 4, date(2026, 8, 29)).unwrap();
        assert_eq!(streak, 4);
    }

    #[test]
    fn streak_resets_to_one_after_a_gap() {
        let streak =
            streak_after_completion(Some(date(2026, 8, 26)), 9, date(2026, 8, 29)).unwrap();
        assert_eq!(streak, 1);
    }

    #[test]
    fn first_completion_starts_at_one() {
        assert_eq!(streak_after_completion(None, 0, date(2026, 8, 29)).unwrap(), 1);
    }

    #[test]
    fn backfill_before_newer_activity_leaves_streak_alone() {
        // Recording yesterday's dua after already completing one today must
        // not error or disturb the streak; only the XP moves.
        let (streak, last_active) =
            streak_update_for_completion(Some(date(2026, 8, 29)), 3, date(2026, 8, 28)).unwrap();
        assert_eq!(streak, 3);
        assert_eq!(last_active, Some(date(2026, 8, 29)));
    }

    #[test]
    fn non_backfill_completion_advances_streak_and_date() {
        let (streak, last_active) =
            streak_update_for_completion(Some(date(2026, 8, 28)), 3, date(2026, 8, 29)).unwrap();
        assert_eq!(streak, 4);
        assert_eq!(last_active, Some(date(2026, 8, 29)));

        let (streak, last_active) =
            streak_update_for_completion(None, 0, date(2026, 8, 29)).unwrap();
        assert_eq!(streak, 1);
        assert_eq!(last_active, Some(date(2026, 8, 29)));
    }

    #[test]
    fn extreme_totals_do_not_panic() {
        let level = level_for_xp(i64::MAX).unwrap();
        // sqrt(i64::MAX / 50) is a bit over 4.2e8 levels.
        assert!(level > 400_000_000);

        // Saturated curve means additions near the ceiling are rejected, not
        // wrapped.
        assert!(award_xp(i64::MAX, 10).is_err());
    }

    #[test]
    fn future_last_active_is_rejected() {
        assert!(streak_after_completion(Some(date(2026, 8, 30)), 1, date(2026, 8, 29)).is_err());
    }

    #[test]
    fn status_reports_broken_streak_as_zero_days() {
        let today = date(2026, 8, 29);

        assert_eq!(
            streak_status(Some(date(2026, 8, 29)), 6, today),
            StreakStatus { active: true, days: 6 }
        );
        assert_eq!(
            streak_status(Some(date(2026, 8, 28)), 6, today),
            StreakStatus { active: true, days: 6 }
        );
        assert_eq!(
            streak_status(Some(date(2026, 8, 25)), 6, today),
            StreakStatus { active: false, days: 0 }
        );
        assert_eq!(
            streak_status(None, 0, today),
            StreakStatus { active: false, days: 0 }
        );
    }
}
