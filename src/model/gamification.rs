//! XP and level arithmetic.
//!
//! A user at level `n` holds at least `base * (n - 1)^2` XP, so
//! `level = 1 + isqrt(xp / base)`.

use serde::Serialize;
use uuid::Uuid;

use crate::model::entity::{XpEvent, XpReason};
use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;

/// Tunables read from the `[gamification]` config section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpRules {
    pub course_xp_bonus: i64,
    pub level_base_xp: i64,
}

impl XpRules {
    pub fn from_config(config: &crate::Config) -> Self {
        Self {
            course_xp_bonus: config.gamification().course_xp_bonus(),
            level_base_xp: config.gamification().level_base_xp(),
        }
    }

    /// XP granted for finishing a course, the course's own reward when set.
    pub fn course_reward(&self, course_xp_reward: i32) -> i64 {
        if course_xp_reward > 0 {
            course_xp_reward.into()
        } else {
            self.course_xp_bonus
        }
    }
}

pub fn level_for_xp(xp: i64, base: i64) -> i32 {
    if xp <= 0 || base <= 0 {
        return 1;
    }
    let steps = (xp / base).isqrt();
    i32::try_from(steps).map_or(i32::MAX, |s| s.saturating_add(1))
}

/// Minimum XP for `level`.
pub fn xp_for_level(level: i32, base: i64) -> i64 {
    let n = i64::from(level.max(1) - 1);
    base.saturating_mul(n.saturating_mul(n))
}

/// `floor(completed * 100 / total)`, 0 for empty courses.
pub fn progress_pct(completed: i64, total: i64) -> i32 {
    if total <= 0 {
        return 0;
    }
    let pct = completed.clamp(0, total) * 100 / total;
    pct as i32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct XpAward {
    /// XP actually added by this call, 0 when the grant already existed.
    pub awarded: i64,
    pub xp: i64,
    pub level: i32,
    pub leveled_up: bool,
}

/// Grants `amount` XP once per `(user, reason, source)` and keeps the stored level in sync.
pub async fn award_xp(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    user_id: Uuid,
    reason: XpReason,
    source_id: Uuid,
    amount: i64,
    rules: &XpRules,
) -> DatabaseResult<Option<XpAward>> {
    let Some(balance) =
        XpEvent::grant(mm, actor, user_id, reason, source_id, amount, rules.level_base_xp).await?
    else {
        return Ok(None);
    };

    let level = balance.level;
    let previous_level = level_for_xp(balance.xp - amount.max(0), rules.level_base_xp);
    let leveled_up = level > previous_level;
    if leveled_up {
        tracing::info!(%user_id, level, "level up");
    }

    Ok(Some(XpAward {
        awarded: amount.max(0),
        xp: balance.xp,
        level,
        leveled_up,
    }))
}
