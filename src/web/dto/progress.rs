use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::entity::UserEntity;

pub const DEFAULT_LEADERBOARD_SIZE: i64 = 10;
pub const MAX_LEADERBOARD_SIZE: i64 = 100;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaderboardQuery {
    pub limit: Option<i64>,
}

impl LeaderboardQuery {
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_LEADERBOARD_SIZE)
            .clamp(1, MAX_LEADERBOARD_SIZE)
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LeaderboardEntry {
    rank: usize,
    user_id: Uuid,
    display_name: String,
    xp: i64,
    level: i32,
}

impl LeaderboardEntry {
    pub fn ranked(users: Vec<UserEntity>) -> Vec<Self> {
        users
            .into_iter()
            .enumerate()
            .map(|(i, u)| Self {
                rank: i + 1,
                user_id: u.id(),
                display_name: u.display_name().to_string(),
                xp: u.xp(),
                level: u.level(),
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn leaderboard_limit_is_clamped() {
        assert_eq!(LeaderboardQuery { limit: None }.limit(), 10);
        assert_eq!(LeaderboardQuery { limit: Some(0) }.limit(), 1);
        assert_eq!(LeaderboardQuery { limit: Some(-3) }.limit(), 1);
        assert_eq!(LeaderboardQuery { limit: Some(25) }.limit(), 25);
        assert_eq!(LeaderboardQuery { limit: Some(1000) }.limit(), 100);
    }
}
