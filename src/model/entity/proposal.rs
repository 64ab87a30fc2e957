use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::impl_paginatable_for;
use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Pending,
    Open,
    Rejected,
    Closed,
}

impl ProposalStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "open" => Some(Self::Open),
            "rejected" => Some(Self::Rejected),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Open => "open",
            Self::Rejected => "rejected",
            Self::Closed => "closed",
        }
    }

    /// pending -> open | rejected, open -> closed. Everything else is final.
    pub fn can_transition(&self, to: ProposalStatus) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Open) | (Self::Pending, Self::Rejected) | (Self::Open, Self::Closed)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VoteChoice {
    For,
    Against,
    Abstain,
}

impl VoteChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::For => "for",
            Self::Against => "against",
            Self::Abstain => "abstain",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Proposal {
    id: Uuid,
    author_id: Uuid,
    title: String,
    body: String,
    status: String,
    created_at: DateTime<Utc>,
    closes_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ProposalCreate {
    pub title: String,
    pub body: String,
}

impl ResourceTyped for Proposal {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Proposal
    }
}

impl Proposal {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn author_id(&self) -> Uuid {
        self.author_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn status(&self) -> ProposalStatus {
        ProposalStatus::parse(&self.status).unwrap_or(ProposalStatus::Pending)
    }

    pub fn closes_at(&self) -> Option<&DateTime<Utc>> {
        self.closes_at.as_ref()
    }

    /// Open and the deadline, if any, has not passed.
    pub fn accepts_votes(&self, now: DateTime<Utc>) -> bool {
        self.status() == ProposalStatus::Open && self.closes_at.is_none_or(|c| now < c)
    }
}

#[async_trait]
impl CrudRepository<Proposal, ProposalCreate, Uuid> for Proposal {
    async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: ProposalCreate,
    ) -> DatabaseResult<Self> {
        let proposal = sqlx::query_as(
            "INSERT INTO proposals (id, author_id, title, body) VALUES ($1,$2,$3,$4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(actor.user_id())
        .bind(data.title.trim())
        .bind(data.body.trim())
        .fetch_one(mm.executor())
        .await?;

        Ok(proposal)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: ProposalCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE proposals SET title = $1, body = $2 WHERE id = $3")
            .bind(data.title.trim())
            .bind(data.body.trim())
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.title = data.title.trim().to_string();
        self.body = data.body.trim().to_string();
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM proposals WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM proposals WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM proposals ORDER BY created_at DESC LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM proposals")
            .fetch_one(mm.executor())
            .await?;
        Ok(result)
    }
}

impl_paginatable_for!(Proposal, ProposalCreate, Uuid);

#[async_trait]
impl HasOwner for Proposal {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.author_id)
    }
}

impl Proposal {
    pub async fn list_by_status(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        status: ProposalStatus,
        limit: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM proposals WHERE status = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(status.as_str())
        .bind(limit)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    /// Guarded by the current status so concurrent moderators cannot both win.
    pub async fn transition(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        to: ProposalStatus,
        closes_at: Option<DateTime<Utc>>,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as(
            r#"
            UPDATE proposals
            SET status = $1, closes_at = COALESCE($2, closes_at)
            WHERE id = $3 AND status = $4
            RETURNING *
            "#,
        )
        .bind(to.as_str())
        .bind(closes_at)
        .bind(self.id)
        .bind(self.status().as_str())
        .fetch_optional(mm.executor())
        .await?;
        Ok(result)
    }

    pub async fn close_expired(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<u64> {
        let result = sqlx::query(
            "UPDATE proposals SET status = 'closed' WHERE status = 'open' AND closes_at IS NOT NULL AND closes_at <= now()",
        )
        .execute(mm.executor())
        .await?;
        Ok(result.rows_affected())
    }

    /// Re-voting replaces the previous choice.
    pub async fn cast_vote(
        &self,
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        choice: VoteChoice,
    ) -> DatabaseResult<()> {
        sqlx::query(
            r#"
            INSERT INTO proposal_votes (proposal_id, user_id, choice)
            VALUES ($1,$2,$3)
            ON CONFLICT (proposal_id, user_id)
            DO UPDATE SET choice = EXCLUDED.choice, voted_at = now()
            "#,
        )
        .bind(self.id)
        .bind(actor.user_id())
        .bind(choice.as_str())
        .execute(mm.executor())
        .await?;
        Ok(())
    }

    pub async fn tally(&self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<Tally> {
        let tally = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE choice = 'for') AS votes_for,
                COUNT(*) FILTER (WHERE choice = 'against') AS votes_against,
                COUNT(*) FILTER (WHERE choice = 'abstain') AS votes_abstain
            FROM proposal_votes
            WHERE proposal_id = $1
            "#,
        )
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;
        Ok(tally)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, FromRow, utoipa::ToSchema)]
pub struct Tally {
    pub votes_for: i64,
    pub votes_against: i64,
    pub votes_abstain: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Accepted,
    Declined,
}

impl Tally {
    pub fn total(&self) -> i64 {
        self.votes_for + self.votes_against + self.votes_abstain
    }

    /// Abstentions count toward turnout only.
    pub fn outcome(&self) -> Outcome {
        if self.votes_for > self.votes_against {
            Outcome::Accepted
        } else {
            Outcome::Declined
        }
    }
}

#[cfg(test)]
mod test {
    use chrono::Duration;

    use super::*;

    fn proposal(status: &str, closes_at: Option<DateTime<Utc>>) -> Proposal {
        Proposal {
            id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            title: String::from("More Rust courses"),
            body: String::from("Please"),
            status: status.to_string(),
            created_at: Utc::now(),
            closes_at,
        }
    }

    #[test]
    fn lifecycle_transitions() {
        use ProposalStatus::*;
        assert!(Pending.can_transition(Open));
        assert!(Pending.can_transition(Rejected));
        assert!(Open.can_transition(Closed));

        assert!(!Pending.can_transition(Closed));
        assert!(!Open.can_transition(Rejected));
        assert!(!Open.can_transition(Pending));
        assert!(!Rejected.can_transition(Open));
        assert!(!Closed.can_transition(Open));
    }

    #[test]
    fn votes_only_while_open_and_before_deadline() {
        let now = Utc::now();
        assert!(proposal("open", Some(now + Duration::days(1))).accepts_votes(now));
        assert!(proposal("open", None).accepts_votes(now));
        assert!(!proposal("open", Some(now)).accepts_votes(now));
        assert!(!proposal("pending", None).accepts_votes(now));
        assert!(!proposal("closed", None).accepts_votes(now));
    }

    #[test]
    fn tally_outcome() {
        let t = Tally {
            votes_for: 3,
            votes_against: 2,
            votes_abstain: 10,
        };
        assert_eq!(t.total(), 15);
        assert_eq!(t.outcome(), Outcome::Accepted);

        let tie = Tally {
            votes_for: 2,
            votes_against: 2,
            votes_abstain: 0,
        };
        assert_eq!(tie.outcome(), Outcome::Declined);
        assert_eq!(Tally::default().outcome(), Outcome::Declined);
    }
}
