use serde::{Deserialize, Serialize};

use crate::model::entity::{Outcome, Proposal, ProposalCreate, ProposalStatus, Tally, VoteChoice};
use crate::web::{WebError, WebResult};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProposalListQuery {
    pub status: Option<ProposalStatus>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct VoteBody {
    pub choice: VoteChoice,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProposalDetails {
    pub proposal: Proposal,
    pub tally: Tally,
    /// Only reported once voting is over.
    pub outcome: Option<Outcome>,
}

impl ProposalDetails {
    pub fn new(proposal: Proposal, tally: Tally) -> Self {
        let outcome = (proposal.status() == ProposalStatus::Closed).then(|| tally.outcome());
        Self {
            proposal,
            tally,
            outcome,
        }
    }
}

pub fn validate_proposal(data: &ProposalCreate) -> WebResult<()> {
    let title = data.title.trim().chars().count();
    if !(3..=200).contains(&title) {
        return Err(WebError::invalid_field("title", "must be 3 to 200 characters"));
    }
    let body = data.body.trim().chars().count();
    if !(1..=10_000).contains(&body) {
        return Err(WebError::invalid_field("body", "must be 1 to 10000 characters"));
    }
    Ok(())
}
