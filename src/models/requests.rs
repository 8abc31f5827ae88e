use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::UserProfile;

/// Request to rank trials for a patient profile
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MatchTrialsRequest {
    #[validate(nested)]
    pub profile: UserProfile,
    #[serde(default, alias = "topK")]
    #[validate(range(min = 1))]
    pub top_k: Option<u16>,
}
