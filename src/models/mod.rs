// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Alcohol, Candidate, Gender, ParsedCriteria, ScoredTrial, Smoker, Trial, UserProfile,
    NOT_AVAILABLE,
};
pub use requests::MatchTrialsRequest;
pub use responses::{ErrorResponse, ExplanationResponse, HealthResponse, MatchTrialsResponse};
