use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::models::{Alcohol, Gender, Smoker, Trial, UserProfile};

/// Errors that can occur when requesting an explanation
#[derive(Debug, Error)]
pub enum ExplainerError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Explanation service returned error: {0}")]
    ApiError(String),

    #[error("Empty explanation")]
    EmptyResponse,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Free-text rationale for a (profile, trial) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    pub text: String,
    /// First line mentioning "qualifies"
    pub qualifies: Option<String>,
    /// First line mentioning "match score"
    pub match_score: Option<String>,
}

impl Explanation {
    pub fn from_text(text: String) -> Self {
        let find_line = |needle: &str| {
            text.lines()
                .find(|line| line.to_lowercase().contains(needle))
                .map(|line| line.trim().to_string())
        };
        let qualifies = find_line("qualifies");
        let match_score = find_line("match score");

        Self {
            text,
            qualifies,
            match_score,
        }
    }
}

/// Client for an Ollama-compatible text generation endpoint
pub struct ExplainerClient {
    base_url: String,
    model: String,
    client: Client,
}

impl ExplainerClient {
    /// Create a new explainer client
    pub fn new(base_url: String, model: String, timeout_secs: u64) -> Result<Self, ExplainerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            base_url,
            model,
            client,
        })
    }

    /// Ask the model whether the patient qualifies for the trial and why
    pub async fn explain(
        &self,
        profile: &UserProfile,
        trial: &Trial,
    ) -> Result<Explanation, ExplainerError> {
        let url = format!("{}/api/generate", self.base_url.trim_end_matches('/'));
        let prompt = build_prompt(profile, trial);

        tracing::debug!("Requesting explanation for trial {}", trial.id);

        let response = self
            .client
            .post(&url)
            .json(&GenerateRequest {
                model: &self.model,
                prompt: &prompt,
                stream: false,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ExplainerError::ApiError(format!(
                "Failed to generate explanation: {}",
                response.status()
            )));
        }

        let body: GenerateResponse = response.json().await?;
        let text = body.response.trim().to_string();
        if text.is_empty() {
            return Err(ExplainerError::EmptyResponse);
        }

        Ok(Explanation::from_text(text))
    }
}

fn gender_label(gender: Gender) -> &'static str {
    match gender {
        Gender::Male => "male",
        Gender::Female => "female",
    }
}

fn smoker_label(smoker: Smoker) -> &'static str {
    match smoker {
        Smoker::Yes => "yes",
        Smoker::No => "no",
        Smoker::Unspecified => "unspecified",
    }
}

fn alcohol_label(alcohol: Alcohol) -> &'static str {
    match alcohol {
        Alcohol::None => "none",
        Alcohol::Light => "light",
        Alcohol::Moderate => "moderate",
        Alcohol::Heavy => "heavy",
        Alcohol::Unspecified => "unspecified",
    }
}

/// Evaluation prompt sent to the model
pub fn build_prompt(profile: &UserProfile, trial: &Trial) -> String {
    format!(
        "You are a clinical trial eligibility evaluator.

Patient Profile:
- Age: {age}
- Gender: {gender}
- BMI: {bmi}
- Conditions: {conditions}
- Smoker: {smoker}
- Alcohol Use: {alcohol}

Trial Title: {title}
Eligibility Criteria:
{criteria}

Your Task:
1. Decide if the patient qualifies and respond clearly as:
   QUALIFIES: Yes or No

2. Estimate a MATCH SCORE between 0-100% based on how many criteria the patient meets (age, gender, BMI, conditions, smoking, alcohol).

3. Structure your explanation in 3 parts:
-- MET CRITERIA --
- list which criteria were satisfied

-- UNMET OR DISQUALIFYING CRITERIA --
- list reasons for disqualification or failed eligibility

-- FINAL NOTES --
- any additional guidance or edge cases

Respond only in this format.",
        age = profile.age,
        gender = gender_label(profile.gender),
        bmi = profile.bmi,
        conditions = profile.conditions.join(", "),
        smoker = smoker_label(profile.smoker),
        alcohol = alcohol_label(profile.alcohol),
        title = trial.title,
        criteria = trial.criteria_text,
    )
}
