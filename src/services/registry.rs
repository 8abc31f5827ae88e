use reqwest::Client;
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

use crate::models::{Trial, NOT_AVAILABLE};

/// Errors that can occur when fetching from the trial registry
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Paging and filtering options for a registry search
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub page_size: u32,
    pub max_trials: usize,
    pub request_delay: Duration,
    /// Uppercase statuses to skip
    pub excluded_statuses: HashSet<String>,
}

/// ClinicalTrials.gov v2 API client
///
/// Handles:
/// - Searching studies by term with page-token pagination
/// - Keeping interventional studies with an acceptable status
/// - Converting study documents into catalog records
pub struct RegistryClient {
    base_url: String,
    client: Client,
}

impl RegistryClient {
    /// Create a new registry client
    pub fn new(base_url: String) -> Result<Self, RegistryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { base_url, client })
    }

    /// Fetch up to `max_trials` unique trials matching `term`
    ///
    /// A non-success page response ends the search with what was collected
    /// so far; transport errors are returned.
    pub async fn fetch_trials(
        &self,
        term: &str,
        options: &FetchOptions,
    ) -> Result<Vec<Trial>, RegistryError> {
        let url = format!("{}/studies", self.base_url.trim_end_matches('/'));
        let page_size = options.page_size.to_string();

        let mut trials: Vec<Trial> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut page_token: Option<String> = None;
        let mut page = 1;

        loop {
            let mut params: Vec<(&str, &str)> =
                vec![("query.term", term), ("pageSize", page_size.as_str())];
            if let Some(token) = page_token.as_deref() {
                params.push(("pageToken", token));
            }

            tracing::info!("Fetching page {} for '{}'", page, term);

            let response = self.client.get(&url).query(&params).send().await?;

            if !response.status().is_success() {
                tracing::warn!(
                    "Registry returned {} for '{}' page {}, stopping",
                    response.status(),
                    term,
                    page
                );
                break;
            }

            let json: Value = response.json().await?;

            let studies = json
                .get("studies")
                .and_then(|s| s.as_array())
                .ok_or_else(|| RegistryError::InvalidResponse("Missing studies array".into()))?;

            let before = trials.len();
            for study in studies {
                let Some(trial) = trial_from_study(study, &options.excluded_statuses) else {
                    continue;
                };
                if seen.insert(trial.id.clone()) {
                    trials.push(trial);
                }
            }

            tracing::info!(
                "{} trials added on page {} (total: {})",
                trials.len() - before,
                page,
                trials.len()
            );

            if trials.len() >= options.max_trials {
                break;
            }

            page_token = json
                .get("nextPageToken")
                .and_then(|t| t.as_str())
                .map(str::to_string);
            if page_token.is_none() {
                break;
            }

            page += 1;
            tokio::time::sleep(options.request_delay).await;
        }

        Ok(trials)
    }
}

/// Convert a v2 study document into a catalog record
///
/// Returns `None` for non-interventional studies, excluded statuses and
/// studies without an NCT id.
pub fn trial_from_study(study: &Value, excluded_statuses: &HashSet<String>) -> Option<Trial> {
    let section = study.get("protocolSection")?;
    let design = section.get("designModule");

    let study_type = design
        .and_then(|d| d.get("studyType"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    let status = section
        .pointer("/statusModule/overallStatus")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_uppercase();
    if study_type != "INTERVENTIONAL" || excluded_statuses.contains(&status) {
        return None;
    }

    let id = section
        .pointer("/identificationModule/nctId")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())?
        .to_string();

    let text = |pointer: &str| {
        section
            .pointer(pointer)
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    let or_na = |value: Option<String>| value.unwrap_or_else(|| NOT_AVAILABLE.to_string());

    // v2 documents carry "phases"; older exports use "phaseList"
    let phase = design
        .and_then(|d| d.get("phases").or_else(|| d.get("phaseList")))
        .and_then(|p| match p {
            Value::Array(items) => items.first().and_then(Value::as_str).map(str::to_string),
            Value::String(s) => Some(s.clone()),
            _ => None,
        });

    let conditions: Vec<String> = section
        .pointer("/conditionsModule/conditions")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(Trial {
        url: format!("https://clinicaltrials.gov/ct2/show/{}", id),
        id,
        title: or_na(text("/identificationModule/briefTitle")),
        conditions,
        min_age: or_na(text("/eligibilityModule/minimumAge")),
        max_age: or_na(text("/eligibilityModule/maximumAge")),
        gender: or_na(text("/eligibilityModule/sex").or_else(|| text("/eligibilityModule/gender"))),
        criteria_text: text("/eligibilityModule/eligibilityCriteria").unwrap_or_default(),
        status,
        phase: or_na(phase),
        sponsor: or_na(text("/sponsorCollaboratorsModule/leadSponsor/name")
            .or_else(|| text("/sponsorsModule/leadSponsor/agencyName"))),
        enrollment: section
            .pointer("/designModule/enrollmentInfo/count")
            .or_else(|| section.pointer("/enrollmentModule/enrollmentCount"))
            .and_then(Value::as_u64),
    })
}
