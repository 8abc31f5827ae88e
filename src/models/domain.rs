use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

/// Sentinel used for trial fields the registry did not provide
pub const NOT_AVAILABLE: &str = "N/A";

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

/// Ingested records carry explicit nulls for fields the registry omitted
fn null_as_not_available<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(not_available))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Smoker {
    Yes,
    No,
    #[default]
    Unspecified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alcohol {
    None,
    Light,
    Moderate,
    Heavy,
    #[default]
    Unspecified,
}

/// Patient profile submitted for a single matching call
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UserProfile {
    #[validate(range(max = 120))]
    pub age: u8,
    pub gender: Gender,
    #[validate(range(min = 5.0, max = 100.0))]
    pub bmi: f64,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub smoker: Smoker,
    #[serde(default)]
    pub alcohol: Alcohol,
}

impl UserProfile {
    /// Conditions lowercased and trimmed, duplicates removed, first occurrence order kept
    pub fn normalized_conditions(&self) -> Vec<String> {
        let mut normalized: Vec<String> = Vec::with_capacity(self.conditions.len());
        for condition in &self.conditions {
            let lowered = condition.trim().to_lowercase();
            if lowered.is_empty() || normalized.contains(&lowered) {
                continue;
            }
            normalized.push(lowered);
        }
        normalized
    }
}

/// One clinical-trial eligibility record from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    #[serde(rename = "nct_id", alias = "id")]
    pub id: String,
    #[serde(default = "not_available", deserialize_with = "null_as_not_available")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub conditions: Vec<String>,
    #[serde(default = "not_available", deserialize_with = "null_as_not_available")]
    pub min_age: String,
    #[serde(default = "not_available", deserialize_with = "null_as_not_available")]
    pub max_age: String,
    #[serde(default = "not_available", deserialize_with = "null_as_not_available")]
    pub gender: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub criteria_text: String,
    #[serde(
        rename = "overall_status",
        alias = "status",
        default = "not_available",
        deserialize_with = "null_as_not_available"
    )]
    pub status: String,
    #[serde(default = "not_available", deserialize_with = "null_as_not_available")]
    pub phase: String,
    #[serde(default = "not_available", deserialize_with = "null_as_not_available")]
    pub sponsor: String,
    #[serde(default)]
    pub enrollment: Option<u64>,
    #[serde(default = "not_available", deserialize_with = "null_as_not_available")]
    pub url: String,
}

/// Inclusion/exclusion segments of a trial's criteria text, both lowercase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCriteria {
    pub inclusion_text: String,
    pub exclusion_text: String,
}

/// Retrieval hit: position of the record in the catalog and its distance to the query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub record_index: usize,
    pub distance: f32,
}

/// Trial that survived filtering, with its ranking scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredTrial {
    #[serde(flatten)]
    pub trial: Trial,
    pub condition_score: u32,
    pub semantic_score: f64,
}
