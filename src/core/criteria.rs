use serde::Deserialize;

use crate::models::ParsedCriteria;

const INCLUSION_HEADER: &str = "inclusion criteria";
const EXCLUSION_HEADER: &str = "exclusion criteria";

/// What to use as the inclusion segment when the text has no inclusion header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingInclusionPolicy {
    /// Inclusion segment stays empty
    #[default]
    Empty,
    /// The whole normalized text is the inclusion segment
    WholeText,
}

/// Splits free-text eligibility criteria into inclusion and exclusion segments
#[derive(Debug, Clone, Copy, Default)]
pub struct CriteriaParser {
    missing_inclusion: MissingInclusionPolicy,
}

impl CriteriaParser {
    pub fn new(missing_inclusion: MissingInclusionPolicy) -> Self {
        Self { missing_inclusion }
    }

    /// Parse criteria text into lowercase segments.
    ///
    /// The two headers are located by independent scans over the whole
    /// normalized text, so the segments may overlap when headers repeat or
    /// appear out of order. A missing header yields an empty segment.
    pub fn parse(&self, criteria_text: &str) -> ParsedCriteria {
        let text = criteria_text.to_lowercase();

        let inclusion_text = match inclusion_segment(&text) {
            Some(segment) => segment.to_string(),
            None => match self.missing_inclusion {
                MissingInclusionPolicy::Empty => String::new(),
                MissingInclusionPolicy::WholeText => text.trim().to_string(),
            },
        };

        let exclusion_text = exclusion_segment(&text).unwrap_or_default().to_string();

        ParsedCriteria {
            inclusion_text,
            exclusion_text,
        }
    }
}

/// Parse with the default policy (empty inclusion segment when the header is missing)
pub fn split_criteria(criteria_text: &str) -> ParsedCriteria {
    CriteriaParser::default().parse(criteria_text)
}

/// Text after the first header occurrence, skipping one optional colon
fn after_header<'a>(text: &'a str, header: &str) -> Option<&'a str> {
    let start = text.find(header)? + header.len();
    let rest = &text[start..];
    Some(rest.strip_prefix(':').unwrap_or(rest))
}

fn inclusion_segment(text: &str) -> Option<&str> {
    let rest = after_header(text, INCLUSION_HEADER)?;
    let end = rest.find(EXCLUSION_HEADER).unwrap_or(rest.len());
    Some(rest[..end].trim())
}

fn exclusion_segment(text: &str) -> Option<&str> {
    after_header(text, EXCLUSION_HEADER).map(str::trim)
}
