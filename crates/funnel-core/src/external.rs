//! Identifiers carried into the funnel by the hosting page.
//!
//! They are read once, when the funnel starts, and handed to the sequencer
//! explicitly. The core never re-reads them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::form_urlencoded;

const ATTRIBUTION_KEYS: &[&str] = &["gclid", "fbclid", "ref"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landing_page_id: Option<String>,
    /// `utm_*`, click ids and referral codes, passed through verbatim.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attribution: BTreeMap<String, String>,
}

impl ExternalIds {
    /// Parse the hosting page's query string (with or without leading `?`).
    ///
    /// Empty values are ignored; the first occurrence of a key wins.
    pub fn from_query(query: &str) -> Self {
        let mut ids = Self::default();
        let query = query.trim_start_matches('?');

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            if value.is_empty() {
                continue;
            }
            let value = value.into_owned();

            let slot = match key.as_ref() {
                "job_id" | "jobId" => &mut ids.job_id,
                "campaign_id" | "campaignId" => &mut ids.campaign_id,
                "landing_page_id" | "landingPageId" | "lp" => &mut ids.landing_page_id,
                k if k.starts_with("utm_") || ATTRIBUTION_KEYS.contains(&k) => {
                    ids.attribution.entry(k.to_string()).or_insert(value);
                    continue;
                }
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }

        ids
    }

    /// Fill the job id from a pending-application marker kept by the host,
    /// unless the query already carried one.
    pub fn with_session_marker(mut self, marker: Option<&str>) -> Self {
        if self.job_id.is_none() {
            self.job_id = marker
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(String::from);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.job_id.is_none()
            && self.campaign_id.is_none()
            && self.landing_page_id.is_none()
            && self.attribution.is_empty()
    }
}
