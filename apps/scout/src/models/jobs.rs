use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A single job opening found by the search stage.
///
/// `contact_email` uses the empty string as the "unknown" sentinel; the schema
/// validator guarantees it is otherwise a plausible address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobListing {
    pub job_title: String,
    pub company: String,
    pub location: String,
    pub platform: String,
    pub required_experience_level: String,
    pub key_requirements: Vec<String>,
    pub contact_email: String,
}

impl JobListing {
    pub fn has_contact(&self) -> bool {
        !self.contact_email.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobListings {
    pub jobs: Vec<JobListing>,
}

impl JobListings {
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Listings that carry a contact email, in original order.
    pub fn contactable(&self) -> JobListings {
        JobListings {
            jobs: self.jobs.iter().filter(|j| j.has_contact()).cloned().collect(),
        }
    }

    /// Distinct platform names, sorted.
    pub fn platforms(&self) -> Vec<&str> {
        distinct(self.jobs.iter().map(|j| j.platform.as_str()))
    }

    /// Distinct required experience levels, sorted.
    pub fn levels(&self) -> Vec<&str> {
        distinct(self.jobs.iter().map(|j| j.required_experience_level.as_str()))
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    values.collect::<BTreeSet<_>>().into_iter().collect()
}

/// Presentation-side filter over listings: `None` means "all".
#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    pub platform: Option<String>,
    pub level: Option<String>,
}

impl ListingFilter {
    pub fn matches(&self, listing: &JobListing) -> bool {
        let platform_ok = self
            .platform
            .as_deref()
            .map_or(true, |p| listing.platform.eq_ignore_ascii_case(p));
        let level_ok = self
            .level
            .as_deref()
            .map_or(true, |l| listing.required_experience_level.eq_ignore_ascii_case(l));
        platform_ok && level_ok
    }

    pub fn apply<'a>(&self, listings: &'a JobListings) -> Vec<&'a JobListing> {
        listings.jobs.iter().filter(|j| self.matches(j)).collect()
    }
}

#[cfg(test)]
pub(crate) fn listing(title: &str, platform: &str, level: &str, email: &str) -> JobListing {
    JobListing {
        job_title: title.to_string(),
        company: format!("{title} Co"),
        location: "Remote".to_string(),
        platform: platform.to_string(),
        required_experience_level: level.to_string(),
        key_requirements: vec!["Go".to_string()],
        contact_email: email.to_string(),
    }
}
