use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::jobs::JobListings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobApplicationEmail {
    pub job_title: String,
    pub company: String,
    pub recipient_email: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobApplicationEmails {
    pub emails: Vec<JobApplicationEmail>,
}

impl JobApplicationEmails {
    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    /// Keeps only emails addressed to a listing's contact email, at most one per
    /// contactable listing. Returns the number of emails dropped.
    ///
    /// Addresses match case-insensitively, and a kept email's `recipient_email`
    /// is set to the listing's exact `contact_email`. Order of the kept emails is preserved.
    pub fn retain_addressed_to(&mut self, listings: &JobListings) -> usize {
        let mut capacity: HashMap<String, (&str, usize)> = HashMap::new();
        for job in listings.jobs.iter().filter(|j| j.has_contact()) {
            capacity
                .entry(job.contact_email.trim().to_ascii_lowercase())
                .or_insert((job.contact_email.as_str(), 0))
                .1 += 1;
        }

        let before = self.emails.len();
        self.emails.retain_mut(|email| {
            let key = email.recipient_email.trim().to_ascii_lowercase();
            match capacity.get_mut(&key) {
                Some((contact, remaining)) if *remaining > 0 => {
                    *remaining -= 1;
                    if email.recipient_email != *contact {
                        email.recipient_email = contact.to_string();
                    }
                    true
                }
                _ => false,
            }
        });
        before - self.emails.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::jobs::listing;

    fn email(to: &str) -> JobApplicationEmail {
        JobApplicationEmail {
            job_title: "Backend Engineer".to_string(),
            company: "Acme".to_string(),
            recipient_email: to.to_string(),
            subject: "Application".to_string(),
            body: "Hello,\nI am applying.".to_string(),
        }
    }

    #[test]
    fn test_retain_drops_unknown_recipients() {
        let listings = JobListings {
            jobs: vec![
                listing("A", "LinkedIn", "Junior", "a@acme.io"),
                listing("B", "LinkedIn", "Junior", ""),
            ],
        };
        let mut emails = JobApplicationEmails {
            emails: vec![email("a@acme.io"), email("ghost@nowhere.io")],
        };
        assert_eq!(emails.retain_addressed_to(&listings), 1);
        assert_eq!(emails.emails[0].recipient_email, "a@acme.io");
    }

    #[test]
    fn test_retain_caps_one_email_per_listing() {
        let listings = JobListings {
            jobs: vec![listing("A", "LinkedIn", "Junior", "hr@acme.io")],
        };
        let mut emails = JobApplicationEmails {
            emails: vec![email("hr@acme.io"), email("HR@acme.io")],
        };
        assert_eq!(emails.retain_addressed_to(&listings), 1);
        assert_eq!(emails.len(), 1);
    }

    #[test]
    fn test_shared_contact_allows_one_email_per_listing() {
        let listings = JobListings {
            jobs: vec![
                listing("A", "LinkedIn", "Junior", "hr@acme.io"),
                listing("B", "Indeed", "Senior", "hr@acme.io"),
            ],
        };
        let mut emails = JobApplicationEmails {
            emails: vec![email("hr@acme.io"), email("hr@acme.io"), email("hr@acme.io")],
        };
        emails.retain_addressed_to(&listings);
        assert_eq!(emails.len(), 2);
    }

    #[test]
    fn test_kept_recipient_matches_contact_exactly() {
        let listings = JobListings {
            jobs: vec![listing("A", "LinkedIn", "Senior", "Jane.Doe@acme.io")],
        };
        let mut emails = JobApplicationEmails {
            emails: vec![email(" jane.doe@ACME.IO")],
        };
        assert_eq!(emails.retain_addressed_to(&listings), 0);
        assert_eq!(emails.emails[0].recipient_email, "Jane.Doe@acme.io");
    }
}
