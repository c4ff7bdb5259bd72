//! Typed stage outputs. Each struct mirrors a descriptor in `crate::schema` and
//! is only ever decoded from JSON that already passed schema validation.

pub mod analysis;
pub mod email;
pub mod jobs;

pub use analysis::{ExperienceLevel, ResumeAnalysis};
pub use email::{JobApplicationEmail, JobApplicationEmails};
pub use jobs::{JobListing, JobListings, ListingFilter};
