//! Schema Registry: the data contracts every pipeline stage must produce.
//!
//! Descriptors are static. Model output is checked with [`validate`] before it
//! is decoded into the typed structs in `crate::models`; downstream stages trust
//! the shape of their inputs unconditionally, so validation is strict:
//! unknown fields, missing required fields and wrong primitive types are all
//! rejected.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Map, Value};

use crate::pipeline::stages::StageKind;

mod validate;

pub use validate::{validate, SchemaViolation};

/// Closed set of seniority categories produced by the resume analysis stage.
pub const EXPERIENCE_LEVELS: &[&str] = &["Junior", "Mid-Level", "Senior", "Lead"];

/// Primitive/composite type of a single schema field.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// Any JSON string (may be empty).
    Text,
    /// A string drawn from a closed set.
    Enum(&'static [&'static str]),
    /// A non-negative integer.
    Count,
    /// A string that is either empty or a plausible email address.
    Email,
    /// A non-empty, plausible email address.
    RequiredEmail,
    /// A JSON array of strings.
    TextList,
    /// A nested object.
    Object(&'static SchemaDescriptor),
    /// A JSON array of nested objects.
    ObjectList(&'static SchemaDescriptor),
}

#[derive(Debug)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Optional fields may be absent or `null`.
    pub required: bool,
    pub description: &'static str,
}

#[derive(Debug)]
pub struct SchemaDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub fields: &'static [FieldDescriptor],
}

impl SchemaDescriptor {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Renders an example JSON document with the exact shape of this schema.
    /// Embedded in prompts so the model sees the required keys.
    pub fn prompt_skeleton(&self) -> Value {
        let mut map = Map::new();
        for field in self.fields {
            map.insert(field.name.to_string(), skeleton_value(field.kind));
        }
        Value::Object(map)
    }

    /// One line per field: name, type, required flag and description.
    pub fn field_guide(&self) -> String {
        let mut lines = Vec::new();
        collect_guide(self, "", &mut lines);
        lines.join("\n")
    }
}

fn skeleton_value(kind: FieldKind) -> Value {
    match kind {
        FieldKind::Text => json!("string"),
        FieldKind::Enum(options) => json!(options.join("|")),
        FieldKind::Count => json!(0),
        FieldKind::Email => json!("email or empty string"),
        FieldKind::RequiredEmail => json!("email"),
        FieldKind::TextList => json!(["string"]),
        FieldKind::Object(schema) => schema.prompt_skeleton(),
        FieldKind::ObjectList(schema) => json!([schema.prompt_skeleton()]),
    }
}

fn collect_guide(schema: &SchemaDescriptor, prefix: &str, lines: &mut Vec<String>) {
    for field in schema.fields {
        let path = format!("{prefix}{}", field.name);
        let requirement = if field.required { "required" } else { "optional" };
        lines.push(format!(
            "- {path} ({}, {requirement}): {}",
            kind_label(field.kind),
            field.description
        ));
        match field.kind {
            FieldKind::Object(nested) => collect_guide(nested, &format!("{path}."), lines),
            FieldKind::ObjectList(nested) => collect_guide(nested, &format!("{path}[]."), lines),
            _ => {}
        }
    }
}

fn kind_label(kind: FieldKind) -> String {
    match kind {
        FieldKind::Text => "string".to_string(),
        FieldKind::Enum(options) => format!("one of {}", options.join(", ")),
        FieldKind::Count => "non-negative integer".to_string(),
        FieldKind::Email => "email address or empty string".to_string(),
        FieldKind::RequiredEmail => "email address".to_string(),
        FieldKind::TextList => "list of strings".to_string(),
        FieldKind::Object(schema) => format!("object {}", schema.name),
        FieldKind::ObjectList(schema) => format!("list of {}", schema.name),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Descriptors
// ────────────────────────────────────────────────────────────────────────────

static RESUME_ANALYSIS_FIELDS: [FieldDescriptor; 6] = [
    FieldDescriptor {
        name: "experience_level",
        kind: FieldKind::Enum(EXPERIENCE_LEVELS),
        required: true,
        description: "Seniority: Junior 0-2 years, Mid-Level 2-5, Senior 5-8, Lead 8+",
    },
    FieldDescriptor {
        name: "years_of_experience",
        kind: FieldKind::Count,
        required: false,
        description: "Total years of professional experience",
    },
    FieldDescriptor {
        name: "skills",
        kind: FieldKind::TextList,
        required: true,
        description: "Technical skills: languages, frameworks, databases, cloud, tools, methodologies",
    },
    FieldDescriptor {
        name: "location",
        kind: FieldKind::Text,
        required: false,
        description: "Candidate city or region",
    },
    FieldDescriptor {
        name: "country",
        kind: FieldKind::Text,
        required: false,
        description: "Candidate country",
    },
    FieldDescriptor {
        name: "languages",
        kind: FieldKind::TextList,
        required: true,
        description: "Spoken languages, in the order they appear in the resume",
    },
];

pub static RESUME_ANALYSIS: SchemaDescriptor = SchemaDescriptor {
    name: "ResumeAnalysis",
    description: "Structured profile extracted from a candidate resume",
    fields: &RESUME_ANALYSIS_FIELDS,
};

static JOB_LISTING_FIELDS: [FieldDescriptor; 7] = [
    FieldDescriptor {
        name: "job_title",
        kind: FieldKind::Text,
        required: true,
        description: "Position name",
    },
    FieldDescriptor {
        name: "company",
        kind: FieldKind::Text,
        required: true,
        description: "Company offering the position",
    },
    FieldDescriptor {
        name: "location",
        kind: FieldKind::Text,
        required: true,
        description: "Remote/Hybrid/Onsite and city/country",
    },
    FieldDescriptor {
        name: "platform",
        kind: FieldKind::Text,
        required: true,
        description: "Job platform where the posting was found",
    },
    FieldDescriptor {
        name: "required_experience_level",
        kind: FieldKind::Text,
        required: true,
        description: "Experience level the posting asks for",
    },
    FieldDescriptor {
        name: "key_requirements",
        kind: FieldKind::TextList,
        required: true,
        description: "Key technical requirements and skills",
    },
    FieldDescriptor {
        name: "contact_email",
        kind: FieldKind::Email,
        required: true,
        description: "Application contact email, or an empty string when unknown",
    },
];

pub static JOB_LISTING: SchemaDescriptor = SchemaDescriptor {
    name: "JobListing",
    description: "A single job opening",
    fields: &JOB_LISTING_FIELDS,
};

static JOB_LISTINGS_FIELDS: [FieldDescriptor; 1] = [FieldDescriptor {
    name: "jobs",
    kind: FieldKind::ObjectList(&JOB_LISTING),
    required: true,
    description: "All job listings found",
}];

pub static JOB_LISTINGS: SchemaDescriptor = SchemaDescriptor {
    name: "JobListings",
    description: "Job openings matching the candidate profile",
    fields: &JOB_LISTINGS_FIELDS,
};

static APPLICATION_EMAIL_FIELDS: [FieldDescriptor; 5] = [
    FieldDescriptor {
        name: "job_title",
        kind: FieldKind::Text,
        required: true,
        description: "Job title being applied for",
    },
    FieldDescriptor {
        name: "company",
        kind: FieldKind::Text,
        required: true,
        description: "Company name",
    },
    FieldDescriptor {
        name: "recipient_email",
        kind: FieldKind::RequiredEmail,
        required: true,
        description: "The listing's contact_email, copied exactly",
    },
    FieldDescriptor {
        name: "subject",
        kind: FieldKind::Text,
        required: true,
        description: "Email subject line",
    },
    FieldDescriptor {
        name: "body",
        kind: FieldKind::Text,
        required: true,
        description: "Full multi-line email body in the candidate's language",
    },
];

pub static APPLICATION_EMAIL: SchemaDescriptor = SchemaDescriptor {
    name: "JobApplicationEmail",
    description: "Personalized email for one job application",
    fields: &APPLICATION_EMAIL_FIELDS,
};

static APPLICATION_EMAILS_FIELDS: [FieldDescriptor; 1] = [FieldDescriptor {
    name: "emails",
    kind: FieldKind::ObjectList(&APPLICATION_EMAIL),
    required: true,
    description: "One email per listing that has a contact email",
}];

pub static APPLICATION_EMAILS: SchemaDescriptor = SchemaDescriptor {
    name: "JobApplicationEmails",
    description: "Personalized application emails",
    fields: &APPLICATION_EMAILS_FIELDS,
};

static ALL_SCHEMAS: [&SchemaDescriptor; 5] = [
    &RESUME_ANALYSIS,
    &JOB_LISTING,
    &JOB_LISTINGS,
    &APPLICATION_EMAIL,
    &APPLICATION_EMAILS,
];

/// Output schema of a pipeline stage.
pub fn schema_for(stage: StageKind) -> &'static SchemaDescriptor {
    match stage {
        StageKind::ResumeAnalysis => &RESUME_ANALYSIS,
        StageKind::JobSearch => &JOB_LISTINGS,
        StageKind::ApplicationEmails => &APPLICATION_EMAILS,
    }
}

pub fn schema_by_name(name: &str) -> Option<&'static SchemaDescriptor> {
    ALL_SCHEMAS.iter().copied().find(|s| s.name == name)
}

/// Basic email syntax check: `local@domain.tld`, no whitespace.
pub fn is_plausible_email(candidate: &str) -> bool {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE
        .get_or_init(|| {
            Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@.]{2,}$").expect("email regex is valid")
        })
        .is_match(candidate)
}
