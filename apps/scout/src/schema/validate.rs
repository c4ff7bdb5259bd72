use std::fmt;

use serde::Serialize;
use serde_json::Value;

use super::{is_plausible_email, FieldKind, SchemaDescriptor};

/// A single mismatch between a JSON document and a schema descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaViolation {
    /// JSON path of the offending value, e.g. `jobs[2].contact_email`. Empty for the root.
    pub path: String,
    pub problem: String,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.problem)
        } else {
            write!(f, "{}: {}", self.path, self.problem)
        }
    }
}

/// Strictly validates `value` against `schema`, collecting every violation.
pub fn validate(schema: &SchemaDescriptor, value: &Value) -> Result<(), Vec<SchemaViolation>> {
    let mut violations = Vec::new();
    check_object(schema, value, "", &mut violations);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

fn violation(violations: &mut Vec<SchemaViolation>, path: &str, problem: impl Into<String>) {
    violations.push(SchemaViolation {
        path: path.to_string(),
        problem: problem.into(),
    });
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn check_object(
    schema: &SchemaDescriptor,
    value: &Value,
    path: &str,
    violations: &mut Vec<SchemaViolation>,
) {
    let Some(object) = value.as_object() else {
        violation(
            violations,
            path,
            format!("expected a {} object, found {}", schema.name, type_name(value)),
        );
        return;
    };

    for key in object.keys() {
        if schema.field(key).is_none() {
            violation(violations, &join(path, key), "unknown field");
        }
    }

    for field in schema.fields {
        let field_path = join(path, field.name);
        match object.get(field.name) {
            None | Some(Value::Null) if field.required => {
                violation(violations, &field_path, "missing required field");
            }
            None | Some(Value::Null) => {}
            Some(field_value) => check_kind(field.kind, field_value, &field_path, violations),
        }
    }
}

fn check_kind(kind: FieldKind, value: &Value, path: &str, violations: &mut Vec<SchemaViolation>) {
    match kind {
        FieldKind::Text => {
            if !value.is_string() {
                violation(violations, path, format!("expected string, found {}", type_name(value)));
            }
        }
        FieldKind::Enum(options) => match value.as_str() {
            Some(s) if options.contains(&s) => {}
            Some(s) => violation(
                violations,
                path,
                format!("'{s}' is not one of {}", options.join(", ")),
            ),
            None => violation(violations, path, format!("expected string, found {}", type_name(value))),
        },
        FieldKind::Count => match value.as_u64() {
            Some(n) if n <= u64::from(u32::MAX) => {}
            Some(n) => violation(violations, path, format!("{n} is out of range")),
            None => violation(
                violations,
                path,
                format!("expected non-negative integer, found {value}"),
            ),
        },
        FieldKind::Email => match value.as_str() {
            Some("") => {}
            Some(s) if is_plausible_email(s) => {}
            Some(s) => violation(
                violations,
                path,
                format!("'{s}' is not an email address; use an empty string when unknown"),
            ),
            None => violation(violations, path, format!("expected string, found {}", type_name(value))),
        },
        FieldKind::RequiredEmail => match value.as_str() {
            Some(s) if is_plausible_email(s) => {}
            Some(s) => violation(violations, path, format!("'{s}' is not an email address")),
            None => violation(violations, path, format!("expected string, found {}", type_name(value))),
        },
        FieldKind::TextList => match value.as_array() {
            Some(items) => {
                for (i, item) in items.iter().enumerate() {
                    if !item.is_string() {
                        violation(
                            violations,
                            &format!("{path}[{i}]"),
                            format!("expected string, found {}", type_name(item)),
                        );
                    }
                }
            }
            None => violation(violations, path, format!("expected array, found {}", type_name(value))),
        },
        FieldKind::Object(nested) => check_object(nested, value, path, violations),
        FieldKind::ObjectList(nested) => match value.as_array() {
            Some(items) => {
                for (i, item) in items.iter().enumerate() {
                    check_object(nested, item, &format!("{path}[{i}]"), violations);
                }
            }
            None => violation(violations, path, format!("expected array, found {}", type_name(value))),
        },
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::schema::{APPLICATION_EMAILS, JOB_LISTINGS, RESUME_ANALYSIS};

    fn listing(contact_email: &str) -> Value {
        json!({
            "job_title": "Backend Engineer",
            "company": "Acme",
            "location": "Remote",
            "platform": "LinkedIn",
            "required_experience_level": "Mid-Level",
            "key_requirements": ["Go", "PostgreSQL"],
            "contact_email": contact_email
        })
    }

    #[test]
    fn test_valid_resume_analysis_minimal() {
        let value = json!({
            "experience_level": "Mid-Level",
            "skills": ["Go", "PostgreSQL"],
            "languages": ["Portuguese", "English"]
        });
        assert!(validate(&RESUME_ANALYSIS, &value).is_ok());
    }

    #[test]
    fn test_valid_resume_analysis_with_optional_fields() {
        let value = json!({
            "experience_level": "Senior",
            "years_of_experience": 6,
            "skills": [],
            "location": "Lisbon",
            "country": null,
            "languages": []
        });
        assert!(validate(&RESUME_ANALYSIS, &value).is_ok());
    }

    #[test]
    fn test_rejects_unknown_field() {
        let value = json!({
            "experience_level": "Junior",
            "skills": [],
            "languages": [],
            "hobbies": ["chess"]
        });
        let errors = validate(&RESUME_ANALYSIS, &value).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "hobbies");
        assert_eq!(errors[0].problem, "unknown field");
    }

    #[test]
    fn test_rejects_missing_and_null_required_fields() {
        let value = json!({ "experience_level": "Junior", "skills": null });
        let errors = validate(&RESUME_ANALYSIS, &value).unwrap_err();
        let paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["skills", "languages"]);
    }

    #[test]
    fn test_rejects_experience_level_outside_closed_set() {
        let value = json!({ "experience_level": "Pleno", "skills": [], "languages": [] });
        let errors = validate(&RESUME_ANALYSIS, &value).unwrap_err();
        assert!(errors[0].problem.contains("'Pleno' is not one of"));
    }

    #[test]
    fn test_rejects_negative_and_fractional_years() {
        for years in [json!(-1), json!(2.5), json!("3")] {
            let value = json!({
                "experience_level": "Junior",
                "years_of_experience": years,
                "skills": [],
                "languages": []
            });
            assert!(validate(&RESUME_ANALYSIS, &value).is_err());
        }
    }

    #[test]
    fn test_rejects_years_beyond_decodable_range() {
        let value = json!({
            "experience_level": "Senior",
            "years_of_experience": 5_000_000_000u64,
            "skills": [],
            "languages": []
        });
        let errors = validate(&RESUME_ANALYSIS, &value).unwrap_err();
        assert_eq!(errors[0].path, "years_of_experience");
        assert!(errors[0].problem.contains("out of range"));
    }

    #[test]
    fn test_rejects_non_string_list_items() {
        let value = json!({ "experience_level": "Lead", "skills": ["Rust", 7], "languages": [] });
        let errors = validate(&RESUME_ANALYSIS, &value).unwrap_err();
        assert_eq!(errors[0].path, "skills[1]");
    }

    #[test]
    fn test_rejects_non_object_root() {
        let errors = validate(&JOB_LISTINGS, &json!([listing("")])).unwrap_err();
        assert!(errors[0].problem.contains("expected a JobListings object, found array"));
    }

    #[test]
    fn test_contact_email_accepts_empty_sentinel() {
        let value = json!({ "jobs": [listing(""), listing("talent@acme.io")] });
        assert!(validate(&JOB_LISTINGS, &value).is_ok());
    }

    #[test]
    fn test_contact_email_rejects_placeholders() {
        let value = json!({ "jobs": [listing("N/A"), listing("unknown")] });
        let errors = validate(&JOB_LISTINGS, &value).unwrap_err();
        let paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["jobs[0].contact_email", "jobs[1].contact_email"]);
    }

    #[test]
    fn test_empty_job_list_is_valid() {
        assert!(validate(&JOB_LISTINGS, &json!({ "jobs": [] })).is_ok());
    }

    #[test]
    fn test_recipient_email_must_be_non_empty() {
        let value = json!({
            "emails": [{
                "job_title": "Backend Engineer",
                "company": "Acme",
                "recipient_email": "",
                "subject": "Application",
                "body": "Hello"
            }]
        });
        let errors = validate(&APPLICATION_EMAILS, &value).unwrap_err();
        assert_eq!(errors[0].path, "emails[0].recipient_email");
    }

    #[test]
    fn test_violation_display_includes_path() {
        let v = SchemaViolation {
            path: "jobs[0].company".to_string(),
            problem: "expected string, found number".to_string(),
        };
        assert_eq!(v.to_string(), "jobs[0].company: expected string, found number");
    }
}
