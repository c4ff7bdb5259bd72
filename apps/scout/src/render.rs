//! Console presentation of a finished run.

use std::io::{self, Write};

use serde_json::json;

use crate::errors::ScoutError;
use crate::models::{JobApplicationEmails, JobListings, ListingFilter, ResumeAnalysis};
use crate::pipeline::PipelineResult;

const RULE_WIDTH: usize = 60;
const BODY_RULE_WIDTH: usize = 56;

pub fn render_report<W: Write>(out: &mut W, result: &PipelineResult, filter: &ListingFilter) -> io::Result<()> {
    if let Some(analysis) = result.resume_analysis() {
        render_analysis(out, analysis)?;
    }
    if let Some(listings) = result.job_listings() {
        render_listings(out, listings, filter)?;
    }
    if let Some(emails) = result.application_emails() {
        render_emails(out, emails)?;
    }
    Ok(())
}

/// Machine-readable output: run id plus every stage's output keyed by stage name.
pub fn render_json<W: Write>(out: &mut W, result: &PipelineResult) -> io::Result<()> {
    let document = json!({
        "run_id": result.run_id,
        "stages": result.to_json(),
    });
    serde_json::to_writer_pretty(&mut *out, &document)?;
    writeln!(out)
}

/// Single failure notice. Nothing from the failed run is rendered.
pub fn render_failure<W: Write>(out: &mut W, error: &ScoutError) -> io::Result<()> {
    match (error.failed_stage(), error.failure_kind()) {
        (Some((position, stage)), Some(kind)) => {
            writeln!(out, "Pipeline failed at stage {position} ({stage}): {kind}")?;
        }
        _ => writeln!(out, "Pipeline failed")?,
    }
    writeln!(out, "  {error}")
}

fn heading<W: Write>(out: &mut W, title: &str) -> io::Result<()> {
    let rule = "=".repeat(RULE_WIDTH);
    writeln!(out, "\n{rule}\n{title}\n{rule}")
}

fn render_analysis<W: Write>(out: &mut W, analysis: &ResumeAnalysis) -> io::Result<()> {
    heading(out, "RESUME ANALYSIS")?;
    writeln!(out, "Experience Level: {}", analysis.experience_level)?;
    if let Some(years) = analysis.years_of_experience {
        writeln!(out, "Years of Experience: {years}")?;
    }
    if let Some(location) = &analysis.location {
        writeln!(out, "Location: {location}")?;
    }
    if let Some(country) = &analysis.country {
        writeln!(out, "Country: {country}")?;
    }
    writeln!(out, "Languages: {}", analysis.languages.join(", "))?;
    writeln!(out, "\nTechnical Skills ({}):", analysis.skills.len())?;
    for skill in &analysis.skills {
        writeln!(out, "  • {skill}")?;
    }
    Ok(())
}

fn render_listings<W: Write>(out: &mut W, listings: &JobListings, filter: &ListingFilter) -> io::Result<()> {
    let shown = filter.apply(listings);
    let title = if shown.len() == listings.len() {
        format!("JOB LISTINGS - Found {} opportunities", listings.len())
    } else {
        format!(
            "JOB LISTINGS - Showing {} of {} opportunities",
            shown.len(),
            listings.len()
        )
    };
    heading(out, &title)?;

    if listings.is_empty() {
        return writeln!(out, "No job listings found.");
    }
    writeln!(out, "Platforms: {}", listings.platforms().join(", "))?;
    writeln!(out, "Levels: {}\n", listings.levels().join(", "))?;

    for (i, job) in shown.iter().enumerate() {
        writeln!(out, "{}. {}", i + 1, job.job_title)?;
        writeln!(out, "   Company: {}", job.company)?;
        writeln!(out, "   Location: {}", job.location)?;
        writeln!(out, "   Platform: {}", job.platform)?;
        writeln!(out, "   Experience: {}", job.required_experience_level)?;
        if job.has_contact() {
            writeln!(out, "   Contact: {}", job.contact_email)?;
        }
        writeln!(out, "   Requirements: {}\n", job.key_requirements.join(", "))?;
    }
    Ok(())
}

fn render_emails<W: Write>(out: &mut W, emails: &JobApplicationEmails) -> io::Result<()> {
    heading(
        out,
        &format!("APPLICATION EMAILS - Drafted {} emails", emails.len()),
    )?;
    if emails.is_empty() {
        return writeln!(out, "No listing published a contact email.");
    }

    let rule = format!("   {}", "-".repeat(BODY_RULE_WIDTH));
    for (i, email) in emails.emails.iter().enumerate() {
        writeln!(out, "{}. APPLICATION FOR: {} at {}", i + 1, email.job_title, email.company)?;
        writeln!(out, "   To: {}", email.recipient_email)?;
        writeln!(out, "   Subject: {}", email.subject)?;
        writeln!(out, "\n   Email Body:\n{rule}")?;
        for line in email.body.lines() {
            writeln!(out, "   {line}")?;
        }
        writeln!(out, "{rule}\n")?;
    }
    Ok(())
}
