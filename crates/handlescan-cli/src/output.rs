//! Human-readable rendering of probe reports.

use handlescan_catalog::PlatformCatalog;
use handlescan_scanner::{ProbeOutcome, ProbeReport, RunCompletion, VerdictKind};
use std::fmt::Write;

fn marker(kind: VerdictKind) -> &'static str {
    match kind {
        VerdictKind::Found => "[+]",
        VerdictKind::NotFound => "[-]",
        VerdictKind::Uncertain => "[?]",
    }
}

fn name_width(outcomes: &[ProbeOutcome]) -> usize {
    outcomes
        .iter()
        .map(|o| o.platform_name.chars().count())
        .max()
        .unwrap_or(0)
}

/// One line per platform, metadata under found profiles, then a summary.
pub fn render_report(report: &ProbeReport) -> String {
    let mut out = String::new();
    let width = name_width(&report.outcomes);

    let _ = writeln!(out, "Results for \"{}\"", report.username);
    for outcome in &report.outcomes {
        let _ = write!(
            out,
            "{} {:<width$}  {}",
            marker(outcome.kind()),
            outcome.platform_name,
            outcome.url
        );
        if let Some(reason) = &outcome.verdict.evidence.reason {
            let _ = write!(out, "  ({reason})");
        }
        out.push('\n');

        if let Some(metadata) = &outcome.metadata {
            if let Some(description) = &metadata.description {
                let _ = writeln!(out, "      about: {description}");
            }
            if let Some(image) = &metadata.image {
                let _ = writeln!(out, "      image: {image}");
            }
        }
    }

    let summary = report.summary();
    let _ = writeln!(
        out,
        "\nFound {}, not found {}, uncertain {} ({} platforms in {:.1}s)",
        summary.found,
        summary.not_found,
        summary.uncertain,
        summary.total(),
        report.elapsed.as_secs_f64()
    );

    match report.completion {
        RunCompletion::Complete => {}
        RunCompletion::Cancelled => out.push_str("Run cancelled before every platform answered.\n"),
        RunCompletion::DeadlineExceeded => {
            out.push_str("Run deadline reached before every platform answered.\n");
        }
    }

    out
}

/// Table of catalog entries for `--list`.
pub fn render_catalog(catalog: &PlatformCatalog) -> String {
    let id_width = catalog
        .iter()
        .map(|p| p.id.as_str().len())
        .max()
        .unwrap_or(0);
    let name_width = catalog
        .iter()
        .map(|p| p.name.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for platform in catalog {
        let _ = writeln!(
            out,
            "{:<id_width$}  {:<name_width$}  {}",
            platform.id.as_str(),
            platform.name,
            platform.category.display_name()
        );
    }
    out
}
