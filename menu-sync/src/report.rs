//! Human-readable summaries printed by the CLI
//!
//! Renderers return strings so stdout carries only the report; logs go to
//! stderr through `tracing`.

use std::fmt::Write;

use serde_json::Value;
use shared::models::RestaurantSummary;

use crate::compare::{ComparisonReport, Presence, RestaurantDiff};
use crate::db::{MigrationState, MigrationStatus};
use crate::import::{Counts, ImportReport};

pub fn render_restaurants(restaurants: &[RestaurantSummary]) -> String {
    if restaurants.is_empty() {
        return "No restaurants found.\n".to_string();
    }
    let width = restaurants.iter().map(|r| r.slug.len()).max().unwrap_or(0);
    let mut out = String::new();
    for r in restaurants {
        let status = if r.is_active { "" } else { "  (inactive)" };
        let _ = writeln!(out, "{:<width$}  {}{status}", r.slug, r.name);
    }
    out
}

pub fn render_migrations(target: &str, statuses: &[MigrationStatus]) -> String {
    let mut out = String::new();
    let pending = statuses
        .iter()
        .filter(|m| m.state == MigrationState::Pending)
        .count();
    let _ = writeln!(out, "Migrations on {target}: {} known, {pending} pending", statuses.len());
    for m in statuses {
        let state = match m.state {
            MigrationState::Applied => "applied",
            MigrationState::Pending => "pending",
            MigrationState::ChecksumMismatch => "CHECKSUM MISMATCH",
            MigrationState::Failed => "FAILED",
            MigrationState::Unknown => "not in this build",
        };
        let _ = writeln!(out, "  {:04} {:<28} {state}", m.version, m.description);
    }
    out
}

fn counts(label: &str, c: &Counts) -> String {
    format!(
        "{label}: {} created, {} updated, {} unchanged, {} skipped",
        c.created, c.updated, c.unchanged, c.skipped
    )
}

pub fn render_import(report: &ImportReport) -> String {
    let mut out = String::new();
    let mode = if report.dry_run { " (dry run, rolled back)" } else { "" };
    let _ = writeln!(
        out,
        "Import{mode}: {} bundle(s), {} failed, policy {:?}",
        report.bundles.len(),
        report.failed().count(),
        report.policy
    );

    for bundle in &report.bundles {
        match &bundle.error {
            Some(error) => {
                let _ = writeln!(out, "\n[FAILED] {}: {} {}", bundle.label, error.code, error.message);
            }
            None => {
                let s = &bundle.stats;
                let _ = writeln!(out, "\n[OK] {}", bundle.label);
                for line in [
                    counts("restaurants", &s.restaurants),
                    counts("categories", &s.categories),
                    counts("items", &s.items),
                    counts("ingredients", &s.ingredients),
                ] {
                    let _ = writeln!(out, "  {line}");
                }
                let _ = writeln!(out, "  ingredient links rewritten for {} item(s)", s.associations_replaced);
                for c in &bundle.conflicts {
                    let _ = writeln!(
                        out,
                        "  conflict {:?} {} '{}': {}",
                        c.action,
                        c.entity,
                        c.key,
                        c.fields.join(", ")
                    );
                }
            }
        }
    }
    out
}

fn value(v: &Value) -> String {
    match v {
        Value::String(s) => format!("{s:?}"),
        other => other.to_string(),
    }
}

fn render_restaurant(out: &mut String, diff: &RestaurantDiff, verbose: bool) {
    match diff.presence {
        Presence::LeftOnly => {
            let _ = writeln!(out, "[-] {}: only in left source", diff.slug);
            return;
        }
        Presence::RightOnly => {
            let _ = writeln!(out, "[+] {}: only in right source", diff.slug);
            return;
        }
        Presence::Neither => {
            let _ = writeln!(out, "[?] {}: not found in either source", diff.slug);
            return;
        }
        Presence::Both => {}
    }

    let marker = if diff.is_identical() { "[=]" } else { "[~]" };
    let (l, r) = (diff.left.unwrap_or_default(), diff.right.unwrap_or_default());
    let _ = writeln!(
        out,
        "{marker} {}: categories {}/{}, items {}/{}, ingredients {}/{}, {} difference(s)",
        diff.slug,
        l.categories,
        r.categories,
        l.items,
        r.items,
        l.ingredients,
        r.ingredients,
        diff.difference_count()
    );

    if verbose {
        for f in &diff.fields {
            let _ = writeln!(
                out,
                "    {} '{}' {}: {} -> {}",
                f.entity,
                f.key,
                f.field,
                value(&f.left),
                value(&f.right)
            );
        }
        for e in &diff.removed {
            let _ = writeln!(out, "    - {} '{}'", e.entity, e.key);
        }
        for e in &diff.added {
            let _ = writeln!(out, "    + {} '{}'", e.entity, e.key);
        }
    }
}

pub fn render_comparison(report: &ComparisonReport, verbose: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Comparing {} (left) with {} (right)", report.left, report.right);
    for diff in &report.restaurants {
        render_restaurant(&mut out, diff, verbose);
    }
    if report.is_identical() {
        let _ = writeln!(out, "\nIdentical: no differences found");
    } else {
        let _ = writeln!(out, "\nFound {} difference(s)", report.difference_count());
    }
    out
}
