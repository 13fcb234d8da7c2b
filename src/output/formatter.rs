use std::io::IsTerminal;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use serde::Serialize;
use terminal_size::{terminal_size, Width};

use crate::evaluate::{AuditReport, Portfolio, PortfolioEntry};
use crate::scoring::{Decision, Factor, ResilienceGrade, SweepPoint};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a score: one decimal below 1000, compact above (1.5k, 2.3M)
///
/// Scores built from raw GDP per capita reach the millions, index-scale ones
/// stay in the hundreds.
pub fn format_score(score: f64) -> String {
    let formatted = if score >= 1_000_000.0 {
        format!("{:.1}M", score / 1_000_000.0)
    } else if score >= 1_000.0 {
        format!("{:.1}k", score / 1_000.0)
    } else {
        format!("{:.1}", score)
    };

    // Trim trailing .0 on compact forms (e.g., "1.0k" -> "1k")
    formatted.replace(".0M", "M").replace(".0k", "k")
}

/// Format a capital amount in millions, e.g. "$24.3M"
pub fn format_money(amount: f64) -> String {
    format!("${:.1}M", amount)
}

/// Format a 0-1 fraction as a percentage, e.g. "84.6%"
pub fn format_percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

/// Format a signed delta in percentage points, e.g. "+2.5pp"
fn format_delta(delta: Option<f64>, unit: &str) -> String {
    match delta {
        Some(d) => format!("{:+.1}{}", d, unit),
        None => "n/a".to_string(),
    }
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate a name to fit available width, accounting for Unicode
fn truncate_name(name: &str, max_width: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_width {
        name.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

fn decision_label(decision: Decision, use_colors: bool) -> String {
    let label = decision.to_string();
    if !use_colors {
        return label;
    }
    match decision {
        Decision::Deploy => label.green().bold().to_string(),
        Decision::Veto => label.red().bold().to_string(),
    }
}

fn resilience_label(grade: ResilienceGrade, use_colors: bool) -> String {
    let label = format!("{:<10}", grade.to_string());
    if !use_colors {
        return label;
    }
    match grade {
        ResilienceGrade::Resilient => label.green().to_string(),
        ResilienceGrade::Vulnerable => label.yellow().to_string(),
    }
}

/// Width left for the country column once the fixed columns are placed
fn name_width(fixed_width: usize, entries: &[PortfolioEntry]) -> usize {
    let longest = entries
        .iter()
        .map(|e| e.record.name.chars().count())
        .max()
        .unwrap_or(0);
    match get_terminal_width() {
        Some(width) if width > fixed_width + 10 => longest.min(width - fixed_width),
        Some(_) => longest.min(16),
        None => longest,
    }
}

/// Format the ranked shortlist as a table
/// Columns: Index, Score, Country, Stage, Resilience, Decision
/// No headers, same minimal style as the allocation table
pub fn format_portfolio_table(portfolio: &Portfolio, use_colors: bool) -> String {
    if portfolio.entries.is_empty() {
        return "No markets to rank.".to_string();
    }

    let index_width = 3;
    let score_width = 7;
    let separator = "  ";
    // index + score + stage(7) + resilience(10) + decision(6) + separators
    let fixed_width = index_width + 1 + score_width + 7 + 10 + 6 + separator.len() * 4;
    let width = name_width(fixed_width, &portfolio.entries);

    portfolio
        .entries
        .iter()
        .map(|entry| {
            let index_str = format!("{:>2}.", entry.rank);
            let score_str = format!("{:>w$}", format_score(entry.score), w = score_width);
            let name = format!("{:<w$}", truncate_name(&entry.record.name, width), w = width);
            let stage = format!("{:<7}", entry.classification.stage.to_string());
            let resilience = resilience_label(entry.classification.resilience, use_colors);
            let decision = decision_label(entry.classification.decision, use_colors);

            if use_colors {
                format!(
                    "{} {}{}{}{}{}{}{}{}{}",
                    index_str.dimmed(),
                    score_str.bold(),
                    separator,
                    name,
                    separator,
                    stage.cyan(),
                    separator,
                    resilience,
                    separator,
                    decision
                )
            } else {
                format!(
                    "{} {}{}{}{}{}{}{}{}{}",
                    index_str,
                    score_str,
                    separator,
                    name,
                    separator,
                    stage,
                    separator,
                    resilience,
                    separator,
                    decision
                )
                .trim_end()
                .to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format the capital split as a table with a closing total line
/// Columns: Index, Country, Amount, Share
pub fn format_allocation_table(portfolio: &Portfolio, use_colors: bool) -> String {
    if portfolio.entries.is_empty() {
        return "No markets qualify for allocation.".to_string();
    }

    let separator = "  ";
    let fixed_width = 3 + 1 + 9 + 7 + separator.len() * 2;
    let width = name_width(fixed_width, &portfolio.entries);

    let mut lines: Vec<String> = portfolio
        .entries
        .iter()
        .map(|entry| {
            let index_str = format!("{:>2}.", entry.rank);
            let name = format!("{:<w$}", truncate_name(&entry.record.name, width), w = width);
            let amount = entry.amount.map_or_else(|| "-".to_string(), format_money);
            let share = entry.share.map_or_else(|| "-".to_string(), format_percent);
            let amount = format!("{:>9}", amount);
            let share = format!("{:>7}", share);

            if use_colors {
                format!(
                    "{} {}{}{}{}{}",
                    index_str.dimmed(),
                    name,
                    separator,
                    amount.bold(),
                    separator,
                    share.dimmed()
                )
            } else {
                format!("{} {}{}{}{}{}", index_str, name, separator, amount, separator, share)
            }
        })
        .collect();

    let allocated: f64 = portfolio.entries.iter().filter_map(|e| e.amount).sum();
    lines.push(format!(
        "Total: {} across {} markets",
        format_money(allocated),
        portfolio.entries.len()
    ));
    if portfolio.vetoed > 0 {
        lines.push(format!(
            "{} of {} markets vetoed by the margin of safety",
            portfolio.vetoed, portfolio.considered
        ));
    }

    lines.join("\n")
}

/// Format the shortlist as tab-separated values for scripting
/// Columns: rank, country, score, stage, resilience, decision, amount (no headers, no colors)
/// The amount column is empty when nothing was allocated
pub fn format_portfolio_tsv(portfolio: &Portfolio) -> String {
    portfolio
        .entries
        .iter()
        .map(|entry| {
            format!(
                "{}\t{}\t{:.2}\t{}\t{}\t{}\t{}",
                entry.rank,
                entry.record.name,
                entry.score,
                entry.classification.stage,
                entry.classification.resilience,
                entry.classification.decision,
                entry.amount.map_or_else(String::new, |a| format!("{:.4}", a))
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a single-country audit as a multi-line report
pub fn format_audit(report: &AuditReport, use_colors: bool) -> String {
    let record = report.record;
    let factors = report
        .score
        .breakdown
        .factors
        .iter()
        .map(|f| format!("{} {:.3}^{} = {:.3}", f.factor, f.value, f.weight, f.weighted))
        .collect::<Vec<_>>()
        .join(", ");

    let stage_line = format!(
        "{} ({:.1}% share, threshold {:.0}%)",
        report.classification.stage, record.current_adoption_share, report.stage_threshold
    );
    let resilience_line = format!(
        "{} ({} survival, margin {})",
        report.classification.resilience,
        format_percent(record.survival_probability),
        format_percent(report.margin_of_safety)
    );
    let gap = record
        .opportunity_gap
        .map_or_else(|| "n/a".to_string(), |g| format!("{:.2}", g));

    let roi = format_score(report.score.score);
    let verdict = report
        .intel
        .render_verdict(&roi)
        .map_or_else(String::new, |v| format!("\n  Verdict: {}", v));

    let title = record.name.to_uppercase();
    let (title, decision, headline) = if use_colors {
        (
            title.bold().to_string(),
            decision_label(report.classification.decision, true),
            report.intel.headline.cyan().to_string(),
        )
    } else {
        (
            title,
            report.classification.decision.to_string(),
            report.intel.headline.clone(),
        )
    };

    format!(
        "{}\n  ROI Score: {} (base {}, rank {} of {})\n  Factors: {}; damping 1/{:.2}\n  Market Stage: {}\n  Resilience: {}\n  Decision: {}\n  Market Room: {}\n  Share Change: {}\n  Policy Change: {}\n  Opportunity Gap: {}\n  {}: {}{}",
        title,
        roi,
        format_score(report.base_score),
        report.rank,
        report.of,
        factors,
        report.score.breakdown.damping,
        stage_line,
        resilience_line,
        decision,
        format_percent(record.market_room),
        format_delta(report.share_delta, "pp"),
        format_delta(report.policy_delta, ""),
        gap,
        headline,
        report.intel.context,
        verdict
    )
}

/// Format a weight sweep for one country
pub fn format_sweep(country: &str, factor: Factor, points: &[SweepPoint], use_colors: bool) -> String {
    if points.is_empty() {
        return "No weights to evaluate.".to_string();
    }

    let header = format!("{}: varying {} weight", country, factor);
    let header = if use_colors {
        header.bold().to_string()
    } else {
        header
    };

    let rows = points.iter().map(|p| {
        let ratio = p
            .ratio
            .map_or_else(|| "n/a".to_string(), |r| format!("x{:.3}", r));
        format!("  {:>5.2}  {:>7}  {}", p.weight, format_score(p.score), ratio)
    });

    std::iter::once(header)
        .chain(rows)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pretty JSON for `--format json`
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize output as JSON")
}
