use std::fmt::Display;
use std::hash::Hash;

use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use crate::import::ImportResult;
use toto_core::analysis::{Analysis, NextBest};
use toto_core::chain::TransitionTable;
use toto_core::check::Inconsistency;
use toto_core::entity::EntityStat;
use toto_core::models::Drawing;
use toto_core::projection::{color_combinations, color_pattern, odd_even_pattern, ProjectionKind};
use toto_core::ranking::RankedSequence;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn format_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:2}", n))
        .collect::<Vec<_>>()
        .join(" - ")
}

pub fn display_drawings(drawings: &[Drawing]) {
    if drawings.is_empty() {
        println!("No drawings to show.");
        return;
    }

    let mut table = new_table(vec!["Year", "Issue", "Numbers", "Color", "Odd/even"]);
    for drawing in drawings {
        let sorted = drawing.sorted_numbers();
        table.add_row(vec![
            drawing.year.to_string(),
            drawing.issue.to_string(),
            format_numbers(&sorted),
            color_pattern(&sorted),
            odd_even_pattern(&sorted),
        ]);
    }
    println!("{table}");
}

pub fn display_years(years: &[(u16, u32)]) {
    let total: u32 = years.iter().map(|(_, count)| count).sum();
    match (years.first(), years.last()) {
        (Some((first, _)), Some((last, _))) => println!(
            "{} drawings over {} years ({}-{})",
            total,
            years.len(),
            first,
            last
        ),
        _ => println!("No drawings stored."),
    }
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import finished:");
    println!("  Files read      : {}", result.files);
    println!("  Lines read      : {}", result.total_records);
    println!("  Inserted        : {}", result.inserted);
    println!("  Already present : {}", result.skipped);
    if result.errors > 0 {
        println!("  Errors          : {}", result.errors);
    }
}

fn entity_row<K: Display>(stat: &EntityStat<K>) -> Vec<String> {
    let common_gap = match stat.most_common_gap() {
        Some(record) => format!("{} ({}x)", record.gap, record.times_occurred),
        None => "—".to_string(),
    };
    vec![
        stat.key.to_string(),
        stat.times_occurred.to_string(),
        format!("{:.4}", stat.probability),
        format!("{:.2}", stat.average_frequency),
        common_gap,
    ]
}

/// Row for an entry that never occurred.
fn unseen_row(key: impl Display) -> Vec<String> {
    vec![
        key.to_string(),
        "0".to_string(),
        format!("{:.4}", 0.0),
        "—".to_string(),
        "—".to_string(),
    ]
}

pub fn display_numbers(entries: &[&EntityStat<u8>], unseen: &[u8], drawing_count: u32) {
    println!("\nNumbers over {} drawings\n", drawing_count);
    let mut table = new_table(vec!["Number", "Occurrences", "Probability", "Avg gap", "Most common gap"]);
    for stat in entries {
        table.add_row(entity_row(stat));
    }
    for number in unseen {
        table.add_row(unseen_row(number));
    }
    println!("{table}");
}

pub fn display_patterns(
    kind: ProjectionKind,
    entries: &[&EntityStat<String>],
    unseen: &[String],
    drawing_count: u32,
) {
    println!("\n{} patterns over {} drawings\n", kind, drawing_count);
    let is_color = kind == ProjectionKind::Color;
    let mut header = vec!["Pattern", "Occurrences", "Probability", "Avg gap", "Most common gap"];
    if is_color {
        header.push("Combinations");
    }
    let combinations = |pattern: &str| match color_combinations(pattern) {
        Ok(count) => count.to_string(),
        Err(_) => "—".to_string(),
    };

    let mut table = new_table(header);
    for stat in entries {
        let mut row = entity_row(stat);
        if is_color {
            row.push(combinations(&stat.key));
        }
        table.add_row(row);
    }
    for pattern in unseen {
        let mut row = unseen_row(pattern);
        if is_color {
            row.push(combinations(pattern));
        }
        table.add_row(row);
    }
    println!("{table}");
    if !unseen.is_empty() {
        println!("{} {} patterns never drawn.", unseen.len(), kind);
    }
}

pub fn display_inconsistencies(issues: &[Inconsistency]) {
    if issues.is_empty() {
        return;
    }
    println!("\nConsistency check failed:");
    for issue in issues {
        println!("  {}", issue);
    }
}

/// Whole chain: one row per source, its strongest successors inline.
pub fn display_chain<K: Display + Eq + Hash + Clone>(title: &str, chain: &TransitionTable<K>, top: usize) {
    println!("\nChain: {} ({} sources)\n", title, chain.len());
    let mut table = new_table(vec!["From", "Followed by", "Transitions"]);
    for (from, successors) in chain.iter() {
        let followers = successors
            .iter()
            .take(top)
            .map(|(to, count)| format!("{} ({})", to, count))
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![from.to_string(), followers, successors.total().to_string()]);
    }
    println!("{table}");
}

/// Successors of a single source with their share of its transitions.
pub fn display_successors<K: Display + Eq + Hash + Clone>(
    title: &str,
    from: &K,
    chain: &TransitionTable<K>,
    top: usize,
) {
    println!("\nChain: {}, from {}\n", title, from);
    let Some(successors) = chain.successors(from) else {
        println!("{} never appears in this chain.", from);
        return;
    };
    if successors.is_empty() {
        println!("{} was never followed by anything.", from);
        return;
    }

    let total = successors.total();
    let mut table = new_table(vec!["To", "Count", "Share"]);
    for (to, count) in successors.iter().take(top) {
        table.add_row(vec![
            to.to_string(),
            count.to_string(),
            format!("{:.2} %", *count as f64 * 100.0 / total as f64),
        ]);
    }
    println!("{table}");
}

pub fn display_next_best(analysis: &Analysis, next: &NextBest) {
    let last = analysis.last_drawing();
    println!(
        "\nLast drawing {}/{}: {}\n",
        last.year,
        last.issue,
        format_numbers(&last.sorted_numbers())
    );

    let mut table = new_table(vec!["Projection", "Last", "Next best", "Probability"]);
    for kind in ProjectionKind::ALL {
        let (next_cell, probability) = match next.pattern(kind) {
            Some(pattern) => (
                Cell::new(pattern).fg(Color::Green),
                format!("{:.4}", analysis.stats.pattern_probability(kind, pattern)),
            ),
            None => (Cell::new("none").fg(Color::Red), "—".to_string()),
        };
        table.add_row(vec![
            Cell::new(kind.label()),
            Cell::new(analysis.last_pattern(kind)),
            next_cell,
            Cell::new(probability),
        ]);
    }
    println!("{table}");

    let numbers: Vec<u8> = next.numbers.iter().copied().collect();
    println!("\nNext best numbers ({}): {}", numbers.len(), format_numbers(&numbers));
    if analysis.duplicate_count() > 0 {
        println!("{} drawings repeat an earlier drawing.", analysis.duplicate_count());
    }
}

pub fn display_ranked<S>(ranked: &[RankedSequence<S>], top: usize, score: impl Fn(&S) -> String) {
    if ranked.is_empty() {
        println!("No candidates left to rank.");
        return;
    }

    let mut table = new_table(vec!["#", "Numbers", "Score"]);
    for (i, entry) in ranked.iter().take(top).enumerate() {
        table.add_row(vec![
            format!("{}", i + 1),
            format_numbers(&entry.numbers),
            score(&entry.score),
        ]);
    }
    println!("{table}");
    if ranked.len() > top {
        println!("... {} more", ranked.len() - top);
    }
}
