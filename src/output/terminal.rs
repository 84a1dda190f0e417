// Colored terminal output for verdicts, watch lists, and batch summaries.

use colored::Colorize;

use super::truncate_chars;
use crate::detection::result::DetectionResult;
use crate::settings::models::Settings;

/// Display a single verdict.
pub fn display_result(text: &str, result: &DetectionResult) {
    println!("\n{}", format!("\"{}\"", truncate_chars(text, 100)).dimmed());

    let verdict = if result.is_spoiler {
        "SPOILER".red().bold()
    } else {
        "clear".green()
    };
    println!("  Verdict:    {}", verdict);
    println!("  Confidence: {}", colorize_confidence(result.confidence));
    println!("  Method:     {}", result.method);

    if !result.matched_titles.is_empty() {
        println!("  Titles:     {}", result.matched_titles.join(", "));
    }
    if let Some(reasoning) = &result.reasoning {
        println!("  Reasoning:  {}", reasoning.dimmed());
    }
    if let Some(error) = &result.error {
        println!("  {} {}", "Error:".yellow(), error);
    }
}

/// Display the watch list and preferences.
pub fn display_settings(settings: &Settings) {
    let state = if settings.enabled {
        "enabled".green()
    } else {
        "disabled".yellow()
    };
    println!("Detection: {}  |  Sensitivity: {}", state, settings.sensitivity);

    if settings.monitored_titles.is_empty() {
        println!("Watch list: empty");
        println!("  Run `spoilerguard add \"<title>\"` to protect a title");
        return;
    }

    println!("Watch list ({} titles):", settings.monitored_titles.len());
    for title in &settings.monitored_titles {
        let id = if title.id == title.title {
            String::new()
        } else {
            format!(" [{}]", title.id).dimmed().to_string()
        };
        match &title.description {
            Some(desc) => println!(
                "  - {}{}  {}",
                title.title,
                id,
                truncate_chars(desc, 60).dimmed()
            ),
            None => println!("  - {}{}", title.title, id),
        }
    }
}

/// Display flagged lines from a batch check, followed by a summary.
pub fn display_batch_summary(texts: &[String], results: &[DetectionResult]) {
    let flagged: Vec<(usize, &String, &DetectionResult)> = texts
        .iter()
        .zip(results)
        .enumerate()
        .filter(|(_, (_, r))| r.is_spoiler)
        .map(|(i, (t, r))| (i, t, r))
        .collect();
    let errors = results.iter().filter(|r| r.error.is_some()).count();

    if !flagged.is_empty() {
        println!("\n{}", format!("=== Flagged ({}) ===", flagged.len()).bold());
        for (i, text, result) in &flagged {
            println!(
                "  {:>4}. [{:.2} {}] {}",
                i + 1,
                result.confidence,
                result.method,
                truncate_chars(text, 80).dimmed()
            );
        }
    }

    println!("\n{}", "=== Summary ===".bold());
    println!("  Texts checked: {}", results.len());
    println!("  Spoilers:      {}", flagged.len());
    if errors > 0 {
        println!("  {}        {}", "Errors:".yellow(), errors);
    }
}

fn colorize_confidence(confidence: f64) -> colored::ColoredString {
    let text = format!("{confidence:.2}");
    match confidence {
        c if c >= 0.7 => text.red().bold(),
        c if c >= 0.4 => text.yellow(),
        _ => text.normal(),
    }
}
