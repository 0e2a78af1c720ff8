use colored::Colorize;
use ios_config_core::{format_summary, format_text, DiffEntry};

use crate::summary::{DeviceStatus, GradingSummary};

/// Render diff entries for terminal output.
pub fn render_text(entries: &[DiffEntry]) -> String {
    let raw = format_text(entries);
    let mut out = Vec::new();

    for line in raw.lines() {
        out.push(color_diff_line(line));
    }

    out.join("\n")
}

/// Render summary counts for terminal output.
pub fn render_summary(entries: &[DiffEntry]) -> String {
    format_summary(entries).cyan().to_string()
}

fn color_diff_line(line: &str) -> String {
    let trimmed = line.trim_start();
    if trimmed.starts_with('+') {
        line.green().to_string()
    } else if trimmed.starts_with('-') {
        line.red().to_string()
    } else if trimmed.starts_with('~') {
        line.yellow().to_string()
    } else if trimmed.starts_with('!') {
        line.magenta().to_string()
    } else {
        line.to_string()
    }
}

fn color_score(score: f64) -> String {
    let text = format!("{score:.2}");
    if score >= 90.0 {
        text.green().to_string()
    } else if score >= 60.0 {
        text.yellow().to_string()
    } else {
        text.red().to_string()
    }
}

/// Render a grading summary as a human-readable report.
pub fn render_grading(summary: &GradingSummary) -> String {
    let mut out = Vec::new();
    out.push(format!(
        "{} {} (assignment: {}, devices: {})",
        "final score".bold(),
        color_score(summary.final_score),
        summary.assignment_type,
        summary.num_devices
    ));

    out.push(String::new());
    out.push("checks".bold().to_string());
    for (name, check) in &summary.per_router {
        let score = match check.score {
            Some(score) => color_score(score),
            None => "n/a".dimmed().to_string(),
        };
        out.push(format!(
            "- {name}: {score} (weight {}, effective {:.2})",
            check.weight, check.effective_weight
        ));
        for line in &check.feedback {
            if line.starts_with("---") {
                out.push(format!("    {}", line.cyan()));
            } else {
                out.push(format!("    {line}"));
            }
        }
    }

    out.push(String::new());
    out.push("devices".bold().to_string());
    for (id, device) in &summary.devices {
        let status = match device.status {
            DeviceStatus::Graded => "graded".green(),
            DeviceStatus::Missing => "missing".red(),
            DeviceStatus::Unparsable => "unparsable".red(),
        };
        let score = device
            .score
            .map(color_score)
            .unwrap_or_else(|| "n/a".dimmed().to_string());
        let file = device.student_file.as_deref().unwrap_or("-");
        out.push(format!("- {id} [{status}] file={file} score={score}"));
        if let Some(error) = &device.error {
            out.push(format!("    {}", error.red()));
        }
        for line in &device.unparsed_lines {
            out.push(format!("    ? line {}: {}", line.line, line.text).dimmed().to_string());
        }
        for line in &device.diff {
            out.push(format!("    {}", color_diff_line(line)));
        }
    }

    if !summary.notes.is_empty() {
        out.push(String::new());
        out.push("notes".bold().to_string());
        for note in &summary.notes {
            out.push(format!("- {}", note.yellow()));
        }
    }

    out.join("\n")
}
