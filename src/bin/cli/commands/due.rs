use anyhow::{Context, Result};
use chrono::Utc;

use contextvocab_lib::cards::algorithm::format_interval;

use crate::app::App;
use crate::render::terminal::{paint, status_color, truncate, Color};
use crate::OutputFormat;

pub fn run(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let now = Utc::now();
    let due = app
        .engine
        .compute_due_set(&app.owner, now)
        .context("Failed to compute due contexts")?;
    let words = app.list_words()?;

    let rows: Vec<_> = due
        .iter()
        .filter_map(|r| {
            let word = words.iter().find(|w| w.id == r.word_id)?;
            let unit = word.unit(r.unit_index)?;
            Some((word, r.unit_index, unit))
        })
        .collect();

    match format {
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = rows
                .iter()
                .map(|(word, index, unit)| {
                    serde_json::json!({
                        "wordId": word.id.to_string(),
                        "word": word.text,
                        "unitIndex": index,
                        "sentence": unit.content.sentence,
                        "status": unit.state.status,
                        "nextDue": unit.state.next_due.to_rfc3339(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if rows.is_empty() {
                println!("Nothing due. All caught up.");
                return Ok(());
            }

            let word_width = rows.iter().map(|(w, _, _)| w.text.chars().count()).max().unwrap_or(4).clamp(4, 20);
            let status_width = 10;
            let overdue_width = 8;

            println!("{:<ww$} {:<sw$} {:<ow$} {}",
                "Word", "Status", "Overdue", "Sentence",
                ww = word_width, sw = status_width, ow = overdue_width);
            println!("{} {} {} {}",
                "\u{2500}".repeat(word_width),
                "\u{2500}".repeat(status_width),
                "\u{2500}".repeat(overdue_width),
                "\u{2500}".repeat(40));

            for (word, _, unit) in &rows {
                let status = unit.state.status.label();
                let status = format!("{:<width$}", status, width = status_width);
                println!("{:<ww$} {} {:<ow$} {}",
                    truncate(&word.text, word_width),
                    paint(&status, status_color(unit.state.status), use_color),
                    format_interval(now - unit.state.next_due),
                    truncate(&unit.content.sentence, 60),
                    ww = word_width, ow = overdue_width);
            }

            println!("\n{} contexts due", paint(&rows.len().to_string(), Color::BOLD, use_color));
        }
    }

    Ok(())
}
