use anyhow::Result;
use chrono::Utc;

use contextvocab_lib::cards::algorithm::{format_interval, preview_intervals};
use contextvocab_lib::cards::due::{aggregate_status, earliest_due};
use contextvocab_lib::cards::query::filter_words;
use contextvocab_lib::cards::Grade;

use crate::app::App;
use crate::render::terminal::{aggregate_color, paint, status_color, truncate, Color};
use crate::OutputFormat;

pub fn run(
    app: &App,
    query: Option<&str>,
    tag: Option<&str>,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let all_words = app.list_words()?;
    let words = filter_words(&all_words, query, tag);
    let now = Utc::now();

    match format {
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = words
                .iter()
                .map(|word| {
                    serde_json::json!({
                        "id": word.id.to_string(),
                        "word": word.text,
                        "contexts": word.units.len(),
                        "status": aggregate_status(word),
                        "earliestDue": earliest_due(word).map(|d| d.to_rfc3339()),
                        "createdAt": word.created_at.to_rfc3339(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if words.is_empty() {
                println!("No words found.");
                return Ok(());
            }

            let word_width = words.iter().map(|w| w.text.chars().count()).max().unwrap_or(4).clamp(4, 24);
            let status_width = 11;

            println!("{:<ww$} {:<sw$} {:>8} {}",
                "Word", "Status", "Contexts", "Next review",
                ww = word_width, sw = status_width);
            println!("{} {} {} {}",
                "\u{2500}".repeat(word_width),
                "\u{2500}".repeat(status_width),
                "\u{2500}".repeat(8),
                "\u{2500}".repeat(12));

            for word in &words {
                let status = aggregate_status(word);
                let status_text = format!("{:<width$}", status.label(), width = status_width);
                let next = match earliest_due(word) {
                    Some(due) if due <= now => paint("due now", Color::RED, use_color),
                    Some(due) => format!("in {}", format_interval(due - now)),
                    None => "-".to_string(),
                };

                println!("{:<ww$} {} {:>8} {}",
                    truncate(&word.text, word_width),
                    paint(&status_text, aggregate_color(status), use_color),
                    word.units.len(),
                    next,
                    ww = word_width);
            }

            println!("\n{} words total", words.len());
        }
    }

    Ok(())
}

pub fn run_show(app: &App, text: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    let word = app.find_word(text)?;

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&word)?);
        return Ok(());
    }

    let now = Utc::now();
    println!("{}", paint(&word.text, Color::BOLD, use_color));
    if let Some(mnemonic) = &word.mnemonic {
        println!("{}", paint(mnemonic, Color::DIM, use_color));
    }

    for (i, unit) in word.units.iter().enumerate() {
        let status = unit.state.status;
        println!();
        println!("#{} {}  {}",
            i + 1,
            paint(status.label(), status_color(status), use_color),
            unit.content.meaning);
        println!("   {}", unit.content.sentence);
        if let Some(translation) = &unit.content.sentence_translation {
            println!("   {}", paint(translation, Color::DIM, use_color));
        }
        if !unit.content.tags.is_empty() {
            let tags = unit.content.tags.iter()
                .map(|t| format!("#{}", t))
                .collect::<Vec<_>>()
                .join(" ");
            println!("   {}", paint(&tags, Color::GRAY, use_color));
        }
        if let Some(link) = unit.content.source.video_link() {
            println!("   {}", paint(&link, Color::GRAY, use_color));
        }

        let due = if unit.state.is_due(now) {
            "due now".to_string()
        } else {
            format!("due in {}", format_interval(unit.state.next_due - now))
        };
        let preview = preview_intervals(&unit.state, now)
            .iter()
            .zip(Grade::ALL.iter())
            .map(|(interval, grade)| format!("{} {}", grade.label(), format_interval(*interval)))
            .collect::<Vec<_>>()
            .join(", ");
        println!("   {} | ease {:.2} | streak {} | {}",
            due, unit.state.ease_factor, unit.state.repetition, preview);
    }

    Ok(())
}
