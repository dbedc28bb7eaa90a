use anyhow::Result;

use contextvocab_lib::cards::query::tag_counts;

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &App, format: &OutputFormat) -> Result<()> {
    let stats = app.stats()?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        OutputFormat::Plain => {
            println!("Contexts:   {}", stats.total);
            println!("  new:       {}", stats.new_count);
            println!("  learning:  {}", stats.learning_count);
            println!("  review:    {}", stats.review_count);
            println!("  graduated: {}", stats.graduated_count);
            println!("Due now:    {}", stats.due_count);
        }
    }

    Ok(())
}

pub fn run_tags(app: &App, format: &OutputFormat) -> Result<()> {
    let words = app.list_words()?;
    let mut tags: Vec<(String, usize)> = tag_counts(&words).into_iter().collect();

    // Sort by count descending
    tags.sort_by(|a, b| b.1.cmp(&a.1));

    match format {
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = tags.iter().map(|(tag, count)| {
                serde_json::json!({
                    "tag": tag,
                    "count": count,
                })
            }).collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if tags.is_empty() {
                println!("No tags found.");
                return Ok(());
            }

            let max_tag_len = tags.iter().map(|(t, _)| t.chars().count()).max().unwrap_or(5).max(5);

            println!("{:<width$} Count", "Tag", width = max_tag_len + 1);
            println!("{} {}", "\u{2500}".repeat(max_tag_len + 1), "\u{2500}".repeat(6));

            for (tag, count) in &tags {
                println!("#{:<width$} {}", tag, count, width = max_tag_len);
            }

            println!("\n{} tags total", tags.len());
        }
    }

    Ok(())
}
