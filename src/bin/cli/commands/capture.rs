use anyhow::{bail, Context, Result};

use contextvocab_lib::cards::{MergeOutcome, UnitContent, UnitSource};

use crate::app::App;
use crate::render::terminal::{paint, Color};
use crate::OutputFormat;

#[allow(clippy::too_many_arguments)]
pub fn run(
    app: &App,
    word: &str,
    sentence: String,
    meaning: String,
    translation: Option<String>,
    tags: Option<&str>,
    source: &str,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let tag_list = tags
        .map(|t| {
            t.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let mut content = UnitContent::new(sentence, meaning)
        .with_source(parse_source(source)?)
        .with_tags(tag_list);
    if let Some(translation) = translation {
        content = content.with_translation(translation);
    }

    let outcome = app.capture(word, content)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        OutputFormat::Plain => {
            let word = outcome.word();
            let title = paint(&word.text, Color::BOLD, use_color);
            match &outcome {
                MergeOutcome::CreatedWord { .. } => println!("Created \"{}\"", title),
                MergeOutcome::AppendedUnit { unit_index, .. } => {
                    println!("Added context #{} to \"{}\"", unit_index + 1, title)
                }
                MergeOutcome::Duplicate { unit_index, .. } => println!(
                    "{} \"{}\" already has this sentence as context #{}",
                    paint("Skipped:", Color::YELLOW, use_color),
                    title,
                    unit_index + 1
                ),
            }
            println!("  Contexts: {}", word.units.len());
            println!("  ID: {}", word.id);
        }
    }

    Ok(())
}

/// Parse `manual`, `import:<tag>` or `video:<session>:<video-id>:<seconds>`
fn parse_source(source: &str) -> Result<UnitSource> {
    let parts: Vec<&str> = source.splitn(4, ':').collect();
    match parts.as_slice() {
        ["manual"] => Ok(UnitSource::Manual),
        ["import", tag] if !tag.is_empty() => Ok(UnitSource::BatchImport {
            tag: tag.to_string(),
        }),
        ["video", session_id, video_id, offset] => Ok(UnitSource::VideoTimestamp {
            session_id: session_id.to_string(),
            video_id: video_id.to_string(),
            offset_secs: offset
                .parse()
                .with_context(|| format!("Invalid video offset '{}'", offset))?,
        }),
        _ => bail!(
            "Unknown source '{}'. Use manual, import:<tag> or video:<session>:<video-id>:<seconds>",
            source
        ),
    }
}
