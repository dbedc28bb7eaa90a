use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use chrono::Utc;

use contextvocab_lib::cards::algorithm::{format_interval, preview_intervals};
use contextvocab_lib::cards::{EngineError, Grade, SessionError};
use contextvocab_lib::store::UnitStore;

use crate::app::App;
use crate::render::terminal::{cloze, paint, status_color, Color};

pub fn run(app: &App, use_color: bool) -> Result<()> {
    let due = app
        .engine
        .compute_due_set(&app.owner, Utc::now())
        .context("Failed to compute due contexts")?;

    let mut session = match app.engine.start_session(due) {
        Ok(session) => session,
        Err(EngineError::Session(SessionError::EmptyQueue)) => {
            println!("Nothing due. All caught up.");
            return Ok(());
        }
        Err(e) => return Err(e).context("Failed to start review session"),
    };

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    while !session.is_complete() {
        let current = session.current()?;
        let word = app
            .engine
            .store()
            .get_word(current.word_id)
            .context("Failed to load word")?;
        let unit = word
            .unit(current.unit_index)
            .context("Context no longer exists")?;

        let (reviewed, queued) = session.progress();
        println!();
        println!(
            "{}",
            paint(
                &format!("[{} reviewed, {} left of {}]", reviewed, session.remaining(), queued),
                Color::GRAY,
                use_color
            )
        );
        println!("{}", cloze(&unit.content.sentence, &word.text));
        if let Some(translation) = &unit.content.sentence_translation {
            println!("{}", paint(translation, Color::DIM, use_color));
        }

        if prompt(&mut lines, "Enter to reveal, q to quit: ")?.as_deref() == Some("q") {
            break;
        }

        println!(
            "{}  {}",
            paint(&word.text, Color::BOLD, use_color),
            unit.content.meaning
        );
        if let Some(link) = unit.content.source.video_link() {
            println!("{}", paint(&link, Color::GRAY, use_color));
        }

        let preview = preview_intervals(&unit.state, Utc::now());
        let options: Vec<String> = Grade::ALL
            .iter()
            .zip(preview.iter())
            .enumerate()
            .map(|(i, (grade, interval))| {
                format!("{}) {} {}", i + 1, grade.label(), format_interval(*interval))
            })
            .collect();
        println!("{}", options.join("   "));

        let grade = loop {
            match prompt(&mut lines, "Grade: ")? {
                None => {
                    finish(&session);
                    return Ok(());
                }
                Some(input) => match parse_grade(&input) {
                    Some(grade) => break grade,
                    None => println!("{}", paint("Use 1-4 or again/hard/good/easy", Color::RED, use_color)),
                },
            }
        };

        let graded = app
            .engine
            .grade(&mut session, grade, Utc::now())
            .context("Failed to record grade")?;
        let status = graded.state.status;
        println!(
            "  {} next in {}",
            paint(status.label(), status_color(status), use_color),
            format_interval(graded.state.interval)
        );
    }

    finish(&session);
    Ok(())
}

fn finish(session: &contextvocab_lib::cards::ReviewSession) {
    if session.is_complete() {
        println!("\nReview complete: {} grades recorded.", session.reviewed_count());
    } else {
        println!("\nStopped after {} grades.", session.reviewed_count());
    }
}

/// Print a prompt and read one trimmed line; `None` on end of input
fn prompt<B: BufRead>(lines: &mut io::Lines<B>, text: &str) -> Result<Option<String>> {
    print!("{}", text);
    io::stdout().flush()?;
    match lines.next() {
        Some(line) => Ok(Some(line?.trim().to_lowercase())),
        None => Ok(None),
    }
}

fn parse_grade(input: &str) -> Option<Grade> {
    match input {
        "1" | "a" | "again" => Some(Grade::Again),
        "2" | "h" | "hard" => Some(Grade::Hard),
        "3" | "g" | "good" => Some(Grade::Good),
        "4" | "e" | "easy" => Some(Grade::Easy),
        _ => None,
    }
}
