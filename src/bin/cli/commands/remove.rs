use anyhow::{bail, Context, Result};

use crate::app::App;
use crate::render::terminal::{paint, Color};

pub fn run(app: &App, text: &str, context: Option<usize>, use_color: bool) -> Result<()> {
    let word = app.find_word(text)?;
    let title = paint(&word.text, Color::BOLD, use_color);

    match context {
        None => {
            app.engine
                .delete_word(word.id)
                .context("Failed to remove word")?;
            println!("Removed \"{}\" and its {} contexts", title, word.units.len());
        }
        Some(number) => {
            if number == 0 || number > word.units.len() {
                bail!("\"{}\" has contexts 1-{}", word.text, word.units.len());
            }
            if word.units.len() == 1 {
                bail!("\"{}\" has only one context; remove the word instead", word.text);
            }
            app.engine
                .delete_unit(word.id, number - 1)
                .context("Failed to remove context")?;
            println!("Removed context #{} from \"{}\"", number, title);
        }
    }

    Ok(())
}
