use anyhow::Result;

use crate::app::App;

pub fn run(app: &App) -> Result<()> {
    let path = app.init_config()?;
    println!("Config: {}", path.display());
    println!("Owner: {}", app.owner);
    println!("Words: {}", app.data_dir.join("words").display());
    Ok(())
}
