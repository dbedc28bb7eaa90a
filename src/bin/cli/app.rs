use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use contextvocab_lib::cards::{ContextStats, MergeOutcome, OwnerId, SrsEngine, UnitContent, Word};
use contextvocab_lib::store::{BufferedStore, FileStore, SrsConfig};

pub type Store = BufferedStore<FileStore>;

/// Shared application state for CLI commands
pub struct App {
    pub engine: SrsEngine<Store>,
    pub config: SrsConfig,
    pub owner: OwnerId,
    pub data_dir: PathBuf,
}

impl App {
    /// Initialize from the given data directory, or the default one
    pub fn new(data_dir: Option<&Path>) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir.to_path_buf(),
            None => FileStore::default_data_dir().context("Failed to get data directory")?,
        };

        let config = SrsConfig::load(&data_dir.join(SrsConfig::FILE_NAME))
            .context("Failed to load config")?;

        let file_store = FileStore::new(data_dir.clone());
        file_store.init().context("Failed to initialize storage")?;

        let store = BufferedStore::new(file_store, config.write_policy.clone());
        let engine = SrsEngine::new(store).with_max_session_size(config.max_session_size);

        Ok(Self {
            engine,
            owner: config.owner_id(),
            config,
            data_dir,
        })
    }

    /// Write a default config file if none exists yet
    pub fn init_config(&self) -> Result<PathBuf> {
        let path = self.data_dir.join(SrsConfig::FILE_NAME);
        if !path.exists() {
            self.config.save(&path).context("Failed to write config")?;
        }
        Ok(path)
    }

    pub fn list_words(&self) -> Result<Vec<Word>> {
        self.engine.list_words(&self.owner).context("Failed to list words")
    }

    /// Find a word by text (case-insensitive, then unique prefix)
    pub fn find_word(&self, text: &str) -> Result<Word> {
        if let Some(word) = self
            .engine
            .find_word(&self.owner, text)
            .context("Failed to look up word")?
        {
            return Ok(word);
        }

        let words = self.list_words()?;
        let text_lower = text.to_lowercase();
        let matches: Vec<&Word> = words
            .iter()
            .filter(|w| w.text.to_lowercase().starts_with(&text_lower))
            .collect();

        match matches.len() {
            0 => bail!("No word matching '{}'", text),
            1 => Ok(matches[0].clone()),
            _ => bail!(
                "Ambiguous word '{}'. Matches:\n{}",
                text,
                matches
                    .iter()
                    .map(|w| format!("  - {}", w.text))
                    .collect::<Vec<_>>()
                    .join("\n")
            ),
        }
    }

    pub fn capture(&self, text: &str, content: UnitContent) -> Result<MergeOutcome> {
        self.engine
            .resolve_capture(&self.owner, text, content, chrono::Utc::now())
            .context("Failed to capture context")
    }

    pub fn stats(&self) -> Result<ContextStats> {
        self.engine
            .stats(&self.owner, chrono::Utc::now())
            .context("Failed to compute stats")
    }

    /// Write out any buffered grades
    pub fn flush(&self) -> Result<()> {
        self.engine
            .store()
            .flush()
            .context("Failed to flush pending writes")?;
        Ok(())
    }
}
