pub mod layouts;
pub mod pipeline;
pub mod tokenize;

use baixa_core::config::{self, EngineConfig};
use baixa_core::error::BaixaError;
use baixa_core::model::UploadedFile;
use baixa_core::store::SqliteStore;
use std::path::{Path, PathBuf};

/// Settings shared by every command.
pub struct Context {
    pub db: PathBuf,
    pub config: EngineConfig,
    pub output: String,
}

impl Context {
    pub fn load(
        db: PathBuf,
        config_path: Option<&Path>,
        output: String,
    ) -> Result<Self, BaixaError> {
        let config = match config_path {
            Some(path) => config::load_config(path)?,
            None => EngineConfig::default(),
        };
        Ok(Context { db, config, output })
    }

    pub fn open_store(&self) -> Result<SqliteStore, BaixaError> {
        SqliteStore::open(&self.db)
    }

    pub fn json(&self) -> bool {
        self.output == "json"
    }
}

/// Read a file from disk as an upload named after its file name.
pub fn read_upload(path: &Path) -> Result<UploadedFile, BaixaError> {
    let bytes = std::fs::read(path)?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(UploadedFile::new(filename, bytes))
}
