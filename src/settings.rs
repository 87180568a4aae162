// config lets you read a separate config file
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::{PagewiseError, Result};
use crate::page::PageRequest;

/// Runtime settings, read from defaults, then an optional `pagewise.*` file,
/// then `PAGEWISE_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// `memory` or the path of a SQLite database file.
    pub database: String,
    pub listen: String,
    pub default_page_size: u32,
    pub max_page_size: u32,
    /// JSON seed document loaded at startup.
    pub seed: Option<String>,
    /// Log filter used when `RUST_LOG` is not set.
    pub log: String,
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::load_from("pagewise")
    }

    /// Same as [`Settings::load`] with a different base name for the file.
    pub fn load_from(file: &str) -> Result<Self> {
        let settings: Settings = Config::builder()
            .set_default("database", "memory")?
            .set_default("listen", "127.0.0.1:8080")?
            .set_default("default_page_size", 10_i64)?
            .set_default("max_page_size", 100_i64)?
            .set_default("log", "info")?
            .add_source(File::with_name(file).required(false))
            .add_source(Environment::with_prefix("PAGEWISE").try_parsing(true))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_page_size < 1 || self.max_page_size < 1 {
            return Err(PagewiseError::Config("page sizes must be at least 1".into()));
        }
        if self.default_page_size > self.max_page_size {
            return Err(PagewiseError::Config(format!(
                "default_page_size {} exceeds max_page_size {}",
                self.default_page_size, self.max_page_size
            )));
        }
        if self.listen.trim().is_empty() {
            return Err(PagewiseError::Config("listen address is empty".into()));
        }
        Ok(())
    }

    /// Builds a page request from optional caller input. Missing values take
    /// the defaults, sizes above the maximum are capped, and non-positive
    /// values are rejected.
    pub fn page_request(&self, page_number: Option<i64>, page_size: Option<i64>) -> Result<PageRequest> {
        let size = page_size.unwrap_or(i64::from(self.default_page_size));
        let size = if size > i64::from(self.max_page_size) {
            i64::from(self.max_page_size)
        } else {
            size
        };
        PageRequest::from_signed(page_number.unwrap_or(1), size)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database: "memory".into(),
            listen: "127.0.0.1:8080".into(),
            default_page_size: 10,
            max_page_size: 100,
            seed: None,
            log: "info".into(),
        }
    }
}
