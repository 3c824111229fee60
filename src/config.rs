use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::model::vectorize::Weighting;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dataset: DatasetConfig,
    pub model: ModelConfig,
    pub query: QueryConfig,
    pub resources: ResourceConfig,
    pub poster: PosterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// CSV file with one row per title (relative paths resolve against the project root)
    pub path: PathBuf,
    pub columns: ColumnNames,
}

/// Header names of the dataset columns the catalog needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub title: String,
    pub genre: String,
    pub overview: String,
    pub director: String,
    pub star1: String,
    pub star2: String,
    pub rating: String,
    pub poster: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// "count" or "tfidf"
    pub weighting: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Number of recommendations when the caller does not ask for a count
    pub default_n: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Max threads for the similarity pass (0 = half available cores)
    pub max_threads: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PosterConfig {
    pub timeout_secs: u64,
    pub max_width: u32,
    pub max_height: u32,
    /// Largest poster body we are willing to download
    pub max_bytes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset: DatasetConfig::default(),
            model: ModelConfig::default(),
            query: QueryConfig::default(),
            resources: ResourceConfig::default(),
            poster: PosterConfig::default(),
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("imdb_top_1000.csv"),
            columns: ColumnNames::default(),
        }
    }
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            title: "Series_Title".into(),
            genre: "Genre".into(),
            overview: "Overview".into(),
            director: "Director".into(),
            star1: "Star1".into(),
            star2: "Star2".into(),
            rating: "IMDB_Rating".into(),
            poster: "Poster_Link".into(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            weighting: Weighting::Count.as_str().into(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self { default_n: 5 }
    }
}

impl Default for PosterConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_width: 150,
            max_height: 200,
            max_bytes: 5 * 1024 * 1024, // 5MB
        }
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub dataset: Option<PathBuf>,
    pub weighting: Option<String>,
}

impl Config {
    /// Load config from a .reelmatch/config.toml file, falling back to defaults.
    pub fn load(project_root: &Path) -> Result<Self> {
        let config_path = Self::default_path(project_root);
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from an explicit file. The file must exist.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config = Self::read(config_path)?;
        config
            .validate()
            .with_context(|| format!("validating config from {}", config_path.display()))?;
        Ok(config)
    }

    /// Read the explicit file (or the project default, if present), apply
    /// overrides, then validate the merged result once.
    pub fn resolve(project_root: &Path, explicit: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::read(path)?,
            None => {
                let path = Self::default_path(project_root);
                if path.exists() { Self::read(&path)? } else { Self::default() }
            }
        };
        if let Some(dataset) = &overrides.dataset {
            config.dataset.path = dataset.clone();
        }
        if let Some(weighting) = &overrides.weighting {
            config.model.weighting = weighting.clone();
        }
        config.validate()?;
        Ok(config)
    }

    fn read(config_path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("reading config from {}", config_path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("parsing config from {}", config_path.display()))
    }

    pub fn default_path(project_root: &Path) -> PathBuf {
        project_root.join(".reelmatch").join("config.toml")
    }

    /// Resolve the dataset path against the project root.
    pub fn dataset_path(&self, project_root: &Path) -> PathBuf {
        if self.dataset.path.is_absolute() {
            self.dataset.path.clone()
        } else {
            project_root.join(&self.dataset.path)
        }
    }

    /// Parsed weighting mode. Unknown names are a configuration error.
    pub fn weighting(&self) -> Result<Weighting, Error> {
        self.model.weighting.parse()
    }

    /// Effective thread count, resolving 0 to a sensible default.
    pub fn effective_threads(&self) -> usize {
        if self.resources.max_threads == 0 {
            let num_cpus = std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4);
            (num_cpus / 2).max(1)
        } else {
            self.resources.max_threads
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        self.weighting()?;
        if self.query.default_n == 0 {
            return Err(Error::config("query.default_n must be positive"));
        }
        if self.poster.max_width == 0 || self.poster.max_height == 0 {
            return Err(Error::config("poster.max_width and poster.max_height must be positive"));
        }
        Ok(())
    }

    /// Write current config to disk (for `reelmatch init`).
    pub fn save(&self, project_root: &Path) -> Result<PathBuf> {
        let config_path = Self::default_path(project_root);
        if let Some(dir) = config_path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating config dir {}", dir.display()))?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, contents)
            .with_context(|| format!("writing config to {}", config_path.display()))?;
        Ok(config_path)
    }
}
