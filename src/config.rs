//! Generator configuration loaded from `ncgen.toml`.
//!
//! Every field has a default, so a missing file or a partial one is fine.
//! `OPENAI_API_KEY` from the environment (or `.env`) wins over the file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::catalog::{Category, builtin_catalog, validate_catalog};
use crate::dates::DateRange;
use crate::error::GeneratorError;
use crate::llm::RetryPolicy;
use crate::llm::client::API_URL;
use crate::workflow::{DEFAULT_WORKFLOW, WorkflowSet, WorkflowStep, builtin_workflows};

pub const DEFAULT_CONFIG_FILE: &str = "ncgen.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Fixed templates, no network.
    Template,
    /// OpenAI-compatible chat completions.
    Llm,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_backend")]
    pub backend: Backend,

    #[serde(default = "default_total_tickets")]
    pub total_tickets: usize,

    #[serde(default = "default_start_date")]
    pub start_date: NaiveDate,

    #[serde(default = "default_end_date")]
    pub end_date: NaiveDate,

    /// Fixed seed for reproducible runs; random when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default)]
    pub id_prefix: Option<String>,

    #[serde(default)]
    pub ticket_timeout_secs: Option<u64>,

    #[serde(default = "default_json_output")]
    pub json_output: PathBuf,

    #[serde(default = "default_csv_output")]
    pub csv_output: PathBuf,

    #[serde(default = "default_workflow_name")]
    pub default_workflow: String,

    #[serde(default = "builtin_catalog")]
    pub categories: Vec<Category>,

    #[serde(default = "builtin_workflows")]
    pub workflows: BTreeMap<String, Vec<WorkflowStep>>,
}

fn default_base_url() -> String {
    API_URL.to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_backend() -> Backend {
    Backend::Template
}

fn default_total_tickets() -> usize {
    10
}

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default()
}

fn default_end_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 10, 31).unwrap_or_default()
}

fn default_json_output() -> PathBuf {
    PathBuf::from("non_conformities.json")
}

fn default_csv_output() -> PathBuf {
    PathBuf::from("non_conformities.csv")
}

fn default_workflow_name() -> String {
    DEFAULT_WORKFLOW.to_string()
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            backend: default_backend(),
            total_tickets: default_total_tickets(),
            start_date: default_start_date(),
            end_date: default_end_date(),
            seed: None,
            id_prefix: None,
            ticket_timeout_secs: None,
            json_output: default_json_output(),
            csv_output: default_csv_output(),
            default_workflow: default_workflow_name(),
            categories: builtin_catalog(),
            workflows: builtin_workflows(),
        }
    }
}

impl GeneratorConfig {
    /// Loads `path` if it exists, defaults otherwise, then applies the
    /// `OPENAI_API_KEY` override.
    pub fn load(path: &Path) -> Result<Self, GeneratorError> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<GeneratorConfig>(&contents)?
        } else {
            Self::default()
        };

        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.is_empty() {
                config.api_key = key;
            }
        }

        Ok(config)
    }

    pub fn date_range(&self) -> Result<DateRange, GeneratorError> {
        DateRange::new(self.start_date, self.end_date)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay_ms: self.base_delay_ms,
        }
    }

    /// Builds the workflow table and checks everything that would otherwise
    /// fail halfway through a batch.
    pub fn validate(&self) -> Result<WorkflowSet, GeneratorError> {
        validate_catalog(&self.categories).map_err(GeneratorError::Config)?;
        let workflows = WorkflowSet::new(&self.default_workflow, self.workflows.clone())
            .map_err(GeneratorError::Config)?;

        for cat in &self.categories {
            if workflows.resolve(cat.workflow.as_deref()).is_none() {
                return Err(GeneratorError::Config(format!(
                    "category {} uses unknown workflow '{}'",
                    cat.code,
                    cat.workflow.as_deref().unwrap_or_default()
                )));
            }
        }

        self.date_range()?;

        if self.backend == Backend::Llm && self.api_key.is_empty() {
            return Err(GeneratorError::Config(
                "the llm backend needs an API key (set OPENAI_API_KEY or api_key)".into(),
            ));
        }

        Ok(workflows)
    }
}
