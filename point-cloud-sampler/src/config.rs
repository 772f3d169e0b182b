/// Batch configuration, read once at startup and passed down explicitly.
use crate::catalogue::{CatalogueConfig, Subject, SubjectConfig, seed_group};
use crate::density::DensityConfig;
use crate::error::{Result, SamplerError};
use crate::sampling::{SamplingConfig, SamplingMode};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Where and how coordinates are read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Conventional array paths tried before a structural scan.
    pub candidate_paths: Vec<String>,
    /// Decimal places kept for stored coordinates.
    pub precision: u32,
    /// Unrequested rows allowed inside a single range read.
    pub gap_tolerance: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        use constants::dataset_paths::{
            COORDINATE_PRECISION, POSITION_CANDIDATES, READ_GAP_TOLERANCE,
        };
        Self {
            candidate_paths: POSITION_CANDIDATES.iter().map(|p| p.to_string()).collect(),
            precision: COORDINATE_PRECISION,
            gap_tolerance: READ_GAP_TOLERANCE,
        }
    }
}

/// Every tunable of a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchParams {
    pub sampling: SamplingConfig,
    pub density: DensityConfig,
    pub loader: LoaderConfig,
    pub seed_base: u64,
    pub colorscale_floor: u8,
    /// Wall-time budget per subject; exceeded subjects are skipped.
    pub subject_time_budget_secs: Option<u64>,
    /// Size of the worker pool; all cores when unset.
    pub threads: Option<usize>,
}

impl Default for BatchParams {
    fn default() -> Self {
        Self {
            sampling: SamplingConfig::default(),
            density: DensityConfig::default(),
            loader: LoaderConfig::default(),
            seed_base: constants::sampling::RNG_SEED,
            colorscale_floor: constants::palette::COLORSCALE_FLOOR,
            subject_time_budget_secs: None,
            threads: None,
        }
    }
}

impl BatchParams {
    pub fn subject_time_budget(&self) -> Option<Duration> {
        self.subject_time_budget_secs.map(Duration::from_secs)
    }

    /// Rejects values the pipeline cannot honour.
    pub fn validate(&self) -> Result<()> {
        let sampling = &self.sampling;
        if sampling.fixed_count == 0 {
            return Err(SamplerError::config("sampling.fixed_count must be at least 1"));
        }
        if sampling.mode == SamplingMode::Ratio && !(sampling.ratio > 0.0 && sampling.ratio <= 1.0)
        {
            return Err(SamplerError::config(format!(
                "sampling.ratio must be in (0, 1], got {}",
                sampling.ratio
            )));
        }

        let density = &self.density;
        if density.k == 0 {
            return Err(SamplerError::config("density.k must be at least 1"));
        }
        if !(0.0 <= density.percentile_low
            && density.percentile_low < density.percentile_high
            && density.percentile_high <= 100.0)
        {
            return Err(SamplerError::config(format!(
                "density percentiles must satisfy 0 <= low < high <= 100, got {} and {}",
                density.percentile_low, density.percentile_high
            )));
        }
        if !(density.exponent > 0.0 && density.exponent.is_finite()) {
            return Err(SamplerError::config(format!(
                "density.exponent must be positive, got {}",
                density.exponent
            )));
        }
        if density.volume_epsilon < 0.0 || density.log_epsilon < 0.0 || density.range_epsilon < 0.0 {
            return Err(SamplerError::config("density epsilons must not be negative"));
        }

        if self.loader.precision > 9 {
            return Err(SamplerError::config(format!(
                "loader.precision must be at most 9, got {}",
                self.loader.precision
            )));
        }
        if self.threads == Some(0) {
            return Err(SamplerError::config("threads must be at least 1"));
        }
        Ok(())
    }
}

/// Parameters plus the subjects to process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub params: BatchParams,
    pub subjects: Vec<SubjectConfig>,
    pub catalogues: Vec<CatalogueConfig>,
}

impl RunConfig {
    /// Reads and validates a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: RunConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.params.validate()?;

        let expanded = self.expanded_catalogues();
        let mut slugs: Vec<&str> = Vec::new();
        for subject in self.subjects.iter().chain(&expanded) {
            if subject.variants.is_empty() {
                return Err(SamplerError::config(format!(
                    "subject {} has no variants",
                    subject.slug
                )));
            }
            slugs.push(&subject.slug);
        }
        let total = slugs.len();
        slugs.sort_unstable();
        slugs.dedup();
        if slugs.len() != total {
            return Err(SamplerError::config("subject slugs must be unique"));
        }
        Ok(())
    }

    /// Explicit subjects first, then each catalogue in order. Each list is
    /// its own seed group.
    pub fn resolve_subjects(&self) -> Vec<Subject> {
        let seed_base = self.params.seed_base;
        let mut subjects = seed_group(seed_base, &self.subjects);
        for catalogue in &self.catalogues {
            subjects.extend(seed_group(seed_base, &catalogue.expand()));
        }
        subjects
    }

    fn expanded_catalogues(&self) -> Vec<SubjectConfig> {
        self.catalogues.iter().flat_map(|c| c.expand()).collect()
    }
}
