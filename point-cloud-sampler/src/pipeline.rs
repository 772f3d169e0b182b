/// Batch orchestration: every subject, every variant, end to end.
use crate::artifact::ArtifactSink;
use crate::bounds::PointCloudBounds;
use crate::catalogue::{Subject, Variant};
use crate::config::BatchParams;
use crate::container::ContainerOpener;
use crate::density::DensityEstimator;
use crate::error::{Result, SamplerError};
use crate::loader::RowRangeLoader;
use crate::locator::DatasetLocator;
use crate::palette::{ColorStop, colorscale};
use crate::particles::SampledCloud;
use crate::sampling::downsample;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// One variant's sample, ready for the renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantOutput {
    pub label: String,
    pub rgb: [u8; 3],
    pub colorscale: Vec<ColorStop>,
    pub seed: u64,
    /// Row count of the source array.
    pub population: usize,
    pub sampled: usize,
    #[serde(flatten)]
    pub cloud: SampledCloud,
}

/// All variants of a subject plus the bounds they share for axis scaling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectOutput {
    pub slug: String,
    pub title: String,
    pub comparison_title: String,
    pub bounds: PointCloudBounds,
    pub variants: Vec<VariantOutput>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipKind {
    MissingInput,
    CoordinatesNotFound,
    InsufficientPoints,
    Timeout,
    Error,
}

/// Why a subject produced no output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipReason {
    pub kind: SkipKind,
    /// Variant that failed, when the failure belongs to one.
    pub variant: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<PathBuf>,
}

impl SkipReason {
    pub fn from_error(variant: Option<&str>, error: &SamplerError) -> Self {
        let kind = match error {
            SamplerError::MissingInput { .. } => SkipKind::MissingInput,
            SamplerError::NotFound { .. } => SkipKind::CoordinatesNotFound,
            SamplerError::InsufficientPoints { .. } => SkipKind::InsufficientPoints,
            SamplerError::Timeout { .. } => SkipKind::Timeout,
            _ => SkipKind::Error,
        };
        let missing = match error {
            SamplerError::MissingInput { paths } => paths.clone(),
            _ => Vec::new(),
        };
        Self {
            kind,
            variant: variant.map(str::to_string),
            message: error.to_string(),
            missing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducedSubject {
    pub slug: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSubject {
    pub slug: String,
    pub reason: SkipReason,
}

/// What a batch managed to produce and what it skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub produced: Vec<ProducedSubject>,
    pub skipped: Vec<SkippedSubject>,
}

/// Wall-time budget for one subject. It is only checked between stages, so
/// a stage already running (typically the density estimate) finishes before
/// an exhausted budget is reported.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    budget: Option<Duration>,
}

impl Deadline {
    pub fn start(budget: Option<Duration>) -> Self {
        Self {
            start: Instant::now(),
            budget,
        }
    }

    pub fn check(&self) -> Result<()> {
        let Some(budget) = self.budget else {
            return Ok(());
        };
        let elapsed = self.start.elapsed();
        if elapsed > budget {
            return Err(SamplerError::Timeout { elapsed, budget });
        }
        Ok(())
    }
}

/// Locate, sample, load and estimate for each variant of each subject.
/// Holds no mutable state, so variants run in parallel without locking.
pub struct Pipeline<'a> {
    params: &'a BatchParams,
    opener: &'a dyn ContainerOpener,
    locator: DatasetLocator,
    loader: RowRangeLoader,
    estimator: DensityEstimator,
    show_progress: bool,
}

impl<'a> Pipeline<'a> {
    pub fn new(params: &'a BatchParams, opener: &'a dyn ContainerOpener) -> Self {
        Self {
            params,
            opener,
            locator: DatasetLocator::with_candidates(&params.loader.candidate_paths),
            loader: RowRangeLoader::new(params.loader.precision, params.loader.gap_tolerance),
            estimator: DensityEstimator::new(params.density.clone()),
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Processes every subject and hands each result to `sink`. Failures are
    /// recorded per subject; the batch always runs to the end.
    pub fn run(&self, subjects: &[Subject], sink: &mut dyn ArtifactSink) -> RunOutcome {
        let pb = if self.show_progress {
            ProgressBar::new(subjects.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{bar:40.green/blue}] {pos}/{len} subjects ({percent}%) {msg}")
        {
            pb.set_style(style.progress_chars("▉▊▋▌▍▎▏ "));
        }

        let mut outcome = RunOutcome::default();
        for subject in subjects {
            pb.set_message(subject.slug.clone());

            let result = self.process_subject(subject).and_then(|output| {
                sink.write_subject(&output)
                    .map_err(|e| SkipReason::from_error(None, &e))
            });

            match result {
                Ok(()) => {
                    info!(subject = %subject.slug, "subject complete");
                    outcome.produced.push(ProducedSubject {
                        slug: subject.slug.clone(),
                        title: subject.title.clone(),
                    });
                }
                Err(reason) => {
                    warn!(
                        subject = %subject.slug,
                        variant = reason.variant.as_deref().unwrap_or("-"),
                        reason = %reason.message,
                        "skipping subject"
                    );
                    outcome.skipped.push(SkippedSubject {
                        slug: subject.slug.clone(),
                        reason,
                    });
                }
            }
            pb.inc(1);
        }

        pb.finish_with_message(format!(
            "{} produced, {} skipped",
            outcome.produced.len(),
            outcome.skipped.len()
        ));
        outcome
    }

    /// Runs all variants of one subject. Any variant failure skips the whole
    /// subject; the first failing variant in configuration order is reported.
    pub fn process_subject(
        &self,
        subject: &Subject,
    ) -> std::result::Result<SubjectOutput, SkipReason> {
        let missing: Vec<PathBuf> = subject
            .variants
            .iter()
            .filter(|v| !self.opener.exists(&v.path))
            .map(|v| v.path.clone())
            .collect();
        if !missing.is_empty() {
            return Err(SkipReason::from_error(
                None,
                &SamplerError::MissingInput { paths: missing },
            ));
        }

        let deadline = Deadline::start(self.params.subject_time_budget());
        let results: Vec<Result<VariantOutput>> = subject
            .variants
            .par_iter()
            .map(|variant| self.process_variant(&subject.slug, variant, &deadline))
            .collect();

        let mut variants = Vec::with_capacity(results.len());
        for (variant, result) in subject.variants.iter().zip(results) {
            match result {
                Ok(output) => variants.push(output),
                Err(e) => return Err(SkipReason::from_error(Some(&variant.label), &e)),
            }
        }
        deadline
            .check()
            .map_err(|e| SkipReason::from_error(None, &e))?;

        let bounds = PointCloudBounds::enclosing(variants.iter().map(|v| v.cloud.positions()));
        Ok(SubjectOutput {
            slug: subject.slug.clone(),
            title: subject.title.clone(),
            comparison_title: subject.comparison_title(),
            bounds,
            variants,
        })
    }

    /// Locate, size, sample, load and estimate one variant. Opens its own
    /// container session and seeds its own generator.
    pub fn process_variant(
        &self,
        slug: &str,
        variant: &Variant,
        deadline: &Deadline,
    ) -> Result<VariantOutput> {
        deadline.check()?;
        let mut container = self.opener.open(&variant.path)?;
        let dataset = self.locator.locate(&*container)?;

        let target = self.params.sampling.target_size(dataset.len);
        info!(
            subject = slug,
            variant = %variant.label,
            population = dataset.len,
            sample = target,
            seed = variant.seed,
            "sampling variant"
        );
        let indices = downsample(dataset.len, target, variant.seed);

        deadline.check()?;
        let positions = self.loader.load(&mut *container, &dataset, &indices)?;

        deadline.check()?;
        let density = self.estimator.estimate(&positions)?;

        let sampled = positions.len();
        let cloud = SampledCloud::pair(positions, density).ok_or_else(|| {
            SamplerError::ShapeMismatch {
                path: dataset.path.clone(),
                expected: sampled,
                actual: 0,
            }
        })?;

        Ok(VariantOutput {
            label: variant.label.clone(),
            rgb: variant.rgb,
            colorscale: colorscale(variant.rgb, self.params.colorscale_floor),
            seed: variant.seed,
            population: dataset.len,
            sampled,
            cloud,
        })
    }
}
