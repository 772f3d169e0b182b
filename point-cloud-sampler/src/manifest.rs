/// Run manifest listing produced and skipped subjects.
use crate::artifact::write_json_atomic;
use crate::config::BatchParams;
use crate::error::Result;
use crate::pipeline::{ProducedSubject, RunOutcome, SkippedSubject};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Entry point for the rendering frontend: which subject artifacts exist,
/// which subjects were skipped and why, and the parameters that made them.
#[derive(Serialize, Deserialize)]
pub struct RunManifest {
    pub produced: Vec<ProducedEntry>,
    pub skipped: Vec<SkippedSubject>,
    pub params: BatchParams,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducedEntry {
    pub slug: String,
    pub title: String,
    /// Artifact path relative to the output directory.
    pub artifact: String,
}

impl From<&ProducedSubject> for ProducedEntry {
    fn from(subject: &ProducedSubject) -> Self {
        Self {
            slug: subject.slug.clone(),
            title: subject.title.clone(),
            artifact: format!("subjects/{}.json", subject.slug),
        }
    }
}

pub struct ManifestGenerator {
    /// Base output directory for all generated files.
    output_dir: PathBuf,
}

impl ManifestGenerator {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
        }
    }

    /// Writes `manifest.json` into the output directory.
    pub fn generate(&self, outcome: &RunOutcome, params: &BatchParams) -> Result<PathBuf> {
        let manifest = RunManifest {
            produced: outcome.produced.iter().map(ProducedEntry::from).collect(),
            skipped: outcome.skipped.clone(),
            params: params.clone(),
        };

        let manifest_path = self.output_dir.join("manifest.json");
        write_json_atomic(&manifest_path, &manifest)?;

        info!(path = %manifest_path.display(), "generated run manifest");
        self.log_summary(&manifest);
        Ok(manifest_path)
    }

    fn log_summary(&self, manifest: &RunManifest) {
        info!(
            produced = manifest.produced.len(),
            skipped = manifest.skipped.len(),
            "run summary"
        );
        for skipped in &manifest.skipped {
            warn!(
                subject = %skipped.slug,
                kind = ?skipped.reason.kind,
                reason = %skipped.reason.message,
                "skipped"
            );
        }
    }
}
