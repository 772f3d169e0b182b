/// Subject artifacts for the rendering frontend.
use crate::error::Result;
use crate::pipeline::SubjectOutput;
use serde::Serialize;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

/// Receives each finished subject. Writing is the only point where subjects
/// are serialised one after another.
pub trait ArtifactSink {
    fn write_subject(&mut self, subject: &SubjectOutput) -> Result<()>;
}

/// Writes `<output_dir>/subjects/<slug>.json` per subject.
pub struct JsonArtifactWriter {
    subjects_dir: PathBuf,
}

impl JsonArtifactWriter {
    pub fn new(output_dir: &Path) -> Result<Self> {
        let subjects_dir = output_dir.join("subjects");
        fs::create_dir_all(&subjects_dir)?;
        Ok(Self { subjects_dir })
    }

    pub fn subject_path(&self, slug: &str) -> PathBuf {
        self.subjects_dir.join(format!("{slug}.json"))
    }
}

impl ArtifactSink for JsonArtifactWriter {
    fn write_subject(&mut self, subject: &SubjectOutput) -> Result<()> {
        let path = self.subject_path(&subject.slug);
        write_json_atomic(&path, subject)?;

        let points: usize = subject.variants.iter().map(|v| v.cloud.len()).sum();
        info!(
            subject = %subject.slug,
            variants = subject.variants.len(),
            points,
            path = %path.display(),
            "wrote subject artifact"
        );
        Ok(())
    }
}

/// Keeps subjects in memory, for callers that render in-process.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub subjects: Vec<SubjectOutput>,
}

impl ArtifactSink for MemorySink {
    fn write_subject(&mut self, subject: &SubjectOutput) -> Result<()> {
        self.subjects.push(subject.clone());
        Ok(())
    }
}

/// Serialises into a temporary file next to `path`, then renames it into
/// place. Readers see either the previous file or the complete new one; the
/// temporary file is removed if anything fails before the rename.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer(&mut writer, value)?;
        writer.flush()?;
    }
    tmp.persist(path)?;
    Ok(())
}
