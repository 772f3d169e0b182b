/// Subjects and their variants, from explicit entries or numbered catalogues.
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One model's data for a subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantConfig {
    pub label: String,
    pub path: PathBuf,
    pub rgb: [u8; 3],
}

/// An explicitly listed subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectConfig {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub seed_offset: u64,
    pub variants: Vec<VariantConfig>,
}

/// A model taking part in every subject of a catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub label: String,
    /// Directory under the catalogue root holding this model's files.
    pub subdir: String,
    /// File name with `{id}` standing for the subject number.
    pub file_pattern: String,
    pub rgb: [u8; 3],
}

/// A numbered family of subjects laid out as `<root>/<subdir>/<file_pattern>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogueConfig {
    pub slug_prefix: String,
    pub title_prefix: String,
    pub first_id: u32,
    pub last_id: u32,
    #[serde(default)]
    pub exclude: Vec<u32>,
    pub root: PathBuf,
    #[serde(default)]
    pub seed_offset: u64,
    pub models: Vec<ModelConfig>,
}

impl CatalogueConfig {
    /// Subject ids in order, exclusions removed.
    pub fn ids(&self) -> Vec<u32> {
        (self.first_id..=self.last_id)
            .filter(|id| !self.exclude.contains(id))
            .collect()
    }

    /// One explicit subject per id.
    pub fn expand(&self) -> Vec<SubjectConfig> {
        self.ids()
            .into_iter()
            .map(|id| SubjectConfig {
                slug: format!("{}{:03}", self.slug_prefix, id),
                title: format!("{} {}", self.title_prefix, id),
                seed_offset: self.seed_offset,
                variants: self
                    .models
                    .iter()
                    .map(|model| VariantConfig {
                        label: model.label.clone(),
                        path: self
                            .root
                            .join(&model.subdir)
                            .join(model.file_pattern.replace("{id}", &id.to_string())),
                        rgb: model.rgb,
                    })
                    .collect(),
            })
            .collect()
    }
}

/// A variant with its sampling seed fixed.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub label: String,
    pub path: PathBuf,
    pub rgb: [u8; 3],
    pub seed: u64,
}

/// A subject ready to process.
#[derive(Debug, Clone, PartialEq)]
pub struct Subject {
    pub slug: String,
    pub title: String,
    pub variants: Vec<Variant>,
}

impl Subject {
    /// `"<title> - A vs B vs C"`
    pub fn comparison_title(&self) -> String {
        let labels: Vec<&str> = self.variants.iter().map(|v| v.label.as_str()).collect();
        format!("{} - {}", self.title, labels.join(" vs "))
    }
}

/// Seed for variant `variant_index` of the subject at `ordinal` within its
/// group. Every variant of every subject in a group gets a distinct value.
pub fn variant_seed(
    seed_base: u64,
    seed_offset: u64,
    ordinal: usize,
    variant_count: usize,
    variant_index: usize,
) -> u64 {
    seed_base
        .wrapping_add(seed_offset)
        .wrapping_add((ordinal * variant_count + variant_index) as u64)
}

/// Assigns seeds within one group. Ordinals follow configuration order, so a
/// subject skipped later never shifts another subject's seeds.
pub fn seed_group(seed_base: u64, subjects: &[SubjectConfig]) -> Vec<Subject> {
    subjects
        .iter()
        .enumerate()
        .map(|(ordinal, subject)| {
            let count = subject.variants.len();
            Subject {
                slug: subject.slug.clone(),
                title: subject.title.clone(),
                variants: subject
                    .variants
                    .iter()
                    .enumerate()
                    .map(|(i, v)| Variant {
                        label: v.label.clone(),
                        path: v.path.clone(),
                        rgb: v.rgb,
                        seed: variant_seed(seed_base, subject.seed_offset, ordinal, count, i),
                    })
                    .collect(),
            }
        })
        .collect()
}
