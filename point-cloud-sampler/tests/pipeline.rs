use point_cloud_sampler::artifact::{JsonArtifactWriter, MemorySink};
use point_cloud_sampler::catalogue::{Subject, SubjectConfig, VariantConfig, seed_group};
use point_cloud_sampler::config::BatchParams;
use point_cloud_sampler::container::{MemoryContainer, MemoryOpener};
use point_cloud_sampler::manifest::{ManifestGenerator, RunManifest};
use point_cloud_sampler::pipeline::{Pipeline, SkipKind, SubjectOutput};
use point_cloud_sampler::sampling::SamplingMode;
use std::collections::HashSet;

const SNAPSHOT_PATH: &str = "/PartType1/Coordinates";

/// Row `i` encodes its own index so sampled rows can be traced back.
fn indexed_rows(n: usize) -> Vec<[f64; 3]> {
    (0..n)
        .map(|i| [i as f64, (i % 1000) as f64, (i / 1000) as f64])
        .collect()
}

fn snapshot(name: &str, n: usize) -> MemoryContainer {
    MemoryContainer::new(name).with_coordinates(SNAPSHOT_PATH, indexed_rows(n))
}

fn subject(slug: &str, paths: &[(&str, &str)]) -> SubjectConfig {
    SubjectConfig {
        slug: slug.into(),
        title: slug.to_uppercase(),
        seed_offset: 0,
        variants: paths
            .iter()
            .map(|(label, path)| VariantConfig {
                label: label.to_string(),
                path: path.into(),
                rgb: [10, 20, 30],
            })
            .collect(),
    }
}

fn fixed_params(count: usize, seed: u64) -> BatchParams {
    let mut params = BatchParams::default();
    params.sampling.mode = SamplingMode::Fixed;
    params.sampling.fixed_count = count;
    params.seed_base = seed;
    params
}

fn run(params: &BatchParams, opener: &MemoryOpener, subjects: &[Subject]) -> MemorySink {
    let mut sink = MemorySink::default();
    Pipeline::new(params, opener).run(subjects, &mut sink);
    sink
}

#[test]
fn million_row_source_yields_fixed_sample_with_density() {
    let opener = MemoryOpener::new().with("big.hdf5", snapshot("big", 1_000_000));
    let subjects = seed_group(42, &[subject("big", &[("CDM", "big.hdf5")])]);
    let params = fixed_params(10_000, 42);

    let sink = run(&params, &opener, &subjects);
    assert_eq!(sink.subjects.len(), 1);

    let variant = &sink.subjects[0].variants[0];
    assert_eq!(variant.population, 1_000_000);
    assert_eq!(variant.cloud.positions().shape(), (10_000, 3));
    assert_eq!(variant.cloud.density().len(), 10_000);

    let rows: HashSet<u32> = variant
        .cloud
        .positions()
        .rows()
        .iter()
        .map(|row| row[0] as u32)
        .collect();
    assert_eq!(rows.len(), 10_000);

    let xs: Vec<f32> = variant.cloud.positions().rows().iter().map(|r| r[0]).collect();
    assert!(xs.windows(2).all(|w| w[0] < w[1]));

    for row in variant.cloud.positions().rows() {
        let index = row[0] as usize;
        assert_eq!(row[1], (index % 1000) as f32);
        assert_eq!(row[2], (index / 1000) as f32);
    }
    assert!(
        variant
            .cloud
            .density()
            .values()
            .iter()
            .all(|d| (0.0..=1.0).contains(d))
    );
}

#[test]
fn small_source_is_kept_whole() {
    let opener = MemoryOpener::new().with("small.hdf5", snapshot("small", 500));
    let subjects = seed_group(0, &[subject("small", &[("NB", "small.hdf5")])]);

    let sink = run(&BatchParams::default(), &opener, &subjects);
    let variant = &sink.subjects[0].variants[0];
    assert_eq!(variant.cloud.len(), 500);
    assert_eq!(variant.population, 500);
}

#[test]
fn ratio_mode_honours_minimum() {
    let opener = MemoryOpener::new().with("mid.hdf5", snapshot("mid", 20_000));
    let subjects = seed_group(0, &[subject("mid", &[("CDM", "mid.hdf5")])]);
    let mut params = BatchParams::default();
    params.sampling.mode = SamplingMode::Ratio;
    params.sampling.ratio = 0.01;
    params.sampling.minimum = 1_500;

    let sink = run(&params, &opener, &subjects);
    assert_eq!(sink.subjects[0].variants[0].cloud.len(), 1_500);
}

#[test]
fn failing_subjects_are_skipped_and_the_batch_continues() {
    let opener = MemoryOpener::new()
        .with("a_cdm.hdf5", snapshot("a_cdm", 2_000))
        .with("b_cdm.hdf5", snapshot("b_cdm", 2_000))
        .with(
            "b_fct.hdf5",
            MemoryContainer::new("b_fct").with_shape("/Header/Masses", vec![2_000]),
        )
        .with("c_cdm.hdf5", snapshot("c_cdm", 2_000))
        .with("c_fct.hdf5", snapshot("c_fct", 3_000));

    let subjects = seed_group(
        7,
        &[
            subject("a", &[("CDM", "a_cdm.hdf5"), ("FCT", "a_fct.hdf5")]),
            subject("b", &[("CDM", "b_cdm.hdf5"), ("FCT", "b_fct.hdf5")]),
            subject("c", &[("CDM", "c_cdm.hdf5"), ("FCT", "c_fct.hdf5")]),
        ],
    );

    let params = fixed_params(1_000, 7);
    let mut sink = MemorySink::default();
    let outcome = Pipeline::new(&params, &opener).run(&subjects, &mut sink);

    assert_eq!(outcome.skipped.len(), 2);
    assert_eq!(outcome.skipped[0].slug, "a");
    assert_eq!(outcome.skipped[0].reason.kind, SkipKind::MissingInput);
    assert_eq!(
        outcome.skipped[0].reason.missing,
        vec![std::path::PathBuf::from("a_fct.hdf5")]
    );
    assert_eq!(outcome.skipped[1].slug, "b");
    assert_eq!(outcome.skipped[1].reason.kind, SkipKind::CoordinatesNotFound);
    assert_eq!(outcome.skipped[1].reason.variant.as_deref(), Some("FCT"));

    assert_eq!(outcome.produced.len(), 1);
    assert_eq!(outcome.produced[0].slug, "c");
    assert_eq!(sink.subjects.len(), 1);
    assert_eq!(sink.subjects[0].comparison_title, "C - CDM vs FCT");
}

#[test]
fn bounds_enclose_every_variant() {
    let opener = MemoryOpener::new()
        .with("near.hdf5", snapshot("near", 5_000))
        .with("far.hdf5", snapshot("far", 50_000));
    let subjects = seed_group(
        3,
        &[subject("pair", &[("CDM", "near.hdf5"), ("NB", "far.hdf5")])],
    );

    let sink = run(&fixed_params(2_000, 3), &opener, &subjects);
    let output: &SubjectOutput = &sink.subjects[0];

    for variant in &output.variants {
        for row in variant.cloud.positions().rows() {
            assert!(output.bounds.min_x <= row[0] as f64 && row[0] as f64 <= output.bounds.max_x);
            assert!(output.bounds.min_y <= row[1] as f64 && row[1] as f64 <= output.bounds.max_y);
            assert!(output.bounds.min_z <= row[2] as f64 && row[2] as f64 <= output.bounds.max_z);
        }
    }
    // The wider source drives the shared x range past the narrow one.
    assert!(output.bounds.max_x >= 5_000.0);
}

#[test]
fn variants_of_one_source_draw_independent_samples() {
    let opener = MemoryOpener::new().with("same.hdf5", snapshot("same", 100_000));
    let subjects = seed_group(
        11,
        &[subject("twin", &[("CDM", "same.hdf5"), ("NB", "same.hdf5")])],
    );

    let sink = run(&fixed_params(1_000, 11), &opener, &subjects);
    let variants = &sink.subjects[0].variants;
    assert_ne!(variants[0].seed, variants[1].seed);
    assert_ne!(
        variants[0].cloud.positions(),
        variants[1].cloud.positions()
    );
}

#[test]
fn reruns_are_reproducible() {
    let opener = MemoryOpener::new().with("snap.hdf5", snapshot("snap", 30_000));
    let subjects = seed_group(5, &[subject("again", &[("CDM", "snap.hdf5")])]);
    let params = fixed_params(3_000, 5);

    let first = run(&params, &opener, &subjects);
    let second = run(&params, &opener, &subjects);
    let (a, b) = (&first.subjects[0].variants[0], &second.subjects[0].variants[0]);
    assert_eq!(a.cloud.positions(), b.cloud.positions());
    assert_eq!(a.cloud.density(), b.cloud.density());
}

#[test]
fn json_writer_and_manifest_describe_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let opener = MemoryOpener::new().with("ok.hdf5", snapshot("ok", 4_000));
    let subjects = seed_group(
        1,
        &[
            subject("ok", &[("CDM", "ok.hdf5")]),
            subject("gone", &[("CDM", "gone.hdf5")]),
        ],
    );
    let params = fixed_params(500, 1);

    let mut writer = JsonArtifactWriter::new(dir.path()).unwrap();
    let outcome = Pipeline::new(&params, &opener).run(&subjects, &mut writer);
    let manifest_path = ManifestGenerator::new(dir.path())
        .generate(&outcome, &params)
        .unwrap();

    let artifact: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(writer.subject_path("ok")).unwrap(),
    )
    .unwrap();
    let variant = &artifact["variants"][0];
    assert_eq!(variant["label"], "CDM");
    assert_eq!(variant["positions"].as_array().unwrap().len(), 500);
    assert_eq!(variant["density"].as_array().unwrap().len(), 500);
    assert!(!dir.path().join("subjects").join("gone.json").exists());

    let manifest: RunManifest =
        serde_json::from_str(&std::fs::read_to_string(manifest_path).unwrap()).unwrap();
    assert_eq!(manifest.produced.len(), 1);
    assert_eq!(manifest.produced[0].artifact, "subjects/ok.json");
    assert_eq!(manifest.skipped[0].slug, "gone");
    assert_eq!(manifest.params.sampling.fixed_count, 500);
}
