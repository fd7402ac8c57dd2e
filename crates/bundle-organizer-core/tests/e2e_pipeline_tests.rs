use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::tempdir;
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::ZipWriter;

use bundle_organizer_core::validation::ValidationStrategies;
use bundle_organizer_core::tabular::{FrameTables, TabularAccess};
use bundle_organizer_core::{
    AppConfig, DataFormat, FileDiscovery, FileType, Mode, PipelineEngine, RecordType,
    SilentReporter,
};
use std::sync::Arc;

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn set_mtime(path: &Path, time: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(time)
        .unwrap();
}

fn write_zip(path: &Path, members: &[(&str, &str)]) {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    for (name, content) in members {
        zip.start_file(*name, FileOptions::default()).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

/// Every file under `root` with its content.
fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| (entry.path().to_path_buf(), fs::read(entry.path()).unwrap()))
        .collect()
}

fn config(inputs: Vec<PathBuf>, output: PathBuf) -> AppConfig {
    AppConfig {
        inputs,
        output,
        ..AppConfig::default()
    }
}

/// Layout:
///   in/
///     a/responses.csv        (class A)
///     a/page_views.csv       (class A)
///     a/supplementary/slides.pdf
///     b/responses.csv        (class B)
///     classes.csv            (A, B)
///     tags.csv               (legacy)
///     notes.txt              (not a record type)
fn create_export_tree(root: &Path) {
    write(
        &root.join("a/responses.csv"),
        "class_id,student_id,dt_submitted\nA,s1,t1\nA,s2,t2\n",
    );
    write(&root.join("a/page_views.csv"), "class_id,student_id\nA,s1\n");
    write(&root.join("a/supplementary/slides.pdf"), "%PDF");
    write(&root.join("b/responses.csv"), "class_id,student_id\nB,s9\n");
    write(&root.join("classes.csv"), "class_id,course_name\nA,Bio\nB,Chem\n");
    write(&root.join("tags.csv"), "tag_type,tag\nskill,algebra\n");
    write(&root.join("notes.txt"), "not an export");
}

#[test]
fn test_organize_moves_everything_into_place() {
    let tmp = tempdir().unwrap();
    let input = tmp.path().join("in");
    let output = tmp.path().join("out");
    create_export_tree(&input);

    let result = PipelineEngine::new(config(vec![input.clone()], output.clone()))
        .run(Mode::Organize, &SilentReporter)
        .unwrap();

    assert!(!result.dry_run);
    assert_eq!(result.records_found, 6);

    assert_eq!(
        fs::read_to_string(output.join("A/responses.csv")).unwrap(),
        "class_id,student_id,dt_submitted\nA,s1,t1\nA,s2,t2\n"
    );
    assert!(output.join("A/page_views.csv").is_file());
    assert!(output.join("A/supplementary/slides.pdf").is_file());
    assert!(output.join("B/responses.csv").is_file());
    assert!(output.join("classes.csv").is_file());

    // sources moved, legacy deleted, unrelated files untouched
    assert!(!input.join("a/responses.csv").exists());
    assert!(!input.join("a/supplementary").exists());
    assert!(!input.join("tags.csv").exists());
    assert!(input.join("notes.txt").is_file());
}

#[test]
fn test_organize_copy_keeps_sources_and_ignored_legacy() {
    let tmp = tempdir().unwrap();
    let input = tmp.path().join("in");
    let output = tmp.path().join("out");
    create_export_tree(&input);
    let before = snapshot(&input);

    let mut cfg = config(vec![input.clone()], output.clone());
    cfg.move_files = false;
    cfg.ignore_legacy = true;
    PipelineEngine::new(cfg)
        .run(Mode::Organize, &SilentReporter)
        .unwrap();

    assert_eq!(snapshot(&input), before);
    assert!(output.join("A/responses.csv").is_file());
    assert!(!output.join("tags.csv").exists());
}

#[test]
fn test_ambiguous_file_is_left_in_place() {
    let tmp = tempdir().unwrap();
    let input = tmp.path().join("in");
    let output = tmp.path().join("out");
    write(
        &input.join("mixed/responses.csv"),
        "class_id,student_id\nA,s1\nB,s2\n",
    );

    let result = PipelineEngine::new(config(vec![input.clone()], output.clone()))
        .run(Mode::Organize, &SilentReporter)
        .unwrap();

    assert_eq!(result.records_found, 0);
    assert!(input.join("mixed/responses.csv").is_file());
    assert!(!output.exists());
}

#[test]
fn test_discovery_dedupe_is_idempotent() {
    let tmp = tempdir().unwrap();
    let first = tmp.path().join("in1");
    let second = tmp.path().join("in2");
    write(&first.join("a/responses.csv"), "class_id\nA\n");
    write(&second.join("copy/responses.csv"), "class_id\nA\n");
    write(&second.join("b/responses.csv"), "class_id\nB\n");

    let discover = || {
        let staging = tempdir().unwrap();
        FileDiscovery::new(
            vec![first.clone(), second.clone()],
            ValidationStrategies::standard(Arc::new(FrameTables)),
            staging.path(),
        )
        .discover(&SilentReporter)
        .unwrap()
    };

    let once = discover();
    let twice = discover();

    assert_eq!(once, twice);
    assert_eq!(once.len(), 2);
    assert_eq!(once[0].path, first.join("a/responses.csv"));
    assert_eq!(once[1].entity_id.as_deref(), Some("B"));
}

#[test]
fn test_older_source_is_deleted_newer_source_overwrites() {
    let tmp = tempdir().unwrap();
    let input = tmp.path().join("in");
    let output = tmp.path().join("out");
    let existing = output.join("A/responses.csv");
    write(&existing, "class_id\nA\n");
    let t0 = SystemTime::now();
    set_mtime(&existing, t0);

    // older: the source is dropped, the destination stays
    let older = input.join("a/responses.csv");
    write(&older, "class_id,student_id\nA,old\n");
    set_mtime(&older, t0 - Duration::from_secs(1));

    PipelineEngine::new(config(vec![input.clone()], output.clone()))
        .run(Mode::Organize, &SilentReporter)
        .unwrap();

    assert!(!older.exists());
    assert_eq!(fs::read_to_string(&existing).unwrap(), "class_id\nA\n");

    // newer: the destination is replaced
    let newer = input.join("a/responses.csv");
    write(&newer, "class_id,student_id\nA,new\n");
    set_mtime(&newer, t0 + Duration::from_secs(1));

    PipelineEngine::new(config(vec![input.clone()], output.clone()))
        .run(Mode::Organize, &SilentReporter)
        .unwrap();

    assert!(!newer.exists());
    assert_eq!(
        fs::read_to_string(&existing).unwrap(),
        "class_id,student_id\nA,new\n"
    );
}

#[test]
fn test_three_rosters_merge_to_one_row_per_class() {
    let tmp = tempdir().unwrap();
    let first = tmp.path().join("in1");
    let second = tmp.path().join("in2");
    let output = tmp.path().join("out");
    write(&first.join("classes.csv"), "class_id,course_name\nA,Bio\nB,Chem\n");
    write(
        &second.join("classes.csv"),
        "class_id,course_name,lms\nB,Chem II,canvas\nC,Phys,moodle\n",
    );
    write(&output.join("classes.csv"), "class_id,course_name\nA,Old Bio\nD,Art\n");

    let prepared = PipelineEngine::new(config(vec![first.clone(), second.clone()], output.clone()))
        .prepare(Mode::Organize, &SilentReporter)
        .unwrap();
    let descriptions = prepared.describe();
    assert_eq!(descriptions.len(), 3);
    assert!(descriptions[0].starts_with("Merging 3 classes files to "));
    prepared.execute(&SilentReporter).unwrap();

    assert_eq!(
        fs::read_to_string(output.join("classes.csv")).unwrap(),
        "class_id,course_name,lms\nA,Bio,\nB,Chem,\nC,Phys,moodle\nD,Art,\n"
    );
    assert!(!first.join("classes.csv").exists());
    assert!(!second.join("classes.csv").exists());
}

#[test]
fn test_dry_run_changes_nothing_and_matches_real_plan() {
    let tmp = tempdir().unwrap();
    let input = tmp.path().join("in");
    let output = tmp.path().join("out");
    create_export_tree(&input);
    let before = snapshot(tmp.path());

    let mut cfg = config(vec![input.clone()], output.clone());
    cfg.dry_run = true;
    let dry = PipelineEngine::new(cfg.clone())
        .run(Mode::Organize, &SilentReporter)
        .unwrap();

    assert!(dry.dry_run);
    assert_eq!(dry.report.executed, 0);
    assert_eq!(snapshot(tmp.path()), before);
    assert!(!output.exists());

    cfg.dry_run = false;
    let prepared = PipelineEngine::new(cfg)
        .prepare(Mode::Organize, &SilentReporter)
        .unwrap();
    assert_eq!(prepared.describe(), dry.report.descriptions);

    let real = prepared.execute(&SilentReporter).unwrap();
    assert_eq!(real.report.descriptions, dry.report.descriptions);
}

#[test]
fn test_supplementary_needs_an_owning_sibling() {
    let tmp = tempdir().unwrap();
    let input = tmp.path().join("in");
    let output = tmp.path().join("out");
    write(&input.join("a/responses.csv"), "class_id\nA\n");
    write(&input.join("a/supplementary/owned.pdf"), "x");
    write(&input.join("orphan/supplementary/lost.pdf"), "x");

    PipelineEngine::new(config(vec![input.clone()], output.clone()))
        .run(Mode::Organize, &SilentReporter)
        .unwrap();

    assert!(output.join("A/supplementary/owned.pdf").is_file());
    assert!(input.join("orphan/supplementary/lost.pdf").is_file());
}

#[test]
fn test_zip_bundle_members_are_organized() {
    let tmp = tempdir().unwrap();
    let input = tmp.path().join("in");
    let output = tmp.path().join("out");
    fs::create_dir_all(&input).unwrap();
    let bundle = input.join("bundle.zip");
    write_zip(
        &bundle,
        &[
            ("export/a/responses.csv", "class_id\nA\n"),
            ("export/a/supplementary/slides.pdf", "%PDF"),
            ("export/classes.csv", "class_id\nA\n"),
            ("export/readme.txt", "hello"),
        ],
    );

    let mut cfg = config(vec![input.clone()], output.clone());
    cfg.move_files = false;
    let prepared = PipelineEngine::new(cfg)
        .prepare(Mode::Organize, &SilentReporter)
        .unwrap();

    let types: Vec<FileType> = prepared.records().iter().map(|r| r.file_type).collect();
    assert_eq!(
        types,
        vec![
            FileType::Record(RecordType::Responses),
            FileType::Record(RecordType::Classes),
            FileType::Supplementary,
        ]
    );
    assert!(prepared.describe()[0].starts_with(&format!(
        "Copying {}::export/a/responses.csv to ",
        bundle.display()
    )));

    prepared.execute(&SilentReporter).unwrap();

    assert!(output.join("A/responses.csv").is_file());
    assert!(output.join("A/supplementary/slides.pdf").is_file());
    assert!(output.join("classes.csv").is_file());
    assert!(bundle.is_file());
}

#[test]
fn test_compress_merges_each_type_into_one_file() {
    let tmp = tempdir().unwrap();
    let input = tmp.path().join("in");
    let output = tmp.path().join("out");
    write(
        &input.join("a/responses.csv"),
        "class_id,student_id,dt_submitted\nA,s1,t1\nA,s1,t2\n",
    );
    write(
        &input.join("b/responses.csv"),
        "class_id,student_id,dt_submitted\nB,s1,t1\n",
    );
    write(
        &input.join("b-copy/responses.csv"),
        "class_id,student_id,dt_submitted\nB,s1,t1\n",
    );

    let mut cfg = config(vec![input.clone()], output.clone());
    cfg.move_files = false;
    PipelineEngine::new(cfg)
        .run(Mode::Compress, &SilentReporter)
        .unwrap();

    assert_eq!(
        fs::read_to_string(output.join("responses.csv")).unwrap(),
        "class_id,student_id,dt_submitted\nA,s1,t1\nA,s1,t2\nB,s1,t1\n"
    );
    assert!(input.join("b-copy/responses.csv").is_file());
}

#[test]
fn test_compress_dry_run_matches_real_run_with_duplicate_supplementary() {
    let tmp = tempdir().unwrap();
    let first = tmp.path().join("in1");
    let second = tmp.path().join("in2");
    let output = tmp.path().join("out");
    write(&first.join("a/responses.csv"), "class_id,student_id\nA,s1\n");
    write(&first.join("a/supplementary/one.pdf"), "1");
    write(&second.join("a/responses.csv"), "class_id,student_id\nA,s2\n");
    write(&second.join("a/supplementary/two.pdf"), "2");

    let mut cfg = config(vec![first.clone(), second.clone()], output.clone());
    cfg.move_files = false;
    cfg.dry_run = true;
    let dry = PipelineEngine::new(cfg.clone())
        .run(Mode::Compress, &SilentReporter)
        .unwrap();

    let copies = dry
        .report
        .descriptions
        .iter()
        .filter(|d| d.starts_with("Copying") && d.contains("supplementary"))
        .count();
    assert_eq!(copies, 1, "plan: {:?}", dry.report.descriptions);

    cfg.dry_run = false;
    let real = PipelineEngine::new(cfg)
        .run(Mode::Compress, &SilentReporter)
        .unwrap();

    assert_eq!(real.report.descriptions, dry.report.descriptions);
    assert!(output.join("supplementary/A/supplementary/one.pdf").is_file());
    assert!(!output.join("supplementary/A/supplementary/two.pdf").exists());
    assert!(second.join("a/supplementary/two.pdf").is_file());
}

#[test]
fn test_compress_to_parquet_reads_parquet_inputs() {
    let tmp = tempdir().unwrap();
    let input = tmp.path().join("in");
    let output = tmp.path().join("out");
    write(
        &input.join("a/responses.csv"),
        "class_id,student_id,dt_submitted,points_earned\nA,s1,t1,3\n",
    );
    let seed = tmp.path().join("seed/responses.csv");
    write(
        &seed,
        "class_id,student_id,dt_submitted,points_earned\nB,s2,t1,5\n",
    );
    let hint = RecordType::Responses.schema();
    let seeded = FrameTables.scan(&seed, hint).unwrap();
    fs::create_dir_all(input.join("old")).unwrap();
    FrameTables
        .write(&seeded, &input.join("old/responses.parquet"), DataFormat::Parquet)
        .unwrap();

    let mut cfg = config(vec![input.clone()], output.clone());
    cfg.move_files = false;
    cfg.output_format = DataFormat::Parquet;
    let result = PipelineEngine::new(cfg)
        .run(Mode::Compress, &SilentReporter)
        .unwrap();

    assert_eq!(result.records_found, 2);
    assert!(!output.join("responses.csv").exists());
    let merged = FrameTables
        .scan(&output.join("responses.parquet"), hint)
        .unwrap();
    assert_eq!(
        merged.column("class_id").unwrap(),
        vec![Some("A".to_string()), Some("B".to_string())]
    );
    assert_eq!(
        merged.column("points_earned").unwrap(),
        vec![Some("3".to_string()), Some("5".to_string())]
    );
}

#[test]
fn test_entity_id_cannot_escape_the_output() {
    let tmp = tempdir().unwrap();
    let input = tmp.path().join("in");
    let output = tmp.path().join("out");
    write(
        &input.join("evil/responses.csv"),
        "class_id,student_id\n../escaped,s1\n",
    );
    write(&input.join("evil/supplementary/payload.pdf"), "x");

    let result = PipelineEngine::new(config(vec![input.clone()], output.clone()))
        .run(Mode::Organize, &SilentReporter)
        .unwrap();

    assert_eq!(result.records_found, 0);
    assert!(!tmp.path().join("escaped").exists());
    assert!(input.join("evil/responses.csv").is_file());
    assert!(input.join("evil/supplementary/payload.pdf").is_file());
}

#[test]
fn test_file_named_supplementary_is_not_a_supplementary_dir() {
    let tmp = tempdir().unwrap();
    let input = tmp.path().join("in");
    let output = tmp.path().join("out");
    write(&input.join("a/responses.csv"), "class_id\nA\n");
    write(&input.join("a/supplementary"), "just a file");

    let result = PipelineEngine::new(config(vec![input.clone()], output.clone()))
        .run(Mode::Organize, &SilentReporter)
        .unwrap();

    assert_eq!(result.records_found, 1);
    assert!(output.join("A/responses.csv").is_file());
    assert!(!output.join("A/supplementary").exists());
    assert_eq!(
        fs::read_to_string(input.join("a/supplementary")).unwrap(),
        "just a file"
    );
}
