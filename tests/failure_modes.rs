//! Failure paths through the full pipeline: held and stale locks, missing
//! files, failing programs. Every case must release the run directory lock.

#![cfg(unix)]

use std::fs;
use std::path::Path;
use std::time::Duration;

use synspec::io::lock::LockOptions;
use synspec::test_support::{write_failing_program, write_fake_program, write_model_inputs};
use synspec::{RunDirSpec, RunRequest, Synspec, SynspecBuilder, SynspecError};

fn pipeline(invoke: &Path, program: &Path) -> SynspecBuilder {
    let mut builder = Synspec::builder().program(program);
    for name in ["fort.19", "fort.55", "{model}.5", "{model}.7"] {
        let source = invoke.join(name).to_string_lossy().into_owned();
        builder = builder.link_as(source, name);
    }
    builder
}

fn downcast(err: &anyhow::Error) -> &SynspecError {
    err.downcast_ref::<SynspecError>()
        .unwrap_or_else(|| panic!("expected a synspec error, got: {err:?}"))
}

/// Verifies a directory with a fresh foreign lock is rejected and the lock
/// file is left byte-identical.
#[test]
fn busy_directory_is_rejected_without_touching_the_lock() {
    let invoke = tempfile::tempdir().expect("invoke dir");
    let work = tempfile::tempdir().expect("work dir");
    write_model_inputs(invoke.path(), "m").expect("fixtures");
    let program = invoke.path().join("fake-synspec");
    write_fake_program(&program, &[]).expect("program");

    let run_path = work.path().join("run");
    fs::create_dir_all(&run_path).expect("create run dir");
    fs::write(run_path.join("synspec.lock"), "999999-aaaaaaaa").expect("foreign lock");

    let synspec = pipeline(invoke.path(), &program).build().expect("build");
    let request = RunRequest::new("m").run_dir(RunDirSpec::Explicit(run_path.clone()));

    let err = synspec.run(&request).expect_err("busy lock");
    assert!(matches!(downcast(&err), SynspecError::LockBusy { .. }));
    assert_eq!(
        fs::read_to_string(run_path.join("synspec.lock")).expect("lock"),
        "999999-aaaaaaaa"
    );
    // Nothing was staged behind the other run's back.
    assert!(run_path.join("fort.19").symlink_metadata().is_err());
}

/// Verifies a lock past the staleness threshold is reclaimed and the run
/// proceeds.
#[test]
fn stale_lock_is_reclaimed_and_run_proceeds() {
    let invoke = tempfile::tempdir().expect("invoke dir");
    let work = tempfile::tempdir().expect("work dir");
    write_model_inputs(invoke.path(), "m").expect("fixtures");
    let program = invoke.path().join("fake-synspec");
    write_fake_program(&program, &[]).expect("program");

    let run_path = work.path().join("run");
    fs::create_dir_all(&run_path).expect("create run dir");
    fs::write(run_path.join("synspec.lock"), "999999-aaaaaaaa").expect("abandoned lock");

    let synspec = pipeline(invoke.path(), &program)
        .lock_options(LockOptions {
            stale_after: Duration::ZERO,
            ..LockOptions::default()
        })
        .build()
        .expect("build");
    let request = RunRequest::new("m").run_dir(RunDirSpec::Explicit(run_path.clone()));

    synspec.run(&request).expect("run");
    assert!(run_path.join("m.spec").is_file());
    assert!(!run_path.join("synspec.lock").exists());
}

/// Verifies a missing input is named before the program runs, with the lock
/// released afterwards.
#[test]
fn missing_model_table_is_named_and_lock_released() {
    let invoke = tempfile::tempdir().expect("invoke dir");
    let work = tempfile::tempdir().expect("work dir");
    write_model_inputs(invoke.path(), "m").expect("fixtures");
    fs::remove_file(invoke.path().join("m.7")).expect("remove");
    let program = invoke.path().join("fake-synspec");
    write_fake_program(&program, &[]).expect("program");

    let run_path = work.path().join("run");
    let synspec = pipeline(invoke.path(), &program).build().expect("build");
    let request = RunRequest::new("m").run_dir(RunDirSpec::Explicit(run_path.clone()));

    let err = synspec.run(&request).expect_err("missing input");
    match downcast(&err) {
        SynspecError::MissingInputFile { name, .. } => assert_eq!(name, "m.7"),
        other => panic!("unexpected error: {other:?}"),
    }
    // The program never ran.
    assert!(!run_path.join("stdin.capture").exists());
    assert!(!run_path.join("synspec.lock").exists());
}

/// Verifies a failing program reports its exit code, keeps the raw log for
/// post-mortem, extracts nothing, and still releases the lock.
#[test]
fn failing_program_reports_code_and_keeps_log() {
    let invoke = tempfile::tempdir().expect("invoke dir");
    let work = tempfile::tempdir().expect("work dir");
    write_model_inputs(invoke.path(), "m").expect("fixtures");
    let program = invoke.path().join("failing-synspec");
    write_failing_program(&program, 3).expect("program");

    let run_path = work.path().join("run");
    let out_path = work.path().join("out");
    let synspec = pipeline(invoke.path(), &program).build().expect("build");
    let request = RunRequest::new("m")
        .run_dir(RunDirSpec::Explicit(run_path.clone()))
        .output_dir(out_path.clone());

    let err = synspec.run(&request).expect_err("failing program");
    match downcast(&err) {
        SynspecError::ExternalProcessFailed { code, log } => {
            assert_eq!(*code, Some(3));
            let contents = fs::read_to_string(log).expect("log");
            assert!(contents.contains("about to fail"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!out_path.exists(), "no outputs should be extracted");
    assert!(!run_path.join("synspec.lock").exists());
}

/// Verifies a run whose program produced no `fort.16` fails naming that
/// unit, with the outputs copied so far kept.
#[test]
fn missing_output_unit_is_named_and_partials_kept() {
    let invoke = tempfile::tempdir().expect("invoke dir");
    let work = tempfile::tempdir().expect("work dir");
    write_model_inputs(invoke.path(), "m").expect("fixtures");
    let program = invoke.path().join("fake-synspec");
    write_fake_program(&program, &["fort.16"]).expect("program");

    let run_path = work.path().join("run");
    let out_path = work.path().join("out");
    let synspec = pipeline(invoke.path(), &program).build().expect("build");
    let request = RunRequest::new("m")
        .run_dir(RunDirSpec::Explicit(run_path.clone()))
        .output_dir(out_path.clone());

    let err = synspec.run(&request).expect_err("missing output");
    match downcast(&err) {
        SynspecError::MissingOutputFile { name, .. } => assert_eq!(name, "fort.16"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(out_path.join("m.spec").is_file());
    assert!(out_path.join("m.iden").is_file());
    assert!(!out_path.join("m.eqws").exists());
    assert!(!run_path.join("synspec.lock").exists());
}

/// Verifies an entry that would link a file onto itself is rejected during
/// planning, before anything is staged.
#[test]
fn self_link_is_rejected_before_staging() {
    let invoke = tempfile::tempdir().expect("invoke dir");
    let work = tempfile::tempdir().expect("work dir");
    write_model_inputs(invoke.path(), "m").expect("fixtures");
    let program = invoke.path().join("fake-synspec");
    write_fake_program(&program, &[]).expect("program");

    let run_path = work.path().join("run");
    fs::create_dir_all(&run_path).expect("create run dir");
    let run_canon = run_path.canonicalize().expect("canonicalize");
    let self_source = run_canon.join("fort.19").to_string_lossy().into_owned();

    let synspec = pipeline(invoke.path(), &program)
        .link_as(self_source, "fort.19")
        .build()
        .expect("build");
    let request = RunRequest::new("m").run_dir(RunDirSpec::Explicit(run_path.clone()));

    let err = synspec.run(&request).expect_err("self link");
    match downcast(&err) {
        SynspecError::InvalidLink { dest, .. } => assert_eq!(dest, "fort.19"),
        other => panic!("unexpected error: {other:?}"),
    }
    // Planning failed eagerly: no entry was staged, the lock is gone.
    assert!(run_path.join("fort.55").symlink_metadata().is_err());
    assert!(!run_path.join("synspec.lock").exists());
}
