use memtrace_json::commands::{execute_convert, validate_args, validate_records_file, ConvertArgs};
use memtrace_json::pipeline::CancellationToken;
use std::path::PathBuf;

const TRACE: &str = "alloc: 0 0x602010 malloc 40 10 main.c:12 data int*\n\
function-begin: 0 fill\n\
write: 0 0x0000000000602010 4 fill main.c:20 main.c:12 data int*\n\
read: 0 0x0000000000400520 8 _init .plt - - -\n\
function-end: 0 fill\n\
implicit-free: 0x602010\n\
implicit-free\n";

#[test]
fn test_validate_args_missing_file() {
    let args = ConvertArgs {
        input: Some(PathBuf::from("does-not-exist.trace")),
        ..Default::default()
    };

    assert!(validate_args(&args).is_err());
}

#[test]
fn test_missing_input_produces_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.jsonl");
    let args = ConvertArgs {
        input: Some(dir.path().join("missing.trace")),
        output: Some(output.clone()),
        ..Default::default()
    };

    assert!(execute_convert(&args, &CancellationToken::new()).is_err());
    assert!(!output.exists());
}

#[test]
fn test_convert_then_validate() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("trace.out");
    let output = dir.path().join("trace.jsonl");
    std::fs::write(&input, TRACE).unwrap();

    let args = ConvertArgs {
        input: Some(input),
        output: Some(output.clone()),
        ..Default::default()
    };
    let report = execute_convert(&args, &CancellationToken::new()).unwrap();

    assert_eq!(report.lines_read, 7);
    assert_eq!(report.records_written, 5);
    assert_eq!(report.filtered, 1);
    assert_eq!(report.diagnostics.len(), 1);

    let counts = validate_records_file(&output).unwrap();
    assert_eq!(counts.get("allocation"), Some(&1));
    assert_eq!(counts.get("memory-access"), Some(&1));
    assert_eq!(counts.get("function-begin"), Some(&1));
    assert_eq!(counts.get("function-end"), Some(&1));
    assert_eq!(counts.get("implicit-free"), Some(&1));
}

#[test]
fn test_parallel_convert_matches_sequential() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("trace.out");
    let sequential_out = dir.path().join("sequential.jsonl");
    let parallel_out = dir.path().join("parallel.jsonl");
    let chunk_base = dir.path().join("chunks");
    std::fs::write(&input, TRACE).unwrap();
    std::fs::create_dir(&chunk_base).unwrap();

    let sequential = ConvertArgs {
        input: Some(input.clone()),
        output: Some(sequential_out.clone()),
        keep_noise: true,
        ..Default::default()
    };
    execute_convert(&sequential, &CancellationToken::new()).unwrap();

    let parallel = ConvertArgs {
        input: Some(input),
        output: Some(parallel_out.clone()),
        keep_noise: true,
        parallel: true,
        temp_base: Some(chunk_base.clone()),
        workers: Some(3),
        ..Default::default()
    };
    execute_convert(&parallel, &CancellationToken::new()).unwrap();

    assert_eq!(
        std::fs::read_to_string(parallel_out).unwrap(),
        std::fs::read_to_string(sequential_out).unwrap()
    );
    assert_eq!(std::fs::read_dir(chunk_base).unwrap().count(), 0);
}

#[test]
fn test_validate_rejects_non_record_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.jsonl");
    std::fs::write(&path, "{\"event\":\"allocation\"}\n").unwrap();

    assert!(validate_records_file(&path).is_err());
}

#[test]
fn test_sequential_ignores_stale_temp_dir() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("trace.out");
    let output = dir.path().join("trace.jsonl");
    std::fs::write(&input, TRACE).unwrap();

    let args = ConvertArgs {
        input: Some(input),
        output: Some(output.clone()),
        temp_base: Some(PathBuf::from("/nonexistent/tmp")),
        ..Default::default()
    };
    let report = execute_convert(&args, &CancellationToken::new()).unwrap();

    assert_eq!(report.records_written, 5);
    assert_eq!(std::fs::read_to_string(output).unwrap().lines().count(), 5);
}

#[test]
fn test_failed_parallel_run_leaves_no_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("trace.out");
    let output = dir.path().join("trace.jsonl");
    std::fs::write(&input, TRACE).unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let args = ConvertArgs {
        input: Some(input),
        output: Some(output.clone()),
        parallel: true,
        temp_base: Some(dir.path().to_path_buf()),
        workers: Some(2),
        ..Default::default()
    };

    assert!(execute_convert(&args, &cancel).is_err());
    assert!(!output.exists());
    // Only the input is left, no staged output or chunk directory
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_failed_parallel_run_keeps_previous_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("trace.out");
    let output = dir.path().join("trace.jsonl");
    std::fs::write(&input, TRACE).unwrap();
    std::fs::write(&output, "previous\n").unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let args = ConvertArgs {
        input: Some(input),
        output: Some(output.clone()),
        parallel: true,
        temp_base: Some(dir.path().to_path_buf()),
        workers: Some(2),
        ..Default::default()
    };

    assert!(execute_convert(&args, &cancel).is_err());
    assert_eq!(std::fs::read_to_string(output).unwrap(), "previous\n");
}
