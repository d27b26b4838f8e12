// tests/cli_run.rs

use std::io::Write;

use clap::Parser;
use dojobber::cli::CliArgs;
use dojobber::run;
use tempfile::NamedTempFile;

fn job_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", contents).unwrap();
    file
}

fn cli(file: &NamedTempFile, extra: &[&str]) -> CliArgs {
    let config = file.path().display().to_string();
    let mut argv = vec!["dojobber", "--config", config.as_str()];
    argv.extend_from_slice(extra);
    CliArgs::try_parse_from(argv).unwrap()
}

#[cfg(unix)]
#[test]
fn run_reports_success_and_failure() {
    let file = job_file(
        r#"
[job.top]
after = ["ok", "picky"]

[job.ok]
run = "true"

[job.picky]
check = "test \"$DOJOBBER_MODE\" = fast"
"#,
    );

    assert!(!run(cli(&file, &[])).unwrap());
    assert!(run(cli(&file, &["--kw", "mode=fast"])).unwrap());
}

#[test]
fn dry_run_executes_nothing() {
    let file = job_file(
        r#"
[config]
root = "top"

[job.top]
check = "false"
run = "false"
"#,
    );

    assert!(run(cli(&file, &["--dry-run"])).unwrap());
}

#[cfg(unix)]
#[test]
fn ambiguous_root_is_an_error() {
    let file = job_file(
        r#"
[job.a]
run = "true"

[job.b]
run = "true"
"#,
    );

    let err = run(cli(&file, &[])).unwrap_err();
    assert!(err.to_string().contains("no root job"));
    assert!(run(cli(&file, &["--root", "a", "--no-cleanup"])).is_ok());
}
