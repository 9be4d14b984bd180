//! deadstore CLI - finds assignments whose value is never read.
//!
//! Exit status:
//! - `0`: no unused assignments
//! - `1`: at least one unused assignment was reported
//! - `2`: the sources could not be loaded, or an internal error occurred

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use deadstore_core::builder::Deadstore;
use deadstore_core::config::{find_config, DeadstoreConfig};
use deadstore_core::logging::init_structured_logging;
use deadstore_core::occurrence::Finding;
use deadstore_core::report::{print_json, print_plain, print_summary, report};

const LONG_ABOUT: &str = "\
'deadstore' finds unused assignments in your code.

The compiler checks for unused variables, but sometimes assignments
are never read before getting overwritten or ignored. For example this
code:

   fn main() {
       let (_, mut err) = emit(\"Hello\");
       (_, err) = emit(\" world\");
       (_, err) = emit(&format!(\"{:?}\", err));
   }

The err variable is used so the compiler does not complain, but the
first and third assignment to the err variable are never checked.
'deadstore' finds that mistake as follows:

   $ deadstore ./testdata/
   Unused assignment for 'err' ./testdata/main.rs:2:17
   Unused assignment for 'err' ./testdata/main.rs:4:9
   $ echo $?
   1";

#[derive(Parser, Debug)]
#[command(author, version, about = "Finds assignments whose value is never read", long_about = LONG_ABOUT)]
pub struct Cli {
    /// Files or directories to analyse
    #[arg(default_value = ".")]
    paths: Vec<PathBuf>,

    /// Output results in JSON format (stdout)
    #[arg(long)]
    json: bool,

    /// Variable names or patterns to ignore (`prefix*`, `*suffix`, substring)
    #[arg(long, num_args = 1..)]
    ignore: Vec<String>,

    /// Directory names to skip while scanning
    #[arg(long, num_args = 1..)]
    exclude: Vec<String>,

    /// Also report names starting with `_`
    #[arg(long)]
    include_underscored: bool,

    /// Classify occurrences on a single thread
    #[arg(long)]
    sequential: bool,

    /// Print skip statistics and debug logs
    #[arg(short, long)]
    verbose: bool,
}

/// Effective options after merging deadstore.toml with the command line.
#[derive(Debug, Default, PartialEq)]
struct Settings {
    json: bool,
    ignore: Vec<String>,
    exclude: Vec<String>,
    verbose: bool,
}

impl Settings {
    /// Command-line flags win; list options from both sources are combined.
    fn merge(cli: &Cli, config: Option<DeadstoreConfig>) -> Self {
        let config = config.unwrap_or_default();
        let json = cli.json || config.wants_json();

        let mut ignore = config.ignore.unwrap_or_default();
        ignore.extend(cli.ignore.iter().cloned());
        let mut exclude = config.exclude.unwrap_or_default();
        exclude.extend(cli.exclude.iter().cloned());

        Self {
            json,
            ignore,
            exclude,
            verbose: cli.verbose || config.verbose.unwrap_or(false),
        }
    }
}

/// Where deadstore.toml is looked for: the first directory argument, then
/// the working directory.
fn config_dirs(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = paths.iter().filter(|p| p.is_dir()).take(1).cloned().collect();
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| same_dir(d, &cwd)) {
            dirs.push(cwd);
        }
    }
    dirs
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Runs the analysis and returns the process exit code.
fn run(cli: &Cli) -> Result<i32> {
    let dirs = config_dirs(&cli.paths);
    let config = find_config(dirs.iter().map(PathBuf::as_path))
        .context("Failed to load deadstore.toml")?;
    let settings = Settings::merge(cli, config);

    init_structured_logging(settings.verbose);

    let result = Deadstore::new(cli.paths.iter().cloned())
        .exclude_dirs(settings.exclude.iter().cloned())
        .ignore_patterns(settings.ignore.iter().cloned())
        .include_underscored(cli.include_underscored)
        .parallel(!cli.sequential)
        .analyze()?;

    if settings.json {
        print_json(&result.report);
    } else {
        print_plain(&result.report.findings);
    }
    if settings.verbose {
        print_summary(&result.report, result.files.len(), result.functions);
    }

    Ok(exit_code(&result.report.findings))
}

/// `1` when any finding is unused, `0` otherwise.
fn exit_code(findings: &[Finding]) -> i32 {
    let (_, failed) = report(findings);
    i32::from(failed)
}

fn main() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("[PANIC] deadstore internal error: {}", info);
        eprintln!("[PANIC] The process will exit with code 2.");
    }));

    let cli = Cli::parse();

    let code = match std::panic::catch_unwind(|| run(&cli)) {
        Ok(Ok(code)) => code,
        Ok(Err(err)) => {
            eprintln!("Error: {:#}", err);
            2
        }
        Err(_) => 2,
    };
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use deadstore_core::config::OutputConfig;
    use std::fs;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn create_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn create_temp_dir(name: &str) -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let temp_dir = std::env::temp_dir()
            .join("deadstore_cli_test")
            .join(format!("{}_{}_{}", name, std::process::id(), id));
        if temp_dir.exists() {
            fs::remove_dir_all(&temp_dir).ok();
        }
        fs::create_dir_all(&temp_dir).unwrap();
        temp_dir
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("deadstore").chain(args.iter().copied()))
    }

    // --- argument parsing ---

    #[test]
    fn test_defaults() {
        let cli = cli(&[]);
        assert_eq!(cli.paths, vec![PathBuf::from(".")]);
        assert!(!cli.json);
        assert!(!cli.sequential);
        assert!(cli.ignore.is_empty());
    }

    #[test]
    fn test_flags() {
        let cli = cli(&[
            "src",
            "tests",
            "--json",
            "--ignore",
            "tmp*",
            "guard",
            "--exclude",
            "generated",
            "--include-underscored",
            "--sequential",
            "-v",
        ]);
        assert_eq!(cli.paths, vec![PathBuf::from("src"), PathBuf::from("tests")]);
        assert!(cli.json);
        assert_eq!(cli.ignore, vec!["tmp*", "guard"]);
        assert_eq!(cli.exclude, vec!["generated"]);
        assert!(cli.include_underscored);
        assert!(cli.sequential);
        assert!(cli.verbose);
    }

    // --- settings merge ---

    #[test]
    fn test_merge_without_config() {
        let settings = Settings::merge(&cli(&["--ignore", "a"]), None);
        assert_eq!(
            settings,
            Settings {
                json: false,
                ignore: vec!["a".to_string()],
                exclude: Vec::new(),
                verbose: false,
            }
        );
    }

    #[test]
    fn test_merge_combines_config_and_flags() {
        let config = DeadstoreConfig {
            ignore: Some(vec!["from_config".to_string()]),
            exclude: Some(vec!["vendor".to_string()]),
            verbose: Some(true),
            output: Some(OutputConfig {
                format: Some("json".to_string()),
            }),
        };
        let settings = Settings::merge(&cli(&["--ignore", "from_cli"]), Some(config));
        assert!(settings.json);
        assert!(settings.verbose);
        assert_eq!(settings.ignore, vec!["from_config", "from_cli"]);
        assert_eq!(settings.exclude, vec!["vendor"]);
    }

    #[test]
    fn test_json_flag_wins_over_plain_config() {
        let config = DeadstoreConfig {
            output: Some(OutputConfig {
                format: Some("plain".to_string()),
            }),
            ..Default::default()
        };
        assert!(Settings::merge(&cli(&["--json"]), Some(config)).json);
    }

    #[test]
    fn test_exit_code_follows_report_outcome() {
        let finding = |unused| Finding {
            name: "err".to_string(),
            position: deadstore_core::occurrence::Position::new("main.rs", 2, 17),
            unused,
        };
        assert_eq!(exit_code(&[]), 0);
        assert_eq!(exit_code(&[finding(false)]), 0);
        assert_eq!(exit_code(&[finding(false), finding(true)]), 1);
    }

    // --- end to end ---

    #[test]
    fn test_exit_code_zero_when_clean() {
        let dir = create_temp_dir("clean");
        create_file(
            &dir.join("src/main.rs"),
            "fn main() {\n    let x = 1;\n    println!(\"{x}\");\n}\n",
        );
        let code = run(&cli(&[dir.to_str().unwrap()])).unwrap();
        assert_eq!(code, 0);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_exit_code_one_with_findings() {
        let dir = create_temp_dir("findings");
        create_file(
            &dir.join("src/main.rs"),
            "fn main() {\n    let mut x = 1;\n    x = 2;\n    println!(\"{x}\");\n}\n",
        );
        let code = run(&cli(&[dir.to_str().unwrap(), "--json"])).unwrap();
        assert_eq!(code, 1);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_config_ignore_applies() {
        let dir = create_temp_dir("config_ignore");
        create_file(
            &dir.join("src/main.rs"),
            "fn main() {\n    let mut x = 1;\n    x = 2;\n    println!(\"{x}\");\n}\n",
        );
        create_file(&dir.join("deadstore.toml"), "ignore = [\"x\"]\n");
        let code = run(&cli(&[dir.to_str().unwrap()])).unwrap();
        assert_eq!(code, 0);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_parse_error_is_fatal() {
        let dir = create_temp_dir("fatal");
        create_file(&dir.join("src/main.rs"), "fn main() { let = 1; }\n");
        assert!(run(&cli(&[dir.to_str().unwrap()])).is_err());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_config_dirs_prefers_first_directory() {
        let dir = create_temp_dir("config_dirs");
        let file = dir.join("lib.rs");
        create_file(&file, "");
        let dirs = config_dirs(&[file, dir.clone()]);
        assert_eq!(dirs[0], dir);
        fs::remove_dir_all(&dir).ok();
    }
}
