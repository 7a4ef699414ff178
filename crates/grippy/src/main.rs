use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};

use grippy_core::{run_review, ReviewRun};
use grippy_rules::default_rules;
use grippy_types::load_profile;

#[derive(Parser)]
#[command(name = "grippy")]
#[command(about = "Security rule gate for pull request diffs", long_about = None)]
struct Cli {
    /// Enable verbose (info-level) logging to stderr.
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Enable debug-level logging to stderr.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the security rules against a unified diff.
    Check(CheckArgs),

    /// Print the registered rules and their default severities.
    Rules(RulesArgs),
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Read unified diff input from a file, or '-' for stdin.
    #[arg(long, value_name = "PATH", default_value = "-")]
    diff_file: PathBuf,

    /// Severity profile: general, security, or strict-security.
    ///
    /// When omitted, falls back to the GRIPPY_PROFILE environment
    /// variable, then to "general".
    #[arg(long)]
    profile: Option<String>,

    /// Where to write the JSON receipt.
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,

    /// Append `rule-findings-count` and `rule-gate-failed` keys to this
    /// file instead of the path named by the GITHUB_OUTPUT env var.
    #[arg(long, value_name = "PATH")]
    github_output: Option<PathBuf>,

    /// Emit GitHub Actions annotations to stdout.
    #[arg(long)]
    github_annotations: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Parser, Debug)]
struct RulesArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> std::process::ExitCode {
    match run_with_args(std::env::args_os()) {
        Ok(code) => std::process::ExitCode::from(code as u8),
        Err(err) => {
            eprintln!("{err:?}");
            std::process::ExitCode::from(1)
        }
    }
}

fn run_with_args<I, T>(args: I) -> Result<i32>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    init_logging(cli.verbose, cli.debug);

    match cli.command {
        Commands::Check(args) => cmd_check(args),
        Commands::Rules(args) => {
            cmd_rules(args)?;
            Ok(0)
        }
    }
}

/// Initialize tracing/logging based on CLI flags.
fn init_logging(verbose: bool, debug: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    debug!("Logging initialized at level: {}", level);
}

fn cmd_check(args: CheckArgs) -> Result<i32> {
    let profile = load_profile(args.profile.as_deref())?;

    let diff_text = if args.diff_file == Path::new("-") {
        info!("Reading unified diff from stdin");
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("read diff from stdin")?;
        buf
    } else {
        info!("Reading unified diff from file: {}", args.diff_file.display());
        std::fs::read_to_string(&args.diff_file)
            .with_context(|| format!("read diff {}", args.diff_file.display()))?
    };

    let run = run_review(&diff_text, &profile);

    if let Some(out_path) = &args.out {
        write_json(out_path, &run.receipt)?;
    }

    write_github_output(&args, &run)?;

    if args.github_annotations {
        for line in &run.annotations {
            println!("{line}");
        }
    }

    match args.format {
        OutputFormat::Text => print!("{}", render_text_report(&run)),
        OutputFormat::Json => {
            let s = serde_json::to_string_pretty(&run.receipt).context("render json")?;
            println!("{s}");
        }
    }

    Ok(run.exit_code)
}

/// Append the step-output keys GitHub Actions workflows consume.
///
/// The target is `--github-output` when given, else the file named by
/// the GITHUB_OUTPUT env var. No target means nothing to write.
fn write_github_output(args: &CheckArgs, run: &ReviewRun) -> Result<()> {
    let target = args
        .github_output
        .clone()
        .or_else(|| std::env::var("GITHUB_OUTPUT").ok().map(PathBuf::from));

    let Some(path) = target else {
        return Ok(());
    };

    use std::io::Write;
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open github output {}", path.display()))?;
    writeln!(file, "rule-findings-count={}", run.receipt.findings.len())
        .and_then(|()| writeln!(file, "rule-gate-failed={}", run.gate_failed))
        .with_context(|| format!("write github output {}", path.display()))?;
    Ok(())
}

fn render_text_report(run: &ReviewRun) -> String {
    let counts = &run.receipt.verdict.counts;
    let mut out = String::new();

    if !run.findings_text.is_empty() {
        out.push_str(&run.findings_text);
        out.push('\n');
    }

    out.push_str(&format!(
        "findings: {} (info={} warn={} error={} critical={})\n",
        run.receipt.findings.len(),
        counts.info,
        counts.warn,
        counts.error,
        counts.critical
    ));
    out.push_str(&format!(
        "profile: {} (fail on {})\n",
        run.receipt.profile,
        run.receipt.verdict.fail_on.as_str()
    ));
    out.push_str(if run.gate_failed {
        "gate: FAILED\n"
    } else {
        "gate: passed\n"
    });
    out
}

fn cmd_rules(args: RulesArgs) -> Result<()> {
    let rules = default_rules();

    match args.format {
        OutputFormat::Text => {
            for rule in &rules {
                println!(
                    "{} [{}] {}",
                    rule.id(),
                    rule.default_severity().as_str(),
                    rule.description()
                );
            }
        }
        OutputFormat::Json => {
            let entries: Vec<_> = rules
                .iter()
                .map(|rule| {
                    serde_json::json!({
                        "id": rule.id(),
                        "severity": rule.default_severity(),
                        "description": rule.description(),
                    })
                })
                .collect();
            let s = serde_json::to_string_pretty(&entries).context("render json")?;
            println!("{s}");
        }
    }

    Ok(())
}

fn write_json(path: &Path, value: &impl serde::Serialize) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
        }
    }

    let bytes = serde_json::to_vec_pretty(value).context("serialize receipt")?;
    std::fs::write(path, bytes).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use grippy_types::{ProfileConfig, Severity};

    fn strict() -> ProfileConfig {
        ProfileConfig {
            name: "strict-security".to_string(),
            fail_on: Severity::Warn,
        }
    }

    const SUDO_DIFF: &str = "\
diff --git a/scripts/deploy.sh b/scripts/deploy.sh
@@ -1,0 +1,1 @@
+sudo systemctl restart app
";

    #[test]
    fn text_report_names_profile_and_gate() {
        let run = run_review(SUDO_DIFF, &strict());
        let report = render_text_report(&run);
        assert!(report.contains("[WARN] ci-script-execution-risk @ scripts/deploy.sh:1"));
        assert!(report.contains("profile: strict-security (fail on warn)"));
        assert!(report.contains("gate: FAILED"));
    }

    #[test]
    fn text_report_for_clean_diff_shows_zero_counts() {
        let run = run_review("", &strict());
        let report = render_text_report(&run);
        assert!(report.starts_with("findings: 0 (info=0 warn=0 error=0 critical=0)"));
        assert!(report.contains("gate: passed"));
    }

    #[test]
    fn github_output_appends_both_keys() {
        let dir = tempfile::TempDir::new().unwrap();
        let out_path = dir.path().join("gh-output.txt");
        std::fs::write(&out_path, "earlier=1\n").unwrap();

        let args = CheckArgs {
            diff_file: PathBuf::from("-"),
            profile: None,
            out: None,
            github_output: Some(out_path.clone()),
            github_annotations: false,
            format: OutputFormat::Text,
        };
        let run = run_review(SUDO_DIFF, &strict());
        write_github_output(&args, &run).unwrap();

        let contents = std::fs::read_to_string(&out_path).unwrap();
        assert_eq!(
            contents,
            "earlier=1\nrule-findings-count=1\nrule-gate-failed=true\n"
        );
    }

    #[test]
    fn write_json_creates_parent_dirs() {
        let dir = tempfile::TempDir::new().unwrap();
        let json_path = dir.path().join("nested/receipt.json");

        let run = run_review("", &strict());
        write_json(&json_path, &run.receipt).unwrap();

        let text = std::fs::read_to_string(&json_path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["schema"], "grippy.rules.v1");
    }

    #[test]
    fn cli_parses_check_defaults() {
        let cli = Cli::parse_from(["grippy", "check"]);
        let Commands::Check(args) = cli.command else {
            panic!("expected check");
        };
        assert_eq!(args.diff_file, PathBuf::from("-"));
        assert!(args.profile.is_none());
        assert!(!args.github_annotations);
    }

    #[test]
    fn cli_parses_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["grippy", "rules", "--format", "json", "-v"]);
        assert!(cli.verbose);
        let Commands::Rules(args) = cli.command else {
            panic!("expected rules");
        };
        assert!(matches!(args.format, OutputFormat::Json));
    }
}
