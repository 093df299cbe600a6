//! bash-block - Shell command policy filter for Claude Code hooks
//!
//! Reads a `PreToolUse` hook payload from stdin and denies shell commands
//! that match the configured rules, however they are disguised.
//!
//! # Usage
//!
//! ```bash
//! # Block git push and git pull
//! echo '{"tool_name":"Bash","tool_input":{"command":"git push"}}' | bash-block --cmd "git push pull"
//!
//! # Block every use of a command, plus a built-in preset
//! bash-block --cmd terraform --preset kubectl
//!
//! # Dry-run mode (report what would be blocked but allow)
//! bash-block --preset git --dry-run
//! ```

use std::env;
use std::io::{self, Read, Write};
use std::process::ExitCode;

use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;

use bash_block::{
    audit::{AuditEntry, AuditLogger},
    config::{Config, DEFAULT_CONFIG_TOML},
    engine::CommandDetector,
    input::HookInput,
    output::{Decision, HookOutput},
    rules::presets,
};

/// Environment variable holding the log filter (e.g. `debug`)
const LOG_ENV: &str = "BASH_BLOCK_LOG";

/// Environment variable that turns on dry-run mode
const DRY_RUN_ENV: &str = "BASH_BLOCK_DRY_RUN";

fn print_version() {
    println!("bash-block {}", env!("CARGO_PKG_VERSION"));
}

fn print_help() {
    let preset_list: Vec<String> = presets::PRESETS
        .iter()
        .map(|p| format!("    {:<10}{}", p.name, p.description))
        .collect();

    println!(
        r#"bash-block - Shell command policy filter for Claude Code hooks

USAGE:
    bash-block [OPTIONS]

OPTIONS:
    -h, --help                Print this help message
    -v, --version             Print version information
        --cmd SPEC            Block a command: "git push pull" blocks those
                              subcommands, "git" alone blocks every use
                              (repeatable)
    -p, --preset NAME         Enable a built-in rule set (repeatable)
        --max-recursion N     Maximum nesting depth for commands inside
                              strings (default: 10)
    -c, --config PATH         Path to config file
    -d, --dry-run             Report what would be blocked but allow

PRESETS:
{}

ENVIRONMENT:
    {}=debug        Log filter for stderr diagnostics (default: warn)
    {}=1        Same as --dry-run

CONFIG FILE (~/.claude/bash-block/config.toml):
{}
USAGE AS HOOK:
    Configure in ~/.claude/settings.json:
    {{
      "hooks": {{
        "PreToolUse": [{{
          "matcher": "Bash",
          "hooks": [{{
            "type": "command",
            "command": "~/.claude/bash-block/bash-block --preset git"
          }}]
        }}]
      }}
    }}
"#,
        preset_list.join("\n"),
        LOG_ENV,
        DRY_RUN_ENV,
        DEFAULT_CONFIG_TOML
    );
}

/// Parse command line arguments
#[derive(Default)]
struct Args {
    help: bool,
    version: bool,
    dry_run: bool,
    config_path: Option<String>,
    max_recursion: Option<usize>,
    rule_specs: Vec<String>,
    presets: Vec<String>,
}

impl Args {
    fn parse() -> Result<Self, String> {
        let args: Vec<String> = env::args().skip(1).collect();
        let mut result = Args::default();
        let mut iter = args.into_iter();

        while let Some(arg) = iter.next() {
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) if flag.starts_with("--") => {
                    (flag.to_string(), Some(value.to_string()))
                }
                _ => (arg.clone(), None),
            };
            let mut value = || {
                inline
                    .clone()
                    .or_else(|| iter.next())
                    .ok_or_else(|| format!("{} requires a value", flag))
            };

            match flag.as_str() {
                "-h" | "--help" => result.help = true,
                "-v" | "--version" => result.version = true,
                "-d" | "--dry-run" => result.dry_run = true,
                "--cmd" => result.rule_specs.push(value()?),
                "-p" | "--preset" => result.presets.push(value()?),
                "-c" | "--config" => result.config_path = Some(value()?),
                "--max-recursion" => {
                    let raw = value()?;
                    let depth = raw
                        .parse()
                        .map_err(|_| format!("--max-recursion expects a number, got `{}`", raw))?;
                    result.max_recursion = Some(depth);
                }
                other => warn!("ignoring unknown argument `{}`", other),
            }
        }

        Ok(result)
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Configuration from file, overlaid with command-line rules
fn build_config(args: &Args) -> Result<Config, String> {
    let mut config = match &args.config_path {
        Some(path) => Config::load_from(std::path::Path::new(path)).map_err(|e| e.to_string())?,
        None => Config::load(),
    };

    for name in &args.presets {
        config.add_preset(name).map_err(|e| e.to_string())?;
    }
    for spec in &args.rule_specs {
        config.add_rule_spec(spec).map_err(|e| e.to_string())?;
    }
    if let Some(depth) = args.max_recursion {
        config.general.max_depth = depth;
    }

    Ok(config)
}

fn write_output(output: &HookOutput) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let _ = writeln!(handle, "{}", output.to_json());
    let _ = handle.flush();
}

fn main() -> ExitCode {
    init_logging();

    let args = match Args::parse() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(1);
        }
    };

    if args.help {
        print_help();
        return ExitCode::SUCCESS;
    }

    if args.version {
        print_version();
        return ExitCode::SUCCESS;
    }

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(1);
        }
    };

    let rules = match config.resolved_rules() {
        Ok(rules) => rules,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(1);
        }
    };
    if rules.is_empty() {
        eprintln!("Error: no rules configured. Use --cmd, --preset or a config file (see --help).");
        return ExitCode::from(1);
    }
    debug!(rules = rules.len(), max_depth = config.general.max_depth, "configuration loaded");

    let dry_run = args.dry_run || env::var(DRY_RUN_ENV).is_ok();
    let mut detector = CommandDetector::new(rules, config.general.max_depth);

    let audit_path = if config.general.audit_log {
        config.audit_path()
    } else {
        None
    };
    let mut logger = AuditLogger::new(audit_path.as_deref());

    let mut input_json = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut input_json) {
        error!("failed to read stdin: {}", e);
    }

    // No input = nothing to check
    if input_json.trim().is_empty() {
        write_output(&HookOutput::allow());
        return ExitCode::SUCCESS;
    }

    // Fail closed: malformed input could be an evasion attempt
    let input = match HookInput::from_json(&input_json) {
        Ok(input) => input,
        Err(e) => {
            error!("failed to parse hook input (denying): {}", e);
            if let Err(e) = logger.log(&AuditEntry::invalid_input(&e.to_string())) {
                warn!("failed to write audit log: {}", e);
            }
            let decision = Decision::deny(vec![format!("Failed to parse hook input: {}", e)]);
            write_output(&HookOutput::from_decision(&decision));
            return ExitCode::SUCCESS;
        }
    };

    let mut decision = detector.check(&input);
    if dry_run {
        decision = decision.into_warning();
    }

    if let Err(e) = logger.log_decision(&input, &decision) {
        warn!("failed to write audit log: {}", e);
    }

    write_output(&HookOutput::from_decision(&decision));
    ExitCode::SUCCESS
}
