//! `plink run`, `plink resolve`, `plink validate`: config-driven linkage.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use parcelink_matcher::loader::{load_contacts, load_reference};
use parcelink_matcher::{
    compute_summary, InMemoryReference, LinkConfig, MatchRequest, MatchResponse, MatchSummary,
    Matcher, StrategyKind,
};

use crate::exit_codes::EXIT_UNMATCHED;
use crate::CliError;

#[derive(Serialize)]
struct RunMeta {
    config_name: String,
    engine_version: String,
    run_at: String,
    contacts_file: String,
    counties: Vec<String>,
}

#[derive(Serialize)]
struct RunOutput {
    meta: RunMeta,
    summary: MatchSummary,
    results: Vec<MatchResponse>,
}

/// Error line emitted by `resolve` for a request it cannot parse.
#[derive(Serialize)]
struct ResolveError {
    line: usize,
    error: String,
}

fn read_config(config_path: &Path) -> Result<LinkConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        CliError::args(format!("cannot read config {}: {e}", config_path.display()))
    })?;
    Ok(LinkConfig::from_toml(&config_str)?)
}

/// Reference files resolve against the config file's directory.
fn base_dir(config_path: &Path) -> &Path {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

fn load(config_path: &Path) -> Result<(LinkConfig, InMemoryReference), CliError> {
    let config = read_config(config_path)?;
    let reference = load_reference(&config, base_dir(config_path))?;
    Ok((config, reference))
}

pub fn cmd_run(
    config_path: PathBuf,
    contacts_path: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
    strict: bool,
) -> Result<(), CliError> {
    let (config, reference) = load(&config_path)?;

    let contacts_str = std::fs::read_to_string(&contacts_path).map_err(|e| {
        CliError::args(format!("cannot read contacts {}: {e}", contacts_path.display()))
    })?;
    let contacts_name = contacts_path.display().to_string();
    let requests = load_contacts(&contacts_name, &contacts_str, &config.contacts)?;

    let matcher = Matcher::new(config.matching.clone());
    let results = matcher.match_batch(&reference, &requests);
    let summary = compute_summary(&requests, &results);

    let output = RunOutput {
        meta: RunMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            contacts_file: contacts_name,
            counties: reference.counties().map(str::to_string).collect(),
        },
        summary,
        results: results.iter().map(MatchResponse::from).collect(),
    };

    let json_str = serde_json::to_string_pretty(&output)
        .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = output_file {
        std::fs::write(path, &json_str)
            .map_err(|e| CliError::io(format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    }

    // Human summary to stderr
    let s = &output.summary;
    eprintln!(
        "'{}': {} contact(s): {} matched ({} fuzzy), {} no match, {} insufficient input, {} without county data",
        config.name,
        s.total,
        s.matched,
        s.fuzzy,
        s.no_match,
        s.insufficient_input,
        s.collection_not_found,
    );
    if !s.missing_counties.is_empty() {
        eprintln!("counties without reference data: {}", s.missing_counties.join(", "));
    }

    let unmatched = s.no_match + s.insufficient_input + s.collection_not_found;
    if strict && unmatched > 0 {
        return Err(CliError::new(
            EXIT_UNMATCHED,
            format!("{unmatched} of {} contact(s) unmatched", s.total),
        ));
    }
    Ok(())
}

pub fn cmd_resolve(config_path: PathBuf) -> Result<(), CliError> {
    let (config, reference) = load(&config_path)?;
    let matcher = Matcher::new(config.matching);
    info!(counties = reference.counties().count(), "resolve ready");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for (i, line) in stdin.lock().lines().enumerate() {
        let line = line.map_err(|e| CliError::io(format!("cannot read stdin: {e}")))?;
        if line.trim().is_empty() {
            continue;
        }

        let reply = match serde_json::from_str::<MatchRequest>(&line) {
            Ok(req) => {
                let result = matcher.match_contact(&reference, &req.contact, &req.county);
                serde_json::to_string(&MatchResponse::from(&result))
            }
            Err(e) => {
                debug!(line = i + 1, error = %e, "malformed request");
                serde_json::to_string(&ResolveError {
                    line: i + 1,
                    error: e.to_string(),
                })
            }
        }
        .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;

        writeln!(out, "{reply}")
            .and_then(|_| out.flush())
            .map_err(|e| CliError::io(format!("cannot write stdout: {e}")))?;
    }
    Ok(())
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = read_config(&config_path)?;
    let enabled = StrategyKind::ALL
        .iter()
        .filter(|k| config.matching.is_enabled(**k))
        .count();
    eprintln!(
        "valid: '{}' with {} county(ies), {} of {} strategies enabled",
        config.name,
        config.counties.len(),
        enabled,
        StrategyKind::ALL.len(),
    );
    Ok(())
}
