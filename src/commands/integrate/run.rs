use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

use super::config::PipelineConfig;
use super::dates::DateParser;
use super::harmonize::{FACT_CHECK_SCHEMA, LoadedSource, NEWS_SCHEMA, load_source};
use super::output::{date_range, label_distribution, source_distribution, write_dataset_csv};
use super::pipeline::{Pipeline, PipelineOutcome};
use crate::cli::IntegrateArgs;
use crate::model::{
    FinalRecord, IntegratePaths, IntegrateRunManifest, RunConfigSnapshot, SourceFileEntry,
};
use crate::util::{
    discard_staged, now_utc_string, promote_staged, sha256_file, staging_path, utc_compact_string,
    write_json_pretty,
};

pub const OUTPUT_CSV_NAME: &str = "dataset_integrated_clean.csv";
pub const MANIFEST_NAME: &str = "dataset_manifest.json";

const LABEL_POLICY: &str = "source_provenance: news rows default to valid (1), fact-check rows default to hoax (0) unless an explicit label column maps otherwise";

pub fn run(args: IntegrateArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let config = PipelineConfig::from_args(&args)?;
    let output_csv = args
        .output_csv
        .clone()
        .unwrap_or_else(|| args.output_dir.join(OUTPUT_CSV_NAME));
    let manifest_path = args
        .manifest_path
        .clone()
        .unwrap_or_else(|| args.output_dir.join(MANIFEST_NAME));

    info!(
        run_id = %run_id,
        news = %args.news_csv.display(),
        fact_check = %args.fact_check_csv.display(),
        "starting integration"
    );

    let dates = DateParser::new()?;
    let news = load_source(&args.news_csv, &NEWS_SCHEMA, &dates)?;
    let fact_check = load_source(&args.fact_check_csv, &FACT_CHECK_SCHEMA, &dates)?;
    let source_hashes = vec![source_entry(&news)?, source_entry(&fact_check)?];

    let pipeline = Pipeline::new(config.clone())?;
    let outcome = pipeline.run(news, fact_check)?;

    let mut warnings = Vec::new();
    if let Some(warning) = &outcome.balance.warning {
        warn!(warning = %warning, "label balance check");
        warnings.push(warning.clone());
    }
    if outcome.counters.labels_defaulted > 0 {
        warnings.push(format!(
            "{} rows had a missing or unrecognised label and took the source default",
            outcome.counters.labels_defaulted
        ));
    }

    let manifest = IntegrateRunManifest {
        manifest_version: 1,
        run_id,
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: render_integrate_command(&args),
        config: RunConfigSnapshot {
            similarity_threshold: config.similarity_threshold,
            num_perm: config.num_perm,
            shingle_size: config.shingle_size,
            random_seed: config.seed,
            lsh_bands: outcome.lsh_params.bands,
            lsh_rows: outcome.lsh_params.rows,
            min_text_chars: config.min_text_chars,
            min_title_chars: config.min_title_chars,
        },
        paths: IntegratePaths {
            news_csv: args.news_csv.display().to_string(),
            fact_check_csv: args.fact_check_csv.display().to_string(),
            output_csv: output_csv.display().to_string(),
            manifest_path: manifest_path.display().to_string(),
        },
        source_hashes,
        processing_steps: outcome.steps.clone(),
        counters: outcome.counters.clone(),
        total_rows: outcome.records.len(),
        label_distribution: label_distribution(&outcome.records),
        source_distribution: source_distribution(&outcome.records),
        date_range: date_range(&outcome.records),
        balance_ratio: outcome.balance.ratio,
        label_policy: LABEL_POLICY.to_string(),
        warnings,
        notes: vec![
            "Exact dedup hashes the canonical key of cleaned title and text; first row wins."
                .to_string(),
            "Near-duplicate dedup is greedy in table order (news first, then fact-check) and may miss pairs near the threshold."
                .to_string(),
            "fingerprint groups rows by domain, title prefix and day; it is not a filter."
                .to_string(),
        ],
    };

    log_outcome(&outcome);

    if args.dry_run {
        info!(
            final_rows = manifest.total_rows,
            "dry-run complete, nothing written"
        );
        return Ok(());
    }

    persist(&output_csv, &manifest_path, &outcome.records, &manifest)?;

    info!(path = %output_csv.display(), rows = manifest.total_rows, "wrote integrated dataset");
    info!(path = %manifest_path.display(), "wrote dataset manifest");

    Ok(())
}

fn source_entry(source: &LoadedSource) -> Result<SourceFileEntry> {
    Ok(SourceFileEntry {
        source_type: source.source_type.as_str().to_string(),
        path: source.path.display().to_string(),
        sha256: sha256_file(&source.path)?,
        rows: source.initial_rows,
    })
}

fn log_outcome(outcome: &PipelineOutcome) {
    let steps = &outcome.steps;
    info!(
        initial_news = steps.initial_news,
        initial_tbh = steps.initial_tbh,
        after_date_filter_news = steps.after_date_filter_news,
        after_date_filter_tbh = steps.after_date_filter_tbh,
        after_content_filter = steps.after_content_filter,
        after_exact_dedup = steps.after_exact_dedup,
        after_lsh_dedup = steps.after_lsh_dedup,
        final_rows = steps.final_rows,
        "integration stage counts"
    );
    for (label, count) in label_distribution(&outcome.records) {
        info!(label = %label, count, "label distribution");
    }
    for (source, count) in source_distribution(&outcome.records) {
        info!(source = %source, count, "source distribution");
    }
}

/// Writes both artifacts to staging paths and renames them into place only
/// once both writes succeeded.
fn persist(
    output_csv: &Path,
    manifest_path: &Path,
    records: &[FinalRecord],
    manifest: &IntegrateRunManifest,
) -> Result<()> {
    let staged_csv = staging_path(output_csv);
    let staged_manifest = staging_path(manifest_path);

    let written = write_dataset_csv(&staged_csv, records)
        .and_then(|()| write_json_pretty(&staged_manifest, manifest));
    if let Err(error) = written {
        discard_staged(&staged_csv);
        discard_staged(&staged_manifest);
        return Err(error);
    }

    if let Err(error) = promote_staged(&staged_csv, output_csv) {
        discard_staged(&staged_csv);
        discard_staged(&staged_manifest);
        return Err(error);
    }
    promote_staged(&staged_manifest, manifest_path)
}

fn render_integrate_command(args: &IntegrateArgs) -> String {
    let mut command = vec![
        "hoaxcorpus".to_string(),
        "integrate".to_string(),
        "--news-csv".to_string(),
        args.news_csv.display().to_string(),
        "--fact-check-csv".to_string(),
        args.fact_check_csv.display().to_string(),
        "--output-dir".to_string(),
        args.output_dir.display().to_string(),
    ];

    if let Some(path) = &args.output_csv {
        command.push("--output-csv".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.manifest_path {
        command.push("--manifest-path".to_string());
        command.push(path.display().to_string());
    }
    command.push("--similarity-threshold".to_string());
    command.push(args.similarity_threshold.to_string());
    command.push("--num-perm".to_string());
    command.push(args.num_perm.to_string());
    command.push("--shingle-size".to_string());
    command.push(args.shingle_size.to_string());
    command.push("--seed".to_string());
    command.push(args.seed.to_string());
    command.push("--min-text-chars".to_string());
    command.push(args.min_text_chars.to_string());
    command.push("--min-title-chars".to_string());
    command.push(args.min_title_chars.to_string());
    if args.dry_run {
        command.push("--dry-run".to_string());
    }

    command.join(" ")
}
