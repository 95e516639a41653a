use std::fs;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::model::IntegrateRunManifest;

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_path = &args.manifest_path;
    info!(path = %manifest_path.display(), "status requested");

    if !manifest_path.exists() {
        warn!(path = %manifest_path.display(), "dataset manifest missing");
        return Ok(());
    }

    let raw = fs::read(manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    let manifest: IntegrateRunManifest = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", manifest_path.display()))?;

    info!(
        run_id = %manifest.run_id,
        status = %manifest.status,
        started_at = %manifest.started_at,
        updated_at = %manifest.updated_at,
        output_csv = %manifest.paths.output_csv,
        "loaded dataset manifest"
    );
    info!(
        similarity_threshold = manifest.config.similarity_threshold,
        num_perm = manifest.config.num_perm,
        shingle_size = manifest.config.shingle_size,
        random_seed = manifest.config.random_seed,
        lsh_bands = manifest.config.lsh_bands,
        lsh_rows = manifest.config.lsh_rows,
        "run configuration"
    );

    let steps = &manifest.processing_steps;
    info!(
        initial_news = steps.initial_news,
        initial_tbh = steps.initial_tbh,
        after_date_filter_news = steps.after_date_filter_news,
        after_date_filter_tbh = steps.after_date_filter_tbh,
        after_content_filter = steps.after_content_filter,
        after_exact_dedup = steps.after_exact_dedup,
        after_lsh_dedup = steps.after_lsh_dedup,
        final_rows = steps.final_rows,
        "stage counts"
    );

    let counters = &manifest.counters;
    info!(
        labels_defaulted = counters.labels_defaulted,
        rows_utf8_repaired = counters.rows_utf8_repaired,
        empty_key_dropped = counters.empty_key_dropped,
        lsh_bypassed = counters.lsh_bypassed,
        empty_url = counters.empty_fields.url,
        empty_domain = counters.empty_fields.domain,
        empty_title = counters.empty_fields.title,
        empty_text = counters.empty_fields.text,
        "record counters"
    );

    for (label, count) in &manifest.label_distribution {
        info!(label = %label, count = *count, "label distribution");
    }
    for (source, count) in &manifest.source_distribution {
        info!(source = %source, count = *count, "source distribution");
    }
    info!(
        min = %manifest.date_range.min.clone().unwrap_or_default(),
        max = %manifest.date_range.max.clone().unwrap_or_default(),
        "date range"
    );

    for source in &manifest.source_hashes {
        info!(
            source = %source.source_type,
            path = %source.path,
            rows = source.rows,
            sha256 = %source.sha256,
            "source table"
        );
    }
    for warning in &manifest.warnings {
        warn!(warning = %warning, "manifest warning");
    }

    Ok(())
}
