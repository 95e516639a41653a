use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};

use super::dates::format_output_timestamp;
use crate::model::{DateRange, FinalRecord, OutputRow};
use crate::util::ensure_parent_directory;

pub fn to_output_row(record: &FinalRecord) -> OutputRow {
    OutputRow {
        id: record.id.clone(),
        url: record.url.clone(),
        domain: record.domain.clone(),
        date: format_output_timestamp(record.date),
        title: record.title.clone(),
        text: record.text.clone(),
        source_type: record.source_type.as_str().to_string(),
        dataset_origin: record.source_type.dataset_origin().to_string(),
        fingerprint: record.fingerprint.clone(),
        label: record.label.code(),
        label_str: record.label.as_str().to_string(),
    }
}

pub fn write_dataset_csv(path: &Path, records: &[FinalRecord]) -> Result<()> {
    ensure_parent_directory(path)?;

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create dataset csv: {}", path.display()))?;
    for record in records {
        writer
            .serialize(to_output_row(record))
            .with_context(|| format!("failed to write row '{}' to {}", record.id, path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush dataset csv: {}", path.display()))?;

    Ok(())
}

pub fn label_distribution(records: &[FinalRecord]) -> BTreeMap<String, usize> {
    let mut distribution = BTreeMap::new();
    for record in records {
        *distribution
            .entry(record.label.as_str().to_string())
            .or_insert(0) += 1;
    }
    distribution
}

pub fn source_distribution(records: &[FinalRecord]) -> BTreeMap<String, usize> {
    let mut distribution = BTreeMap::new();
    for record in records {
        *distribution
            .entry(record.source_type.as_str().to_string())
            .or_insert(0) += 1;
    }
    distribution
}

pub fn date_range(records: &[FinalRecord]) -> DateRange {
    DateRange {
        min: records
            .iter()
            .map(|record| record.date)
            .min()
            .map(format_output_timestamp),
        max: records
            .iter()
            .map(|record| record.date)
            .max()
            .map(format_output_timestamp),
    }
}
