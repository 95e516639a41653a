use anyhow::{Context, Result, bail};

use super::config::PipelineConfig;
use crate::model::{EmptyFieldCounts, FinalRecord, Label, Record};

const MIN_CLASS_ROWS: usize = 10;

#[derive(Debug, Clone, Copy)]
pub struct ContentFilter {
    min_text_chars: usize,
    min_title_chars: usize,
}

impl ContentFilter {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            min_text_chars: config.min_text_chars,
            min_title_chars: config.min_title_chars,
        }
    }

    /// Cleaned text or title must be long enough to carry signal.
    pub fn has_enough_content(&self, record: &Record) -> bool {
        record.text_clean.chars().count() > self.min_text_chars
            || record.title_clean.chars().count() > self.min_title_chars
    }
}

/// Converts pipeline records into persisted rows. A label outside {0, 1} or
/// a missing date at this point means harmonization is broken, so the run
/// stops instead of dropping the row.
pub fn validate_records(records: Vec<Record>) -> Result<Vec<FinalRecord>> {
    records
        .into_iter()
        .map(|record| -> Result<FinalRecord> {
            let Some(label) = Label::from_code(record.label_code) else {
                bail!(
                    "invalid label {} on record '{}' from source '{}', expected 0 or 1",
                    record.label_code,
                    record.id,
                    record.source_type.as_str()
                );
            };
            let date = record.date.with_context(|| {
                format!("record '{}' reached validation without a date", record.id)
            })?;

            Ok(FinalRecord {
                id: record.id,
                url: record.url,
                domain: record.domain,
                date,
                title: record.title_clean,
                text: record.text_clean,
                source_type: record.source_type,
                fingerprint: record.fingerprint,
                label,
            })
        })
        .collect()
}

/// Blank-cell counts of the final table, the null report of the last gate.
pub fn empty_field_counts(records: &[FinalRecord]) -> EmptyFieldCounts {
    let blank = |value: &str| usize::from(value.trim().is_empty());
    records
        .iter()
        .fold(EmptyFieldCounts::default(), |mut counts, record| {
            counts.url += blank(&record.url);
            counts.domain += blank(&record.domain);
            counts.title += blank(&record.title);
            counts.text += blank(&record.text);
            counts
        })
}

#[derive(Debug, Clone, PartialEq)]
pub struct BalanceReport {
    pub ratio: Option<f64>,
    pub warning: Option<String>,
}

/// Minority-class share of the final table. Both classes are counted even
/// when one of them is absent.
pub fn balance_report(records: &[FinalRecord]) -> BalanceReport {
    let hoax = records
        .iter()
        .filter(|record| record.label == Label::Hoax)
        .count();
    let valid = records.len() - hoax;
    let minority = hoax.min(valid);

    if minority < MIN_CLASS_ROWS {
        return BalanceReport {
            ratio: None,
            warning: Some(format!(
                "minority class has only {minority} rows (hoax={hoax}, valid={valid}); stratified splits may fail"
            )),
        };
    }

    BalanceReport {
        ratio: Some(minority as f64 / records.len() as f64),
        warning: None,
    }
}
