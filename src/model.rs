use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Binary ground truth carried by every persisted row.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Label {
    Hoax,
    Valid,
}

impl Label {
    pub fn code(self) -> i64 {
        match self {
            Self::Hoax => 0,
            Self::Valid => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hoax => "hoax",
            Self::Valid => "valid",
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Hoax),
            1 => Some(Self::Valid),
            _ => None,
        }
    }
}

/// Origin category of a record. Labels are assigned from this by default.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum SourceType {
    News,
    FactCheck,
}

impl SourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::News => "news",
            Self::FactCheck => "tbh",
        }
    }

    pub fn dataset_origin(self) -> &'static str {
        match self {
            Self::News => "news",
            Self::FactCheck => "turnbackhoax",
        }
    }

    pub fn default_label(self) -> Label {
        match self {
            Self::News => Label::Valid,
            Self::FactCheck => Label::Hoax,
        }
    }
}

/// One harmonized row moving through the pipeline.
///
/// `title` and `text` hold the raw source strings; the `*_clean`,
/// `canonical_key` and `fingerprint` fields are derived and
/// stay empty until the matching stage runs. `label_code` is kept as the raw
/// integer so the validation gate can reject values outside {0, 1}.
#[derive(Debug, Clone)]
pub struct Record {
    pub id: String,
    pub url: String,
    pub domain: String,
    pub date: Option<NaiveDateTime>,
    pub title: String,
    pub text: String,
    pub source_type: SourceType,
    pub label_code: i64,
    pub authors: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    pub title_clean: String,
    pub text_clean: String,
    pub canonical_key: String,
    pub fingerprint: String,
}

impl Record {
    pub fn new(id: impl Into<String>, source_type: SourceType) -> Self {
        Self {
            id: id.into(),
            url: String::new(),
            domain: String::new(),
            date: None,
            title: String::new(),
            text: String::new(),
            source_type,
            label_code: source_type.default_label().code(),
            authors: None,
            categories: None,
            title_clean: String::new(),
            text_clean: String::new(),
            canonical_key: String::new(),
            fingerprint: String::new(),
        }
    }
}

/// A record that passed the validation gate and is ready to persist.
#[derive(Debug, Clone)]
pub struct FinalRecord {
    pub id: String,
    pub url: String,
    pub domain: String,
    pub date: NaiveDateTime,
    pub title: String,
    pub text: String,
    pub source_type: SourceType,
    pub fingerprint: String,
    pub label: Label,
}

/// Row layout of `dataset_integrated_clean.csv`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputRow {
    pub id: String,
    pub url: String,
    pub domain: String,
    pub date: String,
    pub title: String,
    pub text: String,
    pub source_type: String,
    pub dataset_origin: String,
    pub fingerprint: String,
    pub label: i64,
    pub label_str: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfigSnapshot {
    pub similarity_threshold: f64,
    pub num_perm: usize,
    pub shingle_size: usize,
    pub random_seed: u64,
    pub lsh_bands: usize,
    pub lsh_rows: usize,
    pub min_text_chars: usize,
    pub min_title_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegratePaths {
    pub news_csv: String,
    pub fact_check_csv: String,
    pub output_csv: String,
    pub manifest_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFileEntry {
    pub source_type: String,
    pub path: String,
    pub sha256: String,
    pub rows: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingSteps {
    pub initial_news: usize,
    pub initial_tbh: usize,
    pub after_date_filter_news: usize,
    pub after_date_filter_tbh: usize,
    pub after_content_filter: usize,
    pub after_exact_dedup: usize,
    pub after_lsh_dedup: usize,
    #[serde(rename = "final")]
    pub final_rows: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunCounters {
    pub labels_defaulted: usize,
    /// Rows with at least one cell that was not valid UTF-8, decoded lossily.
    pub rows_utf8_repaired: usize,
    pub empty_key_dropped: usize,
    pub lsh_bypassed: usize,
    pub with_authors: usize,
    pub with_categories: usize,
    pub empty_fields: EmptyFieldCounts,
}

/// Blank cells per output column in the final table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmptyFieldCounts {
    pub url: usize,
    pub domain: usize,
    pub title: usize,
    pub text: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub min: Option<String>,
    pub max: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrateRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub config: RunConfigSnapshot,
    pub paths: IntegratePaths,
    pub source_hashes: Vec<SourceFileEntry>,
    pub processing_steps: ProcessingSteps,
    pub counters: RunCounters,
    pub total_rows: usize,
    pub label_distribution: BTreeMap<String, usize>,
    pub source_distribution: BTreeMap<String, usize>,
    pub date_range: DateRange,
    pub balance_ratio: Option<f64>,
    pub label_policy: String,
    pub warnings: Vec<String>,
    pub notes: Vec<String>,
}
