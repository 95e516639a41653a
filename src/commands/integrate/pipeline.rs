use anyhow::Result;
use tracing::{debug, info};

use super::canonicalize::{KeyNormalizer, Rulesets};
use super::config::PipelineConfig;
use super::exact_dedup::dedup_exact;
use super::fingerprint::fingerprint;
use super::harmonize::LoadedSource;
use super::near_dup::{LshParams, dedup_near};
use super::validate::{
    BalanceReport, ContentFilter, balance_report, empty_field_counts, validate_records,
};
use crate::model::{FinalRecord, ProcessingSteps, Record, RunCounters, SourceType};

/// Everything a run produces before anything touches the filesystem.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub records: Vec<FinalRecord>,
    pub steps: ProcessingSteps,
    pub counters: RunCounters,
    pub lsh_params: LshParams,
    pub balance: BalanceReport,
}

/// Stage owner for a single run: rulesets, key normalizer and config are
/// built once and dropped with the run.
pub struct Pipeline {
    config: PipelineConfig,
    rulesets: Rulesets,
    normalizer: KeyNormalizer,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        Self::with_rulesets(config, Rulesets::standard()?)
    }

    pub fn with_rulesets(config: PipelineConfig, rulesets: Rulesets) -> Result<Self> {
        config.validate()?;
        debug!(
            news = rulesets.for_source(SourceType::News).name(),
            fact_check = rulesets.for_source(SourceType::FactCheck).name(),
            "cleaning rulesets selected"
        );
        Ok(Self {
            config,
            rulesets,
            normalizer: KeyNormalizer::new()?,
        })
    }

    /// Runs every stage after loading over news rows followed by fact-check rows.
    pub fn run(&self, news: LoadedSource, fact_check: LoadedSource) -> Result<PipelineOutcome> {
        let mut steps = ProcessingSteps {
            initial_news: news.initial_rows,
            initial_tbh: fact_check.initial_rows,
            after_date_filter_news: news.records.len(),
            after_date_filter_tbh: fact_check.records.len(),
            ..ProcessingSteps::default()
        };
        let mut counters = RunCounters {
            labels_defaulted: news.labels_defaulted + fact_check.labels_defaulted,
            rows_utf8_repaired: news.rows_utf8_repaired + fact_check.rows_utf8_repaired,
            ..RunCounters::default()
        };

        let combined = news
            .records
            .into_iter()
            .chain(fact_check.records)
            .map(|record| self.canonicalize(record))
            .collect::<Vec<_>>();
        info!(rows = combined.len(), "combined source tables");

        let content = ContentFilter::new(&self.config);
        let before_content = combined.len();
        let mut filtered = Vec::with_capacity(before_content);
        for record in combined {
            if record.canonical_key.is_empty() {
                counters.empty_key_dropped += 1;
                continue;
            }
            if content.has_enough_content(&record) {
                filtered.push(record);
            }
        }
        steps.after_content_filter = filtered.len();
        info!(
            before = before_content,
            after = steps.after_content_filter,
            empty_key = counters.empty_key_dropped,
            "content filter complete"
        );

        let (exact_kept, _) = dedup_exact(filtered);
        steps.after_exact_dedup = exact_kept.len();

        let near = dedup_near(exact_kept, &self.config);
        steps.after_lsh_dedup = near.kept.len();
        counters.lsh_bypassed = near.bypassed;

        let fingerprinted = near
            .kept
            .into_iter()
            .map(|mut record| {
                let title_key = self.normalizer.canonical_key(&record.title_clean);
                record.fingerprint = fingerprint(&record.domain, &title_key, record.date);
                record
            })
            .collect::<Vec<_>>();

        counters.with_authors = fingerprinted
            .iter()
            .filter(|record| record.authors.is_some())
            .count();
        counters.with_categories = fingerprinted
            .iter()
            .filter(|record| record.categories.is_some())
            .count();

        let records = validate_records(fingerprinted)?;
        steps.final_rows = records.len();
        counters.empty_fields = empty_field_counts(&records);
        let balance = balance_report(&records);

        Ok(PipelineOutcome {
            records,
            steps,
            counters,
            lsh_params: near.params,
            balance,
        })
    }

    fn canonicalize(&self, mut record: Record) -> Record {
        let ruleset = self.rulesets.for_source(record.source_type);
        record.title_clean = ruleset.clean(&record.title);
        record.text_clean = ruleset.clean(&record.text);
        record.canonical_key = self
            .normalizer
            .record_key(&record.title_clean, &record.text_clean);
        record
    }
}
