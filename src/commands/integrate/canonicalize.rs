use anyhow::{Context, Result};
use regex::Regex;

use crate::model::SourceType;

const NEWS_PATTERNS: &[&str] = &[
    r"https?://\S+",
    r"www\.\S+",
    r"\b(JAKARTA|SURABAYA|BANDUNG|LOMBOK|YOGYAKARTA|MEDAN|SEMARANG|MAKASSAR)\s*,\s*KOMPAS\.com\b",
    r"\bKOMPAS\.com\b",
    r"\bcnnindonesia\.com\b",
    r"\bCNN\s*Indonesia\b",
    r"\bdetik\.com\b",
    r"\btribunnews\.com\b",
    r"\bTEMPO\.co\b",
    r"\bKumparan\.com\b",
    r"[\(\[]\s*update\s*[\)\]]",
    r"[–—-]\s",
    r"\bOleh\s+[A-Z][a-z]+\s+[A-Z][a-z]+\b",
    r"\bReporter\s*:?\s+[A-Z][a-z]+\s+[A-Z][a-z]+\b",
    r"\bEditor\s*:?\s+[A-Z][a-z]+\s+[A-Z][a-z]+\b",
];

const FACT_CHECK_PATTERNS: &[&str] = &[
    r"\[(SALAH|BENAR|PENIPUAN|DISINFORMASI|MISINFORMASI|HOAKS?)\]\s*",
    r"\b(Tim\s+Pemeriksa\s+Fakta|TurnBackHoax|Mafindo|Cek\s+Fakta)\b",
    r"\b(cek\s*fakta|pemeriksaan\s*fakta|verifikasi|menelusuri)\b\s*[:\-]?",
    r"\b(kesimpulan|disimpulkan|merupakan\s+konten)\b\s*[:\-]?",
    r"\b(misleading content|fabricated content|false context|konten\s+(menyesatkan|menesesatkan|dimanipulasi))\b",
    r"\b(SUMBER|NARASI|PENJELASAN|REFERENSI|HASIL)\b\s*[:\]]?",
    r"={3,}",
    r"\([^\)]{10,}\)",
    r"berdasarkan\s+penelusuran\s+TurnBackHoax",
    r"hasil\s+penelusuran\s+Tim\s+Pemeriksa\s+Fakta",
    r"dilansir\s+dari\s+TurnBackHoax",
];

const MAX_CLEAN_PASSES: usize = 16;

/// Strips source-specific boilerplate from display text.
pub trait CleaningRuleset {
    fn name(&self) -> &str;

    fn clean(&self, input: &str) -> String;
}

/// Ordered case-insensitive regex removals followed by whitespace collapse.
#[derive(Debug, Clone)]
pub struct PatternRuleset {
    name: String,
    patterns: Vec<Regex>,
    whitespace: Regex,
}

impl PatternRuleset {
    pub fn from_patterns(name: &str, patterns: &[&str]) -> Result<Self> {
        let compiled = patterns
            .iter()
            .map(|pattern| {
                Regex::new(&format!("(?i){pattern}")).with_context(|| {
                    format!("failed to compile {name} cleaning pattern: {pattern}")
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: name.to_string(),
            patterns: compiled,
            whitespace: Regex::new(r"\s+").context("failed to compile whitespace regex")?,
        })
    }

    pub fn news() -> Result<Self> {
        Self::from_patterns("news", NEWS_PATTERNS)
    }

    pub fn fact_check() -> Result<Self> {
        Self::from_patterns("fact_check", FACT_CHECK_PATTERNS)
    }
}

impl CleaningRuleset for PatternRuleset {
    fn name(&self) -> &str {
        &self.name
    }

    /// Repeats the removal pass until nothing changes, so text exposed by a
    /// later removal is still caught by an earlier pattern.
    fn clean(&self, input: &str) -> String {
        let mut current = self.clean_pass(input);
        for _ in 0..MAX_CLEAN_PASSES {
            let next = self.clean_pass(&current);
            if next == current {
                break;
            }
            current = next;
        }
        current
    }
}

impl PatternRuleset {
    fn clean_pass(&self, input: &str) -> String {
        let mut current = input.to_string();
        for pattern in &self.patterns {
            if pattern.is_match(&current) {
                current = pattern.replace_all(&current, " ").into_owned();
            }
        }
        self.whitespace
            .replace_all(&current, " ")
            .trim()
            .to_string()
    }
}

/// One cleaning ruleset per source type, owned by a single pipeline run.
pub struct Rulesets {
    news: Box<dyn CleaningRuleset>,
    fact_check: Box<dyn CleaningRuleset>,
}

impl Rulesets {
    pub fn new(news: Box<dyn CleaningRuleset>, fact_check: Box<dyn CleaningRuleset>) -> Self {
        Self { news, fact_check }
    }

    pub fn standard() -> Result<Self> {
        Ok(Self::new(
            Box::new(PatternRuleset::news()?),
            Box::new(PatternRuleset::fact_check()?),
        ))
    }

    pub fn for_source(&self, source_type: SourceType) -> &dyn CleaningRuleset {
        match source_type {
            SourceType::News => self.news.as_ref(),
            SourceType::FactCheck => self.fact_check.as_ref(),
        }
    }
}

/// Aggressive normalisation used only for hashing and shingling.
pub struct KeyNormalizer {
    url: Regex,
    non_word: Regex,
    whitespace: Regex,
}

impl KeyNormalizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            url: Regex::new(r"https?://\S+").context("failed to compile url regex")?,
            non_word: Regex::new(r"\W+").context("failed to compile non-word regex")?,
            whitespace: Regex::new(r"\s+").context("failed to compile whitespace regex")?,
        })
    }

    pub fn canonical_key(&self, input: &str) -> String {
        let lowered = input.to_lowercase();
        let without_urls = self.url.replace_all(&lowered, " ");
        let words_only = self.non_word.replace_all(&without_urls, " ");
        self.whitespace
            .replace_all(&words_only, " ")
            .trim()
            .to_string()
    }

    /// Key over the cleaned title and text joined by a space.
    pub fn record_key(&self, title_clean: &str, text_clean: &str) -> String {
        self.canonical_key(&format!("{title_clean} {text_clean}"))
    }
}
