use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::{ByteRecord, StringRecord};
use tracing::{debug, info, warn};
use url::Url;

use super::dates::{DateOrder, DateParser};
use crate::model::{Record, SourceType};

/// Column layout of one source table. Where several names are listed the
/// first one present in the header wins.
#[derive(Debug, Clone, Copy)]
pub struct SourceSchema {
    pub source_type: SourceType,
    pub id: &'static str,
    pub url: &'static str,
    pub domain: &'static str,
    pub date: &'static [&'static str],
    pub date_order: DateOrder,
    pub title: &'static str,
    pub text: &'static [&'static str],
    pub label: Option<&'static str>,
    pub authors: &'static [&'static str],
    pub categories: &'static [&'static str],
}

pub const NEWS_SCHEMA: SourceSchema = SourceSchema {
    source_type: SourceType::News,
    id: "id",
    url: "url",
    domain: "domain",
    date: &["date_utc"],
    date_order: DateOrder::MonthFirst,
    title: "title_cleaned",
    text: &["text_cleaned"],
    label: None,
    authors: &["authors"],
    categories: &["categories", "category"],
};

pub const FACT_CHECK_SCHEMA: SourceSchema = SourceSchema {
    source_type: SourceType::FactCheck,
    id: "id",
    url: "post_url",
    domain: "source",
    date: &["post_date", "date"],
    date_order: DateOrder::DayFirst,
    title: "title",
    text: &["text", "full_content"],
    label: Some("label"),
    authors: &["authors", "author"],
    categories: &["labels", "categories"],
};

#[derive(Debug, Clone)]
struct ResolvedColumns {
    id: usize,
    url: usize,
    domain: usize,
    date: usize,
    title: usize,
    text: usize,
    label: Option<usize>,
    authors: Option<usize>,
    categories: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LabelCell {
    Code(i64),
    Unmapped,
}

/// Rows of one source after schema mapping and the date filter.
#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub source_type: SourceType,
    pub path: PathBuf,
    pub initial_rows: usize,
    pub records: Vec<Record>,
    pub labels_defaulted: usize,
    pub rows_utf8_repaired: usize,
}

impl LoadedSource {
    pub fn date_dropped(&self) -> usize {
        self.initial_rows.saturating_sub(self.records.len())
    }
}

pub fn load_source(path: &Path, schema: &SourceSchema, dates: &DateParser) -> Result<LoadedSource> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open source table: {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("failed to read header row: {}", path.display()))?
        .clone();
    let columns = resolve_columns(&headers, schema)
        .with_context(|| format!("schema mismatch in {}", path.display()))?;

    let mut initial_rows = 0_usize;
    let mut labels_defaulted = 0_usize;
    let mut rows_utf8_repaired = 0_usize;
    let mut records = Vec::new();

    for (index, row) in reader.byte_records().enumerate() {
        let row = row.with_context(|| {
            format!("failed to read row {} in {}", index + 1, path.display())
        })?;
        initial_rows += 1;

        if row.iter().any(|field| std::str::from_utf8(field).is_err()) {
            rows_utf8_repaired += 1;
            debug!(row = index + 1, path = %path.display(), "invalid UTF-8 replaced");
        }

        let (record, defaulted) = harmonize_row(&row, &columns, schema, dates);
        if record.date.is_none() {
            continue;
        }
        if defaulted {
            labels_defaulted += 1;
        }
        records.push(record);
    }

    let loaded = LoadedSource {
        source_type: schema.source_type,
        path: path.to_path_buf(),
        initial_rows,
        records,
        labels_defaulted,
        rows_utf8_repaired,
    };

    info!(
        source = schema.source_type.as_str(),
        path = %path.display(),
        rows = loaded.initial_rows,
        after_date_filter = loaded.records.len(),
        null_date = loaded.date_dropped(),
        "harmonized source table"
    );
    if loaded.rows_utf8_repaired > 0 {
        warn!(
            source = schema.source_type.as_str(),
            count = loaded.rows_utf8_repaired,
            "rows with invalid UTF-8 decoded lossily"
        );
    }
    if loaded.labels_defaulted > 0 {
        warn!(
            source = schema.source_type.as_str(),
            count = loaded.labels_defaulted,
            "label cells missing or unrecognised, source default applied"
        );
    }

    Ok(loaded)
}

fn resolve_columns(headers: &StringRecord, schema: &SourceSchema) -> Result<ResolvedColumns> {
    let required = |name: &str| {
        column_index(headers, name).with_context(|| format!("missing required column '{name}'"))
    };
    let required_any = |names: &[&str]| {
        first_column(headers, names).with_context(|| {
            format!("missing required column, expected one of: {}", names.join(", "))
        })
    };

    Ok(ResolvedColumns {
        id: required(schema.id)?,
        url: required(schema.url)?,
        domain: required(schema.domain)?,
        date: required_any(schema.date)?,
        title: required(schema.title)?,
        text: required_any(schema.text)?,
        label: schema.label.and_then(|name| column_index(headers, name)),
        authors: first_column(headers, schema.authors),
        categories: first_column(headers, schema.categories),
    })
}

fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.trim().eq_ignore_ascii_case(name))
}

fn first_column(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|name| column_index(headers, name))
}

/// Cells are decoded lossily so one bad byte costs a character, not the row.
fn harmonize_row(
    row: &ByteRecord,
    columns: &ResolvedColumns,
    schema: &SourceSchema,
    dates: &DateParser,
) -> (Record, bool) {
    let cell = |index: usize| {
        row.get(index)
            .map(String::from_utf8_lossy)
            .unwrap_or_default()
    };
    let optional_cell = |index: Option<usize>| {
        index
            .and_then(|value| row.get(value))
            .map(String::from_utf8_lossy)
    };

    let mut record = Record::new(cell(columns.id).trim(), schema.source_type);
    record.url = normalize_url(&cell(columns.url));
    record.domain = normalize_domain(&cell(columns.domain), &record.url);
    record.date = dates.parse(&cell(columns.date), schema.date_order);
    record.title = cell(columns.title).into_owned();
    record.text = cell(columns.text).into_owned();
    record.authors = optional_cell(columns.authors).and_then(|raw| split_list(&raw));
    record.categories = optional_cell(columns.categories).and_then(|raw| split_list(&raw));

    let mut defaulted = false;
    if let Some(raw_label) = optional_cell(columns.label) {
        match map_label_cell(&raw_label) {
            LabelCell::Code(code) => record.label_code = code,
            LabelCell::Unmapped => defaulted = true,
        }
    }

    (record, defaulted)
}

fn map_label_cell(raw: &str) -> LabelCell {
    let value = raw.trim();
    if value.is_empty() {
        return LabelCell::Unmapped;
    }
    if let Ok(code) = value.parse::<i64>() {
        return LabelCell::Code(code);
    }
    if let Ok(float) = value.parse::<f64>() {
        if float.is_finite() && float.fract() == 0.0 {
            return LabelCell::Code(float as i64);
        }
        return LabelCell::Unmapped;
    }

    match value.to_lowercase().as_str() {
        "hoax" | "hoaks" | "false" | "salah" => LabelCell::Code(0),
        "valid" | "true" | "benar" => LabelCell::Code(1),
        _ => LabelCell::Unmapped,
    }
}

/// Drops `utm_*` tracking parameters. Unparseable input is returned trimmed.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let Ok(mut parsed) = Url::parse(trimmed) else {
        return trimmed.to_string();
    };

    let kept = parsed
        .query_pairs()
        .filter(|(key, _)| !key.to_lowercase().starts_with("utm_"))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect::<Vec<_>>();

    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(kept.iter());
    }

    parsed.to_string()
}

fn normalize_domain(raw: &str, url: &str) -> String {
    let domain = raw.trim().to_lowercase();
    if !domain.is_empty() {
        return domain;
    }

    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_lowercase))
        .unwrap_or_default()
}

fn split_list(raw: &str) -> Option<Vec<String>> {
    let items = raw
        .split(['|', ','])
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToOwned::to_owned)
        .collect::<Vec<_>>();

    if items.is_empty() { None } else { Some(items) }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn map_label_cell_translates_strings_and_keeps_numbers() {
        assert_eq!(map_label_cell("HOAX"), LabelCell::Code(0));
        assert_eq!(map_label_cell("valid"), LabelCell::Code(1));
        assert_eq!(map_label_cell("1.0"), LabelCell::Code(1));
        assert_eq!(map_label_cell("2"), LabelCell::Code(2));
        assert_eq!(map_label_cell("satire"), LabelCell::Unmapped);
        assert_eq!(map_label_cell("  "), LabelCell::Unmapped);
    }

    #[test]
    fn normalize_url_strips_tracking_parameters_only() {
        assert_eq!(
            normalize_url("https://turnbackhoax.id/2024/03/x/?utm_source=fb&utm_medium=social"),
            "https://turnbackhoax.id/2024/03/x/"
        );
        assert_eq!(
            normalize_url("https://news.example.id/read?id=7&UTM_campaign=a"),
            "https://news.example.id/read?id=7"
        );
        assert_eq!(normalize_url("  not a url "), "not a url");
    }

    #[test]
    fn normalize_domain_falls_back_to_url_host() {
        assert_eq!(
            normalize_domain("", "https://WWW.Kompas.com/read/1"),
            "www.kompas.com"
        );
        assert_eq!(normalize_domain("TurnBackHoax.ID", ""), "turnbackhoax.id");
    }

    #[test]
    fn split_list_handles_pipes_commas_and_blanks() {
        assert_eq!(
            split_list("Budi | Sari,  "),
            Some(vec!["Budi".to_string(), "Sari".to_string()])
        );
        assert_eq!(split_list(" | "), None);
    }

    #[test]
    fn load_source_applies_fact_check_fallback_columns_and_date_filter() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tbh.csv");
        std::fs::write(
            &path,
            "id,post_url,source,title,date,full_content,label\n\
             1,https://turnbackhoax.id/a?utm_source=x,turnbackhoax.id,[SALAH] Klaim,05/03/2024,Isi,hoax\n\
             2,https://turnbackhoax.id/b,,Judul,unknown,Isi,\n\
             3,https://turnbackhoax.id/c,,Judul,2024-03-06,Isi,\n",
        )
        .expect("write csv");

        let dates = DateParser::new().expect("date parser");
        let loaded = load_source(&path, &FACT_CHECK_SCHEMA, &dates).expect("load");

        assert_eq!(loaded.initial_rows, 3);
        assert_eq!(loaded.records.len(), 2);
        assert_eq!(loaded.date_dropped(), 1);
        assert_eq!(loaded.labels_defaulted, 1);
        assert_eq!(loaded.records[0].url, "https://turnbackhoax.id/a");
        assert_eq!(loaded.records[0].text, "Isi");
        assert_eq!(loaded.records[0].label_code, 0);
        assert_eq!(loaded.records[1].domain, "turnbackhoax.id");
        assert_eq!(loaded.records[1].label_code, 0);
    }

    #[test]
    fn load_source_repairs_invalid_utf8_and_reads_news_dates_month_first() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("news.csv");
        std::fs::write(
            &path,
            b"id,url,domain,date_utc,title_cleaned,text_cleaned\n\
              1,https://kompas.com/1,kompas.com,2024-03-05,Judul satu,Isi \xff\xfe rusak\n\
              2,https://kompas.com/2,kompas.com,03/05/2024,Judul dua,Isi bersih\n",
        )
        .expect("write csv");

        let dates = DateParser::new().expect("date parser");
        let loaded = load_source(&path, &NEWS_SCHEMA, &dates).expect("load");

        assert_eq!(loaded.records.len(), 2);
        assert_eq!(loaded.rows_utf8_repaired, 1);
        assert_eq!(loaded.records[0].text, "Isi \u{FFFD}\u{FFFD} rusak");
        assert_eq!(loaded.records[1].text, "Isi bersih");
        assert_eq!(
            loaded.records[1].date,
            NaiveDate::from_ymd_opt(2024, 3, 5).and_then(|date| date.and_hms_opt(0, 0, 0))
        );
    }

    #[test]
    fn load_source_rejects_missing_required_column() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("news.csv");
        std::fs::write(&path, "id,url,domain,date_utc,title_cleaned\n1,u,d,2024-01-01,t\n")
            .expect("write csv");

        let dates = DateParser::new().expect("date parser");
        let error = load_source(&path, &NEWS_SCHEMA, &dates).expect_err("missing text column");
        assert!(format!("{error:#}").contains("text_cleaned"));
    }
}
