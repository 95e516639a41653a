use chrono::NaiveDateTime;

use super::dates::format_day;

const TITLE_PREFIX_CHARS: usize = 128;
const FINGERPRINT_HEX_CHARS: usize = 16;

/// Coarse grouping key over domain, title prefix and publication day.
///
/// `title_key` is the canonical key of the cleaned title. Records sharing a
/// fingerprint probably cover the same story; nothing is dropped on it.
pub fn fingerprint(domain: &str, title_key: &str, date: Option<NaiveDateTime>) -> String {
    let title_prefix = title_key
        .chars()
        .take(TITLE_PREFIX_CHARS)
        .collect::<String>();
    let day = date.map(format_day).unwrap_or_else(|| "na".to_string());
    let base = format!("{}|{}|{}", domain.to_lowercase(), title_prefix, day);

    let mut digest = format!("{:x}", md5::compute(base.as_bytes()));
    digest.truncate(FINGERPRINT_HEX_CHARS);
    digest
}
