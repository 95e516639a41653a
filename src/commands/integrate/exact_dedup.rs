use std::collections::HashSet;

use tracing::info;

use crate::model::Record;

/// Lowercase hex MD5 of a canonical key.
pub fn content_hash(key: &str) -> String {
    format!("{:x}", md5::compute(key.as_bytes()))
}

/// Keeps the first record seen for each content hash. Returns the survivors
/// and the number removed.
pub fn dedup_exact(records: Vec<Record>) -> (Vec<Record>, usize) {
    let before = records.len();
    let mut seen = HashSet::with_capacity(before);
    let mut kept = Vec::with_capacity(before);

    for record in records {
        if seen.insert(content_hash(&record.canonical_key)) {
            kept.push(record);
        }
    }

    let removed = before - kept.len();
    info!(before, after = kept.len(), removed, "exact dedup complete");
    (kept, removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceType;

    fn keyed(id: &str, key: &str) -> Record {
        let mut record = Record::new(id, SourceType::News);
        record.canonical_key = key.to_string();
        record
    }

    #[test]
    fn content_hash_is_md5_hex() {
        assert_eq!(content_hash(""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(content_hash("abc"), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn dedup_exact_keeps_first_per_key_and_all_distinct_keys() {
        let records = vec![
            keyed("a", "harga beras naik"),
            keyed("b", "harga beras naik"),
            keyed("c", "harga beras turun"),
            keyed("d", ""),
            keyed("e", ""),
        ];

        let (kept, removed) = dedup_exact(records);
        let ids = kept.iter().map(|record| record.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["a", "c", "d"]);
        assert_eq!(removed, 2);
    }
}
