use std::collections::{BTreeSet, HashMap};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::config::PipelineConfig;
use crate::model::Record;

const MERSENNE_PRIME: u64 = (1 << 61) - 1;
const INTEGRATION_STEPS: usize = 100;

/// Contiguous `k`-token windows of a canonical key.
///
/// A key with fewer than `k` tokens yields a single shingle holding every
/// token; an empty key yields none.
pub fn shingles(key: &str, k: usize) -> Vec<String> {
    let tokens = key.split_whitespace().collect::<Vec<_>>();
    if tokens.is_empty() {
        return Vec::new();
    }

    let k = k.max(1);
    if tokens.len() < k {
        return vec![tokens.join(" ")];
    }

    tokens.windows(k).map(|window| window.join(" ")).collect()
}

/// Fixed-size MinHash sketch of a shingle set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature(Vec<u64>);

impl Signature {
    pub fn slots(&self) -> &[u64] {
        &self.0
    }

    /// Fraction of slots holding the same minimum.
    pub fn estimate_jaccard(&self, other: &Signature) -> f64 {
        let len = self.0.len().min(other.0.len());
        if len == 0 {
            return 0.0;
        }
        let matches = self
            .0
            .iter()
            .zip(other.0.iter())
            .filter(|(left, right)| left == right)
            .count();
        matches as f64 / len as f64
    }
}

/// Universal hash family `(a * h + b) mod (2^61 - 1)` seeded for reproducibility.
#[derive(Debug, Clone)]
pub struct MinHasher {
    permutations: Vec<(u64, u64)>,
}

impl MinHasher {
    pub fn new(num_perm: usize, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let permutations = (0..num_perm)
            .map(|_| {
                (
                    rng.gen_range(1..MERSENNE_PRIME),
                    rng.gen_range(0..MERSENNE_PRIME),
                )
            })
            .collect();

        Self { permutations }
    }

    pub fn num_perm(&self) -> usize {
        self.permutations.len()
    }

    /// Returns `None` for an empty shingle set.
    pub fn signature<I, S>(&self, shingles: I) -> Option<Signature>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut minima = vec![u64::MAX; self.permutations.len()];
        let mut seen_any = false;

        for shingle in shingles {
            seen_any = true;
            let base = u128::from(shingle_hash(shingle.as_ref()));
            for (slot, (a, b)) in minima.iter_mut().zip(self.permutations.iter()) {
                let value = ((u128::from(*a) * base + u128::from(*b))
                    % u128::from(MERSENNE_PRIME)) as u64;
                if value < *slot {
                    *slot = value;
                }
            }
        }

        seen_any.then_some(Signature(minima))
    }
}

fn shingle_hash(shingle: &str) -> u64 {
    let digest = Sha256::digest(shingle.as_bytes());
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

/// Band layout of an LSH index: `bands * rows <= num_perm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LshParams {
    pub bands: usize,
    pub rows: usize,
}

impl LshParams {
    /// Layout minimising the equally weighted false-positive and
    /// false-negative areas under the banding S-curve.
    pub fn optimal(threshold: f64, num_perm: usize) -> Self {
        let mut best = Self { bands: 1, rows: 1 };
        let mut min_error = f64::INFINITY;

        for bands in 1..=num_perm {
            for rows in 1..=(num_perm / bands) {
                let false_positive =
                    integrate(|s| collision_probability(s, bands, rows), 0.0, threshold);
                let false_negative =
                    integrate(|s| 1.0 - collision_probability(s, bands, rows), threshold, 1.0);
                let error = 0.5 * false_positive + 0.5 * false_negative;
                if error < min_error {
                    min_error = error;
                    best = Self { bands, rows };
                }
            }
        }

        best
    }
}

fn collision_probability(similarity: f64, bands: usize, rows: usize) -> f64 {
    1.0 - (1.0 - similarity.powi(rows as i32)).powi(bands as i32)
}

/// Composite Simpson's rule.
fn integrate(f: impl Fn(f64) -> f64, lower: f64, upper: f64) -> f64 {
    if upper <= lower {
        return 0.0;
    }
    let step = (upper - lower) / INTEGRATION_STEPS as f64;
    let mut total = f(lower) + f(upper);
    for index in 1..INTEGRATION_STEPS {
        let weight = if index % 2 == 0 { 2.0 } else { 4.0 };
        total += weight * f(lower + step * index as f64);
    }
    total * step / 3.0
}

/// Banded MinHash index. Band collisions only nominate candidates; a
/// candidate is reported when its estimated similarity reaches the threshold.
#[derive(Debug)]
pub struct LshIndex {
    params: LshParams,
    threshold: f64,
    buckets: Vec<HashMap<Vec<u64>, Vec<usize>>>,
    entries: Vec<(usize, Signature)>,
}

impl LshIndex {
    pub fn new(threshold: f64, num_perm: usize) -> Self {
        let params = LshParams::optimal(threshold, num_perm);
        Self {
            params,
            threshold,
            buckets: vec![HashMap::new(); params.bands],
            entries: Vec::new(),
        }
    }

    pub fn params(&self) -> LshParams {
        self.params
    }

    pub fn indexed_count(&self) -> usize {
        self.entries.len()
    }

    pub fn query(&self, signature: &Signature) -> Vec<usize> {
        let mut candidates = BTreeSet::new();
        for (band, bucket) in self.buckets.iter().enumerate() {
            if let Some(positions) = self
                .band_slice(signature, band)
                .and_then(|slice| bucket.get(slice))
            {
                candidates.extend(positions.iter().copied());
            }
        }

        candidates
            .into_iter()
            .filter_map(|position| self.entries.get(position))
            .filter(|(_, stored)| stored.estimate_jaccard(signature) >= self.threshold)
            .map(|(key, _)| *key)
            .collect()
    }

    pub fn insert(&mut self, key: usize, signature: Signature) {
        let position = self.entries.len();
        for band in 0..self.params.bands {
            if let Some(slice) = self.band_slice(&signature, band) {
                self.buckets[band]
                    .entry(slice.to_vec())
                    .or_default()
                    .push(position);
            }
        }
        self.entries.push((key, signature));
    }

    fn band_slice<'a>(&self, signature: &'a Signature, band: usize) -> Option<&'a [u64]> {
        let start = band * self.params.rows;
        signature.slots().get(start..start + self.params.rows)
    }
}

#[derive(Debug)]
pub struct NearDupOutcome {
    pub kept: Vec<Record>,
    pub bypassed: usize,
    pub params: LshParams,
}

/// Greedy first-occurrence-wins near-duplicate removal in table order.
pub fn dedup_near(records: Vec<Record>, config: &PipelineConfig) -> NearDupOutcome {
    let hasher = MinHasher::new(config.num_perm, config.seed);
    let mut index = LshIndex::new(config.similarity_threshold, hasher.num_perm());
    let params = index.params();

    info!(
        threshold = config.similarity_threshold,
        num_perm = config.num_perm,
        shingle_size = config.shingle_size,
        bands = params.bands,
        rows = params.rows,
        "building LSH index"
    );

    let mut kept = Vec::with_capacity(records.len());
    let mut removed = 0_usize;
    let mut bypassed = 0_usize;

    for (position, record) in records.into_iter().enumerate() {
        let Some(signature) = hasher.signature(shingles(&record.canonical_key, config.shingle_size))
        else {
            bypassed += 1;
            kept.push(record);
            continue;
        };

        let matches = index.query(&signature);
        if let Some(first) = matches.first() {
            removed += 1;
            debug!(id = %record.id, matched_position = *first, "near-duplicate dropped");
            if removed % 100 == 0 {
                info!(removed, "near-duplicates found so far");
            }
            continue;
        }

        index.insert(position, signature);
        kept.push(record);
    }

    info!(
        indexed = index.indexed_count(),
        removed,
        bypassed,
        "near-duplicate pass complete"
    );

    NearDupOutcome {
        kept,
        bypassed,
        params,
    }
}
