use anyhow::{Result, bail};

use crate::cli::IntegrateArgs;

/// Tunables for one integration run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Estimated Jaccard similarity at or above which a later record is
    /// dropped as a near duplicate of an earlier one. Kept strict so that
    /// distinct stories about the same event survive.
    pub similarity_threshold: f64,
    /// Number of MinHash permutations per signature.
    pub num_perm: usize,
    /// Tokens per shingle.
    pub shingle_size: usize,
    /// Seed for the MinHash permutation family.
    pub seed: u64,
    /// A record survives the content filter when its cleaned text is longer
    /// than this many characters...
    pub min_text_chars: usize,
    /// ...or its cleaned title is longer than this many characters.
    pub min_title_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.95,
            num_perm: 128,
            shingle_size: 5,
            seed: 42,
            min_text_chars: 50,
            min_title_chars: 20,
        }
    }
}

impl PipelineConfig {
    pub fn from_args(args: &IntegrateArgs) -> Result<Self> {
        let config = Self {
            similarity_threshold: args.similarity_threshold,
            num_perm: args.num_perm,
            shingle_size: args.shingle_size,
            seed: args.seed,
            min_text_chars: args.min_text_chars,
            min_title_chars: args.min_title_chars,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.similarity_threshold > 0.0 && self.similarity_threshold <= 1.0) {
            bail!(
                "similarity threshold must be in (0, 1], got {}",
                self.similarity_threshold
            );
        }
        if self.num_perm < 2 {
            bail!("num_perm must be at least 2, got {}", self.num_perm);
        }
        if self.shingle_size == 0 {
            bail!("shingle size must be at least 1");
        }
        Ok(())
    }
}
