mod canonicalize;
mod config;
mod dates;
mod exact_dedup;
mod fingerprint;
mod harmonize;
mod near_dup;
mod output;
mod pipeline;
mod run;
mod validate;

pub use run::run;
