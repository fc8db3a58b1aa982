pub mod config;
pub mod dedup;
pub mod discover;
pub mod fetch;
pub mod harvest;
pub mod normalization;
pub mod output;
pub mod record;
pub mod run;
pub mod sources;
pub mod synth;
pub mod tracing;

pub mod util {
    pub mod env;
}
