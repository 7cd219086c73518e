//! churnwatch-core: a monthly churn-prediction monitoring pipeline.
//!
//! Stages, in the order a month flows through them:
//!   1. `seed`      — synthetic labeled month-1 snapshot (demo bootstrap)
//!   2. `trainer`   — fit scaler + two classifiers, persist artifacts
//!   3. `simulator` — advance the population to the next month
//!   4. `scorer`    — per-customer churn probability and priority score
//!   5. `metrics`   — aggregate and rank-stability statistics
//!
//! RULES:
//!   - Only `store` talks to the database; every query is parameterized.
//!   - All randomness flows through `rng` streams derived from one seed.
//!   - Prediction and metrics tables are append-only, keyed by
//!     (month, model); re-runs append, they never overwrite.

pub mod config;
pub mod error;
pub mod features;
pub mod forest;
pub mod metrics;
pub mod model;
pub mod rng;
pub mod scorer;
pub mod seed;
pub mod simulator;
pub mod snapshot;
pub mod store;
pub mod trainer;
pub mod types;
