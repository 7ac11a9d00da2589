//! # traction-scout-core
//!
//! Analytics engine for tracking open-source projects over time and scoring
//! them as investment candidates.
//!
//! This crate is storage- and transport-agnostic: it turns raw metric
//! observations into snapshots, growth trends, and composite scores, and
//! talks to persistence only through the [`store::SnapshotStore`] trait.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | Entities, snapshots, growth records, raw and enriched records |
//! | [`store`] | `SnapshotStore` trait and in-memory backend |
//! | [`growth`] | WoW/MoM growth and star acceleration |
//! | [`catalog`] | Keyword, pattern, and lookup tables |
//! | [`classify`] | Category tagging, non-investable filter, big-tech check |
//! | [`signals`] | Commercial-intent detection |
//! | [`funding`] | Coarse funding-stage resolution |
//! | [`scoring`] | Investability, Series-A fit, and traction scores |
//! | [`pipeline`] | Per-entity enrichment orchestration |
//! | [`error`] | Input and pipeline error types |

pub mod catalog;
pub mod classify;
pub mod error;
pub mod funding;
pub mod growth;
pub mod models;
pub mod pipeline;
pub mod scoring;
pub mod signals;
pub mod store;
