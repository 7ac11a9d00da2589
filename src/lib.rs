//! # Traction Scout
//!
//! Tracks open-source projects over time and scores them as investment
//! candidates.
//!
//! The analytics engine lives in [`traction_scout_core`]; this crate adds
//! the SQLite ledger, metric sources, the refresh cycle, and the CLI and
//! JSON API around it.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌────────────────────┐   ┌───────────────┐
//! │ MetricSource │──▶│ EnrichmentPipeline │──▶│ SQLite ledger │
//! │ file / API   │   │ growth + scoring   │   │ snapshots     │
//! └──────────────┘   └─────────┬──────────┘   └───────┬───────┘
//!                              ▼                      │
//!                        ┌──────────┐                 │
//!                        │ AppState │◀────────────────┘
//!                        └────┬─────┘
//!                   ┌─────────┴─────────┐
//!                   ▼                   ▼
//!             ┌──────────┐        ┌──────────┐
//!             │   CLI    │        │   HTTP   │
//!             │ (scout)  │        │  (JSON)  │
//!             └──────────┘        └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! scout init                          # create database
//! scout ingest ./data/export.jsonl    # record today's observations
//! scout top --limit 10                # best candidates
//! scout history acme/widget           # snapshot trend for one entity
//! scout serve                         # JSON API with background refresh
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite `SnapshotStore` |
//! | [`source`] | Metric sources and candidate selection |
//! | [`ingest`] | One-shot file ingestion |
//! | [`refresh`] | Refresh cycle and background trigger |
//! | [`state`] | Shared last-known state |
//! | [`progress`] | Refresh progress reporting |
//! | [`stats`] | Summary statistics |
//! | [`top`] | Ranked listing |
//! | [`history`] | Per-entity history |
//! | [`server`] | JSON HTTP API |

pub mod config;
pub mod db;
pub mod history;
pub mod ingest;
pub mod migrate;
pub mod progress;
pub mod refresh;
pub mod server;
pub mod source;
pub mod sqlite_store;
pub mod state;
pub mod stats;
pub mod top;

pub use traction_scout_core;
