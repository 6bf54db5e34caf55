// Copyright (C) 2026-present The NetGauze Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Incremental rollups of time-series data into minute, hour, day, and month
//! buckets.
//!
//! The main components are:
//! - `RollupEngine`: records a data point and computes the coarser rollups
//!   that became due, tracking a watermark per granularity so a bucket is
//!   never summarized twice
//! - `Querier`: read access to previously persisted bucket values
//! - `Summarizer`: reduces child bucket values into one parent value
//! - `RollupActorHandle`: serializes report calls for an engine shared
//!   between tasks
//!
//! The caller persists every emitted `Report` under `(table, id)` so later
//! queries observe it.
//!
//! Example usage:
//! ```text
//! use netgauze_rollup::{MemoryStore, RollupEngine, Sum};
//!
//! let store = MemoryStore::new();
//! let mut engine = RollupEngine::new("requests", Sum, store.clone());
//! for (value, ts) in points {
//!     store.persist(engine.report(value, ts).await?);
//! }
//! ```

pub mod actor;
pub mod config;
pub mod engine;
pub mod granularity;
pub mod querier;
pub mod report;
pub mod summarizer;
pub mod watermark;

pub use actor::{RollupActorHandle, RollupActorHandleError, RollupStats};
pub use config::{ConfigurationError, RollupConfig};
pub use engine::{RollupEngine, RollupError};
pub use granularity::{bucket_id, BucketClock, Granularity};
pub use querier::{MemoryStore, Querier};
pub use report::Report;
pub use summarizer::{Join, Max, Mean, Min, Sum, SummarizeError, Summarizer};
pub use watermark::Watermarks;
