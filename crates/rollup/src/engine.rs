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

//! Incremental rollup of reported values into coarser calendar buckets.
//!
//! Every call to [`RollupEngine::report`] records the value at the finest
//! granularity and then, for each coarser granularity, considers the bucket
//! right before the one containing the event time. That bucket is summarized
//! from its stored child values when its start is past the granularity
//! watermark. A granularity seen for the first time only records its
//! watermark: there is no previous state to compare against yet.
//!
//! A call either succeeds as a whole or fails without touching the
//! watermarks, so a failed call can be retried with the same event time.

use crate::{
    config::{ConfigurationError, RollupConfig},
    granularity::{bucket_id, BucketClock, Granularity},
    querier::Querier,
    report::Report,
    summarizer::Summarizer,
    watermark::Watermarks,
};
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use tracing::{debug, trace, warn};

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(thiserror::Error, Debug)]
pub enum RollupError {
    #[error("failed to fetch {granularity} bucket {id}")]
    Query {
        granularity: Granularity,
        id: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to summarize {granularity} bucket {id}")]
    Summarize {
        granularity: Granularity,
        id: String,
        #[source]
        source: BoxError,
    },
}

impl RollupError {
    pub const fn granularity(&self) -> Granularity {
        match self {
            Self::Query { granularity, .. } => *granularity,
            Self::Summarize { granularity, .. } => *granularity,
        }
    }
}

/// What one granularity decided during a report call. Watermark changes are
/// only applied once every granularity resolved.
#[derive(Debug)]
enum Outcome<T> {
    /// First touch, record the watermark without summarizing
    Initialize(Granularity, DateTime<Utc>),
    /// Stale or duplicate trigger, or no child data yet
    Skip,
    Summarized(Report<T>, DateTime<Utc>),
}

#[derive(Debug)]
pub struct RollupEngine<S, Q> {
    name: String,
    summarizer: S,
    querier: Q,
    watermarks: Watermarks,
    clock: BucketClock,
}

impl<S, Q> RollupEngine<S, Q> {
    pub fn new(name: impl Into<String>, summarizer: S, querier: Q) -> Self {
        Self {
            name: name.into(),
            summarizer,
            querier,
            watermarks: Watermarks::default(),
            clock: BucketClock::default(),
        }
    }

    /// Builds an engine from a validated configuration, including its
    /// reference offset and watermark seeds.
    pub fn from_config(
        config: RollupConfig,
        summarizer: S,
        querier: Q,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let clock = config.clock();
        Ok(Self::new(config.name, summarizer, querier)
            .with_clock(clock)
            .with_watermarks(config.watermarks))
    }

    /// Seeds the watermarks, e.g. from a previous run, so that warmed up
    /// granularities skip first touch initialization.
    pub fn with_watermarks(mut self, watermarks: Watermarks) -> Self {
        self.watermarks = watermarks;
        self
    }

    pub fn with_clock(mut self, clock: BucketClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn clock(&self) -> &BucketClock {
        &self.clock
    }

    pub const fn watermarks(&self) -> &Watermarks {
        &self.watermarks
    }

    pub fn into_watermarks(self) -> Watermarks {
        self.watermarks
    }

    /// Whether the `granularity` bucket containing `ts` is past the current
    /// watermark. Always false for a granularity that was never touched.
    pub fn requires_summary(&self, granularity: Granularity, ts: DateTime<Utc>) -> bool {
        self.clock
            .start_of(granularity, ts)
            .is_some_and(|start| self.watermarks.requires_summary(granularity, start))
    }

    /// Records `data` at `event_time` and returns the finest granularity
    /// report followed by any rollups that became due, in ascending
    /// granularity order.
    ///
    /// Missing child data is not an error: an empty bucket is simply not
    /// emitted and stays eligible for a later call. Querier and summarizer
    /// faults fail the whole call and leave the watermarks untouched.
    pub async fn report<T>(
        &mut self,
        data: T,
        event_time: DateTime<Utc>,
    ) -> Result<Vec<Report<T>>, RollupError>
    where
        S: Summarizer<T>,
        Q: Querier<T>,
    {
        let finest = Report::new(data, Granularity::FINEST, event_time);
        let engine = &*self;
        let outcomes = try_join_all(
            Granularity::ROLLUPS
                .into_iter()
                .map(|granularity| engine.rollup(granularity, event_time)),
        )
        .await
        .inspect_err(|err| warn!("[{}] rollup at {event_time} failed: {err}", engine.name))?;

        let mut reports = Vec::with_capacity(1 + outcomes.len());
        reports.push(finest);
        for outcome in outcomes {
            match outcome {
                Outcome::Initialize(granularity, start) => {
                    self.watermarks.initialize(granularity, start);
                }
                Outcome::Skip => {}
                Outcome::Summarized(report, start) => {
                    self.watermarks.advance(report.table(), start);
                    reports.push(report);
                }
            }
        }
        Ok(reports)
    }

    async fn rollup<T>(
        &self,
        granularity: Granularity,
        event_time: DateTime<Utc>,
    ) -> Result<Outcome<T>, RollupError>
    where
        S: Summarizer<T>,
        Q: Querier<T>,
    {
        let Some(start) = self.clock.previous_start(granularity, event_time) else {
            trace!(
                "[{}] no {granularity} bucket before {event_time} is representable",
                self.name
            );
            return Ok(Outcome::Skip);
        };
        let Some(watermark) = self.watermarks.get(granularity) else {
            debug!(
                "[{}] first touch of {granularity}, initializing watermark at {start}",
                self.name
            );
            return Ok(Outcome::Initialize(granularity, start));
        };
        if watermark >= start {
            trace!(
                "[{}] {granularity} bucket {start} is not past watermark {watermark}",
                self.name
            );
            return Ok(Outcome::Skip);
        }
        let Some(child) = granularity.source() else {
            return Ok(Outcome::Skip);
        };

        let fetches = self
            .clock
            .child_starts(granularity, start)
            .map(|child_start| self.fetch(child, bucket_id(child_start)));
        let values: Vec<T> = try_join_all(fetches).await?.into_iter().flatten().collect();
        if values.is_empty() {
            trace!(
                "[{}] no {child} data for {granularity} bucket {start}, not advancing watermark",
                self.name
            );
            return Ok(Outcome::Skip);
        }

        let count = values.len();
        let data = self
            .summarizer
            .summarize(values)
            .map_err(|err| RollupError::Summarize {
                granularity,
                id: bucket_id(start),
                source: Box::new(err),
            })?;
        debug!(
            "[{}] summarized {count} {child} values into {granularity} bucket {start}",
            self.name
        );
        Ok(Outcome::Summarized(
            Report::new(data, granularity, start),
            start,
        ))
    }

    async fn fetch<T>(&self, granularity: Granularity, id: String) -> Result<Option<T>, RollupError>
    where
        Q: Querier<T>,
    {
        self.querier
            .fetch(granularity, &id)
            .await
            .map_err(|err| RollupError::Query {
                granularity,
                id,
                source: Box::new(err),
            })
    }
}
