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

//! Granularity hierarchy and calendar bucket arithmetic.
//!
//! Each [`Granularity`] except [`Granularity::Second`] is populated from the
//! next finer granularity, see [`Granularity::source`]. Bucket boundaries are
//! computed by a [`BucketClock`] in one fixed reference offset, so that the
//! same instant always lands in the same bucket regardless of the host's
//! local time zone.

use chrono::{
    DateTime, Datelike, FixedOffset, Months, NaiveDateTime, NaiveTime, Offset, TimeDelta, TimeZone,
    Timelike, Utc,
};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// One level in the rollup hierarchy, ordered from finest to coarsest.
///
/// The lowercase name doubles as the table name used when persisting
/// [`crate::Report`]s and when querying stored values.
#[derive(
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Debug,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Second,
    Minute,
    Hour,
    Day,
    Month,
}

impl Granularity {
    /// The finest granularity, recorded as-is on every report
    pub const FINEST: Granularity = Granularity::Second;

    /// Granularities computed by rolling up finer data, in ascending order
    pub const ROLLUPS: [Granularity; 4] = [
        Granularity::Minute,
        Granularity::Hour,
        Granularity::Day,
        Granularity::Month,
    ];

    /// The granularity whose buckets are consumed to build a bucket of
    /// `self`, `None` for the finest granularity.
    pub const fn source(self) -> Option<Granularity> {
        match self {
            Granularity::Second => None,
            Granularity::Minute => Some(Granularity::Second),
            Granularity::Hour => Some(Granularity::Minute),
            Granularity::Day => Some(Granularity::Hour),
            Granularity::Month => Some(Granularity::Day),
        }
    }

    pub const fn is_finest(self) -> bool {
        matches!(self, Granularity::Second)
    }
}

/// Canonical bucket identifier: seconds since the Unix epoch of the bucket
/// start, as a decimal string.
pub fn bucket_id(start: DateTime<Utc>) -> String {
    start.timestamp().to_string()
}

/// Calendar arithmetic for bucket boundaries in a fixed reference offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketClock {
    offset: FixedOffset,
}

impl Default for BucketClock {
    fn default() -> Self {
        Self::utc()
    }
}

impl BucketClock {
    pub const fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }

    pub const fn offset(&self) -> FixedOffset {
        self.offset
    }

    fn offset_delta(&self) -> TimeDelta {
        TimeDelta::seconds(self.offset.local_minus_utc().into())
    }

    fn local_time(&self, ts: DateTime<Utc>) -> Option<NaiveDateTime> {
        ts.naive_utc().checked_add_signed(self.offset_delta())
    }

    fn utc_time(&self, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        let naive = local.checked_sub_signed(self.offset_delta())?;
        Some(Utc.from_utc_datetime(&naive))
    }

    /// Start of the `granularity` period containing `ts`, `None` when the
    /// period start is not representable
    pub fn start_of(&self, granularity: Granularity, ts: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let local = self.local_time(ts)?;
        let midnight = local.date().and_time(NaiveTime::MIN);
        let start = match granularity {
            Granularity::Second => {
                midnight + TimeDelta::seconds(local.num_seconds_from_midnight().into())
            }
            Granularity::Minute => {
                let minutes = local.hour() * 60 + local.minute();
                midnight + TimeDelta::minutes(minutes.into())
            }
            Granularity::Hour => midnight + TimeDelta::hours(local.hour().into()),
            Granularity::Day => midnight,
            Granularity::Month => {
                let first = local.date().with_day(1)?;
                first.and_time(NaiveTime::MIN)
            }
        };
        self.utc_time(start)
    }

    /// Exclusive end of the `granularity` period containing `ts`, which is
    /// also the start of the following period.
    pub fn end_of(&self, granularity: Granularity, ts: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let start = self.start_of(granularity, ts)?;
        match granularity {
            Granularity::Second => start.checked_add_signed(TimeDelta::seconds(1)),
            Granularity::Minute => start.checked_add_signed(TimeDelta::minutes(1)),
            Granularity::Hour => start.checked_add_signed(TimeDelta::hours(1)),
            Granularity::Day => start.checked_add_signed(TimeDelta::days(1)),
            // Calendar months vary in length, step in local time
            Granularity::Month => {
                let local = self.local_time(start)?;
                self.utc_time(local.checked_add_months(Months::new(1))?)
            }
        }
    }

    /// Start of the `granularity` period immediately before the one
    /// containing `ts`
    pub fn previous_start(
        &self,
        granularity: Granularity,
        ts: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        let current = self.start_of(granularity, ts)?;
        let before = current.checked_sub_signed(TimeDelta::seconds(1))?;
        self.start_of(granularity, before)
    }

    /// Lazily enumerates, in ascending order, the start of every
    /// [`Granularity::source`] bucket inside the `granularity` bucket starting
    /// at `start`. Empty for the finest granularity.
    ///
    /// Stops early at the last representable child bucket.
    pub fn child_starts(
        &self,
        granularity: Granularity,
        start: DateTime<Utc>,
    ) -> impl Iterator<Item = DateTime<Utc>> {
        let clock = *self;
        let end = self.end_of(granularity, start);
        granularity.source().into_iter().flat_map(move |child| {
            let next = move |prev: &DateTime<Utc>| clock.end_of(child, *prev);
            std::iter::successors(clock.start_of(child, start), next)
                .take_while(move |child_start| end.is_none_or(|end| *child_start < end))
        })
    }
}
