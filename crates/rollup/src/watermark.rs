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

//! Per-granularity progress markers.
//!
//! A watermark is the start of the last bucket that was summarized for a
//! granularity (or the bucket observed on first touch). Once set, it only
//! moves forward and is never removed.

use crate::granularity::Granularity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{btree_map, BTreeMap};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Watermarks(BTreeMap<Granularity, DateTime<Utc>>);

impl Watermarks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, granularity: Granularity) -> Option<DateTime<Utc>> {
        self.0.get(&granularity).copied()
    }

    /// True when a watermark exists and is strictly before `start`. An unset
    /// watermark never requires a summary, it has to be initialized first.
    pub fn requires_summary(&self, granularity: Granularity, start: DateTime<Utc>) -> bool {
        matches!(self.get(granularity), Some(watermark) if watermark < start)
    }

    /// Sets the watermark only if it is absent, returns whether it was set
    pub fn initialize(&mut self, granularity: Granularity, start: DateTime<Utc>) -> bool {
        match self.0.entry(granularity) {
            btree_map::Entry::Vacant(entry) => {
                entry.insert(start);
                true
            }
            btree_map::Entry::Occupied(_) => false,
        }
    }

    /// Moves the watermark forward to `start`. A `start` at or before the
    /// current watermark is ignored. Returns whether the watermark changed.
    pub fn advance(&mut self, granularity: Granularity, start: DateTime<Utc>) -> bool {
        match self.0.entry(granularity) {
            btree_map::Entry::Vacant(entry) => {
                entry.insert(start);
                true
            }
            btree_map::Entry::Occupied(mut entry) if *entry.get() < start => {
                entry.insert(start);
                true
            }
            btree_map::Entry::Occupied(_) => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Granularity, DateTime<Utc>)> + '_ {
        self.0.iter().map(|(granularity, ts)| (*granularity, *ts))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Granularity, DateTime<Utc>)> for Watermarks {
    fn from_iter<I: IntoIterator<Item = (Granularity, DateTime<Utc>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<BTreeMap<Granularity, DateTime<Utc>>> for Watermarks {
    fn from(value: BTreeMap<Granularity, DateTime<Utc>>) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_initialize_does_not_overwrite() {
        let first = Utc.with_ymd_and_hms(2018, 8, 1, 9, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2018, 8, 1, 10, 0, 0).unwrap();
        let mut watermarks = Watermarks::new();
        assert!(watermarks.initialize(Granularity::Hour, first));
        assert!(!watermarks.initialize(Granularity::Hour, second));
        assert_eq!(watermarks.get(Granularity::Hour), Some(first));
    }

    #[test]
    fn test_advance_is_monotonic() {
        let early = Utc.with_ymd_and_hms(2018, 8, 1, 9, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2018, 8, 1, 9, 5, 0).unwrap();
        let mut watermarks = Watermarks::new();
        assert!(watermarks.advance(Granularity::Minute, late));
        assert!(!watermarks.advance(Granularity::Minute, early));
        assert!(!watermarks.advance(Granularity::Minute, late));
        assert_eq!(watermarks.get(Granularity::Minute), Some(late));
        assert_eq!(watermarks.len(), 1);
    }

    #[test]
    fn test_requires_summary() {
        let watermark = Utc.with_ymd_and_hms(2018, 8, 1, 8, 59, 0).unwrap();
        let watermarks: Watermarks = [(Granularity::Minute, watermark)].into_iter().collect();
        assert!(!watermarks.requires_summary(Granularity::Minute, watermark));
        assert!(!watermarks.requires_summary(
            Granularity::Minute,
            Utc.with_ymd_and_hms(2018, 8, 1, 8, 58, 0).unwrap()
        ));
        assert!(watermarks.requires_summary(
            Granularity::Minute,
            Utc.with_ymd_and_hms(2018, 8, 1, 9, 0, 0).unwrap()
        ));
        // unset watermarks are initialized, never summarized
        assert!(!watermarks.requires_summary(Granularity::Hour, watermark));
    }

    #[test]
    fn test_yaml_seed() {
        let watermarks: Watermarks = serde_yaml::from_str(
            "minute: 2018-06-01T00:00:00Z\nmonth: 2018-06-01T00:00:00Z\n",
        )
        .unwrap();
        let seed = Utc.with_ymd_and_hms(2018, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(
            watermarks.iter().collect::<Vec<_>>(),
            vec![(Granularity::Minute, seed), (Granularity::Month, seed)]
        );
    }
}
