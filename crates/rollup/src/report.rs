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

use crate::granularity::{bucket_id, Granularity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A value for one bucket of one granularity, as emitted by
/// [`crate::RollupEngine::report`].
///
/// The caller is expected to persist every report under [`Report::key`]
/// before any later query for that table can observe it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Report<T> {
    data: T,
    id: String,
    table: Granularity,
}

impl<T> Report<T> {
    pub fn new(data: T, table: Granularity, bucket_start: DateTime<Utc>) -> Self {
        Self {
            data,
            id: bucket_id(bucket_start),
            table,
        }
    }

    pub const fn data(&self) -> &T {
        &self.data
    }

    /// Bucket start as epoch seconds
    pub fn id(&self) -> &str {
        &self.id
    }

    pub const fn table(&self) -> Granularity {
        self.table
    }

    pub fn key(&self) -> (Granularity, &str) {
        (self.table, &self.id)
    }

    pub fn into_data(self) -> T {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    #[test]
    fn test_report_id_from_bucket_start() {
        let second = Utc.with_ymd_and_hms(2018, 8, 1, 9, 1, 0).unwrap();
        let start = second + TimeDelta::milliseconds(10);
        let report = Report::new(42u64, Granularity::Second, start);
        assert_eq!(report.id(), "1533114060");
        assert_eq!(report.key(), (Granularity::Second, "1533114060"));
        assert_eq!(report.data(), &42);
        assert_eq!(report.into_data(), 42);
    }

    #[test]
    fn test_report_serde() {
        let start = Utc.with_ymd_and_hms(2018, 8, 1, 0, 0, 0).unwrap();
        let report = Report::new("2,3,4".to_string(), Granularity::Day, start);
        let yaml = serde_yaml::to_string(&report).unwrap();
        assert!(yaml.contains("table: day"));
        let decoded: Report<String> = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(decoded, report);
    }
}
