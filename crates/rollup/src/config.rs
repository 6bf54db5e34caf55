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

//! Configuration of a rollup engine.
//!
//! ```yaml
//! name: cpu.usage
//! utc_offset: "+08:00"
//! watermarks:
//!   minute: 2018-06-01T00:00:00Z
//!   hour: 2018-06-01T00:00:00Z
//! ```
//!
//! `utc_offset` fixes the reference offset for calendar bucket boundaries
//! (default UTC). `watermarks` seeds the engine state for a warm restart.

use crate::{
    granularity::{BucketClock, Granularity},
    watermark::Watermarks,
};
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

fn default_utc_offset() -> FixedOffset {
    Utc.fix()
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ConfigurationError {
    EmptyName,
    FinestGranularityWatermark(Granularity),
}

impl std::fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name must not be empty"),
            Self::FinestGranularityWatermark(granularity) => write!(
                f,
                "\"{granularity}\" is never rolled up and cannot carry a watermark"
            ),
        }
    }
}

impl std::error::Error for ConfigurationError {}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupConfig {
    pub name: String,

    #[serde(default = "default_utc_offset")]
    #[serde_as(as = "DisplayFromStr")]
    pub utc_offset: FixedOffset,

    #[serde(default, skip_serializing_if = "Watermarks::is_empty")]
    pub watermarks: Watermarks,
}

impl RollupConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            utc_offset: default_utc_offset(),
            watermarks: Watermarks::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn clock(&self) -> BucketClock {
        BucketClock::new(self.utc_offset)
    }

    pub fn watermarks(&self) -> &Watermarks {
        &self.watermarks
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.name.trim().is_empty() {
            return Err(ConfigurationError::EmptyName);
        }
        if let Some((granularity, _)) = self
            .watermarks
            .iter()
            .find(|(granularity, _)| granularity.is_finest())
        {
            return Err(ConfigurationError::FinestGranularityWatermark(granularity));
        }
        Ok(())
    }
}
