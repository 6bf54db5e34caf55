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

//! Read access to previously persisted bucket values.

use crate::{granularity::Granularity, report::Report};
use std::{
    collections::{BTreeMap, HashMap},
    convert::Infallible,
    future::Future,
    sync::{Arc, Mutex, PoisonError},
};

/// Fetches the stored value of one bucket.
///
/// A bucket without recorded data is `Ok(None)`. An `Err` is a fault that
/// aborts the enclosing [`crate::RollupEngine::report`] call.
///
/// Any `Fn(Granularity, String) -> impl Future<Output = Result<Option<T>, E>>`
/// is a querier.
pub trait Querier<T> {
    type Error: std::error::Error + Send + Sync + 'static;

    fn fetch(
        &self,
        granularity: Granularity,
        id: &str,
    ) -> impl Future<Output = Result<Option<T>, Self::Error>> + Send;
}

impl<T, E, F, Fut> Querier<T> for F
where
    F: Fn(Granularity, String) -> Fut,
    Fut: Future<Output = Result<Option<T>, E>> + Send,
    E: std::error::Error + Send + Sync + 'static,
{
    type Error = E;

    fn fetch(
        &self,
        granularity: Granularity,
        id: &str,
    ) -> impl Future<Output = Result<Option<T>, Self::Error>> + Send {
        self(granularity, id.to_string())
    }
}

/// In-memory bucket store keyed by `(table, id)`.
///
/// Clones share the same underlying buckets, so one clone can be handed to a
/// [`crate::RollupEngine`] as its querier while another persists the emitted
/// reports.
#[derive(Debug)]
pub struct MemoryStore<T> {
    buckets: Arc<Mutex<HashMap<(Granularity, String), T>>>,
}

impl<T> Clone for MemoryStore<T> {
    fn clone(&self) -> Self {
        Self {
            buckets: Arc::clone(&self.buckets),
        }
    }
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self {
            buckets: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<T: Clone> MemoryStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores every report, replacing any previous value of the same bucket
    pub fn persist(&self, reports: impl IntoIterator<Item = Report<T>>) {
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        for report in reports {
            let key = (report.table(), report.id().to_string());
            buckets.insert(key, report.into_data());
        }
    }

    pub fn get(&self, granularity: Granularity, id: &str) -> Option<T> {
        let buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        buckets.get(&(granularity, id.to_string())).cloned()
    }

    /// Snapshot of all buckets of one table, ordered by id
    pub fn table(&self, granularity: Granularity) -> BTreeMap<String, T> {
        let buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        buckets
            .iter()
            .filter(|((table, _), _)| *table == granularity)
            .map(|((_, id), value)| (id.clone(), value.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.buckets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send> Querier<T> for MemoryStore<T> {
    type Error = Infallible;

    fn fetch(
        &self,
        granularity: Granularity,
        id: &str,
    ) -> impl Future<Output = Result<Option<T>, Self::Error>> + Send {
        futures::future::ready(Ok(self.get(granularity, id)))
    }
}
