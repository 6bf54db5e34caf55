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

use super::*;
use crate::{granularity::Granularity, querier::MemoryStore, summarizer::Sum};
use chrono::TimeZone;
use futures::future::ready;
use tracing_test::traced_test;

fn create_stats() -> RollupStats {
    let meter = opentelemetry::global::meter("test");
    RollupStats::new(meter)
}

fn utc(h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2018, 8, 1, h, mi, s).unwrap()
}

#[derive(thiserror::Error, Debug)]
#[error("store unavailable")]
struct StoreUnavailable;

#[tokio::test]
#[traced_test]
async fn test_shutdown_command() {
    let engine = RollupEngine::new("test", Sum, MemoryStore::<u64>::new());
    let (join_handle, handle) = RollupActorHandle::new(10, engine, Either::Right(create_stats()));

    handle.report(1, utc(9, 0, 0)).await.unwrap();
    handle.shutdown().await.unwrap();

    let watermarks = join_handle.await.unwrap();
    assert_eq!(watermarks.get(Granularity::Minute), Some(utc(8, 59, 0)));
    assert!(logs_contain(
        "Received shutdown command, shutting down rollup actor"
    ));

    assert!(matches!(
        handle.report(2, utc(9, 1, 0)).await,
        Err(RollupActorHandleError::SendError)
    ));
}

#[tokio::test]
#[traced_test]
async fn test_cmd_channel_closed() {
    let engine = RollupEngine::new("test", Sum, MemoryStore::<u64>::new());
    let meter = opentelemetry::global::meter("test");
    let (join_handle, handle) = RollupActorHandle::new(10, engine, Either::Left(meter));

    drop(handle);

    let watermarks = join_handle.await.unwrap();
    assert!(watermarks.is_empty());
    assert!(logs_contain(
        "Command channel closed, shutting down rollup actor"
    ));
}

#[tokio::test]
async fn test_reports_are_serialized_across_handles() {
    let store = MemoryStore::new();
    let engine = RollupEngine::new("test", Sum, store.clone());
    let (join_handle, handle) = RollupActorHandle::new(10, engine, Either::Right(create_stats()));

    let first = handle.clone();
    let second = handle.clone();
    store.persist(first.report(1u64, utc(9, 0, 10)).await.unwrap());
    store.persist(second.report(2u64, utc(9, 0, 20)).await.unwrap());
    let reports = first.report(3u64, utc(9, 1, 0)).await.unwrap();

    assert_eq!(
        reports,
        vec![
            Report::new(3, Granularity::Second, utc(9, 1, 0)),
            Report::new(3, Granularity::Minute, utc(9, 0, 0)),
        ]
    );
    let watermarks = handle.watermarks().await.unwrap();
    assert_eq!(watermarks.get(Granularity::Minute), Some(utc(9, 0, 0)));

    handle.shutdown().await.unwrap();
    assert_eq!(join_handle.await.unwrap(), watermarks);
}

#[tokio::test]
#[traced_test]
async fn test_report_error_is_returned_to_caller() {
    let querier = |_: Granularity, _: String| ready(Err::<Option<u64>, _>(StoreUnavailable));
    let engine = RollupEngine::new("test", Sum, querier)
        .with_watermarks([(Granularity::Minute, utc(8, 0, 0))].into_iter().collect());
    let (join_handle, handle) = RollupActorHandle::new(10, engine, Either::Right(create_stats()));

    let result = handle.report(1, utc(9, 1, 0)).await;
    assert!(matches!(
        result,
        Err(RollupActorHandleError::Rollup(RollupError::Query {
            granularity: Granularity::Second,
            ..
        }))
    ));
    assert!(logs_contain("Rollup actor failed to report"));

    // the actor keeps serving after a failed report
    let watermarks = handle.watermarks().await.unwrap();
    assert_eq!(watermarks.get(Granularity::Minute), Some(utc(8, 0, 0)));
    assert_eq!(watermarks.len(), 1);

    handle.shutdown().await.unwrap();
    join_handle.await.unwrap();
}
