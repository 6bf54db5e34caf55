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

//! Actor owning a [`RollupEngine`] for one logical metric stream.
//!
//! - `RollupActor` - runs the engine in its own task and serializes every
//!   report request, which is what the engine's watermark state requires
//! - `RollupActorHandle` - cloneable handle to submit reports, snapshot the
//!   watermarks, and shut the actor down
//! - `RollupStats` - OpenTelemetry counters for the actor
//!
//! When the actor terminates, its join handle yields the final watermarks so
//! they can be persisted and used to seed the next run.

use crate::{
    engine::{RollupEngine, RollupError},
    querier::Querier,
    report::Report,
    summarizer::Summarizer,
    watermark::Watermarks,
};
use chrono::{DateTime, Utc};
use either::Either;
use opentelemetry::{
    metrics::{Counter, Meter},
    KeyValue,
};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct RollupStats {
    pub received_points: Counter<u64>,
    pub emitted_rollups: Counter<u64>,
    pub failed_reports: Counter<u64>,
}

impl RollupStats {
    pub fn new(meter: Meter) -> Self {
        let received_points = meter
            .u64_counter("netgauze.rollup.received.points")
            .with_description("Number of data points reported to the rollup engine")
            .build();
        let emitted_rollups = meter
            .u64_counter("netgauze.rollup.emitted.rollups")
            .with_description("Number of coarse granularity rollups emitted")
            .build();
        let failed_reports = meter
            .u64_counter("netgauze.rollup.failed.reports")
            .with_description("Number of report calls failed due to a querier or summarizer error")
            .build();
        Self {
            received_points,
            emitted_rollups,
            failed_reports,
        }
    }
}

type ReportReply<T> = oneshot::Sender<Result<Vec<Report<T>>, RollupError>>;

pub(crate) enum RollupCommand<T> {
    Report {
        data: T,
        event_time: DateTime<Utc>,
        reply: ReportReply<T>,
    },
    Watermarks {
        reply: oneshot::Sender<Watermarks>,
    },
    Shutdown,
}

struct RollupActor<T, S, Q> {
    cmd_recv: mpsc::Receiver<RollupCommand<T>>,
    engine: RollupEngine<S, Q>,
    stats: RollupStats,
}

impl<T, S, Q> RollupActor<T, S, Q>
where
    S: Summarizer<T>,
    Q: Querier<T>,
{
    fn new(
        cmd_recv: mpsc::Receiver<RollupCommand<T>>,
        engine: RollupEngine<S, Q>,
        stats: RollupStats,
    ) -> Self {
        Self {
            cmd_recv,
            engine,
            stats,
        }
    }

    async fn run(mut self) -> Watermarks {
        let tags = [KeyValue::new("rollup.name", self.engine.name().to_string())];
        loop {
            match self.cmd_recv.recv().await {
                Some(RollupCommand::Report {
                    data,
                    event_time,
                    reply,
                }) => {
                    self.stats.received_points.add(1, &tags);
                    let result = self.engine.report(data, event_time).await;
                    match &result {
                        Ok(reports) => {
                            let rollups = reports.iter().filter(|r| !r.table().is_finest()).count();
                            self.stats.emitted_rollups.add(rollups as u64, &tags);
                        }
                        Err(err) => {
                            warn!("Rollup actor failed to report at {event_time}: {err}");
                            self.stats.failed_reports.add(1, &tags);
                        }
                    }
                    if reply.send(result).is_err() {
                        debug!("Report caller went away before receiving the result");
                    }
                }
                Some(RollupCommand::Watermarks { reply }) => {
                    if reply.send(self.engine.watermarks().clone()).is_err() {
                        debug!("Watermarks caller went away before receiving the result");
                    }
                }
                Some(RollupCommand::Shutdown) => {
                    info!("Received shutdown command, shutting down rollup actor");
                    break;
                }
                None => {
                    info!("Command channel closed, shutting down rollup actor");
                    break;
                }
            }
        }
        self.engine.into_watermarks()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum RollupActorHandleError {
    #[error("rollup actor is not running")]
    SendError,

    #[error("rollup actor dropped the request")]
    ReceiveError,

    #[error(transparent)]
    Rollup(#[from] RollupError),
}

#[derive(Debug)]
pub struct RollupActorHandle<T> {
    cmd_send: mpsc::Sender<RollupCommand<T>>,
}

impl<T> Clone for RollupActorHandle<T> {
    fn clone(&self) -> Self {
        Self {
            cmd_send: self.cmd_send.clone(),
        }
    }
}

impl<T: Send + 'static> RollupActorHandle<T> {
    /// Spawns the actor on the current tokio runtime
    pub fn new<S, Q>(
        buffer_size: usize,
        engine: RollupEngine<S, Q>,
        stats: Either<Meter, RollupStats>,
    ) -> (JoinHandle<Watermarks>, Self)
    where
        S: Summarizer<T> + Send + Sync + 'static,
        Q: Querier<T> + Send + Sync + 'static,
    {
        let (cmd_send, cmd_recv) = mpsc::channel(buffer_size);
        let stats = match stats {
            Either::Left(meter) => RollupStats::new(meter),
            Either::Right(stats) => stats,
        };
        let actor = RollupActor::new(cmd_recv, engine, stats);
        let join_handle = tokio::spawn(actor.run());
        (join_handle, Self { cmd_send })
    }

    pub async fn report(
        &self,
        data: T,
        event_time: DateTime<Utc>,
    ) -> Result<Vec<Report<T>>, RollupActorHandleError> {
        let (reply, rx) = oneshot::channel();
        self.cmd_send
            .send(RollupCommand::Report {
                data,
                event_time,
                reply,
            })
            .await
            .map_err(|_| RollupActorHandleError::SendError)?;
        Ok(rx
            .await
            .map_err(|_| RollupActorHandleError::ReceiveError)??)
    }

    pub async fn watermarks(&self) -> Result<Watermarks, RollupActorHandleError> {
        let (reply, rx) = oneshot::channel();
        self.cmd_send
            .send(RollupCommand::Watermarks { reply })
            .await
            .map_err(|_| RollupActorHandleError::SendError)?;
        rx.await.map_err(|_| RollupActorHandleError::ReceiveError)
    }

    pub async fn shutdown(&self) -> Result<(), RollupActorHandleError> {
        self.cmd_send
            .send(RollupCommand::Shutdown)
            .await
            .map_err(|_| RollupActorHandleError::SendError)
    }
}

#[cfg(test)]
mod tests;
