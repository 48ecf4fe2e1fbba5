/*
 *     Copyright (C) 2023  Fritz Ochsmann
 *
 *     This program is free software: you can redistribute it and/or modify
 *     it under the terms of the GNU Affero General Public License as published
 *     by the Free Software Foundation, either version 3 of the License, or
 *     (at your option) any later version.
 *
 *     This program is distributed in the hope that it will be useful,
 *     but WITHOUT ANY WARRANTY; without even the implied warranty of
 *     MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *     GNU Affero General Public License for more details.
 *
 *     You should have received a copy of the GNU Affero General Public License
 *     along with this program.  If not, see <http://www.gnu.org/licenses/>.
 */

use crate::prelude::*;
use kanal::AsyncReceiver;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Periodically probes the store until a message arrives on the shutdown channel.
/// The first probe happens one interval after the start.
pub fn spawn(
    connection: DatabaseConnection,
    period: Duration,
    shutdown: AsyncReceiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    probe(&connection).await;
                }
                _ = shutdown.recv() => {
                    info!("Received shutdown signal, stopping the health monitor");
                    break;
                }
            }
        }
    })
}

/// A failed probe is only logged, the monitor keeps running.
#[instrument(skip_all)]
pub async fn probe(connection: &DatabaseConnection) -> bool {
    match crate::database::ping(connection).await {
        Ok(()) => {
            debug!("Database connection is healthy");
            true
        }
        Err(error) => {
            error!("Database health check failed: {}", error);
            false
        }
    }
}
