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

use crate::config::Config;
use crate::prelude::*;
use tokio::net::TcpListener;

pub mod health;
pub mod state;

/// Serves the api until ctrl-c is received, then stops the health monitor.
pub async fn run(config: &Config) -> Result<()> {
    let state = ApplicationState::from_config(config).await?;

    let (health_sender, health_receiver) = kanal::unbounded_async::<()>();
    let monitor = health::spawn(
        state.connection().clone(),
        config.health_interval(),
        health_receiver,
    );

    let router = crate::routes::router(state);
    let listener = TcpListener::bind(config.bind_address().as_str()).await?;
    info!("Listening on {}", config.bind_address());

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Received shutdown signal... Shutting down...");
    if health_sender.send(()).await.is_err() {
        warn!("Health monitor already stopped");
    }
    if let Err(error) = monitor.await {
        error!("Health monitor terminated abnormally: {}", error);
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        // without a signal handler the server runs until killed
        error!("Unable to listen for shutdown signal: {}", error);
        std::future::pending::<()>().await;
    }
}
