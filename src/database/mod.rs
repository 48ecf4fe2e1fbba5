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
use std::str::FromStr;
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;

pub mod definitions;
pub mod id;

pub type DatabaseConnection = Surreal<Any>;

#[instrument(skip_all, fields(endpoint = %config.database_url()))]
pub async fn connect(config: &Config) -> Result<DatabaseConnection> {
    // establish the connection, the scheme of the url selects the engine
    let client = surrealdb::engine::any::connect(config.database_url().as_str()).await?;
    info!("Established connection to surrealdb");

    // authenticate, in-process stores have no users
    if let (Some(username), Some(password)) =
        (config.database_username(), config.database_password())
    {
        client
            .signin(Root {
                username: username.as_str(),
                password: password.as_str(),
            })
            .await?;
        info!("Authenticated with surrealdb");
    }

    client
        .use_ns(config.database_namespace().as_str())
        .use_db(config.database_name().as_str())
        .await?;

    // the definitions only ever add tables, fields and indexes
    sql_span!(client.query(include_str!("./up.surrealql")))
        .await?
        .check()?;
    info!("Initiated tables");

    Ok(client)
}

/// Lightweight connectivity probe.
pub async fn ping(connection: &DatabaseConnection) -> Result<()> {
    sql_span!(connection.health(), "health").await?;

    Ok(())
}

/// Parses an optional enumerated literal. Absent and empty values both mean "not supplied".
pub fn parse_literal<T: FromStr>(raw: Option<String>, field: &str) -> Result<Option<T>> {
    match raw {
        Some(raw) if !raw.is_empty() => T::from_str(raw.as_str())
            .map(Some)
            .map_err(|_| ApplicationError::BadRequest(format!("invalid {field}: {raw}"))),
        _ => Ok(None),
    }
}

/// Returns the value if present and not empty.
pub fn required(raw: Option<String>, field: &str) -> Result<String> {
    raw.filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ApplicationError::BadRequest(format!("{field} is required")))
}

#[macro_export]
macro_rules! sql_span {
    ($expr: expr) => {
        tracing::Instrument::instrument(
            std::future::IntoFuture::into_future($expr),
            tracing::info_span!("Surrealdb Request"),
        )
    };
    ($expr: expr, $title: expr) => {
        tracing::Instrument::instrument(
            std::future::IntoFuture::into_future($expr),
            tracing::info_span!(concat!("Surrealdb Request: ", $title)),
        )
    };
}
