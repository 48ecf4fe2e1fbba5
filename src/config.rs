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
use std::time::Duration;

const DEVELOPMENT_SECRET: &str = "taskmanager-development-secret";

/// Runtime configuration, read from the environment (optionally seeded by a `.env` file).
#[derive(Deserialize, Debug, Clone, Getters)]
pub struct Config {
    /// endpoint of the store, `mem://` runs an in-process store
    #[get = "pub"]
    #[serde(default = "default_database_url")]
    database_url: String,
    #[get = "pub"]
    database_username: Option<String>,
    #[get = "pub"]
    database_password: Option<String>,
    #[get = "pub"]
    #[serde(default = "default_database_namespace")]
    database_namespace: String,
    #[get = "pub"]
    #[serde(default = "default_database_name")]
    database_name: String,
    jwt_secret: Option<String>,
    #[serde(default = "default_token_lifetime_hours")]
    token_lifetime_hours: i64,
    #[get = "pub"]
    #[serde(default = "default_bind_address")]
    bind_address: String,
    #[serde(default = "default_health_interval_secs")]
    health_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(envy::from_env::<Config>()?)
    }

    /// The key used to sign session tokens. Falls back to a fixed development secret.
    pub fn signing_secret(&self) -> &str {
        match self.jwt_secret.as_deref() {
            Some(secret) if !secret.is_empty() => secret,
            _ => {
                warn!("JWT_SECRET is not set, tokens are signed with the development secret");
                DEVELOPMENT_SECRET
            }
        }
    }

    pub fn token_lifetime(&self) -> chrono::Duration {
        chrono::Duration::hours(self.token_lifetime_hours)
    }

    pub fn health_interval(&self) -> Duration {
        Duration::from_secs(self.health_interval_secs)
    }

    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self {
            database_url: "mem://".to_owned(),
            database_username: None,
            database_password: None,
            database_namespace: "test".to_owned(),
            database_name: nanoid::nanoid!(),
            jwt_secret: Some("test-secret".to_owned()),
            token_lifetime_hours: 1,
            bind_address: default_bind_address(),
            health_interval_secs: 1,
        }
    }
}

fn default_database_url() -> String {
    "ws://localhost:8000".to_owned()
}

fn default_database_namespace() -> String {
    "taskmanager".to_owned()
}

fn default_database_name() -> String {
    "taskmanager".to_owned()
}

fn default_token_lifetime_hours() -> i64 {
    24
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_owned()
}

fn default_health_interval_secs() -> u64 {
    60
}
