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

use crate::auth::token::TokenIssuer;
use crate::config::Config;
use crate::prelude::DatabaseConnection;
use crate::error::Result;
use std::sync::Arc;

#[derive(Clone, Getters)]
#[get = "pub"]
pub struct ApplicationState {
    connection: DatabaseConnection,
    tokens: Arc<TokenIssuer>,
}

impl ApplicationState {
    pub fn new(connection: DatabaseConnection, tokens: TokenIssuer) -> Self {
        Self {
            connection,
            tokens: Arc::new(tokens),
        }
    }

    /// Connects to the store and prepares the token issuer.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let connection = crate::database::connect(config).await?;
        let tokens = TokenIssuer::new(config.signing_secret(), config.token_lifetime());

        Ok(Self::new(connection, tokens))
    }
}
