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
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

const ISSUER: &str = "taskmanager";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// the user id as `user:key`
    sub: String,
    role: Role,
    iat: i64,
    exp: i64,
    iss: String,
}

/// Issues and verifies the stateless HS256 session tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, lifetime: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            lifetime,
        }
    }

    #[instrument(skip(self))]
    pub fn issue(&self, user: &Id, role: Role) -> Result<String> {
        let iat = Utc::now();
        let claims = Claims {
            sub: user.to_string(),
            role,
            iat: iat.timestamp(),
            exp: (iat + self.lifetime).timestamp(),
            iss: ISSUER.to_owned(),
        };

        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }

    /// Every failure, whether signature, expiry or payload, is reported as unauthorized.
    #[instrument(skip_all)]
    pub fn verify(&self, token: &str) -> Result<Identity> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|error| {
                debug!("Rejected token: {}", error);
                ApplicationError::Unauthorized("invalid or expired token".to_owned())
            })?;

        let id = Id::parse("user", data.claims.sub.as_str())
            .map_err(|_| ApplicationError::Unauthorized("invalid or expired token".to_owned()))?;

        Ok(Identity::new(id, data.claims.role))
    }
}
