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

use crate::database::definitions::user::User;
use crate::prelude::*;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

pub mod authz;
pub mod middleware;
pub mod token;

/// The verified caller of a request, taken from the bearer token.
#[derive(Clone, Debug, PartialEq, Getters, CopyGetters)]
pub struct Identity {
    #[get = "pub"]
    id: Id,
    #[get_copy = "pub"]
    role: Role,
}

impl Identity {
    pub fn new(id: Id, role: Role) -> Self {
        Self { id, role }
    }
}

/// Hashes the password into a PHC string using argon2id with a random salt
#[instrument(skip_all)]
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;

    Ok(hash.to_string())
}

pub trait Authenticate {
    fn login(&self, password: &str) -> Result<()>;
}

impl Authenticate for User {
    #[instrument(skip_all, fields(user = %self.id()))]
    fn login(&self, password: &str) -> Result<()> {
        // a malformed stored hash is reported like a wrong password
        let invalid = || ApplicationError::Unauthorized("invalid credentials".to_owned());
        let hash = PasswordHash::new(self.password_hash().as_str()).map_err(|_| invalid())?;

        Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .map_err(|_| invalid())
    }
}

#[cfg(test)]
mod tests {
    use crate::auth::{hash_password, Authenticate};
    use crate::config::Config;
    use crate::database::definitions::user::WriteUser;
    use axum::BoxError;

    #[test]
    fn test_hash_is_salted() -> Result<(), BoxError> {
        let first = hash_password("password")?;
        let second = hash_password("password")?;

        assert!(first.starts_with("$argon2id$"));
        assert_ne!(first, second);

        Ok(())
    }

    #[tokio::test]
    async fn test_login() -> Result<(), BoxError> {
        let connection = crate::database::connect(&Config::in_memory()).await?;
        let user = WriteUser::from(&connection)
            .set_username(Some("alice".to_owned()))
            .set_email(Some("alice@example.com".to_owned()))
            .set_password(Some("password".to_owned()))
            .to_owned()
            .await?;

        assert!(user.login("password").is_ok());
        assert!(user.login("password1").is_err());
        assert!(user.login("").is_err());

        Ok(())
    }
}
