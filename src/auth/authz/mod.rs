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
use strum::{AsRefStr, Display, EnumString};

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    #[default]
    Dev,
}

/// The access class of a route group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Scope {
    Public,
    /// any valid token
    Authenticated,
    Developer,
    Manager,
    Admin,
}

impl Scope {
    /// The roles admitted to the scope, `None` meaning no restriction.
    pub fn allowed_roles(&self) -> Option<&'static [Role]> {
        match self {
            Scope::Public | Scope::Authenticated => None,
            Scope::Developer => Some(&[Role::Admin, Role::Manager, Role::Dev]),
            Scope::Manager => Some(&[Role::Admin, Role::Manager]),
            Scope::Admin => Some(&[Role::Admin]),
        }
    }

    pub fn permits(&self, role: Role) -> bool {
        self.allowed_roles()
            .map(|roles| roles.contains(&role))
            .unwrap_or(true)
    }

    /// Unauthenticated callers are rejected before their role is considered.
    pub fn authorize(&self, identity: Option<&Identity>) -> Result<()> {
        match (self, identity) {
            (Scope::Public, _) => Ok(()),
            (_, None) => Err(ApplicationError::Unauthorized(
                "missing or invalid token".to_owned(),
            )),
            (scope, Some(identity)) => identity.authorize(scope),
        }
    }
}

pub trait Authorize {
    fn authorize(&self, scope: &Scope) -> Result<()>;
}

impl Authorize for Identity {
    fn authorize(&self, scope: &Scope) -> Result<()> {
        if scope.permits(self.role()) {
            Ok(())
        } else {
            Err(ApplicationError::Forbidden(format!(
                "role {} is not permitted to access this resource",
                self.role()
            )))
        }
    }
}
