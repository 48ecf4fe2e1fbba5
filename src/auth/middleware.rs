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
use crate::prelude::*;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::{from_fn_with_state, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::sync::Arc;

#[derive(Clone)]
struct Guard {
    tokens: Arc<TokenIssuer>,
    scope: Scope,
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolves the caller from the bearer token and checks it against the scope of the route.
/// On success the [`Identity`] is available to the handler as an extension.
async fn require_scope(State(guard): State<Guard>, mut request: Request, next: Next) -> Response {
    let identity = match bearer(request.headers()).map(|token| guard.tokens.verify(token)) {
        Some(Ok(identity)) => Some(identity),
        Some(Err(error)) => return error.into_response(),
        None => None,
    };

    if let Err(error) = guard.scope.authorize(identity.as_ref()) {
        return error.into_response();
    }

    if let Some(identity) = identity {
        request.extensions_mut().insert(identity);
    }

    next.run(request).await
}

/// Puts every route of the router behind the given scope.
pub fn protect(
    router: Router<ApplicationState>,
    state: &ApplicationState,
    scope: Scope,
) -> Router<ApplicationState> {
    let guard = Guard {
        tokens: state.tokens().clone(),
        scope,
    };

    router.route_layer(from_fn_with_state(guard, require_scope))
}
