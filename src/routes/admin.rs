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

use crate::auth::middleware::protect;
use crate::database::definitions::user::User;
use crate::prelude::*;
use axum::extract::State;
use axum::routing::get;
use axum::Router;

pub fn router(state: &ApplicationState) -> Router<ApplicationState> {
    protect(
        Router::new().route("/api/admin/users", get(list_users)),
        state,
        Scope::Admin,
    )
}

async fn list_users(State(state): State<ApplicationState>) -> Result<Json<Vec<User>>> {
    Ok(Json(User::list(state.connection()).await?))
}

#[cfg(test)]
mod tests {
    use crate::database::definitions::user::User;
    use crate::prelude::Role;
    use crate::tests::TestSuite;
    use axum::http::StatusCode;
    use axum::BoxError;

    #[tokio::test]
    async fn test_list_users() -> Result<(), BoxError> {
        let suite = TestSuite::init().await?;
        let admin = suite.register("root", Role::Admin).await?;
        let manager = suite.register("manager", Role::Manager).await?;
        let developer = suite.register("developer", Role::Dev).await?;

        let response = suite
            .client()
            .get("/api/admin/users")
            .bearer(admin.token.as_str())
            .send()
            .await?;
        assert_eq!(StatusCode::OK, response.status());
        assert!(!response.text().contains("password_hash"));

        let users = response.json::<Vec<User>>()?;
        assert_eq!(
            users.iter().map(User::id).collect::<Vec<_>>(),
            vec![admin.user.id(), manager.user.id(), developer.user.id()]
        );

        for token in [manager.token, developer.token] {
            let response = suite
                .client()
                .get("/api/admin/users")
                .bearer(token.as_str())
                .send()
                .await?;
            assert_eq!(StatusCode::FORBIDDEN, response.status());
        }

        let response = suite.client().get("/api/admin/users").send().await?;
        assert_eq!(StatusCode::UNAUTHORIZED, response.status());

        Ok(())
    }
}
