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

use crate::database::definitions::workspace::Workspace;
use crate::database::required;
use crate::prelude::*;
use chrono::{DateTime, Utc};
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use surrealdb::sql::{Datetime, Thing};

/// A grouping of tasks. The workspace is fixed once the project exists.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Getters)]
#[get = "pub"]
pub struct Project {
    id: Id,
    name: String,
    workspace_id: Id,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// A project together with its workspace.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Getters)]
#[get = "pub"]
pub struct ProjectDetails {
    #[serde(flatten)]
    project: Project,
    workspace: Option<Workspace>,
}

impl Project {
    #[instrument(skip(connection))]
    pub async fn from_id(id: &Id, connection: &DatabaseConnection) -> Result<Option<Project>> {
        Ok(sql_span!(connection.select(id.to_thing())).await?)
    }

    #[instrument(skip(connection))]
    pub async fn details(
        id: &Id,
        connection: &DatabaseConnection,
    ) -> Result<Option<ProjectDetails>> {
        let project = match Project::from_id(id, connection).await? {
            Some(project) => project,
            None => return Ok(None),
        };
        let workspace = Workspace::from_id(&project.workspace_id, connection).await?;

        Ok(Some(ProjectDetails { project, workspace }))
    }

    #[instrument(skip(connection))]
    pub async fn list_by_workspace(
        workspace: &Id,
        connection: &DatabaseConnection,
    ) -> Result<Vec<Project>> {
        let projects = sql_span!(connection
            .query("SELECT * FROM project WHERE workspace_id = $workspace ORDER BY created_at ASC")
            .bind(("workspace", workspace.to_thing())))
        .await?
        .take::<Vec<Project>>(0)?;

        Ok(projects)
    }
}

#[derive(Serialize)]
struct ProjectContent {
    name: String,
    workspace_id: Thing,
    created_at: Datetime,
    updated_at: Datetime,
}

#[derive(Clone, Setters)]
pub struct WriteProject<'a> {
    #[set = "pub"]
    name: Option<String>,
    #[set = "pub"]
    workspace: Option<Id>,
    connection: &'a DatabaseConnection,
}

impl<'a> From<&'a DatabaseConnection> for WriteProject<'a> {
    fn from(connection: &'a DatabaseConnection) -> Self {
        Self {
            name: None,
            workspace: None,
            connection,
        }
    }
}

impl<'a> IntoFuture for WriteProject<'a> {
    type Output = Result<Project>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send + 'a>>;

    #[instrument(skip_all)]
    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            let name = required(self.name, "name")?;
            let workspace = self
                .workspace
                .ok_or_else(|| ApplicationError::BadRequest("workspace_id is required".to_owned()))?;

            if Workspace::from_id(&workspace, self.connection).await?.is_none() {
                return Err(ApplicationError::NotFound("workspace not found".to_owned()));
            }

            let now = Datetime::from(Utc::now());
            let content = ProjectContent {
                name,
                workspace_id: workspace.to_thing(),
                created_at: now.clone(),
                updated_at: now,
            };

            let id = Id::generate("project");
            let project: Option<Project> =
                sql_span!(self.connection.create(id.to_thing()).content(content)).await?;
            let project = project.ok_or(ApplicationError::InternalServerError)?;
            info!(project = %project.id, workspace = %project.workspace_id, "Created project");

            Ok(project)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::database::definitions::user::WriteUser;
    use crate::database::definitions::workspace::WriteWorkspace;
    use axum::BoxError;

    #[tokio::test]
    async fn test_write_and_list() -> std::result::Result<(), BoxError> {
        let connection = crate::database::connect(&Config::in_memory()).await?;
        let owner = WriteUser::from(&connection)
            .set_username(Some("manager".to_owned()))
            .set_email(Some("manager@example.com".to_owned()))
            .set_password(Some("password".to_owned()))
            .set_role(Some(Role::Manager))
            .to_owned()
            .await?;
        let workspace = WriteWorkspace::new(owner.id(), &connection)
            .set_name(Some("platform".to_owned()))
            .to_owned()
            .await?;
        let other = WriteWorkspace::new(owner.id(), &connection)
            .set_name(Some("other".to_owned()))
            .to_owned()
            .await?;

        let first = WriteProject::from(&connection)
            .set_name(Some("api".to_owned()))
            .set_workspace(Some(workspace.id().clone()))
            .to_owned()
            .await?;
        let second = WriteProject::from(&connection)
            .set_name(Some("web".to_owned()))
            .set_workspace(Some(workspace.id().clone()))
            .to_owned()
            .await?;

        assert_eq!(first.workspace_id(), workspace.id());
        assert_eq!(
            Project::from_id(first.id(), &connection).await?,
            Some(first.clone())
        );
        assert_eq!(
            Project::list_by_workspace(workspace.id(), &connection).await?,
            vec![first.clone(), second]
        );
        assert!(Project::list_by_workspace(other.id(), &connection)
            .await?
            .is_empty());

        let details = Project::details(first.id(), &connection).await?;
        assert_eq!(
            details.as_ref().and_then(|details| details.workspace().clone()),
            Some(workspace)
        );
        assert_eq!(details.map(|details| details.project().clone()), Some(first));
        assert!(Project::details(&Id::new("project", "missing"), &connection)
            .await?
            .is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_requires_existing_workspace() -> std::result::Result<(), BoxError> {
        let connection = crate::database::connect(&Config::in_memory()).await?;

        assert!(matches!(
            WriteProject::from(&connection)
                .set_name(Some("api".to_owned()))
                .to_owned()
                .await,
            Err(ApplicationError::BadRequest(_))
        ));
        assert!(matches!(
            WriteProject::from(&connection)
                .set_name(Some("api".to_owned()))
                .set_workspace(Some(Id::new("workspace", "missing")))
                .to_owned()
                .await,
            Err(ApplicationError::NotFound(_))
        ));

        Ok(())
    }
}
