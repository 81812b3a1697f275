//! Read primitives the graph and workspace loaders need from storage.
//!
//! `BackofficeDb` is the production implementation. Loaders are generic over
//! this trait so tree views can be built from any source that can answer
//! these queries consistently.

use crate::db::BackofficeDb;
use crate::error::CoreError;
use crate::roles::Role;
use crate::types::{Account, Assignment, Project, Task};

pub trait RelationStore {
    fn account(&self, id: i64) -> Result<Option<Account>, CoreError>;
    fn accounts_by_role(&self, role: Role) -> Result<Vec<Account>, CoreError>;

    fn project(&self, id: i64) -> Result<Option<Project>, CoreError>;
    fn projects(&self) -> Result<Vec<Project>, CoreError>;
    fn projects_for_client(&self, client_id: i64) -> Result<Vec<Project>, CoreError>;

    fn assignments(&self) -> Result<Vec<Assignment>, CoreError>;
    fn assignments_for_project(&self, project_id: i64) -> Result<Vec<Assignment>, CoreError>;
    fn assignments_for_member(&self, member_id: i64) -> Result<Vec<Assignment>, CoreError>;

    fn tasks(&self) -> Result<Vec<Task>, CoreError>;
    fn tasks_for_project(&self, project_id: i64) -> Result<Vec<Task>, CoreError>;
    fn tasks_for_assignee(&self, assignee_id: i64) -> Result<Vec<Task>, CoreError>;

    /// Run `f` against one consistent view of the store. Stores without
    /// transactions just call `f`.
    fn consistent_read<T, F>(&self, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(&Self) -> Result<T, CoreError>,
    {
        f(self)
    }
}

impl RelationStore for BackofficeDb {
    fn account(&self, id: i64) -> Result<Option<Account>, CoreError> {
        Ok(self.get_account(id)?)
    }

    fn accounts_by_role(&self, role: Role) -> Result<Vec<Account>, CoreError> {
        Ok(BackofficeDb::accounts_by_role(self, role)?)
    }

    fn project(&self, id: i64) -> Result<Option<Project>, CoreError> {
        Ok(self.get_project(id)?)
    }

    fn projects(&self) -> Result<Vec<Project>, CoreError> {
        Ok(self.all_projects()?)
    }

    fn projects_for_client(&self, client_id: i64) -> Result<Vec<Project>, CoreError> {
        Ok(BackofficeDb::projects_for_client(self, client_id)?)
    }

    fn assignments(&self) -> Result<Vec<Assignment>, CoreError> {
        Ok(self.all_assignments()?)
    }

    fn assignments_for_project(&self, project_id: i64) -> Result<Vec<Assignment>, CoreError> {
        Ok(BackofficeDb::assignments_for_project(self, project_id)?)
    }

    fn assignments_for_member(&self, member_id: i64) -> Result<Vec<Assignment>, CoreError> {
        Ok(BackofficeDb::assignments_for_member(self, member_id)?)
    }

    fn tasks(&self) -> Result<Vec<Task>, CoreError> {
        Ok(self.all_tasks()?)
    }

    fn tasks_for_project(&self, project_id: i64) -> Result<Vec<Task>, CoreError> {
        Ok(BackofficeDb::tasks_for_project(self, project_id)?)
    }

    fn tasks_for_assignee(&self, assignee_id: i64) -> Result<Vec<Task>, CoreError> {
        Ok(BackofficeDb::tasks_for_assignee(self, assignee_id)?)
    }

    fn consistent_read<T, F>(&self, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(&Self) -> Result<T, CoreError>,
    {
        self.with_snapshot(f)
    }
}
