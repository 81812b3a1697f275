//! Relationship view loaders.
//!
//! The unscoped loaders take any [`RelationStore`] and read everything they
//! need inside one `consistent_read`. The `*_for` variants check the viewer's
//! access first.

use crate::error::CoreError;
use crate::graph::{self, CustomerTree, RelationshipGraph, SubAdminTree};
use crate::policy;
use crate::roles::Role;
use crate::store::RelationStore;
use crate::types::{Account, Assignment, Principal, Task};

fn account_with_role<S: RelationStore>(
    store: &S,
    id: i64,
    role: Role,
) -> Result<Account, CoreError> {
    let account = store
        .account(id)?
        .ok_or_else(|| CoreError::not_found("Account", id))?;
    if account.role != role {
        return Err(CoreError::invalid(format!(
            "Account {id} is a {} and has no {role} tree.",
            account.role
        )));
    }
    Ok(account)
}

/// Assignments and tasks of the given projects.
fn scoped_rows<S: RelationStore>(
    store: &S,
    project_ids: &[i64],
) -> Result<(Vec<Assignment>, Vec<Task>), CoreError> {
    let mut assignments = Vec::new();
    let mut tasks = Vec::new();
    for &id in project_ids {
        assignments.extend(store.assignments_for_project(id)?);
        tasks.extend(store.tasks_for_project(id)?);
    }
    Ok((assignments, tasks))
}

pub fn organization_tree<S: RelationStore>(store: &S) -> Result<RelationshipGraph, CoreError> {
    store.consistent_read(|s| {
        let projects = s.projects()?;
        let assignments = s.assignments()?;
        let tasks = s.tasks()?;
        let sub_admins = s.accounts_by_role(Role::SubAdmin)?;
        let developers = s.accounts_by_role(Role::Developer)?;
        graph::build_organization_tree(&projects, &assignments, &tasks, &sub_admins, &developers)
    })
}

pub fn customer_tree<S: RelationStore>(
    store: &S,
    customer_id: i64,
) -> Result<CustomerTree, CoreError> {
    store.consistent_read(|s| {
        let customer = account_with_role(s, customer_id, Role::Customer)?;
        let projects = s.projects_for_client(customer_id)?;
        let ids: Vec<i64> = projects.iter().map(|p| p.id).collect();
        let (assignments, tasks) = scoped_rows(s, &ids)?;
        graph::build_customer_tree(&customer, &projects, &assignments, &tasks)
    })
}

pub fn sub_admin_tree<S: RelationStore>(
    store: &S,
    sub_admin_id: i64,
) -> Result<SubAdminTree, CoreError> {
    store.consistent_read(|s| {
        let sub_admin = account_with_role(s, sub_admin_id, Role::SubAdmin)?;
        let mut project_ids: Vec<i64> = Vec::new();
        for assignment in s.assignments_for_member(sub_admin_id)? {
            if assignment.assignment_role == Role::SubAdmin
                && !project_ids.contains(&assignment.project_id)
            {
                project_ids.push(assignment.project_id);
            }
        }
        let mut projects = Vec::with_capacity(project_ids.len());
        for &id in &project_ids {
            let project = s.project(id)?.ok_or_else(|| {
                CoreError::ReferentialIntegrity(format!(
                    "assignment of account {sub_admin_id} references missing project {id}"
                ))
            })?;
            projects.push(project);
        }
        let (assignments, tasks) = scoped_rows(s, &project_ids)?;
        graph::build_sub_admin_tree(&sub_admin, &projects, &assignments, &tasks)
    })
}

pub fn organization_tree_for<S: RelationStore>(
    store: &S,
    viewer: &Principal,
) -> Result<RelationshipGraph, CoreError> {
    if let Err(e) = policy::may_view_organization_tree(viewer) {
        log::warn!("Account {} denied the organization tree", viewer.id);
        return Err(e);
    }
    organization_tree(store)
}

pub fn customer_tree_for<S: RelationStore>(
    store: &S,
    viewer: &Principal,
    customer_id: i64,
) -> Result<CustomerTree, CoreError> {
    policy::may_view_customer_tree(viewer, customer_id)?;
    customer_tree(store, customer_id)
}

pub fn sub_admin_tree_for<S: RelationStore>(
    store: &S,
    viewer: &Principal,
    sub_admin_id: i64,
) -> Result<SubAdminTree, CoreError> {
    policy::may_view_sub_admin_tree(viewer, sub_admin_id)?;
    sub_admin_tree(store, sub_admin_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::{seed_account, seed_project, test_db};
    use crate::error::{DenialReason, ErrorKind};
    use crate::services::assignments::assign_member;
    use crate::services::test_support::root;

    #[test]
    fn test_organization_tree_from_db() {
        let db = test_db();
        let (_, admin) = root(&db);
        let customer = seed_account(&db, "Cora", Role::Customer);
        let lead = seed_account(&db, "Lead", Role::SubAdmin);
        let idle = seed_account(&db, "Idle", Role::SubAdmin);
        let dev = seed_account(&db, "Dev", Role::Developer);
        let owned = seed_project(&db, "Portal", Some(customer.id));
        let orphan = seed_project(&db, "Internal", None);
        assign_member(&db, &admin, owned.id, lead.id, Role::SubAdmin).expect("assign");

        let graph = organization_tree_for(&db, &admin).expect("tree");
        assert_eq!(graph.customer_trees.len(), 1);
        assert_eq!(graph.customer_trees[0].projects[0].project_id, owned.id);
        assert_eq!(graph.unassigned_projects[0].project_id, orphan.id);
        assert_eq!(graph.sub_admin_trees.len(), 2);
        let idle_ids: Vec<i64> = graph.unassigned_sub_admins.iter().map(|s| s.id).collect();
        assert_eq!(idle_ids, vec![idle.id]);
        assert_eq!(graph.unassigned_developers[0].id, dev.id);
    }

    #[test]
    fn test_scoped_trees() {
        let db = test_db();
        let (_, admin) = root(&db);
        let customer = seed_account(&db, "Cora", Role::Customer);
        let lead = seed_account(&db, "Lead", Role::SubAdmin);
        let dev = seed_account(&db, "Dev", Role::Developer);
        let portal = seed_project(&db, "Portal", Some(customer.id));
        seed_project(&db, "Other", None);
        assign_member(&db, &admin, portal.id, lead.id, Role::SubAdmin).expect("lead");
        assign_member(&db, &admin, portal.id, dev.id, Role::Developer).expect("dev");

        let tree = customer_tree_for(&db, &customer.principal(), customer.id).expect("own tree");
        assert_eq!(tree.projects.len(), 1);
        assert_eq!(tree.projects[0].developers[0].id, dev.id);
        assert_eq!(tree.projects[0].sub_admins[0].id, lead.id);

        let tree = sub_admin_tree_for(&db, &lead.principal(), lead.id).expect("own tree");
        assert_eq!(tree.projects.len(), 1);
        assert_eq!(tree.projects[0].developers.len(), 1);
    }

    #[test]
    fn test_role_mismatch_and_access() {
        let db = test_db();
        let (_, admin) = root(&db);
        let lead = seed_account(&db, "Lead", Role::SubAdmin);
        let other = seed_account(&db, "Other", Role::SubAdmin);
        let customer = seed_account(&db, "Cora", Role::Customer);

        assert_eq!(
            customer_tree(&db, lead.id).unwrap_err().kind(),
            ErrorKind::InvalidOperation
        );
        assert_eq!(
            sub_admin_tree(&db, customer.id).unwrap_err().kind(),
            ErrorKind::InvalidOperation
        );
        assert_eq!(customer_tree(&db, 404).unwrap_err().kind(), ErrorKind::NotFound);

        let err = sub_admin_tree_for(&db, &lead.principal(), other.id).unwrap_err();
        assert_eq!(err.denial_reason(), Some(DenialReason::SubAdminTreeScope));
        let err = organization_tree_for(&db, &lead.principal()).unwrap_err();
        assert_eq!(err.denial_reason(), Some(DenialReason::OrganizationTreeRestricted));
        assert!(sub_admin_tree_for(&db, &admin, other.id).expect("admin view").projects.is_empty());
    }
}
