//! Relationship graph builder.
//!
//! Turns flat projects, assignments and tasks into nested views: one tree per
//! customer, one tree per sub-admin, and the pools of staff and projects that
//! nothing links to. Everything here is pure; loaders in `services::graph`
//! fetch the inputs.
//!
//! Ordering is deterministic: names compare case-insensitively with the id as
//! tie-break. Staff lists are deduplicated by account id even when storage
//! returns the same member twice.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::CoreError;
use crate::roles::Role;
use crate::types::{Account, Assignment, Project, ProjectStatus, StaffSummary, Task, TaskStatus};

/// One project with its team and task roll-up.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTeamNode {
    pub project_id: i64,
    pub name: String,
    pub status: ProjectStatus,
    pub progress_percentage: u8,
    pub summary: String,
    pub target_date: Option<NaiveDate>,
    pub customer: Option<StaffSummary>,
    pub sub_admins: Vec<StaffSummary>,
    pub developers: Vec<StaffSummary>,
    pub total_tasks: usize,
    pub open_tasks: usize,
    pub completed_tasks: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerTree {
    pub customer: StaffSummary,
    pub projects: Vec<ProjectTeamNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubAdminTree {
    pub sub_admin: StaffSummary,
    pub projects: Vec<ProjectTeamNode>,
}

/// The organization-wide view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipGraph {
    pub customer_trees: Vec<CustomerTree>,
    pub sub_admin_trees: Vec<SubAdminTree>,
    pub unassigned_sub_admins: Vec<StaffSummary>,
    pub unassigned_developers: Vec<StaffSummary>,
    pub unassigned_projects: Vec<ProjectTeamNode>,
}

// =============================================================================
// Ordering and dedup helpers
// =============================================================================

fn name_key(name: &str, id: i64) -> (String, i64) {
    (name.to_lowercase(), id)
}

fn sort_staff(staff: &mut [StaffSummary]) {
    staff.sort_by_cached_key(|s| name_key(&s.full_name, s.id));
}

fn sort_nodes(nodes: &mut [ProjectTeamNode]) {
    nodes.sort_by_cached_key(|n| name_key(&n.name, n.project_id));
}

/// Keep the first occurrence of each account id, preserving input order.
fn dedup_staff<'a>(staff: impl IntoIterator<Item = &'a StaffSummary>) -> Vec<StaffSummary> {
    let mut seen = HashSet::new();
    staff
        .into_iter()
        .filter(|s| seen.insert(s.id))
        .cloned()
        .collect()
}

// =============================================================================
// Team nodes
// =============================================================================

/// Build the team node for one project from the assignments and tasks that
/// belong to it.
pub fn build_project_node(
    project: &Project,
    assignments: &[&Assignment],
    tasks: &[&Task],
) -> ProjectTeamNode {
    let mut sub_admins = dedup_staff(
        assignments
            .iter()
            .filter(|a| a.assignment_role == Role::SubAdmin)
            .map(|a| &a.member),
    );
    let mut developers = dedup_staff(
        assignments
            .iter()
            .filter(|a| a.assignment_role == Role::Developer)
            .map(|a| &a.member),
    );
    sort_staff(&mut sub_admins);
    sort_staff(&mut developers);

    let total_tasks = tasks.len();
    let completed_tasks = tasks.iter().filter(|t| t.status == TaskStatus::Done).count();

    ProjectTeamNode {
        project_id: project.id,
        name: project.name.clone(),
        status: project.status,
        progress_percentage: project.progress_percentage,
        summary: project.summary.clone(),
        target_date: project.target_date,
        customer: project.client.clone(),
        sub_admins,
        developers,
        total_tasks,
        open_tasks: total_tasks - completed_tasks,
        completed_tasks,
    }
}

/// Team nodes for every project, keyed by project id.
///
/// Fails if any assignment or task points at a project missing from
/// `projects`.
pub fn build_team_nodes(
    projects: &[Project],
    assignments: &[Assignment],
    tasks: &[Task],
) -> Result<HashMap<i64, ProjectTeamNode>, CoreError> {
    let mut by_project: HashMap<i64, (Vec<&Assignment>, Vec<&Task>)> = projects
        .iter()
        .map(|p| (p.id, (Vec::new(), Vec::new())))
        .collect();

    for assignment in assignments {
        let entry = by_project.get_mut(&assignment.project_id).ok_or_else(|| {
            CoreError::ReferentialIntegrity(format!(
                "assignment {} references missing project {}",
                assignment.id, assignment.project_id
            ))
        })?;
        entry.0.push(assignment);
    }
    for task in tasks {
        let entry = by_project.get_mut(&task.project_id).ok_or_else(|| {
            CoreError::ReferentialIntegrity(format!(
                "task {} references missing project {}",
                task.id, task.project_id
            ))
        })?;
        entry.1.push(task);
    }

    Ok(projects
        .iter()
        .map(|p| {
            let node = match by_project.get(&p.id) {
                Some((a, t)) => build_project_node(p, a, t),
                None => build_project_node(p, &[], &[]),
            };
            (p.id, node)
        })
        .collect())
}

// =============================================================================
// Views
// =============================================================================

/// Build the organization-wide graph.
///
/// `sub_admins` and `developers` are every account holding those roles,
/// independent of whether they have assignments.
pub fn build_organization_tree(
    projects: &[Project],
    assignments: &[Assignment],
    tasks: &[Task],
    sub_admins: &[Account],
    developers: &[Account],
) -> Result<RelationshipGraph, CoreError> {
    let nodes = build_team_nodes(projects, assignments, tasks)?;

    let mut customer_trees: Vec<CustomerTree> = Vec::new();
    let mut tree_index: HashMap<i64, usize> = HashMap::new();
    let mut unassigned_projects = Vec::new();
    for project in projects {
        let Some(node) = nodes.get(&project.id).cloned() else {
            continue;
        };
        match &project.client {
            Some(client) => {
                let idx = *tree_index.entry(client.id).or_insert_with(|| {
                    customer_trees.push(CustomerTree {
                        customer: client.clone(),
                        projects: Vec::new(),
                    });
                    customer_trees.len() - 1
                });
                customer_trees[idx].projects.push(node);
            }
            None => unassigned_projects.push(node),
        }
    }
    for tree in &mut customer_trees {
        sort_nodes(&mut tree.projects);
    }
    customer_trees.sort_by_cached_key(|t| name_key(&t.customer.full_name, t.customer.id));
    sort_nodes(&mut unassigned_projects);

    let mut sub_admin_trees: Vec<SubAdminTree> = sub_admins
        .iter()
        .filter(|a| a.role == Role::SubAdmin)
        .map(|account| SubAdminTree {
            sub_admin: account.summary(),
            projects: nodes_reached_by(account.id, Role::SubAdmin, assignments, &nodes),
        })
        .collect();
    sub_admin_trees.sort_by_cached_key(|t| name_key(&t.sub_admin.full_name, t.sub_admin.id));

    let unassigned_sub_admins = unassigned_pool(sub_admins, Role::SubAdmin, assignments);
    let unassigned_developers = unassigned_pool(developers, Role::Developer, assignments);

    log::debug!(
        "Built organization graph: {} customer trees, {} sub-admin trees, {} unassigned projects",
        customer_trees.len(),
        sub_admin_trees.len(),
        unassigned_projects.len()
    );

    Ok(RelationshipGraph {
        customer_trees,
        sub_admin_trees,
        unassigned_sub_admins,
        unassigned_developers,
        unassigned_projects,
    })
}

/// Build one customer's tree from the projects they are client of.
///
/// Projects of other clients in the input are resolvable but ignored.
pub fn build_customer_tree(
    customer: &Account,
    projects: &[Project],
    assignments: &[Assignment],
    tasks: &[Task],
) -> Result<CustomerTree, CoreError> {
    let nodes = build_team_nodes(projects, assignments, tasks)?;
    let mut scoped: Vec<ProjectTeamNode> = projects
        .iter()
        .filter(|p| p.client_id() == Some(customer.id))
        .filter_map(|p| nodes.get(&p.id).cloned())
        .collect();
    sort_nodes(&mut scoped);
    Ok(CustomerTree {
        customer: customer.summary(),
        projects: scoped,
    })
}

/// Build one sub-admin's tree from their SUB_ADMIN assignments.
pub fn build_sub_admin_tree(
    sub_admin: &Account,
    projects: &[Project],
    assignments: &[Assignment],
    tasks: &[Task],
) -> Result<SubAdminTree, CoreError> {
    let nodes = build_team_nodes(projects, assignments, tasks)?;
    Ok(SubAdminTree {
        sub_admin: sub_admin.summary(),
        projects: nodes_reached_by(sub_admin.id, Role::SubAdmin, assignments, &nodes),
    })
}

/// Projects a member is assigned to, deduplicated, in assignment order.
pub fn projects_for_member(
    member_id: i64,
    assignments: &[Assignment],
    projects: &[Project],
) -> Result<Vec<Project>, CoreError> {
    let by_id: HashMap<i64, &Project> = projects.iter().map(|p| (p.id, p)).collect();
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for assignment in assignments.iter().filter(|a| a.member.id == member_id) {
        if !seen.insert(assignment.project_id) {
            continue;
        }
        let project = by_id.get(&assignment.project_id).ok_or_else(|| {
            CoreError::ReferentialIntegrity(format!(
                "assignment {} references missing project {}",
                assignment.id, assignment.project_id
            ))
        })?;
        out.push((*project).clone());
    }
    Ok(out)
}

/// Nodes reached from `member_id` through assignments of `role`, one per
/// project, sorted by name.
fn nodes_reached_by(
    member_id: i64,
    role: Role,
    assignments: &[Assignment],
    nodes: &HashMap<i64, ProjectTeamNode>,
) -> Vec<ProjectTeamNode> {
    let mut seen = HashSet::new();
    let mut reached: Vec<ProjectTeamNode> = assignments
        .iter()
        .filter(|a| a.member.id == member_id && a.assignment_role == role)
        .filter(|a| seen.insert(a.project_id))
        .filter_map(|a| nodes.get(&a.project_id).cloned())
        .collect();
    sort_nodes(&mut reached);
    reached
}

/// Accounts of `role` holding no assignment of that role.
fn unassigned_pool(accounts: &[Account], role: Role, assignments: &[Assignment]) -> Vec<StaffSummary> {
    let assigned: HashSet<i64> = assignments
        .iter()
        .filter(|a| a.assignment_role == role)
        .map(|a| a.member.id)
        .collect();
    let mut pool: Vec<StaffSummary> = accounts
        .iter()
        .filter(|a| a.role == role && !assigned.contains(&a.id))
        .map(Account::summary)
        .collect();
    let mut seen = HashSet::new();
    pool.retain(|s| seen.insert(s.id));
    sort_staff(&mut pool);
    pool
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::error::ErrorKind;

    fn names(staff: &[StaffSummary]) -> Vec<&str> {
        staff.iter().map(|s| s.full_name.as_str()).collect()
    }

    #[test]
    fn test_internal_project_team_node() {
        let bob = account(1, "Bob", Role::SubAdmin);
        let alice = account(2, "alice", Role::SubAdmin);
        let carol = account(3, "Carol", Role::Developer);
        let p = project(10, "P", None);
        let assignments = vec![
            assignment(1, 10, &bob),
            assignment(2, 10, &alice),
            assignment(3, 10, &carol),
        ];
        let tasks = vec![
            task(1, 10, TaskStatus::Done, None),
            task(2, 10, TaskStatus::Done, Some(&carol)),
            task(3, 10, TaskStatus::InProgress, Some(&carol)),
            task(4, 10, TaskStatus::Blocked, None),
        ];

        let graph = build_organization_tree(
            &[p],
            &assignments,
            &tasks,
            &[bob.clone(), alice.clone()],
            &[carol.clone()],
        )
        .expect("graph");

        assert!(graph.customer_trees.is_empty());
        assert_eq!(graph.unassigned_projects.len(), 1);
        let node = &graph.unassigned_projects[0];
        assert_eq!(names(&node.sub_admins), vec!["alice", "Bob"]);
        assert_eq!(names(&node.developers), vec!["Carol"]);
        assert_eq!(node.total_tasks, 4);
        assert_eq!(node.completed_tasks, 2);
        assert_eq!(node.open_tasks, 2);
        assert!(graph.unassigned_sub_admins.is_empty());
        assert!(graph.unassigned_developers.is_empty());
    }

    #[test]
    fn test_duplicate_assignment_rows_collapse() {
        let dev = account(3, "Carol", Role::Developer);
        let p = project(10, "P", None);
        let assignments = vec![assignment(1, 10, &dev), assignment(2, 10, &dev)];
        let nodes = build_team_nodes(&[p], &assignments, &[]).expect("nodes");
        assert_eq!(nodes[&10].developers.len(), 1);
    }

    #[test]
    fn test_customer_trees_grouped_and_sorted() {
        let zed = account(1, "Zed Corp", Role::Customer);
        let acme = account(2, "acme", Role::Customer);
        let projects = vec![
            project(10, "website", Some(&zed)),
            project(11, "App", Some(&zed)),
            project(12, "Billing", Some(&acme)),
            project(13, "Internal", None),
        ];
        let graph = build_organization_tree(&projects, &[], &[], &[], &[]).expect("graph");

        let customers: Vec<&str> = graph
            .customer_trees
            .iter()
            .map(|t| t.customer.full_name.as_str())
            .collect();
        assert_eq!(customers, vec!["acme", "Zed Corp"]);
        let zed_projects: Vec<&str> = graph.customer_trees[1]
            .projects
            .iter()
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(zed_projects, vec!["App", "website"]);
        assert_eq!(graph.unassigned_projects[0].name, "Internal");
    }

    #[test]
    fn test_idle_sub_admin_has_empty_tree_and_is_pooled() {
        let busy = account(1, "Busy", Role::SubAdmin);
        let idle = account(2, "Idle", Role::SubAdmin);
        let dev = account(3, "Dev", Role::Developer);
        let p = project(10, "P", None);
        let assignments = vec![assignment(1, 10, &busy)];

        let graph = build_organization_tree(
            &[p],
            &assignments,
            &[],
            &[busy.clone(), idle.clone()],
            &[dev.clone()],
        )
        .expect("graph");

        assert_eq!(names(&graph.unassigned_sub_admins), vec!["Idle"]);
        assert_eq!(names(&graph.unassigned_developers), vec!["Dev"]);
        let idle_tree = graph
            .sub_admin_trees
            .iter()
            .find(|t| t.sub_admin.id == idle.id)
            .expect("idle tree");
        assert!(idle_tree.projects.is_empty());
        let busy_tree = graph
            .sub_admin_trees
            .iter()
            .find(|t| t.sub_admin.id == busy.id)
            .expect("busy tree");
        assert_eq!(busy_tree.projects.len(), 1);
    }

    #[test]
    fn test_dangling_task_fails_fast() {
        let p = project(10, "P", None);
        let tasks = vec![task(1, 99, TaskStatus::Todo, None)];
        let err = build_organization_tree(&[p], &[], &tasks, &[], &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(matches!(err, CoreError::ReferentialIntegrity(_)));
    }

    #[test]
    fn test_single_entity_trees() {
        let customer = account(1, "Cora", Role::Customer);
        let other = account(2, "Olga", Role::Customer);
        let lead = account(3, "Lead", Role::SubAdmin);
        let projects = vec![
            project(10, "Mine", Some(&customer)),
            project(11, "Theirs", Some(&other)),
        ];
        let assignments = vec![assignment(1, 10, &lead), assignment(2, 11, &lead)];

        let tree = build_customer_tree(&customer, &projects, &assignments, &[]).expect("tree");
        assert_eq!(tree.projects.len(), 1);
        assert_eq!(tree.projects[0].name, "Mine");
        assert_eq!(names(&tree.projects[0].sub_admins), vec!["Lead"]);

        let sub_tree = build_sub_admin_tree(&lead, &projects, &assignments, &[]).expect("tree");
        let project_names: Vec<&str> = sub_tree.projects.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(project_names, vec!["Mine", "Theirs"]);
    }

    #[test]
    fn test_projects_for_member_dedups_in_order() {
        let dev = account(3, "Carol", Role::Developer);
        let projects = vec![project(10, "X", None), project(11, "Y", None)];
        let assignments = vec![
            assignment(1, 11, &dev),
            assignment(2, 10, &dev),
            assignment(3, 11, &dev),
        ];
        let reached = projects_for_member(dev.id, &assignments, &projects).expect("projects");
        let ids: Vec<i64> = reached.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![11, 10]);

        let err = projects_for_member(dev.id, &[assignment(4, 77, &dev)], &projects).unwrap_err();
        assert!(matches!(err, CoreError::ReferentialIntegrity(_)));
    }
}
