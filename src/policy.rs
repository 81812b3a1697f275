//! Authorization policy for every mutating and view-scoped operation.
//!
//! All functions are pure: they look only at the roles and ids passed in and
//! return `Ok(())` or the denial. Callers evaluate the relevant check before
//! touching storage and stop on the first error.

use crate::error::{CoreError, DenialReason};
use crate::roles::Role;
use crate::types::Principal;

/// May `actor_role` create an account with `requested`?
pub fn may_create(actor_role: Role, requested: Role) -> Result<(), CoreError> {
    match actor_role {
        Role::SuperAdmin => Ok(()),
        Role::SubAdmin if requested.is_sub_admin_manageable() => Ok(()),
        Role::SubAdmin => Err(CoreError::denied(DenialReason::CreateRoleNotAllowed)),
        Role::Developer | Role::Customer => {
            Err(CoreError::denied(DenialReason::CreateNotPrivileged))
        }
    }
}

/// May `actor` update profile fields or the active flag of `target`?
pub fn may_manage(actor: &Principal, target: &Principal) -> Result<(), CoreError> {
    if actor.id == target.id {
        return Ok(());
    }
    if target.role == Role::SuperAdmin && actor.role != Role::SuperAdmin {
        return Err(CoreError::denied(DenialReason::SuperAdminProtected));
    }
    match actor.role {
        Role::SuperAdmin => Ok(()),
        Role::SubAdmin if target.role.is_sub_admin_manageable() => Ok(()),
        Role::SubAdmin => Err(CoreError::denied(DenialReason::SubAdminManageScope)),
        Role::Developer | Role::Customer => {
            Err(CoreError::denied(DenialReason::ManageNotPrivileged))
        }
    }
}

/// May `actor` delete `target`? Self-deletion is never allowed.
pub fn may_delete(actor: &Principal, target: &Principal) -> Result<(), CoreError> {
    if actor.id == target.id {
        return Err(CoreError::invalid("You cannot delete your own account."));
    }
    if target.role == Role::SuperAdmin && actor.role != Role::SuperAdmin {
        return Err(CoreError::denied(DenialReason::DeleteSuperAdmin));
    }
    if actor.role != Role::SuperAdmin {
        return Err(CoreError::denied(DenialReason::DeleteNotPrivileged));
    }
    Ok(())
}

/// May `actor` move `target` from its current role to `requested`?
pub fn may_transition_role(
    actor: &Principal,
    target: &Principal,
    requested: Role,
) -> Result<(), CoreError> {
    if (target.role == Role::SuperAdmin || requested == Role::SuperAdmin)
        && actor.role != Role::SuperAdmin
    {
        return Err(CoreError::denied(DenialReason::SuperAdminRoleChange));
    }
    match actor.role {
        Role::SuperAdmin => Ok(()),
        Role::SubAdmin
            if target.role.is_sub_admin_manageable() && requested.is_sub_admin_manageable() =>
        {
            Ok(())
        }
        Role::SubAdmin => Err(CoreError::denied(DenialReason::SubAdminRoleScope)),
        Role::Developer | Role::Customer => {
            Err(CoreError::denied(DenialReason::RoleChangeNotPrivileged))
        }
    }
}

/// Does an assignment of `assignment_role` fit a member whose account role
/// is `member_role`?
pub fn may_assign_to_project(assignment_role: Role, member_role: Role) -> Result<(), CoreError> {
    if !assignment_role.can_hold_assignment() {
        return Err(CoreError::InvalidAssignment(
            "Assignments only support SUB_ADMIN or DEVELOPER roles".to_string(),
        ));
    }
    if assignment_role != member_role {
        return Err(CoreError::InvalidAssignment(format!(
            "User role mismatch: expected {} but was {}",
            assignment_role, member_role
        )));
    }
    Ok(())
}

// =============================================================================
// View and project-scope checks
// =============================================================================

pub fn may_view_organization_tree(actor: &Principal) -> Result<(), CoreError> {
    if actor.role == Role::SuperAdmin {
        Ok(())
    } else {
        Err(CoreError::denied(DenialReason::OrganizationTreeRestricted))
    }
}

pub fn may_view_customer_tree(actor: &Principal, customer_id: i64) -> Result<(), CoreError> {
    if actor.id == customer_id || actor.role != Role::Customer {
        Ok(())
    } else {
        Err(CoreError::denied(DenialReason::CustomerTreeScope))
    }
}

pub fn may_view_sub_admin_tree(actor: &Principal, sub_admin_id: i64) -> Result<(), CoreError> {
    match actor.role {
        Role::SuperAdmin => Ok(()),
        Role::SubAdmin if actor.id == sub_admin_id => Ok(()),
        Role::SubAdmin => Err(CoreError::denied(DenialReason::SubAdminTreeScope)),
        Role::Developer | Role::Customer => Err(CoreError::denied(DenialReason::AdminOnly)),
    }
}

/// Project updates, task administration, assignment listings.
pub fn may_administer_projects(actor: &Principal) -> Result<(), CoreError> {
    if actor.role.is_admin() {
        Ok(())
    } else {
        Err(CoreError::denied(DenialReason::AdminOnly))
    }
}

/// Creating and removing project assignments.
pub fn may_manage_assignments(actor: &Principal) -> Result<(), CoreError> {
    if actor.role == Role::SuperAdmin {
        Ok(())
    } else {
        Err(CoreError::denied(DenialReason::AssignmentAdminOnly))
    }
}

/// May `actor` read a project's board? `is_member` is whether the actor holds
/// an assignment on the project, `is_client` whether the actor is its client.
pub fn may_view_project(actor: &Principal, is_member: bool, is_client: bool) -> Result<(), CoreError> {
    match actor.role {
        Role::SuperAdmin | Role::SubAdmin => Ok(()),
        Role::Developer if is_member => Ok(()),
        Role::Developer => Err(CoreError::denied(DenialReason::NotAssignedToProject)),
        Role::Customer if is_client => Ok(()),
        Role::Customer => Err(CoreError::denied(DenialReason::NotProjectClient)),
    }
}

/// May `actor` create or edit a task on a project, assigning it to
/// `requested_assignee`?
pub fn may_edit_task(
    actor: &Principal,
    is_member: bool,
    requested_assignee: Option<i64>,
) -> Result<(), CoreError> {
    match actor.role {
        Role::SuperAdmin | Role::SubAdmin => Ok(()),
        Role::Developer if !is_member => Err(CoreError::denied(DenialReason::NotAssignedToProject)),
        Role::Developer => match requested_assignee {
            Some(id) if id != actor.id => Err(CoreError::denied(DenialReason::SelfAssignmentOnly)),
            _ => Ok(()),
        },
        Role::Customer => Err(CoreError::denied(DenialReason::TaskEditNotAllowed)),
    }
}
