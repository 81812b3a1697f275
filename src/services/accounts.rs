//! Account management: creation, self-registration, profile and role
//! changes, activation and deletion.

use crate::db::BackofficeDb;
use crate::error::CoreError;
use crate::policy;
use crate::roles::Role;
use crate::types::{Account, AccountUpdate, NewAccount, Principal};

use super::{non_blank, require_account};

fn normalized_email(email: &str) -> Result<String, CoreError> {
    let email = non_blank(email, "Email")?.to_lowercase();
    if !email.contains('@') {
        return Err(CoreError::invalid(format!("Invalid email address: {email}")));
    }
    Ok(email)
}

/// Insert after the uniqueness pre-check. The schema constraint still backs
/// it up for concurrent writers.
fn insert_unique(db: &BackofficeDb, full_name: &str, email: &str, role: Role) -> Result<Account, CoreError> {
    let full_name = non_blank(full_name, "Full name")?;
    let email = normalized_email(email)?;
    db.with_transaction(|tx| -> Result<Account, CoreError> {
        if tx.exists_by_email(&email)? {
            return Err(CoreError::invalid(format!("Email already registered: {email}")));
        }
        Ok(tx.insert_account(&NewAccount {
            full_name,
            email,
            role,
        })?)
    })
}

/// Create an account on behalf of `actor`.
pub fn create_account(
    db: &BackofficeDb,
    actor: &Principal,
    request: &NewAccount,
) -> Result<Account, CoreError> {
    if let Err(e) = policy::may_create(actor.role, request.role) {
        log::warn!("Account {} denied creating a {} account", actor.id, request.role);
        return Err(e);
    }
    let account = insert_unique(db, &request.full_name, &request.email, request.role)?;
    log::info!(
        "Account {} created {} account {}",
        actor.id,
        account.role,
        account.id
    );
    Ok(account)
}

/// Self-registration. Always creates a CUSTOMER.
pub fn register_customer(db: &BackofficeDb, full_name: &str, email: &str) -> Result<Account, CoreError> {
    let account = insert_unique(db, full_name, email, Role::Customer)?;
    log::info!("Customer {} registered", account.id);
    Ok(account)
}

/// Create a sub-admin or developer account.
pub fn provision_staff(
    db: &BackofficeDb,
    actor: &Principal,
    request: &NewAccount,
) -> Result<Account, CoreError> {
    if !request.role.is_staff() {
        return Err(CoreError::invalid(
            "Staff accounts must be SUB_ADMIN or DEVELOPER.",
        ));
    }
    create_account(db, actor, request)
}

/// Return the account registered under `email`, creating a SUPER_ADMIN if
/// none exists. Used to bootstrap a fresh database.
pub fn ensure_super_admin(db: &BackofficeDb, full_name: &str, email: &str) -> Result<Account, CoreError> {
    let full_name = non_blank(full_name, "Full name")?;
    let email = normalized_email(email)?;
    let (account, created) = db.with_transaction(|tx| -> Result<(Account, bool), CoreError> {
        if let Some(existing) = tx.get_account_by_email(&email)? {
            return Ok((existing, false));
        }
        let account = tx.insert_account(&NewAccount {
            full_name,
            email,
            role: Role::SuperAdmin,
        })?;
        Ok((account, true))
    })?;
    if created {
        log::info!("Bootstrapped super-admin account {}", account.id);
    } else if account.role != Role::SuperAdmin {
        log::warn!(
            "Bootstrap email belongs to existing {} account {}",
            account.role,
            account.id
        );
    }
    Ok(account)
}

/// Update profile fields and, when requested, the role of `target_id`.
///
/// A role change is refused while the account still holds project
/// assignments under another role.
pub fn update_account(
    db: &BackofficeDb,
    actor: &Principal,
    target_id: i64,
    update: &AccountUpdate,
) -> Result<Account, CoreError> {
    let account = db.with_transaction(|tx| -> Result<Account, CoreError> {
        let target = require_account(tx, target_id)?;
        policy::may_manage(actor, &target.principal())?;

        let mut effective = AccountUpdate::default();

        if let Some(name) = update.full_name.as_deref() {
            let name = name.trim();
            if !name.is_empty() {
                effective.full_name = Some(name.to_string());
            }
        }

        if let Some(email) = update.email.as_deref() {
            let email = normalized_email(email)?;
            if email != target.email.to_lowercase() {
                if tx.exists_by_email(&email)? {
                    return Err(CoreError::invalid(format!(
                        "Email already registered: {email}"
                    )));
                }
                effective.email = Some(email);
            }
        }

        if let Some(role) = update.role {
            if role != target.role {
                policy::may_transition_role(actor, &target.principal(), role)?;
                // Assignment roles must keep matching the member's role.
                let held = tx
                    .assignments_for_member(target_id)?
                    .into_iter()
                    .filter(|a| a.assignment_role != role)
                    .count();
                if held > 0 {
                    return Err(CoreError::invalid(format!(
                        "Account {target_id} still holds {held} project assignment(s) as {}; \
                         remove them before changing its role",
                        target.role
                    )));
                }
                effective.role = Some(role);
            }
        }

        tx.update_account_fields(target_id, &effective)?;
        require_account(tx, target_id)
    });

    match &account {
        Ok(updated) => log::info!("Account {} updated account {}", actor.id, updated.id),
        Err(CoreError::PermissionDenied { reason }) => {
            log::warn!("Account {} denied updating {}: {}", actor.id, target_id, reason.code())
        }
        Err(_) => {}
    }
    account
}

/// Activate or deactivate `target_id`.
pub fn set_account_active(
    db: &BackofficeDb,
    actor: &Principal,
    target_id: i64,
    active: bool,
) -> Result<Account, CoreError> {
    let account = db.with_transaction(|tx| -> Result<Account, CoreError> {
        let target = require_account(tx, target_id)?;
        policy::may_manage(actor, &target.principal())?;
        tx.set_account_active(target_id, active)?;
        require_account(tx, target_id)
    })?;
    log::info!(
        "Account {} set account {} active={}",
        actor.id,
        target_id,
        active
    );
    Ok(account)
}

/// Delete `target_id`. Assignments and notifications go with it.
pub fn delete_account(db: &BackofficeDb, actor: &Principal, target_id: i64) -> Result<(), CoreError> {
    db.with_transaction(|tx| -> Result<(), CoreError> {
        let target = require_account(tx, target_id)?;
        policy::may_delete(actor, &target.principal())?;
        tx.delete_account(target_id)?;
        Ok(())
    })?;
    log::info!("Account {} deleted account {}", actor.id, target_id);
    Ok(())
}

/// Sub-admins and developers, ordered by name.
pub fn list_staff(db: &BackofficeDb) -> Result<Vec<Account>, CoreError> {
    db.with_snapshot(|snap| -> Result<Vec<Account>, CoreError> {
        let mut staff = snap.accounts_by_role(Role::SubAdmin)?;
        staff.extend(snap.accounts_by_role(Role::Developer)?);
        staff.sort_by_cached_key(|a| (a.full_name.to_lowercase(), a.id));
        Ok(staff)
    })
}

pub fn list_by_role(db: &BackofficeDb, role: Role) -> Result<Vec<Account>, CoreError> {
    Ok(db.accounts_by_role(role)?)
}
