//! Inbound inquiries from prospective customers.

use crate::db::BackofficeDb;
use crate::error::CoreError;
use crate::policy;
use crate::types::{Inquiry, InquiryStatus, NewInquiry, Principal};

use super::{non_blank, require_project};

/// Record a public inquiry in status NEW. A project link must resolve.
pub fn create_inquiry(db: &BackofficeDb, request: &NewInquiry) -> Result<Inquiry, CoreError> {
    let request = NewInquiry {
        full_name: non_blank(&request.full_name, "Full name")?,
        email: non_blank(&request.email, "Email")?,
        message: non_blank(&request.message, "Message")?,
        ..request.clone()
    };
    let inquiry = db.with_transaction(|tx| -> Result<Inquiry, CoreError> {
        if let Some(project_id) = request.project_id {
            require_project(tx, project_id)?;
        }
        Ok(tx.insert_inquiry(&request)?)
    })?;
    log::info!("Recorded inquiry {} from {}", inquiry.id, inquiry.email);
    Ok(inquiry)
}

/// Every inquiry, newest first.
pub fn list_inquiries(db: &BackofficeDb, actor: &Principal) -> Result<Vec<Inquiry>, CoreError> {
    policy::may_administer_projects(actor)?;
    Ok(db.all_inquiries()?)
}

pub fn update_inquiry(
    db: &BackofficeDb,
    actor: &Principal,
    inquiry_id: i64,
    status: InquiryStatus,
    assigned_to: Option<&str>,
) -> Result<Inquiry, CoreError> {
    policy::may_administer_projects(actor)?;
    let inquiry = db.with_transaction(|tx| -> Result<Inquiry, CoreError> {
        if !tx.update_inquiry_status(inquiry_id, status, assigned_to)? {
            return Err(CoreError::not_found("Inquiry", inquiry_id));
        }
        tx.get_inquiry(inquiry_id)?
            .ok_or_else(|| CoreError::not_found("Inquiry", inquiry_id))
    })?;
    log::info!("Inquiry {} moved to {}", inquiry.id, inquiry.status);
    Ok(inquiry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::{seed_account, seed_project, test_db};
    use crate::error::ErrorKind;
    use crate::roles::Role;
    use crate::services::test_support::root;

    fn request(project_id: Option<i64>) -> NewInquiry {
        NewInquiry {
            full_name: "Pat Prospect".into(),
            email: " Pat@Example.com ".into(),
            phone: None,
            company: Some("Acme".into()),
            message: "We need a portal.".into(),
            source: Some("website".into()),
            project_id,
        }
    }

    #[test]
    fn test_create_inquiry() {
        let db = test_db();
        let project = seed_project(&db, "Portal", None);
        let inquiry = create_inquiry(&db, &request(Some(project.id))).expect("create");
        assert_eq!(inquiry.status, InquiryStatus::New);
        assert_eq!(inquiry.email, "pat@example.com");
        assert_eq!(inquiry.project_id, Some(project.id));

        let err = create_inquiry(&db, &request(Some(404))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_update_inquiry_is_admin_only() {
        let db = test_db();
        let (_, admin) = root(&db);
        let dev = seed_account(&db, "Dev", Role::Developer);
        let inquiry = create_inquiry(&db, &request(None)).expect("create");

        let err = update_inquiry(&db, &dev.principal(), inquiry.id, InquiryStatus::Won, None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);

        let updated = update_inquiry(&db, &admin, inquiry.id, InquiryStatus::Quoted, Some("Root"))
            .expect("update");
        assert_eq!(updated.status, InquiryStatus::Quoted);
        assert_eq!(updated.assigned_to.as_deref(), Some("Root"));
        assert_eq!(list_inquiries(&db, &admin).expect("list").len(), 1);
        assert_eq!(
            update_inquiry(&db, &admin, 404, InquiryStatus::Lost, None)
                .unwrap_err()
                .kind(),
            ErrorKind::NotFound
        );
    }
}
