//! Authorization predicates invoked by the coordinator before any mutating
//! or sensitive read operation. Pure checks; the advisor relationship is the
//! one delegation to the directory collaborator.
//!
//! All failures map to `Forbidden` with a generic message so responses never
//! reveal ownership or role information.

use uuid::Uuid;

use crate::domain::{Actor, AchievementReference, Role};
use crate::services::error::AchievementError;
use crate::store::AdvisorDirectory;

pub fn ensure_role(actor: &Actor, role: Role) -> Result<(), AchievementError> {
    if actor.role == role {
        Ok(())
    } else {
        Err(AchievementError::Forbidden)
    }
}

/// The student id linked to this actor's account, or Forbidden when the
/// session claims carry none.
pub fn student_identity(actor: &Actor) -> Result<Uuid, AchievementError> {
    actor.student_id.ok_or(AchievementError::Forbidden)
}

/// Ownership check against the authoritative reference row.
pub fn ensure_owner(
    actor: &Actor,
    reference: &AchievementReference,
) -> Result<(), AchievementError> {
    match actor.student_id {
        Some(student_id) if student_id == reference.student_id => Ok(()),
        _ => Err(AchievementError::Forbidden),
    }
}

pub async fn ensure_advisor_of(
    directory: &dyn AdvisorDirectory,
    actor: &Actor,
    student_id: Uuid,
) -> Result<(), AchievementError> {
    let related = directory
        .is_advisor_of(actor.user_id, student_id)
        .await
        .map_err(|e| AchievementError::Storage(e.to_string()))?;
    if related {
        Ok(())
    } else {
        Err(AchievementError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AchievementStatus;
    use chrono::Utc;

    fn reference_owned_by(student_id: Uuid) -> AchievementReference {
        let now = Utc::now();
        AchievementReference {
            id: Uuid::new_v4(),
            student_id,
            detail_ref: "64f000000000000000000001".to_string(),
            status: AchievementStatus::Draft,
            submitted_at: None,
            verified_at: None,
            verified_by: None,
            rejection_note: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn role_mismatch_is_forbidden() {
        let advisor = Actor::advisor(Uuid::new_v4());
        assert!(ensure_role(&advisor, Role::Advisor).is_ok());
        assert!(matches!(
            ensure_role(&advisor, Role::Student),
            Err(AchievementError::Forbidden)
        ));
    }

    #[test]
    fn owner_check_requires_matching_student_id() {
        let sid = Uuid::new_v4();
        let reference = reference_owned_by(sid);

        let owner = Actor::student(Uuid::new_v4(), sid);
        assert!(ensure_owner(&owner, &reference).is_ok());

        let stranger = Actor::student(Uuid::new_v4(), Uuid::new_v4());
        assert!(matches!(
            ensure_owner(&stranger, &reference),
            Err(AchievementError::Forbidden)
        ));

        // An actor with no linked student can never own anything
        let admin = Actor::admin(Uuid::new_v4());
        assert!(matches!(
            ensure_owner(&admin, &reference),
            Err(AchievementError::Forbidden)
        ));
    }

    #[test]
    fn student_identity_missing_is_forbidden() {
        let admin = Actor::admin(Uuid::new_v4());
        assert!(matches!(student_identity(&admin), Err(AchievementError::Forbidden)));

        let sid = Uuid::new_v4();
        let student = Actor::student(Uuid::new_v4(), sid);
        assert_eq!(student_identity(&student).unwrap(), sid);
    }
}
