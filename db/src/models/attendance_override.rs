use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;
use sea_orm::{QueryOrder, TransactionTrait};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use super::{attendance_record, session, user};

/// Audit entry for a manual attendance correction. Append-only: rows are
/// never mutated or deleted, and one row is written per correction that
/// actually changed state (silent no-ops are not audited).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "attendance_overrides")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub session_id: i64,
    pub student_id: i64,
    /// The teacher who made the correction.
    pub teacher_id: i64,
    pub action: Action,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "override_action_type")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Action {
    #[sea_orm(string_value = "mark_present")]
    MarkPresent,
    #[sea_orm(string_value = "mark_absent")]
    MarkAbsent,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::session::Entity",
        from = "Column::SessionId",
        to = "super::session::Column::Id"
    )]
    Session,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::StudentId",
        to = "super::user::Column::Id"
    )]
    Student,
}

impl Related<super::session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Whether a correction changed anything. `NoChange` writes no audit row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideOutcome {
    Applied,
    NoChange,
}

/// Expected override failures, each reported distinctly to the caller.
/// `NotAuthorized` (teacher/class mismatch) is enforced by the route layer's
/// ownership guard before this module is reached.
#[derive(Debug, Error)]
pub enum OverrideError {
    #[error("Review window has expired or session is locked.")]
    WindowClosed,
    #[error("Student not found in this class.")]
    StudentNotInClass,
    #[error(transparent)]
    Db(#[from] DbErr),
}

impl Model {
    /// Applies a manual correction to a session's attendance.
    ///
    /// Marking an already-present student present (or an absent one absent)
    /// is a silent no-op. Races with a concurrent self-service scan are
    /// last-writer-wins; each call is individually transactional but no
    /// cross-operation ordering is promised.
    pub async fn apply(
        db: &DatabaseConnection,
        sess: &session::Model,
        student_id: i64,
        teacher_id: i64,
        action: Action,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<OverrideOutcome, OverrideError> {
        if !sess.review_window_open(now) {
            return Err(OverrideError::WindowClosed);
        }

        let in_class = user::Entity::find_by_id(student_id)
            .one(db)
            .await?
            .map(|u| u.role == user::Role::Student && u.class_id == Some(sess.class_id))
            .unwrap_or(false);
        if !in_class {
            return Err(OverrideError::StudentNotInClass);
        }

        let txn = db.begin().await?;

        let existing = attendance_record::Entity::find_by_id((sess.id, student_id))
            .one(&txn)
            .await?;

        let outcome = match (action, existing) {
            (Action::MarkPresent, None) => {
                let record = attendance_record::ActiveModel {
                    session_id: Set(sess.id),
                    user_id: Set(student_id),
                    marked_at: Set(now),
                };
                record.insert(&txn).await?;
                Self::append(&txn, sess.id, student_id, teacher_id, action, reason, now).await?;
                OverrideOutcome::Applied
            }
            (Action::MarkAbsent, Some(record)) => {
                record.delete(&txn).await?;
                Self::append(&txn, sess.id, student_id, teacher_id, action, reason, now).await?;
                OverrideOutcome::Applied
            }
            _ => OverrideOutcome::NoChange,
        };

        txn.commit().await?;
        Ok(outcome)
    }

    async fn append<C: ConnectionTrait>(
        conn: &C,
        session_id: i64,
        student_id: i64,
        teacher_id: i64,
        action: Action,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, DbErr> {
        let active = ActiveModel {
            id: NotSet,
            session_id: Set(session_id),
            student_id: Set(student_id),
            teacher_id: Set(teacher_id),
            action: Set(action),
            reason: Set(reason.trim().to_owned()),
            created_at: Set(now),
        };
        active.insert(conn).await
    }

    pub async fn for_session(
        db: &DatabaseConnection,
        session_id: i64,
    ) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::SessionId.eq(session_id))
            .order_by_asc(Column::CreatedAt)
            .all(db)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factories;
    use crate::models::attendance_record::{Model as Record, RedeemSuccess};
    use crate::test_utils::setup_test_db;
    use chrono::{Duration, TimeZone};

    #[tokio::test]
    async fn test_mark_present_then_absent_with_audit_rows() {
        let db = setup_test_db().await;
        let (class, teacher) = factories::class_with_teacher(&db).await;
        let student = factories::student(&db, class.id, "2021001").await;

        let t0 = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let sess = session::Model::create(&db, class.id, teacher.id, 30, false, None, t0)
            .await
            .unwrap();

        let out = Model::apply(
            &db,
            &sess,
            student.id,
            teacher.id,
            Action::MarkPresent,
            "was in the lab",
            t0 + Duration::minutes(10),
        )
        .await
        .unwrap();
        assert_eq!(out, OverrideOutcome::Applied);
        assert!(Record::find(&db, sess.id, student.id).await.unwrap().is_some());

        let out = Model::apply(
            &db,
            &sess,
            student.id,
            teacher.id,
            Action::MarkAbsent,
            "scanned for a friend",
            t0 + Duration::minutes(20),
        )
        .await
        .unwrap();
        assert_eq!(out, OverrideOutcome::Applied);
        assert!(Record::find(&db, sess.id, student.id).await.unwrap().is_none());

        let audit = Model::for_session(&db, sess.id).await.unwrap();
        assert_eq!(audit.len(), 2);
        assert_eq!(audit[0].action, Action::MarkPresent);
        assert_eq!(audit[1].action, Action::MarkAbsent);
    }

    #[tokio::test]
    async fn test_no_op_absent_writes_no_audit_row() {
        let db = setup_test_db().await;
        let (class, teacher) = factories::class_with_teacher(&db).await;
        let student = factories::student(&db, class.id, "2021001").await;

        let t0 = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let sess = session::Model::create(&db, class.id, teacher.id, 30, false, None, t0)
            .await
            .unwrap();

        let out = Model::apply(
            &db,
            &sess,
            student.id,
            teacher.id,
            Action::MarkAbsent,
            "",
            t0 + Duration::minutes(1),
        )
        .await
        .unwrap();
        assert_eq!(out, OverrideOutcome::NoChange);
        assert!(Model::for_session(&db, sess.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_overrides_refused_after_lock_within_the_hour() {
        let db = setup_test_db().await;
        let (class, teacher) = factories::class_with_teacher(&db).await;
        let student = factories::student(&db, class.id, "2021001").await;

        let t0 = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let sess = session::Model::create(&db, class.id, teacher.id, 30, false, None, t0)
            .await
            .unwrap();

        // teacher locks five minutes in, well inside the hour
        sess.lock(&db).await.unwrap();
        let sess = session::Model::find_by_uuid(&db, &sess.session_uuid)
            .await
            .unwrap()
            .unwrap();

        let err = Model::apply(
            &db,
            &sess,
            student.id,
            teacher.id,
            Action::MarkPresent,
            "late arrival",
            t0 + Duration::minutes(10),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, OverrideError::WindowClosed));
    }

    #[tokio::test]
    async fn test_overrides_refused_once_window_elapsed() {
        let db = setup_test_db().await;
        let (class, teacher) = factories::class_with_teacher(&db).await;
        let student = factories::student(&db, class.id, "2021001").await;

        let t0 = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let sess = session::Model::create(&db, class.id, teacher.id, 30, false, None, t0)
            .await
            .unwrap();

        let err = Model::apply(
            &db,
            &sess,
            student.id,
            teacher.id,
            Action::MarkPresent,
            "",
            t0 + Duration::minutes(61),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, OverrideError::WindowClosed));
    }

    #[tokio::test]
    async fn test_student_from_other_class_rejected() {
        let db = setup_test_db().await;
        let (class, teacher) = factories::class_with_teacher(&db).await;
        let (other_class, _) = factories::class_with_teacher(&db).await;
        let outsider = factories::student(&db, other_class.id, "2021050").await;

        let t0 = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let sess = session::Model::create(&db, class.id, teacher.id, 30, false, None, t0)
            .await
            .unwrap();

        let err = Model::apply(
            &db,
            &sess,
            outsider.id,
            teacher.id,
            Action::MarkPresent,
            "",
            t0 + Duration::minutes(1),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, OverrideError::StudentNotInClass));
    }

    #[tokio::test]
    async fn test_override_after_scan_is_a_no_op_without_audit() {
        let db = setup_test_db().await;
        let (class, teacher) = factories::class_with_teacher(&db).await;
        let student = factories::student(&db, class.id, "2021001").await;

        let t0 = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let sess = session::Model::create(&db, class.id, teacher.id, 30, false, None, t0)
            .await
            .unwrap();

        let got = Record::redeem(&db, &sess.qr_payload(), student.id, t0 + Duration::seconds(5))
            .await
            .unwrap();
        assert!(matches!(got, RedeemSuccess::Recorded { .. }));

        let out = Model::apply(
            &db,
            &sess,
            student.id,
            teacher.id,
            Action::MarkPresent,
            "already scanned",
            t0 + Duration::minutes(2),
        )
        .await
        .unwrap();
        assert_eq!(out, OverrideOutcome::NoChange);
        assert!(Model::for_session(&db, sess.id).await.unwrap().is_empty());
    }
}
