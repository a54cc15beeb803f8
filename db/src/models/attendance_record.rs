use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{PaginatorTrait, TransactionTrait};
use serde::Serialize;
use thiserror::Error;

use super::{class, session};

/// Evidence that one student was present at one session.
///
/// The composite primary key is the storage-level uniqueness guarantee that
/// makes redemption idempotent: at most one record per (session, student).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "attendance_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub session_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    pub marked_at: DateTime<Utc>,
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
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Successful redemption. Callers present both cases identically; the split
/// only exists so the confirmation message can name the class on first scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedeemSuccess {
    Recorded { class_name: String },
    AlreadyRecorded,
}

/// Expected, recoverable redemption failures. Nothing is written on any of
/// these paths.
#[derive(Debug, Error)]
pub enum RedeemError {
    #[error("Invalid QR data.")]
    InvalidPayload,
    #[error("Malformed expiry in QR.")]
    MalformedExpiry,
    #[error("Session not found.")]
    SessionNotFound,
    #[error("Session expired.")]
    SessionExpired,
    #[error(transparent)]
    Db(#[from] DbErr),
}

fn is_unique_violation(err: &DbErr) -> bool {
    err.to_string().contains("UNIQUE constraint failed")
}

impl Model {
    /// Redeems a scanned payload for `user_id`, evaluated strictly in order:
    /// payload shape, expiry text, session existence, stored expiry, then an
    /// idempotent insert. The expiry embedded in the payload is informational
    /// only and never trusted for the admit decision.
    ///
    /// Locking does not gate this path; it only governs later human review.
    pub async fn redeem(
        db: &DatabaseConnection,
        qr_data: &str,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<RedeemSuccess, RedeemError> {
        let raw = qr_data.trim();
        if raw.is_empty() || raw.matches('|').count() != 1 {
            return Err(RedeemError::InvalidPayload);
        }
        let (token, expiry_text) = raw
            .split_once('|')
            .ok_or(RedeemError::InvalidPayload)?;

        if DateTime::parse_from_rfc3339(expiry_text).is_err() {
            return Err(RedeemError::MalformedExpiry);
        }

        let Some(sess) = session::Model::find_by_uuid(db, token).await? else {
            return Err(RedeemError::SessionNotFound);
        };

        if sess.is_expired(now) {
            return Err(RedeemError::SessionExpired);
        }

        let txn = db.begin().await.map_err(RedeemError::Db)?;

        if Entity::find_by_id((sess.id, user_id))
            .one(&txn)
            .await
            .map_err(RedeemError::Db)?
            .is_some()
        {
            txn.commit().await.map_err(RedeemError::Db)?;
            return Ok(RedeemSuccess::AlreadyRecorded);
        }

        let active = ActiveModel {
            session_id: Set(sess.id),
            user_id: Set(user_id),
            marked_at: Set(now),
        };
        match active.insert(&txn).await {
            Ok(_) => {
                let class_name = class::Entity::find_by_id(sess.class_id)
                    .one(&txn)
                    .await
                    .map_err(RedeemError::Db)?
                    .map(|c| c.name)
                    .unwrap_or_else(|| "Unknown Class".to_string());
                txn.commit().await.map_err(RedeemError::Db)?;
                Ok(RedeemSuccess::Recorded { class_name })
            }
            // A concurrent scan won the (session, user) primary-key race:
            // translate into the idempotent success instead of surfacing it.
            Err(e) if is_unique_violation(&e) => {
                let _ = txn.rollback().await;
                Ok(RedeemSuccess::AlreadyRecorded)
            }
            Err(e) => {
                let _ = txn.rollback().await;
                Err(RedeemError::Db(e))
            }
        }
    }

    pub async fn find(
        db: &DatabaseConnection,
        session_id: i64,
        user_id: i64,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find_by_id((session_id, user_id)).one(db).await
    }

    pub async fn count_for_session(db: &DatabaseConnection, session_id: i64) -> Result<u64, DbErr> {
        Entity::find()
            .filter(Column::SessionId.eq(session_id))
            .count(db)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factories;
    use crate::test_utils::setup_test_db;
    use chrono::{Duration, TimeZone};

    #[tokio::test]
    async fn test_redeem_then_duplicate_then_expiry() {
        let db = setup_test_db().await;
        let (class, teacher) = factories::class_with_teacher(&db).await;
        let student = factories::student(&db, class.id, "2021001").await;
        let other = factories::student(&db, class.id, "2021002").await;

        let t0 = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let sess = session::Model::create(&db, class.id, teacher.id, 30, false, None, t0)
            .await
            .unwrap();
        let payload = sess.qr_payload();

        // T0+10s: first scan records
        let got = Model::redeem(&db, &payload, student.id, t0 + Duration::seconds(10))
            .await
            .unwrap();
        assert_eq!(
            got,
            RedeemSuccess::Recorded {
                class_name: class.name.clone()
            }
        );

        // T0+15s: same student again succeeds without a second record
        let got = Model::redeem(&db, &payload, student.id, t0 + Duration::seconds(15))
            .await
            .unwrap();
        assert_eq!(got, RedeemSuccess::AlreadyRecorded);
        assert_eq!(Model::count_for_session(&db, sess.id).await.unwrap(), 1);

        // T0+31s: a different student is refused, session has lapsed
        let err = Model::redeem(&db, &payload, other.id, t0 + Duration::seconds(31))
            .await
            .unwrap_err();
        assert!(matches!(err, RedeemError::SessionExpired));
        assert_eq!(Model::count_for_session(&db, sess.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_malformed_payloads_write_nothing() {
        let db = setup_test_db().await;
        let (class, teacher) = factories::class_with_teacher(&db).await;
        let student = factories::student(&db, class.id, "2021001").await;

        let t0 = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let sess = session::Model::create(&db, class.id, teacher.id, 30, false, None, t0)
            .await
            .unwrap();

        let err = Model::redeem(&db, "no separator here", student.id, t0)
            .await
            .unwrap_err();
        assert!(matches!(err, RedeemError::InvalidPayload));

        let err = Model::redeem(&db, "", student.id, t0).await.unwrap_err();
        assert!(matches!(err, RedeemError::InvalidPayload));

        let err = Model::redeem(&db, "a|b|c", student.id, t0).await.unwrap_err();
        assert!(matches!(err, RedeemError::InvalidPayload));

        let payload = format!("{}|last tuesday", sess.session_uuid);
        let err = Model::redeem(&db, &payload, student.id, t0).await.unwrap_err();
        assert!(matches!(err, RedeemError::MalformedExpiry));

        let payload = format!("{}|{}", "not-a-real-token", sess.expiry.to_rfc3339());
        let err = Model::redeem(&db, &payload, student.id, t0).await.unwrap_err();
        assert!(matches!(err, RedeemError::SessionNotFound));

        assert_eq!(Model::count_for_session(&db, sess.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_stored_expiry_wins_over_embedded_expiry() {
        let db = setup_test_db().await;
        let (class, teacher) = factories::class_with_teacher(&db).await;
        let student = factories::student(&db, class.id, "2021001").await;

        let t0 = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let sess = session::Model::create(&db, class.id, teacher.id, 30, false, None, t0)
            .await
            .unwrap();

        // Forge a payload claiming the session is valid for another hour.
        let forged = format!(
            "{}|{}",
            sess.session_uuid,
            (t0 + Duration::hours(1)).to_rfc3339()
        );
        let err = Model::redeem(&db, &forged, student.id, t0 + Duration::seconds(31))
            .await
            .unwrap_err();
        assert!(matches!(err, RedeemError::SessionExpired));
    }

    #[tokio::test]
    async fn test_redemption_ignores_lock() {
        let db = setup_test_db().await;
        let (class, teacher) = factories::class_with_teacher(&db).await;
        let student = factories::student(&db, class.id, "2021001").await;

        let t0 = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let sess = session::Model::create(&db, class.id, teacher.id, 60, false, None, t0)
            .await
            .unwrap();
        sess.lock(&db).await.unwrap();

        // Locking governs review, not first-time self-service redemption.
        let got = Model::redeem(&db, &sess.qr_payload(), student.id, t0 + Duration::seconds(5))
            .await
            .unwrap();
        assert!(matches!(got, RedeemSuccess::Recorded { .. }));
    }
}
