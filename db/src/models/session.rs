use chrono::{DateTime, Duration, Utc};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;
use sea_orm::{IntoActiveModel, QueryOrder};
use serde::Serialize;
use uuid::Uuid;

/// Durations a teacher may pick for an ordinary class session.
pub const STANDARD_DURATIONS: [i32; 2] = [30, 60];
/// Proxy lectures allow longer windows since the stand-in teacher may need
/// more time to get the code in front of the room.
pub const PROXY_DURATIONS: [i32; 4] = [30, 60, 120, 300];
/// Fallback when a request carries a duration outside the permitted set.
pub const DEFAULT_DURATION_SECONDS: i32 = 30;
/// Manual corrections are accepted for this long after session creation,
/// unless the session is locked earlier.
pub const REVIEW_WINDOW_MINUTES: i64 = 60;

/// One time-boxed attendance-collection window for a class meeting.
///
/// A session never transitions to "expired" in storage; expiry is always a
/// derived comparison of `expiry` against the caller's clock.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Opaque scan token, generated fresh per session and never reused.
    #[sea_orm(unique)]
    pub session_uuid: String,
    pub class_id: i64,
    /// The teacher who minted the session (for proxy lectures, the account
    /// that generated the code, not the stand-in named below).
    pub teacher_id: i64,
    pub duration_seconds: i32,
    pub expiry: DateTime<Utc>,
    pub locked: bool,
    pub is_proxy: bool,
    pub proxy_teacher_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::class::Entity",
        from = "Column::ClassId",
        to = "super::class::Column::Id"
    )]
    Class,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::TeacherId",
        to = "super::user::Column::Id"
    )]
    Teacher,
    #[sea_orm(has_many = "super::attendance_record::Entity")]
    Records,
}

impl Related<super::class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Class.def()
    }
}

impl Related<super::attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Outcome of a lock request. Locking twice is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOutcome {
    Locked,
    AlreadyLocked,
}

/// Coerces a requested duration into the permitted set for the session kind.
/// Out-of-set values fall back to the default rather than being rejected.
pub fn clamp_duration(requested: i32, is_proxy: bool) -> i32 {
    let permitted: &[i32] = if is_proxy {
        &PROXY_DURATIONS
    } else {
        &STANDARD_DURATIONS
    };
    if permitted.contains(&requested) {
        requested
    } else {
        DEFAULT_DURATION_SECONDS
    }
}

impl Model {
    /// Mints a new session for a class meeting.
    ///
    /// Opening a new session does not invalidate prior ones; several sessions
    /// for the same class may be redeemable at once (ad-hoc re-issuance).
    pub async fn create(
        db: &DatabaseConnection,
        class_id: i64,
        teacher_id: i64,
        requested_seconds: i32,
        is_proxy: bool,
        proxy_teacher_name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Self, DbErr> {
        let duration = clamp_duration(requested_seconds, is_proxy);
        let active = ActiveModel {
            id: NotSet,
            session_uuid: Set(Uuid::new_v4().to_string()),
            class_id: Set(class_id),
            teacher_id: Set(teacher_id),
            duration_seconds: Set(duration),
            expiry: Set(now + Duration::seconds(i64::from(duration))),
            locked: Set(false),
            is_proxy: Set(is_proxy),
            proxy_teacher_name: Set(proxy_teacher_name.map(|s| s.trim().to_owned())),
            created_at: Set(now),
            updated_at: Set(now),
        };
        active.insert(db).await
    }

    /// The scannable payload: `<uuid>|<expiry RFC3339>`. The token never
    /// contains a pipe, so the single separator is unambiguous.
    pub fn qr_payload(&self) -> String {
        format!("{}|{}", self.session_uuid, self.expiry.to_rfc3339())
    }

    pub async fn find_by_uuid(
        db: &DatabaseConnection,
        session_uuid: &str,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::SessionUuid.eq(session_uuid))
            .one(db)
            .await
    }

    pub async fn latest_for_class(
        db: &DatabaseConnection,
        class_id: i64,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::ClassId.eq(class_id))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .one(db)
            .await
    }

    /// Expiry is evaluated against the *stored* timestamp only; whatever a
    /// scanned payload claims is never trusted for the admit decision.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry < now
    }

    pub fn review_deadline(&self) -> DateTime<Utc> {
        self.created_at + Duration::minutes(REVIEW_WINDOW_MINUTES)
    }

    /// Whether manual overrides are still permitted.
    pub fn review_window_open(&self, now: DateTime<Utc>) -> bool {
        now <= self.review_deadline() && !self.locked
    }

    /// One-way transition closing the review window early. Idempotent.
    pub async fn lock(&self, db: &DatabaseConnection) -> Result<LockOutcome, DbErr> {
        if self.locked {
            return Ok(LockOutcome::AlreadyLocked);
        }
        let mut active = self.clone().into_active_model();
        active.locked = Set(true);
        active.updated_at = Set(Utc::now());
        active.update(db).await?;
        Ok(LockOutcome::Locked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factories;
    use crate::test_utils::setup_test_db;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_expiry_always_after_creation() {
        let db = setup_test_db().await;
        let (class, teacher) = factories::class_with_teacher(&db).await;

        let now = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        for requested in [30, 60, -5, 9999] {
            let s = Model::create(&db, class.id, teacher.id, requested, false, None, now)
                .await
                .unwrap();
            assert!(s.expiry > s.created_at);
        }
    }

    #[tokio::test]
    async fn test_duration_coercion() {
        assert_eq!(clamp_duration(60, false), 60);
        assert_eq!(clamp_duration(120, false), 30); // not permitted for ordinary sessions
        assert_eq!(clamp_duration(120, true), 120);
        assert_eq!(clamp_duration(300, true), 300);
        assert_eq!(clamp_duration(45, true), 30);
        assert_eq!(clamp_duration(0, false), 30);
    }

    #[tokio::test]
    async fn test_payload_round_trips_uuid_and_expiry() {
        let db = setup_test_db().await;
        let (class, teacher) = factories::class_with_teacher(&db).await;

        let now = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let s = Model::create(&db, class.id, teacher.id, 30, false, None, now)
            .await
            .unwrap();

        let payload = s.qr_payload();
        let (token, expiry_text) = payload.split_once('|').unwrap();
        assert_eq!(token, s.session_uuid);
        let parsed = DateTime::parse_from_rfc3339(expiry_text).unwrap();
        assert_eq!(parsed.with_timezone(&Utc), s.expiry);
    }

    #[tokio::test]
    async fn test_identifiers_never_repeat() {
        let db = setup_test_db().await;
        let (class, teacher) = factories::class_with_teacher(&db).await;
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();

        let a = Model::create(&db, class.id, teacher.id, 30, false, None, now)
            .await
            .unwrap();
        let b = Model::create(&db, class.id, teacher.id, 30, false, None, now)
            .await
            .unwrap();
        assert_ne!(a.session_uuid, b.session_uuid);
    }

    #[tokio::test]
    async fn test_lazy_expiry_predicate() {
        let db = setup_test_db().await;
        let (class, teacher) = factories::class_with_teacher(&db).await;

        let t0 = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let s = Model::create(&db, class.id, teacher.id, 30, false, None, t0)
            .await
            .unwrap();

        assert!(!s.is_expired(t0 + Duration::seconds(10)));
        assert!(!s.is_expired(t0 + Duration::seconds(30))); // boundary still admits
        assert!(s.is_expired(t0 + Duration::seconds(31)));
    }

    #[tokio::test]
    async fn test_lock_is_idempotent() {
        let db = setup_test_db().await;
        let (class, teacher) = factories::class_with_teacher(&db).await;
        let t0 = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();

        let s = Model::create(&db, class.id, teacher.id, 30, false, None, t0)
            .await
            .unwrap();
        assert_eq!(s.lock(&db).await.unwrap(), LockOutcome::Locked);

        let s = Model::find_by_uuid(&db, &s.session_uuid)
            .await
            .unwrap()
            .unwrap();
        assert!(s.locked);
        assert_eq!(s.lock(&db).await.unwrap(), LockOutcome::AlreadyLocked);
    }

    #[tokio::test]
    async fn test_review_window_closes_after_an_hour_or_lock() {
        let db = setup_test_db().await;
        let (class, teacher) = factories::class_with_teacher(&db).await;
        let t0 = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();

        let s = Model::create(&db, class.id, teacher.id, 30, false, None, t0)
            .await
            .unwrap();
        assert!(s.review_window_open(t0 + Duration::minutes(59)));
        assert!(s.review_window_open(t0 + Duration::minutes(60)));
        assert!(!s.review_window_open(t0 + Duration::minutes(61)));

        s.lock(&db).await.unwrap();
        let s = Model::find_by_uuid(&db, &s.session_uuid)
            .await
            .unwrap()
            .unwrap();
        // locked closes the window even while the hour is still running
        assert!(!s.review_window_open(t0 + Duration::minutes(5)));
    }
}
