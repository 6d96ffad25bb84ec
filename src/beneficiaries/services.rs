use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::beneficiaries::dto::{
    CreateBeneficiaryRequest, ListParams, ListResponse, Page, PageInfo, RegisteredListResponse,
    UpdateBeneficiaryRequest,
};
use crate::beneficiaries::filter::{BeneficiaryQuery, Column};
use crate::beneficiaries::repo;
use crate::beneficiaries::repo_types::Beneficiary;
use crate::beneficiaries::user_id;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Trims the value; blank becomes `None`.
fn normalize(value: &mut Option<String>) {
    *value = value
        .take()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
}

fn normalize_email(email: &mut Option<String>) -> AppResult<()> {
    normalize(email);
    if let Some(e) = email.as_mut() {
        *e = e.to_lowercase();
        if !is_valid_email(e) {
            return Err(AppError::Validation("Invalid email".into()));
        }
    }
    Ok(())
}

pub(crate) fn validate_create(req: &mut CreateBeneficiaryRequest) -> AppResult<()> {
    req.names = req.names.trim().to_string();
    req.lga = req.lga.trim().to_string();
    if req.names.is_empty() {
        return Err(AppError::Validation("names is required".into()));
    }
    if req.lga.is_empty() {
        return Err(AppError::Validation("lga is required".into()));
    }
    normalize_email(&mut req.email)?;
    normalize(&mut req.phone_number);
    normalize(&mut req.id_number);
    Ok(())
}

pub(crate) fn validate_update(req: &mut UpdateBeneficiaryRequest) -> AppResult<()> {
    if let Some(names) = req.names.as_mut() {
        *names = names.trim().to_string();
        if names.is_empty() {
            return Err(AppError::Validation("names cannot be empty".into()));
        }
    }
    normalize_email(&mut req.email)?;
    normalize(&mut req.phone_number);
    normalize(&mut req.id_number);
    Ok(())
}

/// Registers a beneficiary and allocates its `userId`.
///
/// Phone and ID numbers are checked first; a duplicate stops the request
/// before anything is allocated. Allocation and insert share one
/// transaction serialized per year prefix, so a failure leaves nothing
/// behind.
pub async fn create(st: &AppState, mut req: CreateBeneficiaryRequest) -> AppResult<Beneficiary> {
    validate_create(&mut req)?;

    if let Some(phone) = req.phone_number.as_deref() {
        if repo::value_taken(&st.db, Column::PhoneNumber, phone, None).await? {
            warn!(phone, "phone number already registered");
            return Err(AppError::Conflict(
                "Phone number already exists. Please use another".into(),
            ));
        }
    }
    if let Some(id_number) = req.id_number.as_deref() {
        if repo::value_taken(&st.db, Column::IdNumber, id_number, None).await? {
            warn!(id_number, "id number already registered");
            return Err(AppError::Conflict(
                "Id number already exists. Please use another".into(),
            ));
        }
    }

    let year = st.clock.now().year();
    let created = allocate_and_insert(st, year, &req).await.map_err(|e| {
        if repo::is_unique_violation(&e) {
            warn!(error = %e, "user id collision, transaction rolled back");
        } else {
            error!(error = %e, "create transaction rolled back");
        }
        AppError::Allocation(e)
    })?;

    info!(id = %created.id, user_id = %created.user_id, "beneficiary registered");
    Ok(created)
}

async fn allocate_and_insert(
    st: &AppState,
    year: i32,
    req: &CreateBeneficiaryRequest,
) -> anyhow::Result<Beneficiary> {
    let prefix = user_id::year_prefix(year);

    // Dropping `tx` on any early return rolls everything back.
    let mut tx = st.db.begin().await?;
    repo::lock_prefix_tx(&mut tx, &prefix).await?;
    let last = repo::last_user_id_tx(&mut tx, &prefix).await?;
    let new_id = user_id::next_user_id(last.as_deref(), year, &req.lga)?;
    let created = repo::insert_tx(&mut tx, &new_id, req).await?;
    tx.commit().await?;
    Ok(created)
}

/// Applies a partial update after checking email, phone and ID number
/// against every other record.
pub async fn update(st: &AppState, id: Uuid, mut req: UpdateBeneficiaryRequest) -> AppResult<Beneficiary> {
    validate_update(&mut req)?;

    let checks = [
        (Column::Email, &req.email, "Email is already in use by another user"),
        (Column::PhoneNumber, &req.phone_number, "Phone number is already in use by another user"),
        (Column::IdNumber, &req.id_number, "Id number is already in use by another user"),
    ];
    for (column, value, message) in checks {
        let Some(value) = value.as_deref() else {
            continue;
        };
        if repo::value_taken(&st.db, column, value, Some(id)).await? {
            warn!(%id, field = column.as_sql(), "update would duplicate another record");
            return Err(AppError::Conflict(message.into()));
        }
    }

    let updated = repo::update(&st.db, id, &req)
        .await?
        .ok_or_else(|| AppError::NotFound("No document found with that ID".into()))?;
    info!(%id, user_id = %updated.user_id, "beneficiary updated");
    Ok(updated)
}

pub async fn get(st: &AppState, id: Uuid) -> AppResult<Beneficiary> {
    repo::find_by_id(&st.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("No document found with that ID".into()))
}

pub async fn search(st: &AppState, term: Option<&str>) -> AppResult<Beneficiary> {
    let term = term.map(str::trim).filter(|t| !t.is_empty()).ok_or_else(|| {
        AppError::Validation("Please provide a search term (email, phone number or userId)".into())
    })?;
    repo::find_by_contact(&st.db, term).await?.ok_or_else(|| {
        AppError::NotFound("No user found with this user id, email or phone number".into())
    })
}

pub async fn delete(st: &AppState, id: Uuid) -> AppResult<()> {
    if !repo::delete(&st.db, id).await? {
        return Err(AppError::NotFound("No document found with that ID".into()));
    }
    info!(%id, "beneficiary deleted");
    Ok(())
}

pub async fn list_directory(st: &AppState, params: &ListParams) -> AppResult<ListResponse> {
    let query = BeneficiaryQuery::directory(params)?;
    let page = Page::new(params.page);
    let total = repo::count(&st.db, &query).await?;
    let users = repo::list_page(&st.db, &query, page).await?;
    Ok(ListResponse {
        users,
        pagination: PageInfo::new(page, total),
    })
}

pub async fn list_registered(st: &AppState, params: &ListParams) -> AppResult<RegisteredListResponse> {
    let query = BeneficiaryQuery::registered(params)?;
    let page = Page::new(params.page);
    let total = repo::count(&st.db, &query).await?;
    let users = repo::list_page(&st.db, &query, page).await?;
    Ok(RegisteredListResponse {
        users,
        filtered_users: total,
        pagination: PageInfo::new(page, total),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use sqlx::PgPool;
    use time::macros::datetime;

    use super::*;
    use crate::clock::FixedClock;

    fn create_req() -> CreateBeneficiaryRequest {
        CreateBeneficiaryRequest {
            names: "  Amina Bello ".into(),
            lga: " Lagos State ".into(),
            email: Some(" Amina@Example.COM ".into()),
            phone_number: Some(" 08030000000 ".into()),
            id_number: Some("   ".into()),
            ..Default::default()
        }
    }

    #[test]
    fn create_input_is_normalized() {
        let mut req = create_req();
        validate_create(&mut req).unwrap();
        assert_eq!(req.names, "Amina Bello");
        assert_eq!(req.lga, "Lagos State");
        assert_eq!(req.email.as_deref(), Some("amina@example.com"));
        assert_eq!(req.phone_number.as_deref(), Some("08030000000"));
        assert_eq!(req.id_number, None);
    }

    #[test]
    fn create_requires_names_and_lga() {
        let mut req = CreateBeneficiaryRequest {
            lga: "Ikeja".into(),
            ..Default::default()
        };
        assert!(matches!(validate_create(&mut req), Err(AppError::Validation(_))));

        let mut req = CreateBeneficiaryRequest {
            names: "Ada".into(),
            lga: "  ".into(),
            ..Default::default()
        };
        assert!(matches!(validate_create(&mut req), Err(AppError::Validation(_))));
    }

    #[test]
    fn invalid_email_is_rejected() {
        let mut req = UpdateBeneficiaryRequest {
            email: Some("not-an-email".into()),
            ..Default::default()
        };
        assert!(matches!(validate_update(&mut req), Err(AppError::Validation(_))));
    }

    #[test]
    fn update_rejects_blank_names() {
        let mut req = UpdateBeneficiaryRequest {
            names: Some(" ".into()),
            ..Default::default()
        };
        assert!(validate_update(&mut req).is_err());
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.d"));
    }

    fn store(db: PgPool) -> AppState {
        AppState::with_pool(db, Arc::new(FixedClock(datetime!(2025-03-14 12:00 UTC))))
    }

    fn registration(names: &str, lga: &str, phone: Option<&str>) -> CreateBeneficiaryRequest {
        CreateBeneficiaryRequest {
            names: names.into(),
            lga: lga.into(),
            phone_number: phone.map(Into::into),
            ..Default::default()
        }
    }

    async fn row_count(db: &PgPool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM beneficiaries")
            .fetch_one(db)
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn identifiers_continue_the_year_sequence(db: PgPool) {
        let st = store(db);
        let first = create(&st, registration("Amina Bello", "Lagos State", None)).await.unwrap();
        let second = create(&st, registration("Tunde Ade", "Lagos State", None)).await.unwrap();
        assert_eq!(first.user_id, "ISM/B2-25/LS/0001");
        assert_eq!(second.user_id, "ISM/B2-25/LS/0002");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn duplicate_phone_or_id_number_stops_creation(db: PgPool) {
        let st = store(db.clone());
        let mut first = registration("Amina Bello", "Lagos State", Some("08030000000"));
        first.id_number = Some("A123".into());
        create(&st, first).await.unwrap();

        let err = create(&st, registration("Tunde Ade", "Ikeja", Some(" 08030000000 ")))
            .await
            .unwrap_err();
        match err {
            AppError::Conflict(msg) => assert_eq!(msg, "Phone number already exists. Please use another"),
            other => panic!("expected conflict, got {other:?}"),
        }

        let mut same_id = registration("Tunde Ade", "Ikeja", Some("08039999999"));
        same_id.id_number = Some("A123".into());
        let err = create(&st, same_id).await.unwrap_err();
        match err {
            AppError::Conflict(msg) => assert_eq!(msg, "Id number already exists. Please use another"),
            other => panic!("expected conflict, got {other:?}"),
        }
        assert_eq!(row_count(&db).await, 1);

        let next = create(&st, registration("Tunde Ade", "Ikeja", Some("08039999999")))
            .await
            .unwrap();
        assert_eq!(next.user_id, "ISM/B2-25/I/0002");
    }

    // The last identifier of the year is the lexicographic maximum, so
    // `LS/0002` outranks `I/0003` and a second Ikeja registration is handed
    // `I/0003` again.
    #[sqlx::test(migrations = "./migrations")]
    async fn colliding_identifier_rolls_back_the_whole_create(db: PgPool) {
        let st = store(db.clone());
        for names in ["Amina Bello", "Tunde Ade"] {
            create(&st, registration(names, "Lagos State", None)).await.unwrap();
        }
        let ikeja = create(&st, registration("Ngozi Okafor", "Ikeja", None)).await.unwrap();
        assert_eq!(ikeja.user_id, "ISM/B2-25/I/0003");

        let err = create(&st, registration("Musa Garba", "Ikeja", None)).await.unwrap_err();
        assert!(matches!(err, AppError::Allocation(ref e) if repo::is_unique_violation(e)));
        assert_eq!(err.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);

        assert_eq!(row_count(&db).await, 3);
        let orphan: Option<Uuid> = sqlx::query_scalar("SELECT id FROM beneficiaries WHERE names = $1")
            .bind("Musa Garba")
            .fetch_optional(&db)
            .await
            .unwrap();
        assert_eq!(orphan, None);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn deleting_an_unknown_id_is_not_found(db: PgPool) {
        let st = store(db);
        let user = create(&st, registration("Amina Bello", "Lagos State", None)).await.unwrap();

        delete(&st, user.id).await.unwrap();
        assert!(matches!(delete(&st, user.id).await, Err(AppError::NotFound(_))));
        assert!(matches!(delete(&st, Uuid::new_v4()).await, Err(AppError::NotFound(_))));
        assert!(matches!(get(&st, user.id).await, Err(AppError::NotFound(_))));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn directory_pages_split_forty_five_records(db: PgPool) {
        let st = store(db);
        for n in 1..=45 {
            create(&st, registration(&format!("Person {n}"), "Lagos State", None))
                .await
                .unwrap();
        }

        let mut seen = HashSet::new();
        let mut sizes = Vec::new();
        for page in 1..=3 {
            let params = ListParams {
                page: Some(page),
                ..Default::default()
            };
            let res = list_directory(&st, &params).await.unwrap();
            assert_eq!(res.pagination.total_items, 45);
            assert_eq!(res.pagination.total_pages, 3);
            assert_eq!(res.pagination.current_page, page);
            sizes.push(res.users.len());
            seen.extend(res.users.iter().map(|u| u.id));
        }
        assert_eq!(sizes, vec![20, 20, 5]);
        assert_eq!(seen.len(), 45);

        for page in [4, i64::MAX] {
            let params = ListParams {
                page: Some(page),
                ..Default::default()
            };
            let res = list_directory(&st, &params).await.unwrap();
            assert!(res.users.is_empty());
            assert_eq!(res.pagination.total_items, 45);
        }
    }
}
