//! Search / filter / sort construction for beneficiary listings.
//!
//! A [`BeneficiaryQuery`] is built from the flat query string and then
//! rendered into a `sqlx::QueryBuilder`; column names only ever come from
//! the enums below, user input is always bound.

use sqlx::{Postgres, QueryBuilder};

use crate::beneficiaries::dto::ListParams;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    UserId,
    Names,
    Email,
    PhoneNumber,
    IdNumber,
    Age,
    Sex,
    State,
    Lga,
    Community,
    Religion,
    Disability,
    PhysicalFitness,
    QrCodeUrl,
}

impl Column {
    pub fn as_sql(self) -> &'static str {
        match self {
            Column::UserId => "user_id",
            Column::Names => "names",
            Column::Email => "email",
            Column::PhoneNumber => "phone_number",
            Column::IdNumber => "id_number",
            Column::Age => "age",
            Column::Sex => "sex",
            Column::State => "state",
            Column::Lga => "lga",
            Column::Community => "community",
            Column::Religion => "religion",
            Column::Disability => "disability",
            Column::PhysicalFitness => "physical_fitness",
            Column::QrCodeUrl => "qr_code_url",
        }
    }

    /// Fields a `searchType` may name.
    pub fn searchable(name: &str) -> Option<Self> {
        Some(match name {
            "userId" => Column::UserId,
            "names" => Column::Names,
            "email" => Column::Email,
            "phoneNumber" => Column::PhoneNumber,
            "idNumber" => Column::IdNumber,
            "sex" => Column::Sex,
            "state" => Column::State,
            "lga" => Column::Lga,
            "community" => Column::Community,
            "religion" => Column::Religion,
            "disability" => Column::Disability,
            "physicalFitness" => Column::PhysicalFitness,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Case-insensitive substring.
    Contains(Column, String),
    Equals(Column, String),
    /// Whole value, case-insensitive, surrounding whitespace ignored.
    EqualsLoose(Column, String),
    NotNull(Column),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    /// Insertion order.
    Id,
    Column(Column),
}

impl SortField {
    /// Unknown names fall back to insertion order.
    pub fn parse(name: Option<&str>) -> Self {
        match name.unwrap_or("_id") {
            "userId" => SortField::Column(Column::UserId),
            "names" => SortField::Column(Column::Names),
            "email" => SortField::Column(Column::Email),
            "phoneNumber" => SortField::Column(Column::PhoneNumber),
            "age" => SortField::Column(Column::Age),
            "sex" => SortField::Column(Column::Sex),
            "state" => SortField::Column(Column::State),
            "community" => SortField::Column(Column::Community),
            "disability" => SortField::Column(Column::Disability),
            _ => SortField::Id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub descending: bool,
}

impl Sort {
    pub fn parse(sort_by: Option<&str>, sort_order: Option<&str>) -> Self {
        Self {
            field: SortField::parse(sort_by),
            descending: sort_order == Some("desc"),
        }
    }

    fn push_order_by(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        let dir = if self.descending { "DESC" } else { "ASC" };
        qb.push(" ORDER BY ");
        match self.field {
            SortField::Id => {
                qb.push(format_args!("created_at {dir}, "));
            }
            SortField::Column(col) => {
                qb.push(format_args!("{} {dir}, ", col.as_sql()));
            }
        }
        qb.push(format_args!("id {dir}"));
    }
}

impl Default for Sort {
    fn default() -> Self {
        Self {
            field: SortField::Id,
            descending: false,
        }
    }
}

/// How the seven filter fields are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterMatch {
    Exact,
    /// `lga` loose, everything else exact.
    LooseLga,
    Loose,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeneficiaryQuery {
    pub conditions: Vec<Condition>,
    pub sort: Sort,
}

impl BeneficiaryQuery {
    /// `GET /`: substring search plus exact filters.
    pub fn directory(params: &ListParams) -> Result<Self, AppError> {
        Self::build(params, FilterMatch::Exact, false)
    }

    /// `GET /numbers`: only records with a registration artifact; `lga`
    /// matched loosely.
    pub fn registered(params: &ListParams) -> Result<Self, AppError> {
        Self::build(params, FilterMatch::LooseLga, true)
    }

    /// `GET /download`: every filter matched loosely, insertion order.
    pub fn export(params: &ListParams) -> Result<Self, AppError> {
        let registered_only = params.registered_users_only.as_deref() == Some("true");
        let mut query = Self::build(params, FilterMatch::Loose, registered_only)?;
        query.sort = Sort::default();
        Ok(query)
    }

    fn build(params: &ListParams, mode: FilterMatch, registered_only: bool) -> Result<Self, AppError> {
        let mut conditions = Vec::new();

        if registered_only {
            conditions.push(Condition::NotNull(Column::QrCodeUrl));
        }

        if let (Some(term), Some(kind)) = (non_empty(&params.search_term), non_empty(&params.search_type)) {
            let column = Column::searchable(kind)
                .ok_or_else(|| AppError::Validation(format!("Cannot search by {kind}")))?;
            conditions.push(Condition::Contains(column, term.to_string()));
        }

        let filters = [
            (Column::Disability, &params.disability),
            (Column::Sex, &params.sex),
            (Column::State, &params.state),
            (Column::Lga, &params.lga),
            (Column::Community, &params.community),
            (Column::Religion, &params.religion),
            (Column::PhysicalFitness, &params.physical_fitness),
        ];
        for (column, value) in filters {
            let Some(value) = non_empty(value) else {
                continue;
            };
            let loose = match mode {
                FilterMatch::Exact => false,
                FilterMatch::LooseLga => column == Column::Lga,
                FilterMatch::Loose => true,
            };
            conditions.push(if loose {
                Condition::EqualsLoose(column, value.trim().to_string())
            } else {
                Condition::Equals(column, value.to_string())
            });
        }

        Ok(Self {
            conditions,
            sort: Sort::parse(params.sort_by.as_deref(), params.sort_order.as_deref()),
        })
    }

    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        for (i, cond) in self.conditions.iter().enumerate() {
            qb.push(if i == 0 { " WHERE " } else { " AND " });
            match cond {
                Condition::Contains(col, term) => {
                    qb.push(col.as_sql())
                        .push(" ILIKE ")
                        .push_bind(format!("%{}%", escape_like(term)));
                }
                Condition::Equals(col, value) => {
                    qb.push(col.as_sql()).push(" = ").push_bind(value.clone());
                }
                Condition::EqualsLoose(col, value) => {
                    qb.push(format_args!("btrim({}) ILIKE ", col.as_sql()))
                        .push_bind(escape_like(value));
                }
                Condition::NotNull(col) => {
                    qb.push(col.as_sql()).push(" IS NOT NULL");
                }
            }
        }
    }

    pub fn push_order_by(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        self.sort.push_order_by(qb);
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Escapes LIKE metacharacters so the value matches literally.
fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ListParams {
        ListParams::default()
    }

    fn render(query: &BeneficiaryQuery) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM beneficiaries");
        query.push_where(&mut qb);
        query.push_order_by(&mut qb);
        qb.sql().to_string()
    }

    #[test]
    fn empty_params_select_everything_in_insertion_order() {
        let query = BeneficiaryQuery::directory(&params()).unwrap();
        assert!(query.conditions.is_empty());
        assert_eq!(
            render(&query),
            "SELECT * FROM beneficiaries ORDER BY created_at ASC, id ASC"
        );
    }

    #[test]
    fn search_and_filters_are_combined_with_and() {
        let p = ListParams {
            search_term: Some("ade".into()),
            search_type: Some("names".into()),
            sex: Some("Female".into()),
            lga: Some("Ikeja".into()),
            ..params()
        };
        let query = BeneficiaryQuery::directory(&p).unwrap();
        assert_eq!(
            query.conditions,
            vec![
                Condition::Contains(Column::Names, "ade".into()),
                Condition::Equals(Column::Sex, "Female".into()),
                Condition::Equals(Column::Lga, "Ikeja".into()),
            ]
        );
        assert_eq!(
            render(&query),
            "SELECT * FROM beneficiaries WHERE names ILIKE $1 AND sex = $2 AND lga = $3 \
             ORDER BY created_at ASC, id ASC"
        );
    }

    #[test]
    fn search_needs_both_term_and_type() {
        let p = ListParams {
            search_term: Some("ade".into()),
            ..params()
        };
        assert!(BeneficiaryQuery::directory(&p).unwrap().conditions.is_empty());
    }

    #[test]
    fn unknown_search_type_is_rejected() {
        let p = ListParams {
            search_term: Some("x".into()),
            search_type: Some("password".into()),
            ..params()
        };
        let err = BeneficiaryQuery::directory(&p).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn unknown_sort_field_falls_back_to_insertion_order() {
        let p = ListParams {
            sort_by: Some("unknownField".into()),
            sort_order: Some("desc".into()),
            ..params()
        };
        let query = BeneficiaryQuery::directory(&p).unwrap();
        assert_eq!(query.sort.field, SortField::Id);
        assert!(query.sort.descending);
        assert!(render(&query).ends_with("ORDER BY created_at DESC, id DESC"));
    }

    #[test]
    fn allowed_sort_fields_map_to_columns() {
        assert_eq!(SortField::parse(Some("phoneNumber")), SortField::Column(Column::PhoneNumber));
        assert_eq!(SortField::parse(Some("age")), SortField::Column(Column::Age));
        // lga is filterable but not sortable
        assert_eq!(SortField::parse(Some("lga")), SortField::Id);
        assert!(!Sort::parse(Some("names"), Some("DESC")).descending);
    }

    #[test]
    fn registered_listing_requires_qr_code_and_loose_lga() {
        let p = ListParams {
            lga: Some("  ikeja ".into()),
            sex: Some("Male".into()),
            ..params()
        };
        let query = BeneficiaryQuery::registered(&p).unwrap();
        assert_eq!(
            query.conditions,
            vec![
                Condition::NotNull(Column::QrCodeUrl),
                Condition::Equals(Column::Sex, "Male".into()),
                Condition::EqualsLoose(Column::Lga, "ikeja".into()),
            ]
        );
        assert!(render(&query).starts_with(
            "SELECT * FROM beneficiaries WHERE qr_code_url IS NOT NULL AND sex = $1 AND btrim(lga) ILIKE $2"
        ));
    }

    #[test]
    fn export_matches_every_filter_loosely_and_ignores_sort() {
        let p = ListParams {
            state: Some(" Lagos".into()),
            religion: Some("Islam ".into()),
            sort_by: Some("names".into()),
            registered_users_only: Some("true".into()),
            ..params()
        };
        let query = BeneficiaryQuery::export(&p).unwrap();
        assert_eq!(
            query.conditions,
            vec![
                Condition::NotNull(Column::QrCodeUrl),
                Condition::EqualsLoose(Column::State, "Lagos".into()),
                Condition::EqualsLoose(Column::Religion, "Islam".into()),
            ]
        );
        assert_eq!(query.sort, Sort::default());
    }

    #[test]
    fn export_without_toggle_includes_unregistered() {
        let p = ListParams {
            registered_users_only: Some("false".into()),
            ..params()
        };
        assert!(BeneficiaryQuery::export(&p).unwrap().conditions.is_empty());
    }

    #[test]
    fn blank_filters_are_ignored() {
        let p = ListParams {
            community: Some("   ".into()),
            disability: Some(String::new()),
            ..params()
        };
        assert!(BeneficiaryQuery::directory(&p).unwrap().conditions.is_empty());
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
