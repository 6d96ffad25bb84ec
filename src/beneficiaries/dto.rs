use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::beneficiaries::repo_types::Beneficiary;

pub const ITEMS_PER_PAGE: i64 = 20;

/// Highest page whose offset still fits in an `i64`.
pub const MAX_PAGE: i64 = i64::MAX / ITEMS_PER_PAGE;

/// Request body for registration. `userId` is allocated by the server.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateBeneficiaryRequest {
    pub names: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub id_number: Option<String>,
    pub age: Option<i32>,
    pub sex: Option<String>,
    pub state: Option<String>,
    pub lga: String,
    pub community: Option<String>,
    pub religion: Option<String>,
    pub disability: Option<String>,
    pub physical_fitness: Option<String>,
    pub photo: Option<String>,
    pub qr_code_url: Option<String>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBeneficiaryRequest {
    // only read by `PUT /`, where the id travels in the body
    #[serde(alias = "_id")]
    pub id: Option<Uuid>,
    pub names: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub id_number: Option<String>,
    pub age: Option<i32>,
    pub sex: Option<String>,
    pub state: Option<String>,
    pub lga: Option<String>,
    pub community: Option<String>,
    pub religion: Option<String>,
    pub disability: Option<String>,
    pub physical_fitness: Option<String>,
    pub photo: Option<String>,
    pub qr_code_url: Option<String>,
}

/// Query string shared by the listing and export endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub search_term: Option<String>,
    pub search_type: Option<String>,
    pub page: Option<i64>,
    pub disability: Option<String>,
    pub sex: Option<String>,
    pub state: Option<String>,
    pub lga: Option<String>,
    pub community: Option<String>,
    pub religion: Option<String>,
    pub physical_fitness: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub registered_users_only: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub search_term: Option<String>,
}

/// 1-based page of fixed size, clamped to `1..=MAX_PAGE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: i64,
}

impl Page {
    pub fn new(requested: Option<i64>) -> Self {
        Self {
            number: requested.unwrap_or(1).clamp(1, MAX_PAGE),
        }
    }

    pub fn limit(&self) -> i64 {
        ITEMS_PER_PAGE
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * ITEMS_PER_PAGE
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
    pub items_per_page: i64,
}

impl PageInfo {
    pub fn new(page: Page, total_items: i64) -> Self {
        Self {
            current_page: page.number,
            total_pages: (total_items + ITEMS_PER_PAGE - 1) / ITEMS_PER_PAGE,
            total_items,
            items_per_page: ITEMS_PER_PAGE,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub users: Vec<Beneficiary>,
    pub pagination: PageInfo,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredListResponse {
    pub users: Vec<Beneficiary>,
    pub filtered_users: i64,
    pub pagination: PageInfo,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub status: &'static str,
    pub user: Beneficiary,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct UpdatedResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub data: Beneficiary,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Number of rows a page actually holds once the result set is known.
    fn rows_on(page: Page, total: i64) -> i64 {
        (total - page.offset()).clamp(0, page.limit())
    }

    #[test]
    fn forty_five_records_span_three_pages() {
        let total = 45;
        let sizes: Vec<i64> = (1..=3).map(|n| rows_on(Page::new(Some(n)), total)).collect();
        assert_eq!(sizes, vec![20, 20, 5]);
        assert_eq!(rows_on(Page::new(Some(4)), total), 0);

        let info = PageInfo::new(Page::new(Some(3)), total);
        assert_eq!(info.total_pages, 3);
        assert_eq!(info.current_page, 3);
        assert_eq!(info.items_per_page, 20);
    }

    #[test]
    fn offsets_advance_by_page_size() {
        assert_eq!(Page::new(None).offset(), 0);
        assert_eq!(Page::new(Some(2)).offset(), 20);
        assert_eq!(Page::new(Some(3)).offset(), 40);
    }

    #[test]
    fn page_below_one_is_clamped() {
        assert_eq!(Page::new(Some(0)), Page::new(Some(1)));
        assert_eq!(Page::new(Some(-7)).offset(), 0);
    }

    #[test]
    fn huge_page_is_clamped_without_overflow() {
        let page = Page::new(Some(i64::MAX));
        assert_eq!(page.number, MAX_PAGE);
        assert!(page.offset() > 0);
        assert_eq!(PageInfo::new(page, 45).total_pages, 3);
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(PageInfo::new(Page::new(None), 0).total_pages, 0);
        assert_eq!(PageInfo::new(Page::new(None), 20).total_pages, 1);
        assert_eq!(PageInfo::new(Page::new(None), 21).total_pages, 2);
    }

    #[test]
    fn page_info_uses_camel_case() {
        let json = serde_json::to_value(PageInfo::new(Page::new(Some(2)), 45)).unwrap();
        assert_eq!(json["currentPage"], 2);
        assert_eq!(json["totalPages"], 3);
        assert_eq!(json["totalItems"], 45);
        assert_eq!(json["itemsPerPage"], 20);
    }

    #[test]
    fn update_accepts_mongo_style_id() {
        let id = Uuid::new_v4();
        let body = format!(r#"{{"_id":"{id}","names":"Ada","userId":"ignored"}}"#);
        let req: UpdateBeneficiaryRequest = serde_json::from_str(&body).unwrap();
        assert_eq!(req.id, Some(id));
        assert_eq!(req.names.as_deref(), Some("Ada"));
    }
}
