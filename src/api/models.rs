use axum::{Json, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::core::errors::DongipError;
use crate::core::models::dong::{EntryDraft, NewDong};
use crate::core::settlement::{Currency, Transfer};

// Request structs for JSON payloads
#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub phone: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub phone: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateContactRequest {
    pub alias: String,
    pub phone: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub title: String,
    pub icon: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateJointAccountRequest {
    pub title: String,
    pub description: Option<String>,
    pub user_rel_ids: Vec<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayerItem {
    /// Users-rel id of the payer
    #[serde(alias = "userRelId")]
    pub participant_id: String,
    pub paid_amount: i64,
    pub currency: Option<Currency>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BillItem {
    #[serde(alias = "userRelId")]
    pub participant_id: String,
    pub dong_amount: i64,
    pub currency: Option<Currency>,
}

/// Body of `POST /api/dongs`, shaped the way the mobile client sends it.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostDongRequest {
    pub title: String,
    pub desc: Option<String>,
    #[schema(value_type = Option<String>, example = "2024-06-01T12:34:56Z")]
    pub created_at: Option<DateTime<Utc>>,
    pub category_id: String,
    pub joint_account_id: Option<String>,
    pub pong: i64,
    pub currency: Option<Currency>,
    pub payer_list: Vec<PayerItem>,
    pub bill_list: Vec<BillItem>,
}

impl From<PostDongRequest> for NewDong {
    fn from(req: PostDongRequest) -> Self {
        NewDong {
            title: req.title,
            desc: req.desc,
            created_at: req.created_at,
            category_id: req.category_id,
            joint_account_id: req.joint_account_id,
            pong: req.pong,
            currency: req.currency,
            payers: req
                .payer_list
                .into_iter()
                .map(|p| EntryDraft {
                    users_rel_id: p.participant_id,
                    amount: p.paid_amount,
                    currency: p.currency,
                })
                .collect(),
            bills: req
                .bill_list
                .into_iter()
                .map(|b| EntryDraft {
                    users_rel_id: b.participant_id,
                    amount: b.dong_amount,
                    currency: b.currency,
                })
                .collect(),
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct SimplifyRequest {
    pub balances: BTreeMap<String, i64>,
}

#[derive(Serialize, ToSchema)]
pub struct SimplifyResponse {
    pub transfers: Vec<Transfer>,
}

// Error response struct
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
}

// Newtype wrapper for DongipError to implement IntoResponse
pub struct ApiError(pub DongipError);

impl From<DongipError> for ApiError {
    fn from(err: DongipError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            DongipError::Settlement(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DongipError::InvalidPhone(_) | DongipError::InvalidInput(..) => StatusCode::BAD_REQUEST,
            DongipError::InvalidCredentials | DongipError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            DongipError::NotDongOwner(_) => StatusCode::FORBIDDEN,
            DongipError::UserNotFound(_)
            | DongipError::ContactNotFound(_)
            | DongipError::CategoryNotFound(_)
            | DongipError::JointAccountNotFound(_)
            | DongipError::DongNotFound(_) => StatusCode::NOT_FOUND,
            DongipError::PhoneAlreadyRegistered(_)
            | DongipError::ContactAlreadyExists(_)
            | DongipError::CategoryTitleTaken(_) => StatusCode::CONFLICT,
            DongipError::InternalServerError(_)
            | DongipError::StorageError(_)
            | DongipError::AuditError(_)
            | DongipError::CacheError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        }
        let body = ErrorResponse {
            error: self.0.to_string(),
            kind: self.0.kind().to_string(),
        };
        (status, Json(body)).into_response()
    }
}
