use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::{
    api::models::{
        BillItem, CreateCategoryRequest, CreateContactRequest, CreateJointAccountRequest, ErrorResponse,
        LoginRequest, LoginResponse, PayerItem, PostDongRequest, RegisterRequest, SimplifyRequest,
        SimplifyResponse,
    },
    core::{
        models::{
            audit::AppLog,
            balance::{CurrencyBalance, DongSettlement},
            category::Category,
            dong::{BillEntry, Dong, DongDetails, PayerEntry},
            joint_account::JointAccount,
            user::User,
            users_rel::{RelKind, UsersRel},
        },
        settlement::{Currency, Transfer},
    },
};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "Bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        super::handlers::register,
        super::handlers::login,
        super::handlers::get_me,
        super::handlers::create_contact,
        super::handlers::list_contacts,
        super::handlers::create_category,
        super::handlers::list_categories,
        super::handlers::create_joint_account,
        super::handlers::list_joint_accounts,
        super::handlers::create_dong,
        super::handlers::list_dongs,
        super::handlers::get_dong,
        super::handlers::delete_dong,
        super::handlers::get_dong_settlement,
        super::handlers::get_balances,
        super::handlers::simplify_balances,
        super::handlers::get_app_logs
    ),
    components(schemas(
        RegisterRequest,
        LoginRequest,
        LoginResponse,
        CreateContactRequest,
        CreateCategoryRequest,
        CreateJointAccountRequest,
        PayerItem,
        BillItem,
        PostDongRequest,
        SimplifyRequest,
        SimplifyResponse,
        ErrorResponse,
        User,
        UsersRel,
        RelKind,
        Category,
        JointAccount,
        Currency,
        Dong,
        PayerEntry,
        BillEntry,
        DongDetails,
        DongSettlement,
        CurrencyBalance,
        Transfer,
        AppLog
    )),
    modifiers(&BearerAuth),
    info(
        title = "Dongip API",
        description = "API for recording shared expenses and settling balances",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_dong_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/dongs"));
        assert!(doc.paths.paths.contains_key("/api/dongs/{dong_id}/settlement"));
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("Bearer"));
        assert!(components.schemas.contains_key("PostDongRequest"));
    }
}
