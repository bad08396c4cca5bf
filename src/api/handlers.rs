use crate::{
    api::models::*,
    auth::jwt::Claims,
    core::{
        errors::DongipError,
        models::{
            audit::AppLog,
            balance::{CurrencyBalance, DongSettlement},
            category::Category,
            dong::{Dong, DongDetails},
            joint_account::JointAccount,
            user::User,
            users_rel::UsersRel,
        },
        services::DongService,
    },
    infrastructure::{
        cache::in_memory::InMemoryCache, audit::in_memory::InMemoryAuditTrail, storage::in_memory::InMemoryStorage,
    },
};
use axum::{
    Extension, Json, Router,
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, post},
};
use http::header;
use std::sync::Arc;

pub type AppService = DongService<InMemoryAuditTrail, InMemoryStorage, InMemoryCache>;

// Middleware to validate JWT
async fn auth_middleware(
    State(service): State<Arc<AppService>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| DongipError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| DongipError::Unauthorized("Invalid Authorization header".to_string()))?;

    let claims = service.validate_token(token)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

async fn current_user(service: &AppService, claims: &Claims) -> Result<User, ApiError> {
    let user = service
        .get_user(&claims.sub)
        .await?
        .ok_or_else(|| DongipError::Unauthorized(format!("Unknown user {}", claims.sub)))?;
    Ok(user)
}

// Define API routes
pub fn api_routes(service: Arc<AppService>) -> Router {
    let protected_routes = Router::new()
        .route("/users/me", get(get_me))
        .route("/users-rels", post(create_contact).get(list_contacts))
        .route("/categories", post(create_category).get(list_categories))
        .route("/joint-accounts", post(create_joint_account).get(list_joint_accounts))
        .route("/dongs", post(create_dong).get(list_dongs))
        .route("/dongs/{dong_id}", get(get_dong).delete(delete_dong))
        .route("/dongs/{dong_id}/settlement", get(get_dong_settlement))
        .route("/balances", get(get_balances))
        .route("/settlements/simplify", post(simplify_balances))
        .route("/logs", get(get_app_logs))
        .route_layer(middleware::from_fn_with_state(service.clone(), auth_middleware));

    Router::new()
        .route("/login", post(login))
        .route("/users", post(register)) // Unprotected
        .merge(protected_routes)
        .with_state(service)
}

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = User),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 409, description = "Phone already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn register(
    State(service): State<Arc<AppService>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = service.register_user(req.name, req.phone, req.password).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn login(
    State(service): State<Arc<AppService>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let token = service.authenticate(&req.phone, &req.password).await?;
    Ok(Json(LoginResponse { token }))
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Authenticated user", body = User),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn get_me(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(current_user(&service, &claims).await?))
}

#[utoipa::path(
    post,
    path = "/api/users-rels",
    request_body = CreateContactRequest,
    responses(
        (status = 201, description = "Contact added", body = UsersRel),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 409, description = "Contact already exists", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn create_contact(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateContactRequest>,
) -> Result<(StatusCode, Json<UsersRel>), ApiError> {
    let user = current_user(&service, &claims).await?;
    let rel = service.add_contact(&user, req.alias, req.phone).await?;
    Ok((StatusCode::CREATED, Json(rel)))
}

#[utoipa::path(
    get,
    path = "/api/users-rels",
    responses(
        (status = 200, description = "Contacts of the user, own entry included", body = Vec<UsersRel>)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn list_contacts(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<UsersRel>>, ApiError> {
    let user = current_user(&service, &claims).await?;
    Ok(Json(service.list_contacts(&user).await?))
}

#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 409, description = "Title already taken", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn create_category(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let user = current_user(&service, &claims).await?;
    let category = service.create_category(&user, req.title, req.icon).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "Categories of the user", body = Vec<Category>)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn list_categories(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Category>>, ApiError> {
    let user = current_user(&service, &claims).await?;
    Ok(Json(service.list_categories(&user).await?))
}

#[utoipa::path(
    post,
    path = "/api/joint-accounts",
    request_body = CreateJointAccountRequest,
    responses(
        (status = 201, description = "Joint account created", body = JointAccount),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 404, description = "Member contact not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn create_joint_account(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateJointAccountRequest>,
) -> Result<(StatusCode, Json<JointAccount>), ApiError> {
    let user = current_user(&service, &claims).await?;
    let account = service
        .create_joint_account(&user, req.title, req.description, req.user_rel_ids)
        .await?;
    Ok((StatusCode::CREATED, Json(account)))
}

#[utoipa::path(
    get,
    path = "/api/joint-accounts",
    responses(
        (status = 200, description = "Joint accounts of the user", body = Vec<JointAccount>)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn list_joint_accounts(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<JointAccount>>, ApiError> {
    let user = current_user(&service, &claims).await?;
    Ok(Json(service.list_joint_accounts(&user).await?))
}

#[utoipa::path(
    post,
    path = "/api/dongs",
    request_body = PostDongRequest,
    responses(
        (status = 201, description = "Dong recorded with its payer and bill rows", body = DongDetails),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 404, description = "Category, joint account or contact not found", body = ErrorResponse),
        (status = 422, description = "Payer or bill list does not settle", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn create_dong(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<PostDongRequest>,
) -> Result<(StatusCode, Json<DongDetails>), ApiError> {
    let user = current_user(&service, &claims).await?;
    let details = service.create_dong(&user, req.into()).await?;
    Ok((StatusCode::CREATED, Json(details)))
}

#[utoipa::path(
    get,
    path = "/api/dongs",
    responses(
        (status = 200, description = "Dongs of the user, newest first", body = Vec<Dong>)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn list_dongs(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Dong>>, ApiError> {
    let user = current_user(&service, &claims).await?;
    Ok(Json(service.list_dongs(&user).await?))
}

#[utoipa::path(
    get,
    path = "/api/dongs/{dong_id}",
    params(
        ("dong_id" = String, Path, description = "ID of the dong")
    ),
    responses(
        (status = 200, description = "Dong with its rows", body = DongDetails),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Dong not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn get_dong(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path(dong_id): Path<String>,
) -> Result<Json<DongDetails>, ApiError> {
    let user = current_user(&service, &claims).await?;
    Ok(Json(service.get_dong(&dong_id, &user).await?))
}

#[utoipa::path(
    delete,
    path = "/api/dongs/{dong_id}",
    params(
        ("dong_id" = String, Path, description = "ID of the dong")
    ),
    responses(
        (status = 204, description = "Dong deleted"),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Dong not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn delete_dong(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path(dong_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let user = current_user(&service, &claims).await?;
    service.delete_dong(&dong_id, &user).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/dongs/{dong_id}/settlement",
    params(
        ("dong_id" = String, Path, description = "ID of the dong")
    ),
    responses(
        (status = 200, description = "Net balances and settling transfers", body = DongSettlement),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Dong not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn get_dong_settlement(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path(dong_id): Path<String>,
) -> Result<Json<DongSettlement>, ApiError> {
    let user = current_user(&service, &claims).await?;
    Ok(Json(service.get_dong_settlement(&dong_id, &user).await?))
}

#[utoipa::path(
    get,
    path = "/api/balances",
    responses(
        (status = 200, description = "Balances per currency across all dongs", body = Vec<CurrencyBalance>)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn get_balances(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<CurrencyBalance>>, ApiError> {
    let user = current_user(&service, &claims).await?;
    Ok(Json(service.get_user_balances(&user).await?))
}

#[utoipa::path(
    post,
    path = "/api/settlements/simplify",
    request_body = SimplifyRequest,
    responses(
        (status = 200, description = "Transfers settling the given balances", body = SimplifyResponse),
        (status = 422, description = "Balances do not sum to zero", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn simplify_balances(
    State(service): State<Arc<AppService>>,
    Json(req): Json<SimplifyRequest>,
) -> Result<Json<SimplifyResponse>, ApiError> {
    let transfers = service.simplify_balances(&req.balances)?;
    Ok(Json(SimplifyResponse { transfers }))
}

#[utoipa::path(
    get,
    path = "/api/logs",
    responses(
        (status = 200, description = "Audit log of the user", body = Vec<AppLog>)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn get_app_logs(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<AppLog>>, ApiError> {
    let user = current_user(&service, &claims).await?;
    Ok(Json(service.get_app_logs(&user).await?))
}
