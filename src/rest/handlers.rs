use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    registry::Registry,
    storage::Storage,
    types::{
        GroupId, StoreResult, UserId, GROUP_PAGE, MEMBER_PAGE, USER_GROUP_PAGE, USER_PAGE,
    },
};

use super::{
    error::{ApiError, CODE_NOT_FOUND},
    models::{
        AddMemberRequest, CreateGroupRequest, CreateUserRequest, ErrorResponse, GroupResponse,
        HealthResponse, MemberResponse, PageQuery, UserResponse,
    },
    validate, AppState,
};

type ApiResult<T> = Result<T, ApiError>;

/// Runs a registry operation on the blocking pool.
async fn run_store<S, T, F>(state: &AppState<S>, op: &'static str, f: F) -> ApiResult<T>
where
    S: Storage + Clone + Send + Sync + 'static,
    T: Send + 'static,
    F: FnOnce(&Registry<S>) -> StoreResult<T> + Send + 'static,
{
    let registry = state.registry.clone();
    let span = tracing::debug_span!("store", op);
    let result = tokio::task::spawn_blocking(move || {
        let _entered = span.enter();
        f(&registry)
    })
    .await?;
    Ok(result?)
}

pub async fn health<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
) -> impl IntoResponse {
    let uptime_secs = state.started_at.elapsed().map(|d| d.as_secs()).unwrap_or(0);
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            uptime_secs,
        }),
    )
}

pub async fn create_user<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let Json(request) = payload?;
    validate::name(&request.name)?;
    let profile = request.profile_json.unwrap_or_default();

    let user = run_store(&state, "create_user", move |registry| {
        registry.create_user(&request.name, &profile)
    })
    .await?;
    log::info!("user {} created", user.user_id);
    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn list_users<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let Query(query) = query?;
    let page = validate::page(&query, USER_PAGE)?;

    let users = run_store(&state, "list_users", move |registry| registry.list_users(page)).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

pub async fn get_user<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    user_id: Result<Path<UserId>, PathRejection>,
) -> ApiResult<Json<UserResponse>> {
    let Path(user_id) = user_id?;

    let user = run_store(&state, "get_user", move |registry| registry.get_user(user_id)).await?;
    Ok(Json(user.into()))
}

pub async fn create_group<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    payload: Result<Json<CreateGroupRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<GroupResponse>)> {
    let Json(request) = payload?;
    validate::name(&request.name)?;

    let group = run_store(&state, "create_group", move |registry| {
        registry.create_group(&request.name)
    })
    .await?;
    log::info!("group {} created", group.group_id);
    Ok((StatusCode::CREATED, Json(group.into())))
}

pub async fn list_groups<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<GroupResponse>>> {
    let Query(query) = query?;
    let page = validate::page(&query, GROUP_PAGE)?;

    let groups =
        run_store(&state, "list_groups", move |registry| registry.list_groups(page)).await?;
    Ok(Json(groups.into_iter().map(GroupResponse::from).collect()))
}

pub async fn get_group_by_name<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    Path(name): Path<String>,
) -> ApiResult<Json<GroupResponse>> {
    let group = run_store(&state, "get_group_by_name", move |registry| {
        registry.get_group_by_name(&name)
    })
    .await?;
    Ok(Json(group.into()))
}

pub async fn add_member<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    group_id: Result<Path<GroupId>, PathRejection>,
    payload: Result<Json<AddMemberRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MemberResponse>)> {
    let Path(group_id) = group_id?;
    let Json(request) = payload?;
    validate::role(&request.role)?;
    let AddMemberRequest { user_id, role } = request;

    let membership = run_store(&state, "add_member", move |registry| {
        registry.add_member(group_id, user_id, &role)
    })
    .await?;
    log::info!("user {} added to group {}", user_id, group_id);
    Ok((StatusCode::CREATED, Json(membership.into())))
}

pub async fn list_members<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    group_id: Result<Path<GroupId>, PathRejection>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<MemberResponse>>> {
    let Path(group_id) = group_id?;
    let Query(query) = query?;
    let page = validate::page(&query, MEMBER_PAGE)?;

    let members = run_store(&state, "list_members", move |registry| {
        registry.list_members(group_id, page)
    })
    .await?;
    Ok(Json(members.into_iter().map(MemberResponse::from).collect()))
}

pub async fn groups_for_user<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    user_id: Result<Path<UserId>, PathRejection>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<GroupResponse>>> {
    let Path(user_id) = user_id?;
    let Query(query) = query?;
    let page = validate::page(&query, USER_GROUP_PAGE)?;

    let groups = run_store(&state, "groups_for_user", move |registry| {
        registry.groups_for_user(user_id, page)
    })
    .await?;
    Ok(Json(groups.into_iter().map(GroupResponse::from).collect()))
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(CODE_NOT_FOUND, "endpoint not found")),
    )
}
