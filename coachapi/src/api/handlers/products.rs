use crate::api::models::products::{CoachingAvailabilityResponse, CoachingPackageResponse, PlanResponse};
use crate::db::handlers::{CoachingPackages, Plans};
use crate::errors::{Error, Result};
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

fn plan_not_found(id: &str) -> Error {
    Error::NotFound {
        resource: "Plan".to_string(),
        id: id.to_string(),
    }
}

fn package_not_found(id: &str) -> Error {
    Error::NotFound {
        resource: "Coaching package".to_string(),
        id: id.to_string(),
    }
}

#[utoipa::path(
    get,
    path = "/api/independent-plans",
    tag = "plans",
    summary = "List plans",
    description = "Active independent plans in display order",
    responses(
        (status = 200, description = "Active plans", body = Vec<PlanResponse>),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_plans(State(state): State<AppState>) -> Result<Json<Vec<PlanResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let plans = Plans::new(&mut conn).list_active().await?;

    Ok(Json(plans.into_iter().map(PlanResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/independent-plans/featured",
    tag = "plans",
    summary = "List featured plans",
    description = "The first few active plans in display order, for the landing page",
    responses(
        (status = 200, description = "Featured plans", body = Vec<PlanResponse>),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_featured_plans(State(state): State<AppState>) -> Result<Json<Vec<PlanResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let plans = Plans::new(&mut conn)
        .list_featured(i64::from(state.config.plans.featured_limit))
        .await?;

    Ok(Json(plans.into_iter().map(PlanResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/independent-plans/{id}",
    tag = "plans",
    summary = "Get plan",
    params(("id" = String, Path, description = "Plan ID")),
    responses(
        (status = 200, description = "Plan details", body = PlanResponse),
        (status = 404, description = "Plan not found or inactive"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all, fields(plan_id = %id))]
pub async fn get_plan(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<PlanResponse>> {
    // A malformed id can't match any plan
    let plan_id = Uuid::parse_str(&id).map_err(|_| plan_not_found(&id))?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let plan = Plans::new(&mut conn)
        .get_active_by_id(plan_id)
        .await?
        .ok_or_else(|| plan_not_found(&id))?;

    Ok(Json(PlanResponse::from(plan)))
}

#[utoipa::path(
    get,
    path = "/api/coaching-packages",
    tag = "coaching",
    summary = "List coaching packages",
    description = "Active coaching packages by ascending price. Empty while coaching is hidden.",
    responses(
        (status = 200, description = "Active packages", body = Vec<CoachingPackageResponse>),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_coaching_packages(State(state): State<AppState>) -> Result<Json<Vec<CoachingPackageResponse>>> {
    if state.config.coaching.hidden {
        return Ok(Json(Vec::new()));
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let packages = CoachingPackages::new(&mut conn).list_active().await?;

    Ok(Json(packages.into_iter().map(CoachingPackageResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/coaching-packages/availability",
    tag = "coaching",
    summary = "Coaching availability",
    responses(
        (status = 200, description = "Whether coaching can be booked", body = CoachingAvailabilityResponse)
    )
)]
pub async fn coaching_availability(State(state): State<AppState>) -> Json<CoachingAvailabilityResponse> {
    Json(CoachingAvailabilityResponse::new(state.config.coaching.hidden))
}

#[utoipa::path(
    get,
    path = "/api/coaching-packages/{id}",
    tag = "coaching",
    summary = "Get coaching package",
    params(("id" = String, Path, description = "Coaching package ID")),
    responses(
        (status = 200, description = "Package details", body = CoachingPackageResponse),
        (status = 404, description = "Package not found, inactive, or coaching hidden"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all, fields(package_id = %id))]
pub async fn get_coaching_package(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<CoachingPackageResponse>> {
    if state.config.coaching.hidden {
        return Err(package_not_found(&id));
    }

    let package_id = Uuid::parse_str(&id).map_err(|_| package_not_found(&id))?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let package = CoachingPackages::new(&mut conn)
        .get_active_by_id(package_id)
        .await?
        .ok_or_else(|| package_not_found(&id))?;

    Ok(Json(CoachingPackageResponse::from(package)))
}
