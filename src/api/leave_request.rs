use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::db;
use crate::model::leave_request::{LeaveApplication, LeaveType};
use crate::model::role::Role;
use crate::model::status::LeaveStatus;
use crate::service::leave::{self, LeaveChange};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::instrument;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "sick")]
    pub leave_type: LeaveType, // enum ensures Swagger dropdown
    /// Submit immediately instead of saving a draft
    #[serde(default)]
    #[schema(example = true)]
    pub submit: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateLeave {
    #[schema(example = "2026-01-02", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-04", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "annual")]
    pub leave_type: LeaveType,
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request created", body = LeaveApplication),
        (status = 400, description = "Invalid dates or overlapping submitted/approved timesheets", body = Object, example = json!({
            "message": "Request conflicts with existing timesheet(s): #7 2024-01-15 to 2024-01-21 (submitted)",
            "kind": "TimesheetConflict",
            "conflicts": [{"id": 7, "start_date": "2024-01-15", "end_date": "2024-01-21", "status": "submitted"}]
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Employee records busy, try again shortly")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
#[instrument(name = "create_leave", skip_all, fields(employee_id = ?auth.employee_id))]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;
    let payload = payload.into_inner();

    let mut tx = db::begin(pool.get_ref()).await?;
    let leave = leave::create_leave(
        &mut tx,
        employee_id,
        LeaveChange {
            start_date: payload.start_date,
            end_date: payload.end_date,
            leave_type: payload.leave_type,
        },
        payload.submit,
        &config.lock_policy(),
    )
    .await?;
    db::commit(tx).await?;

    Ok(HttpResponse::Created().json(leave))
}

/* =========================
Update leave dates/type
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to change")
    ),
    request_body = UpdateLeave,
    responses(
        (status = 200, description = "Leave request updated", body = LeaveApplication),
        (status = 400, description = "Leave already approved, invalid dates or timesheet conflict"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Employee records busy, try again shortly")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
#[instrument(name = "update_leave", skip_all, fields(leave_id = *path))]
pub async fn update_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    payload: web::Json<UpdateLeave>,
) -> actix_web::Result<impl Responder> {
    let owner = auth.owner_scope()?;
    let leave_id = path.into_inner();
    let payload = payload.into_inner();

    let mut tx = db::begin(pool.get_ref()).await?;
    let leave = leave::update_leave(
        &mut tx,
        leave_id,
        owner,
        LeaveChange {
            start_date: payload.start_date,
            end_date: payload.end_date,
            leave_type: payload.leave_type,
        },
        &config.lock_policy(),
    )
    .await?;
    db::commit(tx).await?;

    Ok(HttpResponse::Ok().json(leave))
}

async fn transition(
    pool: &MySqlPool,
    config: &Config,
    leave_id: u64,
    owner: Option<u64>,
    target: LeaveStatus,
) -> actix_web::Result<LeaveApplication> {
    let mut tx = db::begin(pool).await?;
    let leave = leave::transition_leave(&mut tx, leave_id, owner, target, &config.lock_policy()).await?;
    db::commit(tx).await?;
    Ok(leave)
}

/* =========================
Submit a draft leave (owner)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/submit",
    params(
        ("leave_id" = u64, Path, description = "ID of the draft leave request")
    ),
    responses(
        (status = 200, description = "Leave submitted", body = LeaveApplication),
        (status = 400, description = "Not a draft or conflicts with timesheets"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Employee records busy, try again shortly")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
#[instrument(name = "submit_leave", skip_all, fields(leave_id = *path))]
pub async fn submit_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let owner = Some(auth.require_employee()?);
    let leave = transition(&pool, &config, path.into_inner(), owner, LeaveStatus::Submitted).await?;
    Ok(HttpResponse::Ok().json(leave))
}

/* =========================
Manager approval
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/manager-approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the submitted leave request")
    ),
    responses(
        (status = 200, description = "Leave approved by manager", body = LeaveApplication),
        (status = 400, description = "Leave request not in submitted state"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Employee records busy, try again shortly")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
#[instrument(name = "manager_approve_leave", skip_all, fields(leave_id = *path))]
pub async fn manager_approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_above()?;
    let leave = transition(&pool, &config, path.into_inner(), None, LeaveStatus::ManagerApproved).await?;
    Ok(HttpResponse::Ok().json(leave))
}

/* =========================
HR approval
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/hr-approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the manager-approved leave request")
    ),
    responses(
        (status = 200, description = "Leave approved by HR", body = LeaveApplication),
        (status = 400, description = "Leave request not manager-approved"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Employee records busy, try again shortly")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
#[instrument(name = "hr_approve_leave", skip_all, fields(leave_id = *path))]
pub async fn hr_approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let leave = transition(&pool, &config, path.into_inner(), None, LeaveStatus::HrApproved).await?;
    Ok(HttpResponse::Ok().json(leave))
}

/* =========================
Reject leave (Manager/HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    responses(
        (status = 200, description = "Leave rejected", body = LeaveApplication),
        (status = 400, description = "Leave request already processed"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Employee records busy, try again shortly")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
#[instrument(name = "reject_leave", skip_all, fields(leave_id = *path))]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_above()?;
    let leave = transition(&pool, &config, path.into_inner(), None, LeaveStatus::Rejected).await?;
    Ok(HttpResponse::Ok().json(leave))
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveApplication),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "leave request 1 not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    // managers review leave of other employees
    let owner = if matches!(auth.role, Role::Manager) {
        None
    } else {
        auth.owner_scope()?
    };

    let mut tx = db::begin(pool.get_ref()).await?;
    let leave = leave::get_leave(&mut tx, path.into_inner(), owner).await?;
    db::commit(tx).await?;

    Ok(HttpResponse::Ok().json(leave))
}
