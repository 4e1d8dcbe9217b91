use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::db;
use crate::model::timesheet::{Timesheet, TimesheetWithDetails};
use crate::service::timesheet::{self, DailyEntry};
use actix_web::{HttpResponse, Responder, web};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::instrument;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct EntryPayload {
    #[schema(example = "2024-01-17", format = "date", value_type = String)]
    pub work_date: NaiveDate,
    #[schema(example = 9.5)]
    pub hours_worked: f64,
}

impl From<EntryPayload> for DailyEntry {
    fn from(p: EntryPayload) -> Self {
        DailyEntry {
            work_date: p.work_date,
            hours_worked: p.hours_worked,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct WeeklyTimesheet {
    /// Any day of the target week
    #[schema(example = "2024-01-15", format = "date", value_type = String)]
    pub week_of: NaiveDate,
    pub entries: Vec<EntryPayload>,
    #[serde(default)]
    #[schema(example = false)]
    pub submit: bool,
}

#[derive(Deserialize)]
pub struct EntryPath {
    pub timesheet_id: u64,
    pub work_date: NaiveDate,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/* =========================
Log hours for one day
========================= */
#[utoipa::path(
    post,
    path = "/api/timesheet/entry",
    request_body = EntryPayload,
    responses(
        (status = 200, description = "Entry recorded, weekly total updated", body = Timesheet),
        (status = 400, description = "Weekend/future date, invalid hours, locked week or overlapping leave", body = Object, example = json!({
            "message": "Request conflicts with existing leave: #3 2024-01-17 to 2024-01-19 (submitted)",
            "kind": "LeaveConflict",
            "conflicts": [{"id": 3, "start_date": "2024-01-17", "end_date": "2024-01-19", "status": "submitted"}]
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Employee records busy, try again shortly")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Timesheet"
)]
#[instrument(name = "record_entry", skip_all, fields(employee_id = ?auth.employee_id))]
pub async fn record_entry(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<EntryPayload>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    let mut tx = db::begin(pool.get_ref()).await?;
    let sheet = timesheet::record_daily_entry(
        &mut tx,
        employee_id,
        payload.into_inner().into(),
        today(),
        &config.lock_policy(),
    )
    .await?;
    db::commit(tx).await?;

    Ok(HttpResponse::Ok().json(sheet))
}

/* =========================
Save a whole week at once
========================= */
#[utoipa::path(
    post,
    path = "/api/timesheet",
    request_body = WeeklyTimesheet,
    responses(
        (status = 201, description = "Weekly timesheet saved", body = Timesheet),
        (status = 400, description = "Invalid entries, locked week or overlapping leave"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Employee records busy, try again shortly")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Timesheet"
)]
#[instrument(name = "create_weekly_timesheet", skip_all, fields(employee_id = ?auth.employee_id))]
pub async fn create_weekly_timesheet(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<WeeklyTimesheet>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;
    let payload = payload.into_inner();
    let entries: Vec<DailyEntry> = payload.entries.into_iter().map(Into::into).collect();

    let mut tx = db::begin(pool.get_ref()).await?;
    let sheet = timesheet::create_weekly_timesheet(
        &mut tx,
        employee_id,
        payload.week_of,
        &entries,
        payload.submit,
        today(),
        &config.lock_policy(),
    )
    .await?;
    db::commit(tx).await?;

    Ok(HttpResponse::Created().json(sheet))
}

/* =========================
Submit for approval (owner)
========================= */
#[utoipa::path(
    put,
    path = "/api/timesheet/{timesheet_id}/submit",
    params(
        ("timesheet_id" = u64, Path, description = "ID of the timesheet to submit")
    ),
    responses(
        (status = 200, description = "Timesheet submitted", body = Timesheet),
        (status = 400, description = "Not submittable, empty, or overlapping leave"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Timesheet not found"),
        (status = 409, description = "Employee records busy, try again shortly")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Timesheet"
)]
#[instrument(name = "submit_timesheet", skip_all, fields(timesheet_id = *path))]
pub async fn submit_timesheet(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let owner = Some(auth.require_employee()?);

    let mut tx = db::begin(pool.get_ref()).await?;
    let sheet =
        timesheet::submit_timesheet(&mut tx, path.into_inner(), owner, &config.lock_policy())
            .await?;
    db::commit(tx).await?;

    Ok(HttpResponse::Ok().json(sheet))
}

async fn review(
    auth: &AuthUser,
    pool: &MySqlPool,
    config: &Config,
    timesheet_id: u64,
    approve: bool,
) -> actix_web::Result<Timesheet> {
    auth.require_hr_or_admin()?;

    let mut tx = db::begin(pool).await?;
    let sheet =
        timesheet::review_timesheet(&mut tx, timesheet_id, approve, &config.lock_policy()).await?;
    db::commit(tx).await?;
    Ok(sheet)
}

/// Approve a submitted timesheet (HR/Admin)
#[utoipa::path(
    put,
    path = "/api/timesheet/{timesheet_id}/approve",
    params(
        ("timesheet_id" = u64, Path, description = "ID of the submitted timesheet")
    ),
    responses(
        (status = 200, description = "Timesheet approved", body = Timesheet),
        (status = 400, description = "Timesheet not submitted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Timesheet not found"),
        (status = 409, description = "Employee records busy, try again shortly")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Timesheet"
)]
pub async fn approve_timesheet(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let sheet = review(&auth, &pool, &config, path.into_inner(), true).await?;
    Ok(HttpResponse::Ok().json(sheet))
}

/// Reject a submitted timesheet (HR/Admin)
#[utoipa::path(
    put,
    path = "/api/timesheet/{timesheet_id}/reject",
    params(
        ("timesheet_id" = u64, Path, description = "ID of the submitted timesheet")
    ),
    responses(
        (status = 200, description = "Timesheet rejected", body = Timesheet),
        (status = 400, description = "Timesheet not submitted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Timesheet not found"),
        (status = 409, description = "Employee records busy, try again shortly")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Timesheet"
)]
pub async fn reject_timesheet(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let sheet = review(&auth, &pool, &config, path.into_inner(), false).await?;
    Ok(HttpResponse::Ok().json(sheet))
}

/// Remove one day from an editable timesheet
#[utoipa::path(
    delete,
    path = "/api/timesheet/{timesheet_id}/entry/{work_date}",
    params(
        ("timesheet_id" = u64, Path, description = "ID of the timesheet"),
        ("work_date" = String, Path, description = "Day to remove, YYYY-MM-DD")
    ),
    responses(
        (status = 200, description = "Entry removed, weekly total updated", body = Timesheet),
        (status = 400, description = "Timesheet locked or no entry for that day"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Timesheet not found"),
        (status = 409, description = "Employee records busy, try again shortly")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Timesheet"
)]
#[instrument(name = "remove_entry", skip_all, fields(timesheet_id = path.timesheet_id, work_date = %path.work_date))]
pub async fn remove_entry(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<EntryPath>,
) -> actix_web::Result<impl Responder> {
    let owner = auth.owner_scope()?;
    let EntryPath {
        timesheet_id,
        work_date,
    } = path.into_inner();

    let mut tx = db::begin(pool.get_ref()).await?;
    let sheet = timesheet::remove_daily_entry(
        &mut tx,
        timesheet_id,
        work_date,
        owner,
        &config.lock_policy(),
    )
    .await?;
    db::commit(tx).await?;

    Ok(HttpResponse::Ok().json(sheet))
}

/// Timesheet with its daily entries
#[utoipa::path(
    get,
    path = "/api/timesheet/{timesheet_id}",
    params(
        ("timesheet_id" = u64, Path, description = "ID of the timesheet")
    ),
    responses(
        (status = 200, description = "Timesheet found", body = TimesheetWithDetails),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Timesheet not found", body = Object, example = json!({
            "message": "timesheet 7 not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Timesheet"
)]
pub async fn get_timesheet(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let owner = auth.owner_scope()?;

    let mut tx = db::begin(pool.get_ref()).await?;
    let sheet = timesheet::get_timesheet(&mut tx, path.into_inner(), owner).await?;
    db::commit(tx).await?;

    Ok(HttpResponse::Ok().json(sheet))
}
