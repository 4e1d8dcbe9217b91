use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::db;
use crate::engine::error::EngineError;
use crate::engine::overtime::{self, AccrualOutcome, AccrualRunSummary};
use crate::engine::store::TimeStore;
use crate::model::overtime_pto::EmployeeOvertimePto;
use actix_web::{HttpResponse, Responder, web};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::{error, instrument};
use utoipa::ToSchema;

/// Explicit period; both dates omitted means the last completed biweekly window.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProcessPeriod {
    #[schema(example = "2024-01-01", format = "date", value_type = Option<String>)]
    pub period_start: Option<NaiveDate>,
    #[schema(example = "2024-01-14", format = "date", value_type = Option<String>)]
    pub period_end: Option<NaiveDate>,
}

/* =========================
Accrue overtime for one employee
========================= */
#[utoipa::path(
    post,
    path = "/api/overtime/{employee_id}/process",
    params(
        ("employee_id" = u64, Path, description = "Employee to process")
    ),
    request_body(
        content = ProcessPeriod,
        description = "Optional explicit period; omit the body for the last biweekly window",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Overtime accrued", body = AccrualOutcome),
        (status = 400, description = "Invalid period"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found or inactive"),
        (status = 409, description = "Employee records busy, try again shortly")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Overtime"
)]
#[instrument(name = "process_overtime", skip_all, fields(employee_id = *path))]
pub async fn process_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    payload: Option<web::Json<ProcessPeriod>>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let employee_id = path.into_inner();
    let period = payload.map(|p| p.into_inner()).unwrap_or_default();
    let policy = config.lock_policy();

    let mut tx = db::begin(pool.get_ref()).await?;
    let outcome = match (period.period_start, period.period_end) {
        (Some(start), Some(end)) => {
            overtime::process_period(&mut tx, employee_id, start, end, &policy).await?
        }
        (None, None) => {
            overtime::process_most_recent_biweekly_period(
                &mut tx,
                employee_id,
                Local::now().date_naive(),
                &policy,
            )
            .await?
        }
        _ => {
            return Err(EngineError::invalid(
                "period_start and period_end must be given together",
            )
            .into());
        }
    };
    db::commit(tx).await?;

    Ok(HttpResponse::Ok().json(outcome))
}

/* =========================
Biweekly run over all active employees
========================= */
#[utoipa::path(
    post,
    path = "/api/overtime/process",
    responses(
        (status = 200, description = "Run finished; failures are counted, not fatal", body = AccrualRunSummary),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Overtime"
)]
pub async fn process_all(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let summary = overtime::run_for_active_employees(
        pool.get_ref(),
        Local::now().date_naive(),
        &config.lock_policy(),
    )
    .await
    .map_err(|e| {
        error!(error = ?e, "Biweekly overtime run aborted");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(summary))
}

/// Current overtime ledger of an employee
#[utoipa::path(
    get,
    path = "/api/overtime/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee id")
    ),
    responses(
        (status = 200, description = "Ledger found", body = EmployeeOvertimePto),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No overtime processed yet", body = Object, example = json!({
            "message": "overtime ledger 1000 not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Overtime"
)]
pub async fn get_ledger(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    if let Some(own) = auth.owner_scope()? {
        if own != employee_id {
            return Err(actix_web::error::ErrorForbidden("Not your overtime ledger"));
        }
    }

    let mut tx = db::begin(pool.get_ref()).await?;
    let ledger = tx
        .find_overtime_ledger(employee_id)
        .await
        .map_err(EngineError::from)?
        .ok_or(EngineError::NotFound {
            entity: "overtime ledger",
            id: employee_id,
        })?;
    db::commit(tx).await?;

    Ok(HttpResponse::Ok().json(ledger))
}
