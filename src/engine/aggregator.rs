use tracing::debug;

use crate::engine::error::EngineError;
use crate::engine::store::TimeStore;
use crate::model::timesheet::TimesheetDetail;

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Sum of `hours_worked`, rounded to 2 decimal places. Order of `details` is irrelevant.
pub fn total_hours(details: &[TimesheetDetail]) -> f64 {
    round2(details.iter().map(|d| d.hours_worked).sum())
}

/// Recompute `Timesheet.total_hours` from its detail rows and persist it.
///
/// Safe to call any number of times; callers run it after every detail mutation.
pub async fn recompute<S>(store: &mut S, timesheet_id: u64) -> Result<f64, EngineError>
where
    S: TimeStore + ?Sized,
{
    if store.find_timesheet(timesheet_id).await?.is_none() {
        return Err(EngineError::NotFound {
            entity: "timesheet",
            id: timesheet_id,
        });
    }

    let details = store.timesheet_details(timesheet_id).await?;
    let total = total_hours(&details);
    store.set_timesheet_total(timesheet_id, total).await?;

    debug!(timesheet_id, total, rows = details.len(), "Timesheet total recomputed");
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::memory_store::MemoryStore;
    use crate::model::status::TimesheetStatus;

    #[actix_web::test]
    async fn recompute_is_idempotent() {
        let mut store = MemoryStore::new();
        let id = store.seed_timesheet(1, "2024-01-15", TimesheetStatus::Draft);
        store.seed_detail(id, "2024-01-15", 8.25);
        store.seed_detail(id, "2024-01-16", 9.5);
        store.seed_detail(id, "2024-01-17", 7.75);

        let first = recompute(&mut store, id).await.unwrap();
        let second = recompute(&mut store, id).await.unwrap();
        assert_eq!(first, 25.5);
        assert_eq!(first, second);
        assert_eq!(store.timesheet(id).total_hours, 25.5);
    }

    #[actix_web::test]
    async fn empty_timesheet_totals_zero() {
        let mut store = MemoryStore::new();
        let id = store.seed_timesheet(1, "2024-01-15", TimesheetStatus::Draft);
        assert_eq!(recompute(&mut store, id).await.unwrap(), 0.0);
    }

    #[actix_web::test]
    async fn missing_timesheet_is_not_found() {
        let mut store = MemoryStore::new();
        let err = recompute(&mut store, 99).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound { entity: "timesheet", id: 99 }));
    }

    #[test]
    fn total_ignores_arrival_order() {
        let mut store = MemoryStore::new();
        for (day, hours) in [("2024-01-15", 0.1), ("2024-01-16", 0.2), ("2024-01-17", 7.33)] {
            store.seed_detail(1, day, hours);
        }
        let forward = total_hours(&store.details);
        store.details.reverse();
        assert_eq!(forward, total_hours(&store.details));
        assert_eq!(forward, 7.63);
    }
}
