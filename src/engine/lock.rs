use std::time::Duration;

use rand::Rng;
use tracing::{debug, error, warn};

use crate::engine::error::{EngineError, LockError, StoreError};
use crate::engine::store::TimeStore;
use crate::model::employee::EmployeeRecord;

/// Multiplier applied to the delay after every failed lock attempt.
pub const BACKOFF_FACTOR: f64 = 1.5;

#[derive(Debug, Clone)]
pub struct LockPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
    /// Upper bound of the random delay added to every backoff sleep. Zero disables jitter.
    pub max_jitter: Duration,
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_jitter: Duration::ZERO,
        }
    }
}

impl LockPolicy {
    fn sleep_before_retry(&self, attempt: u32) -> Duration {
        let delay = backoff_delay(attempt, self.base_delay);
        if self.max_jitter.is_zero() {
            return delay;
        }
        let jitter_ms = rand::thread_rng().gen_range(0..=self.max_jitter.as_millis() as u64);
        delay + Duration::from_millis(jitter_ms)
    }
}

/// `base * 1.5^attempt`; attempt 0 is the wait before the first retry.
pub fn backoff_delay(attempt: u32, base: Duration) -> Duration {
    base.mul_f64(BACKOFF_FACTOR.powi(attempt as i32))
}

/// Proof that the employee row is locked in the current transaction.
///
/// Only [`acquire`] builds one; the conflict checks and write paths take it by
/// reference. The row lock itself lives until the transaction that acquired it
/// commits or rolls back, so a `LockedEmployee` must not outlive that transaction.
#[derive(Debug, Clone)]
pub struct LockedEmployee {
    employee: EmployeeRecord,
}

impl LockedEmployee {
    pub fn id(&self) -> u64 {
        self.employee.id
    }
}

/// Acquire the exclusive row lock on an employee inside the store's transaction.
///
/// Missing or inactive employees fail fast with `NotFound` before any lock is
/// requested. Contention is retried `policy.max_retries` times with exponential
/// backoff, then surfaces as [`LockError::LockTimeout`].
pub async fn acquire<S>(
    store: &mut S,
    employee_id: u64,
    policy: &LockPolicy,
) -> Result<LockedEmployee, EngineError>
where
    S: TimeStore + ?Sized,
{
    let not_found = || EngineError::NotFound {
        entity: "employee",
        id: employee_id,
    };

    let existing = store
        .find_employee(employee_id)
        .await
        .map_err(|source| store_failure(employee_id, source))?;
    match existing {
        Some(employee) if employee.is_active() => {}
        _ => return Err(not_found()),
    }

    let mut attempt: u32 = 0;
    loop {
        match store.lock_employee(employee_id).await {
            Ok(Some(employee)) => {
                debug!(employee_id, attempt, "Employee row locked");
                return Ok(LockedEmployee { employee });
            }
            // deleted between the plain read and the lock
            Ok(None) => return Err(not_found()),
            Err(StoreError::Contention(reason)) => {
                if attempt >= policy.max_retries {
                    error!(
                        employee_id,
                        attempts = attempt + 1,
                        reason = %reason,
                        "Giving up on employee row lock"
                    );
                    return Err(LockError::LockTimeout {
                        employee_id,
                        attempts: attempt + 1,
                    }
                    .into());
                }
                let delay = policy.sleep_before_retry(attempt);
                warn!(
                    employee_id,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    reason = %reason,
                    "Employee row lock contended, backing off"
                );
                actix_web::rt::time::sleep(delay).await;
                attempt += 1;
            }
            Err(other) => return Err(store_failure(employee_id, other)),
        }
    }
}

fn store_failure(employee_id: u64, source: StoreError) -> EngineError {
    error!(employee_id, error = %source, "Store failure while locking employee");
    LockError::StoreFailure { employee_id, source }.into()
}
