use crate::{entities::invoice_counter, errors::ServiceError};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{instrument, warn};

const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_millis(50);

/// Issues invoice numbers from the transactional monthly counter.
///
/// One number is issued per checkout batch, not per order; every order paid
/// together shares it. Counter failures are retried with a short delay; when
/// all attempts fail a timestamp-derived fallback is used so verification can
/// proceed, trading guaranteed uniqueness for availability.
pub struct InvoiceNumberService {
    db: Arc<DatabaseConnection>,
}

impl InvoiceNumberService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Issue the next invoice number for the given instant.
    #[instrument(skip(self))]
    pub async fn issue(&self, now: DateTime<Utc>) -> String {
        for attempt in 1..=MAX_ATTEMPTS {
            match self.next_from_counter(now).await {
                Ok(number) => return number,
                Err(e) => {
                    warn!(attempt, error = %e, "Invoice counter increment failed");
                    if attempt < MAX_ATTEMPTS {
                        tokio::time::sleep(RETRY_DELAY).await;
                    }
                }
            }
        }

        let fallback = fallback_number(now);
        warn!(
            invoice_number = %fallback,
            "Invoice counter unavailable; using timestamp-derived fallback (uniqueness not guaranteed)"
        );
        fallback
    }

    async fn next_from_counter(&self, now: DateTime<Utc>) -> Result<String, ServiceError> {
        let period = now.format("%Y%m").to_string();
        let txn = self.db.begin().await?;

        let updated = invoice_counter::Entity::update_many()
            .col_expr(
                invoice_counter::Column::LastValue,
                Expr::col(invoice_counter::Column::LastValue).add(1),
            )
            .filter(invoice_counter::Column::Period.eq(period.clone()))
            .exec(&txn)
            .await?;

        if updated.rows_affected == 0 {
            // First number of the period. A concurrent first-issue loses the
            // insert with a unique violation and lands in the retry path.
            invoice_counter::ActiveModel {
                period: Set(period.clone()),
                last_value: Set(1),
            }
            .insert(&txn)
            .await?;
        }

        let counter = invoice_counter::Entity::find_by_id(period.clone())
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError("invoice counter row missing after increment".into())
            })?;

        txn.commit().await?;

        Ok(format_number(&period, counter.last_value))
    }
}

fn format_number(period: &str, sequence: i64) -> String {
    format!("INV-{}-{:04}", period, sequence)
}

/// Deterministic local fallback: period plus the last four digits of the
/// epoch-millisecond clock. Collisions are possible for two failures within
/// the same truncated window.
pub fn fallback_number(now: DateTime<Utc>) -> String {
    let suffix = now.timestamp_millis().rem_euclid(10_000);
    format!("INV-{}-{:04}", now.format("%Y%m"), suffix)
}
