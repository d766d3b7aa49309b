//! Order rows.

use sqlx::SqliteConnection;
use tracing::{info, warn};

use crate::error::{AuditError, AuditResult};
use crate::models::{Order, OrderCorrection};

use super::Store;
use super::mapping::{ORDER_COLUMNS, insert_error, money_to_real, row_to_order};
use super::workers::require_worker;

impl Store {
    /// Records a completed order for an existing worker.
    ///
    /// Non-compliant orders without a reduction reason are accepted and
    /// logged; the audit reports them as inconsistent.
    pub async fn create_order(&self, order: &Order) -> AuditResult<()> {
        order.validate()?;
        let mut tx = self.pool.begin().await?;
        require_worker(&mut tx, &order.worker_id).await?;
        insert_order(&mut tx, order).await?;
        tx.commit().await?;

        if order.check_reduction_reason().is_err() {
            warn!(order_id = %order.order_id, "Non-compliant order stored without a reduction reason");
        }
        info!(
            order_id = %order.order_id,
            worker_id = %order.worker_id,
            payout = %order.payout_amount,
            compliant = order.payment_compliant,
            "Order recorded"
        );
        Ok(())
    }

    /// Fetches an order by id.
    pub async fn get_order(&self, order_id: &str) -> AuditResult<Order> {
        let mut conn = self.pool.acquire().await?;
        fetch_order(&mut conn, order_id)
            .await?
            .ok_or_else(|| AuditError::not_found("order", order_id))
    }

    /// Lists a worker's orders, most recent first.
    pub async fn list_orders_for_worker(&self, worker_id: &str) -> AuditResult<Vec<Order>> {
        let mut conn = self.pool.acquire().await?;
        require_worker(&mut conn, worker_id).await?;
        orders_for_worker(&mut conn, worker_id).await
    }

    /// Applies a corrective compliance update to a recorded order.
    ///
    /// This is the only change the store allows to an existing order.
    pub async fn correct_order_compliance(
        &self,
        order_id: &str,
        correction: &OrderCorrection,
    ) -> AuditResult<Order> {
        let mut tx = self.pool.begin().await?;
        let mut order = fetch_order(&mut tx, order_id)
            .await?
            .ok_or_else(|| AuditError::not_found("order", order_id))?;

        sqlx::query(
            "UPDATE orders SET payment_compliant = ?, reduction_reason = ? WHERE order_id = ?",
        )
        .bind(correction.payment_compliant)
        .bind(&correction.reduction_reason)
        .bind(order_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        info!(
            order_id,
            was_compliant = order.payment_compliant,
            compliant = correction.payment_compliant,
            "Order compliance corrected"
        );
        order.payment_compliant = correction.payment_compliant;
        order.reduction_reason = correction.reduction_reason.clone();
        Ok(order)
    }

    /// Deletes an order no termination log refers to.
    pub async fn delete_order(&self, order_id: &str) -> AuditResult<()> {
        let mut tx = self.pool.begin().await?;
        if fetch_order(&mut tx, order_id).await?.is_none() {
            return Err(AuditError::not_found("order", order_id));
        }

        let references: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM termination_logs WHERE related_order_id = ?")
                .bind(order_id)
                .fetch_one(&mut *tx)
                .await?;
        if references > 0 {
            return Err(AuditError::ReferencedRecord {
                entity: "order",
                id: order_id.to_string(),
                dependents: "termination_logs".to_string(),
            });
        }

        sqlx::query("DELETE FROM orders WHERE order_id = ?")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(order_id, "Order deleted");
        Ok(())
    }
}

pub(crate) async fn insert_order(conn: &mut SqliteConnection, order: &Order) -> AuditResult<()> {
    let sql = format!(
        "INSERT INTO orders ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        ORDER_COLUMNS
    );
    sqlx::query(&sql)
        .bind(&order.order_id)
        .bind(&order.worker_id)
        .bind(order.order_date)
        .bind(order.distance_km)
        .bind(order.duration_min)
        .bind(money_to_real(order.payout_amount)?)
        .bind(&order.status)
        .bind(&order.flags)
        .bind(order.payment_compliant)
        .bind(&order.reduction_reason)
        .execute(&mut *conn)
        .await
        .map_err(|e| insert_error(e, "order", &order.order_id))?;
    Ok(())
}

pub(crate) async fn fetch_order(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> AuditResult<Option<Order>> {
    let sql = format!("SELECT {} FROM orders WHERE order_id = ?", ORDER_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(row_to_order).transpose()
}

pub(crate) async fn orders_for_worker(
    conn: &mut SqliteConnection,
    worker_id: &str,
) -> AuditResult<Vec<Order>> {
    let sql = format!(
        "SELECT {} FROM orders WHERE worker_id = ? ORDER BY order_date DESC, order_id",
        ORDER_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(worker_id)
        .fetch_all(&mut *conn)
        .await?;
    rows.iter().map(row_to_order).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::{at, log, order, worker};
    use rust_decimal::Decimal;

    async fn store_with_worker() -> Store {
        let store = Store::in_memory().await.unwrap();
        store.create_worker(&worker("W1")).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_create_and_get_order() {
        let store = store_with_worker().await;
        let o1 = order("O1", "W1", 100, true, None);
        store.create_order(&o1).await.unwrap();

        let loaded = store.get_order("O1").await.unwrap();
        assert_eq!(loaded.payout_amount, Decimal::new(10000, 2));
        assert_eq!(loaded.order_date, o1.order_date);
        assert!(loaded.payment_compliant);
    }

    #[tokio::test]
    async fn test_order_for_unknown_worker_is_not_found() {
        let store = Store::in_memory().await.unwrap();
        let result = store.create_order(&order("O1", "W9", 100, true, None)).await;
        assert!(matches!(
            result,
            Err(AuditError::NotFound { entity: "worker", .. })
        ));
    }

    #[tokio::test]
    async fn test_duplicate_order_is_rejected() {
        let store = store_with_worker().await;
        store.create_order(&order("O1", "W1", 100, true, None)).await.unwrap();
        let result = store.create_order(&order("O1", "W1", 90, true, None)).await;
        assert!(matches!(
            result,
            Err(AuditError::AlreadyExists { entity: "order", .. })
        ));
    }

    #[tokio::test]
    async fn test_non_compliant_order_without_reason_is_stored() {
        let store = store_with_worker().await;
        store.create_order(&order("O2", "W1", 80, false, None)).await.unwrap();
        let loaded = store.get_order("O2").await.unwrap();
        assert!(!loaded.payment_compliant);
        assert!(loaded.reduction_reason.is_none());
    }

    #[tokio::test]
    async fn test_orders_listed_newest_first() {
        let store = store_with_worker().await;
        let mut old = order("O1", "W1", 100, true, None);
        old.order_date = at(2, 9);
        let mut new = order("O2", "W1", 100, true, None);
        new.order_date = at(9, 9);
        store.create_order(&old).await.unwrap();
        store.create_order(&new).await.unwrap();

        let ids: Vec<String> = store
            .list_orders_for_worker("W1")
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.order_id)
            .collect();
        assert_eq!(ids, vec!["O2", "O1"]);
    }

    #[tokio::test]
    async fn test_correct_order_compliance() {
        let store = store_with_worker().await;
        store.create_order(&order("O2", "W1", 80, false, None)).await.unwrap();

        let corrected = store
            .correct_order_compliance(
                "O2",
                &OrderCorrection {
                    payment_compliant: false,
                    reduction_reason: Some("late delivery".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(corrected.reduction_reason.as_deref(), Some("late delivery"));
        assert_eq!(
            store.get_order("O2").await.unwrap().reduction_reason.as_deref(),
            Some("late delivery")
        );
    }

    #[tokio::test]
    async fn test_delete_order_referenced_by_log_is_restricted() {
        let store = store_with_worker().await;
        store.create_order(&order("O1", "W1", 100, true, None)).await.unwrap();
        let mut entry = log("W1", at(3, 10), "late");
        entry.related_order_id = Some("O1".to_string());
        store.append_termination_log(&entry).await.unwrap();

        let result = store.delete_order("O1").await;
        assert!(matches!(
            result,
            Err(AuditError::ReferencedRecord { entity: "order", .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_unreferenced_order() {
        let store = store_with_worker().await;
        store.create_order(&order("O1", "W1", 100, true, None)).await.unwrap();
        store.delete_order("O1").await.unwrap();
        assert!(matches!(
            store.get_order("O1").await,
            Err(AuditError::NotFound { .. })
        ));
    }
}
