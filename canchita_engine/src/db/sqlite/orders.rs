use log::debug;
use serde_json::Value as JsonValue;
use sqlx::{types::Json, SqliteConnection};

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{NewOrder, Order, OrderStatusType},
};

const ORDER_COLUMNS: &str = "id, user_id, total, status, payment_id, purpose, gateway_response, created_at, updated_at";

pub async fn insert_order(order: &NewOrder, conn: &mut SqliteConnection) -> Result<Order, SqliteDatabaseError> {
    let q = format!(
        "INSERT INTO orders (user_id, total, purpose, payment_id) VALUES ($1, $2, $3, $4) RETURNING {ORDER_COLUMNS}"
    );
    let row = sqlx::query_as::<_, Order>(&q)
        .bind(order.user_id)
        .bind(order.total)
        .bind(Json(order.purpose.clone()))
        .bind(order.payment_id.as_deref())
        .fetch_one(conn)
        .await?;
    debug!("🗃️ Order #{} created for user {} ({})", row.id, row.user_id, row.total);
    Ok(row)
}

pub async fn attach_payment_id(
    order_id: i64,
    payment_id: &str,
    conn: &mut SqliteConnection,
) -> Result<(), SqliteDatabaseError> {
    sqlx::query("UPDATE orders SET payment_id = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(payment_id)
        .bind(order_id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn fetch_order_by_payment_id(
    payment_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SqliteDatabaseError> {
    let q = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE payment_id = $1");
    let order = sqlx::query_as::<_, Order>(&q).bind(payment_id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_orders_for_user(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, SqliteDatabaseError> {
    let q = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at ASC");
    let orders = sqlx::query_as::<_, Order>(&q).bind(user_id).fetch_all(conn).await?;
    Ok(orders)
}

/// Mark an order completed and merge the gateway response. The status guard makes the update a no-op for
/// anything but a pending order, so a duplicate webhook cannot complete an order twice.
pub async fn complete_order(
    order_id: i64,
    gateway_response: &JsonValue,
    conn: &mut SqliteConnection,
) -> Result<bool, SqliteDatabaseError> {
    let res = sqlx::query(
        "UPDATE orders SET status = $1, gateway_response = $2, updated_at = CURRENT_TIMESTAMP \
         WHERE id = $3 AND status = $4",
    )
    .bind(OrderStatusType::Completed)
    .bind(Json(gateway_response.clone()))
    .bind(order_id)
    .bind(OrderStatusType::Pending)
    .execute(conn)
    .await?;
    Ok(res.rows_affected() == 1)
}

/// Persist a non-approved gateway status observation without changing the pending/completed state
/// machine, except for terminal rejections which mark the order failed.
pub async fn record_gateway_status(
    order_id: i64,
    terminal_failure: bool,
    gateway_response: &JsonValue,
    conn: &mut SqliteConnection,
) -> Result<(), SqliteDatabaseError> {
    if terminal_failure {
        sqlx::query(
            "UPDATE orders SET status = $1, gateway_response = $2, updated_at = CURRENT_TIMESTAMP \
             WHERE id = $3 AND status = $4",
        )
        .bind(OrderStatusType::Failed)
        .bind(Json(gateway_response.clone()))
        .bind(order_id)
        .bind(OrderStatusType::Pending)
        .execute(conn)
        .await?;
    } else {
        sqlx::query("UPDATE orders SET gateway_response = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
            .bind(Json(gateway_response.clone()))
            .bind(order_id)
            .execute(conn)
            .await?;
    }
    Ok(())
}
