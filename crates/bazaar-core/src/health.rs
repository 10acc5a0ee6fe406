use axum::http::StatusCode;
use sea_orm::DatabaseConnection;

/// Liveness probe for `GET /healthz`.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Readiness check: ready once the database answers a ping.
pub async fn database_ready(db: &DatabaseConnection) -> StatusCode {
    match db.ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            ::tracing::warn!(error = %e, "readiness probe failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
