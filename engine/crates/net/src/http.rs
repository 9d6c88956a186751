use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use session::SessionId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GrantError {
    #[error("no such session")]
    UnknownSession,
    #[error("amount must be positive")]
    InvalidAmount,
}

/// Mutation point exposed to the out-of-band payment flow: credit a live
/// session's currency balance and return the new balance.
#[async_trait]
pub trait CreditSink: Send + Sync {
    async fn grant(&self, session_id: SessionId, amount: i64) -> Result<i64, GrantError>;
}

#[derive(Debug, Deserialize)]
pub struct TopupRequest {
    pub amount: i64,
}

#[derive(Debug, Serialize)]
pub struct TopupResponse {
    pub balance: i64,
}

pub fn topup_router(sink: Arc<dyn CreditSink>) -> Router {
    Router::new()
        .route("/sessions/{id}/topup", post(topup))
        .with_state(sink)
}

async fn topup(
    State(sink): State<Arc<dyn CreditSink>>,
    Path(id): Path<u64>,
    Json(req): Json<TopupRequest>,
) -> Result<Json<TopupResponse>, StatusCode> {
    match sink.grant(SessionId(id), req.amount).await {
        Ok(balance) => Ok(Json(TopupResponse { balance })),
        Err(GrantError::UnknownSession) => Err(StatusCode::NOT_FOUND),
        Err(GrantError::InvalidAmount) => Err(StatusCode::BAD_REQUEST),
    }
}

/// Serve the topup endpoint until the shutdown signal fires.
pub async fn run_topup_server(
    addr: String,
    sink: Arc<dyn CreditSink>,
    shutdown_rx: tokio::sync::watch::Receiver<bool>,
) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Topup endpoint listening on {}", addr);

    axum::serve(listener, topup_router(sink))
        .with_graceful_shutdown(async move {
            let mut rx = shutdown_rx;
            while !*rx.borrow() {
                if rx.changed().await.is_err() {
                    return;
                }
            }
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FakeSink {
        balances: Mutex<std::collections::BTreeMap<u64, i64>>,
    }

    #[async_trait]
    impl CreditSink for FakeSink {
        async fn grant(&self, session_id: SessionId, amount: i64) -> Result<i64, GrantError> {
            if amount <= 0 {
                return Err(GrantError::InvalidAmount);
            }
            let mut balances = self.balances.lock().unwrap();
            match balances.get_mut(&session_id.0) {
                Some(balance) => {
                    *balance += amount;
                    Ok(*balance)
                }
                None => Err(GrantError::UnknownSession),
            }
        }
    }

    fn sink_with_session(id: u64, balance: i64) -> Arc<FakeSink> {
        let mut balances = std::collections::BTreeMap::new();
        balances.insert(id, balance);
        Arc::new(FakeSink {
            balances: Mutex::new(balances),
        })
    }

    #[tokio::test]
    async fn grant_credits_known_session() {
        let sink = sink_with_session(3, 15);
        let result = topup(
            State(sink as Arc<dyn CreditSink>),
            Path(3),
            Json(TopupRequest { amount: 25 }),
        )
        .await;
        assert_eq!(result.unwrap().0.balance, 40);
    }

    #[tokio::test]
    async fn unknown_session_is_404() {
        let sink = sink_with_session(3, 15);
        let result = topup(
            State(sink as Arc<dyn CreditSink>),
            Path(99),
            Json(TopupRequest { amount: 25 }),
        )
        .await;
        assert_eq!(result.err(), Some(StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn non_positive_amount_is_400() {
        let sink = sink_with_session(3, 15);
        let result = topup(
            State(sink as Arc<dyn CreditSink>),
            Path(3),
            Json(TopupRequest { amount: 0 }),
        )
        .await;
        assert_eq!(result.err(), Some(StatusCode::BAD_REQUEST));
    }
}
