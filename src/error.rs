use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::response::{ApiResponse, Meta};

/// Failures of the order-placement transaction.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Cart not found")]
    CartNotFound,

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Invalid order status: {0}")]
    InvalidStatus(String),

    #[error("Invalid payment status: {0}")]
    InvalidPaymentStatus(String),

    #[error("Product {0} is no longer available")]
    ProductNotFound(Uuid),

    #[error("Insufficient stock for product: {name}")]
    InsufficientStock { product_id: Uuid, name: String },

    #[error("Order transaction failed")]
    TransactionFailure(#[from] sea_orm::DbErr),
}

impl OrderError {
    pub fn reason(&self) -> &'static str {
        match self {
            OrderError::CartNotFound => "cart_not_found",
            OrderError::EmptyCart => "empty_cart",
            OrderError::InvalidStatus(_) => "invalid_status",
            OrderError::InvalidPaymentStatus(_) => "invalid_payment_status",
            OrderError::ProductNotFound(_) => "product_not_found",
            OrderError::InsufficientStock { .. } => "insufficient_stock",
            OrderError::TransactionFailure(_) => "transaction_failure",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            OrderError::CartNotFound | OrderError::ProductNotFound(_) => StatusCode::NOT_FOUND,
            OrderError::EmptyCart
            | OrderError::InvalidStatus(_)
            | OrderError::InvalidPaymentStatus(_) => StatusCode::BAD_REQUEST,
            OrderError::InsufficientStock { .. } => StatusCode::CONFLICT,
            OrderError::TransactionFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Unauthorized {0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Conflict {0}")]
    Conflict(String),

    #[error("Payment gateway error {0}")]
    BadGateway(String),

    #[error("Database error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn reason(&self) -> &'static str {
        match self {
            AppError::NotFound => "not_found",
            AppError::BadRequest(_) => "bad_request",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden => "forbidden",
            AppError::Conflict(_) => "conflict",
            AppError::BadGateway(_) => "gateway_error",
            AppError::OrmError(_) => "storage_error",
            AppError::Order(err) => err.reason(),
            AppError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::OrmError(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Order(err) => err.status(),
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
    reason: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        let message = self.to_string();
        let body = ApiResponse {
            message: message.clone(),
            data: Some(ErrorData {
                error: message,
                reason: self.reason(),
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Map a unique-key violation to `Conflict`, anything else stays a storage error.
pub fn conflict_on_unique(err: sea_orm::DbErr, message: impl Into<String>) -> AppError {
    match err.sql_err() {
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(message.into()),
        _ => AppError::OrmError(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_failures_map_to_client_statuses() {
        let stock = AppError::from(OrderError::InsufficientStock {
            product_id: Uuid::nil(),
            name: "Mug".into(),
        });
        assert_eq!(stock.status(), StatusCode::CONFLICT);
        assert_eq!(stock.reason(), "insufficient_stock");

        let empty = AppError::from(OrderError::EmptyCart);
        assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
        assert_eq!(empty.reason(), "empty_cart");

        let missing = AppError::from(OrderError::CartNotFound);
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn storage_errors_stay_opaque() {
        let err = AppError::from(OrderError::TransactionFailure(sea_orm::DbErr::Custom(
            "relation \"orders\" does not exist".into(),
        )));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Order transaction failed");
    }
}
