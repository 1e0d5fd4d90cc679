//! Sistema de manejo de errores
//!
//! Este módulo define la taxonomía de errores del ciclo de vida de reservas
//! (`BookingError`), los errores de transporte del cliente REST y el error
//! de la API HTTP (`AppError`) con su conversión a respuestas apropiadas.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Fallos de transporte (red, autenticación, respuestas inesperadas)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Not authenticated")]
    Unauthorized,

    #[error("Access denied")]
    Forbidden,

    #[error("Request timed out; the outcome is unknown, refresh the booking before retrying")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server responded with status {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Decode(String),
}

impl TransportError {
    /// Solo las lecturas idempotentes se reintentan con estos errores
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Timeout | TransportError::Network(_) => true,
            TransportError::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(self, TransportError::Unauthorized | TransportError::Forbidden)
    }
}

/// Errores del ciclo de vida de una reserva
///
/// Cada transición devuelve uno de estos valores; nunca entra en pánico.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// Entrada mal formada o fuera de rango; el usuario puede corregir el campo
    #[error("{0}")]
    Validation(String),

    /// Operación ilegal en el estado actual; se recupera refrescando el estado
    #[error("{0}")]
    InvalidState(String),

    /// Violación de la ventana de cancelación; informativo
    #[error("{0}")]
    PolicyViolation(String),

    /// Una mutación concurrente ganó la carrera; se recupera refrescando
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl BookingError {
    pub fn validation(message: impl Into<String>) -> Self {
        BookingError::Validation(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        BookingError::InvalidState(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        BookingError::Conflict(message.into())
    }

    pub fn booking_not_found(id: i64) -> Self {
        BookingError::NotFound(format!("Booking with id '{}' not found", id))
    }

    pub fn vehicle_not_found(id: i64) -> Self {
        BookingError::NotFound(format!("Vehicle with id '{}' not found", id))
    }

    /// Kilometraje por debajo del último valor conocido
    pub fn mileage_below_minimum(field: &str, minimum: Decimal) -> Self {
        BookingError::Validation(format!(
            "{} must be at least {}",
            field,
            minimum.normalize()
        ))
    }

    /// Código estable que viaja en el cuerpo de error de la API
    pub fn code(&self) -> &'static str {
        match self {
            BookingError::Validation(_) => "VALIDATION_ERROR",
            BookingError::InvalidState(_) => "INVALID_STATE",
            BookingError::PolicyViolation(_) => "POLICY_VIOLATION",
            BookingError::Conflict(_) => "CONFLICT",
            BookingError::NotFound(_) => "NOT_FOUND",
            BookingError::Transport(TransportError::Unauthorized) => "UNAUTHORIZED",
            BookingError::Transport(TransportError::Forbidden) => "FORBIDDEN",
            BookingError::Transport(_) => "TRANSPORT_ERROR",
        }
    }

    /// Reconstruye el error a partir de un código de la API
    pub fn from_code(code: &str, message: String) -> Option<Self> {
        match code {
            "VALIDATION_ERROR" | "BAD_REQUEST" => Some(BookingError::Validation(message)),
            "INVALID_STATE" => Some(BookingError::InvalidState(message)),
            "POLICY_VIOLATION" => Some(BookingError::PolicyViolation(message)),
            "CONFLICT" => Some(BookingError::Conflict(message)),
            "NOT_FOUND" => Some(BookingError::NotFound(message)),
            "UNAUTHORIZED" | "JWT_ERROR" => Some(TransportError::Unauthorized.into()),
            "FORBIDDEN" => Some(TransportError::Forbidden.into()),
            _ => None,
        }
    }
}

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("JWT error: {0}")]
    Jwt(String),
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorResponse {
    fn new(error: &str, message: String, code: &str) -> Self {
        Self {
            error: error.to_string(),
            message,
            details: None,
            code: Some(code.to_string()),
        }
    }
}

fn booking_error_response(e: BookingError) -> (StatusCode, ErrorResponse) {
    let code = e.code();
    match e {
        BookingError::Validation(msg) => (
            StatusCode::BAD_REQUEST,
            ErrorResponse::new("Validation Error", msg, code),
        ),
        BookingError::InvalidState(msg) => (
            StatusCode::CONFLICT,
            ErrorResponse::new("Invalid State", msg, code),
        ),
        BookingError::PolicyViolation(msg) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            ErrorResponse::new("Policy Violation", msg, code),
        ),
        BookingError::Conflict(msg) => (
            StatusCode::CONFLICT,
            ErrorResponse::new("Conflict", msg, code),
        ),
        BookingError::NotFound(msg) => (
            StatusCode::NOT_FOUND,
            ErrorResponse::new("Not Found", msg, code),
        ),
        BookingError::Transport(TransportError::Unauthorized) => (
            StatusCode::UNAUTHORIZED,
            ErrorResponse::new("Unauthorized", "Not authenticated".to_string(), code),
        ),
        BookingError::Transport(TransportError::Forbidden) => (
            StatusCode::FORBIDDEN,
            ErrorResponse::new("Forbidden", "Access denied".to_string(), code),
        ),
        BookingError::Transport(other) => (
            StatusCode::BAD_GATEWAY,
            ErrorResponse::new("Upstream Error", other.to_string(), code),
        ),
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) | AppError::Jwt(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Booking(e) => booking_error_response(e.clone()).0,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            AppError::Database(e) => {
                error!("❌ Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Database Error".to_string(),
                        message: "An error occurred while accessing the database".to_string(),
                        details: None,
                        code: Some("DB_ERROR".to_string()),
                    },
                )
            }

            AppError::Validation(e) => {
                warn!("⚠️ Validation error: {}", e);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "Validation Error".to_string(),
                        message: "The provided data is invalid".to_string(),
                        details: Some(json!(e)),
                        code: Some("VALIDATION_ERROR".to_string()),
                    },
                )
            }

            AppError::Booking(e) => {
                warn!("⚠️ Booking rule rejected request: {} ({})", e, e.code());
                booking_error_response(e)
            }

            AppError::Unauthorized(msg) => {
                warn!("🔒 Unauthorized access: {}", msg);
                (
                    StatusCode::UNAUTHORIZED,
                    ErrorResponse::new("Unauthorized", msg, "UNAUTHORIZED"),
                )
            }

            AppError::Forbidden(msg) => {
                warn!("🔒 Forbidden access: {}", msg);
                (
                    StatusCode::FORBIDDEN,
                    ErrorResponse::new("Forbidden", msg, "FORBIDDEN"),
                )
            }

            AppError::NotFound(msg) => {
                warn!("🔍 Resource not found: {}", msg);
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::new("Not Found", msg, "NOT_FOUND"),
                )
            }

            AppError::BadRequest(msg) => {
                warn!("⚠️ Bad request: {}", msg);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::new("Bad Request", msg, "BAD_REQUEST"),
                )
            }

            AppError::Jwt(msg) => {
                warn!("🔒 JWT error: {}", msg);
                (
                    StatusCode::UNAUTHORIZED,
                    ErrorResponse::new("JWT Error", msg, "JWT_ERROR"),
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Al cruzar la frontera del servicio local, los fallos de infraestructura
/// se ven igual que un 5xx del backend remoto.
impl From<AppError> for BookingError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Booking(e) => e,
            AppError::NotFound(msg) => BookingError::NotFound(msg),
            AppError::Validation(e) => BookingError::Validation(e.to_string()),
            AppError::BadRequest(msg) => BookingError::Validation(msg),
            AppError::Unauthorized(_) | AppError::Jwt(_) => TransportError::Unauthorized.into(),
            AppError::Forbidden(_) => TransportError::Forbidden.into(),
            AppError::Database(e) => TransportError::Server {
                status: 500,
                message: e.to_string(),
            }
            .into(),
        }
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de acceso prohibido
pub fn forbidden_error(operation: &str, reason: &str) -> AppError {
    AppError::Forbidden(format!("Cannot {}: {}", operation, reason))
}
