//! Promotion-specific error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | Unauthenticated | 401 |
//! | NotEligible | 403 |
//! | Forbidden | 403 |
//! | ValidationFailed | 400 |
//! | InvalidPlan | 400 |
//! | AlreadyActive | 400 |
//! | PaymentNotSuccessful | 400 |
//! | InvalidState | 400 |
//! | UserNotFound / GigNotFound / NotFound | 404 |
//! | InvalidWebhookSignature | 401 |
//! | PricingFailed / PaymentProvider / Infrastructure | 500 |

use crate::domain::foundation::{DomainError, ErrorCode, GigId, Timestamp, UserId};

use super::{PricingError, PromotionScope, PromotionStatus};

/// Promotion-specific errors.
#[derive(Debug, Clone, PartialEq)]
pub enum PromotionError {
    /// No caller identity on the request.
    Unauthenticated,

    UserNotFound(UserId),

    /// Caller has no seller, company or admin signal.
    NotEligible(UserId),

    /// Caller is acting on a record or gig they do not own.
    Forbidden(String),

    /// Plan key missing or not offered for the scope.
    InvalidPlan {
        scope: PromotionScope,
        key: String,
    },

    ValidationFailed {
        field: String,
        message: String,
    },

    GigNotFound(GigId),

    /// Promotion reference (current or legacy id) did not resolve.
    NotFound(String),

    /// A promotion already covers the requested scope.
    AlreadyActive {
        scope: PromotionScope,
        plan_key: String,
        expires_at: Timestamp,
        remaining_days: i64,
    },

    PricingFailed(String),

    PaymentProvider(String),

    /// Processor reports a status other than succeeded or capturable.
    PaymentNotSuccessful {
        status: String,
    },

    InvalidState {
        current: PromotionStatus,
        attempted: String,
    },

    InvalidWebhookSignature,

    Infrastructure(String),
}

impl PromotionError {
    pub fn not_eligible(user_id: UserId) -> Self {
        PromotionError::NotEligible(user_id)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        PromotionError::Forbidden(message.into())
    }

    pub fn invalid_plan(scope: PromotionScope, key: impl Into<String>) -> Self {
        PromotionError::InvalidPlan {
            scope,
            key: key.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        PromotionError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(reference: impl Into<String>) -> Self {
        PromotionError::NotFound(reference.into())
    }

    pub fn already_active(
        scope: PromotionScope,
        plan_key: impl Into<String>,
        expires_at: Timestamp,
        remaining_days: i64,
    ) -> Self {
        PromotionError::AlreadyActive {
            scope,
            plan_key: plan_key.into(),
            expires_at,
            remaining_days,
        }
    }

    pub fn payment_provider(message: impl Into<String>) -> Self {
        PromotionError::PaymentProvider(message.into())
    }

    pub fn payment_not_successful(status: impl Into<String>) -> Self {
        PromotionError::PaymentNotSuccessful {
            status: status.into(),
        }
    }

    pub fn invalid_state(current: PromotionStatus, attempted: impl Into<String>) -> Self {
        PromotionError::InvalidState {
            current,
            attempted: attempted.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        PromotionError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            PromotionError::Unauthenticated | PromotionError::InvalidWebhookSignature => {
                ErrorCode::Unauthorized
            }
            PromotionError::NotEligible(_) | PromotionError::Forbidden(_) => ErrorCode::Forbidden,
            PromotionError::InvalidPlan { .. } | PromotionError::ValidationFailed { .. } => {
                ErrorCode::ValidationFailed
            }
            PromotionError::UserNotFound(_) => ErrorCode::UserNotFound,
            PromotionError::GigNotFound(_) => ErrorCode::GigNotFound,
            PromotionError::NotFound(_) => ErrorCode::PromotionNotFound,
            PromotionError::AlreadyActive { .. } => ErrorCode::PromotionConflict,
            PromotionError::PaymentNotSuccessful { .. } | PromotionError::PaymentProvider(_) => {
                ErrorCode::PaymentProviderError
            }
            PromotionError::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            PromotionError::PricingFailed(_) => ErrorCode::InternalError,
            PromotionError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-facing error message.
    pub fn message(&self) -> String {
        match self {
            PromotionError::Unauthenticated => "You are unauthorized!".to_string(),
            PromotionError::UserNotFound(_) => "User does not exist!".to_string(),
            PromotionError::NotEligible(_) => {
                "Only sellers and companies can purchase promotion plans. Please become a seller first."
                    .to_string()
            }
            PromotionError::Forbidden(msg) => msg.clone(),
            PromotionError::InvalidPlan { key, .. } if key.trim().is_empty() => {
                "Promotion plan is required!".to_string()
            }
            PromotionError::InvalidPlan { scope, key } => {
                format!("Invalid promotion plan '{}' for {}", key, scope)
            }
            PromotionError::ValidationFailed { message, .. } => message.clone(),
            PromotionError::GigNotFound(id) => format!("Gig not found: {}", id),
            PromotionError::NotFound(_) => "Promotion not found".to_string(),
            PromotionError::AlreadyActive {
                scope: PromotionScope::AllGigs,
                ..
            } => "You already have an active promotion plan for all your gigs. Please wait until it expires before purchasing a new one."
                .to_string(),
            PromotionError::AlreadyActive {
                scope: PromotionScope::SingleGig,
                ..
            } => "This gig already has an active promotion plan. Only one promotion plan can be active per gig at a time."
                .to_string(),
            PromotionError::PricingFailed(_) => "Error calculating price breakdown".to_string(),
            PromotionError::PaymentProvider(_) => "Failed to create payment intent.".to_string(),
            PromotionError::PaymentNotSuccessful { status } => {
                format!("Payment not successful (status: {})", status)
            }
            PromotionError::InvalidState { current, attempted } => {
                format!("Cannot {} a promotion with status '{}'", attempted, current)
            }
            PromotionError::InvalidWebhookSignature => "Invalid webhook signature".to_string(),
            PromotionError::Infrastructure(_) => "Internal server error".to_string(),
        }
    }
}

impl std::fmt::Display for PromotionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // Keep the underlying cause in logs; `message()` hides it from clients.
            PromotionError::PricingFailed(cause)
            | PromotionError::PaymentProvider(cause)
            | PromotionError::Infrastructure(cause) => {
                write!(f, "{}: {}", self.message(), cause)
            }
            _ => write!(f, "{}", self.message()),
        }
    }
}

impl std::error::Error for PromotionError {}

impl From<PricingError> for PromotionError {
    fn from(err: PricingError) -> Self {
        PromotionError::PricingFailed(err.to_string())
    }
}

impl From<DomainError> for PromotionError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::PaymentProviderError => PromotionError::PaymentProvider(err.message),
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyField
            | ErrorCode::OutOfRange
            | ErrorCode::InvalidFormat => PromotionError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            ErrorCode::PromotionNotFound => PromotionError::NotFound(err.message),
            _ => PromotionError::Infrastructure(err.to_string()),
        }
    }
}

impl From<PromotionError> for DomainError {
    fn from(err: PromotionError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}
