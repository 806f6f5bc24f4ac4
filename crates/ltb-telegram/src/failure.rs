//! Maps teloxide request failures onto the core error taxonomy.

use teloxide::{ApiError, RequestError};

use ltb_core::report::{ErrorCategory, ErrorReport};

pub fn classify(err: &RequestError) -> ErrorReport {
    match err {
        RequestError::Api(api) => ErrorReport::new(api_category(api), api.to_string()),
        RequestError::MigrateToChatId(new_id) => ErrorReport::new(
            ErrorCategory::ChatMigrated,
            format!("chat migrated, new id: {new_id:?}"),
        ),
        RequestError::RetryAfter(after) => ErrorReport::new(
            ErrorCategory::GenericPlatformError,
            format!("flood control, retry after {after:?}"),
        ),
        RequestError::Network(e) if e.is_timeout() => {
            ErrorReport::new(ErrorCategory::TimedOut, e.to_string())
        }
        RequestError::Network(e) => ErrorReport::new(ErrorCategory::NetworkError, e.to_string()),
        RequestError::Io(e) => ErrorReport::new(ErrorCategory::NetworkError, e.to_string()),
        other => ErrorReport::new(ErrorCategory::GenericPlatformError, other.to_string()),
    }
}

fn api_category(api: &ApiError) -> ErrorCategory {
    match api {
        // teloxide reports a revoked/invalid token as `NotFound` ("Unauthorized").
        ApiError::NotFound
        | ApiError::BotBlocked
        | ApiError::BotKicked
        | ApiError::BotKickedFromSupergroup
        | ApiError::UserDeactivated
        | ApiError::CantInitiateConversation
        | ApiError::CantTalkWithBots => ErrorCategory::Unauthorized,
        ApiError::Unknown(_) => ErrorCategory::GenericPlatformError,
        _ => ErrorCategory::BadRequest,
    }
}
