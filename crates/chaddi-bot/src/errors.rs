// SPDX-FileCopyrightText: 2026 Chaddi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The single mapping from [`ChaddiError`] kinds to chat replies.

use chaddi_core::{ChaddiError, ChatEvent, text::escape_html};
use tracing::{error, warn};

/// Generic reply for system failures.
pub const SOMETHING_WENT_WRONG: &str = "Something went wrong!";

/// The reply for a failed handler. System errors are logged here with the
/// command, chat and user they happened for.
pub fn reply_for_error(err: &ChaddiError, command: &str, event: &ChatEvent) -> String {
    let chat_id = event.chat.id.0;
    let account_id = event.sender.as_ref().map(|s| s.id.0);
    match err {
        ChaddiError::InvalidInput(message) => message.clone(),
        ChaddiError::NotFound { entity, key } => {
            format!("Couldn't find {} <code>{}</code>!", entity, escape_html(key))
        }
        ChaddiError::PermissionDenied { action, message } => {
            warn!(command, chat_id, ?account_id, action = %action, message = %message, "permission denied");
            format!(
                "I'm not allowed to {}... please check the group permissions!",
                escape_html(action)
            )
        }
        ChaddiError::Config(_)
        | ChaddiError::Storage { .. }
        | ChaddiError::Platform { .. }
        | ChaddiError::Timeout { .. }
        | ChaddiError::Scheduler(_)
        | ChaddiError::Internal(_) => {
            error!(command, chat_id, ?account_id, error = %err, "command failed");
            SOMETHING_WENT_WRONG.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaddi_test_utils::events;

    fn event() -> ChatEvent {
        events::group_text(-1, 7, "/daan")
    }

    #[test]
    fn invalid_input_is_shown_verbatim() {
        let err = ChaddiError::InvalidInput("Kitna ₹okda be???".into());
        assert_eq!(reply_for_error(&err, "daan", &event()), "Kitna ₹okda be???");
    }

    #[test]
    fn not_found_names_the_entity() {
        let err = ChaddiError::not_found("account", "<ghost>");
        assert_eq!(
            reply_for_error(&err, "daan", &event()),
            "Couldn't find account <code>&lt;ghost&gt;</code>!"
        );
    }

    #[test]
    fn permission_errors_ask_for_rights() {
        let err = ChaddiError::PermissionDenied {
            action: "kick member".into(),
            message: "not enough rights".into(),
        };
        let reply = reply_for_error(&err, "roll", &event());
        assert!(reply.contains("kick member"));
        assert!(reply.ends_with("please check the group permissions!"));
    }

    #[test]
    fn system_errors_are_generic() {
        for err in [
            ChaddiError::Internal("boom".into()),
            ChaddiError::Timeout {
                duration: std::time::Duration::from_secs(30),
            },
            ChaddiError::storage(std::io::Error::other("disk")),
        ] {
            assert_eq!(reply_for_error(&err, "gamble", &event()), SOMETHING_WENT_WRONG);
        }
    }
}
