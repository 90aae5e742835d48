// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity drives how front ends present the message.

use crate::config::{MAX_BLOCK_SIZE, MAX_C_VALUE, MIN_BLOCK_SIZE};
use crate::error::FlatscanError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The user must change an input (parameter, path) and try again.
    ActionRequired,
    /// Retrying with the same input will fail the same way.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Severity level.
    pub severity: Severity,
}

impl std::fmt::Display for HumanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.message, self.suggestion)
    }
}

/// Convert a `FlatscanError` into a `HumanError`.
pub fn humanize_error(err: &FlatscanError) -> HumanError {
    match err {
        FlatscanError::InvalidImage(detail) => HumanError {
            message: "This picture can't be cleaned up.".into(),
            suggestion: format!("Make sure the file is a normal colour photo or scan. ({detail})"),
            severity: Severity::Permanent,
        },

        FlatscanError::InvalidParameter(detail) => HumanError {
            message: "One of the settings is out of range.".into(),
            suggestion: format!(
                "Use an odd block size between {MIN_BLOCK_SIZE} and {MAX_BLOCK_SIZE} and a C value between 0 and {MAX_C_VALUE}. ({detail})"
            ),
            severity: Severity::ActionRequired,
        },

        FlatscanError::ImageError(detail) => HumanError {
            message: "Could not read or write the image.".into(),
            suggestion: format!("Check that the file is a JPEG, PNG, BMP or TIFF image and is not damaged. ({detail})"),
            severity: Severity::Permanent,
        },

        FlatscanError::UnsupportedFormat(detail) => HumanError {
            message: "That output format isn't supported.".into(),
            suggestion: format!("Save as .png, .jpg, .bmp or .tiff instead. (Requested: {detail})"),
            severity: Severity::ActionRequired,
        },

        FlatscanError::Io(io_err) => HumanError {
            message: "A file could not be opened or saved.".into(),
            suggestion: format!("Check the path exists and that you are allowed to write there. ({io_err})"),
            severity: Severity::ActionRequired,
        },

        FlatscanError::Serialization(json_err) => HumanError {
            message: "The settings file is damaged.".into(),
            suggestion: format!("Fix or delete the config file to go back to the defaults. ({json_err})"),
            severity: Severity::ActionRequired,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_parameter_is_action_required() {
        let err = FlatscanError::InvalidParameter("block size must be odd, got 4".into());
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(human.suggestion.contains("got 4"));
    }

    #[test]
    fn empty_image_is_permanent() {
        let human = humanize_error(&FlatscanError::InvalidImage("zero width".into()));
        assert_eq!(human.severity, Severity::Permanent);
    }

    #[test]
    fn missing_file_is_action_required() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let human = humanize_error(&FlatscanError::Io(io));
        assert_eq!(human.severity, Severity::ActionRequired);
    }

    #[test]
    fn display_joins_message_and_suggestion() {
        let human = humanize_error(&FlatscanError::UnsupportedFormat("webp".into()));
        let text = human.to_string();
        assert!(text.starts_with(&human.message));
        assert!(text.ends_with(&human.suggestion));
    }
}
