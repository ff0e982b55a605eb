//! Configuration error types.

use thiserror::Error;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or validating plugin configuration.
///
/// All variants are fatal: they are reported during plugin setup and are
/// never retried.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
	/// An option has an unusable value.
	#[error("invalid option `{option}`: {reason}")]
	InvalidOption {
		/// Option name as it appears in the settings file.
		option: &'static str,
		/// Why the value was rejected.
		reason: String,
	},

	/// No template extensions are configured.
	#[error("at least one template extension must be configured")]
	EmptyExtensions,

	/// Settings file could not be read.
	#[error("failed to read settings file: {0}")]
	Io(#[from] std::io::Error),

	/// Settings file is not valid TOML or has the wrong shape.
	#[error("failed to parse settings: {0}")]
	Toml(#[from] toml::de::Error),
}

impl ConfigError {
	pub(crate) fn invalid(option: &'static str, reason: impl Into<String>) -> Self {
		Self::InvalidOption {
			option,
			reason: reason.into(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_invalid_option_display() {
		let err = ConfigError::invalid("targets", "must not be empty");
		assert_eq!(
			err.to_string(),
			"invalid option `targets`: must not be empty"
		);
	}
}
