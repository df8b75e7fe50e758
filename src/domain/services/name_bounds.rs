//! Proxy name length checks.

/// A proxy name the platform would reject.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("proxy name `{name}` is shorter than {min} characters")]
    TooShort { name: String, min: usize },

    #[error("proxy name `{name}` is too long ({length} > {max} characters)")]
    TooLong { name: String, length: usize, max: usize },
}

impl NameError {
    /// Explanation posted into the channel for the system owner.
    pub fn user_message(&self, error_emoji: &str) -> String {
        match self {
            Self::TooShort { name, min } => format!(
                "{} The webhook's name, `{}`, is shorter than {} characters, and thus cannot be proxied. Please change the member name or use a longer system tag.",
                error_emoji, name, min
            ),
            Self::TooLong { name, length, max } => format!(
                "{} The webhook's name, `{}`, is too long ({} > {} characters), and thus cannot be proxied. Please change the member name, display name or server display name, or use a shorter system tag.",
                error_emoji, name, length, max
            ),
        }
    }
}

/// Enforces the platform's webhook username length limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameBoundsValidator {
    min: usize,
    max: usize,
}

impl NameBoundsValidator {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    /// Length is counted in characters, not bytes.
    pub fn validate(&self, name: &str) -> Result<(), NameError> {
        let length = name.chars().count();
        if length < self.min {
            return Err(NameError::TooShort {
                name: name.to_string(),
                min: self.min,
            });
        }
        if length > self.max {
            return Err(NameError::TooLong {
                name: name.to_string(),
                length,
                max: self.max,
            });
        }
        Ok(())
    }
}

impl Default for NameBoundsValidator {
    fn default() -> Self {
        Self::new(2, 80)
    }
}
