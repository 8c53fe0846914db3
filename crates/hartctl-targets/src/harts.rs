//! Hart count handling.

use std::fmt;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TargetError};

/// Number of harts the emulated machine exposes.
///
/// The text is kept exactly as given and forwarded to `-smp`; parsing is
/// only used to check it, never to rewrite it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HartCount(String);

impl HartCount {
    /// Count used when none is given.
    pub const DEFAULT: &'static str = "4";

    /// Wrap `text` verbatim.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Take the given text, or the default when absent.
    pub fn from_input(text: Option<&str>) -> Self {
        Self::new(text.unwrap_or(Self::DEFAULT))
    }

    /// The text forwarded to the emulator.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse as a positive integer.
    pub fn parse(&self) -> Result<NonZeroU32> {
        self.0
            .parse::<NonZeroU32>()
            .map_err(|_| TargetError::InvalidHartCount {
                value: self.0.clone(),
            })
    }

    /// Whether the text is a positive integer.
    pub fn is_valid(&self) -> bool {
        self.parse().is_ok()
    }
}

impl Default for HartCount {
    fn default() -> Self {
        Self::new(Self::DEFAULT)
    }
}

impl fmt::Display for HartCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_four() {
        assert_eq!(HartCount::from_input(None).as_str(), "4");
        assert_eq!(HartCount::default().parse().unwrap().get(), 4);
    }

    #[test]
    fn text_is_kept_verbatim() {
        let harts = HartCount::from_input(Some("08"));
        assert_eq!(harts.as_str(), "08");
        assert_eq!(harts.parse().unwrap().get(), 8);
    }

    #[test]
    fn rejects_zero_and_garbage() {
        assert!(!HartCount::new("0").is_valid());
        assert!(!HartCount::new("-2").is_valid());
        assert!(!HartCount::new("four").is_valid());
        assert!(!HartCount::new("").is_valid());
        assert!(matches!(
            HartCount::new("x").parse(),
            Err(TargetError::InvalidHartCount { .. })
        ));
    }
}
