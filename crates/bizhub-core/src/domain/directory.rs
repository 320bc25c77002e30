//! Helpers shared by the directory entities (providers, humanitarian
//! organizations, parking services, catalog services).

use serde::Deserialize;

/// Listing filter common to every directory entity
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectoryFilter {
    pub search: Option<String>,
    pub is_active: Option<bool>,
}

/// Trims an optional text field, mapping blank values to `None`.
pub(crate) fn clean(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean() {
        assert_eq!(clean(Some("  x ".into())), Some("x".into()));
        assert_eq!(clean(Some("   ".into())), None);
        assert_eq!(clean(None), None);
    }
}
