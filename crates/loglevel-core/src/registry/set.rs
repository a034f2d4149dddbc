//! Assembly of the registries a command targets.

use thiserror::Error;

use super::{LoggerRegistry, LoggerTypeTag};

/// Which logging subsystems a command addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoggerTypeSelector {
    /// Both subsystems, native first.
    #[default]
    Unspecified,
    /// Only the native subsystem.
    Native,
    /// Only the bridged subsystem.
    Bridged,
}

impl LoggerTypeSelector {
    /// Recognises the operator's selector token: `j`/`J` or `4`.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "j" | "J" => Some(Self::Native),
            "4" => Some(Self::Bridged),
            _ => None,
        }
    }

    fn tags(self) -> &'static [LoggerTypeTag] {
        match self {
            Self::Unspecified => &[LoggerTypeTag::Native, LoggerTypeTag::Bridged],
            Self::Native => &[LoggerTypeTag::Native],
            Self::Bridged => &[LoggerTypeTag::Bridged],
        }
    }
}

/// A registry identifier that cannot name a management registry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid registry identifier {id:?}: expected domain:key=value")]
pub struct InvalidRegistryId {
    /// The offending identifier.
    pub id: String,
}

/// Identifiers the two subsystems are published under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryIds {
    native: String,
    bridged: String,
}

impl RegistryIds {
    /// Validates both identifiers.
    pub fn new(native: &str, bridged: &str) -> Result<Self, InvalidRegistryId> {
        Ok(Self {
            native: validate(native)?,
            bridged: validate(bridged)?,
        })
    }

    fn id_for(&self, tag: LoggerTypeTag) -> &str {
        match tag {
            LoggerTypeTag::Native => &self.native,
            LoggerTypeTag::Bridged => &self.bridged,
        }
    }
}

fn validate(id: &str) -> Result<String, InvalidRegistryId> {
    let trimmed = id.trim();
    let well_formed = trimmed
        .split_once(':')
        .is_some_and(|(domain, properties)| !domain.is_empty() && properties.contains('='));
    if well_formed {
        Ok(trimmed.to_owned())
    } else {
        Err(InvalidRegistryId { id: id.to_owned() })
    }
}

/// The registries selected for one command, in processing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrySet {
    registries: Vec<LoggerRegistry>,
}

impl RegistrySet {
    /// Builds the handles for `selector`. No target is contacted.
    #[must_use]
    pub fn build(selector: LoggerTypeSelector, ids: &RegistryIds) -> Self {
        Self {
            registries: selector
                .tags()
                .iter()
                .map(|tag| LoggerRegistry::new(*tag, ids.id_for(*tag)))
                .collect(),
        }
    }

    /// Iterates the registries, native before bridged.
    pub fn iter(&self) -> impl Iterator<Item = &LoggerRegistry> {
        self.registries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{BRIDGED_REGISTRY, NATIVE_REGISTRY};
    use rstest::rstest;

    fn ids() -> RegistryIds {
        RegistryIds::new(NATIVE_REGISTRY, BRIDGED_REGISTRY).expect("valid ids")
    }

    #[rstest]
    #[case(LoggerTypeSelector::Unspecified, &[(LoggerTypeTag::Native, NATIVE_REGISTRY), (LoggerTypeTag::Bridged, BRIDGED_REGISTRY)])]
    #[case(LoggerTypeSelector::Native, &[(LoggerTypeTag::Native, NATIVE_REGISTRY)])]
    #[case(LoggerTypeSelector::Bridged, &[(LoggerTypeTag::Bridged, BRIDGED_REGISTRY)])]
    fn builds_selected_registries_in_order(
        #[case] selector: LoggerTypeSelector,
        #[case] expected: &[(LoggerTypeTag, &str)],
    ) {
        let set = RegistrySet::build(selector, &ids());
        let built: Vec<_> = set
            .iter()
            .map(|registry| (registry.tag(), registry.registry_id()))
            .collect();
        assert_eq!(built, expected);
    }

    #[rstest]
    #[case("j", Some(LoggerTypeSelector::Native))]
    #[case("J", Some(LoggerTypeSelector::Native))]
    #[case("4", Some(LoggerTypeSelector::Bridged))]
    #[case("5", None)]
    #[case("^com.*", None)]
    fn parses_selector_tokens(#[case] token: &str, #[case] expected: Option<LoggerTypeSelector>) {
        assert_eq!(LoggerTypeSelector::from_token(token), expected);
    }

    #[rstest]
    #[case("")]
    #[case("logging")]
    #[case(":type=Logging")]
    #[case("java.util.logging:Logging")]
    fn rejects_malformed_identifiers(#[case] id: &str) {
        assert_eq!(
            RegistryIds::new(id, BRIDGED_REGISTRY).unwrap_err(),
            InvalidRegistryId { id: id.to_owned() }
        );
    }

    #[test]
    fn identifiers_are_trimmed() {
        let ids = RegistryIds::new(" custom:type=Logging ", BRIDGED_REGISTRY).expect("valid");
        let set = RegistrySet::build(LoggerTypeSelector::Native, &ids);
        assert_eq!(
            set.iter().next().map(LoggerRegistry::registry_id),
            Some("custom:type=Logging")
        );
    }
}
