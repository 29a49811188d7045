//! Construction-time application of declared defaults.
//!
//! [`ConstructionInterceptor`] wraps a record type's base constructor. After
//! the base construction succeeds it works out which input keys the
//! authorizer let through, then assigns a default to every registered
//! attribute none of those keys covers. Assignments go straight to attribute
//! storage and their pending-change marks are discarded, so a freshly built
//! instance looks as if it had been loaded with its defaults.

use std::any::type_name;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{DefaultsError, Result};
use crate::record::{BuildOptions, Record};
use crate::registry::DefaultRegistry;
use crate::value::InputMap;

/// Policy deciding whether an allowed input key supplies an attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMatch {
    /// Only a key equal to the attribute name counts.
    Exact,

    /// An equal key, or a multi-parameter key such as `birthdate(1i)`.
    #[default]
    MultiParameter,
}

impl KeyMatch {
    pub fn supplies(&self, key: &str, attribute: &str) -> bool {
        if key == attribute {
            return true;
        }
        match self {
            KeyMatch::Exact => false,
            KeyMatch::MultiParameter => key
                .strip_prefix(attribute)
                .is_some_and(|rest| rest.starts_with('(')),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConstructionInterceptor {
    registry: Arc<DefaultRegistry>,
    key_match: KeyMatch,
    default_role: String,
}

impl ConstructionInterceptor {
    pub fn new(
        registry: Arc<DefaultRegistry>,
        key_match: KeyMatch,
        default_role: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            key_match,
            default_role: default_role.into(),
        }
    }

    pub fn registry(&self) -> &DefaultRegistry {
        &self.registry
    }

    pub fn key_match(&self) -> KeyMatch {
        self.key_match
    }

    pub fn construct<R: Record>(
        &self,
        input: Option<&InputMap>,
        options: &BuildOptions,
    ) -> Result<R> {
        self.construct_with(input, options, |_| {})
    }

    /// Build an instance, apply defaults, then run `hook` on the result.
    pub fn construct_with<R, F>(
        &self,
        input: Option<&InputMap>,
        options: &BuildOptions,
        hook: F,
    ) -> Result<R>
    where
        R: Record,
        F: FnOnce(&mut R),
    {
        let mut instance = R::construct(input, options).map_err(DefaultsError::Construction)?;

        let allowed = self.allowed_keys(&instance, input, options)?;
        debug!(
            record = type_name::<R>(),
            declared = self.registry.len(),
            allowed = allowed.len(),
            applicable = ?self.applicable(&allowed),
            "applying attribute defaults"
        );

        for (attribute, source) in self.registry.entries() {
            if self.is_supplied(attribute, &allowed) {
                continue;
            }
            let value = source
                .produce(&instance)
                .map_err(|source| DefaultsError::Producer {
                    attribute: attribute.to_string(),
                    source,
                })?;
            trace!(record = type_name::<R>(), attribute, ?value, "default assigned");
            instance
                .write_attribute(attribute, value)
                .map_err(|source| DefaultsError::Assignment {
                    attribute: attribute.to_string(),
                    source,
                })?;
            instance.discard_pending_change(attribute);
        }

        hook(&mut instance);
        Ok(instance)
    }

    /// Input keys the authorizer does not deny, in input order.
    ///
    /// Without input every registered attribute stays eligible, so the
    /// result is empty.
    pub fn allowed_keys<R: Record>(
        &self,
        instance: &R,
        input: Option<&InputMap>,
        options: &BuildOptions,
    ) -> Result<Vec<String>> {
        let Some(input) = input else {
            return Ok(Vec::new());
        };
        let role = options.role_or(&self.default_role);

        let mut allowed = Vec::with_capacity(input.len());
        for key in input.keys() {
            let denied =
                instance
                    .is_key_denied(key, role)
                    .map_err(|source| DefaultsError::Authorization {
                        key: key.clone(),
                        source,
                    })?;
            if denied {
                trace!(key = key.as_str(), role, "input key denied");
            } else {
                allowed.push(key.clone());
            }
        }
        Ok(allowed)
    }

    /// Registered attributes that would receive a default given `allowed`.
    pub fn applicable(&self, allowed: &[String]) -> Vec<&str> {
        self.registry
            .attribute_names()
            .filter(|attribute| !self.is_supplied(attribute, allowed))
            .collect()
    }

    fn is_supplied(&self, attribute: &str, allowed: &[String]) -> bool {
        allowed
            .iter()
            .any(|key| self.key_match.supplies(key, attribute))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ValueSource;
    use crate::test_utils::{input, Article};
    use crate::value::AttrValue;

    fn interceptor(registry: DefaultRegistry) -> ConstructionInterceptor {
        ConstructionInterceptor::new(Arc::new(registry), KeyMatch::MultiParameter, "default")
    }

    #[test]
    fn multi_parameter_keys_supply_their_attribute() {
        let policy = KeyMatch::MultiParameter;
        assert!(policy.supplies("birthdate", "birthdate"));
        assert!(policy.supplies("birthdate(1i)", "birthdate"));
        assert!(!policy.supplies("birthdate_note", "birthdate"));
        assert!(!policy.supplies("birth", "birthdate"));
    }

    #[test]
    fn exact_policy_ignores_multi_parameter_keys() {
        let policy = KeyMatch::Exact;
        assert!(policy.supplies("birthdate", "birthdate"));
        assert!(!policy.supplies("birthdate(1i)", "birthdate"));
    }

    #[test]
    fn defaults_apply_without_input_and_stay_clean() {
        let registry: DefaultRegistry = [("title", AttrValue::from("Untitled"))]
            .into_iter()
            .collect();
        let article: Article = interceptor(registry)
            .construct(None, &BuildOptions::default())
            .unwrap();

        assert_eq!(article.get("title"), Some(&AttrValue::from("Untitled")));
        assert!(!article.is_changed("title"));
    }

    #[test]
    fn permitted_input_wins_over_default() {
        let registry: DefaultRegistry = [("title", AttrValue::from("Untitled"))]
            .into_iter()
            .collect();
        let input = input(&[("title", AttrValue::from("Hello"))]);
        let article: Article = interceptor(registry)
            .construct(Some(&input), &BuildOptions::default())
            .unwrap();

        assert_eq!(article.get("title"), Some(&AttrValue::from("Hello")));
        assert!(article.is_changed("title"));
    }

    #[test]
    fn denied_input_is_treated_as_absent() {
        let registry: DefaultRegistry = [("state", AttrValue::from("draft"))]
            .into_iter()
            .collect();
        let input = input(&[("state", AttrValue::from("published"))]);
        let article: Article = interceptor(registry)
            .construct(Some(&input), &BuildOptions::default())
            .unwrap();

        assert_eq!(article.get("state"), Some(&AttrValue::from("draft")));
        assert!(!article.is_changed("state"));
    }

    #[test]
    fn role_is_forwarded_to_authorizer() {
        let registry: DefaultRegistry = [("state", AttrValue::from("draft"))]
            .into_iter()
            .collect();
        let input = input(&[("state", AttrValue::from("published"))]);
        let article: Article = interceptor(registry)
            .construct(Some(&input), &BuildOptions::as_role("admin"))
            .unwrap();

        assert_eq!(article.get("state"), Some(&AttrValue::from("published")));
    }

    #[test]
    fn composite_key_suppresses_default() {
        let registry: DefaultRegistry = [("published_on", AttrValue::from("1970-01-01"))]
            .into_iter()
            .collect();
        let input = input(&[("published_on(1i)", AttrValue::from("2024"))]);
        let article: Article = interceptor(registry)
            .construct(Some(&input), &BuildOptions::default())
            .unwrap();

        assert_eq!(article.get("published_on"), None);
    }

    #[test]
    fn exact_policy_defaults_despite_composite_key() {
        let registry: DefaultRegistry = [("published_on", AttrValue::from("1970-01-01"))]
            .into_iter()
            .collect();
        let interceptor =
            ConstructionInterceptor::new(Arc::new(registry), KeyMatch::Exact, "default");
        let input = input(&[("published_on(1i)", AttrValue::from("2024"))]);
        let article: Article = interceptor
            .construct(Some(&input), &BuildOptions::default())
            .unwrap();

        assert_eq!(
            article.get("published_on"),
            Some(&AttrValue::from("1970-01-01"))
        );
    }

    #[test]
    fn producers_see_earlier_defaults() {
        let mut registry = DefaultRegistry::new();
        registry.declare("title", AttrValue::from("Untitled"));
        registry.declare(
            "slug",
            ValueSource::function(|rec| {
                let title = rec
                    .read_attribute("title")
                    .and_then(AttrValue::as_text)
                    .unwrap_or_default();
                Ok(AttrValue::from(title.to_lowercase()))
            }),
        );
        let article: Article = interceptor(registry)
            .construct(None, &BuildOptions::default())
            .unwrap();

        assert_eq!(article.get("slug"), Some(&AttrValue::from("untitled")));
    }

    #[test]
    fn producer_failure_reports_attribute() {
        let mut registry = DefaultRegistry::new();
        registry.declare("title", AttrValue::from("Untitled"));
        registry.declare("slug", ValueSource::function(|_| Err("no slug".into())));

        let err = interceptor(registry)
            .construct::<Article>(None, &BuildOptions::default())
            .unwrap_err();
        assert!(matches!(err, DefaultsError::Producer { .. }));
        assert_eq!(err.attribute(), Some("slug"));
    }

    #[test]
    fn unknown_attribute_is_an_assignment_failure() {
        let registry: DefaultRegistry = [("", AttrValue::Null)].into_iter().collect();
        let err = interceptor(registry)
            .construct::<Article>(None, &BuildOptions::default())
            .unwrap_err();
        assert!(matches!(err, DefaultsError::Assignment { .. }));
        assert_eq!(err.attribute(), Some(""));
    }

    #[test]
    fn construction_failure_applies_nothing() {
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let seen = calls.clone();
        let mut registry = DefaultRegistry::new();
        registry.declare(
            "title",
            ValueSource::function(move |_| {
                seen.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Ok(AttrValue::from("x"))
            }),
        );
        let input = input(&[("fail", AttrValue::Bool(true))]);

        let err = interceptor(registry)
            .construct::<Article>(Some(&input), &BuildOptions::default())
            .unwrap_err();
        assert!(matches!(err, DefaultsError::Construction(_)));
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[test]
    fn authorizer_failure_aborts_defaulting() {
        let registry: DefaultRegistry = [("title", AttrValue::from("Untitled"))]
            .into_iter()
            .collect();
        let input = input(&[("title", AttrValue::from("Hi"))]);

        let err = interceptor(registry)
            .construct::<Article>(Some(&input), &BuildOptions::as_role("offline"))
            .unwrap_err();
        match err {
            DefaultsError::Authorization { key, .. } => assert_eq!(key, "title"),
            other => panic!("expected authorization failure, got {other:?}"),
        }
    }

    #[test]
    fn hook_sees_defaulted_instance() {
        let registry: DefaultRegistry = [("title", AttrValue::from("Untitled"))]
            .into_iter()
            .collect();
        let mut seen = None;
        let _: Article = interceptor(registry)
            .construct_with(None, &BuildOptions::default(), |article: &mut Article| {
                seen = article.get("title").cloned();
            })
            .unwrap();

        assert_eq!(seen, Some(AttrValue::from("Untitled")));
    }

    #[test]
    fn applicable_lists_unsupplied_attributes() {
        let mut registry = DefaultRegistry::new();
        registry.declare("title", AttrValue::from("Untitled"));
        registry.declare("published_on", AttrValue::Null);
        registry.declare("state", AttrValue::from("draft"));
        let interceptor = interceptor(registry);

        let allowed = vec!["title".to_string(), "published_on(2i)".to_string()];
        assert_eq!(interceptor.applicable(&allowed), vec!["state"]);
        assert_eq!(
            interceptor.applicable(&[]),
            vec!["title", "published_on", "state"]
        );
    }
}
