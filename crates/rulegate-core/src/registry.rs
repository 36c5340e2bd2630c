//! Ordered rule registry.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use tracing::debug;

use crate::rule::{Rule, RuleDefinitionError};
use crate::types::{Category, Severity};

/// Ordered collection of rules keyed by id.
///
/// Iteration order equals registration order, which keeps report output
/// stable across runs. The registry is read-only once evaluation starts and
/// is shared between worker threads without locking.
#[derive(Debug, Default)]
pub struct RuleRegistry {
    rules: IndexMap<String, Rule>,
}

impl RuleRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from rules, in order.
    ///
    /// # Errors
    ///
    /// Returns [`RuleDefinitionError::DuplicateRuleId`] on the first repeated id.
    pub fn from_rules<I>(rules: I) -> Result<Self, RuleDefinitionError>
    where
        I: IntoIterator<Item = Rule>,
    {
        let mut registry = Self::new();
        for rule in rules {
            registry.register(rule)?;
        }
        Ok(registry)
    }

    /// Registers a rule.
    ///
    /// # Errors
    ///
    /// Returns [`RuleDefinitionError::DuplicateRuleId`] if a rule with the same
    /// id is already registered; the registry is left unchanged.
    pub fn register(&mut self, rule: Rule) -> Result<(), RuleDefinitionError> {
        if self.rules.contains_key(rule.id()) {
            return Err(RuleDefinitionError::DuplicateRuleId {
                id: rule.id().to_string(),
            });
        }
        debug!(rule_id = rule.id(), category = %rule.category(), "registered rule");
        self.rules.insert(rule.id().to_string(), rule);
        Ok(())
    }

    /// Looks up a rule by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.get(id)
    }

    /// Whether a rule with `id` is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.rules.contains_key(id)
    }

    /// Registration index of a rule.
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.rules.get_index_of(id)
    }

    /// Number of registered rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterates rules in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> + '_ {
        self.rules.values()
    }

    /// Rules matching the optional category and severity, in registration order.
    pub fn rules_for(
        &self,
        category: Option<Category>,
        severity: Option<Severity>,
    ) -> impl Iterator<Item = &Rule> + '_ {
        self.rules.values().filter(move |rule| {
            category.map_or(true, |c| rule.category() == c)
                && severity.map_or(true, |s| rule.severity() == s)
        })
    }

    /// Groups rule ids by category, each group in registration order.
    #[must_use]
    pub fn by_category(&self) -> BTreeMap<Category, Vec<&str>> {
        let mut groups: BTreeMap<Category, Vec<&str>> = BTreeMap::new();
        for rule in self.rules.values() {
            groups.entry(rule.category()).or_default().push(rule.id());
        }
        groups
    }
}
