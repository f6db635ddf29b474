//! List-size limit tables.

use std::collections::HashMap;

use glob::Pattern;
use parking_lot::RwLock;
use serde::Deserialize;
use tracing::debug;

use crate::casemap;
use crate::error::ConfigError;

/// One limit rule: channels matching `pattern` get `limit` entries.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LimitRule {
    /// Glob over the (case-folded) channel name. Write patterns in
    /// lowercase; they are matched against the folded name.
    pub pattern: String,
    /// Maximum entries for matching channels.
    pub limit: usize,
}

/// Raw list-limit configuration.
///
/// ```toml
/// default_limit = 100
///
/// [rules]
/// b = [
///     { pattern = "#big*", limit = 500 },
///     { pattern = "#*", limit = 60 },
/// ]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ListLimitsConfig {
    /// Fallback when no rule matches (default: 100).
    #[serde(default = "default_list_limit")]
    pub default_limit: usize,
    /// Per-letter rule tables. Keys are single mode letters; rules are
    /// evaluated in declared order.
    #[serde(default)]
    pub rules: HashMap<String, Vec<LimitRule>>,
}

impl Default for ListLimitsConfig {
    fn default() -> Self {
        Self {
            default_limit: default_list_limit(),
            rules: HashMap::new(),
        }
    }
}

fn default_list_limit() -> usize {
    100
}

/// Compiled limit table with per-channel memoization.
#[derive(Debug)]
pub struct ListLimits {
    default_limit: usize,
    compiled: HashMap<char, Vec<(Pattern, usize)>>,
    cache: RwLock<HashMap<(char, String), usize>>,
}

impl ListLimits {
    /// Compile a configuration, validating every pattern up front.
    pub fn new(config: &ListLimitsConfig) -> Result<Self, ConfigError> {
        let mut compiled = HashMap::with_capacity(config.rules.len());
        for (key, rules) in &config.rules {
            let mut chars = key.chars();
            let letter = match (chars.next(), chars.next()) {
                (Some(letter), None) => letter,
                _ => return Err(ConfigError::BadModeKey { key: key.clone() }),
            };
            let mut table = Vec::with_capacity(rules.len());
            for rule in rules {
                let pattern =
                    Pattern::new(&rule.pattern).map_err(|source| ConfigError::BadPattern {
                        letter,
                        pattern: rule.pattern.clone(),
                        source,
                    })?;
                table.push((pattern, rule.limit));
            }
            compiled.insert(letter, table);
        }
        Ok(Self {
            default_limit: config.default_limit,
            compiled,
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// The fallback limit when no rule matches.
    #[must_use]
    pub fn default_limit(&self) -> usize {
        self.default_limit
    }

    /// Effective limit for one list mode on one channel.
    ///
    /// The first matching rule in declared order wins; rules never
    /// combine. The result is memoized per `(letter, channel)` until
    /// [`rehash`](Self::rehash).
    #[must_use]
    pub fn resolve(&self, letter: char, channel: &str) -> usize {
        let folded = casemap::fold(channel);
        if let Some(hit) = self.cache.read().get(&(letter, folded.clone())) {
            return *hit;
        }

        let resolved = self
            .compiled
            .get(&letter)
            .and_then(|rules| {
                rules
                    .iter()
                    .find(|(pattern, _)| pattern.matches(&folded))
                    .map(|(_, limit)| *limit)
            })
            .unwrap_or(self.default_limit);

        self.cache.write().insert((letter, folded), resolved);
        resolved
    }

    /// Swap in a freshly compiled table. Memoized lookups are discarded;
    /// in-flight list state is untouched and over-limit lists simply stop
    /// accepting new entries.
    pub fn rehash(&mut self, config: &ListLimitsConfig) -> Result<(), ConfigError> {
        let next = Self::new(config)?;
        self.default_limit = next.default_limit;
        self.compiled = next.compiled;
        self.cache.get_mut().clear();
        debug!("list limit tables rehashed");
        Ok(())
    }
}
