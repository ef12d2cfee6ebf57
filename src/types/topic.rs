//! Topic names and topic filters: syntactic validation and the filter-vs-name
//! matching relation, including shared subscriptions (§4.1, component C1).

/// Behavior controlling whether a leading wildcard matches a `$`-prefixed
/// topic level (MQTT 5.0 §4.7.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchOptions {
    #[default]
    WildcardsMatchDollarTopic,
    WildcardsDontMatchDollarTopic,
}

/// A publish target. Non-empty, at most 65,535 UTF-8 bytes, no `+`, `#`, or NUL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicName(String);

impl TopicName {
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        if Self::is_valid(&name) {
            Some(Self(name))
        } else {
            None
        }
    }

    pub fn is_valid(name: &str) -> bool {
        let bytes = name.as_bytes();
        !bytes.is_empty()
            && bytes.len() <= 65_535
            && !bytes.contains(&0)
            && !name.contains('+')
            && !name.contains('#')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TopicName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TopicName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A subscription pattern: like [`TopicName`] but may contain `+` as a whole
/// level or a trailing `#`, and may carry a `$share/<group>/` prefix for
/// shared subscriptions (MQTT 5.0 §4.8.2).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicFilter {
    raw: String,
    share_name: Option<String>,
    /// Byte offset into `raw` where the actual filter (after any
    /// `$share/<group>/` prefix) begins.
    filter_start: usize,
}

impl TopicFilter {
    pub fn new(filter: impl Into<String>) -> Option<Self> {
        let raw = filter.into();
        let (share_name, filter_start) = Self::parse_share_prefix(&raw)?;
        let inner = &raw[filter_start..];
        if !Self::is_valid_filter(inner) {
            return None;
        }
        Some(Self {
            raw,
            share_name,
            filter_start,
        })
    }

    pub fn is_valid(filter: &str) -> bool {
        Self::new(filter.to_string()).is_some()
    }

    fn parse_share_prefix(raw: &str) -> Option<(Option<String>, usize)> {
        const PREFIX: &str = "$share/";
        if let Some(rest) = raw.strip_prefix(PREFIX) {
            let group_end = rest.find('/')?;
            let group = &rest[..group_end];
            if group.is_empty() || group.contains(['/', '+', '#']) {
                return None;
            }
            Some((Some(group.to_string()), PREFIX.len() + group_end + 1))
        } else {
            Some((None, 0))
        }
    }

    fn is_valid_filter(filter: &str) -> bool {
        let bytes = filter.as_bytes();
        if bytes.is_empty() || bytes.contains(&0) {
            return false;
        }

        for level in filter.split('/') {
            if level.contains('#') {
                // '#' must be the final level and on its own.
                if level != "#" {
                    return false;
                }
            } else if level.contains('+') {
                // '+' must occupy the whole level.
                if level != "+" {
                    return false;
                }
            }
        }

        // '#' is only legal as the final level.
        let levels: Vec<&str> = filter.split('/').collect();
        for (i, level) in levels.iter().enumerate() {
            if *level == "#" && i != levels.len() - 1 {
                return false;
            }
        }

        true
    }

    /// The full wire-form string, including any `$share/<group>/` prefix.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The filter portion alone, with the `$share/<group>/` prefix stripped.
    pub fn filter_str(&self) -> &str {
        &self.raw[self.filter_start..]
    }

    pub fn is_shared(&self) -> bool {
        self.share_name.is_some()
    }

    pub fn share_name(&self) -> Option<&str> {
        self.share_name.as_deref()
    }

    /// Whether this filter matches `name`, per the walk rules of §4.1.
    pub fn matches(&self, name: &TopicName, option: MatchOptions) -> bool {
        matches_inner(self.filter_str(), name.as_str(), option)
    }
}

impl std::fmt::Display for TopicFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<TopicName> for TopicFilter {
    fn from(name: TopicName) -> Self {
        // A valid topic name is always a valid (non-wildcard) topic filter.
        Self {
            raw: name.0,
            share_name: None,
            filter_start: 0,
        }
    }
}

fn matches_inner(filter: &str, name: &str, option: MatchOptions) -> bool {
    let mut filter_levels = filter.split('/').peekable();
    let mut name_levels = name.split('/').peekable();

    let dollar_guarded = option == MatchOptions::WildcardsDontMatchDollarTopic
        && name_levels.peek().is_some_and(|first| first.starts_with('$'));

    loop {
        match (filter_levels.next(), name_levels.peek().copied()) {
            (Some("#"), _) => {
                // '#' matches all remaining levels, including zero.
                // A leading '#' must not match a name starting with '$'
                // when WildcardsDontMatchDollarTopic is set.
                if dollar_guarded && filter == "#" {
                    return false;
                }
                return true;
            }
            (Some("+"), Some(_)) => {
                if dollar_guarded && is_first_level(filter, "+") {
                    return false;
                }
                name_levels.next();
            }
            (Some("+"), None) => return false,
            (Some(f), Some(n)) => {
                if f != n {
                    return false;
                }
                name_levels.next();
            }
            (Some(_), None) => return false,
            (None, Some(_)) => return false,
            (None, None) => return true,
        }
    }
}

fn is_first_level(filter: &str, level: &str) -> bool {
    filter.split('/').next() == Some(level)
}
