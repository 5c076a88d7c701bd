//! Ordering types for entity queries.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CompileError;

/// Order direction for queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

impl OrderDirection {
    pub(crate) fn token(self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

/// Where null values sort relative to non-null values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NullsPosition {
    /// Nulls last on ASC, nulls first on DESC.
    #[default]
    Default,
    /// Nulls before every non-null value.
    First,
    /// Nulls after every non-null value.
    Last,
}

/// One element of an `orderBy` list, e.g. `size_ASC_NULLS_LAST`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderKey {
    pub field: String,
    pub direction: OrderDirection,
    pub nulls: NullsPosition,
}

impl OrderKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: OrderDirection::Asc,
            nulls: NullsPosition::Default,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: OrderDirection::Desc,
            nulls: NullsPosition::Default,
        }
    }

    pub fn nulls_first(mut self) -> Self {
        self.nulls = NullsPosition::First;
        self
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls = NullsPosition::Last;
        self
    }

    /// Whether nulls sort before non-null values once defaults are applied.
    pub fn effective_nulls_first(&self) -> bool {
        match self.nulls {
            NullsPosition::First => true,
            NullsPosition::Last => false,
            NullsPosition::Default => self.direction == OrderDirection::Desc,
        }
    }

    /// Parse a list of order tokens.
    pub fn parse_all<I, S>(tokens: I) -> Result<Vec<OrderKey>, CompileError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        tokens.into_iter().map(|t| t.as_ref().parse()).collect()
    }
}

impl FromStr for OrderKey {
    type Err = CompileError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let invalid = || CompileError::InvalidOrderToken(token.to_string());

        let (rest, nulls) = if let Some(rest) = token.strip_suffix("_NULLS_FIRST") {
            (rest, NullsPosition::First)
        } else if let Some(rest) = token.strip_suffix("_NULLS_LAST") {
            (rest, NullsPosition::Last)
        } else {
            (token, NullsPosition::Default)
        };

        let (field, direction) = if let Some(field) = rest.strip_suffix("_ASC") {
            (field, OrderDirection::Asc)
        } else if let Some(field) = rest.strip_suffix("_DESC") {
            (field, OrderDirection::Desc)
        } else {
            return Err(invalid());
        };

        if field.is_empty() {
            return Err(invalid());
        }

        Ok(OrderKey {
            field: field.to_string(),
            direction,
            nulls,
        })
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.field, self.direction.token())?;
        match self.nulls {
            NullsPosition::Default => Ok(()),
            NullsPosition::First => f.write_str("_NULLS_FIRST"),
            NullsPosition::Last => f.write_str("_NULLS_LAST"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tokens() {
        let key: OrderKey = "size_ASC_NULLS_LAST".parse().unwrap();
        assert_eq!(key, OrderKey::asc("size").nulls_last());

        let key: OrderKey = "sizeDeltaUsd_DESC".parse().unwrap();
        assert_eq!(key, OrderKey::desc("sizeDeltaUsd"));

        let key: OrderKey = "market_id_DESC_NULLS_FIRST".parse().unwrap();
        assert_eq!(key.field, "market_id");
        assert_eq!(key.nulls, NullsPosition::First);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for token in ["size", "size_asc", "_ASC", "size_NULLS_LAST", ""] {
            assert_eq!(
                token.parse::<OrderKey>().unwrap_err(),
                CompileError::InvalidOrderToken(token.to_string()),
                "token {token:?}"
            );
        }
    }

    #[test]
    fn test_display_round_trips() {
        for token in ["id_ASC", "size_DESC_NULLS_LAST", "openedAt_ASC_NULLS_FIRST"] {
            assert_eq!(token.parse::<OrderKey>().unwrap().to_string(), token);
        }
    }

    #[test]
    fn test_default_null_placement() {
        assert!(!OrderKey::asc("size").effective_nulls_first());
        assert!(OrderKey::desc("size").effective_nulls_first());
        assert!(OrderKey::asc("size").nulls_first().effective_nulls_first());
        assert!(!OrderKey::desc("size").nulls_last().effective_nulls_first());
    }
}
