//! Relay-style connection types returned by paginated queries.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque pagination cursor.
///
/// Clients must pass it back unchanged; its contents are not part of the API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Cursor {
    fn from(s: String) -> Self {
        Cursor(s)
    }
}

impl From<&str> for Cursor {
    fn from(s: &str) -> Self {
        Cursor(s.to_string())
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single item in a paginated result.
#[derive(Debug, Clone, Serialize)]
pub struct Edge<T> {
    /// Cursor pointing at this item.
    pub cursor: Cursor,
    pub node: T,
}

/// Information about the current page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// More matching items exist after the last edge.
    pub has_next_page: bool,
    /// The page was requested with an `after` cursor.
    pub has_previous_page: bool,
    pub start_cursor: Option<Cursor>,
    pub end_cursor: Option<Cursor>,
}

/// Paginated result set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
    pub page_info: PageInfo,
    /// Exact number of rows matching the filter, independent of the cursor.
    pub total_count: u64,
    /// Requested page size when it was clamped to the configured maximum.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clamped_from: Option<i64>,
}

impl<T> Connection<T> {
    pub fn nodes(&self) -> impl Iterator<Item = &T> {
        self.edges.iter().map(|e| &e.node)
    }

    pub fn into_nodes(self) -> Vec<T> {
        self.edges.into_iter().map(|e| e.node).collect()
    }

    /// Convert every node, keeping cursors and page info.
    pub fn try_map_nodes<U, E, F>(self, mut f: F) -> Result<Connection<U>, E>
    where
        F: FnMut(T) -> Result<U, E>,
    {
        let edges = self
            .edges
            .into_iter()
            .map(|edge| {
                Ok(Edge {
                    cursor: edge.cursor,
                    node: f(edge.node)?,
                })
            })
            .collect::<Result<Vec<_>, E>>()?;

        Ok(Connection {
            edges,
            page_info: self.page_info,
            total_count: self.total_count,
            clamped_from: self.clamped_from,
        })
    }
}

/// Rows of an offset-style request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPage<T> {
    pub rows: Vec<T>,
    /// Requested limit when it was clamped to the configured maximum.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clamped_from: Option<i64>,
}
