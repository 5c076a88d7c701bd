//! Query engine: cursor connections, offset lists, counts and lookups.

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::config::{EngineConfig, PageSizePolicy};
use crate::cursor::CursorCodec;
use crate::error::{BackendError, PaginationError, Result};
use crate::filters::{compile, CompiledFilter, Predicate};
use crate::order::{compile_order, CompiledOrder};
use crate::store::{EntityStore, FetchPlan};
use crate::types::connection::{Connection, Cursor, Edge, ListPage, PageInfo};
use crate::types::ordering::OrderKey;
use crate::types::record::Record;
use crate::types::schema::{EntitySchema, Schema};

/// Arguments of a cursor-paginated request.
#[derive(Debug, Clone)]
pub struct ConnectionArgs {
    /// Row filter. Defaults to matching every row.
    pub filter: Predicate,
    /// Sort keys; must not be empty.
    pub order_by: Vec<OrderKey>,
    /// Resume strictly after this cursor.
    pub after: Option<Cursor>,
    /// Page size.
    pub first: i64,
}

impl ConnectionArgs {
    pub fn new(first: i64) -> Self {
        Self {
            filter: Predicate::always(),
            order_by: Vec::new(),
            after: None,
            first,
        }
    }

    pub fn filter(mut self, filter: Predicate) -> Self {
        self.filter = filter;
        self
    }

    pub fn order_by<I: IntoIterator<Item = OrderKey>>(mut self, keys: I) -> Self {
        self.order_by = keys.into_iter().collect();
        self
    }

    pub fn after(mut self, cursor: impl Into<Cursor>) -> Self {
        self.after = Some(cursor.into());
        self
    }

    /// Continue from a previous page's end cursor, if it had one.
    pub fn after_opt(mut self, cursor: Option<Cursor>) -> Self {
        self.after = cursor;
        self
    }
}

/// Arguments of an offset-style request.
#[derive(Debug, Clone)]
pub struct ListArgs {
    pub filter: Predicate,
    pub order_by: Vec<OrderKey>,
    pub limit: i64,
    pub offset: i64,
}

impl ListArgs {
    pub fn new(limit: i64) -> Self {
        Self {
            filter: Predicate::always(),
            order_by: Vec::new(),
            limit,
            offset: 0,
        }
    }

    pub fn filter(mut self, filter: Predicate) -> Self {
        self.filter = filter;
        self
    }

    pub fn order_by<I: IntoIterator<Item = OrderKey>>(mut self, keys: I) -> Self {
        self.order_by = keys.into_iter().collect();
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Compiled request, ready to hand to the store.
struct Prepared {
    filter: CompiledFilter,
    order: CompiledOrder,
}

/// Stateless query engine over an [`EntityStore`].
///
/// Every request is validated and compiled in full before the store is
/// called. Store errors are returned unchanged; nothing is retried.
#[derive(Debug)]
pub struct QueryEngine<S> {
    store: Arc<S>,
    schema: Arc<Schema>,
    config: EngineConfig,
}

impl<S> Clone for QueryEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            schema: Arc::clone(&self.schema),
            config: self.config.clone(),
        }
    }
}

impl<S: EntityStore> QueryEngine<S> {
    /// Create an engine with default configuration.
    pub fn new(schema: Schema, store: S) -> Self {
        Self::with_config(schema, store, EngineConfig::default())
    }

    /// Create an engine with custom configuration.
    pub fn with_config(schema: Schema, store: S, config: EngineConfig) -> Self {
        Self::from_shared(Arc::new(schema), Arc::new(store), config)
    }

    /// Create an engine over a schema and store shared with other owners.
    pub fn from_shared(schema: Arc<Schema>, store: Arc<S>, config: EngineConfig) -> Self {
        Self {
            store,
            schema,
            config,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fetch one page of `entity` rows.
    ///
    /// Fetches `first + 1` rows to decide `hasNextPage` and counts the rows
    /// matching the filter concurrently; the cursor never affects `totalCount`.
    #[instrument(skip(self, args), fields(first = args.first, resumed = args.after.is_some()))]
    pub async fn paginate(&self, entity: &str, args: &ConnectionArgs) -> Result<Connection<Record>> {
        let (first, clamped_from) = self.page_size(args.first)?;
        let prepared = self.prepare(entity, &args.filter, &args.order_by)?;
        let codec = CursorCodec::new(entity, &prepared.order, &prepared.filter);
        let plan = self.page_plan(entity, &prepared, &codec, args.after.as_ref(), first)?;

        debug!(signature = codec.signature(), limit = ?plan.limit, "fetching page");

        let (mut rows, total_count) = futures::future::try_join(
            self.bounded(self.store.fetch(&plan)),
            self.bounded(self.store.count(entity, &prepared.filter)),
        )
        .await?;

        let has_next_page = rows.len() > first;
        rows.truncate(first);

        let edges = rows
            .into_iter()
            .map(|row| {
                Ok(Edge {
                    cursor: codec.encode(&row)?,
                    node: row,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let page_info = PageInfo {
            has_next_page,
            has_previous_page: args.after.is_some(),
            start_cursor: edges.first().map(|e| e.cursor.clone()),
            end_cursor: edges.last().map(|e| e.cursor.clone()),
        };

        debug!(edges = edges.len(), total_count, has_next_page, "page assembled");

        Ok(Connection {
            edges,
            page_info,
            total_count,
            clamped_from,
        })
    }

    /// Fetch one page and convert every node into `T`.
    pub async fn paginate_as<T: DeserializeOwned>(
        &self,
        entity: &str,
        args: &ConnectionArgs,
    ) -> Result<Connection<T>> {
        self.paginate(entity, args)
            .await?
            .try_map_nodes(|record| record.deserialize_into())
    }

    /// Fetch a bounded slice of `entity` rows by limit and offset.
    ///
    /// `limit` follows the same page size policy as `paginate`; a clamped limit
    /// is reported through [`ListPage::clamped_from`].
    #[instrument(skip(self, args), fields(limit = args.limit, offset = args.offset))]
    pub async fn list(&self, entity: &str, args: &ListArgs) -> Result<ListPage<Record>> {
        let (limit, clamped_from) = self.page_size(args.limit)?;
        let offset = usize::try_from(args.offset)
            .map_err(|_| PaginationError::InvalidOffset(args.offset))?;
        let prepared = self.prepare(entity, &args.filter, &args.order_by)?;

        let plan = FetchPlan {
            entity: entity.to_string(),
            filter: prepared.filter,
            order: prepared.order,
            limit: Some(limit),
            offset,
        };
        let rows = self.bounded(self.store.fetch(&plan)).await?;
        Ok(ListPage { rows, clamped_from })
    }

    /// Number of `entity` rows matching `filter`.
    #[instrument(skip(self, filter))]
    pub async fn count(&self, entity: &str, filter: &Predicate) -> Result<u64> {
        let filter = compile(&self.schema, entity, filter)?;
        Ok(self.bounded(self.store.count(entity, &filter)).await?)
    }

    /// Look up a single row by id.
    #[instrument(skip(self))]
    pub async fn find_by_id(&self, entity: &str, id: &str) -> Result<Option<Record>> {
        let prepared = self.prepare(
            entity,
            &Predicate::eq(EntitySchema::ID_FIELD, id),
            &[OrderKey::asc(EntitySchema::ID_FIELD)],
        )?;
        let plan = FetchPlan {
            entity: entity.to_string(),
            filter: prepared.filter,
            order: prepared.order,
            limit: Some(1),
            offset: 0,
        };
        Ok(self.bounded(self.store.fetch(&plan)).await?.into_iter().next())
    }

    /// The fetch plan `paginate` would send to the store, without running it.
    pub fn explain(&self, entity: &str, args: &ConnectionArgs) -> Result<FetchPlan> {
        let (first, _) = self.page_size(args.first)?;
        let prepared = self.prepare(entity, &args.filter, &args.order_by)?;
        let codec = CursorCodec::new(entity, &prepared.order, &prepared.filter);
        self.page_plan(entity, &prepared, &codec, args.after.as_ref(), first)
    }

    fn prepare(&self, entity: &str, filter: &Predicate, order_by: &[OrderKey]) -> Result<Prepared> {
        let schema = self.schema.entity(entity)?;
        Ok(Prepared {
            filter: compile(&self.schema, entity, filter)?,
            order: compile_order(schema, order_by)?,
        })
    }

    fn page_plan(
        &self,
        entity: &str,
        prepared: &Prepared,
        codec: &CursorCodec<'_>,
        after: Option<&Cursor>,
        first: usize,
    ) -> Result<FetchPlan> {
        let filter = match after {
            Some(cursor) => prepared.filter.clone().and(CompiledFilter::After {
                order: prepared.order.clone(),
                tuple: codec.decode(cursor)?,
            }),
            None => prepared.filter.clone(),
        };
        Ok(FetchPlan {
            entity: entity.to_string(),
            filter,
            order: prepared.order.clone(),
            limit: Some(first.saturating_add(1)),
            offset: 0,
        })
    }

    /// Validate a requested page size against the configured maximum.
    ///
    /// Returns the size to serve and, when clamped, the size that was asked for.
    fn page_size(&self, requested: i64) -> std::result::Result<(usize, Option<i64>), PaginationError> {
        let size = usize::try_from(requested)
            .ok()
            .filter(|size| *size > 0)
            .ok_or(PaginationError::InvalidPageSize(requested))?;

        let max = self.config.max_page_size;
        if size <= max {
            return Ok((size, None));
        }
        match self.config.page_size_policy {
            PageSizePolicy::Reject => Err(PaginationError::PageSizeExceeded { requested, max }),
            PageSizePolicy::Clamp => {
                warn!(requested, max, "page size clamped to configured maximum");
                Ok((max, Some(requested)))
            }
        }
    }

    async fn bounded<T, F>(&self, call: F) -> std::result::Result<T, BackendError>
    where
        F: Future<Output = std::result::Result<T, BackendError>>,
    {
        match self.config.fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| BackendError::Timeout(limit))?,
            None => call.await,
        }
    }
}
