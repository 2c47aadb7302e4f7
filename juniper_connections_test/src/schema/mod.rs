pub use crate::schema::character::{Character, CharacterRelayConnection, CharacterRelayEdge};
pub use crate::schema::location::{
    Location, LocationFetch, LocationRelayConnection, LocationRelayEdge,
};
use crate::db::Database;
use juniper::{EmptyMutation, EmptySubscription, FieldResult, RootNode};
use juniper_connections::{
    BatchConfig, BatchResolver, LoaderScope, OffsetCursor, PageWindow, PaginationArgs,
    PaginationConfig, PaginationInput, RelayConnection, create_connection,
};
use std::sync::Arc;

mod character;
mod location;

// ---------- Context -------------

/// Per-request context. Owns the request's loader scope, so nothing loaded for one request is
/// served to another.
pub struct Context {
    pub db: Arc<Database>,
    pub pagination: PaginationConfig,
    loaders: LoaderScope,
}

impl Context {
    pub fn new(db: Arc<Database>, pagination: PaginationConfig, batch: BatchConfig) -> Self {
        Context {
            db,
            pagination,
            loaders: LoaderScope::new(batch),
        }
    }

    pub fn locations(&self) -> BatchResolver<LocationFetch> {
        self.loaders
            .get_or_create(|| LocationFetch::new(Arc::clone(&self.db)))
    }
}

impl juniper::Context for Context {}

// --------- QueryRoot ------------

pub struct QueryRoot;

#[juniper::graphql_object(context = Context)]
impl QueryRoot {
    /// Pages through all characters in the "database".
    async fn characters(
        first: Option<i32>,
        after: Option<String>,
        last: Option<i32>,
        before: Option<String>,
        offset: Option<i32>,
        ctx: &Context,
    ) -> FieldResult<CharacterRelayConnection> {
        let args: PaginationArgs = PaginationInput {
            first,
            after,
            last,
            before,
            offset,
        }
        .try_into()?;

        let connection = create_connection(&args, &ctx.pagination, |window| {
            ctx.db.characters_page(window)
        })
        .await?;
        Ok(connection)
    }

    /// Pages through all locations in the "database", taking the arguments as one input object.
    async fn locations(
        page: Option<PaginationInput>,
        ctx: &Context,
    ) -> FieldResult<LocationRelayConnection> {
        let args: PaginationArgs = page.unwrap_or_default().try_into()?;

        let connection = create_connection(&args, &ctx.pagination, |window| {
            ctx.db.locations_page(window)
        })
        .await?;
        Ok(connection)
    }

    /// The character an edge cursor from `characters` points at, `null` past the end.
    async fn character_at(cursor: OffsetCursor, ctx: &Context) -> FieldResult<Option<Character>> {
        let cursor = cursor.expect_tag(Some(CharacterRelayConnection::TYPE_TAG))?;
        let (mut page, _) = ctx
            .db
            .characters_page(PageWindow::new(cursor.offset, 1))
            .await?;
        Ok(page.pop())
    }

    /// Looks up a single location.
    async fn location(id: String, ctx: &Context) -> FieldResult<Location> {
        Ok(ctx.locations().load_one(id).await?)
    }

    /// Looks up several locations at once. Unknown ids come back as `null` without failing the
    /// others.
    async fn locations_by_ids(ids: Vec<String>, ctx: &Context) -> Vec<Option<Location>> {
        ctx.locations()
            .load_many(&ids)
            .await
            .into_iter()
            .map(|location| match location {
                Ok(location) => Some(location),
                Err(err) => {
                    tracing::debug!(%err, "location lookup failed");
                    None
                }
            })
            .collect()
    }
}

// ---------- Schema -------------

pub type Schema = RootNode<QueryRoot, EmptyMutation<Context>, EmptySubscription<Context>>;

pub fn schema() -> Schema {
    Schema::new(QueryRoot, EmptyMutation::new(), EmptySubscription::new())
}
