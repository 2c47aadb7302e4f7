use crate::edges::{Edge, RelayEdge};
use crate::pagination::{PageInfo, PageWindow, PaginationArgs, PaginationConfig};
use crate::{CursorError, DEFAULT_PAGE_SIZE, OffsetCursor};
use std::future::Future;
use thiserror::Error;

/// Paginated slice of a collection: the edges of one page, where that page sits, and how many
/// items the whole collection holds.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Connection<N> {
    pub total_count: usize,
    pub page_info: PageInfo,
    pub edges: Vec<Edge<N>>,
}

impl<N> Connection<N> {
    /// Assembles a connection from the nodes the data source returned for `window`.
    ///
    /// Node order is kept: the node at index `i` gets the cursor for `window.offset + i`.
    /// Positions saturate at `usize::MAX`.
    pub fn from_page(
        window: PageWindow,
        nodes: Vec<N>,
        total_count: usize,
        type_tag: Option<&str>,
    ) -> Self {
        let offset = window.offset;
        let returned = nodes.len();
        let end = offset.saturating_add(returned);

        let edges = nodes
            .into_iter()
            .enumerate()
            .map(|(idx, node)| {
                Edge::new(node, OffsetCursor::encode(offset.saturating_add(idx), type_tag))
            })
            .collect();

        Connection {
            total_count,
            page_info: PageInfo {
                start_cursor: OffsetCursor::encode(offset, type_tag),
                end_cursor: OffsetCursor::encode(end, type_tag),
                has_previous_page: offset > 0,
                has_next_page: end < total_count,
            },
            edges,
        }
    }

    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        self.edges.iter().map(|edge| &edge.node)
    }
}

/// Common trait for Relay connections. Will be implemented by the codegen.
pub trait RelayConnection: From<Connection<Self::NodeType>> {
    /// The type of the Edge - this will be added for you in the codegen.
    type EdgeType: RelayEdge<NodeType = Self::NodeType>;

    /// The underlying type of Node we're Connection-ing. Will be filled in for you by the codegen.
    type NodeType;

    /// Discriminator embedded in every cursor this connection hands out, usually the GraphQL
    /// name of the connection type.
    const TYPE_TAG: &'static str;
}

/// Failure while building a connection.
#[derive(Debug, Error)]
pub enum ConnectionError<E> {
    /// A cursor in the pagination arguments could not be decoded.
    #[error(transparent)]
    Cursor(#[from] CursorError),

    /// The paginate callback failed. Carried as is.
    #[error("{0}")]
    DataSource(E),
}

/// Resolves pagination arguments into a window, fetches that window through a paginate callback
/// and turns the result into a `Connection`.
///
/// ```rust
/// # use juniper_connections::{ConnectionBuilder, PaginationArgs, paginate_slice};
/// # async fn example() {
/// let items: Vec<u32> = (0..50).collect();
/// let connection = ConnectionBuilder::new("NumberConnection")
///     .default_page_size(10)
///     .build(&PaginationArgs::default(), |window| async move {
///         Ok::<_, std::convert::Infallible>(paginate_slice(&items, window))
///     })
///     .await
///     .unwrap();
///
/// assert_eq!(connection.edges.len(), 10);
/// assert!(connection.page_info.has_next_page);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionBuilder {
    type_tag: Option<String>,
    default_page_size: usize,
}

impl ConnectionBuilder {
    pub fn new(type_tag: impl Into<String>) -> Self {
        ConnectionBuilder {
            type_tag: Some(type_tag.into()),
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Builder whose cursors carry no type tag.
    pub fn untagged() -> Self {
        ConnectionBuilder {
            type_tag: None,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn default_page_size(mut self, default_page_size: usize) -> Self {
        self.default_page_size = default_page_size;
        self
    }

    pub fn with_config(self, config: &PaginationConfig) -> Self {
        self.default_page_size(config.default_page_size)
    }

    /// Resolves the window for `args`, awaits `paginate` once with it and builds the connection.
    ///
    /// `paginate` must return the nodes of the window in collection order, together with the
    /// total number of items in the collection.
    pub async fn build<N, E, F, Fut>(
        &self,
        args: &PaginationArgs,
        paginate: F,
    ) -> Result<Connection<N>, ConnectionError<E>>
    where
        F: FnOnce(PageWindow) -> Fut,
        Fut: Future<Output = Result<(Vec<N>, usize), E>>,
    {
        let type_tag = self.type_tag.as_deref();
        let window = PageWindow::resolve(args, self.default_page_size, type_tag)?;
        let (nodes, total_count) = paginate(window)
            .await
            .map_err(ConnectionError::DataSource)?;

        Ok(Connection::from_page(window, nodes, total_count, type_tag))
    }
}

/// Builds a generated connection type straight from pagination arguments, tagging cursors with
/// the connection's `TYPE_TAG`.
///
/// ```nocompile
/// async fn locations(first: Option<i32>, after: Option<String>, ctx: &Context) -> FieldResult<LocationRelayConnection> {
///     let args = PaginationInput { first, after, ..Default::default() }.try_into()?;
///     Ok(create_connection(&args, &ctx.pagination, |window| ctx.db.locations(window)).await?)
/// }
/// ```
pub async fn create_connection<C, E, F, Fut>(
    args: &PaginationArgs,
    config: &PaginationConfig,
    paginate: F,
) -> Result<C, ConnectionError<E>>
where
    C: RelayConnection,
    F: FnOnce(PageWindow) -> Fut,
    Fut: Future<Output = Result<(Vec<C::NodeType>, usize), E>>,
{
    ConnectionBuilder::new(C::TYPE_TAG)
        .with_config(config)
        .build(args, paginate)
        .await
        .map(C::from)
}

/// Paginates an in-memory slice, returning the items inside `window` and the slice length.
pub fn paginate_slice<T: Clone>(items: &[T], window: PageWindow) -> (Vec<T>, usize) {
    let page = items
        .iter()
        .skip(window.offset)
        .take(window.limit)
        .cloned()
        .collect();
    (page, items.len())
}

#[cfg(test)]
mod tests {
    use crate::{
        Connection, ConnectionBuilder, ConnectionError, CursorError, OffsetCursor, PageInfo,
        PageWindow, PaginationArgs, PaginationConfig, RelayConnection, create_connection,
        paginate_slice,
    };
    use juniper::GraphQLObject;
    use std::cell::Cell;
    use std::convert::Infallible;

    #[derive(Debug, GraphQLObject, RelayConnection, Clone, Eq, PartialEq)]
    pub struct User {
        id: i32,
    }

    #[derive(Debug, GraphQLObject, RelayConnection, Clone, Eq, PartialEq)]
    struct Draft {
        id: i32,
    }

    fn users(count: i32) -> Vec<User> {
        (0..count).map(|id| User { id }).collect()
    }

    fn cursor(offset: usize) -> Option<String> {
        Some(OffsetCursor::encode(offset, None))
    }

    #[test]
    fn connection_types_are_generated() {
        let conn = UserRelayConnection {
            total_count: 12,
            edges: vec![],
            page_info: PageInfo {
                start_cursor: "MA==".to_owned(),
                end_cursor: "MA==".to_owned(),
                has_previous_page: false,
                has_next_page: true,
            },
        };

        assert_eq!(conn.total_count, 12);
        assert_eq!(conn.edges.len(), 0);
        assert_eq!(UserRelayConnection::TYPE_TAG, "UserConnection");
    }

    #[test]
    fn from_page_assigns_cursors_by_position() {
        let conn = Connection::from_page(PageWindow::new(3, 5), users(5), 8, None);

        let cursors: Vec<_> = conn.edges.iter().map(|e| e.cursor.clone()).collect();
        let expected: Vec<_> = (3..8).map(|o| OffsetCursor::encode(o, None)).collect();
        assert_eq!(cursors, expected);
        assert_eq!(conn.nodes().map(|u| u.id).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn from_page_empty_page() {
        let conn = Connection::<User>::from_page(PageWindow::new(4, 10), vec![], 4, Some("T"));
        assert!(conn.edges.is_empty());
        assert_eq!(conn.page_info.start_cursor, conn.page_info.end_cursor);
        assert!(conn.page_info.has_previous_page);
        assert!(!conn.page_info.has_next_page);
    }

    #[tokio::test]
    async fn uses_defaults_without_args() {
        let seen = Cell::new(None);
        ConnectionBuilder::untagged()
            .default_page_size(10)
            .build(&PaginationArgs::default(), |window| {
                seen.set(Some(window));
                async { Ok::<_, Infallible>((Vec::<User>::new(), 0)) }
            })
            .await
            .unwrap();

        assert_eq!(seen.get(), Some(PageWindow::new(0, 10)));
    }

    #[tokio::test]
    async fn start_and_end_cursors() {
        let args = PaginationArgs::forward(Some(5), cursor(2));
        let conn = ConnectionBuilder::untagged()
            .build(&args, |window| async move {
                assert_eq!(window, PageWindow::new(3, 5));
                Ok::<_, Infallible>((users(5), 20))
            })
            .await
            .unwrap();

        assert_eq!(conn.total_count, 20);
        assert_eq!(conn.page_info.start_cursor, OffsetCursor::encode(3, None));
        assert_eq!(conn.page_info.end_cursor, OffsetCursor::encode(8, None));
        assert_eq!(conn.edges[0].cursor, OffsetCursor::encode(3, None));
        assert_eq!(conn.edges[4].cursor, OffsetCursor::encode(7, None));
    }

    #[tokio::test]
    async fn page_flags_follow_offset_and_total() {
        let all = users(13);
        let all = all.as_slice();
        let builder = ConnectionBuilder::new("UserConnection").default_page_size(5);

        let first = builder
            .build(&PaginationArgs::default(), |w| async move {
                Ok::<_, Infallible>(paginate_slice(all, w))
            })
            .await
            .unwrap();
        assert!(!first.page_info.has_previous_page);
        assert!(first.page_info.has_next_page);

        // `after` takes the last edge's cursor; `end_cursor` already points one past it.
        let last_edge = first.edges.last().unwrap().cursor.clone();
        let second = builder
            .build(&PaginationArgs::forward(None, Some(last_edge)), |w| async move {
                Ok::<_, Infallible>(paginate_slice(all, w))
            })
            .await
            .unwrap();
        assert!(second.page_info.has_previous_page);
        assert!(second.page_info.has_next_page);
        assert_eq!(second.nodes().map(|u| u.id).collect::<Vec<_>>(), vec![5, 6, 7, 8, 9]);

        let last_edge = second.edges.last().unwrap().cursor.clone();
        let third = builder
            .build(&PaginationArgs::forward(None, Some(last_edge)), |w| async move {
                Ok::<_, Infallible>(paginate_slice(all, w))
            })
            .await
            .unwrap();
        assert!(third.page_info.has_previous_page);
        assert!(!third.page_info.has_next_page);
        assert_eq!(third.edges.len(), 3);
    }

    #[tokio::test]
    async fn backward_pagination_clamps_at_start() {
        let all = users(30);
        let all = all.as_slice();
        let args = PaginationArgs::backward(Some(20), cursor(10));
        let conn = ConnectionBuilder::untagged()
            .build(&args, |w| async move {
                Ok::<_, Infallible>(paginate_slice(all, w))
            })
            .await
            .unwrap();

        assert_eq!(conn.edges.len(), 10);
        assert!(!conn.page_info.has_previous_page);
        assert!(conn.page_info.has_next_page);
    }

    #[tokio::test]
    async fn data_source_failure_propagates() {
        let err = ConnectionBuilder::untagged()
            .build(&PaginationArgs::default(), |_| async {
                Err::<(Vec<User>, usize), _>("database unavailable")
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ConnectionError::DataSource("database unavailable")));
        assert_eq!(err.to_string(), "database unavailable");
    }

    #[tokio::test]
    async fn invalid_cursor_skips_data_source() {
        let called = Cell::new(false);
        let args = PaginationArgs::forward(Some(1), Some("YWJj".to_owned()));
        let err = ConnectionBuilder::untagged()
            .build(&args, |_| {
                called.set(true);
                async { Ok::<_, Infallible>((Vec::<User>::new(), 0)) }
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ConnectionError::Cursor(CursorError::InvalidCursor(_))));
        assert!(!called.get());
    }

    #[tokio::test]
    async fn create_connection_tags_cursors() {
        let all = users(3);
        let all = all.as_slice();
        let conn: UserRelayConnection = create_connection(
            &PaginationArgs::default(),
            &PaginationConfig::default(),
            |w| async move { Ok::<_, Infallible>(paginate_slice(all, w)) },
        )
        .await
        .unwrap();

        assert_eq!(conn.total_count, 3);
        assert_eq!(conn.edges.len(), 3);
        assert_eq!(
            conn.edges[1].cursor,
            OffsetCursor::encode(1, Some("UserConnection"))
        );
        assert_eq!(
            conn.page_info.end_cursor,
            OffsetCursor::encode(3, Some("UserConnection"))
        );
    }

    #[tokio::test]
    async fn cursor_near_the_last_position_does_not_overflow() {
        let args = PaginationArgs::forward(Some(2), cursor(usize::MAX - 1));
        let conn = ConnectionBuilder::untagged()
            .build(&args, |_| async { Ok::<_, Infallible>((users(2), 10)) })
            .await
            .unwrap();
        assert_eq!(conn.page_info.start_cursor, OffsetCursor::encode(usize::MAX, None));
        assert_eq!(conn.page_info.end_cursor, OffsetCursor::encode(usize::MAX, None));
        assert!(!conn.page_info.has_next_page);

        let args = PaginationArgs::forward(Some(2), cursor(usize::MAX));
        let err = ConnectionBuilder::untagged()
            .build(&args, |_| async { Ok::<_, Infallible>((users(2), 10)) })
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectionError::Cursor(CursorError::InvalidCursor(_))));
    }

    #[tokio::test]
    async fn tag_with_delimiter_pages_forward() {
        let all = users(4);
        let all = all.as_slice();
        let builder = ConnectionBuilder::new("api:Users").default_page_size(2);

        let first = builder
            .build(&PaginationArgs::default(), |w| async move {
                Ok::<_, Infallible>(paginate_slice(all, w))
            })
            .await
            .unwrap();
        let last_edge = first.edges.last().unwrap().cursor.clone();

        let second = builder
            .build(&PaginationArgs::forward(None, Some(last_edge)), |w| async move {
                Ok::<_, Infallible>(paginate_slice(all, w))
            })
            .await
            .unwrap();
        assert_eq!(second.nodes().map(|u| u.id).collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn private_node_gets_connection_types() {
        let conn = DraftRelayConnection::from(Connection::from_page(
            PageWindow::new(0, 1),
            vec![Draft { id: 1 }],
            1,
            Some(DraftRelayConnection::TYPE_TAG),
        ));
        assert_eq!(conn.edges[0].node, Draft { id: 1 });
        assert_eq!(DraftRelayConnection::TYPE_TAG, "DraftConnection");
    }

    #[test]
    fn total_count_saturates_in_generated_connection() {
        let conn = UserRelayConnection::from(Connection::<User>::from_page(
            PageWindow::new(0, 0),
            vec![],
            usize::MAX,
            None,
        ));
        assert_eq!(conn.total_count, i32::MAX);
    }

    #[test]
    fn paginate_slice_past_the_end() {
        let (page, total) = paginate_slice(&users(3), PageWindow::new(5, 10));
        assert!(page.is_empty());
        assert_eq!(total, 3);
    }
}
