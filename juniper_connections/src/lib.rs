//! Library for offset based Relay pagination and per-request batch loading, providing Derive
//! macros, structs and traits to help with building a Relay compliant GraphQL server.
//!
//! For use with the Juniper GraphQL framework.
//!
//! # Connections and Edges
//!
//! Define your normal entity struct (the `node` in Relay parlance) and then use the
//! `#[derive(RelayConnection)]` macro to generate the `Connection` and `Edge` structs, wired into
//! the `GraphQLObject` etc macros.
//!
//! ```rust
//! use juniper::GraphQLObject;
//! use juniper_connections::RelayConnection;
//!
//! #[derive(Debug, GraphQLObject, RelayConnection, Clone, Eq, PartialEq)]
//! struct PlayableCharacter {
//!     pub name: String,
//!     pub theme_song: String,
//! }
//! ```
//!
//! With the following types generated for the GraphQL schema:
//!
//! ```graphql
//! type PlayableCharacterConnection {
//!     totalCount: Int!
//!     pageInfo: PageInfo!
//!     edges: [PlayableCharacterEdge!]!
//! }
//!
//! type PlayableCharacterEdge {
//!     cursor: String!
//!     node: PlayableCharacter!
//! }
//! ```
//!
//! **Notes**:
//! - The struct has `RelayConnection` and `RelayEdge` as the suffix to help avoid collisions with your code.
//! - GraphQL types have `Connection` and `Edge` as the suffix to conform to Relay.
//! - The GraphQL name of the connection doubles as the type tag inside its cursors, so a cursor
//!   from `PlayableCharacterConnection` is rejected by any other connection.
//!
//! ## Building Connection responses
//!
//! `create_connection` does the whole round trip: it turns the client's pagination arguments
//! into an `OFFSET`/`LIMIT` window, hands that window to your data access, and builds the edges,
//! `PageInfo` and total count from what comes back.
//!
//! ```nocompile
//! async fn locations(first: Option<i32>, after: Option<String>, ctx: &Context) -> FieldResult<LocationRelayConnection> {
//!     let args: PaginationArgs = PaginationInput { first, after, ..Default::default() }.try_into()?;
//!     Ok(create_connection(&args, &ctx.pagination, |window| ctx.db.locations(window)).await?)
//! }
//! ```
//!
//! `ConnectionBuilder` is the same thing without the generated types, returning a generic
//! `Connection<N>`.
//!
//! # Pagination
//!
//! ## Windows
//!
//! `PageWindow::resolve` is forward biased:
//!
//! - `first` items starting one past the `after` cursor (or at the raw `offset`).
//! - Without `after`, `last` items ending at the `before` cursor. When that would start before
//!   the collection does, the window shrinks to start at `0`.
//! - Neither, and the window starts at `0` with the default page size (20 unless configured).
//!
//! ## PageInfo
//!
//! ```graphql
//! type PageInfo {
//!     startCursor: String!
//!     endCursor: String!
//!     hasPreviousPage: Boolean!
//!     hasNextPage: Boolean!
//! }
//! ```
//!
//! **Note**: `endCursor` points one past the last returned item, not at it.
//!
//! ## Cursors
//!
//! Relay requires edges and pagination info to contain opaque strings called "cursors".
//! `OffsetCursor` encodes an offset, optionally tagged with the connection it belongs to.
//!
//! ```
//! use juniper_connections::{Cursor, OffsetCursor};
//!
//! let cursor = OffsetCursor::new(10, Some("UserConnection"));
//!
//! // "UserConnection:10"
//! let raw = cursor.to_raw_string();
//!
//! // base64 of the raw string
//! let encoded = cursor.to_encoded_string();
//!
//! let decoded = OffsetCursor::decode(&encoded).unwrap();
//! assert_eq!(decoded.offset, 10);
//! ```
//!
//! # Batch loading
//!
//! Implement `BatchFetch` once per entity type and load through a `BatchResolver`. Keys requested
//! together are fetched together, each at most once, and results are cached until the resolver
//! is dropped or cleared. A `LoaderScope` in the request context hands out one resolver per
//! fetcher type.
//!
//! # Example App
//!
//! You can see the library in action in the example app in `/juniper_connections_test`.
//!
//! This app is also what's used for the integration tests.
//!

extern crate self as juniper_connections;

mod batch;
mod connections;
mod cursor_errors;
mod cursors;
mod edges;
mod loaders;
mod pagination;

// From other crates in the workspace:
pub use juniper_connections_codegen::RelayConnection;

// From this crate:
pub use batch::{BatchConfig, BatchFetch, BatchResolver, LoadError, LoadResult};
pub use connections::*;
pub use cursor_errors::*;
pub use cursors::*;
pub use edges::*;
pub use loaders::*;
pub use pagination::*;
