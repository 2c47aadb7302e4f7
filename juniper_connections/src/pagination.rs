use crate::OffsetCursor;
use crate::cursor_errors::CursorError;
use juniper::{GraphQLInputObject, GraphQLObject};
use serde::Deserialize;
use thiserror::Error;

/// Page size used when the client asks for neither `first` nor `last`.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Represents the Relay pagination object
/// <https://relay.dev/docs/guides/graphql-server-specification/>
///
/// Unlike cursors of the last edge, `end_cursor` marks the position one past the last returned
/// item. On an empty page it equals `start_cursor`.
#[derive(Debug, GraphQLObject, Eq, PartialEq, Clone)]
#[graphql(description = "Provides info about the current page")]
pub struct PageInfo {
    /// Cursor referencing the beginning of the page
    #[graphql(description = "Cursor referencing the beginning of the page")]
    pub start_cursor: String,

    /// Cursor referencing the end of the page
    #[graphql(description = "Cursor referencing the end of the page")]
    pub end_cursor: String,

    /// Indicates whether there is a page preceding this one
    #[graphql(description = "Indicates whether there is a page preceding this one")]
    pub has_previous_page: bool,

    /// Indicates whether there is a page following this current one
    #[graphql(description = "Indicates whether there is a page following this current one")]
    pub has_next_page: bool,
}

/// Validated pagination arguments as supplied by the client.
///
/// Cursors are kept in their opaque, encoded form; they are decoded when the window is resolved.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct PaginationArgs {
    pub after: Option<String>,
    pub before: Option<String>,
    pub first: Option<usize>,
    pub last: Option<usize>,
    pub offset: Option<usize>,
}

impl PaginationArgs {
    /// Forward pagination: `first` items after the `after` cursor.
    pub fn forward(first: Option<usize>, after: Option<String>) -> Self {
        PaginationArgs {
            first,
            after,
            ..Default::default()
        }
    }

    /// Backward pagination: `last` items before the `before` cursor.
    pub fn backward(last: Option<usize>, before: Option<String>) -> Self {
        PaginationArgs {
            last,
            before,
            ..Default::default()
        }
    }
}

/// Represents the pagination arguments as they arrive over GraphQL.
///
/// ```graphql
///  query {
///      locations(first: 10, after: "MTA=") {
///          totalCount
///      }
///  }
/// ```
///
/// Counts arrive as `Int`, so convert into `PaginationArgs` with `try_into()` before resolving a
/// window; negative counts are rejected there.
#[derive(Debug, GraphQLInputObject, Default, Eq, PartialEq, Clone)]
#[graphql(description = "Pagination arguments")]
pub struct PaginationInput {
    #[graphql(description = "Cursor to the item after which first n items will be taken")]
    pub after: Option<String>,

    #[graphql(description = "Number of items to take after the `after` cursor")]
    pub first: Option<i32>,

    #[graphql(description = "Cursor to the item before which last n items will be taken")]
    pub before: Option<String>,

    #[graphql(description = "Number of items to take before the `before` cursor")]
    pub last: Option<i32>,

    #[graphql(description = "Raw offset to start from, ignored when `after` is given")]
    pub offset: Option<i32>,
}

/// Errors raised while validating pagination arguments.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum PaginationError {
    #[error("Argument `{name}` must be non-negative, got {value}")]
    NegativeArgument { name: &'static str, value: i32 },
}

fn non_negative(name: &'static str, value: Option<i32>) -> Result<Option<usize>, PaginationError> {
    value
        .map(|v| usize::try_from(v).map_err(|_| PaginationError::NegativeArgument { name, value: v }))
        .transpose()
}

impl TryFrom<PaginationInput> for PaginationArgs {
    type Error = PaginationError;

    fn try_from(input: PaginationInput) -> Result<Self, Self::Error> {
        Ok(PaginationArgs {
            first: non_negative("first", input.first)?,
            last: non_negative("last", input.last)?,
            offset: non_negative("offset", input.offset)?,
            after: input.after,
            before: input.before,
        })
    }
}

/// Pagination settings shared by the connections of an application.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Number of items returned when the client does not ask for a count.
    pub default_page_size: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        PaginationConfig {
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Concrete `OFFSET`/`LIMIT` pair to query the data source with.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct PageWindow {
    pub offset: usize,
    pub limit: usize,
}

impl PageWindow {
    pub fn new(offset: usize, limit: usize) -> Self {
        PageWindow { offset, limit }
    }

    /// Translates client pagination arguments into a window.
    ///
    /// Forward pagination is the default. `after` overrides the raw `offset` and starts the
    /// window one past the cursor. Without `after`, a `before` cursor ends the window at the
    /// cursor, shrinking it to fit when it would start before the collection does.
    ///
    /// Cursors tagged for a connection other than `type_tag` are rejected.
    pub fn resolve(
        args: &PaginationArgs,
        default_page_size: usize,
        type_tag: Option<&str>,
    ) -> Result<PageWindow, CursorError> {
        let mut limit = args.first.unwrap_or(default_page_size);
        let mut offset = args.offset.unwrap_or(0);

        if let Some(after) = &args.after {
            let after_offset = OffsetCursor::decode_expecting(after, type_tag)?.offset;
            offset = after_offset.checked_add(1).ok_or_else(|| {
                CursorError::InvalidCursor(format!("no position follows offset {after_offset}"))
            })?;
        } else if let Some(before) = &args.before {
            let before_offset = OffsetCursor::decode_expecting(before, type_tag)?.offset;
            limit = args.last.unwrap_or(limit);
            match before_offset.checked_sub(limit) {
                Some(start) => offset = start,
                None => {
                    limit = before_offset;
                    offset = 0;
                }
            }
        }

        tracing::debug!(offset, limit, "resolved page window");
        Ok(PageWindow { offset, limit })
    }
}
