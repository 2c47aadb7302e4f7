use crate::cursor_errors::CursorError;
use base64::prelude::*;
use juniper::{GraphQLScalar, ParseScalarResult, ParseScalarValue, ScalarToken, ScalarValue};
use std::fmt::{Display, Formatter};

const CURSOR_SEGMENT_DELIMITER: char = ':';

/// Cursor struct that builds into an opaque string.
/// Cursors are present both in the edges and in the PageInfo within the Connection.
///
/// You can implement this trait for your own cursor type if `OffsetCursor` doesn't cover it.
///
/// This trait implements the common methods needed to be considered a `GraphQLScalar`
/// which means you can add the following to your struct and it will work
/// out of the box:
///
/// ```nocompile
/// #[derive(Debug, GraphQLScalar)]
/// #[graphql(
///     name = "MyCursor",
///     to_output_with = Self::to_output,
///     from_input_with = Self::from_input,
///     parse_token(String),
/// )]
/// struct MyCursor {}
/// impl Cursor for MyCursor { ... }
/// ```
///
pub trait Cursor {
    /// Concrete type of the returned cursor. Usually the thing that implements the trait.
    type CursorType;

    /// Serialize the cursor into a string ready to be base64 encoded.
    fn to_raw_string(&self) -> String;

    /// Constructor that given the raw (already base64 decoded) string will return a Result of the
    /// CursorType. Return a CursorError if the decoding fails.
    fn new(raw: &str) -> Result<Self::CursorType, CursorError>;

    /// Builds the CursorType from a base64 encoded string.
    /// Returns a CursorError if the decoding fails.
    fn from_encoded_string(input: &str) -> Result<Self::CursorType, CursorError> {
        let decoded = BASE64_URL_SAFE.decode(input)?;
        let decoded_string = String::from_utf8(decoded)?;
        Self::new(decoded_string.as_str())
    }

    /// Builds the base64 encoded variant of the cursor.
    /// Uses the url safe alphabet.
    fn to_encoded_string(&self) -> String {
        BASE64_URL_SAFE.encode(self.to_raw_string().as_bytes())
    }

    // ------------- GraphQLScalar implementations --------------

    fn to_output(&self) -> String {
        self.to_encoded_string()
    }

    fn from_input(input: &str) -> Result<Self::CursorType, Box<str>> {
        Self::from_encoded_string(input).map_err(|err| err.to_string().into_boxed_str())
    }

    fn parse_token<S: ScalarValue>(value: ScalarToken<'_>) -> ParseScalarResult<S> {
        <String as ParseScalarValue<S>>::from_str(value)
    }
}

/// Decodes a cursor from a base64 encoded string into the correct concrete instance type.
/// Use the Turbofish `::<>()` syntax to tell the method what that correct type is.
///
/// ```rust
/// use juniper_connections::{cursor_from_encoded_string, OffsetCursor};
///
/// let decoded_cursor = cursor_from_encoded_string::<OffsetCursor>("MTA=").unwrap();
/// assert_eq!(decoded_cursor.offset, 10);
/// ```
pub fn cursor_from_encoded_string<T>(input: &str) -> Result<T, CursorError>
where
    T: Cursor<CursorType = T>,
{
    T::from_encoded_string(input)
}

/// Position of an item within an ordered collection, optionally tagged with the connection it
/// was issued for.
///
/// Encodes as base64 of `offset` or `tag:offset`. The offset is always the last segment, so tags
/// may themselves contain `:`. An empty tag is the same as no tag.
///
/// Offsets shift when the underlying collection changes, so cursors are only stable for as long
/// as the collection is.
#[derive(Debug, GraphQLScalar, Default, Clone, Eq, PartialEq, Hash)]
#[graphql(
    name = "OffsetCursor",
    to_output_with = Self::to_output,
    from_input_with = Self::from_input,
    parse_token_with = Self::parse_token,
)]
pub struct OffsetCursor {
    /// Zero based position of the item.
    pub offset: usize,

    /// Discriminator for the collection the cursor belongs to.
    pub type_tag: Option<String>,
}

impl OffsetCursor {
    pub fn new(offset: usize, type_tag: Option<&str>) -> Self {
        OffsetCursor {
            offset,
            type_tag: type_tag.filter(|tag| !tag.is_empty()).map(str::to_owned),
        }
    }

    /// Untagged cursor for `offset`.
    pub fn at(offset: usize) -> Self {
        OffsetCursor {
            offset,
            type_tag: None,
        }
    }

    /// Encodes `offset` (and the tag, if any) straight into the opaque wire string.
    pub fn encode(offset: usize, type_tag: Option<&str>) -> String {
        Self::new(offset, type_tag).to_encoded_string()
    }

    /// Decodes an opaque cursor string.
    pub fn decode(input: &str) -> Result<OffsetCursor, CursorError> {
        Self::from_encoded_string(input)
    }

    /// Decodes a cursor and checks that it was issued for `type_tag`.
    ///
    /// Untagged cursors are accepted for any tag; a cursor carrying a different tag is rejected.
    pub fn decode_expecting(
        input: &str,
        type_tag: Option<&str>,
    ) -> Result<OffsetCursor, CursorError> {
        Self::decode(input)?.expect_tag(type_tag)
    }

    /// Checks an already decoded cursor against `type_tag`, with the same rules as
    /// `decode_expecting`.
    pub fn expect_tag(self, type_tag: Option<&str>) -> Result<OffsetCursor, CursorError> {
        if let (Some(expected), Some(found)) = (type_tag, self.type_tag.as_deref())
            && expected != found
        {
            return Err(CursorError::TypeMismatch {
                expected: expected.to_string(),
                found: found.to_string(),
            });
        }
        Ok(self)
    }
}

impl Cursor for OffsetCursor {
    type CursorType = OffsetCursor;

    fn to_raw_string(&self) -> String {
        match &self.type_tag {
            Some(tag) => format!("{}{}{}", tag, CURSOR_SEGMENT_DELIMITER, self.offset),
            None => self.offset.to_string(),
        }
    }

    fn new(raw: &str) -> Result<OffsetCursor, CursorError> {
        let (type_tag, offset) = match raw.rsplit_once(CURSOR_SEGMENT_DELIMITER) {
            None => (None, raw),
            Some((tag, offset)) if !tag.is_empty() => (Some(tag.to_string()), offset),
            Some(_) => {
                return Err(CursorError::InvalidCursor(format!(
                    "`{raw}` is not of the form `offset` or `tag:offset`"
                )));
            }
        };

        // Digits only: `usize::from_str` would also take a leading `+`.
        let not_an_offset =
            || CursorError::InvalidCursor(format!("`{offset}` is not a non-negative offset"));
        if offset.is_empty() || !offset.bytes().all(|b| b.is_ascii_digit()) {
            return Err(not_an_offset());
        }
        let offset = offset.parse::<usize>().map_err(|_| not_an_offset())?;

        Ok(OffsetCursor { offset, type_tag })
    }
}

impl Display for OffsetCursor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_raw_string())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Cursor, CursorError, OffsetCursor};
    use juniper::{EmptyMutation, EmptySubscription, RootNode, Variables, graphql_value};

    struct Query;

    #[juniper::graphql_object]
    impl Query {
        fn next(cursor: OffsetCursor) -> OffsetCursor {
            OffsetCursor {
                offset: cursor.offset + 1,
                ..cursor
            }
        }
    }

    fn scalar_schema() -> RootNode<Query, EmptyMutation, EmptySubscription> {
        RootNode::new(Query, EmptyMutation::new(), EmptySubscription::new())
    }

    #[test]
    fn test_new_offset_with_tag() {
        let cursor = OffsetCursor::new(1, Some("UserConnection"));
        assert_eq!(cursor.offset, 1);
        assert_eq!(cursor.type_tag.as_deref(), Some("UserConnection"));
    }

    #[test]
    fn test_offset_cursor_default() {
        let cursor = OffsetCursor::default();
        assert_eq!(cursor.offset, 0);
        assert_eq!(cursor.type_tag, None);
    }

    #[test]
    fn test_offset_cursor_raw_string() {
        assert_eq!(OffsetCursor::at(10).to_string(), "10");
        assert_eq!(
            OffsetCursor::new(10, Some("UserConnection")).to_string(),
            "UserConnection:10"
        );
    }

    #[test]
    fn test_offset_cursor_encoded_string() {
        assert_eq!(OffsetCursor::encode(10, None), "MTA=");
        assert_eq!(
            OffsetCursor::encode(10, Some("UserConnection")),
            "VXNlckNvbm5lY3Rpb246MTA="
        );
    }

    #[test]
    fn test_offset_cursor_from_encoded_string() {
        let cursor = OffsetCursor::decode("VXNlckNvbm5lY3Rpb246MTA=").unwrap();
        assert_eq!(cursor, OffsetCursor::new(10, Some("UserConnection")));

        let bare = OffsetCursor::decode("MTA=").unwrap();
        assert_eq!(bare, OffsetCursor::at(10));
    }

    #[test]
    fn test_decode_reverses_encode() {
        for offset in [0, 1, 7, 20, 4096, usize::MAX] {
            for tag in [None, Some("UserConnection"), Some("x"), Some("api:v2:Users")] {
                let decoded = OffsetCursor::decode(&OffsetCursor::encode(offset, tag)).unwrap();
                assert_eq!(decoded.offset, offset);
                assert_eq!(decoded.type_tag.as_deref(), tag);
            }
        }
    }

    #[test]
    fn test_non_numeric_offset_is_invalid() {
        // "abc"
        let err = OffsetCursor::decode("YWJj").unwrap_err();
        assert!(matches!(err, CursorError::InvalidCursor(_)));

        // "User:x"
        let err = OffsetCursor::decode("VXNlcjp4").unwrap_err();
        assert!(matches!(err, CursorError::InvalidCursor(_)));
    }

    #[test]
    fn test_negative_offset_is_invalid() {
        // "-1"
        let err = OffsetCursor::decode("LTE=").unwrap_err();
        assert!(matches!(err, CursorError::InvalidCursor(_)));
    }

    #[test]
    fn test_offset_is_the_last_segment() {
        // "a:b:1"
        let cursor = OffsetCursor::decode("YTpiOjE=").unwrap();
        assert_eq!(cursor, OffsetCursor::new(1, Some("a:b")));

        // "a:1:b"
        let err = OffsetCursor::decode("YToxOmI=").unwrap_err();
        assert!(matches!(err, CursorError::InvalidCursor(_)));
    }

    #[test]
    fn test_empty_tag() {
        let cursor = OffsetCursor::new(5, Some(""));
        assert_eq!(cursor, OffsetCursor::at(5));
        assert_eq!(OffsetCursor::encode(5, Some("")), OffsetCursor::encode(5, None));
        assert_eq!(
            OffsetCursor::decode(&OffsetCursor::encode(5, Some(""))).unwrap(),
            OffsetCursor::at(5)
        );

        // ":4"
        let err = OffsetCursor::decode("OjQ=").unwrap_err();
        assert!(matches!(err, CursorError::InvalidCursor(_)));
    }

    #[test]
    fn test_signed_offset_is_invalid() {
        // "+5"
        let err = OffsetCursor::decode("KzU=").unwrap_err();
        assert!(matches!(err, CursorError::InvalidCursor(_)));

        // "User:+5"
        let err = OffsetCursor::decode("VXNlcjorNQ==").unwrap_err();
        assert!(matches!(err, CursorError::InvalidCursor(_)));

        // "User:"
        let err = OffsetCursor::decode("VXNlcjo=").unwrap_err();
        assert!(matches!(err, CursorError::InvalidCursor(_)));
    }

    #[test]
    fn test_garbage_is_invalid() {
        assert!(matches!(
            OffsetCursor::decode("not base64!"),
            Err(CursorError::InvalidCursor(_))
        ));
        // Valid base64, invalid UTF-8.
        assert!(matches!(
            OffsetCursor::decode("__4="),
            Err(CursorError::InvalidCursor(_))
        ));
        assert!(matches!(
            OffsetCursor::decode(""),
            Err(CursorError::InvalidCursor(_))
        ));
    }

    #[test]
    fn test_decode_expecting_rejects_foreign_tag() {
        let cursor = OffsetCursor::encode(4, Some("UserConnection"));
        let err = OffsetCursor::decode_expecting(&cursor, Some("PostConnection")).unwrap_err();
        assert_eq!(
            err,
            CursorError::TypeMismatch {
                expected: "PostConnection".to_string(),
                found: "UserConnection".to_string(),
            }
        );

        assert!(OffsetCursor::decode_expecting(&cursor, Some("UserConnection")).is_ok());
        assert!(OffsetCursor::decode_expecting(&cursor, None).is_ok());
        assert!(OffsetCursor::decode_expecting("MTA=", Some("PostConnection")).is_ok());
    }

    #[tokio::test]
    async fn test_scalar_round_trips_through_graphql() {
        // "UserConnection:10" in, "UserConnection:11" out.
        let (value, errors) = juniper::execute(
            r#"{ next(cursor: "VXNlckNvbm5lY3Rpb246MTA=") }"#,
            None,
            &scalar_schema(),
            &Variables::new(),
            &(),
        )
        .await
        .unwrap();

        assert!(errors.is_empty());
        assert_eq!(value, graphql_value!({ "next": "VXNlckNvbm5lY3Rpb246MTE=" }));
    }

    #[tokio::test]
    async fn test_scalar_rejects_malformed_input() {
        let result = juniper::execute(
            r#"{ next(cursor: "garbage") }"#,
            None,
            &scalar_schema(),
            &Variables::new(),
            &(),
        )
        .await;

        if let Ok((_, errors)) = result {
            assert!(!errors.is_empty());
        }
    }
}
