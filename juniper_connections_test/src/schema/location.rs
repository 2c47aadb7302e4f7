use crate::db::{Database, DbError, LocationRow};
use async_trait::async_trait;
use juniper::GraphQLObject;
use juniper_connections::{BatchFetch, RelayConnection};
use std::sync::Arc;

/// GraphQL type for a location.
#[derive(GraphQLObject, RelayConnection, Debug, Eq, PartialEq, Clone)]
pub struct Location {
    pub id: String,
    pub name: String,
}

/// Implement From to give a cleaner experience;
impl From<LocationRow> for Location {
    fn from(row: LocationRow) -> Self {
        Location {
            id: row.id,
            name: row.name,
        }
    }
}

/// Batch lookup of locations by id.
pub struct LocationFetch {
    db: Arc<Database>,
}

impl LocationFetch {
    pub fn new(db: Arc<Database>) -> Self {
        LocationFetch { db }
    }
}

#[async_trait]
impl BatchFetch for LocationFetch {
    type Key = String;
    type Value = Location;
    type Error = DbError;

    async fn load(
        &self,
        keys: &[String],
    ) -> Result<Vec<Option<Result<Location, DbError>>>, DbError> {
        Ok(self
            .db
            .locations_by_id(keys)
            .await
            .into_iter()
            .map(|row| Some(row.map(Location::from)))
            .collect())
    }
}
