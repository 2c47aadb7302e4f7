use crate::db::CharacterRow;
use crate::schema::{Context, Location};
use juniper::{FieldResult, graphql_object};
use juniper_connections::RelayConnection;

/// GraphQL type for a character.
///
/// `home` goes through the request's location loader, so listing characters costs one location
/// lookup however many of them share a home.
#[derive(RelayConnection, Debug, Eq, PartialEq, Clone)]
#[relay_connection(context = Context)]
pub struct Character {
    pub id: String,
    pub name: String,
    pub home_id: String,
}

impl From<CharacterRow> for Character {
    fn from(row: CharacterRow) -> Self {
        Character {
            id: row.id,
            name: row.name,
            home_id: row.home_id,
        }
    }
}

#[graphql_object(context = Context)]
impl Character {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    /// Where the character lives.
    async fn home(&self, ctx: &Context) -> FieldResult<Location> {
        Ok(ctx.locations().load_one(self.home_id.clone()).await?)
    }
}
