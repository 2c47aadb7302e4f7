use crate::schema::{Character, Location};
use juniper_connections::{PageWindow, paginate_slice};
use std::sync::Mutex;
use thiserror::Error;

/// "Database" row for a character.
#[derive(Clone)]
pub struct CharacterRow {
    pub id: String,
    pub name: String,
    pub home_id: String,
}

/// "Database" row for a location.
#[derive(Clone)]
pub struct LocationRow {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum DbError {
    #[error("No location found with id `{0}`")]
    LocationNotFound(String),
}

/// In-memory stand in for a real data store. Keeps a log of the location lookups it served so
/// the tests can check how they were batched.
#[derive(Default)]
pub struct Database {
    characters: Vec<CharacterRow>,
    locations: Vec<LocationRow>,
    location_batches: Mutex<Vec<Vec<String>>>,
}

impl Database {
    pub fn new(characters: Vec<CharacterRow>, locations: Vec<LocationRow>) -> Self {
        Database {
            characters,
            locations,
            location_batches: Mutex::new(Vec::new()),
        }
    }

    pub fn with_test_data() -> Self {
        Self::new(get_character_test_data(), get_location_test_data())
    }

    /// `SELECT ... LIMIT window.limit OFFSET window.offset` plus the total count.
    pub async fn characters_page(
        &self,
        window: PageWindow,
    ) -> Result<(Vec<Character>, usize), DbError> {
        let (rows, total) = paginate_slice(&self.characters, window);
        Ok((rows.into_iter().map(Character::from).collect(), total))
    }

    pub async fn locations_page(
        &self,
        window: PageWindow,
    ) -> Result<(Vec<Location>, usize), DbError> {
        let (rows, total) = paginate_slice(&self.locations, window);
        Ok((rows.into_iter().map(Location::from).collect(), total))
    }

    /// `SELECT ... WHERE id IN (...)`, one result per id in the order asked for.
    pub async fn locations_by_id(&self, ids: &[String]) -> Vec<Result<LocationRow, DbError>> {
        self.location_batches
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(ids.to_vec());

        ids.iter()
            .map(|id| {
                self.locations
                    .iter()
                    .find(|row| &row.id == id)
                    .cloned()
                    .ok_or_else(|| DbError::LocationNotFound(id.clone()))
            })
            .collect()
    }

    pub fn location_batches(&self) -> Vec<Vec<String>> {
        self.location_batches
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

// ----------- Test data ------------------

pub fn get_character_test_data() -> Vec<CharacterRow> {
    [
        ("gustave", "Gustave", "lumiere"),
        ("maelle", "Maelle", "lumiere"),
        ("lune", "Lune", "lumiere"),
        ("sciel", "Sciel", "lumiere"),
        ("monoco", "Monoco", "monocos-station"),
        ("esquie", "Esquie", "esquies-nest"),
        ("verso", "Verso", "lumiere"),
    ]
    .into_iter()
    .map(|(id, name, home_id)| CharacterRow {
        id: id.to_string(),
        name: name.to_string(),
        home_id: home_id.to_string(),
    })
    .collect()
}

pub fn get_location_test_data() -> Vec<LocationRow> {
    vec![
        LocationRow {
            id: "lumiere".to_string(),
            name: "Lumiére".to_string(),
        },
        LocationRow {
            id: "esquies-nest".to_string(),
            name: "Esquie's Nest".to_string(),
        },
        LocationRow {
            id: "monocos-station".to_string(),
            name: "Monoco's Station".to_string(),
        },
    ]
}
