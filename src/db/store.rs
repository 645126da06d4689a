use std::collections::HashSet;
use std::path::Path;

use itertools::Itertools;
use rusqlite::{params, Connection, OptionalExtension, ToSql, Transaction};
use serde::{Deserialize, Serialize};

// Field widths of the aircraft table. Values derived from feed records
// are capped to these before they are written.
pub const REGISTRATION_MAX_LEN: usize = 16;
pub const TYPE_MAX_LEN: usize = 50;
pub const AIRLINE_MAX_LEN: usize = 100;
pub const COUNTRY_MAX_LEN: usize = 100;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS aircraft (
    registration TEXT PRIMARY KEY,
    type TEXT NOT NULL DEFAULT '',
    airline TEXT NOT NULL DEFAULT '',
    country TEXT NOT NULL DEFAULT ''
);
";

/// A persisted aircraft row, keyed by registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aircraft {
    pub registration: String,
    #[serde(rename = "type")]
    pub aircraft_type: String,
    pub airline: String,
    pub country: String,
}

pub struct AircraftStore {
    conn: Connection,
}

impl AircraftStore {
    pub fn open<P: AsRef<Path>>(path: P) -> rusqlite::Result<AircraftStore> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> rusqlite::Result<AircraftStore> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> rusqlite::Result<AircraftStore> {
        conn.execute_batch(SCHEMA)?;
        Ok(AircraftStore { conn })
    }

    pub fn transaction(&mut self) -> rusqlite::Result<Transaction<'_>> {
        self.conn.transaction()
    }

    pub fn get(&self, registration: &str) -> rusqlite::Result<Option<Aircraft>> {
        get(&self.conn, registration)
    }

    pub fn all(&self) -> rusqlite::Result<Vec<Aircraft>> {
        all(&self.conn)
    }

    pub fn count(&self) -> rusqlite::Result<i64> {
        count(&self.conn)
    }
}

pub fn get(conn: &Connection, registration: &str) -> rusqlite::Result<Option<Aircraft>> {
    conn.query_row(
        "SELECT registration, type, airline, country FROM aircraft WHERE registration = ?1",
        params![registration],
        |row| {
            Ok(Aircraft {
                registration: row.get(0)?,
                aircraft_type: row.get(1)?,
                airline: row.get(2)?,
                country: row.get(3)?,
            })
        },
    )
    .optional()
}

pub fn all(conn: &Connection) -> rusqlite::Result<Vec<Aircraft>> {
    let mut stmt = conn.prepare(
        "SELECT registration, type, airline, country FROM aircraft ORDER BY registration",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(Aircraft {
            registration: row.get(0)?,
            aircraft_type: row.get(1)?,
            airline: row.get(2)?,
            country: row.get(3)?,
        })
    })?;

    rows.collect()
}

pub fn count(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM aircraft", [], |row| row.get(0))
}

pub fn create(conn: &Connection, aircraft: &Aircraft) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO aircraft (registration, type, airline, country) VALUES (?1, ?2, ?3, ?4)",
        params![
            aircraft.registration,
            aircraft.aircraft_type,
            aircraft.airline,
            aircraft.country
        ],
    )?;

    Ok(())
}

/// Write only the given columns of one aircraft row.
pub fn update(conn: &Connection, registration: &str, changes: &[(&str, &str)]) -> rusqlite::Result<()> {
    let assignments = changes
        .iter()
        .enumerate()
        .map(|(i, (column, _))| format!("{} = ?{}", column, i + 1))
        .join(", ");
    let sql = format!(
        "UPDATE aircraft SET {} WHERE registration = ?{}",
        assignments,
        changes.len() + 1
    );

    let mut values: Vec<&dyn ToSql> = changes.iter().map(|(_, value)| value as &dyn ToSql).collect();
    values.push(&registration);
    conn.execute(&sql, &values[..])?;

    Ok(())
}

/// Delete every aircraft whose registration is not in `seen` and return
/// the number of deleted rows.
///
/// The seen set is staged in a temp table so the statement stays clear
/// of SQLite's bound-parameter limit for large batches.
pub fn delete_missing(conn: &Connection, seen: &HashSet<String>) -> rusqlite::Result<usize> {
    conn.execute_batch(
        "CREATE TEMP TABLE IF NOT EXISTS seen_registrations (registration TEXT PRIMARY KEY);
         DELETE FROM seen_registrations;",
    )?;

    {
        let mut stmt =
            conn.prepare("INSERT OR IGNORE INTO seen_registrations (registration) VALUES (?1)")?;
        for registration in seen {
            stmt.execute(params![registration])?;
        }
    }

    let removed = conn.execute(
        "DELETE FROM aircraft
         WHERE registration NOT IN (SELECT registration FROM seen_registrations)",
        [],
    )?;
    conn.execute("DELETE FROM seen_registrations", [])?;

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aircraft(registration: &str, airline: &str) -> Aircraft {
        Aircraft {
            registration: registration.to_string(),
            aircraft_type: "A320-214".to_string(),
            airline: airline.to_string(),
            country: "United Kingdom".to_string(),
        }
    }

    #[test]
    fn test_create_and_get() {
        let store = AircraftStore::open_in_memory().unwrap();
        create(&store.conn, &aircraft("G-EZTH", "EasyJet")).unwrap();

        let row = store.get("G-EZTH").unwrap().unwrap();
        assert_eq!(row.airline, "EasyJet");
        assert_eq!(row.aircraft_type, "A320-214");

        assert!(store.get("G-XXXX").unwrap().is_none());
    }

    #[test]
    fn test_update_writes_only_given_columns() {
        let store = AircraftStore::open_in_memory().unwrap();
        create(&store.conn, &aircraft("G-EZTH", "EasyJet")).unwrap();

        update(&store.conn, "G-EZTH", &[("airline", "EasyJet Europe")]).unwrap();

        let row = store.get("G-EZTH").unwrap().unwrap();
        assert_eq!(row.airline, "EasyJet Europe");
        assert_eq!(row.aircraft_type, "A320-214");
        assert_eq!(row.country, "United Kingdom");
    }

    #[test]
    fn test_all_is_ordered_by_registration() {
        let store = AircraftStore::open_in_memory().unwrap();
        create(&store.conn, &aircraft("N12345", "Southwest")).unwrap();
        create(&store.conn, &aircraft("EI-DCL", "Ryanair")).unwrap();
        create(&store.conn, &aircraft("G-EZTH", "EasyJet")).unwrap();

        let registrations: Vec<_> = store
            .all()
            .unwrap()
            .into_iter()
            .map(|a| a.registration)
            .collect();
        assert_eq!(registrations, vec!["EI-DCL", "G-EZTH", "N12345"]);
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn test_delete_missing() {
        let store = AircraftStore::open_in_memory().unwrap();
        create(&store.conn, &aircraft("G-EZTH", "EasyJet")).unwrap();
        create(&store.conn, &aircraft("EI-DCL", "Ryanair")).unwrap();

        let seen: HashSet<String> = ["G-EZTH".to_string()].iter().cloned().collect();
        let removed = delete_missing(&store.conn, &seen).unwrap();

        assert_eq!(removed, 1);
        assert!(store.get("G-EZTH").unwrap().is_some());
        assert!(store.get("EI-DCL").unwrap().is_none());
    }
}
