use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use crate::models::{
    PersonKey, PersonRepr, PersonUpdate, SeedRecord, SkillEntry, SkillFrequency,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Single shared SQLite connection. Callers run store methods on the
/// blocking thread pool; the mutex serializes writers.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn list_people(&self) -> Result<Vec<PersonRepr>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id FROM people ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut people = Vec::with_capacity(ids.len());
        for id in ids {
            people.push(person_repr(&conn, id)?);
        }
        Ok(people)
    }

    pub fn fetch_person(&self, key: &PersonKey) -> Result<PersonRepr, StoreError> {
        let conn = self.conn();
        let person_id = person_id_for_key(&conn, key)?.ok_or(StoreError::NotFound)?;
        Ok(person_repr(&conn, person_id)?)
    }

    /// Merge-style partial update. Only fields present in `update` are
    /// applied; a `skills` field replaces the whole rating set. Everything
    /// commits as one transaction.
    pub fn update_person(
        &self,
        key: &PersonKey,
        update: &PersonUpdate,
    ) -> Result<PersonRepr, StoreError> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let person_id = person_id_for_key(&tx, key)?.ok_or(StoreError::NotFound)?;
        let now = Utc::now().to_rfc3339();

        if let Some(name) = &update.name {
            let (first, last) = split_name(name);
            tx.execute(
                "UPDATE people SET first_name = ?1, last_name = ?2, updated_at = ?3 WHERE id = ?4",
                params![first, last, now, person_id],
            )?;
        }

        if let Some(email) = &update.email {
            tx.execute(
                "UPDATE people SET email = ?1, updated_at = ?2 WHERE id = ?3",
                params![email, now, person_id],
            )?;
        }

        if let Some(phone) = &update.phone {
            tx.execute(
                "UPDATE people SET phone = ?1, updated_at = ?2 WHERE id = ?3",
                params![phone, now, person_id],
            )?;
        }

        if let Some(company) = &update.company {
            let employer_id = resolve_employer(&tx, company)?;
            tx.execute(
                "UPDATE people SET employer_id = ?1, updated_at = ?2 WHERE id = ?3",
                params![employer_id, now, person_id],
            )?;
        }

        if let Some(skills) = &update.skills {
            clear_ratings(&tx, person_id)?;
            for entry in skills {
                let skill_id = resolve_skill(&tx, &entry.skill)?;
                insert_rating(&tx, person_id, skill_id, entry.rating)?;
            }
            tx.execute(
                "UPDATE people SET updated_at = ?1 WHERE id = ?2",
                params![now, person_id],
            )?;
        }

        let repr = person_repr(&tx, person_id)?;
        tx.commit()?;
        Ok(repr)
    }

    /// Inclusive frequency bounds; `None` leaves that side unbounded.
    pub fn list_skills(
        &self,
        min: Option<i64>,
        max: Option<i64>,
    ) -> Result<Vec<SkillFrequency>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT name, frequency FROM skills
             WHERE frequency >= ?1 AND frequency <= ?2
             ORDER BY name",
        )?;
        let rows = stmt.query_map(
            params![min.unwrap_or(i64::MIN), max.unwrap_or(i64::MAX)],
            |row| {
                Ok(SkillFrequency {
                    skill: row.get(0)?,
                    frequency: row.get(1)?,
                })
            },
        )?;

        let mut skills = Vec::new();
        for row in rows {
            skills.push(row?);
        }
        Ok(skills)
    }

    /// Loader write path. Returns `None` without touching the database when
    /// a person with the record's email already exists, so re-running a
    /// batch is safe.
    pub fn create_person(&self, record: &SeedRecord) -> Result<Option<i64>, StoreError> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let existing = person_id_for_key(&tx, &PersonKey::Email(record.email.clone()))?;
        if existing.is_some() {
            return Ok(None);
        }

        let now = Utc::now().to_rfc3339();
        let employer_id = resolve_employer(&tx, &record.company)?;
        let (first, last) = split_name(&record.name);
        tx.execute(
            "INSERT INTO people (first_name, last_name, employer_id, email, phone, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![first, last, employer_id, record.email, record.phone, now],
        )?;
        let person_id = tx.last_insert_rowid();

        for entry in &record.skills {
            let skill_id = resolve_skill(&tx, &entry.skill)?;
            insert_rating(&tx, person_id, skill_id, entry.rating)?;
        }

        tx.commit()?;
        Ok(Some(person_id))
    }
}

/// First token becomes the first name, second the last name. Tokens past the
/// second are dropped; this mirrors the historical two-column split.
pub fn split_name(raw: &str) -> (String, Option<String>) {
    let mut tokens = raw.split_whitespace();
    let first = tokens.next().unwrap_or_default().to_string();
    let last = tokens.next().map(str::to_string);
    (first, last)
}

/// Find-or-create by name. The UNIQUE index plus conflict-tolerant insert
/// makes concurrent resolutions of the same new name land on one row.
pub fn resolve_employer(conn: &Connection, name: &str) -> rusqlite::Result<i64> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO employers (name, created_at, updated_at) VALUES (?1, ?2, ?2)
         ON CONFLICT(name) DO NOTHING",
        params![name, now],
    )?;
    conn.query_row(
        "SELECT id FROM employers WHERE name = ?1",
        params![name],
        |row| row.get(0),
    )
}

pub fn resolve_skill(conn: &Connection, name: &str) -> rusqlite::Result<i64> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO skills (name, frequency, created_at, updated_at) VALUES (?1, 0, ?2, ?2)
         ON CONFLICT(name) DO NOTHING",
        params![name, now],
    )?;
    conn.query_row(
        "SELECT id FROM skills WHERE name = ?1",
        params![name],
        |row| row.get(0),
    )
}

/// The derived-counter maintainer. `skills.frequency` mirrors the live count
/// of referencing ratings; every rating write calls this on the same
/// connection inside its transaction, so a rollback reverts both.
fn adjust_skill_frequency(conn: &Connection, skill_id: i64, delta: i64) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE skills SET frequency = frequency + ?1, updated_at = ?2 WHERE id = ?3",
        params![delta, Utc::now().to_rfc3339(), skill_id],
    )?;
    Ok(())
}

fn insert_rating(
    conn: &Connection,
    person_id: i64,
    skill_id: i64,
    rating: i64,
) -> rusqlite::Result<()> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO skill_ratings (person_id, skill_id, rating, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![person_id, skill_id, rating, now],
    )?;
    adjust_skill_frequency(conn, skill_id, 1)
}

fn clear_ratings(conn: &Connection, person_id: i64) -> rusqlite::Result<()> {
    let skill_ids = {
        let mut stmt =
            conn.prepare("SELECT skill_id FROM skill_ratings WHERE person_id = ?1")?;
        let rows = stmt.query_map(params![person_id], |row| row.get::<_, i64>(0))?;
        rows.collect::<Result<Vec<_>, _>>()?
    };

    conn.execute(
        "DELETE FROM skill_ratings WHERE person_id = ?1",
        params![person_id],
    )?;
    for skill_id in skill_ids {
        adjust_skill_frequency(conn, skill_id, -1)?;
    }
    Ok(())
}

fn person_id_for_key(conn: &Connection, key: &PersonKey) -> rusqlite::Result<Option<i64>> {
    match key {
        PersonKey::Id(id) => conn
            .query_row("SELECT id FROM people WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional(),
        PersonKey::Email(email) => conn
            .query_row(
                "SELECT id FROM people WHERE email = ?1",
                params![email],
                |row| row.get(0),
            )
            .optional(),
    }
}

fn person_repr(conn: &Connection, person_id: i64) -> rusqlite::Result<PersonRepr> {
    let (first, last, company, email, phone) = conn.query_row(
        "SELECT p.first_name, p.last_name, e.name, p.email, p.phone
         FROM people p LEFT JOIN employers e ON e.id = p.employer_id
         WHERE p.id = ?1",
        params![person_id],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        },
    )?;

    let mut stmt = conn.prepare(
        "SELECT s.name, r.rating FROM skill_ratings r
         JOIN skills s ON s.id = r.skill_id
         WHERE r.person_id = ?1
         ORDER BY r.id",
    )?;
    let rows = stmt.query_map(params![person_id], |row| {
        Ok(SkillEntry {
            skill: row.get(0)?,
            rating: row.get(1)?,
        })
    })?;
    let mut skills = Vec::new();
    for row in rows {
        skills.push(row?);
    }

    let name = match last {
        Some(last) => format!("{first} {last}"),
        None => first,
    };

    Ok(PersonRepr {
        name,
        company,
        email,
        phone,
        skills,
    })
}
