use rusqlite::params;

use super::*;

impl WorkdeskDb {
    /// Insert or update a person. Email matching is case-insensitive; an
    /// upsert never clears fields the incoming record leaves unset.
    pub fn upsert_person(&self, person: &DbPerson) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO people (
                id, full_name, email, company, role, privacy, tags, created_at, updated_at
             ) VALUES (?1, ?2, LOWER(?3), ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
                full_name = excluded.full_name,
                email = COALESCE(excluded.email, people.email),
                company = COALESCE(excluded.company, people.company),
                role = COALESCE(excluded.role, people.role),
                privacy = excluded.privacy,
                tags = excluded.tags,
                updated_at = excluded.updated_at",
            params![
                person.id,
                person.full_name,
                person.email,
                person.company,
                person.role,
                person.privacy,
                tags_to_json(&person.tags),
                person.created_at,
                person.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn create_person(&self, person: &DbPerson) -> Result<(), DbError> {
        self.upsert_person(person)
    }

    pub fn get_person(&self, id: &str) -> Result<Option<DbPerson>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, full_name, email, company, role, privacy, tags, created_at, updated_at
             FROM people WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![id], Self::map_person_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Look up a person by email (case-insensitive), then by name substring.
    pub fn find_person(&self, query: &str) -> Result<Option<DbPerson>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, full_name, email, company, role, privacy, tags, created_at, updated_at
             FROM people
             WHERE email = LOWER(?1) OR instr(lower(full_name), lower(?1)) > 0
             ORDER BY email = LOWER(?1) DESC LIMIT 1",
        )?;
        let mut rows = stmt.query_map(params![query], Self::map_person_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    pub fn list_people(&self) -> Result<Vec<DbPerson>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, full_name, email, company, role, privacy, tags, created_at, updated_at
             FROM people ORDER BY full_name",
        )?;
        let rows = stmt.query_map([], Self::map_person_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    fn map_person_row(row: &rusqlite::Row) -> Result<DbPerson, rusqlite::Error> {
        Ok(DbPerson {
            id: row.get(0)?,
            full_name: row.get(1)?,
            email: row.get(2)?,
            company: row.get(3)?,
            role: row.get(4)?,
            privacy: row.get(5)?,
            tags: tags_from_json(row.get(6)?),
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }
}
