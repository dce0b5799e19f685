//! Clients and employers. Both are small lookup tables referenced by
//! projects and queries; they share a file the way they share a shape.

use rusqlite::params;

use super::*;

impl WorkdeskDb {
    pub fn create_client(&self, client: &DbClient) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO clients (id, name, contact_email, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                client.id,
                client.name,
                client.contact_email,
                client.notes,
                client.created_at,
                client.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_client(&self, id: &str) -> Result<Option<DbClient>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, contact_email, notes, created_at, updated_at
             FROM clients WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![id], Self::map_client_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    pub fn list_clients(&self) -> Result<Vec<DbClient>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, contact_email, notes, created_at, updated_at
             FROM clients ORDER BY name",
        )?;
        let rows = stmt.query_map([], Self::map_client_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    pub fn create_employer(&self, employer: &DbEmployer) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO employers (id, name, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                employer.id,
                employer.name,
                employer.notes,
                employer.created_at,
                employer.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn list_employers(&self) -> Result<Vec<DbEmployer>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, notes, created_at, updated_at FROM employers ORDER BY name",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(DbEmployer {
                id: row.get(0)?,
                name: row.get(1)?,
                notes: row.get(2)?,
                created_at: row.get(3)?,
                updated_at: row.get(4)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    fn map_client_row(row: &rusqlite::Row) -> Result<DbClient, rusqlite::Error> {
        Ok(DbClient {
            id: row.get(0)?,
            name: row.get(1)?,
            contact_email: row.get(2)?,
            notes: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_round_trip() {
        let db = WorkdeskDb::open_in_memory().unwrap();
        let now = chrono::Utc::now().to_rfc3339();
        db.create_client(&DbClient {
            id: "c1".to_string(),
            name: "Acme".to_string(),
            contact_email: Some("ops@acme.test".to_string()),
            notes: None,
            created_at: now.clone(),
            updated_at: now,
        })
        .unwrap();

        let loaded = db.get_client("c1").unwrap().unwrap();
        assert_eq!(loaded.name, "Acme");
        assert_eq!(db.list_clients().unwrap().len(), 1);
    }
}
