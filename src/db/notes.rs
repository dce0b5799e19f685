use rusqlite::params;

use super::*;

impl WorkdeskDb {
    pub fn create_note(&self, note: &DbNote) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO notes (
                id, title, content, project_id, tags, privacy, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                note.id,
                note.title,
                note.content,
                note.project_id,
                tags_to_json(&note.tags),
                note.privacy,
                note.created_at,
                note.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_note(&self, id: &str) -> Result<Option<DbNote>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, content, project_id, tags, privacy, created_at, updated_at
             FROM notes WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![id], Self::map_note_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    pub fn list_notes(&self, limit: Option<i64>) -> Result<Vec<DbNote>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, content, project_id, tags, privacy, created_at, updated_at
             FROM notes ORDER BY created_at DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit.unwrap_or(-1)], Self::map_note_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    pub fn delete_note(&self, id: &str) -> Result<bool, DbError> {
        let affected = self
            .conn
            .execute("DELETE FROM notes WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    fn map_note_row(row: &rusqlite::Row) -> Result<DbNote, rusqlite::Error> {
        Ok(DbNote {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            project_id: row.get(3)?,
            tags: tags_from_json(row.get(4)?),
            privacy: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}
