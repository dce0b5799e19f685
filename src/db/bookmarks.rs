use rusqlite::params;

use super::*;

impl WorkdeskDb {
    pub fn create_bookmark(&self, bookmark: &DbBookmark) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO bookmarks (
                id, url, title, description, tags, privacy, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                bookmark.id,
                bookmark.url,
                bookmark.title,
                bookmark.description,
                tags_to_json(&bookmark.tags),
                bookmark.privacy,
                bookmark.created_at,
                bookmark.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_bookmark(&self, id: &str) -> Result<Option<DbBookmark>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, url, title, description, tags, privacy, created_at, updated_at
             FROM bookmarks WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![id], Self::map_bookmark_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    pub fn list_bookmarks(&self, limit: Option<i64>) -> Result<Vec<DbBookmark>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, url, title, description, tags, privacy, created_at, updated_at
             FROM bookmarks ORDER BY created_at DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit.unwrap_or(-1)], Self::map_bookmark_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    pub fn delete_bookmark(&self, id: &str) -> Result<bool, DbError> {
        let affected = self
            .conn
            .execute("DELETE FROM bookmarks WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    fn map_bookmark_row(row: &rusqlite::Row) -> Result<DbBookmark, rusqlite::Error> {
        Ok(DbBookmark {
            id: row.get(0)?,
            url: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            tags: tags_from_json(row.get(4)?),
            privacy: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}
