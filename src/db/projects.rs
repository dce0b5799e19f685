use rusqlite::params;

use super::*;

impl WorkdeskDb {
    pub fn create_project(&self, project: &DbProject) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO projects (
                id, name, status, client_id, description, tags, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                project.id,
                project.name,
                project.status,
                project.client_id,
                project.description,
                tags_to_json(&project.tags),
                project.created_at,
                project.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_project(&self, id: &str) -> Result<Option<DbProject>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, status, client_id, description, tags, created_at, updated_at
             FROM projects WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![id], Self::map_project_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Look up a project by exact name, then case-insensitive substring.
    pub fn find_project_by_name(&self, name: &str) -> Result<Option<DbProject>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, status, client_id, description, tags, created_at, updated_at
             FROM projects
             WHERE name = ?1 OR instr(lower(name), lower(?1)) > 0
             ORDER BY name = ?1 DESC LIMIT 1",
        )?;
        let mut rows = stmt.query_map(params![name], Self::map_project_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    pub fn list_projects(&self) -> Result<Vec<DbProject>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, status, client_id, description, tags, created_at, updated_at
             FROM projects ORDER BY name",
        )?;
        let rows = stmt.query_map([], Self::map_project_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    pub fn update_project_status(&self, id: &str, status: &str) -> Result<(), DbError> {
        let affected = self.conn.execute(
            "UPDATE projects SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status, chrono::Utc::now().to_rfc3339(), id],
        )?;
        if affected == 0 {
            return Err(DbError::NotFound("project", id.to_string()));
        }
        Ok(())
    }

    fn map_project_row(row: &rusqlite::Row) -> Result<DbProject, rusqlite::Error> {
        Ok(DbProject {
            id: row.get(0)?,
            name: row.get(1)?,
            status: row.get(2)?,
            client_id: row.get(3)?,
            description: row.get(4)?,
            tags: tags_from_json(row.get(5)?),
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}
