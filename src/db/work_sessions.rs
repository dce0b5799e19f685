use rusqlite::params;

use super::*;

impl WorkdeskDb {
    /// Insert a logged work session.
    pub fn create_work_session(&self, session: &DbWorkSession) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO work_sessions (
                id, project_id, description, date, start_time, end_time,
                duration_hours, billable, tags, privacy, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                session.id,
                session.project_id,
                session.description,
                session.date,
                session.start_time,
                session.end_time,
                session.duration_hours,
                session.billable as i32,
                tags_to_json(&session.tags),
                session.privacy,
                session.created_at,
                session.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_work_session(&self, id: &str) -> Result<Option<DbWorkSession>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, project_id, description, date, start_time, end_time,
                    duration_hours, billable, tags, privacy, created_at, updated_at
             FROM work_sessions WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![id], Self::map_work_session_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// List sessions, most recent date first.
    pub fn list_work_sessions(&self, limit: Option<i64>) -> Result<Vec<DbWorkSession>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, project_id, description, date, start_time, end_time,
                    duration_hours, billable, tags, privacy, created_at, updated_at
             FROM work_sessions ORDER BY date DESC, created_at DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit.unwrap_or(-1)], Self::map_work_session_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    pub fn delete_work_session(&self, id: &str) -> Result<bool, DbError> {
        let affected = self
            .conn
            .execute("DELETE FROM work_sessions WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    fn map_work_session_row(row: &rusqlite::Row) -> Result<DbWorkSession, rusqlite::Error> {
        Ok(DbWorkSession {
            id: row.get(0)?,
            project_id: row.get(1)?,
            description: row.get(2)?,
            date: row.get(3)?,
            start_time: row.get(4)?,
            end_time: row.get(5)?,
            duration_hours: row.get(6)?,
            billable: row.get::<_, i32>(7)? != 0,
            tags: tags_from_json(row.get(8)?),
            privacy: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: &str) -> DbWorkSession {
        let now = chrono::Utc::now().to_rfc3339();
        DbWorkSession {
            id: id.to_string(),
            project_id: None,
            description: "deep work".to_string(),
            date: "2026-03-02".to_string(),
            start_time: Some("2026-03-02T09:00:00+00:00".to_string()),
            end_time: Some("2026-03-02T17:00:00+00:00".to_string()),
            duration_hours: "8.00".to_string(),
            billable: true,
            tags: vec!["frontend".to_string()],
            privacy: "public".to_string(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    #[test]
    fn test_work_session_round_trip() {
        let db = WorkdeskDb::open_in_memory().unwrap();
        db.create_work_session(&session("s1")).unwrap();

        let loaded = db.get_work_session("s1").unwrap().expect("session exists");
        assert_eq!(loaded.description, "deep work");
        assert_eq!(loaded.duration_hours, "8.00");
        assert!(loaded.billable);
        assert_eq!(loaded.tags, vec!["frontend"]);
    }

    #[test]
    fn test_delete_reports_whether_row_existed() {
        let db = WorkdeskDb::open_in_memory().unwrap();
        db.create_work_session(&session("s1")).unwrap();
        assert!(db.delete_work_session("s1").unwrap());
        assert!(!db.delete_work_session("s1").unwrap());
    }
}
