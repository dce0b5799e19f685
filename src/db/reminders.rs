use rusqlite::params;

use super::*;

impl WorkdeskDb {
    pub fn create_reminder(&self, reminder: &DbReminder) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO reminders (
                id, title, message, due_at, completed, completed_at, notified_at,
                recurrence_frequency, recurrence_day_of_week, recurrence_day_of_month,
                created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                reminder.id,
                reminder.title,
                reminder.message,
                reminder.due_at,
                reminder.completed as i32,
                reminder.completed_at,
                reminder.notified_at,
                reminder.recurrence_frequency,
                reminder.recurrence_day_of_week,
                reminder.recurrence_day_of_month,
                reminder.created_at,
                reminder.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_reminder(&self, id: &str) -> Result<Option<DbReminder>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM reminders WHERE id = ?1",
            Self::REMINDER_COLUMNS
        ))?;
        let mut rows = stmt.query_map(params![id], Self::map_reminder_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// List reminders, soonest due first.
    pub fn list_reminders(&self, include_completed: bool) -> Result<Vec<DbReminder>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM reminders WHERE completed = 0 OR ?1 ORDER BY due_at",
            Self::REMINDER_COLUMNS
        ))?;
        let rows = stmt.query_map(params![include_completed as i32], Self::map_reminder_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Reminders that are due, incomplete, and not yet notified — the
    /// scheduler's work queue.
    pub fn list_due_reminders(&self, now: &str) -> Result<Vec<DbReminder>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM reminders
             WHERE completed = 0 AND notified_at IS NULL AND due_at <= ?1
             ORDER BY due_at",
            Self::REMINDER_COLUMNS
        ))?;
        let rows = stmt.query_map(params![now], Self::map_reminder_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    pub fn mark_reminder_notified(&self, id: &str, notified_at: &str) -> Result<(), DbError> {
        self.conn.execute(
            "UPDATE reminders SET notified_at = ?1, updated_at = ?1 WHERE id = ?2",
            params![notified_at, id],
        )?;
        Ok(())
    }

    pub fn mark_reminder_completed(&self, id: &str, completed_at: &str) -> Result<(), DbError> {
        let affected = self.conn.execute(
            "UPDATE reminders
             SET completed = 1, completed_at = ?1, updated_at = ?1
             WHERE id = ?2 AND completed = 0",
            params![completed_at, id],
        )?;
        if affected == 0 {
            return Err(DbError::NotFound("reminder", id.to_string()));
        }
        Ok(())
    }

    pub fn delete_reminder(&self, id: &str) -> Result<bool, DbError> {
        let affected = self
            .conn
            .execute("DELETE FROM reminders WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    const REMINDER_COLUMNS: &'static str = "id, title, message, due_at, completed, completed_at, \
         notified_at, recurrence_frequency, recurrence_day_of_week, recurrence_day_of_month, \
         created_at, updated_at";

    fn map_reminder_row(row: &rusqlite::Row) -> Result<DbReminder, rusqlite::Error> {
        Ok(DbReminder {
            id: row.get(0)?,
            title: row.get(1)?,
            message: row.get(2)?,
            due_at: row.get(3)?,
            completed: row.get::<_, i32>(4)? != 0,
            completed_at: row.get(5)?,
            notified_at: row.get(6)?,
            recurrence_frequency: row.get(7)?,
            recurrence_day_of_week: row.get(8)?,
            recurrence_day_of_month: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reminder(id: &str, due_at: &str) -> DbReminder {
        let now = chrono::Utc::now().to_rfc3339();
        DbReminder {
            id: id.to_string(),
            title: format!("reminder {id}"),
            message: None,
            due_at: due_at.to_string(),
            completed: false,
            completed_at: None,
            notified_at: None,
            recurrence_frequency: None,
            recurrence_day_of_week: None,
            recurrence_day_of_month: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    #[test]
    fn test_due_selection_skips_notified_and_completed() {
        let db = WorkdeskDb::open_in_memory().unwrap();
        db.create_reminder(&reminder("r1", "2026-03-01T09:00:00+00:00"))
            .unwrap();
        db.create_reminder(&reminder("r2", "2026-03-01T10:00:00+00:00"))
            .unwrap();
        db.create_reminder(&reminder("r3", "2026-03-09T10:00:00+00:00"))
            .unwrap();

        db.mark_reminder_notified("r1", "2026-03-01T09:01:00+00:00")
            .unwrap();

        let due = db.list_due_reminders("2026-03-02T00:00:00+00:00").unwrap();
        let ids: Vec<&str> = due.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r2"]);
    }

    #[test]
    fn test_completing_twice_is_not_found() {
        let db = WorkdeskDb::open_in_memory().unwrap();
        db.create_reminder(&reminder("r1", "2026-03-01T09:00:00+00:00"))
            .unwrap();
        db.mark_reminder_completed("r1", "2026-03-01T12:00:00+00:00")
            .unwrap();
        let err = db
            .mark_reminder_completed("r1", "2026-03-01T13:00:00+00:00")
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound("reminder", _)));
    }
}
