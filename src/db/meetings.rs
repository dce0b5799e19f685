use rusqlite::params;

use super::*;

impl WorkdeskDb {
    pub fn create_meeting(&self, meeting: &DbMeeting) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO meetings (
                id, title, project_id, start_time, end_time, location, notes,
                privacy, tags, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                meeting.id,
                meeting.title,
                meeting.project_id,
                meeting.start_time,
                meeting.end_time,
                meeting.location,
                meeting.notes,
                meeting.privacy,
                tags_to_json(&meeting.tags),
                meeting.created_at,
                meeting.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_meeting(&self, id: &str) -> Result<Option<DbMeeting>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, project_id, start_time, end_time, location, notes,
                    privacy, tags, created_at, updated_at
             FROM meetings WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![id], Self::map_meeting_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// List meetings in start-time order, newest first.
    pub fn list_meetings(&self, limit: Option<i64>) -> Result<Vec<DbMeeting>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, project_id, start_time, end_time, location, notes,
                    privacy, tags, created_at, updated_at
             FROM meetings ORDER BY start_time DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit.unwrap_or(-1)], Self::map_meeting_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Attach a person to a meeting. Idempotent per (meeting, person).
    pub fn add_meeting_attendee(&self, attendee: &DbMeetingAttendee) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO meeting_attendees (id, meeting_id, person_id, attendee_role, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(meeting_id, person_id) DO UPDATE SET
                attendee_role = COALESCE(excluded.attendee_role, meeting_attendees.attendee_role)",
            params![
                attendee.id,
                attendee.meeting_id,
                attendee.person_id,
                attendee.attendee_role,
                attendee.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_meeting_attendees(
        &self,
        meeting_id: &str,
    ) -> Result<Vec<DbMeetingAttendee>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, meeting_id, person_id, attendee_role, created_at
             FROM meeting_attendees WHERE meeting_id = ?1 ORDER BY created_at",
        )?;
        let rows = stmt.query_map(params![meeting_id], |row| {
            Ok(DbMeetingAttendee {
                id: row.get(0)?,
                meeting_id: row.get(1)?,
                person_id: row.get(2)?,
                attendee_role: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    pub fn delete_meeting(&self, id: &str) -> Result<bool, DbError> {
        let affected = self
            .conn
            .execute("DELETE FROM meetings WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    fn map_meeting_row(row: &rusqlite::Row) -> Result<DbMeeting, rusqlite::Error> {
        Ok(DbMeeting {
            id: row.get(0)?,
            title: row.get(1)?,
            project_id: row.get(2)?,
            start_time: row.get(3)?,
            end_time: row.get(4)?,
            location: row.get(5)?,
            notes: row.get(6)?,
            privacy: row.get(7)?,
            tags: tags_from_json(row.get(8)?),
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meeting(id: &str, title: &str) -> DbMeeting {
        let now = chrono::Utc::now().to_rfc3339();
        DbMeeting {
            id: id.to_string(),
            title: title.to_string(),
            project_id: None,
            start_time: "2026-03-02T10:00:00+00:00".to_string(),
            end_time: None,
            location: None,
            notes: None,
            privacy: "public".to_string(),
            tags: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    fn person(id: &str) -> DbPerson {
        let now = chrono::Utc::now().to_rfc3339();
        DbPerson {
            id: id.to_string(),
            full_name: format!("Person {id}"),
            email: None,
            company: None,
            role: None,
            privacy: "public".to_string(),
            tags: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    #[test]
    fn test_adding_the_same_attendee_twice_keeps_one_row() {
        let db = WorkdeskDb::open_in_memory().unwrap();
        db.create_meeting(&meeting("m1", "Planning")).unwrap();
        db.create_person(&person("p1")).unwrap();

        let now = chrono::Utc::now().to_rfc3339();
        for id in ["at1", "at2"] {
            db.add_meeting_attendee(&DbMeetingAttendee {
                id: id.to_string(),
                meeting_id: "m1".to_string(),
                person_id: "p1".to_string(),
                attendee_role: None,
                created_at: now.clone(),
            })
            .unwrap();
        }

        assert_eq!(db.get_meeting_attendees("m1").unwrap().len(), 1);
    }

    #[test]
    fn test_deleting_a_meeting_cascades_to_attendees() {
        let db = WorkdeskDb::open_in_memory().unwrap();
        db.create_meeting(&meeting("m1", "Planning")).unwrap();
        db.create_person(&person("p1")).unwrap();
        db.add_meeting_attendee(&DbMeetingAttendee {
            id: "at1".to_string(),
            meeting_id: "m1".to_string(),
            person_id: "p1".to_string(),
            attendee_role: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        })
        .unwrap();

        assert!(db.delete_meeting("m1").unwrap());
        assert!(db.get_meeting_attendees("m1").unwrap().is_empty());
    }
}
