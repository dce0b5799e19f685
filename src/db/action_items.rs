use rusqlite::params;

use super::*;

impl WorkdeskDb {
    pub fn create_action_item(&self, item: &DbActionItem) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO action_items (
                id, title, status, due_date, priority, project_id, on_behalf_of_id,
                tags, created_at, completed_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                item.id,
                item.title,
                item.status,
                item.due_date,
                item.priority,
                item.project_id,
                item.on_behalf_of_id,
                tags_to_json(&item.tags),
                item.created_at,
                item.completed_at,
                item.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_action_item(&self, id: &str) -> Result<Option<DbActionItem>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, status, due_date, priority, project_id, on_behalf_of_id,
                    tags, created_at, completed_at, updated_at
             FROM action_items WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![id], Self::map_action_item_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Open items first, then by due date with undated items last.
    pub fn list_action_items(&self, status: Option<&str>) -> Result<Vec<DbActionItem>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, status, due_date, priority, project_id, on_behalf_of_id,
                    tags, created_at, completed_at, updated_at
             FROM action_items
             WHERE ?1 IS NULL OR status = ?1
             ORDER BY status = 'open' DESC, due_date IS NULL, due_date",
        )?;
        let rows = stmt.query_map(params![status], Self::map_action_item_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    pub fn set_action_item_status(&self, id: &str, status: &str) -> Result<(), DbError> {
        let now = chrono::Utc::now().to_rfc3339();
        let completed_at = if status == "done" { Some(now.clone()) } else { None };
        let affected = self.conn.execute(
            "UPDATE action_items
             SET status = ?1, completed_at = ?2, updated_at = ?3
             WHERE id = ?4",
            params![status, completed_at, now, id],
        )?;
        if affected == 0 {
            return Err(DbError::NotFound("action item", id.to_string()));
        }
        Ok(())
    }

    fn map_action_item_row(row: &rusqlite::Row) -> Result<DbActionItem, rusqlite::Error> {
        Ok(DbActionItem {
            id: row.get(0)?,
            title: row.get(1)?,
            status: row.get(2)?,
            due_date: row.get(3)?,
            priority: row.get(4)?,
            project_id: row.get(5)?,
            on_behalf_of_id: row.get(6)?,
            tags: tags_from_json(row.get(7)?),
            created_at: row.get(8)?,
            completed_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, due_date: Option<&str>) -> DbActionItem {
        let now = chrono::Utc::now().to_rfc3339();
        DbActionItem {
            id: id.to_string(),
            title: format!("item {id}"),
            status: "open".to_string(),
            due_date: due_date.map(str::to_string),
            priority: None,
            project_id: None,
            on_behalf_of_id: None,
            tags: Vec::new(),
            created_at: now.clone(),
            completed_at: None,
            updated_at: now,
        }
    }

    #[test]
    fn test_list_orders_dated_items_before_undated() {
        let db = WorkdeskDb::open_in_memory().unwrap();
        db.create_action_item(&item("a1", None)).unwrap();
        db.create_action_item(&item("a2", Some("2026-03-05"))).unwrap();
        db.create_action_item(&item("a3", Some("2026-03-01"))).unwrap();

        let items = db.list_action_items(Some("open")).unwrap();
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a3", "a2", "a1"]);
    }

    #[test]
    fn test_done_status_stamps_completed_at() {
        let db = WorkdeskDb::open_in_memory().unwrap();
        db.create_action_item(&item("a1", None)).unwrap();
        db.set_action_item_status("a1", "done").unwrap();
        let loaded = db.get_action_item("a1").unwrap().unwrap();
        assert_eq!(loaded.status, "done");
        assert!(loaded.completed_at.is_some());
    }
}
