use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::Row;

use crate::domain::{
    Activity, ActivityId, Event, EventId, Meal, MealId, MealType, Priority, Task, TaskId, UserId,
};

use super::{Repository, decode_id, decode_timestamp, encode_timestamp};

/// Open, completed and overdue task counts for one owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCounts {
    pub open: i64,
    pub completed: i64,
    pub overdue: i64,
}

impl Repository {
    // ========================
    // Task operations
    // ========================

    pub async fn save_task(&self, task: &Task) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tasks (id, owner_id, title, description, due_date, priority, completed, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(task.id.to_string())
        .bind(task.owner.to_string())
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.due_date.map(encode_timestamp))
        .bind(task.priority.as_str())
        .bind(task.completed)
        .bind(encode_timestamp(task.created_at))
        .execute(&self.pool)
        .await
        .context("Failed to save task")?;
        Ok(())
    }

    pub async fn update_task(&self, task: &Task) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET title = ?, description = ?, due_date = ?, priority = ?, completed = ?
            WHERE id = ? AND owner_id = ?
            "#,
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.due_date.map(encode_timestamp))
        .bind(task.priority.as_str())
        .bind(task.completed)
        .bind(task.id.to_string())
        .bind(task.owner.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to update task")?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn get_task(&self, owner: UserId, id: TaskId) -> Result<Option<Task>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, title, description, due_date, priority, completed, created_at
            FROM tasks
            WHERE id = ? AND owner_id = ?
            "#,
        )
        .bind(id.to_string())
        .bind(owner.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch task")?;

        row.as_ref().map(Self::row_to_task).transpose()
    }

    /// Open tasks first, then by due date (undated last).
    pub async fn list_tasks(&self, owner: UserId, completed: Option<bool>) -> Result<Vec<Task>> {
        let mut query = String::from(
            "SELECT id, owner_id, title, description, due_date, priority, completed, created_at FROM tasks WHERE owner_id = ?",
        );
        if completed.is_some() {
            query.push_str(" AND completed = ?");
        }
        query.push_str(" ORDER BY completed, due_date IS NULL, due_date, created_at");

        let mut sql_query = sqlx::query(&query).bind(owner.to_string());
        if let Some(completed) = completed {
            sql_query = sql_query.bind(completed);
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list tasks")?;

        rows.iter().map(Self::row_to_task).collect()
    }

    pub async fn delete_task(&self, owner: UserId, id: TaskId) -> Result<bool> {
        self.delete_owned("tasks", owner, &id.to_string()).await
    }

    pub async fn count_tasks(&self, owner: UserId, now: DateTime<Utc>) -> Result<TaskCounts> {
        let row = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN completed = 0 THEN 1 ELSE 0 END), 0) as open,
                COALESCE(SUM(CASE WHEN completed = 1 THEN 1 ELSE 0 END), 0) as done,
                COALESCE(SUM(CASE WHEN completed = 0 AND due_date IS NOT NULL AND due_date < ? THEN 1 ELSE 0 END), 0) as overdue
            FROM tasks
            WHERE owner_id = ?
            "#,
        )
        .bind(encode_timestamp(now))
        .bind(owner.to_string())
        .fetch_one(&self.pool)
        .await
        .context("Failed to count tasks")?;

        Ok(TaskCounts {
            open: row.get("open"),
            completed: row.get("done"),
            overdue: row.get("overdue"),
        })
    }

    fn row_to_task(row: &sqlx::sqlite::SqliteRow) -> Result<Task> {
        let id_str: String = row.get("id");
        let owner_str: String = row.get("owner_id");
        let due_date_str: Option<String> = row.get("due_date");
        let priority_str: String = row.get("priority");
        let created_at_str: String = row.get("created_at");

        Ok(Task {
            id: decode_id(&id_str, "task ID")?,
            owner: decode_id(&owner_str, "owner ID")?,
            title: row.get("title"),
            description: row.get("description"),
            due_date: due_date_str
                .map(|s| decode_timestamp(&s, "due_date"))
                .transpose()?,
            priority: Priority::from_str(&priority_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid priority: {}", priority_str))?,
            completed: row.get::<i32, _>("completed") != 0,
            created_at: decode_timestamp(&created_at_str, "created_at")?,
        })
    }

    // ========================
    // Event operations
    // ========================

    pub async fn save_event(&self, event: &Event) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO events (id, owner_id, title, description, location, start_at, end_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(event.id.to_string())
        .bind(event.owner.to_string())
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(encode_timestamp(event.start))
        .bind(encode_timestamp(event.end))
        .bind(encode_timestamp(event.created_at))
        .execute(&self.pool)
        .await
        .context("Failed to save event")?;
        Ok(())
    }

    pub async fn update_event(&self, event: &Event) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE events
            SET title = ?, description = ?, location = ?, start_at = ?, end_at = ?
            WHERE id = ? AND owner_id = ?
            "#,
        )
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(encode_timestamp(event.start))
        .bind(encode_timestamp(event.end))
        .bind(event.id.to_string())
        .bind(event.owner.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to update event")?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn get_event(&self, owner: UserId, id: EventId) -> Result<Option<Event>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, title, description, location, start_at, end_at, created_at
            FROM events
            WHERE id = ? AND owner_id = ?
            "#,
        )
        .bind(id.to_string())
        .bind(owner.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch event")?;

        row.as_ref().map(Self::row_to_event).transpose()
    }

    /// Events whose start falls in `[from, to]` (either bound optional), by start.
    pub async fn list_events(
        &self,
        owner: UserId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Event>> {
        let mut query = String::from(
            "SELECT id, owner_id, title, description, location, start_at, end_at, created_at FROM events WHERE owner_id = ?",
        );
        if from.is_some() {
            query.push_str(" AND start_at >= ?");
        }
        if to.is_some() {
            query.push_str(" AND start_at <= ?");
        }
        query.push_str(" ORDER BY start_at");

        let mut sql_query = sqlx::query(&query).bind(owner.to_string());
        if let Some(from) = from {
            sql_query = sql_query.bind(encode_timestamp(from));
        }
        if let Some(to) = to {
            sql_query = sql_query.bind(encode_timestamp(to));
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list events")?;

        rows.iter().map(Self::row_to_event).collect()
    }

    pub async fn delete_event(&self, owner: UserId, id: EventId) -> Result<bool> {
        self.delete_owned("events", owner, &id.to_string()).await
    }

    /// Events starting in `[start, end)`.
    pub async fn count_events_starting(
        &self,
        owner: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) as count FROM events WHERE owner_id = ? AND start_at >= ? AND start_at < ?",
        )
        .bind(owner.to_string())
        .bind(encode_timestamp(start))
        .bind(encode_timestamp(end))
        .fetch_one(&self.pool)
        .await
        .context("Failed to count events")?;
        Ok(row.get("count"))
    }

    fn row_to_event(row: &sqlx::sqlite::SqliteRow) -> Result<Event> {
        let id_str: String = row.get("id");
        let owner_str: String = row.get("owner_id");
        let start_str: String = row.get("start_at");
        let end_str: String = row.get("end_at");
        let created_at_str: String = row.get("created_at");

        Ok(Event {
            id: decode_id(&id_str, "event ID")?,
            owner: decode_id(&owner_str, "owner ID")?,
            title: row.get("title"),
            description: row.get("description"),
            location: row.get("location"),
            start: decode_timestamp(&start_str, "start_at")?,
            end: decode_timestamp(&end_str, "end_at")?,
            created_at: decode_timestamp(&created_at_str, "created_at")?,
        })
    }

    // ========================
    // Meal operations
    // ========================

    pub async fn save_meal(&self, meal: &Meal) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO meals (id, owner_id, name, meal_type, calories, date, notes)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(meal.id.to_string())
        .bind(meal.owner.to_string())
        .bind(&meal.name)
        .bind(meal.meal_type.as_str())
        .bind(meal.calories)
        .bind(encode_timestamp(meal.date))
        .bind(&meal.notes)
        .execute(&self.pool)
        .await
        .context("Failed to save meal")?;
        Ok(())
    }

    /// Meals dated in `[start, end)` when a window is given, newest first.
    pub async fn list_meals(
        &self,
        owner: UserId,
        window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Vec<Meal>> {
        let mut query = String::from(
            "SELECT id, owner_id, name, meal_type, calories, date, notes FROM meals WHERE owner_id = ?",
        );
        if window.is_some() {
            query.push_str(" AND date >= ? AND date < ?");
        }
        query.push_str(" ORDER BY date DESC");

        let mut sql_query = sqlx::query(&query).bind(owner.to_string());
        if let Some((start, end)) = window {
            sql_query = sql_query
                .bind(encode_timestamp(start))
                .bind(encode_timestamp(end));
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list meals")?;

        rows.iter()
            .map(|row| {
                let id_str: String = row.get("id");
                let owner_str: String = row.get("owner_id");
                let meal_type_str: String = row.get("meal_type");
                let date_str: String = row.get("date");
                Ok(Meal {
                    id: decode_id(&id_str, "meal ID")?,
                    owner: decode_id(&owner_str, "owner ID")?,
                    name: row.get("name"),
                    meal_type: MealType::from_str(&meal_type_str)
                        .ok_or_else(|| anyhow::anyhow!("Invalid meal type: {}", meal_type_str))?,
                    calories: row.get("calories"),
                    date: decode_timestamp(&date_str, "date")?,
                    notes: row.get("notes"),
                })
            })
            .collect()
    }

    pub async fn delete_meal(&self, owner: UserId, id: MealId) -> Result<bool> {
        self.delete_owned("meals", owner, &id.to_string()).await
    }

    // ========================
    // Activity operations
    // ========================

    pub async fn save_activity(&self, activity: &Activity) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO activities (id, owner_id, activity_type, duration_minutes, calories_burned, date, notes)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(activity.id.to_string())
        .bind(activity.owner.to_string())
        .bind(&activity.activity_type)
        .bind(activity.duration_minutes)
        .bind(activity.calories_burned)
        .bind(encode_timestamp(activity.date))
        .bind(&activity.notes)
        .execute(&self.pool)
        .await
        .context("Failed to save activity")?;
        Ok(())
    }

    pub async fn list_activities(
        &self,
        owner: UserId,
        window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Vec<Activity>> {
        let mut query = String::from(
            "SELECT id, owner_id, activity_type, duration_minutes, calories_burned, date, notes FROM activities WHERE owner_id = ?",
        );
        if window.is_some() {
            query.push_str(" AND date >= ? AND date < ?");
        }
        query.push_str(" ORDER BY date DESC");

        let mut sql_query = sqlx::query(&query).bind(owner.to_string());
        if let Some((start, end)) = window {
            sql_query = sql_query
                .bind(encode_timestamp(start))
                .bind(encode_timestamp(end));
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list activities")?;

        rows.iter()
            .map(|row| {
                let id_str: String = row.get("id");
                let owner_str: String = row.get("owner_id");
                let date_str: String = row.get("date");
                Ok(Activity {
                    id: decode_id(&id_str, "activity ID")?,
                    owner: decode_id(&owner_str, "owner ID")?,
                    activity_type: row.get("activity_type"),
                    duration_minutes: row.get("duration_minutes"),
                    calories_burned: row.get("calories_burned"),
                    date: decode_timestamp(&date_str, "date")?,
                    notes: row.get("notes"),
                })
            })
            .collect()
    }

    pub async fn delete_activity(&self, owner: UserId, id: ActivityId) -> Result<bool> {
        self.delete_owned("activities", owner, &id.to_string()).await
    }

    /// Calories eaten and burned over `[start, end)`.
    pub async fn sum_calories(
        &self,
        owner: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<(i64, i64)> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COALESCE(SUM(calories), 0) FROM meals
                    WHERE owner_id = ?1 AND date >= ?2 AND date < ?3) as eaten,
                (SELECT COALESCE(SUM(calories_burned), 0) FROM activities
                    WHERE owner_id = ?1 AND date >= ?2 AND date < ?3) as burned
            "#,
        )
        .bind(owner.to_string())
        .bind(encode_timestamp(start))
        .bind(encode_timestamp(end))
        .fetch_one(&self.pool)
        .await
        .context("Failed to sum calories")?;

        Ok((row.get("eaten"), row.get("burned")))
    }

    /// `table` is always one of this module's literals.
    async fn delete_owned(&self, table: &'static str, owner: UserId, id: &str) -> Result<bool> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ? AND owner_id = ?", table))
            .bind(id)
            .bind(owner.to_string())
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to delete from {}", table))?;
        Ok(result.rows_affected() > 0)
    }
}
