use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use crate::domain::{
    Activity, ActivityId, Event, EventChanges, EventId, Meal, MealId, MealType, Priority, Task,
    TaskChanges, TaskId, UserId, day_window,
};

use super::{AppError, JarvisService};

/// Input for creating a task
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Priority,
}

/// Input for creating a calendar event
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMeal {
    pub name: String,
    pub meal_type: MealType,
    pub calories: i64,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewActivity {
    pub activity_type: String,
    pub duration_minutes: i64,
    pub calories_burned: i64,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
}

fn required(value: &str, field: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

impl JarvisService {
    // ========================
    // Task operations
    // ========================

    pub async fn create_task(&self, owner: UserId, input: NewTask) -> Result<Task, AppError> {
        let mut task = Task::new(owner, required(&input.title, "title")?);
        task.description = input.description;
        task.due_date = input.due_date;
        task.priority = input.priority;

        self.repo.save_task(&task).await?;
        debug!(task = %task.id, "Created task");
        Ok(task)
    }

    /// List tasks, optionally only open (`Some(false)`) or done (`Some(true)`).
    pub async fn list_tasks(
        &self,
        owner: UserId,
        completed: Option<bool>,
    ) -> Result<Vec<Task>, AppError> {
        Ok(self.repo.list_tasks(owner, completed).await?)
    }

    pub async fn update_task(
        &self,
        owner: UserId,
        id: TaskId,
        changes: TaskChanges,
    ) -> Result<Task, AppError> {
        let mut task = self
            .repo
            .get_task(owner, id)
            .await?
            .ok_or_else(|| AppError::TaskNotFound(id.to_string()))?;

        changes.apply(&mut task);
        task.title = required(&task.title, "title")?;

        if !self.repo.update_task(&task).await? {
            return Err(AppError::TaskNotFound(id.to_string()));
        }
        debug!(task = %task.id, completed = task.completed, "Updated task");
        Ok(task)
    }

    pub async fn delete_task(&self, owner: UserId, id: TaskId) -> Result<(), AppError> {
        if !self.repo.delete_task(owner, id).await? {
            return Err(AppError::TaskNotFound(id.to_string()));
        }
        Ok(())
    }

    // ========================
    // Event operations
    // ========================

    pub async fn create_event(&self, owner: UserId, input: NewEvent) -> Result<Event, AppError> {
        let mut event = Event::new(owner, input.title.trim(), input.start, input.end);
        event.description = input.description;
        event.location = input.location;
        Self::check_event(&event)?;

        self.repo.save_event(&event).await?;
        debug!(event = %event.id, start = %event.start, "Created event");
        Ok(event)
    }

    /// Events starting within `[from, to]`, earliest first.
    pub async fn list_events(
        &self,
        owner: UserId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Event>, AppError> {
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(AppError::validation("'from' must not be after 'to'"));
            }
        }
        Ok(self.repo.list_events(owner, from, to).await?)
    }

    pub async fn update_event(
        &self,
        owner: UserId,
        id: EventId,
        changes: EventChanges,
    ) -> Result<Event, AppError> {
        let mut event = self
            .repo
            .get_event(owner, id)
            .await?
            .ok_or_else(|| AppError::EventNotFound(id.to_string()))?;

        changes.apply(&mut event);
        event.title = event.title.trim().to_string();
        Self::check_event(&event)?;

        if !self.repo.update_event(&event).await? {
            return Err(AppError::EventNotFound(id.to_string()));
        }
        debug!(event = %event.id, "Updated event");
        Ok(event)
    }

    pub async fn delete_event(&self, owner: UserId, id: EventId) -> Result<(), AppError> {
        if !self.repo.delete_event(owner, id).await? {
            return Err(AppError::EventNotFound(id.to_string()));
        }
        Ok(())
    }

    fn check_event(event: &Event) -> Result<(), AppError> {
        if event.title.is_empty() {
            return Err(AppError::validation("title is required"));
        }
        if !event.is_well_formed() {
            return Err(AppError::validation("event must not end before it starts"));
        }
        Ok(())
    }

    // ========================
    // Meal operations
    // ========================

    pub async fn create_meal(&self, owner: UserId, input: NewMeal) -> Result<Meal, AppError> {
        if input.calories < 0 {
            return Err(AppError::validation("calories must not be negative"));
        }
        let mut meal = Meal::new(
            owner,
            required(&input.name, "name")?,
            input.meal_type,
            input.calories,
            input.date,
        );
        meal.notes = input.notes;

        self.repo.save_meal(&meal).await?;
        debug!(meal = %meal.id, calories = meal.calories, "Logged meal");
        Ok(meal)
    }

    /// Meals, newest first, optionally only those of one day.
    pub async fn list_meals(
        &self,
        owner: UserId,
        day: Option<NaiveDate>,
    ) -> Result<Vec<Meal>, AppError> {
        Ok(self.repo.list_meals(owner, day.map(day_window)).await?)
    }

    pub async fn delete_meal(&self, owner: UserId, id: MealId) -> Result<(), AppError> {
        if !self.repo.delete_meal(owner, id).await? {
            return Err(AppError::MealNotFound(id.to_string()));
        }
        Ok(())
    }

    // ========================
    // Fitness operations
    // ========================

    pub async fn create_activity(
        &self,
        owner: UserId,
        input: NewActivity,
    ) -> Result<Activity, AppError> {
        if input.duration_minutes <= 0 {
            return Err(AppError::validation("duration must be positive"));
        }
        if input.calories_burned < 0 {
            return Err(AppError::validation("calories burned must not be negative"));
        }
        let mut activity = Activity::new(
            owner,
            required(&input.activity_type, "activity type")?,
            input.duration_minutes,
            input.calories_burned,
            input.date,
        );
        activity.notes = input.notes;

        self.repo.save_activity(&activity).await?;
        debug!(activity = %activity.id, kind = %activity.activity_type, "Logged activity");
        Ok(activity)
    }

    pub async fn list_activities(
        &self,
        owner: UserId,
        day: Option<NaiveDate>,
    ) -> Result<Vec<Activity>, AppError> {
        Ok(self.repo.list_activities(owner, day.map(day_window)).await?)
    }

    pub async fn delete_activity(&self, owner: UserId, id: ActivityId) -> Result<(), AppError> {
        if !self.repo.delete_activity(owner, id).await? {
            return Err(AppError::ActivityNotFound(id.to_string()));
        }
        Ok(())
    }
}
