use sea_orm::{QueryFilter, QueryOrder, prelude::*};

use crate::{Activity, ActivityId, EngineError, ResultEngine, activities};

use super::{Store, normalize_required_text};

impl Store {
    /// Add a new activity and return its id.
    pub async fn create_activity(
        &self,
        name: &str,
        description: &str,
        scheduled_at: &str,
        capacity: u32,
    ) -> ResultEngine<ActivityId> {
        if capacity == 0 {
            return Err(EngineError::ValidationFailed(
                "capacity must be greater than zero".to_string(),
            ));
        }
        let name = normalize_required_text(name, "activity name")?;
        let model = activities::ActiveModel::new_activity(
            name.clone(),
            description.trim().to_string(),
            scheduled_at.trim().to_string(),
            capacity,
        )?;
        let inserted = model.insert(&self.database).await?;
        tracing::info!("created activity {} \"{}\" (capacity {})", inserted.id, name, capacity);
        Ok(inserted.id)
    }

    pub async fn activity(&self, id: ActivityId) -> ResultEngine<Option<Activity>> {
        activities::Entity::find_by_id(id)
            .one(&self.database)
            .await?
            .map(Activity::try_from)
            .transpose()
    }

    /// Return the activity or `NotFound`.
    pub async fn require_activity(&self, id: ActivityId) -> ResultEngine<Activity> {
        self.activity(id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("activity {id}")))
    }

    /// Activities in creation order.
    pub async fn list_activities(&self, active_only: bool) -> ResultEngine<Vec<Activity>> {
        let mut query = activities::Entity::find();
        if active_only {
            query = query.filter(activities::Column::IsActive.eq(true));
        }
        query
            .order_by_asc(activities::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Activity::try_from)
            .collect()
    }
}
