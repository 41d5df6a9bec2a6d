use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, ConnectionTrait, Set};
use serde_json::Value;
use uuid::Uuid;

use crate::{entity::audit_logs::ActiveModel as AuditActive, error::AppResult};

pub async fn log_audit<C>(
    db: &C,
    actor_id: Option<&str>,
    action: &str,
    resource: Option<&str>,
    metadata: Option<Value>,
) -> AppResult<()>
where
    C: ConnectionTrait,
{
    AuditActive {
        id: Set(Uuid::new_v4()),
        actor_id: Set(actor_id.map(str::to_owned)),
        action: Set(action.to_owned()),
        resource: Set(resource.map(str::to_owned)),
        metadata: Set(metadata),
        created_at: NotSet,
    }
    .insert(db)
    .await?;

    Ok(())
}

/// Record an audit row, logging instead of failing when the insert errors.
pub async fn audit_or_warn<C>(
    db: &C,
    actor_id: Option<&str>,
    action: &str,
    resource: Option<&str>,
    metadata: Option<Value>,
) where
    C: ConnectionTrait,
{
    if let Err(err) = log_audit(db, actor_id, action, resource, metadata).await {
        tracing::warn!(error = %err, action, "audit log failed");
    }
}
