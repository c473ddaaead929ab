use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

use crate::entities::sessions;

/// A session row. `terminated_at = None` means the session is live.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub created_at: String,
    pub terminated_at: Option<String>,
}

impl From<sessions::Model> for Session {
    fn from(model: sessions::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            created_at: model.created_at,
            terminated_at: model.terminated_at,
        }
    }
}

pub struct SessionRepository {
    conn: DatabaseConnection,
}

impl SessionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Mint a session for a user. The id is the bearer token.
    pub async fn create(&self, user_id: &str) -> Result<Session> {
        let active = sessions::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            user_id: Set(user_id.to_string()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            terminated_at: Set(None),
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to create session")?;

        Ok(Session::from(model))
    }

    /// Terminate a session. Idempotent: an unknown or already-terminated id
    /// is treated as already in the goal state. The conditional update keeps
    /// concurrent terminations commutative and never reopens a session.
    pub async fn terminate(&self, session_id: &str) -> Result<()> {
        sessions::Entity::update_many()
            .col_expr(
                sessions::Column::TerminatedAt,
                Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(sessions::Column::Id.eq(session_id))
            .filter(sessions::Column::TerminatedAt.is_null())
            .exec(&self.conn)
            .await
            .context("Failed to terminate session")?;

        Ok(())
    }

    /// Resolve a session id to its row only while it is live.
    pub async fn resolve_live(&self, session_id: &str) -> Result<Option<Session>> {
        let session = sessions::Entity::find()
            .filter(sessions::Column::Id.eq(session_id))
            .filter(sessions::Column::TerminatedAt.is_null())
            .one(&self.conn)
            .await
            .context("Failed to resolve session")?;

        Ok(session.map(Session::from))
    }

    /// Remove every session owned by a user (user-deletion cascade).
    pub async fn delete_for_user(&self, user_id: &str) -> Result<u64> {
        let result = sessions::Entity::delete_many()
            .filter(sessions::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete sessions for user")?;

        Ok(result.rows_affected)
    }
}
