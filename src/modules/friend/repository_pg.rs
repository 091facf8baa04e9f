use sqlx::PgConnection;

use crate::{
    api::error,
    modules::friend::{
        repository::{FriendRepo, FriendshipRepository},
        schema::{FriendshipEntity, FriendshipStatus, FriendshipUserRow},
        state::{self, EdgeWrite, FriendAction, TransitionError},
    },
};

#[derive(Clone)]
pub struct FriendRepositoryPg {
    pool: sqlx::PgPool,
}

impl FriendRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

/// Inserts the edge unless the pair already exists; `None` means another
/// writer got there first.
async fn insert_edge(
    conn: &mut PgConnection,
    from_id: i64,
    to_id: i64,
    status: FriendshipStatus,
) -> Result<Option<FriendshipEntity>, error::SystemError> {
    let edge = sqlx::query_as::<_, FriendshipEntity>(
        r#"
        INSERT INTO friendships (from_user_id, to_user_id, status)
        VALUES ($1, $2, $3)
        ON CONFLICT (from_user_id, to_user_id) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(from_id)
    .bind(to_id)
    .bind(status)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(edge)
}

async fn upsert_edge(
    conn: &mut PgConnection,
    from_id: i64,
    to_id: i64,
    status: FriendshipStatus,
) -> Result<FriendshipEntity, error::SystemError> {
    let edge = sqlx::query_as::<_, FriendshipEntity>(
        r#"
        INSERT INTO friendships (from_user_id, to_user_id, status)
        VALUES ($1, $2, $3)
        ON CONFLICT (from_user_id, to_user_id)
        DO UPDATE SET status = EXCLUDED.status, updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(from_id)
    .bind(to_id)
    .bind(status)
    .fetch_one(&mut *conn)
    .await?;

    Ok(edge)
}

/// Locks both directions of the pair, always in `from_user_id` order so two
/// transitions on the same pair cannot deadlock. Returns the forward edge.
async fn lock_pair(
    conn: &mut PgConnection,
    from_id: i64,
    to_id: i64,
) -> Result<Option<FriendshipEntity>, error::SystemError> {
    let edges = sqlx::query_as::<_, FriendshipEntity>(
        r#"
        SELECT * FROM friendships
        WHERE (from_user_id = $1 AND to_user_id = $2)
           OR (from_user_id = $2 AND to_user_id = $1)
        ORDER BY from_user_id
        FOR UPDATE
        "#,
    )
    .bind(from_id)
    .bind(to_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(edges.into_iter().find(|edge| edge.from_user_id == from_id))
}

async fn write_existing(
    conn: &mut PgConnection,
    edge: FriendshipEntity,
    write: EdgeWrite,
) -> Result<FriendshipEntity, error::SystemError> {
    match write {
        EdgeWrite::Insert(status) | EdgeWrite::Update(status) => {
            let updated = sqlx::query_as::<_, FriendshipEntity>(
                r#"
                UPDATE friendships
                SET status = $2, updated_at = NOW()
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(edge.id)
            .bind(status)
            .fetch_one(&mut *conn)
            .await?;
            Ok(updated)
        }
        EdgeWrite::Keep => Ok(edge),
    }
}

#[async_trait::async_trait]
impl FriendshipRepository for FriendRepositoryPg {
    async fn find_friendship(
        &self,
        from_id: i64,
        to_id: i64,
    ) -> Result<Option<FriendshipEntity>, error::SystemError> {
        let edge = sqlx::query_as::<_, FriendshipEntity>(
            "SELECT * FROM friendships WHERE from_user_id = $1 AND to_user_id = $2",
        )
        .bind(from_id)
        .bind(to_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(edge)
    }

    async fn create_if_absent(
        &self,
        from_id: i64,
        to_id: i64,
        status: FriendshipStatus,
    ) -> Result<(FriendshipEntity, bool), error::SystemError> {
        let mut conn = self.pool.acquire().await?;

        if let Some(edge) = insert_edge(&mut conn, from_id, to_id, status).await? {
            return Ok((edge, true));
        }

        // Lost the race on the unique pair; report the row that won.
        let existing = self
            .find_friendship(from_id, to_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Friendship not found"))?;

        Ok((existing, false))
    }

    async fn find_friends(
        &self,
        user_id: i64,
    ) -> Result<Vec<FriendshipUserRow>, error::SystemError> {
        let rows = sqlx::query_as::<_, FriendshipUserRow>(
            r#"
            SELECT
                f.id,
                u.first_name,
                u.last_name,
                u.email
            FROM friendships f
            JOIN users u
                ON u.id = f.to_user_id
            WHERE f.from_user_id = $1
              AND f.status = $2
            ORDER BY f.id
            "#,
        )
        .bind(user_id)
        .bind(FriendshipStatus::Accepted)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_pending_requests(
        &self,
        user_id: i64,
    ) -> Result<Vec<FriendshipUserRow>, error::SystemError> {
        let rows = sqlx::query_as::<_, FriendshipUserRow>(
            r#"
            SELECT
                f.id,
                u.first_name,
                u.last_name,
                u.email
            FROM friendships f
            JOIN users u
                ON u.id = f.from_user_id
            WHERE f.to_user_id = $1
              AND f.status = $2
            ORDER BY f.id
            "#,
        )
        .bind(user_id)
        .bind(FriendshipStatus::Pending)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[async_trait::async_trait]
impl FriendRepo for FriendRepositoryPg {
    async fn apply_transition(
        &self,
        from_id: i64,
        to_id: i64,
        action: FriendAction,
    ) -> Result<FriendshipEntity, error::SystemError> {
        // Dropping `tx` on any early return rolls every write back.
        let mut tx = self.pool.begin().await?;

        let current = lock_pair(&mut tx, from_id, to_id).await?;
        let current_status = current.as_ref().map(|edge| edge.status);
        let mut plan = state::plan(current_status, action)?;
        log::debug!(
            "{action:?} {from_id} -> {to_id}: {current_status:?} -> {:?}",
            plan.resulting_status(current_status)
        );

        let edge = match (plan.edge, current) {
            (EdgeWrite::Insert(status), None) => {
                match insert_edge(&mut tx, from_id, to_id, status).await? {
                    Some(edge) => edge,
                    None => {
                        // A concurrent writer created the edge; judge its row instead.
                        let winner = lock_pair(&mut tx, from_id, to_id)
                            .await?
                            .ok_or(TransitionError::RequestNotFound)?;
                        plan = state::plan(Some(winner.status), action)?;
                        write_existing(&mut tx, winner, plan.edge).await?
                    }
                }
            }
            (write, Some(edge)) => write_existing(&mut tx, edge, write).await?,
            (_, None) => return Err(TransitionError::RequestNotFound.into()),
        };

        if let Some(status) = plan.reciprocal {
            upsert_edge(&mut tx, to_id, from_id, status).await?;
        }

        tx.commit().await?;

        Ok(edge)
    }
}
