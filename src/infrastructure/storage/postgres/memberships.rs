//! PostgreSQL membership repository
//!
//! Memberships of kind `K` live in `user_<K::PLURAL>` with the composite
//! primary key `(user_id, <K::NAME>_id)`. The primary key enforces pair
//! uniqueness, so concurrent inserts for one pair surface as `AlreadyAssigned`.

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use super::containers::row_to_container;
use super::users::row_to_user;
use super::{like_pattern, sql_count, storage_error, violation, Violation};
use crate::domain::container::{ContainerId, ContainerKind, ContainerSort};
use crate::domain::list::{ListParams, Page};
use crate::domain::membership::{Member, Membership, MembershipRepository};
use crate::domain::permission::Permission;
use crate::domain::user::{UserId, UserSort};
use crate::domain::DomainError;

#[derive(Debug, Clone)]
pub struct PostgresMembershipRepository<K: ContainerKind> {
    pool: PgPool,
    _kind: PhantomData<K>,
}

impl<K: ContainerKind> PostgresMembershipRepository<K> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _kind: PhantomData,
        }
    }

    fn table() -> String {
        format!("user_{}", K::PLURAL)
    }

    fn column() -> String {
        format!("{}_id", K::NAME)
    }

    /// Joined select of membership, user (`u_` prefix) and container (`c_` prefix)
    fn joined_select() -> String {
        format!(
            "SELECT m.user_id, m.{col} AS container_id, m.perm, \
                    m.created_at AS m_created_at, m.updated_at AS m_updated_at, \
                    u.id AS u_id, u.slug AS u_slug, u.username AS u_username, \
                    u.email AS u_email, u.fullname AS u_fullname, \
                    u.password_hash AS u_password_hash, u.active AS u_active, \
                    u.admin AS u_admin, u.created_at AS u_created_at, \
                    u.updated_at AS u_updated_at, \
                    c.id AS c_id, c.slug AS c_slug, c.name AS c_name, \
                    c.created_at AS c_created_at, c.updated_at AS c_updated_at \
             FROM {table} m \
             JOIN users u ON u.id = m.user_id \
             JOIN {containers} c ON c.id = m.{col}",
            col = Self::column(),
            table = Self::table(),
            containers = K::PLURAL,
        )
    }

    async fn list_joined(
        &self,
        owner_clause: &str,
        owner_id: &str,
        search_clause: &str,
        order_by: String,
        params: &ListParams,
    ) -> Result<Page<Member<K>>, DomainError> {
        let searching = !params.search.is_empty();
        let filter = if searching {
            format!("{} AND {}", owner_clause, search_clause)
        } else {
            owner_clause.to_string()
        };
        let pattern = like_pattern(&params.search);

        let count_query = format!(
            "SELECT COUNT(*) FROM {table} m \
             JOIN users u ON u.id = m.user_id \
             JOIN {containers} c ON c.id = m.{col} \
             WHERE {filter}",
            table = Self::table(),
            containers = K::PLURAL,
            col = Self::column(),
            filter = filter,
        );
        let mut count = sqlx::query_scalar::<_, i64>(&count_query).bind(owner_id);
        if searching {
            count = count.bind(&pattern);
        }
        let total = count
            .fetch_one(&self.pool)
            .await
            .map_err(|e| storage_error(&format!("count {} members", K::NAME), e))?;

        let first = if searching { 3 } else { 2 };
        let list_query = format!(
            "{} WHERE {} ORDER BY {} LIMIT ${} OFFSET ${}",
            Self::joined_select(),
            filter,
            order_by,
            first,
            first + 1
        );
        let mut list = sqlx::query(&list_query).bind(owner_id);
        if searching {
            list = list.bind(&pattern);
        }
        let rows = list
            .bind(sql_count(params.limit))
            .bind(sql_count(params.offset))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error(&format!("list {} members", K::NAME), e))?;

        let records = rows
            .iter()
            .map(row_to_member::<K>)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(records, total as usize))
    }
}

#[async_trait]
impl<K: ContainerKind> MembershipRepository<K> for PostgresMembershipRepository<K> {
    async fn insert(&self, membership: Membership<K>) -> Result<Membership<K>, DomainError> {
        let query = format!(
            "INSERT INTO {} (user_id, {}, perm, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5)",
            Self::table(),
            Self::column()
        );

        sqlx::query(&query)
            .bind(membership.user_id().as_str())
            .bind(membership.container_id().as_str())
            .bind(membership.perm().as_str())
            .bind(membership.created_at())
            .bind(membership.updated_at())
            .execute(&self.pool)
            .await
            .map_err(|e| match violation(&e) {
                Some(Violation::PrimaryKey) => DomainError::already_assigned(K::NAME),
                Some(Violation::Reference { subject: true }) => {
                    DomainError::subject_not_found(membership.user_id().as_str())
                }
                Some(Violation::Reference { subject: false }) => {
                    DomainError::container_not_found(K::NAME, membership.container_id().as_str())
                }
                _ => storage_error(&format!("insert {} membership", K::NAME), e),
            })?;

        Ok(membership)
    }

    async fn update_permission(
        &self,
        user_id: &UserId,
        container_id: &ContainerId<K>,
        perm: Permission,
    ) -> Result<Membership<K>, DomainError> {
        let query = format!(
            "UPDATE {} SET perm = $3, updated_at = NOW() \
             WHERE user_id = $1 AND {} = $2 \
             RETURNING created_at, updated_at",
            Self::table(),
            Self::column()
        );

        let row = sqlx::query(&query)
            .bind(user_id.as_str())
            .bind(container_id.as_str())
            .bind(perm.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error(&format!("update {} membership", K::NAME), e))?
            .ok_or_else(|| DomainError::not_assigned(K::NAME))?;

        let created_at: chrono::DateTime<chrono::Utc> = row
            .try_get("created_at")
            .map_err(|e| storage_error("read membership row", e))?;
        let updated_at: chrono::DateTime<chrono::Utc> = row
            .try_get("updated_at")
            .map_err(|e| storage_error("read membership row", e))?;

        Ok(Membership::new(user_id.clone(), container_id.clone(), perm)
            .with_timestamps(created_at, updated_at))
    }

    async fn delete(
        &self,
        user_id: &UserId,
        container_id: &ContainerId<K>,
    ) -> Result<(), DomainError> {
        let query = format!(
            "DELETE FROM {} WHERE user_id = $1 AND {} = $2",
            Self::table(),
            Self::column()
        );

        let result = sqlx::query(&query)
            .bind(user_id.as_str())
            .bind(container_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error(&format!("delete {} membership", K::NAME), e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_assigned(K::NAME));
        }

        Ok(())
    }

    async fn find_by_pair(
        &self,
        user_id: &UserId,
        container_id: &ContainerId<K>,
    ) -> Result<Option<Membership<K>>, DomainError> {
        let query = format!(
            "SELECT user_id, {col} AS container_id, perm, \
                    created_at AS m_created_at, updated_at AS m_updated_at \
             FROM {table} WHERE user_id = $1 AND {col} = $2",
            col = Self::column(),
            table = Self::table(),
        );

        let row = sqlx::query(&query)
            .bind(user_id.as_str())
            .bind(container_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error(&format!("find {} membership", K::NAME), e))?;

        row.map(|row| row_to_membership(&row)).transpose()
    }

    async fn list_by_container(
        &self,
        container_id: &ContainerId<K>,
        params: &ListParams,
    ) -> Result<Page<Member<K>>, DomainError> {
        let sort: UserSort = params.sort_column();
        let order_by = format!(
            "u.{} {}, u.id ASC",
            sort.column(),
            params.order.as_sql()
        );

        self.list_joined(
            &format!("m.{} = $1", Self::column()),
            container_id.as_str(),
            "(u.username ILIKE $2 OR u.email ILIKE $2 OR u.fullname ILIKE $2)",
            order_by,
            params,
        )
        .await
    }

    async fn list_by_user(
        &self,
        user_id: &UserId,
        params: &ListParams,
    ) -> Result<Page<Member<K>>, DomainError> {
        let sort: ContainerSort = params.sort_column();
        let order_by = format!(
            "c.{} {}, c.id ASC",
            sort.column(),
            params.order.as_sql()
        );

        self.list_joined(
            "m.user_id = $1",
            user_id.as_str(),
            "(c.name ILIKE $2 OR c.slug ILIKE $2)",
            order_by,
            params,
        )
        .await
    }
}

fn row_to_membership<K: ContainerKind>(row: &PgRow) -> Result<Membership<K>, DomainError> {
    let get_err = |e: sqlx::Error| storage_error("read membership row", e);

    let user_id: String = row.try_get("user_id").map_err(get_err)?;
    let container_id: String = row.try_get("container_id").map_err(get_err)?;
    let perm: String = row.try_get("perm").map_err(get_err)?;
    let created_at: chrono::DateTime<chrono::Utc> =
        row.try_get("m_created_at").map_err(get_err)?;
    let updated_at: chrono::DateTime<chrono::Utc> =
        row.try_get("m_updated_at").map_err(get_err)?;

    let user_id = UserId::new(user_id)
        .map_err(|e| DomainError::storage(format!("Invalid user ID in database: {}", e)))?;
    let container_id = ContainerId::new(container_id)
        .map_err(|e| DomainError::storage(format!("Invalid {} ID in database: {}", K::NAME, e)))?;
    let perm: Permission = perm
        .parse()
        .map_err(|e| DomainError::storage(format!("Invalid permission in database: {}", e)))?;

    Ok(Membership::new(user_id, container_id, perm).with_timestamps(created_at, updated_at))
}

fn row_to_member<K: ContainerKind>(row: &PgRow) -> Result<Member<K>, DomainError> {
    Ok(Member {
        membership: row_to_membership(row)?,
        user: row_to_user(row, "u_")?,
        container: row_to_container(row, "c_")?,
    })
}
