//! PostgreSQL user repository implementation

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use super::{like_pattern, sql_count, storage_error, violation, Violation};
use crate::domain::list::{ListParams, Page};
use crate::domain::user::{User, UserField, UserId, UserRepository, UserSort};
use crate::domain::DomainError;

pub(crate) const USER_COLUMNS: &str =
    "id, slug, username, email, fullname, password_hash, active, admin, created_at, updated_at";

/// Search clause over the user display fields, `$1` being the LIKE pattern
pub(crate) const USER_SEARCH: &str =
    "(username ILIKE $1 OR email ILIKE $1 OR fullname ILIKE $1)";

/// PostgreSQL implementation of UserRepository
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(
        &self,
        clause: &str,
        value: &str,
    ) -> Result<Option<User>, DomainError> {
        let query = format!("SELECT {} FROM users WHERE {} LIMIT 1", USER_COLUMNS, clause);

        let row = sqlx::query(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("get user", e))?;

        row.map(|row| row_to_user(&row, "")).transpose()
    }
}

fn write_error(user: &User, err: sqlx::Error) -> DomainError {
    match violation(&err) {
        Some(Violation::Unique(column)) => DomainError::validation(column, "is already taken"),
        Some(Violation::PrimaryKey) => DomainError::conflict(format!(
            "User with ID '{}' already exists",
            user.id()
        )),
        _ => storage_error("write user", err),
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn get(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        self.fetch_one_where("id = $1", id.as_str()).await
    }

    async fn find(&self, reference: &str) -> Result<Option<User>, DomainError> {
        self.fetch_one_where(
            "id = $1 OR slug = $1 OR username = $1 ORDER BY (id = $1) DESC",
            reference,
        )
        .await
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        self.fetch_one_where("username = $1", username).await
    }

    async fn list(&self, params: &ListParams) -> Result<Page<User>, DomainError> {
        let sort: UserSort = params.sort_column();
        let filter = if params.search.is_empty() {
            "TRUE".to_string()
        } else {
            USER_SEARCH.to_string()
        };
        let pattern = like_pattern(&params.search);

        let count_query = format!("SELECT COUNT(*) FROM users WHERE {}", filter);
        let mut count = sqlx::query_scalar::<_, i64>(&count_query);
        if !params.search.is_empty() {
            count = count.bind(&pattern);
        }
        let total = count
            .fetch_one(&self.pool)
            .await
            .map_err(|e| storage_error("count users", e))?;

        let (limit_at, offset_at) = if params.search.is_empty() { (1, 2) } else { (2, 3) };
        let list_query = format!(
            "SELECT {} FROM users WHERE {} ORDER BY {} {}, id ASC LIMIT ${} OFFSET ${}",
            USER_COLUMNS,
            filter,
            sort.column(),
            params.order.as_sql(),
            limit_at,
            offset_at
        );
        let mut list = sqlx::query(&list_query);
        if !params.search.is_empty() {
            list = list.bind(&pattern);
        }
        let rows = list
            .bind(sql_count(params.limit))
            .bind(sql_count(params.offset))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error("list users", e))?;

        let records = rows
            .iter()
            .map(|row| row_to_user(row, ""))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(records, total as usize))
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, slug, username, email, fullname, password_hash,
                               active, admin, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(user.id().as_str())
        .bind(user.slug())
        .bind(user.username())
        .bind(user.email())
        .bind(user.fullname())
        .bind(user.password_hash())
        .bind(user.is_active())
        .bind(user.is_admin())
        .bind(user.created_at())
        .bind(user.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(&user, e))?;

        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET slug = $2, username = $3, email = $4, fullname = $5, password_hash = $6,
                active = $7, admin = $8, updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(user.id().as_str())
        .bind(user.slug())
        .bind(user.username())
        .bind(user.email())
        .bind(user.fullname())
        .bind(user.password_hash())
        .bind(user.is_active())
        .bind(user.is_admin())
        .bind(user.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(user, e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::subject_not_found(user.id().as_str()));
        }

        Ok(user.clone())
    }

    async fn delete(&self, id: &UserId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("delete user", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn is_taken(
        &self,
        field: UserField,
        value: &str,
        except: Option<&UserId>,
    ) -> Result<bool, DomainError> {
        let query = format!(
            "SELECT EXISTS(SELECT 1 FROM users WHERE {} = $1 AND ($2::TEXT IS NULL OR id <> $2))",
            field.as_str()
        );

        sqlx::query_scalar::<_, bool>(&query)
            .bind(value)
            .bind(except.map(|id| id.as_str()))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| storage_error("check user uniqueness", e))
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| storage_error("count users", e))?;

        Ok(count as usize)
    }
}

/// Map a row to a user; `prefix` selects aliased columns of a join
pub(crate) fn row_to_user(row: &PgRow, prefix: &str) -> Result<User, DomainError> {
    let column = |name: &str| format!("{}{}", prefix, name);
    let get_err = |e: sqlx::Error| storage_error("read user row", e);

    let id: String = row.try_get(column("id").as_str()).map_err(get_err)?;
    let slug: String = row.try_get(column("slug").as_str()).map_err(get_err)?;
    let username: String = row.try_get(column("username").as_str()).map_err(get_err)?;
    let email: String = row.try_get(column("email").as_str()).map_err(get_err)?;
    let fullname: String = row.try_get(column("fullname").as_str()).map_err(get_err)?;
    let password_hash: String = row
        .try_get(column("password_hash").as_str())
        .map_err(get_err)?;
    let active: bool = row.try_get(column("active").as_str()).map_err(get_err)?;
    let admin: bool = row.try_get(column("admin").as_str()).map_err(get_err)?;
    let created_at: chrono::DateTime<chrono::Utc> =
        row.try_get(column("created_at").as_str()).map_err(get_err)?;
    let updated_at: chrono::DateTime<chrono::Utc> =
        row.try_get(column("updated_at").as_str()).map_err(get_err)?;

    let user_id = UserId::new(id)
        .map_err(|e| DomainError::storage(format!("Invalid user ID in database: {}", e)))?;

    Ok(User::new(username, email, password_hash)
        .with_id(user_id)
        .with_slug(slug)
        .with_fullname(fullname)
        .with_flags(active, admin)
        .with_timestamps(created_at, updated_at))
}
