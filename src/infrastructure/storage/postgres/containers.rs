//! PostgreSQL group and team repository

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use super::{like_pattern, sql_count, storage_error, violation, Violation};
use crate::domain::container::{
    Container, ContainerField, ContainerId, ContainerKind, ContainerRepository, ContainerSort,
};
use crate::domain::list::{ListParams, Page};
use crate::domain::membership::Membership;
use crate::domain::DomainError;

pub(crate) const CONTAINER_COLUMNS: &str = "id, slug, name, created_at, updated_at";

/// PostgreSQL repository for containers of kind `K`, stored in the `K::PLURAL` table
#[derive(Debug, Clone)]
pub struct PostgresContainerRepository<K: ContainerKind> {
    pool: PgPool,
    _kind: PhantomData<K>,
}

impl<K: ContainerKind> PostgresContainerRepository<K> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _kind: PhantomData,
        }
    }

    async fn fetch_one_where(
        &self,
        clause: &str,
        value: &str,
    ) -> Result<Option<Container<K>>, DomainError> {
        let query = format!(
            "SELECT {} FROM {} WHERE {} LIMIT 1",
            CONTAINER_COLUMNS,
            K::PLURAL,
            clause
        );

        let row = sqlx::query(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error(&format!("get {}", K::NAME), e))?;

        row.map(|row| row_to_container(&row, "")).transpose()
    }
}

fn write_error<K: ContainerKind>(container: &Container<K>, err: sqlx::Error) -> DomainError {
    match violation(&err) {
        Some(Violation::Unique(column)) => DomainError::validation(column, "is already taken"),
        Some(Violation::PrimaryKey) => DomainError::conflict(format!(
            "{} with ID '{}' already exists",
            K::NAME,
            container.id()
        )),
        _ => storage_error(&format!("write {}", K::NAME), err),
    }
}

#[async_trait]
impl<K: ContainerKind> ContainerRepository<K> for PostgresContainerRepository<K> {
    async fn get(&self, id: &ContainerId<K>) -> Result<Option<Container<K>>, DomainError> {
        self.fetch_one_where("id = $1", id.as_str()).await
    }

    async fn find(&self, reference: &str) -> Result<Option<Container<K>>, DomainError> {
        self.fetch_one_where("id = $1 OR slug = $1 ORDER BY (id = $1) DESC", reference)
            .await
    }

    async fn list(&self, params: &ListParams) -> Result<Page<Container<K>>, DomainError> {
        let sort: ContainerSort = params.sort_column();
        let searching = !params.search.is_empty();
        let filter = if searching {
            "(name ILIKE $1 OR slug ILIKE $1)"
        } else {
            "TRUE"
        };
        let pattern = like_pattern(&params.search);

        let count_query = format!("SELECT COUNT(*) FROM {} WHERE {}", K::PLURAL, filter);
        let mut count = sqlx::query_scalar::<_, i64>(&count_query);
        if searching {
            count = count.bind(&pattern);
        }
        let total = count
            .fetch_one(&self.pool)
            .await
            .map_err(|e| storage_error(&format!("count {}", K::PLURAL), e))?;

        let first = if searching { 2 } else { 1 };
        let list_query = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY {} {}, id ASC LIMIT ${} OFFSET ${}",
            CONTAINER_COLUMNS,
            K::PLURAL,
            filter,
            sort.column(),
            params.order.as_sql(),
            first,
            first + 1
        );
        let mut list = sqlx::query(&list_query);
        if searching {
            list = list.bind(&pattern);
        }
        let rows = list
            .bind(sql_count(params.limit))
            .bind(sql_count(params.offset))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error(&format!("list {}", K::PLURAL), e))?;

        let records = rows
            .iter()
            .map(|row| row_to_container(row, ""))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(records, total as usize))
    }

    async fn create(
        &self,
        container: Container<K>,
        owner: Option<Membership<K>>,
    ) -> Result<Container<K>, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage_error("begin transaction", e))?;

        let insert = format!(
            "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5)",
            K::PLURAL,
            CONTAINER_COLUMNS
        );
        sqlx::query(&insert)
            .bind(container.id().as_str())
            .bind(container.slug())
            .bind(container.name())
            .bind(container.created_at())
            .bind(container.updated_at())
            .execute(&mut *tx)
            .await
            .map_err(|e| write_error(&container, e))?;

        if let Some(owner) = owner {
            let insert_owner = format!(
                "INSERT INTO user_{} (user_id, {}_id, perm, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5)",
                K::PLURAL,
                K::NAME
            );
            sqlx::query(&insert_owner)
                .bind(owner.user_id().as_str())
                .bind(owner.container_id().as_str())
                .bind(owner.perm().as_str())
                .bind(owner.created_at())
                .bind(owner.updated_at())
                .execute(&mut *tx)
                .await
                .map_err(|e| match violation(&e) {
                    Some(Violation::Reference { subject: true }) => {
                        DomainError::subject_not_found(owner.user_id().as_str())
                    }
                    _ => storage_error(&format!("attach {} owner", K::NAME), e),
                })?;
        }

        tx.commit()
            .await
            .map_err(|e| storage_error("commit transaction", e))?;

        Ok(container)
    }

    async fn update(&self, container: &Container<K>) -> Result<Container<K>, DomainError> {
        let query = format!(
            "UPDATE {} SET slug = $2, name = $3, updated_at = $4 WHERE id = $1",
            K::PLURAL
        );

        let result = sqlx::query(&query)
            .bind(container.id().as_str())
            .bind(container.slug())
            .bind(container.name())
            .bind(container.updated_at())
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(container, e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::container_not_found(
                K::NAME,
                container.id().as_str(),
            ));
        }

        Ok(container.clone())
    }

    async fn delete(&self, id: &ContainerId<K>) -> Result<bool, DomainError> {
        let query = format!("DELETE FROM {} WHERE id = $1", K::PLURAL);

        let result = sqlx::query(&query)
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error(&format!("delete {}", K::NAME), e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn is_taken(
        &self,
        field: ContainerField,
        value: &str,
        except: Option<&ContainerId<K>>,
    ) -> Result<bool, DomainError> {
        let query = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = $1 AND ($2::TEXT IS NULL OR id <> $2))",
            K::PLURAL,
            field.as_str()
        );

        sqlx::query_scalar::<_, bool>(&query)
            .bind(value)
            .bind(except.map(|id| id.as_str()))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| storage_error(&format!("check {} uniqueness", K::NAME), e))
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let query = format!("SELECT COUNT(*) FROM {}", K::PLURAL);

        let count: i64 = sqlx::query_scalar(&query)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| storage_error(&format!("count {}", K::PLURAL), e))?;

        Ok(count as usize)
    }
}

/// Map a row to a container; `prefix` selects aliased columns of a join
pub(crate) fn row_to_container<K: ContainerKind>(
    row: &PgRow,
    prefix: &str,
) -> Result<Container<K>, DomainError> {
    let column = |name: &str| format!("{}{}", prefix, name);
    let get_err = |e: sqlx::Error| storage_error(&format!("read {} row", K::NAME), e);

    let id: String = row.try_get(column("id").as_str()).map_err(get_err)?;
    let slug: String = row.try_get(column("slug").as_str()).map_err(get_err)?;
    let name: String = row.try_get(column("name").as_str()).map_err(get_err)?;
    let created_at: chrono::DateTime<chrono::Utc> =
        row.try_get(column("created_at").as_str()).map_err(get_err)?;
    let updated_at: chrono::DateTime<chrono::Utc> =
        row.try_get(column("updated_at").as_str()).map_err(get_err)?;

    let container_id = ContainerId::new(id).map_err(|e| {
        DomainError::storage(format!("Invalid {} ID in database: {}", K::NAME, e))
    })?;

    Ok(Container::new(name)
        .with_id(container_id)
        .with_slug(slug)
        .with_timestamps(created_at, updated_at))
}
