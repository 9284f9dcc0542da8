use std::marker::PhantomData;

use async_trait::async_trait;
use dump_data::{
    DataError, Destination, Entity, FilterMap, Insert, Instrument, Operation, Select, Shape,
    SortDirection, Statement, Update, Value,
};
use sqlx::any::{AnyQueryResult, AnyRow};
use sqlx::{Any, AnyPool, FromRow};

use crate::bind::arguments;
use crate::connection::Database;
use crate::error::SqlxErrorExt;

/// The generic CRUD engine for one entity type.
///
/// Every operation is timed and reported to the database's metrics sink;
/// failures other than `NotFound` are logged at error level.
///
/// # Example
///
/// ```ignore
/// let repo = db.repository::<Goods>();
/// let goods = repo.find_by_where("price > ?", &[10.into()], Shape::Default).await?;
/// ```
pub struct SqlxRepository<T> {
    db: Database,
    _marker: PhantomData<T>,
}

impl<T> SqlxRepository<T>
where
    T: Entity + for<'r> FromRow<'r, AnyRow>,
{
    pub fn new(db: Database) -> Self {
        Self {
            db,
            _marker: PhantomData,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Single row matching the non-zero fields of `template`.
    pub async fn find(&self, template: &T, shape: Shape<'_>) -> Result<T, DataError> {
        let instrument = self.instrument(Operation::Find);
        let result = self.one(self.select().where_template(template), shape).await;
        instrument.finish(&result, template);
        result
    }

    /// Single row matching a raw expression with `?` placeholders.
    pub async fn find_by_where(
        &self,
        expr: &str,
        args: &[Value],
        shape: Shape<'_>,
    ) -> Result<T, DataError> {
        let instrument = self.instrument(Operation::FindByWhere);
        let result = self.one(self.select().where_raw(expr, args), shape).await;
        instrument.finish(&result, &(expr, args));
        result
    }

    pub async fn find_by_map(&self, filter: &FilterMap, shape: Shape<'_>) -> Result<T, DataError> {
        let instrument = self.instrument(Operation::FindByMap);
        let result = self.one(self.select().where_map(filter), shape).await;
        instrument.finish(&result, filter);
        result
    }

    pub async fn find_list(&self, template: &T, shape: Shape<'_>) -> Result<Vec<T>, DataError> {
        let instrument = self.instrument(Operation::FindList);
        let result = self.many(self.select().where_template(template), shape).await;
        instrument.finish(&result, template);
        result
    }

    pub async fn find_list_by_where(
        &self,
        expr: &str,
        args: &[Value],
        shape: Shape<'_>,
    ) -> Result<Vec<T>, DataError> {
        let instrument = self.instrument(Operation::FindListByWhere);
        let result = self.many(self.select().where_raw(expr, args), shape).await;
        instrument.finish(&result, &(expr, args));
        result
    }

    pub async fn find_list_by_map(
        &self,
        filter: &FilterMap,
        shape: Shape<'_>,
    ) -> Result<Vec<T>, DataError> {
        let instrument = self.instrument(Operation::FindListByMap);
        let result = self.many(self.select().where_map(filter), shape).await;
        instrument.finish(&result, filter);
        result
    }

    /// Rows whose primary key is in `keys`, in one round trip. Missing keys are
    /// absent from the result.
    pub async fn find_list_by_primary_keys(&self, keys: &[Value]) -> Result<Vec<T>, DataError> {
        let instrument = self.instrument(Operation::FindListByPrimaryKeys);
        let result = if keys.is_empty() {
            Ok(Vec::new())
        } else {
            let query = self.select().where_in(T::id_column(), keys);
            self.many(query, Shape::Default).await
        };
        instrument.finish(&result, keys);
        result
    }

    /// Insert `entity`. A zero primary key is left to the database and the
    /// generated key is written back. Returns the rows affected.
    pub async fn create(&self, entity: &mut T) -> Result<u64, DataError> {
        let instrument = self.instrument(Operation::Create);
        let result = self.insert(entity).await;
        instrument.finish(&result, &*entity);
        result
    }

    /// Update the changed columns of `entity` by primary key.
    pub async fn save(&self, entity: &mut T) -> Result<u64, DataError> {
        let instrument = self.instrument(Operation::Save);
        let result = self.update(entity).await;
        instrument.finish(&result, &*entity);
        result
    }

    fn instrument(&self, operation: Operation) -> Instrument<'_> {
        Instrument::start(self.db.metrics(), T::entity_name(), operation)
    }

    fn select(&self) -> Select {
        Select::for_entity::<T>().dialect(self.db.dialect())
    }

    async fn one(&self, query: Select, shape: Shape<'_>) -> Result<T, DataError> {
        let rows = match shape {
            Shape::Default => {
                let query = query.order_by_id(SortDirection::Desc).limit(1);
                self.many(query, Shape::Default).await?
            }
            Shape::Custom(builder) => self.many(query.limit(1), Shape::Custom(builder)).await?,
        };
        rows.into_iter()
            .next()
            .ok_or_else(|| DataError::not_found(T::entity_name()))
    }

    async fn many(&self, query: Select, shape: Shape<'_>) -> Result<Vec<T>, DataError> {
        let mut sink = RowSink::new(self.db.pool());
        match shape {
            Shape::Default => {
                sink.fetch(&query).await?;
            }
            Shape::Custom(builder) => builder.execute(query, &mut sink).await?,
        }
        Ok(sink.rows)
    }

    async fn insert(&self, entity: &mut T) -> Result<u64, DataError> {
        let dialect = self.db.dialect();
        let mut insert = Insert::new(T::table_name()).dialect(dialect);
        for (column, value) in entity.values() {
            if column == T::id_column() && value.is_zero() {
                continue;
            }
            insert = insert.value(column, value);
        }

        let affected = if dialect.returns_generated_key() {
            let stmt = insert.returning(T::id_column()).build()?;
            let id: i64 = sqlx::query_scalar_with::<Any, i64, _>(&stmt.sql, arguments(&stmt.params)?)
                .fetch_one(self.db.pool())
                .await
                .map_err(SqlxErrorExt::into_data_error)?;
            entity.set_id(id);
            1
        } else {
            let done = execute(self.db.pool(), insert.build()?).await?;
            if let Some(id) = done.last_insert_id() {
                if entity.id() == 0 {
                    entity.set_id(id);
                }
            }
            done.rows_affected()
        };
        entity.take_changes();
        Ok(affected)
    }

    async fn update(&self, entity: &mut T) -> Result<u64, DataError> {
        let changes = entity.take_changes();
        if changes.is_empty() {
            return Ok(0);
        }
        let stmt = changes
            .into_iter()
            .fold(
                Update::new(T::table_name()).dialect(self.db.dialect()),
                |update, (column, value)| update.set(column, value),
            )
            .where_id(T::id_column(), entity.id())
            .build()?;
        let done = execute(self.db.pool(), stmt).await?;
        Ok(done.rows_affected())
    }
}

impl<T> Clone for SqlxRepository<T> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            _marker: PhantomData,
        }
    }
}

async fn execute(pool: &AnyPool, stmt: Statement) -> Result<AnyQueryResult, DataError> {
    sqlx::query_with::<Any, _>(&stmt.sql, arguments(&stmt.params)?)
        .execute(pool)
        .await
        .map_err(SqlxErrorExt::into_data_error)
}

/// Collects the rows a builder fetches.
struct RowSink<'a, T> {
    pool: &'a AnyPool,
    rows: Vec<T>,
}

impl<'a, T> RowSink<'a, T> {
    fn new(pool: &'a AnyPool) -> Self {
        Self {
            pool,
            rows: Vec::new(),
        }
    }
}

#[async_trait]
impl<T> Destination for RowSink<'_, T>
where
    T: Entity + for<'r> FromRow<'r, AnyRow>,
{
    async fn fetch(&mut self, query: &Select) -> Result<usize, DataError> {
        let stmt = query.build_select()?;
        tracing::trace!(sql = %stmt.sql, "fetch");
        self.rows = sqlx::query_as_with::<Any, T, _>(&stmt.sql, arguments(&stmt.params)?)
            .fetch_all(self.pool)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        Ok(self.rows.len())
    }

    async fn count(&mut self, query: &Select) -> Result<u64, DataError> {
        let stmt = query.build_count()?;
        let total: i64 = sqlx::query_scalar_with::<Any, i64, _>(&stmt.sql, arguments(&stmt.params)?)
            .fetch_one(self.pool)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        Ok(u64::try_from(total).unwrap_or(0))
    }
}
