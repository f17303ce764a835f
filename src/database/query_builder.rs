use sqlx::{self, postgres::PgArguments, postgres::PgRow, FromRow, PgPool, Row};

use crate::filter::types::{SqlParam, SqlResult};

/// Executes rendered `SqlResult`s, binding their typed parameters in order
pub struct QueryBuilder<'a> {
    sql: &'a SqlResult,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(sql: &'a SqlResult) -> Self {
        Self { sql }
    }

    pub async fn select_all<T>(self, pool: &PgPool) -> Result<Vec<T>, sqlx::Error>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut q = sqlx::query_as::<_, T>(&self.sql.query);
        for p in self.sql.params.iter() {
            q = bind_param_query_as(q, p);
        }
        q.fetch_all(pool).await
    }

    pub async fn count(self, pool: &PgPool) -> Result<i64, sqlx::Error> {
        let mut q = sqlx::query(&self.sql.query);
        for p in self.sql.params.iter() {
            q = bind_param_query(q, p);
        }
        let row = q.fetch_one(pool).await?;
        row.try_get("count")
    }
}

pub fn bind_param_query<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q SqlParam,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        SqlParam::Text(s) => q.bind(s.as_deref()),
        SqlParam::Int(i) => q.bind(*i),
    }
}

pub fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: &'q SqlParam,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match v {
        SqlParam::Text(s) => q.bind(s.as_deref()),
        SqlParam::Int(i) => q.bind(*i),
    }
}
