//! PostgreSQL-backed `TestStore` implementation

use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};

use crate::{
    db::traits::TestStore,
    models::{
        timestamp::canonicalize, DiagnosticTest, DiagnosticTestPatch, NewDiagnosticTest,
        TestQuery,
    },
    Error, Result,
};

const COLUMNS: &str = "id, patient_name, test_type, result, test_date, notes";

/// PostgreSQL-backed TestStore implementation
#[derive(Clone)]
pub struct PostgresTestStore {
    pub(crate) pool: PgPool,
}

impl PostgresTestStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_test(row: &PgRow) -> Result<DiagnosticTest> {
        Ok(DiagnosticTest {
            id: row.try_get("id")?,
            patient_name: row.try_get("patient_name")?,
            test_type: row.try_get("test_type")?,
            result: row.try_get("result")?,
            test_date: canonicalize(row.try_get("test_date")?),
            notes: row.try_get("notes")?,
        })
    }
}

/// Build an `ILIKE` pattern matching `term` literally anywhere in the value.
pub(crate) fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl TestStore for PostgresTestStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn insert(&self, test: NewDiagnosticTest) -> Result<DiagnosticTest> {
        let sql = format!(
            "INSERT INTO diagnostic_tests (patient_name, test_type, result, test_date, notes)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );

        let row = sqlx::query(&sql)
            .bind(&test.patient_name)
            .bind(&test.test_type)
            .bind(&test.result)
            .bind(test.test_date)
            .bind(&test.notes)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;

        Self::row_to_test(&row)
    }

    async fn get(&self, id: i64) -> Result<Option<DiagnosticTest>> {
        let sql = format!("SELECT {COLUMNS} FROM diagnostic_tests WHERE id = $1");

        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        row.as_ref().map(Self::row_to_test).transpose()
    }

    async fn update(
        &self,
        id: i64,
        patch: &DiagnosticTestPatch,
    ) -> Result<Option<DiagnosticTest>> {
        // `notes` needs a separate flag so that "absent" and "clear" differ.
        let sql = format!(
            "UPDATE diagnostic_tests
             SET patient_name = COALESCE($2, patient_name),
                 test_type = COALESCE($3, test_type),
                 result = COALESCE($4, result),
                 test_date = COALESCE($5, test_date),
                 notes = CASE WHEN $6 THEN $7 ELSE notes END,
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );

        let row = sqlx::query(&sql)
            .bind(id)
            .bind(&patch.patient_name)
            .bind(&patch.test_type)
            .bind(&patch.result)
            .bind(patch.test_date)
            .bind(patch.notes.is_some())
            .bind(patch.notes.clone().flatten())
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        row.as_ref().map(Self::row_to_test).transpose()
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM diagnostic_tests WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(result.rows_affected() > 0)
    }

    async fn search(&self, query: &TestQuery) -> Result<(Vec<DiagnosticTest>, u64)> {
        let pattern = query.search.as_deref().map(contains_pattern);
        let filter = r"($1::TEXT IS NULL
                OR patient_name ILIKE $1 ESCAPE '\'
                OR test_type ILIKE $1 ESCAPE '\')";

        // Count and page must see the same snapshot.
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM diagnostic_tests WHERE {filter}"
        ))
        .bind(&pattern)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;

        let offset = i64::try_from(query.offset())
            .map_err(|_| Error::InvalidRequest("page is out of range".to_string()))?;

        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS}
             FROM diagnostic_tests
             WHERE {filter}
             ORDER BY test_date DESC, id DESC
             LIMIT $2 OFFSET $3"
        ))
        .bind(&pattern)
        .bind(i64::from(query.limit))
        .bind(offset)
        .fetch_all(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        let tests = rows
            .iter()
            .map(Self::row_to_test)
            .collect::<Result<Vec<_>>>()?;

        Ok((tests, u64::try_from(total).unwrap_or(0)))
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}
