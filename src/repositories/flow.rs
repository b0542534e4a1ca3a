// src/repositories/flow.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::{ApiError, ApiResult};
use crate::models::{FlowReading, FlowReport};
use super::ReadingStore;

pub struct SqliteReadingStore {
    pool: SqlitePool,
}

impl SqliteReadingStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReadingStore for SqliteReadingStore {
    async fn list(&self) -> ApiResult<Vec<FlowReading>> {
        let readings: Vec<FlowReading> = sqlx::query_as(
            r#"SELECT id, timestamp, duration_seconds, flow_rate, operator, deepwell_1, deepwell_2, remark
               FROM flow_readings ORDER BY timestamp DESC, rowid DESC"#
        )
            .fetch_all(&self.pool)
            .await?;

        Ok(readings)
    }

    async fn create(&self, reading: &FlowReading) -> ApiResult<()> {
        sqlx::query(
            r#"INSERT INTO flow_readings
               (id, timestamp, duration_seconds, flow_rate, operator, deepwell_1, deepwell_2, remark)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#
        )
            .bind(&reading.id)
            .bind(reading.timestamp)
            .bind(reading.duration_seconds)
            .bind(reading.flow_rate)
            .bind(&reading.operator)
            .bind(reading.deepwell_1)
            .bind(reading.deepwell_2)
            .bind(&reading.remark)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete(&self, id: &str) -> ApiResult<()> {
        let result = sqlx::query("DELETE FROM flow_readings WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::reading_not_found(id));
        }

        Ok(())
    }

    async fn clear(&self) -> ApiResult<u64> {
        let result = sqlx::query("DELETE FROM flow_readings")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn create_report(&self, report: &FlowReport) -> ApiResult<()> {
        let readings = serde_json::to_string(&report.readings)?;

        sqlx::query(
            r#"INSERT INTO flow_reports (id, timestamp, readings, count, mean_flow_rate)
               VALUES (?, ?, ?, ?, ?)"#
        )
            .bind(&report.id)
            .bind(report.timestamp)
            .bind(&readings)
            .bind(report.count)
            .bind(report.mean_flow_rate)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_reports(&self) -> ApiResult<Vec<FlowReport>> {
        let rows: Vec<(String, DateTime<Utc>, String, i64, f64)> = sqlx::query_as(
            "SELECT id, timestamp, readings, count, mean_flow_rate FROM flow_reports ORDER BY timestamp DESC"
        )
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|(id, timestamp, readings, count, mean_flow_rate)| -> ApiResult<FlowReport> {
                Ok(FlowReport {
                    id,
                    timestamp,
                    readings: serde_json::from_str(&readings)?,
                    count,
                    mean_flow_rate,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::memory_pool;
    use crate::flow::{build_reading, summarize};
    use crate::models::ReadingFields;
    use chrono::Duration;

    fn reading(cs: u64, at: DateTime<Utc>) -> FlowReading {
        let fields = ReadingFields {
            operator: "Ana".to_string(),
            deepwell_1: Some(3.5),
            deepwell_2: None,
            remark: Some("north well".to_string()),
        };
        build_reading(cs, fields, at)
    }

    #[actix_rt::test]
    async fn test_create_list_delete() {
        let store = SqliteReadingStore::new(memory_pool().await);
        let now = Utc::now();
        let older = reading(6000, now - Duration::minutes(5));
        let newer = reading(700, now);

        store.create(&older).await.unwrap();
        store.create(&newer).await.unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, newer.id);
        assert_eq!(listed[1].deepwell_1, Some(3.5));
        assert_eq!(listed[1].remark.as_deref(), Some("north well"));

        store.delete(&older.id).await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 1);
        assert!(matches!(store.delete(&older.id).await, Err(ApiError::NotFound(_))));
    }

    #[actix_rt::test]
    async fn test_clear_returns_count() {
        let store = SqliteReadingStore::new(memory_pool().await);
        for cs in [100, 200, 300] {
            store.create(&reading(cs, Utc::now())).await.unwrap();
        }
        assert_eq!(store.clear().await.unwrap(), 3);
        assert!(store.list().await.unwrap().is_empty());
        assert_eq!(store.clear().await.unwrap(), 0);
    }

    #[actix_rt::test]
    async fn test_reports_keep_reading_snapshot() {
        let store = SqliteReadingStore::new(memory_pool().await);
        let readings = vec![reading(6000, Utc::now()), reading(700, Utc::now())];
        let summary = summarize(&readings);

        let report = FlowReport {
            id: "rep-1".to_string(),
            timestamp: Utc::now(),
            readings: readings.clone(),
            count: summary.count,
            mean_flow_rate: summary.mean_flow_rate,
        };
        store.create_report(&report).await.unwrap();

        let reports = store.list_reports().await.unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].count, 2);
        assert_eq!(reports[0].readings.len(), 2);
        assert_eq!(reports[0].readings[1].flow_rate, 2262.86);
        assert_eq!(reports[0].mean_flow_rate, summary.mean_flow_rate);
    }
}
