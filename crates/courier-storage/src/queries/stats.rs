// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-distribution delivery counters.

use courier_core::CourierError;
use rusqlite::types::Type;

use crate::database::{map_tr_err, Database};
use crate::models::{parse_timestamp, DistributionStats};

/// Counters for every distribution, deleted ones included, ordered by id.
pub async fn distribution_stats(db: &Database) -> Result<Vec<DistributionStats>, CourierError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT d.id, d.text, d.end_date, d.was_deleted,
                        COUNT(m.id),
                        COALESCE(SUM(m.send_status = 'SENT'), 0),
                        COALESCE(SUM(m.send_status = 'FAIL'), 0),
                        COALESCE(SUM(m.send_status = 'NOT_SENT'), 0)
                 FROM distributions d
                 LEFT JOIN messages m ON m.distribution_id = d.id
                 GROUP BY d.id
                 ORDER BY d.id ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                let raw_end: String = row.get(2)?;
                let end_date = parse_timestamp(&raw_end).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        2,
                        Type::Text,
                        format!("unparseable timestamp `{raw_end}`").into(),
                    )
                })?;
                Ok(DistributionStats {
                    distribution_id: row.get::<_, i64>(0)?.into(),
                    text: row.get(1)?,
                    end_date,
                    was_deleted: row.get(3)?,
                    total: row.get(4)?,
                    sent: row.get(5)?,
                    failed: row.get(6)?,
                    not_sent: row.get(7)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::queries::messages;
    use chrono::{Duration, Utc};
    use courier_config::model::StorageConfig;
    use courier_core::SendStatus;
    use tempfile::tempdir;

    #[tokio::test]
    async fn counts_by_status_including_empty_distributions() {
        let dir = tempdir().unwrap();
        let config = StorageConfig {
            database_path: dir.path().join("stats.db").to_string_lossy().into_owned(),
            ..StorageConfig::default()
        };
        let db = Database::open(&config).await.unwrap();
        let now = Utc::now();
        let d1 = fixtures::insert_distribution(&db, now, now + Duration::hours(1), "one", "vip")
            .await
            .unwrap();
        let d2 = fixtures::insert_distribution(&db, now, now + Duration::hours(1), "two", "none")
            .await
            .unwrap();

        let mut statuses = vec![SendStatus::Sent, SendStatus::Fail, SendStatus::NotSent, SendStatus::Sent];
        for (i, status) in statuses.drain(..).enumerate() {
            let c = fixtures::insert_client(&db, &format!("7999000000{i}"), "999", "vip")
                .await
                .unwrap();
            let mut m = messages::insert_message(&db, d1.id, c.id).await.unwrap();
            if status != SendStatus::NotSent {
                m.send_status = status;
                messages::update_message(&db, &m).await.unwrap();
            }
        }

        let stats = distribution_stats(&db).await.unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].distribution_id, d1.id);
        assert_eq!((stats[0].total, stats[0].sent, stats[0].failed, stats[0].not_sent), (4, 2, 1, 1));
        assert_eq!(stats[1].distribution_id, d2.id);
        assert_eq!(stats[1].total, 0);
        assert_eq!(stats[1].sent, 0);
    }
}
