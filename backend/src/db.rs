use crate::errors::ApiError;
use chrono::{DateTime, Utc};
use shielded_ledger::registry::Registry;
use shielded_ledger::{Field, LedgerEvent, Relation, VerifierId};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Row, Sqlite};
use tracing::error;

pub type Db = Pool<Sqlite>;

pub async fn connect(db_url: &str) -> Result<Db, ApiError> {
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .map_err(|_| ApiError::Internal)
}

pub async fn init_schema(db: &Db) -> Result<(), ApiError> {
    // Append-only journal. `commitments` and `nullifiers` mirror the in-memory registry;
    // `verifiers` holds the key currently installed for each relation.
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS commitments (
  idx INTEGER PRIMARY KEY,
  commitment TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS nullifiers (
  nullifier TEXT PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS events (
  seq INTEGER PRIMARY KEY AUTOINCREMENT,
  created_at TEXT NOT NULL,
  kind TEXT NOT NULL,
  payload_json TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS verifiers (
  relation TEXT PRIMARY KEY,
  verifier_id TEXT NOT NULL,
  vk BLOB NOT NULL
);
"#,
    )
    .execute(db)
    .await
    .map_err(|_| ApiError::Internal)?;

    Ok(())
}

/// Write one transition's events, and the rows they imply, in a single transaction.
///
/// `verifier_key` must carry the compressed key whenever `events` contains `VerifierUpdated`.
pub async fn journal(db: &Db, events: &[LedgerEvent], verifier_key: Option<&[u8]>) -> Result<(), ApiError> {
    let created_at = Utc::now().to_rfc3339();
    let mut tx = db.begin().await.map_err(|_| ApiError::Internal)?;

    for event in events {
        let payload = serde_json::to_string(event).map_err(|_| ApiError::Internal)?;
        sqlx::query(r#"INSERT INTO events (created_at, kind, payload_json) VALUES (?, ?, ?)"#)
            .bind(created_at.clone())
            .bind(event.kind())
            .bind(payload)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!(error = %e, "event journal insert failed");
                ApiError::Internal
            })?;

        match event {
            LedgerEvent::CommitmentAdded { commitment, index } => {
                sqlx::query(r#"INSERT INTO commitments (idx, commitment) VALUES (?, ?)"#)
                    .bind(*index as i64)
                    .bind(commitment.to_string())
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| {
                        error!(error = %e, %commitment, "commitment insert failed");
                        ApiError::Internal
                    })?;
            }
            LedgerEvent::NullifierUsed { nullifier } => {
                sqlx::query(r#"INSERT INTO nullifiers (nullifier) VALUES (?)"#)
                    .bind(nullifier.to_string())
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| {
                        error!(error = %e, %nullifier, "nullifier insert failed");
                        ApiError::Internal
                    })?;
            }
            LedgerEvent::VerifierUpdated { relation, verifier } => {
                let Some(vk) = verifier_key else {
                    error!(%relation, "rotation journaled without a key");
                    return Err(ApiError::Internal);
                };
                upsert_verifier(&mut *tx, *relation, *verifier, vk).await?;
            }
            LedgerEvent::PrivateMint { .. } | LedgerEvent::PrivateTransfer { .. } => {}
        }
    }

    tx.commit().await.map_err(|_| ApiError::Internal)?;
    Ok(())
}

async fn upsert_verifier(
    conn: &mut sqlx::SqliteConnection,
    relation: Relation,
    id: VerifierId,
    vk: &[u8],
) -> Result<(), ApiError> {
    sqlx::query(
        r#"INSERT INTO verifiers (relation, verifier_id, vk) VALUES (?, ?, ?)
           ON CONFLICT(relation) DO UPDATE SET verifier_id = excluded.verifier_id, vk = excluded.vk"#,
    )
    .bind(relation.as_str())
    .bind(id.to_string())
    .bind(vk)
    .execute(conn)
    .await
    .map_err(|e| {
        error!(error = %e, %relation, "verifier upsert failed");
        ApiError::Internal
    })?;
    Ok(())
}

/// Record the initial key for a relation, outside of any ledger transition.
pub async fn store_verifier_key(db: &Db, relation: Relation, id: VerifierId, vk: &[u8]) -> Result<(), ApiError> {
    let mut conn = db.acquire().await.map_err(|_| ApiError::Internal)?;
    upsert_verifier(&mut *conn, relation, id, vk).await
}

pub async fn load_verifier_key(db: &Db, relation: Relation) -> Result<Option<(VerifierId, Vec<u8>)>, ApiError> {
    let row = sqlx::query(r#"SELECT verifier_id, vk FROM verifiers WHERE relation = ?"#)
        .bind(relation.as_str())
        .fetch_optional(db)
        .await
        .map_err(|_| ApiError::Internal)?;

    let Some(row) = row else { return Ok(None); };

    let id: String = row.get(0);
    let id: VerifierId = id.parse().map_err(|_| ApiError::Internal)?;
    let vk: Vec<u8> = row.get(1);
    Ok(Some((id, vk)))
}

/// Commitments in index order, and all nullifiers.
pub async fn load_registry_rows(db: &Db) -> Result<(Vec<Field>, Vec<Field>), ApiError> {
    let rows = sqlx::query(r#"SELECT commitment FROM commitments ORDER BY idx"#)
        .fetch_all(db)
        .await
        .map_err(|_| ApiError::Internal)?;
    let commitments = rows
        .iter()
        .map(|row| row.get::<String, _>(0).parse::<Field>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| ApiError::Internal)?;

    let rows = sqlx::query(r#"SELECT nullifier FROM nullifiers"#)
        .fetch_all(db)
        .await
        .map_err(|_| ApiError::Internal)?;
    let nullifiers = rows
        .iter()
        .map(|row| row.get::<String, _>(0).parse::<Field>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| ApiError::Internal)?;

    Ok((commitments, nullifiers))
}

pub async fn load_registry(db: &Db) -> Result<Registry, crate::errors::StartupError> {
    let (commitments, nullifiers) = load_registry_rows(db).await?;
    Ok(Registry::restore(commitments, nullifiers)?)
}

pub async fn count_events(db: &Db) -> Result<u64, ApiError> {
    let row = sqlx::query(r#"SELECT COUNT(*) AS c FROM events"#)
        .fetch_one(db)
        .await
        .map_err(|_| ApiError::Internal)?;
    let c: i64 = row.get("c");
    Ok(c as u64)
}

pub async fn list_events(
    db: &Db,
    offset: u64,
    limit: u64,
) -> Result<Vec<(u64, DateTime<Utc>, LedgerEvent)>, ApiError> {
    let offset = i64::try_from(offset).map_err(|_| ApiError::BadRequest(format!("offset {offset} out of range")))?;
    let limit = i64::try_from(limit).map_err(|_| ApiError::BadRequest(format!("limit {limit} out of range")))?;

    let rows = sqlx::query(
        r#"SELECT seq, created_at, payload_json
           FROM events
           ORDER BY seq
           LIMIT ? OFFSET ?"#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
    .map_err(|_| ApiError::Internal)?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let seq: i64 = row.get(0);
        let created_at: String = row.get(1);
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|_| ApiError::Internal)?
            .with_timezone(&Utc);
        let payload: String = row.get(2);
        let event: LedgerEvent = serde_json::from_str(&payload).map_err(|_| ApiError::Internal)?;

        out.push((seq as u64, created_at, event));
    }

    Ok(out)
}

#[cfg(test)]
pub(crate) async fn memory() -> Db {
    // One connection: every pooled connection to `sqlite::memory:` is a separate database.
    let db = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    init_schema(&db).await.unwrap();
    db
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn journal_replays_into_the_same_registry() {
        let db = memory().await;
        let c = |v| Field::from_u64(v);

        journal(
            &db,
            &[
                LedgerEvent::CommitmentAdded { commitment: c(1), index: 1 },
                LedgerEvent::PrivateMint { commitment: c(1), request_id: c(9), timestamp: 5 },
            ],
            None,
        )
        .await
        .unwrap();
        journal(
            &db,
            &[
                LedgerEvent::NullifierUsed { nullifier: c(100) },
                LedgerEvent::CommitmentAdded { commitment: c(2), index: 2 },
                LedgerEvent::CommitmentAdded { commitment: c(3), index: 3 },
            ],
            None,
        )
        .await
        .unwrap();

        let registry = load_registry(&db).await.unwrap();
        assert_eq!(registry.commitments(), &[c(1), c(2), c(3)]);
        assert!(registry.is_used(&c(100)));

        assert_eq!(count_events(&db).await.unwrap(), 5);
        let page = list_events(&db, 1, 2).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].0, 2);
        assert_eq!(page[1].2, LedgerEvent::NullifierUsed { nullifier: c(100) });
    }

    #[tokio::test]
    async fn failed_journal_writes_nothing() {
        let db = memory().await;
        let c = Field::from_u64(1);
        journal(&db, &[LedgerEvent::CommitmentAdded { commitment: c, index: 1 }], None)
            .await
            .unwrap();

        // Second row collides on `commitment`; the events written before it roll back too.
        let err = journal(
            &db,
            &[
                LedgerEvent::NullifierUsed { nullifier: Field::from_u64(7) },
                LedgerEvent::CommitmentAdded { commitment: c, index: 2 },
            ],
            None,
        )
        .await;
        assert!(err.is_err());
        assert_eq!(count_events(&db).await.unwrap(), 1);
        let (_, nullifiers) = load_registry_rows(&db).await.unwrap();
        assert!(nullifiers.is_empty());
    }

    #[tokio::test]
    async fn rotation_replaces_the_stored_key() {
        let db = memory().await;
        store_verifier_key(&db, Relation::Mint, VerifierId::new([1; 32]), b"old").await.unwrap();

        let rotation = [LedgerEvent::VerifierUpdated { relation: Relation::Mint, verifier: VerifierId::new([2; 32]) }];
        assert!(journal(&db, &rotation, None).await.is_err());
        journal(&db, &rotation, Some(b"new")).await.unwrap();

        let (id, vk) = load_verifier_key(&db, Relation::Mint).await.unwrap().unwrap();
        assert_eq!(id, VerifierId::new([2; 32]));
        assert_eq!(vk, b"new");
        assert!(load_verifier_key(&db, Relation::Transfer).await.unwrap().is_none());
    }
}
