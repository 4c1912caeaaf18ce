//! [`SqliteStore`] — the SQLite implementation of [`StateStore`].

use std::{collections::HashMap, path::Path};

use sift_core::{
  history::HistoryEntry,
  sender::SenderKey,
  store::{
    PersistedHistory, PersistedSender, PersistedState, SnapshotRow,
    StateStore,
  },
};

use crate::{
  Error, Result,
  encode::{SCOPE_DAY, SCOPE_MONTH, decode_identifier, encode_kind},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Tracker state backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted, so a clone
/// shares the same database.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Raw row shapes ──────────────────────────────────────────────────────────

type RawHistory = (String, String, i64, i64);
type RawSender = (i64, i64, String, String);
type RawScope = (i64, i64, String, String, String);

// ─── StateStore impl ─────────────────────────────────────────────────────────

impl StateStore for SqliteStore {
  type Error = Error;

  async fn load(&self) -> Result<PersistedState> {
    let (history_raw, senders_raw, scopes_raw, activity): (
      Vec<RawHistory>,
      Vec<RawSender>,
      Vec<RawScope>,
      Vec<SnapshotRow>,
    ) = self
      .conn
      .call(|conn| {
        let mut stmt = conn
          .prepare("SELECT kind, key, seen_count, first_seen_by FROM history")?;
        let history = stmt
          .query_map([], |r| {
            Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(
          "SELECT chat_id, sender_id, last_day, last_month FROM senders",
        )?;
        let senders = stmt
          .query_map([], |r| {
            Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(
          "SELECT chat_id, sender_id, scope, kind, key FROM sender_scopes",
        )?;
        let scopes = stmt
          .query_map([], |r| {
            Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(
          "SELECT chat_id, sender_id, date, new_count, duplicate_count,
                  day_total, month_total
           FROM activity",
        )?;
        let activity = stmt
          .query_map([], |r| {
            Ok(SnapshotRow {
              chat_id:         r.get(0)?,
              sender_id:       r.get(1)?,
              date:            r.get(2)?,
              new_count:       r.get::<_, i64>(3)? as u64,
              duplicate_count: r.get::<_, i64>(4)? as u64,
              day_total:       r.get::<_, i64>(5)? as u64,
              month_total:     r.get::<_, i64>(6)? as u64,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((history, senders, scopes, activity))
      })
      .await?;

    let history = history_raw
      .into_iter()
      .map(|(kind, key, seen_count, first_seen_by)| {
        Ok(PersistedHistory {
          identifier: decode_identifier(&kind, key)?,
          entry:      HistoryEntry {
            seen_count: seen_count as u64,
            first_seen_by,
          },
        })
      })
      .collect::<Result<Vec<_>>>()?;

    let mut senders: HashMap<SenderKey, PersistedSender> = senders_raw
      .into_iter()
      .map(|(chat_id, sender_id, last_day, last_month)| {
        let key = SenderKey { chat_id, sender_id };
        (key, PersistedSender {
          key,
          last_day,
          last_month,
          day_set: Vec::new(),
          month_set: Vec::new(),
        })
      })
      .collect();

    for (chat_id, sender_id, scope, kind, key) in scopes_raw {
      let id = decode_identifier(&kind, key)?;
      // Scope rows without a parent sender row are skipped on principle,
      // but the save path always writes the sender row first.
      let Some(sender) =
        senders.get_mut(&SenderKey { chat_id, sender_id })
      else {
        continue;
      };
      match scope.as_str() {
        SCOPE_DAY => sender.day_set.push(id),
        SCOPE_MONTH => sender.month_set.push(id),
        other => return Err(Error::UnknownScope(other.to_owned())),
      }
    }

    Ok(PersistedState {
      history,
      senders: senders.into_values().collect(),
      activity,
    })
  }

  async fn save_sender(&self, sender: &PersistedSender) -> Result<()> {
    let key = sender.key;
    let last_day = sender.last_day.clone();
    let last_month = sender.last_month.clone();
    let rows: Vec<(&'static str, String, String)> = sender
      .day_set
      .iter()
      .map(|id| (SCOPE_DAY, encode_kind(id.kind).to_owned(), id.key.clone()))
      .chain(sender.month_set.iter().map(|id| {
        (SCOPE_MONTH, encode_kind(id.kind).to_owned(), id.key.clone())
      }))
      .collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO senders (chat_id, sender_id, last_day, last_month)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (chat_id, sender_id) DO UPDATE SET
             last_day   = excluded.last_day,
             last_month = excluded.last_month",
          rusqlite::params![key.chat_id, key.sender_id, last_day, last_month],
        )?;
        tx.execute(
          "DELETE FROM sender_scopes WHERE chat_id = ?1 AND sender_id = ?2",
          rusqlite::params![key.chat_id, key.sender_id],
        )?;
        for (scope, kind, id_key) in &rows {
          tx.execute(
            "INSERT INTO sender_scopes (chat_id, sender_id, scope, kind, key)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![key.chat_id, key.sender_id, scope, kind, id_key],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn record_history(&self, entries: &[PersistedHistory]) -> Result<()> {
    let rows: Vec<(String, String, i64, i64)> = entries
      .iter()
      .map(|e| {
        (
          encode_kind(e.identifier.kind).to_owned(),
          e.identifier.key.clone(),
          e.entry.seen_count as i64,
          e.entry.first_seen_by,
        )
      })
      .collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for (kind, key, seen_count, first_seen_by) in &rows {
          // first_seen_by is write-once; only the count follows the
          // in-memory value.
          tx.execute(
            "INSERT INTO history (kind, key, seen_count, first_seen_by)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (kind, key) DO UPDATE SET
               seen_count = excluded.seen_count",
            rusqlite::params![kind, key, seen_count, first_seen_by],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn record_activity(&self, row: &SnapshotRow) -> Result<()> {
    let row = row.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO activity (chat_id, sender_id, date, new_count,
                                 duplicate_count, day_total, month_total)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
           ON CONFLICT (chat_id, sender_id, date) DO UPDATE SET
             new_count       = excluded.new_count,
             duplicate_count = excluded.duplicate_count,
             day_total       = excluded.day_total,
             month_total     = excluded.month_total",
          rusqlite::params![
            row.chat_id,
            row.sender_id,
            row.date,
            row.new_count as i64,
            row.duplicate_count as i64,
            row.day_total as i64,
            row.month_total as i64,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
