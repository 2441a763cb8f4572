use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Collection {
    Students,
    Attendance,
}

impl Collection {
    fn table(self) -> &'static str {
        match self {
            Self::Students => "students",
            Self::Attendance => "attendance",
        }
    }
}

/// Listing entry for the most recent attendance documents.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSummary {
    pub id: String,
    pub date: Option<String>,
    pub section: Option<String>,
}

/// Document get/query/set over the Students and Attendance collections.
///
/// `set` always replaces the whole document; there is no merge or version check.
pub trait PersistenceGateway {
    fn get(&self, collection: Collection, key: &str) -> anyhow::Result<Option<Value>>;
    fn query(&self, collection: Collection) -> anyhow::Result<Vec<(String, Value)>>;
    fn set(&self, collection: Collection, key: &str, doc: &Value) -> anyhow::Result<()>;

    /// Attendance documents ordered by `date` descending, newest first.
    fn recent_attendance(&self, limit: usize) -> anyhow::Result<Vec<RecordSummary>> {
        let mut out: Vec<RecordSummary> = self
            .query(Collection::Attendance)?
            .into_iter()
            .map(|(id, doc)| RecordSummary {
                id,
                date: doc.get("date").and_then(|v| v.as_str()).map(str::to_string),
                section: doc
                    .get("section")
                    .and_then(|v| v.as_str())
                    .map(str::to_string),
            })
            .collect();
        out.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
        out.truncate(limit);
        Ok(out)
    }
}

pub struct SqliteGateway<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteGateway<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl PersistenceGateway for SqliteGateway<'_> {
    fn get(&self, collection: Collection, key: &str) -> anyhow::Result<Option<Value>> {
        let sql = format!("SELECT doc FROM {} WHERE doc_id = ?", collection.table());
        let raw: Option<String> = self
            .conn
            .query_row(&sql, [key], |r| r.get(0))
            .optional()?;
        match raw {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    fn query(&self, collection: Collection) -> anyhow::Result<Vec<(String, Value)>> {
        let sql = format!(
            "SELECT doc_id, doc FROM {} ORDER BY doc_id",
            collection.table()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        let mut out = Vec::with_capacity(rows.len());
        for (id, text) in rows {
            out.push((id, serde_json::from_str(&text)?));
        }
        Ok(out)
    }

    fn set(&self, collection: Collection, key: &str, doc: &Value) -> anyhow::Result<()> {
        let text = serde_json::to_string(doc)?;
        let now = Utc::now().to_rfc3339();
        match collection {
            Collection::Students => {
                self.conn.execute(
                    "INSERT INTO students(doc_id, doc, updated_at) VALUES(?, ?, ?)
                     ON CONFLICT(doc_id) DO UPDATE SET
                       doc = excluded.doc,
                       updated_at = excluded.updated_at",
                    (key, &text, &now),
                )?;
            }
            Collection::Attendance => {
                let section = doc.get("section").and_then(|v| v.as_str());
                let date = doc.get("date").and_then(|v| v.as_str());
                self.conn.execute(
                    "INSERT INTO attendance(doc_id, doc, updated_at, section, date)
                     VALUES(?, ?, ?, ?, ?)
                     ON CONFLICT(doc_id) DO UPDATE SET
                       doc = excluded.doc,
                       updated_at = excluded.updated_at,
                       section = excluded.section,
                       date = excluded.date",
                    (key, &text, &now, section, date),
                )?;
            }
        }
        Ok(())
    }

    fn recent_attendance(&self, limit: usize) -> anyhow::Result<Vec<RecordSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT doc_id, date, section
             FROM attendance
             ORDER BY date DESC, doc_id
             LIMIT ?",
        )?;
        let rows = stmt
            .query_map([limit as i64], |r| {
                Ok(RecordSummary {
                    id: r.get(0)?,
                    date: r.get(1)?,
                    section: r.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
