//! SQL layout of the journal store, and the pass that brings any earlier
//! layout up to it.
//!
//! [`ensure_layout`] runs once per connection at open time. It is a set of
//! additive, order-independent checks rather than a migration history:
//! missing tables are created, missing columns are added and backfilled, and
//! a table whose identity column is missing (or only present under a legacy
//! name) is rebuilt and swapped in. Legacy columns are never dropped. Running
//! it on an up-to-date store changes nothing.

use std::fmt;

use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior};
use tagesreflexion_core::Role;

/// Stamped into `PRAGMA user_version` after every pass. Informational only;
/// the pass inspects the actual layout instead of trusting this number.
pub const USER_VERSION: i64 = 4;

/// SQL expression for "now" in the store's timestamp format.
const NOW: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

// ─── Layout description ──────────────────────────────────────────────────────

/// How rows that predate a column get their value.
#[derive(Debug, Clone, Copy)]
pub enum Fill {
  /// Leave the column default (or NULL).
  Null,
  /// A constant SQL expression.
  Const(&'static str),
  /// `sql` reads the legacy column `from`; `fallback` is used when the table
  /// has no such column.
  Derived {
    from:     &'static str,
    sql:      &'static str,
    fallback: &'static str,
  },
}

impl Fill {
  fn expr(self, has: impl Fn(&str) -> bool) -> Option<&'static str> {
    match self {
      Fill::Null => None,
      Fill::Const(sql) => Some(sql),
      Fill::Derived { from, sql, fallback } => {
        Some(if has(from) { sql } else { fallback })
      }
    }
  }
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
  pub name:    &'static str,
  /// Definition used when the table is created from scratch.
  pub create:  &'static str,
  /// Definition used by `ALTER TABLE .. ADD COLUMN`. SQLite only accepts a
  /// NOT NULL column there if it also has a constant default.
  pub add:     &'static str,
  /// Identity column; a table without it is rebuilt.
  pub key:     bool,
  /// Names this column had in earlier layouts.
  pub aliases: &'static [&'static str],
  pub fill:    Fill,
}

impl Column {
  const fn new(
    name: &'static str,
    create: &'static str,
    add: &'static str,
  ) -> Self {
    Self { name, create, add, key: false, aliases: &[], fill: Fill::Null }
  }

  const fn id(name: &'static str) -> Self {
    Self {
      key: true,
      ..Self::new(name, "INTEGER PRIMARY KEY AUTOINCREMENT", "INTEGER")
    }
  }

  const fn aliases(self, aliases: &'static [&'static str]) -> Self {
    Self { aliases, ..self }
  }

  const fn fill(self, fill: Fill) -> Self { Self { fill, ..self } }
}

#[derive(Debug)]
pub struct Table {
  pub name:        &'static str,
  pub columns:     &'static [Column],
  /// Table constraints appended after the column definitions.
  pub constraints: &'static [&'static str],
}

impl Table {
  /// `CREATE TABLE` for the current layout under `name`, with `extra`
  /// (name, declared type) columns appended.
  fn create_sql(&self, name: &str, extra: &[(String, String)]) -> String {
    let mut defs: Vec<String> = self
      .columns
      .iter()
      .map(|c| format!("{} {}", c.name, c.create))
      .collect();
    defs.extend(extra.iter().map(|(n, ty)| format!("{n} {ty}")));
    defs.extend(self.constraints.iter().map(|c| (*c).to_owned()));
    format!("CREATE TABLE {name} (\n  {}\n)", defs.join(",\n  "))
  }
}

const DAYS: Table = Table {
  name:        "days",
  columns:     &[
    Column::id("id"),
    Column::new("day_date", "TEXT NOT NULL", "TEXT")
      .aliases(&["date"])
      .fill(Fill::Derived {
        from:     "created_at",
        sql:      "date(created_at, 'localtime')",
        fallback: "date('now', 'localtime')",
      }),
    Column::new(
      "status",
      "TEXT NOT NULL CHECK (status IN ('open', 'closed'))",
      "TEXT NOT NULL DEFAULT 'closed'",
    )
    .fill(Fill::Const("'closed'")),
    Column::new("created_at", "TEXT NOT NULL", "TEXT").fill(Fill::Const(NOW)),
    Column::new("closed_at", "TEXT", "TEXT"),
  ],
  constraints: &[],
};

const ENTRY_TEXT: &str = "TEXT NOT NULL DEFAULT ''";

const ENTRIES: Table = Table {
  name:        "entries",
  columns:     &[
    Column::id("id"),
    Column::new("day_id", "INTEGER NOT NULL REFERENCES days(id)", "INTEGER"),
    Column::new(
      "role",
      "TEXT NOT NULL CHECK (role IN ('mann', 'frau'))",
      "TEXT",
    ),
    Column::new("general_1", ENTRY_TEXT, ENTRY_TEXT).fill(Fill::Const("''")),
    Column::new("general_2", ENTRY_TEXT, ENTRY_TEXT).fill(Fill::Const("''")),
    Column::new("partner_specific", ENTRY_TEXT, ENTRY_TEXT)
      .fill(Fill::Const("''")),
    // The four-field layout had a single `children_gratitude`.
    Column::new("children1_gratitude", ENTRY_TEXT, ENTRY_TEXT).fill(
      Fill::Derived {
        from:     "children_gratitude",
        sql:      "COALESCE(children_gratitude, '')",
        fallback: "''",
      },
    ),
    Column::new("children2_gratitude", ENTRY_TEXT, ENTRY_TEXT)
      .fill(Fill::Const("''")),
    Column::new("created_at", "TEXT", "TEXT"),
    Column::new("updated_at", "TEXT", "TEXT"),
  ],
  constraints: &["UNIQUE (day_id, role)"],
};

const TALK_ITEMS: Table = Table {
  name:        "talk_items",
  columns:     &[
    Column::id("id"),
    Column::new("day_id", "INTEGER NOT NULL REFERENCES days(id)", "INTEGER"),
    Column::new("text", "TEXT NOT NULL", "TEXT NOT NULL DEFAULT ''")
      .fill(Fill::Const("''")),
    // Rows without an author are attributed to the first role.
    Column::new(
      "created_by",
      "TEXT NOT NULL CHECK (created_by IN ('mann', 'frau'))",
      "TEXT NOT NULL DEFAULT 'mann'",
    )
    .fill(Fill::Const("'mann'")),
    Column::new("created_at", "TEXT NOT NULL", "TEXT").fill(Fill::Const(NOW)),
    Column::new("origin_created_at", "TEXT NOT NULL", "TEXT").fill(
      Fill::Derived { from: "created_at", sql: "created_at", fallback: NOW },
    ),
    Column::new(
      "is_done",
      "INTEGER NOT NULL DEFAULT 0",
      "INTEGER NOT NULL DEFAULT 0",
    )
    .fill(Fill::Derived {
      from:     "done",
      sql:      "COALESCE(done, 0)",
      fallback: "0",
    }),
    Column::new("done_at", "TEXT", "TEXT"),
    Column::new(
      "done_by",
      "TEXT CHECK (done_by IN ('mann', 'frau'))",
      "TEXT",
    ),
  ],
  constraints: &[],
};

pub const TABLES: [&Table; 3] = [&DAYS, &ENTRIES, &TALK_ITEMS];

/// Created after column and data repairs, since legacy tables may lack the
/// indexed columns until then.
const INDEXES: &str = "
-- At most one open day.
CREATE UNIQUE INDEX IF NOT EXISTS days_single_open_idx
  ON days(status) WHERE status = 'open';
CREATE INDEX IF NOT EXISTS days_date_idx ON days(day_date, id);

-- Upsert target; also present as a table constraint on fresh stores.
CREATE UNIQUE INDEX IF NOT EXISTS entries_day_role_idx ON entries(day_id, role);

CREATE INDEX IF NOT EXISTS talk_day_open_idx
  ON talk_items(day_id, is_done, origin_created_at, id);
";

// ─── Repairs ─────────────────────────────────────────────────────────────────

/// A change [`ensure_layout`] made to an existing store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Repair {
  AddedColumn { table: &'static str, column: &'static str },
  RebuiltTable { table: &'static str, rows: usize },
  /// Items completed under the legacy `done` flag only.
  FoldedLegacyDone(usize),
  /// Talk items missing a row or origin timestamp.
  FilledTalkTimestamps(usize),
  /// Every open day but the newest was closed.
  ClosedSurplusOpenDays(usize),
  /// Entry rows created for days that lacked them.
  BackfilledEntries(usize),
  /// A date-keyed store had no open day; its newest day was reopened and
  /// gathered the unresolved items of every other day.
  ReopenedNewestDay { day_id: i64, gathered: usize },
}

impl fmt::Display for Repair {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Repair::AddedColumn { table, column } => {
        write!(f, "added column {table}.{column}")
      }
      Repair::RebuiltTable { table, rows } => {
        write!(f, "rebuilt table {table} ({rows} rows copied)")
      }
      Repair::FoldedLegacyDone(n) => {
        write!(f, "folded legacy done flag into is_done ({n} items)")
      }
      Repair::FilledTalkTimestamps(n) => {
        write!(f, "filled missing talk item timestamps ({n} items)")
      }
      Repair::ClosedSurplusOpenDays(n) => {
        write!(f, "closed {n} surplus open days")
      }
      Repair::BackfilledEntries(n) => write!(f, "created {n} missing entries"),
      Repair::ReopenedNewestDay { day_id, gathered } => {
        write!(f, "reopened day {day_id} with {gathered} unresolved talk items")
      }
    }
  }
}

// ─── Ensure layout ───────────────────────────────────────────────────────────

/// Create or repair the layout. All repairs run in one transaction; foreign
/// key enforcement is off while it runs so tables can be swapped.
pub fn ensure_layout(conn: &mut Connection) -> rusqlite::Result<Vec<Repair>> {
  conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA foreign_keys = OFF;")?;
  let result = apply(conn);
  conn.execute_batch("PRAGMA foreign_keys = ON;")?;
  result
}

fn apply(conn: &mut Connection) -> rusqlite::Result<Vec<Repair>> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  let mut repairs = Vec::new();

  // Date-keyed stores predate the open/closed status.
  let legacy_days = existing_columns(&tx, "days")?;
  let date_keyed = !legacy_days.is_empty() && !has(&legacy_days, "status");

  for table in TABLES {
    ensure_table(&tx, table, &mut repairs)?;
  }
  repair_data(&tx, &mut repairs)?;
  if date_keyed {
    reopen_newest_day(&tx, &mut repairs)?;
  }
  tx.execute_batch(INDEXES)?;
  backfill_entries(&tx, &mut repairs)?;
  tx.pragma_update(None, "user_version", USER_VERSION)?;

  tx.commit()?;
  Ok(repairs)
}

#[derive(Debug)]
struct ExistingColumn {
  name:      String,
  decl_type: String,
}

fn existing_columns(
  conn: &Connection,
  table: &str,
) -> rusqlite::Result<Vec<ExistingColumn>> {
  let mut stmt =
    conn.prepare("SELECT name, type FROM pragma_table_info(?1)")?;
  stmt
    .query_map([table], |row| {
      Ok(ExistingColumn { name: row.get(0)?, decl_type: row.get(1)? })
    })?
    .collect()
}

fn has(columns: &[ExistingColumn], name: &str) -> bool {
  columns.iter().any(|c| c.name.eq_ignore_ascii_case(name))
}

fn ensure_table(
  conn: &Connection,
  table: &'static Table,
  repairs: &mut Vec<Repair>,
) -> rusqlite::Result<()> {
  let mut existing = existing_columns(conn, table.name)?;

  if existing.is_empty() {
    conn.execute_batch(&table.create_sql(table.name, &[]))?;
    return Ok(());
  }

  if needs_rebuild(table, &existing) {
    let rows = rebuild(conn, table, &existing)?;
    repairs.push(Repair::RebuiltTable { table: table.name, rows });
    return Ok(());
  }

  for column in table.columns {
    if has(&existing, column.name) {
      continue;
    }
    conn.execute_batch(&format!(
      "ALTER TABLE {} ADD COLUMN {} {}",
      table.name, column.name, column.add
    ))?;
    if let Some(expr) = column.fill.expr(|c| has(&existing, c)) {
      conn.execute(
        &format!("UPDATE {} SET {} = {expr}", table.name, column.name),
        [],
      )?;
    }
    existing.push(ExistingColumn {
      name:      column.name.to_owned(),
      decl_type: column.add.to_owned(),
    });
    repairs.push(Repair::AddedColumn { table: table.name, column: column.name });
  }
  Ok(())
}

/// A missing identity column, or a column that only exists under a legacy
/// name, cannot be fixed with `ADD COLUMN`.
fn needs_rebuild(table: &Table, existing: &[ExistingColumn]) -> bool {
  table.columns.iter().any(|c| {
    !has(existing, c.name)
      && (c.key || c.aliases.iter().any(|a| has(existing, a)))
  })
}

fn same_affinity(decl_type: &str, target: &str) -> bool {
  let int = |t: &str| t.to_ascii_uppercase().contains("INT");
  int(decl_type) == int(target)
}

/// Copy `table` into the current layout under a temporary name, then swap it
/// into place. Every existing column survives: columns of the current layout
/// are populated from their own or legacy name, and any other column is
/// carried over as-is.
fn rebuild(
  conn: &Connection,
  table: &Table,
  existing: &[ExistingColumn],
) -> rusqlite::Result<usize> {
  let is_target = |name: &str| {
    table.columns.iter().any(|c| c.name.eq_ignore_ascii_case(name))
  };
  let is_alias = |name: &str| {
    table
      .columns
      .iter()
      .any(|c| c.aliases.iter().any(|a| a.eq_ignore_ascii_case(name)))
  };
  let mut claimed: Vec<&str> = Vec::new();

  let mut targets: Vec<String> = Vec::new();
  let mut sources: Vec<String> = Vec::new();

  for column in table.columns {
    let from = std::iter::once(column.name)
      .chain(column.aliases.iter().copied())
      .find(|n| has(existing, n));

    let source = match from {
      Some(name) => {
        claimed.push(name);
        match column.fill.expr(|c| has(existing, c)) {
          Some(fill) => format!("COALESCE({name}, {fill})"),
          None => name.to_owned(),
        }
      }
      None if column.key => {
        // Prefer an unclaimed column of the same type; otherwise the rowid
        // is a unique placeholder per row.
        match existing.iter().find(|e| {
          !is_target(&e.name)
            && !is_alias(&e.name)
            && !claimed.iter().any(|c| c.eq_ignore_ascii_case(&e.name))
            && !e.decl_type.is_empty()
            && same_affinity(&e.decl_type, column.create)
        }) {
          Some(e) => {
            claimed.push(&e.name);
            e.name.clone()
          }
          None => "rowid".to_owned(),
        }
      }
      None => column
        .fill
        .expr(|c| has(existing, c))
        .unwrap_or("NULL")
        .to_owned(),
    };
    targets.push(column.name.to_owned());
    sources.push(source);
  }

  let extra: Vec<(String, String)> = existing
    .iter()
    .filter(|e| !is_target(&e.name))
    .map(|e| (e.name.clone(), e.decl_type.clone()))
    .collect();
  for (name, _) in &extra {
    targets.push(name.clone());
    sources.push(name.clone());
  }

  let temp = format!("{}__rebuild", table.name);
  conn.execute_batch(&format!("DROP TABLE IF EXISTS {temp}"))?;
  conn.execute_batch(&table.create_sql(&temp, &extra))?;
  let rows = conn.execute(
    &format!(
      "INSERT INTO {temp} ({}) SELECT {} FROM {}",
      targets.join(", "),
      sources.join(", "),
      table.name
    ),
    [],
  )?;
  conn.execute_batch(&format!(
    "DROP TABLE {name}; ALTER TABLE {temp} RENAME TO {name};",
    name = table.name
  ))?;
  Ok(rows)
}

fn repair_data(
  conn: &Connection,
  repairs: &mut Vec<Repair>,
) -> rusqlite::Result<()> {
  if has(&existing_columns(conn, "talk_items")?, "done") {
    let n = conn.execute(
      "UPDATE talk_items SET is_done = 1 WHERE done = 1 AND is_done = 0",
      [],
    )?;
    if n > 0 {
      repairs.push(Repair::FoldedLegacyDone(n));
    }
  }

  let mut filled = conn.execute(
    &format!(
      "UPDATE talk_items SET created_at = COALESCE(origin_created_at, {NOW})
       WHERE created_at IS NULL"
    ),
    [],
  )?;
  filled += conn.execute(
    "UPDATE talk_items SET origin_created_at = created_at
     WHERE origin_created_at IS NULL",
    [],
  )?;
  if filled > 0 {
    repairs.push(Repair::FilledTalkTimestamps(filled));
  }

  let closed = conn.execute(
    &format!(
      "UPDATE days SET status = 'closed', closed_at = COALESCE(closed_at, {NOW})
       WHERE status = 'open'
         AND id <> (SELECT MAX(id) FROM days WHERE status = 'open')"
    ),
    [],
  )?;
  if closed > 0 {
    repairs.push(Repair::ClosedSurplusOpenDays(closed));
  }
  Ok(())
}

/// In a date-keyed store the backlog was global: every unresolved item
/// showed up no matter which day it was filed under. The newest day becomes
/// the open day and receives a copy of each unresolved item from the other
/// days, keeping its origin, so the backlog survives the upgrade.
fn reopen_newest_day(
  conn: &Connection,
  repairs: &mut Vec<Repair>,
) -> rusqlite::Result<()> {
  let open: i64 =
    conn.query_row("SELECT COUNT(*) FROM days WHERE status = 'open'", [], |r| {
      r.get(0)
    })?;
  if open > 0 {
    return Ok(());
  }
  let newest: Option<i64> = conn
    .query_row(
      "SELECT id FROM days ORDER BY day_date DESC, id DESC LIMIT 1",
      [],
      |r| r.get(0),
    )
    .optional()?;
  let Some(day_id) = newest else {
    return Ok(());
  };

  conn.execute(
    "UPDATE days SET status = 'open', closed_at = NULL WHERE id = ?1",
    [day_id],
  )?;
  let gathered = conn.execute(
    &format!(
      "INSERT INTO talk_items (
         day_id, text, created_by, created_at, origin_created_at, is_done
       )
       SELECT ?1, text, created_by, {NOW}, origin_created_at, 0
       FROM talk_items WHERE day_id <> ?1 AND is_done = 0
       ORDER BY julianday(origin_created_at), origin_created_at, id"
    ),
    [day_id],
  )?;
  repairs.push(Repair::ReopenedNewestDay { day_id, gathered });
  Ok(())
}

fn backfill_entries(
  conn: &Connection,
  repairs: &mut Vec<Repair>,
) -> rusqlite::Result<()> {
  let mut created = 0;
  for role in Role::ALL {
    created += conn.execute(
      "INSERT INTO entries (day_id, role, created_at)
       SELECT d.id, ?1, d.created_at FROM days d
       WHERE NOT EXISTS (
         SELECT 1 FROM entries e WHERE e.day_id = d.id AND e.role = ?1
       )",
      [role.as_str()],
    )?;
  }
  if created > 0 {
    repairs.push(Repair::BackfilledEntries(created));
  }
  Ok(())
}
