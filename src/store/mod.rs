use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow};
use rusqlite::Connection;

pub mod fixtures;
pub mod pitches;
pub mod players;
pub mod results;
pub mod teams;
pub mod venues;

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create db dir {}", parent.display()))?;
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    conn.execute_batch("PRAGMA journal_mode = WAL;")
        .context("enable wal journal")?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
    init_schema(&conn)?;
    Ok(conn)
}

// Table and column names match the databases written by earlier releases of
// the server, so an existing torneo.db opens as-is.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;
        CREATE TABLE IF NOT EXISTS subsedes (
            id INTEGER PRIMARY KEY,
            nombre TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS equipos (
            id INTEGER PRIMARY KEY,
            nombre TEXT NOT NULL,
            subsedeId INTEGER NOT NULL,
            escudo TEXT,
            grupo TEXT,
            FOREIGN KEY(subsedeId) REFERENCES subsedes(id) ON DELETE CASCADE
        );
        CREATE TABLE IF NOT EXISTS jugadores (
            id INTEGER PRIMARY KEY,
            nombre TEXT NOT NULL,
            apellido TEXT NOT NULL,
            fechaNacimiento TEXT NOT NULL,
            documento TEXT NOT NULL,
            numeroCamiseta INTEGER NOT NULL,
            equipoId INTEGER NOT NULL,
            FOREIGN KEY(equipoId) REFERENCES equipos(id) ON DELETE CASCADE
        );
        CREATE TABLE IF NOT EXISTS partidos (
            id INTEGER PRIMARY KEY,
            subsedeId INTEGER NOT NULL,
            local INTEGER NOT NULL,
            visitante INTEGER NOT NULL,
            fecha TEXT NOT NULL,
            hora TEXT,
            canchaId INTEGER,
            golesLocal INTEGER,
            golesVisitante INTEGER,
            observaciones TEXT,
            grupo TEXT,
            FOREIGN KEY(subsedeId) REFERENCES subsedes(id) ON DELETE CASCADE,
            FOREIGN KEY(local) REFERENCES equipos(id) ON DELETE CASCADE,
            FOREIGN KEY(visitante) REFERENCES equipos(id) ON DELETE CASCADE
        );
        CREATE TABLE IF NOT EXISTS canchas (
            id INTEGER PRIMARY KEY,
            nombre TEXT NOT NULL,
            subsedeId INTEGER,
            FOREIGN KEY(subsedeId) REFERENCES subsedes(id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_equipos_subsede ON equipos(subsedeId);
        CREATE INDEX IF NOT EXISTS idx_jugadores_equipo ON jugadores(equipoId);
        CREATE INDEX IF NOT EXISTS idx_partidos_subsede ON partidos(subsedeId);
        CREATE INDEX IF NOT EXISTS idx_canchas_subsede ON canchas(subsedeId);
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// Shared handle to the single SQLite connection. Queries run on the blocking
/// pool so async handlers never hold the runtime while SQLite works.
#[derive(Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
}

impl Db {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    pub async fn run<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| anyhow!("database lock poisoned"))?;
            f(&mut guard)
        })
        .await
        .context("database task failed")?
    }
}

fn collect_rows<T>(rows: impl Iterator<Item = rusqlite::Result<T>>, what: &str) -> Result<Vec<T>> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row.with_context(|| format!("decode {what} row"))?);
    }
    Ok(out)
}
