// Account Store - keyed persistence of Account records
//
// One trait, two backends:
// - SqliteAccountStore: rusqlite connection behind a Mutex (file or :memory:)
// - MemoryAccountStore: process-local map behind a RwLock
//
// Ids come from a monotonic counter and are never reused after a delete.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, RwLock};

use crate::account::{Account, AccountFields, AccountType};
use crate::error::StoreError;

pub type StoreResult<T> = Result<T, StoreError>;

/// CRUD operations over Account records
///
/// Every call is atomic for the record it touches; concurrent writers to the
/// same id resolve last-writer-wins.
pub trait AccountStore: Send + Sync {
    /// Persist a new account and return it with its freshly assigned id
    fn create(&self, fields: AccountFields) -> StoreResult<Account>;

    fn get(&self, id: i64) -> StoreResult<Account>;

    /// Every stored account; callers must not rely on the order
    fn list(&self) -> StoreResult<Vec<Account>>;

    /// Overwrite balance, creation date and type of an existing account
    fn update(&self, id: i64, fields: AccountFields) -> StoreResult<Account>;

    fn delete(&self, id: i64) -> StoreResult<()>;

    fn count(&self) -> StoreResult<usize>;
}

// ============================================================================
// SQLITE BACKEND
// ============================================================================

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteAccountStore {
    conn: Mutex<Connection>,
}

impl SqliteAccountStore {
    /// Open (or create) a database file and make sure the schema exists
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode for crash recovery
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::with_connection(conn)
    }

    /// Private in-memory database, gone when the store is dropped
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    pub fn with_connection(conn: Connection) -> StoreResult<Self> {
        setup_database(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

pub fn setup_database(conn: &Connection) -> StoreResult<()> {
    // AUTOINCREMENT keeps ids from being reused after a delete
    conn.execute(
        "CREATE TABLE IF NOT EXISTS accounts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            balance REAL NOT NULL,
            creation_date TEXT NOT NULL,
            account_type TEXT NOT NULL CHECK (account_type IN ('CHECKING', 'SAVINGS'))
        )",
        [],
    )?;

    Ok(())
}

fn row_to_account(row: &Row<'_>) -> rusqlite::Result<(i64, f64, String, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn decode_row((id, balance, date, kind): (i64, f64, String, String)) -> StoreResult<Account> {
    let creation_date = NaiveDate::parse_from_str(&date, DATE_FORMAT)
        .map_err(|e| StoreError::Corrupt(format!("account {id}: creation_date `{date}`: {e}")))?;
    let account_type: AccountType = kind
        .parse()
        .map_err(|e| StoreError::Corrupt(format!("account {id}: {e}")))?;

    Ok(Account::with_id(
        id,
        AccountFields {
            balance,
            creation_date,
            account_type,
        },
    ))
}

fn select_one(conn: &Connection, id: i64) -> StoreResult<Option<Account>> {
    let row = conn
        .query_row(
            "SELECT id, balance, creation_date, account_type FROM accounts WHERE id = ?1",
            params![id],
            row_to_account,
        )
        .optional()?;

    row.map(decode_row).transpose()
}

impl AccountStore for SqliteAccountStore {
    fn create(&self, fields: AccountFields) -> StoreResult<Account> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO accounts (balance, creation_date, account_type) VALUES (?1, ?2, ?3)",
            params![
                fields.balance,
                fields.creation_date.format(DATE_FORMAT).to_string(),
                fields.account_type.as_str(),
            ],
        )?;
        let id = conn.last_insert_rowid();

        Ok(Account::with_id(id, fields))
    }

    fn get(&self, id: i64) -> StoreResult<Account> {
        let conn = self.lock()?;
        select_one(&conn, id)?.ok_or(StoreError::NotFound(id))
    }

    fn list(&self) -> StoreResult<Vec<Account>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, balance, creation_date, account_type FROM accounts ORDER BY id",
        )?;

        let rows = stmt
            .query_map([], row_to_account)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(decode_row).collect()
    }

    fn update(&self, id: i64, fields: AccountFields) -> StoreResult<Account> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE accounts
             SET balance = ?1, creation_date = ?2, account_type = ?3
             WHERE id = ?4",
            params![
                fields.balance,
                fields.creation_date.format(DATE_FORMAT).to_string(),
                fields.account_type.as_str(),
                id,
            ],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }

        Ok(Account::with_id(id, fields))
    }

    fn delete(&self, id: i64) -> StoreResult<()> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM accounts WHERE id = ?1", params![id])?;

        if removed == 0 {
            return Err(StoreError::NotFound(id));
        }

        Ok(())
    }

    fn count(&self) -> StoreResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))?;

        Ok(count as usize)
    }
}

// ============================================================================
// IN-MEMORY BACKEND
// ============================================================================

#[derive(Default)]
struct MemoryState {
    last_id: i64,
    accounts: BTreeMap<i64, Account>,
}

/// Map-backed store for tests and throwaway runs
#[derive(Default)]
pub struct MemoryAccountStore {
    state: RwLock<MemoryState>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AccountStore for MemoryAccountStore {
    fn create(&self, fields: AccountFields) -> StoreResult<Account> {
        let mut state = self.state.write().map_err(|_| StoreError::Poisoned)?;
        state.last_id += 1;
        let id = state.last_id;
        let account = Account::with_id(id, fields);
        state.accounts.insert(id, account.clone());

        Ok(account)
    }

    fn get(&self, id: i64) -> StoreResult<Account> {
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        state.accounts.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    fn list(&self) -> StoreResult<Vec<Account>> {
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        Ok(state.accounts.values().cloned().collect())
    }

    fn update(&self, id: i64, fields: AccountFields) -> StoreResult<Account> {
        let mut state = self.state.write().map_err(|_| StoreError::Poisoned)?;
        let account = state.accounts.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        account.apply(fields);

        Ok(account.clone())
    }

    fn delete(&self, id: i64) -> StoreResult<()> {
        let mut state = self.state.write().map_err(|_| StoreError::Poisoned)?;
        state
            .accounts
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    fn count(&self) -> StoreResult<usize> {
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        Ok(state.accounts.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn fields(balance: f64, account_type: AccountType) -> AccountFields {
        AccountFields {
            balance,
            creation_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            account_type,
        }
    }

    fn backends() -> Vec<(&'static str, Box<dyn AccountStore>)> {
        vec![
            (
                "sqlite",
                Box::new(SqliteAccountStore::open_in_memory().unwrap()) as Box<dyn AccountStore>,
            ),
            ("memory", Box::new(MemoryAccountStore::new()) as Box<dyn AccountStore>),
        ]
    }

    #[test]
    fn test_create_assigns_ids() {
        for (name, store) in backends() {
            let a = store.create(fields(500.0, AccountType::Savings)).unwrap();
            let b = store.create(fields(20.0, AccountType::Checking)).unwrap();

            assert_eq!(a.id, Some(1), "{name}");
            assert_eq!(b.id, Some(2), "{name}");
            assert_eq!(store.count().unwrap(), 2, "{name}");
        }
    }

    #[test]
    fn test_get_returns_created_record() {
        for (name, store) in backends() {
            let created = store.create(fields(500.0, AccountType::Savings)).unwrap();
            let fetched = store.get(created.id.unwrap()).unwrap();

            assert_eq!(fetched, created, "{name}");
        }
    }

    #[test]
    fn test_get_missing_is_not_found() {
        for (name, store) in backends() {
            let err = store.get(99).unwrap_err();
            assert!(err.is_not_found(), "{name}: {err}");
        }
    }

    #[test]
    fn test_list_returns_everything() {
        for (name, store) in backends() {
            assert!(store.list().unwrap().is_empty(), "{name}");

            store.create(fields(1.0, AccountType::Savings)).unwrap();
            store.create(fields(2.0, AccountType::Checking)).unwrap();
            store.create(fields(3.0, AccountType::Savings)).unwrap();

            let mut balances: Vec<f64> = store.list().unwrap().iter().map(|a| a.balance).collect();
            balances.sort_by(|a, b| a.partial_cmp(b).unwrap());
            assert_eq!(balances, vec![1.0, 2.0, 3.0], "{name}");
        }
    }

    #[test]
    fn test_update_overwrites_values_keeps_id() {
        for (name, store) in backends() {
            let created = store.create(fields(500.0, AccountType::Savings)).unwrap();
            let id = created.id.unwrap();

            let new_values = AccountFields {
                balance: -40.0,
                creation_date: NaiveDate::from_ymd_opt(2023, 6, 15).unwrap(),
                account_type: AccountType::Checking,
            };
            let updated = store.update(id, new_values.clone()).unwrap();

            assert_eq!(updated.id, Some(id), "{name}");
            assert_eq!(updated.fields(), new_values, "{name}");
            assert_eq!(store.get(id).unwrap(), updated, "{name}");
        }
    }

    #[test]
    fn test_update_missing_creates_nothing() {
        for (name, store) in backends() {
            store.create(fields(1.0, AccountType::Savings)).unwrap();

            let err = store.update(50, fields(600.0, AccountType::Savings)).unwrap_err();
            assert!(err.is_not_found(), "{name}");
            assert_eq!(store.count().unwrap(), 1, "{name}");
            assert!(store.get(50).is_err(), "{name}");
        }
    }

    #[test]
    fn test_delete_then_get_is_not_found() {
        for (name, store) in backends() {
            let id = store.create(fields(1.0, AccountType::Savings)).unwrap().id.unwrap();

            store.delete(id).unwrap();
            assert!(store.get(id).unwrap_err().is_not_found(), "{name}");
            assert!(store.delete(id).unwrap_err().is_not_found(), "{name}");
            assert_eq!(store.count().unwrap(), 0, "{name}");
        }
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        for (name, store) in backends() {
            let first = store.create(fields(1.0, AccountType::Savings)).unwrap().id.unwrap();
            store.delete(first).unwrap();

            let second = store.create(fields(2.0, AccountType::Savings)).unwrap().id.unwrap();
            assert!(second > first, "{name}");
        }
    }

    #[test]
    fn test_concurrent_creates_get_unique_ids() {
        let stores: Vec<Arc<dyn AccountStore>> = vec![
            Arc::new(SqliteAccountStore::open_in_memory().unwrap()) as Arc<dyn AccountStore>,
            Arc::new(MemoryAccountStore::new()) as Arc<dyn AccountStore>,
        ];

        for store in stores {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let store = Arc::clone(&store);
                    std::thread::spawn(move || {
                        (0..25)
                            .map(|_| {
                                let account = store.create(fields(i as f64, AccountType::Checking));
                                account.unwrap().id.unwrap()
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            let ids: HashSet<i64> = handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect();

            assert_eq!(ids.len(), 200);
            assert_eq!(store.count().unwrap(), 200);
        }
    }

    #[test]
    fn test_sqlite_rejects_corrupt_rows() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn.execute(
            "INSERT INTO accounts (balance, creation_date, account_type) VALUES (1.0, 'yesterday', 'SAVINGS')",
            [],
        )
        .unwrap();

        let store = SqliteAccountStore::with_connection(conn).unwrap();
        let err = store.get(1).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)), "{err}");
    }

    #[test]
    fn test_sqlite_schema_checks_account_type() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO accounts (balance, creation_date, account_type) VALUES (1.0, '2024-01-01', 'CREDIT')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_sqlite_file_persists_across_reopen() {
        let path = std::env::temp_dir().join(format!(
            "account_store_{}_{}.db",
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));

        {
            let store = SqliteAccountStore::open(&path).unwrap();
            store.create(fields(123.0, AccountType::Checking)).unwrap();
        }

        let reopened = SqliteAccountStore::open(&path).unwrap();
        let accounts = reopened.list().unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].balance, 123.0);

        drop(reopened);
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }
}
