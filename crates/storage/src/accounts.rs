#![forbid(unsafe_code)]

use crate::StoreError;
use crate::password::{decoy_hash, hash_password, verify_password};
use it_core::{Role, Username};
use rusqlite::{Connection, ErrorCode, OptionalExtension, params};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DB_FILE: &str = "interntrack_accounts.db";
const TOKEN_BYTES: usize = 32;

#[derive(Debug)]
pub struct AccountStore {
    conn: Connection,
    storage_dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct NewAccount {
    pub username: Username,
    pub password: String,
    pub role: Role,
    pub folder_ref: Option<String>,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    pub username: Username,
    pub role: Role,
    /// Storage folder reserved for this account's documents.
    pub folder_ref: Option<String>,
    pub created_at_ms: i64,
}

/// Freshly issued session. `token` is only available here; the store keeps
/// its SHA-256.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub username: Username,
    pub expires_at_ms: i64,
}

impl AccountStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let conn = Connection::open(storage_dir.join(DB_FILE))?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        install_schema(&conn)?;

        Ok(Self { conn, storage_dir })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn create(&mut self, account: NewAccount) -> Result<Account, StoreError> {
        if account.password.is_empty() {
            return Err(StoreError::InvalidInput("password must not be empty"));
        }
        let password_hash = hash_password(&account.password)?;
        self.conn
            .execute(
                "INSERT INTO accounts(username, password_hash, role, folder_ref, created_at_ms) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    account.username.as_str(),
                    password_hash,
                    account.role.as_str(),
                    account.folder_ref,
                    account.created_at_ms
                ],
            )
            .map_err(map_insert_conflict)?;

        Ok(Account {
            username: account.username,
            role: account.role,
            folder_ref: account.folder_ref,
            created_at_ms: account.created_at_ms,
        })
    }

    pub fn find_by_username(&self, username: &Username) -> Result<Option<Account>, StoreError> {
        Ok(self
            .load_row(username)?
            .map(|(account, _password_hash)| account))
    }

    /// Checks a login. Unknown usernames and wrong passwords are
    /// indistinguishable to the caller.
    pub fn verify_credentials(
        &self,
        username: &Username,
        password: &str,
    ) -> Result<Option<Account>, StoreError> {
        match self.load_row(username)? {
            Some((account, password_hash)) => {
                Ok(verify_password(password, &password_hash).then_some(account))
            }
            None => {
                let _ = verify_password(password, decoy_hash());
                Ok(None)
            }
        }
    }

    pub fn set_folder_ref(
        &mut self,
        username: &Username,
        folder_ref: &str,
    ) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE accounts SET folder_ref = ?2 WHERE username = ?1",
            params![username.as_str(), folder_ref],
        )?;
        if changed == 0 {
            return Err(StoreError::UnknownAccount);
        }
        Ok(())
    }

    /// Removes an account and its sessions. Returns whether it existed.
    pub fn delete(&mut self, username: &Username) -> Result<bool, StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM sessions WHERE username = ?1",
            params![username.as_str()],
        )?;
        let removed = tx.execute(
            "DELETE FROM accounts WHERE username = ?1",
            params![username.as_str()],
        )?;
        tx.commit()?;
        Ok(removed > 0)
    }

    pub fn create_session(
        &mut self,
        username: &Username,
        now_ms: i64,
        ttl_ms: i64,
    ) -> Result<Session, StoreError> {
        let raw: [u8; TOKEN_BYTES] = rand::random();
        let token = hex::encode(raw);
        let expires_at_ms = now_ms.saturating_add(ttl_ms);
        self.conn.execute(
            "INSERT INTO sessions(token_hash, username, created_at_ms, expires_at_ms) \
             VALUES (?1, ?2, ?3, ?4)",
            params![token_hash(&token), username.as_str(), now_ms, expires_at_ms],
        )?;
        Ok(Session {
            token,
            username: username.clone(),
            expires_at_ms,
        })
    }

    /// Resolves a bearer token to its account. Expired sessions are deleted
    /// on sight.
    pub fn resolve_session(
        &mut self,
        token: &str,
        now_ms: i64,
    ) -> Result<Option<Account>, StoreError> {
        let hash = token_hash(token);
        let row = self
            .conn
            .query_row(
                "SELECT username, expires_at_ms FROM sessions WHERE token_hash = ?1",
                params![hash],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;
        let Some((username, expires_at_ms)) = row else {
            return Ok(None);
        };
        if expires_at_ms <= now_ms {
            self.conn
                .execute("DELETE FROM sessions WHERE token_hash = ?1", params![hash])?;
            return Ok(None);
        }
        let username = Username::try_new(username)
            .map_err(|err| StoreError::Corrupt(format!("session username: {err}")))?;
        self.find_by_username(&username)
    }

    /// Returns whether a session was removed.
    pub fn revoke_session(&mut self, token: &str) -> Result<bool, StoreError> {
        let removed = self.conn.execute(
            "DELETE FROM sessions WHERE token_hash = ?1",
            params![token_hash(token)],
        )?;
        Ok(removed > 0)
    }

    pub fn purge_expired_sessions(&mut self, now_ms: i64) -> Result<usize, StoreError> {
        Ok(self.conn.execute(
            "DELETE FROM sessions WHERE expires_at_ms <= ?1",
            params![now_ms],
        )?)
    }

    fn load_row(&self, username: &Username) -> Result<Option<(Account, String)>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT role, folder_ref, created_at_ms, password_hash \
                 FROM accounts WHERE username = ?1",
                params![username.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;
        let Some((role, folder_ref, created_at_ms, password_hash)) = row else {
            return Ok(None);
        };
        let role = Role::parse(&role)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown role {role:?}")))?;
        Ok(Some((
            Account {
                username: username.clone(),
                role,
                folder_ref,
                created_at_ms,
            },
            password_hash,
        )))
    }
}

fn install_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS accounts (
          username TEXT PRIMARY KEY,
          password_hash TEXT NOT NULL,
          role TEXT NOT NULL,
          folder_ref TEXT,
          created_at_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sessions (
          token_hash TEXT PRIMARY KEY,
          username TEXT NOT NULL REFERENCES accounts(username),
          created_at_ms INTEGER NOT NULL,
          expires_at_ms INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_username ON sessions(username);
        "#,
    )?;
    Ok(())
}

fn token_hash(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn map_insert_conflict(err: rusqlite::Error) -> StoreError {
    if is_constraint_violation(&err) {
        return StoreError::AccountExists;
    }
    StoreError::Sql(err)
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, message) => {
            code.code == ErrorCode::ConstraintViolation
                || message
                    .as_deref()
                    .is_some_and(|value| value.contains("UNIQUE constraint failed"))
        }
        _ => false,
    }
}
