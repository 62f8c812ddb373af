//! Encrypted persistent storage for the session's token record.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::TokenSealer;
use crate::error::AuthError;

const SESSION_FILE: &str = "session.toml";
const SESSION_FILE_VERSION: u32 = 1;
const SEALING_SECRET: &str = "scarlet_login_key_2024";

/// The persisted token record.
///
/// Either fully absent or fully populated: `access_token`, `expires_at`
/// and `open_id` are always present together. `refresh_token` may be
/// absent if the server never issued one, in which case refresh is not
/// possible. `user_id` is cached after a profile fetch for UI convenience.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub open_id: String,
    pub user_id: Option<String>,
}

/// Storage abstraction for the single persisted session record.
///
/// Implementations must make save/load/clear appear atomic to concurrent
/// callers; a read never observes a partially written record.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<TokenRecord>, AuthError>;
    fn save(&self, record: &TokenRecord) -> Result<(), AuthError>;
    fn clear(&self) -> Result<(), AuthError>;

    /// Cache the user id from a completed profile fetch. No-op when no
    /// record is present.
    fn cache_user_id(&self, user_id: &str) -> Result<(), AuthError> {
        if let Some(mut record) = self.load()? {
            record.user_id = Some(user_id.to_string());
            self.save(&record)?;
        }
        Ok(())
    }

    /// True if no expiry is recorded, or the current time has reached it.
    fn is_expired(&self) -> Result<bool, AuthError> {
        Ok(match self.load()? {
            None => true,
            Some(record) => Utc::now() >= record.expires_at,
        })
    }

    /// Local liveness check only; does not re-validate the token against
    /// the issuing authority.
    fn is_logged_in(&self) -> Result<bool, AuthError> {
        Ok(match self.load()? {
            None => false,
            Some(record) => !record.access_token.is_empty() && Utc::now() < record.expires_at,
        })
    }

    fn cached_access_token(&self) -> Result<Option<String>, AuthError> {
        Ok(self.load()?.map(|r| r.access_token))
    }

    fn cached_open_id(&self) -> Result<Option<String>, AuthError> {
        Ok(self.load()?.map(|r| r.open_id))
    }

    fn cached_user_id(&self) -> Result<Option<String>, AuthError> {
        Ok(self.load()?.and_then(|r| r.user_id))
    }
}

/// Configuration for file-backed session storage.
#[derive(Debug, Clone)]
pub struct TokenStoreConfig {
    pub base_dir: PathBuf,
}

impl TokenStoreConfig {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }
}

/// File-backed token store: one TOML record with sealed token fields.
///
/// Access and refresh tokens are sealed independently before writing;
/// expiry and identity fields are stored in clear. A record whose sealed
/// fields fail to open (corruption, tampering) is treated as absent.
#[derive(Debug)]
pub struct FileTokenStore {
    base_dir: PathBuf,
    sealer: TokenSealer,
    io_lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(config: TokenStoreConfig) -> Self {
        Self {
            base_dir: config.base_dir,
            sealer: TokenSealer::new(SEALING_SECRET),
            io_lock: Mutex::new(()),
        }
    }

    fn session_path(&self) -> PathBuf {
        self.base_dir.join(SESSION_FILE)
    }

    fn ensure_parent(path: &Path) -> Result<(), AuthError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    fn decode(&self, file: SessionFile) -> Option<TokenRecord> {
        let access_token = self.sealer.open(&file.access_token).ok()?;
        if access_token.is_empty() {
            return None;
        }
        let refresh_token = match file.refresh_token {
            Some(sealed) => Some(self.sealer.open(&sealed).ok()?),
            None => None,
        };
        let expires_at = DateTime::<Utc>::from_timestamp(file.expires_at, 0)?;
        Some(TokenRecord {
            access_token,
            refresh_token,
            expires_at,
            open_id: file.open_id,
            user_id: file.user_id,
        })
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<TokenRecord>, AuthError> {
        let _guard = self.io_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let raw = match fs::read_to_string(self.session_path()) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(AuthError::Io(err.to_string())),
        };
        let file: SessionFile = match toml::from_str(&raw) {
            Ok(file) => file,
            Err(_) => return Ok(None),
        };
        Ok(self.decode(file))
    }

    fn save(&self, record: &TokenRecord) -> Result<(), AuthError> {
        if record.access_token.is_empty() || record.open_id.is_empty() {
            return Err(AuthError::InvalidParams(
                "token record must carry an access token and open id".to_string(),
            ));
        }
        let access_token = self.sealer.seal(&record.access_token)?;
        let refresh_token = record
            .refresh_token
            .as_deref()
            .map(|t| self.sealer.seal(t))
            .transpose()?;

        let _guard = self.io_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let path = self.session_path();
        Self::ensure_parent(&path)?;
        let file = SessionFile {
            version: SESSION_FILE_VERSION,
            access_token,
            refresh_token,
            expires_at: record.expires_at.timestamp(),
            open_id: record.open_id.clone(),
            user_id: record.user_id.clone(),
            saved_at: Utc::now(),
        };
        let serialized = toml::to_string(&file)?;
        fs::write(&path, serialized)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        let _guard = self.io_lock.lock().unwrap_or_else(PoisonError::into_inner);
        match fs::remove_file(self.session_path()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AuthError::Io(err.to_string())),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    version: u32,
    access_token: String,
    refresh_token: Option<String>,
    expires_at: i64,
    open_id: String,
    user_id: Option<String>,
    saved_at: DateTime<Utc>,
}
