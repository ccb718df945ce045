//! File-backed account pool.
//!
//! [`LocalPool`] implements every remote collaborator on top of a single
//! JSON document, so the control plane can be exercised without a cloud
//! provider. Every operation holds an OS lock on a sibling `<file>.lock`
//! for its whole read or read-modify-write, so any number of handles and
//! processes can share one pool file without losing writes. The document
//! itself is replaced through a uniquely named temp file.
//!
//! File format:
//! ```json
//! {
//!     "version": 1,
//!     "next_id": 100000000002,
//!     "accounts": [
//!         { "id": "100000000001", "name": "sandbox", "email": "...",
//!           "resources": { "apool-ctl": { "policy": { ... }, "value": "MSN7fQ==" } } }
//!     ],
//!     "requests": [ { "handle": "car-1", "request": { ... }, "state": { "state": "in_progress" }, ... } ]
//! }
//! ```

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::account::AccountId;
use crate::ctl::TrustPolicy;
use crate::error::{PoolError, Result};
use crate::remote::{
    AccountInfo, ControlClient, CreateAccountRequest, CreateHandle, CreateState, CreateStatus,
    CredentialProvider, Directory, Provisioner,
};

// ── File format constants ─────────────────────────────────────────────────────

const POOL_FILE_VERSION: u32 = 1;

/// First id handed out; keeps every id at twelve digits.
const FIRST_ACCOUNT_ID: u64 = 100_000_000_001;

/// Failure reason reported when a request reuses an existing email.
pub const EMAIL_ALREADY_EXISTS: &str = "EMAIL_ALREADY_EXISTS";

// ── On-disk structures ────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct PoolFile {
    version: u32,
    next_id: u64,
    #[serde(default)]
    accounts: Vec<StoredAccount>,
    #[serde(default)]
    requests: Vec<StoredRequest>,
}

impl PoolFile {
    fn empty() -> Self {
        Self {
            version: POOL_FILE_VERSION,
            next_id: FIRST_ACCOUNT_ID,
            accounts: Vec::new(),
            requests: Vec::new(),
        }
    }

    fn account(&self, id: &AccountId) -> Result<&StoredAccount> {
        self.accounts
            .iter()
            .find(|a| &a.id == id)
            .ok_or_else(|| PoolError::Remote(format!("unknown account {id}")))
    }

    fn account_mut(&mut self, id: &AccountId) -> Result<&mut StoredAccount> {
        self.accounts
            .iter_mut()
            .find(|a| &a.id == id)
            .ok_or_else(|| PoolError::Remote(format!("unknown account {id}")))
    }

    fn insert_account(&mut self, name: &str, email: &str) -> AccountInfo {
        let id = AccountId(self.next_id.to_string());
        self.next_id += 1;
        let stored = StoredAccount {
            id,
            name: name.to_string(),
            email: email.to_string(),
            resources: BTreeMap::new(),
        };
        let info = stored.info();
        self.accounts.push(stored);
        info
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredAccount {
    id: AccountId,
    name: String,
    email: String,
    #[serde(default)]
    resources: BTreeMap<String, StoredResource>,
}

impl StoredAccount {
    fn info(&self) -> AccountInfo {
        AccountInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredResource {
    policy: TrustPolicy,
    value: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredRequest {
    handle: CreateHandle,
    request: CreateAccountRequest,
    state: CreateState,
    requested_at: u64,
    completed_at: Option<u64>,
}

impl StoredRequest {
    fn status(&self) -> CreateStatus {
        CreateStatus {
            handle: self.handle.clone(),
            state: self.state.clone(),
            requested_at: self.requested_at,
            completed_at: self.completed_at,
        }
    }
}

// ── LocalPool ─────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct Inner {
    path: PathBuf,
    lock_path: PathBuf,
}

/// Held OS lock on the pool's lock file; released on drop.
struct FileLock(File);

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.0);
    }
}

impl Inner {
    fn new(path: PathBuf) -> Self {
        let mut name = path.file_name().map(OsString::from).unwrap_or_default();
        name.push(".lock");
        let lock_path = path.with_file_name(name);
        Self { path, lock_path }
    }

    fn lock(&self, exclusive: bool) -> Result<FileLock> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)?;
        if exclusive {
            file.lock_exclusive()?;
        } else {
            file.lock_shared()?;
        }
        Ok(FileLock(file))
    }

    fn read<R>(&self, f: impl FnOnce(&PoolFile) -> Result<R>) -> Result<R> {
        let _lock = self.lock(false)?;
        f(&self.load()?)
    }

    /// Read-modify-write under the exclusive lock. The file is rewritten
    /// only if `f` succeeds.
    fn update<R>(&self, f: impl FnOnce(&mut PoolFile) -> Result<R>) -> Result<R> {
        let _lock = self.lock(true)?;
        let mut file = self.load()?;
        let out = f(&mut file)?;
        self.save(&file)?;
        Ok(out)
    }

    /// Validate an existing pool file or write an empty one.
    fn create_or_validate(&self) -> Result<()> {
        let _lock = self.lock(true)?;
        if self.path.exists() {
            self.load().map(|_| ())
        } else {
            self.save(&PoolFile::empty())
        }
    }

    fn load(&self) -> Result<PoolFile> {
        let bytes = std::fs::read(&self.path)?;
        let file: PoolFile = serde_json::from_slice(&bytes).map_err(|e| {
            PoolError::InvalidFileFormat(format!(
                "failed to parse pool file {}: {e}",
                self.path.display()
            ))
        })?;
        if file.version != POOL_FILE_VERSION {
            return Err(PoolError::InvalidFileFormat(format!(
                "unsupported pool file version {}",
                file.version
            )));
        }
        Ok(file)
    }

    /// Write to a fresh temp file in the same directory, sync it, then
    /// rename it over the pool file. Readers never see a partial document.
    fn save(&self, file: &PoolFile) -> Result<()> {
        let json = serde_json::to_vec_pretty(file)
            .map_err(|e| PoolError::SerializationError(e.to_string()))?;
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| PoolError::Io(e.error))?;
        Ok(())
    }
}

/// JSON-file implementation of the directory, credential, control-field,
/// and provisioning collaborators.
#[derive(Debug, Clone)]
pub struct LocalPool {
    inner: Arc<Inner>,
}

impl LocalPool {
    /// Open the pool at `path`, creating an empty pool file (and parent
    /// directories) if none exists.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::InvalidFileFormat` for an unreadable or
    /// wrong-version file, or `PoolError::Io` for filesystem errors.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let inner = Inner::new(path.into());
        if let Some(parent) = inner.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        inner.create_or_validate()?;
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Register an existing account directly, bypassing provisioning.
    pub fn add_account(&self, name: &str, email: &str) -> Result<AccountInfo> {
        self.inner.update(|file| Ok(file.insert_account(name, email)))
    }
}

impl Directory for LocalPool {
    fn list_accounts(&self) -> Result<Vec<AccountInfo>> {
        self.inner
            .read(|file| Ok(file.accounts.iter().map(StoredAccount::info).collect()))
    }
}

impl CredentialProvider for LocalPool {
    fn control_client(&self, account: &AccountId) -> Result<Arc<dyn ControlClient>> {
        self.inner.read(|file| file.account(account).map(|_| ()))?;
        Ok(Arc::new(LocalClient {
            inner: Arc::clone(&self.inner),
            account: account.clone(),
        }))
    }
}

impl Provisioner for LocalPool {
    fn create_account(&self, request: &CreateAccountRequest) -> Result<CreateStatus> {
        self.inner.update(|file| {
            let stored = StoredRequest {
                handle: CreateHandle(format!("car-{}", file.requests.len() + 1)),
                request: request.clone(),
                state: CreateState::InProgress,
                requested_at: crate::time::now_micros(),
                completed_at: None,
            };
            let status = stored.status();
            file.requests.push(stored);
            Ok(status)
        })
    }

    /// Requests complete on their first poll.
    fn poll_status(&self, handle: &CreateHandle) -> Result<CreateStatus> {
        self.inner.update(|file| {
            let idx = file
                .requests
                .iter()
                .position(|r| &r.handle == handle)
                .ok_or_else(|| PoolError::Remote(format!("unknown create request {handle}")))?;

            if !file.requests[idx].state.is_terminal() {
                let request = file.requests[idx].request.clone();
                let taken = file
                    .accounts
                    .iter()
                    .any(|a| a.email.eq_ignore_ascii_case(&request.email));
                let state = if taken {
                    CreateState::Failed {
                        reason: EMAIL_ALREADY_EXISTS.to_string(),
                    }
                } else {
                    let info = file.insert_account(&request.name, &request.email);
                    CreateState::Succeeded {
                        account_id: info.id,
                    }
                };
                let stored = &mut file.requests[idx];
                stored.state = state;
                stored.completed_at = Some(crate::time::now_micros());
            }
            Ok(file.requests[idx].status())
        })
    }

    fn describe_account(&self, id: &AccountId) -> Result<AccountInfo> {
        self.inner.read(|file| {
            file.account(id)
                .map(StoredAccount::info)
                .map_err(|_| PoolError::NotFound(id.to_string()))
        })
    }
}

/// Control client scoped to one account of a [`LocalPool`].
struct LocalClient {
    inner: Arc<Inner>,
    account: AccountId,
}

impl ControlClient for LocalClient {
    fn get_field(&self, resource: &str) -> Result<Option<String>> {
        self.inner.read(|file| {
            Ok(file
                .account(&self.account)?
                .resources
                .get(resource)
                .map(|r| r.value.clone()))
        })
    }

    /// Overwrite the field, then return what the pool file holds after the
    /// write. A concurrent writer that lands in between shows up here.
    fn set_field(&self, resource: &str, value: &str) -> Result<String> {
        self.inner.update(|file| {
            let stored = file
                .account_mut(&self.account)?
                .resources
                .get_mut(resource)
                .ok_or_else(|| PoolError::Remote(format!("no such resource: {resource}")))?;
            stored.value = value.to_string();
            Ok(())
        })?;
        self.get_field(resource)?
            .ok_or_else(|| PoolError::Remote(format!("no such resource: {resource}")))
    }

    fn create_field(&self, resource: &str, policy: &TrustPolicy, value: &str) -> Result<()> {
        self.inner.update(|file| {
            let account = file.account_mut(&self.account)?;
            if account.resources.contains_key(resource) {
                return Err(PoolError::CtlExists);
            }
            account.resources.insert(
                resource.to_string(),
                StoredResource {
                    policy: policy.clone(),
                    value: value.to_string(),
                },
            );
            Ok(())
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
