// Session configuration.
// `Config` is built once at startup and passed by reference to everything
// that needs storage access. It makes sure the two config files exist
// (prompting on first run), reads names out of the settings file on demand
// and hands out memoized handles to the services, the bucket and the tables.

use crate::backend::{Backend, BucketOf, Handle, ObjectStorage, TableOf, TableSpec, TableStore};
use crate::error::{Error, Result};
use crate::ini::Ini;
use crate::prompt::{self, Terminal};
use once_cell::unsync::OnceCell;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info};

pub const CREDENTIALS_SECTION: &str = "Credentials";
pub const SETTINGS_SECTION: &str = "catsnap";

/// Region used when the settings file does not name one.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Locations of the credentials file and the settings file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    pub credentials: PathBuf,
    pub settings: PathBuf,
}

impl Default for ConfigPaths {
    /// `~/.boto` and `~/.catsnap`.
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        ConfigPaths {
            credentials: home.join(".boto"),
            settings: home.join(".catsnap"),
        }
    }
}

/// Access key pair read from the credentials file.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .finish()
    }
}

/// Contents of the `[catsnap]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bucket: String,
    pub table_prefix: String,
    pub region: String,
}

pub struct Config<B: Backend> {
    paths: ConfigPaths,
    backend: B,
    s3: OnceCell<Rc<B::Storage>>,
    dynamodb: OnceCell<Rc<B::Tables>>,
    bucket: OnceCell<Rc<BucketOf<B>>>,
    tables: RefCell<HashMap<String, Rc<TableOf<B>>>>,
}

impl<B: Backend> Config<B> {
    /// Build the session, running the first-run setup for any missing file.
    pub fn open(paths: ConfigPaths, backend: B, term: &dyn Terminal) -> Result<Self> {
        let config = Config {
            paths,
            backend,
            s3: OnceCell::new(),
            dynamodb: OnceCell::new(),
            bucket: OnceCell::new(),
            tables: RefCell::new(HashMap::new()),
        };
        config.ensure_config_files_exist(term)?;
        Ok(config)
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    /// Create whichever config files are missing. Existing files are left
    /// alone and their builders are never run.
    pub fn ensure_config_files_exist(&self, term: &dyn Terminal) -> Result<()> {
        let need_credentials = !file_exists(&self.paths.credentials)?;
        let need_settings = !file_exists(&self.paths.settings)?;
        if !need_credentials && !need_settings {
            return Ok(());
        }

        term.say(prompt::FIRST_RUN_BANNER)?;
        if need_credentials {
            let text = self.get_aws_credentials(term)?;
            write_new(&self.paths.credentials, &text)?;
            info!(path = %self.paths.credentials.display(), "wrote credentials file");
        }
        if need_settings {
            let text = self.get_catsnap_config(term)?;
            write_new(&self.paths.settings, &text)?;
            info!(path = %self.paths.settings.display(), "wrote settings file");
        }
        Ok(())
    }

    /// Prompt for credentials and return the credentials file text.
    pub fn get_aws_credentials(&self, term: &dyn Terminal) -> Result<String> {
        prompt::credentials_text(term)
    }

    /// Prompt for bucket and prefix and return the settings file text.
    pub fn get_catsnap_config(&self, term: &dyn Terminal) -> Result<String> {
        prompt::settings_text(term, &prompt::current_user()?)
    }

    /// Read the settings file. Not cached, so edits are picked up.
    pub fn settings(&self) -> Result<Settings> {
        let path = &self.paths.settings;
        let ini = read_ini(path)?;
        let field = |key: &'static str| {
            ini.get(SETTINGS_SECTION, key)
                .map(str::to_string)
                .ok_or_else(|| Error::MissingKey {
                    path: path.clone(),
                    section: SETTINGS_SECTION,
                    key,
                })
        };
        Ok(Settings {
            bucket: field("bucket")?,
            table_prefix: field("table_prefix")?,
            region: ini
                .get(SETTINGS_SECTION, "region")
                .unwrap_or(DEFAULT_REGION)
                .to_string(),
        })
    }

    pub fn bucket_name(&self) -> Result<String> {
        Ok(self.settings()?.bucket)
    }

    pub fn table_prefix(&self) -> Result<String> {
        Ok(self.settings()?.table_prefix)
    }

    /// Full table name for a suffix: `{prefix}-{suffix}`.
    pub fn table_name(&self, suffix: &str) -> Result<String> {
        Ok(format!("{}-{}", self.table_prefix()?, suffix))
    }

    /// Read the access key pair from the credentials file.
    pub fn credentials(&self) -> Result<Credentials> {
        let path = &self.paths.credentials;
        let ini = read_ini(path)?;
        let field = |key: &'static str| {
            ini.get(CREDENTIALS_SECTION, key)
                .map(str::to_string)
                .ok_or_else(|| Error::MissingKey {
                    path: path.clone(),
                    section: CREDENTIALS_SECTION,
                    key,
                })
        };
        Ok(Credentials {
            access_key_id: field("aws_access_key_id")?,
            secret_access_key: field("aws_secret_access_key")?,
        })
    }

    /// Object storage connection, opened on first use.
    pub fn get_s3(&self) -> Result<Rc<B::Storage>> {
        self.s3
            .get_or_try_init(|| {
                let region = self.settings()?.region;
                debug!(%region, "connecting to object storage");
                let storage = self.backend.connect_storage(&self.credentials()?, &region)?;
                Ok::<_, Error>(Rc::new(storage))
            })
            .cloned()
    }

    /// Key-value store connection, opened on first use.
    pub fn get_dynamodb(&self) -> Result<Rc<B::Tables>> {
        self.dynamodb
            .get_or_try_init(|| {
                let region = self.settings()?.region;
                debug!(%region, "connecting to key-value store");
                let tables = self.backend.connect_tables(&self.credentials()?, &region)?;
                Ok::<_, Error>(Rc::new(tables))
            })
            .cloned()
    }

    /// The image bucket. Reuses a bucket of the configured name if the
    /// service lists one, creates it otherwise.
    pub fn bucket(&self) -> Result<Rc<BucketOf<B>>> {
        self.bucket
            .get_or_try_init(|| {
                let name = self.bucket_name()?;
                let s3 = self.get_s3()?;
                let bucket = if s3.list_buckets()?.iter().any(|b| *b == name) {
                    debug!(bucket = %name, "using existing bucket");
                    s3.get_bucket(&name)?
                } else {
                    let bucket = s3.create_bucket(&name)?;
                    info!(bucket = %bucket.name(), "created bucket");
                    bucket
                };
                Ok::<_, Error>(Rc::new(bucket))
            })
            .cloned()
    }

    /// Table `{prefix}-{suffix}`, created if the service doesn't list it.
    pub fn table(&self, suffix: &str) -> Result<Rc<TableOf<B>>> {
        let name = self.table_name(suffix)?;
        if let Some(table) = self.cached_table(&name) {
            return Ok(table);
        }

        let dynamo = self.get_dynamodb()?;
        if dynamo.list_tables()?.iter().any(|t| *t == name) {
            debug!(table = %name, "using existing table");
            let table = dynamo.get_table(&name)?;
            Ok(self.remember_table(name, table))
        } else {
            self.create_table(suffix)
        }
    }

    /// Create table `{prefix}-{suffix}`. If the service says it already
    /// exists, look it up instead. Any other failure is returned.
    pub fn create_table(&self, suffix: &str) -> Result<Rc<TableOf<B>>> {
        let name = self.table_name(suffix)?;
        let dynamo = self.get_dynamodb()?;
        match dynamo.create_table(&name, &TableSpec::CATALOG) {
            Ok(table) => {
                info!(table = %table.name(), "created table");
                Ok(self.remember_table(name, table))
            }
            Err(Error::TableExists(_)) => {
                debug!(table = %name, "table already exists, looking it up");
                match self.cached_table(&name) {
                    Some(table) => Ok(table),
                    None => {
                        let table = dynamo.get_table(&name)?;
                        Ok(self.remember_table(name, table))
                    }
                }
            }
            Err(e) => Err(e),
        }
    }

    fn cached_table(&self, name: &str) -> Option<Rc<TableOf<B>>> {
        self.tables.borrow().get(name).cloned()
    }

    fn remember_table(&self, name: String, table: TableOf<B>) -> Rc<TableOf<B>> {
        let table = Rc::new(table);
        self.tables.borrow_mut().insert(name, Rc::clone(&table));
        table
    }
}

/// Like `Path::exists`, but an unreadable location is an error rather than
/// "missing", so nobody gets prompted for a file we couldn't write anyway.
fn file_exists(path: &Path) -> Result<bool> {
    path.try_exists().map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn read_ini(path: &Path) -> Result<Ini> {
    let text = fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ini::parse(&text).map_err(|e| Error::Parse {
        path: path.to_path_buf(),
        line: e.line,
        message: e.message,
    })
}

/// Write a config file that must not exist yet. Owner-only on Unix since
/// the credentials file holds a secret.
fn write_new(path: &Path, text: &str) -> Result<()> {
    let write_err = |source: std::io::Error| Error::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(write_err)?;
    }

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path).map_err(write_err)?;
    file.write_all(text.as_bytes()).map_err(write_err)
}
