use log::{debug, info};
use serde::{de, Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;
use std::str::FromStr;

use crate::error::{AutomattikError, Result};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 9999;
pub const DEFAULT_DB_TYPE: DatabaseType = DatabaseType::Sqlite3;
pub const DEFAULT_DB_PARAMS: &str = "./automattik.db?cache_size=50";

/// Database software the server may be configured to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    Sqlite3,
    Postgres,
    Mysql,
    Mssql,
}

impl DatabaseType {
    /// Every accepted database type
    pub const ALL: [DatabaseType; 4] = [
        DatabaseType::Sqlite3,
        DatabaseType::Postgres,
        DatabaseType::Mysql,
        DatabaseType::Mssql,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseType::Sqlite3 => "sqlite3",
            DatabaseType::Postgres => "postgres",
            DatabaseType::Mysql => "mysql",
            DatabaseType::Mssql => "mssql",
        }
    }
}

impl FromStr for DatabaseType {
    type Err = AutomattikError;

    /// Exact, case-sensitive match against the allow-list
    fn from_str(value: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|db_type| db_type.as_str() == value)
            .ok_or_else(|| AutomattikError::InvalidDatabaseType(value.to_string()))
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for the Automattik server
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    /// Binding address of the server
    pub host: String,

    /// Port number of the server
    pub port: u16,

    /// Database software, only changed through `set_db_type`
    db_type: DatabaseType,

    /// Parameters used to open the database
    pub db_params: String,
}

/// Keys present in a configuration document. Missing or null keys stay `None`.
///
/// Keys match exactly; the capitalized aliases cover documents written with
/// field names. Any other spelling is ignored like an unknown key, and giving a
/// key together with its alias is a duplicate field.
#[derive(Debug, Default, Deserialize)]
struct ConfigOverlay {
    #[serde(alias = "Host")]
    host: Option<String>,

    #[serde(alias = "Port")]
    port: Option<u16>,

    #[serde(alias = "DBType")]
    db_type: Option<String>,

    #[serde(alias = "DBParams")]
    db_params: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            db_type: DEFAULT_DB_TYPE,
            db_params: DEFAULT_DB_PARAMS.to_string(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn db_type(&self) -> DatabaseType {
        self.db_type
    }

    /// Set the database type, rejecting anything outside the allow-list
    pub fn set_db_type(&mut self, candidate: &str) -> Result<()> {
        self.db_type = candidate.parse()?;
        Ok(())
    }

    /// Address a launcher would bind to
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Overlay the keys of the first JSON document in `input` onto this
    /// configuration. Anything after that document is left unread.
    ///
    /// The record is only touched once the whole document has decoded and its
    /// database type has passed the allow-list.
    pub fn read_from<R: Read>(&mut self, input: R) -> Result<()> {
        let overlay = serde_json::Deserializer::from_reader(input)
            .into_iter::<ConfigOverlay>()
            .next()
            .unwrap_or_else(|| {
                Err(<serde_json::Error as de::Error>::custom(
                    "no configuration document in input",
                ))
            })
            .map_err(AutomattikError::MalformedConfig)?;

        let db_type = overlay
            .db_type
            .as_deref()
            .map(DatabaseType::from_str)
            .transpose()?;

        if let Some(host) = overlay.host {
            self.host = host;
        }
        if let Some(port) = overlay.port {
            self.port = port;
        }
        if let Some(db_type) = db_type {
            self.db_type = db_type;
        }
        if let Some(db_params) = overlay.db_params {
            self.db_params = db_params;
        }

        debug!("Applied configuration overlay: {:?}", self);
        Ok(())
    }

    /// Overlay a configuration file onto this configuration
    pub fn overlay_file(&mut self, path: &Path) -> Result<()> {
        let file = File::open(path).map_err(|source| AutomattikError::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;

        self.read_from(BufReader::new(file))
            .map_err(|e| AutomattikError::ConfigFileParse {
                path: path.to_path_buf(),
                source: Box::new(e),
            })?;

        info!("Loaded configuration from {}", path.display());
        Ok(())
    }

    /// Write the configuration as a single line of JSON
    pub fn write_to<W: Write>(&self, mut output: W) -> Result<()> {
        let mut data = serde_json::to_vec(self).map_err(AutomattikError::Serialization)?;
        data.push(b'\n');
        output.write_all(&data)?;
        Ok(())
    }

    /// Write the configuration as tab-indented JSON with a trailing newline
    pub fn write_indented_to<W: Write>(&self, mut output: W) -> Result<()> {
        let mut data = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut serializer = serde_json::Serializer::with_formatter(&mut data, formatter);
        self.serialize(&mut serializer)
            .map_err(AutomattikError::Serialization)?;

        data.push(b'\n');
        output.write_all(&data)?;
        output.flush()?;
        Ok(())
    }

    /// Save configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.write_indented_to(file)
    }
}
