use clap::{Args, Parser};
use log::{debug, info};
use std::io::Write;
use std::path::Path;

use crate::config::{Config, DEFAULT_DB_PARAMS, DEFAULT_DB_TYPE, DEFAULT_HOST, DEFAULT_PORT};
use crate::error::Result;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Print the default configuration to stdout
    #[arg(long)]
    pub print_defaults: bool,

    #[command(flatten)]
    pub flags: ConfigFlags,
}

/// Flags that are bound onto a configuration
#[derive(Args, Debug, Clone)]
pub struct ConfigFlags {
    /// Path to the configuration file
    #[arg(long, default_value = "")]
    pub conf: String,

    /// Database software
    #[arg(long, default_value = DEFAULT_DB_TYPE.as_str())]
    pub dbtype: String,

    /// Binding address of the server
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port number of the server
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Parameters to open the database
    #[arg(long, default_value = DEFAULT_DB_PARAMS)]
    pub dbparams: String,
}

impl ConfigFlags {
    /// Bind the flag values onto `config`, then overlay the config file if one was given
    pub fn apply(&self, config: &mut Config) -> Result<()> {
        config.host = self.host.clone();
        config.port = self.port;
        config.db_params = self.dbparams.clone();
        config.set_db_type(&self.dbtype)?;
        debug!("Bound command line flags: {:?}", config);

        if !self.conf.is_empty() {
            config.overlay_file(Path::new(&self.conf))?;
        }

        Ok(())
    }
}

/// Build the configuration and print it as indented JSON.
///
/// `--print-defaults` skips every other source. Binding errors are returned
/// before anything is written to `output`.
pub fn run<W: Write>(cli: &Cli, output: W) -> Result<()> {
    let mut config = Config::new();

    if cli.print_defaults {
        debug!("Printing default configuration");
    } else {
        cli.flags.apply(&mut config)?;
        info!("Effective configuration for {}", config.address());
    }

    config.write_indented_to(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseType;
    use crate::error::AutomattikError;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("automattik").chain(args.iter().copied())).unwrap()
    }

    fn run_to_string(cli: &Cli) -> Result<String> {
        let mut buffer = Vec::new();
        run(cli, &mut buffer)?;
        Ok(String::from_utf8(buffer).unwrap())
    }

    #[test]
    fn test_flag_defaults_match_config_defaults() {
        let cli = parse(&[]);
        assert!(!cli.print_defaults);
        assert_eq!(cli.flags.conf, "");

        let mut config = Config::new();
        cli.flags.apply(&mut config).unwrap();
        assert_eq!(config, Config::new());
    }

    #[test]
    fn test_apply_binds_flags() {
        let cli = parse(&[
            "--host",
            "0.0.0.0",
            "--port=8080",
            "--dbtype",
            "postgres",
            "--dbparams",
            "host=db user=app",
        ]);

        let mut config = Config::new();
        cli.flags.apply(&mut config).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.db_type(), DatabaseType::Postgres);
        assert_eq!(config.db_params, "host=db user=app");
    }

    #[test]
    fn test_apply_rejects_unknown_db_type() {
        let cli = parse(&["--dbtype=oracle"]);
        let mut config = Config::new();

        let err = cli.flags.apply(&mut config).unwrap_err();
        assert!(matches!(err, AutomattikError::InvalidDatabaseType(ref v) if v == "oracle"));
        assert_eq!(config.db_type(), DatabaseType::Sqlite3);
    }

    #[test]
    fn test_conf_file_overlays_flags() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conf.json");
        std::fs::write(&path, r#"{"port": 6000, "db_type": "mysql"}"#).unwrap();

        let cli = parse(&[
            "--host",
            "10.1.1.1",
            "--port",
            "7000",
            "--conf",
            path.to_str().unwrap(),
        ]);
        let mut config = Config::new();
        cli.flags.apply(&mut config).unwrap();

        assert_eq!(config.host, "10.1.1.1");
        assert_eq!(config.port, 6000);
        assert_eq!(config.db_type(), DatabaseType::Mysql);
    }

    #[test]
    fn test_conf_file_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.json");
        let cli = parse(&["--conf", path.to_str().unwrap()]);

        let err = cli.flags.apply(&mut Config::new()).unwrap_err();
        assert!(matches!(err, AutomattikError::FileAccess { .. }));
    }

    #[test]
    fn test_run_prints_bound_config() {
        let cli = parse(&["--port", "1234", "--dbtype", "mssql"]);
        let output = run_to_string(&cli).unwrap();

        assert!(output.contains("\t\"port\": 1234,"));
        assert!(output.contains("\t\"db_type\": \"mssql\","));
        assert!(output.ends_with("}\n"));
    }

    #[test]
    fn test_print_defaults_ignores_other_flags() {
        let cli = parse(&["--print-defaults", "--port", "1234", "--dbtype", "oracle"]);
        let output = run_to_string(&cli).unwrap();

        let mut expected = Vec::new();
        Config::new().write_indented_to(&mut expected).unwrap();
        assert_eq!(output.as_bytes(), expected.as_slice());
    }

    #[test]
    fn test_run_fails_before_output() {
        let cli = parse(&["--dbtype=oracle"]);
        let mut buffer = Vec::new();

        let result = run(&cli, &mut buffer);
        assert!(matches!(result, Err(AutomattikError::InvalidDatabaseType(_))));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        let result = Cli::try_parse_from(["automattik", "--verbose"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_port_out_of_range_is_rejected() {
        let result = Cli::try_parse_from(["automattik", "--port", "70000"]);
        assert!(result.is_err());
    }
}
