use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use azchat_config::{Config, ConfigError, Logging, PropertyStore};
use azchat_core::report::{ErrorCode, ErrorResponse, populate_errors, populate_from_error};
use azchat_core::{AssertionPaths, DatabaseSettings, extract_identity};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

const REDACTED: &str = "********";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// YAML configuration file; packaged defaults are used when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the name identifier and claims of an assertion file as JSON
    InspectToken { file: PathBuf },
    /// Print the database connection string
    ConnectionString {
        /// Include the password instead of masking it
        #[arg(long)]
        show_password: bool,
    },
    /// Print the value of one property
    Get { key: String },
}

/// Failures of a single invocation.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to initialise logging: {0}")]
    Logging(#[source] Box<dyn Error + Send + Sync>),
    #[error(transparent)]
    Core(#[from] azchat_core::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Runs the command line and returns the process exit status.
///
/// Command output goes to stdout. A failure writes exactly one error report
/// line to stderr.
pub fn run(cli: Cli) -> ExitCode {
    match invoke(&cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(report) => {
            match serde_json::to_string(&report) {
                Ok(json) => eprintln!("{json}"),
                Err(err) => eprintln!("failed to encode error report: {err}"),
            }
            ExitCode::FAILURE
        }
    }
}

/// Loads the configuration, runs the command and returns what it prints,
/// or the report describing why it failed.
pub fn invoke(cli: &Cli) -> Result<String, ErrorResponse> {
    let store = match prepare(cli) {
        Ok(store) => store,
        // No usable config yet, so messages come from the bundled resources
        Err(err) => return Err(report_failure(&err, &PropertyStore::bundled())),
    };

    info!(command = ?cli.command, "Running command");
    execute(&cli.command, &store).map_err(|err| report_failure(&err, &store))
}

fn prepare(cli: &Cli) -> Result<PropertyStore, CommandError> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    init_logging(&config.logging).map_err(CommandError::Logging)?;
    Ok(PropertyStore::from_config(&config))
}

fn report_failure(err: &CommandError, store: &PropertyStore) -> ErrorResponse {
    error!(error = %err, "Command failed");
    error_report(err, store)
}

/// Runs one command and returns what it prints.
pub fn execute(command: &Command, store: &PropertyStore) -> Result<String, CommandError> {
    match command {
        Command::InspectToken { file } => {
            let bytes = std::fs::read(file).map_err(|source| CommandError::Read {
                path: file.clone(),
                source,
            })?;
            let text = std::str::from_utf8(&bytes).map_err(azchat_core::Error::from)?;
            let paths = AssertionPaths::from_properties(store)?;
            let identity = extract_identity(text, &paths)?;
            Ok(serde_json::to_string_pretty(&identity)?)
        }
        Command::ConnectionString { show_password } => {
            let mut settings = DatabaseSettings::from_store(store)?;
            if !show_password && !settings.password.is_empty() {
                settings.password = REDACTED.to_string();
            }
            Ok(settings.connection_string()?)
        }
        Command::Get { key } => {
            let value = store.require(key).map_err(azchat_core::Error::from)?;
            Ok(value.to_string())
        }
    }
}

/// Builds the JSON report written to stderr for a failed command.
pub fn error_report(err: &CommandError, store: &PropertyStore) -> ErrorResponse {
    let mut report = ErrorResponse::default();
    match err {
        CommandError::Core(core) => populate_from_error(&mut report, core, store),
        CommandError::Read { .. } | CommandError::Config(ConfigError::Io { .. }) => {
            populate_errors(&mut report, "READ_FAILED", err.to_string())
        }
        CommandError::Config(_) | CommandError::Logging(_) => {
            populate_errors(&mut report, ErrorCode::Configuration.as_str(), err.to_string())
        }
        CommandError::Json(_) => populate_errors(&mut report, "OUTPUT_FAILED", err.to_string()),
    }
    report
}

fn init_logging(logging: &Logging) -> Result<(), Box<dyn Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))?;

    // Keep a subscriber installed earlier in the same process
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    // Logs go to stderr so command output on stdout stays machine readable
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use azchat_config::Properties;
    use std::io::Write;

    fn store() -> PropertyStore {
        PropertyStore::preloaded(Properties::from_pairs([
            ("db.url", "host1"),
            ("db.database", "db1"),
            ("db.user", "u1"),
            ("db.password", "p1"),
            ("db.encrypt", "true"),
            ("db.hostNameInCertificate", "h1"),
        ]))
    }

    fn command(args: &[&str]) -> Command {
        let mut argv = vec!["azchat"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap().command
    }

    #[test]
    fn test_parse_arguments() {
        let cli = Cli::try_parse_from(["azchat", "-c", "/etc/azchat/config.yaml", "get", "db.url"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/azchat/config.yaml")));
        assert!(matches!(cli.command, Command::Get { ref key } if key == "db.url"));

        assert!(Cli::try_parse_from(["azchat"]).is_err());
    }

    #[test]
    fn test_connection_string_masks_password() {
        let output = execute(&command(&["connection-string"]), &store()).unwrap();
        assert_eq!(
            output,
            "host1;database=db1;user=u1;password=********;encrypt=true;hostNameInCertificate=h1;loginTimeout=30;"
        );

        let output = execute(&command(&["connection-string", "--show-password"]), &store()).unwrap();
        assert!(output.contains(";password=p1;"));
    }

    #[test]
    fn test_get_property() {
        assert_eq!(execute(&command(&["get", "db.user"]), &store()).unwrap(), "u1");

        let err = execute(&command(&["get", "db.driver"]), &store()).unwrap_err();
        let report = error_report(&err, &store());
        assert_eq!(report.error_list.unwrap().code, "CONFIGURATION");
    }

    #[test]
    fn test_inspect_token() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"<Assertion><Subject><NameID>user-7</NameID></Subject><AttributeStatement>
<Attribute Name="claims/emailaddress"><AttributeValue>u7@example.com</AttributeValue></Attribute>
</AttributeStatement></Assertion>"#
        )
        .unwrap();
        file.flush().unwrap();

        let path = file.path().to_str().unwrap();
        let output = execute(&command(&["inspect-token", path]), &store()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["nameId"], "user-7");
        assert_eq!(json["claims"]["emailaddress"], "u7@example.com");
    }

    #[test]
    fn test_inspect_token_errors() {
        let err = execute(&command(&["inspect-token", "/nonexistent/token.xml"]), &store())
            .unwrap_err();
        assert!(matches!(err, CommandError::Read { .. }));
        assert_eq!(error_report(&err, &store()).error_list.unwrap().code, "READ_FAILED");

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"<Assertion><Subject/></Assertion>").unwrap();
        file.flush().unwrap();
        let path = file.path().to_str().unwrap();
        let err = execute(&command(&["inspect-token", path]), &store()).unwrap_err();
        let report = error_report(&err, &store());
        assert_eq!(report.error_list.unwrap().code, "CLAIM_NOT_FOUND");
    }

    #[test]
    fn test_missing_config_file_is_reported() {
        let cli = Cli::try_parse_from(["azchat", "--config", "/nonexistent/config.yaml", "get", "db.url"])
            .unwrap();
        let report = invoke(&cli).unwrap_err();

        let list = report.error_list.unwrap();
        assert_eq!(list.code, "READ_FAILED");
        assert_eq!(list.errors.len(), 1);
        assert!(list.errors[0].message.contains("/nonexistent/config.yaml"));
    }

    #[test]
    fn test_invalid_config_file_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"logging: [unterminated").unwrap();
        file.flush().unwrap();

        let path = file.path().to_str().unwrap();
        let cli = Cli::try_parse_from(["azchat", "-c", path, "get", "db.url"]).unwrap();
        let report = invoke(&cli).unwrap_err();
        assert_eq!(report.error_list.unwrap().code, "CONFIGURATION");
    }

    #[test]
    fn test_invoke_with_bundled_defaults() {
        let cli = Cli::try_parse_from(["azchat", "get", "db.database"]).unwrap();
        assert_eq!(invoke(&cli).unwrap(), "azchat");
    }

    #[test]
    fn test_error_report_serializes_as_single_line() {
        let err = CommandError::from(ConfigError::Missing("no.such.key".into()));
        let report = error_report(&err, &store());
        let json = serde_json::to_string(&report).unwrap();
        assert!(!json.contains('\n'));
        assert!(json.starts_with(r#"{"errorList":{"code":"CONFIGURATION""#));
    }
}
