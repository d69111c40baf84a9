//! Command-line caller for the department core.
//!
//! # Responsibility
//! - Parse JSON payloads from arguments, validate them and run one service
//!   operation per invocation.
//! - Print results as JSON on stdout and failures as JSON on stderr.

use clap::{Parser, Subcommand};
use department_core::db::open_db;
use department_core::{
    init_logging_from_config, CoreConfig, DepartmentError, DepartmentService,
    DepartmentValidator, SqliteDepartmentRepository,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "departments", version, about = "Manage department records")]
struct Cli {
    /// SQLite database file. Overrides DEPARTMENTS_DB_PATH.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Open the database and print core version.
    Ping,
    /// List active departments.
    List,
    /// Show one active department.
    Get { id: String },
    /// List active departments matching a JSON filter, e.g. '{"email": ""}'.
    Filter {
        #[arg(default_value = "{}")]
        payload: String,
    },
    /// Create a department from a JSON payload.
    Create { payload: String },
    /// Partially update a department from a JSON payload with an `id`.
    Update { payload: String },
    /// Soft-delete a department.
    Delete { id: String },
}

#[derive(Debug)]
enum CliError {
    Setup(String),
    MalformedPayload(serde_json::Error),
    Department(DepartmentError),
}

impl From<DepartmentError> for CliError {
    fn from(value: DepartmentError) -> Self {
        Self::Department(value)
    }
}

impl From<department_core::ValidationErrors> for CliError {
    fn from(value: department_core::ValidationErrors) -> Self {
        Self::Department(value.into())
    }
}

impl CliError {
    fn to_json(&self) -> Value {
        match self {
            Self::Setup(message) => json!({
                "code": "SETUP_FAILURE",
                "status": 500,
                "messages": [message],
            }),
            Self::MalformedPayload(err) => json!({
                "code": "MALFORMED_PAYLOAD",
                "status": 400,
                "messages": [err.to_string()],
            }),
            Self::Department(err) => json!({
                "code": err.code(),
                "status": err.status_code(),
                "messages": err.messages(),
            }),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(output) => {
            println!("{output:#}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{:#}", err.to_json());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<Value, CliError> {
    let mut config = CoreConfig::from_env().map_err(|err| CliError::Setup(err.to_string()))?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    init_logging_from_config(&config).map_err(|err| CliError::Setup(err.to_string()))?;

    let conn = open_db(&config.db_path).map_err(|err| CliError::Setup(err.to_string()))?;
    let repo = SqliteDepartmentRepository::try_new(&conn)
        .map_err(|err| CliError::Setup(err.to_string()))?;
    let service = DepartmentService::new(repo);
    let validator = DepartmentValidator::new(&config);

    let output = match cli.command {
        Command::Ping => json!({
            "ping": department_core::ping(),
            "version": department_core::core_version(),
            "db": config.db_path.display().to_string(),
        }),
        Command::List => to_json(&service.list()?)?,
        Command::Get { id } => to_json(&service.get_by_id(validator.validate_id(&id)?)?)?,
        Command::Filter { payload } => {
            let filter = validator.validate_filter(&parse_payload(&payload)?)?;
            to_json(&service.list_filtered(&filter)?)?
        }
        Command::Create { payload } => {
            let input = validator.validate_create(&parse_payload(&payload)?)?;
            to_json(&service.create(&input)?)?
        }
        Command::Update { payload } => {
            let input = validator.validate_update(&parse_payload(&payload)?)?;
            to_json(&service.update(&input)?)?
        }
        Command::Delete { id } => to_json(&service.delete(validator.validate_id(&id)?)?)?,
    };
    Ok(output)
}

fn parse_payload<T: DeserializeOwned>(raw: &str) -> Result<T, CliError> {
    serde_json::from_str(raw).map_err(CliError::MalformedPayload)
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, CliError> {
    serde_json::to_value(value).map_err(|err| CliError::Setup(format!("cannot encode output: {err}")))
}

#[cfg(test)]
mod tests {
    use super::{parse_payload, CliError};
    use department_core::{
        ConflictReason, CoreConfig, CreateDepartmentPayload, DepartmentError, DepartmentId,
        DepartmentValidator, Field,
    };
    use serde_json::json;

    #[test]
    fn parse_payload_accepts_partial_json_objects() {
        let payload: CreateDepartmentPayload = parse_payload(r#"{"name": "Ops"}"#).unwrap();
        assert_eq!(payload.name, Field::Value(json!("Ops")));
        assert_eq!(payload.floor, Field::Absent);
    }

    #[test]
    fn malformed_payload_maps_to_400() {
        let err = parse_payload::<CreateDepartmentPayload>("{name: Ops").unwrap_err();
        let rendered = err.to_json();

        assert!(matches!(err, CliError::MalformedPayload(_)));
        assert_eq!(rendered["code"], "MALFORMED_PAYLOAD");
        assert_eq!(rendered["status"], 400);
        assert_eq!(rendered["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn validation_errors_render_every_message() {
        let payload: CreateDepartmentPayload =
            parse_payload(r#"{"name": "", "floor": 0}"#).unwrap();
        let err: CliError = DepartmentValidator::new(&CoreConfig::default())
            .validate_create(&payload)
            .unwrap_err()
            .into();

        assert_eq!(
            err.to_json(),
            json!({
                "code": "INVALID_INPUT",
                "status": 400,
                "messages": ["Name cannot be empty!", "Floor must be greater than 0!"],
            })
        );
    }

    #[test]
    fn department_errors_keep_code_and_status() {
        let not_found = CliError::from(DepartmentError::NotFound(DepartmentId::nil())).to_json();
        assert_eq!(
            not_found,
            json!({ "code": "NOT_FOUND", "status": 404, "messages": ["Department not found!"] })
        );

        let conflict =
            CliError::from(DepartmentError::Conflict(ConflictReason::ExistedName)).to_json();
        assert_eq!(conflict["code"], "EXISTED_NAME");
        assert_eq!(conflict["status"], 409);
    }

    #[test]
    fn setup_errors_map_to_500() {
        let rendered = CliError::Setup("cannot open db".to_string()).to_json();
        assert_eq!(rendered["code"], "SETUP_FAILURE");
        assert_eq!(rendered["status"], 500);
        assert_eq!(rendered["messages"], json!(["cannot open db"]));
    }
}
