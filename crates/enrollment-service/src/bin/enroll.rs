use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, Command};
use enrollment_core::{ActorId, EnrollmentConfig, EnrollmentRequest, ErrorResponse};
use enrollment_service::{init_tracing, EnrollmentService, LogFormat};
use enrollment_store::SeedData;
use std::path::PathBuf;
use std::process::ExitCode;

fn cli() -> Command {
    Command::new("enroll")
        .version(enrollment_service::VERSION)
        .about("Enroll a student with a guardian against a seeded in-memory store")
        .arg(
            Arg::new("config")
                .long("config")
                .value_parser(value_parser!(PathBuf))
                .help("Enrollment configuration (TOML)"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Actors, account types and existing accounts (TOML)"),
        )
        .arg(
            Arg::new("request")
                .long("request")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Enrollment request payload (JSON)"),
        )
        .arg(
            Arg::new("actor")
                .long("actor")
                .required(true)
                .value_parser(value_parser!(ActorId))
                .help("UUID of the acting identity"),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let matches = cli().get_matches();

    let format = if matches.get_flag("json-logs") {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_tracing(format).context("installing tracing subscriber")?;

    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => EnrollmentConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EnrollmentConfig::default(),
    };

    let seed_path = matches
        .get_one::<PathBuf>("seed")
        .context("--seed is required")?;
    let store = SeedData::from_file(seed_path)
        .and_then(|seed| seed.into_store(&config.default_password_hash))
        .with_context(|| format!("seeding store from {}", seed_path.display()))?;

    let request_path = matches
        .get_one::<PathBuf>("request")
        .context("--request is required")?;
    let payload = std::fs::read_to_string(request_path)
        .with_context(|| format!("reading {}", request_path.display()))?;
    let request = EnrollmentRequest::from_json(&payload)
        .with_context(|| format!("parsing {}", request_path.display()))?;

    let actor_id = *matches
        .get_one::<ActorId>("actor")
        .context("--actor is required")?;

    let service = EnrollmentService::new(store, config);
    match service.create_student_with_guardian(&request, actor_id).await {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!("{}", serde_json::to_string_pretty(&ErrorResponse::from_error(&e))?);
            Ok(ExitCode::FAILURE)
        }
    }
}
