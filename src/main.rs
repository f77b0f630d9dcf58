//! `jobportal` command-line client.
//!
//! Thin wrapper over the library: loads configuration, keeps the session in
//! a JSON file between runs and prints responses as pretty JSON. Failures
//! print their error report and exit with status 1.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use jobportal_client::config::validation::validate_config;
use jobportal_client::config::ConfigError;
use jobportal_client::matching;
use jobportal_client::models::{
    ApplicationStatus, ApplyRequest, JobSearchFilters, LoginRequest, RegisterRequest, UserRole,
};
use jobportal_client::observability::{logging, metrics};
use jobportal_client::{load_config, ApiClient, ApiError, ApiResult, SessionEvent};

const DEFAULT_SESSION_FILE: &str = ".jobportal/session.json";

#[derive(Parser)]
#[command(name = "jobportal")]
#[command(about = "Command-line client for the job portal API", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the API base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Where the session is kept between runs
    #[arg(long, global = true)]
    session_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        full_name: String,
        #[arg(long, value_enum, default_value_t = RoleArg::Candidate)]
        role: RoleArg,
        #[arg(long)]
        phone: Option<String>,
    },
    /// End the session
    Logout,
    /// Browse job postings
    Jobs {
        #[command(subcommand)]
        command: JobsCommand,
    },
    /// Apply to a job
    Apply {
        job_id: i64,
        #[arg(long)]
        cover_letter: Option<String>,
        #[arg(long)]
        resume_url: Option<String>,
    },
    /// Inspect and manage applications
    Applications {
        #[command(subcommand)]
        command: ApplicationsCommand,
    },
    /// Upload a resume (pdf, doc, docx)
    Upload { path: PathBuf },
    /// Backend health and application metrics
    Health,
    /// Administrative endpoints
    Admin {
        #[command(subcommand)]
        command: AdminCommand,
    },
    /// Match a plain-text resume against current job postings
    Analyze {
        resume: PathBuf,
        /// Number of postings to compare against
        #[arg(long, default_value_t = 50)]
        size: u32,
    },
}

#[derive(Subcommand)]
enum JobsCommand {
    List {
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        size: u32,
    },
    Get {
        id: i64,
    },
    Search {
        #[arg(long)]
        keyword: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        min_salary: Option<u64>,
        #[arg(long)]
        max_salary: Option<u64>,
        #[arg(long)]
        experience: Option<String>,
    },
}

#[derive(Subcommand)]
enum ApplicationsCommand {
    Mine,
    Get {
        id: i64,
    },
    Withdraw {
        id: i64,
    },
    Status {
        id: i64,
        status: ApplicationStatus,
        #[arg(long, default_value = "")]
        notes: String,
    },
}

#[derive(Subcommand)]
enum AdminCommand {
    CacheStats,
    /// Clear one cache, or all of them when no name is given
    ClearCache {
        name: Option<String>,
    },
    Metrics,
    Info,
    /// Show the server log level, or change it with --set
    LogLevel {
        #[arg(long)]
        set: Option<String>,
        #[arg(long, default_value = "")]
        logger: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    Candidate,
    Recruiter,
}

impl From<RoleArg> for UserRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Candidate => UserRole::Candidate,
            RoleArg::Recruiter => UserRole::Recruiter,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let client = match build_client(&cli) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut events = client.subscribe_session_events();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let SessionEvent::LoginRequired { request_id } = event {
                eprintln!("Your session has expired. Please log in again. (request {request_id})");
            }
        }
    });

    match run(&client, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let report = e.report();
            match serde_json::to_string_pretty(&report) {
                Ok(json) => eprintln!("{json}"),
                Err(_) => eprintln!("{}", report.message),
            }
            ExitCode::FAILURE
        }
    }
}

fn build_client(cli: &Cli) -> ApiResult<ApiClient> {
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(url) = &cli.base_url {
        config.api.base_url = url.clone();
    }
    if let Some(path) = &cli.session_file {
        config.session.path = Some(path.clone());
    }
    if config.session.path.is_none() {
        config.session.path = Some(DEFAULT_SESSION_FILE.to_string());
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_logging(&config.observability);
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    tracing::debug!(
        base_url = %config.api.base_url,
        session_file = ?config.session.path,
        "Configuration loaded"
    );
    ApiClient::new(config)
}

fn print_json<T: Serialize>(value: &T) -> ApiResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::InvalidRequest(format!("cannot render output: {e}")))?;
    println!("{json}");
    Ok(())
}

async fn run(client: &ApiClient, command: Commands) -> ApiResult<()> {
    match command {
        Commands::Login { email, password } => {
            let response = client.auth().login(&LoginRequest { email, password }).await?;
            let user = response.data.data.and_then(|auth| auth.user);
            print_json(&serde_json::json!({
                "message": response.data.message,
                "user": user,
            }))
        }
        Commands::Register {
            email,
            password,
            full_name,
            role,
            phone,
        } => {
            let request = RegisterRequest {
                email,
                password,
                full_name,
                role: role.into(),
                phone,
            };
            print_json(&client.auth().register(&request).await?.data)
        }
        Commands::Logout => print_json(&client.auth().logout().await?.data),
        Commands::Jobs { command } => match command {
            JobsCommand::List { page, size } => {
                print_json(&client.jobs().list(page, size).await?.data)
            }
            JobsCommand::Get { id } => print_json(&client.jobs().get(id).await?.data),
            JobsCommand::Search {
                keyword,
                location,
                min_salary,
                max_salary,
                experience,
            } => {
                let filters = JobSearchFilters {
                    keyword,
                    location,
                    min_salary,
                    max_salary,
                    experience_required: experience,
                };
                print_json(&client.jobs().search(&filters).await?.data)
            }
        },
        Commands::Apply {
            job_id,
            cover_letter,
            resume_url,
        } => {
            let request = ApplyRequest {
                cover_letter,
                resume_url,
            };
            print_json(&client.applications().apply(job_id, &request).await?.data)
        }
        Commands::Applications { command } => match command {
            ApplicationsCommand::Mine => print_json(&client.applications().mine().await?.data),
            ApplicationsCommand::Get { id } => {
                print_json(&client.applications().get(id).await?.data)
            }
            ApplicationsCommand::Withdraw { id } => {
                print_json(&client.applications().withdraw(id).await?.data)
            }
            ApplicationsCommand::Status { id, status, notes } => print_json(
                &client
                    .applications()
                    .update_status(id, status, &notes)
                    .await?
                    .data,
            ),
        },
        Commands::Upload { path } => print_json(&client.files().upload_resume(&path).await?.data),
        Commands::Health => print_json(&client.monitoring().check_system_health().await),
        Commands::Admin { command } => {
            let admin = client.admin();
            let response = match command {
                AdminCommand::CacheStats => admin.cache_stats().await?,
                AdminCommand::ClearCache { name: Some(name) } => admin.clear_cache(&name).await?,
                AdminCommand::ClearCache { name: None } => admin.clear_all_caches().await?,
                AdminCommand::Metrics => admin.metrics().await?,
                AdminCommand::Info => admin.info().await?,
                AdminCommand::LogLevel { set: Some(level), logger } => {
                    admin.set_log_level(&level, &logger).await?
                }
                AdminCommand::LogLevel { set: None, .. } => admin.log_level().await?,
            };
            print_json(&response.data)
        }
        Commands::Analyze { resume, size } => {
            let text = std::fs::read_to_string(&resume)?;
            let jobs = client
                .jobs()
                .list(0, size)
                .await?
                .data
                .into_data()
                .unwrap_or_default();
            print_json(&matching::analyze(&text, &jobs))
        }
    }
}
