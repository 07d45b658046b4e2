//! CLI module for the clubroster command-line interface.
//!
//! Without a subcommand (or with `serve`) the binary starts the server.
//! Every other subcommand talks to a running server over HTTP:
//! - `students list|add|edit|delete|login` - Manage the roster
//! - `attendance take` - Mark today's attendance for a group
//! - `attendance list` - Show recorded attendance
//! - `config check` - Validate configuration file

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::client::{
    AttendanceApi, AttendanceSubmitter, HttpClient, RosterApi, RosterController, RosterError,
    ALL_GROUPS,
};
use crate::config::Config;
use crate::db::AttendanceStatus;
use crate::validation::StudentField;

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "clubroster")]
#[command(author, version, about = "Club roster and daily attendance service", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "clubroster.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// API URL to connect to (defaults to client.api_url from the config file)
    #[arg(long, env = "CLUBROSTER_API_URL")]
    pub api_url: Option<String>,

    /// Subcommand to run (if none, starts the server)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the API server
    Serve,

    /// Student roster commands
    #[command(subcommand)]
    Students(StudentsCommands),

    /// Attendance commands
    #[command(subcommand)]
    Attendance(AttendanceCommands),

    /// Configuration management commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
pub enum StudentsCommands {
    /// List all students
    List,
    /// Add a student
    Add(AddStudentArgs),
    /// Edit a student; only the given fields change
    Edit(EditStudentArgs),
    /// Delete a student
    Delete {
        /// Student ID
        id: String,
    },
    /// Check a student's credentials
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },
}

#[derive(Args, Debug)]
pub struct AddStudentArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub rollno: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub phone: String,
    #[arg(long)]
    pub password: String,
    #[arg(long)]
    pub sig: String,
    #[arg(long)]
    pub role: String,
}

#[derive(Args, Debug)]
pub struct EditStudentArgs {
    /// Student ID
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub rollno: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    /// New password (current one is kept when omitted)
    #[arg(long)]
    pub password: Option<String>,
    #[arg(long)]
    pub sig: Option<String>,
    #[arg(long)]
    pub role: Option<String>,
}

impl EditStudentArgs {
    fn changes(&self) -> Vec<(StudentField, &str)> {
        [
            (StudentField::Name, &self.name),
            (StudentField::Rollno, &self.rollno),
            (StudentField::Email, &self.email),
            (StudentField::Phone, &self.phone),
            (StudentField::Password, &self.password),
            (StudentField::Sig, &self.sig),
            (StudentField::Role, &self.role),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.as_deref().map(|v| (field, v)))
        .collect()
    }
}

#[derive(Subcommand, Debug)]
pub enum AttendanceCommands {
    /// Mark today's attendance; everyone defaults to present
    Take {
        /// Only students in this SIG
        #[arg(long, default_value = ALL_GROUPS)]
        sig: String,
        /// Override a status, as STUDENT_ID=present|absent|late (repeatable)
        #[arg(long = "mark", value_parser = parse_mark)]
        marks: Vec<(String, AttendanceStatus)>,
    },
    /// List attendance records
    List {
        /// Only records for this student
        #[arg(long)]
        student: Option<String>,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate configuration file
    Check,
}

fn parse_mark(value: &str) -> Result<(String, AttendanceStatus), String> {
    let (id, status) = value
        .split_once('=')
        .ok_or_else(|| format!("expected STUDENT_ID=STATUS, got '{}'", value))?;
    if id.trim().is_empty() {
        return Err("student id must not be empty".to_string());
    }
    Ok((id.trim().to_string(), status.trim().parse()?))
}

// ============================================================================
// CLI Command Handlers
// ============================================================================

/// Create an HTTP client for the configured server
fn create_client(cli: &Cli, config: &Config) -> Result<HttpClient> {
    match cli.api_url.as_deref() {
        Some(url) => HttpClient::new(url, Duration::from_secs(config.client.timeout_secs)),
        None => HttpClient::from_config(&config.client),
    }
}

/// Run a CLI command. Serving is handled in main.rs.
pub async fn run_command(cli: &Cli, config: &Config) -> Result<()> {
    match &cli.command {
        Some(Commands::Students(cmd)) => {
            let client = create_client(cli, config)?;
            match cmd {
                StudentsCommands::List => cmd_students_list(client).await,
                StudentsCommands::Add(args) => cmd_students_add(client, args).await,
                StudentsCommands::Edit(args) => cmd_students_edit(client, args).await,
                StudentsCommands::Delete { id } => cmd_students_delete(client, id).await,
                StudentsCommands::Login { email, password } => {
                    cmd_students_login(&client, email, password).await
                }
            }
        }
        Some(Commands::Attendance(cmd)) => {
            let client = create_client(cli, config)?;
            match cmd {
                AttendanceCommands::Take { sig, marks } => {
                    cmd_attendance_take(&client, sig, marks).await
                }
                AttendanceCommands::List { student } => {
                    cmd_attendance_list(&client, student.as_deref()).await
                }
            }
        }
        Some(Commands::Config(ConfigCommands::Check)) => cmd_config_check(cli),
        Some(Commands::Serve) | None => Ok(()),
    }
}

async fn cmd_students_list(client: HttpClient) -> Result<()> {
    let mut roster = RosterController::new(client);
    roster
        .refresh()
        .await
        .map_err(|e| anyhow::anyhow!(e.display_message()))
        .context("Failed to load students. Is the server running?")?;

    print_students(roster.students());
    Ok(())
}

async fn cmd_students_add(client: HttpClient, args: &AddStudentArgs) -> Result<()> {
    let mut roster = RosterController::new(client);
    for (field, value) in [
        (StudentField::Name, &args.name),
        (StudentField::Rollno, &args.rollno),
        (StudentField::Email, &args.email),
        (StudentField::Phone, &args.phone),
        (StudentField::Password, &args.password),
        (StudentField::Sig, &args.sig),
        (StudentField::Role, &args.role),
    ] {
        roster.set_add_field(field, value.as_str());
    }

    roster.submit_add().await.map_err(report_roster_error)?;

    println!("[OK] Student added.");
    print_students(roster.students());
    Ok(())
}

async fn cmd_students_edit(client: HttpClient, args: &EditStudentArgs) -> Result<()> {
    let changes = args.changes();
    if changes.is_empty() {
        println!("Nothing to change.");
        return Ok(());
    }

    let mut roster = RosterController::new(client);
    roster
        .refresh()
        .await
        .map_err(|e| anyhow::anyhow!(e.display_message()))
        .context("Failed to load students")?;
    roster.start_edit(&args.id).map_err(report_roster_error)?;
    for (field, value) in changes {
        roster.set_edit_field(field, value);
    }

    roster.submit_edit().await.map_err(report_roster_error)?;

    println!("[OK] Student {} updated.", args.id);
    Ok(())
}

async fn cmd_students_delete(client: HttpClient, id: &str) -> Result<()> {
    let mut roster = RosterController::new(client);
    roster
        .delete(id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to delete student: {}", e.display_message()))?;

    println!("[OK] Student {} deleted.", id);
    println!("{} students remain.", roster.students().len());
    Ok(())
}

async fn cmd_students_login(client: &HttpClient, email: &str, password: &str) -> Result<()> {
    let response = client
        .login(email, password)
        .await
        .map_err(|e| anyhow::anyhow!(e.display_message()))?;

    println!("[OK] {}", response.message);
    println!(
        "{} ({}, {} / {})",
        response.student.name, response.student.rollno, response.student.sig, response.student.role
    );
    Ok(())
}

async fn cmd_attendance_take(
    client: &HttpClient,
    sig: &str,
    marks: &[(String, AttendanceStatus)],
) -> Result<()> {
    let mut submitter = AttendanceSubmitter::new();
    submitter.load(client).await;
    if let Some(error) = submitter.error() {
        anyhow::bail!("{}", error);
    }

    if !submitter.groups().iter().any(|g| g == sig) {
        anyhow::bail!(
            "Unknown group '{}'. Available: {}",
            sig,
            submitter.groups().join(", ")
        );
    }
    submitter.select_group(sig);

    for (id, status) in marks {
        if !submitter.filtered().iter().any(|s| &s.id == id) {
            anyhow::bail!("Student {} is not in group {}", id, sig);
        }
        submitter.set_status(id, *status);
    }

    if !submitter.can_submit() {
        anyhow::bail!("No students to submit attendance for.");
    }

    let today = chrono::Local::now().date_naive();
    println!(
        "Submitting attendance for {} ({} students)...",
        today,
        submitter.filtered().len()
    );

    let Some(report) = submitter.submit_all(client, today).await else {
        anyhow::bail!("Attendance could not be submitted right now.");
    };

    println!();
    println!("{:<36}  {:<20}  {:<8}  RESULT", "ID", "NAME", "STATUS");
    println!("{}", "-".repeat(80));
    for outcome in &report.outcomes {
        let name = submitter
            .roster()
            .iter()
            .find(|s| s.id == outcome.student_id)
            .map(|s| s.name.as_str())
            .unwrap_or("-");
        let result = match &outcome.result {
            Ok(_) => "[OK]".to_string(),
            Err(e) => format!("[!!] {}", e),
        };
        println!(
            "{:<36}  {:<20}  {:<8}  {}",
            outcome.student_id,
            truncate(name, 20),
            outcome.status,
            result
        );
    }
    println!();

    if let Some(error) = submitter.error() {
        anyhow::bail!("{}", error);
    }
    if let Some(success) = submitter.success() {
        println!("{}", success);
    }
    Ok(())
}

async fn cmd_attendance_list(client: &HttpClient, student: Option<&str>) -> Result<()> {
    let rows: Vec<(String, String, String, String)> = match student {
        Some(student_id) => client
            .student_attendance(student_id)
            .await
            .map_err(|e| anyhow::anyhow!(e.display_message()))?
            .into_iter()
            .map(|r| (r.id, r.date, r.status.to_string(), r.student_id))
            .collect(),
        None => client
            .list_attendance()
            .await
            .map_err(|e| anyhow::anyhow!(e.display_message()))?
            .into_iter()
            .map(|r| {
                let who = r
                    .student
                    .map(|s| s.name)
                    .unwrap_or_else(|| format!("(removed) {}", r.record.student_id));
                (r.record.id, r.record.date, r.record.status.to_string(), who)
            })
            .collect(),
    };

    if rows.is_empty() {
        println!("No attendance records found.");
        return Ok(());
    }

    println!();
    println!("{:<36}  {:<10}  {:<8}  STUDENT", "ID", "DATE", "STATUS");
    println!("{}", "-".repeat(100));
    for (id, date, status, who) in rows {
        println!("{:<36}  {:<10}  {:<8}  {}", id, date, status, truncate(&who, 40));
    }
    println!();
    Ok(())
}

fn cmd_config_check(cli: &Cli) -> Result<()> {
    let config_path = &cli.config;

    println!("Checking configuration file: {}", config_path.display());
    println!();

    if !config_path.exists() {
        println!(
            "[!!] Configuration file not found: {}",
            config_path.display()
        );
        println!();
        println!("Defaults will be used when starting the server.");
        return Ok(());
    }

    match Config::load(config_path) {
        Ok(config) => {
            println!("[OK] Configuration file is valid!");
            println!();
            println!("=== Configuration Summary ===");
            println!();
            println!("Server:");
            println!("  Host:         {}", config.server.host);
            println!("  Port:         {}", config.server.port);
            println!("  Data Dir:     {}", config.server.data_dir.display());
            println!();
            println!("Database:");
            println!("  Connections:  {}", config.database.max_connections);
            println!();
            println!("Logging:");
            println!("  Level:        {}", config.logging.level);
            println!();
            println!("Client:");
            println!("  API URL:      {}", config.client.api_url);
            println!("  Timeout:      {}s", config.client.timeout_secs);
            println!();
            Ok(())
        }
        Err(e) => {
            println!("[!!] Configuration file is invalid!");
            println!();
            println!("Error: {:#}", e);
            println!();
            anyhow::bail!("Invalid configuration file");
        }
    }
}

/// Print field errors and turn a controller failure into a command error
fn report_roster_error(err: RosterError) -> anyhow::Error {
    if let RosterError::Invalid(errors) = &err {
        for (field, message) in errors.iter() {
            println!("  [!!] {}: {}", field, message);
        }
    }
    anyhow::anyhow!(err)
}

fn print_students(students: &[crate::db::StudentResponse]) {
    if students.is_empty() {
        println!("No students found.");
        return;
    }

    println!();
    println!(
        "{:<36}  {:<20}  {:<18}  {:<7}  {:<16}  {:<10}",
        "ID", "NAME", "ROLL NO", "SIG", "ROLE", "PHONE"
    );
    println!("{}", "-".repeat(118));
    for s in students {
        println!(
            "{:<36}  {:<20}  {:<18}  {:<7}  {:<16}  {:<10}",
            s.id,
            truncate(&s.name, 20),
            s.rollno,
            s.sig,
            s.role,
            s.phone
        );
    }
    println!();
}

/// Truncate a string to max length with ellipsis
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
