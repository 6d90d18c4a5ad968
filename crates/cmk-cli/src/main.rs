//! `cmk` — command-line client for the CMK key-management API.
//!
//! Works against the same tenant-scoped REST backend as the web console,
//! using the session cookies of an authenticated browser session.

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod login;

use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use cmk_client::{
    ActionType, ApiClient, ApiError, ArtifactType, ClientConfig, GateOutcome, LoginUrl, Page,
    TaskTransition, WorkflowError, WorkflowGate, WorkflowRequest,
};
use serde::Serialize;
use serde_json::Value;

use crate::login::TerminalLogin;

// ── ANSI color helpers ───────────────────────────────────────────────

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";

// ── CLI structure ────────────────────────────────────────────────────

/// CMK — customer-managed keys from the terminal.
#[derive(Parser)]
#[command(
    name = "cmk",
    version,
    about = "CMK CLI — manage key configurations, keys, systems, and approval tasks",
    long_about = None,
    after_help = format!(
        "{DIM}Environment variables:{RESET}\n  \
         CMK_API_BASE_URL  Backend origin (default: http://127.0.0.1:3000)\n  \
         CMK_CONSOLE_ORIGIN  Console serving config/config.json with apiBaseUrl\n  \
         CMK_TENANT        Tenant to work in\n  \
         CMK_COOKIES       Cookie header of an authenticated session\n  \
         CMK_AUTH_URL      Identity provider base for login URLs\n  \
         CMK_CONFIG_FILE   config.json supplying apiBaseUrl (config.yaml beside it is read too)\n  \
         CMK_LOG_LEVEL     Log filter when RUST_LOG is unset (default: warn)\n\n\
         {DIM}Examples:{RESET}\n  \
         cmk --tenant t1 key-configs list\n  \
         cmk --tenant t1 systems link sys-123 kc-456 --send-for-approval\n  \
         cmk --tenant t1 tasks approve wf-1"
    ),
)]
struct Cli {
    /// Backend origin.
    #[arg(long, env = "CMK_API_BASE_URL")]
    base_url: Option<String>,

    /// Console origin serving `config/config.json`; used when no base URL
    /// is given.
    #[arg(long, env = "CMK_CONSOLE_ORIGIN")]
    console_origin: Option<String>,

    /// Tenant to work in.
    #[arg(long, env = "CMK_TENANT")]
    tenant: Option<String>,

    /// Cookie header of an authenticated session.
    #[arg(long, env = "CMK_COOKIES", hide_env_values = true)]
    cookies: Option<String>,

    /// Identity provider base for login URLs.
    #[arg(long, env = "CMK_AUTH_URL")]
    auth_url: Option<String>,

    /// Print raw JSON instead of formatted output.
    #[arg(long, default_value = "false")]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tenant discovery.
    Tenants {
        #[command(subcommand)]
        action: TenantCommands,
    },
    /// Key configuration operations.
    #[command(name = "key-configs")]
    KeyConfigs {
        #[command(subcommand)]
        action: KeyConfigCommands,
    },
    /// Key operations.
    Keys {
        #[command(subcommand)]
        action: KeyCommands,
    },
    /// Connected system operations.
    Systems {
        #[command(subcommand)]
        action: SystemCommands,
    },
    /// Administrator group operations.
    Groups {
        #[command(subcommand)]
        action: GroupCommands,
    },
    /// Approval task operations.
    Tasks {
        #[command(subcommand)]
        action: TaskCommands,
    },
    /// Print the login URL for the selected tenant.
    #[command(name = "login-url")]
    LoginUrl {
        /// Console origin to return to after login.
        #[arg(long)]
        origin: Option<String>,
        /// Land on the key configuration list after login.
        #[arg(long, default_value = "false")]
        retry: bool,
    },
}

#[derive(Subcommand)]
enum TenantCommands {
    /// List tenants the signed-in user can access.
    List,
    /// List all tenants from the system endpoint.
    System,
    /// Show which key provisioning modes the tenant allows.
    Keystores,
}

#[derive(Subcommand)]
enum KeyConfigCommands {
    /// List key configurations.
    List {
        #[command(flatten)]
        page: PageArgs,
    },
    /// Show a key configuration.
    Get {
        /// Key configuration ID.
        id: String,
    },
    /// Show the tags of a key configuration.
    Tags {
        /// Key configuration ID.
        id: String,
    },
    /// Make a key the primary key of its configuration.
    #[command(name = "set-primary")]
    SetPrimary {
        /// Key configuration ID.
        id: String,
        /// Key ID.
        key_id: String,
        /// File an approval request if one is required.
        #[arg(long, default_value = "false")]
        send_for_approval: bool,
    },
}

#[derive(Subcommand)]
enum KeyCommands {
    /// List keys of a key configuration.
    List {
        /// Key configuration ID.
        key_config: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Show a key.
    Get {
        /// Key ID.
        id: String,
    },
    /// List the versions of a key.
    Versions {
        /// Key ID.
        id: String,
    },
    /// Create a new key version.
    Rotate {
        /// Key ID.
        id: String,
    },
}

#[derive(Subcommand)]
enum SystemCommands {
    /// List systems.
    List {
        /// Only systems linked to this key configuration.
        #[arg(long)]
        key_config: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Show a system.
    Get {
        /// System ID.
        id: String,
    },
    /// Link a system to a key configuration.
    Link {
        /// System ID.
        id: String,
        /// Key configuration ID.
        key_config: String,
        /// File an approval request if one is required.
        #[arg(long, default_value = "false")]
        send_for_approval: bool,
    },
    /// Disconnect a system from its key configuration.
    Unlink {
        /// System ID.
        id: String,
        /// File an approval request if one is required.
        #[arg(long, default_value = "false")]
        send_for_approval: bool,
    },
    /// Cancel or retry a failed link operation.
    Recover {
        /// System ID.
        id: String,
        /// Recovery action.
        #[arg(value_parser = ["cancel", "retry"])]
        action: String,
    },
}

#[derive(Subcommand)]
enum GroupCommands {
    /// List groups.
    List {
        #[command(flatten)]
        page: PageArgs,
    },
    /// Show a group.
    Get {
        /// Group ID.
        id: String,
    },
}

#[derive(Subcommand)]
enum TaskCommands {
    /// List approval tasks.
    List {
        #[command(flatten)]
        page: PageArgs,
    },
    /// Show a task and its approvers.
    Get {
        /// Task ID.
        id: String,
    },
    /// Approve a task.
    Approve { id: String },
    /// Reject a task.
    Reject { id: String },
    /// Confirm an approved task.
    Confirm { id: String },
    /// Revoke a task you initiated.
    Revoke { id: String },
}

#[derive(clap::Args, Clone, Copy)]
struct PageArgs {
    /// Page number (1-based).
    #[arg(long, default_value = "1")]
    page: u32,
    /// Items per page.
    #[arg(long, default_value = "10")]
    size: u32,
}

impl From<PageArgs> for Page {
    fn from(args: PageArgs) -> Self {
        Self::number(args.page, args.size)
    }
}

// ── Pretty output helpers ────────────────────────────────────────────

fn header(icon: &str, title: &str) {
    println!("{BOLD}{CYAN}{icon} {title}{RESET}");
    println!("{DIM}─────────────────────────────────────────{RESET}");
}

fn kv_line(key: &str, value: &str) {
    println!("  {DIM}{key:<20}{RESET} {WHITE}{value}{RESET}");
}

fn success(msg: &str) {
    println!("{GREEN}{BOLD}✓{RESET} {msg}");
}

fn warning(msg: &str) {
    println!("{YELLOW}{BOLD}⚠{RESET} {YELLOW}{msg}{RESET}");
}

fn print_json(value: &Value) {
    if value.is_null() {
        return;
    }
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("failed to format JSON: {e}"),
    }
}

fn print_fields(value: &Value) {
    let Some(obj) = value.as_object() else {
        print_json(value);
        return;
    };
    for (k, v) in obj {
        let display = match v {
            Value::String(s) => s.clone(),
            Value::Null => continue,
            other => other.to_string(),
        };
        kv_line(k, &display);
    }
}

/// Render a list endpoint's items as `├─ id  name` rows.
fn print_rows(title: &str, items: &[Value], count: u64, page: Page) {
    header("📂", title);
    if items.is_empty() {
        println!("  {DIM}(empty){RESET}");
    }
    for item in items {
        let id = item.get("id").and_then(Value::as_str).unwrap_or_default();
        let name = item
            .get("name")
            .or_else(|| item.get("identifier"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        println!("  {CYAN}├─{RESET} {id}  {DIM}{name}{RESET}");
    }
    println!();
    println!(
        "  {DIM}{count} total · page size {} · {} page(s){RESET}",
        page.top,
        page.total_pages(count)
    );
    println!();
}

/// Print a fetched value, or tell the user the session is being renewed.
fn show<T: Serialize>(raw: bool, title: &str, value: Option<T>) -> Result<()> {
    let value = present(value)?;
    let value = serde_json::to_value(value).context("failed to encode response")?;
    if raw {
        print_json(&value);
    } else {
        println!();
        header("🔑", title);
        print_fields(&value);
        println!();
    }
    Ok(())
}

fn show_list<T: Serialize>(
    raw: bool,
    title: &str,
    page: Page,
    list: Option<cmk_client::ListResponse<T>>,
) -> Result<()> {
    let list = present(list)?;
    let items = list
        .value
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()
        .context("failed to encode response")?;
    if raw {
        print_json(&Value::Array(items));
    } else {
        println!();
        print_rows(title, &items, list.count, page);
    }
    Ok(())
}

/// `None` from the client means a 401 was absorbed by the login redirect.
fn present<T>(value: Option<T>) -> Result<T> {
    value.context("no data returned; if you were asked to log in, retry afterwards")
}

/// `None` from a mutation means the login redirect absorbed it.
fn applied(outcome: Option<()>) -> Result<()> {
    outcome.context("session expired and nothing was changed; log in and retry")
}

/// Fixed user-facing text for a failed command. Backend error text is
/// only logged.
fn failure_message(command: &Commands) -> &'static str {
    match command {
        Commands::Tenants { .. } => "Could not load tenants.",
        Commands::KeyConfigs { action } => match action {
            KeyConfigCommands::SetPrimary { .. } => "Could not change the primary key.",
            _ => "Could not load key configurations.",
        },
        Commands::Keys { action } => match action {
            KeyCommands::Rotate { .. } => "Could not rotate the key.",
            _ => "Could not load keys.",
        },
        Commands::Systems { action } => match action {
            SystemCommands::Link { .. } => "Could not link the system.",
            SystemCommands::Unlink { .. } => "Could not disconnect the system.",
            SystemCommands::Recover { .. } => "Could not start the recovery action.",
            _ => "Could not load systems.",
        },
        Commands::Groups { .. } => "Could not load groups.",
        Commands::Tasks { action } => match action {
            TaskCommands::List { .. } | TaskCommands::Get { .. } => "Could not load tasks.",
            _ => "Could not update the task.",
        },
        Commands::LoginUrl { .. } => "Could not build the login URL.",
    }
}

/// Describe a failure the way the console would.
fn describe_error(err: &anyhow::Error, tenant_id: &str, failed: &str) -> Vec<String> {
    let api = err
        .downcast_ref::<ApiError>()
        .or_else(|| match err.downcast_ref::<WorkflowError>() {
            Some(WorkflowError::Api(api)) => Some(api),
            _ => None,
        });

    match api {
        Some(ApiError::Access(access)) => {
            let mut lines = vec![access.message().to_owned()];
            lines.push(format!(
                "route: {}",
                access.code().forbidden_route(tenant_id)
            ));
            if access.code().allows_login_retry() {
                lines.push("retry with `cmk login-url --retry`".to_owned());
            }
            lines
        }
        Some(ApiError::Http(http)) => {
            tracing::debug!(
                status = http.status(),
                backend_message = http.data_message().unwrap_or_default(),
                "request failed"
            );
            let report = http.report(failed);
            let mut lines = vec![report.message];
            if !report.request_id.is_empty() {
                lines.push(format!("request ID: {}", report.request_id));
            }
            lines.push(format!("time: {} UTC", report.timestamp));
            lines
        }
        _ => vec![format!("{err:#}")],
    }
}

// ── Command dispatch ─────────────────────────────────────────────────

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(
            std::env::var("CMK_LOG_LEVEL").unwrap_or_else(|_| "warn".to_owned()),
        )
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn client_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = ClientConfig::from_env().context("failed to load configuration")?;
    if let Some(base_url) = &cli.base_url {
        config.base_url.clone_from(base_url);
    } else if let Some(origin) = &cli.console_origin {
        config
            .discover_base_url(origin)
            .await
            .context("failed to load console configuration")?;
    }
    if let Some(tenant) = &cli.tenant {
        config.tenant_id = Some(tenant.clone());
    }
    if let Some(cookies) = &cli.cookies {
        config.cookies.clone_from(cookies);
    }
    if let Some(auth_url) = &cli.auth_url {
        config.auth_url = Some(auth_url.clone());
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let tenant = cli.tenant.clone().unwrap_or_default();
    let failed = failure_message(&cli.command);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let mut lines = describe_error(&e, &tenant, failed).into_iter();
            eprintln!();
            eprintln!(
                "  {RED}{BOLD}✗ Error:{RESET} {}",
                lines.next().unwrap_or_default()
            );
            for line in lines {
                eprintln!("    {DIM}{line}{RESET}");
            }
            eprintln!();
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = client_config(&cli).await?;
    if let Some(observability) = &config.observability {
        let keys = observability
            .as_value()
            .as_mapping()
            .map(|m| m.keys().filter_map(|k| k.as_str()).collect::<Vec<_>>().join(","))
            .unwrap_or_default();
        tracing::debug!(keys = %keys, "observability settings loaded");
    }

    if let Commands::LoginUrl { origin, retry } = &cli.command {
        return cmd_login_url(&config, origin.as_deref(), *retry);
    }

    let navigator = TerminalLogin::new(config.auth_url.as_deref(), &config.base_url);
    let client = ApiClient::new(&config, Arc::new(navigator))?;
    tracing::debug!(
        base_url = %config.base_url,
        tenant = config.tenant_id.as_deref().unwrap_or("-"),
        "client configured"
    );
    let raw = cli.json;

    match cli.command {
        Commands::Tenants { action } => cmd_tenants(&client, raw, action).await,
        Commands::KeyConfigs { action } => cmd_key_configs(&client, raw, action).await,
        Commands::Keys { action } => cmd_keys(&client, raw, action).await,
        Commands::Systems { action } => cmd_systems(&client, raw, action).await,
        Commands::Groups { action } => cmd_groups(&client, raw, action).await,
        Commands::Tasks { action } => cmd_tasks(&client, raw, action).await,
        Commands::LoginUrl { .. } => Ok(()),
    }
}

// ── Approval gating ──────────────────────────────────────────────────

/// Run `direct` unless the backend requires approval for `request`.
async fn gated<F, Fut>(
    client: &ApiClient,
    request: &WorkflowRequest,
    send_for_approval: bool,
    done: &str,
    direct: F,
) -> Result<()>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Option<()>, ApiError>>,
{
    let gate = WorkflowGate::new(client);
    let outcome = gate.run_gated(request, direct).await?;
    println!();
    match outcome {
        GateOutcome::Executed(outcome) => {
            applied(outcome)?;
            success(done);
        }
        GateOutcome::AlreadyPending => {
            warning("An approval request for this action is already pending.");
        }
        GateOutcome::ApprovalRequired if send_for_approval => {
            let created = gate.create(request).await?;
            success(&created.confirmation());
        }
        GateOutcome::ApprovalRequired => {
            warning("This action requires approval.");
            println!("  {DIM}Re-run with --send-for-approval to file the request.{RESET}");
        }
    }
    println!();
    Ok(())
}

// ── Tenant commands ──────────────────────────────────────────────────

async fn cmd_tenants(client: &ApiClient, raw: bool, action: TenantCommands) -> Result<()> {
    let page = Page::new(1024, 0);
    match action {
        TenantCommands::List => {
            show_list(raw, "Tenants", page, client.list_tenants().await?)
        }
        TenantCommands::System => {
            show_list(raw, "System tenants", page, client.list_system_tenants().await?)
        }
        TenantCommands::Keystores => {
            show(raw, "Keystore options", client.keystore_options().await?)
        }
    }
}

// ── Key configuration commands ───────────────────────────────────────

async fn cmd_key_configs(client: &ApiClient, raw: bool, action: KeyConfigCommands) -> Result<()> {
    match action {
        KeyConfigCommands::List { page } => {
            let page = page.into();
            let list = client.list_key_configurations(page, true).await?;
            show_list(raw, "Key configurations", page, list)
        }
        KeyConfigCommands::Get { id } => show(
            raw,
            &format!("Key configuration: {id}"),
            client.get_key_configuration(&id).await?,
        ),
        KeyConfigCommands::Tags { id } => {
            let tags = present(client.get_tags(&id).await?)?;
            if raw {
                print_json(&serde_json::to_value(&tags)?);
                return Ok(());
            }
            println!();
            header("🏷", &format!("Tags: {id}"));
            for tag in &tags {
                println!("  {CYAN}├─{RESET} {tag}");
            }
            println!();
            Ok(())
        }
        KeyConfigCommands::SetPrimary {
            id,
            key_id,
            send_for_approval,
        } => {
            let request =
                WorkflowRequest::new(ArtifactType::KeyConfiguration, &id, ActionType::UpdatePrimaryKey)
                    .with_parameters(&key_id);
            gated(
                client,
                &request,
                send_for_approval,
                &format!("Key {BOLD}{key_id}{RESET} is now primary for {BOLD}{id}{RESET}."),
                || client.set_primary_key(&id, &key_id),
            )
            .await
        }
    }
}

// ── Key commands ─────────────────────────────────────────────────────

async fn cmd_keys(client: &ApiClient, raw: bool, action: KeyCommands) -> Result<()> {
    match action {
        KeyCommands::List { key_config, page } => {
            let page = page.into();
            let list = client.list_keys(&key_config, page).await?;
            show_list(raw, &format!("Keys: {key_config}"), page, list)
        }
        KeyCommands::Get { id } => show(raw, &format!("Key: {id}"), client.get_key(&id).await?),
        KeyCommands::Versions { id } => {
            let list = present(client.list_key_versions(&id).await?)?;
            if raw {
                print_json(&serde_json::to_value(&list.value)?);
                return Ok(());
            }
            println!();
            header("🔁", &format!("Versions: {id}"));
            for version in &list.value {
                let primary = if version.is_primary { " (primary)" } else { "" };
                println!(
                    "  {CYAN}├─{RESET} v{}  {DIM}{:?}{primary}{RESET}",
                    version.version, version.state
                );
            }
            println!();
            Ok(())
        }
        KeyCommands::Rotate { id } => {
            applied(client.rotate_key(&id).await?)?;
            println!();
            success(&format!("Key {BOLD}{id}{RESET} rotated."));
            println!();
            Ok(())
        }
    }
}

// ── System commands ──────────────────────────────────────────────────

async fn cmd_systems(client: &ApiClient, raw: bool, action: SystemCommands) -> Result<()> {
    match action {
        SystemCommands::List { key_config, page } => {
            let page = page.into();
            let list = client.list_systems(page, key_config.as_deref()).await?;
            show_list(raw, "Systems", page, list)
        }
        SystemCommands::Get { id } => {
            show(raw, &format!("System: {id}"), client.get_system(&id).await?)
        }
        SystemCommands::Link {
            id,
            key_config,
            send_for_approval,
        } => {
            let request = WorkflowRequest::new(ArtifactType::System, &id, ActionType::Link)
                .with_parameters(&key_config);
            gated(
                client,
                &request,
                send_for_approval,
                &format!("System {BOLD}{id}{RESET} linked to {BOLD}{key_config}{RESET}."),
                || client.link_system(&id, &key_config),
            )
            .await
        }
        SystemCommands::Unlink {
            id,
            send_for_approval,
        } => {
            let request = WorkflowRequest::new(ArtifactType::System, &id, ActionType::Unlink);
            gated(
                client,
                &request,
                send_for_approval,
                &format!("System {BOLD}{id}{RESET} disconnected."),
                || client.unlink_system(&id),
            )
            .await
        }
        SystemCommands::Recover { id, action } => {
            let actions = present(client.system_recovery_actions(&id).await?)?;
            let allowed = match action.as_str() {
                "cancel" => actions.can_cancel,
                _ => actions.can_retry,
            };
            if !allowed {
                bail!("system {id} does not allow '{action}' right now");
            }
            applied(
                client
                    .recover_system(&id, &action.to_ascii_uppercase())
                    .await?,
            )?;
            println!();
            success(&format!("Recovery '{action}' started for {BOLD}{id}{RESET}."));
            println!();
            Ok(())
        }
    }
}

// ── Group commands ───────────────────────────────────────────────────

async fn cmd_groups(client: &ApiClient, raw: bool, action: GroupCommands) -> Result<()> {
    match action {
        GroupCommands::List { page } => {
            let page = page.into();
            show_list(raw, "Groups", page, client.list_groups(page).await?)
        }
        GroupCommands::Get { id } => {
            show(raw, &format!("Group: {id}"), client.get_group(&id).await?)
        }
    }
}

// ── Task commands ────────────────────────────────────────────────────

async fn cmd_tasks(client: &ApiClient, raw: bool, action: TaskCommands) -> Result<()> {
    let (id, transition) = match action {
        TaskCommands::List { page } => {
            let page = page.into();
            return show_list(raw, "Tasks", page, client.list_workflows(page).await?);
        }
        TaskCommands::Get { id } => {
            show(raw, &format!("Task: {id}"), client.get_workflow(&id).await?)?;
            if let Some(approvers) = client.list_approvers(&id).await? {
                if raw {
                    print_json(&serde_json::to_value(&approvers.value)?);
                } else {
                    header("👥", "Approvers");
                    for approver in &approvers.value {
                        println!(
                            "  {CYAN}├─{RESET} {}  {DIM}{:?}{RESET}",
                            approver.name, approver.decision
                        );
                    }
                    println!();
                }
            }
            return Ok(());
        }
        TaskCommands::Approve { id } => (id, TaskTransition::Approve),
        TaskCommands::Reject { id } => (id, TaskTransition::Reject),
        TaskCommands::Confirm { id } => (id, TaskTransition::Confirm),
        TaskCommands::Revoke { id } => (id, TaskTransition::Revoke),
    };

    applied(client.transition_workflow(&id, transition).await?)?;
    println!();
    success(&format!(
        "Task {BOLD}{id}{RESET}: {} requested.",
        transition.as_str().to_ascii_lowercase()
    ));
    println!();
    Ok(())
}

// ── Login ────────────────────────────────────────────────────────────

fn cmd_login_url(config: &ClientConfig, origin: Option<&str>, retry: bool) -> Result<()> {
    let Some(auth_url) = config.auth_url.as_deref() else {
        bail!("CMK_AUTH_URL (or --auth-url) is required to build a login URL");
    };
    let Some(tenant) = config.tenant_id.as_deref() else {
        bail!("a tenant is required to build a login URL (--tenant or CMK_TENANT)");
    };
    let origin = origin.unwrap_or(&config.base_url);
    let login = LoginUrl::new(auth_url);
    let url = if retry {
        login.for_retry(tenant, origin, "/")
    } else {
        login.for_return(tenant, origin)
    };
    println!();
    kv_line("Tenant", tenant);
    kv_line("Login URL", &url);
    println!();
    Ok(())
}
