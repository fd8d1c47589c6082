use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use modelhub::api::{chat, finetuning, model, user, vector_db};
use modelhub::config::ConfigError;
use modelhub::permission::{PermissionSource, StaticPermissions};
use modelhub::progress::{ProgressTracker, percent_from_log};
use modelhub::routes::RouteError;
use modelhub::util::DayPeriod;
use modelhub::{
    ApiClient, ApiError, Config, FileStorage, GuardOutcome, Navigation, Notification, NotificationLevel,
    Notifier, RouteTable, Router, Session,
};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("navigation failed: {0}")]
    Route(#[from] RouteError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("{0} failed")]
    Rejected(&'static str),
    #[error("not signed in; run `modelhub login` first")]
    NotSignedIn,
    #[error("aborted")]
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PermissionMode {
    /// Ask the server for every permission check.
    Remote,
    /// Grant the tags listed in `--granted` to every signed-in user.
    Local,
}

#[derive(Parser, Debug)]
#[command(name = "modelhub", about = "Model hub client: session, navigation and API access")]
struct Cli {
    #[arg(long, value_enum, env = "MODELHUB_PERMISSION_SOURCE", default_value = "remote")]
    permission_source: PermissionMode,

    /// Comma-separated permission tags for `--permission-source local`.
    #[arg(long, env = "MODELHUB_GRANTED_PERMISSIONS", default_value = "")]
    granted: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        email: String,
        #[arg(long, env = "MODELHUB_PASSWORD")]
        password: String,
    },
    Register {
        name: String,
        email: String,
        #[arg(long, env = "MODELHUB_PASSWORD")]
        password: String,
    },
    Logout,
    Whoami {
        /// Also fetch the server-side profile.
        #[arg(long, default_value_t = false)]
        remote: bool,
    },
    /// Upload a new avatar image for the signed-in user.
    Avatar {
        file: PathBuf,
    },
    /// Run a navigation through the guard and print where it lands.
    Navigate {
        path: String,
        /// Location to start from (itself guarded).
        #[arg(long)]
        from: Option<String>,
    },
    Routes,
    Api(ApiCommand),
}

#[derive(Args, Debug)]
struct ApiCommand {
    #[command(subcommand)]
    command: ApiSubcommand,
}

#[derive(Subcommand, Debug)]
enum ApiSubcommand {
    Model(ModelCommand),
    Vector(VectorCommand),
    Chat(ChatCommand),
    Finetune(FinetuneCommand),
    Ollama(OllamaCommand),
}

/// Persona fields shared by `create` and `update`.
#[derive(Args, Debug)]
struct PersonaArgs {
    name: String,
    #[arg(long)]
    describe: Option<String>,
    #[arg(long)]
    base_model: Option<i64>,
    #[arg(long, default_value_t = 0.7)]
    temperature: f64,
    #[arg(long, default_value_t = 0.9)]
    top_p: f64,
    #[arg(long)]
    prompt: Option<String>,
    #[arg(long)]
    vector_db: Option<i64>,
    /// Hide the persona from the public list.
    #[arg(long, default_value_t = false)]
    private: bool,
}

impl PersonaArgs {
    fn into_form(self, id: Option<i64>) -> model::ModelConfigForm {
        model::ModelConfigForm {
            id,
            name: self.name,
            describe: self.describe,
            base_model_id: self.base_model,
            temperature: self.temperature,
            top_p: self.top_p,
            prompt: self.prompt,
            vector_db_id: self.vector_db,
            is_private: self.private,
        }
    }
}

/// Vector database fields shared by `create` and `update`.
#[derive(Args, Debug)]
struct VectorDbArgs {
    name: String,
    /// Embedding model id, see `api model embeddings`.
    #[arg(long)]
    embedding: i64,
    #[arg(long)]
    describe: Option<String>,
    #[arg(long, default_value_t = 0.7)]
    similarity: f64,
}

impl From<VectorDbArgs> for vector_db::VectorDbForm {
    fn from(args: VectorDbArgs) -> Self {
        Self {
            name: args.name,
            describe: args.describe,
            embedding_id: args.embedding,
            document_similarity: args.similarity,
        }
    }
}

#[derive(Args, Debug)]
struct ModelCommand {
    #[command(subcommand)]
    command: ModelSubcommand,
}

#[derive(Subcommand, Debug)]
enum ModelSubcommand {
    /// Chat-capable base models.
    List,
    Embeddings,
    /// Publicly shared personas.
    Configs,
    /// Personas owned by the signed-in user.
    Mine,
    /// Personas owned by another user.
    UserConfigs {
        user_id: i64,
    },
    Show {
        id: i64,
    },
    Create(PersonaArgs),
    Update {
        id: i64,
        #[command(flatten)]
        persona: PersonaArgs,
    },
    Delete {
        id: i64,
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

#[derive(Args, Debug)]
struct VectorCommand {
    #[command(subcommand)]
    command: VectorSubcommand,
}

#[derive(Subcommand, Debug)]
enum VectorSubcommand {
    List,
    Show {
        id: i64,
    },
    Connect {
        id: i64,
    },
    Query {
        id: i64,
        text: String,
        #[arg(long, default_value_t = 5)]
        n_results: u32,
    },
    Create(VectorDbArgs),
    Update {
        id: i64,
        #[command(flatten)]
        fields: VectorDbArgs,
    },
    Upload {
        id: i64,
        file: PathBuf,
    },
    /// Save an uploaded document to `out`.
    Download {
        id: i64,
        #[arg(long)]
        out: PathBuf,
    },
    Delete {
        id: i64,
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

#[derive(Args, Debug)]
struct ChatCommand {
    #[command(subcommand)]
    command: ChatSubcommand,
}

#[derive(Subcommand, Debug)]
enum ChatSubcommand {
    History,
    Messages {
        conversation_id: i64,
    },
    Send {
        content: String,
        #[arg(long)]
        config: Option<i64>,
        #[arg(long)]
        conversation: Option<i64>,
        /// Regenerate the last reply instead of sending a new turn.
        #[arg(long, default_value_t = false)]
        retry: bool,
    },
}

#[derive(Args, Debug)]
struct FinetuneCommand {
    #[command(subcommand)]
    command: FinetuneSubcommand,
}

#[derive(Subcommand, Debug)]
enum FinetuneSubcommand {
    List,
    Bases,
    Show {
        id: i64,
    },
    /// Model config generated for a fine-tuned model.
    Config {
        id: i64,
    },
    /// Start a fine-tuning job from a dialogue training file.
    Start {
        base_model_id: i64,
        name: String,
        file: PathBuf,
        #[arg(long)]
        describe: Option<String>,
        #[arg(long)]
        epochs: Option<u32>,
        #[arg(long)]
        lora: Option<bool>,
    },
    /// Register a local model directory as a fine-tuning base.
    AddBase {
        name: String,
        path: String,
        #[arg(long)]
        describe: Option<String>,
        #[arg(long)]
        kind: Option<String>,
    },
    Logs {
        id: i64,
        /// Save the raw log here instead of printing it.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Poll training logs until the job reports completion.
    Watch {
        id: i64,
        #[arg(long, default_value_t = 5)]
        interval_secs: u64,
        #[arg(long, default_value_t = 120)]
        max_polls: usize,
    },
}

#[derive(Args, Debug)]
struct OllamaCommand {
    #[command(subcommand)]
    command: OllamaSubcommand,
}

#[derive(Subcommand, Debug)]
enum OllamaSubcommand {
    /// Register a model served by Ollama.
    Add {
        model_name: String,
        #[arg(long)]
        supplier: Option<String>,
        #[arg(long)]
        describe: Option<String>,
    },
}

/// Prints notifications to stderr.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        let tag = match notification.level {
            NotificationLevel::Success => "ok",
            NotificationLevel::Error => "error",
        };
        eprintln!("{tag}: {}: {}", notification.title, notification.message);
    }
}

struct CliContext {
    session: Session,
    client: ApiClient,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let storage = Arc::new(FileStorage::new(&config.state_dir));
    let permissions = permission_source(cli.permission_source, &cli.granted);
    let (session, client) = modelhub::connect(&config, storage, Arc::new(ConsoleNotifier), permissions)?;
    session.init();
    let ctx = CliContext { session, client };

    match cli.command {
        Command::Login { email, password } => run_login(&ctx, &email, &password).await,
        Command::Register { name, email, password } => run_register(&ctx, &name, &email, &password).await,
        Command::Logout => {
            ctx.session.logout();
            println!("signed out");
            Ok(())
        }
        Command::Whoami { remote } => run_whoami(&ctx, remote).await,
        Command::Avatar { file } => run_avatar(&ctx, &file).await,
        Command::Navigate { path, from } => run_navigate(&ctx, &path, from.as_deref()).await,
        Command::Routes => {
            print_routes(&RouteTable::platform());
            Ok(())
        }
        Command::Api(api) => run_api(&ctx, api).await,
    }
}

fn permission_source(mode: PermissionMode, granted: &str) -> Option<Arc<dyn PermissionSource>> {
    match mode {
        PermissionMode::Remote => None,
        PermissionMode::Local => Some(Arc::new(StaticPermissions::from_list(granted))),
    }
}

// =============================================================================
// SESSION COMMANDS
// =============================================================================

async fn run_login(ctx: &CliContext, email: &str, password: &str) -> Result<(), CliError> {
    if !ctx.session.login(email, password).await {
        return Err(CliError::Rejected("sign-in"));
    }
    if let Some(user) = ctx.session.user() {
        println!("{}, {}", DayPeriod::current().greeting(), user.name);
    }
    Ok(())
}

async fn run_register(ctx: &CliContext, name: &str, email: &str, password: &str) -> Result<(), CliError> {
    let mut router = Router::new(RouteTable::platform(), ctx.session.clone());
    if !ctx.session.register(name, email, password).await {
        return Err(CliError::Rejected("registration"));
    }
    for result in router.process_requests().await {
        let nav = result?;
        println!("next: {}", nav.location);
    }
    Ok(())
}

async fn run_whoami(ctx: &CliContext, remote: bool) -> Result<(), CliError> {
    let Some(me) = ctx.session.user() else {
        return Err(CliError::NotSignedIn);
    };
    println!("{}, {}", DayPeriod::current().greeting(), me.name);
    println!("id:     {}", me.id);
    println!("email:  {}", me.email);
    println!("avatar: {}", me.avatar);
    if remote {
        let info = user::get_user_info(&ctx.client).await?;
        print_json(&serde_json::to_value(info)?)?;
    }
    Ok(())
}

async fn run_avatar(ctx: &CliContext, file: &std::path::Path) -> Result<(), CliError> {
    if !ctx.session.is_authenticated() {
        return Err(CliError::NotSignedIn);
    }
    let bytes = std::fs::read(file)?;
    let answer = user::upload_avatar(&ctx.client, &file_name_of(file, "avatar.png"), bytes).await?;
    let reference = user::avatar_reference(&answer).ok_or(ApiError::MissingField("avatar"))?;
    ctx.session.update_user_avatar(reference);
    if let Some(me) = ctx.session.user() {
        println!("avatar: {}", me.avatar);
    }
    Ok(())
}

// =============================================================================
// NAVIGATION
// =============================================================================

async fn run_navigate(ctx: &CliContext, path: &str, from: Option<&str>) -> Result<(), CliError> {
    let mut router = Router::new(RouteTable::platform(), ctx.session.clone());
    if let Some(from) = from {
        let start = router.navigate(from).await?;
        tracing::debug!(location = %start.location, "starting location");
    }
    let nav = router.navigate(path).await?;
    print_navigation(&nav);
    Ok(())
}

fn describe_outcome(outcome: &GuardOutcome) -> String {
    match outcome {
        GuardOutcome::Proceed => "proceed".to_owned(),
        GuardOutcome::RedirectHome => "redirect home".to_owned(),
        GuardOutcome::RedirectLogin { redirect, reason } => format!("redirect to login ({reason}, back to {redirect})"),
        GuardOutcome::RedirectBack { to } => format!("blocked, stay on {to}"),
    }
}

fn print_navigation(nav: &Navigation) {
    for (hop, outcome) in nav.outcomes.iter().enumerate() {
        println!("hop {}: {}", hop + 1, describe_outcome(outcome));
    }
    println!("location: {} ({:?})", nav.location, nav.view);
    for (name, value) in &nav.params {
        println!("  {name} = {value}");
    }
}

fn print_routes(table: &RouteTable) {
    for route in table.iter() {
        let access = match (route.requires_auth, route.requires_permission) {
            (false, _) => "public".to_owned(),
            (true, None) => "signed-in".to_owned(),
            (true, Some(tag)) => format!("signed-in + {tag}"),
        };
        println!("{:<16} {:<16} {access}", route.path, route.name);
    }
}

// =============================================================================
// API COMMANDS
// =============================================================================

async fn run_api(ctx: &CliContext, api: ApiCommand) -> Result<(), CliError> {
    if !ctx.session.is_authenticated() {
        return Err(CliError::NotSignedIn);
    }
    match api.command {
        ApiSubcommand::Model(cmd) => run_api_model(ctx, cmd).await,
        ApiSubcommand::Vector(cmd) => run_api_vector(ctx, cmd).await,
        ApiSubcommand::Chat(cmd) => run_api_chat(ctx, cmd).await,
        ApiSubcommand::Finetune(cmd) => run_api_finetune(ctx, cmd).await,
        ApiSubcommand::Ollama(cmd) => run_api_ollama(ctx, cmd).await,
    }
}

async fn run_api_model(ctx: &CliContext, cmd: ModelCommand) -> Result<(), CliError> {
    let client = &ctx.client;
    let json = match cmd.command {
        ModelSubcommand::List => serde_json::to_value(model::get_model_infos(client).await?)?,
        ModelSubcommand::Embeddings => serde_json::to_value(model::get_embedding_model_infos(client).await?)?,
        ModelSubcommand::Configs => serde_json::to_value(model::get_model_configs(client).await?)?,
        ModelSubcommand::Mine => serde_json::to_value(model::fetch_own_configs(client).await?)?,
        ModelSubcommand::UserConfigs { user_id } => {
            serde_json::to_value(model::get_user_model_configs(client, user_id).await?)?
        }
        ModelSubcommand::Show { id } => serde_json::to_value(model::get_model_config(client, id).await?)?,
        ModelSubcommand::Create(persona) => model::create_config(client, &persona.into_form(None)).await?,
        ModelSubcommand::Update { id, persona } => model::update_config(client, &persona.into_form(Some(id))).await?,
        ModelSubcommand::Delete { id, yes } => {
            confirm(&format!("Delete persona {id}?"), yes)?;
            model::delete_model_config(client, id).await?
        }
    };
    print_json(&json)
}

async fn run_api_vector(ctx: &CliContext, cmd: VectorCommand) -> Result<(), CliError> {
    let client = &ctx.client;
    let json = match cmd.command {
        VectorSubcommand::List => serde_json::to_value(vector_db::fetch_own_vectors(client).await?)?,
        VectorSubcommand::Show { id } => serde_json::to_value(vector_db::get_vector_db(client, id).await?)?,
        VectorSubcommand::Connect { id } => Value::Bool(vector_db::test_connect(client, id).await?),
        VectorSubcommand::Query { id, text, n_results } => vector_db::query_vector(client, id, &text, n_results).await?,
        VectorSubcommand::Create(fields) => vector_db::create_vector_db(client, &fields.into()).await?,
        VectorSubcommand::Update { id, fields } => vector_db::update_vector_db(client, id, &fields.into()).await?,
        VectorSubcommand::Upload { id, file } => {
            let bytes = std::fs::read(&file)?;
            vector_db::upload_document(client, id, &file_name_of(&file, "document"), bytes).await?
        }
        VectorSubcommand::Download { id, out } => {
            let bytes = vector_db::download_file(client, id).await?;
            std::fs::write(&out, bytes)?;
            eprintln!("saved {}", out.display());
            return Ok(());
        }
        VectorSubcommand::Delete { id, yes } => {
            confirm(&format!("Delete vector database {id}?"), yes)?;
            vector_db::delete_vector_db(client, id).await?
        }
    };
    print_json(&json)
}

async fn run_api_chat(ctx: &CliContext, cmd: ChatCommand) -> Result<(), CliError> {
    let client = &ctx.client;
    match cmd.command {
        ChatSubcommand::History => {
            for conversation in chat::get_conversations(client).await? {
                let last = conversation
                    .last_message
                    .as_ref()
                    .map_or("", |m| m.content.as_str());
                println!("{:>6}  {:<24} {:>4}  {last}", conversation.info.id, conversation.info.name, conversation.count);
            }
            Ok(())
        }
        ChatSubcommand::Messages { conversation_id } => {
            print_json(&serde_json::to_value(chat::get_messages(client, conversation_id).await?)?)
        }
        ChatSubcommand::Send { content, config, conversation, retry } => {
            let request = chat::ChatRequest { model_config_id: config, conversation_id: conversation, content };
            let reply = if retry {
                chat::rechat(client, request).await?
            } else {
                chat::chat(client, request).await?
            };
            if let Some(id) = reply.conversation_id {
                eprintln!("conversation {id} ({})", reply.conversation_name.as_deref().unwrap_or("untitled"));
            }
            println!("{}", reply.content().unwrap_or_default());
            Ok(())
        }
    }
}

async fn run_api_finetune(ctx: &CliContext, cmd: FinetuneCommand) -> Result<(), CliError> {
    let client = &ctx.client;
    match cmd.command {
        FinetuneSubcommand::List => print_json(&serde_json::to_value(finetuning::fetch_fine_tuned_models(client).await?)?),
        FinetuneSubcommand::Bases => print_json(&serde_json::to_value(finetuning::fetch_base_models(client).await?)?),
        FinetuneSubcommand::Show { id } => {
            print_json(&serde_json::to_value(finetuning::fetch_fine_tuned_model_by_id(client, id).await?)?)
        }
        FinetuneSubcommand::Config { id } => {
            print_json(&finetuning::get_fine_tuned_model_config(client, id).await?)
        }
        FinetuneSubcommand::Start { base_model_id, name, file, describe, epochs, lora } => {
            let job = finetuning::FineTuneJob {
                base_model_id,
                name,
                describe,
                document_name: file_name_of(&file, "dialogue.json"),
                document: std::fs::read(&file)?,
                num_train_epochs: epochs,
                use_lora: lora,
            };
            print_json(&finetuning::start_fine_tuning(client, job).await?)
        }
        FinetuneSubcommand::AddBase { name, path, describe, kind } => {
            let form = finetuning::BaseModelForm { name, path, describe, kind };
            print_json(&finetuning::create_base_model(client, form).await?)
        }
        FinetuneSubcommand::Logs { id, out: Some(out) } => {
            let bytes = finetuning::download_logs(client, id).await?;
            std::fs::write(&out, bytes)?;
            eprintln!("saved {}", out.display());
            Ok(())
        }
        FinetuneSubcommand::Logs { id, out: None } => print_json(&finetuning::get_fine_tune_logs(client, id).await?),
        FinetuneSubcommand::Watch { id, interval_secs, max_polls } => {
            watch_fine_tuning(client, id, Duration::from_secs(interval_secs), max_polls).await
        }
    }
}

async fn run_api_ollama(ctx: &CliContext, cmd: OllamaCommand) -> Result<(), CliError> {
    match cmd.command {
        OllamaSubcommand::Add { model_name, supplier, describe } => {
            let form = finetuning::OllamaModelForm { model_name, supplier, describe };
            print_json(&finetuning::add_ollama_model(&ctx.client, &form).await?)
        }
    }
}

async fn watch_fine_tuning(client: &ApiClient, id: i64, interval: Duration, max_polls: usize) -> Result<(), CliError> {
    let mut tracker = ProgressTracker::new();
    for poll in 0..max_polls {
        if poll > 0 {
            tokio::time::sleep(interval).await;
        }
        let log = finetuning::get_fine_tune_logs(client, id).await?;
        let Some(percent) = percent_from_log(&log) else {
            tracing::debug!(id, "training log carries no progress yet");
            continue;
        };
        let previous = tracker.current(id).map(|p| p.percent);
        tracker.set_progress(id, percent);
        if previous != Some(percent) {
            println!("model {id}: {percent}%");
        }
        if percent >= 100 {
            return Ok(());
        }
    }
    eprintln!("stopped after {max_polls} polls");
    Ok(())
}

// =============================================================================
// OUTPUT
// =============================================================================

fn confirm(prompt: &str, assume_yes: bool) -> Result<(), CliError> {
    if assume_yes {
        return Ok(());
    }
    eprint!("{prompt} [y/N] ");
    io::stderr().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    if is_yes(&answer) { Ok(()) } else { Err(CliError::Aborted) }
}

fn file_name_of(path: &std::path::Path, fallback: &str) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(fallback)
        .to_owned()
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelhub::routes::Location;

    #[test]
    fn cli_parses_navigation() {
        let cli = Cli::try_parse_from(["modelhub", "navigate", "/config", "--from", "/chat"]).unwrap();
        assert_eq!(cli.permission_source, PermissionMode::Remote);
        match cli.command {
            Command::Navigate { path, from } => {
                assert_eq!(path, "/config");
                assert_eq!(from.as_deref(), Some("/chat"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_parses_local_permissions() {
        let cli = Cli::try_parse_from(["modelhub", "--permission-source", "local", "--granted", "config", "routes"]).unwrap();
        assert_eq!(cli.permission_source, PermissionMode::Local);
        assert!(permission_source(cli.permission_source, &cli.granted).is_some());
        assert!(permission_source(PermissionMode::Remote, "").is_none());
    }

    #[test]
    fn outcomes_render_for_humans() {
        let login = GuardOutcome::RedirectLogin { redirect: "/chat".into(), reason: "unauthenticated" };
        assert_eq!(describe_outcome(&login), "redirect to login (unauthenticated, back to /chat)");
        let back = GuardOutcome::RedirectBack { to: Location::new("/history") };
        assert_eq!(describe_outcome(&back), "blocked, stay on /history");
    }

    fn api(args: &[&str]) -> ApiSubcommand {
        let argv: Vec<&str> = ["modelhub", "api"].into_iter().chain(args.iter().copied()).collect();
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Api(api) => api.command,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn persona_create_and_update_build_forms() {
        let ApiSubcommand::Model(ModelCommand { command: ModelSubcommand::Create(persona) }) =
            api(&["model", "create", "tutor", "--base-model", "3", "--private"])
        else {
            panic!("expected persona create");
        };
        let form = persona.into_form(None);
        assert_eq!(form.name, "tutor");
        assert_eq!(form.base_model_id, Some(3));
        assert!(form.is_private);
        assert!((form.temperature - 0.7).abs() < f64::EPSILON);

        let ApiSubcommand::Model(ModelCommand { command: ModelSubcommand::Update { id, persona } }) =
            api(&["model", "update", "5", "tutor", "--top-p", "0.5"])
        else {
            panic!("expected persona update");
        };
        let form = persona.into_form(Some(id));
        assert_eq!(form.id, Some(5));
        assert!((form.top_p - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn vector_create_requires_embedding() {
        assert!(Cli::try_parse_from(["modelhub", "api", "vector", "create", "docs"]).is_err());
        let ApiSubcommand::Vector(VectorCommand { command: VectorSubcommand::Create(fields) }) =
            api(&["vector", "create", "docs", "--embedding", "2", "--similarity", "0.5"])
        else {
            panic!("expected vector create");
        };
        let form = vector_db::VectorDbForm::from(fields);
        assert_eq!(form.embedding_id, 2);
        assert!((form.document_similarity - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn finetune_start_and_ollama_add_parse() {
        match api(&["finetune", "start", "2", "tuned", "data.json", "--epochs", "3", "--lora", "true"]) {
            ApiSubcommand::Finetune(FinetuneCommand {
                command: FinetuneSubcommand::Start { base_model_id, name, file, epochs, lora, .. },
            }) => {
                assert_eq!((base_model_id, name.as_str()), (2, "tuned"));
                assert_eq!(file_name_of(&file, "x"), "data.json");
                assert_eq!((epochs, lora), (Some(3), Some(true)));
            }
            other => panic!("unexpected: {other:?}"),
        }
        match api(&["ollama", "add", "llama3", "--supplier", "meta"]) {
            ApiSubcommand::Ollama(OllamaCommand { command: OllamaSubcommand::Add { model_name, supplier, .. } }) => {
                assert_eq!(model_name, "llama3");
                assert_eq!(supplier.as_deref(), Some("meta"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn only_explicit_yes_confirms() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("no"));
    }
}
