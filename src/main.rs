use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use facebook_api::transport::Params;
use facebook_api::{Api, ApiConfig, ApiEvent, AuthOptions, Body};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

/// Facebook API CLI - Interface de linha de comando para a API
#[derive(Parser)]
#[command(name = "facebook")]
#[command(version)]
#[command(about = "CLI para autenticação e chamadas à API", long_about = None)]
struct Cli {
    /// URL base da API (ou FACEBOOK_BASE_URL)
    #[arg(long, env = "FACEBOOK_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Access token já obtido (ou FACEBOOK_ACCESS_TOKEN)
    #[arg(short = 't', long, env = "FACEBOOK_ACCESS_TOKEN", global = true)]
    token: Option<String>,

    /// Session id já obtido (ou FACEBOOK_SESSION_ID)
    #[arg(short = 's', long, env = "FACEBOOK_SESSION_ID", global = true)]
    session_id: Option<String>,

    /// Formato de saída (json, pretty)
    #[arg(short = 'o', long, default_value = "pretty", global = true)]
    output: OutputFormat,

    /// Modo verbose para debug
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Comando a executar
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, PartialEq)]
enum OutputFormat {
    Json,
    Pretty,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "pretty" => Ok(OutputFormat::Pretty),
            _ => Err(format!("Formato desconhecido: {}", s)),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Mostra a URL de autorização OAuth2
    AuthorizeUrl,

    /// Troca o authorization code por um access token
    Access {
        /// Code recebido no redirect
        #[arg(short = 'c', long)]
        code: String,
    },

    /// Login direto com usuário e senha
    Login {
        #[arg(short = 'u', long, env = "FACEBOOK_USERNAME")]
        username: Option<String>,

        #[arg(short = 'p', long, env = "FACEBOOK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Abre uma sessão usando o access token
    Session,

    /// Verifica se a sessão está ativa
    Ping,

    /// GET numa rota da API
    Get(CallArgs),

    /// DELETE numa rota da API
    Delete(CallArgs),

    /// POST numa rota da API
    Post(BodyCallArgs),

    /// PUT numa rota da API
    Put(BodyCallArgs),
}

#[derive(Args)]
struct CallArgs {
    /// Rota relativa à URL base
    path: String,

    /// Parâmetros no formato chave=valor
    #[arg(short = 'p', long = "param", value_parser = parse_key_val)]
    params: Vec<(String, String)>,

    /// Não anexa o session id
    #[arg(long)]
    no_auth: bool,

    /// Anexa o access token
    #[arg(long)]
    with_token: bool,
}

#[derive(Args)]
struct BodyCallArgs {
    #[command(flatten)]
    call: CallArgs,

    /// Corpo JSON da requisição
    #[arg(long)]
    json: Option<String>,
}

impl CallArgs {
    fn params(&self) -> Params {
        self.params.iter().cloned().collect()
    }

    fn options(&self) -> AuthOptions {
        AuthOptions::new(!self.no_auth, self.with_token)
    }
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("Parâmetro inválido (esperado chave=valor): {}", s))?;
    Ok((key.to_string(), value.to_string()))
}

/// Resposta padronizada da CLI
#[derive(serde::Serialize)]
struct CliResponse {
    success: bool,
    data: Option<Value>,
    error: Option<String>,
}

impl CliResponse {
    fn success(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn error(msg: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let output_format = cli.output.clone();

    let response = match execute_command(&cli).await {
        Ok(response) => response,
        Err(e) => CliResponse::error(format!("{:#}", e)),
    };

    let exit_code = if response.success { 0 } else { 1 };
    output_response(response, &output_format);
    std::process::exit(exit_code);
}

fn build_api(cli: &Cli) -> Result<Api> {
    let mut config = ApiConfig::load().context("Falha ao carregar configuração")?;

    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url.clone());
    }
    if let Some(token) = &cli.token {
        config = config.with_access_token(token.clone());
    }
    if let Some(session_id) = &cli.session_id {
        config = config.with_session_id(session_id.clone());
    }

    let api = Api::new(config)?.with_listener(|event: &ApiEvent| {
        tracing::info!(event = event.name(), "Evento recebido");
    });

    Ok(api)
}

async fn execute_command(cli: &Cli) -> Result<CliResponse> {
    let mut api = build_api(cli)?;

    let data = match &cli.command {
        Commands::AuthorizeUrl => json!({ "url": api.oauth_authorize()? }),

        Commands::Access { code } => {
            let access_token = api.oauth_access(code).await?;
            json!({ "access_token": access_token })
        }

        Commands::Login { username, password } => {
            let session_id = api.login(username.as_deref(), password.as_deref()).await?;
            session_summary(&api, session_id)
        }

        Commands::Session => {
            let session_id = api.oauth_session().await?;
            session_summary(&api, session_id)
        }

        Commands::Ping => api.ping().await?,

        Commands::Get(args) => {
            let url = api.url(&args.path);
            api.get(&url, args.params(), args.options()).await?
        }

        Commands::Delete(args) => {
            let url = api.url(&args.path);
            api.delete(&url, args.params(), args.options()).await?
        }

        Commands::Post(args) => {
            let url = api.url(&args.call.path);
            let body = parse_body(args.json.as_deref())?;
            api.post(&url, args.call.params(), body, args.call.options()).await?
        }

        Commands::Put(args) => {
            let url = api.url(&args.call.path);
            let body = parse_body(args.json.as_deref())?;
            api.put(&url, args.call.params(), body, args.call.options()).await?
        }
    };

    Ok(CliResponse::success(data))
}

fn session_summary(api: &Api, session_id: String) -> Value {
    json!({
        "session_id": session_id,
        "username": api.username(),
        "tokens": api.tokens(),
    })
}

fn parse_body(raw: Option<&str>) -> Result<Body> {
    match raw {
        Some(raw) => {
            let value: Value = serde_json::from_str(raw)
                .map_err(|e| anyhow!("Corpo JSON inválido: {}", e))?;
            Ok(Body::Json(value))
        }
        None => Ok(Body::Empty),
    }
}

fn output_response(response: CliResponse, format: &OutputFormat) {
    match format {
        OutputFormat::Json => match serde_json::to_string(&response) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("❌ Erro ao serializar resposta: {}", e),
        },
        OutputFormat::Pretty => {
            if response.success {
                if let Some(data) = response.data {
                    println!("✅ Sucesso!");
                    match serde_json::to_string_pretty(&data) {
                        Ok(text) => println!("{}", text),
                        Err(_) => println!("{}", data),
                    }
                }
            } else if let Some(error) = response.error {
                eprintln!("❌ Erro: {}", error);
            }
        }
    }
}
