use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};

use tutorlens::config::{load_or_init, resolve_api_key, store_api_key, TransportMode};
use tutorlens::logger::Logger;
use tutorlens::render::wrap_result;
use tutorlens::router::{run_router, RouterState};
use tutorlens::{ChatClient, Session};

#[derive(Parser)]
#[command(name = "tutorlens", version, about = "Question analysis assistant and chat proxy")]
struct Cli {
  /// JSON config file, created with defaults when missing.
  #[arg(long, global = true, env = "TUTORLENS_CONFIG", default_value = "config.json")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve static files and proxy /api/chat to the upstream (default).
  Serve {
    #[arg(long)]
    port: Option<u16>,
    #[arg(long)]
    static_dir: Option<String>,
  },
  /// Ask one question and print the rendered answer.
  Ask {
    /// PNG or JPEG with the question in it.
    #[arg(long)]
    image: Option<PathBuf>,
    /// Call the upstream directly instead of the local proxy.
    #[arg(long)]
    direct: bool,
    /// Print the model's Markdown instead of HTML.
    #[arg(long)]
    raw: bool,
    text: Vec<String>,
  },
  /// Store the upstream API key in the OS keyring.
  SetKey { key: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();
  match cli.command.unwrap_or(Command::Serve {
    port: None,
    static_dir: None,
  }) {
    Command::Serve { port, static_dir } => serve(&cli.config, port, static_dir).await,
    Command::Ask {
      image,
      direct,
      raw,
      text,
    } => ask(&cli.config, image, direct, raw, text).await,
    Command::SetKey { key } => {
      store_api_key(&key).map_err(anyhow::Error::msg)?;
      println!("API key stored in keyring");
      Ok(())
    }
  }
}

async fn serve(config_path: &Path, port: Option<u16>, static_dir: Option<String>) -> anyhow::Result<()> {
  let mut config = load_or_init(config_path)
    .with_context(|| format!("loading {}", config_path.display()))?;
  if let Some(port) = port {
    config.port = port;
  }
  if let Some(dir) = static_dir {
    config.static_dir = dir;
  }

  let logger = Arc::new(Logger::new(config.log_path.as_deref().map(Path::new))?);
  let api_key = match resolve_api_key() {
    Ok(key) => Some(key),
    Err(msg) => {
      logger.warn(&format!("{msg} /api/chat will answer 500 until a key is set."));
      None
    }
  };

  let listener = std::net::TcpListener::bind(("127.0.0.1", config.port))
    .with_context(|| format!("binding port {}", config.port))?;
  let port = listener.local_addr()?.port();
  logger.info(&format!(
    "tutorlens listening on http://localhost:{port} (static dir {}, upstream {})",
    config.static_dir, config.upstream_url
  ));

  let state = RouterState {
    started_at: Instant::now(),
    config,
    api_key,
    logger: logger.clone(),
    busy: Arc::new(AtomicBool::new(false)),
  };
  if let Err(err) = run_router(listener, state).await {
    logger.error(&format!("router error: {err}"));
    return Err(err);
  }
  Ok(())
}

async fn ask(
  config_path: &Path,
  image: Option<PathBuf>,
  direct: bool,
  raw: bool,
  text: Vec<String>,
) -> anyhow::Result<()> {
  let mut config = load_or_init(config_path)
    .with_context(|| format!("loading {}", config_path.display()))?;
  if direct {
    config.transport = TransportMode::Direct;
  }

  let client = ChatClient::from_config(&config)?;
  let mut session = Session::new(config);
  if let Some(path) = image {
    session.attach_image_file(&path)?;
  }

  let answer = session.submit(&text.join(" "), &client).await?;
  if raw {
    println!("{}", answer.raw);
  } else {
    println!("{}", wrap_result(&answer.html));
  }
  Ok(())
}
