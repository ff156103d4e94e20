//! CLI for jsonroute: render route documentation, check a request against a
//! route specification, or serve it with an echo handler.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use jsonroute_rs::{
    Application, CoreError, HandlerResultExt, Parameters, PipelineConfig, Response,
    RouteSpecification, ServerConfig,
};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jsonroute")]
#[command(about = "JSON API routes with body validation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print Markdown documentation for a route specification.
    Docs {
        /// Route specification file (JSON object of named routes)
        #[arg(long)]
        spec: PathBuf,
        #[arg(long, default_value = "API")]
        title: String,
    },
    /// Match one request and print the resolved parameters or the error.
    Check {
        #[arg(long)]
        spec: PathBuf,
        #[arg(long, default_value = "GET")]
        method: String,
        /// Request target, query string allowed (e.g. /api/users?page=2)
        #[arg(long)]
        path: String,
        /// Raw request body
        #[arg(long, default_value = "")]
        body: String,
        /// Read the body from a file instead
        #[arg(long, conflicts_with = "body")]
        body_file: Option<PathBuf>,
    },
    /// Serve the specification; every route echoes its resolved parameters.
    Serve {
        #[arg(long)]
        spec: PathBuf,
        /// Defaults to $HOST or 127.0.0.1
        #[arg(long)]
        host: Option<String>,
        /// Defaults to $PORT or 8000
        #[arg(long)]
        port: Option<u16>,
        #[arg(long, default_value = "API")]
        title: String,
    },
}

fn echo(params: &Parameters) -> Result<Value, CoreError> {
    Ok(Value::Object(params.clone()))
}

/// Application with the specification's routes, each answered by [`echo`].
fn echo_application(spec_path: &Path) -> Result<Application, CoreError> {
    let specification = RouteSpecification::from_file(spec_path)
        .context(&format!("loading {}", spec_path.display()))?;
    let mut app = Application::with_config(PipelineConfig::from_env()?);
    app.add_routes_by_specification(&specification)?;
    let mut targets = Vec::new();
    for (_, route) in app.core().routes.routes() {
        for method in route.methods() {
            if let Some(action) = route.action_for(method) {
                targets.push((route.presenter().to_string(), action.to_string()));
            }
        }
    }
    for (presenter, action) in targets {
        app.handle(&presenter, &action, Box::new(echo));
    }
    Ok(app)
}

fn run_docs(spec: &Path, title: &str) -> Result<(), CoreError> {
    let specification = RouteSpecification::from_file(spec)
        .context(&format!("loading {}", spec.display()))?;
    let mut app = Application::new();
    app.add_routes_by_specification(&specification)?;
    print!("{}", app.documentation(title).render());
    Ok(())
}

fn run_check(spec: &Path, method: &str, target: &str, body: &str) -> Result<(), CoreError> {
    let app = echo_application(spec)?;
    let response = app
        .handle_request(method, target, body.as_bytes())
        .unwrap_or_else(|e| Response::from_error(&e));
    let payload = response.json_body()?;
    println!("{}", response.status_code);
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn run_serve(
    spec: &Path,
    host: Option<String>,
    port: Option<u16>,
    title: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = echo_application(spec)?;
    let mut config = ServerConfig::from_env("127.0.0.1", 8000);
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    tracing::info!(spec = %spec.display(), routes = app.core().routes.len(), "serving");
    app.run(&config, title)
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Docs { spec, title } => run_docs(&spec, &title)?,
        Commands::Check {
            spec,
            method,
            path,
            body,
            body_file,
        } => {
            let body = match body_file {
                Some(file) => fs::read_to_string(&file)?,
                None => body,
            };
            run_check(&spec, &method, &path, &body)?
        }
        Commands::Serve {
            spec,
            host,
            port,
            title,
        } => run_serve(&spec, host, port, &title)?,
    }
    Ok(())
}
