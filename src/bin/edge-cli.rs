use std::path::PathBuf;

use axum::http::{header::COOKIE, HeaderMap, HeaderValue};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use storefront_edge::config::load_config;
use storefront_edge::guard::{canonical_path, BackendSessionResolver, GuardPolicy, Role, Session, SessionResolver};
use storefront_edge::http::EdgeRuntime;
use storefront_edge::proxy::build_upstream_client;

#[derive(Parser)]
#[command(name = "edge-cli")]
#[command(about = "Diagnostics for the storefront edge", long_about = None)]
struct Cli {
    /// TOML config file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate the guard for a path without contacting the backend
    Check {
        /// Path to evaluate, optionally with a query string
        #[arg(short, long)]
        path: String,

        /// Role of the simulated session; omit for a signed-out caller
        #[arg(short, long)]
        role: Option<Role>,
    },
    /// Ask the backend who a cookie belongs to
    Session {
        /// Cookie header to send, e.g. "session_token=abc"
        #[arg(long)]
        cookie: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    let output = match cli.command {
        Commands::Check { path, role } => {
            let policy = GuardPolicy::from_config(&config.guard);
            check(&policy, &path, role)
        }
        Commands::Session { cookie } => {
            let client = build_upstream_client()?;
            let runtime = EdgeRuntime::from_config(&config, client.clone());
            let resolver = BackendSessionResolver::new(client);

            let mut headers = HeaderMap::new();
            if let Some(cookie) = cookie {
                headers.insert(COOKIE, HeaderValue::from_str(&cookie)?);
            }

            match resolver.resolve(&runtime.session_endpoint, &headers).await {
                Ok(Some(session)) => json!({
                    "endpoint": runtime.session_endpoint.url,
                    "session": { "id": session.user.id, "role": session.role() },
                }),
                Ok(None) => json!({ "endpoint": runtime.session_endpoint.url, "session": null }),
                Err(e) => json!({
                    "endpoint": runtime.session_endpoint.url,
                    "session": null,
                    "error": e.to_string(),
                }),
            }
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn check(policy: &GuardPolicy, target: &str, role: Option<Role>) -> Value {
    let (raw, query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    };
    let canonical = canonical_path(raw);
    let path: &str = &canonical;
    let session = role.map(|role| Session::new("cli", role));

    if policy.is_excluded(path) {
        return json!({ "path": path, "excluded": true, "decision": "allow" });
    }

    let decision = policy.decide(path, query, session.as_ref());
    json!({
        "path": path,
        "excluded": false,
        "rule": policy.table().first_match(path).map(|r| &r.prefix),
        "decision": decision.label(),
        "location": decision.location(),
    })
}
