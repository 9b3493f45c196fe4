use crate::cli::args::*;
use crate::cli::completions::handle_completion_command;
use crate::config::CliConfig;
use crate::gateway::{Gateway, LoginOutcome, Outcome};
use crate::storage::session_store::{SessionStore, StoredSession};
use crate::utils::errors::{GatewayFailure, PvwaError, Result};
use crate::utils::output::OutputFormat;
use crate::utils::paths::expand_home;
use crate::vault::catalog::{self, ENDPOINTS};
use crate::vault::client::{QueryParams, QueryValue, BASE_URL_PARAM};
use crate::vault::credentials::{AuthMechanism, LoginRequest};
use crate::vault::create_http_client;
use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use std::io::{self, Write};

/// Everything a command needs besides its own arguments
struct Context {
    output: OutputFormat,
    json: bool,
    base_url: Option<String>,
    config: CliConfig,
    store: SessionStore,
    gateway: Gateway,
}

pub async fn handle_command(cli: Cli) -> Result<()> {
    // Initialize logging - always to stderr
    if !cli.quiet {
        let log_level = match cli.verbose {
            0 => "pvwa_rs=warn",  // Default: warnings only
            1 => "pvwa_rs=info",  // -v: info level
            2 => "pvwa_rs=debug", // -vv: debug level
            _ => "pvwa_rs=trace", // -vvv+: trace level
        };

        tracing_subscriber::fmt()
            .with_writer(io::stderr)
            .with_env_filter(log_level)
            .init();
    }

    if let Commands::Completion { ref command } = cli.command {
        return handle_completion_command(command);
    }

    let config = CliConfig::load(&expand_home(&cli.config))?;
    let http = create_http_client(config.timeout())
        .map_err(|e| PvwaError::Config(format!("Failed to create HTTP client: {e}")))?;

    let store = SessionStore::default_location()?;
    let mut gateway = Gateway::new(http);
    if let Some(stored) = store.load()? {
        gateway.restore(stored.session, stored.profile);
    }

    let mut ctx = Context {
        output: OutputFormat::new(cli.raw),
        json: cli.json,
        base_url: cli.base_url,
        config,
        store,
        gateway,
    };

    match cli.command {
        Commands::Login {
            username,
            method,
            concurrent_session,
            change_password,
        } => login_command(&mut ctx, username, method, concurrent_session, change_password).await,
        Commands::Logout => logout_command(&mut ctx).await,
        Commands::Status => status_command(&ctx),
        Commands::Endpoints => endpoints_command(&ctx),
        Commands::Call {
            operation,
            args,
            params,
        } => call_command(&ctx, &operation, &args, &params).await,
        Commands::Get { path, params } => get_command(&ctx, &path, &params).await,
        Commands::Completion { .. } => Ok(()),
    }
}

async fn login_command(
    ctx: &mut Context,
    username: Option<String>,
    method: Option<AuthMechanism>,
    concurrent_session: bool,
    change_password: bool,
) -> Result<()> {
    let base_url = ctx
        .base_url
        .clone()
        .or_else(|| ctx.config.base_url.clone())
        .unwrap_or_default();

    let username = match username {
        Some(user) => user,
        None => prompt_line("Username: ")?,
    };

    let password = rpassword::prompt_password("Password: ")
        .map_err(|e| PvwaError::InvalidInput(format!("Failed to read password: {e}")))?;

    let new_password = if change_password {
        Some(
            rpassword::prompt_password("New password: ")
                .map_err(|e| PvwaError::InvalidInput(format!("Failed to read password: {e}")))?,
        )
    } else {
        None
    };

    let request = LoginRequest {
        base_url,
        username,
        password,
        auth_mechanism: Some(method.unwrap_or(ctx.config.auth_method).to_string()),
        allow_concurrent_sessions: Some(concurrent_session || ctx.config.concurrent_session),
        new_password,
    };

    let result = ctx.gateway.login(request).await.cloned();
    if ctx.json {
        let outcome = LoginOutcome::from(result.as_ref().map_err(Clone::clone));
        ctx.output.print_json(&outcome)?;
    }

    let session = result.map_err(PvwaError::from)?;
    ctx.store.save(&StoredSession {
        session: session.clone(),
        profile: ctx.gateway.profile().cloned(),
    })?;

    if !ctx.json {
        println!(
            "Logged in as {} on {} (session expires at {})",
            session.username,
            session.base_url,
            session.expires_at.to_rfc3339()
        );
    }
    Ok(())
}

async fn logout_command(ctx: &mut Context) -> Result<()> {
    if !ctx.gateway.is_authenticated() {
        if ctx.json {
            ctx.output.print_json(&Outcome::from(Ok(())))?;
        } else {
            println!("No active session");
        }
        return Ok(());
    }

    let result = ctx.gateway.logout().await;
    // The local session goes away even when the vault refused the logoff
    ctx.store.clear()?;

    if ctx.json {
        ctx.output.print_json(&Outcome::from(result.clone()))?;
    } else if result.is_ok() {
        println!("Successfully logged out");
    } else {
        eprintln!("Local session cleared, but the vault logoff failed");
    }

    result.map_err(PvwaError::from)
}

fn status_command(ctx: &Context) -> Result<()> {
    let Some(session) = ctx.gateway.session() else {
        if ctx.json {
            ctx.output.print_json(&json!({ "authenticated": false }))?;
        } else {
            println!("No active session");
        }
        return Ok(());
    };

    let now = Utc::now();
    let expired = session.is_expired_at(now);
    let mechanism = ctx
        .gateway
        .profile()
        .map(|profile| profile.auth_mechanism.to_string());

    if ctx.json {
        return ctx.output.print_json(&json!({
            "authenticated": true,
            "username": session.username,
            "baseUrl": session.base_url,
            "authMechanism": mechanism,
            "createdAt": session.created_at,
            "expiresAt": session.expires_at,
            "expired": expired,
        }));
    }

    let state = if expired {
        "expired".to_string()
    } else {
        format!("valid ({} min left)", session.remaining_at(now).num_minutes())
    };

    let mut rows = vec![
        ("User".to_string(), session.username.clone()),
        ("Vault".to_string(), session.base_url.clone()),
    ];
    if let Some(mechanism) = mechanism {
        rows.push(("Method".to_string(), mechanism));
    }
    rows.push(("Created".to_string(), session.created_at.to_rfc3339()));
    rows.push(("Expires".to_string(), session.expires_at.to_rfc3339()));
    rows.push(("Status".to_string(), state));

    ctx.output.print_key_value(&rows);
    Ok(())
}

fn endpoints_command(ctx: &Context) -> Result<()> {
    if ctx.json {
        let listing: Vec<_> = ENDPOINTS
            .iter()
            .map(|endpoint| {
                json!({
                    "name": endpoint.name,
                    "path": endpoint.template,
                    "method": "GET",
                    "description": endpoint.description,
                    "pathParameters": endpoint.path_params(),
                    "queryParameters": endpoint
                        .query
                        .iter()
                        .map(|param| json!({ "name": param.name, "description": param.description }))
                        .collect::<Vec<_>>(),
                })
            })
            .collect();
        return ctx.output.print_json(&listing);
    }

    let table: Vec<Vec<String>> = ENDPOINTS
        .iter()
        .map(|endpoint| {
            vec![
                endpoint.name.to_string(),
                endpoint.template.to_string(),
                endpoint.query_names(),
                endpoint.description.to_string(),
            ]
        })
        .collect();
    ctx.output.print_table(&table);
    Ok(())
}

async fn call_command(
    ctx: &Context,
    operation: &str,
    args: &[String],
    params: &[String],
) -> Result<()> {
    let endpoint = catalog::find(operation).ok_or_else(|| {
        PvwaError::InvalidInput(format!(
            "Unknown operation '{operation}'. Use 'pvwa-rs endpoints' to list operations."
        ))
    })?;

    let path_args = args
        .iter()
        .map(|raw| parse_pair(raw))
        .collect::<Result<HashMap<_, _>>>()?;
    let logical_path = endpoint.resolve(&path_args)?;

    forward_and_print(ctx, &logical_path, params).await
}

async fn get_command(ctx: &Context, path: &str, params: &[String]) -> Result<()> {
    let logical_path: Vec<String> = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect();

    forward_and_print(ctx, &logical_path, params).await
}

async fn forward_and_print(ctx: &Context, logical_path: &[String], params: &[String]) -> Result<()> {
    let mut query = parse_query_params(params)?;
    if let Some(base_url) = &ctx.base_url {
        query
            .entry(BASE_URL_PARAM.to_string())
            .or_insert_with(|| QueryValue::Text(base_url.clone()));
    }

    let result = ctx.gateway.forward(logical_path, &query).await;

    if ctx.json {
        ctx.output.print_json(&Outcome::from(result.clone()))?;
        return result.map(|_| ()).map_err(PvwaError::from);
    }

    match result {
        Ok(data) => ctx.output.print_json(&data),
        Err(failure) => {
            print_failure_details(&failure);
            Err(failure.into())
        }
    }
}

fn print_failure_details(failure: &GatewayFailure) {
    if let Some(status) = failure.http_status {
        eprintln!("HTTP status: {status}");
    }
    if let Some(details) = &failure.details {
        eprintln!("Details: {details}");
    }
}

/// Split `key=value`; the key must not be empty
fn parse_pair(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(PvwaError::InvalidInput(format!(
            "Expected KEY=VALUE, got '{raw}'"
        ))),
    }
}

fn parse_query_params(raw: &[String]) -> Result<QueryParams> {
    raw.iter()
        .map(|pair| {
            let (key, value) = parse_pair(pair)?;
            Ok((key, QueryValue::infer(&value)))
        })
        .collect()
}

fn prompt_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
