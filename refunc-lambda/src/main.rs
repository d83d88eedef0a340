use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use refunc_config::Environment;
use refunc_config::shared::RefuncConfig;
use refunc_lambda::config::load_refunc_config;
use refunc_lambda::funcdef::FunctionDefinition;
use refunc_lambda::k8s::K8sError;
use refunc_lambda::services::{AwsEnvironment, build_service_url_resolver};
use refunc_lambda::startup::{Application, InvokeError, InvokeOptions};
use refunc_telemetry::tracing::init_tracing_with_environment_name;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// Manage and invoke refunc function definitions.
#[derive(Debug, Parser)]
#[command(name = "refunc-lambda", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print a function definition.
    Get { namespace: String, name: String },
    /// List the function definitions of a namespace.
    List {
        namespace: String,
        #[arg(short = 'l', long = "selector", default_value = "")]
        label_selector: String,
    },
    /// Create or update the function definition stored in a JSON file.
    Apply { file: PathBuf },
    /// Delete a function definition.
    Delete { namespace: String, name: String },
    /// Invoke a function with a JSON event.
    Invoke {
        namespace: String,
        name: String,
        /// File holding the event, `{}` when omitted.
        #[arg(long)]
        payload: Option<PathBuf>,
        /// Return without waiting for the function to finish.
        #[arg(long = "async")]
        asynchronous: bool,
        #[arg(long)]
        executor: Option<String>,
        /// Environment variable handed to the function, as KEY=VALUE.
        #[arg(short = 'e', long = "env", value_parser = parse_env_var)]
        envvars: Vec<(String, String)>,
    },
    /// Print the URL a service resolves to.
    Url { service: String },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_refunc_config()?;

    let environment_name = AwsEnvironment::from_config(&config).name;
    let _log_flusher =
        init_tracing_with_environment_name(env!("CARGO_BIN_NAME"), Some(environment_name))?;

    let _sentry_guard = init_sentry(&config)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(cli, config))?;

    Ok(())
}

async fn async_main(cli: Cli, config: RefuncConfig) -> anyhow::Result<()> {
    if let Err(err) = run(cli, config).await {
        let source: &(dyn std::error::Error + 'static) = err.as_ref();
        sentry::capture_error(source);
        if is_transport_failure(&err) {
            error!("failed to reach the kubernetes api server: {err:#}");
        } else {
            error!("an error occurred in refunc-lambda: {err:#}");
        }

        return Err(err);
    }

    Ok(())
}

async fn run(cli: Cli, config: RefuncConfig) -> anyhow::Result<()> {
    match cli.command {
        Command::Get { namespace, name } => {
            let application = connect(config).await?;
            print_json(&application.funcdefs().get(&namespace, &name).await?)?;
        }
        Command::List {
            namespace,
            label_selector,
        } => {
            let application = connect(config).await?;
            print_json(&application.funcdefs().list(&namespace, &label_selector).await?)?;
        }
        Command::Apply { file } => {
            let content = tokio::fs::read(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let funcdef: FunctionDefinition = serde_json::from_slice(&content)?;

            let application = connect(config).await?;
            print_json(&application.funcdefs().ensure(&funcdef).await?)?;
        }
        Command::Delete { namespace, name } => {
            let application = connect(config).await?;
            application.funcdefs().delete(&namespace, &name).await?;
            info!(%namespace, %name, "function definition deleted");
        }
        Command::Invoke {
            namespace,
            name,
            payload,
            asynchronous,
            executor,
            envvars,
        } => {
            let event = match payload {
                Some(path) => serde_json::from_slice(
                    &tokio::fs::read(&path)
                        .await
                        .with_context(|| format!("failed to read {}", path.display()))?,
                )?,
                None => Value::Object(Default::default()),
            };
            let options = InvokeOptions {
                envvars: envvars.into_iter().collect(),
                asynchronous,
                executor,
            };

            let application = connect(config).await?;
            let result = application
                .invoke(&namespace, &name, &event, options)
                .await?;
            eprint!("{}", result.log_output);
            println!("{}", result.result);
        }
        // Resolution is local, no cluster access needed.
        Command::Url { service } => {
            let url = build_service_url_resolver(&config)
                .service_url(&service)
                .ok_or_else(|| anyhow!("unknown service: {service}"))?;
            println!("{url}");
        }
    }

    Ok(())
}

/// Builds the [`Application`] and starts its executors.
async fn connect(config: RefuncConfig) -> anyhow::Result<Application> {
    let application = Application::build(config).await?;
    application.executors().startup().await?;

    Ok(application)
}

/// Whether `err` comes from talking to the cluster rather than from the request itself.
fn is_transport_failure(err: &anyhow::Error) -> bool {
    let k8s_err = match err.downcast_ref::<InvokeError>() {
        Some(InvokeError::K8s(k8s_err)) => Some(k8s_err),
        Some(_) => None,
        None => err.downcast_ref::<K8sError>(),
    };

    k8s_err.is_some_and(K8sError::is_transport)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);

    Ok(())
}

fn parse_env_var(value: &str) -> Result<(String, String), String> {
    value
        .split_once('=')
        .map(|(key, value)| (key.to_owned(), value.to_owned()))
        .ok_or_else(|| format!("expected KEY=VALUE, got `{value}`"))
}

/// Initializes Sentry when a DSN is configured.
fn init_sentry(config: &RefuncConfig) -> anyhow::Result<Option<sentry::ClientInitGuard>> {
    let Some(sentry_config) = &config.sentry else {
        info!("sentry not configured for refunc-lambda, skipping initialization");
        return Ok(None);
    };

    info!("initializing sentry with supplied dsn");

    let environment = Environment::load()?;
    let guard = sentry::init(sentry::ClientOptions {
        dsn: Some(sentry_config.dsn.parse()?),
        environment: Some(environment.to_string().into()),
        integrations: vec![Arc::new(
            sentry::integrations::panic::PanicIntegration::new(),
        )],
        ..Default::default()
    });

    sentry::configure_scope(|scope| {
        scope.set_tag("service", "refunc-lambda");
    });

    Ok(Some(guard))
}
