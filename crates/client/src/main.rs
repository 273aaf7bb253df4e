//! docpersist CLI entry point.

use anyhow::{bail, Context};
use clap::Parser;
use docpersist_client::cli::{read_document, Cli, Commands, OutputFormat};
use docpersist_client::output::{format_document, format_result, json, pretty};
use docpersist_client::{DocumentClient, RawDocument};
use docpersist_core::storage::Query;
use serde_json::Value;
use tokio::signal;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so command output stays machine readable.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docpersist=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let options = cli.store.to_options().context("Invalid store configuration")?;
    let client = DocumentClient::connect(options)
        .await
        .context("Failed to open document store")?;

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    match cli.command {
        Commands::Insert {
            document,
            document_type,
        } => {
            let document = RawDocument::from_value(read_document(&document)?, document_type.as_deref())?;
            let stored = client.insert(&document, &cancel).await?;
            print_result("Inserted", &stored, cli.format, cli.quiet)?;
        }
        Commands::Get { partition, id } => {
            match client
                .first_or_default::<RawDocument>(id, &partition, &cancel)
                .await?
            {
                Some(document) => {
                    println!("{}", format_document(&serde_json::to_value(document)?, cli.format))
                }
                None => bail!("Document {id} not found in partition {partition}"),
            }
        }
        Commands::Update { document } => {
            let document = RawDocument::from_value(read_document(&document)?, None)?;
            let stored = client.update(&document, &cancel).await?;
            print_result("Updated", &stored, cli.format, cli.quiet)?;
        }
        Commands::Delete {
            partition,
            id,
            ignore_missing,
        } => match client.delete(id, &partition, &cancel).await {
            Ok(()) => {
                if !cli.quiet {
                    println!("Deleted document {}", id);
                }
            }
            Err(err) if ignore_missing && err.is_not_found() => {
                if !cli.quiet {
                    println!("Document {} did not exist", id);
                }
            }
            Err(err) => return Err(err.into()),
        },
        Commands::Query {
            partition,
            query,
            params,
        } => {
            let query = params
                .into_iter()
                .fold(Query::new(query), |query, (name, value)| {
                    query.with_parameter(name, value)
                });

            let stream = client.enumerate::<RawDocument>(&partition, query, &cancel);
            tokio::pin!(stream);

            let mut documents = Vec::new();
            while let Some(document) = stream.next().await {
                let document = serde_json::to_value(document?)?;
                match cli.format {
                    OutputFormat::Json => println!("{}", json::format_json(&document)),
                    OutputFormat::Pretty => documents.push(document),
                }
            }
            if let OutputFormat::Pretty = cli.format {
                println!("{}", pretty::format_documents(&documents));
            }
        }
    }

    Ok(())
}

fn print_result(
    action: &str,
    document: &RawDocument,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let value: Value = serde_json::to_value(document)?;
    println!("{}", format_result(action, &value, format, quiet));
    Ok(())
}

/// Cancel pending store calls on Ctrl+C.
async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if signal::ctrl_c().await.is_ok() {
        tracing::warn!("Interrupted, canceling pending operations");
        cancel.cancel();
    }
}
