//! `quill exec` and `quill check`.

use std::{
    io::Read,
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
};

use {
    anyhow::{Context, Result},
    clap::Args,
    quill_config::QuillConfig,
    quill_graphql::{Engine, EngineOptions, GraphQlRequest, GraphQlResponse},
    quill_store::{MemoryStore, Snapshot},
    tracing::info,
};

#[derive(Args)]
pub struct ExecArgs {
    /// Document file, or `-` for stdin.
    query: PathBuf,

    /// Variables as a JSON object.
    #[arg(long)]
    variables: Option<String>,

    /// Operation to run when the document holds several.
    #[arg(long)]
    operation: Option<String>,

    /// JSON snapshot to seed the store with (overrides `store.seed`).
    #[arg(long)]
    seed: Option<PathBuf>,
}

pub async fn handle_exec(args: ExecArgs, config: &QuillConfig) -> Result<ExitCode> {
    let query = read_document(&args.query)?;
    let store = build_store(args.seed.as_deref().or(config.store.seed.as_deref()))?;
    let engine = Engine::with_options(Arc::new(store), engine_options(config));

    let mut request = GraphQlRequest::new(query);
    if let Some(raw) = args.variables {
        let variables: serde_json::Value =
            serde_json::from_str(&raw).context("--variables is not valid JSON")?;
        anyhow::ensure!(variables.is_object(), "--variables must be a JSON object");
        request = request.variables(variables);
    }
    if let Some(name) = args.operation {
        request = request.operation_name(name);
    }

    let response = engine.execute(request).await;
    print_response(&response)?;
    Ok(if response.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

pub fn handle_check(path: &Path, config: &QuillConfig) -> Result<ExitCode> {
    let query = read_document(path)?;
    // Checking never touches the store.
    let engine = Engine::with_options(Arc::new(MemoryStore::new()), engine_options(config));

    match engine.check(&query) {
        Ok(document) => {
            for summary in engine.summarize(&document) {
                println!(
                    "{}: depth {}",
                    summary.name.as_deref().unwrap_or("anonymous"),
                    summary.depth
                );
            }
            Ok(ExitCode::SUCCESS)
        },
        Err(errors) => {
            print_response(&GraphQlResponse::from_errors(errors))?;
            Ok(ExitCode::FAILURE)
        },
    }
}

fn engine_options(config: &QuillConfig) -> EngineOptions {
    EngineOptions {
        max_depth: config.engine.max_depth,
        concurrent_fields: config.engine.concurrent_fields,
    }
}

fn build_store(seed: Option<&Path>) -> Result<MemoryStore> {
    let Some(path) = seed else {
        return Ok(MemoryStore::new());
    };
    let snapshot =
        Snapshot::load(path).with_context(|| format!("loading seed {}", path.display()))?;
    let store = MemoryStore::from_snapshot(snapshot)
        .with_context(|| format!("applying seed {}", path.display()))?;
    info!(path = %path.display(), "seeded store");
    Ok(store)
}

fn read_document(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut query = String::new();
        std::io::stdin()
            .read_to_string(&mut query)
            .context("reading document from stdin")?;
        return Ok(query);
    }
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn print_response(response: &GraphQlResponse) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn options_follow_config() {
        let mut config = QuillConfig::default();
        config.engine.max_depth = 9;
        config.engine.concurrent_fields = false;
        assert_eq!(engine_options(&config), EngineOptions {
            max_depth: 9,
            concurrent_fields: false,
        });
    }

    #[tokio::test]
    async fn seeded_store_serves_snapshot_rows() {
        let dir = tempfile::tempdir().unwrap();
        let seed = dir.path().join("seed.json");
        std::fs::write(
            &seed,
            r#"{ "users": [{ "id": "0b7e2a4c-2c1f-4d8e-9f3a-5b6c7d8e9f01", "name": "alice", "balance": 1 }] }"#,
        )
        .unwrap();

        let store = build_store(Some(&seed)).unwrap();
        let engine = Engine::new(Arc::new(store));
        let response = engine
            .execute(GraphQlRequest::new("{ users { name } }"))
            .await;
        assert_eq!(
            response.data(),
            &serde_json::json!({ "users": [{ "name": "alice" }] })
        );
    }

    #[test]
    fn missing_seed_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = build_store(Some(&dir.path().join("absent.json")))
            .err()
            .unwrap();
        assert!(err.to_string().contains("absent.json"));
    }
}
