use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use prn_gate::{UploadBatch, UploadFile};
use prn_keys::{LayerState, PublicUrls};
use prn_layers::{LayerLink, LayerRepository, VersionView};
use prn_server::{PrnServer, ServerConfig};
use prn_store::FsObjectStore;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    tracing::debug!(
        store = %config.store_root.display(),
        bucket = %config.bucket_name,
        "configuration loaded"
    );
    let format = cli.format;
    let open = || open_repository(&config);
    match cli.command {
        Command::Serve(args) => cmd_serve(config.clone(), args),
        Command::Events => cmd_events(&open()?, format),
        Command::Manifest(args) => cmd_manifest(&open()?, args),
        Command::Layers(args) => cmd_layers(&open()?, args, format),
        Command::Approve(args) => cmd_transition(&open()?, args, LayerState::Pending, format),
        Command::Revert(args) => cmd_transition(&open()?, args, LayerState::Approved, format),
        Command::Upload(args) => cmd_upload(&open()?, args, format),
    }
}

/// Configuration from the optional file, then the environment.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ServerConfig> {
    let config = match path {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ServerConfig::default(),
    };
    Ok(config.apply_env(|name| std::env::var(name).ok())?)
}

pub fn open_repository(config: &ServerConfig) -> anyhow::Result<LayerRepository> {
    let store = FsObjectStore::open(&config.store_root)
        .with_context(|| format!("failed to open store at {}", config.store_root.display()))?;
    let urls = PublicUrls::new(config.bucket_name.clone())
        .with_host_suffix(config.url_host_suffix.clone());
    Ok(LayerRepository::new(Arc::new(store), urls))
}

fn cmd_serve(mut config: ServerConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(PrnServer::new(config).serve())?;
    Ok(())
}

fn cmd_events(repo: &LayerRepository, format: OutputFormat) -> anyhow::Result<()> {
    let events = repo.list_events()?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&events)?);
        return Ok(());
    }
    if events.is_empty() {
        println!("No events.");
    }
    for event in &events {
        println!("{}  {}", event.name.bold(), event.url.dimmed());
    }
    Ok(())
}

fn cmd_manifest(repo: &LayerRepository, args: EventArgs) -> anyhow::Result<()> {
    let manifest = repo.event_manifest(&args.event)?;
    println!("{}", serde_json::to_string_pretty(&manifest)?);
    Ok(())
}

fn cmd_layers(
    repo: &LayerRepository,
    args: LayersArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let state = if args.pending {
        LayerState::Pending
    } else {
        LayerState::Approved
    };
    let versions = repo.list_layers(&args.event, state)?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&versions)?);
        return Ok(());
    }
    if versions.is_empty() {
        println!("No {} layers for {}.", state, args.event.bold());
    }
    for view in &versions {
        print_version(view);
    }
    Ok(())
}

fn print_version(view: &VersionView) {
    println!("{}", view.version.to_string().yellow().bold());
    match &view.metadata_url {
        Some(url) => println!("  metadata: {}", url.dimmed()),
        None => println!("  metadata: {}", "none".red()),
    }
    for layer in &view.layers {
        println!("  {}  {}", layer.name.bold(), layer.url.dimmed());
    }
}

fn cmd_transition(
    repo: &LayerRepository,
    args: VersionArgs,
    from: LayerState,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let moved = match from {
        LayerState::Pending => repo.approve(&args.event, args.version)?,
        LayerState::Approved => repo.revert(&args.event, args.version)?,
    };
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&moved)?);
        return Ok(());
    }
    if moved.is_empty() {
        println!(
            "{} Nothing to move: {} has no {} {}",
            "!".yellow().bold(),
            args.event.bold(),
            from,
            args.version
        );
        return Ok(());
    }
    println!(
        "{} Moved {} {} from {} to {}",
        "✓".green().bold(),
        args.event.bold(),
        args.version.to_string().yellow(),
        from,
        from.other()
    );
    print_links(&moved);
    Ok(())
}

fn print_links(links: &[LayerLink]) {
    for link in links {
        println!("  {}  {}", link.name.bold(), link.url.dimmed());
    }
}

fn cmd_upload(
    repo: &LayerRepository,
    args: UploadArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let batch = UploadBatch {
        metadata: Some(read_upload(&args.metadata)?),
        layers: args
            .layers
            .iter()
            .map(|path| read_upload(path))
            .collect::<anyhow::Result<_>>()?,
    };

    let receipt = match repo.upload_batch(&args.event, &batch) {
        Ok(receipt) => receipt,
        Err(prn_layers::LayerError::Validation(failure)) => {
            for message in failure.messages() {
                eprintln!("{} {}", "✗".red().bold(), message);
            }
            anyhow::bail!("upload rejected");
        }
        Err(e) => return Err(e.into()),
    };

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&receipt)?);
        return Ok(());
    }
    println!(
        "{} Uploaded {} as pending {}",
        "✓".green().bold(),
        args.event.bold(),
        receipt.version.to_string().yellow()
    );
    println!("  metadata: {}", receipt.metadata);
    for layer in &receipt.layers {
        println!("  layer: {layer}");
    }
    Ok(())
}

/// Read a local file as an upload, typing it by extension.
fn read_upload(path: &Path) -> anyhow::Result<UploadFile> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("not a file path: {}", path.display()))?;
    let content =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(UploadFile::new(file_name, content_type_for(file_name), content))
}

fn content_type_for(file_name: &str) -> &'static str {
    match file_name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
        Some(ext) if ext == "csv" => "text/csv",
        Some(ext) if ext == "json" => "application/json",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use prn_keys::Version;

    use super::*;

    fn temp_config(dir: &Path) -> ServerConfig {
        ServerConfig {
            store_root: dir.join("bucket"),
            ..ServerConfig::default()
        }
    }

    #[test]
    fn content_types_follow_extension() {
        assert_eq!(content_type_for("roads.csv"), "text/csv");
        assert_eq!(content_type_for("ROADS.CSV"), "text/csv");
        assert_eq!(content_type_for("layers_metadata.json"), "application/json");
        assert_eq!(content_type_for("roads"), "application/octet-stream");
    }

    #[test]
    fn config_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prn.toml");
        fs::write(&path, "store_root = \"/srv/prn\"\ncommit_id = \"deadbeef\"\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.commit_id, "deadbeef");
    }

    #[test]
    fn missing_config_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn upload_then_approve_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let repo = open_repository(&temp_config(dir.path())).unwrap();

        let metadata = dir.path().join("layers_metadata.json");
        fs::write(
            &metadata,
            r#"{"AOI":"box","created_at":"2017-09-20","layers":[{"file_name":"roads.csv","description":"d","legend":"l"}]}"#,
        )
        .unwrap();
        let layer = dir.path().join("roads.csv");
        fs::write(&layer, "lat,lon\n").unwrap();

        cmd_upload(
            &repo,
            UploadArgs {
                event: "flood".into(),
                metadata,
                layers: vec![layer],
            },
            OutputFormat::Json,
        )
        .unwrap();
        assert_eq!(repo.list_layers("flood", LayerState::Pending).unwrap().len(), 1);

        cmd_transition(
            &repo,
            VersionArgs {
                event: "flood".into(),
                version: Version::new(1),
            },
            LayerState::Pending,
            OutputFormat::Text,
        )
        .unwrap();
        assert!(dir
            .path()
            .join("bucket/events/flood/layers/approved/v1/roads.csv")
            .exists());
    }

    #[test]
    fn rejected_upload_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let repo = open_repository(&temp_config(dir.path())).unwrap();
        let metadata = dir.path().join("layers_metadata.json");
        fs::write(&metadata, "not json").unwrap();
        let layer = dir.path().join("roads.csv");
        fs::write(&layer, "lat,lon\n").unwrap();

        let result = cmd_upload(
            &repo,
            UploadArgs {
                event: "flood".into(),
                metadata,
                layers: vec![layer],
            },
            OutputFormat::Text,
        );
        assert!(result.is_err());
        assert!(repo.list_layers("flood", LayerState::Pending).unwrap().is_empty());
    }
}
