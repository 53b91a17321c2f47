use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use hotconf_config::{
    Configuration, ConfigurationProperty, ConfigurationSource, NameForm, Property, Workspace,
};
use hotconf_host::{lookup, MemorySource};
use hotconf_resolve::{EnvSymbolResolver, VariableResolver};
use serde_json::{json, Map, Value};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, Kind, SourceArgs};
use crate::env;

/// Runs the `hotconf` command line.
pub fn run() -> Result<()> {
    let filter = env::log_filter()
        .map(EnvFilter::new)
        .unwrap_or_else(EnvFilter::from_default_env);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = match cli.command {
        Commands::Show { source, group } => show(&source, group)?,
        Commands::Get { source, name } => get(&source, &name)?,
        Commands::Keys { source, short } => keys(&source, short)?,
    };
    println!("{output}");
    Ok(())
}

/// Host loaded with user and workspace settings.
struct Loaded {
    source: Arc<MemorySource>,
    workspace: Workspace,
}

fn load(args: &SourceArgs) -> Result<Loaded> {
    let root = match &args.workspace {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("failed to read current directory")?,
    };
    let workspace = Workspace::from_root(root);
    let source = Arc::new(MemorySource::new());

    let user_file = args.settings.clone().or_else(env::default_settings_path);
    if let Some(path) = user_file {
        source
            .load_file(None, &path)
            .with_context(|| format!("failed to load user settings {}", path.display()))?;
    }
    if let Some(path) = env::workspace_settings_path(workspace.root()) {
        source
            .load_file(Some(&workspace), &path)
            .with_context(|| format!("failed to load workspace settings {}", path.display()))?;
    }

    tracing::debug!(
        target: "hotconf::cli",
        workspace = %workspace,
        section = %args.section,
        "Loaded settings"
    );
    Ok(Loaded { source, workspace })
}

/// Names defined under `section` in `document`, flat or nested.
fn names_in(document: &Map<String, Value>, section: &str, out: &mut BTreeSet<String>) {
    let prefix = format!("{section}.");
    out.extend(
        document
            .keys()
            .filter_map(|key| key.strip_prefix(&prefix))
            .map(str::to_string),
    );
    if let Some(Value::Object(nested)) = lookup(document, section) {
        out.extend(nested.keys().cloned());
    }
}

/// A registry with one live property per setting found in the section.
fn registry(loaded: &Loaded, args: &SourceArgs) -> Result<Configuration<Kind>> {
    let mut names = BTreeSet::new();
    names_in(&loaded.source.document(None), &args.section, &mut names);
    names_in(
        &loaded.source.document(Some(&loaded.workspace)),
        &args.section,
        &mut names,
    );
    names.extend(args.required.iter().cloned());

    let variables: VariableResolver = args.vars.iter().cloned().collect();
    let mut builder = Configuration::builder(args.section.clone(), loaded.workspace.clone())
        .resolver(EnvSymbolResolver::new())
        .resolver(variables);

    for name in names {
        let key = format!("{}.{}", args.section, name);
        let kind = loaded
            .source
            .get(Some(&loaded.workspace), &key)
            .map_or(Kind::Null, |value| Kind::of(&value));
        let mut property = ConfigurationProperty::<Kind, Value>::new(name.clone(), kind).uncached();
        if args.required.contains(&name) {
            property = property.with_validator(|value| value.is_some());
        }
        builder = builder.property(property);
    }

    let source: Arc<dyn ConfigurationSource> = loaded.source.clone();
    Ok(builder.build(source, loaded.source.changes())?)
}

fn show(args: &SourceArgs, group: Option<Kind>) -> Result<String> {
    let loaded = load(args)?;
    let config = registry(&loaded, args)?;

    let mut entries = Map::new();
    for property in config.get_properties(group.as_ref()) {
        let value = config.get_resolved_json(property.name())?;
        entries.insert(
            property.name().to_string(),
            json!({
                "key": config.get_qualified_name(property.as_ref(), NameForm::Long),
                "kind": property.group().to_string(),
                "value": value.unwrap_or(Value::Null),
                "valid": property.is_valid(),
            }),
        );
    }

    for property in config.get_properties(None) {
        if !property.is_valid() {
            tracing::warn!(target: "hotconf::cli", name = %property.name(), "Required setting is missing");
        }
    }
    Ok(serde_json::to_string_pretty(&Value::Object(entries))?)
}

fn get(args: &SourceArgs, name: &str) -> Result<String> {
    let loaded = load(args)?;
    let config = registry(&loaded, args)?;
    let value = config
        .get_resolved_json(name)
        .with_context(|| format!("'{}.{}' is not set", args.section, name))?;
    Ok(serde_json::to_string_pretty(&value.unwrap_or(Value::Null))?)
}

fn keys(args: &SourceArgs, short: bool) -> Result<String> {
    let loaded = load(args)?;
    let config = registry(&loaded, args)?;
    let form = if short { NameForm::Short } else { NameForm::Long };
    let names: Vec<String> = config
        .get_properties(None)
        .iter()
        .map(|p| config.get_qualified_name(p.as_ref(), form))
        .collect();
    Ok(names.join("\n"))
}
