use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use refsync_refspec::RefspecPattern;
use refsync_remote::{FileConfigStore, Remote, RemoteConfigStore};
use refsync_transport::Offline;
use refsync_types::Direction;
use serde_json::json;
use tracing::debug;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Command::Refspec(args) => cmd_refspec(args.action, cli.format, &mut out),
        Command::Remote(args) => cmd_remote(args.action, &cli.config, cli.format, &mut out),
    }
}

fn parse_spec(arg: &SpecArg) -> anyhow::Result<RefspecPattern> {
    let direction = if arg.push { Direction::Push } else { Direction::Fetch };
    RefspecPattern::parse(&arg.spec, direction).with_context(|| format!("cannot parse refspec {:?}", arg.spec))
}

fn describe(spec: &RefspecPattern) -> serde_json::Value {
    json!({
        "refspec": spec.to_string(),
        "source": spec.source(),
        "destination": spec.destination(),
        "force": spec.is_forced(),
        "direction": spec.direction(),
        "wildcard": spec.is_wildcard(),
    })
}

fn cmd_refspec(action: RefspecAction, format: OutputFormat, out: &mut impl Write) -> anyhow::Result<()> {
    match action {
        RefspecAction::Show(arg) => {
            let spec = parse_spec(&arg)?;
            match format {
                OutputFormat::Json => writeln!(out, "{}", describe(&spec))?,
                OutputFormat::Text => {
                    writeln!(out, "{}", spec.to_string().bold())?;
                    writeln!(out, "  source:      {}", spec.source().cyan())?;
                    writeln!(out, "  destination: {}", spec.destination().cyan())?;
                    writeln!(out, "  direction:   {}", spec.direction())?;
                    writeln!(out, "  forced:      {}", spec.is_forced())?;
                    writeln!(out, "  wildcard:    {}", spec.is_wildcard())?;
                }
            }
        }
        RefspecAction::Transform { spec, name } => {
            let pattern = parse_spec(&spec)?;
            let mapped = pattern.transform(&name)?;
            write_mapping(out, format, &name, &mapped)?;
        }
        RefspecAction::Rtransform { spec, name } => {
            let pattern = parse_spec(&spec)?;
            let mapped = pattern.reverse_transform(&name)?;
            write_mapping(out, format, &name, &mapped)?;
        }
        RefspecAction::Matches { spec, name } => {
            let pattern = parse_spec(&spec)?;
            let source = pattern.matches_source(&name);
            let destination = pattern.matches_destination(&name);
            match format {
                OutputFormat::Json => writeln!(
                    out,
                    "{}",
                    json!({ "name": name, "source": source, "destination": destination })
                )?,
                OutputFormat::Text => {
                    writeln!(out, "source:      {}", yes_no(source))?;
                    writeln!(out, "destination: {}", yes_no(destination))?;
                }
            }
        }
    }
    Ok(())
}

fn write_mapping(out: &mut impl Write, format: OutputFormat, from: &str, to: &str) -> io::Result<()> {
    match format {
        OutputFormat::Json => writeln!(out, "{}", json!({ "from": from, "to": to })),
        OutputFormat::Text => writeln!(out, "{} → {}", from, to.green()),
    }
}

fn yes_no(value: bool) -> colored::ColoredString {
    if value { "yes".green() } else { "no".red() }
}

fn cmd_remote(
    action: RemoteAction,
    config: &Path,
    format: OutputFormat,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    debug!(config = %config.display(), "opening remote config");
    let store: Arc<dyn RemoteConfigStore> = Arc::new(FileConfigStore::new(config));

    match action {
        RemoteAction::Add { name, url } => {
            let remote = Remote::create(store, &name, &url, Offline)?;
            report(out, format, &remote, format!("{} Added remote {} → {}", "✓".green(), name.bold(), url.blue()))?;
        }
        RemoteAction::List => {
            let names = store.remote_names()?;
            match format {
                OutputFormat::Json => writeln!(out, "{}", json!(names))?,
                OutputFormat::Text if names.is_empty() => writeln!(out, "No remotes configured.")?,
                OutputFormat::Text => {
                    for name in names {
                        writeln!(out, "{name}")?;
                    }
                }
            }
        }
        RemoteAction::Show { name } => {
            let remote = Remote::load(store, &name, Offline)?;
            match format {
                OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&remote.entry())?)?,
                OutputFormat::Text => {
                    writeln!(out, "{}", remote.name().bold())?;
                    writeln!(out, "  url: {}", remote.url().blue())?;
                    for spec in remote.refspecs() {
                        writeln!(out, "  {}: {}", spec.direction(), spec)?;
                    }
                }
            }
        }
        RemoteAction::Rename { old, new } => {
            let mut remote = Remote::load(store, &old, Offline)?;
            remote.rename(&new)?;
            report(out, format, &remote, format!("{} Renamed {} → {}", "✓".green(), old.bold(), new.bold()))?;
        }
        RemoteAction::SetUrl { name, url } => {
            let mut remote = Remote::load(store, &name, Offline)?;
            remote.set_url(&url)?;
            report(out, format, &remote, format!("{} {} now points at {}", "✓".green(), name.bold(), url.blue()))?;
        }
        RemoteAction::SetFetchspec { name, source, destination } => {
            let mut remote = Remote::load(store, &name, Offline)?;
            remote.set_single_fetch_refspec(&source, &destination)?;
            let line = match remote.fetch_refspec() {
                Some(spec) => format!("{} {} fetches {}", "✓".green(), name.bold(), spec.to_string().cyan()),
                None => format!("{} {} updated", "✓".green(), name.bold()),
            };
            report(out, format, &remote, line)?;
        }
        RemoteAction::Remove { name } => {
            if !store.delete_remote(&name)? {
                bail!("no such remote: {name}");
            }
            match format {
                OutputFormat::Json => writeln!(out, "{}", json!({ "removed": name }))?,
                OutputFormat::Text => writeln!(out, "Removed remote {}", name.bold())?,
            }
        }
    }
    Ok(())
}

/// Print the outcome of an edit: the line in text mode, the stored entry in JSON mode.
fn report(out: &mut impl Write, format: OutputFormat, remote: &Remote, line: String) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(&remote.entry())?)?,
        OutputFormat::Text => writeln!(out, "{line}")?,
    }
    Ok(())
}
