use crate::cli::{Cli, Command};
use anyhow::Context;
use cfgvault_core::{ConfigProvider, Mode, ProviderOptions};
use directories::ProjectDirs;
use std::io::Write;

/// Options file (or per-user directories), then `CFGVAULT_*` variables,
/// then flags.
pub fn resolve_options(cli: &Cli) -> anyhow::Result<ProviderOptions> {
    let mut options = match &cli.options {
        Some(path) => ProviderOptions::from_json_file(path)?,
        None => default_options(),
    }
    .with_env();

    if let Some(profile) = &cli.profile {
        options.profile_path = profile.clone();
        options.local_profile_path = profile.clone();
    }
    if let Some(local) = &cli.local_profile {
        options.local_profile_path = local.clone();
    }
    if let Some(template) = &cli.template {
        options.template_path = Some(template.clone());
    }
    if cli.read_only {
        options.read_only = true;
    }
    Ok(options)
}

fn default_options() -> ProviderOptions {
    match ProjectDirs::from("", "", "cfgvault") {
        Some(dirs) => ProviderOptions {
            profile_path: dirs.config_dir().to_path_buf(),
            local_profile_path: dirs.data_local_dir().to_path_buf(),
            ..ProviderOptions::default()
        },
        None => {
            tracing::warn!("No home directory, using the current directory as profile");
            ProviderOptions::default()
        }
    }
}

/// Run one command. Whatever the provider noticed while opening is written
/// to `diagnostics`, also when the command itself fails.
pub fn run(cli: &Cli, diagnostics: &mut dyn Write) -> anyhow::Result<()> {
    let options = resolve_options(cli)?;
    tracing::debug!(?options, "Resolved provider options");

    match &cli.command {
        Command::Export { file } => {
            let provider = open(options, Mode::Export)?;
            let result = provider.export(file);
            report(&provider, diagnostics)?;
            result
        }
        Command::Import { file } => {
            let provider = open(options, Mode::Import)?;
            let result = provider.import(file);
            report(&provider, diagnostics)?;
            result
        }
        Command::ClearCache => ConfigProvider::clear_plugin_cache(&options).with_context(|| {
            format!("clearing plugin cache in {}", options.local_profile_path.display())
        }),
    }
}

fn open(options: ProviderOptions, mode: Mode) -> anyhow::Result<ConfigProvider> {
    let profile = options.profile_path.clone();
    ConfigProvider::open(options, mode).with_context(|| format!("opening profile {}", profile.display()))
}

fn report(provider: &ConfigProvider, diagnostics: &mut dyn Write) -> anyhow::Result<()> {
    for line in provider.problems() {
        writeln!(diagnostics, "{}", line)?;
    }
    Ok(())
}
