use std::path::Path;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use vidshelf_db::{ConfigCategory, ConfigType, Stores, WriteMode};

use crate::CliError;

fn write_mode(keep_existing: bool) -> WriteMode {
    if keep_existing {
        WriteMode::InsertIfAbsent
    } else {
        WriteMode::Upsert
    }
}

pub(crate) fn run_config_get(stores: &Stores, key: &str) -> Result<(), CliError> {
    let value = stores
        .config
        .session()?
        .get(key)?
        .ok_or_else(|| CliError::not_found(format!("config key '{}'", key)))?;
    log::info!("{}", value);
    Ok(())
}

pub(crate) fn run_config_set(
    stores: &Stores,
    key: &str,
    value: &str,
    config_type: ConfigType,
    category: ConfigCategory,
    description: &str,
    keep_existing: bool,
) -> Result<(), CliError> {
    let written = stores.config.session()?.set(
        key,
        value,
        config_type,
        category,
        description,
        write_mode(keep_existing),
    )?;

    if written {
        log::info!(
            "{} {} = {}",
            "Set".if_supports_color(Stdout, |t| t.green()),
            key.if_supports_color(Stdout, |t| t.bold()),
            value,
        );
    } else {
        log::info!(
            "{} {} already exists, left unchanged",
            "Kept".if_supports_color(Stdout, |t| t.yellow()),
            key.if_supports_color(Stdout, |t| t.bold()),
        );
    }
    Ok(())
}

pub(crate) fn run_config_list(
    stores: &Stores,
    category: Option<ConfigCategory>,
) -> Result<(), CliError> {
    let entries = stores.config.session()?.get_all()?;

    let categories: Vec<ConfigCategory> = match category {
        Some(c) => vec![c],
        None => ConfigCategory::ALL.to_vec(),
    };

    let mut printed = false;
    for category in &categories {
        let mut in_category = entries
            .iter()
            .filter(|(_, e)| e.category == *category)
            .peekable();
        if in_category.peek().is_none() {
            continue;
        }
        if printed {
            crate::log_blank();
        }
        printed = true;

        log::info!(
            "{}",
            format!("[{}]", category).if_supports_color(Stdout, |t| t.bold()),
        );
        for (key, entry) in in_category {
            let description = if entry.description.is_empty() {
                String::new()
            } else {
                format!("  {}", entry.description)
            };
            log::info!(
                "  {:<20} = {:<24} {}{}",
                key,
                entry.value.to_string(),
                format!("({})", entry.config_type).if_supports_color(Stdout, |t| t.dimmed()),
                description.if_supports_color(Stdout, |t| t.dimmed()),
            );
        }
    }
    Ok(())
}

pub(crate) fn run_config_delete(stores: &Stores, key: &str) -> Result<(), CliError> {
    if stores.config.session()?.delete(key)? {
        log::info!("Deleted {}", key.if_supports_color(Stdout, |t| t.bold()));
    } else {
        log::warn!("No config key '{}'", key);
    }
    Ok(())
}

pub(crate) fn run_config_export(stores: &Stores, file: &Path) -> Result<(), CliError> {
    let count = stores.config.session()?.export_config(file)?;
    log::info!(
        "Exported {} entries to {}",
        count,
        file.display().if_supports_color(Stdout, |t| t.cyan()),
    );
    Ok(())
}

pub(crate) fn run_config_import(
    stores: &Stores,
    file: &Path,
    keep_existing: bool,
) -> Result<(), CliError> {
    let report = stores
        .config
        .session()?
        .import_config(file, write_mode(keep_existing))?;

    log::info!(
        "Imported {} from {}",
        format!("{} entries", report.written).if_supports_color(Stdout, |t| t.green()),
        file.display().if_supports_color(Stdout, |t| t.cyan()),
    );
    if report.skipped > 0 {
        log::info!("  {} existing entries kept", report.skipped);
    }
    for failure in &report.failures {
        log::warn!("  {}: {}", failure.key, failure.reason);
    }
    Ok(())
}

/// Print where the database and the settings file live.
pub(crate) fn run_config_path(db_path: &Path) {
    let settings = vidshelf_db::settings::settings_path();
    let exists = |p: &Path| {
        if p.exists() {
            "(exists)".if_supports_color(Stdout, |t| t.green()).to_string()
        } else {
            "(not found)".if_supports_color(Stdout, |t| t.dimmed()).to_string()
        }
    };

    log::info!(
        "  Database: {} {}",
        db_path.display().if_supports_color(Stdout, |t| t.cyan()),
        exists(db_path),
    );
    log::info!(
        "  Settings: {} {}",
        settings.display().if_supports_color(Stdout, |t| t.cyan()),
        exists(&settings),
    );
}
