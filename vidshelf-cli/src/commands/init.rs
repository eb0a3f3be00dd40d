use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use vidshelf_db::Stores;

use crate::CliError;

/// Opening the stores already created the tables and seeded defaults; this
/// reports what is there.
pub(crate) fn run_init(stores: &Stores) -> Result<(), CliError> {
    let entries = stores.config.session()?.get_all()?;

    log::info!(
        "{} {}",
        "Database ready:".if_supports_color(Stdout, |t| t.green()),
        stores.pool.path().display(),
    );
    log::info!("  Config entries: {:>4}", entries.len());
    log::info!(
        "  Connections:    {:>4} (max {})",
        stores.pool.current_size(),
        stores.pool.config().max_connections,
    );
    Ok(())
}
