//! Server configuration commands.

use std::io::Write;

use tracing::warn;

use super::AddServerArgs;
use crate::config::ConfigStore;
use crate::error::Result;

/// Handle `add-server`.
pub fn handle_add(store: &mut ConfigStore, args: AddServerArgs, out: &mut impl Write) -> Result<()> {
    let server = args.into_server_config();
    server.validate()?;
    let name = server.name.clone();

    if let Err(e) = store.add(server) {
        report_save_failure(store, &e, out)?;
    }
    writeln!(out, "Added server '{name}' successfully!")?;
    Ok(())
}

/// Handle `list-servers`.
pub fn handle_list(store: &ConfigStore, out: &mut impl Write) -> Result<()> {
    let names = store.list();
    if names.is_empty() {
        writeln!(out, "No servers configured.")?;
        return Ok(());
    }

    writeln!(out, "Configured servers:")?;
    for name in names {
        let Some(server) = store.get(name) else {
            continue;
        };
        let status = if store.is_default(name) { " (default)" } else { "" };
        writeln!(out, "  • {name} ({}){status}", server.server_type)?;
    }
    Ok(())
}

/// Handle `remove-server`.
pub fn handle_remove(store: &mut ConfigStore, name: &str, out: &mut impl Write) -> Result<()> {
    let removed = match store.remove(name) {
        Ok(removed) => removed,
        Err(e) => {
            report_save_failure(store, &e, out)?;
            true
        }
    };
    if removed {
        writeln!(out, "Removed server '{name}' successfully!")?;
    } else {
        writeln!(out, "Server '{name}' not found.")?;
    }
    Ok(())
}

/// Handle `set-default`.
pub fn handle_set_default(store: &mut ConfigStore, name: &str, out: &mut impl Write) -> Result<()> {
    let updated = match store.set_default(name) {
        Ok(updated) => updated,
        Err(e) => {
            report_save_failure(store, &e, out)?;
            true
        }
    };
    if updated {
        writeln!(out, "Default server set to '{name}'.")?;
    } else {
        writeln!(out, "Server '{name}' not found.")?;
    }
    Ok(())
}

fn report_save_failure(
    store: &ConfigStore,
    error: &crate::error::TesterError,
    out: &mut impl Write,
) -> Result<()> {
    warn!(path = %store.path().display(), error = %error, "failed to save config");
    writeln!(out, "Error saving config: {error}")?;
    Ok(())
}
