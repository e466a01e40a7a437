//! Built-in applications registered by the server binary

pub mod accounts;
pub mod system;

pub use accounts::AccountsApp;
pub use system::SystemApp;

use crate::graphql::{AppRegistry, RegistryError};

/// Registry with every built-in application
pub fn default_registry() -> Result<AppRegistry, RegistryError> {
    let mut registry = AppRegistry::new();
    registry.register(SystemApp)?.register(AccountsApp)?;
    Ok(registry)
}
