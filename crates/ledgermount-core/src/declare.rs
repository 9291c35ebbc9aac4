//! Declarative mounts
//!
//! Mounts can be declared in the configuration file instead of code:
//!
//! ```toml
//! [[mounts]]
//! host_type = "customer"
//! name = "accounting_contact"
//! remote_type = "xero.contact"
//! external_id_field = "accounting_contact_id"
//! sync_on_save = true
//!
//! [mounts.to_remote]
//! FirstName = "first_name"
//!
//! [mounts.from_remote]
//! first_name = "FirstName"
//! ```
//!
//! Each declaration becomes a [`MountConfig`] whose mappers are rename
//! tables (see [`crate::fieldmap`]).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MountError, Result};
use crate::fieldmap::{field_map_from_remote, field_map_to_remote};
use crate::host::HostRecord;
use crate::registry::{MountConfig, MountRegistry};
use crate::remote::AdapterRegistry;

/// A mount declared in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountDeclaration {
    /// Host type the mount belongs to
    pub host_type: String,
    /// Mount name, unique per host type
    pub name: String,
    /// Remote type, resolved through the adapter registry
    pub remote_type: String,
    /// Host attribute holding the remote id
    pub external_id_field: String,
    /// Host connection method; the global resolver is used when unset
    #[serde(default)]
    pub connection_method: Option<String>,
    /// Outward sync after host saves
    #[serde(default)]
    pub sync_on_save: bool,
    /// Remote field <- host attribute
    #[serde(default)]
    pub to_remote: BTreeMap<String, String>,
    /// Host attribute <- remote field
    #[serde(default)]
    pub from_remote: BTreeMap<String, String>,
}

impl MountDeclaration {
    /// Build the mount configuration, resolving the adapter by remote type
    pub fn to_config<H: HostRecord + 'static>(
        &self,
        adapters: &AdapterRegistry,
    ) -> Result<MountConfig<H>> {
        let adapter = adapters
            .get(&self.remote_type)
            .ok_or_else(|| MountError::UnknownRemoteType(self.remote_type.clone()))?;

        let mut config = MountConfig::new(
            self.name.clone(),
            adapter,
            self.external_id_field.clone(),
            field_map_to_remote(self.to_remote.clone()),
            field_map_from_remote(self.from_remote.clone()),
        )
        .with_sync_on_save(self.sync_on_save);

        if let Some(ref method) = self.connection_method {
            config = config.with_connection_method(method.clone());
        }

        Ok(config)
    }
}

/// Build one registry per host type from declarations
///
/// Declarations are applied in order, so a later declaration with the same
/// host type and name replaces an earlier one.
pub fn build_registries<H: HostRecord + 'static>(
    declarations: &[MountDeclaration],
    adapters: &AdapterRegistry,
) -> Result<BTreeMap<String, MountRegistry<H>>> {
    let mut registries: BTreeMap<String, MountRegistry<H>> = BTreeMap::new();

    for declaration in declarations {
        let config = declaration.to_config(adapters)?;
        let replaced = registries
            .entry(declaration.host_type.clone())
            .or_default()
            .declare(config);

        if replaced.is_some() {
            debug!(
                host_type = %declaration.host_type,
                mount = %declaration.name,
                "Mount redeclared, replacing previous configuration"
            );
        }
    }

    Ok(registries)
}
