//! Caller-held state of a virtual machine resource.

use crate::api::Instance;

/// Virtual machine as observed on the host instance.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct VirtualMachineInfo {
    /// Hypervisor identifier.
    pub vmid: u64,
    /// Platform-assigned name.
    pub name: String,
    /// Login name, when issued as a username/password pair.
    pub username: Option<String>,
}

/// Tracked state of a rented virtual machine.
///
/// The first group of fields is owned by the caller and only used at
/// creation; the control plane never echoes them, so [`merge`] carries them
/// forward untouched. Everything else is overwritten from each observed
/// snapshot.
///
/// [`merge`]: VirtualMachineState::merge
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct VirtualMachineState {
    /// Recipe name used at creation.
    pub recipe: String,
    /// Datacenter the instance was placed in.
    pub datacenter: String,
    /// Instance type requested.
    pub instance_type: String,
    /// Identifier of the SSH key installed on the VM.
    pub ssh_key_id: String,
    /// Base64-encoded startup commands.
    pub startup_commands: Option<String>,

    /// Instance identifier, set once the rent succeeds.
    pub id: Option<String>,
    /// Last observed status.
    pub status: Option<String>,
    /// Hosting node identifier.
    pub node_id: String,
    /// Hosting node mode.
    pub node_mode: String,
    /// Hosting node status.
    pub node_status: String,
    /// Public address, once assigned.
    pub public_ip: Option<String>,
    /// Private address, once assigned.
    pub private_ip: Option<String>,
    /// Hardware provider name.
    pub provider_name: Option<String>,
    /// Virtual machines hosted by the instance.
    pub virtual_machines: Vec<VirtualMachineInfo>,
}

impl VirtualMachineState {
    /// State for a VM that is yet to be created.
    #[must_use]
    pub fn planned(
        recipe: impl Into<String>,
        datacenter: impl Into<String>,
        instance_type: impl Into<String>,
        ssh_key_id: impl Into<String>,
    ) -> Self {
        Self {
            recipe: recipe.into(),
            datacenter: datacenter.into(),
            instance_type: instance_type.into(),
            ssh_key_id: ssh_key_id.into(),
            ..Self::default()
        }
    }

    /// Attaches base64-encoded startup commands.
    #[must_use]
    pub fn with_startup_commands(mut self, encoded: impl Into<String>) -> Self {
        self.startup_commands = Some(encoded.into());
        self
    }

    /// State for an existing instance known only by id; a read fills in the
    /// server-owned fields.
    #[must_use]
    pub fn imported(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Overwrites the server-owned fields from `instance`.
    ///
    /// Addresses are only replaced when the snapshot carries one.
    pub fn merge(&mut self, instance: &Instance) {
        self.id = Some(instance.id.clone());
        self.status = Some(instance.status.as_str().to_owned());
        self.node_id.clone_from(&instance.node_id);
        self.node_mode.clone_from(&instance.node_mode);
        self.node_status.clone_from(&instance.node_status);
        if let Some(address) = &instance.host_address {
            self.public_ip = Some(address.clone());
        }
        if let Some(address) = &instance.internal_host_address {
            self.private_ip = Some(address.clone());
        }
        if let Some(info) = &instance.resource_info {
            self.provider_name = Some(info.provider_name.clone());
            if !info.instance_type.is_empty() {
                self.instance_type.clone_from(&info.instance_type);
            }
        }
        self.virtual_machines = instance
            .virtual_machines
            .iter()
            .map(|vm| VirtualMachineInfo {
                vmid: vm.vmid,
                name: vm.name.clone(),
                username: vm
                    .login_info
                    .as_ref()
                    .and_then(|login| login.username())
                    .map(str::to_owned),
            })
            .collect();
    }
}
