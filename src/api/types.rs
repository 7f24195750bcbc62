//! Request and response shapes exchanged with the control plane.
//!
//! Union payloads (selectors, recipe details, login info) are modelled as
//! externally tagged enums so exactly one variant is ever populated.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Request body wrapper carrying the protocol version.
#[derive(Clone, Debug, Serialize)]
pub(crate) struct Versioned<'a, T> {
    pub(crate) version: &'a str,
    pub(crate) data: T,
}

/// Response body wrapper.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub(crate) data: T,
}

/// Lifecycle status reported for an instance.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum InstanceStatus {
    /// The instance is being provisioned.
    Initializing,
    /// The instance is running.
    Active,
    /// The instance is being torn down.
    Deactivating,
    /// The instance has been terminated.
    Inactive,
    /// A status this client does not recognise.
    #[serde(other)]
    Unknown,
}

impl InstanceStatus {
    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initializing => "Initializing",
            Self::Active => "Active",
            Self::Deactivating => "Deactivating",
            Self::Inactive => "Inactive",
            Self::Unknown => "Unknown",
        }
    }
}

/// Provider metadata attached to an instance.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct ResourceInfo {
    /// Name of the hardware provider.
    #[serde(default)]
    pub provider_name: String,
    /// Instance type identifier.
    #[serde(default)]
    pub instance_type: String,
}

/// Username and password issued for a virtual machine.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct UsernameAndPassword {
    /// Login name.
    pub username: String,
    /// Login password, when the API discloses it.
    #[serde(default)]
    pub password: Option<String>,
}

/// Login information for a virtual machine.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub enum LoginInfo {
    /// Credentials issued as a username/password pair.
    UsernameAndPassword(UsernameAndPassword),
    /// Any other login shape the client does not interpret.
    #[serde(untagged)]
    Other(serde_json::Value),
}

impl LoginInfo {
    /// Returns the username when the login info carries one.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        match self {
            Self::UsernameAndPassword(login) => Some(login.username.as_str()),
            Self::Other(_) => None,
        }
    }
}

/// Virtual machine hosted by an instance.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct VirtualMachine {
    /// Hypervisor identifier of the VM.
    pub vmid: u64,
    /// Name assigned by the platform.
    #[serde(default)]
    pub name: String,
    /// Login information, when issued.
    #[serde(default)]
    pub login_info: Option<LoginInfo>,
    /// Whether the VM accepts connections.
    #[serde(default)]
    pub ready: bool,
}

/// Server-owned view of a rented instance.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct Instance {
    /// Instance identifier.
    pub id: String,
    /// Current lifecycle status.
    pub status: InstanceStatus,
    /// Node hosting the instance.
    #[serde(default)]
    pub node_id: String,
    /// Mode of the hosting node.
    #[serde(default)]
    pub node_mode: String,
    /// Status of the hosting node.
    #[serde(default)]
    pub node_status: String,
    /// Public host address.
    #[serde(default)]
    pub host_address: Option<String>,
    /// Private host address.
    #[serde(default)]
    pub internal_host_address: Option<String>,
    /// Provider metadata.
    #[serde(default)]
    pub resource_info: Option<ResourceInfo>,
    /// Virtual machines hosted by the instance.
    #[serde(default)]
    pub virtual_machines: Vec<VirtualMachine>,
}

impl Instance {
    /// An instance is ready when it is active and at least one VM reports
    /// ready.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.status == InstanceStatus::Active && self.virtual_machines.iter().any(|vm| vm.ready)
    }
}

/// Registered SSH public key.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SshKey {
    /// Server-assigned identifier.
    pub id: String,
    /// Human readable name.
    pub name: String,
    /// Public key material.
    pub public_key: String,
}

#[derive(Clone, Debug, Serialize)]
pub(crate) struct AddSshKeyData<'a> {
    pub(crate) name: &'a str,
    pub(crate) public_key: &'a str,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct AddSshKeyResponse {
    pub(crate) public_key: SshKey,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct SshKeyList {
    #[serde(default)]
    pub(crate) keys: Vec<SshKey>,
}

/// VM-shaped recipe details: where to fetch the image and cloud-init data.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct VmRecipe {
    /// URL of the cloud-init payload.
    #[serde(default)]
    pub cloudinit_url: String,
    /// URL of the base image.
    #[serde(default)]
    pub image_url: String,
}

impl VmRecipe {
    /// True when neither URL is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.cloudinit_url.is_empty() && self.image_url.is_empty()
    }
}

/// Provisioning details attached to a recipe.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub enum RecipeDetails {
    /// Details for provisioning a virtual machine.
    VirtualMachine(VmRecipe),
    /// Details for any other workload kind.
    #[serde(untagged)]
    Other(serde_json::Value),
}

impl RecipeDetails {
    /// Returns the VM shape when present and not empty.
    #[must_use]
    pub fn vm(&self) -> Option<&VmRecipe> {
        match self {
            Self::VirtualMachine(vm) if !vm.is_empty() => Some(vm),
            Self::VirtualMachine(_) | Self::Other(_) => None,
        }
    }
}

/// Single recipe entry.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct Recipe {
    /// Recipe name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Provisioning details.
    pub details: RecipeDetails,
}

/// Group of related recipes.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct RecipeGroup {
    /// Group name.
    pub name: String,
    /// Group description.
    #[serde(default)]
    pub description: Option<String>,
    /// Recipes in the group.
    #[serde(default)]
    pub recipes: Vec<Recipe>,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct RecipeGroupList {
    #[serde(default)]
    pub(crate) groups: Vec<RecipeGroup>,
}

/// Selects instances either by id or by status.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub enum InstancesSelector {
    /// Instances with the given identifiers.
    ById(Vec<String>),
    /// Instances in any of the given statuses.
    ByStatus(Vec<InstanceStatus>),
}

#[derive(Clone, Debug, Serialize)]
pub(crate) struct SelectorData<S> {
    pub(crate) selector: S,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct InstanceList {
    #[serde(default)]
    pub(crate) instances: Vec<Instance>,
}

#[derive(Clone, Debug, Serialize)]
pub(crate) struct InstanceTypeAndLocation<'a> {
    pub(crate) datacenters: Vec<&'a str>,
    pub(crate) instance_type: &'a str,
}

/// Node selector for rent requests.
#[derive(Clone, Debug, Serialize)]
pub(crate) enum NodeSelector<'a> {
    ByInstanceTypeAndLocation(InstanceTypeAndLocation<'a>),
}

/// SSH key selector attached to a VM configuration.
#[derive(Clone, Debug, Serialize)]
pub(crate) enum SshKeySelector<'a> {
    PublicKeys(&'a [String]),
}

#[derive(Clone, Debug, Serialize)]
pub(crate) struct VmConfiguration<'a> {
    pub(crate) cloudinit_url: &'a str,
    pub(crate) image_url: &'a str,
    pub(crate) cloudinit_commands: &'a str,
    pub(crate) ssh_key: SshKeySelector<'a>,
}

#[derive(Clone, Debug, Serialize)]
pub(crate) enum InstanceConfiguration<'a> {
    VirtualMachine(VmConfiguration<'a>),
}

#[derive(Clone, Debug, Serialize)]
pub(crate) struct RentData<'a> {
    pub(crate) selector: NodeSelector<'a>,
    pub(crate) with_public_ip: bool,
    pub(crate) config: InstanceConfiguration<'a>,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct RentResponse {
    #[serde(default)]
    pub(crate) instance_ids: Vec<String>,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub(crate) enum InstanceTypeSelector {
    All,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct IdentityData {
    #[serde(default)]
    pub(crate) email: String,
}

/// Hardware variant of an instance type.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct InstanceVariant {
    /// Variant name.
    pub name: String,
    /// Number of CPUs.
    #[serde(default)]
    pub cpu_count: u32,
    /// Number of GPUs, when the variant has any.
    #[serde(default)]
    pub gpu_count: Option<u32>,
    /// Disk size.
    #[serde(default)]
    pub disk: i64,
    /// DRAM size.
    #[serde(default)]
    pub dram: i64,
    /// Price per hour.
    #[serde(default)]
    pub cost_per_hour: f64,
    /// Node count per datacenter. This is capacity, not availability.
    #[serde(default)]
    pub nodes_per_dc: BTreeMap<String, u32>,
}

/// Instance type offered by the platform.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct InstanceType {
    /// Instance type name.
    pub name: String,
    /// Short brand name.
    #[serde(default)]
    pub brand_short: Option<String>,
    /// Hardware manufacturer.
    #[serde(default)]
    pub manufacturer: Option<String>,
    /// Available variants.
    #[serde(default)]
    pub variants: Vec<InstanceVariant>,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct InstanceTypeList {
    #[serde(default)]
    pub(crate) instance_types: Vec<InstanceType>,
}
