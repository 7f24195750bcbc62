//! Instance rent, terminate, and lookup endpoints.

use reqwest::{Method, StatusCode};
use tracing::{debug, info};

use super::CloudRiftClient;
use super::error::ApiError;
use super::transport::{discard_body, expect_json};
use super::types::{
    Envelope, Instance, InstanceConfiguration, InstanceList, InstanceStatus,
    InstanceTypeAndLocation, InstanceType, InstanceTypeList, InstanceTypeSelector,
    InstancesSelector, NodeSelector, RentData, RentResponse, SelectorData, SshKeySelector,
    Versioned, VmConfiguration,
};
use crate::backend::RentRequest;

const RENT_PATH: &str = "api/v1/instances/rent";
const TERMINATE_PATH: &str = "api/v1/instances/terminate";
const LIST_INSTANCES_PATH: &str = "api/v1/instances/list";
const LIST_INSTANCE_TYPES_PATH: &str = "api/v1/instance-types/list";

impl CloudRiftClient {
    /// Rents a VM instance and returns every instance id the control plane
    /// reports.
    ///
    /// The recipe is resolved through the recipe cache before the request is
    /// sent.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] when the request is incomplete,
    /// [`ApiError::Missing`] when the recipe is unknown, or any transport or
    /// API failure.
    pub async fn rent_instance(&self, request: &RentRequest) -> Result<Vec<String>, ApiError> {
        request.validate()?;
        let recipe = self.find_recipe(&request.recipe).await?;

        let body = Versioned {
            version: self.proto_version(),
            data: RentData {
                selector: NodeSelector::ByInstanceTypeAndLocation(InstanceTypeAndLocation {
                    datacenters: vec![request.datacenter.as_str()],
                    instance_type: &request.instance_type,
                }),
                with_public_ip: true,
                config: InstanceConfiguration::VirtualMachine(VmConfiguration {
                    cloudinit_url: &recipe.cloudinit_url,
                    image_url: &recipe.image_url,
                    cloudinit_commands: request.startup_commands.as_deref().unwrap_or_default(),
                    ssh_key: SshKeySelector::PublicKeys(&request.public_keys),
                }),
            },
        };

        let response: Envelope<RentResponse> = self
            .transport
            .execute(
                Method::POST,
                RENT_PATH,
                Some(&body),
                expect_json("renting instance", StatusCode::OK),
            )
            .await?;
        info!(
            recipe = %request.recipe,
            datacenter = %request.datacenter,
            instance_type = %request.instance_type,
            instance_ids = ?response.data.instance_ids,
            "rent request accepted"
        );
        Ok(response.data.instance_ids)
    }

    /// Marks an instance for teardown.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] when the instance does not exist, or
    /// any other transport or API failure.
    pub async fn terminate_instance(&self, id: &str) -> Result<(), ApiError> {
        let body = Versioned {
            version: self.proto_version(),
            data: SelectorData {
                selector: InstancesSelector::ById(vec![id.to_owned()]),
            },
        };
        self.transport
            .execute(Method::POST, TERMINATE_PATH, Some(&body), discard_body)
            .await?;
        info!(instance_id = %id, "instance marked for termination");
        Ok(())
    }

    async fn list_instances_by(&self, selector: InstancesSelector) -> Result<Vec<Instance>, ApiError> {
        let body = Versioned {
            version: self.proto_version(),
            data: SelectorData { selector },
        };
        let response: Envelope<InstanceList> = self
            .transport
            .execute(
                Method::POST,
                LIST_INSTANCES_PATH,
                Some(&body),
                expect_json("listing instances", StatusCode::OK),
            )
            .await?;
        Ok(response.data.instances)
    }

    /// Lists instances that are initializing, active, or deactivating.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request fails.
    pub async fn list_instances(&self) -> Result<Vec<Instance>, ApiError> {
        self.list_instances_by(InstancesSelector::ByStatus(vec![
            InstanceStatus::Active,
            InstanceStatus::Initializing,
            InstanceStatus::Deactivating,
        ]))
        .await
    }

    /// Fetches a single instance by id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] when the instance is absent or
    /// inactive, or any other transport or API failure.
    pub async fn get_instance(&self, id: &str) -> Result<Instance, ApiError> {
        let instances = self
            .list_instances_by(InstancesSelector::ById(vec![id.to_owned()]))
            .await?;
        let found = instances
            .into_iter()
            .find(|instance| instance.id == id)
            .ok_or(ApiError::NotFound)?;
        if found.status == InstanceStatus::Inactive {
            debug!(instance_id = %id, "instance is inactive");
            return Err(ApiError::NotFound);
        }
        Ok(found)
    }

    /// Lists every instance type with its variants.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request fails.
    pub async fn list_instance_types(&self) -> Result<Vec<InstanceType>, ApiError> {
        let body = Versioned {
            version: self.proto_version(),
            data: SelectorData {
                selector: InstanceTypeSelector::All,
            },
        };
        let response: Envelope<InstanceTypeList> = self
            .transport
            .execute(
                Method::POST,
                LIST_INSTANCE_TYPES_PATH,
                Some(&body),
                expect_json("listing instance types", StatusCode::OK),
            )
            .await?;
        Ok(response.data.instance_types)
    }
}
