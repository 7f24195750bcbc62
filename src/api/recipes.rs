//! Recipe listing and the VM recipe cache.

use std::collections::HashMap;

use reqwest::{Method, StatusCode};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use super::CloudRiftClient;
use super::error::{ApiError, ResourceKind};
use super::transport::expect_json;
use super::types::{Envelope, RecipeGroup, RecipeGroupList, Versioned, VmRecipe};

const LIST_RECIPES_PATH: &str = "api/v1/recipes/list";

#[derive(Debug, Default)]
struct Snapshot {
    generation: u64,
    entries: HashMap<String, VmRecipe>,
}

/// Case-folded mapping from recipe name to VM details.
///
/// Lookups read the current snapshot and never wait for the network. Misses
/// serialise on a refresh gate; a miss that finds the generation advanced
/// while it waited reuses that refresh instead of issuing its own.
#[derive(Debug, Default)]
pub struct RecipeCache {
    snapshot: RwLock<Snapshot>,
    refresh_gate: Mutex<()>,
}

impl RecipeCache {
    /// Number of cached VM recipes.
    pub async fn len(&self) -> usize {
        self.snapshot.read().await.entries.len()
    }

    /// True when no VM recipe is cached.
    pub async fn is_empty(&self) -> bool {
        self.snapshot.read().await.entries.is_empty()
    }

    /// Returns the cached entry for `name`, case-insensitively.
    pub async fn get(&self, name: &str) -> Option<VmRecipe> {
        self.snapshot.read().await.entries.get(&normalise(name)).cloned()
    }

    /// Number of completed refreshes.
    pub async fn generation(&self) -> u64 {
        self.snapshot.read().await.generation
    }

    async fn lookup(&self, key: &str) -> (Option<VmRecipe>, u64) {
        let snapshot = self.snapshot.read().await;
        (snapshot.entries.get(key).cloned(), snapshot.generation)
    }

    async fn replace(&self, entries: HashMap<String, VmRecipe>) {
        let mut snapshot = self.snapshot.write().await;
        snapshot.entries = entries;
        snapshot.generation = snapshot.generation.saturating_add(1);
        info!(
            recipes = snapshot.entries.len(),
            generation = snapshot.generation,
            "refreshed VM recipe cache"
        );
    }
}

fn normalise(name: &str) -> String {
    name.trim().to_lowercase()
}

fn vm_recipes(groups: &[RecipeGroup]) -> HashMap<String, VmRecipe> {
    groups
        .iter()
        .flat_map(|group| group.recipes.iter())
        .filter_map(|recipe| {
            recipe
                .details
                .vm()
                .map(|vm| (normalise(&recipe.name), vm.clone()))
        })
        .collect()
}

impl CloudRiftClient {
    /// Lists every recipe group.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request fails or the response lacks the
    /// expected payload.
    pub async fn list_recipes(&self) -> Result<Vec<RecipeGroup>, ApiError> {
        let body = Versioned {
            version: self.proto_version(),
            data: serde_json::Map::new(),
        };
        let response: Envelope<RecipeGroupList> = self
            .transport
            .execute(
                Method::POST,
                LIST_RECIPES_PATH,
                Some(&body),
                expect_json("listing recipes", StatusCode::OK),
            )
            .await?;
        Ok(response.data.groups)
    }

    /// Rebuilds the recipe cache from a fresh listing.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when listing recipes fails; the cache keeps its
    /// previous contents in that case.
    pub async fn refresh_recipes(&self) -> Result<(), ApiError> {
        let _gate = self.recipes.refresh_gate.lock().await;
        self.fetch_into_cache().await
    }

    async fn fetch_into_cache(&self) -> Result<(), ApiError> {
        let groups = self.list_recipes().await?;
        self.recipes.replace(vm_recipes(&groups)).await;
        Ok(())
    }

    /// Resolves a recipe by name, refreshing the cache once on a miss.
    ///
    /// Concurrent misses share a single refresh.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Missing`] naming the recipe when it is absent even
    /// after a refresh, or the refresh failure itself.
    pub async fn find_recipe(&self, name: &str) -> Result<VmRecipe, ApiError> {
        let key = normalise(name);
        let (cached, seen) = self.recipes.lookup(&key).await;
        if let Some(found) = cached {
            return Ok(found);
        }

        debug!(recipe = %key, "recipe cache miss");
        let _gate = self.recipes.refresh_gate.lock().await;
        if self.recipes.generation().await == seen {
            self.fetch_into_cache().await?;
        } else {
            debug!(recipe = %key, "reusing refresh completed while waiting");
        }
        self.recipes.get(&key).await.ok_or(ApiError::Missing {
            kind: ResourceKind::Recipe,
            name: key,
        })
    }

    /// Returns the recipe cache.
    #[must_use]
    pub fn recipe_cache(&self) -> &RecipeCache {
        &self.recipes
    }
}
