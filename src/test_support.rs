//! Test support utilities shared across unit and integration tests.

use std::collections::{BTreeSet, VecDeque};
use std::env;
use std::ffi::OsString;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard as StdMutexGuard, PoisonError};

use tokio::sync::{Mutex, MutexGuard};

use crate::api::{ApiError, Instance, InstanceStatus, ResourceKind, SshKey, VirtualMachine};
use crate::backend::{Backend, BackendFuture, RentRequest};

/// Builds an instance snapshot with a single VM.
#[must_use]
pub fn instance(id: &str, status: InstanceStatus, ready: bool) -> Instance {
    Instance {
        id: id.to_owned(),
        status,
        node_id: String::from("node-1"),
        node_mode: String::from("VirtualMachine"),
        node_status: String::from("Ready"),
        host_address: ready.then(|| String::from("203.0.113.10")),
        internal_host_address: ready.then(|| String::from("10.0.0.10")),
        resource_info: None,
        virtual_machines: vec![VirtualMachine {
            vmid: 100,
            name: format!("vm-{id}"),
            login_info: None,
            ready,
        }],
    }
}

#[derive(Debug)]
struct ScriptState {
    keys: Vec<SshKey>,
    rent_response: Result<Vec<String>, ApiError>,
    polls: VecDeque<Result<Instance, ApiError>>,
    idle_poll: Result<Instance, ApiError>,
    terminate_response: Result<(), ApiError>,
    rent_requests: Vec<RentRequest>,
    get_calls: usize,
    terminate_calls: usize,
    add_calls: usize,
    delete_calls: usize,
}

impl Default for ScriptState {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            rent_response: Ok(vec![String::from("1")]),
            polls: VecDeque::new(),
            idle_poll: Err(ApiError::NotFound),
            terminate_response: Ok(()),
            rent_requests: Vec::new(),
            get_calls: 0,
            terminate_calls: 0,
            add_calls: 0,
            delete_calls: 0,
        }
    }
}

/// Scripted [`Backend`] returning queued responses and counting calls.
///
/// Clones share the same script, so a test can keep one handle for
/// assertions while a controller owns another.
#[derive(Clone, Debug, Default)]
pub struct ScriptedBackend {
    state: Arc<StdMutex<ScriptState>>,
}

impl ScriptedBackend {
    /// Creates a backend that rents instance `1` and reports every instance
    /// as absent.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StdMutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a key returned by listing and lookups.
    #[must_use]
    pub fn with_key(self, id: &str, public_key: &str) -> Self {
        self.lock().keys.push(SshKey {
            id: id.to_owned(),
            name: format!("key-{id}"),
            public_key: public_key.to_owned(),
        });
        self
    }

    /// Sets the instance ids returned by renting.
    #[must_use]
    pub fn with_rented_ids(self, ids: &[&str]) -> Self {
        self.lock().rent_response = Ok(ids.iter().map(|id| (*id).to_owned()).collect());
        self
    }

    /// Makes renting fail.
    #[must_use]
    pub fn with_rent_error(self, error: ApiError) -> Self {
        self.lock().rent_response = Err(error);
        self
    }

    /// Queues the response to the next instance fetch.
    #[must_use]
    pub fn then_poll(self, response: Result<Instance, ApiError>) -> Self {
        self.lock().polls.push_back(response);
        self
    }

    /// Sets the response returned once the poll queue is drained.
    #[must_use]
    pub fn when_idle(self, response: Result<Instance, ApiError>) -> Self {
        self.lock().idle_poll = response;
        self
    }

    /// Sets the terminate response.
    #[must_use]
    pub fn with_terminate_response(self, response: Result<(), ApiError>) -> Self {
        self.lock().terminate_response = response;
        self
    }

    /// Number of instance fetches made.
    #[must_use]
    pub fn get_calls(&self) -> usize {
        self.lock().get_calls
    }

    /// Number of terminate requests made.
    #[must_use]
    pub fn terminate_calls(&self) -> usize {
        self.lock().terminate_calls
    }

    /// Number of keys registered.
    #[must_use]
    pub fn add_calls(&self) -> usize {
        self.lock().add_calls
    }

    /// Number of key deletions requested.
    #[must_use]
    pub fn delete_calls(&self) -> usize {
        self.lock().delete_calls
    }

    /// Rent requests received, in order.
    #[must_use]
    pub fn rent_requests(&self) -> Vec<RentRequest> {
        self.lock().rent_requests.clone()
    }

    /// Keys currently registered.
    #[must_use]
    pub fn keys(&self) -> Vec<SshKey> {
        self.lock().keys.clone()
    }
}

impl Backend for ScriptedBackend {
    fn add_ssh_key<'a>(&'a self, name: &'a str, public_key: &'a str) -> BackendFuture<'a, SshKey> {
        Box::pin(async move {
            let mut state = self.lock();
            state.add_calls += 1;
            let key = SshKey {
                id: format!("key-{}", state.add_calls),
                name: name.to_owned(),
                public_key: public_key.to_owned(),
            };
            state.keys.push(key.clone());
            Ok(key)
        })
    }

    fn list_ssh_keys(&self) -> BackendFuture<'_, Vec<SshKey>> {
        Box::pin(async move { Ok(self.lock().keys.clone()) })
    }

    fn delete_ssh_key<'a>(&'a self, id: &'a str) -> BackendFuture<'a, ()> {
        Box::pin(async move {
            let mut state = self.lock();
            state.delete_calls += 1;
            state.keys.retain(|key| key.id != id);
            Ok(())
        })
    }

    fn find_ssh_key_by_id<'a>(&'a self, id: &'a str) -> BackendFuture<'a, SshKey> {
        Box::pin(async move {
            self.lock()
                .keys
                .iter()
                .find(|key| key.id == id)
                .cloned()
                .ok_or_else(|| ApiError::Missing {
                    kind: ResourceKind::SshKey,
                    name: id.to_owned(),
                })
        })
    }

    fn rent_instance<'a>(&'a self, request: &'a RentRequest) -> BackendFuture<'a, Vec<String>> {
        Box::pin(async move {
            let mut state = self.lock();
            state.rent_requests.push(request.clone());
            state.rent_response.clone()
        })
    }

    fn get_instance<'a>(&'a self, _id: &'a str) -> BackendFuture<'a, Instance> {
        Box::pin(async move {
            let mut state = self.lock();
            state.get_calls += 1;
            match state.polls.pop_front() {
                Some(response) => response,
                None => state.idle_poll.clone(),
            }
        })
    }

    fn terminate_instance<'a>(&'a self, _id: &'a str) -> BackendFuture<'a, ()> {
        Box::pin(async move {
            let mut state = self.lock();
            state.terminate_calls += 1;
            state.terminate_response.clone()
        })
    }
}

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: Mutex<()> = Mutex::const_new(());

/// Guard that holds the env mutex and restores variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets environment variables while holding a global mutex.
    pub async fn set_vars(pairs: &[(&str, &str)]) -> Self {
        debug_assert!(
            {
                let mut seen = BTreeSet::new();
                pairs.iter().all(|(key, _)| seen.insert(*key))
            },
            "duplicate environment variable keys passed to EnvGuard::set_vars"
        );

        let guard = ENV_LOCK.lock().await;
        let mut previous = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let old = env::var_os(key);
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`, preventing races.
            unsafe { env::set_var(key, value) };
            previous.push(((*key).to_owned(), old));
        }

        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in &self.previous {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}
