//! Shared mocks for integration testing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use cache_fleet::fleet::{
    BackendDirectory, BackendId, BackendKey, InstanceError, ProxyInstance, ProxyStatusSource,
};
use cache_fleet::refresh::{ReloadError, ReloadExecutor, ReloadHandle, TaskResult};
use cache_fleet::ClusterId;

enum Script {
    Dump(String),
    Unreachable(String),
    FetchFailure(String),
}

/// Proxy instance returning a fixed status dump (or a fixed failure).
pub struct ScriptedInstance {
    name: String,
    script: Script,
}

impl ScriptedInstance {
    fn new(name: &str, script: Script) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            script,
        })
    }

    #[allow(dead_code)]
    pub fn reachable(name: &str, dump: &str) -> Arc<Self> {
        Self::new(name, Script::Dump(dump.to_string()))
    }

    #[allow(dead_code)]
    pub fn unreachable(name: &str, error: &str) -> Arc<Self> {
        Self::new(name, Script::Unreachable(error.to_string()))
    }

    /// Connects, then fails mid-fetch.
    #[allow(dead_code)]
    pub fn fetch_failing(name: &str, error: &str) -> Arc<Self> {
        Self::new(name, Script::FetchFailure(error.to_string()))
    }
}

#[async_trait]
impl ProxyInstance for ScriptedInstance {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_status_dump(&self) -> Result<String, InstanceError> {
        match &self.script {
            Script::Dump(dump) => Ok(dump.clone()),
            Script::Unreachable(error) => Err(InstanceError::Unreachable(error.clone())),
            Script::FetchFailure(error) => Err(InstanceError::Fetch(error.clone())),
        }
    }
}

/// Status source over a fixed instance list.
pub struct StaticSource {
    instances: Vec<Arc<dyn ProxyInstance>>,
}

impl StaticSource {
    #[allow(dead_code)]
    pub fn new(instances: Vec<Arc<dyn ProxyInstance>>) -> Arc<Self> {
        Arc::new(Self { instances })
    }
}

#[async_trait]
impl ProxyStatusSource for StaticSource {
    async fn connected_instances(&self) -> Vec<Arc<dyn ProxyInstance>> {
        self.instances.clone()
    }
}

/// Directory over a fixed id-to-endpoint mapping.
pub struct StaticDirectory {
    backends: HashMap<BackendId, BackendKey>,
}

impl StaticDirectory {
    #[allow(dead_code)]
    pub fn new(entries: &[(u64, &str, u16)]) -> Arc<Self> {
        let backends = entries
            .iter()
            .map(|(id, address, port)| (BackendId(*id), BackendKey::new(*address, *port)))
            .collect();
        Arc::new(Self { backends })
    }
}

#[async_trait]
impl BackendDirectory for StaticDirectory {
    async fn all(&self) -> HashMap<BackendId, BackendKey> {
        self.backends.clone()
    }
}

struct ScriptedHandle {
    id: Uuid,
    delay: Duration,
    result: TaskResult,
}

#[async_trait]
impl ReloadHandle for ScriptedHandle {
    fn id(&self) -> Uuid {
        self.id
    }

    fn is_done(&self) -> bool {
        self.delay.is_zero()
    }

    async fn wait(&self) -> Result<TaskResult, ReloadError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.result.clone())
    }
}

/// Executor recording every dispatch and completing after a scripted delay.
pub struct ScriptedExecutor {
    result: TaskResult,
    delay: Duration,
    dispatches: Mutex<Vec<(u64, Vec<ClusterId>)>>,
}

impl ScriptedExecutor {
    #[allow(dead_code)]
    pub fn completing(result: TaskResult) -> Arc<Self> {
        Arc::new(Self {
            result,
            delay: Duration::ZERO,
            dispatches: Mutex::new(Vec::new()),
        })
    }

    #[allow(dead_code)]
    pub fn completing_after(delay: Duration, result: TaskResult) -> Arc<Self> {
        Arc::new(Self {
            result,
            delay,
            dispatches: Mutex::new(Vec::new()),
        })
    }

    #[allow(dead_code)]
    pub fn dispatches(&self) -> Vec<(u64, Vec<ClusterId>)> {
        self.dispatches.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReloadExecutor for ScriptedExecutor {
    async fn dispatch(
        &self,
        timestamp: u64,
        clusters: Vec<ClusterId>,
    ) -> Result<Arc<dyn ReloadHandle>, ReloadError> {
        self.dispatches.lock().unwrap().push((timestamp, clusters));
        Ok(Arc::new(ScriptedHandle {
            id: Uuid::new_v4(),
            delay: self.delay,
            result: self.result.clone(),
        }))
    }
}
