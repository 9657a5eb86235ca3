/*
This file contains an in-memory DeploymentApi used by the tests.
It stores Deployments per namespace and name and records every
request, so tests can assert what would have reached the cluster.
*/

use std::{
    sync::Mutex,
    collections::BTreeMap
};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use kube::core::ErrorResponse;

use crate::error::DeployResult;
use crate::components::cluster::DeploymentApi;



/*
A request received by the in-memory API
*/
#[derive(Clone, Debug, PartialEq)]
pub enum ApiCall {
    Get { namespace: String, name: String },
    Create { namespace: String, body: Deployment },
    Replace { namespace: String, name: String, body: Deployment },
}

/*
The kind of request, used to target injected failures
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ApiOperation {
    Get,
    Create,
    Replace,
}

impl ApiCall {
    pub fn operation(&self) -> ApiOperation {
        match self {
            ApiCall::Get { .. } => ApiOperation::Get,
            ApiCall::Create { .. } => ApiOperation::Create,
            ApiCall::Replace { .. } => ApiOperation::Replace,
        }
    }
}

#[derive(Default)]
pub struct InMemoryDeploymentApi {
    deployments: Mutex<BTreeMap<(String, String), Deployment>>,
    calls: Mutex<Vec<ApiCall>>,
    failures: Mutex<BTreeMap<ApiOperation, u16>>,
}

impl InMemoryDeploymentApi {
    pub fn new() -> Self {
        Self::default()
    }

    /*
    Stores a Deployment as if it already existed in the cluster.
    */
    pub fn insert(&self, namespace: &str, name: &str, deployment: Deployment) {
        self.deployments
            .lock()
            .unwrap()
            .insert((namespace.to_string(), name.to_string()), deployment);
    }

    pub fn stored(&self, namespace: &str, name: &str) -> Option<Deployment> {
        self.deployments
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /*
    Every following request fails with this HTTP status code.
    */
    pub fn fail_with(&self, code: u16) {
        for operation in [ApiOperation::Get, ApiOperation::Create, ApiOperation::Replace] {
            self.fail_on(operation, code);
        }
    }

    /*
    Every following request of this kind fails with this HTTP status code,
    the other kinds keep succeeding.
    */
    pub fn fail_on(&self, operation: ApiOperation, code: u16) {
        self.failures.lock().unwrap().insert(operation, code);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: ApiCall) -> DeployResult<()> {
        let operation = call.operation();
        self.calls.lock().unwrap().push(call);
        match self.failures.lock().unwrap().get(&operation).copied() {
            Some(code) => Err(kube::Error::Api(ErrorResponse {
                status: "Failure".to_string(),
                message: format!("injected failure {}", code),
                reason: "InternalError".to_string(),
                code,
            }).into()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DeploymentApi for InMemoryDeploymentApi {
    async fn get(&self, namespace: &str, name: &str) -> DeployResult<Option<Deployment>> {
        self.record(ApiCall::Get {
            namespace: namespace.to_string(),
            name: name.to_string(),
        })?;
        Ok(self.stored(namespace, name))
    }

    async fn create(&self, namespace: &str, deployment: &Deployment) -> DeployResult<()> {
        self.record(ApiCall::Create {
            namespace: namespace.to_string(),
            body: deployment.clone(),
        })?;
        let name = deployment.metadata.name.clone().unwrap_or_default();
        self.insert(namespace, &name, deployment.clone());
        Ok(())
    }

    async fn replace(&self, namespace: &str, name: &str, deployment: &Deployment) -> DeployResult<()> {
        self.record(ApiCall::Replace {
            namespace: namespace.to_string(),
            name: name.to_string(),
            body: deployment.clone(),
        })?;
        self.insert(namespace, name, deployment.clone());
        Ok(())
    }
}
