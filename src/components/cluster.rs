/*
This file contains the interface the reconciler uses
to read and write Deployments in the cluster, and its
implementation on top of the Kubernetes API Server.
*/

use async_trait::async_trait;
use kube::{
    Client,
    Api,
    api::PostParams
};
use k8s_openapi::api::apps::v1::Deployment;

use crate::error::DeployResult;



/*
Deployment access used by the reconciler.
No retries happen at this level: every error is returned as is.
*/
#[async_trait]
pub trait DeploymentApi: Send + Sync {
    /*
    Returns None when no Deployment with this name exists.
    */
    async fn get(&self, namespace: &str, name: &str) -> DeployResult<Option<Deployment>>;

    /*
    POST on the namespace collection.
    */
    async fn create(&self, namespace: &str, deployment: &Deployment) -> DeployResult<()>;

    /*
    PUT on the named resource, replacing it entirely.
    No resourceVersion precondition is sent.
    */
    async fn replace(&self, namespace: &str, name: &str, deployment: &Deployment) -> DeployResult<()>;
}

/*
DeploymentApi backed by a kube Client
*/
#[derive(Clone)]
pub struct KubeDeploymentApi {
    client: Client,
}

impl KubeDeploymentApi {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl DeploymentApi for KubeDeploymentApi {
    async fn get(&self, namespace: &str, name: &str) -> DeployResult<Option<Deployment>> {
        match self.api(namespace).get(name).await {
            Ok(deployment) => Ok(Some(deployment)),
            Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn create(&self, namespace: &str, deployment: &Deployment) -> DeployResult<()> {
        self.api(namespace).create(&PostParams::default(), deployment).await?;
        Ok(())
    }

    async fn replace(&self, namespace: &str, name: &str, deployment: &Deployment) -> DeployResult<()> {
        self.api(namespace).replace(name, &PostParams::default(), deployment).await?;
        Ok(())
    }
}
