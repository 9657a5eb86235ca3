/*
This file contains the component in charge of
bringing an application Deployment in line with its spec:
one read of the current Deployment, then one create or
one full replace.
*/

use std::{
    sync::Arc,
    collections::BTreeMap
};
use k8s_openapi::api::apps::v1::Deployment;
use tracing::{
    debug,
    info
};

use crate::error::DeployResult;
use crate::components::cluster::DeploymentApi;
use crate::components::manifest::ManifestComposer;
use crate::utils::appspec::AppSpec;



/*
Replicas Kubernetes assumes when a Deployment omits the field
*/
const DEFAULT_EXISTING_REPLICAS: i32 = 1;

/*
What the reconciler did with the cluster
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeployAction {
    Created,
    Updated,
}

/*
This function decides how many replicas the Deployment gets.
    - Autoscaler disabled: the static AppSpec.replicas.
    - Autoscaler enabled with a CPU request: the autoscaler owns the
      count, so the current value is kept; a first deploy starts
      at the autoscaler minimum.
    - Autoscaler enabled without a CPU request: CPU autoscaling cannot
      work, the autoscaler is ignored and AppSpec.replicas is used.
*/
pub fn decide_replicas(existing: Option<&Deployment>, app_spec: &AppSpec) -> i32 {
    if !(app_spec.autoscaler.enabled && app_spec.resources.has_cpu_request()) {
        return app_spec.replicas;
    }
    match existing {
        Some(deployment) => deployment
            .spec
            .as_ref()
            .and_then(|spec| spec.replicas)
            .unwrap_or(DEFAULT_EXISTING_REPLICAS),
        None => app_spec.autoscaler.min_replicas,
    }
}

/*
Deploys applications through a DeploymentApi.
Holds no per-application state: concurrent deploys of different
applications are independent. Concurrent deploys of the same
application are last-write-wins, updates carry no resourceVersion.
*/
#[derive(Clone)]
pub struct DeploymentReconciler {
    composer: ManifestComposer,
    api: Arc<dyn DeploymentApi>,
}

impl DeploymentReconciler {
    pub fn new(composer: ManifestComposer, api: Arc<dyn DeploymentApi>) -> Self {
        Self { composer, api }
    }

    /*
    This function runs one reconciliation for the application:
        1. compose the desired Deployment (invalid specs stop here,
           before any request reaches the cluster);
        2. fetch the current Deployment;
        3. substitute the arbitrated replica count;
        4. create it when absent, replace it otherwise.
    Errors from the cluster are returned unchanged.
    */
    pub async fn deploy(&self, app_spec: &AppSpec, selector: &BTreeMap<String, String>, labels: &BTreeMap<String, String>) -> DeployResult<DeployAction> {
        let mut desired = self.composer.compose(app_spec, selector, labels)?;

        let existing = self.api.get(&app_spec.namespace, &app_spec.name).await?;
        let replicas = decide_replicas(existing.as_ref(), app_spec);
        if let Some(spec) = desired.spec.as_mut() {
            spec.replicas = Some(replicas);
        }

        match existing {
            None => {
                debug!(app = %app_spec.name, namespace = %app_spec.namespace, replicas, "creating deployment");
                self.api.create(&app_spec.namespace, &desired).await?;
                info!(app = %app_spec.name, replicas, "deployment created");
                Ok(DeployAction::Created)
            }
            Some(_) => {
                debug!(app = %app_spec.name, namespace = %app_spec.namespace, replicas, "replacing deployment");
                self.api.replace(&app_spec.namespace, &app_spec.name, &desired).await?;
                info!(app = %app_spec.name, replicas, "deployment updated");
                Ok(DeployAction::Updated)
            }
        }
    }
}
