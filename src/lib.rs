/*
Deployment composer and reconciler: turns application
specs into Kubernetes Deployments and applies them.
*/

pub mod error;
pub mod utils;
pub mod components;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use error::{
    DeployError,
    DeployResult
};
pub use components::reconciler::{
    DeploymentReconciler,
    DeployAction,
    decide_replicas
};
pub use components::manifest::ManifestComposer;
pub use components::cluster::{
    DeploymentApi,
    KubeDeploymentApi
};
pub use components::metadata::{
    MetadataBuilder,
    StandardMetadataBuilder
};
pub use utils::appspec::AppSpec;
pub use utils::configuration::DeployerConfig;
