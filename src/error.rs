/*
This file contains the error type returned by
the deployer library.
*/

use thiserror::Error;



/*
Errors that can abort the deploy of a single application.
A Deployment that does not exist yet is not an error:
the cluster layer reports it as an absent resource.
*/
#[derive(Debug, Error)]
pub enum DeployError {
    /*
    The application specification cannot be turned into a manifest.
    Raised before any request reaches the API Server.
    */
    #[error("invalid application spec: {0}")]
    Validation(String),

    /*
    Any failure reported by the Kubernetes API Server or the
    transport underneath it, passed through as is.
    */
    #[error("kubernetes api error: {0}")]
    Kube(#[from] kube::Error),
}

pub type DeployResult<T> = Result<T, DeployError>;
