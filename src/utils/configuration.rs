/*
This File contains utility functions and variables to retrieve
the deployer configuration.
*/

use std::{
    env,
    fmt,
    collections::BTreeMap
};



/*
Deployer configuration parameters
*/
#[derive(Clone, Debug, Default)]
pub struct DeployerConfig {
    pub infrastructure: String,                 // Infrastructure the cluster runs on (diy, gke, ...)
    pub environment: String,                    // Environment name (dev, test, prod, ...)
    pub global_env: BTreeMap<String, String>,   // Variables exposed to every application
    pub image_pull_secrets: Vec<String>,        // Secrets used to pull application images
}

/*
This function implements the Display trait for the
DeployerConfig struct to allow easy printing of its values.
*/
impl fmt::Display for DeployerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Deployer configuration:")?;
        writeln!(f, "    Infrastructure: {}", self.infrastructure)?;
        writeln!(f, "    Environment: {}", self.environment)?;
        writeln!(f, "    Global env keys: {:?}", self.global_env.keys().collect::<Vec<_>>())?;
        writeln!(f, "    Image pull secrets: {:?}", self.image_pull_secrets)
    }
}

/*
This function retrieves the infrastructure name
from the environment variable "FIAAS_INFRASTRUCTURE".
*/
fn get_infrastructure() -> String {
    env::var("FIAAS_INFRASTRUCTURE")
        .unwrap_or_else(|_| "diy".to_string()) // diy is the Default Value
}

/*
This function retrieves the environment name
from the environment variable "FIAAS_ENVIRONMENT".
*/
fn get_environment() -> String {
    env::var("FIAAS_ENVIRONMENT")
        .unwrap_or_else(|_| "dev".to_string()) // dev is the Default Value
}

/*
This function retrieves the global environment variables
from the environment variable "FIAAS_GLOBAL_ENV".
*/
fn get_global_env() -> BTreeMap<String, String> {
    env::var("FIAAS_GLOBAL_ENV")
        .map(|v| parse_global_env(&v))
        .unwrap_or_default()
}

/*
This function retrieves the image pull secret names
from the environment variable "FIAAS_IMAGE_PULL_SECRETS".
*/
fn get_image_pull_secrets() -> Vec<String> {
    env::var("FIAAS_IMAGE_PULL_SECRETS")
        .map(|v| parse_list(&v))
        .unwrap_or_default()
}

/*
Parses "KEY=value,OTHER=value" pairs.
Entries without '=' or with an empty key are ignored,
values may contain further '=' characters.
*/
pub fn parse_global_env(raw: &str) -> BTreeMap<String, String> {
    raw.split(',')
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| (key.trim(), value.trim()))
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/*
This function retrieves the
deployer configuration parameters.
*/
pub fn get_deployer_configuration() -> DeployerConfig {
    DeployerConfig {
        infrastructure: get_infrastructure(),
        environment: get_environment(),
        global_env: get_global_env(),
        image_pull_secrets: get_image_pull_secrets(),
    }
}
