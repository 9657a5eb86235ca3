/*
This file contains the component in charge
of assembling the container environment variables.
The order of the produced entries is part of the contract.
*/

use std::collections::BTreeMap;
use k8s_openapi::api::core::v1::{
    EnvVar,
    EnvVarSource,
    ConfigMapKeySelector
};

use crate::utils::appspec::AppSpec;
use crate::utils::vars::{
    PLATFORM,
    GLOBAL_ENV_PREFIX
};



fn literal(name: &str, value: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: Some(value.to_string()),
        value_from: None,
    }
}

fn config_map_key(name: &str, config_map: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: None,
        value_from: Some(EnvVarSource {
            config_map_key_ref: Some(ConfigMapKeySelector {
                name: Some(config_map.to_string()),
                key: name.to_string(),
                optional: None,
            }),
            ..Default::default()
        }),
    }
}

/*
This function returns the variables every application
gets, in their fixed order. None of them can be
overridden by the global configuration.
*/
fn derived_env(app_spec: &AppSpec, infrastructure: &str, environment: &str) -> Vec<EnvVar> {
    let constretto_tags = [
        format!("{}-{}", PLATFORM, environment),
        PLATFORM.to_string(),
        environment.to_string(),
    ]
    .join(",");

    vec![
        literal("ARTIFACT_NAME", &app_spec.name),
        literal("LOG_STDOUT", "true"),
        literal("VERSION", app_spec.version()),
        literal("CONSTRETTO_TAGS", &constretto_tags),
        literal("FIAAS_INFRASTRUCTURE", infrastructure),
        literal("FIAAS_ENVIRONMENT", environment),
        literal("LOG_FORMAT", "json"),
        literal("IMAGE", &app_spec.image),
        literal("FINN_ENV", environment),
    ]
}

/*
This function builds the environment of the application container:
    - the derived variables;
    - every global variable twice, as KEY and FIAAS_KEY, in key order,
      unless either name collides with a derived variable. A generated
      FIAAS_KEY is left out when FIAAS_KEY is itself a global key, the
      explicit value wins;
    - one config map reference per requested key.
*/
pub fn build_env(app_spec: &AppSpec, infrastructure: &str, environment: &str, global_env: &BTreeMap<String, String>) -> Vec<EnvVar> {
    let mut env = derived_env(app_spec, infrastructure, environment);
    let reserved: Vec<String> = env.iter().map(|e| e.name.clone()).collect();
    let is_reserved = |name: &str| reserved.iter().any(|r| r == name);

    for (key, value) in global_env {
        let prefixed = format!("{}{}", GLOBAL_ENV_PREFIX, key);
        if is_reserved(key) || is_reserved(&prefixed) {
            continue;
        }
        env.push(literal(key, value));
        if !global_env.contains_key(&prefixed) {
            env.push(literal(&prefixed, value));
        }
    }

    for key in &app_spec.config.envs {
        env.push(config_map_key(key, &app_spec.name));
    }

    env
}
