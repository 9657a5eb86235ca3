/*
This file contains the component in charge
of composing the desired Deployment of an application.
*/

use std::{
    sync::Arc,
    collections::BTreeMap
};
use k8s_openapi::{
    apimachinery::pkg::{
        api::resource::Quantity,
        apis::meta::v1::LabelSelector
    },
    api::{
        apps::v1::{
            Deployment,
            DeploymentSpec
        },
        core::v1::{
            PodSpec,
            PodTemplateSpec,
            Container,
            ContainerPort,
            ResourceRequirements,
            Volume,
            VolumeMount,
            ConfigMapVolumeSource,
            LocalObjectReference
        }
    }
};

use crate::error::DeployResult;
use crate::components::probe::build_probe;
use crate::components::environment::build_env;
use crate::components::metadata::MetadataBuilder;
use crate::utils::appspec::{
    AppSpec,
    ResourceRequirementSpec,
    ResourcesSpec
};
use crate::utils::configuration::DeployerConfig;
use crate::utils::vars::*;



/*
Composes Deployments out of application specs.
It holds the collaborators whose values end up
verbatim in every manifest.
*/
#[derive(Clone)]
pub struct ManifestComposer {
    config: DeployerConfig,
    metadata: Arc<dyn MetadataBuilder>,
}

impl ManifestComposer {
    pub fn new(config: DeployerConfig, metadata: Arc<dyn MetadataBuilder>) -> Self {
        Self { config, metadata }
    }

    /*
    This function builds the complete Deployment for the application.
    spec.replicas is AppSpec.replicas: arbitration against the
    autoscaler happens in the reconciler.
    Any invalid health check aborts the whole composition.
    */
    pub fn compose(&self, app_spec: &AppSpec, selector: &BTreeMap<String, String>, labels: &BTreeMap<String, String>) -> DeployResult<Deployment> {
        let liveness = build_probe(&app_spec.health_checks.liveness)?;
        let readiness = build_probe(&app_spec.health_checks.readiness)?;

        let (volumes, volume_mounts) = config_map_volume(app_spec);

        let container = Container {
            name: app_spec.name.clone(),
            image: Some(app_spec.image.clone()),
            image_pull_policy: Some(IMAGE_PULL_POLICY.to_string()),
            ports: Some(
                app_spec.ports
                    .iter()
                    .map(|port| ContainerPort {
                        name: Some(port.name.clone()),
                        container_port: port.target_port,
                        protocol: Some(CONTAINER_PORT_PROTOCOL.to_string()),
                        ..Default::default()
                    })
                    .collect()
            ),
            env: Some(build_env(
                app_spec,
                &self.config.infrastructure,
                &self.config.environment,
                &self.config.global_env
            )),
            liveness_probe: Some(liveness),
            readiness_probe: Some(readiness),
            resources: Some(resource_requirements(&app_spec.resources)),
            volume_mounts: Some(volume_mounts),
            ..Default::default()
        };

        let pod_spec = PodSpec {
            containers: vec![container],
            volumes: Some(volumes),
            service_account_name: Some(service_account(app_spec).to_string()),
            restart_policy: Some(RESTART_POLICY.to_string()),
            dns_policy: Some(DNS_POLICY.to_string()),
            image_pull_secrets: Some(
                self.config.image_pull_secrets
                    .iter()
                    .map(|secret| LocalObjectReference { name: Some(secret.clone()) })
                    .collect()
            ),
            ..Default::default()
        };

        Ok(Deployment {
            metadata: self.metadata.build(app_spec, labels, false),
            spec: Some(DeploymentSpec {
                selector: LabelSelector {
                    match_labels: Some(selector.clone()),
                    match_expressions: None,
                },
                template: PodTemplateSpec {
                    metadata: Some(self.metadata.build(app_spec, labels, app_spec.prometheus.enabled)),
                    spec: Some(pod_spec),
                },
                replicas: Some(app_spec.replicas),
                revision_history_limit: Some(REVISION_HISTORY_LIMIT),
                ..Default::default()
            }),
            ..Default::default()
        })
    }
}

fn service_account(app_spec: &AppSpec) -> &'static str {
    if app_spec.admin_access {
        ADMIN_SERVICE_ACCOUNT
    } else {
        NO_ACCESS_SERVICE_ACCOUNT
    }
}

/*
This function returns the volume and mount for the
application config map, or nothing when no volume is requested.
*/
fn config_map_volume(app_spec: &AppSpec) -> (Vec<Volume>, Vec<VolumeMount>) {
    if !app_spec.config.volume {
        return (vec![], vec![]);
    }
    let volume = Volume {
        name: app_spec.name.clone(),
        config_map: Some(ConfigMapVolumeSource {
            name: Some(app_spec.name.clone()),
            ..Default::default()
        }),
        ..Default::default()
    };
    let mount = VolumeMount {
        name: app_spec.name.clone(),
        read_only: Some(true),
        mount_path: CONFIG_MOUNT_PATH.to_string(),
        ..Default::default()
    };
    (vec![volume], vec![mount])
}

fn quantities(spec: &ResourceRequirementSpec) -> Option<BTreeMap<String, Quantity>> {
    let values: BTreeMap<String, Quantity> = [("cpu", &spec.cpu), ("memory", &spec.memory)]
        .into_iter()
        .filter_map(|(name, value)| value.as_ref().map(|v| (name.to_string(), Quantity(v.clone()))))
        .collect();
    if values.is_empty() { None } else { Some(values) }
}

/*
Only the values actually present are emitted:
an empty ResourcesSpec becomes an empty object.
*/
fn resource_requirements(resources: &ResourcesSpec) -> ResourceRequirements {
    ResourceRequirements {
        requests: quantities(&resources.requests),
        limits: quantities(&resources.limits),
        claims: None,
    }
}



#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    use crate::components::metadata::StandardMetadataBuilder;
    use crate::error::DeployError;

    fn app_spec(extra: Value) -> AppSpec {
        let mut doc = json!({
            "name": "testapp",
            "image": "finntech/testimage:version",
            "replicas": 3,
            "health_checks": {
                "liveness": {"tcp": {"port": 8080}},
                "readiness": {"http": {"path": "/", "port": 8080}}
            },
            "ports": [{"protocol": "http", "name": "http", "port": 80, "target_port": 8080}]
        });
        if let (Some(doc), Some(extra)) = (doc.as_object_mut(), extra.as_object()) {
            for (key, value) in extra {
                doc.insert(key.clone(), value.clone());
            }
        }
        serde_json::from_value(doc).unwrap()
    }

    fn composer() -> ManifestComposer {
        let config = DeployerConfig {
            infrastructure: "diy".to_string(),
            environment: "test".to_string(),
            ..Default::default()
        };
        ManifestComposer::new(config, Arc::new(StandardMetadataBuilder))
    }

    fn compose(app: &AppSpec) -> Value {
        let selector = BTreeMap::from([("app".to_string(), "testapp".to_string())]);
        let labels = BTreeMap::from([("deployment_deployer".to_string(), "pass through".to_string())]);
        serde_json::to_value(composer().compose(app, &selector, &labels).unwrap()).unwrap()
    }

    #[test]
    fn manifest_carries_fixed_pod_policy() {
        let manifest = compose(&app_spec(json!({})));

        assert_eq!(manifest["spec"]["selector"], json!({"matchLabels": {"app": "testapp"}}));
        assert_eq!(manifest["spec"]["replicas"], 3);
        assert_eq!(manifest["spec"]["revisionHistoryLimit"], 5);
        let pod = &manifest["spec"]["template"]["spec"];
        assert_eq!(pod["dnsPolicy"], "ClusterFirst");
        assert_eq!(pod["restartPolicy"], "Always");
        assert_eq!(pod["serviceAccountName"], "fiaas-no-access");
        assert_eq!(pod["volumes"], json!([]));
        assert_eq!(pod["imagePullSecrets"], json!([]));
    }

    #[test]
    fn container_matches_the_app_spec() {
        let manifest = compose(&app_spec(json!({})));
        let container = &manifest["spec"]["template"]["spec"]["containers"][0];

        assert_eq!(container["name"], "testapp");
        assert_eq!(container["image"], "finntech/testimage:version");
        assert_eq!(container["imagePullPolicy"], "IfNotPresent");
        assert_eq!(container["ports"], json!([{"protocol": "TCP", "containerPort": 8080, "name": "http"}]));
        assert_eq!(container["volumeMounts"], json!([]));
        assert_eq!(container["resources"], json!({}));
        assert_eq!(container["livenessProbe"]["tcpSocket"], json!({"port": 8080}));
        assert_eq!(
            container["readinessProbe"]["httpGet"],
            json!({"path": "/", "scheme": "HTTP", "port": 8080, "httpHeaders": []})
        );
        assert_eq!(container["env"][0], json!({"name": "ARTIFACT_NAME", "value": "testapp"}));
    }

    #[test]
    fn metadata_is_delegated_with_prometheus_on_the_template_only() {
        let manifest = compose(&app_spec(json!({})));

        assert_eq!(manifest["metadata"]["name"], "testapp");
        assert_eq!(manifest["metadata"]["labels"], json!({"deployment_deployer": "pass through"}));
        assert!(manifest["metadata"].get("annotations").is_none());
        assert_eq!(manifest["spec"]["template"]["metadata"]["annotations"]["prometheus.io/scrape"], "true");

        let disabled = compose(&app_spec(json!({"prometheus": {"enabled": false}})));
        assert!(disabled["spec"]["template"]["metadata"].get("annotations").is_none());
    }

    #[test]
    fn admin_access_uses_the_default_service_account() {
        let manifest = compose(&app_spec(json!({"admin_access": true})));
        assert_eq!(manifest["spec"]["template"]["spec"]["serviceAccountName"], "default");
    }

    #[test]
    fn config_map_volume_adds_one_volume_and_one_mount() {
        let without = compose(&app_spec(json!({})));
        let with = compose(&app_spec(json!({"config": {"volume": true}})));

        assert_eq!(
            with["spec"]["template"]["spec"]["volumes"],
            json!([{"name": "testapp", "configMap": {"name": "testapp"}}])
        );
        assert_eq!(
            with["spec"]["template"]["spec"]["containers"][0]["volumeMounts"],
            json!([{"name": "testapp", "readOnly": true, "mountPath": "/var/run/config/fiaas/"}])
        );

        let mut stripped = with.clone();
        stripped["spec"]["template"]["spec"]["volumes"] = json!([]);
        stripped["spec"]["template"]["spec"]["containers"][0]["volumeMounts"] = json!([]);
        assert_eq!(stripped, without);
    }

    #[test]
    fn resources_contain_only_present_values() {
        let manifest = compose(&app_spec(json!({
            "resources": {"requests": {"cpu": "1"}, "limits": {"memory": "512Mi"}}
        })));

        assert_eq!(
            manifest["spec"]["template"]["spec"]["containers"][0]["resources"],
            json!({"requests": {"cpu": "1"}, "limits": {"memory": "512Mi"}})
        );
    }

    #[test]
    fn image_pull_secrets_come_from_configuration() {
        let config = DeployerConfig {
            image_pull_secrets: vec!["regcred".to_string()],
            ..Default::default()
        };
        let composer = ManifestComposer::new(config, Arc::new(StandardMetadataBuilder));
        let manifest = composer.compose(&app_spec(json!({})), &BTreeMap::new(), &BTreeMap::new()).unwrap();

        let secrets = manifest.spec.unwrap().template.spec.unwrap().image_pull_secrets.unwrap();
        assert_eq!(secrets, vec![LocalObjectReference { name: Some("regcred".to_string()) }]);
    }

    #[test]
    fn invalid_health_check_aborts_composition() {
        let app = app_spec(json!({
            "health_checks": {
                "liveness": {"initial_delay_seconds": 10},
                "readiness": {"http": {"path": "/", "port": 8080}}
            }
        }));

        let result = composer().compose(&app, &BTreeMap::new(), &BTreeMap::new());
        assert!(matches!(result, Err(DeployError::Validation(_))));
    }
}
