/*
This file contains the metadata collaborator used when
composing Deployments: it owns label and annotation conventions.
*/

use std::collections::BTreeMap;
use k8s_openapi::apimachinery::pkg::{
    apis::meta::v1::ObjectMeta,
    util::intstr::IntOrString
};

use crate::utils::appspec::AppSpec;
use crate::utils::vars::{
    PROMETHEUS_SCRAPE_ANNOTATION,
    PROMETHEUS_PORT_ANNOTATION,
    PROMETHEUS_PATH_ANNOTATION
};



/*
Builds the metadata of an application object.
The composer calls it once for the Deployment and once
for the pod template.
*/
pub trait MetadataBuilder: Send + Sync {
    fn build(&self, app_spec: &AppSpec, labels: &BTreeMap<String, String>, prometheus_enabled: bool) -> ObjectMeta;
}

/*
Name, namespace and labels taken as given, plus the
prometheus scraping annotations when scraping is enabled.
*/
#[derive(Clone, Debug, Default)]
pub struct StandardMetadataBuilder;

impl MetadataBuilder for StandardMetadataBuilder {
    fn build(&self, app_spec: &AppSpec, labels: &BTreeMap<String, String>, prometheus_enabled: bool) -> ObjectMeta {
        let annotations = if prometheus_enabled {
            let port = match &app_spec.prometheus.port {
                IntOrString::Int(port) => port.to_string(),
                IntOrString::String(name) => name.clone(),
            };
            Some(BTreeMap::from([
                (PROMETHEUS_SCRAPE_ANNOTATION.to_string(), "true".to_string()),
                (PROMETHEUS_PORT_ANNOTATION.to_string(), port),
                (PROMETHEUS_PATH_ANNOTATION.to_string(), app_spec.prometheus.path.clone()),
            ]))
        } else {
            None
        };

        ObjectMeta {
            name: Some(app_spec.name.clone()),
            namespace: Some(app_spec.namespace.clone()),
            labels: Some(labels.clone()),
            annotations,
            ..Default::default()
        }
    }
}



#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn app_spec(prometheus: serde_json::Value) -> AppSpec {
        serde_json::from_value(json!({
            "name": "testapp",
            "namespace": "apps",
            "image": "finntech/testimage:version",
            "replicas": 3,
            "health_checks": {
                "liveness": {"tcp": {"port": 8080}},
                "readiness": {"tcp": {"port": 8080}}
            },
            "prometheus": prometheus
        })).unwrap()
    }

    #[test]
    fn plain_metadata_has_no_annotations() {
        let labels = BTreeMap::from([("app".to_string(), "testapp".to_string())]);
        let meta = StandardMetadataBuilder.build(&app_spec(json!({})), &labels, false);

        assert_eq!(meta.name.as_deref(), Some("testapp"));
        assert_eq!(meta.namespace.as_deref(), Some("apps"));
        assert_eq!(meta.labels, Some(labels));
        assert!(meta.annotations.is_none());
    }

    #[test]
    fn prometheus_annotations_follow_the_spec() {
        for (port, expected) in [(json!(8080), "8080"), (json!("8080"), "8080"), (json!("http"), "http")] {
            let app = app_spec(json!({"enabled": true, "port": port, "path": "/metrics"}));
            let meta = StandardMetadataBuilder.build(&app, &BTreeMap::new(), true);

            let annotations = meta.annotations.unwrap();
            assert_eq!(annotations[PROMETHEUS_SCRAPE_ANNOTATION], "true");
            assert_eq!(annotations[PROMETHEUS_PORT_ANNOTATION], expected);
            assert_eq!(annotations[PROMETHEUS_PATH_ANNOTATION], "/metrics");
        }
    }
}
