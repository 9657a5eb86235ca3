/*
This file contains the deployer entrypoint.
It reads the configuration and the application specs
given on the command line, then deploys every application
to the cluster, each one independently of the others.
*/

use std::{
    env,
    fs,
    sync::Arc,
    collections::BTreeMap
};
use anyhow::{
    Context,
    Result,
    bail
};
use futures::future::join_all;
use kube::Client;
use tracing::{
    info,
    error
};
use tracing_subscriber::EnvFilter;

use fiaas_deployer::{
    AppSpec,
    DeploymentReconciler,
    ManifestComposer,
    KubeDeploymentApi,
    StandardMetadataBuilder
};
use fiaas_deployer::utils::configuration::get_deployer_configuration;

const DEPLOYED_BY_LABEL: &str = "fiaas/deployed_by";
const DEPLOYED_BY: &str = "fiaas-deployer";



#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    /*
    We must first retrieve the deployer configuration
    and the application specs to deploy.
    */
    let config = get_deployer_configuration();
    info!("{}", config);

    let paths: Vec<String> = env::args().skip(1).collect();
    if paths.is_empty() {
        bail!("usage: fiaas-deployer <app-spec.json>...");
    }
    let (app_specs, unreadable) = read_app_specs(&paths);

    /*
    We create the client to interact with
    the Kubernetes API Server.
    */
    let client = Client::try_default().await?;
    let reconciler = DeploymentReconciler::new(
        ManifestComposer::new(config, Arc::new(StandardMetadataBuilder)),
        Arc::new(KubeDeploymentApi::new(client))
    );

    /*
    Applications share no state, so they are deployed concurrently.
    A failed application does not stop the others.
    */
    let outcomes = join_all(app_specs.iter().map(|app_spec| deploy(&reconciler, app_spec))).await;
    let failed = unreadable + outcomes.iter().filter(|ok| !**ok).count();
    if failed > 0 {
        bail!("{} of {} deploys failed", failed, paths.len());
    }

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if env::var("LOG_FORMAT").as_deref() == Ok("json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

/*
Reads every application spec. A file that cannot be read or parsed
is logged and counted, the remaining specs are still returned.
*/
fn read_app_specs(paths: &[String]) -> (Vec<AppSpec>, usize) {
    let mut app_specs = Vec::with_capacity(paths.len());
    let mut unreadable = 0;
    for path in paths {
        match read_app_spec(path) {
            Ok(app_spec) => app_specs.push(app_spec),
            Err(e) => {
                error!(path = %path, "deploy failed: {:#}", e);
                unreadable += 1;
            }
        }
    }
    (app_specs, unreadable)
}

fn read_app_spec(path: &str) -> Result<AppSpec> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading app spec {}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing app spec {}", path))
}

async fn deploy(reconciler: &DeploymentReconciler, app_spec: &AppSpec) -> bool {
    let selector = BTreeMap::from([("app".to_string(), app_spec.name.clone())]);
    let mut labels = selector.clone();
    labels.insert(DEPLOYED_BY_LABEL.to_string(), DEPLOYED_BY.to_string());

    match reconciler.deploy(app_spec, &selector, &labels).await {
        Ok(action) => {
            info!(app = %app_spec.name, ?action, "deploy finished");
            true
        }
        Err(e) => {
            error!(app = %app_spec.name, "deploy failed: {}", e);
            false
        }
    }
}



#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write(dir: &Path, name: &str, contents: &str) -> String {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn broken_files_are_counted_and_valid_specs_kept() {
        let dir = tempfile::tempdir().unwrap();
        let valid = write(dir.path(), "valid.json", r#"{
            "name": "testapp",
            "image": "finntech/testimage:version",
            "replicas": 2,
            "health_checks": {
                "liveness": {"tcp": {"port": 8080}},
                "readiness": {"http": {"path": "/", "port": 8080}}
            }
        }"#);
        let malformed = write(dir.path(), "malformed.json", "{\"name\": ");
        let missing = dir.path().join("missing.json").to_string_lossy().into_owned();

        let (app_specs, unreadable) = read_app_specs(&[malformed, valid, missing]);

        assert_eq!(unreadable, 2);
        assert_eq!(app_specs.len(), 1);
        assert_eq!(app_specs[0].name, "testapp");
    }

    #[test]
    fn all_valid_files_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<String> = ["first", "second"]
            .iter()
            .map(|name| write(
                dir.path(),
                &format!("{}.json", name),
                &format!(r#"{{"name": "{}", "image": "finntech/testimage:1", "replicas": 1, "health_checks": {{"liveness": {{"tcp": {{"port": 8080}}}}, "readiness": {{"tcp": {{"port": 8080}}}}}}}}"#, name)
            ))
            .collect();

        let (app_specs, unreadable) = read_app_specs(&paths);

        assert_eq!(unreadable, 0);
        let names: Vec<&str> = app_specs.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }
}
