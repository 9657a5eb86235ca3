/*
This file contains the application specification
consumed by the deployer: the declarative description
of one application and all its nested parts.
*/

use serde::{
    Deserialize,
    Serialize
};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;



/*
Application specification
*/
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct AppSpec {
    /*
    Application name, also used as the name of
    the Deployment, the container and the config map
    */
    pub name: String,
    /*
    Namespace where the Deployment lives
    */
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /*
    Container image reference (repo:tag)
    */
    pub image: String,
    /*
    Static number of replicas, also the autoscaler maximum
    */
    pub replicas: i32,
    #[serde(default)]
    pub autoscaler: AutoscalerSpec,
    #[serde(default)]
    pub resources: ResourcesSpec,
    pub health_checks: HealthCheckSpec,
    #[serde(default)]
    pub prometheus: PrometheusSpec,
    #[serde(default)]
    pub config: ConfigMapSpec,
    /*
    Run the pods with the privileged service account
    */
    #[serde(default)]
    pub admin_access: bool,
    #[serde(default)]
    pub ports: Vec<PortSpec>,
}

fn default_namespace() -> String {
    "default".to_string()
}

impl AppSpec {
    /*
    This function returns the tag portion of the image
    reference, or "latest" when the image carries no tag.
    A registry port (host:5000/repo) is not a tag.
    */
    pub fn version(&self) -> &str {
        let last_segment = self.image.rsplit('/').next().unwrap_or(&self.image);
        match last_segment.rsplit_once(':') {
            Some((_, tag)) if !tag.is_empty() => tag,
            _ => "latest",
        }
    }
}

/*
Liveness and readiness checks
*/
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct HealthCheckSpec {
    pub liveness: CheckSpec,
    pub readiness: CheckSpec,
}

/*
Health check specification.
Exactly one of http, tcp and execute must be set; the
constructors below can only build such values, documents
read from disk are checked when the probe is built.
*/
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct CheckSpec {
    #[serde(default)]
    pub http: Option<HttpCheckSpec>,
    #[serde(default)]
    pub tcp: Option<TcpCheckSpec>,
    #[serde(default)]
    pub execute: Option<ExecuteCheckSpec>,
    #[serde(default = "default_initial_delay")]
    pub initial_delay_seconds: u32,
    #[serde(default = "default_period")]
    pub period_seconds: u32,
    #[serde(default = "default_success_threshold")]
    pub success_threshold: u32,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
}

fn default_initial_delay() -> u32 { 10 }
fn default_period() -> u32 { 10 }
fn default_success_threshold() -> u32 { 1 }
fn default_timeout() -> u32 { 1 }

impl CheckSpec {
    pub fn http(check: HttpCheckSpec) -> Self {
        Self {
            http: Some(check),
            ..Self::empty()
        }
    }

    pub fn tcp(check: TcpCheckSpec) -> Self {
        Self {
            tcp: Some(check),
            ..Self::empty()
        }
    }

    pub fn execute(check: ExecuteCheckSpec) -> Self {
        Self {
            execute: Some(check),
            ..Self::empty()
        }
    }

    pub fn with_timings(mut self, initial_delay_seconds: u32, period_seconds: u32, success_threshold: u32, timeout_seconds: u32) -> Self {
        self.initial_delay_seconds = initial_delay_seconds;
        self.period_seconds = period_seconds;
        self.success_threshold = success_threshold;
        self.timeout_seconds = timeout_seconds;
        self
    }

    fn empty() -> Self {
        Self {
            http: None,
            tcp: None,
            execute: None,
            initial_delay_seconds: default_initial_delay(),
            period_seconds: default_period(),
            success_threshold: default_success_threshold(),
            timeout_seconds: default_timeout(),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct HttpCheckSpec {
    pub path: String,
    /*
    Numeric port or port name, never resolved here
    */
    pub port: IntOrString,
    /*
    Headers in the order they must be sent
    */
    #[serde(default)]
    pub http_headers: Vec<HttpHeaderSpec>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct HttpHeaderSpec {
    pub name: String,
    pub value: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct TcpCheckSpec {
    pub port: IntOrString,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct ExecuteCheckSpec {
    pub command: Vec<String>,
}

/*
Horizontal autoscaling specification.
The maximum number of replicas is AppSpec.replicas.
*/
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct AutoscalerSpec {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_min_replicas")]
    pub min_replicas: i32,
    #[serde(default = "default_cpu_threshold")]
    pub cpu_threshold_percentage: u32,
}

fn default_min_replicas() -> i32 { 2 }
fn default_cpu_threshold() -> u32 { 50 }

impl Default for AutoscalerSpec {
    fn default() -> Self {
        Self {
            enabled: false,
            min_replicas: default_min_replicas(),
            cpu_threshold_percentage: default_cpu_threshold(),
        }
    }
}

/*
Resource requests and limits, every value is optional
*/
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct ResourcesSpec {
    #[serde(default)]
    pub requests: ResourceRequirementSpec,
    #[serde(default)]
    pub limits: ResourceRequirementSpec,
}

impl ResourcesSpec {
    /*
    A CPU request is what makes CPU based autoscaling possible.
    */
    pub fn has_cpu_request(&self) -> bool {
        self.requests.cpu.is_some()
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct ResourceRequirementSpec {
    #[serde(default)]
    pub cpu: Option<String>,
    #[serde(default)]
    pub memory: Option<String>,
}

/*
Prometheus scraping specification
*/
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct PrometheusSpec {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_prometheus_port")]
    pub port: IntOrString,
    #[serde(default = "default_prometheus_path")]
    pub path: String,
}

fn default_true() -> bool { true }
fn default_prometheus_port() -> IntOrString { IntOrString::String("http".to_string()) }
fn default_prometheus_path() -> String { "/internal-backstage/prometheus".to_string() }

impl Default for PrometheusSpec {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_prometheus_port(),
            path: default_prometheus_path(),
        }
    }
}

/*
Config map usage: mounted as a volume and/or
exposed key by key as environment variables
*/
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct ConfigMapSpec {
    #[serde(default)]
    pub volume: bool,
    #[serde(default)]
    pub envs: Vec<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct PortSpec {
    #[serde(default = "default_protocol")]
    pub protocol: String,
    pub name: String,
    /*
    Port exposed by the service
    */
    pub port: i32,
    /*
    Port the container listens on
    */
    pub target_port: i32,
}

fn default_protocol() -> String { "http".to_string() }
