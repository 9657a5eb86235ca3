/*
This File contains the fixed policy values applied
to every Deployment produced by the deployer.
*/



/*
Service accounts: applications get no API access
unless they explicitly ask for it
*/
pub const NO_ACCESS_SERVICE_ACCOUNT: &str = "fiaas-no-access";
pub const ADMIN_SERVICE_ACCOUNT: &str = "default";

/*
Pod level policies
*/
pub const DNS_POLICY: &str = "ClusterFirst";
pub const RESTART_POLICY: &str = "Always";
pub const IMAGE_PULL_POLICY: &str = "IfNotPresent";
pub const CONTAINER_PORT_PROTOCOL: &str = "TCP";
pub const REVISION_HISTORY_LIMIT: i32 = 5;

/*
Where the application config map is mounted
*/
pub const CONFIG_MOUNT_PATH: &str = "/var/run/config/fiaas/";

/*
Platform tag used in CONSTRETTO_TAGS
*/
pub const PLATFORM: &str = "kubernetes";

/*
Prefix of the duplicated global environment variables
*/
pub const GLOBAL_ENV_PREFIX: &str = "FIAAS_";

/*
Prometheus scraping annotations
*/
pub const PROMETHEUS_SCRAPE_ANNOTATION: &str = "prometheus.io/scrape";
pub const PROMETHEUS_PORT_ANNOTATION: &str = "prometheus.io/port";
pub const PROMETHEUS_PATH_ANNOTATION: &str = "prometheus.io/path";
