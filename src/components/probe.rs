/*
This file contains the component in charge
of turning a health check specification into
a Kubernetes container probe.
*/

use k8s_openapi::api::core::v1::{
    Probe,
    HTTPGetAction,
    HTTPHeader,
    TCPSocketAction,
    ExecAction
};

use crate::error::{
    DeployError,
    DeployResult
};
use crate::utils::appspec::{
    CheckSpec,
    HttpCheckSpec,
    TcpCheckSpec,
    ExecuteCheckSpec
};



/*
The single handler selected out of a CheckSpec
*/
enum Check<'a> {
    Http(&'a HttpCheckSpec),
    Tcp(&'a TcpCheckSpec),
    Execute(&'a ExecuteCheckSpec),
}

/*
This function selects the only handler set in the
CheckSpec. No handler at all and more than one handler
are both rejected.
*/
fn select_check(check_spec: &CheckSpec) -> DeployResult<Check<'_>> {
    let mut candidates: Vec<Check<'_>> = [
        check_spec.http.as_ref().map(Check::Http),
        check_spec.tcp.as_ref().map(Check::Tcp),
        check_spec.execute.as_ref().map(Check::Execute),
    ]
    .into_iter()
    .flatten()
    .collect();

    if candidates.len() > 1 {
        return Err(DeployError::Validation(format!(
            "health check must define exactly one of http, tcp or execute, found {}",
            candidates.len()
        )));
    }
    candidates.pop().ok_or_else(|| {
        DeployError::Validation("health check must define one of http, tcp or execute".to_string())
    })
}

fn seconds(field: &str, value: u32) -> DeployResult<i32> {
    i32::try_from(value).map_err(|_| {
        DeployError::Validation(format!("health check {} is out of range: {}", field, value))
    })
}

/*
This function builds the container probe for a health check.
Ports and header values are copied verbatim: a named port
is resolved by Kubernetes, not here.
*/
pub fn build_probe(check_spec: &CheckSpec) -> DeployResult<Probe> {
    let mut probe = Probe {
        initial_delay_seconds: Some(seconds("initial_delay_seconds", check_spec.initial_delay_seconds)?),
        period_seconds: Some(seconds("period_seconds", check_spec.period_seconds)?),
        success_threshold: Some(seconds("success_threshold", check_spec.success_threshold)?),
        timeout_seconds: Some(seconds("timeout_seconds", check_spec.timeout_seconds)?),
        ..Default::default()
    };

    match select_check(check_spec)? {
        Check::Http(http) => {
            probe.http_get = Some(HTTPGetAction {
                host: None,
                scheme: Some("HTTP".to_string()),
                path: Some(http.path.clone()),
                port: http.port.clone(),
                http_headers: Some(
                    http.http_headers
                        .iter()
                        .map(|header| HTTPHeader {
                            name: header.name.clone(),
                            value: header.value.clone(),
                        })
                        .collect()
                ),
            });
        }
        Check::Tcp(tcp) => {
            probe.tcp_socket = Some(TCPSocketAction {
                host: None,
                port: tcp.port.clone(),
            });
        }
        Check::Execute(execute) => {
            probe.exec = Some(ExecAction {
                command: Some(execute.command.clone()),
            });
        }
    }

    Ok(probe)
}
