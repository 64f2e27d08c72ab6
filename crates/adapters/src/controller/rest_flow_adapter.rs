use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use domain::common::error::DomainError;
use domain::datapath::entity::{DatapathId, FlowAction, FlowMatch, FlowRule};
use domain::datapath::error::DatapathError;
use ports::secondary::flow_rule_port::FlowRulePort;
use serde_json::{Map, Value, json};

use super::{controller_client, normalize_base_url, request_error};

/// `ofp_controller_max_len` meaning "send the whole packet, unbuffered".
const OFPCML_NO_BUFFER: u32 = 0xffff;

/// Installs flow rules through the controller's
/// `POST /stats/flowentry/add` endpoint.
pub struct RestFlowRuleAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl RestFlowRuleAdapter {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DomainError> {
        Ok(Self::with_client(controller_client(timeout)?, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: normalize_base_url(base_url),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/stats/flowentry/add", self.base_url)
    }

    async fn do_install(&self, dpid: DatapathId, rule: &FlowRule) -> Result<(), DomainError> {
        let body = flow_entry_body(dpid, rule);
        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| request_error(&format!("install on {dpid}"), &e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(DatapathError::InstallFailed {
                dpid: dpid.to_string(),
                reason: format!("HTTP {status}: {}", detail.trim()),
            }
            .into());
        }

        tracing::debug!(
            dpid = %dpid,
            priority = rule.priority,
            drop = rule.is_drop(),
            "flow rule accepted by controller"
        );
        Ok(())
    }
}

impl FlowRulePort for RestFlowRuleAdapter {
    fn install_rule<'a>(
        &'a self,
        dpid: DatapathId,
        rule: &'a FlowRule,
    ) -> Pin<Box<dyn Future<Output = Result<(), DomainError>> + Send + 'a>> {
        Box::pin(self.do_install(dpid, rule))
    }
}

/// JSON body of a `flowentry/add` request.
pub(crate) fn flow_entry_body(dpid: DatapathId, rule: &FlowRule) -> Value {
    let mut flow_match = Map::new();
    if let Some(eth_type) = rule.flow_match.eth_type() {
        flow_match.insert("eth_type".to_string(), json!(eth_type));
    }
    match rule.flow_match {
        FlowMatch::Any => {}
        FlowMatch::Ipv4Source(ip) => {
            flow_match.insert("ipv4_src".to_string(), json!(ip.to_string()));
        }
        FlowMatch::Ipv6Source(ip) => {
            flow_match.insert("ipv6_src".to_string(), json!(ip.to_string()));
        }
    }

    let actions: Vec<Value> = rule
        .actions
        .iter()
        .map(|action| match action {
            FlowAction::OutputController => json!({
                "type": "OUTPUT",
                "port": "CONTROLLER",
                "max_len": OFPCML_NO_BUFFER,
            }),
        })
        .collect();

    json!({
        "dpid": dpid.0,
        "priority": rule.priority,
        "match": flow_match,
        "actions": actions,
    })
}
