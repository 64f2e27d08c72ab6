use std::future::Future;
use std::pin::Pin;

use domain::common::error::DomainError;
use domain::datapath::entity::{DatapathId, FlowRule};
use ports::secondary::flow_rule_port::FlowRulePort;

use super::rest_flow_adapter::flow_entry_body;

/// Dry-run flow rule port: logs the request it would send and reports
/// success.
pub struct LogFlowRuleAdapter;

impl FlowRulePort for LogFlowRuleAdapter {
    fn install_rule<'a>(
        &'a self,
        dpid: DatapathId,
        rule: &'a FlowRule,
    ) -> Pin<Box<dyn Future<Output = Result<(), DomainError>> + Send + 'a>> {
        Box::pin(async move {
            tracing::info!(
                dpid = %dpid,
                priority = rule.priority,
                drop = rule.is_drop(),
                body = %flow_entry_body(dpid, rule),
                "dry run: flow rule not installed"
            );
            Ok(())
        })
    }
}
