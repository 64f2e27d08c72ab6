use std::future::Future;
use std::pin::Pin;

use domain::common::error::DomainError;
use domain::datapath::entity::{DatapathId, FlowRule};

/// Secondary port for installing flow rules on a datapath through the
/// fabric controller.
///
/// Uses `Pin<Box<dyn Future>>` so the trait stays dyn-compatible and can
/// be shared as `Arc<dyn FlowRulePort>`.
pub trait FlowRulePort: Send + Sync {
    /// Install `rule` on datapath `dpid`. Success means the controller
    /// accepted the rule; packet drops are never acknowledged.
    fn install_rule<'a>(
        &'a self,
        dpid: DatapathId,
        rule: &'a FlowRule,
    ) -> Pin<Box<dyn Future<Output = Result<(), DomainError>> + Send + 'a>>;
}
