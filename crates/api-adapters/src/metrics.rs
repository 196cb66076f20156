use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

use crate::methods::METHODS;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct CallLabels {
    pub method: String,
    pub outcome: String,
}

/// RPC call counters, exposed as `forum_rpc_calls_total`.
pub struct Metrics {
    registry: Registry,
    calls: Family<CallLabels, Counter>,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();
        let calls = Family::<CallLabels, Counter>::default();
        registry.register(
            "forum_rpc_calls",
            "RPC calls by method and outcome",
            calls.clone(),
        );
        Self { registry, calls }
    }

    /// Counts one call. Unknown method names share a single label value.
    pub fn record(&self, method: &str, outcome: &str) {
        let method = if METHODS.contains(&method) { method } else { "unknown" };
        self.calls
            .get_or_create(&CallLabels {
                method: method.to_string(),
                outcome: outcome.to_string(),
            })
            .inc();
    }

    /// Current values in the OpenMetrics text format.
    pub fn encode(&self) -> Result<String, std::fmt::Error> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry)?;
        Ok(buffer)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
