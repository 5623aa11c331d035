// self
use crate::{
	_prelude::*,
	obs::{FlowKind, FlowOutcome},
};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"pkce_login_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Counts a failed flow half under the gate that stopped it.
pub fn record_flow_failure(kind: FlowKind, err: &Error) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"pkce_login_flow_failures_total",
			"flow" => kind.as_str(),
			"reason" => failure_reason(err)
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, err);
	}
}

/// Stable, low-cardinality label for the gate behind `err`.
pub fn failure_reason(err: &Error) -> &'static str {
	match err {
		Error::ConfigMissing => "config_missing",
		Error::InvalidIssuer { .. } => "invalid_issuer",
		Error::MissingClientId => "missing_client_id",
		Error::DiscoveryFailed(_) => "discovery_failed",
		Error::MissingAuthEndpoint => "missing_auth_endpoint",
		Error::MissingTokenEndpoint => "missing_token_endpoint",
		Error::MissingVerifier => "missing_verifier",
		Error::InvalidQueryParams { .. } => "invalid_query_params",
		Error::MissingCode => "missing_code",
		Error::AuthResponseInvalid(_) => "auth_response_invalid",
		Error::AuthChallenge { .. } => "auth_challenge",
		Error::TokenExchange { .. } => "token_exchange",
		Error::MissingIdToken => "missing_id_token",
		Error::InvalidRedirect { .. } => "invalid_redirect",
		Error::Storage(_) => "storage",
		Error::Browser(_) => "browser",
		Error::Transport(_) => "transport",
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::AuthResponseError;

	#[test]
	fn record_flow_outcome_noop_without_metrics() {
		record_flow_outcome(FlowKind::Callback, FlowOutcome::Failure);
		record_flow_failure(FlowKind::Callback, &Error::MissingVerifier);
	}

	#[test]
	fn failure_reasons_name_the_gate_not_the_payload() {
		assert_eq!(failure_reason(&Error::MissingVerifier), "missing_verifier");
		assert_eq!(
			failure_reason(&Error::TokenExchange { description: "bad verifier".into() }),
			"token_exchange"
		);
		assert_eq!(
			failure_reason(&AuthResponseError::UnexpectedState.into()),
			"auth_response_invalid"
		);
	}
}
