//! Request formatting shared by all commands.

use url::Url;

use crate::api::types::{Endpoint, SessionToken};
use crate::error::{RotationError, RotationResult};
use crate::transport::{ApiRequest, HttpMethod};

pub const API_VERSION: &str = "v2";

pub const ACTION_AUTHENTICATE: &str = "authenticate";
pub const ACTION_CLOSE_SESSION: &str = "session.close";
pub const ACTION_UPDATE_SERVER: &str = "slb.server.update";
pub const ACTION_SEARCH_SERVER: &str = "slb.server.search";
pub const ACTION_SERVER_STATISTICS: &str = "slb.server.fetchStatistics";

/// `<scheme_host>/services/rest/v2/`.
pub fn base_url(endpoint: &Endpoint) -> RotationResult<Url> {
    endpoint
        .url()
        .join(&format!("services/rest/{}/", API_VERSION))
        .map_err(|e| RotationError::Config(format!("cannot build API URL from {}: {}", endpoint, e)))
}

/// Parameters sent with every request, plus the session for authenticated actions.
pub fn base_params(action: &str, session: Option<&SessionToken>) -> Vec<(String, String)> {
    let mut params = vec![
        ("format".to_string(), "json".to_string()),
        ("method".to_string(), action.to_string()),
    ];
    if let Some(session) = session {
        params.push(("session_id".to_string(), session.as_str().to_string()));
    }
    params
}

/// Build a request for `action` with extra parameters appended in order.
pub fn build(
    method: HttpMethod,
    endpoint: &Endpoint,
    action: &str,
    session: Option<&SessionToken>,
    extra: &[(&str, String)],
) -> RotationResult<ApiRequest> {
    let mut params = base_params(action, session);
    params.extend(extra.iter().map(|(k, v)| (k.to_string(), v.clone())));

    Ok(ApiRequest {
        method,
        url: base_url(endpoint)?,
        params,
    })
}
