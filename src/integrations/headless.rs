use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::HEADLESS_JWT_EXPIRY_SECS;
use crate::error::{AppError, Result};
use crate::models::address::Address;
use crate::models::value::EncodedValue;
use crate::services::state_handler::{RawStateHandler, StateHandler};
use crate::services::state_service::StateService;

const GET_STATE_QUERY: &str = "query GetState($address: Address!) { state(address: $address) }";

#[derive(Clone, Debug)]
pub struct HeadlessJwt {
    pub issuer: String,
    pub secret: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HeadlessClaims {
    pub iss: String,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: GetStateVariables,
}

#[derive(Debug, Serialize)]
struct GetStateVariables {
    address: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<GetStateData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GetStateData {
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

/// Reads account state from a headless node over GraphQL.
#[derive(Clone, Debug)]
pub struct HeadlessStateService {
    endpoint: Url,
    jwt: Option<HeadlessJwt>,
    client: Client,
}

impl HeadlessStateService {
    pub fn new(endpoint: &str, jwt: Option<HeadlessJwt>, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| AppError::Internal(format!("Invalid headless endpoint: {}", e)))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            endpoint,
            jwt,
            client,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn bearer_token(&self) -> Result<Option<String>> {
        self.jwt
            .as_ref()
            .map(|jwt| issue_token(&jwt.issuer, &jwt.secret))
            .transpose()
    }
}

pub fn issue_token(issuer: &str, secret: &str) -> Result<String> {
    let now = Utc::now().timestamp();
    let claims = HeadlessClaims {
        iss: issuer.to_string(),
        iat: now as usize,
        exp: (now + HEADLESS_JWT_EXPIRY_SECS) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
}

fn state_request(address: &Address) -> GraphQlRequest<'static> {
    GraphQlRequest {
        query: GET_STATE_QUERY,
        variables: GetStateVariables {
            address: address.to_string(),
        },
    }
}

fn parse_state_response(address: &Address, response: GraphQlResponse) -> Result<Option<EncodedValue>> {
    if !response.errors.is_empty() {
        let messages: Vec<_> = response.errors.into_iter().map(|e| e.message).collect();
        return Err(AppError::StateService(messages.join("; ")));
    }

    match response.data.and_then(|data| data.state) {
        Some(hex) => RawStateHandler
            .convert_hex(*address, &hex)
            .map(|data| Some(data.state)),
        None => Ok(None),
    }
}

#[async_trait]
impl StateService for HeadlessStateService {
    async fn get_state(&self, address: &Address) -> Result<Option<EncodedValue>> {
        let mut req = self.client.post(self.endpoint.clone()).json(&state_request(address));
        if let Some(token) = self.bearer_token()? {
            req = req.bearer_auth(token);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| AppError::StateService(format!("headless request failed: {}", e)))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::StateService(format!(
                "headless returned {} for {}",
                status, address
            )));
        }

        let payload: GraphQlResponse = resp
            .json()
            .await
            .map_err(|e| AppError::StateService(format!("invalid headless response: {}", e)))?;

        let state = parse_state_response(address, payload)?;
        tracing::debug!(
            "Headless state at {}: {}",
            address,
            state.as_ref().map(|v| v.kind().to_string()).unwrap_or_else(|| "absent".to_string())
        );
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

    use super::*;
    use crate::codec::bencodex;

    #[test]
    fn request_carries_query_and_address_variable() {
        let address = Address::new([0xab; 20]);
        let body = serde_json::to_value(state_request(&address)).unwrap();
        assert!(body["query"].as_str().unwrap().contains("state(address: $address)"));
        assert_eq!(body["variables"]["address"], address.to_string());
    }

    const ADDRESS: Address = Address::new([0xcd; 20]);

    #[test]
    fn parses_hex_state_and_null() {
        let hex = bencodex::encode_hex(&EncodedValue::text("id\n1"));
        let response: GraphQlResponse =
            serde_json::from_value(serde_json::json!({ "data": { "state": hex } })).unwrap();
        assert_eq!(parse_state_response(&ADDRESS, response).unwrap(), Some(EncodedValue::text("id\n1")));

        let response: GraphQlResponse =
            serde_json::from_value(serde_json::json!({ "data": { "state": null } })).unwrap();
        assert_eq!(parse_state_response(&ADDRESS, response).unwrap(), None);
    }

    #[test]
    fn graphql_errors_are_service_errors() {
        let response: GraphQlResponse = serde_json::from_value(serde_json::json!({
            "data": null,
            "errors": [{ "message": "boom" }, { "message": "again" }]
        }))
        .unwrap();
        match parse_state_response(&ADDRESS, response).unwrap_err() {
            AppError::StateService(message) => assert_eq!(message, "boom; again"),
            other => panic!("expected StateService, got {other:?}"),
        }
    }

    #[test]
    fn undecodable_state_is_codec_error() {
        let response: GraphQlResponse =
            serde_json::from_value(serde_json::json!({ "data": { "state": "6e6e" } })).unwrap();
        assert!(matches!(parse_state_response(&ADDRESS, response), Err(AppError::Codec(_))));
    }

    #[test]
    fn token_is_signed_for_issuer() {
        let token = issue_token("arena-sim", "secret").unwrap();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&["arena-sim"]);
        let data = decode::<HeadlessClaims>(
            &token,
            &DecodingKey::from_secret("secret".as_bytes()),
            &validation,
        )
        .unwrap();
        assert_eq!(data.claims.iss, "arena-sim");
        assert_eq!(data.claims.exp - data.claims.iat, HEADLESS_JWT_EXPIRY_SECS as usize);
    }

    #[test]
    fn rejects_unparseable_endpoint() {
        assert!(HeadlessStateService::new("not a url", None, Duration::from_secs(1)).is_err());
        let service =
            HeadlessStateService::new("http://localhost:31280/graphql", None, Duration::from_secs(1))
                .unwrap();
        assert_eq!(service.endpoint().path(), "/graphql");
        assert!(service.bearer_token().unwrap().is_none());
    }
}
