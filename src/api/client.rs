use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Response, header};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, instrument, trace};
use url::Url;

use super::{
    ApiError, CancelOrderRequest, CancelOrderResponse, CreateListingRequest,
    CreateListingResponse, CreateOfferRequest, CreateOfferResponse, GetOrderRequest,
    GetOrderResponse, GetOrderbookFeeRequest, GetOrderbookFeeResponse,
    GetSupportedCurrenciesRequest, GetSupportedCurrenciesResponse, OrderbookApi,
};

/// Header the order-book service expects the API key in (`Api-Key`).
pub const API_KEY_HEADER: &str = "api-key";

#[derive(Clone, derive_more::Debug)]
pub struct ApiClientOptions {
    pub base_url: Url,
    #[debug(skip)]
    pub api_key: Option<String>,
    pub default_headers: HashMap<String, String>,
    pub timeout: Option<Duration>,
}

impl ApiClientOptions {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            api_key: None,
            default_headers: HashMap::new(),
            timeout: None,
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// HTTP client of the order-book service.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http_client: Client,
    url: Url,
}

impl ApiClient {
    pub fn new(options: &ApiClientOptions) -> Result<Self, ApiError> {
        if options.base_url.cannot_be_a_base() {
            return Err(ApiError::UrlParsing(
                options.base_url.to_string(),
                "not a base url".to_string(),
            ));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        for (name, value) in &options.default_headers {
            let name = header::HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::FormatRequest(format!("Invalid header name: {e}")))?;
            let value = header::HeaderValue::from_str(value)
                .map_err(|e| ApiError::FormatRequest(format!("Invalid header value: {e}")))?;
            headers.insert(name, value);
        }
        if let Some(key) = options.api_key.as_deref() {
            let mut key_value = header::HeaderValue::from_str(key)
                .map_err(|e| ApiError::FormatRequest(format!("Invalid API key format: {e}")))?;
            key_value.set_sensitive(true);
            headers.insert(header::HeaderName::from_static(API_KEY_HEADER), key_value);
        }

        let mut builder = ClientBuilder::new().default_headers(headers);
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| ApiError::HttpClient(e.to_string(), e))?;

        Ok(Self {
            http_client,
            url: options.base_url.clone(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::UrlParsing(self.url.to_string(), "not a base url".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        debug!(%url, "GET order-book");
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::HttpClient(e.to_string(), e))?;
        Self::parse(Self::error_for_response(response).await?).await
    }

    async fn post<B, T>(&self, segments: &[&str], body: &B) -> Result<T, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        debug!(%url, "POST order-book");
        let body =
            serde_json::to_vec(body).map_err(|e| ApiError::FormatRequest(e.to_string()))?;
        let response = self
            .http_client
            .post(url)
            .body(body)
            .send()
            .await
            .map_err(|e| ApiError::HttpClient(e.to_string(), e))?;
        Self::parse(Self::error_for_response(response).await?).await
    }

    async fn error_for_response(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let reason = status.canonical_reason().unwrap_or_default().to_string();
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::status(status.as_u16(), reason, &body))
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::ParseResponse(e.to_string()))?;
        trace!(%body, "order-book response");
        serde_json::from_str(&body)
            .map_err(|err| ApiError::ParseResponse(format!("Error: {err}, Body: {body}")))
    }

    async fn get_order(
        &self,
        kind: &str,
        request: &GetOrderRequest,
    ) -> Result<Option<GetOrderResponse>, ApiError> {
        let fulfiller = request.fulfiller_address.to_string();
        match self
            .get(&["v1", "orderbook", kind, &request.order_id, &fulfiller])
            .await
        {
            Ok(order) => Ok(Some(order)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl OrderbookApi for ApiClient {
    #[instrument(skip_all)]
    async fn create_listing(
        &self,
        request: &CreateListingRequest,
    ) -> Result<CreateListingResponse, ApiError> {
        self.post(&["v1", "orderbook", "list"], request).await
    }

    #[instrument(skip_all)]
    async fn create_offer(
        &self,
        request: &CreateOfferRequest,
    ) -> Result<CreateOfferResponse, ApiError> {
        self.post(&["v1", "orderbook", "offer"], request).await
    }

    #[instrument(skip(self), fields(order_id = %request.order_id))]
    async fn get_listing(
        &self,
        request: &GetOrderRequest,
    ) -> Result<Option<GetOrderResponse>, ApiError> {
        self.get_order("listing", request).await
    }

    #[instrument(skip(self), fields(order_id = %request.order_id))]
    async fn get_offer(
        &self,
        request: &GetOrderRequest,
    ) -> Result<Option<GetOrderResponse>, ApiError> {
        self.get_order("offer", request).await
    }

    #[instrument(skip(self))]
    async fn get_orderbook_fee(
        &self,
        request: &GetOrderbookFeeRequest,
    ) -> Result<GetOrderbookFeeResponse, ApiError> {
        let orderbook = request.orderbook.to_string();
        let chain_id = request.chain_id.to_string();
        let contract = request.contract_address.to_string();
        self.get(&["v1", "orderbook", "fee", &orderbook, &chain_id, &contract])
            .await
    }

    #[instrument(skip(self))]
    async fn get_supported_currencies(
        &self,
        request: &GetSupportedCurrenciesRequest,
    ) -> Result<GetSupportedCurrenciesResponse, ApiError> {
        let chain_id = request.chain_id.to_string();
        let contract = request.contract_address.to_string();
        let orderbook = request.orderbook.to_string();
        self.get(&[
            "v1",
            "orderbook",
            "currencies",
            &chain_id,
            &contract,
            &orderbook,
        ])
        .await
    }

    #[instrument(skip(self), fields(order_id = %request.order_id))]
    async fn cancel_listing(
        &self,
        request: &CancelOrderRequest,
    ) -> Result<CancelOrderResponse, ApiError> {
        self.post(&["v1", "orderbook", "listing", "cancel"], request)
            .await
    }

    #[instrument(skip(self), fields(order_id = %request.order_id))]
    async fn cancel_offer(
        &self,
        request: &CancelOrderRequest,
    ) -> Result<CancelOrderResponse, ApiError> {
        self.post(&["v1", "orderbook", "offer", "cancel"], request)
            .await
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{Address, Bytes, address};
    use mockito::{Matcher, Server};

    use super::*;
    use crate::{api::MAX_ERROR_BODY_LEN, chain::Caip2ChainId, types::OrderbookType};

    const ORDER_JSON: &str = r#"{
        "signature": "0x1234",
        "parameters": {
            "offerer": "0x1111111111111111111111111111111111111111",
            "zone": "0x0000000000000000000000000000000000000000",
            "offer": [],
            "consideration": [],
            "orderType": 0,
            "startTime": "1",
            "endTime": "2",
            "zoneHash": "0x0000000000000000000000000000000000000000000000000000000000000000",
            "salt": "3",
            "conduitKey": "0x0000000000000000000000000000000000000000000000000000000000000000",
            "counter": "0"
        }
    }"#;

    fn client(server: &Server) -> ApiClient {
        let options = ApiClientOptions::new(server.url().parse().unwrap())
            .with_api_key(Some("secret".to_string()));
        ApiClient::new(&options).expect("create client")
    }

    fn order_request(order_id: &str) -> GetOrderRequest {
        GetOrderRequest {
            order_id: order_id.to_string(),
            fulfiller_address: address!("0x2222222222222222222222222222222222222222"),
        }
    }

    #[tokio::test]
    async fn test_get_listing() {
        let mut server = Server::new_async().await;
        let mocked = server
            .mock(
                "GET",
                "/v1/orderbook/listing/abc/0x2222222222222222222222222222222222222222",
            )
            .match_header(API_KEY_HEADER, "secret")
            .expect(1)
            .with_body(ORDER_JSON)
            .create_async()
            .await;

        let listing = client(&server)
            .get_listing(&order_request("abc"))
            .await
            .expect("get listing")
            .expect("listing exists");

        mocked.assert_async().await;
        assert_eq!(listing.signature, Bytes::from_static(&[0x12, 0x34]));
        assert_eq!(
            listing.parameters.offerer,
            address!("0x1111111111111111111111111111111111111111")
        );
    }

    #[tokio::test]
    async fn test_missing_offer_is_none() {
        let mut server = Server::new_async().await;
        let mocked = server
            .mock("GET", Matcher::Regex(r"^/v1/orderbook/offer/".to_string()))
            .with_status(404)
            .with_body(r#"{"message":"not found"}"#)
            .create_async()
            .await;

        let offer = client(&server)
            .get_offer(&order_request("missing"))
            .await
            .expect("no error on 404");

        mocked.assert_async().await;
        assert!(offer.is_none());
    }

    #[tokio::test]
    async fn test_error_status_truncates_body() {
        let mut server = Server::new_async().await;
        let long_body = format!(r#"{{"message":"{}"}}"#, "x".repeat(500));
        server
            .mock("POST", "/v1/orderbook/list")
            .with_status(500)
            .with_body(long_body)
            .create_async()
            .await;

        let request = CreateListingRequest {
            signature: Bytes::from_static(&[1]),
            orderbook: OrderbookType::Doma,
            chain_id: Caip2ChainId::new(97476),
            parameters: serde_json::from_str::<GetOrderResponse>(ORDER_JSON)
                .unwrap()
                .parameters,
        };
        let err = client(&server)
            .create_listing(&request)
            .await
            .expect_err("server error");

        match err {
            ApiError::Status { status, body, .. } => {
                assert_eq!(status, 500);
                assert_eq!(body.chars().count(), MAX_ERROR_BODY_LEN);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_listing_body() {
        let mut server = Server::new_async().await;
        let mocked = server
            .mock("POST", "/v1/orderbook/list")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "orderbook": "DOMA",
                "chainId": "eip155:97476",
                "signature": "0x01",
            })))
            .with_body(r#"{"orderId":"order-1","fulFillerAddress":"0x0"}"#)
            .create_async()
            .await;

        let request = CreateListingRequest {
            signature: Bytes::from_static(&[1]),
            orderbook: OrderbookType::Doma,
            chain_id: Caip2ChainId::new(97476),
            parameters: serde_json::from_str::<GetOrderResponse>(ORDER_JSON)
                .unwrap()
                .parameters,
        };
        let response = client(&server)
            .create_listing(&request)
            .await
            .expect("create listing");

        mocked.assert_async().await;
        assert_eq!(response.order_id, "order-1");
    }

    #[tokio::test]
    async fn test_fee_and_currencies_paths() {
        let mut server = Server::new_async().await;
        let contract = Address::repeat_byte(0x33);
        let fee_mock = server
            .mock(
                "GET",
                format!("/v1/orderbook/fee/DOMA/eip155:1/{contract}").as_str(),
            )
            .with_body(
                r#"{"marketplaceFees":[{"recipient":"0x4444444444444444444444444444444444444444","basisPoints":50,"feeType":"DOMA"}]}"#,
            )
            .create_async()
            .await;
        let currencies_mock = server
            .mock(
                "GET",
                format!("/v1/orderbook/currencies/eip155:1/{contract}/DOMA").as_str(),
            )
            .with_body(
                r#"{"currencies":[{"contractAddress":"0x0000000000000000000000000000000000000000","name":"Ether","symbol":"ETH","decimals":18}]}"#,
            )
            .create_async()
            .await;

        let client = client(&server);
        let fees = client
            .get_orderbook_fee(&GetOrderbookFeeRequest {
                contract_address: contract,
                orderbook: OrderbookType::Doma,
                chain_id: Caip2ChainId::new(1),
            })
            .await
            .expect("fees");
        let currencies = client
            .get_supported_currencies(&GetSupportedCurrenciesRequest {
                chain_id: Caip2ChainId::new(1),
                orderbook: OrderbookType::Doma,
                contract_address: contract,
            })
            .await
            .expect("currencies");

        fee_mock.assert_async().await;
        currencies_mock.assert_async().await;
        assert_eq!(fees.marketplace_fees[0].basis_points, 50);
        assert_eq!(currencies.currencies[0].symbol, "ETH");
    }
}
