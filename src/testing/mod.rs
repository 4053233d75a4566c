//! In-memory testing environment and test utilities.
//!
//! [`TestWallet`] signs with a real random key but keeps token state in
//! memory: it answers the ERC-20, operator approval, wrapped native and
//! Seaport counter reads the order flows perform, and applies the effects of
//! approvals and deposits it is asked to transact. Failures and reverts can be
//! injected per function selector.
//!
//! [`TestOrderbook`] is an in-memory order-book service with controllable fee
//! schedule responses. Off-chain cancellations are only accepted when signed
//! by the offerer of the stored order.

use std::sync::{
    Mutex,
    atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
};

use alloy::{
    dyn_abi::TypedData,
    primitives::{Address, B256, Bytes, Signature, TxHash, U256, keccak256},
    rpc::types::TransactionRequest,
    signers::{Signer, local::PrivateKeySigner},
    sol_types::{Eip712Domain, SolCall, SolValue},
};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};

use crate::{
    abi::{
        seaport::Seaport,
        tokens::{IApprovalForAll, IERC20, IWETH},
    },
    api::{
        ApiError, CancelOrderRequest, CancelOrderResponse, CreateListingRequest,
        CreateListingResponse, CreateOfferRequest, CreateOfferResponse, CreateOrderRequest,
        GetOrderRequest, GetOrderResponse, GetOrderbookFeeRequest, GetOrderbookFeeResponse,
        GetSupportedCurrenciesRequest, GetSupportedCurrenciesResponse, OrderbookApi,
    },
    Chain,
    seaport::{OrderWithCounter, eip712},
    types::{CurrencyToken, OrderbookFee},
    wallet::{RevertReason, SubmittedTx, TxReceipt, Wallet, WalletError},
};

const GAS_USED: u64 = 21_000;
const GAS_PRICE: u128 = 1_000_000_000;

/// Transaction submitted through a [`TestWallet`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentTransaction {
    pub hash: TxHash,
    pub to: Address,
    pub selector: [u8; 4],
    pub input: Bytes,
    pub value: U256,
}

#[derive(Debug)]
pub struct TestWallet {
    signer: PrivateKeySigner,
    address: Address,
    chain_id: u64,
    native: DashMap<Address, U256>,
    /// Keyed by (token, owner).
    balances: DashMap<(Address, Address), U256>,
    /// Keyed by (token, owner, spender).
    allowances: DashMap<(Address, Address, Address), U256>,
    /// Keyed by (token, owner, operator).
    operators: DashSet<(Address, Address, Address)>,
    counters: DashMap<Address, U256>,
    receipts: DashMap<TxHash, TxReceipt>,
    sent: Mutex<Vec<SentTransaction>>,
    signed: Mutex<Vec<TypedData>>,
    failing: DashSet<[u8; 4]>,
    reverting: DashSet<[u8; 4]>,
    unconfirmed_selectors: DashSet<[u8; 4]>,
    unconfirmed: DashSet<TxHash>,
    reject_signatures: AtomicBool,
    reads: AtomicUsize,
    nonce: AtomicU64,
}

impl TestWallet {
    pub fn new(chain_id: u64) -> Self {
        let signer = PrivateKeySigner::random();
        Self {
            address: signer.address(),
            signer,
            chain_id,
            native: DashMap::new(),
            balances: DashMap::new(),
            allowances: DashMap::new(),
            operators: DashSet::new(),
            counters: DashMap::new(),
            receipts: DashMap::new(),
            sent: Mutex::new(Vec::new()),
            signed: Mutex::new(Vec::new()),
            failing: DashSet::new(),
            reverting: DashSet::new(),
            unconfirmed_selectors: DashSet::new(),
            unconfirmed: DashSet::new(),
            reject_signatures: AtomicBool::new(false),
            reads: AtomicUsize::new(0),
            nonce: AtomicU64::new(0),
        }
    }

    /// Reports `address` instead of the signer's one.
    pub fn with_address(mut self, address: Address) -> Self {
        self.address = address;
        self
    }

    pub fn signer_address(&self) -> Address {
        self.signer.address()
    }

    pub fn set_native_balance(&self, owner: Address, amount: U256) {
        self.native.insert(owner, amount);
    }

    pub fn set_token_balance(&self, token: Address, owner: Address, amount: U256) {
        self.balances.insert((token, owner), amount);
    }

    pub fn token_balance(&self, token: Address, owner: Address) -> U256 {
        self.balances
            .get(&(token, owner))
            .map(|b| *b)
            .unwrap_or_default()
    }

    pub fn set_allowance(&self, token: Address, owner: Address, spender: Address, amount: U256) {
        self.allowances.insert((token, owner, spender), amount);
    }

    pub fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&(token, owner, spender))
            .map(|a| *a)
            .unwrap_or_default()
    }

    pub fn approve_operator(&self, token: Address, owner: Address, operator: Address) {
        self.operators.insert((token, owner, operator));
    }

    pub fn is_operator(&self, token: Address, owner: Address, operator: Address) -> bool {
        self.operators.contains(&(token, owner, operator))
    }

    pub fn set_counter(&self, offerer: Address, counter: U256) {
        self.counters.insert(offerer, counter);
    }

    /// Transactions calling `selector` fail to submit.
    pub fn fail_selector(&self, selector: [u8; 4]) {
        self.failing.insert(selector);
    }

    /// Transactions calling `selector` are mined but revert.
    pub fn revert_selector(&self, selector: [u8; 4]) {
        self.reverting.insert(selector);
    }

    /// Transactions calling `selector` are submitted but their receipt never
    /// arrives.
    pub fn fail_receipt(&self, selector: [u8; 4]) {
        self.unconfirmed_selectors.insert(selector);
    }

    /// Every signature request is rejected as if by the user.
    pub fn reject_signatures(&self) {
        self.reject_signatures.store(true, Ordering::SeqCst);
    }

    pub fn sent_transactions(&self) -> Vec<SentTransaction> {
        self.sent.lock().unwrap().clone()
    }

    pub fn signed_messages(&self) -> Vec<TypedData> {
        self.signed.lock().unwrap().clone()
    }

    /// Number of read-only calls served.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// No read, signature or transaction went through the wallet.
    pub fn untouched(&self) -> bool {
        self.reads() == 0
            && self.sent.lock().unwrap().is_empty()
            && self.signed.lock().unwrap().is_empty()
    }

    fn answer(&self, to: Address, input: &[u8]) -> Result<Bytes, WalletError> {
        let selector = selector(input);
        let encoded = match selector {
            IERC20::balanceOfCall::SELECTOR => {
                let call = IERC20::balanceOfCall::abi_decode(input)?;
                self.token_balance(to, call.owner).abi_encode()
            }
            IERC20::allowanceCall::SELECTOR => {
                let call = IERC20::allowanceCall::abi_decode(input)?;
                self.allowance(to, call.owner, call.spender).abi_encode()
            }
            IApprovalForAll::isApprovedForAllCall::SELECTOR => {
                let call = IApprovalForAll::isApprovedForAllCall::abi_decode(input)?;
                self.is_operator(to, call.owner, call.operator).abi_encode()
            }
            Seaport::getCounterCall::SELECTOR => {
                let call = Seaport::getCounterCall::abi_decode(input)?;
                self.counters
                    .get(&call.offerer)
                    .map(|c| *c)
                    .unwrap_or_default()
                    .abi_encode()
            }
            _ => {
                return Err(WalletError::Reverted(Box::new(RevertReason::Raw(
                    format!("unsupported call {}", alloy::hex::encode(selector)),
                ))));
            }
        };
        Ok(Bytes::from(encoded))
    }

    fn apply(
        &self,
        from: Address,
        to: Address,
        input: &[u8],
        value: U256,
    ) -> Result<(), WalletError> {
        match selector(input) {
            IERC20::approveCall::SELECTOR => {
                let call = IERC20::approveCall::abi_decode(input)?;
                self.set_allowance(to, from, call.spender, call.amount);
            }
            IApprovalForAll::setApprovalForAllCall::SELECTOR => {
                let call = IApprovalForAll::setApprovalForAllCall::abi_decode(input)?;
                if call.approved {
                    self.approve_operator(to, from, call.operator);
                } else {
                    self.operators.remove(&(to, from, call.operator));
                }
            }
            IWETH::depositCall::SELECTOR => {
                let native = self.native.get(&from).map(|b| *b).unwrap_or_default();
                if native < value {
                    return Err(WalletError::InvalidRequest(
                        "insufficient funds for transfer".to_string(),
                    ));
                }
                self.native.insert(from, native - value);
                let wrapped = self.token_balance(to, from);
                self.set_token_balance(to, from, wrapped + value);
            }
            _ => {}
        }
        Ok(())
    }
}

fn selector(input: &[u8]) -> [u8; 4] {
    let mut selector = [0u8; 4];
    if input.len() >= 4 {
        selector.copy_from_slice(&input[..4]);
    }
    selector
}

fn target(tx: &TransactionRequest) -> Address {
    tx.to.and_then(|kind| kind.to().copied()).unwrap_or_default()
}

#[async_trait]
impl Wallet for TestWallet {
    async fn address(&self) -> Result<Address, WalletError> {
        Ok(self.address)
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        Ok(self.chain_id)
    }

    async fn native_balance(&self, owner: Address) -> Result<U256, WalletError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.native.get(&owner).map(|b| *b).unwrap_or_default())
    }

    async fn call(&self, tx: TransactionRequest) -> Result<Bytes, WalletError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let input = tx.input.input().cloned().unwrap_or_default();
        self.answer(target(&tx), &input)
    }

    async fn sign_typed_data(&self, data: &TypedData) -> Result<Signature, WalletError> {
        if self.reject_signatures.load(Ordering::SeqCst) {
            return Err(WalletError::Rejected("user rejected signing".to_string()));
        }
        let hash = data.eip712_signing_hash()?;
        let signature = self.signer.sign_hash(&hash).await?;
        self.signed.lock().unwrap().push(data.clone());
        Ok(signature)
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<SubmittedTx, WalletError> {
        let to = target(&tx);
        let input = tx.input.input().cloned().unwrap_or_default();
        let value = tx.value.unwrap_or_default();
        let selector = selector(&input);
        if self.failing.contains(&selector) {
            return Err(WalletError::Rejected(format!(
                "transaction {} rejected",
                alloy::hex::encode(selector)
            )));
        }

        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
        let hash = keccak256((self.address, U256::from(nonce)).abi_encode());
        if self.unconfirmed_selectors.contains(&selector) {
            self.unconfirmed.insert(hash);
            self.sent.lock().unwrap().push(SentTransaction {
                hash,
                to,
                selector,
                input,
                value,
            });
            return Ok(SubmittedTx {
                hash,
                chain_id: self.chain_id,
            });
        }

        let status = !self.reverting.contains(&selector);
        if status {
            self.apply(self.address, to, &input, value)?;
        }
        self.receipts.insert(
            hash,
            TxReceipt {
                transaction_hash: hash,
                block_number: Some(nonce + 1),
                gas_used: GAS_USED,
                effective_gas_price: GAS_PRICE,
                status,
            },
        );
        self.sent.lock().unwrap().push(SentTransaction {
            hash,
            to,
            selector,
            input,
            value,
        });
        Ok(SubmittedTx {
            hash,
            chain_id: self.chain_id,
        })
    }

    async fn wait_for_receipt(&self, tx: SubmittedTx) -> Result<TxReceipt, WalletError> {
        if self.unconfirmed.contains(&tx.hash) {
            return Err(WalletError::Timeout);
        }
        self.receipts
            .get(&tx.hash)
            .map(|r| *r)
            .ok_or(WalletError::EmptyResponse)
    }
}

/// Fee schedule behaviour of a [`TestOrderbook`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeeMode {
    /// Answers with the fees registered per contract, none by default.
    Schedule,
    /// Answers every fee request with the status code.
    Status(u16),
}

#[derive(Debug)]
pub struct TestOrderbook {
    listings: DashMap<String, OrderWithCounter>,
    offers: DashMap<String, OrderWithCounter>,
    fees: DashMap<Address, Vec<OrderbookFee>>,
    fee_mode: Mutex<FeeMode>,
    currencies: DashMap<Address, Vec<CurrencyToken>>,
    created: Mutex<Vec<CreateOrderRequest>>,
    cancelled: Mutex<Vec<CancelOrderRequest>>,
    fee_requests: AtomicUsize,
    fail_create: AtomicBool,
    domain: Eip712Domain,
}

impl Default for TestOrderbook {
    fn default() -> Self {
        Self::new()
    }
}

impl TestOrderbook {
    pub fn new() -> Self {
        Self {
            listings: DashMap::new(),
            offers: DashMap::new(),
            fees: DashMap::new(),
            fee_mode: Mutex::new(FeeMode::Schedule),
            currencies: DashMap::new(),
            created: Mutex::new(Vec::new()),
            cancelled: Mutex::new(Vec::new()),
            fee_requests: AtomicUsize::new(0),
            fail_create: AtomicBool::new(false),
            domain: chain_domain(&Chain::doma_testnet()),
        }
    }

    /// Verifies cancellations against the exchange of `chain`, Doma testnet
    /// by default.
    pub fn with_chain(mut self, chain: &Chain) -> Self {
        self.domain = chain_domain(chain);
        self
    }

    pub fn insert_listing(&self, order_id: impl Into<String>, order: OrderWithCounter) {
        self.listings.insert(order_id.into(), order);
    }

    pub fn insert_offer(&self, order_id: impl Into<String>, order: OrderWithCounter) {
        self.offers.insert(order_id.into(), order);
    }

    pub fn listing(&self, order_id: &str) -> Option<OrderWithCounter> {
        self.listings.get(order_id).map(|o| o.clone())
    }

    pub fn offer(&self, order_id: &str) -> Option<OrderWithCounter> {
        self.offers.get(order_id).map(|o| o.clone())
    }

    pub fn set_fees(&self, contract: Address, fees: Vec<OrderbookFee>) {
        self.fees.insert(contract, fees);
    }

    pub fn set_fee_mode(&self, mode: FeeMode) {
        *self.fee_mode.lock().unwrap() = mode;
    }

    pub fn set_currencies(&self, contract: Address, currencies: Vec<CurrencyToken>) {
        self.currencies.insert(contract, currencies);
    }

    /// Order creation requests answer with HTTP 500.
    pub fn fail_create(&self) {
        self.fail_create.store(true, Ordering::SeqCst);
    }

    pub fn created_orders(&self) -> Vec<CreateOrderRequest> {
        self.created.lock().unwrap().clone()
    }

    pub fn cancel_requests(&self) -> Vec<CancelOrderRequest> {
        self.cancelled.lock().unwrap().clone()
    }

    pub fn fee_requests(&self) -> usize {
        self.fee_requests.load(Ordering::SeqCst)
    }

    /// Stores the order under its order hash.
    fn store(
        &self,
        book: &DashMap<String, OrderWithCounter>,
        request: &CreateOrderRequest,
    ) -> Result<String, ApiError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(ApiError::status(500, "Internal Server Error", "order rejected"));
        }
        let order_id = eip712::order_hash(&request.parameters).to_string();
        book.insert(
            order_id.clone(),
            OrderWithCounter {
                parameters: request.parameters.clone(),
                signature: request.signature.clone(),
            },
        );
        self.created.lock().unwrap().push(request.clone());
        Ok(order_id)
    }

    fn cancel(
        &self,
        book: &DashMap<String, OrderWithCounter>,
        request: &CancelOrderRequest,
    ) -> Result<CancelOrderResponse, ApiError> {
        let Some(order) = book.get(&request.order_id).map(|o| o.clone()) else {
            return Err(ApiError::status(404, "Not Found", "order not found"));
        };
        if self.cancel_signer(&order, request) != Some(order.parameters.offerer) {
            return Err(ApiError::status(
                401,
                "Unauthorized",
                "cancellation not signed by the offerer",
            ));
        }
        book.remove(&request.order_id);
        self.cancelled.lock().unwrap().push(request.clone());
        Ok(CancelOrderResponse {
            order_id: request.order_id.clone(),
        })
    }

    /// Address the cancellation of `order` was signed by.
    fn cancel_signer(
        &self,
        order: &OrderWithCounter,
        request: &CancelOrderRequest,
    ) -> Option<Address> {
        let order_hash = request
            .order_id
            .parse::<B256>()
            .unwrap_or_else(|_| eip712::order_hash(&order.parameters));
        let hash = eip712::cancel_typed_data(order_hash, self.domain.clone())
            .eip712_signing_hash()
            .ok()?;
        Signature::try_from(request.signature.as_ref())
            .ok()?
            .recover_address_from_prehash(&hash)
            .ok()
    }
}

fn chain_domain(chain: &Chain) -> Eip712Domain {
    eip712::domain(chain.chain_id(), chain.exchange())
}

fn order_response(order: Option<OrderWithCounter>) -> Option<GetOrderResponse> {
    order.map(|o| GetOrderResponse {
        signature: o.signature,
        parameters: o.parameters,
    })
}

#[async_trait]
impl OrderbookApi for TestOrderbook {
    async fn create_listing(
        &self,
        request: &CreateListingRequest,
    ) -> Result<CreateListingResponse, ApiError> {
        let order_id = self.store(&self.listings, request)?;
        Ok(CreateListingResponse {
            order_id,
            fulfiller_address: None,
        })
    }

    async fn create_offer(
        &self,
        request: &CreateOfferRequest,
    ) -> Result<CreateOfferResponse, ApiError> {
        let order_id = self.store(&self.offers, request)?;
        Ok(CreateOfferResponse { order_id })
    }

    async fn get_listing(
        &self,
        request: &GetOrderRequest,
    ) -> Result<Option<GetOrderResponse>, ApiError> {
        Ok(order_response(self.listing(&request.order_id)))
    }

    async fn get_offer(
        &self,
        request: &GetOrderRequest,
    ) -> Result<Option<GetOrderResponse>, ApiError> {
        Ok(order_response(self.offer(&request.order_id)))
    }

    async fn get_orderbook_fee(
        &self,
        request: &GetOrderbookFeeRequest,
    ) -> Result<GetOrderbookFeeResponse, ApiError> {
        self.fee_requests.fetch_add(1, Ordering::SeqCst);
        let mode = self.fee_mode.lock().unwrap().clone();
        match mode {
            FeeMode::Schedule => Ok(GetOrderbookFeeResponse {
                marketplace_fees: self
                    .fees
                    .get(&request.contract_address)
                    .map(|f| f.clone())
                    .unwrap_or_default(),
            }),
            FeeMode::Status(status) => Err(ApiError::status(status, "fee schedule", "unavailable")),
        }
    }

    async fn get_supported_currencies(
        &self,
        request: &GetSupportedCurrenciesRequest,
    ) -> Result<GetSupportedCurrenciesResponse, ApiError> {
        Ok(GetSupportedCurrenciesResponse {
            currencies: self
                .currencies
                .get(&request.contract_address)
                .map(|c| c.clone())
                .unwrap_or_default(),
        })
    }

    async fn cancel_listing(
        &self,
        request: &CancelOrderRequest,
    ) -> Result<CancelOrderResponse, ApiError> {
        self.cancel(&self.listings, request)
    }

    async fn cancel_offer(
        &self,
        request: &CancelOrderRequest,
    ) -> Result<CancelOrderResponse, ApiError> {
        self.cancel(&self.offers, request)
    }
}
