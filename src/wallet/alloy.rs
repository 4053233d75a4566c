use std::time::Duration;

use alloy::{
    dyn_abi::TypedData,
    network::EthereumWallet,
    primitives::{Address, Bytes, Signature, U256},
    providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder},
    rpc::{client::RpcClient, types::TransactionRequest},
    signers::{Signer, local::PrivateKeySigner},
};
use async_trait::async_trait;
use tracing::debug;
use url::Url;

use super::{SubmittedTx, TxReceipt, Wallet, WalletError};

const DEFAULT_RECEIPT_TIMEOUT: Duration = Duration::from_secs(120);

/// [`Wallet`] backed by an HTTP node and a local private key.
#[derive(Clone, derive_more::Debug)]
pub struct AlloyWallet {
    #[debug(skip)]
    provider: DynProvider,
    signer: PrivateKeySigner,
    confirmations: u64,
    receipt_timeout: Option<Duration>,
}

impl AlloyWallet {
    pub fn new(node_url: Url, signer: PrivateKeySigner) -> Self {
        let rpc_client = RpcClient::new_http(node_url);
        let provider = DynProvider::new(
            ProviderBuilder::new()
                .wallet(EthereumWallet::from(signer.clone()))
                .connect_client(rpc_client),
        );
        Self {
            provider,
            signer,
            confirmations: 1,
            receipt_timeout: Some(DEFAULT_RECEIPT_TIMEOUT),
        }
    }

    /// Number of blocks a transaction must be buried under to be confirmed.
    pub fn with_confirmations(mut self, confirmations: u64) -> Self {
        self.confirmations = confirmations.max(1);
        self
    }

    /// `None` waits for receipts indefinitely.
    pub fn with_receipt_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.receipt_timeout = timeout;
        self
    }

    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }
}

#[async_trait]
impl Wallet for AlloyWallet {
    async fn address(&self) -> Result<Address, WalletError> {
        Ok(self.signer.address())
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        Ok(self.provider.get_chain_id().await?)
    }

    async fn native_balance(&self, owner: Address) -> Result<U256, WalletError> {
        Ok(self.provider.get_balance(owner).await?)
    }

    async fn call(&self, tx: TransactionRequest) -> Result<Bytes, WalletError> {
        Ok(self.provider.call(tx.from(self.signer.address())).await?)
    }

    async fn sign_typed_data(&self, data: &TypedData) -> Result<Signature, WalletError> {
        let hash = data.eip712_signing_hash()?;
        Ok(self.signer.sign_hash(&hash).await?)
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<SubmittedTx, WalletError> {
        let chain_id = self.chain_id().await?;
        let pending = self
            .provider
            .send_transaction(tx.from(self.signer.address()))
            .await?;
        let hash = *pending.tx_hash();
        debug!(%hash, chain_id, "transaction submitted");
        Ok(SubmittedTx { hash, chain_id })
    }

    async fn wait_for_receipt(&self, tx: SubmittedTx) -> Result<TxReceipt, WalletError> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), tx.hash)
            .with_required_confirmations(self.confirmations)
            .with_timeout(self.receipt_timeout)
            .get_receipt()
            .await?;
        Ok(TxReceipt {
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            effective_gas_price: receipt.effective_gas_price,
            status: receipt.status(),
        })
    }
}
