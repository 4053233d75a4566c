//! Signing and transaction collaborator.
//!
//! Order flows depend on the [`Wallet`] capability set only: address and
//! chain lookup, native balance, read-only calls, EIP-712 typed-data
//! signatures and transaction submission followed by awaiting the receipt.
//! [`AlloyWallet`] implements it over an alloy provider and a local key,
//! [`crate::testing::TestWallet`] in memory.

mod alloy;
mod error;

use ::alloy::{
    dyn_abi::TypedData,
    primitives::{Address, Bytes, Signature, TxHash, U256},
    rpc::types::TransactionRequest,
    sol_types::SolCall,
};
use async_trait::async_trait;

pub use self::alloy::AlloyWallet;
pub use error::{RevertReason, WalletError};

/// Transaction accepted by the network, not yet confirmed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubmittedTx {
    pub hash: TxHash,
    pub chain_id: u64,
}

/// Receipt of a mined transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxReceipt {
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    pub effective_gas_price: u128,
    /// `false` if the transaction was mined but reverted.
    pub status: bool,
}

#[async_trait]
pub trait Wallet: Send + Sync {
    async fn address(&self) -> Result<Address, WalletError>;

    async fn chain_id(&self) -> Result<u64, WalletError>;

    async fn native_balance(&self, owner: Address) -> Result<U256, WalletError>;

    /// Executes read-only call against the latest block.
    async fn call(&self, tx: TransactionRequest) -> Result<Bytes, WalletError>;

    async fn sign_typed_data(&self, data: &TypedData) -> Result<Signature, WalletError>;

    /// Signs and broadcasts the transaction, returning once the network
    /// accepted it.
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<SubmittedTx, WalletError>;

    /// Blocks until the transaction is mined.
    async fn wait_for_receipt(&self, tx: SubmittedTx) -> Result<TxReceipt, WalletError>;
}

/// Calls a view function of the contract at `to` and decodes its return.
pub async fn read<C: SolCall + Send>(
    wallet: &dyn Wallet,
    to: Address,
    call: C,
) -> Result<C::Return, WalletError> {
    let output = wallet.call(contract_call(to, &call, U256::ZERO)).await?;
    Ok(C::abi_decode_returns(&output)?)
}

/// Transaction request invoking `call` on the contract at `to`.
pub fn contract_call<C: SolCall>(to: Address, call: &C, value: U256) -> TransactionRequest {
    let request = TransactionRequest::default()
        .to(to)
        .input(Bytes::from(call.abi_encode()).into());
    if value.is_zero() {
        request
    } else {
        request.value(value)
    }
}
