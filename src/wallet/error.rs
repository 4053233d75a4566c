use alloy::{
    dyn_abi,
    primitives::Bytes,
    providers::{PendingTransactionError, WatchTxError},
    rpc::json_rpc::ErrorPayload,
    signers,
    sol_types::{self, SolInterface},
    transports::{RpcError, TransportErrorKind},
};

use crate::abi::seaport::Seaport::SeaportErrors;

/// Why the exchange or a token contract refused a call.
#[derive(Debug)]
pub enum RevertReason {
    /// Custom error of the exchange.
    Exchange(SeaportErrors),
    /// Revert data or message that did not decode as an exchange error.
    Raw(String),
}

impl From<Bytes> for RevertReason {
    fn from(data: Bytes) -> Self {
        match SeaportErrors::abi_decode(&data) {
            Ok(known) => Self::Exchange(known),
            Err(_) => Self::Raw(data.to_string()),
        }
    }
}

impl RevertReason {
    fn from_payload(payload: &ErrorPayload) -> Self {
        match payload.as_decoded_interface_error::<SeaportErrors>() {
            Some(known) => Self::Exchange(known),
            None => Self::Raw(payload.message.to_string()),
        }
    }
}

/// Failure of the signer or the node while signing, calling or transacting.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("fatal error: {0}")]
    Fatal(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unexpected empty RPC response")]
    EmptyResponse,

    #[error("transaction ran out of gas")]
    OutOfGas,

    #[error("execution reverted: {0:?}")]
    Reverted(Box<RevertReason>),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("transaction was not confirmed in time")]
    Timeout,

    #[error("request rejected by signer: {0}")]
    Rejected(String),
}

impl WalletError {
    /// Maps a JSON-RPC error response by its code and message.
    fn from_response(payload: &ErrorPayload) -> Self {
        let msg = payload.message.to_ascii_lowercase();
        match payload.code {
            -32603 if msg.contains("gas") || msg.contains("oog") => Self::OutOfGas,
            4001 => Self::Rejected(msg),
            _ if msg.contains("user rejected") || msg.contains("user denied") => {
                Self::Rejected(msg)
            }
            -32602..=-32600 if msg.contains("invalid") || msg.contains("not found") => {
                Self::InvalidRequest(msg)
            }
            3 => Self::Reverted(Box::new(RevertReason::from_payload(payload))),
            _ if msg.contains("execution reverted") => {
                Self::Reverted(Box::new(RevertReason::from_payload(payload)))
            }
            _ => Self::Transport(format!("{}: {}", payload.code, payload.message)),
        }
    }
}

impl From<RpcError<TransportErrorKind>> for WalletError {
    fn from(value: RpcError<TransportErrorKind>) -> Self {
        match &value {
            RpcError::ErrorResp(payload) => Self::from_response(payload),
            RpcError::NullResp => Self::EmptyResponse,
            _ => Self::Transport(value.to_string()),
        }
    }
}

impl From<PendingTransactionError> for WalletError {
    fn from(value: PendingTransactionError) -> Self {
        match value {
            PendingTransactionError::TransportError(rpc_err) => Self::from(rpc_err),
            PendingTransactionError::TxWatcher(WatchTxError::Timeout) => Self::Timeout,
            PendingTransactionError::FailedToRegister => Self::Fatal(value.to_string()),
            PendingTransactionError::Recv(_) => Self::Transport(value.to_string()),
        }
    }
}

impl From<sol_types::Error> for WalletError {
    fn from(value: sol_types::Error) -> Self {
        Self::Fatal(value.to_string())
    }
}

impl From<dyn_abi::Error> for WalletError {
    fn from(value: dyn_abi::Error) -> Self {
        Self::Fatal(value.to_string())
    }
}

impl From<signers::Error> for WalletError {
    fn from(value: signers::Error) -> Self {
        Self::Rejected(value.to_string())
    }
}
