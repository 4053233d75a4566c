use std::borrow::Cow;

use alloy::{
    dyn_abi::{Resolver, TypedData},
    primitives::{Address, B256, U256},
    sol_types::{Eip712Domain, SolStruct},
};

use super::types::OrderComponents;
use crate::abi::seaport as sol;

pub const SEAPORT_NAME: &str = "Seaport";
pub const SEAPORT_VERSION: &str = "1.6";

/// Signing domain of the exchange deployed at `exchange` on `chain_id`.
pub fn domain(chain_id: u64, exchange: Address) -> Eip712Domain {
    Eip712Domain::new(
        Some(Cow::Borrowed(SEAPORT_NAME)),
        Some(Cow::Borrowed(SEAPORT_VERSION)),
        Some(U256::from(chain_id)),
        Some(exchange),
        None,
    )
}

/// Exchange order hash, the EIP-712 struct hash of the components.
pub fn order_hash(components: &OrderComponents) -> B256 {
    sol::OrderComponents::from(components).eip712_hash_struct()
}

/// Typed data the offerer signs to authorize the order.
pub fn order_typed_data(
    components: &OrderComponents,
    domain: Eip712Domain,
) -> Result<TypedData, serde_json::Error> {
    Ok(TypedData {
        domain,
        resolver: Resolver::from_struct::<sol::OrderComponents>(),
        primary_type: sol::OrderComponents::NAME.to_string(),
        message: serde_json::to_value(components)?,
    })
}

/// Typed data of the off-chain cancellation accepted by the order-book.
pub fn cancel_typed_data(order_hash: B256, domain: Eip712Domain) -> TypedData {
    TypedData {
        domain,
        resolver: Resolver::from_struct::<sol::OrderHash>(),
        primary_type: sol::OrderHash::NAME.to_string(),
        message: serde_json::json!({ "orderHash": order_hash }),
    }
}
