//! Command line of the order-book CLI.
//!
//! Connection details and keys come from the environment (see
//! [`orderbook_sdk::config::EnvConfig`]), the intent to execute from the
//! command line.

use std::{str::FromStr, time::Duration};

use alloy::primitives::{Address, U256};
use clap::{Parser, Subcommand, ValueEnum};
use orderbook_sdk::types::{CancellationType, OrderbookType, TokenStandard};

use crate::error::{Error, Result};

#[derive(Debug, Parser)]
#[command(name = "orderbook")]
#[command(about = "Create, fulfill and cancel order-book listings and offers")]
pub struct CliConfig {
    /// Order-book to publish orders to
    #[arg(long, value_enum, default_value_t = Book::Doma, global = true)]
    pub orderbook: Book,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List an NFT for sale
    List {
        #[command(flatten)]
        item: ItemArgs,

        /// ERC-20 currency, native currency if omitted
        #[arg(long)]
        currency: Option<Address>,
    },

    /// Buy a listing
    Buy {
        #[arg(long)]
        order_id: String,
    },

    /// Make an offer on an NFT
    Offer {
        #[command(flatten)]
        item: ItemArgs,

        /// ERC-20 currency, wrapped native currency if omitted
        #[arg(long)]
        currency: Option<Address>,

        /// Zone the offer is restricted to
        #[arg(long)]
        zone: Option<Address>,
    },

    /// Accept an offer
    Accept {
        #[arg(long)]
        order_id: String,
    },

    /// Cancel a listing
    CancelListing {
        #[arg(long)]
        order_id: String,

        /// Cancel with a signature instead of a transaction
        #[arg(long)]
        off_chain: bool,
    },

    /// Cancel an offer
    CancelOffer {
        #[arg(long)]
        order_id: String,

        /// Cancel with a signature instead of a transaction
        #[arg(long)]
        off_chain: bool,
    },

    /// Show marketplace fees of a collection
    Fees {
        #[arg(long)]
        contract: Address,
    },

    /// Show currencies a collection can be traded in
    Currencies {
        #[arg(long)]
        contract: Address,
    },
}

#[derive(Debug, clap::Args)]
pub struct ItemArgs {
    /// NFT contract address
    #[arg(long)]
    pub contract: Address,

    /// Token id, decimal or 0x-prefixed hex
    #[arg(long)]
    pub token_id: String,

    /// Price in currency units (e.g., 0.002)
    #[arg(long)]
    pub price: String,

    /// Order validity in hours
    #[arg(long)]
    pub duration_hours: Option<u64>,

    /// The token is an ERC-1155
    #[arg(long)]
    pub erc1155: bool,
}

impl ItemArgs {
    pub fn token_id(&self) -> Result<U256> {
        U256::from_str(&self.token_id).map_err(|_| Error::InvalidTokenId(self.token_id.clone()))
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration_hours.map(|h| Duration::from_secs(h * 60 * 60))
    }

    pub fn standard(&self) -> TokenStandard {
        if self.erc1155 {
            TokenStandard::Erc1155
        } else {
            TokenStandard::Erc721
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Book {
    Doma,
    Opensea,
}

impl From<Book> for OrderbookType {
    fn from(value: Book) -> Self {
        match value {
            Book::Doma => OrderbookType::Doma,
            Book::Opensea => OrderbookType::Opensea,
        }
    }
}

pub fn cancellation_type(off_chain: bool) -> CancellationType {
    if off_chain {
        CancellationType::OffChain
    } else {
        CancellationType::OnChain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_offer() {
        let cli = CliConfig::parse_from([
            "orderbook",
            "offer",
            "--contract",
            "0x2222222222222222222222222222222222222222",
            "--token-id",
            "0x10",
            "--price",
            "0.002",
            "--duration-hours",
            "2",
        ]);
        assert_eq!(cli.orderbook, Book::Doma);
        let Command::Offer { item, currency, zone } = cli.command else {
            panic!("expected offer command");
        };
        assert_eq!(item.token_id().unwrap(), U256::from(16));
        assert_eq!(item.duration(), Some(Duration::from_secs(7200)));
        assert_eq!(item.standard(), TokenStandard::Erc721);
        assert!(currency.is_none());
        assert!(zone.is_none());
    }

    #[test]
    fn test_parse_cancel() {
        let cli = CliConfig::parse_from([
            "orderbook",
            "--orderbook",
            "opensea",
            "cancel-listing",
            "--order-id",
            "abc",
            "--off-chain",
        ]);
        assert_eq!(OrderbookType::from(cli.orderbook), OrderbookType::Opensea);
        assert!(matches!(
            cli.command,
            Command::CancelListing { off_chain: true, .. }
        ));
    }
}
