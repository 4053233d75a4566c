//! Solidity bindings of the contracts the order flows interact with.

#[allow(clippy::too_many_arguments)]
pub mod seaport {
    alloy::sol!(
        /// Seaport offer item. Enum-typed fields are declared as `uint8`,
        /// matching the EIP-712 type strings of the exchange.
        #[derive(Debug, PartialEq, Eq)]
        struct OfferItem {
            uint8 itemType;
            address token;
            uint256 identifierOrCriteria;
            uint256 startAmount;
            uint256 endAmount;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct ConsiderationItem {
            uint8 itemType;
            address token;
            uint256 identifierOrCriteria;
            uint256 startAmount;
            uint256 endAmount;
            address recipient;
        }

        /// Signed order payload, primary type of order signatures.
        #[derive(Debug, PartialEq, Eq)]
        struct OrderComponents {
            address offerer;
            address zone;
            OfferItem[] offer;
            ConsiderationItem[] consideration;
            uint8 orderType;
            uint256 startTime;
            uint256 endTime;
            bytes32 zoneHash;
            uint256 salt;
            bytes32 conduitKey;
            uint256 counter;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct OrderParameters {
            address offerer;
            address zone;
            OfferItem[] offer;
            ConsiderationItem[] consideration;
            uint8 orderType;
            uint256 startTime;
            uint256 endTime;
            bytes32 zoneHash;
            uint256 salt;
            bytes32 conduitKey;
            uint256 totalOriginalConsiderationItems;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct Order {
            OrderParameters parameters;
            bytes signature;
        }

        /// Off-chain cancellation message understood by the order-book service.
        #[derive(Debug, PartialEq, Eq)]
        struct OrderHash {
            bytes32 orderHash;
        }

        #[derive(Debug)]
        interface Seaport {
            error InvalidSignature();
            error InvalidCanceller();
            error OrderIsCancelled(bytes32 orderHash);
            error OrderAlreadyFilled(bytes32 orderHash);
            error InvalidTime(uint256 startTime, uint256 endTime);
            error InsufficientNativeTokensSupplied();
            error NoSpecifiedOrdersAvailable();
            error InvalidConduit(bytes32 conduitKey, address conduit);

            function fulfillOrder(Order calldata order, bytes32 fulfillerConduitKey)
                external
                payable
                returns (bool fulfilled);

            function cancel(OrderComponents[] calldata orders) external returns (bool cancelled);

            function getCounter(address offerer) external view returns (uint256 counter);
        }
    );
}

pub mod tokens {
    alloy::sol!(
        #[derive(Debug)]
        interface IERC20 {
            function balanceOf(address owner) external view returns (uint256);
            function allowance(address owner, address spender) external view returns (uint256);
            function approve(address spender, uint256 amount) external returns (bool);
        }

        /// Operator approvals shared by ERC-721 and ERC-1155.
        #[derive(Debug)]
        interface IApprovalForAll {
            function isApprovedForAll(address owner, address operator) external view returns (bool);
            function setApprovalForAll(address operator, bool approved) external;
        }

        /// Wrapped native currency.
        #[derive(Debug)]
        interface IWETH {
            function deposit() external payable;
            function balanceOf(address owner) external view returns (uint256);
        }
    );
}
