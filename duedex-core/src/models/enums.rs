//! Wire enums shared by feed and REST payloads.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $wire)] $variant, )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Returns the wire name of this value.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $wire, )+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $wire => Ok(Self::$variant), )+
                    other => Err(format!("unknown {} '{other}'", stringify!($name))),
                }
            }
        }
    };
}

wire_enum! {
    /// Feed channel kinds.
    pub enum ChannelKind {
        /// Aggregated orderbook levels, per instrument.
        Level2 => "level2",
        /// Market statistics, per instrument.
        Ticker => "ticker",
        /// Public trades, per instrument.
        Matches => "matches",
        /// Private order updates.
        Orders => "orders",
        /// Private position updates.
        Positions => "positions",
        /// Private margin balances.
        Margins => "margins",
        /// Private fills.
        Executions => "executions",
    }
}

impl ChannelKind {
    /// Returns true for channels that require an authenticated session.
    #[must_use]
    pub const fn is_private(&self) -> bool {
        matches!(
            self,
            Self::Orders | Self::Positions | Self::Margins | Self::Executions
        )
    }
}

wire_enum! {
    /// Order side.
    pub enum OrderSide {
        /// Buy.
        Long => "long",
        /// Sell.
        Short => "short",
    }
}

wire_enum! {
    /// Order type.
    pub enum OrderType {
        /// Limit order.
        Limit => "limit",
        /// Market order.
        Market => "market",
    }
}

wire_enum! {
    /// Time-in-force policy.
    pub enum TimeInForce {
        /// Good till cancel.
        Gtc => "gtc",
        /// Good till time.
        Gtt => "gtt",
        /// Immediate or cancel.
        Ioc => "ioc",
        /// Fill or kill.
        Fok => "fok",
    }
}

wire_enum! {
    /// Order lifecycle status.
    pub enum OrderStatus {
        /// Accepted, nothing filled.
        New => "new",
        /// Some size filled, rest working.
        PartiallyFilled => "partiallyFilled",
        /// Fully filled.
        Filled => "filled",
        /// Cancelled, possibly after partial fills.
        Cancelled => "cancelled",
    }
}

impl OrderStatus {
    /// Returns true if no further updates are expected for the order.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Filled | Self::Cancelled)
    }
}

wire_enum! {
    /// Price movement of a trade relative to the previous one.
    pub enum TickDirection {
        /// Lower than the previous trade.
        MinusTick => "minusTick",
        /// Same as previous, which was a down-tick.
        ZeroMinusTick => "zeroMinusTick",
        /// Same as previous, which was an up-tick.
        ZeroPlusTick => "zeroPlusTick",
        /// Higher than the previous trade.
        PlusTick => "plusTick",
    }
}
