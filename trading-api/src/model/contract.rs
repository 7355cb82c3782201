//! Contract identity and static metadata.
//!
//! A contract is addressed by a [`ContractKey`] (symbol + exchange) and
//! described by a [`ContractMeta`] that carries the price tick used to round
//! every outgoing price, plus option details when the contract is an option.

use crate::error::ModelError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Exchanges known to the model. Not every venue adapter supports all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Exchange {
    Sse,
    Szse,
    Bse,
}

impl Exchange {
    pub fn as_str(&self) -> &'static str {
        match self {
            Exchange::Sse => "SSE",
            Exchange::Szse => "SZSE",
            Exchange::Bse => "BSE",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Exchange {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SSE" => Ok(Exchange::Sse),
            "SZSE" => Ok(Exchange::Szse),
            "BSE" => Ok(Exchange::Bse),
            other => Err(ModelError::UnknownExchange(other.to_string())),
        }
    }
}

/// Unique identity of a tradable contract, rendered as `SYMBOL.EXCHANGE`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContractKey {
    pub symbol: String,
    pub exchange: Exchange,
}

impl ContractKey {
    pub fn new(symbol: impl Into<String>, exchange: Exchange) -> Self {
        Self {
            symbol: symbol.into(),
            exchange,
        }
    }

    /// Instrument class implied by the symbol.
    pub fn class(&self) -> InstrumentClass {
        InstrumentClass::classify(&self.symbol)
    }
}

impl fmt::Display for ContractKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.symbol, self.exchange)
    }
}

impl FromStr for ContractKey {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (symbol, exchange) = s
            .rsplit_once('.')
            .filter(|(symbol, _)| !symbol.is_empty())
            .ok_or_else(|| ModelError::InvalidContractKey(s.to_string()))?;
        Ok(Self::new(symbol, exchange.parse()?))
    }
}

/// How a symbol is treated when encoding and decoding order fields.
///
/// Exchange-listed options carry 8-character codes and STAR board shares
/// start with `688`; everything else is a plain equity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstrumentClass {
    Option,
    Star,
    Equity,
}

impl InstrumentClass {
    pub fn classify(symbol: &str) -> Self {
        if symbol.len() == 8 {
            InstrumentClass::Option
        } else if symbol.starts_with("688") {
            InstrumentClass::Star
        } else {
            InstrumentClass::Equity
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Product {
    Equity,
    Index,
    Fund,
    Bond,
    Option,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    Call,
    Put,
}

/// Option-specific contract attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionDetail {
    pub underlying: String,
    /// Groups every option on the same underlying, e.g. `510050_O`.
    pub portfolio: String,
    /// Underlying plus delivery month, e.g. `510050-2403`.
    pub underlying_month: String,
    pub option_type: Option<OptionType>,
    pub strike: f64,
    pub expiry: NaiveDate,
    pub index: String,
}

impl OptionDetail {
    /// Derives the display index of an option from its strike and the
    /// exchange contract id.
    ///
    /// The id is searched for the first adjustment marker (`M`, then `A`,
    /// then `B`); the index is the strike with three decimals followed by the
    /// marker suffix. Without a marker the bare strike is used.
    pub fn option_index(strike: f64, exchange_contract_id: &str) -> String {
        let compact: String = exchange_contract_id
            .chars()
            .filter(|c| *c != ' ')
            .collect();
        let marker = ['M', 'A', 'B']
            .iter()
            .find_map(|marker| compact.find(*marker));
        match marker {
            Some(n) => format!("{:.3}-{}", strike, &compact[n..]),
            None => strike.to_string(),
        }
    }
}

/// Static metadata for one contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractMeta {
    pub key: ContractKey,
    pub name: String,
    pub product: Product,
    pub size: f64,
    pub price_tick: f64,
    pub min_volume: f64,
    pub option: Option<OptionDetail>,
}

impl ContractMeta {
    /// Creates metadata with unit size and unit minimum volume.
    ///
    /// # Errors
    ///
    /// * [`ModelError::InvalidPriceTick`] if `price_tick` is not a positive finite number.
    pub fn new(
        key: ContractKey,
        name: impl Into<String>,
        product: Product,
        price_tick: f64,
    ) -> Result<Self, ModelError> {
        if !(price_tick.is_finite() && price_tick > 0.0) {
            return Err(ModelError::InvalidPriceTick(price_tick));
        }
        Ok(Self {
            key,
            name: name.into(),
            product,
            size: 1.0,
            price_tick,
            min_volume: 1.0,
            option: None,
        })
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn with_min_volume(mut self, min_volume: f64) -> Self {
        self.min_volume = min_volume;
        self
    }

    pub fn with_option(mut self, option: OptionDetail) -> Self {
        self.option = Some(option);
        self
    }

    pub fn is_option(&self) -> bool {
        self.product == Product::Option
    }
}
