use rust_decimal::Decimal;
use serde::Serialize;

/// One-hour timeframe label
pub const TIMEFRAME_1H: &str = "1h";
/// Four-hour timeframe label
pub const TIMEFRAME_4H: &str = "4h";

/// Alert family, deciding which routing pathway is used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    SmartVol,
    Domination,
}

/// Volume-based signals plus the short-synchronization signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SmartVolType {
    SmartOpen,
    SmartVolAdd,
    SmartClose,
    SmartBigClose,
    SmartBigAdd,
    SmartVolumeOpen,
    BullishVolume,
    VolumeUp,
    /// Fixed-short synchronization (entry block trigger)
    FixedShort,
    /// Live-short synchronization (entry block trigger)
    LiveShort,
}

impl SmartVolType {
    pub const ALL: [SmartVolType; 10] = [
        SmartVolType::SmartOpen,
        SmartVolType::SmartVolAdd,
        SmartVolType::SmartClose,
        SmartVolType::SmartBigClose,
        SmartVolType::SmartBigAdd,
        SmartVolType::SmartVolumeOpen,
        SmartVolType::BullishVolume,
        SmartVolType::VolumeUp,
        SmartVolType::FixedShort,
        SmartVolType::LiveShort,
    ];

    /// Wire name carried in the payload's `type` field
    pub fn as_str(&self) -> &'static str {
        match self {
            SmartVolType::SmartOpen => "SmartOpen",
            SmartVolType::SmartVolAdd => "SmartVolAdd",
            SmartVolType::SmartClose => "SmartClose",
            SmartVolType::SmartBigClose => "SmartBigClose",
            SmartVolType::SmartBigAdd => "SmartBigAdd",
            SmartVolType::SmartVolumeOpen => "SmartVolumeOpen",
            SmartVolType::BullishVolume => "BullishVolume",
            SmartVolType::VolumeUp => "VolumeUp",
            SmartVolType::FixedShort => "fixed-short",
            SmartVolType::LiveShort => "live-short",
        }
    }

    pub fn is_synchronization(&self) -> bool {
        matches!(self, SmartVolType::FixedShort | SmartVolType::LiveShort)
    }
}

/// Buyer/seller dominance signals, routed only to domination bots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DominationType {
    BuyerDomination,
    SellerDomination,
    BuyerContinuation,
    SellerContinuation,
}

impl DominationType {
    pub const ALL: [DominationType; 4] = [
        DominationType::BuyerDomination,
        DominationType::SellerDomination,
        DominationType::BuyerContinuation,
        DominationType::SellerContinuation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DominationType::BuyerDomination => "Buyer domination",
            DominationType::SellerDomination => "Seller domination",
            DominationType::BuyerContinuation => "Continuation of buyer dominance",
            DominationType::SellerContinuation => "Continuation of seller dominance",
        }
    }
}

/// Closed set of recognized alert types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    SmartVol(SmartVolType),
    Domination(DominationType),
}

impl Signal {
    /// Resolve a payload type name; exact, case-sensitive match
    pub fn from_type_name(name: &str) -> Option<Self> {
        SmartVolType::ALL
            .iter()
            .find(|t| t.as_str() == name)
            .map(|t| Signal::SmartVol(*t))
            .or_else(|| {
                DominationType::ALL
                    .iter()
                    .find(|t| t.as_str() == name)
                    .map(|t| Signal::Domination(*t))
            })
    }

    pub fn kind(&self) -> AlertKind {
        match self {
            Signal::SmartVol(_) => AlertKind::SmartVol,
            Signal::Domination(_) => AlertKind::Domination,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::SmartVol(t) => t.as_str(),
            Signal::Domination(t) => t.as_str(),
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified, validated trading signal
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub signal: Signal,
    pub symbol: String,
    pub price: Decimal,
    pub timeframe: Option<String>,
    pub volume: Option<Decimal>,
}

impl Alert {
    pub fn new(signal: Signal, symbol: impl Into<String>, price: Decimal) -> Self {
        Self {
            signal,
            symbol: symbol.into(),
            price,
            timeframe: None,
            volume: None,
        }
    }

    pub fn with_timeframe(mut self, timeframe: impl Into<String>) -> Self {
        self.timeframe = Some(timeframe.into());
        self
    }

    pub fn with_volume(mut self, volume: Decimal) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn kind(&self) -> AlertKind {
        self.signal.kind()
    }

    pub fn timeframe_is(&self, timeframe: &str) -> bool {
        self.timeframe.as_deref() == Some(timeframe)
    }
}
