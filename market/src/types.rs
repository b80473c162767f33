use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single executed trade reported by the exchange match stream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub side: Side,
    pub price: f64,
    pub size: f64,
    /// Exchange timestamp (ms since epoch)
    #[serde(rename = "time_ms")]
    pub ts_ms: u64,
}

/// Moving averages of match prices over the short and long windows.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MovingAverages {
    pub short: f64,
    pub long: f64,
}

/// Emitted by the order book once its averages are warm.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BookUpdate {
    pub ts_ms: u64,
    pub moving_averages: MovingAverages,
}
