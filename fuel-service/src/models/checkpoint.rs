//! Closed vocabulary of route checkpoints, ledger columns and payment modes.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Journey leg a checkpoint belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Going,
    Returning,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Going => "going",
            Self::Returning => "returning",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a ledger column represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Origin-yard allocation, stored as a positive quantity.
    Yard,
    Going,
    Returning,
}

/// Named litre column on a fuel record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerColumn {
    DarYard,
    TangaYard,
    MmsaYard,
    DarGoing,
    MoroGoing,
    MbeyaGoing,
    TdmGoing,
    ZambiaGoing,
    CongoFuel,
    ZambiaNdola,
    ZambiaKapiri,
    TdmReturn,
    MbeyaReturn,
    MoroReturn,
    DarReturn,
    TangaReturn,
}

impl LedgerColumn {
    pub const ALL: [LedgerColumn; 16] = [
        Self::DarYard,
        Self::TangaYard,
        Self::MmsaYard,
        Self::DarGoing,
        Self::MoroGoing,
        Self::MbeyaGoing,
        Self::TdmGoing,
        Self::ZambiaGoing,
        Self::CongoFuel,
        Self::ZambiaNdola,
        Self::ZambiaKapiri,
        Self::TdmReturn,
        Self::MbeyaReturn,
        Self::MoroReturn,
        Self::DarReturn,
        Self::TangaReturn,
    ];

    pub fn kind(&self) -> ColumnKind {
        match self {
            Self::DarYard | Self::TangaYard | Self::MmsaYard => ColumnKind::Yard,
            Self::DarGoing
            | Self::MoroGoing
            | Self::MbeyaGoing
            | Self::TdmGoing
            | Self::ZambiaGoing
            | Self::CongoFuel => ColumnKind::Going,
            Self::ZambiaNdola
            | Self::ZambiaKapiri
            | Self::TdmReturn
            | Self::MbeyaReturn
            | Self::MoroReturn
            | Self::DarReturn
            | Self::TangaReturn => ColumnKind::Returning,
        }
    }

    /// Whether litres claimed on `direction` may land in this column.
    pub fn accepts(&self, direction: Direction) -> bool {
        matches!(
            (self.kind(), direction),
            (ColumnKind::Going, Direction::Going) | (ColumnKind::Returning, Direction::Returning)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DarYard => "dar_yard",
            Self::TangaYard => "tanga_yard",
            Self::MmsaYard => "mmsa_yard",
            Self::DarGoing => "dar_going",
            Self::MoroGoing => "moro_going",
            Self::MbeyaGoing => "mbeya_going",
            Self::TdmGoing => "tdm_going",
            Self::ZambiaGoing => "zambia_going",
            Self::CongoFuel => "congo_fuel",
            Self::ZambiaNdola => "zambia_ndola",
            Self::ZambiaKapiri => "zambia_kapiri",
            Self::TdmReturn => "tdm_return",
            Self::MbeyaReturn => "mbeya_return",
            Self::MoroReturn => "moro_return",
            Self::DarReturn => "dar_return",
            Self::TangaReturn => "tanga_return",
        }
    }
}

impl std::fmt::Display for LedgerColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LedgerColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .find(|c| c.as_str() == wanted)
            .copied()
            .ok_or_else(|| format!("Unknown ledger column: {}", s))
    }
}

/// Fixed checkpoints on the route network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FixedCheckpoint {
    DarGoing,
    MoroGoing,
    MbeyaGoing,
    TundumaGoing,
    ZambiaGoing,
    CongoGoing,
    ZambiaReturningNdola,
    ZambiaReturningKapiri,
    TundumaReturn,
    MbeyaReturn,
    MoroReturn,
    DarReturn,
    TangaReturn,
}

impl FixedCheckpoint {
    pub fn direction(&self) -> Direction {
        match self {
            Self::DarGoing
            | Self::MoroGoing
            | Self::MbeyaGoing
            | Self::TundumaGoing
            | Self::ZambiaGoing
            | Self::CongoGoing => Direction::Going,
            Self::ZambiaReturningNdola
            | Self::ZambiaReturningKapiri
            | Self::TundumaReturn
            | Self::MbeyaReturn
            | Self::MoroReturn
            | Self::DarReturn
            | Self::TangaReturn => Direction::Returning,
        }
    }

    pub fn column(&self) -> LedgerColumn {
        match self {
            Self::DarGoing => LedgerColumn::DarGoing,
            Self::MoroGoing => LedgerColumn::MoroGoing,
            Self::MbeyaGoing => LedgerColumn::MbeyaGoing,
            Self::TundumaGoing => LedgerColumn::TdmGoing,
            Self::ZambiaGoing => LedgerColumn::ZambiaGoing,
            Self::CongoGoing => LedgerColumn::CongoFuel,
            Self::ZambiaReturningNdola => LedgerColumn::ZambiaNdola,
            Self::ZambiaReturningKapiri => LedgerColumn::ZambiaKapiri,
            Self::TundumaReturn => LedgerColumn::TdmReturn,
            Self::MbeyaReturn => LedgerColumn::MbeyaReturn,
            Self::MoroReturn => LedgerColumn::MoroReturn,
            Self::DarReturn => LedgerColumn::DarReturn,
            Self::TangaReturn => LedgerColumn::TangaReturn,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DarGoing => "DAR_GOING",
            Self::MoroGoing => "MORO_GOING",
            Self::MbeyaGoing => "MBEYA_GOING",
            Self::TundumaGoing => "TUNDUMA_GOING",
            Self::ZambiaGoing => "ZAMBIA_GOING",
            Self::CongoGoing => "CONGO_GOING",
            Self::ZambiaReturningNdola => "ZAMBIA_RETURNING_NDOLA",
            Self::ZambiaReturningKapiri => "ZAMBIA_RETURNING_KAPIRI",
            Self::TundumaReturn => "TUNDUMA_RETURN",
            Self::MbeyaReturn => "MBEYA_RETURN",
            Self::MoroReturn => "MORO_RETURN",
            Self::DarReturn => "DAR_RETURN",
            Self::TangaReturn => "TANGA_RETURN",
        }
    }
}

impl std::fmt::Display for FixedCheckpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A resolved checkpoint: either one of the fixed points, or a user-labelled
/// custom station pinned to one direction and one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Checkpoint {
    Fixed {
        checkpoint: FixedCheckpoint,
    },
    Custom {
        station_name: String,
        direction: Direction,
        column: LedgerColumn,
    },
}

impl Checkpoint {
    pub fn direction(&self) -> Direction {
        match self {
            Self::Fixed { checkpoint } => checkpoint.direction(),
            Self::Custom { direction, .. } => *direction,
        }
    }

    pub fn column(&self) -> LedgerColumn {
        match self {
            Self::Fixed { checkpoint } => checkpoint.column(),
            Self::Custom { column, .. } => *column,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Fixed { checkpoint } => checkpoint.to_string(),
            Self::Custom {
                station_name,
                direction,
                ..
            } => match direction {
                Direction::Going => format!("CUSTOM_GOING:{}", station_name),
                Direction::Returning => format!("CUSTOM_RETURN:{}", station_name),
            },
        }
    }
}

/// Custom station as submitted by an operator. Each direction is switched on
/// independently and needs its own target column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomStationSelection {
    pub station_name: String,
    #[serde(default)]
    pub going_enabled: bool,
    #[serde(default)]
    pub going_column: Option<LedgerColumn>,
    #[serde(default)]
    pub returning_enabled: bool,
    #[serde(default)]
    pub returning_column: Option<LedgerColumn>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CheckpointSelection {
    Fixed { checkpoint: FixedCheckpoint },
    Custom(CustomStationSelection),
}

/// Direction plus checkpoint claimed by a CASH entry (or opted into by a
/// driver-account entry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationPoint {
    pub direction: Direction,
    pub selection: CheckpointSelection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMode {
    Station,
    Cash,
    DriverAccount,
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Station => "STATION",
            Self::Cash => "CASH",
            Self::DriverAccount => "DRIVER_ACCOUNT",
        }
    }
}

impl std::fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PaymentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "STATION" => Ok(Self::Station),
            "CASH" => Ok(Self::Cash),
            "DRIVER_ACCOUNT" => Ok(Self::DriverAccount),
            _ => Err(format!(
                "Invalid payment mode: {}. Must be one of: STATION, CASH, DRIVER_ACCOUNT",
                s
            )),
        }
    }
}
