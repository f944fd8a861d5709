//! Extra-fuel detection against the standard allocation table.
//!
//! Read-only analytics: nothing here mutates a record.

use crate::models::{FuelRecord, LedgerColumn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

/// Standard allocation per column, signed like the ledger (yards positive,
/// checkpoints negative). Columns without a standard are never flagged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraFuelStandards {
    standards: BTreeMap<LedgerColumn, Decimal>,
}

impl Default for ExtraFuelStandards {
    fn default() -> Self {
        use LedgerColumn::*;
        let standards = [
            (DarYard, 550),
            (TangaYard, 550),
            (MmsaYard, 550),
            (DarGoing, -50),
            (MoroGoing, -100),
            (MbeyaGoing, -450),
            (TdmGoing, -150),
            (ZambiaGoing, -250),
            (ZambiaNdola, -400),
            (ZambiaKapiri, -100),
            (TdmReturn, -100),
            (MbeyaReturn, -400),
            (MoroReturn, -100),
            (DarReturn, -50),
            (TangaReturn, -50),
        ]
        .into_iter()
        .map(|(column, litres)| (column, Decimal::from(litres)))
        .collect();

        Self { standards }
    }
}

impl ExtraFuelStandards {
    pub fn get(&self, column: LedgerColumn) -> Option<Decimal> {
        self.standards.get(&column).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LedgerColumn, Decimal)> + '_ {
        self.standards.iter().map(|(c, v)| (*c, *v))
    }

    /// Defaults with `overrides` (column name -> litres) applied on top.
    pub fn with_overrides(overrides: &HashMap<String, String>) -> Result<Self, String> {
        let mut standards = Self::default();
        for (name, value) in overrides {
            let column = LedgerColumn::from_str(name)?;
            let litres = Decimal::from_str(value.trim())
                .map_err(|e| format!("Invalid standard for {}: {}", name, e))?;
            standards.standards.insert(column, litres);
        }
        Ok(standards)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraFuelFlag {
    pub column: LedgerColumn,
    pub standard: Decimal,
    pub actual: Decimal,
    /// Litres beyond the standard, as a positive quantity.
    pub delta: Decimal,
}

/// Columns whose value exceeds the standard in magnitude on the same side
/// of zero.
pub fn detect_extra_fuel(record: &FuelRecord, standards: &ExtraFuelStandards) -> Vec<ExtraFuelFlag> {
    standards
        .iter()
        .filter_map(|(column, standard)| {
            let actual = record.column(column);
            let same_side = actual.is_sign_negative() == standard.is_sign_negative();
            if actual.is_zero() || !same_side || actual.abs() <= standard.abs() {
                return None;
            }
            Some(ExtraFuelFlag {
                column,
                standard,
                actual,
                delta: actual.abs() - standard.abs(),
            })
        })
        .collect()
}
