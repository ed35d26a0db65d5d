//! The closed set of gameplay disciplines completions are tracked under.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The four supported rulesets.
///
/// Stored and transmitted as the remote service's wire keys (`osu`, `taiko`,
/// `fruits`, `mania`). Catch is the odd one out: its wire key is `fruits`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum Ruleset {
    #[sea_orm(string_value = "osu")]
    Osu,
    #[sea_orm(string_value = "taiko")]
    Taiko,
    #[sea_orm(string_value = "fruits")]
    #[serde(rename = "fruits")]
    Catch,
    #[sea_orm(string_value = "mania")]
    Mania,
}

impl Ruleset {
    /// All rulesets in canonical order.
    pub const ALL: [Ruleset; 4] = [Ruleset::Osu, Ruleset::Taiko, Ruleset::Catch, Ruleset::Mania];

    /// The wire key used by the remote API and the database.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Ruleset::Osu => "osu",
            Ruleset::Taiko => "taiko",
            Ruleset::Catch => "fruits",
            Ruleset::Mania => "mania",
        }
    }

    /// Iteration order for a sync pass: the user's preferred ruleset first,
    /// then the remaining three in canonical order.
    #[must_use]
    pub fn sync_order(primary: Ruleset) -> [Ruleset; 4] {
        let mut order = [primary; 4];
        let mut i = 1;
        for ruleset in Ruleset::ALL {
            if ruleset != primary {
                order[i] = ruleset;
                i += 1;
            }
        }
        order
    }
}

impl std::fmt::Display for Ruleset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Ruleset {
    type Err = String;

    /// Accepts the wire keys plus the common community aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "osu" | "osu!" | "osu!standard" | "standard" | "std" | "circles" => Ok(Ruleset::Osu),
            "taiko" | "osu!taiko" | "drums" => Ok(Ruleset::Taiko),
            "fruits" | "catch" | "ctb" | "osu!catch" | "osu!ctb" => Ok(Ruleset::Catch),
            "mania" | "osu!mania" | "keys" => Ok(Ruleset::Mania),
            _ => Err(format!("unknown ruleset: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_keys_round_trip() {
        for ruleset in Ruleset::ALL {
            assert_eq!(ruleset.as_str().parse::<Ruleset>().unwrap(), ruleset);
        }
    }

    #[test]
    fn test_from_str_aliases() {
        assert_eq!("osu!standard".parse::<Ruleset>().unwrap(), Ruleset::Osu);
        assert_eq!("CTB".parse::<Ruleset>().unwrap(), Ruleset::Catch);
        assert_eq!("drums".parse::<Ruleset>().unwrap(), Ruleset::Taiko);
        assert_eq!("keys".parse::<Ruleset>().unwrap(), Ruleset::Mania);
        assert!("waveform".parse::<Ruleset>().is_err());
    }

    #[test]
    fn test_sync_order_puts_primary_first() {
        assert_eq!(
            Ruleset::sync_order(Ruleset::Mania),
            [Ruleset::Mania, Ruleset::Osu, Ruleset::Taiko, Ruleset::Catch]
        );
        assert_eq!(Ruleset::sync_order(Ruleset::Osu), Ruleset::ALL);
    }

    #[test]
    fn test_serde_uses_wire_keys() {
        assert_eq!(serde_json::to_string(&Ruleset::Catch).unwrap(), "\"fruits\"");
        let parsed: Ruleset = serde_json::from_str("\"fruits\"").unwrap();
        assert_eq!(parsed, Ruleset::Catch);
    }
}
