//! Game server resolution.
//!
//! Every account id belongs to exactly one regional deployment, picked by its
//! leading digit. Genshin and Star Rail use different tokens for the same
//! region:
//!
//! | leading digit | Genshin | Star Rail |
//! |---|---|---|
//! | 1, 2 | `cn_gf01` | `prod_gf_cn` |
//! | 5 | `cn_qd01` | `prod_qd_cn` |
//! | 6 | `os_usa` | `prod_official_usa` |
//! | 7 | `os_euro` | `prod_official_euro` |
//! | 8 | `os_asia` | `prod_official_asia` |
//! | 9 | `os_cht` | `prod_official_cht` |
//!
//! Anything else falls back to the official domestic server.

use serde::{Deserialize, Serialize};

/// Games served by the same API client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Game {
    #[default]
    Genshin,
    StarRail,
}

impl Game {
    /// Forum game id used by the community endpoints
    pub fn forum_id(self) -> u8 {
        match self {
            Self::Genshin => 2,
            Self::StarRail => 6,
        }
    }
}

impl std::fmt::Display for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Genshin => write!(f, "genshin"),
            Self::StarRail => write!(f, "starrail"),
        }
    }
}

/// Deployment family a server belongs to.
///
/// Drives salt, header template and proxy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServerFamily {
    /// Mainland China (miHoYo)
    Domestic,
    /// Global (HoYoLAB)
    Overseas,
}

/// Regional deployment of the provider's API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServerCode {
    GenshinOfficial,
    GenshinChannel,
    GenshinAmericas,
    GenshinEurope,
    GenshinAsia,
    GenshinGreaterChina,
    StarRailOfficial,
    StarRailChannel,
    StarRailAmericas,
    StarRailEurope,
    StarRailAsia,
    StarRailGreaterChina,
}

impl ServerCode {
    /// Resolve the server for an account id.
    ///
    /// Total: unknown or missing leading digits resolve to the official
    /// domestic server of `game`.
    pub fn resolve(uid: &str, game: Game) -> Self {
        let leading = uid.trim_start().chars().next();
        match (game, leading) {
            (Game::Genshin, Some('5')) => Self::GenshinChannel,
            (Game::Genshin, Some('6')) => Self::GenshinAmericas,
            (Game::Genshin, Some('7')) => Self::GenshinEurope,
            (Game::Genshin, Some('8')) => Self::GenshinAsia,
            (Game::Genshin, Some('9')) => Self::GenshinGreaterChina,
            (Game::Genshin, _) => Self::GenshinOfficial,
            (Game::StarRail, Some('5')) => Self::StarRailChannel,
            (Game::StarRail, Some('6')) => Self::StarRailAmericas,
            (Game::StarRail, Some('7')) => Self::StarRailEurope,
            (Game::StarRail, Some('8')) => Self::StarRailAsia,
            (Game::StarRail, Some('9')) => Self::StarRailGreaterChina,
            (Game::StarRail, _) => Self::StarRailOfficial,
        }
    }

    /// Wire token sent to the provider
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GenshinOfficial => "cn_gf01",
            Self::GenshinChannel => "cn_qd01",
            Self::GenshinAmericas => "os_usa",
            Self::GenshinEurope => "os_euro",
            Self::GenshinAsia => "os_asia",
            Self::GenshinGreaterChina => "os_cht",
            Self::StarRailOfficial => "prod_gf_cn",
            Self::StarRailChannel => "prod_qd_cn",
            Self::StarRailAmericas => "prod_official_usa",
            Self::StarRailEurope => "prod_official_euro",
            Self::StarRailAsia => "prod_official_asia",
            Self::StarRailGreaterChina => "prod_official_cht",
        }
    }

    pub fn family(self) -> ServerFamily {
        match self {
            Self::GenshinOfficial
            | Self::GenshinChannel
            | Self::StarRailOfficial
            | Self::StarRailChannel => ServerFamily::Domestic,
            _ => ServerFamily::Overseas,
        }
    }

    pub fn is_overseas(self) -> bool {
        self.family() == ServerFamily::Overseas
    }

    pub fn game(self) -> Game {
        match self {
            Self::GenshinOfficial
            | Self::GenshinChannel
            | Self::GenshinAmericas
            | Self::GenshinEurope
            | Self::GenshinAsia
            | Self::GenshinGreaterChina => Game::Genshin,
            _ => Game::StarRail,
        }
    }
}

impl std::fmt::Display for ServerCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
