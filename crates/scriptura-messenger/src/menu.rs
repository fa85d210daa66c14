//! Menu payloads and the canned texts behind them.

use scriptura_agent::locale;
use scriptura_core::Language;

use crate::api::QuickReply;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuPayload {
    GetStarted,
    PrayerRequest,
    BibleStudy,
    DoctrineHelp,
    FindChurch,
    MoreInfo,
}

impl MenuPayload {
    pub fn parse(payload: &str) -> Option<Self> {
        match payload.trim() {
            "GET_STARTED" => Some(Self::GetStarted),
            "PRAYER_REQUEST" => Some(Self::PrayerRequest),
            "BIBLE_STUDY" => Some(Self::BibleStudy),
            // Older page configurations still send DOCTRINE_QUESTION.
            "DOCTRINE_HELP" | "DOCTRINE_QUESTION" => Some(Self::DoctrineHelp),
            "FIND_CHURCH" => Some(Self::FindChurch),
            "MORE_INFO" => Some(Self::MoreInfo),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetStarted => "GET_STARTED",
            Self::PrayerRequest => "PRAYER_REQUEST",
            Self::BibleStudy => "BIBLE_STUDY",
            Self::DoctrineHelp => "DOCTRINE_HELP",
            Self::FindChurch => "FIND_CHURCH",
            Self::MoreInfo => "MORE_INFO",
        }
    }

    pub fn text(&self, lang: Language) -> &'static str {
        match self {
            Self::GetStarted => locale::welcome(lang),
            Self::PrayerRequest => locale::prayer(lang),
            Self::BibleStudy => locale::bible_study(lang),
            Self::DoctrineHelp => locale::doctrine(lang),
            Self::FindChurch => locale::find_church(lang),
            Self::MoreInfo => locale::more_info(lang),
        }
    }
}

const MENU_ORDER: [MenuPayload; 4] = [
    MenuPayload::PrayerRequest,
    MenuPayload::BibleStudy,
    MenuPayload::DoctrineHelp,
    MenuPayload::FindChurch,
];

/// Quick replies shown under the welcome text.
pub fn main_menu(lang: Language) -> Vec<QuickReply> {
    locale::menu_titles(lang)
        .iter()
        .zip(MENU_ORDER)
        .map(|(title, payload)| QuickReply::new(*title, payload.as_str()))
        .collect()
}
