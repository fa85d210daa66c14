//! User-facing strings, keyed by [`Language`].
//!
//! Everything the relay ever says to a sender on its own behalf lives here:
//! policy rejections, failure apologies, shaping tails (truncation notice,
//! conclusions, supplementary verses) and the menu texts used by the
//! messenger handler.

use scriptura_core::Language;

use crate::policy::Violation;

// ── Rejections ─────────────────────────────────────────────

pub fn rejection(violation: Violation, lang: Language) -> &'static str {
    use Language::{Fr, Mg};
    match (violation, lang) {
        (Violation::TooShort, Fr) => {
            "Votre question est trop courte. Pouvez-vous la préciser ?"
        }
        (Violation::TooShort, Mg) => {
            "Fohy loatra ny fanontanianao. Azonao atao ve ny manazava kokoa?"
        }
        (Violation::TooLong, Fr) => {
            "Votre question est trop longue (500 caractères maximum). Essayez de la résumer."
        }
        (Violation::TooLong, Mg) => {
            "Lava loatra ny fanontanianao (500 litera farafahabetsany). Andramo fohezina."
        }
        (Violation::PersonalProphecy, Fr) => {
            "Désolé, je ne donne pas de prophéties personnelles. La Bible seule est notre guide."
        }
        (Violation::PersonalProphecy, Mg) => {
            "Miala tsiny, fa tsy manome faminaniana manokana aho. Ny Baiboly irery no toriteny ho an'ny fiainantsika."
        }
        (Violation::ProsperityGospel, Fr) => {
            "Je ne prêche pas l'évangile de prospérité. Les vraies richesses sont en Christ."
        }
        (Violation::ProsperityGospel, Mg) => {
            "Tsy mitory ny filazantsaran'ny harena aho. Ao amin'i Kristy irery ny harena marina."
        }
        (Violation::WorksSalvation, Fr) => {
            "Le salut vient par la grâce seule, pas par les œuvres. (Éphésiens 2:8-9)"
        }
        (Violation::WorksSalvation, Mg) => {
            "Ny famonjena dia avy amin'ny fahasoavana ihany, tsy amin'ny asa atao. (Efesiana 2:8-9)"
        }
        (Violation::Occult, Fr) => "Ces pratiques sont contraires à l'enseignement biblique.",
        (Violation::Occult, Mg) => {
            "Ireo fanao ireo dia mifanohitra amin'ny fampianarana ara-Baiboly."
        }
        (Violation::Link, Fr) => {
            "Veuillez ne pas envoyer de liens. Posez votre question en texte."
        }
        (Violation::Link, Mg) => {
            "Azafady, aza mandefa rohy. Andehano ny fanontanianao amin'ny teny."
        }
    }
}

// ── Failures ───────────────────────────────────────────────

/// What went wrong with a backend call, as far as the sender is told.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Auth,
    RateLimited,
    Server,
    Timeout,
    Generic,
}

pub fn failure(kind: FailureKind, lang: Language) -> &'static str {
    use Language::{Fr, Mg};
    match (kind, lang) {
        (FailureKind::Auth, Fr) => {
            "Problème d'authentification. Désolé, je ne peux pas répondre pour l'instant."
        }
        (FailureKind::Auth, Mg) => {
            "Olana amin'ny fanamarinana. Miala tsiny, tsy afaka mamaly ankehitriny."
        }
        (FailureKind::RateLimited, Fr) => {
            "Trop de requêtes. Veuillez réessayer dans quelques minutes."
        }
        (FailureKind::RateLimited, Mg) => {
            "Tafahoatra ny fangatahana. Andramo indray afaka minitra vitsivitsy."
        }
        (FailureKind::Server, Fr) => "Problème serveur. Veuillez réessayer.",
        (FailureKind::Server, Mg) => "Olana amin'ny server. Andramo indray azafady.",
        (FailureKind::Timeout, Fr) => {
            "La requête a pris trop de temps. Essayez une question plus courte."
        }
        (FailureKind::Timeout, Mg) => {
            "Naharitra ela loatra ny fangatahana. Andramo fanontaniana fohy kokoa."
        }
        (FailureKind::Generic, Fr) => "Une erreur est survenue. Désolé, veuillez réessayer.",
        (FailureKind::Generic, Mg) => "Nisy olana nitranga. Miala tsiny, andramo indray.",
    }
}

// ── Shaping tails ──────────────────────────────────────────

pub fn truncation_notice(lang: Language) -> &'static str {
    match lang {
        Language::Fr => {
            "\n\n[...]\n\n**Note:** La réponse a été raccourcie. Vous pouvez demander plus de détails."
        }
        Language::Mg => {
            "\n\n[...]\n\n**Fanamarihana:** Nohafohezina ny valiny noho ny fetra. Azonao atao ny manontany fanazavana fanampiny."
        }
    }
}

/// A response already carrying one of these needs no appended conclusion.
pub const CONCLUSION_MARKERS: &[&str] = &["Réflexion:", "Fanontaniana:", "Question:", "Conclusion:"];

const FR_CONCLUSIONS: &[&str] = &[
    "\n\n**Question de réflexion:** Quelle application personnelle pouvez-vous tirer de cet enseignement?",
    "\n\n**Suggestion:** Essayez de lire le contexte plus large dans votre Bible.",
    "\n\n**Encouragement:** N'oubliez pas de chercher le soutien de votre église locale.",
];

const MG_CONCLUSIONS: &[&str] = &[
    "\n\n**Fanontaniana ho an'ny fieritreretana:** Inona no azonao ampiharina amin'ity fampianarana ity?",
    "\n\n**Soso-kevitra:** Andramo mijery ny tontolon-kevitra manontolo amin'ny Baiboly.",
    "\n\n**Famporisihana:** Aza adino ny mitady fanohanana eo amin'ny fiangonana eo an-toerana.",
];

pub fn conclusions(lang: Language) -> &'static [&'static str] {
    match lang {
        Language::Fr => FR_CONCLUSIONS,
        Language::Mg => MG_CONCLUSIONS,
    }
}

// ── Enrichment ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Comfort,
    Guidance,
    Forgiveness,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verse {
    pub reference: &'static str,
    pub text: &'static str,
}

/// Keyword sets checked in order; the first hit decides the topic.
const TOPIC_KEYWORDS: &[(&[&str], Topic)] = &[
    (&["peur", "inquiét", "tahotra"], Topic::Comfort),
    (&["choix", "décision", "safidy"], Topic::Guidance),
    (&["pardon", "forgiv", "famela"], Topic::Forgiveness),
    (&["épreuve", "souffrance", "fijaliana"], Topic::Comfort),
    (&["foi", "finoana", "confiance"], Topic::Guidance),
];

pub fn topic_for(question: &str) -> Option<Topic> {
    let lower = question.to_lowercase();
    TOPIC_KEYWORDS
        .iter()
        .find(|(words, _)| words.iter().any(|w| lower.contains(w)))
        .map(|(_, topic)| *topic)
}

const COMFORT: &[Verse] = &[
    Verse {
        reference: "Psaume 23:4",
        text: "Quand je marche dans la vallée de l'ombre de la mort...",
    },
    Verse {
        reference: "Matthieu 11:28",
        text: "Venez à moi, vous tous qui êtes fatigués...",
    },
    Verse {
        reference: "2 Corinthiens 1:3-4",
        text: "Béni soit Dieu, le Père de notre Seigneur...",
    },
];

const GUIDANCE: &[Verse] = &[
    Verse {
        reference: "Proverbes 3:5-6",
        text: "Confie-toi en l'Éternel de tout ton cœur...",
    },
    Verse {
        reference: "Psaume 119:105",
        text: "Ta parole est une lampe à mes pieds...",
    },
    Verse {
        reference: "Jacques 1:5",
        text: "Si quelqu'un d'entre vous manque de sagesse...",
    },
];

const FORGIVENESS: &[Verse] = &[
    Verse {
        reference: "1 Jean 1:9",
        text: "Si nous confessons nos péchés, il est fidèle et juste...",
    },
    Verse {
        reference: "Éphésiens 4:32",
        text: "Soyez bons les uns envers les autres...",
    },
    Verse {
        reference: "Colossiens 3:13",
        text: "Supportez-vous les uns les autres...",
    },
];

pub fn verses(topic: Topic) -> &'static [Verse] {
    match topic {
        Topic::Comfort => COMFORT,
        Topic::Guidance => GUIDANCE,
        Topic::Forgiveness => FORGIVENESS,
    }
}

/// The appended enrichment line, leading blank line included.
pub fn verse_line(verse: &Verse, lang: Language) -> String {
    let label = match lang {
        Language::Fr => "Verset supplémentaire",
        Language::Mg => "Andininy fanampiny",
    };
    format!("\n\n**{label}:** {} - \"{}\"", verse.reference, verse.text)
}

// ── Prompt fragments ───────────────────────────────────────

pub fn canon_reminder(lang: Language) -> &'static str {
    match lang {
        Language::Fr => {
            "**Attention:** la question mentionne des livres hors du canon. Rappelle que seuls les 66 livres canoniques font autorité."
        }
        Language::Mg => {
            "**Fampitandremana:** misy boky ivelan'ny kanona voatonona. Ampahatsiahivo fa ny boky kanonika 66 ihany no manana fahefana."
        }
    }
}

// ── Messenger texts ────────────────────────────────────────

pub fn rate_limited(lang: Language) -> &'static str {
    match lang {
        Language::Fr => "⚠️ Trop de messages envoyés. Veuillez patienter quelques instants.",
        Language::Mg => "⚠️ Be loatra ny hafatra nalefa. Miandrasa kely azafady.",
    }
}

pub fn text_only(lang: Language) -> &'static str {
    match lang {
        Language::Fr => {
            "Veuillez envoyer un message texte. Je ne peux pas traiter les images ou fichiers audio."
        }
        Language::Mg => {
            "Mandefasa hafatra an-tsoratra azafady. Tsy afaka mamaky sary na feo aho."
        }
    }
}

pub fn unknown_option(lang: Language) -> &'static str {
    match lang {
        Language::Fr => "Option non reconnue. Tapez \"menu\" pour voir les options.",
        Language::Mg => "Safidy tsy fantatra. Soraty \"menu\" hahitana ireo safidy.",
    }
}

pub fn welcome(lang: Language) -> &'static str {
    match lang {
        Language::Fr => {
            "🤖 **Bienvenue sur Scriptura !**\n\n\
             Je suis un assistant biblique basé sur la théologie réformée protestante.\n\n\
             **Mes limites:**\n\
             ⚠️ Je ne donne pas de prophéties personnelles\n\
             ⚠️ Je ne remplace pas un pasteur humain\n\
             ⚠️ Pas de conseils médicaux/psychologiques\n\n\
             Tapez votre question ou choisissez une option ci-dessous:"
        }
        Language::Mg => {
            "🤖 **Tongasoa eto amin'i Scriptura!**\n\n\
             Mpanampy ara-Baiboly miorina amin'ny teolojia reformista protestanta aho.\n\n\
             **Ny fetrako:**\n\
             ⚠️ Tsy manome faminaniana manokana\n\
             ⚠️ Tsy misolo toerana ny mpitory\n\
             ⚠️ Tsy manome toro-hevitra ara-pitsaboana\n\n\
             Soraty ny fanontanianao na misafidiana eto ambany:"
        }
    }
}

pub fn help(lang: Language) -> &'static str {
    match lang {
        Language::Fr => {
            "🆘 **Aide - Commandes disponibles**\n\n\
             • /start ou \"menu\" - Menu principal\n\
             • /aide ou /help - Ce message d'aide\n\n\
             **Exemples de questions:**\n\
             • \"Explique-moi Romains 8:28\"\n\
             • \"Qu'est-ce que la justification par la foi?\"\n\
             • \"Comment pardonner selon la Bible?\"\n\n\
             Pour des conseils pastoraux, contactez votre église locale."
        }
        Language::Mg => {
            "🆘 **Fanampiana - Baiko azo ampiasaina**\n\n\
             • /start na \"menu\" - Menu fototra\n\
             • /aide na /help - Ity hafatra ity\n\n\
             **Ohatra fanontaniana:**\n\
             • \"Hazavao ahy Romana 8:28\"\n\
             • \"Inona no atao hoe fanamarinana amin'ny finoana?\"\n\n\
             Raha mila toro-hevitra pastoraly, manatona ny fiangonanao."
        }
    }
}

/// Quick-reply titles in menu order: prayer, study, doctrine, church.
pub fn menu_titles(lang: Language) -> [&'static str; 4] {
    match lang {
        Language::Fr => [
            "🙏 Demande de prière",
            "📖 Étude biblique",
            "❓ Doctrine réformée",
            "🏠 Trouver une église",
        ],
        Language::Mg => [
            "🙏 Fangatahana vavaka",
            "📖 Fianarana Baiboly",
            "❓ Foto-pinoana",
            "🏠 Mitady fiangonana",
        ],
    }
}

pub fn prayer(lang: Language) -> &'static str {
    match lang {
        Language::Fr => {
            "🙏 **Demande de prière**\n\n\
             **Quelques versets pour la prière:**\n\
             • Philippiens 4:6-7 - Ne vous inquiétez de rien\n\
             • 1 Jean 5:14-15 - La confiance en Dieu\n\
             • Matthieu 7:7-8 - Demandez, cherchez, frappez\n\n\
             Dites-moi ce pour quoi vous voulez prier, et je vous aiderai avec des textes bibliques appropriés."
        }
        Language::Mg => {
            "🙏 **Fangatahana vavaka**\n\n\
             • Filipiana 4:6-7 - Aza manahy na inona na inona\n\
             • 1 Jaona 5:14-15 - Ny fahatokisana an'Andriamanitra\n\
             • Matio 7:7-8 - Mangataha, mitadiava, dondony\n\n\
             Lazao ahy izay tianao hivavahana, dia hanampy anao amin'ny andinin-teny mety aho."
        }
    }
}

pub fn bible_study(lang: Language) -> &'static str {
    match lang {
        Language::Fr => {
            "📖 **Étude biblique**\n\n\
             **Méthode d'étude:**\n\
             1. Contexte historique et littéraire\n\
             2. Sens du texte (exégèse)\n\
             3. Doctrine enseignée\n\
             4. Application personnelle\n\n\
             **Envoyez-moi un passage ou une question!**"
        }
        Language::Mg => {
            "📖 **Fandinihana Baiboly**\n\n\
             1. Tontolon-kevitra ara-tantara sy ara-literatiora\n\
             2. Ny hevitry ny lahatsoratra\n\
             3. Ny fampianarana\n\
             4. Fampiharana manokana\n\n\
             **Alefaso ahy ny andalan-teny na fanontaniana!**"
        }
    }
}

pub fn doctrine(lang: Language) -> &'static str {
    match lang {
        Language::Fr => {
            "❓ **Doctrines réformées**\n\n\
             • Sola Scriptura - Bible seule\n\
             • Sola Gratia - Grâce seule\n\
             • Sola Fide - Foi seule\n\
             • Solus Christus - Christ seul\n\
             • Soli Deo Gloria - À Dieu seul la gloire\n\n\
             **Demandez-moi une explication sur une doctrine!**"
        }
        Language::Mg => {
            "❓ **Fotopampianarana reformista**\n\n\
             • Sola Scriptura - Ny Baiboly irery\n\
             • Sola Gratia - Ny fahasoavana irery\n\
             • Sola Fide - Ny finoana irery\n\
             • Solus Christus - I Kristy irery\n\
             • Soli Deo Gloria - Ho an'Andriamanitra irery ny voninahitra\n\n\
             **Manontania ahy momba ny fotopampianarana iray!**"
        }
    }
}

pub fn find_church(lang: Language) -> &'static str {
    match lang {
        Language::Fr => {
            "🏠 **Trouver une église réformée**\n\n\
             • Hébreux 10:25 - Ne pas abandonner l'assemblée\n\
             • Actes 2:42 - La communion fraternelle\n\n\
             1. Cherchez \"église réformée\" + votre ville\n\
             2. Vérifiez la confession de foi\n\n\
             *Je vous encourage vivement à vous attacher à une église locale!*"
        }
        Language::Mg => {
            "🏠 **Mitady fiangonana reformista**\n\n\
             • Hebreo 10:25 - Aza mahafoy ny fivoriana\n\
             • Asan'ny Apostoly 2:42 - Ny fiombonana\n\n\
             1. Tadiavo \"fiangonana reformista\" + ny tanànanao\n\
             2. Jereo ny fanekem-pinoany\n\n\
             *Mamporisika anao aho hifikitra amin'ny fiangonana eo an-toerana!*"
        }
    }
}

pub fn more_info(lang: Language) -> &'static str {
    match lang {
        Language::Fr => {
            "Je suis basé sur la théologie réformée protestante (Sola Scriptura). \
             Je peux vous aider à comprendre la Bible et réfléchir bibliquement à votre situation."
        }
        Language::Mg => {
            "Miorina amin'ny teolojia reformista protestanta aho (Sola Scriptura). \
             Afaka manampy anao hahatakatra ny Baiboly sy handinika ara-Baiboly ny toe-javatra iainanao aho."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_detection_follows_keyword_order() {
        assert_eq!(topic_for("J'ai peur de l'avenir"), Some(Topic::Comfort));
        assert_eq!(topic_for("Comment faire un CHOIX ?"), Some(Topic::Guidance));
        assert_eq!(topic_for("Comment pardonner?"), Some(Topic::Forgiveness));
        assert_eq!(topic_for("Inona ny finoana?"), Some(Topic::Guidance));
        // fear wins over forgiveness
        assert_eq!(topic_for("peur du pardon"), Some(Topic::Comfort));
        assert_eq!(topic_for("Qui est Melchisédek ?"), None);
    }

    #[test]
    fn pools_are_never_empty() {
        for lang in [Language::Fr, Language::Mg] {
            assert!(!conclusions(lang).is_empty());
        }
        for topic in [Topic::Comfort, Topic::Guidance, Topic::Forgiveness] {
            assert_eq!(verses(topic).len(), 3);
        }
    }

    #[test]
    fn verse_line_is_labelled_per_language() {
        let v = verses(Topic::Forgiveness)[0];
        assert!(verse_line(&v, Language::Fr).starts_with("\n\n**Verset supplémentaire:** 1 Jean 1:9"));
        assert!(verse_line(&v, Language::Mg).starts_with("\n\n**Andininy fanampiny:**"));
    }

    #[test]
    fn menu_titles_fit_quick_reply_limit() {
        for lang in [Language::Fr, Language::Mg] {
            for title in menu_titles(lang) {
                assert!(title.chars().count() <= 20, "{title}");
            }
        }
    }
}
