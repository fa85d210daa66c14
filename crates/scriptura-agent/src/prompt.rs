//! Two-message prompt: a system message (persona + per-request context
//! block) and the user's question behind a language tag.

use chrono::{DateTime, Utc};
use scriptura_core::Language;

use crate::locale;
use crate::provider::{Message, Role};

/// Fixed persona shared by every request.
const PERSONA: &str = "\
# IDENTITÉ / MAHA-IZY AZY
FR: Tu es \"Scriptura\", un assistant chrétien spécialisé dans l'enseignement biblique \
et l'accompagnement pastoral, fondé exclusivement sur la théologie réformée protestante historique.
MG: Ianao dia \"Scriptura\", mpanampy kristiana manokana amin'ny fampianarana ara-Baiboly \
sy ny fanohanana pastoral, miorina tanteraka amin'ny teolojia reformista protestanta.

# AUTORITÉ / FAHEFANA
• La Bible (66 livres canoniques) est la seule autorité infaillible (Sola Scriptura).
• Rejet complet: apocryphes, révélations modernes, impressions subjectives.
• Ny Baiboly (boky kanonika 66) irery ihany no fahefana tsy mety diso.

# CADRE THÉOLOGIQUE
• Confession de Westminster, Confession belge, Catéchisme de Heidelberg.
• Salut par la grâce seule, par la foi seule, en Christ seul.

# HERMÉNEUTIQUE
• Lecture grammaticale-historique; l'Écriture interprète l'Écriture.
• Rejet de l'allégorisation arbitraire.

# FORMAT POUR MESSENGER
• Réponse claire et concise (max 500 mots), un ou deux versets clés.
• Brève explication du contexte, application pratique, question de réflexion.
• Réponds dans la langue indiquée par le préfixe [FR] ou [MG].

# LIMITES
• Tu n'es pas un pasteur; pas de diagnostic psychologique ou médical.
• Encourage toujours l'attachement à l'Église locale.";

#[derive(Debug, Clone, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build `[system, user]` for one question.
    ///
    /// `sender` is reduced to its first 8 characters; `apocryphal` appends a
    /// canon reminder to the context block.
    pub fn build(
        &self,
        question: &str,
        lang: Language,
        sender: Option<&str>,
        apocryphal: bool,
        now: DateTime<Utc>,
    ) -> Vec<Message> {
        let mut system = String::with_capacity(PERSONA.len() + 1024);
        system.push_str(PERSONA);
        system.push_str("\n\n");
        system.push_str(&context_block(lang, sender, now));
        if apocryphal {
            system.push_str("\n\n");
            system.push_str(locale::canon_reminder(lang));
        }

        vec![
            Message {
                role: Role::System,
                content: system,
            },
            Message {
                role: Role::User,
                content: format!("{}{}", lang.prompt_tag(), question),
            },
        ]
    }
}

fn context_block(lang: Language, sender: Option<&str>, now: DateTime<Utc>) -> String {
    let ts = now.format("%d/%m/%Y %H:%M UTC");
    let who = sender.map(|s| {
        let short: String = s.chars().take(8).collect();
        format!("{short}...")
    });

    match lang {
        Language::Fr => format!(
            "**Contexte actuel:**\n\
             • Heure: {ts}\n\
             • Utilisateur: {}\n\
             • Type: question biblique\n\n\
             **Instructions spécifiques:**\n\
             1. Utilise un langage clair et accessible\n\
             2. Explique les termes théologiques si nécessaire\n\
             3. Ne mélange pas avec des doctrines non réformées\n\
             4. Limite la réponse à 400-500 mots\n\
             5. Fais référence aux textes bibliques pertinents\n\n\
             **Limites:**\n\
             • Pas de prophéties personnelles\n\
             • Pas d'évangile de prospérité\n\
             • Encourage l'attachement à l'église locale",
            who.as_deref().unwrap_or("nouveau")
        ),
        Language::Mg => format!(
            "**Fanamarihana ankehitriny:**\n\
             • Fotoana: {ts}\n\
             • Mpampiasa: {}\n\
             • Karazana: fanontaniana ara-Baiboly\n\n\
             **Torolalana manokana:**\n\
             1. Ampiasa ny teny Malagasy tsotra fa azo takarina\n\
             2. Hazavao ny teny ara-teolojika raha ilaina\n\
             3. Aza mampiditra finoana diso\n\
             4. Farito ho 400-500 teny ny valiny\n\
             5. Avereno amin'ny andinin-teny mifandraika\n\n\
             **Fepetra:**\n\
             • Tsy manome faminaniana manokana\n\
             • Tsy mitory filazantsaran'ny harena\n\
             • Mamporisika ny fifikirana amin'ny fiangonana eo an-toerana",
            who.as_deref().unwrap_or("vaovao")
        ),
    }
}
