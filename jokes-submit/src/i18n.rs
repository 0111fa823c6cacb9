//! Localized response messages
//!
//! Messages are looked up by key and language. Templates use `%1`, `%2`, ...
//! placeholders filled from the argument list.

/// Every message the submission endpoint can send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKey {
    InvalidJson,
    RequestBodyInvalid,
    InvalidChars,
    WrongFormatVersion,
    SubmissionFormatInvalid,
    RateLimited,
    DryRunSuccessful,
    SavingFailed,
    SubmissionSaved,
}

/// Translation lookup
pub trait Translator: Send + Sync {
    fn translate(&self, lang: &str, key: MessageKey, args: &[String]) -> String;
}

/// Compiled-in English and German message tables
#[derive(Debug, Clone)]
pub struct BuiltinTranslations {
    default_language: String,
}

impl BuiltinTranslations {
    pub fn new(default_language: impl Into<String>) -> Self {
        Self {
            default_language: default_language.into().to_lowercase(),
        }
    }
}

impl Translator for BuiltinTranslations {
    fn translate(&self, lang: &str, key: MessageKey, args: &[String]) -> String {
        let template = template(&lang.to_lowercase(), key)
            .or_else(|| template(&self.default_language, key))
            .unwrap_or_else(|| english(key));
        fill(template, args)
    }
}

fn template(lang: &str, key: MessageKey) -> Option<&'static str> {
    match lang {
        "en" => Some(english(key)),
        "de" => Some(german(key)),
        _ => None,
    }
}

fn english(key: MessageKey) -> &'static str {
    match key {
        MessageKey::InvalidJson => "The request body could not be parsed as JSON: %1",
        MessageKey::RequestBodyInvalid => "The request body is empty or invalid",
        MessageKey::InvalidChars => "The submission contains invalid characters: %1",
        MessageKey::WrongFormatVersion => {
            "The submission uses format version %2 but the current version is %1"
        }
        MessageKey::SubmissionFormatInvalid => "The submitted joke is formatted incorrectly:\n%1",
        MessageKey::RateLimited => {
            "You have exceeded the limit of %1 submissions per %2 minute(s), please try again later"
        }
        MessageKey::DryRunSuccessful => {
            "Dry run complete: the joke is valid for format version %1 (submitted: %2) and was not saved"
        }
        MessageKey::SavingFailed => "Internal error while saving the submission: %1",
        MessageKey::SubmissionSaved => "The joke submission was saved and will be reviewed",
    }
}

fn german(key: MessageKey) -> &'static str {
    match key {
        MessageKey::InvalidJson => "Der Request-Body konnte nicht als JSON gelesen werden: %1",
        MessageKey::RequestBodyInvalid => "Der Request-Body ist leer oder ungültig",
        MessageKey::InvalidChars => "Die Einreichung enthält ungültige Zeichen: %1",
        MessageKey::WrongFormatVersion => {
            "Die Einreichung nutzt Formatversion %2, die aktuelle Version ist aber %1"
        }
        MessageKey::SubmissionFormatInvalid => "Der eingereichte Witz ist falsch formatiert:\n%1",
        MessageKey::RateLimited => {
            "Das Limit von %1 Einreichungen pro %2 Minute(n) wurde überschritten, bitte später erneut versuchen"
        }
        MessageKey::DryRunSuccessful => {
            "Testlauf abgeschlossen: der Witz ist gültig für Formatversion %1 (eingereicht: %2) und wurde nicht gespeichert"
        }
        MessageKey::SavingFailed => "Interner Fehler beim Speichern der Einreichung: %1",
        MessageKey::SubmissionSaved => "Die Einreichung wurde gespeichert und wird geprüft",
    }
}

/// Replace `%N` placeholders in a single pass
///
/// Inserted arguments are never scanned again, so user text containing `%1`
/// stays as it is. Out-of-range placeholders are kept literally.
fn fill(template: &str, args: &[String]) -> String {
    let mut text = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            text.push(c);
            continue;
        }

        let mut digits = String::new();
        while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
            digits.push(d);
            chars.next();
        }

        match digits.parse::<usize>().ok().and_then(|n| n.checked_sub(1)).and_then(|i| args.get(i)) {
            Some(arg) => text.push_str(arg),
            None => {
                text.push('%');
                text.push_str(&digits);
            }
        }
    }

    text
}
