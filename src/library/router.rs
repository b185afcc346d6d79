//! Message routing: slash commands and plain-text intent detection.
//!
//! [`route`] turns a raw chat message into a [`Request`]; plain text is then
//! classified by [`classify`] into one of the canned query shapes.

use std::sync::LazyLock;

use regex::Regex;

use crate::catalog::SearchField;

/// A parsed chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Start,
    Help,
    Stats,
    /// A field-specific search command with its argument.
    Search { field: SearchField, query: String },
    /// A search command sent without an argument.
    MissingArgument(SearchField),
    /// A slash command this bot does not know; ignored.
    Unknown(String),
    /// Plain text, trimmed.
    Text(String),
}

/// What a plain-text message is asking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    TooShort,
    Stats,
    RecordLookup(String),
    General(String),
}

/// Commands advertised to the chat platform, with their descriptions.
pub const COMMANDS: &[(&str, &str)] = &[
    ("start", "رسالة الترحيب"),
    ("help", "المساعدة"),
    ("stats", "إحصائيات المكتبة"),
    ("search", "بحث عام في جميع الحقول"),
    ("author", "بحث بالمؤلف"),
    ("title", "بحث بالعنوان"),
    ("subject", "بحث بالموضوع"),
    ("year", "بحث بالسنة"),
];

/// Parse a raw message.
pub fn route(text: &str) -> Request {
    let text = text.trim();
    let Some(command_line) = text.strip_prefix('/') else {
        return Request::Text(text.to_string());
    };

    let mut parts = command_line.split_whitespace();
    let head = parts.next().unwrap_or_default();
    // `/search@my_bot` in group chats.
    let command = head.split('@').next().unwrap_or_default().to_lowercase();
    let args: Vec<&str> = parts.collect();

    let field = match command.as_str() {
        "start" => return Request::Start,
        "help" => return Request::Help,
        "stats" => return Request::Stats,
        "search" => SearchField::All,
        "author" => SearchField::Author,
        "title" => SearchField::Title,
        "subject" => SearchField::Subject,
        "year" => SearchField::Year,
        _ => return Request::Unknown(command),
    };

    let query = if field == SearchField::Year {
        args.first().map(|a| a.to_string()).unwrap_or_default()
    } else {
        args.join(" ")
    };

    if query.is_empty() {
        Request::MissingArgument(field)
    } else {
        Request::Search { field, query }
    }
}

/// Phrases that mark a question about catalog size or statistics.
const STATS_KEYWORDS: &[&str] = &[
    "كم عدد", "كم كتاب", "عدد الكتب", "إجمالي", "اجمالي",
    "كم مخطوطة", "عدد المخطوطات", "كم العناوين", "عدد العناوين",
    "كم مؤلف", "عدد المؤلفين", "احصائيات", "إحصائيات", "إحصاء",
    "عطني احصائية", "اعطني احصائية", "أعطني إحصائية", "عطني إحصائية",
    "احصائية", "إحصائية", "الاحصائيات", "الإحصائيات",
    "عطني معلومات", "اعطني معلومات", "معلومات عامة",
    "كم لديك", "كم عندك", "ماذا لديك", "ماذا عندك",
    "وش عندك", "ايش عندك", "شو عندك", "كم فيه", "كم موجود",
    "ملخص", "نظرة عامة", "تقرير", "عدد السجلات",
    "statistics", "stats", "how many", "summary",
];

/// Record-id patterns, tried in order; the first capture group is the id.
static RECORD_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"رقم\s*السجل\s*[:=]?\s*(\d+)",
        r"سجل\s*رقم\s*[:=]?\s*(\d+)",
        r"سجل\s*[:=]?\s*(\d+)",
        r"رقم\s*[:=]?\s*(\d+)",
        r"السجل\s*[:=]?\s*(\d+)",
        r"(?i)record\s*[:=]?\s*(\d+)",
        r"^(\d+)$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Whether `text` asks for catalog statistics.
pub fn is_stats_question(text: &str) -> bool {
    let lowered = text.to_lowercase();
    STATS_KEYWORDS.iter().any(|k| lowered.contains(k))
}

/// Pull a record id out of `text`, if it names one.
pub fn extract_record_id(text: &str) -> Option<String> {
    RECORD_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(text).map(|caps| caps[1].to_string()))
}

/// Classify trimmed plain text. Checks run in a fixed order: length,
/// statistics, record id, then general search.
pub fn classify(text: &str, min_chars: usize) -> Intent {
    let text = text.trim();
    if text.chars().count() < min_chars {
        return Intent::TooShort;
    }
    if is_stats_question(text) {
        return Intent::Stats;
    }
    if let Some(id) = extract_record_id(text) {
        return Intent::RecordLookup(id);
    }
    Intent::General(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(route("  الفقه الحنبلي "), Request::Text("الفقه الحنبلي".into()));
    }

    #[test]
    fn fixed_commands() {
        assert_eq!(route("/start"), Request::Start);
        assert_eq!(route("/help"), Request::Help);
        assert_eq!(route("/STATS"), Request::Stats);
    }

    #[test]
    fn search_commands_join_arguments() {
        assert_eq!(
            route("/author  ابن   تيمية"),
            Request::Search { field: SearchField::Author, query: "ابن تيمية".into() }
        );
        assert_eq!(
            route("/search الفقه"),
            Request::Search { field: SearchField::All, query: "الفقه".into() }
        );
        assert_eq!(
            route("/subject الحديث"),
            Request::Search { field: SearchField::Subject, query: "الحديث".into() }
        );
    }

    #[test]
    fn year_keeps_first_argument_only() {
        assert_eq!(
            route("/year 1400 1401"),
            Request::Search { field: SearchField::Year, query: "1400".into() }
        );
    }

    #[test]
    fn bot_suffix_is_stripped() {
        assert_eq!(
            route("/title@fihris_bot صحيح"),
            Request::Search { field: SearchField::Title, query: "صحيح".into() }
        );
    }

    #[test]
    fn missing_argument_and_unknown() {
        assert_eq!(route("/title"), Request::MissingArgument(SearchField::Title));
        assert_eq!(route("/year   "), Request::MissingArgument(SearchField::Year));
        assert_eq!(route("/foo bar"), Request::Unknown("foo".into()));
    }

    #[test]
    fn stats_keywords_detected() {
        assert!(is_stats_question("كم عدد الكتب عندكم؟"));
        assert!(is_stats_question("اعطني احصائية"));
        assert!(is_stats_question("How many books?"));
        assert!(!is_stats_question("كتب ابن تيمية"));
    }

    #[test]
    fn record_id_patterns() {
        assert_eq!(extract_record_id("رقم السجل 511").as_deref(), Some("511"));
        assert_eq!(extract_record_id("رقم السجل: 42").as_deref(), Some("42"));
        assert_eq!(extract_record_id("سجل رقم 7").as_deref(), Some("7"));
        assert_eq!(extract_record_id("سجل=12").as_deref(), Some("12"));
        assert_eq!(extract_record_id("Record 99").as_deref(), Some("99"));
        assert_eq!(extract_record_id("1234").as_deref(), Some("1234"));
        assert_eq!(extract_record_id("كتب سنة 1400"), None);
        assert_eq!(extract_record_id("التفسير"), None);
    }

    #[test]
    fn classify_order() {
        assert_eq!(classify("ا", 2), Intent::TooShort);
        // Statistics wins over an embedded number.
        assert_eq!(classify("كم عدد السجلات 5", 2), Intent::Stats);
        assert_eq!(classify("رقم السجل 511", 2), Intent::RecordLookup("511".into()));
        assert_eq!(classify("  التفسير ", 2), Intent::General("التفسير".into()));
    }
}
