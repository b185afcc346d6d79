//! Reply texts and record formatting.
//!
//! Replies use Telegram's legacy Markdown (`*bold*`). Fields holding the
//! catalog's absent placeholder never reach this module; they arrive as
//! `None` and are skipped.

use crate::catalog::{BookContext, BookDetail, BookSummary, CatalogStats, CatalogSummary, SearchField};

const RULE_WIDTH: usize = 30;
const RULE_CHAR: char = '─';

/// Which label the sixth column of a [`BookSummary`] gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtraLabel {
    Classification,
    Subject,
}

impl From<SearchField> for ExtraLabel {
    fn from(field: SearchField) -> Self {
        match field {
            SearchField::Subject => ExtraLabel::Subject,
            _ => ExtraLabel::Classification,
        }
    }
}

fn rule() -> String {
    let mut s: String = std::iter::repeat_n(RULE_CHAR, RULE_WIDTH).collect();
    s.push('\n');
    s
}

fn push_field(out: &mut String, label: &str, value: Option<&str>) {
    if let Some(v) = value {
        out.push_str(label);
        out.push_str(": ");
        out.push_str(v);
        out.push('\n');
    }
}

/// Listing block for one search hit.
pub fn book_summary(book: &BookSummary, label: ExtraLabel) -> String {
    let mut out = format!("📖 *{}*\n\n", book.title.as_deref().unwrap_or("-"));
    push_field(&mut out, "✍️ المؤلف", book.author.as_deref());
    push_field(&mut out, "🏢 الناشر", book.publisher.as_deref());
    push_field(&mut out, "📅 السنة", book.year.as_deref());
    let extra_label = match label {
        ExtraLabel::Classification => "🔢 التصنيف",
        ExtraLabel::Subject => "📑 الموضوع",
    };
    push_field(&mut out, extra_label, book.extra.as_deref());
    push_field(&mut out, "🆔 رقم السجل", Some(&book.record_id));
    out.push_str(&rule());
    out
}

/// Full block for a record-id lookup.
pub fn book_detail(book: &BookDetail) -> String {
    let mut out = format!("📖 *{}*\n\n", book.title.as_deref().unwrap_or("-"));
    push_field(&mut out, "🆔 رقم السجل", Some(&book.record_id));
    push_field(&mut out, "✍️ المؤلف", book.author.as_deref());
    push_field(&mut out, "🏢 الناشر", book.publisher.as_deref());
    push_field(&mut out, "📅 السنة", book.year.as_deref());
    push_field(&mut out, "📄 الصفحات", book.pages.as_deref());
    push_field(&mut out, "🔢 التصنيف", book.classification.as_deref());
    let subject = book.subject.as_deref().map(|s| truncate_chars(s, 100));
    push_field(&mut out, "📑 الموضوع", subject.as_deref());
    push_field(&mut out, "📕 ISBN", book.isbn.as_deref());
    out.push_str(&rule());
    out
}

pub fn results_header(count: usize) -> String {
    format!("✅ وجدت *{count}* نتيجة:\n\n")
}

pub fn record_results_header(count: usize) -> String {
    format!("✅ تم العثور على *{count}* سجل:\n\n")
}

/// `/stats` overview.
pub fn summary(s: &CatalogSummary) -> String {
    let mut out = format!(
        "📊 *إحصائيات المكتبة:*\n\n📚 إجمالي الكتب: *{}*\n✍️ عدد المؤلفين: *{}*\n\n",
        group_thousands(s.total_books),
        group_thousands(s.total_authors),
    );
    if let Some((title, year)) = &s.oldest {
        out.push_str(&format!("📅 أقدم كتاب: {} ({year})\n", truncate_chars(title, 40)));
    }
    if let Some((title, year)) = &s.newest {
        out.push_str(&format!("📅 أحدث كتاب: {} ({year})\n", truncate_chars(title, 40)));
    }
    if !s.top_subjects.is_empty() {
        out.push_str("\n🔥 *أكثر المواضيع:*\n");
        for (i, (subject, count)) in s.top_subjects.iter().enumerate() {
            out.push_str(&format!("{}. {} ({count} كتاب)\n", i + 1, truncate_chars(subject, 50)));
        }
    }
    out.push_str("\n🔍 جاهز للبحث في أي وقت!");
    out
}

/// Reply to a statistics question.
pub fn stats(s: &CatalogStats, library_name: &str) -> String {
    let mut out = format!(
        "📊 *إحصائيات {library_name}*\n\n\
         📚 *إجمالي العناوين/الكتب:* {} كتاب\n\
         ✍️ *عدد المؤلفين:* {} مؤلف\n\
         🏢 *عدد الناشرين:* {} ناشر\n\
         📑 *عدد التصنيفات:* {}\n\
         🏷️ *عدد الموضوعات:* {}\n\n",
        group_thousands(s.total_books),
        group_thousands(s.total_authors),
        group_thousands(s.total_publishers),
        group_thousands(s.total_classifications),
        group_thousands(s.total_subjects),
    );
    if !s.top_authors.is_empty() {
        out.push_str("🔝 *أكثر المؤلفين كتباً:*\n");
        for (i, (author, count)) in s.top_authors.iter().enumerate() {
            out.push_str(&format!("   {}. {} ({count} كتاب)\n", i + 1, truncate_chars(author, 40)));
        }
        out.push('\n');
    }
    if !s.top_subjects.is_empty() {
        out.push_str("🔥 *أكثر الموضوعات:*\n");
        for (i, (subject, count)) in s.top_subjects.iter().enumerate() {
            out.push_str(&format!("   {}. {} ({count} كتاب)\n", i + 1, truncate_chars(subject, 40)));
        }
        out.push('\n');
    }
    out.push_str("💡 للبحث عن كتاب معين، اكتب اسمه أو اسم المؤلف");
    out
}

/// Numbered listing used when the assistant gives no answer.
pub fn simple_results(books: &[BookContext]) -> String {
    if books.is_empty() {
        return "😔 لم أجد أي كتب مطابقة لبحثك.".to_string();
    }
    let mut out = format!("📚 وجدت *{}* كتاب:\n\n", books.len());
    for (i, book) in books.iter().take(10).enumerate() {
        out.push_str(&format!("{}. 📖 *{}*\n", i + 1, book.title.as_deref().unwrap_or("-")));
        if let Some(author) = &book.author {
            out.push_str(&format!("   ✍️ {author}\n"));
        }
        if let Some(year) = &book.year {
            out.push_str(&format!("   📅 {year}\n"));
        }
        out.push('\n');
    }
    out
}

pub fn smart_answer(answer: &str) -> String {
    format!("🧠 *إجابة ذكية:*\n\n{answer}")
}

pub fn welcome(library_name: &str, total_books: Option<u64>, assistant: bool) -> String {
    let mut out = format!("🌟 *أهلاً بك في بوت {library_name}*\n\n");
    if assistant {
        out.push_str("🧠 *مدعوم بالذكاء الاصطناعي*\n\n");
    }
    if let Some(n) = total_books {
        out.push_str(&format!("📚 لديّ قاعدة بيانات بـ *{}* كتاب جاهزة للبحث!\n\n", group_thousands(n)));
    }
    out.push_str(
        "*الأوامر المتاحة:*\n\n\
         🔍 /search - بحث عام في جميع الحقول\n\
         ✍️ /author - بحث بالمؤلف\n\
         📖 /title - بحث بالعنوان\n\
         📑 /subject - بحث بالموضوع\n\
         📅 /year - بحث بالسنة\n\
         📊 /stats - إحصائيات المكتبة\n\
         ❓ /help - المساعدة\n\n\
         *أو اكتب أي سؤال مباشرة وسأبحث لك!*\n\n\
         مثال: \"كتب ابن تيمية\" أو \"الفقه الحنبلي\"",
    );
    out
}

pub fn help() -> String {
    "📖 *كيفية استخدام البوت:*\n\n\
     *1️⃣ البحث البسيط:*\n\
     فقط اكتب ما تريد البحث عنه:\n\
     - \"الفقه\"\n\
     - \"ابن القيم\"\n\
     - \"التفسير\"\n\n\
     *2️⃣ البحث المتقدم:*\n\
     /search كلمة البحث\n\
     /author اسم المؤلف\n\
     /title عنوان الكتاب\n\
     /subject الموضوع\n\
     /year 1400\n\n\
     *3️⃣ البحث برقم السجل:*\n\
     اكتب \"رقم السجل 511\" أو الرقم وحده\n\n\
     *4️⃣ الإحصائيات:*\n\
     اكتب \"احصائيات\" أو \"كم عدد الكتب\"\n\n\
     💡 *نصيحة:* يمكنك البحث بكلمة واحدة أو عدة كلمات"
        .to_string()
}

pub fn missing_argument(field: SearchField) -> String {
    let (what, example) = match field {
        SearchField::All => ("كلمة البحث", "/search الفقه"),
        SearchField::Author => ("اسم المؤلف", "/author ابن تيمية"),
        SearchField::Title => ("عنوان الكتاب", "/title صحيح"),
        SearchField::Subject => ("الموضوع", "/subject الحديث"),
        SearchField::Year => ("السنة", "/year 1400"),
    };
    format!("❌ الرجاء كتابة {what}\nمثال: {example}")
}

pub fn too_short(min_chars: usize) -> String {
    format!("❌ الرجاء كتابة كلمة بحث أطول ({min_chars} أحرف على الأقل)")
}

pub fn searching(query: &str) -> String {
    format!("🔍 جاري البحث عن: *{query}*...")
}

pub fn searching_record(record_id: &str) -> String {
    format!("🔍 جاري البحث عن سجل رقم: *{record_id}*...")
}

pub fn no_results() -> String {
    "😔 لم أجد أي نتائج. جرب كلمات بحث أخرى.".to_string()
}

pub fn record_not_found(record_id: &str) -> String {
    format!("😔 لم أجد سجل برقم: {record_id}\n\n💡 تأكد من صحة الرقم أو جرب البحث بالعنوان")
}

/// Sent when a plain-text search finds nothing, even word by word.
pub fn no_results_suggestions() -> String {
    "😔 لم أجد نتائج مطابقة.\n\n\
     💡 نصائح للبحث:\n\
     • جرب كلمة واحدة بدلاً من جملة\n\
     • استخدم اسم المؤلف أو جزء من العنوان\n\
     • للبحث برقم السجل: اكتب \"رقم السجل 123\"\n\
     • لعرض الإحصائيات: اكتب \"احصائيات\" أو \"كم عدد الكتب\"\n\n\
     📝 أمثلة:\n\
     • ابن تيمية\n\
     • الفقه\n\
     • التفسير\n\
     • رقم السجل 511"
        .to_string()
}

pub fn apology() -> String {
    "😔 عذراً، حدث خطأ. الرجاء المحاولة مرة أخرى.".to_string()
}

/// `1234567` → `"1,234,567"`.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Keep the first `max` chars, appending `...` when something was cut.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max).collect();
    out.push_str("...");
    out
}

/// Variation selectors, zero-width joiner and the keycap mark attach to the
/// preceding character.
fn attaches_to_previous(c: char) -> bool {
    matches!(c, '\u{FE00}'..='\u{FE0F}' | '\u{200D}' | '\u{20E3}')
}

/// Split `s` into pieces of at most `max` chars.
///
/// Each cut goes after the last newline that fits. Without one, the cut is
/// moved back so an emoji keeps its selector or joiner.
fn split_chars(s: &str, max: usize) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut pieces = Vec::new();
    let mut start = 0;

    while chars.len() - start > max {
        let window = &chars[start..start + max];
        let mut cut = match window.iter().rposition(|&c| c == '\n') {
            Some(i) if i > 0 => i + 1,
            _ => max,
        };
        if cut == max {
            while cut > 1
                && (attaches_to_previous(chars[start + cut]) || chars[start + cut - 1] == '\u{200D}')
            {
                cut -= 1;
            }
        }
        pieces.push(chars[start..start + cut].iter().collect());
        start += cut;
    }
    pieces.push(chars[start..].iter().collect());
    pieces
}

/// Pack `header` followed by `blocks` into messages of at most `max_chars`
/// characters each.
///
/// A new message starts whenever the next block would overflow the current
/// one; a block that is longer than `max_chars` on its own is cut at a line
/// break where possible. Empty pieces are dropped, so no message is empty.
pub fn chunk_blocks<I>(header: &str, blocks: I, max_chars: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let max = max_chars.max(1);
    let pieces = std::iter::once(header.to_string())
        .chain(blocks)
        .filter(|p| !p.is_empty())
        .flat_map(|p| split_chars(&p, max));

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    for piece in pieces {
        let len = piece.chars().count();
        if current_len + len > max && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current.push_str(&piece);
        current_len += len;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary_book(title: &str, author: Option<&str>) -> BookSummary {
        BookSummary {
            record_id: "17".into(),
            title: Some(title.into()),
            author: author.map(str::to_string),
            publisher: None,
            year: Some("1400".into()),
            extra: Some("297.4".into()),
        }
    }

    #[test]
    fn summary_block_skips_absent_fields() {
        let text = book_summary(&summary_book("الموافقات", None), ExtraLabel::Classification);
        assert!(text.starts_with("📖 *الموافقات*"));
        assert!(!text.contains("المؤلف"));
        assert!(!text.contains("الناشر"));
        assert!(text.contains("📅 السنة: 1400"));
        assert!(text.contains("🔢 التصنيف: 297.4"));
        assert!(text.contains("🆔 رقم السجل: 17"));
        assert!(text.ends_with(&format!("{}\n", "─".repeat(30))));
    }

    #[test]
    fn subject_label_for_subject_search() {
        let text = book_summary(&summary_book("x", Some("y")), ExtraLabel::from(SearchField::Subject));
        assert!(text.contains("📑 الموضوع: 297.4"));
    }

    #[test]
    fn detail_truncates_long_subject() {
        let book = BookDetail {
            record_id: "1".into(),
            title: Some("t".into()),
            author: None,
            publisher: None,
            year: None,
            pages: Some("320".into()),
            classification: None,
            subject: Some("س".repeat(150)),
            isbn: Some("978-0".into()),
        };
        let text = book_detail(&book);
        assert!(text.contains(&format!("📑 الموضوع: {}...", "س".repeat(100))));
        assert!(text.contains("📄 الصفحات: 320"));
        assert!(text.contains("📕 ISBN: 978-0"));
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(3931), "3,931");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn truncation_counts_chars() {
        assert_eq!(truncate_chars("abc", 3), "abc");
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
        assert_eq!(truncate_chars("كتابكتاب", 4), "كتاب...");
    }

    #[test]
    fn chunking_never_exceeds_threshold() {
        let blocks: Vec<String> = (0..50).map(|i| format!("block {i} {}\n", "x".repeat(90))).collect();
        let chunks = chunk_blocks("header\n", blocks.clone(), 1000);
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.chars().count() <= 1000);
            assert!(!c.is_empty());
        }
        // Nothing lost, nothing reordered.
        let expected: String = std::iter::once("header\n".to_string()).chain(blocks).collect();
        assert_eq!(chunks.concat(), expected);
    }

    #[test]
    fn oversized_block_is_hard_split() {
        let chunks = chunk_blocks("", vec!["ب".repeat(25)], 10);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 10);
        assert_eq!(chunks[2].chars().count(), 5);
    }

    #[test]
    fn oversized_block_is_cut_at_line_break() {
        let block = format!("{}\n{}\n", "أ".repeat(6), "ب".repeat(6));
        let chunks = chunk_blocks("", vec![block], 10);
        assert_eq!(chunks, vec![format!("{}\n", "أ".repeat(6)), format!("{}\n", "ب".repeat(6))]);
    }

    #[test]
    fn hard_split_keeps_emoji_selector() {
        // "✍️" is U+270D U+FE0F; a plain cut at 4 would strand the selector.
        let block = String::from("abc✍\u{FE0F}def");
        let chunks = chunk_blocks("", vec![block.clone()], 4);
        assert!(chunks.iter().all(|c| c.chars().count() <= 4));
        assert!(chunks.iter().all(|c| !c.starts_with('\u{FE0F}')));
        assert!(chunks.iter().any(|c| c.contains("✍\u{FE0F}")));
        assert_eq!(chunks.concat(), block);
    }

    #[test]
    fn short_listing_is_one_message() {
        let chunks = chunk_blocks("h", vec!["a".into(), "b".into()], 3500);
        assert_eq!(chunks, vec!["hab".to_string()]);
    }

    #[test]
    fn simple_results_lists_at_most_ten() {
        let books: Vec<BookContext> = (0..12)
            .map(|i| BookContext {
                record_id: i.to_string(),
                title: Some(format!("title-{i}")),
                author: None,
                publisher: None,
                year: None,
                classification: None,
                subject: None,
                pages: None,
            })
            .collect();
        let text = simple_results(&books);
        assert!(text.contains("*12*"));
        assert!(text.contains("10. 📖 *title-9*"));
        assert!(!text.contains("title-10"));
    }

    #[test]
    fn missing_argument_has_example() {
        assert!(missing_argument(SearchField::Year).contains("/year 1400"));
    }
}
