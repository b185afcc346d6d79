//! Assistant prompt assembly.
//!
//! The template lives in `config/prompts/library_qa.txt` and is embedded at
//! build time. Variables use `{{key}}` syntax and are substituted in one pass.

use crate::catalog::BookContext;

/// Question-answering template over a catalog excerpt.
pub const LIBRARY_QA_TEMPLATE: &str = include_str!("../../config/prompts/library_qa.txt");

/// Substitute every `{{key}}` in `template` in a single pass.
///
/// Substituted values are never rescanned, so a question containing
/// `{{books}}` stays literal. Unknown keys are left as written.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let template = template.trim();
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            rest = &rest[start..];
            break;
        };
        let key = &after[..end];
        match vars.iter().find(|(k, _)| *k == key) {
            Some((_, value)) => out.push_str(value),
            None => {
                out.push_str("{{");
                out.push_str(key);
                out.push_str("}}");
            }
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

/// One line per book: `- title | المؤلف: … | الموضوع: …`.
pub fn books_excerpt(books: &[BookContext]) -> String {
    let mut out = String::from("قاعدة بيانات المكتبة:\n\n");
    for book in books {
        out.push_str("- ");
        out.push_str(book.title.as_deref().unwrap_or("-"));
        if let Some(author) = &book.author {
            out.push_str(" | المؤلف: ");
            out.push_str(author);
        }
        if let Some(subject) = &book.subject {
            out.push_str(" | الموضوع: ");
            out.push_str(subject);
        }
        out.push('\n');
    }
    out
}

/// Full prompt for `question` given the matched rows and catalog size.
pub fn build(question: &str, books: &[BookContext], total_books: u64) -> String {
    let total = super::format::group_thousands(total_books);
    let excerpt = books_excerpt(books);
    render(
        LIBRARY_QA_TEMPLATE,
        &[("total", &total), ("question", question), ("books", &excerpt)],
    )
}
