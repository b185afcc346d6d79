//! Library agent — turns one chat message into a list of replies.
//!
//! The agent is stateless: each call routes the message
//! ([`router::route`] / [`router::classify`]), runs the matching catalog
//! query on the blocking pool, and formats the rows ([`format`]). When an
//! assistant provider is configured, general questions are answered by the
//! language model over a small catalog excerpt ([`prompt`]).
//!
//! Errors never reach the chat user as technical text: anything escaping a
//! branch is logged and replaced with a single apology reply.

pub mod format;
pub mod prompt;
pub mod router;

use tracing::{debug, error, info, warn};

use crate::catalog::{BookSummary, Catalog, SearchField};
use crate::config::{Config, SearchConfig};
use crate::error::AppError;
use crate::llm::{LlmProvider, providers};

use format::ExtraLabel;
use router::{Intent, Request};

/// One outgoing chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    /// Whether `text` uses Markdown markup.
    pub markdown: bool,
}

impl Reply {
    pub fn markdown(text: impl Into<String>) -> Self {
        Self { text: text.into(), markdown: true }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), markdown: false }
    }
}

pub struct LibraryAgent {
    catalog: Catalog,
    assistant: Option<LlmProvider>,
    search: SearchConfig,
    library_name: String,
}

impl LibraryAgent {
    pub fn new(
        catalog: Catalog,
        assistant: Option<LlmProvider>,
        search: SearchConfig,
        library_name: impl Into<String>,
    ) -> Self {
        Self { catalog, assistant, search, library_name: library_name.into() }
    }

    /// Build the agent and its optional assistant from config.
    pub fn from_config(config: &Config, catalog: Catalog) -> Result<Self, AppError> {
        let assistant = providers::build(&config.llm, config.llm_api_key.clone())
            .map_err(|e| AppError::Llm(e.to_string()))?;
        if let Some(p) = &assistant {
            info!(provider = p.name(), "assistant enabled");
        }
        Ok(Self::new(catalog, assistant, config.search.clone(), config.library_name.clone()))
    }

    pub fn assistant_enabled(&self) -> bool {
        self.assistant.is_some()
    }

    /// Handle one incoming message. Never fails; an internal error becomes
    /// the apology reply. Unknown commands yield no replies.
    pub async fn handle(&self, text: &str) -> Vec<Reply> {
        let request = router::route(text);
        debug!(?request, "message routed");
        match self.dispatch(request).await {
            Ok(replies) => replies,
            Err(e) => {
                error!(error = %e, "message handling failed");
                vec![Reply::plain(format::apology())]
            }
        }
    }

    async fn dispatch(&self, request: Request) -> Result<Vec<Reply>, AppError> {
        match request {
            Request::Start => {
                let count = match self.blocking(|c| c.count()).await? {
                    Ok(n) => Some(n),
                    Err(e) => {
                        warn!(error = %e, "book count unavailable for welcome text");
                        None
                    }
                };
                Ok(vec![Reply::markdown(format::welcome(
                    &self.library_name,
                    count,
                    self.assistant_enabled(),
                ))])
            }
            Request::Help => Ok(vec![Reply::markdown(format::help())]),
            Request::Stats => {
                let summary = self.blocking(|c| c.summary()).await??;
                Ok(vec![Reply::markdown(format::summary(&summary))])
            }
            Request::Search { field, query } => self.field_search(field, query).await,
            Request::MissingArgument(field) => Ok(vec![Reply::plain(format::missing_argument(field))]),
            Request::Unknown(command) => {
                debug!(%command, "ignoring unknown command");
                Ok(Vec::new())
            }
            Request::Text(text) => self.plain_text(&text).await,
        }
    }

    async fn plain_text(&self, text: &str) -> Result<Vec<Reply>, AppError> {
        let intent = router::classify(text, self.search.min_query_chars);
        info!(?intent, "plain text classified");
        match intent {
            Intent::TooShort => Ok(vec![Reply::plain(format::too_short(self.search.min_query_chars))]),
            Intent::Stats => {
                let stats = self.blocking(|c| c.detailed_stats()).await??;
                Ok(vec![Reply::markdown(format::stats(&stats, &self.library_name))])
            }
            Intent::RecordLookup(id) => self.record_lookup(id).await,
            Intent::General(query) => {
                if let Some(replies) = self.ask_assistant(&query).await? {
                    return Ok(replies);
                }
                self.general_search(query).await
            }
        }
    }

    async fn field_search(&self, field: SearchField, query: String) -> Result<Vec<Reply>, AppError> {
        let mut replies = vec![Reply::markdown(format::searching(&query))];
        let limit = self.search.limit;
        let books = self.blocking(move |c| c.search(&query, field, limit)).await?;
        if books.is_empty() {
            replies.push(Reply::plain(format::no_results()));
        } else {
            replies.extend(self.listing(&books, ExtraLabel::from(field)));
        }
        Ok(replies)
    }

    async fn record_lookup(&self, record_id: String) -> Result<Vec<Reply>, AppError> {
        let mut replies = vec![Reply::markdown(format::searching_record(&record_id))];
        let id = record_id.clone();
        let books = self.blocking(move |c| c.find_by_record_id(&id)).await?;
        if books.is_empty() {
            replies.push(Reply::plain(format::record_not_found(&record_id)));
            return Ok(replies);
        }

        let blocks = books.iter().take(self.search.record_preview).map(format::book_detail);
        let header = format::record_results_header(books.len());
        replies.extend(
            format::chunk_blocks(&header, blocks, self.search.chunk_chars)
                .into_iter()
                .map(Reply::markdown),
        );
        Ok(replies)
    }

    /// Multi-column search, retrying word by word when the whole phrase
    /// finds nothing.
    async fn general_search(&self, query: String) -> Result<Vec<Reply>, AppError> {
        let mut replies = vec![Reply::markdown(format::searching(&query))];
        let limit = self.search.limit;
        let books = self
            .blocking(move |c| {
                let books = c.flexible_search(&query, limit);
                let words: Vec<&str> = query.split_whitespace().collect();
                if !books.is_empty() || words.len() < 2 {
                    return books;
                }
                words
                    .iter()
                    .filter(|w| w.chars().count() > 2)
                    .map(|w| c.flexible_search(w, limit))
                    .find(|found| !found.is_empty())
                    .unwrap_or_default()
            })
            .await?;

        if books.is_empty() {
            replies.push(Reply::plain(format::no_results_suggestions()));
        } else {
            replies.extend(self.listing(&books, ExtraLabel::Classification));
        }
        Ok(replies)
    }

    /// Answer with the language model, if one is configured.
    ///
    /// Returns `None` when there is no assistant, or when it failed and
    /// there were no rows to list instead; the caller then runs the regular
    /// search.
    async fn ask_assistant(&self, query: &str) -> Result<Option<Vec<Reply>>, AppError> {
        let Some(provider) = &self.assistant else {
            return Ok(None);
        };

        let q = query.to_string();
        let limit = self.search.ai_context_limit;
        let (books, total) = self
            .blocking(move |c| {
                let books = c.relevant_books(&q, limit);
                let total = c.count().unwrap_or(books.len() as u64);
                (books, total)
            })
            .await?;

        let prompt = prompt::build(query, &books, total);
        match provider.complete(&prompt).await {
            Ok(answer) => {
                debug!(provider = provider.name(), answer_len = answer.len(), "assistant answered");
                Ok(Some(vec![Reply::markdown(format::smart_answer(&answer))]))
            }
            Err(e) => {
                warn!(provider = provider.name(), error = %e, "assistant failed, falling back to listing");
                if books.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(vec![Reply::markdown(format::simple_results(&books))]))
                }
            }
        }
    }

    fn listing(&self, books: &[BookSummary], label: ExtraLabel) -> Vec<Reply> {
        let blocks = books.iter().map(|b| format::book_summary(b, label));
        format::chunk_blocks(&format::results_header(books.len()), blocks, self.search.chunk_chars)
            .into_iter()
            .map(Reply::markdown)
            .collect()
    }

    /// Run a synchronous catalog operation on the blocking pool.
    async fn blocking<T, F>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&Catalog) -> T + Send + 'static,
        T: Send + 'static,
    {
        let catalog = self.catalog.clone();
        tokio::task::spawn_blocking(move || f(&catalog))
            .await
            .map_err(|e| AppError::Catalog(format!("catalog task failed: {e}")))
    }
}
