//! Auto-iteration over paginated operations.
//!
//! A `Paginator` owns the request, a page fetcher, and an `IterationMode`. Each
//! call to `next` issues exactly one blocking request: the request's token
//! member is set to the cursor returned by the previous page, the fetcher runs,
//! and the resulting page is yielded. Iteration ends when the service returns
//! no cursor, after the first page in `SinglePage` mode, or after the first
//! error. The iterator is fused from then on, so no request is ever issued
//! after a failure.
use log::debug;

use crate::error::CmdletError;
use crate::result::Result;
use crate::token::ContinuationToken;

/// One page returned by the service.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Page payload (a list of items, or the whole response body).
    pub items: T,
    /// Cursor for the following page; `None` when the listing is exhausted.
    pub next_token: Option<ContinuationToken>,
}

impl<T> Page<T> {
    /// Builds a page, normalizing an empty token to `None`.
    pub fn new(items: T, next_token: Option<String>) -> Self {
        Self {
            items,
            next_token: ContinuationToken::from_option(next_token),
        }
    }
}

/// Whether the paginator follows continuation tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationMode {
    /// Keep requesting pages until the service returns no token.
    Auto,
    /// Issue exactly one request and hand the cursor back to the caller.
    SinglePage,
}

/// A request that carries a continuation token member.
pub trait TokenCursor {
    /// Token currently set on the request.
    fn token(&self) -> Option<&str>;
    /// Replace the request's token; `None` clears it.
    fn set_token(&mut self, token: Option<&ContinuationToken>);
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Start,
    Continue(ContinuationToken),
    Stalled(ContinuationToken),
    Done,
}

/// Lazy sequence of pages for one logical list/describe operation.
pub struct Paginator<R, T, F>
where
    R: TokenCursor,
    F: FnMut(&R) -> Result<Page<T>>,
{
    request: R,
    fetch: F,
    mode: IterationMode,
    state: State,
    pages: usize,
    last_token: Option<ContinuationToken>,
}

impl<R, T, F> Paginator<R, T, F>
where
    R: TokenCursor,
    F: FnMut(&R) -> Result<Page<T>>,
{
    /// Creates a paginator over `request`.
    ///
    /// The first request is sent with whatever token `request` already holds;
    /// an empty token is cleared so it reads as "start from the beginning".
    pub fn new(mut request: R, mode: IterationMode, fetch: F) -> Self {
        let initial = request.token().and_then(ContinuationToken::new);
        request.set_token(initial.as_ref());
        Self {
            request,
            fetch,
            mode,
            state: State::Start,
            pages: 0,
            last_token: None,
        }
    }

    /// Cursor returned with the most recent page.
    ///
    /// In `SinglePage` mode this is the token a caller passes back to continue
    /// manually.
    pub fn next_token(&self) -> Option<&ContinuationToken> {
        self.last_token.as_ref()
    }

    /// Number of pages fetched so far.
    pub fn pages_fetched(&self) -> usize {
        self.pages
    }

    fn fetch_page(&mut self) -> Result<Page<T>> {
        self.pages += 1;
        debug!(
            "Requesting page {} (token: {})",
            self.pages,
            self.request.token().unwrap_or("<none>")
        );
        (self.fetch)(&self.request)
    }
}

impl<R, T, F> Iterator for Paginator<R, T, F>
where
    R: TokenCursor,
    F: FnMut(&R) -> Result<Page<T>>,
{
    type Item = Result<Page<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        match std::mem::replace(&mut self.state, State::Done) {
            State::Done => return None,
            State::Stalled(token) => {
                return Some(Err(CmdletError::PaginationStalled(token.into_string())));
            }
            State::Start => {}
            State::Continue(token) => self.request.set_token(Some(&token)),
        }

        let sent = self.request.token().map(str::to_string);
        let page = match self.fetch_page() {
            Ok(page) => page,
            Err(e) => return Some(Err(e)),
        };
        self.last_token = page.next_token.clone();

        self.state = match (&page.next_token, self.mode) {
            (None, _) | (_, IterationMode::SinglePage) => State::Done,
            (Some(next), IterationMode::Auto) if sent.as_deref() == Some(next.as_str()) => {
                State::Stalled(next.clone())
            }
            (Some(next), IterationMode::Auto) => State::Continue(next.clone()),
        };
        Some(Ok(page))
    }
}

impl<R, T, F> std::iter::FusedIterator for Paginator<R, T, F>
where
    R: TokenCursor,
    F: FnMut(&R) -> Result<Page<T>>,
{
}
