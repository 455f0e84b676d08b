//! Page state machine for the reader UI.

/// Every screen the UI can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    /// Feed list with unread counts.
    Home,
    /// Posts of one feed.
    Content,
    /// Posts of all feeds, newest first.
    Mixed,
    /// One post's body.
    Reader,
    /// Posts matching a query.
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Open,
    Back,
    ShowMixed,
    BeginSearch,
    SubmitSearch,
    CancelSearch,
}

impl Page {
    /// The transition table. `None` means the transition does not apply on
    /// this page. Leaving the reader returns to the list it was opened from,
    /// which [`Navigator`] tracks; the table answers `Content` for it.
    pub fn next(self, transition: Transition) -> Option<Page> {
        use Page::*;
        use Transition::*;

        match (self, transition) {
            (Home, Open) => Some(Content),
            (Home, ShowMixed) => Some(Mixed),
            (Content | Mixed | Search, Open) => Some(Reader),
            (Content | Mixed | Search, Back) => Some(Home),
            (Reader, Back) => Some(Content),
            (Home | Content | Mixed | Search, BeginSearch | CancelSearch) => Some(self),
            (Home | Content | Mixed | Search, SubmitSearch) => Some(Search),
            (Home, Back) => None,
            (Reader, Open | ShowMixed | BeginSearch | SubmitSearch | CancelSearch) => None,
            (Content | Mixed | Search, ShowMixed) => None,
        }
    }

    pub fn is_post_list(self) -> bool {
        matches!(self, Page::Content | Page::Mixed | Page::Search)
    }

    pub fn title(self) -> &'static str {
        match self {
            Page::Home => "Feeds",
            Page::Content => "Posts",
            Page::Mixed => "All posts",
            Page::Reader => "Reader",
            Page::Search => "Search",
        }
    }
}

/// Current page plus the state that outlives a single page: where the
/// reader returns to and the search prompt while it is open.
#[derive(Debug, Clone)]
pub struct Navigator {
    page: Page,
    reader_origin: Page,
    prompt: Option<String>,
}

impl Navigator {
    pub fn new(start: Page) -> Self {
        Self {
            page: start,
            reader_origin: Page::Content,
            prompt: None,
        }
    }

    pub fn page(&self) -> Page {
        self.page
    }

    /// Apply `transition`, returning whether it was accepted.
    pub fn apply(&mut self, transition: Transition) -> bool {
        let Some(mut next) = self.page.next(transition) else {
            return false;
        };

        match transition {
            Transition::BeginSearch => self.prompt = Some(String::new()),
            Transition::SubmitSearch | Transition::CancelSearch => self.prompt = None,
            _ => {}
        }

        if self.page == Page::Reader && transition == Transition::Back {
            next = self.reader_origin;
        }
        if next == Page::Reader {
            self.reader_origin = self.page;
        }

        self.page = next;
        true
    }

    /// The list page whose posts are on screen or behind the reader.
    pub fn list_page(&self) -> Page {
        if self.page == Page::Reader {
            self.reader_origin
        } else {
            self.page
        }
    }

    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref()
    }

    pub fn prompt_mut(&mut self) -> Option<&mut String> {
        self.prompt.as_mut()
    }

    pub fn is_prompting(&self) -> bool {
        self.prompt.is_some()
    }
}
