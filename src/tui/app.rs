use ratatui::widgets::ListState;

use crate::app::Result;
use crate::config::HomePage;
use crate::domain::{Feed, Feeds, Post, PostRef};
use crate::fetcher::{FeedAggregator, LoadEvent};
use crate::store::Store;
use crate::tui::event::Action;
use crate::tui::page::{Navigator, Page, Transition};

pub const JUMP_SIZE: usize = 10;

/// Work the run loop performs outside the synchronous state update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    None,
    RefreshFeed(usize),
    RefreshAll,
    OpenLink(String),
}

struct Loading {
    aggregator: FeedAggregator,
    /// Show feeds as they arrive; off when refreshing over existing feeds.
    show_partial: bool,
}

pub struct TuiApp {
    pub feeds: Feeds,
    nav: Navigator,
    pub home_state: ListState,
    pub list_state: ListState,
    /// Posts shown on the current list page.
    list: Vec<PostRef>,
    current_feed: usize,
    query: String,
    reader: Option<PostRef>,
    pub reader_scroll: u16,
    /// (visible rows, wrapped content rows), measured at render.
    pub reader_viewport: (u16, u16),
    read_threshold: f64,
    loading: Option<Loading>,
    /// Read flags changed since the last tracking write.
    pub dirty: bool,
    pub show_help: bool,
    pub should_quit: bool,
    pub status_message: Option<String>,
}

impl TuiApp {
    pub fn new(home: HomePage, read_threshold: f64) -> Self {
        let start = match home {
            HomePage::Home => Page::Home,
            HomePage::Mixed => Page::Mixed,
        };

        Self {
            feeds: Feeds::new(),
            nav: Navigator::new(start),
            home_state: ListState::default(),
            list_state: ListState::default(),
            list: Vec::new(),
            current_feed: 0,
            query: String::new(),
            reader: None,
            reader_scroll: 0,
            reader_viewport: (0, 0),
            read_threshold: read_threshold.clamp(0.0, 1.0),
            loading: None,
            dirty: false,
            show_help: false,
            should_quit: false,
            status_message: None,
        }
    }

    pub fn page(&self) -> Page {
        self.nav.page()
    }

    pub fn prompt(&self) -> Option<&str> {
        self.nav.prompt()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn list(&self) -> &[PostRef] {
        &self.list
    }

    pub fn current_feed(&self) -> Option<&Feed> {
        self.feeds.get(self.current_feed)
    }

    pub fn selected_feed_index(&self) -> Option<usize> {
        self.home_state.selected().filter(|&i| i < self.feeds.len())
    }

    pub fn selected_post_ref(&self) -> Option<PostRef> {
        match self.page() {
            Page::Reader => self.reader,
            p if p.is_post_list() => self.list_state.selected().and_then(|i| self.list.get(i).copied()),
            _ => None,
        }
    }

    pub fn reader_post(&self) -> Option<&Post> {
        self.reader.and_then(|at| self.feeds.post(at))
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    pub fn load_progress(&self) -> Option<(usize, usize)> {
        self.loading.as_ref().map(|l| l.aggregator.progress())
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    /// Begin tracking a background load of `urls`.
    pub fn start_loading(&mut self, urls: Vec<String>) {
        let show_partial = self.feeds.is_empty();
        self.loading = Some(Loading {
            aggregator: FeedAggregator::new(urls),
            show_partial,
        });
    }

    pub fn on_load_event(&mut self, event: LoadEvent, store: &dyn Store) {
        let Some(loading) = self.loading.as_mut() else {
            return;
        };

        let Some(feeds) = loading.aggregator.apply(event, store) else {
            // Partial feeds are shown unsorted until the load completes
            if loading.show_partial && loading.aggregator.partial().len() > self.feeds.len() {
                self.feeds = loading.aggregator.partial().iter().cloned().collect();
                if self.home_state.selected().is_none() {
                    self.home_state.select(Some(0));
                }
                self.rebuild_list();
            }
            return;
        };

        self.loading = None;
        let errors = feeds.iter().filter(|f| f.is_error()).count();
        let mut message = format!("Loaded {} feeds, {} unread", feeds.len(), feeds.total_unread());
        if errors > 0 {
            message.push_str(&format!(", {} failed", errors));
        }
        self.set_status(message);
        self.set_feeds(feeds);
    }

    /// Swap in a new collection, keeping the selection and open post where
    /// they still exist.
    pub fn set_feeds(&mut self, feeds: Feeds) {
        let selected_url = self.selected_feed_index().map(|i| self.feeds[i].url.clone());
        let current_url = self.current_feed().map(|f| f.url.clone());
        let open_post = self.reader.and_then(|at| self.post_key(at));

        self.feeds = feeds;

        let find = |url: &Option<String>, feeds: &Feeds| {
            url.as_ref().and_then(|u| feeds.iter().position(|f| &f.url == u))
        };
        let selected = find(&selected_url, &self.feeds).unwrap_or(0);
        self.home_state
            .select((!self.feeds.is_empty()).then(|| selected.min(self.feeds.len() - 1)));
        self.current_feed = find(&current_url, &self.feeds).unwrap_or(0);

        self.reader = open_post.and_then(|(url, id)| self.find_post(&url, &id));
        if self.page() == Page::Reader && self.reader.is_none() {
            self.nav.apply(Transition::Back);
        }
        self.rebuild_list();
    }

    fn post_key(&self, at: PostRef) -> Option<(String, String)> {
        let feed = self.feeds.get(at.feed)?;
        let post = feed.posts.get(at.post)?;
        Some((feed.url.clone(), post.id.clone()))
    }

    fn find_post(&self, url: &str, id: &str) -> Option<PostRef> {
        let feed = self.feeds.iter().position(|f| f.url == url)?;
        let post = self.feeds[feed].posts.iter().position(|p| p.id == id)?;
        Some(PostRef { feed, post })
    }

    /// Recompute the post list for the current page, keeping the cursor in
    /// range.
    pub fn rebuild_list(&mut self) {
        let list_page = self.nav.list_page();
        self.list = match list_page {
            Page::Content => self.feeds.feed_posts(self.current_feed),
            Page::Mixed => self.feeds.mixed(),
            Page::Search => self.feeds.search(&self.query),
            Page::Home | Page::Reader => Vec::new(),
        };

        let selected = self.list_state.selected().unwrap_or(0);
        self.list_state.select(if self.list.is_empty() {
            None
        } else {
            Some(selected.min(self.list.len() - 1))
        });
    }

    pub fn handle_action(&mut self, action: Action) -> Result<Command> {
        match action {
            Action::Quit => self.should_quit = true,
            Action::MoveUp => self.move_by(-1),
            Action::MoveDown => self.move_by(1),
            Action::JumpUp => self.move_by(-(JUMP_SIZE as isize)),
            Action::JumpDown => self.move_by(JUMP_SIZE as isize),
            Action::Open => self.open(),
            Action::Back => self.back(),
            Action::Mixed => {
                if self.nav.apply(Transition::ShowMixed) {
                    self.list_state.select(Some(0));
                    self.rebuild_list();
                }
            }
            Action::Search => {
                self.nav.apply(Transition::BeginSearch);
            }
            Action::ToggleRead => self.toggle_read()?,
            Action::ReadAll => self.read_all()?,
            Action::Help => self.show_help = !self.show_help,
            Action::Refresh => return Ok(self.refresh_target()),
            Action::RefreshAll => {
                if self.is_loading() {
                    self.set_status("Already loading");
                } else {
                    return Ok(Command::RefreshAll);
                }
            }
            Action::OpenInBrowser => return Ok(self.open_link()),
            Action::None => {}
        }
        Ok(Command::None)
    }

    fn move_by(&mut self, delta: isize) {
        if self.page() == Page::Reader {
            self.reader_scroll = if delta < 0 {
                self.reader_scroll.saturating_sub(delta.unsigned_abs() as u16)
            } else {
                let max = self.reader_viewport.1.saturating_sub(self.reader_viewport.0);
                self.reader_scroll.saturating_add(delta as u16).min(max)
            };
            return;
        }

        let (state, len) = if self.page() == Page::Home {
            (&mut self.home_state, self.feeds.len())
        } else {
            (&mut self.list_state, self.list.len())
        };
        if len == 0 {
            return;
        }
        let current = state.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, len as isize - 1) as usize;
        state.select(Some(next));
    }

    fn open(&mut self) {
        match self.page() {
            Page::Home => {
                let Some(index) = self.selected_feed_index() else {
                    return;
                };
                if self.is_loading() && self.loading.as_ref().is_some_and(|l| l.show_partial) {
                    self.set_status("Still loading feeds...");
                    return;
                }
                self.current_feed = index;
                self.nav.apply(Transition::Open);
                self.list_state.select(Some(0));
                self.rebuild_list();
            }
            p if p.is_post_list() => {
                let Some(at) = self.selected_post_ref() else {
                    return;
                };
                self.reader = Some(at);
                self.reader_scroll = 0;
                self.reader_viewport = (0, 0);
                self.nav.apply(Transition::Open);
            }
            _ => {}
        }
    }

    fn back(&mut self) {
        let leaving_reader = self.page() == Page::Reader;
        if self.nav.apply(Transition::Back) {
            if leaving_reader {
                self.reader = None;
            } else {
                self.list_state.select(Some(0));
            }
            self.rebuild_list();
        }
    }

    pub fn push_prompt(&mut self, c: char) {
        if let Some(prompt) = self.nav.prompt_mut() {
            prompt.push(c);
        }
    }

    pub fn pop_prompt(&mut self) {
        if let Some(prompt) = self.nav.prompt_mut() {
            prompt.pop();
        }
    }

    pub fn submit_search(&mut self) {
        let query = self.nav.prompt().unwrap_or_default().trim().to_string();
        if query.is_empty() {
            self.cancel_search();
            return;
        }
        if self.nav.apply(Transition::SubmitSearch) {
            self.query = query;
            self.list_state.select(Some(0));
            self.rebuild_list();
            self.set_status(format!("{} results for \"{}\"", self.list.len(), self.query));
        }
    }

    pub fn cancel_search(&mut self) {
        self.nav.apply(Transition::CancelSearch);
    }

    fn toggle_read(&mut self) -> Result<()> {
        let Some(at) = self.selected_post_ref() else {
            return Ok(());
        };
        self.feeds.toggle_read(at.feed, at.post)?;
        self.dirty = true;
        Ok(())
    }

    fn read_all(&mut self) -> Result<()> {
        let changed = match self.page() {
            Page::Home => match self.selected_feed_index() {
                Some(feed) => self.feeds.mark_all_read(feed)?,
                None => 0,
            },
            Page::Content => self.feeds.mark_all_read(self.current_feed)?,
            Page::Mixed | Page::Search => {
                let mut changed = 0;
                for at in self.list.clone() {
                    if self.feeds.mark_read(at.feed, at.post)? {
                        changed += 1;
                    }
                }
                changed
            }
            Page::Reader => match self.reader {
                Some(at) => usize::from(self.feeds.mark_read(at.feed, at.post)?),
                None => 0,
            },
        };
        if changed > 0 {
            self.dirty = true;
            self.set_status(format!("Marked {} posts read", changed));
        }
        Ok(())
    }

    /// Mark the open post read once the reader has scrolled past the
    /// configured fraction. Returns whether the flag changed.
    pub fn check_read_threshold(&mut self) -> Result<bool> {
        let Some(at) = self.reader else {
            return Ok(false);
        };
        let (visible, total) = self.reader_viewport;
        if visible == 0 {
            return Ok(false);
        }

        let seen = f64::from(self.reader_scroll.saturating_add(visible));
        let fraction = if total == 0 { 1.0 } else { seen / f64::from(total) };
        if fraction < self.read_threshold {
            return Ok(false);
        }

        let changed = self.feeds.mark_read(at.feed, at.post)?;
        self.dirty |= changed;
        Ok(changed)
    }

    fn refresh_target(&mut self) -> Command {
        if self.is_loading() {
            self.set_status("Already loading");
            return Command::None;
        }
        let index = match self.page() {
            Page::Home => self.selected_feed_index(),
            Page::Content => Some(self.current_feed),
            _ => self.selected_post_ref().map(|at| at.feed),
        };
        match index {
            Some(i) if i < self.feeds.len() => Command::RefreshFeed(i),
            _ => Command::None,
        }
    }

    fn open_link(&mut self) -> Command {
        let target = match self.page() {
            Page::Home => None,
            _ => self.selected_post_ref(),
        };
        let Some(at) = target else {
            return Command::None;
        };
        match self.feeds.post(at).and_then(|p| p.link.clone()) {
            Some(link) => {
                if let Ok(true) = self.feeds.mark_read(at.feed, at.post) {
                    self.dirty = true;
                }
                Command::OpenLink(link)
            }
            None => {
                self.set_status("Post has no link");
                Command::None
            }
        }
    }
}
