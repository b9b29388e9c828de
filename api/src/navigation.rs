/// Client-side route table
///
/// The storefront pages live in the browser; the service only decides which
/// page a path maps to and whether the caller has to log in first.
use serde::Serialize;

use crate::catalog::Catalog;
use crate::session::SessionContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    Login,
    Register,
    VerifyEmail,
    About,
    BrowseData,
    DataDetail(i64),
    Dashboard,
    Transactions,
    SellData,
    NotFound,
}

impl Page {
    pub fn resolve(path: &str) -> Page {
        let path = path.split(|c: char| c == '?' || c == '#').next().unwrap_or("");
        let trimmed = path.trim_end_matches('/');

        match trimmed {
            "" => Page::Home,
            "/login" => Page::Login,
            "/register" => Page::Register,
            "/verify-email" => Page::VerifyEmail,
            "/about" => Page::About,
            "/browse-data" => Page::BrowseData,
            "/dashboard" => Page::Dashboard,
            "/transactions" => Page::Transactions,
            "/sell-data" => Page::SellData,
            other => other
                .strip_prefix("/data/")
                .and_then(|id| id.parse::<i64>().ok())
                .map(Page::DataDetail)
                .unwrap_or(Page::NotFound),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Page::Home => "/".to_string(),
            Page::Login => "/login".to_string(),
            Page::Register => "/register".to_string(),
            Page::VerifyEmail => "/verify-email".to_string(),
            Page::About => "/about".to_string(),
            Page::BrowseData => "/browse-data".to_string(),
            Page::DataDetail(id) => format!("/data/{}", id),
            Page::Dashboard => "/dashboard".to_string(),
            Page::Transactions => "/transactions".to_string(),
            Page::SellData => "/sell-data".to_string(),
            Page::NotFound => "/404".to_string(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Page::Home => "home",
            Page::Login => "login",
            Page::Register => "register",
            Page::VerifyEmail => "verify_email",
            Page::About => "about",
            Page::BrowseData => "browse_data",
            Page::DataDetail(_) => "data_detail",
            Page::Dashboard => "dashboard",
            Page::Transactions => "transactions",
            Page::SellData => "sell_data",
            Page::NotFound => "not_found",
        }
    }

    pub fn requires_session(&self) -> bool {
        matches!(self, Page::Dashboard | Page::Transactions | Page::SellData)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Render(Page),
    Redirect(Page),
}

#[derive(Debug, Serialize)]
pub struct NavigationView {
    pub page: &'static str,
    pub path: String,
    pub gated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

/// Decide what to show for `path`. Gated pages send anonymous visitors to the
/// login page; detail pages for listings that do not exist render not-found.
pub fn navigate(path: &str, session: &SessionContext, catalog: &Catalog) -> Navigation {
    let page = Page::resolve(path);

    if page.requires_session() && !session.authenticated {
        return Navigation::Redirect(Page::Login);
    }

    match page {
        Page::DataDetail(id) if catalog.get(id).is_none() => Navigation::Render(Page::NotFound),
        page => Navigation::Render(page),
    }
}

impl From<Navigation> for NavigationView {
    fn from(nav: Navigation) -> Self {
        match nav {
            Navigation::Render(page) => NavigationView {
                page: page.name(),
                path: page.path(),
                gated: page.requires_session(),
                redirect: None,
            },
            Navigation::Redirect(target) => NavigationView {
                page: target.name(),
                path: target.path(),
                gated: false,
                redirect: Some(target.path()),
            },
        }
    }
}
