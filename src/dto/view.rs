use serde::Serialize;

use crate::middleware::auth::SessionUser;
use crate::middleware::flash::{Flash, Flashes};

/// What a page template would receive: chrome plus the page's own data.
#[derive(Debug, Clone, Serialize)]
pub struct PageView<T: Serialize> {
    pub title: String,
    pub user: Option<SessionUser>,
    pub flash: Vec<Flash>,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> PageView<T> {
    pub fn new(title: &str, user: Option<SessionUser>, flashes: Flashes, data: T) -> Self {
        Self {
            title: format!("{} | Lead CRM", title),
            user,
            flash: flashes.0,
            data,
        }
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.flash.push(Flash {
            kind: crate::middleware::flash::FlashKind::Error,
            message: message.into(),
        });
        self
    }
}

/// Page data for views that only need the chrome.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NoData {}
