use std::sync::Arc;

use crate::media::MediaHost;

#[derive(Clone)]
pub struct AppState {
    pub media: Arc<dyn MediaHost>,
}

impl AppState {
    pub fn new(media: Arc<dyn MediaHost>) -> Self {
        Self { media }
    }
}
