/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Headless [`Renderer`] that reports what a screen would show through
//! `tracing`.

use tracing::{debug, info, warn};

use super::{Frame, Renderer, Slot};

/// Logs the active poster whenever it changes, and the preloaded one at debug.
#[derive(Debug)]
pub struct LogRenderer {
    base_url: String,
    on_screen: Option<(Slot, String)>,
}

impl LogRenderer {
    /// `base_url` is prefixed to artwork URLs in log output.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            on_screen: None,
        }
    }

    /// Title currently on screen, if any.
    pub fn on_screen(&self) -> Option<&str> {
        self.on_screen.as_ref().map(|(_, title)| title.as_str())
    }
}

impl Renderer for LogRenderer {
    fn loading(&mut self, last_error: Option<&str>) {
        match last_error {
            Some(error) => warn!(error, "Waiting for first catalog"),
            None => info!("Waiting for first catalog"),
        }
    }

    fn show(&mut self, frame: &Frame) {
        let active = frame.active_item();
        let key = (frame.active, active.title.clone());

        if self.on_screen.as_ref() == Some(&key) {
            let next = frame.inactive_item();
            debug!(title = %next.title, "Preloaded next poster");
            return;
        }

        info!(
            title = %active.title,
            caption = %active.caption(),
            tone = active.content_rating_tone().map(|t| t.as_str()).unwrap_or("none"),
            artwork = %format!("{}{}", self.base_url, active.artwork_url()),
            transition = %frame.transition,
            "Now showing"
        );
        self.on_screen = Some(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogItem, Transition};
    use std::sync::Arc;

    fn item(title: &str) -> Arc<CatalogItem> {
        Arc::new(CatalogItem {
            title: title.into(),
            studio: None,
            runtime: 100,
            year: 1999,
            content_rating: Some("R".into()),
            rating: None,
            artwork: "/library/metadata/1/thumb/2".into(),
        })
    }

    #[test]
    fn tracks_active_slot() {
        let mut renderer = LogRenderer::new("http://localhost:9931/");
        assert_eq!(renderer.on_screen(), None);

        let a = item("Alien");
        let b = item("Heat");
        let mut frame = Frame {
            slot_a: Arc::clone(&a),
            slot_b: Arc::clone(&b),
            active: Slot::A,
            transition: Transition::Fade,
        };
        renderer.show(&frame);
        assert_eq!(renderer.on_screen(), Some("Alien"));

        frame.active = Slot::B;
        renderer.show(&frame);
        assert_eq!(renderer.on_screen(), Some("Heat"));
    }
}
