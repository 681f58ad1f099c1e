/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Display-cycle coordination.
//!
//! A display holds two slots so the next poster can be loaded behind the
//! current one and cross-faded in without a blank frame:
//!
//! ```text
//!   stage next ─► render ─► wait display interval ─► flip ─► render ─► wait transition ─┐
//!        ▲                                                                              │
//!        └──────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! * Both slots start with the same first selection, and that first frame is
//!   rendered without animation.
//! * The next selection always goes into the *inactive* slot.
//! * With a single poster the cycle stops advancing and keeps showing the
//!   active slot.
//!
//! [`DisplaySession`] drives a [`DisplayCycle`] from a [`SyncStateReader`];
//! the two never share anything except that reader.

mod log_renderer;

pub use log_renderer::LogRenderer;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::catalog::{CatalogItem, Transition};
use crate::error::SelectorError;
use crate::selector::{PosterSelector, RandomSource, StdRandom};
use crate::sync::SyncStateReader;

/// Default duration of the slot-swap animation.
pub const DEFAULT_TRANSITION_DURATION: Duration = Duration::from_secs(1);

// ── Frame ─────────────────────────────────────────────────────────────────────

/// One of the two display slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    A,
    B,
}

impl Slot {
    pub fn other(self) -> Self {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }
}

/// Everything a renderer needs to draw one moment of the display.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub slot_a: Arc<CatalogItem>,
    pub slot_b: Arc<CatalogItem>,
    pub active: Slot,
    pub transition: Transition,
}

impl Frame {
    pub fn active_item(&self) -> &Arc<CatalogItem> {
        match self.active {
            Slot::A => &self.slot_a,
            Slot::B => &self.slot_b,
        }
    }

    pub fn inactive_item(&self) -> &Arc<CatalogItem> {
        match self.active {
            Slot::A => &self.slot_b,
            Slot::B => &self.slot_a,
        }
    }
}

/// Draws frames.  Drawing and animating are entirely the renderer's concern.
pub trait Renderer: Send {
    /// Nothing to show yet.  `last_error` is the most recent sync failure.
    fn loading(&mut self, last_error: Option<&str>);

    fn show(&mut self, frame: &Frame);
}

// ── DisplayCycle ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Slots {
    a: Arc<CatalogItem>,
    b: Arc<CatalogItem>,
    active: Slot,
}

/// The A/B slot state machine around a [`PosterSelector`].
#[derive(Debug)]
pub struct DisplayCycle<R = StdRandom> {
    selector: PosterSelector<R>,
    slots: Option<Slots>,
}

impl<R: RandomSource> DisplayCycle<R> {
    pub fn new(selector: PosterSelector<R>) -> Self {
        Self {
            selector,
            slots: None,
        }
    }

    pub fn is_started(&self) -> bool {
        self.slots.is_some()
    }

    /// Put the first selection into both slots, slot A active.
    ///
    /// # Errors
    /// [`SelectorError::EmptyCatalog`] if `posters` is empty.
    pub fn start(&mut self, posters: &[Arc<CatalogItem>]) -> Result<(), SelectorError> {
        let first = self.selector.next(posters)?;
        self.slots = Some(Slots {
            a: Arc::clone(&first),
            b: first,
            active: Slot::A,
        });
        Ok(())
    }

    /// Select the next poster into the inactive slot (starting the cycle if
    /// needed) and return it.
    ///
    /// # Errors
    /// [`SelectorError::EmptyCatalog`] if `posters` is empty.
    pub fn stage_next(
        &mut self,
        posters: &[Arc<CatalogItem>],
    ) -> Result<Arc<CatalogItem>, SelectorError> {
        let next = self.selector.next(posters)?;
        match &mut self.slots {
            Some(slots) => match slots.active {
                Slot::A => slots.b = Arc::clone(&next),
                Slot::B => slots.a = Arc::clone(&next),
            },
            None => {
                self.slots = Some(Slots {
                    a: Arc::clone(&next),
                    b: Arc::clone(&next),
                    active: Slot::A,
                })
            }
        }
        Ok(next)
    }

    /// Make the inactive slot active.  No-op before [`start`](Self::start).
    pub fn flip(&mut self) {
        if let Some(slots) = &mut self.slots {
            slots.active = slots.active.other();
        }
    }

    /// Current frame, or `None` before the cycle has started.
    pub fn frame(&self, transition: Transition) -> Option<Frame> {
        self.slots.as_ref().map(|slots| Frame {
            slot_a: Arc::clone(&slots.a),
            slot_b: Arc::clone(&slots.b),
            active: slots.active,
            transition,
        })
    }
}

// ── DisplaySession ────────────────────────────────────────────────────────────

/// Runs one display: reads the synced catalog on every tick, advances the
/// [`DisplayCycle`] and hands frames to a [`Renderer`].
pub struct DisplaySession<R, Rd> {
    reader: SyncStateReader,
    cycle: DisplayCycle<R>,
    renderer: Rd,
    transition_duration: Duration,
}

impl<R, Rd> DisplaySession<R, Rd>
where
    R: RandomSource + Send,
    Rd: Renderer,
{
    pub fn new(
        reader: SyncStateReader,
        selector: PosterSelector<R>,
        renderer: Rd,
        transition_duration: Duration,
    ) -> Self {
        Self {
            reader,
            cycle: DisplayCycle::new(selector),
            renderer,
            transition_duration,
        }
    }

    /// Run until the sync engine goes away.
    ///
    /// # Errors
    /// Only selector contract violations, which cannot happen for the
    /// non-empty catalogs this loop passes.
    pub async fn run(mut self) -> Result<(), SelectorError> {
        info!(
            transition_ms = self.transition_duration.as_millis() as u64,
            "Starting display cycle"
        );

        loop {
            let state = self.reader.snapshot_and_mark_seen();

            let catalog = match state.catalog() {
                Some(catalog) if !catalog.posters.is_empty() => Arc::clone(catalog),
                _ => {
                    if !self.cycle.is_started() {
                        self.renderer.loading(state.last_error());
                    }
                    if !self.reader.changed().await {
                        return Ok(());
                    }
                    continue;
                }
            };
            let settings = catalog.render_settings;

            if !self.cycle.is_started() {
                self.cycle.start(&catalog.posters)?;
                // Initial content appears without animation.
                self.render(Transition::None);
            }

            if catalog.posters.len() < 2 {
                debug!("Single poster in catalog; holding the active slot");
                if !self.reader.changed().await {
                    return Ok(());
                }
                continue;
            }

            self.cycle.stage_next(&catalog.posters)?;
            self.render(settings.item_transition());
            tokio::time::sleep(settings.item_display_duration()).await;

            self.cycle.flip();
            self.render(settings.item_transition());
            tokio::time::sleep(self.transition_duration).await;
        }
    }

    fn render(&mut self, transition: Transition) {
        if let Some(frame) = self.cycle.frame(transition) {
            self.renderer.show(&frame);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
