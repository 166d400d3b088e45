#![forbid(unsafe_code)]

//! Deferred image loading.
//!
//! Images carry their real source in `data-src`. Each one is fetched once,
//! when it comes within the observer's margin of the viewport (or at once
//! when the host cannot observe visibility). The fetch happens out of band;
//! the host reports the result as [`PageEvent::ImageSettled`].
//!
//! ```text
//! Pending --visible--> Loading --ok--> Loaded
//!                         \----err--> Failed
//! ```

use serde::Deserialize;
use sitekit_core::dom::Dom;
use sitekit_core::event::{Handled, ImageLoadError, ObserverKind, PageEvent};

use crate::context::Context;
use crate::{Controller, ControllerKey};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LazyImagesConfig {
    pub selector: String,
    pub loaded_class: String,
}

impl Default for LazyImagesConfig {
    fn default() -> Self {
        Self {
            selector: "img[data-src]".into(),
            loaded_class: "loaded".into(),
        }
    }
}

/// Load state of one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageState {
    Pending,
    Loading,
    Loaded,
    Failed,
}

#[derive(Debug)]
pub struct LazyImages<N> {
    config: LazyImagesConfig,
    images: Vec<(N, ImageState)>,
}

impl<N: Clone + PartialEq> LazyImages<N> {
    /// Take over every deferred image, or `None` if there are none.
    pub fn new<D: Dom<Node = N>>(
        dom: &mut D,
        config: LazyImagesConfig,
        cx: &Context<'_, N>,
    ) -> Option<Self> {
        let images: Vec<_> = dom
            .query_all(&config.selector)
            .into_iter()
            .map(|node| (node, ImageState::Pending))
            .collect();
        if images.is_empty() {
            return None;
        }
        let mut lazy = Self { config, images };
        if cx.caps().intersection_observer {
            for (node, _) in &lazy.images {
                dom.observe(node, ObserverKind::LazyImage);
            }
        } else {
            tracing::debug!(
                images = lazy.images.len(),
                "no visibility observer, loading all images"
            );
            for idx in 0..lazy.images.len() {
                lazy.begin(dom, idx, false);
            }
        }
        Some(lazy)
    }

    #[must_use]
    pub fn state(&self, image: &N) -> Option<ImageState> {
        self.position(image).map(|idx| self.images[idx].1)
    }

    fn position(&self, image: &N) -> Option<usize> {
        self.images.iter().position(|(node, _)| node == image)
    }

    fn begin<D: Dom<Node = N>>(&mut self, dom: &mut D, idx: usize, observed: bool) {
        let (node, state) = &mut self.images[idx];
        if *state != ImageState::Pending {
            return;
        }
        if observed {
            dom.unobserve(node, ObserverKind::LazyImage);
        }
        match dom.attr(node, "data-src") {
            Some(src) if !src.is_empty() => {
                *state = ImageState::Loading;
                dom.load_image(node, &src);
            }
            _ => *state = ImageState::Failed,
        }
    }

    fn settle<D: Dom<Node = N>>(
        &mut self,
        dom: &mut D,
        idx: usize,
        result: &Result<String, ImageLoadError>,
    ) {
        let loaded_class = &self.config.loaded_class;
        let (node, state) = &mut self.images[idx];
        if *state != ImageState::Loading {
            return;
        }
        match result {
            Ok(src) => {
                dom.set_attr(node, "src", src);
                dom.remove_attr(node, "data-src");
                dom.add_class(node, loaded_class);
                *state = ImageState::Loaded;
            }
            Err(error) => {
                tracing::debug!(error = %error, "lazy image failed");
                *state = ImageState::Failed;
            }
        }
    }
}

impl<D: Dom> Controller<D> for LazyImages<D::Node> {
    fn key(&self) -> ControllerKey {
        ControllerKey::LazyImages
    }

    fn handle(
        &mut self,
        dom: &mut D,
        event: &PageEvent<D::Node>,
        _cx: &mut Context<'_, D::Node>,
    ) -> Handled {
        match event {
            PageEvent::Intersection {
                target,
                observer: ObserverKind::LazyImage,
                intersecting: true,
            } => match self.position(target) {
                Some(idx) => {
                    self.begin(dom, idx, true);
                    Handled::Yes
                }
                None => Handled::No,
            },
            PageEvent::ImageSettled { target, result } => match self.position(target) {
                Some(idx) => {
                    self.settle(dom, idx, result);
                    Handled::Yes
                }
                None => Handled::No,
            },
            _ => Handled::No,
        }
    }
}
