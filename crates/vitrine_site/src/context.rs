//! Collaborators shared by the page features

use crate::config::SiteConfig;
use std::sync::Arc;
use vitrine_animation::{AnimationHandle, PropertyMap, TweenEngine, TweenVars};
use vitrine_core::{LayoutOracle, NodeId};
use vitrine_layout::Page;
use vitrine_scroll::ScrollTrigger;
use vitrine_text::TextSegmenter;

/// Everything a feature needs at init, passed explicitly
#[derive(Clone)]
pub struct SiteContext {
    pub config: Arc<SiteConfig>,
    pub page: Arc<dyn Page>,
    pub layout: Arc<dyn LayoutOracle>,
    pub tweens: Arc<dyn TweenEngine>,
    pub triggers: Arc<dyn ScrollTrigger>,
    pub segmenter: Arc<dyn TextSegmenter>,
}

impl SiteContext {
    /// First node matching `selector`
    pub fn find(&self, selector: &str) -> Option<NodeId> {
        self.page.query(selector)
    }

    /// True when the viewport is below the mobile breakpoint
    pub fn is_mobile(&self) -> bool {
        self.layout
            .viewport()
            .is_narrow(self.config.mobile_breakpoint)
    }

    /// Tween `targets` to `to`, logging instead of failing. Empty target
    /// lists are a no-op.
    pub fn tween_to(
        &self,
        targets: &[NodeId],
        to: &PropertyMap,
        vars: TweenVars,
    ) -> Option<AnimationHandle> {
        if targets.is_empty() {
            return None;
        }
        match self.tweens.to(targets, to, vars) {
            Ok(handle) => Some(handle),
            Err(err) => {
                tracing::debug!(%err, "tween skipped");
                None
            }
        }
    }
}

impl std::fmt::Debug for SiteContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
