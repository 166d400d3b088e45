#![forbid(unsafe_code)]

//! Development-time performance sampling.
//!
//! On local hosts the sampler logs Core Web Vitals as the host reports
//! timeline entries, and audits the resource timing buffer once the page
//! reports [`PageEvent::Loaded`]. Everything it learns goes to `tracing`;
//! nothing is shown on the page.
//!
//! | Metric | Source entry | Aggregation |
//! |--------|--------------|-------------|
//! | CLS | `layout-shift` | running sum, shifts after input ignored |
//! | FCP | `paint` named `first-contentful-paint` | last value |
//! | LCP | `largest-contentful-paint` | last value |

use serde::Deserialize;
use sitekit_core::capabilities::is_local_host;
use sitekit_core::dom::Dom;
use sitekit_core::event::{Handled, PageEvent, PerfEntry, ResourceEntry};

use crate::context::{Context, Timer};
use crate::{Controller, ControllerKey, millis};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Only sample on `localhost`-style hosts.
    pub local_only: bool,
    /// Resources transferring more than this many bytes are reported.
    pub resource_budget_bytes: u64,
    /// Delay between page load and the resource audit.
    pub audit_delay_ms: u64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            local_only: true,
            resource_budget_bytes: 100 * 1024,
            audit_delay_ms: 0,
        }
    }
}

#[derive(Debug, Default)]
pub struct PerformanceSampler {
    config: PerformanceConfig,
    cls: f64,
    fcp_ms: Option<f64>,
    lcp_ms: Option<f64>,
    resource_timing: bool,
    audited: bool,
    oversized: Vec<ResourceEntry>,
}

impl PerformanceSampler {
    /// Start sampling, or `None` when the host is not local or offers no
    /// performance APIs.
    pub fn new<D: Dom>(
        dom: &mut D,
        config: PerformanceConfig,
        cx: &mut Context<'_, D::Node>,
    ) -> Option<Self> {
        if config.local_only && !is_local_host(&dom.hostname()) {
            return None;
        }
        let caps = cx.caps();
        if !caps.performance_observer && !caps.resource_timing {
            return None;
        }
        if caps.performance_observer {
            dom.observe_performance();
        }
        tracing::debug!("performance sampling enabled");
        Some(Self {
            config,
            resource_timing: caps.resource_timing,
            ..Self::default()
        })
    }

    /// Cumulative layout shift so far.
    #[must_use]
    pub fn cls(&self) -> f64 {
        self.cls
    }

    #[must_use]
    pub fn fcp_ms(&self) -> Option<f64> {
        self.fcp_ms
    }

    #[must_use]
    pub fn lcp_ms(&self) -> Option<f64> {
        self.lcp_ms
    }

    /// Resources the audit found over budget.
    #[must_use]
    pub fn oversized(&self) -> &[ResourceEntry] {
        &self.oversized
    }

    fn record(&mut self, entry: &PerfEntry) -> Handled {
        match entry {
            PerfEntry::LayoutShift {
                value,
                had_recent_input,
            } => {
                if *had_recent_input {
                    return Handled::No;
                }
                self.cls += value;
                tracing::info!(cls = self.cls, "CLS");
            }
            PerfEntry::Paint {
                name,
                start_time_ms,
            } => {
                if name != "first-contentful-paint" {
                    return Handled::No;
                }
                self.fcp_ms = Some(*start_time_ms);
                tracing::info!(fcp_ms = start_time_ms, "FCP");
            }
            PerfEntry::LargestContentfulPaint { render_time_ms } => {
                self.lcp_ms = Some(*render_time_ms);
                tracing::info!(lcp_ms = render_time_ms, "LCP");
            }
        }
        Handled::Yes
    }

    fn on_loaded<N: Clone>(&mut self, cx: &mut Context<'_, N>) -> Handled {
        if !self.resource_timing || self.audited {
            return Handled::No;
        }
        self.audited = true;
        cx.schedule(millis(self.config.audit_delay_ms), Timer::ResourceAudit);
        Handled::Yes
    }

    fn audit<D: Dom>(&mut self, dom: &D) {
        let budget = self.config.resource_budget_bytes;
        for entry in dom.resource_entries() {
            if entry.transfer_size > budget {
                tracing::warn!(
                    resource = %entry.name,
                    bytes = entry.transfer_size,
                    budget,
                    "large resource"
                );
                self.oversized.push(entry);
            }
        }
    }
}

impl<D: Dom> Controller<D> for PerformanceSampler {
    fn key(&self) -> ControllerKey {
        ControllerKey::Performance
    }

    fn handle(
        &mut self,
        _dom: &mut D,
        event: &PageEvent<D::Node>,
        cx: &mut Context<'_, D::Node>,
    ) -> Handled {
        match event {
            PageEvent::Performance(entry) => self.record(entry),
            PageEvent::Loaded => self.on_loaded(cx),
            _ => Handled::No,
        }
    }

    fn on_timer(&mut self, dom: &mut D, timer: Timer<D::Node>, _cx: &mut Context<'_, D::Node>) {
        if matches!(timer, Timer::ResourceAudit) {
            self.audit(dom);
        }
    }
}
