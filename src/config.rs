use std::str::FromStr;

/// Ordering used by the focus ring for elements without an explicit tab index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TabOrder {
    /// Depth-first tree order.
    #[default]
    ChildOrder,
    /// Left to right, then top to bottom.
    PositionXY,
    /// Top to bottom, then left to right.
    PositionYX,
}

impl FromStr for TabOrder {
    type Err = ();

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "child" | "tree" => Ok(Self::ChildOrder),
            "xy" => Ok(Self::PositionXY),
            "yx" => Ok(Self::PositionYX),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PanelSettings {
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub scheduler_budget_ms: u64,
    pub tab_order: TabOrder,
    pub event_pool_capacity: usize,
    pub trace_dispatch: bool,
    pub trace_layout: bool,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            viewport_width: 800.0,
            viewport_height: 600.0,
            scheduler_budget_ms: 8,
            tab_order: TabOrder::ChildOrder,
            event_pool_capacity: 16,
            trace_dispatch: false,
            trace_layout: false,
        }
    }
}

impl PanelSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `RFGUI_*` variables and the `RUST_GUI_TRACE_*` toggles.
    pub fn new_from_env() -> Self {
        Self::default().apply_overrides(|key| std::env::var(key).ok())
    }

    pub fn with_viewport(mut self, width: f32, height: f32) -> Self {
        self.viewport_width = width.max(0.0);
        self.viewport_height = height.max(0.0);
        self
    }

    pub fn with_scheduler_budget_ms(mut self, budget_ms: u64) -> Self {
        self.scheduler_budget_ms = budget_ms;
        self
    }

    pub fn with_tab_order(mut self, tab_order: TabOrder) -> Self {
        self.tab_order = tab_order;
        self
    }

    pub fn with_event_pool_capacity(mut self, capacity: usize) -> Self {
        self.event_pool_capacity = capacity;
        self
    }

    pub fn with_trace_dispatch(mut self, enabled: bool) -> Self {
        self.trace_dispatch = enabled;
        self
    }

    pub fn with_trace_layout(mut self, enabled: bool) -> Self {
        self.trace_layout = enabled;
        self
    }

    fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = lookup("RFGUI_VIEWPORT") {
            match parse_viewport(&raw) {
                Some((width, height)) => {
                    self.viewport_width = width;
                    self.viewport_height = height;
                }
                None => tracing::warn!(value = %raw, "ignoring malformed RFGUI_VIEWPORT"),
            }
        }
        if let Some(raw) = lookup("RFGUI_SCHEDULER_BUDGET_MS") {
            match raw.trim().parse() {
                Ok(budget) => self.scheduler_budget_ms = budget,
                Err(_) => tracing::warn!(value = %raw, "ignoring malformed RFGUI_SCHEDULER_BUDGET_MS"),
            }
        }
        if let Some(raw) = lookup("RFGUI_TAB_ORDER") {
            match raw.parse() {
                Ok(order) => self.tab_order = order,
                Err(()) => tracing::warn!(value = %raw, "ignoring malformed RFGUI_TAB_ORDER"),
            }
        }
        if let Some(raw) = lookup("RFGUI_EVENT_POOL_CAPACITY") {
            match raw.trim().parse() {
                Ok(capacity) => self.event_pool_capacity = capacity,
                Err(_) => tracing::warn!(value = %raw, "ignoring malformed RFGUI_EVENT_POOL_CAPACITY"),
            }
        }
        if lookup("RUST_GUI_TRACE_DISPATCH").is_some() {
            self.trace_dispatch = true;
        }
        if lookup("RUST_GUI_TRACE_LAYOUT").is_some() {
            self.trace_layout = true;
        }
        self
    }
}

fn parse_viewport(raw: &str) -> Option<(f32, f32)> {
    let (width, height) = raw.trim().split_once(['x', 'X'])?;
    let width: f32 = width.trim().parse().ok()?;
    let height: f32 = height.trim().parse().ok()?;
    if width < 0.0 || height < 0.0 {
        return None;
    }
    Some((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap;

    fn from_map(pairs: &[(&str, &str)]) -> PanelSettings {
        let map: FxHashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PanelSettings::default().apply_overrides(|key| map.get(key).cloned())
    }

    #[test]
    fn env_overrides_apply() {
        let settings = from_map(&[
            ("RFGUI_VIEWPORT", "1024x768"),
            ("RFGUI_SCHEDULER_BUDGET_MS", "4"),
            ("RFGUI_TAB_ORDER", "yx"),
            ("RUST_GUI_TRACE_DISPATCH", "1"),
        ]);
        assert_eq!(settings.viewport_width, 1024.0);
        assert_eq!(settings.viewport_height, 768.0);
        assert_eq!(settings.scheduler_budget_ms, 4);
        assert_eq!(settings.tab_order, TabOrder::PositionYX);
        assert!(settings.trace_dispatch);
        assert!(!settings.trace_layout);
    }

    #[test]
    fn malformed_values_keep_defaults() {
        let settings = from_map(&[
            ("RFGUI_VIEWPORT", "wide"),
            ("RFGUI_SCHEDULER_BUDGET_MS", "-3"),
            ("RFGUI_TAB_ORDER", "spiral"),
        ]);
        assert_eq!(settings, PanelSettings::default());
    }
}
