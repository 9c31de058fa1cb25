use serde::Serialize;

use crate::domain::{GalleryMode, Threshold};
use crate::error::GalleryError;
use crate::manifest::{LookupTable, ManifestEntry};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub var1: String,
    pub var2: String,
    pub filter: String,
    pub threshold: Threshold,
}

impl Selection {
    pub fn new(
        var1: impl Into<String>,
        var2: impl Into<String>,
        filter: impl Into<String>,
        threshold: Threshold,
    ) -> Self {
        Self {
            var1: var1.into(),
            var2: var2.into(),
            filter: filter.into(),
            threshold,
        }
    }

    pub fn filename(&self, mode: GalleryMode) -> String {
        format!(
            "{}_vs{}_filter_{}_bin_ge_{}{}",
            self.var1,
            self.var2,
            self.filter,
            self.threshold,
            mode.suffix()
        )
    }
}

impl ManifestEntry {
    pub fn selection(&self) -> Option<Selection> {
        self.threshold
            .map(|threshold| Selection::new(&self.var1, &self.var2, &self.filter, threshold))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Var1,
    Var2,
    Filter,
    Threshold,
}

impl Control {
    pub const ORDER: [Control; 4] = [
        Control::Var1,
        Control::Var2,
        Control::Filter,
        Control::Threshold,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Control::Var1 => "X-Axis Variable",
            Control::Var2 => "Y-Axis Variable",
            Control::Filter => "Filter Variable",
            Control::Threshold => "Bin Threshold",
        }
    }

    pub fn next(self) -> Self {
        let index = Self::ORDER.iter().position(|c| *c == self).unwrap_or(0);
        Self::ORDER[(index + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        let index = Self::ORDER.iter().position(|c| *c == self).unwrap_or(0);
        Self::ORDER[(index + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

#[derive(Debug, Clone)]
pub struct Controls {
    selection: Selection,
}

impl Controls {
    pub fn new(table: &LookupTable) -> Option<Self> {
        let var1 = table.var1_options().first()?.to_string();
        let mut controls = Self {
            selection: Selection::new(var1, "", "", Threshold::MIN),
        };
        controls.rescope(table);
        Some(controls)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn options<'a>(&self, table: &'a LookupTable, control: Control) -> Vec<&'a str> {
        match control {
            Control::Var1 => table.var1_options(),
            Control::Var2 => table.var2_options(&self.selection.var1),
            Control::Filter => table.filter_options(&self.selection.var1, &self.selection.var2),
            Control::Threshold => Vec::new(),
        }
    }

    pub fn select_var1(&mut self, table: &LookupTable, var1: &str) -> Result<(), GalleryError> {
        if !table.var1_options().contains(&var1) {
            return Err(GalleryError::UnknownSelection(var1.to_string()));
        }
        self.selection.var1 = var1.to_string();
        self.rescope(table);
        Ok(())
    }

    pub fn select_var2(&mut self, table: &LookupTable, var2: &str) -> Result<(), GalleryError> {
        if !table.var2_options(&self.selection.var1).contains(&var2) {
            return Err(GalleryError::UnknownSelection(format!(
                "{} vs {var2}",
                self.selection.var1
            )));
        }
        self.selection.var2 = var2.to_string();
        self.rescope(table);
        Ok(())
    }

    pub fn select_filter(&mut self, table: &LookupTable, filter: &str) -> Result<(), GalleryError> {
        if !table.contains(&self.selection.var1, &self.selection.var2, filter) {
            return Err(GalleryError::UnknownSelection(format!("filter {filter}")));
        }
        self.selection.filter = filter.to_string();
        Ok(())
    }

    pub fn set_threshold(&mut self, threshold: Threshold) {
        self.selection.threshold = threshold;
    }

    pub fn step(&mut self, table: &LookupTable, control: Control, delta: i32) {
        if control == Control::Threshold {
            let mut threshold = self.selection.threshold;
            for _ in 0..delta.unsigned_abs() {
                threshold = if delta > 0 {
                    threshold.saturating_inc()
                } else {
                    threshold.saturating_dec()
                };
            }
            self.selection.threshold = threshold;
            return;
        }

        let options = self.options(table, control);
        let slot = match control {
            Control::Var1 => &mut self.selection.var1,
            Control::Var2 => &mut self.selection.var2,
            Control::Filter => &mut self.selection.filter,
            Control::Threshold => return,
        };
        if options.is_empty() {
            return;
        }
        let index = options
            .iter()
            .position(|option| *option == slot.as_str())
            .unwrap_or(0) as i64;
        let len = options.len() as i64;
        *slot = options[(index + delta as i64).rem_euclid(len) as usize].to_string();
        self.rescope(table);
    }

    fn rescope(&mut self, table: &LookupTable) {
        let var2_options = table.var2_options(&self.selection.var1);
        if !var2_options.contains(&self.selection.var2.as_str()) {
            self.selection.var2 = var2_options.first().copied().unwrap_or_default().to_string();
        }
        let filter_options = table.filter_options(&self.selection.var1, &self.selection.var2);
        if !filter_options.contains(&self.selection.filter.as_str()) {
            self.selection.filter = filter_options
                .first()
                .copied()
                .unwrap_or_default()
                .to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::parse_manifest;

    fn table() -> LookupTable {
        parse_manifest([
            "a_vsb_filter_f1_bin_ge_0.png",
            "a_vsb_filter_f2_bin_ge_0.png",
            "a_vsc_filter_f2_bin_ge_0.png",
            "d_vse_filter_f3_bin_ge_0.png",
        ])
    }

    #[test]
    fn filename_templates() {
        let selection = Selection::new("x", "y", "z", Threshold::new(4).unwrap());
        assert_eq!(
            selection.filename(GalleryMode::Hexbin),
            "x_vsy_filter_z_bin_ge_4.png"
        );
        assert_eq!(
            selection.filename(GalleryMode::Ratio),
            "x_vsy_filter_z_bin_ge_4_ratio.png"
        );
    }

    #[test]
    fn initial_controls_take_first_options() {
        let table = table();
        let controls = Controls::new(&table).unwrap();
        assert_eq!(
            controls.selection(),
            &Selection::new("a", "b", "f1", Threshold::MIN)
        );
        assert!(Controls::new(&LookupTable::new()).is_none());
    }

    #[test]
    fn changing_var1_rescopes_downstream() {
        let table = table();
        let mut controls = Controls::new(&table).unwrap();
        controls.select_var1(&table, "d").unwrap();
        assert_eq!(controls.selection().var2, "e");
        assert_eq!(controls.selection().filter, "f3");
    }

    #[test]
    fn downstream_value_kept_when_still_valid() {
        let table = table();
        let mut controls = Controls::new(&table).unwrap();
        controls.select_filter(&table, "f2").unwrap();
        controls.select_var2(&table, "c").unwrap();
        assert_eq!(controls.selection().filter, "f2");
    }

    #[test]
    fn rejects_unknown_choices() {
        let table = table();
        let mut controls = Controls::new(&table).unwrap();
        assert!(controls.select_var1(&table, "zzz").is_err());
        assert!(controls.select_var2(&table, "e").is_err());
        assert!(controls.select_filter(&table, "f3").is_err());
        assert_eq!(controls.selection().var1, "a");
    }

    #[test]
    fn stepping_wraps_pickers_and_clamps_slider() {
        let table = table();
        let mut controls = Controls::new(&table).unwrap();
        controls.step(&table, Control::Var1, -1);
        assert_eq!(controls.selection().var1, "d");
        assert_eq!(controls.selection().var2, "e");

        controls.step(&table, Control::Threshold, 20);
        assert_eq!(controls.selection().threshold, Threshold::MAX);
        controls.step(&table, Control::Threshold, -3);
        assert_eq!(controls.selection().threshold.value(), 6);
    }

    #[test]
    fn focus_cycles() {
        assert_eq!(Control::Threshold.next(), Control::Var1);
        assert_eq!(Control::Var1.prev(), Control::Threshold);
    }
}
