//! Editor-side model of the on-screen markers. Painting is done elsewhere;
//! this keeps the marker list and the binding table in step and enforces
//! the duplicate-shortcut rule at edit time.

use crate::binding_table::BindingTable;
use crate::config::{self, PointerAction};
use crate::error::BindingConflict;
use crate::hotkey;

/// Spawn point used before any marker has been moved.
pub const DEFAULT_SPAWN: (i32, i32) = (100, 100);

/// Candidate shortcuts for new markers, in the order they are handed out.
const PRINTABLE: &str = "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

pub type MarkerId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub id: MarkerId,
    /// Empty until the marker has a shortcut.
    pub shortcut: String,
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Marker {
    pub fn label(&self) -> String {
        hotkey::display_label(&self.shortcut)
    }

    pub fn is_assigned(&self) -> bool {
        hotkey::is_actionable(&self.shortcut)
    }
}

#[derive(Debug, Default)]
pub struct MarkerEditor {
    markers: Vec<Marker>,
    next_id: MarkerId,
}

impl MarkerEditor {
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn get(&self, id: MarkerId) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == id)
    }

    fn get_mut(&mut self, id: MarkerId) -> Result<&mut Marker, BindingConflict> {
        self.markers
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(BindingConflict::UnknownMarker(id))
    }

    fn push(&mut self, shortcut: String, x: i32, y: i32, w: i32, h: i32) -> MarkerId {
        let id = self.next_id;
        self.next_id += 1;
        self.markers.push(Marker {
            id,
            shortcut,
            x,
            y,
            w,
            h,
        });
        id
    }

    /// Create a marker on the first free printable key, sized to the
    /// default radius and placed at the last used position.
    pub fn new_marker(&mut self, table: &BindingTable) -> MarkerId {
        let (mut shortcut, (x, y), radius) = table.read(|config| {
            let shortcut = PRINTABLE
                .chars()
                .map(|c| hotkey::normalize(&c.to_string()))
                .find(|s| {
                    hotkey::is_actionable(s)
                        && !config.is_bound(s)
                        && !self.markers.iter().any(|m| &m.shortcut == s)
                })
                .unwrap_or_default();
            (
                shortcut,
                config.last_position.unwrap_or(DEFAULT_SPAWN),
                config::clamp_radius(config.radius),
            )
        });

        if shortcut.is_empty() {
            tracing::warn!("every printable key is taken, new marker left unassigned");
        } else if let Err(err) = table.set_click(&shortcut, x, y, radius, radius) {
            tracing::warn!(%err, "new marker left unassigned");
            shortcut.clear();
        }
        tracing::info!("New hotkey \"{}\" created", hotkey::display_label(&shortcut));
        self.push(shortcut, x, y, radius, radius)
    }

    pub fn move_marker(
        &mut self,
        id: MarkerId,
        x: i32,
        y: i32,
        table: &BindingTable,
    ) -> Result<(), BindingConflict> {
        let marker = self.get_mut(id)?;
        tracing::info!(
            "Move the hotkey \"{}\" from ({};{}) to ({};{})",
            marker.label(),
            marker.x,
            marker.y,
            x,
            y
        );
        marker.x = x;
        marker.y = y;
        let marker = marker.clone();
        table.set_last_position(Some((x, y)));
        if marker.is_assigned() {
            table.set_click(&marker.shortcut, marker.x, marker.y, marker.w, marker.h)?;
        }
        Ok(())
    }

    pub fn resize_marker(
        &mut self,
        id: MarkerId,
        w: i32,
        h: i32,
        table: &BindingTable,
    ) -> Result<(), BindingConflict> {
        if w <= 0 || h <= 0 {
            return Err(BindingConflict::InvalidSize { w, h });
        }
        let marker = self.get_mut(id)?;
        marker.w = w;
        marker.h = h;
        let marker = marker.clone();
        if marker.is_assigned() {
            table.set_click(&marker.shortcut, marker.x, marker.y, marker.w, marker.h)?;
        }
        Ok(())
    }

    /// Give a marker a new shortcut. Rebinding to its own shortcut is a
    /// no-op; a shortcut used by another marker or by a custom shortcut is
    /// rejected and nothing changes.
    pub fn rebind_marker(
        &mut self,
        id: MarkerId,
        shortcut: &str,
        table: &BindingTable,
    ) -> Result<(), BindingConflict> {
        let shortcut = hotkey::normalize(shortcut);
        if !hotkey::is_actionable(&shortcut) {
            return Err(BindingConflict::Unassigned);
        }
        let marker = self.get(id).ok_or(BindingConflict::UnknownMarker(id))?.clone();
        let current = marker.shortcut;
        if hotkey::same_shortcut(&current, &shortcut) {
            return Ok(());
        }
        let taken = table.read(|config| config.is_bound(&shortcut))
            || self.markers.iter().any(|m| m.id != id && m.shortcut == shortcut);
        if taken {
            let err = BindingConflict::AlreadyAssigned(hotkey::display_label(&shortcut));
            tracing::error!("{err}");
            return Err(err);
        }

        table.set_click(&shortcut, marker.x, marker.y, marker.w, marker.h)?;
        if !current.is_empty() {
            table.delete(&current);
        }
        let marker = self.get_mut(id)?;
        marker.shortcut = shortcut;
        tracing::info!("Hotkey edited to \"{}\"", marker.label());
        Ok(())
    }

    /// Bind a custom pointer shortcut. A shortcut owned by a marker, open or
    /// saved, is rejected and nothing changes.
    pub fn bind_custom(
        &self,
        shortcut: &str,
        action: PointerAction,
        table: &BindingTable,
    ) -> Result<(), BindingConflict> {
        let shortcut = hotkey::normalize(shortcut);
        if !hotkey::is_actionable(&shortcut) {
            return Err(BindingConflict::Unassigned);
        }
        let taken = table.read(|config| config.click_binding(&shortcut).is_some())
            || self
                .markers
                .iter()
                .any(|m| hotkey::same_shortcut(&m.shortcut, &shortcut));
        if taken {
            let err = BindingConflict::AlreadyAssigned(hotkey::display_label(&shortcut));
            tracing::error!("{err}");
            return Err(err);
        }
        table.set_custom(&shortcut, action)?;
        tracing::info!(
            "Custom hotkey \"{}\" bound to {action:?}",
            hotkey::display_label(&shortcut)
        );
        Ok(())
    }

    pub fn delete_marker(&mut self, id: MarkerId, table: &BindingTable) -> Result<(), BindingConflict> {
        let idx = self
            .markers
            .iter()
            .position(|m| m.id == id)
            .ok_or(BindingConflict::UnknownMarker(id))?;
        let marker = self.markers.remove(idx);
        if marker.is_assigned() {
            table.delete(&marker.shortcut);
        }
        tracing::info!("Delete the hotkey \"{}\"", marker.label());
        Ok(())
    }

    /// Rebuild the markers from the table, e.g. after loading a file.
    pub fn restore_from(&mut self, table: &BindingTable) {
        self.markers.clear();
        let bindings: Vec<_> = table.read(|config| {
            config
                .hotkeys
                .iter()
                .map(|(shortcut, b)| (shortcut.clone(), *b))
                .collect()
        });
        for (shortcut, b) in bindings {
            self.push(shortcut, b.x, b.y, b.w, b.h);
        }
    }

    /// Close every marker. Their bindings stay in the table.
    pub fn clear(&mut self) {
        self.markers.clear();
    }

    /// `true` while some marker still lacks a shortcut; Start is refused then.
    pub fn has_unassigned(&self) -> bool {
        self.markers.iter().any(|m| !m.is_assigned())
    }
}
