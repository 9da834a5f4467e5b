//! Layout controller
//!
//! A state machine over the four layout modes plus the implicit degenerate
//! `NoOutput` state. Explicit selections are accepted only when the mode's
//! source requirement is met; capability loss triggers an automatic
//! downgrade to the best remaining layout. Invariant: at every instant the
//! active mode's source requirement is satisfied, or the state is NoOutput.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::LayoutError;
use crate::source::Capabilities;

/// One of the four composition layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutMode {
    CameraOnly,
    ScreenOnly,
    PictureInPicture,
    SideBySide,
}

impl LayoutMode {
    pub fn requires_camera(self) -> bool {
        !matches!(self, LayoutMode::ScreenOnly)
    }

    pub fn requires_screen(self) -> bool {
        !matches!(self, LayoutMode::CameraOnly)
    }

    /// Dual-source layouts need both sources live to be selectable
    pub fn is_dual(self) -> bool {
        matches!(self, LayoutMode::PictureInPicture | LayoutMode::SideBySide)
    }

    /// Whether the capability set satisfies this mode's source requirement
    pub fn available_with(self, caps: Capabilities) -> bool {
        (!self.requires_camera() || caps.camera) && (!self.requires_screen() || caps.screen)
    }

    pub fn label(self) -> &'static str {
        match self {
            LayoutMode::CameraOnly => "Camera only",
            LayoutMode::ScreenOnly => "Screen only",
            LayoutMode::PictureInPicture => "Picture in picture",
            LayoutMode::SideBySide => "Side by side",
        }
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LayoutMode::CameraOnly => "camera-only",
            LayoutMode::ScreenOnly => "screen-only",
            LayoutMode::PictureInPicture => "picture-in-picture",
            LayoutMode::SideBySide => "side-by-side",
        };
        write!(f, "{name}")
    }
}

/// Active layout, or the degenerate state when no source is live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutState {
    NoOutput,
    Active(LayoutMode),
}

impl LayoutState {
    pub fn mode(self) -> Option<LayoutMode> {
        match self {
            LayoutState::NoOutput => None,
            LayoutState::Active(mode) => Some(mode),
        }
    }
}

/// Corner position for the picture-in-picture overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Picture-in-picture parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipSettings {
    /// Overlay width as a percentage of the output width (1-100)
    pub size_pct: u8,
    pub corner: Corner,
}

impl Default for PipSettings {
    fn default() -> Self {
        Self {
            size_pct: crate::constants::DEFAULT_PIP_SIZE_PCT,
            corner: Corner::BottomRight,
        }
    }
}

/// Snapshot of the aggregate composition state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositionState {
    pub layout: LayoutState,
    pub capabilities: Capabilities,
    pub pip: PipSettings,
}

impl CompositionState {
    /// The core invariant: the active mode's requirement is satisfied
    pub fn is_consistent(&self) -> bool {
        match self.layout {
            LayoutState::NoOutput => true,
            LayoutState::Active(mode) => mode.available_with(self.capabilities),
        }
    }
}

/// The layout state machine
pub struct LayoutController {
    state: LayoutState,
    caps: Capabilities,
    pip: Arc<RwLock<PipSettings>>,
}

impl LayoutController {
    pub fn new(pip: PipSettings) -> Self {
        Self {
            state: LayoutState::NoOutput,
            caps: Capabilities::none(),
            pip: Arc::new(RwLock::new(pip)),
        }
    }

    pub fn state(&self) -> LayoutState {
        self.state
    }

    /// Explicit layout selection. Rejected (state unchanged) when the
    /// mode's source requirement is not met at the instant of request.
    pub fn select(&mut self, mode: LayoutMode) -> Result<(), LayoutError> {
        if !mode.available_with(self.caps) {
            let mut missing = Vec::new();
            if mode.requires_camera() && !self.caps.camera {
                missing.push("camera");
            }
            if mode.requires_screen() && !self.caps.screen {
                missing.push("screen");
            }
            return Err(LayoutError::SourcesUnavailable {
                layout: mode.to_string(),
                missing: missing.join(", "),
            });
        }

        tracing::info!(layout = %mode, "layout selected");
        self.state = LayoutState::Active(mode);
        Ok(())
    }

    /// Apply a capability-change notification. If the active layout lost a
    /// required source, downgrade to the single-source layout of whichever
    /// source remains, or to NoOutput. Returns the resulting state.
    pub fn apply_capabilities(&mut self, caps: Capabilities) -> LayoutState {
        self.caps = caps;
        if let LayoutState::Active(mode) = self.state {
            if !mode.available_with(caps) {
                let downgraded = if caps.camera {
                    LayoutState::Active(LayoutMode::CameraOnly)
                } else if caps.screen {
                    LayoutState::Active(LayoutMode::ScreenOnly)
                } else {
                    LayoutState::NoOutput
                };
                tracing::info!(from = %mode, "layout downgraded after source loss");
                self.state = downgraded;
            }
        }
        self.state
    }

    /// Update the PiP overlay size. Takes effect on the next composited
    /// frame without restarting the render loop.
    pub fn set_pip_size(&self, size_pct: u8) -> Result<(), LayoutError> {
        if size_pct == 0 || size_pct > 100 {
            return Err(LayoutError::InvalidPipSize(size_pct));
        }
        self.pip.write().size_pct = size_pct;
        Ok(())
    }

    /// Update the PiP overlay corner. Takes effect on the next frame.
    pub fn set_pip_corner(&self, corner: Corner) {
        self.pip.write().corner = corner;
    }

    pub fn pip(&self) -> PipSettings {
        *self.pip.read()
    }

    /// Shared handle read by the render loop once per tick
    pub fn pip_handle(&self) -> Arc<RwLock<PipSettings>> {
        self.pip.clone()
    }

    pub fn composition_state(&self) -> CompositionState {
        CompositionState {
            layout: self.state,
            capabilities: self.caps,
            pip: *self.pip.read(),
        }
    }

    /// Human-readable name of the active layout
    pub fn display_label(&self) -> &'static str {
        match self.state {
            LayoutState::NoOutput => "No output",
            LayoutState::Active(mode) => mode.label(),
        }
    }

    /// Short indicator of which sources the active layout is using
    pub fn source_indicator(&self) -> &'static str {
        match self.state {
            LayoutState::Active(LayoutMode::CameraOnly) if self.caps.camera => "Camera",
            LayoutState::Active(LayoutMode::ScreenOnly) if self.caps.screen => "Screen",
            LayoutState::Active(LayoutMode::PictureInPicture)
                if self.caps.camera && self.caps.screen =>
            {
                "Camera + Screen"
            }
            LayoutState::Active(LayoutMode::SideBySide) if self.caps.camera && self.caps.screen => {
                "Camera | Screen"
            }
            _ => "Sources missing",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn caps(camera: bool, screen: bool) -> Capabilities {
        Capabilities { camera, screen }
    }

    fn controller_with(camera: bool, screen: bool) -> LayoutController {
        let mut controller = LayoutController::new(PipSettings::default());
        controller.apply_capabilities(caps(camera, screen));
        controller
    }

    #[test]
    fn test_dual_layout_needs_both_sources() {
        let mut controller = controller_with(true, false);

        let err = controller.select(LayoutMode::PictureInPicture).unwrap_err();
        assert!(matches!(err, LayoutError::SourcesUnavailable { .. }));
        assert_eq!(controller.state(), LayoutState::NoOutput);

        controller.apply_capabilities(caps(true, true));
        controller.select(LayoutMode::PictureInPicture).unwrap();
        assert_eq!(
            controller.state(),
            LayoutState::Active(LayoutMode::PictureInPicture)
        );
    }

    #[test]
    fn test_rejected_selection_keeps_current_state() {
        let mut controller = controller_with(true, false);
        controller.select(LayoutMode::CameraOnly).unwrap();

        assert!(controller.select(LayoutMode::SideBySide).is_err());
        assert_eq!(controller.state(), LayoutState::Active(LayoutMode::CameraOnly));
    }

    #[test]
    fn test_downgrade_prefers_remaining_source() {
        let mut controller = controller_with(true, true);
        controller.select(LayoutMode::PictureInPicture).unwrap();

        // Screen goes away: fall back to the camera.
        let state = controller.apply_capabilities(caps(true, false));
        assert_eq!(state, LayoutState::Active(LayoutMode::CameraOnly));

        // Camera goes away too: nothing left.
        let state = controller.apply_capabilities(caps(false, false));
        assert_eq!(state, LayoutState::NoOutput);
    }

    #[test]
    fn test_downgrade_to_screen_when_camera_lost() {
        let mut controller = controller_with(true, true);
        controller.select(LayoutMode::SideBySide).unwrap();

        let state = controller.apply_capabilities(caps(false, true));
        assert_eq!(state, LayoutState::Active(LayoutMode::ScreenOnly));
    }

    #[test]
    fn test_gaining_sources_does_not_auto_select() {
        let mut controller = controller_with(false, false);
        controller.apply_capabilities(caps(true, true));
        assert_eq!(controller.state(), LayoutState::NoOutput);
    }

    #[test]
    fn test_pip_settings_validation() {
        let controller = controller_with(true, true);

        assert!(controller.set_pip_size(0).is_err());
        assert!(controller.set_pip_size(101).is_err());
        controller.set_pip_size(40).unwrap();
        controller.set_pip_corner(Corner::TopLeft);

        let pip = controller.pip();
        assert_eq!(pip.size_pct, 40);
        assert_eq!(pip.corner, Corner::TopLeft);
    }

    #[test]
    fn test_pip_updates_do_not_change_layout() {
        let mut controller = controller_with(true, true);
        controller.select(LayoutMode::PictureInPicture).unwrap();

        controller.set_pip_size(10).unwrap();
        controller.set_pip_corner(Corner::BottomLeft);
        assert_eq!(
            controller.state(),
            LayoutState::Active(LayoutMode::PictureInPicture)
        );
    }

    #[test]
    fn test_labels() {
        let mut controller = controller_with(true, true);
        assert_eq!(controller.display_label(), "No output");
        assert_eq!(controller.source_indicator(), "Sources missing");

        controller.select(LayoutMode::SideBySide).unwrap();
        assert_eq!(controller.display_label(), "Side by side");
        assert_eq!(controller.source_indicator(), "Camera | Screen");

        controller.select(LayoutMode::CameraOnly).unwrap();
        assert_eq!(controller.source_indicator(), "Camera");
    }

    #[derive(Debug, Clone)]
    enum Op {
        SetCaps(bool, bool),
        Select(LayoutMode),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (any::<bool>(), any::<bool>()).prop_map(|(c, s)| Op::SetCaps(c, s)),
            prop_oneof![
                Just(LayoutMode::CameraOnly),
                Just(LayoutMode::ScreenOnly),
                Just(LayoutMode::PictureInPicture),
                Just(LayoutMode::SideBySide),
            ]
            .prop_map(Op::Select),
        ]
    }

    proptest! {
        /// At every instant the active mode's source requirement is
        /// satisfied by the live sources, or the state is NoOutput.
        #[test]
        fn prop_active_mode_requirement_always_satisfied(
            ops in proptest::collection::vec(op_strategy(), 1..64)
        ) {
            let mut controller = LayoutController::new(PipSettings::default());
            for op in ops {
                match op {
                    Op::SetCaps(camera, screen) => {
                        controller.apply_capabilities(caps(camera, screen));
                    }
                    Op::Select(mode) => {
                        let _ = controller.select(mode);
                    }
                }
                prop_assert!(controller.composition_state().is_consistent());
            }
        }
    }
}
