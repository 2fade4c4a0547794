use crate::error::{Error, Result};
use crate::interaction::drawing::{DrawPurpose, DrawnFeature, DrawingSession};
use crate::interaction::measure::MeasureSession;
use crate::interaction::selection::LassoSession;
use crate::model::{Coordinate, GeometryKind};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum InteractionMode {
    #[default]
    None,
    SelectClick,
    SelectLasso,
    Draw {
        kind: GeometryKind,
        purpose: DrawPurpose,
    },
    Measure,
}

impl InteractionMode {
    pub fn is_selecting(self) -> bool {
        matches!(self, InteractionMode::SelectClick | InteractionMode::SelectLasso)
    }
}

/// Outcome of routing one raw map event.
#[derive(Clone, Debug, PartialEq)]
pub enum Dispatch {
    Ignored,
    /// Click while click-select is armed; the caller queries the surface.
    Pick,
    /// A vertex went into the draft or lasso buffer.
    Buffered,
    Drawn(DrawnFeature),
    /// Closed lasso ring.
    Lasso(Vec<Coordinate>),
    /// The measured path changed.
    Measured,
}

/// Owns the sessions and routes raw clicks to whichever one the active mode arms.
#[derive(Clone, Debug, Default)]
pub struct ModeController {
    mode: InteractionMode,
    drawing: DrawingSession,
    lasso: LassoSession,
    measure: MeasureSession,
}

impl ModeController {
    pub fn new() -> Self {
        ModeController::default()
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn drawing(&self) -> &DrawingSession {
        &self.drawing
    }

    pub fn lasso(&self) -> &LassoSession {
        &self.lasso
    }

    pub fn measure(&self) -> &MeasureSession {
        &self.measure
    }

    /// Toolbar choice. Choosing the active tool again returns to `None`.
    /// Returns whether the mode changed.
    pub fn choose(&mut self, tool: InteractionMode) -> bool {
        let next = if tool == self.mode {
            InteractionMode::None
        } else {
            tool
        };
        self.enter(next)
    }

    /// Leave whatever is armed. Returns whether anything was armed.
    pub fn cancel(&mut self) -> bool {
        self.enter(InteractionMode::None)
    }

    fn enter(&mut self, next: InteractionMode) -> bool {
        if next == self.mode {
            return false;
        }
        self.drawing.cancel();
        self.lasso.clear();
        self.measure.clear();
        if let InteractionMode::Draw { kind, purpose } = next {
            self.drawing.arm(kind, purpose);
        }
        log::debug!("interaction mode {:?} -> {:?}", self.mode, next);
        self.mode = next;
        true
    }

    pub fn on_click(&mut self, coord: Coordinate) -> Dispatch {
        match self.mode {
            InteractionMode::None => Dispatch::Ignored,
            InteractionMode::SelectClick => Dispatch::Pick,
            InteractionMode::SelectLasso => buffered(self.lasso.push(coord)),
            InteractionMode::Measure => {
                if self.measure.push(coord) {
                    Dispatch::Measured
                } else {
                    Dispatch::Ignored
                }
            }
            InteractionMode::Draw { .. } => {
                let before = self.drawing.points().len();
                match self.drawing.on_click(coord) {
                    Some(done) => self.drawn(done),
                    None => buffered(self.drawing.points().len() > before),
                }
            }
        }
    }

    pub fn on_double_click(&mut self) -> Dispatch {
        match self.mode {
            InteractionMode::Draw { .. } => match self.drawing.on_double_click() {
                Some(done) => self.drawn(done),
                None => Dispatch::Ignored,
            },
            InteractionMode::SelectLasso => match self.finish_lasso() {
                Ok(ring) => Dispatch::Lasso(ring),
                Err(_) => Dispatch::Ignored,
            },
            _ => Dispatch::Ignored,
        }
    }

    /// Explicit "finish" for a lasso. The mode stays `SelectLasso`.
    pub fn finish_lasso(&mut self) -> Result<Vec<Coordinate>> {
        if self.mode != InteractionMode::SelectLasso {
            return Err(Error::NotArmed);
        }
        self.lasso.finish().inspect_err(|e| log::debug!("lasso not finished: {e}"))
    }

    /// Explicit completion of the drawing in progress.
    pub fn complete_drawing(&mut self) -> Result<DrawnFeature> {
        if !matches!(self.mode, InteractionMode::Draw { .. }) {
            return Err(Error::NotArmed);
        }
        let done = self.drawing.complete()?;
        self.mode = InteractionMode::None;
        Ok(done)
    }

    pub fn reset_measurement(&mut self) -> bool {
        self.mode == InteractionMode::Measure && self.measure.clear()
    }

    fn drawn(&mut self, done: DrawnFeature) -> Dispatch {
        log::debug!("drawing complete; interaction mode {:?} -> None", self.mode);
        self.mode = InteractionMode::None;
        Dispatch::Drawn(done)
    }
}

fn buffered(pushed: bool) -> Dispatch {
    if pushed {
        Dispatch::Buffered
    } else {
        Dispatch::Ignored
    }
}
