// Pointer-driven tab reordering.
//
// The controller works on a snapshot of the tab order taken at press time and only
// hands the final order back on release; the registry is untouched while dragging.
// Geometry comes in as viewport rectangles measured by the rendering layer.

use serde::{Deserialize, Serialize};

/// Vertical slack allowed below the strip's top edge for the dragged tab.
pub const MAX_DROP_PX: f64 = 4.0;
/// Horizontal reach of the proximity distortion around the dragged tab.
pub const PROXIMITY_RADIUS_PX: f64 = 180.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn distance_to(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn mid_x(&self) -> f64 {
        self.left + self.width / 2.0
    }

    pub fn contains_x(&self, x: f64) -> bool {
        x >= self.left && x <= self.right()
    }

    /// Same rectangle expressed relative to `origin`'s top-left corner.
    pub fn relative_to(&self, origin: &Rect) -> Rect {
        Rect::new(self.left - origin.left, self.top - origin.top, self.width, self.height)
    }
}

/// Where everything currently sits on screen, as measured by the renderer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StripLayout {
    pub strip: Rect,
    pub tabs: Vec<(String, Rect)>,
}

impl StripLayout {
    pub fn rect_of(&self, tab_id: &str) -> Option<Rect> {
        self.tabs.iter().find(|(id, _)| id == tab_id).map(|(_, r)| *r)
    }
}

/// Cosmetic distortion applied to a non-dragged tab.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TabDistortion {
    pub tab_id: String,
    pub scale: f64,
    pub blur_px: f64,
    pub saturation: f64,
    pub opacity: f64,
}

impl TabDistortion {
    fn for_distance(tab_id: &str, distance: f64) -> Self {
        let influence = (1.0 - distance.abs() / PROXIMITY_RADIUS_PX).clamp(0.0, 1.0);
        Self {
            tab_id: tab_id.to_string(),
            scale: 1.0 - 0.06 * influence,
            blur_px: 1.2 * influence,
            saturation: 1.0 - 0.35 * influence,
            opacity: 1.0 - 0.25 * influence,
        }
    }
}

pub type DragVisuals = Vec<TabDistortion>;

/// One tab that changed position when the working order was reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabMove {
    pub tab_id: String,
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone, PartialEq)]
struct Press {
    tab_id: String,
    origin: Point,
    /// Pointer position inside the pressed tab.
    grab_offset: Point,
    size: (f64, f64),
    working: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct Session {
    press: Press,
    placeholder_index: usize,
    ghost: Rect,
    visuals: DragVisuals,
}

#[derive(Debug, Clone, PartialEq, Default)]
enum DragState {
    #[default]
    Idle,
    Pressed(Press),
    Dragging(Session),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragUpdate {
    /// No press in progress.
    Ignored,
    /// Still under the movement threshold; may turn out to be a click.
    Pending,
    Dragging {
        placeholder_index: usize,
        /// Set when this move changed the working order.
        moves: Option<Vec<TabMove>>,
    },
    /// The dragged tab vanished; the drag was abandoned.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragRelease {
    None,
    /// Threshold never crossed: an ordinary click on the tab.
    Click(String),
    /// Final order to commit.
    Reorder(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragController {
    threshold: f64,
    state: DragState,
}

impl DragController {
    pub fn new(threshold_px: f64) -> Self {
        Self {
            threshold: threshold_px,
            state: DragState::Idle,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    pub fn dragged_tab(&self) -> Option<&str> {
        match &self.state {
            DragState::Pressed(p) => Some(&p.tab_id),
            DragState::Dragging(s) => Some(&s.press.tab_id),
            DragState::Idle => None,
        }
    }

    pub fn working_order(&self) -> Option<&[String]> {
        match &self.state {
            DragState::Pressed(p) => Some(&p.working),
            DragState::Dragging(s) => Some(&s.press.working),
            DragState::Idle => None,
        }
    }

    pub fn placeholder_index(&self) -> Option<usize> {
        match &self.state {
            DragState::Dragging(s) => Some(s.placeholder_index),
            _ => None,
        }
    }

    /// Dragged tab rectangle, strip-local.
    pub fn ghost(&self) -> Option<Rect> {
        match &self.state {
            DragState::Dragging(s) => Some(s.ghost),
            _ => None,
        }
    }

    pub fn visuals(&self) -> &[TabDistortion] {
        match &self.state {
            DragState::Dragging(s) => &s.visuals,
            _ => &[],
        }
    }

    /// Pointer went down on `tab_id`. `order` is the current strip order.
    pub fn press(&mut self, tab_id: &str, pointer: Point, order: Vec<String>, tab_rect: Rect) {
        if !order.iter().any(|id| id == tab_id) {
            self.state = DragState::Idle;
            return;
        }
        self.state = DragState::Pressed(Press {
            tab_id: tab_id.to_string(),
            origin: pointer,
            grab_offset: Point::new(pointer.x - tab_rect.left, pointer.y - tab_rect.top),
            size: (tab_rect.width, tab_rect.height),
            working: order,
        });
    }

    pub fn pointer_move(&mut self, pointer: Point, layout: &StripLayout) -> DragUpdate {
        match std::mem::take(&mut self.state) {
            DragState::Idle => DragUpdate::Ignored,
            DragState::Pressed(press) => {
                if pointer.distance_to(press.origin) < self.threshold {
                    self.state = DragState::Pressed(press);
                    return DragUpdate::Pending;
                }
                let Some(placeholder_index) = press.working.iter().position(|id| *id == press.tab_id) else {
                    return DragUpdate::Cancelled;
                };
                log::debug!("[Drag] Started dragging {} from slot {}", press.tab_id, placeholder_index);
                let session = Session {
                    press,
                    placeholder_index,
                    ghost: Rect::default(),
                    visuals: Vec::new(),
                };
                self.drag_to(session, pointer, layout)
            }
            DragState::Dragging(session) => self.drag_to(session, pointer, layout),
        }
    }

    fn drag_to(&mut self, mut session: Session, pointer: Point, layout: &StripLayout) -> DragUpdate {
        let dragged = session.press.tab_id.clone();
        if layout.rect_of(&dragged).is_none() {
            log::debug!("[Drag] {} left the strip, cancelling", dragged);
            return DragUpdate::Cancelled;
        }
        // Anything the renderer no longer shows is gone from the working order too.
        session
            .press
            .working
            .retain(|id| layout.rect_of(id).is_some());

        let strip = layout.strip;
        let (width, height) = session.press.size;
        let ghost_top = (pointer.y - session.press.grab_offset.y).min(strip.top + MAX_DROP_PX);
        session.ghost = Rect::new(pointer.x - session.press.grab_offset.x, ghost_top, width, height)
            .relative_to(&strip);

        let others: Vec<Rect> = session
            .press
            .working
            .iter()
            .filter(|id| **id != dragged)
            .filter_map(|id| layout.rect_of(id))
            .map(|r| r.relative_to(&strip))
            .collect();
        let target = target_slot(&others, pointer.x - strip.left);

        let Some(current) = session.press.working.iter().position(|id| *id == dragged) else {
            return DragUpdate::Cancelled;
        };

        let moves = if target != current {
            let before = session.press.working.clone();
            let id = session.press.working.remove(current);
            session.press.working.insert(target, id);
            log::debug!("[Drag] {} slot {} -> {}", dragged, current, target);
            Some(changed_positions(&before, &session.press.working))
        } else {
            None
        };
        session.placeholder_index = target;

        let ghost_mid = session.ghost.mid_x();
        session.visuals = session
            .press
            .working
            .iter()
            .filter(|id| **id != dragged)
            .filter_map(|id| {
                layout
                    .rect_of(id)
                    .map(|r| TabDistortion::for_distance(id, r.relative_to(&strip).mid_x() - ghost_mid))
            })
            .collect();

        self.state = DragState::Dragging(session);
        DragUpdate::Dragging {
            placeholder_index: target,
            moves,
        }
    }

    /// Pointer went up. Returns what the caller should commit.
    pub fn release(&mut self) -> DragRelease {
        match std::mem::take(&mut self.state) {
            DragState::Idle => DragRelease::None,
            DragState::Pressed(press) => DragRelease::Click(press.tab_id),
            DragState::Dragging(session) => {
                log::debug!("[Drag] Released {} at slot {}", session.press.tab_id, session.placeholder_index);
                DragRelease::Reorder(session.press.working)
            }
        }
    }

    /// Drops every trace of a tab that was closed mid-gesture.
    pub fn forget(&mut self, tab_id: &str) {
        if self.dragged_tab() == Some(tab_id) {
            self.state = DragState::Idle;
            return;
        }
        match &mut self.state {
            DragState::Pressed(p) => p.working.retain(|id| id != tab_id),
            DragState::Dragging(s) => {
                s.press.working.retain(|id| id != tab_id);
                s.visuals.retain(|v| v.tab_id != tab_id);
                if let Some(slot) = s.press.working.iter().position(|id| *id == s.press.tab_id) {
                    s.placeholder_index = slot;
                }
            }
            DragState::Idle => {}
        }
    }

    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }
}

/// Slot among `others` (strip-local, in order) where a tab dropped at `x` lands.
pub fn target_slot(others: &[Rect], x: f64) -> usize {
    let (Some(first), Some(last)) = (others.first(), others.last()) else {
        return 0;
    };
    if x < first.left {
        return 0;
    }
    if x > last.right() {
        return others.len();
    }
    if let Some((i, rect)) = others.iter().enumerate().find(|(_, r)| r.contains_x(x)) {
        return if x < rect.mid_x() { i } else { i + 1 };
    }
    // In a gap between two tabs
    others.iter().filter(|r| r.mid_x() < x).count()
}

/// Tabs whose index differs between two orders of the same ids.
pub fn changed_positions(before: &[String], after: &[String]) -> Vec<TabMove> {
    after
        .iter()
        .enumerate()
        .filter_map(|(to, id)| {
            let from = before.iter().position(|b| b == id)?;
            (from != to).then(|| TabMove {
                tab_id: id.clone(),
                from,
                to,
            })
        })
        .collect()
}
