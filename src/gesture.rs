use crate::{
    carto::{
        datum::DatumRe,
        globe::{Globe, Manipulator, Orientation, View},
    },
    config::ChangeSource,
    vars::{MIN_MOVE, MOVE_END_WAIT},
};
use geo::Coordinate;
use log::trace;
use std::time::Duration;

/* # input */

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    Start,
    Move,
    End,
}

/// one raw pointer or zoom event, with the absolute zoom scale of the device
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureInput {
    pub phase: Phase,
    pub pointer: DatumRe,
    pub scale: f64,
}

impl GestureInput {
    pub fn new(phase: Phase, x: f64, y: f64, scale: f64) -> Self {
        Self {
            phase,
            pointer: DatumRe::new(x, y),
            scale,
        }
    }
}

/// clean events derived from the raw stream
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MoveEvent {
    MoveStart,
    Move,
    MoveEnd,
    /// the pointer and its coordinate, none off the globe
    Click {
        point: DatumRe,
        coord: Option<Coordinate<f64>>,
    },
}

/* # operations */

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OperationKind {
    Click,
    Drag,
    Zoom,
    /// pressed and released without moving at all
    Spurious,
}

/// the gesture in progress
#[derive(Clone, Debug)]
pub struct Operation {
    pub kind: OperationKind,
    pub start: DatumRe,
    pub start_scale: f64,
    manipulator: Manipulator,
}

impl Operation {
    fn new(globe: &Globe, start: DatumRe, start_scale: f64) -> Self {
        Self {
            kind: OperationKind::Click,
            start,
            start_scale,
            manipulator: globe.manipulator(start, start_scale),
        }
    }

    fn is_moving(&self) -> bool {
        matches!(self.kind, OperationKind::Drag | OperationKind::Zoom)
    }
}

/// turns a noisy pointer stream into move start, move, move end and click events
#[derive(Debug, Default)]
pub struct GestureInterpreter {
    op: Option<Operation>,
    pending_end: Option<Duration>,
    scale: Option<f64>,
}

impl GestureInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operation(&self) -> Option<&Operation> {
        self.op.as_ref()
    }

    /// the zoom scale the device should continue from
    pub fn scale(&self) -> Option<f64> {
        self.scale
    }

    /// interpret one input at the given session time
    pub fn handle(&mut self, input: GestureInput, now: Duration, globe: &mut Globe) -> Vec<MoveEvent> {
        let (low, high) = globe.scale_extent();
        let scale = input.scale.clamp(low, high);
        match input.phase {
            Phase::Start => {
                if self.op.is_none() {
                    self.op = Some(Operation::new(globe, input.pointer, scale));
                }
                vec![]
            }
            Phase::Move => self.moved(input.pointer, scale, globe),
            Phase::End => self.ended(now, globe),
        }
    }

    fn moved(&mut self, pointer: DatumRe, scale: f64, globe: &mut Globe) -> Vec<MoveEvent> {
        let op = self
            .op
            .get_or_insert_with(|| Operation::new(globe, pointer, scale));
        let mut events = vec![];
        if matches!(op.kind, OperationKind::Click | OperationKind::Spurious) {
            let distance = pointer.distance(&op.start);
            if scale == op.start_scale && distance < MIN_MOVE {
                op.kind = if distance > 0.0 {
                    OperationKind::Click
                } else {
                    OperationKind::Spurious
                };
                return events;
            }
            events.push(MoveEvent::MoveStart);
            op.kind = OperationKind::Drag;
        }
        if scale != op.start_scale {
            op.kind = OperationKind::Zoom;
        }
        let pointer = match op.kind {
            OperationKind::Zoom => None,
            _ => Some(pointer),
        };
        op.manipulator
            .move_to(globe.projection.as_mut(), pointer, scale);
        self.scale = Some(scale);
        events.push(MoveEvent::Move);
        events
    }

    fn ended(&mut self, now: Duration, globe: &Globe) -> Vec<MoveEvent> {
        let op = match self.op.take() {
            Some(op) => op,
            None => return vec![],
        };
        op.manipulator.end();
        match op.kind {
            OperationKind::Click => vec![MoveEvent::Click {
                point: op.start,
                coord: globe.projection.invert(op.start),
            }],
            OperationKind::Spurious => vec![],
            OperationKind::Drag | OperationKind::Zoom => {
                trace!("{:?} ended, move end armed", op.kind);
                self.pending_end = Some(now + Duration::from_millis(MOVE_END_WAIT));
                vec![]
            }
        }
    }

    /// when the next debounced move end would fire
    pub fn next_due(&self) -> Option<Duration> {
        self.pending_end
    }

    /// fire the debounced move end once it has waited long enough without a new move
    pub fn poll(&mut self, now: Duration) -> Vec<MoveEvent> {
        match self.pending_end {
            Some(due) if due <= now => {
                self.pending_end = None;
                if self.op.as_ref().map_or(false, Operation::is_moving) {
                    vec![]
                } else {
                    vec![MoveEvent::MoveEnd]
                }
            }
            _ => vec![],
        }
    }

    /// apply an orientation from outside, unless it came from the move that just ended
    pub fn reorient(
        &mut self,
        globe: &mut Globe,
        orientation: &Orientation,
        view: &View,
        source: ChangeSource,
    ) -> Vec<MoveEvent> {
        if source == ChangeSource::MoveEnd {
            return vec![];
        }
        globe.set_orientation(orientation, view);
        self.scale = Some(globe.projection.scale());
        vec![MoveEvent::MoveStart, MoveEvent::MoveEnd]
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::carto::globe::GlobeKind;
    use float_eq::assert_float_eq;
    const EPSILON: f64 = 0.0001;

    fn setup() -> (GestureInterpreter, Globe) {
        let view = View::new(200, 200);
        (
            GestureInterpreter::new(),
            Globe::new(GlobeKind::Orthographic, &view),
        )
    }

    fn run(
        interpreter: &mut GestureInterpreter,
        globe: &mut Globe,
        inputs: &[(Phase, f64, f64, f64)],
    ) -> Vec<MoveEvent> {
        inputs
            .iter()
            .flat_map(|(phase, x, y, scale)| {
                interpreter.handle(
                    GestureInput::new(*phase, *x, *y, *scale),
                    Duration::ZERO,
                    globe,
                )
            })
            .collect()
    }

    #[test]
    fn small_displacement_is_a_click() {
        let (mut interpreter, mut globe) = setup();
        let events = run(
            &mut interpreter,
            &mut globe,
            &[
                (Phase::Start, 100.0, 100.0, 90.0),
                (Phase::Move, 101.0, 102.0, 90.0),
                (Phase::Move, 102.0, 101.0, 90.0),
                (Phase::End, 102.0, 101.0, 90.0),
            ],
        );
        assert_eq!(events.len(), 1);
        match events[0] {
            MoveEvent::Click { point, coord } => {
                assert_eq!(point, DatumRe::new(100.0, 100.0));
                let coord = coord.expect("centre of the globe");
                assert_float_eq!(coord.x, 0.0, abs <= EPSILON);
                assert_float_eq!(coord.y, 0.0, abs <= EPSILON);
            }
            other => panic!("expected a click, got {:?}", other),
        }
        assert!(interpreter.operation().is_none());
        assert!(interpreter.poll(Duration::from_secs(10)).is_empty());
    }

    #[test]
    fn zero_displacement_is_spurious() {
        let (mut interpreter, mut globe) = setup();
        let events = run(
            &mut interpreter,
            &mut globe,
            &[
                (Phase::Start, 50.0, 50.0, 90.0),
                (Phase::Move, 50.0, 50.0, 90.0),
                (Phase::End, 50.0, 50.0, 90.0),
            ],
        );
        assert!(events.is_empty());
        assert!(interpreter.poll(Duration::from_secs(10)).is_empty());
    }

    #[test]
    fn click_off_the_globe_has_no_coordinate() {
        let (mut interpreter, mut globe) = setup();
        let events = run(
            &mut interpreter,
            &mut globe,
            &[(Phase::Start, 1.0, 1.0, 90.0), (Phase::End, 1.0, 1.0, 90.0)],
        );
        assert_eq!(
            events,
            vec![MoveEvent::Click {
                point: DatumRe::new(1.0, 1.0),
                coord: None
            }]
        );
    }

    #[test]
    fn drag_emits_start_once_and_end_after_wait() {
        let (mut interpreter, mut globe) = setup();
        let events = run(
            &mut interpreter,
            &mut globe,
            &[
                (Phase::Start, 100.0, 100.0, 90.0),
                (Phase::Move, 110.0, 100.0, 90.0),
                (Phase::Move, 120.0, 100.0, 90.0),
                (Phase::End, 120.0, 100.0, 90.0),
            ],
        );
        assert_eq!(
            events,
            vec![MoveEvent::MoveStart, MoveEvent::Move, MoveEvent::Move]
        );
        assert!(interpreter.poll(Duration::from_millis(999)).is_empty());
        assert_eq!(
            interpreter.poll(Duration::from_millis(1000)),
            vec![MoveEvent::MoveEnd]
        );
        assert!(interpreter.poll(Duration::from_millis(5000)).is_empty());
        assert_float_eq!(globe.projection.rotate()[0], 20.0 * 60.0 / 90.0, abs <= EPSILON);
    }

    #[test]
    fn zoom_is_sticky() {
        let (mut interpreter, mut globe) = setup();
        let _ = run(
            &mut interpreter,
            &mut globe,
            &[
                (Phase::Start, 100.0, 100.0, 90.0),
                (Phase::Move, 100.0, 100.0, 120.0),
                (Phase::Move, 160.0, 40.0, 90.0),
                (Phase::Move, 10.0, 10.0, 90.0),
            ],
        );
        let op = interpreter.operation().expect("operation in progress");
        assert_eq!(op.kind, OperationKind::Zoom);
        // the pointer is ignored while zooming
        assert_float_eq!(globe.projection.rotate()[0], 0.0, abs <= EPSILON);
        assert_float_eq!(globe.projection.scale(), 90.0, abs <= EPSILON);
    }

    #[test]
    fn move_end_waits_for_a_new_move() {
        let (mut interpreter, mut globe) = setup();
        let _ = run(
            &mut interpreter,
            &mut globe,
            &[
                (Phase::Start, 100.0, 100.0, 90.0),
                (Phase::Move, 120.0, 100.0, 90.0),
                (Phase::End, 120.0, 100.0, 90.0),
                (Phase::Start, 120.0, 100.0, 90.0),
                (Phase::Move, 140.0, 100.0, 90.0),
            ],
        );
        assert!(interpreter.poll(Duration::from_millis(1000)).is_empty());
    }

    #[test]
    fn end_without_operation_is_ignored() {
        let (mut interpreter, mut globe) = setup();
        assert!(run(&mut interpreter, &mut globe, &[(Phase::End, 1.0, 1.0, 90.0)]).is_empty());
    }

    #[test]
    fn out_of_order_move_starts_an_operation() {
        let (mut interpreter, mut globe) = setup();
        let events = run(
            &mut interpreter,
            &mut globe,
            &[(Phase::Move, 100.0, 100.0, 90.0), (Phase::Move, 130.0, 100.0, 90.0)],
        );
        assert_eq!(events, vec![MoveEvent::MoveStart, MoveEvent::Move]);
        assert_eq!(
            interpreter.operation().map(|op| op.kind),
            Some(OperationKind::Drag)
        );
    }

    #[test]
    fn scale_is_clamped() {
        let (mut interpreter, mut globe) = setup();
        let _ = run(
            &mut interpreter,
            &mut globe,
            &[
                (Phase::Start, 100.0, 100.0, 90.0),
                (Phase::Move, 100.0, 100.0, 1e6),
            ],
        );
        assert_eq!(globe.projection.scale(), 3000.0);
        assert_eq!(interpreter.scale(), Some(3000.0));
    }

    #[test]
    fn reorient_skips_move_end_source() {
        let (mut interpreter, mut globe) = setup();
        let view = View::new(200, 200);
        let orientation = Orientation {
            lambda: 30.0,
            phi: 10.0,
            scale: Some(150.0),
        };
        assert!(interpreter
            .reorient(&mut globe, &orientation, &view, ChangeSource::MoveEnd)
            .is_empty());
        assert_eq!(
            interpreter.reorient(&mut globe, &orientation, &view, ChangeSource::User),
            vec![MoveEvent::MoveStart, MoveEvent::MoveEnd]
        );
        assert_float_eq!(globe.orientation().lambda, 30.0, abs <= EPSILON);
        assert_eq!(interpreter.scale(), Some(150.0));
    }
}
