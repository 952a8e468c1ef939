/// Bit set in [`InputEvent::PointerMove::buttons`] while the primary button is down.
pub const PRIMARY_BUTTON: u16 = 1;

/// Pointer position along the scale track, relative to the track's left edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    pub offset: f64,
    pub track_length: f64,
}

impl TrackPoint {
    pub fn new(offset: f64, track_length: f64) -> Self {
        Self {
            offset,
            track_length,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Other,
}

/// Input dispatched to a trial session by the host's event loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed on the track or the range input laid over it.
    PointerDown(TrackPoint),
    /// Pointer moved over the track. `buttons` is the pressed-button bitmask.
    PointerMove { point: TrackPoint, buttons: u16 },
    Key(Key),
    /// Click on the submit button.
    Submit,
}

impl InputEvent {
    pub fn pointer_down(offset: f64, track_length: f64) -> Self {
        InputEvent::PointerDown(TrackPoint::new(offset, track_length))
    }

    pub fn drag(offset: f64, track_length: f64) -> Self {
        InputEvent::PointerMove {
            point: TrackPoint::new(offset, track_length),
            buttons: PRIMARY_BUTTON,
        }
    }
}

/// A drag counts only while the primary button alone is held.
pub fn primary_only(buttons: u16) -> bool {
    buttons == PRIMARY_BUTTON
}
