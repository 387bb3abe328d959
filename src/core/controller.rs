use serde::{Deserialize, Serialize};

/// A standard SNES controller
///
/// Used to represent the controller's state in the emulator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controller {
    pub up: bool,
    pub left: bool,
    pub right: bool,
    pub down: bool,
    pub start: bool,
    pub select: bool,
    pub a: bool,
    pub b: bool,
    pub x: bool,
    pub y: bool,
    pub l: bool,
    pub r: bool,
}

impl Controller {
    pub fn new() -> Controller {
        Controller::default()
    }
    /// The controller state in the order the hardware shifts it out, MSB first.
    ///
    /// This is the value the auto joypad read places in JOY1/JOY2.
    /// ```
    /// let mut c = yase::core::Controller::new();
    /// c.b = true;
    /// c.r = true;
    /// assert_eq!(c.to_bits(), 0x8010);
    /// ```
    pub fn to_bits(&self) -> u16 {
        [
            self.b,
            self.y,
            self.select,
            self.start,
            self.up,
            self.down,
            self.left,
            self.right,
            self.a,
            self.x,
            self.l,
            self.r,
        ]
        .iter()
        .enumerate()
        .fold(0, |bits, (i, pressed)| {
            if *pressed {
                bits | (0x8000 >> i)
            } else {
                bits
            }
        })
    }
}
