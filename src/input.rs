/// Logical input: which actions are held this frame, and the per-player
/// intents derived from them. Key bindings live in the binary.

use std::ops::{BitOr, BitOrAssign};

use crate::entities::PlayerId;

/// Bitmask of thrust directions; several may be active at once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DirectionFlags(u8);

impl DirectionFlags {
    pub const FORWARD: DirectionFlags = DirectionFlags(1);
    pub const BACKWARD: DirectionFlags = DirectionFlags(2);
    pub const LEFT: DirectionFlags = DirectionFlags(4);
    pub const RIGHT: DirectionFlags = DirectionFlags(8);

    pub const fn empty() -> Self {
        DirectionFlags(0)
    }

    pub fn contains(self, other: DirectionFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for DirectionFlags {
    type Output = DirectionFlags;

    fn bitor(self, rhs: DirectionFlags) -> DirectionFlags {
        DirectionFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for DirectionFlags {
    fn bitor_assign(&mut self, rhs: DirectionFlags) {
        self.0 |= rhs.0;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    P1Up,
    P1Down,
    P1Left,
    P1Right,
    P1Fire,
    P1Rotate,
    P2Up,
    P2Down,
    P2Left,
    P2Right,
    P2Fire,
    P2Rotate,
    Save,
    Load,
    Quit,
}

impl Action {
    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

/// Held state of every logical action for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputSnapshot(u16);

impl InputSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, action: Action) -> Self {
        self.press(action);
        self
    }

    pub fn press(&mut self, action: Action) {
        self.0 |= action.bit();
    }

    pub fn release(&mut self, action: Action) {
        self.0 &= !action.bit();
    }

    pub fn is_held(&self, action: Action) -> bool {
        self.0 & action.bit() != 0
    }

    /// Held now but not in `previous`.
    pub fn pressed_since(&self, previous: &InputSnapshot, action: Action) -> bool {
        self.is_held(action) && !previous.is_held(action)
    }

    pub fn directions(&self, player: PlayerId) -> DirectionFlags {
        let [up, down, left, right] = match player {
            PlayerId::One => [Action::P1Up, Action::P1Down, Action::P1Left, Action::P1Right],
            PlayerId::Two => [Action::P2Up, Action::P2Down, Action::P2Left, Action::P2Right],
        };
        let mut flags = DirectionFlags::empty();
        if self.is_held(up) {
            flags |= DirectionFlags::FORWARD;
        }
        if self.is_held(down) {
            flags |= DirectionFlags::BACKWARD;
        }
        if self.is_held(left) {
            flags |= DirectionFlags::LEFT;
        }
        if self.is_held(right) {
            flags |= DirectionFlags::RIGHT;
        }
        flags
    }

    /// What `player` wants this frame, given last frame's snapshot.
    pub fn intent(&self, previous: &InputSnapshot, player: PlayerId) -> PlayerIntent {
        let (fire, rotate) = match player {
            PlayerId::One => (Action::P1Fire, Action::P1Rotate),
            PlayerId::Two => (Action::P2Fire, Action::P2Rotate),
        };
        PlayerIntent {
            directions: self.directions(player),
            fire: self.is_held(fire),
            rotate: self.pressed_since(previous, rotate),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlayerIntent {
    pub directions: DirectionFlags,
    /// Fire is held; the session's cooldown decides whether a shot spawns.
    pub fire: bool,
    /// Rotate went down this frame.
    pub rotate: bool,
}
