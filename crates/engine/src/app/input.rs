use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Number of distinct key codes tracked by the bitmask.
pub const KEY_CODE_COUNT: usize = 256;

const WORDS: usize = KEY_CODE_COUNT / 64;

/// Keys the engine tracks. The discriminant is the bit index in the mask;
/// what a key *means* is the host's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    Digit0,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Digit6,
    Digit7,
    Digit8,
    Digit9,
    Enter,
    Space,
    Escape,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
}

impl Key {
    pub const fn code(self) -> u16 {
        self as u16
    }
}

/// Shared press bitmask. The event-delivering thread writes through
/// [`KeyEvents`]; the loop thread reads through [`KeyState`]. Relaxed ordering
/// is enough: each bit is independent and the per-frame snapshot only needs
/// eventual visibility of individual transitions, not cross-bit ordering.
#[derive(Debug, Default)]
struct KeyBits {
    words: [AtomicU64; WORDS],
}

impl KeyBits {
    fn set(&self, code: u16) {
        if let Some((word, mask)) = Self::locate(code) {
            self.words[word].fetch_or(mask, Ordering::Relaxed);
        }
    }

    fn clear(&self, code: u16) {
        if let Some((word, mask)) = Self::locate(code) {
            self.words[word].fetch_and(!mask, Ordering::Relaxed);
        }
    }

    fn get(&self, code: u16) -> bool {
        match Self::locate(code) {
            Some((word, mask)) => self.words[word].load(Ordering::Relaxed) & mask != 0,
            None => false,
        }
    }

    fn snapshot(&self) -> [u64; WORDS] {
        let mut out = [0u64; WORDS];
        for (index, word) in self.words.iter().enumerate() {
            out[index] = word.load(Ordering::Relaxed);
        }
        out
    }

    // Codes outside the tracked range are ignored rather than wrapped.
    fn locate(code: u16) -> Option<(usize, u64)> {
        let code = code as usize;
        if code >= KEY_CODE_COUNT {
            return None;
        }
        Some((code / 64, 1u64 << (code % 64)))
    }
}

/// Writer handle for the platform event thread. Clonable so it can be moved
/// into an event-loop closure while the engine keeps its own reference.
#[derive(Debug, Clone)]
pub struct KeyEvents {
    bits: Arc<KeyBits>,
}

impl KeyEvents {
    /// Records a raw key-down. Idempotent while the key is held.
    pub fn key_down(&self, key: Key) {
        self.bits.set(key.code());
    }

    pub fn key_up(&self, key: Key) {
        self.bits.clear(key.code());
    }
}

/// Loop-side view of the keyboard: live `current` bits plus a `previous`
/// snapshot rewritten once per outer loop iteration by [`advance`].
///
/// [`advance`]: KeyState::advance
#[derive(Debug)]
pub struct KeyState {
    bits: Arc<KeyBits>,
    previous: [u64; WORDS],
}

impl KeyState {
    /// Creates the reader/writer pair over one shared bitmask.
    pub fn new() -> (KeyState, KeyEvents) {
        let bits = Arc::new(KeyBits::default());
        (
            KeyState {
                bits: Arc::clone(&bits),
                previous: [0; WORDS],
            },
            KeyEvents { bits },
        )
    }

    /// True while the key is held down.
    pub fn is_pressed(&self, key: Key) -> bool {
        self.bits.get(key.code())
    }

    /// True while the key is up.
    pub fn is_released(&self, key: Key) -> bool {
        !self.bits.get(key.code())
    }

    /// True on the first frame boundary after the key went down. Fires once
    /// per press, provided [`advance`](Self::advance) runs once per frame.
    pub fn just_pressed(&self, key: Key) -> bool {
        self.bits.get(key.code()) && !self.previous_bit(key.code())
    }

    /// True on the first frame boundary after the key came up.
    pub fn just_released(&self, key: Key) -> bool {
        !self.bits.get(key.code()) && self.previous_bit(key.code())
    }

    /// Snapshots `current` into `previous`. Must run exactly once per outer
    /// loop iteration, after updates; the loop owns that call. Running it zero
    /// or multiple times per frame merges or repeats edges.
    pub fn advance(&mut self) {
        self.previous = self.bits.snapshot();
    }

    fn previous_bit(&self, code: u16) -> bool {
        let code = code as usize;
        if code >= KEY_CODE_COUNT {
            return false;
        }
        self.previous[code / 64] & (1u64 << (code % 64)) != 0
    }
}
