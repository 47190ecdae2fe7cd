//! Modifier-key state tracked at the container level.

use bitflags::bitflags;

bitflags! {
    /// Modifier keys currently held down.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b001;
        const CONTROL = 0b010;
        const META = 0b100;
    }
}

/// A single modifier key, as reported by keydown/keyup events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModifierKey {
    Shift,
    Control,
    Meta,
}

impl From<ModifierKey> for Modifiers {
    fn from(key: ModifierKey) -> Self {
        match key {
            ModifierKey::Shift => Modifiers::SHIFT,
            ModifierKey::Control => Modifiers::CONTROL,
            ModifierKey::Meta => Modifiers::META,
        }
    }
}

impl Modifiers {
    /// Control or Meta (Cmd on macOS): toggles a single row.
    pub fn is_toggle(self) -> bool {
        self.intersects(Modifiers::CONTROL | Modifiers::META)
    }

    pub fn is_range(self) -> bool {
        self.contains(Modifiers::SHIFT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_distinct_bits() {
        let all = Modifiers::from(ModifierKey::Shift)
            | Modifiers::from(ModifierKey::Control)
            | Modifiers::from(ModifierKey::Meta);
        assert_eq!(all, Modifiers::all());
        assert_eq!(all.bits(), 0b111);
    }

    #[test]
    fn meta_counts_as_toggle() {
        assert!(Modifiers::META.is_toggle());
        assert!(Modifiers::CONTROL.is_toggle());
        assert!(!Modifiers::SHIFT.is_toggle());
        assert!((Modifiers::SHIFT | Modifiers::CONTROL).is_range());
    }
}
