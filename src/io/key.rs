const ESC: u8 = 0x1b;

/// A logical key decoded from raw terminal input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(u8),
    Enter,
    Backspace,
    Escape,
    Tab,
    Up,
    Down,
    Left,
    Right,
    CtrlUp,
    CtrlDown,
    CtrlLeft,
    CtrlRight,
    /// The terminal window changed size.
    Resize,
}

impl Key {
    /// Decode the bytes of a single read.
    ///
    /// An `ESC` prefix is told apart by length: a bare escape is one byte,
    /// `ESC [ A..D` an arrow and `ESC [ 1 ; 5 A..D` a ctrl+arrow. Any other
    /// read is keyed by its first byte. Unknown sequences give `None`.
    pub fn decode(bytes: &[u8]) -> Option<Key> {
        let (&first, _) = bytes.split_first()?;
        if first != ESC {
            return Some(Key::from_byte(first));
        }

        match bytes {
            [_] => Some(Key::Escape),
            [_, b'[', dir] => arrow(*dir),
            [_, b'[', b'1', b';', b'5', dir] => arrow(*dir).map(Key::with_ctrl),
            _ => None,
        }
    }

    pub fn from_byte(byte: u8) -> Key {
        match byte {
            b'\n' | b'\r' => Key::Enter,
            127 | 8 => Key::Backspace,
            b'\t' => Key::Tab,
            ESC => Key::Escape,
            b => Key::Char(b),
        }
    }

    pub fn with_ctrl(self) -> Key {
        match self {
            Key::Up => Key::CtrlUp,
            Key::Down => Key::CtrlDown,
            Key::Left => Key::CtrlLeft,
            Key::Right => Key::CtrlRight,
            other => other,
        }
    }

    pub fn is_printable(&self) -> bool {
        matches!(self, Key::Char(b' '..=b'~'))
    }
}

fn arrow(dir: u8) -> Option<Key> {
    match dir {
        b'A' => Some(Key::Up),
        b'B' => Some(Key::Down),
        b'C' => Some(Key::Right),
        b'D' => Some(Key::Left),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_keys() {
        assert_eq!(Key::decode(b"a"), Some(Key::Char(b'a')));
        assert_eq!(Key::decode(b"\n"), Some(Key::Enter));
        assert_eq!(Key::decode(b"\r"), Some(Key::Enter));
        assert_eq!(Key::decode(&[127]), Some(Key::Backspace));
        assert_eq!(Key::decode(b"\t"), Some(Key::Tab));
        assert_eq!(Key::decode(&[]), None);
    }

    #[test]
    fn test_escape_sequences() {
        assert_eq!(Key::decode(&[ESC]), Some(Key::Escape));
        assert_eq!(Key::decode(b"\x1b[A"), Some(Key::Up));
        assert_eq!(Key::decode(b"\x1b[B"), Some(Key::Down));
        assert_eq!(Key::decode(b"\x1b[C"), Some(Key::Right));
        assert_eq!(Key::decode(b"\x1b[D"), Some(Key::Left));
        assert_eq!(Key::decode(b"\x1b[1;5A"), Some(Key::CtrlUp));
        assert_eq!(Key::decode(b"\x1b[1;5C"), Some(Key::CtrlRight));
        assert_eq!(Key::decode(b"\x1b[1;5D"), Some(Key::CtrlLeft));
    }

    #[test]
    fn test_unknown_sequences() {
        assert_eq!(Key::decode(b"\x1b[Z"), None);
        assert_eq!(Key::decode(b"\x1b[1;3A"), None);
        assert_eq!(Key::decode(b"\x1bOP"), None);
    }

    #[test]
    fn test_printable() {
        assert!(Key::Char(b'~').is_printable());
        assert!(Key::Char(b' ').is_printable());
        assert!(!Key::Char(4).is_printable());
        assert!(!Key::Enter.is_printable());
    }
}
