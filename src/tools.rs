#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Select,
    Pan,
    Zoom,
    AddNode,
    AddConnector,
}

impl Tool {
    pub const ALL: [Tool; 5] = [
        Tool::Select,
        Tool::Pan,
        Tool::Zoom,
        Tool::AddNode,
        Tool::AddConnector,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Tool::Select => "Select",
            Tool::Pan => "Pan",
            Tool::Zoom => "Zoom",
            Tool::AddNode => "Add node",
            Tool::AddConnector => "Add connector",
        }
    }

    pub fn shortcut(self) -> char {
        match self {
            Tool::Select => 'V',
            Tool::Pan => 'H',
            Tool::Zoom => 'Z',
            Tool::AddNode => 'N',
            Tool::AddConnector => 'C',
        }
    }

    fn from_shortcut(c: char) -> Option<Tool> {
        let c = c.to_ascii_uppercase();
        Tool::ALL.into_iter().find(|t| t.shortcut() == c)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Escape,
    Delete,
    Backspace,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub command: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        command: false,
        shift: false,
        alt: false,
    };

    fn is_none(self) -> bool {
        self == Modifiers::NONE
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub modifiers: Modifiers,
    pub text_input_focused: bool,
}

impl KeyInput {
    pub fn new(key: Key, modifiers: Modifiers, text_input_focused: bool) -> Self {
        Self {
            key,
            modifiers,
            text_input_focused,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyCommand {
    SetTool(Tool),
    Undo,
    Redo,
    Cancel,
    DeleteSelection,
}

/// Maps a key press to an editor command.
///
/// Undo and redo fire whatever the active tool is. Single-letter tool shortcuts, Escape
/// and Delete only fire unmodified and never while a text field has focus.
pub fn route_key(input: &KeyInput) -> Option<KeyCommand> {
    let m = input.modifiers;
    if m.command && !m.alt {
        return match input.key {
            Key::Char('z' | 'Z') if m.shift => Some(KeyCommand::Redo),
            Key::Char('z' | 'Z') => Some(KeyCommand::Undo),
            Key::Char('y' | 'Y') if !m.shift => Some(KeyCommand::Redo),
            _ => None,
        };
    }
    if input.text_input_focused || !m.is_none() {
        return None;
    }
    match input.key {
        Key::Char(c) => Tool::from_shortcut(c).map(KeyCommand::SetTool),
        Key::Escape => Some(KeyCommand::Cancel),
        Key::Delete | Key::Backspace => Some(KeyCommand::DeleteSelection),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMMAND: Modifiers = Modifiers {
        command: true,
        ..Modifiers::NONE
    };

    fn press(key: Key, modifiers: Modifiers) -> Option<KeyCommand> {
        route_key(&KeyInput::new(key, modifiers, false))
    }

    #[test]
    fn letters_switch_tools() {
        for tool in Tool::ALL {
            let lower = tool.shortcut().to_ascii_lowercase();
            assert_eq!(
                press(Key::Char(lower), Modifiers::NONE),
                Some(KeyCommand::SetTool(tool))
            );
        }
        assert_eq!(press(Key::Char('q'), Modifiers::NONE), None);
    }

    #[test]
    fn typing_into_a_field_does_not_switch_tools() {
        let input = KeyInput::new(Key::Char('n'), Modifiers::NONE, true);
        assert_eq!(route_key(&input), None);
        let input = KeyInput::new(Key::Delete, Modifiers::NONE, true);
        assert_eq!(route_key(&input), None);
    }

    #[test]
    fn undo_redo_chords() {
        assert_eq!(press(Key::Char('z'), COMMAND), Some(KeyCommand::Undo));
        assert_eq!(press(Key::Char('y'), COMMAND), Some(KeyCommand::Redo));
        let shift_cmd = Modifiers {
            shift: true,
            ..COMMAND
        };
        assert_eq!(press(Key::Char('Z'), shift_cmd), Some(KeyCommand::Redo));
    }

    #[test]
    fn undo_fires_even_with_text_focus() {
        let input = KeyInput::new(Key::Char('z'), COMMAND, true);
        assert_eq!(route_key(&input), Some(KeyCommand::Undo));
    }

    #[test]
    fn modified_letters_are_not_shortcuts() {
        let shift = Modifiers {
            shift: true,
            ..Modifiers::NONE
        };
        assert_eq!(press(Key::Char('v'), shift), None);
        assert_eq!(press(Key::Char('v'), COMMAND), None);
    }

    #[test]
    fn escape_and_delete() {
        assert_eq!(press(Key::Escape, Modifiers::NONE), Some(KeyCommand::Cancel));
        assert_eq!(
            press(Key::Backspace, Modifiers::NONE),
            Some(KeyCommand::DeleteSelection)
        );
    }
}
