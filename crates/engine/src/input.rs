//! Input port: keyboard, pointer and clipboard events.
//!
//! The host translates platform events into [`InputEvent`]s; the engine
//! decides whether they navigate, edit or run a command.

use gridbase_core::GridCell;

use crate::grid::{Drag, GridEngine};
use crate::navigation::SelectOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Tab,
    Escape,
    Backspace,
    Delete,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Home,
    End,
    F2,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }
}

/// Parse a key combo such as `"shift+down"`, `"ctrl+z"` or `"a"`.
/// Names are case-insensitive; `+` and `-` both separate parts.
pub fn parse_key_combo(combo: &str) -> Option<(Key, Modifiers)> {
    let combo = combo.trim();
    if combo.chars().count() == 1 {
        return combo.chars().next().map(|c| (Key::Char(c), Modifiers::NONE));
    }

    let mut modifiers = Modifiers::NONE;
    let mut key = None;
    for part in combo.split(['+', '-']) {
        let lower = part.to_lowercase();
        match lower.as_str() {
            "shift" => modifiers.shift = true,
            "ctrl" | "cmd" | "control" => modifiers.ctrl = true,
            "alt" | "option" => modifiers.alt = true,
            "enter" | "return" => key = Some(Key::Enter),
            "tab" => key = Some(Key::Tab),
            "escape" | "esc" => key = Some(Key::Escape),
            "backspace" => key = Some(Key::Backspace),
            "delete" | "del" => key = Some(Key::Delete),
            "up" | "arrowup" => key = Some(Key::ArrowUp),
            "down" | "arrowdown" => key = Some(Key::ArrowDown),
            "left" | "arrowleft" => key = Some(Key::ArrowLeft),
            "right" | "arrowright" => key = Some(Key::ArrowRight),
            "home" => key = Some(Key::Home),
            "end" => key = Some(Key::End),
            "f2" => key = Some(Key::F2),
            "space" => key = Some(Key::Char(' ')),
            _ if part.chars().count() == 1 => key = part.chars().next().map(Key::Char),
            _ => return None,
        }
    }
    key.map(|k| (k, modifiers))
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Key { key: Key, modifiers: Modifiers },
    /// Press on a cell body; shift extends the selection.
    PointerDown { cell: GridCell, shift: bool },
    /// Press on the active cell's fill handle.
    FillHandleDown,
    PointerMove { cell: GridCell },
    PointerUp,
    DoubleClick { cell: GridCell },
    /// Result of a clipboard read. `None` when access was denied.
    ClipboardText(Option<String>),
}

impl InputEvent {
    pub fn key(key: Key) -> Self {
        InputEvent::Key {
            key,
            modifiers: Modifiers::NONE,
        }
    }
}

impl GridEngine {
    /// Dispatch one input event. Returns whether the engine handled it.
    pub fn handle_input(&mut self, event: InputEvent) -> bool {
        match event {
            InputEvent::Key { key, modifiers } => {
                if self.edit.is_some() {
                    self.handle_edit_key(key, modifiers)
                } else {
                    self.handle_grid_key(key, modifiers)
                }
            }
            InputEvent::PointerDown { cell, shift } => {
                if self.edit.as_ref().is_some_and(|s| s.cell != cell) {
                    self.commit_edit();
                }
                let options = SelectOptions {
                    extend: shift,
                    anchor_override: None,
                };
                let selected = self.select_cell(cell, options);
                if selected {
                    self.drag = Some(Drag::Range);
                }
                selected
            }
            InputEvent::FillHandleDown => {
                if self.edit.is_some() {
                    self.commit_edit();
                }
                match self.state.active_cell().cloned() {
                    Some(origin) => {
                        self.drag = Some(Drag::Fill { origin });
                        true
                    }
                    None => false,
                }
            }
            InputEvent::PointerMove { cell } => match self.drag.clone() {
                Some(Drag::Range) => self.select_cell(cell, SelectOptions::extend()),
                Some(Drag::Fill { origin }) => {
                    self.update_fill_preview(&origin, &cell);
                    true
                }
                None => false,
            },
            InputEvent::PointerUp => match self.drag.take() {
                Some(Drag::Fill { origin }) => {
                    match self.state.fill_preview().cloned() {
                        Some(preview) => {
                            self.apply_fill(&preview, &origin);
                        }
                        None => self.clear_fill_preview(),
                    }
                    true
                }
                Some(Drag::Range) => true,
                None => false,
            },
            InputEvent::DoubleClick { cell } => self.start_editing(cell, None),
            InputEvent::ClipboardText(text) => match text {
                Some(text) if self.edit.is_some() => {
                    let first_line = text.lines().next().unwrap_or_default().to_string();
                    if let Some(buffer) = self.edit_buffer_mut() {
                        buffer.insert(&first_line);
                    }
                    true
                }
                Some(text) => self.paste_text(&text),
                None => false,
            },
        }
    }

    fn handle_grid_key(&mut self, key: Key, modifiers: Modifiers) -> bool {
        if modifiers.ctrl {
            return match key {
                Key::Char(c) => match c.to_ascii_lowercase() {
                    'c' => self.copy().is_some(),
                    'v' => {
                        self.request_paste();
                        true
                    }
                    'z' if modifiers.shift => self.redo(),
                    'z' => self.undo(),
                    'y' => self.redo(),
                    'a' => self.select_all(),
                    _ => false,
                },
                _ => false,
            };
        }

        match key {
            Key::ArrowUp => self.move_selection(-1, 0, modifiers.shift),
            Key::ArrowDown => self.move_selection(1, 0, modifiers.shift),
            Key::ArrowLeft => self.move_selection(0, -1, modifiers.shift),
            Key::ArrowRight => self.move_selection(0, 1, modifiers.shift),
            Key::Tab => self.move_selection(0, if modifiers.shift { -1 } else { 1 }, false),
            Key::Enter | Key::F2 => match self.state.active_cell().cloned() {
                Some(cell) => self.start_editing(cell, None),
                None => false,
            },
            Key::Delete | Key::Backspace => self.clear_selection_values(),
            Key::Escape => {
                if self.state.fill_preview().is_some() {
                    self.clear_fill_preview();
                    return true;
                }
                match self.state.active_cell().cloned() {
                    Some(cell) => {
                        self.focus_cell(cell);
                        true
                    }
                    None => false,
                }
            }
            Key::Char(c) if !modifiers.alt => match self.state.active_cell().cloned() {
                Some(cell) => self.start_editing(cell, Some(c.to_string())),
                None => false,
            },
            _ => false,
        }
    }

    fn handle_edit_key(&mut self, key: Key, modifiers: Modifiers) -> bool {
        if modifiers.ctrl {
            if let Key::Char(c) = key {
                if c.eq_ignore_ascii_case(&'v') {
                    self.request_paste();
                    return true;
                }
            }
            return false;
        }

        match key {
            Key::Enter => {
                let step = if modifiers.shift { -1 } else { 1 };
                if self.settings.enter_moves_down {
                    self.commit_and_move(step, 0);
                } else {
                    self.commit_edit();
                }
                true
            }
            Key::Tab => {
                self.commit_and_move(0, if modifiers.shift { -1 } else { 1 });
                true
            }
            Key::ArrowUp => {
                self.commit_and_move(-1, 0);
                true
            }
            Key::ArrowDown => {
                self.commit_and_move(1, 0);
                true
            }
            Key::Escape => self.cancel_edit(),
            _ => {
                let Some(buffer) = self.edit_buffer_mut() else {
                    return false;
                };
                match key {
                    Key::Char(c) => buffer.insert(c.encode_utf8(&mut [0; 4])),
                    Key::Backspace => buffer.backspace(),
                    Key::Delete => buffer.delete(),
                    Key::ArrowLeft => buffer.left(),
                    Key::ArrowRight => buffer.right(),
                    Key::Home => buffer.home(),
                    Key::End => buffer.end(),
                    _ => return false,
                }
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::tests::{cell, engine};
    use crate::grid::Effect;
    use gridbase_core::CellRange;

    fn press(engine: &mut GridEngine, combo: &str) -> bool {
        let (key, modifiers) = parse_key_combo(combo).unwrap();
        engine.handle_input(InputEvent::Key { key, modifiers })
    }

    #[test]
    fn test_parse_key_combo() {
        assert_eq!(parse_key_combo("shift+down"), Some((Key::ArrowDown, Modifiers::shift())));
        assert_eq!(parse_key_combo("Ctrl+Z"), Some((Key::Char('Z'), Modifiers::ctrl())));
        assert_eq!(parse_key_combo("x"), Some((Key::Char('x'), Modifiers::NONE)));
        assert_eq!(parse_key_combo("+"), Some((Key::Char('+'), Modifiers::NONE)));
        assert_eq!(parse_key_combo("hyper+q"), None);
    }

    #[test]
    fn test_typing_edits_and_enter_moves_down() {
        let mut engine = engine(3);
        engine.handle_input(InputEvent::PointerDown {
            cell: cell(0, "a"),
            shift: false,
        });
        press(&mut engine, "h");
        press(&mut engine, "i");
        assert_eq!(engine.edit_buffer().unwrap().text(), "hi");
        press(&mut engine, "enter");
        assert_eq!(engine.cell_value(&cell(0, "a")), Some("hi"));
        assert_eq!(engine.active_cell(), Some(&cell(1, "a")));
    }

    #[test]
    fn test_escape_cancels_edit() {
        let mut engine = engine(3);
        engine.handle_input(InputEvent::DoubleClick { cell: cell(1, "b") });
        press(&mut engine, "z");
        press(&mut engine, "escape");
        assert!(engine.editing_cell().is_none());
        assert_eq!(engine.cell_value(&cell(1, "b")), None);
    }

    #[test]
    fn test_shift_arrows_extend() {
        let mut engine = engine(10);
        engine.handle_input(InputEvent::PointerDown {
            cell: cell(0, "a"),
            shift: false,
        });
        for _ in 0..3 {
            press(&mut engine, "shift+down");
        }
        assert_eq!(engine.selection_bounds(), Some(CellRange::new(0, 0, 3, 0)));
    }

    #[test]
    fn test_fill_drag_gesture() {
        let mut engine = engine(6);
        engine.handle_input(InputEvent::PointerDown {
            cell: cell(0, "b"),
            shift: false,
        });
        press(&mut engine, "q");
        press(&mut engine, "enter");
        engine.handle_input(InputEvent::PointerDown {
            cell: cell(0, "b"),
            shift: false,
        });
        engine.handle_input(InputEvent::PointerUp);

        engine.handle_input(InputEvent::FillHandleDown);
        engine.handle_input(InputEvent::PointerMove { cell: cell(3, "b") });
        assert_eq!(engine.fill_preview().map(|p| p.rows.clone()), Some(vec![1, 2, 3]));
        engine.handle_input(InputEvent::PointerUp);

        assert!(engine.fill_preview().is_none());
        assert_eq!(engine.value_at(3, 1), Some("q"));
        assert_eq!(engine.value_at(4, 1), None);
    }

    #[test]
    fn test_range_drag() {
        let mut engine = engine(6);
        engine.handle_input(InputEvent::PointerDown {
            cell: cell(1, "a"),
            shift: false,
        });
        engine.handle_input(InputEvent::PointerMove { cell: cell(2, "b") });
        engine.handle_input(InputEvent::PointerUp);
        assert!(!engine.handle_input(InputEvent::PointerMove { cell: cell(5, "n") }));
        assert_eq!(engine.selection_bounds(), Some(CellRange::new(1, 0, 2, 1)));
    }

    #[test]
    fn test_ctrl_v_requests_clipboard_then_pastes() {
        let mut engine = engine(3);
        engine.handle_input(InputEvent::PointerDown {
            cell: cell(0, "a"),
            shift: false,
        });
        press(&mut engine, "ctrl+v");
        assert!(engine.take_effects().contains(&Effect::ReadClipboard));
        engine.handle_input(InputEvent::ClipboardText(Some("p".into())));
        assert_eq!(engine.value_at(0, 0), Some("p"));
        assert!(!engine.handle_input(InputEvent::ClipboardText(None)));
    }

    #[test]
    fn test_undo_redo_shortcuts() {
        let mut engine = engine(3);
        engine.handle_input(InputEvent::PointerDown {
            cell: cell(0, "a"),
            shift: false,
        });
        press(&mut engine, "k");
        press(&mut engine, "tab");
        assert_eq!(engine.active_cell(), Some(&cell(0, "b")));
        press(&mut engine, "ctrl+z");
        assert_eq!(engine.value_at(0, 0), None);
        press(&mut engine, "ctrl+shift+z");
        assert_eq!(engine.value_at(0, 0), Some("k"));
    }
}
