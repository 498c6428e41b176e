// editor/panels.rs
//! Visibility of sidebars, the chat drawer and the popups.
//!
//! Each panel is a two-state machine (`open`/`closed`). Closing a popup keeps
//! its anchor and target so the close animation has something to show.

use serde::{Deserialize, Serialize};

use crate::analysis::SpellError;
use crate::lang::WordSpan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Panel {
    Sidebar,
    Chat,
    ContextMenu,
    SpellCheckPopup,
    TranslationPopup,
}

impl Panel {
    pub fn is_popup(self) -> bool {
        matches!(
            self,
            Panel::ContextMenu | Panel::SpellCheckPopup | Panel::TranslationPopup
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SidebarTab {
    #[default]
    Corrections,
    Suggestions,
    Analysis,
    Translation,
}

/// Screen coordinates a popup is attached to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub x: f64,
    pub y: f64,
}

/// What a popup is about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PopupTarget {
    Word(WordSpan),
    Error(SpellError),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Popup {
    pub open: bool,
    pub anchor: Anchor,
    pub target: Option<PopupTarget>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelState {
    pub sidebar_open: bool,
    pub active_tab: SidebarTab,
    pub chat_open: bool,
    pub context_menu: Popup,
    pub spell_check_popup: Popup,
    pub translation_popup: Popup,
}

impl Default for PanelState {
    fn default() -> Self {
        Self {
            sidebar_open: true,
            active_tab: SidebarTab::default(),
            chat_open: false,
            context_menu: Popup::default(),
            spell_check_popup: Popup::default(),
            translation_popup: Popup::default(),
        }
    }
}

impl PanelState {
    pub fn is_open(&self, panel: Panel) -> bool {
        match panel {
            Panel::Sidebar => self.sidebar_open,
            Panel::Chat => self.chat_open,
            Panel::ContextMenu => self.context_menu.open,
            Panel::SpellCheckPopup => self.spell_check_popup.open,
            Panel::TranslationPopup => self.translation_popup.open,
        }
    }

    pub fn set(&mut self, panel: Panel, open: bool) {
        match panel {
            Panel::Sidebar => self.sidebar_open = open,
            Panel::Chat => self.chat_open = open,
            Panel::ContextMenu => self.context_menu.open = open,
            Panel::SpellCheckPopup => self.spell_check_popup.open = open,
            Panel::TranslationPopup => self.translation_popup.open = open,
        }
    }

    /// Flip `panel` and return its new state.
    pub fn toggle(&mut self, panel: Panel) -> bool {
        let open = !self.is_open(panel);
        self.set(panel, open);
        open
    }

    /// Open a popup at `anchor`. Returns `false` for panels that are not popups.
    pub fn open_popup(&mut self, panel: Panel, anchor: Anchor, target: Option<PopupTarget>) -> bool {
        let popup = match panel {
            Panel::ContextMenu => &mut self.context_menu,
            Panel::SpellCheckPopup => &mut self.spell_check_popup,
            Panel::TranslationPopup => &mut self.translation_popup,
            Panel::Sidebar | Panel::Chat => return false,
        };
        *popup = Popup {
            open: true,
            anchor,
            target,
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let panels = PanelState::default();
        assert!(panels.is_open(Panel::Sidebar));
        assert!(!panels.is_open(Panel::Chat));
        assert!(!panels.is_open(Panel::ContextMenu));
        assert_eq!(panels.active_tab, SidebarTab::Corrections);
    }

    #[test]
    fn toggle_twice_is_identity() {
        let mut panels = PanelState::default();
        for panel in [Panel::Sidebar, Panel::Chat, Panel::SpellCheckPopup] {
            let before = panels.is_open(panel);
            assert_eq!(panels.toggle(panel), !before);
            panels.toggle(panel);
            assert_eq!(panels.is_open(panel), before);
        }
    }

    #[test]
    fn closing_a_popup_keeps_its_anchor() {
        let mut panels = PanelState::default();
        let anchor = Anchor { x: 120.0, y: 48.5 };
        assert!(panels.open_popup(
            Panel::TranslationPopup,
            anchor,
            Some(PopupTarget::Text("Salama".into()))
        ));
        panels.set(Panel::TranslationPopup, false);
        assert!(!panels.translation_popup.open);
        assert_eq!(panels.translation_popup.anchor, anchor);
        assert!(!panels.open_popup(Panel::Chat, anchor, None));
    }
}
