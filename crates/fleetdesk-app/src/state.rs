// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{AppMode, ScreenKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub mode: AppMode,
    pub active_screen: ScreenKind,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            mode: AppMode::Nav,
            active_screen: ScreenKind::Drivers,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    NextScreen,
    PrevScreen,
    SelectScreen(ScreenKind),
    EnterSearch,
    EnterMenu,
    ExitToNav,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ModeChanged(AppMode),
    ScreenChanged(ScreenKind),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::NextScreen => self.rotate_screen(1),
            AppCommand::PrevScreen => self.rotate_screen(-1),
            AppCommand::SelectScreen(screen) => {
                if screen == self.active_screen {
                    return Vec::new();
                }
                self.active_screen = screen;
                self.mode = AppMode::Nav;
                vec![AppEvent::ScreenChanged(screen)]
            }
            AppCommand::EnterSearch => {
                self.mode = AppMode::Search;
                vec![AppEvent::ModeChanged(self.mode), self.set_status("search")]
            }
            AppCommand::EnterMenu => {
                self.mode = AppMode::Menu;
                vec![AppEvent::ModeChanged(self.mode)]
            }
            AppCommand::ExitToNav => {
                self.mode = AppMode::Nav;
                vec![AppEvent::ModeChanged(self.mode), self.set_status("nav")]
            }
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    fn rotate_screen(&mut self, delta: isize) -> Vec<AppEvent> {
        let screens = ScreenKind::ALL;
        let current = screens
            .iter()
            .position(|screen| *screen == self.active_screen)
            .unwrap_or(0) as isize;
        let len = screens.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.active_screen = screens[next];
        self.mode = AppMode::Nav;
        vec![AppEvent::ScreenChanged(self.active_screen)]
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}
