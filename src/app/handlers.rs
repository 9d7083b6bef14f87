//! Key handlers, one per screen.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::{
    events::{Confirm, Screen},
    input::{InputBoxState, InputKind, InputTarget},
    shortcuts,
};

use super::App;

/// Handle one key; returns true when the app should exit.
pub async fn handle_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    if app.ui.confirm.is_some() {
        return handle_confirm_key(app, k).await;
    }
    if app.input_box.is_some() {
        return handle_input_box_key(app, k).await;
    }

    match app.ui.screen {
        Screen::Login => handle_login_key(app, k).await,
        Screen::Home => handle_home_key(app, k).await,
        Screen::Tasks => handle_tasks_key(app, k).await,
        Screen::Capture => handle_capture_key(app, k).await,
        // the scan surface is an input box; without one, fall back to the form
        Screen::Scanner => {
            app.ui.screen = Screen::Capture;
            Ok(false)
        }
    }
}

pub fn is_ctrl_c(k: &KeyEvent) -> bool {
    k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c')
}

fn open_input(app: &mut App, prompt: &str, value: &str, kind: InputKind, target: InputTarget) {
    app.input_box = Some(InputBoxState::new(prompt, value, kind, target));
}

async fn handle_login_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let sc = &app.shortcuts.login;

    if shortcuts::matches_shortcut(&k, &sc.quit) {
        return Ok(true);
    } else if shortcuts::matches_shortcut(&k, &sc.cpf) {
        let v = app.login_cpf.clone();
        open_input(app, "CPF:", &v, InputKind::Secret, InputTarget::LoginCpf);
    } else if shortcuts::matches_shortcut(&k, &sc.matricula) {
        let v = app.login_matricula.clone();
        open_input(app, "Matricula:", &v, InputKind::Text, InputTarget::LoginMatricula);
    } else if shortcuts::matches_shortcut(&k, &sc.sign_in) {
        app.sign_in().await?;
    }

    Ok(false)
}

async fn handle_home_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let sc = &app.shortcuts.home;

    if shortcuts::matches_shortcut(&k, &sc.quit) {
        return Ok(true);
    } else if shortcuts::matches_shortcut(&k, &sc.new_capture) {
        app.open_capture(false);
        app.open_scanner();
    } else if shortcuts::matches_shortcut(&k, &sc.manual_capture) {
        app.open_capture(true);
    } else if shortcuts::matches_shortcut(&k, &sc.tasks) {
        app.ui.go(Screen::Tasks);
        app.request_refresh().await?;
    } else if shortcuts::matches_shortcut(&k, &sc.refresh) {
        app.request_refresh().await?;
    } else if shortcuts::matches_shortcut(&k, &sc.sign_out) {
        app.ui.confirm = Some(Confirm::SignOut);
    }

    Ok(false)
}

async fn handle_tasks_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let sc = &app.shortcuts.tasks;

    if shortcuts::matches_shortcut(&k, &sc.back) {
        app.ui.go(Screen::Home);
    } else if shortcuts::matches_shortcut(&k, &sc.refresh) {
        app.request_refresh().await?;
    } else if shortcuts::matches_shortcut(&k, &sc.down) {
        if app.ui.selected + 1 < app.tasks.len() {
            app.ui.selected += 1;
        }
    } else if shortcuts::matches_shortcut(&k, &sc.up) {
        app.ui.selected = app.ui.selected.saturating_sub(1);
    } else if shortcuts::matches_shortcut(&k, &sc.resolve) {
        app.resolve_selected_task().await?;
    }

    Ok(false)
}

async fn handle_capture_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let sc = &app.shortcuts.capture;

    if shortcuts::matches_shortcut(&k, &sc.back) {
        app.leave_capture();
    } else if shortcuts::matches_shortcut(&k, &sc.scan) {
        app.open_scanner();
    } else if shortcuts::matches_shortcut(&k, &sc.identity) {
        if app.draft.identity_editable() {
            let v = app.draft.identity().to_string();
            open_input(app, "Product code:", &v, InputKind::Text, InputTarget::DraftIdentity);
        } else {
            app.ui.error = Some("identity can only be changed by scanning".into());
        }
    } else if shortcuts::matches_shortcut(&k, &sc.quantity) {
        if app.draft.quantity_locked() {
            app.ui.error = Some("quantity comes from the weighed label".into());
        } else {
            let v = app.draft.quantity().to_string();
            open_input(app, "Quantity:", &v, InputKind::Decimal, InputTarget::DraftQuantity);
        }
    } else if shortcuts::matches_shortcut(&k, &sc.validity) {
        let v = app.draft.validity_date().to_string();
        open_input(
            app,
            "Validity date (DD/MM/YYYY):",
            &v,
            InputKind::Date,
            InputTarget::DraftValidity,
        );
    } else if shortcuts::matches_shortcut(&k, &sc.submit) {
        app.submit().await?;
    }

    Ok(false)
}

async fn handle_confirm_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let sc = &app.shortcuts.confirm;

    if shortcuts::matches_shortcut(&k, &sc.yes) {
        match app.ui.confirm.take() {
            Some(Confirm::LeaveCapture) => app.abandon_capture(),
            Some(Confirm::SignOut) => app.sign_out().await?,
            None => {}
        }
    } else if shortcuts::matches_shortcut(&k, &sc.no) {
        app.ui.confirm = None;
    }

    Ok(false)
}

async fn handle_input_box_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let Some(input_state) = &mut app.input_box else {
        return Ok(false);
    };
    let sc = &app.shortcuts.input_box;

    if is_ctrl_c(&k) {
        return Ok(true);
    }

    if shortcuts::matches_shortcut(&k, &sc.confirm) {
        let value = input_state.value.clone();
        let target = input_state.target;
        app.input_box = None;
        app.apply_input(target, value).await?;
    } else if shortcuts::matches_shortcut(&k, &sc.cancel) {
        let target = input_state.target;
        app.input_box = None;
        if target == InputTarget::ScanPayload {
            app.ui.screen = Screen::Capture;
        }
    } else if shortcuts::matches_shortcut(&k, &sc.backspace) {
        input_state.backspace();
    } else if shortcuts::matches_shortcut(&k, &sc.delete) {
        input_state.delete();
    } else if shortcuts::matches_shortcut(&k, &sc.left) {
        input_state.move_left();
    } else if shortcuts::matches_shortcut(&k, &sc.right) {
        input_state.move_right();
    } else if shortcuts::matches_shortcut(&k, &sc.home) {
        input_state.move_home();
    } else if shortcuts::matches_shortcut(&k, &sc.end) {
        input_state.move_end();
    } else if shortcuts::matches_shortcut(&k, &sc.clear_line) {
        input_state.clear_line();
    } else if let KeyCode::Char(c) = k.code
        && !k.modifiers.contains(KeyModifiers::CONTROL)
    {
        input_state.insert_char(c);
    }

    Ok(false)
}
