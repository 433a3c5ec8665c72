//! Confirmation dialog logic module
//!
//! Handles confirmation dialog callbacks for various application actions.

use crate::{global_logic, global_util, slint_generatedAppWindow::AppWindow};
use slint::ComponentHandle;

pub fn init(ui: &AppWindow) {
    let ui_weak = ui.as_weak();
    global_util!(ui).on_handle_confirm_dialog(move |handle_type, user_data| {
        let ui = ui_weak.unwrap();

        match handle_type.as_str() {
            "close-window" => {
                global_util!(ui).invoke_close_window();
            }
            "cancel-download" => {
                let index = user_data.parse::<i32>().unwrap_or(-1);
                global_logic!(ui).invoke_model_cancel_download(index);
            }
            _ => (),
        }
    });
}
