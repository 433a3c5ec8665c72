//! About panel logic module
//!
//! Handles initialization of the about panel with application information.

use crate::slint_generatedAppWindow::{AboutSetting, AppWindow};
use crate::{config, version::VERSION};
use slint::ComponentHandle;

pub fn init(ui: &AppWindow) {
    ui.global::<AboutSetting>()
        .set_app_name(config::all().app_name.into());

    ui.global::<AboutSetting>()
        .set_version(format!("v{VERSION}").into());
}
