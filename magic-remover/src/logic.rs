//! Rust side of the Slint `Logic` and `Util` globals.
//!
//! Each submodule registers the callbacks of one panel in its `init`.

use crate::slint_generatedAppWindow::AppWindow;

mod about;
mod batch;
mod confirm_dialog;
mod downloader;
mod editor;
mod model;
mod setting;
mod toast;
mod tr;
mod util;

/// Macro to access the global Store component
#[macro_export]
macro_rules! global_store {
    ($ui:expr) => {
        $ui.global::<crate::slint_generatedAppWindow::Store>()
    };
}

/// Macro to access the global Logic component
#[macro_export]
macro_rules! global_logic {
    ($ui:expr) => {
        $ui.global::<crate::slint_generatedAppWindow::Logic>()
    };
}

/// Macro to access the global Util component
#[macro_export]
macro_rules! global_util {
    ($ui:expr) => {
        $ui.global::<crate::slint_generatedAppWindow::Util>()
    };
}

/// Binds `Logic.<name>` to the Rust function of the same name.
///
/// `logic_cb!(open_image, ui, path)` registers `on_open_image` calling
/// `open_image(&ui, path)` through a weak handle.
#[macro_export]
macro_rules! logic_cb {
    ($callback_name:ident, $ui:expr, $($arg:ident),*) => {
        {{
            let ui_weak = $ui.as_weak();
            paste::paste! {
                crate::global_logic!($ui)
                    .[<on_ $callback_name>](move |$($arg),*| {
                        $callback_name(&ui_weak.unwrap(), $($arg),*)
                    });
            }
        }}
    };
    ($callback_name:ident, $ui:expr) => {
        {{
            let ui_weak = $ui.as_weak();
            paste::paste! {
                crate::global_logic!($ui)
                    .[<on_ $callback_name>](move || {
                        $callback_name(&ui_weak.unwrap())
                    });
            }
        }}
    };
}

pub fn init(ui: &AppWindow) {
    util::init(ui);
    about::init(ui);
    setting::init(ui);
    toast::init(ui);
    confirm_dialog::init(ui);

    model::init(ui);
    editor::init(ui);
    batch::init(ui);
}
